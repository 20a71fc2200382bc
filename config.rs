/// Runtime knobs of the training engine. Every search below is bounded by
/// these and by the PHY's tap count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Strobes per write-leveling probe; the feedback bit is majority-voted.
    pub wlevel_samples: u8,
    /// Reads compared per read delay tap.
    pub read_iterations: usize,
    /// Narrowest read window accepted, in taps.
    pub min_read_window: u16,
    /// Words of main RAM covered by the memory test.
    pub memtest_words: usize,
    /// Cycles to wait after each raw command.
    pub command_settle: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            wlevel_samples: 5,
            read_iterations: 256,
            min_read_window: 1,
            memtest_words: 2 * 1024 * 1024 / 4,
            command_settle: 15,
        }
    }
}
