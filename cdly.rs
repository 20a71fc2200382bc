//! Command/address delay line on PHYs that have one.

#[cfg(any(test, feature = "debug"))]
use core::fmt;
use mode::Software;
use phy::CommandDelay;
#[cfg(any(test, feature = "debug"))]
use error::Error;
#[cfg(any(test, feature = "debug"))]
use read_level::{WindowSearch, window_len};

impl<'a, P: CommandDelay + 'a> Software<'a, P> {
    /// Sets the command delay line to `delay` taps from reset.
    pub fn ddrphy_cdly(&mut self, delay: u16) {
        self.sdram.phy.cdly_rst();
        for _ in 0..delay {
            self.sdram.phy.cdly_inc();
        }
        trace!("command delay set to {}", delay);
    }

    #[cfg(any(test, feature = "debug"))]
    fn retrain_reads(&mut self) -> Result<(), Error> {
        if P::READ_LEVELING {
            self.with_vtc_off(|sw| sw.sdrlevel(&mut None))
        } else {
            Ok(())
        }
    }

    /// Sweeps the command delay, reporting which taps train and pass the
    /// memory test, then settles on the middle of the widest passing window.
    ///
    /// Disabled, it only restores the last calibrated delay.
    #[cfg(any(test, feature = "debug"))]
    pub fn cdly_scan(&mut self, enabled: bool, console: &mut Option<&mut dyn fmt::Write>)
            -> Result<u16, Error> {
        let previous = self.sdram.calibration.cdly.unwrap_or(0);
        if !enabled {
            self.ddrphy_cdly(previous);
            return Ok(previous)
        }

        let saved = self.sdram.calibration;
        let max_delay = self.sdram.geometry().max_delay;
        let mut search = WindowSearch::new();
        report!(console, "Command/Clk scan:\n");
        for delay in 0..max_delay {
            self.ddrphy_cdly(delay);
            let passed = self.retrain_reads().is_ok() &&
                self.with_hardware(|hw| hw.memtest_silent().passed());
            search.record(delay, passed);
            report!(console, "{}", if passed { "1" } else { "0" });
        }
        report!(console, "\n");

        match search.best() {
            Some(window) => {
                let best = window.0 + (window_len(window) - 1) / 2;
                self.ddrphy_cdly(best);
                self.retrain_reads()?;
                self.sdram.calibration.cdly = Some(best);
                info!("command delay {} (window {}-{})", best, window.0, window.1);
                report!(console, "Best command delay: {} ({}-{})\n", best, window.0, window.1);
                Ok(best)
            }
            None => {
                // Put the board back the way the sweep found it.
                self.ddrphy_cdly(previous);
                for module in 0..saved.lanes().len() {
                    self.set_read_delay(module, saved.lane(module).delay);
                }
                self.sdram.calibration = saved;
                warn!("no working command delay, restored {}", previous);
                report!(console, "No working command delay\n");
                Err(Error::CommandDelay)
            }
        }
    }
}
