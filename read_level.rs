use core::fmt;
use command::Pattern;
use error::Error;
use lane::LaneStatus;
use mode::Software;
use phy::{DelayTap, Phy};

const PATTERN_SEED: u32 = 42;

/// Tracks the longest run of passing taps seen during a sweep.
#[derive(Debug, Default)]
pub(crate) struct WindowSearch {
    run_start: u16,
    run_len:   u16,
    best:      Option<(u16, u16)>,
}

impl WindowSearch {
    pub(crate) fn new() -> WindowSearch {
        WindowSearch::default()
    }

    pub(crate) fn record(&mut self, tap: u16, passed: bool) {
        if !passed {
            self.run_len = 0;
            return
        }
        if self.run_len == 0 {
            self.run_start = tap;
        }
        self.run_len += 1;
        let longer = match self.best {
            None => true,
            Some((first, last)) => self.run_len > last - first + 1,
        };
        if longer {
            self.best = Some((self.run_start, tap));
        }
    }

    /// First and last tap of the longest run; the earliest one on ties.
    pub(crate) fn best(&self) -> Option<(u16, u16)> {
        self.best
    }
}

pub(crate) fn window_len(window: (u16, u16)) -> u16 {
    window.1 - window.0 + 1
}

impl<'a, P: Phy + 'a> Software<'a, P> {
    fn prepare_read_pattern(&mut self) {
        let pattern = Pattern::pseudo_random(&self.sdram.geometry(), PATTERN_SEED);
        self.activate_row(0);
        self.load_pattern(&pattern);
        self.write(0);
    }

    fn select_read_lane(&mut self, module: usize) {
        self.sdram.phy.dly_sel_write(1 << module);
        self.sdram.phy.rdly_dq_rst();
        for _ in 0..self.sdram.phy.rdly_dq_bitslip_preset() {
            self.sdram.phy.rdly_dq_bitslip();
        }
    }

    /// Moves `module`'s read delay line to `tap`, counting from reset.
    pub fn set_read_delay(&mut self, module: usize, tap: DelayTap) {
        self.select_read_lane(module);
        for _ in 0..tap.value() {
            self.sdram.phy.rdly_dq_inc();
        }
        self.sdram.calibration.lane_mut(module).delay = tap;
    }

    /// Prints which read delay taps return the written pattern, one row per lane.
    pub fn read_level_scan(&mut self, console: &mut Option<&mut dyn fmt::Write>) {
        let geometry = self.sdram.geometry();
        let iterations = self.sdram.config.read_iterations;
        report!(console, "Read leveling scan:\n");

        self.prepare_read_pattern();
        for module in 0..geometry.modules() {
            report!(console, "Module {}:\n", module);
            self.select_read_lane(module);
            for _ in 0..geometry.max_delay {
                if self.lane_error_count(0, module, iterations) == 0 {
                    report!(console, "1");
                } else {
                    report!(console, "0");
                }
                self.sdram.phy.rdly_dq_inc();
            }
            report!(console, "\n");
        }
        self.precharge_all();

        // Leave the lines where calibration put them.
        for module in 0..geometry.modules() {
            let tap = self.sdram.calibration.lane(module).delay;
            self.set_read_delay(module, tap);
        }
    }

    /// Centers every lane's read delay in its widest zero-error window.
    pub fn sdrlevel(&mut self, console: &mut Option<&mut dyn fmt::Write>) -> Result<(), Error> {
        let geometry = self.sdram.geometry();
        let iterations = self.sdram.config.read_iterations;
        let min_window = self.sdram.config.min_read_window;
        report!(console, "Read leveling: ");

        self.prepare_read_pattern();
        let mut failed = None;
        for module in 0..geometry.modules() {
            self.sdram.calibration.lane_mut(module).status = LaneStatus::InProgress;
            self.select_read_lane(module);

            let mut search = WindowSearch::new();
            for tap in 0..geometry.max_delay {
                let passed = self.lane_error_count(0, module, iterations) == 0;
                search.record(tap, passed);
                self.sdram.phy.rdly_dq_inc();
            }

            let window = search.best();
            self.sdram.calibration.lane_mut(module).window = window;
            match window {
                Some(window) if window_len(window) >= min_window => {
                    let center = window.0 + (window.1 - window.0) / 2;
                    let tap = DelayTap::new(center, geometry.max_delay).unwrap_or_default();
                    self.set_read_delay(module, tap);
                    self.sdram.calibration.lane_mut(module).status = LaneStatus::Calibrated;
                    debug!("read leveling: module {} window {}-{}, delay {}",
                           module, window.0, window.1, center);
                    report!(console, "{}+-{} ", center, (window.1 - window.0) / 2);
                }
                _ => {
                    self.set_read_delay(module, DelayTap::default());
                    self.sdram.calibration.lane_mut(module).status = LaneStatus::Failed;
                    warn!("read leveling: module {} window {:?} rejected", module, window);
                    report!(console, "{} ", if window.is_some() { "small" } else { "none" });
                    if failed.is_none() {
                        failed = Some(Error::ReadLeveling { module: module, window: window });
                    }
                }
            }
        }
        self.precharge_all();

        match failed {
            None => {
                report!(console, "done\n");
                Ok(())
            }
            Some(error) => {
                report!(console, "failed\n");
                Err(error)
            }
        }
    }
}
