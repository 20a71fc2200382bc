use core::fmt;
use error::Error;
use lane::LaneStatus;
use mode::{Software, WriteLeveling};
use phy::Phy;

impl<'a, P: Phy + 'a> WriteLeveling<'a, P> {
    fn select(&mut self, module: usize) {
        self.sdram.phy.dly_sel_write(1 << module);
    }

    fn reset_delays(&mut self) {
        self.sdram.phy.wdly_dq_rst();
        self.sdram.phy.wdly_dqs_rst();
        for _ in 0..self.sdram.phy.wdly_dqs_taps() {
            self.sdram.phy.wdly_dqs_inc();
        }
    }

    fn increment(&mut self) {
        self.sdram.phy.wdly_dq_inc();
        self.sdram.phy.wdly_dqs_inc();
    }

    /// Taps left on the DQS line once the PHY's own offset is applied.
    fn max_delay(&self) -> u16 {
        self.sdram.geometry().max_delay.saturating_sub(self.sdram.phy.wdly_dqs_taps())
    }

    /// One strobe; true if the device sampled CK high on `module`'s DQS edge.
    pub fn sample(&mut self, module: usize) -> bool {
        let offset = self.sdram.geometry().lane_offsets(module)[0];
        self.sdram.phy.wlevel_strobe();
        self.sdram.phy.spin_cycles(10);
        self.sdram.phy.rddata_read(0, offset) != 0
    }

    /// Majority vote over `samples` strobes.
    pub fn probe(&mut self, module: usize, samples: u8) -> bool {
        let samples = if samples == 0 { 1 } else { samples };
        let mut ones = 0u16;
        for _ in 0..samples {
            if self.sample(module) {
                ones += 1;
            }
        }
        2 * ones > samples as u16
    }

    /// Walks DQS forward until the feedback turns from 0 to 1.
    ///
    /// Returns the delay and whether the lane started in the CK=1 zone; the
    /// error carries the same pair for a lane that ran out of taps.
    fn level_module(&mut self, module: usize, samples: u8)
            -> Result<(u16, bool), (u16, bool)> {
        let max_delay = self.max_delay();
        self.select(module);
        self.reset_delays();

        let mut delay = 0;
        let mut high_skew = false;
        let mut dq = self.probe(module, samples);

        if dq {
            // Between 1 and 2 bit times of skew.
            // Bring DQS into the CK=0 zone before continuing leveling.
            high_skew = true;
            while dq {
                delay += 1;
                if delay >= max_delay {
                    return Err((delay, high_skew))
                }
                self.increment();
                dq = self.probe(module, samples);
            }
        }

        while !dq {
            delay += 1;
            if delay >= max_delay {
                return Err((delay, high_skew))
            }
            self.increment();
            dq = self.probe(module, samples);
        }

        Ok((delay, high_skew))
    }
}

impl<'a, P: Phy + 'a> Software<'a, P> {
    /// Prints the raw leveling feedback of every tap, one row per lane.
    pub fn write_level_scan(&mut self, console: &mut Option<&mut dyn fmt::Write>) {
        let modules = self.sdram.geometry().modules();
        let dqs_taps = self.sdram.phy.wdly_dqs_taps();
        if dqs_taps > 0 {
            report!(console, "DQS initial delay: {} taps\n", dqs_taps);
        }
        report!(console, "Write leveling scan:\n");

        let mut wl = self.enter_write_leveling_mode();
        let max_delay = wl.max_delay();
        for module in 0..modules {
            report!(console, "Module {}:\n", module);
            wl.select(module);
            wl.reset_delays();
            for _ in 0..max_delay {
                if wl.sample(module) {
                    report!(console, "1");
                } else {
                    report!(console, "0");
                }
                wl.increment();
            }
            report!(console, "\n");
        }
    }

    /// Aligns DQS to CK at the device on every lane.
    pub fn write_level(&mut self, console: &mut Option<&mut dyn fmt::Write>) -> Result<(), Error> {
        let modules = self.sdram.geometry().modules();
        let samples = self.sdram.config.wlevel_samples;
        let dqs_taps = self.sdram.phy.wdly_dqs_taps();
        if dqs_taps > 0 {
            report!(console, "DQS initial delay: {} taps\n", dqs_taps);
        }
        report!(console, "Write leveling: ");

        let mut failed = None;
        {
            let mut wl = self.enter_write_leveling_mode();
            for module in 0..modules {
                wl.sdram.calibration.lane_mut(module).status = LaneStatus::InProgress;
                let (result, (delay, high_skew)) = match wl.level_module(module, samples) {
                    Ok(leveled) => (LaneStatus::InProgress, leveled),
                    Err(reached) => (LaneStatus::Failed, reached),
                };
                let lane = wl.sdram.calibration.lane_mut(module);
                lane.wlevel_delay = delay;
                lane.high_skew = high_skew;
                lane.status = result;
                if result == LaneStatus::Failed {
                    warn!("write leveling: no DQS edge on module {}", module);
                    if failed.is_none() {
                        failed = Some(module);
                    }
                } else {
                    debug!("write leveling: module {} at {} taps{}", module, delay,
                           if high_skew { " (high skew)" } else { "" });
                }
            }
        }

        for lane in self.sdram.calibration.lanes().iter().rev() {
            report!(console, "{}{} ", lane.wlevel_delay, if lane.high_skew { "*" } else { "" });
        }

        match failed {
            None => {
                report!(console, "done\n");
                Ok(())
            }
            Some(module) => {
                report!(console, "failed\n");
                Err(Error::WriteLeveling { module: module })
            }
        }
    }

    /// Lanes whose DQS needed more than half the delay of the earliest
    /// high-skew lane get their read data shifted by one bit time.
    pub fn read_bitslip(&mut self, console: &mut Option<&mut dyn fmt::Write>) {
        let threshold_opt = self.sdram.calibration.lanes().iter()
            .filter_map(|lane| if lane.high_skew { Some(lane.wlevel_delay) } else { None })
            .min()
            .map(|threshold| threshold / 2);

        if let Some(threshold) = threshold_opt {
            report!(console, "Read bitslip: ");

            let modules = self.sdram.geometry().modules();
            for module in (0..modules).rev() {
                if self.sdram.calibration.lane(module).wlevel_delay > threshold {
                    self.sdram.phy.dly_sel_write(1 << module);
                    for _ in 0..P::HIGH_SKEW_BITSLIPS {
                        self.sdram.phy.rdly_dq_bitslip();
                    }
                    self.sdram.calibration.lane_mut(module).bitslip += P::HIGH_SKEW_BITSLIPS;
                    report!(console, "{} ", module);
                }
            }

            report!(console, "\n");
        }
    }
}
