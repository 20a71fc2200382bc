//! Console commands for poking at a running controller.
//!
//! Each command takes the bus from the controller, does its work under
//! software control and hands the bus back.

use core::fmt;
use command::CaptureBuffer;
use error::Error;
use mode::Sdram;
use phy::{Phy, CommandDelay};

impl<P: Phy> Sdram<P> {
    /// Re-runs read leveling on a live system.
    pub fn sdrcal(&mut self, console: &mut Option<&mut dyn fmt::Write>) -> Result<(), Error> {
        let result = {
            let mut sw = self.enter_software_mode();
            sw.with_vtc_off(|sw| sw.sdrlevel(console))
        };
        self.enter_hardware_mode();
        result
    }

    pub fn sdrmrwr(&mut self, register: u8, value: u16) {
        self.enter_software_mode().write_mode_register(register, value);
        self.enter_hardware_mode();
    }

    /// Dumps the multi-purpose register as seen by every lane.
    pub fn sdrmpr(&mut self, console: &mut Option<&mut dyn fmt::Write>) -> CaptureBuffer {
        let modules = self.geometry().modules();
        let buffer = self.enter_software_mode().read_multi_purpose_register();
        self.enter_hardware_mode();

        report!(console, "Read SDRAM MPR:\n");
        for module in 0..modules {
            let sample = buffer.lane(module);
            report!(console, "m{}:", module);
            for &[rise, fall] in sample.phases() {
                report!(console, " {:02x}{:02x}", rise, fall);
            }
            report!(console, " {}\n", if sample.is_mpr_pattern() { "ok" } else { "bad" });
        }
        buffer
    }
}

impl<P: CommandDelay> Sdram<P> {
    pub fn sdr_cdly_scan(&mut self, enabled: bool, console: &mut Option<&mut dyn fmt::Write>)
            -> Result<u16, Error> {
        let result = self.enter_software_mode().cdly_scan(enabled, console);
        self.enter_hardware_mode();
        result
    }
}
