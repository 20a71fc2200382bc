//! Power-up and calibration sequence run once per boot.

use core::fmt;
use error::{Error, Failure, Stage};
use lane::{Calibration, LaneStatus};
use mode::{Sdram, Software, InitStep};
use phy::Phy;

impl<'a, P: Phy + 'a> Software<'a, P> {
    /// Runs `f` with delay-line voltage/temperature compensation paused.
    pub fn with_vtc_off<R, F>(&mut self, f: F) -> R
            where F: FnOnce(&mut Software<'a, P>) -> R {
        if P::VTC {
            self.sdram.phy.en_vtc_write(false);
        }
        let result = f(self);
        if P::VTC {
            self.sdram.phy.en_vtc_write(true);
        }
        result
    }

    /// Write leveling, read bitslip and read leveling, as far as the PHY
    /// supports them. Scans are only run when someone is watching.
    pub fn train(&mut self, console: &mut Option<&mut dyn fmt::Write>) -> Result<(), Error> {
        self.with_vtc_off(|sw| -> Result<(), Error> {
            if P::WRITE_LEVELING {
                if console.is_some() {
                    sw.write_level_scan(console);
                }
                sw.write_level(console)?;
                sw.read_bitslip(console);
            }

            if P::READ_LEVELING {
                if console.is_some() {
                    sw.read_level_scan(console);
                }
                sw.sdrlevel(console)?;
            }

            for lane in sw.sdram.calibration.lanes_mut() {
                lane.status = LaneStatus::Calibrated;
            }
            Ok(())
        })
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    debug!("sdrinit: {}", next);
    *stage = next;
}

/// Brings the SDRAM up from reset: power-up table, training, hand-over to
/// the controller and a memory test.
///
/// The controller is only given the bus once training has succeeded.
pub fn sdrinit<P: Phy>(sdram: &mut Sdram<P>, init: &[InitStep],
                       mut console: Option<&mut dyn fmt::Write>)
        -> Result<Calibration, Failure> {
    let mut stage = Stage::EnterSoftware;
    info!("initializing SDRAM ({} byte lanes)", sdram.geometry().modules());
    report!(&mut console, "Initializing SDRAM...\n");

    sdram.calibration = Calibration::new(sdram.geometry().modules());
    let trained = {
        let mut sw = sdram.enter_software_mode();
        enter(&mut stage, Stage::ProgramModeRegisters);
        sw.power_up(init);
        enter(&mut stage, Stage::Calibrate);
        sw.train(&mut console)
    };
    if let Err(error) = trained {
        error!("SDRAM {} failed: {}", stage, error);
        report!(&mut console, "SDRAM initialization failed\n");
        return Err(Failure { stage: stage, error: error })
    }

    enter(&mut stage, Stage::EnterHardware);
    let outcome = {
        let mut hw = sdram.enter_hardware_mode();
        enter(&mut stage, Stage::Validate);
        hw.memtest(&mut console)
    };
    if !outcome.passed() {
        for lane in sdram.calibration.lanes_mut() {
            lane.status = LaneStatus::Failed;
        }
        let error = Error::MemoryTest { errors: outcome.errors, total: outcome.total };
        error!("SDRAM {} failed: {}", stage, error);
        report!(&mut console, "SDRAM initialization failed\n");
        return Err(Failure { stage: stage, error: error })
    }

    info!("SDRAM initialized");
    report!(&mut console, "SDRAM initialized\n");
    Ok(sdram.calibration)
}
