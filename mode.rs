//! Control-mode switching of the DFI injector.
//!
//! The controller is reached only through a mode view borrowed from
//! [`Sdram`]: raw commands exist on [`Software`], the memory test on
//! [`Hardware`], and leveling strobes on [`WriteLeveling`], which can only be
//! opened from a software view and leaves leveling mode when dropped.

use config::Config;
use lane::Calibration;
use command::{CaptureBuffer, Pattern};
use phy::{Phy, Geometry};
use phy::{DFII_CONTROL_SEL, DFII_CONTROL_CKE, DFII_CONTROL_ODT, DFII_CONTROL_RESET_N};
use phy::{DFII_COMMAND_CS, DFII_COMMAND_WE, DFII_COMMAND_CAS, DFII_COMMAND_RAS};

const MRS: u8 = DFII_COMMAND_RAS|DFII_COMMAND_CAS|DFII_COMMAND_WE|DFII_COMMAND_CS;

const MR1_WLEVEL: u16 = 1 << 7;
const MR3_MPR: u16 = 1 << 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Software,
    Hardware,
}

/// One entry of the power-up table supplied by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    Control { value: u8, settle: usize },
    ModeRegister { register: u8, value: u16, settle: usize },
    Command { address: u16, baddress: u8, command: u8, settle: usize },
}

/// DDR3 power-up: reset release, CKE, MR2/MR3/MR1/MR0 (CL=7, BL=8), ZQ calibration.
pub const DDR3_INIT: &'static [InitStep] = &[
    InitStep::Control { value: DFII_CONTROL_ODT|DFII_CONTROL_RESET_N, settle: 50000 },
    InitStep::Control { value: DFII_CONTROL_CKE|DFII_CONTROL_ODT|DFII_CONTROL_RESET_N,
                        settle: 10000 },
    InitStep::ModeRegister { register: 2, value: 0x408, settle: 0 },
    InitStep::ModeRegister { register: 3, value: 0x0, settle: 0 },
    InitStep::ModeRegister { register: 1, value: 0x6, settle: 0 },
    InitStep::ModeRegister { register: 0, value: 0x930, settle: 200 },
    InitStep::Command { address: 0x400, baddress: 0,
                        command: DFII_COMMAND_WE|DFII_COMMAND_CS, settle: 200 },
];

pub struct Sdram<P: Phy> {
    pub(crate) phy: P,
    pub(crate) config: Config,
    pub(crate) pattern: Pattern,
    pub(crate) calibration: Calibration,
    mode_registers: [u16; 8],
    mode: Option<ControlMode>,
}

impl<P: Phy> Sdram<P> {
    pub fn new(phy: P, config: Config) -> Sdram<P> {
        let geometry = phy.geometry();
        Sdram {
            phy: phy,
            config: config,
            pattern: Pattern::sequential(&geometry),
            calibration: Calibration::new(geometry.modules()),
            mode_registers: [0; 8],
            mode: None,
        }
    }

    pub fn phy(&self) -> &P {
        &self.phy
    }

    pub fn phy_mut(&mut self) -> &mut P {
        &mut self.phy
    }

    pub fn into_phy(self) -> P {
        self.phy
    }

    pub fn geometry(&self) -> Geometry {
        self.phy.geometry()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Last value written to mode register `register` through
    /// [`Software::write_mode_register`].
    pub fn mode_register(&self, register: u8) -> u16 {
        self.mode_registers[register as usize & 7]
    }

    /// `None` until the first mode switch.
    pub fn mode(&self) -> Option<ControlMode> {
        self.mode
    }

    pub fn enter_software_mode(&mut self) -> Software<P> {
        self.phy.control_write(DFII_CONTROL_CKE|DFII_CONTROL_ODT|DFII_CONTROL_RESET_N);
        if self.mode != Some(ControlMode::Software) {
            debug!("SDRAM now under software control");
        }
        self.mode = Some(ControlMode::Software);
        Software { sdram: self }
    }

    pub fn enter_hardware_mode(&mut self) -> Hardware<P> {
        self.phy.control_write(DFII_CONTROL_SEL);
        if self.mode != Some(ControlMode::Hardware) {
            debug!("SDRAM now under hardware control");
        }
        self.mode = Some(ControlMode::Hardware);
        Hardware { sdram: self }
    }

    fn spin(&mut self, cycles: usize) {
        if cycles > 0 {
            self.phy.spin_cycles(cycles)
        }
    }

    fn load_mode_register(&mut self, register: u8, value: u16) {
        self.phy.command(0, value, register, MRS);
    }
}

pub struct Software<'a, P: Phy + 'a> {
    pub(crate) sdram: &'a mut Sdram<P>,
}

impl<'a, P: Phy + 'a> Software<'a, P> {
    pub fn sdram(&self) -> &Sdram<P> {
        &*self.sdram
    }

    pub fn into_hardware(self) -> Hardware<'a, P> {
        let sdram = self.sdram;
        sdram.enter_hardware_mode()
    }

    /// Runs `f` under hardware control and returns to software control.
    pub fn with_hardware<R, F>(&mut self, f: F) -> R
            where F: FnOnce(&mut Hardware<P>) -> R {
        let result = {
            let mut hw = self.sdram.enter_hardware_mode();
            f(&mut hw)
        };
        self.sdram.enter_software_mode();
        result
    }

    pub(crate) fn spin(&mut self, cycles: usize) {
        self.sdram.spin(cycles)
    }

    pub(crate) fn settle(&mut self) {
        let cycles = self.sdram.config.command_settle;
        self.sdram.spin(cycles)
    }

    /// Replays a power-up table. Control steps never hand the bus to the
    /// controller.
    pub fn power_up(&mut self, steps: &[InitStep]) {
        for step in steps {
            match *step {
                InitStep::Control { value, settle } => {
                    self.sdram.phy.control_write(value & !DFII_CONTROL_SEL);
                    self.spin(settle);
                }
                InitStep::ModeRegister { register, value, settle } => {
                    self.write_mode_register(register, value);
                    self.spin(settle);
                }
                InitStep::Command { address, baddress, command, settle } => {
                    self.sdram.phy.command(0, address, baddress, command);
                    self.spin(settle);
                }
            }
        }
    }

    pub fn write_mode_register(&mut self, register: u8, value: u16) {
        trace!("MR{} <- {:#06x}", register, value);
        self.sdram.mode_registers[register as usize & 7] = value;
        self.sdram.load_mode_register(register, value);
    }

    /// Reads the device's multi-purpose register (DDR3 MPR page 0) on all lanes.
    pub fn read_multi_purpose_register(&mut self) -> CaptureBuffer {
        let mr3 = self.sdram.mode_register(3);
        self.sdram.load_mode_register(3, mr3 | MR3_MPR);
        self.settle();
        self.read(0);
        let buffer = self.capture();
        self.sdram.load_mode_register(3, mr3);
        self.settle();
        buffer
    }

    pub fn enter_write_leveling_mode(&mut self) -> WriteLeveling<P> {
        let mr1 = self.sdram.mode_register(1);
        self.sdram.load_mode_register(1, mr1 | MR1_WLEVEL);
        self.sdram.phy.wlevel_en_write(true);
        self.spin(100);
        WriteLeveling { sdram: &mut *self.sdram }
    }
}

pub struct Hardware<'a, P: Phy + 'a> {
    pub(crate) sdram: &'a mut Sdram<P>,
}

impl<'a, P: Phy + 'a> Hardware<'a, P> {
    pub fn sdram(&self) -> &Sdram<P> {
        &*self.sdram
    }

    pub fn into_software(self) -> Software<'a, P> {
        let sdram = self.sdram;
        sdram.enter_software_mode()
    }
}

pub struct WriteLeveling<'a, P: Phy + 'a> {
    pub(crate) sdram: &'a mut Sdram<P>,
}

impl<'a, P: Phy + 'a> WriteLeveling<'a, P> {
    pub fn exit_write_leveling_mode(self) {}
}

impl<'a, P: Phy + 'a> Drop for WriteLeveling<'a, P> {
    fn drop(&mut self) {
        let mr1 = self.sdram.mode_register(1);
        self.sdram.load_mode_register(1, mr1);
        self.sdram.phy.wlevel_en_write(false);
    }
}
