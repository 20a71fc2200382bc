//! DDR3 SDRAM bring-up for MiSoC/LiteX DFII controllers: power-up, write
//! and read leveling, hand-over to the controller and a memory test.

#![no_std]
#![cfg_attr(has_dfii, feature(asm))]

extern crate byteorder;
#[macro_use]
extern crate log;
#[cfg(test)]
#[macro_use]
extern crate std;

macro_rules! report {
    ($console:expr, $( $arg:expr ),+) => (
        if let &mut Some(ref mut f) = $console {
            let _ = write!(f, $( $arg ),+);
        }
    )
}

#[cfg(has_dfii)]
include!(concat!(env!("BUILDINC_DIRECTORY"), "/generated/mem.rs"));
#[cfg(has_dfii)]
include!(concat!(env!("BUILDINC_DIRECTORY"), "/generated/csr.rs"));
#[cfg(has_dfii)]
include!(concat!(env!("BUILDINC_DIRECTORY"), "/generated/sdram_phy.rs"));

pub mod phy;
pub mod config;
pub mod error;
pub mod lane;
pub mod mode;
pub mod command;
mod write_level;
mod read_level;
mod cdly;
pub mod memtest;
pub mod init;
#[cfg(any(test, feature = "debug"))]
mod debug;
#[cfg(has_dfii)]
pub mod csr_phy;

#[cfg(test)]
mod sim;

pub use phy::{Phy, CommandDelay, Geometry, DelayTap};
pub use config::Config;
pub use error::{Error, Failure, Stage};
pub use lane::{BitLane, Calibration, LaneStatus};
pub use mode::{Sdram, Software, Hardware, WriteLeveling, ControlMode, InitStep, DDR3_INIT};
pub use command::{Pattern, CaptureBuffer, CaptureSample};
pub use memtest::{TestOutcome, Mismatch};
pub use init::sdrinit;
