//! Register-level contract between the training engine and the DDR PHY.
//!
//! The engine never touches CSRs directly; it drives a [`Phy`]. The MiSoC
//! backend in `csr_phy` maps these calls onto the generated `csr::dfii` and
//! `csr::ddrphy` accessors, and the unit tests map them onto a model of the
//! PHY and DRAM.

pub const DFII_CONTROL_SEL:     u8 = 0x01;
pub const DFII_CONTROL_CKE:     u8 = 0x02;
pub const DFII_CONTROL_ODT:     u8 = 0x04;
pub const DFII_CONTROL_RESET_N: u8 = 0x08;

pub const DFII_COMMAND_CS:      u8 = 0x01;
pub const DFII_COMMAND_WE:      u8 = 0x02;
pub const DFII_COMMAND_CAS:     u8 = 0x04;
pub const DFII_COMMAND_RAS:     u8 = 0x08;
pub const DFII_COMMAND_WRDATA:  u8 = 0x10;
pub const DFII_COMMAND_RDDATA:  u8 = 0x20;

pub const MAX_PHASES: usize = 8;
pub const MAX_MODULES: usize = 8;

/// Shape of the DFI injector and delay lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub nphases:       usize,
    /// Bytes of write/read data per phase; two per byte lane.
    pub pix_data_size: usize,
    pub rdphase:       usize,
    pub wrphase:       usize,
    /// Number of taps on each delay line.
    pub max_delay:     u16,
}

impl Geometry {
    pub fn modules(&self) -> usize {
        self.pix_data_size / 2
    }

    /// Byte offsets inside one phase carrying `module`: rising half, falling half.
    pub fn lane_offsets(&self, module: usize) -> [usize; 2] {
        let n = self.modules() - 1 - module;
        [n, n + self.modules()]
    }

    pub fn pattern_len(&self) -> usize {
        self.nphases * self.pix_data_size
    }
}

pub trait Phy {
    /// The PHY exposes DQ/DQS write delay lines and leveling feedback.
    const WRITE_LEVELING: bool;
    /// The PHY exposes per-lane read delay lines.
    const READ_LEVELING: bool;
    /// Delay lines are voltage/temperature compensated and need VTC
    /// switched off while being moved.
    const VTC: bool = false;
    /// Bitslips that shift read data by one bit time.
    const HIGH_SKEW_BITSLIPS: u8 = 3;

    fn geometry(&self) -> Geometry;

    fn control_write(&mut self, value: u8);

    /// Latches `address`/`baddress` for `phase` and issues `command` on it.
    fn command(&mut self, phase: usize, address: u16, baddress: u8, command: u8);
    fn wrdata_write(&mut self, phase: usize, offset: usize, data: u8);
    fn rddata_read(&mut self, phase: usize, offset: usize) -> u8;

    /// One-hot lane select for the delay line strobes below.
    fn dly_sel_write(&mut self, mask: u8);
    fn rdly_dq_rst(&mut self);
    fn rdly_dq_inc(&mut self);
    fn rdly_dq_bitslip(&mut self);
    /// Bitslips the read path needs after every read delay reset.
    fn rdly_dq_bitslip_preset(&self) -> u8 { 0 }

    fn wdly_dq_rst(&mut self) {}
    fn wdly_dq_inc(&mut self) {}
    fn wdly_dqs_rst(&mut self) {}
    fn wdly_dqs_inc(&mut self) {}
    /// Taps already applied to DQS by the PHY before leveling starts.
    fn wdly_dqs_taps(&self) -> u16 { 0 }
    fn wlevel_en_write(&mut self, _enabled: bool) {}
    fn wlevel_strobe(&mut self) {}

    fn en_vtc_write(&mut self, _enabled: bool) {}

    fn spin_cycles(&mut self, cycles: usize);

    /// Main RAM as seen through the hardware-controlled port, in words.
    fn ram_base(&self) -> usize { 0 }
    fn ram_words(&self) -> usize;
    fn ram_read(&mut self, index: usize) -> u32;
    fn ram_write(&mut self, index: usize, data: u32);
    fn flush_caches(&mut self) {}
}

/// PHYs with an adjustable command/address delay line.
pub trait CommandDelay: Phy {
    fn cdly_rst(&mut self);
    fn cdly_inc(&mut self);
}

/// An offset on one delay line, always below the line's tap count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct DelayTap(u16);

impl DelayTap {
    pub fn new(tap: u16, max_delay: u16) -> Option<DelayTap> {
        if tap < max_delay { Some(DelayTap(tap)) } else { None }
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}
