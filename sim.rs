//! Behavioural model of a DFII + DDRPHY + DDR3 device, for unit tests.
//!
//! Each byte lane has a read eye (the read delay taps that sample data
//! correctly) and a write leveling response (the DQS delays at which the
//! device samples CK high). The command/address path has its own eye on the
//! command delay line. Main RAM sits behind the controller and is only
//! reachable under hardware control.

use std::collections::HashMap;
use std::vec::Vec;
use phy::{Phy, CommandDelay, Geometry, MAX_MODULES, MAX_PHASES};
use phy::{DFII_CONTROL_SEL, DFII_COMMAND_CS, DFII_COMMAND_WE, DFII_COMMAND_CAS,
          DFII_COMMAND_RAS, DFII_COMMAND_WRDATA, DFII_COMMAND_RDDATA};

const MRS:       u8 = DFII_COMMAND_RAS|DFII_COMMAND_CAS|DFII_COMMAND_WE|DFII_COMMAND_CS;
const ACTIVATE:  u8 = DFII_COMMAND_RAS|DFII_COMMAND_CS;
const PRECHARGE: u8 = DFII_COMMAND_RAS|DFII_COMMAND_WE|DFII_COMMAND_CS;
const ZQCL:      u8 = DFII_COMMAND_WE|DFII_COMMAND_CS;
const WRITE:     u8 = DFII_COMMAND_CAS|DFII_COMMAND_WE|DFII_COMMAND_CS|DFII_COMMAND_WRDATA;
const READ:      u8 = DFII_COMMAND_CAS|DFII_COMMAND_CS|DFII_COMMAND_RDDATA;

#[derive(Debug, Clone, Copy)]
enum Leveling {
    /// Feedback is 1 from this tap on.
    Edge(u16),
    /// Feedback is 1 below the first tap, 0 up to the second, then 1 again.
    HighSkew(u16, u16),
    StuckHigh,
}

#[derive(Debug, Clone, Copy)]
struct Lane {
    read_eye: Option<(u16, u16)>,
    leveling: Leveling,
    glitch:   Option<usize>,
    rdly:     u16,
    wdly_dqs: u16,
}

pub struct SimPhy {
    geometry:  Geometry,
    lanes:     [Lane; MAX_MODULES],
    dly_sel:   u8,
    wrdata:    [[u8; 2 * MAX_MODULES]; MAX_PHASES],
    rddata:    [[u8; 2 * MAX_MODULES]; MAX_PHASES],
    open_row:  Option<u16>,
    bursts:    HashMap<(u16, u16), Vec<u8>>,
    strobes:   usize,
    cdly:      u16,
    command_eye: Option<(u16, u16)>,
    ram:       Vec<u32>,
    faults:    Vec<(usize, u32)>,
    bitslip_preset: u8,

    pub control:         u8,
    pub control_history: Vec<u8>,
    pub mode_registers:  [u16; 8],
    pub zq_calibrations: usize,
    pub wlevel_en:       bool,
    pub bitslips:        [u8; MAX_MODULES],
    pub slips_since_reset: [u8; MAX_MODULES],
    pub vtc:             bool,
    pub vtc_history:     Vec<bool>,
    pub ram_writes:      usize,
    pub spun:            usize,
}

impl SimPhy {
    pub const RAM_BASE: usize = 0x4000_0000;
    const RAM_WORDS: usize = 4096;

    /// Two byte lanes, four phases, 32-tap delay lines.
    pub fn new() -> SimPhy {
        SimPhy::with_modules(2)
    }

    pub fn with_modules(modules: usize) -> SimPhy {
        let mut lanes = [Lane {
            read_eye: None,
            leveling: Leveling::Edge(10),
            glitch:   None,
            rdly:     0,
            wdly_dqs: 0,
        }; MAX_MODULES];
        for (index, lane) in lanes.iter_mut().enumerate() {
            lane.read_eye = Some((8 + index as u16, 20 + index as u16));
        }
        SimPhy {
            geometry: Geometry {
                nphases: 4,
                pix_data_size: 2 * modules,
                rdphase: 1,
                wrphase: 2,
                max_delay: 32,
            },
            lanes: lanes,
            dly_sel: 0,
            wrdata: [[0; 2 * MAX_MODULES]; MAX_PHASES],
            rddata: [[0; 2 * MAX_MODULES]; MAX_PHASES],
            open_row: None,
            bursts: HashMap::new(),
            strobes: 0,
            cdly: 0,
            command_eye: Some((0, 31)),
            ram: vec![0; SimPhy::RAM_WORDS],
            faults: Vec::new(),
            bitslip_preset: 0,
            control: 0,
            control_history: Vec::new(),
            mode_registers: [0; 8],
            zq_calibrations: 0,
            wlevel_en: false,
            bitslips: [0; MAX_MODULES],
            slips_since_reset: [0; MAX_MODULES],
            vtc: true,
            vtc_history: Vec::new(),
            ram_writes: 0,
            spun: 0,
        }
    }

    pub fn with_read_eye(mut self, lane: usize, first: u16, last: u16) -> SimPhy {
        self.lanes[lane].read_eye = Some((first, last));
        self
    }

    pub fn without_read_eye(mut self, lane: usize) -> SimPhy {
        self.lanes[lane].read_eye = None;
        self
    }

    pub fn with_wlevel_edge(mut self, lane: usize, edge: u16) -> SimPhy {
        self.lanes[lane].leveling = Leveling::Edge(edge);
        self
    }

    pub fn with_wlevel_high_skew(mut self, lane: usize, zero_from: u16, edge: u16) -> SimPhy {
        self.lanes[lane].leveling = Leveling::HighSkew(zero_from, edge);
        self
    }

    pub fn with_wlevel_stuck_high(mut self, lane: usize) -> SimPhy {
        self.lanes[lane].leveling = Leveling::StuckHigh;
        self
    }

    /// Every `period`-th strobe returns inverted feedback on `lane`.
    pub fn with_wlevel_glitch(mut self, lane: usize, period: usize) -> SimPhy {
        self.lanes[lane].glitch = Some(period);
        self
    }

    pub fn with_command_eye(mut self, first: u16, last: u16) -> SimPhy {
        self.command_eye = Some((first, last));
        self
    }

    pub fn without_command_eye(mut self) -> SimPhy {
        self.command_eye = None;
        self
    }

    /// Flips `mask` in every read of RAM word `index`.
    pub fn with_fault(mut self, index: usize, mask: u32) -> SimPhy {
        self.faults.push((index, mask));
        self
    }

    /// Reads only sample correctly with `slips` bitslips since the last
    /// read delay reset, and the PHY reports that preset.
    pub fn with_read_bitslip_preset(mut self, slips: u8) -> SimPhy {
        self.bitslip_preset = slips;
        self
    }

    pub fn read_delay(&self, lane: usize) -> u16 {
        self.lanes[lane].rdly
    }

    pub fn command_delay(&self) -> u16 {
        self.cdly
    }

    fn selected(&self) -> Vec<usize> {
        (0..self.geometry.modules()).filter(|&lane| self.dly_sel & (1 << lane) != 0).collect()
    }

    fn lane_of_offset(&self, offset: usize) -> usize {
        let modules = self.geometry.modules();
        modules - 1 - offset % modules
    }

    fn commands_ok(&self) -> bool {
        match self.command_eye {
            Some((first, last)) => self.cdly >= first && self.cdly <= last,
            None => false,
        }
    }

    fn reads_ok(&self, lane: usize) -> bool {
        let rdly = self.lanes[lane].rdly;
        let aligned = self.bitslip_preset == 0 ||
            self.slips_since_reset[lane] % 8 == self.bitslip_preset;
        aligned && self.commands_ok() && match self.lanes[lane].read_eye {
            Some((first, last)) => rdly >= first && rdly <= last,
            None => false,
        }
    }

    fn leveling_feedback(&self, lane: usize, strobe: usize) -> bool {
        let tap = self.lanes[lane].wdly_dqs;
        let feedback = match self.lanes[lane].leveling {
            Leveling::Edge(edge) => tap >= edge,
            Leveling::HighSkew(zero_from, edge) => tap < zero_from || tap >= edge,
            Leveling::StuckHigh => true,
        };
        match self.lanes[lane].glitch {
            Some(period) if strobe % period == period - 1 => !feedback,
            _ => feedback,
        }
    }

    fn burst_read(&mut self, row: u16, column: u16) {
        let geometry = self.geometry;
        // The MPR is read with the delay lines still untrained.
        let mpr = self.mode_registers[3] & (1 << 2) != 0;
        let stored = self.bursts.get(&(row, column)).cloned()
            .unwrap_or_else(|| vec![0; geometry.pattern_len()]);
        for p in 0..geometry.nphases {
            for offset in 0..geometry.pix_data_size {
                let lane = self.lane_of_offset(offset);
                self.rddata[p][offset] = if mpr {
                    if offset < geometry.modules() { 0x00 } else { 0xff }
                } else if self.reads_ok(lane) {
                    stored[p * geometry.pix_data_size + offset]
                } else {
                    !stored[p * geometry.pix_data_size + offset]
                };
            }
        }
    }

    fn burst_write(&mut self, row: u16, column: u16) {
        let geometry = self.geometry;
        let mut burst = Vec::new();
        for p in 0..geometry.nphases {
            burst.extend_from_slice(&self.wrdata[p][..geometry.pix_data_size]);
        }
        self.bursts.insert((row, column), burst);
    }
}

impl Phy for SimPhy {
    const WRITE_LEVELING: bool = true;
    const READ_LEVELING: bool = true;
    const VTC: bool = true;

    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn control_write(&mut self, value: u8) {
        self.control = value;
        self.control_history.push(value);
    }

    fn command(&mut self, _phase: usize, address: u16, baddress: u8, command: u8) {
        match (command, self.open_row) {
            (MRS, _) => self.mode_registers[baddress as usize & 7] = address,
            (ACTIVATE, _) => self.open_row = Some(address),
            (PRECHARGE, _) => self.open_row = None,
            (ZQCL, _) => self.zq_calibrations += 1,
            (WRITE, Some(row)) => self.burst_write(row, address),
            (READ, Some(row)) => self.burst_read(row, address),
            (READ, None) => self.burst_read(0, address),
            _ => (),
        }
    }

    fn wrdata_write(&mut self, phase: usize, offset: usize, data: u8) {
        self.wrdata[phase][offset] = data;
    }

    fn rddata_read(&mut self, phase: usize, offset: usize) -> u8 {
        self.rddata[phase][offset]
    }

    fn dly_sel_write(&mut self, mask: u8) {
        self.dly_sel = mask;
    }

    fn rdly_dq_rst(&mut self) {
        for lane in self.selected() {
            self.lanes[lane].rdly = 0;
            self.slips_since_reset[lane] = 0;
        }
    }

    fn rdly_dq_inc(&mut self) {
        for lane in self.selected() {
            self.lanes[lane].rdly += 1;
        }
    }

    fn rdly_dq_bitslip(&mut self) {
        for lane in self.selected() {
            self.bitslips[lane] += 1;
            self.slips_since_reset[lane] += 1;
        }
    }

    fn wdly_dqs_rst(&mut self) {
        for lane in self.selected() {
            self.lanes[lane].wdly_dqs = 0;
        }
    }

    fn wdly_dqs_inc(&mut self) {
        for lane in self.selected() {
            self.lanes[lane].wdly_dqs += 1;
        }
    }

    fn wlevel_en_write(&mut self, enabled: bool) {
        self.wlevel_en = enabled;
    }

    fn wlevel_strobe(&mut self) {
        if !self.wlevel_en {
            return
        }
        let strobe = self.strobes;
        self.strobes += 1;
        for lane in 0..self.geometry.modules() {
            let offset = self.geometry.lane_offsets(lane)[0];
            self.rddata[0][offset] = if self.leveling_feedback(lane, strobe) { 1 } else { 0 };
        }
    }

    fn en_vtc_write(&mut self, enabled: bool) {
        self.vtc = enabled;
        self.vtc_history.push(enabled);
    }

    fn spin_cycles(&mut self, cycles: usize) {
        self.spun += cycles;
    }

    fn rdly_dq_bitslip_preset(&self) -> u8 {
        self.bitslip_preset
    }

    fn ram_base(&self) -> usize {
        SimPhy::RAM_BASE
    }

    fn ram_words(&self) -> usize {
        self.ram.len()
    }

    fn ram_read(&mut self, index: usize) -> u32 {
        if self.control & DFII_CONTROL_SEL == 0 {
            return 0
        }
        let mut word = self.ram[index];
        // Byte b of a word travels on lane b modulo the lane count.
        for byte in 0..4 {
            if !self.reads_ok(byte % self.geometry.modules()) {
                word ^= 0xffu32 << (8 * byte);
            }
        }
        for &(address, mask) in self.faults.iter() {
            if address == index {
                word ^= mask;
            }
        }
        word
    }

    fn ram_write(&mut self, index: usize, data: u32) {
        self.ram_writes += 1;
        if self.control & DFII_CONTROL_SEL != 0 {
            self.ram[index] = data;
        }
    }
}

impl CommandDelay for SimPhy {
    fn cdly_rst(&mut self) {
        self.cdly = 0;
    }

    fn cdly_inc(&mut self) {
        self.cdly += 1;
    }
}
