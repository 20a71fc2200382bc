//! Raw DFI commands issued while the injector is under software control.

use core::fmt;
use byteorder::{ByteOrder, BigEndian};
use mode::Software;
use memtest::prng32;
use phy::{Phy, Geometry, MAX_PHASES, MAX_MODULES};
use phy::{DFII_COMMAND_CS, DFII_COMMAND_WE, DFII_COMMAND_CAS, DFII_COMMAND_RAS,
          DFII_COMMAND_WRDATA, DFII_COMMAND_RDDATA};

const MAX_PIX_DATA_SIZE: usize = 2 * MAX_MODULES;
const MAX_PATTERN_LEN: usize = MAX_PHASES * MAX_PIX_DATA_SIZE;

/// DDR3 MPR page 0: every DQ toggles 0, 1, 0, 1, ... across the burst.
const MPR_RISE: u8 = 0x00;
const MPR_FALL: u8 = 0xff;

/// Data loaded into the write buffers of every phase.
#[derive(Clone, Copy)]
pub struct Pattern {
    data:          [u8; MAX_PATTERN_LEN],
    pix_data_size: usize,
    len:           usize,
}

impl Pattern {
    fn empty(geometry: &Geometry) -> Pattern {
        Pattern {
            data: [0; MAX_PATTERN_LEN],
            pix_data_size: geometry.pix_data_size,
            len: geometry.pattern_len(),
        }
    }

    /// `0x10 * phase + byte`, easy to recognize in a buffer dump.
    pub fn sequential(geometry: &Geometry) -> Pattern {
        let mut pattern = Pattern::empty(geometry);
        for p in 0..geometry.nphases {
            for i in 0..geometry.pix_data_size {
                pattern.data[geometry.pix_data_size * p + i] = (0x10 * p + i) as u8;
            }
        }
        pattern
    }

    pub fn pseudo_random(geometry: &Geometry, mut seed: u32) -> Pattern {
        let mut pattern = Pattern::empty(geometry);
        let len = pattern.len;
        for chunk in pattern.data[..len].chunks_mut(4) {
            let mut word = [0; 4];
            BigEndian::write_u32(&mut word, prng32(&mut seed));
            let n = chunk.len();
            chunk.copy_from_slice(&word[..n]);
        }
        pattern
    }

    pub fn byte(&self, phase: usize, offset: usize) -> u8 {
        self.data[self.pix_data_size * phase + offset]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.as_bytes().iter()).finish()
    }
}

/// Snapshot of every phase's read data registers.
#[derive(Debug, Clone, Copy)]
pub struct CaptureBuffer {
    data:     [[u8; MAX_PIX_DATA_SIZE]; MAX_PHASES],
    geometry: Geometry,
}

impl CaptureBuffer {
    pub fn byte(&self, phase: usize, offset: usize) -> u8 {
        self.data[phase][offset]
    }

    pub fn lane(&self, module: usize) -> CaptureSample {
        let mut sample = CaptureSample {
            data: [[0; 2]; MAX_PHASES],
            nphases: self.geometry.nphases,
        };
        let offsets = self.geometry.lane_offsets(module);
        for p in 0..self.geometry.nphases {
            sample.data[p] = [self.data[p][offsets[0]], self.data[p][offsets[1]]];
        }
        sample
    }
}

/// The rising and falling bytes one lane returned in each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSample {
    data:    [[u8; 2]; MAX_PHASES],
    nphases: usize,
}

impl CaptureSample {
    pub fn phases(&self) -> &[[u8; 2]] {
        &self.data[..self.nphases]
    }

    pub fn is_mpr_pattern(&self) -> bool {
        self.phases().iter().all(|&[rise, fall]| rise == MPR_RISE && fall == MPR_FALL)
    }
}

impl<'a, P: Phy + 'a> Software<'a, P> {
    pub fn activate_row(&mut self, row: u16) {
        self.sdram.phy.command(0, row, 0, DFII_COMMAND_RAS|DFII_COMMAND_CS);
        self.settle();
    }

    pub fn precharge_all(&mut self) {
        self.sdram.phy.command(0, 0x400, 0, DFII_COMMAND_RAS|DFII_COMMAND_WE|DFII_COMMAND_CS);
        self.settle();
    }

    /// Fills the write buffers; also the reference for error counting.
    pub fn load_pattern(&mut self, pattern: &Pattern) {
        let geometry = self.sdram.geometry();
        for p in 0..geometry.nphases {
            for offset in 0..geometry.pix_data_size {
                self.sdram.phy.wrdata_write(p, offset, pattern.byte(p, offset));
            }
        }
        self.sdram.pattern = *pattern;
    }

    pub fn pattern(&self) -> &Pattern {
        &self.sdram.pattern
    }

    /// Writes the loaded pattern at `address` of the open row.
    pub fn write(&mut self, address: u16) {
        let wrphase = self.sdram.geometry().wrphase;
        self.sdram.phy.command(wrphase, address, 0,
                               DFII_COMMAND_CAS|DFII_COMMAND_WE|DFII_COMMAND_CS|
                               DFII_COMMAND_WRDATA);
        self.settle();
    }

    /// Reads `address` of the open row into the read buffers.
    pub fn read(&mut self, address: u16) {
        let rdphase = self.sdram.geometry().rdphase;
        self.sdram.phy.command(rdphase, address, 0,
                               DFII_COMMAND_CAS|DFII_COMMAND_CS|DFII_COMMAND_RDDATA);
        self.settle();
    }

    /// Contents of the read buffers; the next read overwrites them.
    pub fn capture(&mut self) -> CaptureBuffer {
        let geometry = self.sdram.geometry();
        let mut buffer = CaptureBuffer {
            data: [[0; MAX_PIX_DATA_SIZE]; MAX_PHASES],
            geometry: geometry,
        };
        for p in 0..geometry.nphases {
            for offset in 0..geometry.pix_data_size {
                buffer.data[p][offset] = self.sdram.phy.rddata_read(p, offset);
            }
        }
        buffer
    }

    pub fn capture_buffer(&mut self, module: usize) -> CaptureSample {
        self.capture().lane(module)
    }

    /// Prints the read buffers, for one lane or all of them.
    pub fn dump_buffer(&mut self, console: &mut dyn fmt::Write, module: Option<usize>) -> fmt::Result {
        let geometry = self.sdram.geometry();
        let (first, step) = match module {
            None => (0, 1),
            Some(module) => (geometry.modules() - 1 - module, geometry.modules()),
        };
        let buffer = self.capture();
        for p in 0..geometry.nphases {
            let mut offset = first;
            while offset < geometry.pix_data_size {
                write!(console, "{:02x}", buffer.byte(p, offset))?;
                offset += step;
            }
        }
        writeln!(console)
    }

    fn count_errors(&mut self, modules: &[usize]) -> u32 {
        let geometry = self.sdram.geometry();
        let mut errors = 0;
        for p in 0..geometry.nphases {
            for &module in modules {
                for &offset in geometry.lane_offsets(module).iter() {
                    let data = self.sdram.phy.rddata_read(p, offset);
                    errors += (data ^ self.sdram.pattern.byte(p, offset)).count_ones();
                }
            }
        }
        errors
    }

    /// Bit errors against the loaded pattern over `iterations` reads of `address`.
    pub fn read_error_count(&mut self, address: u16, iterations: usize) -> u32 {
        let mut modules = [0; MAX_MODULES];
        let count = self.sdram.geometry().modules();
        for (index, module) in modules.iter_mut().enumerate() {
            *module = index;
        }
        let mut errors = 0;
        for _ in 0..iterations {
            self.read(address);
            errors += self.count_errors(&modules[..count]);
        }
        errors
    }

    pub fn lane_error_count(&mut self, address: u16, module: usize, iterations: usize) -> u32 {
        let mut errors = 0;
        for _ in 0..iterations {
            self.read(address);
            errors += self.count_errors(&[module]);
        }
        errors
    }
}
