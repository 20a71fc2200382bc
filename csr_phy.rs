//! [`Phy`] over the MiSoC DFII injector and DDRPHY control registers.

use core::ptr;
use csr::dfii;
#[cfg(has_ddrphy)]
use csr::ddrphy;
use mem;
use sdram_phy::{self, DFII_NPHASES, DFII_PIX_DATA_SIZE, DFII_PIX_WRDATA_ADDR,
                DFII_PIX_RDDATA_ADDR};
use phy::{Phy, Geometry};
#[cfg(ddrphy_cdly)]
use phy::CommandDelay;

#[cfg(kusddrphy)]
const DDRPHY_MAX_DELAY: u16 = 512;
#[cfg(not(kusddrphy))]
const DDRPHY_MAX_DELAY: u16 = 32;

// Phases behind command_prd/command_pwr in the generated sdram_phy.
const RDPHASE: usize = 1;
const WRPHASE: usize = 2;

const MAIN_RAM: *mut u32 = mem::MAIN_RAM_BASE as *mut u32;

pub struct MisocPhy {
    flush_cpu_dcache: Option<fn()>,
}

impl MisocPhy {
    pub fn new() -> MisocPhy {
        MisocPhy { flush_cpu_dcache: None }
    }

    /// The CPU data cache is flushed with `flush` before main RAM is read back.
    pub fn with_dcache_flush(flush: fn()) -> MisocPhy {
        MisocPhy { flush_cpu_dcache: Some(flush) }
    }
}

impl Phy for MisocPhy {
    const WRITE_LEVELING: bool = cfg!(ddrphy_wlevel);
    const READ_LEVELING: bool = cfg!(has_ddrphy);
    const VTC: bool = cfg!(kusddrphy);
    #[cfg(kusddrphy)]
    const HIGH_SKEW_BITSLIPS: u8 = 1;

    fn geometry(&self) -> Geometry {
        Geometry {
            nphases: DFII_NPHASES,
            pix_data_size: DFII_PIX_DATA_SIZE,
            rdphase: RDPHASE,
            wrphase: WRPHASE,
            max_delay: DDRPHY_MAX_DELAY,
        }
    }

    fn control_write(&mut self, value: u8) {
        unsafe { dfii::control_write(value) }
    }

    fn command(&mut self, phase: usize, address: u16, baddress: u8, command: u8) {
        unsafe {
            match phase {
                0 => {
                    dfii::pi0_address_write(address);
                    dfii::pi0_baddress_write(baddress);
                    sdram_phy::command_p0(command);
                }
                1 => {
                    dfii::pi1_address_write(address);
                    dfii::pi1_baddress_write(baddress);
                    sdram_phy::command_p1(command);
                }
                2 => {
                    dfii::pi2_address_write(address);
                    dfii::pi2_baddress_write(baddress);
                    sdram_phy::command_p2(command);
                }
                3 => {
                    dfii::pi3_address_write(address);
                    dfii::pi3_baddress_write(baddress);
                    sdram_phy::command_p3(command);
                }
                _ => warn!("DFII has no phase {}", phase),
            }
        }
    }

    fn wrdata_write(&mut self, phase: usize, offset: usize, data: u8) {
        unsafe {
            ptr::write_volatile(DFII_PIX_WRDATA_ADDR[phase].offset(offset as isize), data as u32)
        }
    }

    fn rddata_read(&mut self, phase: usize, offset: usize) -> u8 {
        unsafe {
            ptr::read_volatile(DFII_PIX_RDDATA_ADDR[phase].offset(offset as isize)) as u8
        }
    }

    #[cfg(has_ddrphy)]
    fn dly_sel_write(&mut self, mask: u8) {
        unsafe { ddrphy::dly_sel_write(mask) }
    }
    #[cfg(not(has_ddrphy))]
    fn dly_sel_write(&mut self, _mask: u8) {}

    #[cfg(has_ddrphy)]
    fn rdly_dq_rst(&mut self) {
        unsafe { ddrphy::rdly_dq_rst_write(1) }
    }
    #[cfg(not(has_ddrphy))]
    fn rdly_dq_rst(&mut self) {}

    #[cfg(has_ddrphy)]
    fn rdly_dq_inc(&mut self) {
        unsafe { ddrphy::rdly_dq_inc_write(1) }
    }
    #[cfg(not(has_ddrphy))]
    fn rdly_dq_inc(&mut self) {}

    #[cfg(has_ddrphy)]
    fn rdly_dq_bitslip(&mut self) {
        unsafe { ddrphy::rdly_dq_bitslip_write(1) }
    }
    #[cfg(not(has_ddrphy))]
    fn rdly_dq_bitslip(&mut self) {}

    #[cfg(soc_platform = "kasli")]
    fn rdly_dq_bitslip_preset(&self) -> u8 { 3 }

    #[cfg(ddrphy_wlevel)]
    fn wdly_dq_rst(&mut self) {
        unsafe { ddrphy::wdly_dq_rst_write(1) }
    }

    #[cfg(ddrphy_wlevel)]
    fn wdly_dq_inc(&mut self) {
        unsafe { ddrphy::wdly_dq_inc_write(1) }
    }

    #[cfg(ddrphy_wlevel)]
    fn wdly_dqs_rst(&mut self) {
        unsafe { ddrphy::wdly_dqs_rst_write(1) }
    }

    #[cfg(ddrphy_wlevel)]
    fn wdly_dqs_inc(&mut self) {
        unsafe { ddrphy::wdly_dqs_inc_write(1) }
    }

    #[cfg(kusddrphy)]
    fn wdly_dqs_taps(&self) -> u16 {
        unsafe { ddrphy::wdly_dqs_taps_read() }
    }

    #[cfg(ddrphy_wlevel)]
    fn wlevel_en_write(&mut self, enabled: bool) {
        unsafe { ddrphy::wlevel_en_write(enabled as u8) }
    }

    #[cfg(ddrphy_wlevel)]
    fn wlevel_strobe(&mut self) {
        unsafe { ddrphy::wlevel_strobe_write(1) }
    }

    #[cfg(kusddrphy)]
    fn en_vtc_write(&mut self, enabled: bool) {
        unsafe { ddrphy::en_vtc_write(enabled as u8) }
    }

    fn spin_cycles(&mut self, cycles: usize) {
        sdram_phy::spin_cycles(cycles)
    }

    fn ram_base(&self) -> usize {
        mem::MAIN_RAM_BASE
    }

    fn ram_words(&self) -> usize {
        mem::MAIN_RAM_SIZE / 4
    }

    fn ram_read(&mut self, index: usize) -> u32 {
        unsafe { ptr::read_volatile(MAIN_RAM.offset(index as isize)) }
    }

    fn ram_write(&mut self, index: usize, data: u32) {
        unsafe { ptr::write_volatile(MAIN_RAM.offset(index as isize), data) }
    }

    fn flush_caches(&mut self) {
        if let Some(flush) = self.flush_cpu_dcache {
            flush();
        }
        // Evict the L2 by reading twice its size of main RAM.
        #[cfg(has_ddrphy)]
        for index in 0..2 * (::csr::CONFIG_L2_SIZE as usize) / 4 {
            unsafe { ptr::read_volatile(MAIN_RAM.offset(index as isize)); }
        }
    }
}

#[cfg(ddrphy_cdly)]
impl CommandDelay for MisocPhy {
    fn cdly_rst(&mut self) {
        unsafe { ddrphy::cdly_rst_write(1) }
    }

    fn cdly_inc(&mut self) {
        unsafe { ddrphy::cdly_inc_write(1) }
    }
}
