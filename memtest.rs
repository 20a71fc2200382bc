//! Post-calibration validation of main RAM through the controller.

use core::fmt;
use mode::Hardware;
use phy::Phy;

/// Mismatches kept for inspection; the rest are only counted.
pub const MAX_MISMATCHES: usize = 16;

/// Numerical Recipes LCG, cheap enough to regenerate instead of storing.
pub fn prng32(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mismatch {
    pub address:  usize,
    pub expected: u32,
    pub observed: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct TestOutcome {
    pub errors: usize,
    pub total:  usize,
    mismatches: [Mismatch; MAX_MISMATCHES],
    kept:       usize,
}

impl TestOutcome {
    fn new(total: usize) -> TestOutcome {
        TestOutcome {
            errors: 0,
            total: total,
            mismatches: [Mismatch::default(); MAX_MISMATCHES],
            kept: 0,
        }
    }

    fn record(&mut self, mismatch: Mismatch) {
        self.errors += 1;
        if self.kept < MAX_MISMATCHES {
            self.mismatches[self.kept] = mismatch;
            self.kept += 1;
        }
    }

    pub fn passed(&self) -> bool {
        self.errors == 0
    }

    /// The first mismatches found, in address order.
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches[..self.kept]
    }
}

impl<'a, P: Phy + 'a> Hardware<'a, P> {
    fn run<F>(&mut self, mut on_mismatch: F) -> TestOutcome
            where F: FnMut(&Mismatch) {
        let phy = &mut self.sdram.phy;
        let words = ::core::cmp::min(self.sdram.config.memtest_words, phy.ram_words());
        let base = phy.ram_base();

        let mut seed = 0;
        for index in 0..words {
            phy.ram_write(index, prng32(&mut seed));
        }
        phy.flush_caches();

        let mut outcome = TestOutcome::new(words);
        let mut seed = 0;
        for index in 0..words {
            let expected = prng32(&mut seed);
            let observed = phy.ram_read(index);
            if observed != expected {
                let mismatch = Mismatch {
                    address: base + index * 4,
                    expected: expected,
                    observed: observed,
                };
                on_mismatch(&mismatch);
                outcome.record(mismatch);
            }
        }
        outcome
    }

    pub fn memtest_silent(&mut self) -> TestOutcome {
        self.run(|_| ())
    }

    /// Prints every mismatch as it is found, then a summary line.
    pub fn memtest(&mut self, console: &mut Option<&mut dyn fmt::Write>) -> TestOutcome {
        let outcome = self.run(|mismatch| {
            trace!("memtest: {:#010x} expected {:#010x} got {:#010x}",
                   mismatch.address, mismatch.expected, mismatch.observed);
            report!(console, "  {:#010x}: expected {:08x}, read {:08x}\n",
                    mismatch.address, mismatch.expected, mismatch.observed);
        });
        if outcome.passed() {
            info!("memory test passed ({} words)", outcome.total);
            report!(console, "Memtest: OK\n");
        } else {
            error!("memory test failed ({}/{} words incorrect)", outcome.errors, outcome.total);
            report!(console, "Memtest: {}/{} words incorrect\n", outcome.errors, outcome.total);
        }
        outcome
    }
}
