// --- ARMv7-A PMU through CP15.

use crate::backend::{PmuBackend, PmuRegister};
use core::arch::asm;

/// The real cycle counter.
///
/// Every access traps unless PMUSERENR.EN was set from PL1 beforehand.
#[derive(Copy, Clone, Debug, Default)]
pub struct Cp15;

impl PmuBackend for Cp15 {
    #[inline(always)]
    fn write(&self, register: PmuRegister, value: u32) {
        // SAFETY: writes to the PMU control registers only change counter state.
        // PL0 access is granted by the kernel module, see the crate docs.
        unsafe {
            match register {
                PmuRegister::Control => asm!(
                    "mcr p15, 0, {}, c9, c12, 0",
                    in(reg) value,
                    options(nostack, preserves_flags)
                ),
                PmuRegister::CountEnableSet => asm!(
                    "mcr p15, 0, {}, c9, c12, 1",
                    "isb",
                    in(reg) value,
                    options(nostack, preserves_flags)
                ),
                PmuRegister::CountEnableClear => asm!(
                    "mcr p15, 0, {}, c9, c12, 2",
                    in(reg) value,
                    options(nostack, preserves_flags)
                ),
            }
        }
    }

    #[inline(always)]
    fn read_cycle_count(&self) -> u32 {
        let counter: u32;
        // SAFETY: reading PMCCNTR has no side effects.
        // No `nomem`: the read must stay ordered with the memory accesses it brackets.
        unsafe {
            asm!(
                "mrc p15, 0, {}, c9, c13, 0",
                out(reg) counter,
                options(nostack, preserves_flags)
            );
        }
        counter
    }

    fn user_access_enabled(&self) -> bool {
        let pmuserenr: u32;
        // SAFETY: PMUSERENR is readable from PL0 regardless of its own EN bit.
        unsafe {
            asm!(
                "mrc p15, 0, {}, c9, c14, 0",
                out(reg) pmuserenr,
                options(nomem, nostack, preserves_flags)
            );
        }
        pmuserenr & 1 == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CycleCounter;

    // needs the PMU user access kernel module loaded on the board,
    // run it explicitly with `cargo test measured_stores_stay_in_window -- --ignored`
    #[ignore]
    #[test]
    fn measured_stores_stay_in_window() {
        let counter = CycleCounter::try_new(Cp15).unwrap();
        let mut buf = [0u32; 256];
        let (_, delta) = counter.measure(|| {
            for (i, slot) in buf.iter_mut().enumerate() {
                *slot = i as u32;
            }
        });
        assert_eq!(buf[255], 255);
        // even as 16 byte vector stores the buffer takes 64 stores
        assert!(delta.cycles() >= 256 / 4);
    }
}
