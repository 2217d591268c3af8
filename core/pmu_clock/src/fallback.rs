use crate::backend::{PmuBackend, PmuRegister};
use log::trace;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};
use quanta::Clock;

/// Stand-in for the PMU on targets without CP15, so code built on this crate runs on a dev box.
///
/// Counts host TSC/system-counter ticks truncated to 32 bits instead of CPU cycles. Honors the
/// enable registers: while stopped it keeps returning the value it had when it was stopped.
#[derive(Debug)]
pub struct HostCounter {
    clock: Clock,
    running: AtomicBool,
    frozen: AtomicU32,
}

impl HostCounter {
    pub fn new() -> Self {
        HostCounter {
            clock: Clock::new(),
            running: AtomicBool::new(true),
            frozen: AtomicU32::new(0),
        }
    }

    #[inline]
    fn live(&self) -> u32 {
        self.clock.raw() as u32
    }
}

impl Default for HostCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl PmuBackend for HostCounter {
    fn write(&self, register: PmuRegister, value: u32) {
        trace!("host counter: write {register:?} <- {value:#x}");
        match register {
            PmuRegister::CountEnableClear if value & (1 << 31) != 0 => {
                self.frozen.store(self.live(), Ordering::Relaxed);
                self.running.store(false, Ordering::Release);
            }
            PmuRegister::CountEnableSet if value & (1 << 31) != 0 => {
                self.running.store(true, Ordering::Release);
            }
            // Resetting CCNT has no host equivalent; the raw clock keeps its origin.
            _ => {}
        }
    }

    #[inline]
    fn read_cycle_count(&self) -> u32 {
        if self.running.load(Ordering::Acquire) {
            self.live()
        } else {
            self.frozen.load(Ordering::Relaxed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_counter_is_frozen() {
        let host = HostCounter::new();
        host.write(PmuRegister::CountEnableClear, 1 << 31);
        let a = host.read_cycle_count();
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert_eq!(host.read_cycle_count(), a);
        host.write(PmuRegister::CountEnableSet, 1 << 31);
        assert!(host.user_access_enabled());
    }
}
