use crate::backend::{PmuBackend, PmuRegister};
use crate::error::{PmuError, PmuResult};
use crate::{difference, CycleDelta, Timestamp};
use log::{debug, warn};
use std::sync::Once;

const COUNTER_BIT: u32 = 1 << 31;
/// PMCR.E | PMCR.C: enable the counters and reset the cycle counter.
const PMCR_ENABLE_AND_RESET: u32 = 5;

/// Handle on one PMU cycle counter.
///
/// The counter is stopped, reset and restarted on the first read through this handle, exactly
/// once even when several threads race that first read. Build one per process for the hardware
/// backend, [`crate::global`] does that for you.
pub struct CycleCounter<B: PmuBackend> {
    backend: B,
    init: Once,
}

impl<B: PmuBackend> CycleCounter<B> {
    /// Wraps a backend without touching the hardware.
    pub fn new(backend: B) -> Self {
        CycleCounter {
            backend,
            init: Once::new(),
        }
    }

    /// Like [`CycleCounter::new`] but refuses a backend that would trap on the first access.
    pub fn try_new(backend: B) -> PmuResult<Self> {
        if !backend.user_access_enabled() {
            warn!("PMU user access is disabled, refusing to build a cycle counter");
            return Err(PmuError::UserAccessDisabled);
        }
        Ok(Self::new(backend))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether the enable sequence already ran for this handle.
    pub fn is_initialized(&self) -> bool {
        self.init.is_completed()
    }

    #[inline(always)]
    fn ensure_enabled(&self) {
        if !self.init.is_completed() {
            self.init.call_once(|| {
                self.backend.write(PmuRegister::CountEnableClear, COUNTER_BIT);
                self.backend.write(PmuRegister::Control, PMCR_ENABLE_AND_RESET);
                self.backend.write(PmuRegister::CountEnableSet, COUNTER_BIT);
                debug!("PMU cycle counter enabled");
            });
        }
    }

    /// Current value of the 32-bit cycle count register.
    #[inline]
    pub fn raw_read(&self) -> u32 {
        self.ensure_enabled();
        self.backend.read_cycle_count()
    }

    /// Current count as a [`Timestamp`]. `hi` is always 0.
    #[inline]
    pub fn wide_read(&self) -> Timestamp {
        Timestamp {
            hi: 0,
            lo: self.raw_read(),
        }
    }

    /// Runs `f` between two reads and returns its result with the cycles it took.
    #[inline]
    pub fn measure<R>(&self, f: impl FnOnce() -> R) -> (R, CycleDelta) {
        let start = self.wide_read();
        let result = f();
        let end = self.wide_read();
        (result, difference(start, end))
    }
}

impl<B: PmuBackend + Default> Default for CycleCounter<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

impl<B: PmuBackend + std::fmt::Debug> std::fmt::Debug for CycleCounter<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleCounter")
            .field("backend", &self.backend)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
