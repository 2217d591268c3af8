//! An instrumented PMU model for tests.
//!
//! Clones share the same registers, so a test can keep one handle to drive the count while a
//! [`crate::CycleCounter`] owns another.

use crate::backend::{PmuBackend, PmuRegister};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
struct MockState {
    writes: Vec<(PmuRegister, u32)>,
    count: u32,
    step: u32,
    user_access: bool,
}

/// A fake PMU controlled by the test.
///
/// Every register write is recorded. Each read returns the current count and then advances it by
/// the configured step (0 by default), wrapping like the hardware does.
#[derive(Debug, Clone)]
pub struct MockPmu(Arc<Mutex<MockState>>);

impl MockPmu {
    pub fn new() -> Self {
        MockPmu(Arc::new(Mutex::new(MockState {
            writes: Vec::new(),
            count: 0,
            step: 0,
            user_access: true,
        })))
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        let Self(state) = self;
        // A test thread panicking mid-write leaves nothing inconsistent behind.
        state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sets the value of the count register.
    pub fn set_count(&self, count: u32) {
        self.state().count = count;
    }

    /// Advances the count register, wrapping at 2^32.
    pub fn advance(&self, cycles: u32) {
        let mut state = self.state();
        state.count = state.count.wrapping_add(cycles);
    }

    /// Sets how far each read advances the count.
    pub fn set_step(&self, step: u32) {
        self.state().step = step;
    }

    pub fn set_user_access(&self, enabled: bool) {
        self.state().user_access = enabled;
    }

    pub fn count(&self) -> u32 {
        self.state().count
    }

    /// All register writes so far, oldest first.
    pub fn writes(&self) -> Vec<(PmuRegister, u32)> {
        self.state().writes.clone()
    }

    /// Number of writes to any of the PMU control registers.
    pub fn write_count(&self) -> usize {
        self.state().writes.len()
    }
}

impl Default for MockPmu {
    fn default() -> Self {
        Self::new()
    }
}

impl PmuBackend for MockPmu {
    fn write(&self, register: PmuRegister, value: u32) {
        let mut state = self.state();
        state.writes.push((register, value));
        // PMCR.C resets the cycle counter.
        if register == PmuRegister::Control && value & 0b100 != 0 {
            state.count = 0;
        }
    }

    fn read_cycle_count(&self) -> u32 {
        let mut state = self.state();
        let current = state.count;
        state.count = current.wrapping_add(state.step);
        current
    }

    fn user_access_enabled(&self) -> bool {
        self.state().user_access
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_registers() {
        let mock = MockPmu::new();
        let other = mock.clone();
        mock.set_count(10);
        assert_eq!(other.read_cycle_count(), 10);
        other.write(PmuRegister::CountEnableSet, 1 << 31);
        assert_eq!(mock.writes(), vec![(PmuRegister::CountEnableSet, 1 << 31)]);
    }

    #[test]
    fn test_step_wraps() {
        let mock = MockPmu::new();
        mock.set_count(u32::MAX - 1);
        mock.set_step(3);
        assert_eq!(mock.read_cycle_count(), u32::MAX - 1);
        assert_eq!(mock.read_cycle_count(), 1);
    }

    #[test]
    fn test_control_reset_clears_count() {
        let mock = MockPmu::new();
        mock.set_count(1234);
        mock.write(PmuRegister::Control, 5);
        assert_eq!(mock.count(), 0);
    }
}
