use crate::backend::PmuBackend;
use crate::counter::CycleCounter;
use crate::Timestamp;
use portable_atomic::{AtomicU64, Ordering};

const HALF_RANGE: u32 = 1 << 31;

/// A 64-bit cycle counter built on the 32-bit hardware one.
///
/// The hardware counter wraps every 2^32 cycles (a few seconds at 1 GHz). This keeps the last
/// 64-bit count seen and carries wraps into `hi`, which only works if it is read at least once
/// every 2^31 cycles. Lock free, shareable across threads.
pub struct ExtendedCounter<B: PmuBackend> {
    counter: CycleCounter<B>,
    last: AtomicU64,
}

impl<B: PmuBackend> ExtendedCounter<B> {
    /// Takes over `counter` and reads it once to seed the epoch.
    pub fn new(counter: CycleCounter<B>) -> Self {
        let first = counter.raw_read();
        ExtendedCounter {
            counter,
            last: AtomicU64::new(first as u64),
        }
    }

    pub fn counter(&self) -> &CycleCounter<B> {
        &self.counter
    }

    /// Current count with the software-maintained wrap count in `hi`.
    pub fn read(&self) -> Timestamp {
        let raw = self.counter.raw_read();
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let forward = raw.wrapping_sub(last as u32);
            if forward >= HALF_RANGE {
                // Sampled before a concurrent reader stored a newer count: place it behind.
                let behind = (last as u32).wrapping_sub(raw);
                return Timestamp::from(last.saturating_sub(behind as u64));
            }
            let next = last + forward as u64;
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Timestamp::from(next),
                Err(actual) => last = actual,
            }
        }
    }
}

/// Full 64-bit cycles from `t0` to `t1`, 0 if `t1` is earlier.
#[inline]
pub fn difference64(t0: Timestamp, t1: Timestamp) -> u64 {
    t1.as_u64().saturating_sub(t0.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPmu;

    #[test]
    fn test_carries_wraps_into_high_half() {
        let mock = MockPmu::new();
        let counter = CycleCounter::new(mock.clone());
        counter.raw_read();
        mock.set_count(0xFFFF_FF00);
        let ext = ExtendedCounter::new(counter);
        let t0 = ext.read();
        assert_eq!(t0, Timestamp::new(0, 0xFFFF_FF00));

        mock.advance(0x200);
        let t1 = ext.read();
        assert_eq!(t1, Timestamp::new(1, 0x100));
        assert_eq!(difference64(t0, t1), 0x200);

        for _ in 0..12 {
            mock.advance(0x4000_0000);
            ext.read();
        }
        assert_eq!(ext.read(), Timestamp::new(4, 0x100));
    }

    #[test]
    fn test_stale_sample_does_not_move_state_back() {
        let mock = MockPmu::new();
        let ext = ExtendedCounter::new(CycleCounter::new(mock.clone()));
        mock.set_count(1_000);
        assert_eq!(ext.read().lo, 1_000);

        mock.set_count(900);
        assert_eq!(ext.read(), Timestamp::new(0, 900));

        mock.set_count(1_100);
        assert_eq!(ext.read(), Timestamp::new(0, 1_100));
    }

    #[test]
    fn test_reads_too_far_apart_lose_a_wrap() {
        let mock = MockPmu::new();
        let counter = CycleCounter::new(mock.clone());
        counter.raw_read();
        mock.set_count(0x1000);
        let ext = ExtendedCounter::new(counter);

        // 2^31 cycles without a read looks like a sample from the past
        mock.advance(0x8000_0000);
        let behind = ext.read();
        assert!(behind < Timestamp::new(0, 0x1000));

        // another 2^31 lands back on the stored low half: a full wrap went unseen
        mock.advance(0x8000_0000);
        assert_eq!(ext.read(), Timestamp::new(0, 0x1000));
    }

    #[test]
    fn test_difference64_saturates() {
        let t0 = Timestamp::new(2, 0);
        let t1 = Timestamp::new(1, 0);
        assert_eq!(difference64(t0, t1), 0);
        assert_eq!(difference64(t1, t0), 1 << 32);
    }

    #[test]
    fn test_concurrent_reads_stay_monotonic_per_thread() {
        let mock = MockPmu::new();
        mock.set_step(7);
        let ext = ExtendedCounter::new(CycleCounter::new(mock.clone()));
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let mut prev = ext.read();
                    for _ in 0..1_000 {
                        let next = ext.read();
                        assert!(next >= prev);
                        prev = next;
                    }
                });
            }
        });
    }
}
