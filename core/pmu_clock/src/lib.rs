//! Cycle-accurate timing on ARMv7-A through the PMU cycle counter (CCNT).
//!
//! The counter must be readable from user mode before anything here runs: a kernel module has to
//! set PMUSERENR.EN, otherwise the first CP15 access traps and the process dies with SIGILL.
//! [`CycleCounter::try_new`] checks that bit up front.
//!
//! ```no_run
//! use pmu_clock::{difference, wide_read};
//!
//! let t0 = wide_read();
//! // hot path
//! let t1 = wide_read();
//! println!("{}", difference(t0, t1));
//! ```
#[cfg(all(target_arch = "arm", target_feature = "mclass"))]
compile_error!("M-profile cores have no CP15 PMU, use the DWT cycle counter instead");

#[cfg(all(target_arch = "arm", not(target_feature = "mclass")))]
mod armv7a;
mod backend;
mod counter;
mod error;
mod extended;
#[cfg(not(target_arch = "arm"))]
mod fallback;
pub mod mock;

#[cfg(all(target_arch = "arm", not(target_feature = "mclass")))]
pub use armv7a::Cp15;
pub use backend::{DefaultBackend, PmuBackend, PmuRegister};
pub use counter::CycleCounter;
pub use error::{PmuError, PmuResult};
pub use extended::{difference64, ExtendedCounter};
#[cfg(not(target_arch = "arm"))]
pub use fallback::HostCounter;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

/// A cycle count split in two 32-bit halves.
///
/// [`CycleCounter::wide_read`] only ever fills `lo`: the hardware register is 32 bits wide and `hi`
/// stays 0. [`ExtendedCounter`] is the only producer of a non-zero `hi`.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct Timestamp {
    pub hi: u32,
    pub lo: u32,
}

impl Timestamp {
    pub const fn new(hi: u32, lo: u32) -> Self {
        Timestamp { hi, lo }
    }

    #[inline]
    pub const fn as_u64(&self) -> u64 {
        ((self.hi as u64) << 32) | self.lo as u64
    }

    /// Low-order cycles elapsed from `earlier` to `self`, see [`difference`].
    #[inline]
    pub fn cycles_since(self, earlier: Timestamp) -> CycleDelta {
        difference(earlier, self)
    }
}

impl From<u64> for Timestamp {
    fn from(count: u64) -> Self {
        Timestamp {
            hi: (count >> 32) as u32,
            lo: count as u32,
        }
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.as_u64()
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}:{:#010x}", self.hi, self.lo)
    }
}

/// Elapsed low-order cycles between two [`Timestamp`]s.
///
/// Always unsigned: a delta above `i32::MAX` is a real elapsed count, not a negative one.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Encode,
    Decode,
)]
pub struct CycleDelta(pub u32);

impl CycleDelta {
    pub const ZERO: CycleDelta = CycleDelta(0);

    #[inline]
    pub fn cycles(&self) -> u32 {
        let Self(cycles) = self;
        *cycles
    }

    /// Reinterprets the delta as a signed 32-bit count, for callers storing deltas in an `i32`.
    /// Deltas above `i32::MAX` come out negative.
    #[inline]
    pub fn as_signed(&self) -> i32 {
        let Self(cycles) = self;
        *cycles as i32
    }
}

impl From<u32> for CycleDelta {
    fn from(cycles: u32) -> Self {
        CycleDelta(cycles)
    }
}

impl From<CycleDelta> for u32 {
    fn from(delta: CycleDelta) -> Self {
        let CycleDelta(cycles) = delta;
        cycles
    }
}

impl From<CycleDelta> for u64 {
    fn from(delta: CycleDelta) -> Self {
        let CycleDelta(cycles) = delta;
        cycles as u64
    }
}

impl Display for CycleDelta {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Self(cycles) = *self;
        write!(f, "{cycles} cycles")
    }
}

/// Cycles elapsed from `t0` to `t1`, tolerating at most one wraparound of the low half.
///
/// The high halves are not looked at. When the low half wrapped the result is
/// `0xFFFF_FFFF - (t0.lo - t1.lo)`, one cycle short of the modular distance; callers comparing
/// against other tools should expect that offset. Two timestamps exactly 2^32 cycles apart read
/// as 0.
#[inline]
pub fn difference(t0: Timestamp, t1: Timestamp) -> CycleDelta {
    if t0.lo <= t1.lo {
        CycleDelta(t1.lo - t0.lo)
    } else {
        CycleDelta(0xFFFF_FFFF - (t0.lo - t1.lo))
    }
}

static GLOBAL: OnceLock<CycleCounter<DefaultBackend>> = OnceLock::new();

/// Process-wide counter on the platform backend. Built on first use.
pub fn global() -> &'static CycleCounter<DefaultBackend> {
    GLOBAL.get_or_init(|| CycleCounter::new(DefaultBackend::default()))
}

/// Current raw cycle count from the process-wide counter.
#[inline]
pub fn raw_read() -> u32 {
    global().raw_read()
}

/// Current count from the process-wide counter, widened with `hi = 0`.
#[inline]
pub fn wide_read() -> Timestamp {
    global().wide_read()
}
