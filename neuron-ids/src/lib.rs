#![deny(missing_docs)]
//! Identifier generation and clock services for neuron (spec component C1).
//!
//! Every task, message, agent instance, and tool invocation needs an opaque,
//! equality-comparable id. This crate is the one place that knows how those
//! ids are minted (UUIDv4) and how wall-clock/monotonic time is read, so the
//! rest of the workspace can stay deterministic in tests by swapping the
//! [`Clock`] implementation.

use layer0::duration::DurationMs;
use layer0::id::{MessageId, TaskId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Mint a new opaque task id.
pub fn new_task_id() -> TaskId {
    TaskId::new(uuid::Uuid::new_v4().to_string())
}

/// Mint a new opaque message id.
pub fn new_message_id() -> MessageId {
    MessageId::new(uuid::Uuid::new_v4().to_string())
}

/// Mint a new opaque id of any kind, for callers that don't need a typed
/// wrapper (e.g. sandbox ids, tool-call ids).
pub fn new_opaque_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Source of timestamps and monotonic durations.
///
/// Runtime code takes `&dyn Clock` (or a generic `C: Clock`) rather than
/// calling `SystemTime::now()`/`Instant::now()` directly, so tests can
/// inject a [`FixedClock`] and assert exact elapsed/deadline behavior
/// without sleeping.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch, for wire-format timestamps.
    fn now_unix_ms(&self) -> u64;

    /// An opaque monotonic instant, for measuring elapsed durations and
    /// deadlines. Only comparable to other instants from the same clock.
    fn monotonic_now(&self) -> MonotonicInstant;
}

/// An opaque point in monotonic time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    /// Duration elapsed from `self` to `later`. Zero if `later` precedes
    /// `self` (clock skew between two `FixedClock`s, or an out-of-order call).
    pub fn elapsed_until(&self, later: MonotonicInstant) -> DurationMs {
        later
            .0
            .checked_duration_since(self.0)
            .map(DurationMs::from)
            .unwrap_or(DurationMs::ZERO)
    }

    /// This instant advanced by `ms` milliseconds — used to compute a
    /// deadline from a budget without exposing the wrapped `Instant`.
    pub fn after(self, ms: u64) -> MonotonicInstant {
        MonotonicInstant(self.0 + std::time::Duration::from_millis(ms))
    }
}

/// Real wall-clock and monotonic time, backed by [`std::time`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn monotonic_now(&self) -> MonotonicInstant {
        MonotonicInstant(Instant::now())
    }
}

/// A clock that only advances when told to — deterministic for tests.
///
/// `now_unix_ms` starts at an arbitrary fixed epoch and `monotonic_now`
/// starts at process start; both only move forward via [`FixedClock::advance`].
pub struct FixedClock {
    base: Instant,
    unix_ms_at_base: u64,
    offset_ms: AtomicU64,
}

impl FixedClock {
    /// Create a clock fixed at the given Unix-epoch millisecond timestamp.
    pub fn new(unix_ms_at_base: u64) -> Self {
        Self {
            base: Instant::now(),
            unix_ms_at_base,
            offset_ms: AtomicU64::new(0),
        }
    }

    /// Advance the clock by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for FixedClock {
    fn now_unix_ms(&self) -> u64 {
        self.unix_ms_at_base + self.offset_ms.load(Ordering::SeqCst)
    }

    fn monotonic_now(&self) -> MonotonicInstant {
        let offset = self.offset_ms.load(Ordering::SeqCst);
        MonotonicInstant(self.base + std::time::Duration::from_millis(offset))
    }
}
