//! Timing envelopes returned by operation executions.
//!
//! An operation never stores its own start/end instants. Instead every
//! execution hands back a [`Timed`] envelope carrying the [`Timing`] of that
//! particular execution next to its outcome, so the same operation can be
//! executed again (or concurrently) without clobbering earlier timings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wall-clock instant used throughout the crate.
pub type Timestamp = DateTime<Utc>;

/// Sentinel reported in place of a timestamp that was never recorded.
pub const UNSET: Timestamp = DateTime::<Utc>::MIN_UTC;

/// Start and end instants of one execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// When the execution started, if recorded.
    pub start: Option<Timestamp>,
    /// When the execution finished, if recorded.
    pub end: Option<Timestamp>,
}

impl Timing {
    /// A timing with both instants recorded.
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// A timing with neither instant recorded.
    pub fn unset() -> Self {
        Self::default()
    }

    /// Whether both instants were recorded.
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// `end - start` when both are recorded, zero otherwise.
    pub fn elapsed(&self) -> Duration {
        match (self.start, self.end) {
            (Some(start), Some(end)) => elapsed_between(start, end),
            _ => Duration::ZERO,
        }
    }
}

/// Difference between two instants, clamped to zero if the clock stepped back.
pub fn elapsed_between(start: Timestamp, end: Timestamp) -> Duration {
    (end - start).to_std().unwrap_or(Duration::ZERO)
}

/// The outcome of one execution together with when it ran.
#[derive(Debug, Clone, PartialEq)]
pub struct Timed<T> {
    pub timing: Timing,
    pub outcome: T,
}

impl<T> Timed<T> {
    pub fn new(timing: Timing, outcome: T) -> Self {
        Self { timing, outcome }
    }

    /// Transform the outcome, keeping the timing.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Timed<U> {
        Timed {
            timing: self.timing,
            outcome: f(self.outcome),
        }
    }

    /// Split the envelope into its parts.
    pub fn into_parts(self) -> (Timing, T) {
        (self.timing, self.outcome)
    }
}
