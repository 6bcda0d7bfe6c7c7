//! Counting reducer.

use serde::Serialize;
use std::fmt;

use crate::core::outcome::Outcome;

/// Success/failure counts over a run's outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Error messages of failed outcomes, in input order.
    pub errors: Vec<String>,
}

impl Summary {
    /// Count the outcomes. Usable directly as a reducer: `|o| Summary::tally(&o)`.
    pub fn tally<O: Outcome>(outcomes: &[O]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            ..Self::default()
        };

        for outcome in outcomes {
            if outcome.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
                summary.errors.push(
                    outcome
                        .error_message()
                        .unwrap_or("unknown error")
                        .to_string(),
                );
            }
        }

        summary
    }

    /// Whether every outcome succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total={}, Success={}, Failures={}",
            self.total, self.succeeded, self.failed
        )
    }
}
