//! Outcome contract and the generic outcome type.
//!
//! Every operation produces exactly one outcome. Failures inside an
//! operation are data, not errors: they are reported through
//! [`Outcome::is_success`] and [`Outcome::error_message`].

use serde::Serialize;
use std::fmt;

/// Capability set shared by every outcome kind.
pub trait Outcome: fmt::Debug + Send + Sync + 'static {
    /// Whether the operation succeeded.
    fn is_success(&self) -> bool;

    /// Description of the failure, if the operation failed.
    fn error_message(&self) -> Option<&str>;
}

/// Type-erased outcome, as seen by reducers over heterogeneous operations.
pub type BoxedOutcome = Box<dyn Outcome>;

impl Outcome for BoxedOutcome {
    fn is_success(&self) -> bool {
        (**self).is_success()
    }

    fn error_message(&self) -> Option<&str> {
        (**self).error_message()
    }
}

/// Ready-made outcome carrying an optional payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if the operation failed.
    pub error_message: Option<String>,
    /// Kind-specific payload, present on success and sometimes on failure.
    pub payload: Option<T>,
}

impl<T> OperationResult<T> {
    /// Create a successful result.
    pub fn success(payload: T) -> Self {
        Self {
            success: true,
            error_message: None,
            payload: Some(payload),
        }
    }

    /// Create a failed result.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            payload: None,
        }
    }

    /// Create a failed result that still carries a payload.
    pub fn failure_with_payload(message: impl Into<String>, payload: T) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            payload: Some(payload),
        }
    }
}

impl<T: fmt::Debug + Send + Sync + 'static> Outcome for OperationResult<T> {
    fn is_success(&self) -> bool {
        self.success
    }

    fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}
