//! Optional fault logger handed to operations.
//!
//! Operations absorb their own faults, but may want to record the underlying
//! error for diagnostics. The engine forwards an optional shared logger; an
//! operation must behave identically when none is supplied.

use std::error::Error;

/// Sink for faults absorbed inside operations.
pub trait FaultLogger: Send + Sync {
    /// Record a fault together with a human-readable message.
    fn log_fault(&self, fault: &(dyn Error + 'static), message: &str);
}

/// Logs faults as `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFaultLogger;

impl FaultLogger for TracingFaultLogger {
    fn log_fault(&self, fault: &(dyn Error + 'static), message: &str) {
        tracing::warn!(error = %fault, "{}", message);
    }
}

/// Record `fault` on `logger` if one was supplied.
pub fn log_fault(logger: Option<&dyn FaultLogger>, fault: &(dyn Error + 'static), message: &str) {
    if let Some(logger) = logger {
        logger.log_fault(fault, message);
    }
}
