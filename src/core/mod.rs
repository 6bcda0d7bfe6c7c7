//! Core contracts: operations, outcomes, timing envelopes and identifiers.

pub mod logger;
pub mod operation;
pub mod outcome;
pub mod timing;
pub mod types;
