//! Validation module
//!
//! Balance tracing over the ledger DAG: rejects double-spend tangles and
//! detects conflicts between pairs of tangles.

pub mod validator;

pub use validator::LedgerValidator;
