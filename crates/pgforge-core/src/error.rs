//! Engine error taxonomy.
//!
//! Every fallible entry point surfaces one of these variants; nothing is
//! recovered inside the engine. Non-fatal oddities (e.g. an overlay deleting
//! a key that does not exist) are collected as warnings instead, see
//! [`crate::response::Response::warnings`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuneError {
    /// Input validation failed: RAM, CPU, version or connection target out of
    /// range, or a malformed keyword override.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown disk class tag, or a disk spec that resolves to zero IOPS.
    #[error("invalid disk spec: {0}")]
    InvalidDiskSpec(String),

    /// The correction pass referenced a key absent from the resolved catalog.
    #[error("unknown tunable: {0}")]
    UnknownTunable(String),

    /// A catalog formula failed to evaluate. Always a catalog bug.
    #[error("catalog formula for '{key}' failed: {cause}")]
    CatalogEval { key: String, cause: String },

    /// The memory phase could not fit the worst-case allocation into usable
    /// RAM even after shrinking `work_mem`.
    #[error("memory budget infeasible: worst case {worst_case} B exceeds usable {usable} B")]
    MemoryBudgetInfeasible { worst_case: u64, usable: u64 },

    /// The correction pass did not reach a fixed point within the sweep cap.
    #[error("correction did not converge, unstable keys: {0:?}")]
    CorrectionDidNotConverge(Vec<String>),

    /// A value did not match its declared display unit at render time.
    #[error("render error: {0}")]
    Render(String),
}
