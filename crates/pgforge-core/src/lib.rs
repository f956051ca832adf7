//! pgforge-core — the PostgreSQL configuration tuning engine.
//!
//! Provides:
//! - `model` — request options, workload/tier/mode enums, disk model, keywords
//! - `catalog` — the versioned rule catalog (defaults, per-tier tables, formulas)
//! - `tuner` — the general pass, the correction pass, and `optimize`
//! - `response` — scope-grouped results, managed cache, `postgresql.conf` renderer
//! - `units` — byte-size parsing/formatting and numeric helpers
//!
//! With the `api` feature:
//! - `api` — JSON projection of a response for HTTP consumers
//!
//! The engine is a pure function from request to response: single-threaded,
//! no I/O, no process state beyond the lazily built per-version catalogs.

pub mod catalog;
pub mod error;
pub mod model;
pub mod response;
pub mod tuner;
pub mod units;

#[cfg(feature = "api")]
pub mod api;

pub use error::TuneError;
pub use model::{
    BackupTool, DiskGrade, DiskPerf, DiskSpec, OptMode, PgScope, Tier, TuneKeywords,
    TuneOptions, TuneRequest, TunerScope, WorkloadKind,
};
pub use response::{Response, VERSION};
pub use tuner::{optimize, optimize_all};
