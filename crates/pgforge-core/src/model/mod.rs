//! Data model: enums, disk descriptors, keyword overrides and the request.

pub mod disks;
pub mod keywords;
pub mod options;
pub mod scope;
pub mod sizing;
pub mod workload;

pub use disks::{DiskGrade, DiskPerf, DiskSpec};
pub use keywords::TuneKeywords;
pub use options::{TuneOptions, TuneOptionsBuilder, TuneRequest};
pub use scope::{PgScope, TunerScope};
pub use sizing::Tier;
pub use workload::{BackupTool, OptMode, WorkloadKind};
