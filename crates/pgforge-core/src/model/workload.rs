//! Workload kinds, optimization modes and backup tool tiers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The dominant workload the database serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    /// Classic OLTP: short transactions, point reads and writes.
    Tp,
    /// Simple OLTP: key-value style access, few joins.
    Soltp,
    /// Mixed transactional / analytical.
    Htap,
    /// Pure analytics / reporting, few very large queries.
    Analytic,
    /// Vector similarity search.
    Vector,
    /// Append-mostly log storage.
    Log,
    /// Full-text / document search.
    Search,
    /// Time-series ingest (IoT).
    TsrIot,
    /// Time-series with mixed query load.
    TsrHtap,
}

impl WorkloadKind {
    /// Workloads that hold few, long sessions; the connection phase clamps
    /// their connection target into the analytics window.
    pub fn is_analytic(self) -> bool {
        matches!(self, WorkloadKind::Analytic)
    }

    /// Multiple of `wal_buffers` assumed to be flushed during the worst-case
    /// checkpoint, by write amplification of the workload.
    pub fn checkpoint_flush_ratio(self) -> f64 {
        match self {
            WorkloadKind::Tp | WorkloadKind::Soltp => 2.0,
            WorkloadKind::Htap
            | WorkloadKind::Vector
            | WorkloadKind::Log
            | WorkloadKind::Search
            | WorkloadKind::TsrHtap => 4.0,
            WorkloadKind::Analytic | WorkloadKind::TsrIot => 6.0,
        }
    }

    /// Workloads where large scans dominate and JIT compilation pays off.
    pub fn favors_jit(self) -> bool {
        matches!(
            self,
            WorkloadKind::Analytic | WorkloadKind::Htap | WorkloadKind::TsrHtap
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkloadKind::Tp => "tp",
            WorkloadKind::Soltp => "soltp",
            WorkloadKind::Htap => "htap",
            WorkloadKind::Analytic => "analytic",
            WorkloadKind::Vector => "vector",
            WorkloadKind::Log => "log",
            WorkloadKind::Search => "search",
            WorkloadKind::TsrIot => "tsr_iot",
            WorkloadKind::TsrHtap => "tsr_htap",
        }
    }
}

impl FromStr for WorkloadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tp" | "oltp" => Ok(WorkloadKind::Tp),
            "soltp" => Ok(WorkloadKind::Soltp),
            "htap" => Ok(WorkloadKind::Htap),
            "analytic" | "olap" => Ok(WorkloadKind::Analytic),
            "vector" => Ok(WorkloadKind::Vector),
            "log" => Ok(WorkloadKind::Log),
            "search" => Ok(WorkloadKind::Search),
            "tsr_iot" | "tsr-iot" => Ok(WorkloadKind::TsrIot),
            "tsr_htap" | "tsr-htap" => Ok(WorkloadKind::TsrHtap),
            other => Err(format!("unknown workload kind '{other}'")),
        }
    }
}

/// Tuning aggressiveness ladder, strictly ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptMode {
    None,
    Spidey,
    OptimusPrime,
    Primordial,
}

impl OptMode {
    /// Per-connection concurrency factor used by the `work_mem` budget.
    pub fn parallel_factor(self) -> f64 {
        match self {
            OptMode::None => 1.5,
            OptMode::Spidey | OptMode::OptimusPrime => 2.0,
            OptMode::Primordial => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptMode::None => "none",
            OptMode::Spidey => "spidey",
            OptMode::OptimusPrime => "optimus_prime",
            OptMode::Primordial => "primordial",
        }
    }
}

impl FromStr for OptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(OptMode::None),
            "spidey" => Ok(OptMode::Spidey),
            "optimus_prime" | "optimus-prime" => Ok(OptMode::OptimusPrime),
            "primordial" => Ok(OptMode::Primordial),
            other => Err(format!("unknown optimization mode '{other}'")),
        }
    }
}

/// Backup tooling in use; drives the archive / WAL-retention entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupTool {
    /// Storage-level snapshots; WAL archiving adds nothing.
    DiskSnapshot,
    PgDump,
    PgBasebackup,
    PgBackrest,
}

impl BackupTool {
    /// `archive_timeout` in seconds; 0 disables forced segment switching.
    pub fn archive_timeout_secs(self) -> i64 {
        match self {
            BackupTool::DiskSnapshot => 0,
            BackupTool::PgDump => 3600,
            BackupTool::PgBasebackup => 1800,
            BackupTool::PgBackrest => 900,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackupTool::DiskSnapshot => "disk_snapshot",
            BackupTool::PgDump => "pg_dump",
            BackupTool::PgBasebackup => "pg_basebackup",
            BackupTool::PgBackrest => "pgbackrest",
        }
    }
}

impl FromStr for BackupTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disk_snapshot" | "disk-snapshot" | "snapshot" => Ok(BackupTool::DiskSnapshot),
            "pg_dump" | "pgdump" => Ok(BackupTool::PgDump),
            "pg_basebackup" | "basebackup" => Ok(BackupTool::PgBasebackup),
            "pgbackrest" | "pg_backrest" => Ok(BackupTool::PgBackrest),
            other => Err(format!("unknown backup tool '{other}'")),
        }
    }
}
