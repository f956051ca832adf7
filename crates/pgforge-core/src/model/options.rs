//! The tuning request: user options, validated and frozen.

use serde::Serialize;

use crate::error::TuneError;
use crate::model::disks::DiskPerf;
use crate::model::keywords::TuneKeywords;
use crate::model::scope::TunerScope;
use crate::model::sizing::Tier;
use crate::model::workload::{BackupTool, OptMode, WorkloadKind};
use crate::units::GI;

pub const MIN_SUPPORTED_VERSION: u32 = 13;
pub const MAX_SUPPORTED_VERSION: u32 = 18;

/// Everything the engine knows about the target machine and workload.
/// Immutable after [`TuneOptionsBuilder::build`].
#[derive(Clone, Debug, Serialize)]
pub struct TuneOptions {
    pub pgsql_version: u32,
    pub workload: WorkloadKind,
    pub tier: Tier,
    pub opt_mode: OptMode,
    /// Logging verbosity ladder; higher modes log less.
    pub opt_logging: OptMode,
    pub backup_tool: BackupTool,
    pub total_ram: u64,
    pub vcpu: u32,
    /// Desired client connection count; 0 lets the per-tier default stand.
    pub user_connections: u32,
    pub data_disk: DiskPerf,
    pub wal_disk: DiskPerf,
    pub keywords: TuneKeywords,
    pub tune_scopes: Vec<TunerScope>,
}

impl TuneOptions {
    pub fn builder(total_ram: u64, vcpu: u32) -> TuneOptionsBuilder {
        TuneOptionsBuilder::new(total_ram, vcpu)
    }

    /// RAM left for PostgreSQL after the OS reservation of
    /// `max(1 GiB, 5% of total)`.
    pub fn usable_ram(&self) -> u64 {
        let reserved = (self.total_ram / 20).max(GI);
        self.total_ram.saturating_sub(reserved)
    }

    /// The connection target after keyword override, before any workload
    /// clamping by the correction pass.
    pub fn requested_connections(&self) -> u32 {
        if self.keywords.user_max_connections > 0 {
            self.keywords.user_max_connections
        } else {
            self.user_connections
        }
    }
}

/// Options builder; `build` validates all ranges.
pub struct TuneOptionsBuilder {
    options: TuneOptions,
}

impl TuneOptionsBuilder {
    pub fn new(total_ram: u64, vcpu: u32) -> Self {
        TuneOptionsBuilder {
            options: TuneOptions {
                pgsql_version: 17,
                workload: WorkloadKind::Tp,
                tier: Tier::Medium,
                opt_mode: OptMode::None,
                opt_logging: OptMode::None,
                backup_tool: BackupTool::PgBasebackup,
                total_ram,
                vcpu,
                user_connections: 0,
                data_disk: DiskPerf {
                    random_iops: 40_000,
                    throughput_mib: 350,
                    spinning: false,
                },
                wal_disk: DiskPerf {
                    random_iops: 40_000,
                    throughput_mib: 350,
                    spinning: false,
                },
                keywords: TuneKeywords::default(),
                tune_scopes: vec![TunerScope::DatabaseConfig],
            },
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.options.pgsql_version = version;
        self
    }

    pub fn workload(mut self, workload: WorkloadKind) -> Self {
        self.options.workload = workload;
        self
    }

    pub fn tier(mut self, tier: Tier) -> Self {
        self.options.tier = tier;
        self
    }

    pub fn opt_mode(mut self, mode: OptMode) -> Self {
        self.options.opt_mode = mode;
        self
    }

    pub fn opt_logging(mut self, mode: OptMode) -> Self {
        self.options.opt_logging = mode;
        self
    }

    pub fn backup_tool(mut self, tool: BackupTool) -> Self {
        self.options.backup_tool = tool;
        self
    }

    pub fn connections(mut self, connections: u32) -> Self {
        self.options.user_connections = connections;
        self
    }

    pub fn data_disk(mut self, disk: DiskPerf) -> Self {
        self.options.data_disk = disk;
        self
    }

    pub fn wal_disk(mut self, disk: DiskPerf) -> Self {
        self.options.wal_disk = disk;
        self
    }

    pub fn keywords(mut self, keywords: TuneKeywords) -> Self {
        self.options.keywords = keywords;
        self
    }

    pub fn tune_scopes(mut self, scopes: Vec<TunerScope>) -> Self {
        self.options.tune_scopes = scopes;
        self
    }

    pub fn build(self) -> Result<TuneOptions, TuneError> {
        let o = self.options;
        if o.total_ram < 2 * GI {
            return Err(TuneError::InvalidRequest(format!(
                "total RAM must be at least 2 GiB, got {} bytes",
                o.total_ram
            )));
        }
        if o.vcpu == 0 {
            return Err(TuneError::InvalidRequest(
                "at least one usable vCPU is required".to_string(),
            ));
        }
        if !(MIN_SUPPORTED_VERSION..=MAX_SUPPORTED_VERSION).contains(&o.pgsql_version) {
            return Err(TuneError::InvalidRequest(format!(
                "PostgreSQL major version {} outside supported {}..={}",
                o.pgsql_version, MIN_SUPPORTED_VERSION, MAX_SUPPORTED_VERSION
            )));
        }
        if o.data_disk.random_iops == 0 || o.wal_disk.random_iops == 0 {
            return Err(TuneError::InvalidDiskSpec(
                "disk specs must resolve to positive IOPS".to_string(),
            ));
        }
        if o.tune_scopes.is_empty() {
            return Err(TuneError::InvalidRequest(
                "at least one tuning scope is required".to_string(),
            ));
        }
        o.keywords.validate()?;
        Ok(o)
    }
}

/// A validated request, as handed to [`crate::tuner::optimize`]. The engine
/// only ever borrows it; one request may serve many concurrent calls.
#[derive(Clone, Debug, Serialize)]
pub struct TuneRequest {
    pub options: TuneOptions,
}

impl TuneRequest {
    pub fn new(options: TuneOptions) -> Self {
        TuneRequest { options }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_validates_ranges() {
        assert!(TuneOptions::builder(GI, 2).build().is_err(), "1 GiB RAM");
        assert!(TuneOptions::builder(4 * GI, 0).build().is_err(), "no cpu");
        assert!(
            TuneOptions::builder(4 * GI, 2).version(12).build().is_err(),
            "version below floor"
        );
        assert!(TuneOptions::builder(4 * GI, 2).version(16).build().is_ok());
    }

    #[test]
    fn usable_ram_reserves_at_least_one_gib() {
        let o = TuneOptions::builder(4 * GI, 2).build().unwrap();
        assert_eq!(o.usable_ram(), 3 * GI);
        // 5% rule takes over at 20 GiB and above.
        let o = TuneOptions::builder(40 * GI, 8).build().unwrap();
        assert_eq!(o.usable_ram(), 38 * GI);
    }

    #[test]
    fn keyword_connection_override_wins() {
        let kw = TuneKeywords::from_pairs([("user_max_connections", 250.0)]).unwrap();
        let o = TuneOptions::builder(8 * GI, 4)
            .connections(100)
            .keywords(kw)
            .build()
            .unwrap();
        assert_eq!(o.requested_connections(), 250);
    }
}
