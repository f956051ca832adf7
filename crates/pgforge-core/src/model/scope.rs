//! Parameter grouping scopes and tuning-target scopes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic grouping of a tunable, used only for organization and rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PgScope {
    Vm,
    Connection,
    Filesystem,
    Memory,
    DiskIops,
    Network,
    Logging,
    QueryTuning,
    Maintenance,
    Archive,
    Extra,
    Others,
}

impl PgScope {
    /// Short label used in the rendered section headers.
    pub fn as_str(self) -> &'static str {
        match self {
            PgScope::Vm => "vm",
            PgScope::Connection => "conn",
            PgScope::Filesystem => "fs",
            PgScope::Memory => "memory",
            PgScope::DiskIops => "iops",
            PgScope::Network => "net",
            PgScope::Logging => "log",
            PgScope::QueryTuning => "query",
            PgScope::Maintenance => "maint",
            PgScope::Archive => "backup",
            PgScope::Extra => "extra",
            PgScope::Others => "others",
        }
    }
}

/// Which configuration surface a tuning run targets.
///
/// The shipped rule catalog covers the PostgreSQL server configuration;
/// kernel tuning relies on host-inspection probes that live outside the
/// engine, so a kernel-scope run produces an empty response carrying the
/// kernel disclaimer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TunerScope {
    DatabaseConfig,
    KernelSysctl,
}

impl TunerScope {
    pub fn as_str(self) -> &'static str {
        match self {
            TunerScope::DatabaseConfig => "database_config",
            TunerScope::KernelSysctl => "kernel_sysctl",
        }
    }

    /// Disclaimer block emitted at the top of every rendered configuration.
    pub fn disclaimer(self) -> &'static str {
        match self {
            TunerScope::DatabaseConfig => {
                "# Read this before applying the result.\n\
                 # These values are derived from the machine description you supplied,\n\
                 # not from live measurements. Review each section, keep your own\n\
                 # overrides, and reload or restart the server as each parameter\n\
                 # requires. Back up postgresql.conf first."
            }
            TunerScope::KernelSysctl => {
                "# Read this before applying the result.\n\
                 # Kernel parameters are host-wide: applying them affects every\n\
                 # process on the machine, not only PostgreSQL. Review with your\n\
                 # platform team and apply via sysctl.d, not at runtime."
            }
        }
    }
}

impl FromStr for TunerScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "database_config" | "database" => Ok(TunerScope::DatabaseConfig),
            "kernel_sysctl" | "kernel" => Ok(TunerScope::KernelSysctl),
            other => Err(format!("unknown tuning scope '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuner_scope_parses_with_aliases() {
        assert_eq!(
            "database".parse::<TunerScope>().unwrap(),
            TunerScope::DatabaseConfig
        );
        assert_eq!(
            "KERNEL_SYSCTL".parse::<TunerScope>().unwrap(),
            TunerScope::KernelSysctl
        );
        assert!("firmware".parse::<TunerScope>().is_err());
    }
}
