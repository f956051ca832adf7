//! pgforge — command-line shell around the tuning engine.
//!
//! Exit codes: 0 success, 2 validation error, 3 engine failure,
//! 74 output I/O error.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::error;

use pgforge_core::model::{DiskPerf, DiskSpec, TuneKeywords, TuneOptions, TuneRequest, TunerScope};
use pgforge_core::units::parse_bytesize;
use pgforge_core::{TuneError, optimize_all};

const EXIT_VALIDATION: i32 = 2;
const EXIT_ENGINE: i32 = 3;
const EXIT_IO: i32 = 74;

#[derive(Parser)]
#[command(name = "pgforge", about = "Compute a PostgreSQL configuration for a described machine", version = pgforge_core::VERSION)]
struct Args {
    /// Total RAM of the host, e.g. "16GiB" or a byte count.
    #[arg(long, env = "PGFORGE_RAM")]
    ram: String,

    /// Usable vCPU count.
    #[arg(long, env = "PGFORGE_CPU")]
    cpu: u32,

    /// Target PostgreSQL major version (13..=18).
    #[arg(long = "pg-version", default_value = "17", env = "PGFORGE_PG_VERSION")]
    pg_version: u32,

    /// Workload kind: tp, soltp, htap, analytic, vector, log, search,
    /// tsr_iot, tsr_htap.
    #[arg(long, default_value = "tp", env = "PGFORGE_WORKLOAD")]
    workload: String,

    /// Sizing tier: mini, medium, large, mall, bigt, huge.
    #[arg(long, default_value = "medium", env = "PGFORGE_TIER")]
    tier: String,

    /// Optimization mode: none, spidey, optimus_prime, primordial.
    #[arg(long, default_value = "none", env = "PGFORGE_MODE")]
    mode: String,

    /// Logging optimization mode (same ladder; higher logs less).
    #[arg(long, default_value = "none")]
    logging: String,

    /// Backup tooling: disk_snapshot, pg_dump, pg_basebackup, pgbackrest.
    #[arg(long, default_value = "pg_basebackup")]
    backup_tool: String,

    /// Desired client connection count (0 keeps the tier default).
    #[arg(long, default_value = "0")]
    connections: u32,

    /// Data disk: a class tag ("satassdv1"), a comma-separated blend of tags
    /// for striped or mixed volumes ("hddv2,nvmepciev4"), or explicit
    /// "iops=N,tput=M" in MiB/s.
    #[arg(long, default_value = "satassdv1")]
    data_disk: String,

    /// WAL disk, same syntax as --data-disk.
    #[arg(long, default_value = "satassdv1")]
    wal_disk: String,

    /// Tuning scope, repeatable: database_config or kernel_sysctl.
    #[arg(long = "scope", value_name = "SCOPE")]
    scopes: Vec<String>,

    /// Keyword override, repeatable: "name=value".
    #[arg(long = "keyword", value_name = "NAME=VALUE")]
    keywords: Vec<String>,

    /// Output format.
    #[arg(long, default_value = "conf", value_parser = ["conf", "json"])]
    format: String,

    /// Write to a file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pgforge=warn".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    process::exit(run(&args));
}

fn run(args: &Args) -> i32 {
    let request = match build_request(args) {
        Ok(r) => r,
        Err(e) => {
            error!("{e}");
            return EXIT_VALIDATION;
        }
    };

    let responses = match optimize_all(&request) {
        Ok(r) => r,
        Err(e @ (TuneError::InvalidRequest(_) | TuneError::InvalidDiskSpec(_))) => {
            error!("{e}");
            return EXIT_VALIDATION;
        }
        Err(e) => {
            error!("{e}");
            return EXIT_ENGINE;
        }
    };

    let text = match render(args, &responses) {
        Ok(t) => t,
        Err(e) => {
            error!("{e}");
            return EXIT_ENGINE;
        }
    };

    match &args.output {
        Some(path) => {
            if let Err(e) = fs::write(path, text) {
                error!("cannot write {}: {e}", path.display());
                return EXIT_IO;
            }
        }
        None => print!("{text}"),
    }
    0
}

fn render(args: &Args, responses: &[pgforge_core::Response]) -> Result<String, TuneError> {
    match args.format.as_str() {
        "json" => {
            let reports = responses
                .iter()
                .map(|r| r.to_api())
                .collect::<Result<Vec<_>, _>>()?;
            let json = match reports.as_slice() {
                [single] => serde_json::to_string_pretty(single),
                many => serde_json::to_string_pretty(many),
            };
            json.map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| TuneError::Render(e.to_string()))
        }
        _ => {
            let mut out = String::new();
            for response in responses {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&response.render()?);
            }
            Ok(out)
        }
    }
}

fn build_request(args: &Args) -> Result<TuneRequest, TuneError> {
    let ram = parse_bytesize(&args.ram).map_err(TuneError::InvalidRequest)?;

    let mut keyword_pairs = Vec::with_capacity(args.keywords.len());
    for raw in &args.keywords {
        let (name, value) = raw.split_once('=').ok_or_else(|| {
            TuneError::InvalidRequest(format!("keyword '{raw}' is not NAME=VALUE"))
        })?;
        let value: f64 = value.trim().parse().map_err(|_| {
            TuneError::InvalidRequest(format!("keyword '{name}' value is not numeric"))
        })?;
        keyword_pairs.push((name.trim(), value));
    }
    let keywords = TuneKeywords::from_pairs(keyword_pairs)?;

    let mut builder = TuneOptions::builder(ram, args.cpu)
        .version(args.pg_version)
        .workload(args.workload.parse().map_err(TuneError::InvalidRequest)?)
        .tier(args.tier.parse().map_err(TuneError::InvalidRequest)?)
        .opt_mode(args.mode.parse().map_err(TuneError::InvalidRequest)?)
        .opt_logging(args.logging.parse().map_err(TuneError::InvalidRequest)?)
        .backup_tool(args.backup_tool.parse().map_err(TuneError::InvalidRequest)?)
        .connections(args.connections)
        .data_disk(parse_disk(&args.data_disk)?)
        .wal_disk(parse_disk(&args.wal_disk)?)
        .keywords(keywords);
    if !args.scopes.is_empty() {
        let scopes = args
            .scopes
            .iter()
            .map(|s| s.parse::<TunerScope>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(TuneError::InvalidRequest)?;
        builder = builder.tune_scopes(scopes);
    }
    Ok(TuneRequest::new(builder.build()?))
}

/// Accepts a ladder tag, a comma-separated blend of tags, or an explicit
/// "iops=N,tput=M" pair.
fn parse_disk(spec: &str) -> Result<DiskPerf, TuneError> {
    if !spec.contains('=') {
        let tags: Vec<String> = spec.split(',').map(|t| t.trim().to_string()).collect();
        if tags.len() > 1 {
            return DiskPerf::from_spec(&DiskSpec::Blend { tags, p: -1.0 });
        }
        return DiskPerf::from_spec(&DiskSpec::Grade {
            tag: spec.to_string(),
        });
    }
    let mut iops = None;
    let mut tput = None;
    for part in spec.split(',') {
        let (name, value) = part.split_once('=').ok_or_else(|| {
            TuneError::InvalidDiskSpec(format!("bad disk spec fragment '{part}'"))
        })?;
        let value: u64 = value.trim().parse().map_err(|_| {
            TuneError::InvalidDiskSpec(format!("disk spec '{name}' is not a number"))
        })?;
        match name.trim() {
            "iops" => iops = Some(value),
            "tput" => tput = Some(value),
            other => {
                return Err(TuneError::InvalidDiskSpec(format!(
                    "unknown disk spec field '{other}'"
                )));
            }
        }
    }
    let random_iops = iops
        .ok_or_else(|| TuneError::InvalidDiskSpec("disk spec misses iops=".to_string()))?;
    let throughput_mib = tput
        .ok_or_else(|| TuneError::InvalidDiskSpec("disk spec misses tput=".to_string()))?;
    DiskPerf::from_spec(&DiskSpec::Explicit {
        random_iops,
        throughput_mib,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["pgforge", "--ram", "8GiB", "--cpu", "4"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn builds_a_valid_request_from_flags() {
        let request = build_request(&args(&[
            "--pg-version",
            "16",
            "--tier",
            "medium",
            "--connections",
            "100",
            "--keyword",
            "work_mem_scale=1.5",
        ]))
        .unwrap();
        assert_eq!(request.options.pgsql_version, 16);
        assert_eq!(request.options.keywords.work_mem_scale, 1.5);
    }

    #[test]
    fn explicit_disk_spec_parses() {
        let disk = parse_disk("iops=5000,tput=300").unwrap();
        assert_eq!(disk.random_iops, 5_000);
        assert_eq!(disk.throughput_mib, 300);
        assert!(parse_disk("iops=5000").is_err());
        assert!(parse_disk("warp=9").is_err());
    }

    #[test]
    fn blended_disk_spec_parses() {
        let disk = parse_disk("hddv2,nvmepciev4").unwrap();
        assert!(disk.spinning);
        assert!(disk.random_iops < 1_000, "blend biases toward the spindle");
        assert!(parse_disk("hddv2,UNOBTANIUM").is_err());
    }

    #[test]
    fn scope_flags_reach_the_request() {
        let request = build_request(&args(&[
            "--scope",
            "kernel_sysctl",
            "--scope",
            "database_config",
        ]))
        .unwrap();
        assert_eq!(
            request.options.tune_scopes,
            vec![TunerScope::KernelSysctl, TunerScope::DatabaseConfig]
        );
        let responses = optimize_all(&request).unwrap();
        assert_eq!(responses.len(), 2);
        assert!(responses[0].groups().is_empty());

        assert!(build_request(&args(&["--scope", "firmware"])).is_err());
    }

    #[test]
    fn bad_tier_is_a_validation_error() {
        let err = build_request(&args(&["--tier", "giant"])).unwrap_err();
        assert!(matches!(err, TuneError::InvalidRequest(_)));
    }

    #[test]
    fn full_run_produces_a_config() {
        let request = build_request(&args(&["--connections", "100"])).unwrap();
        let responses = optimize_all(&request).unwrap();
        assert_eq!(responses.len(), 1);
        let text = responses[0].render().unwrap();
        assert!(text.contains("shared_buffers = "));
        assert!(text.contains("# --- memory ---"));
    }
}
