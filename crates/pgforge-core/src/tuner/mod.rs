//! The tuning engine: general pass, correction pass, and the `optimize`
//! entry point gluing them together.

pub mod correction;
pub mod estimate;
pub mod general;

use crate::error::TuneError;
use crate::model::options::TuneRequest;
use crate::model::scope::TunerScope;
use crate::response::Response;

/// Run the full pipeline for the first scope in the request's tuning mask:
/// general tuning from the catalog, then the correction pass. Warnings
/// collected along the way are flushed through `tracing` before returning;
/// the pass either produces a fully consistent configuration or fails.
pub fn optimize(request: &TuneRequest) -> Result<Response, TuneError> {
    let scope = primary_scope(request)?;
    optimize_scope(request, scope)
}

/// Run the pipeline once per scope in the request's tuning mask, in mask
/// order, producing one response per scope.
pub fn optimize_all(request: &TuneRequest) -> Result<Vec<Response>, TuneError> {
    primary_scope(request)?;
    request
        .options
        .tune_scopes
        .iter()
        .map(|&scope| optimize_scope(request, scope))
        .collect()
}

fn optimize_scope(request: &TuneRequest, scope: TunerScope) -> Result<Response, TuneError> {
    let mut response = general::general_tuning(request, scope)?;
    correction::correction_tuning(request, &mut response)?;
    response.flush_warnings();
    Ok(response)
}

fn primary_scope(request: &TuneRequest) -> Result<TunerScope, TuneError> {
    request
        .options
        .tune_scopes
        .first()
        .copied()
        .ok_or_else(|| {
            TuneError::InvalidRequest("at least one tuning scope is required".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::disks::{DiskGrade, DiskPerf};
    use crate::model::keywords::TuneKeywords;
    use crate::model::options::TuneOptions;
    use crate::model::sizing::Tier;
    use crate::model::workload::{OptMode, WorkloadKind};
    use crate::units::{GI, KI, MI};

    fn disk(grade: DiskGrade) -> DiskPerf {
        DiskPerf::from_grade(grade)
    }

    fn bytes_of(response: &Response, key: &str) -> u64 {
        response.cache().bytes(key).unwrap()
    }

    fn int_of(response: &Response, key: &str) -> i64 {
        response.cache().int(key).unwrap()
    }

    /// A tiny OLTP box on SATA SSDs, v16.
    fn tiny_oltp() -> TuneRequest {
        TuneRequest::new(
            TuneOptions::builder(4 * GI, 2)
                .version(16)
                .tier(Tier::Mini)
                .workload(WorkloadKind::Tp)
                .opt_mode(OptMode::None)
                .connections(50)
                .data_disk(disk(DiskGrade::SataSsd1))
                .wal_disk(disk(DiskGrade::SataSsd1))
                .build()
                .unwrap(),
        )
    }

    /// A large analytics box on NVMe, v17.
    fn large_analytics() -> TuneRequest {
        TuneRequest::new(
            TuneOptions::builder(128 * GI, 32)
                .version(17)
                .tier(Tier::Large)
                .workload(WorkloadKind::Analytic)
                .opt_mode(OptMode::OptimusPrime)
                .connections(40)
                .data_disk(disk(DiskGrade::NvmePcie4))
                .wal_disk(disk(DiskGrade::NvmePcie4))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn tiny_oltp_profile() {
        let response = optimize(&tiny_oltp()).unwrap();

        let sb = bytes_of(&response, "shared_buffers");
        assert!((614 * MI..=GI).contains(&sb), "shared_buffers {sb}");

        let ecs = bytes_of(&response, "effective_cache_size");
        assert!(
            (2 * GI..=GI * 5 / 2).contains(&ecs),
            "effective_cache_size {ecs}"
        );

        assert!(bytes_of(&response, "work_mem") >= 4 * MI);
        assert_eq!(bytes_of(&response, "max_wal_size"), 2 * GI);
        assert_eq!(int_of(&response, "checkpoint_timeout"), 900);
        assert_eq!(int_of(&response, "autovacuum_max_workers"), 1);
        assert_eq!(int_of(&response, "max_connections"), 50);
    }

    #[test]
    fn large_analytics_profile() {
        let response = optimize(&large_analytics()).unwrap();

        let sb = bytes_of(&response, "shared_buffers");
        assert_eq!(sb, 32 * GI, "shared_buffers {sb}");

        let ecs = bytes_of(&response, "effective_cache_size");
        assert!(
            (55 * GI..=62 * GI).contains(&ecs),
            "effective_cache_size {ecs}"
        );

        assert_eq!(int_of(&response, "max_parallel_workers_per_gather"), 8);
        assert!(bytes_of(&response, "max_wal_size") >= 16 * GI);
        assert_eq!(int_of(&response, "checkpoint_timeout"), 1_800);
        assert!(int_of(&response, "vacuum_cost_limit") >= 2_000);
        // Analytics clamp kept the requested 40 connections.
        assert_eq!(int_of(&response, "max_connections"), 40);
    }

    /// 2 GiB, 1 vCPU and 500 connections cannot fit into usable RAM.
    #[test]
    fn oversubscribed_memory_fails() {
        let request = TuneRequest::new(
            TuneOptions::builder(2 * GI, 1)
                .version(16)
                .tier(Tier::Mini)
                .connections(500)
                .build()
                .unwrap(),
        );
        assert!(matches!(
            optimize(&request),
            Err(TuneError::MemoryBudgetInfeasible { .. })
        ));
    }

    /// The analytics clamp pulls an oversized connection target down to 40.
    #[test]
    fn analytics_connection_clamp() {
        let request = TuneRequest::new(
            TuneOptions::builder(64 * GI, 16)
                .version(17)
                .tier(Tier::Large)
                .workload(WorkloadKind::Analytic)
                .connections(500)
                .data_disk(disk(DiskGrade::NvmePcie3))
                .wal_disk(disk(DiskGrade::NvmePcie3))
                .build()
                .unwrap(),
        );
        let response = optimize(&request).unwrap();
        assert_eq!(int_of(&response, "max_connections"), 40);
    }

    /// Identical requests render byte-identically for a fixed clock.
    #[test]
    fn determinism_across_runs() {
        let ts = chrono::DateTime::from_timestamp(1_750_000_000, 0).unwrap();
        let a = optimize(&tiny_oltp()).unwrap().render_at(ts).unwrap();
        let b = optimize(&tiny_oltp()).unwrap().render_at(ts).unwrap();
        assert_eq!(a, b);
    }

    /// Parsing the rendered config recovers every key with its value.
    #[test]
    fn render_round_trip() {
        let response = optimize(&tiny_oltp()).unwrap();
        let ts = chrono::DateTime::from_timestamp(1_750_000_000, 0).unwrap();
        let text = response.render_at(ts).unwrap();

        let mut parsed = 0usize;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, rest) = line.split_once(" = ").unwrap();
            let value = rest.split('#').next().unwrap().trim();
            let item = response.get(key).unwrap_or_else(|| panic!("stray key {key}"));
            assert_eq!(value, item.out_display().unwrap(), "{key}");
            parsed += 1;
        }
        let total: usize = response.groups().iter().map(|(_, i)| i.len()).sum();
        assert_eq!(parsed, total);
    }

    /// Structural guarantees of a successful response, across a machine grid.
    #[test]
    fn structural_guarantees_hold() {
        let grid = [
            (4 * GI, 2u32, Tier::Mini, WorkloadKind::Tp, OptMode::None, DiskGrade::Hdd2, 16u32, 50u32),
            (8 * GI, 4, Tier::Medium, WorkloadKind::Soltp, OptMode::Spidey, DiskGrade::SataSsd2, 15, 200),
            (32 * GI, 8, Tier::Large, WorkloadKind::Htap, OptMode::OptimusPrime, DiskGrade::SasSsd1, 17, 300),
            (128 * GI, 32, Tier::Mall, WorkloadKind::Analytic, OptMode::OptimusPrime, DiskGrade::NvmePcie4, 17, 40),
            (256 * GI, 64, Tier::Bigt, WorkloadKind::TsrIot, OptMode::Primordial, DiskGrade::NvmePcie4, 18, 500),
            (512 * GI, 96, Tier::Huge, WorkloadKind::Search, OptMode::Primordial, DiskGrade::NvmePcie5, 18, 800),
            (16 * GI, 4, Tier::Medium, WorkloadKind::Log, OptMode::None, DiskGrade::Hdd3, 13, 100),
            (64 * GI, 24, Tier::Large, WorkloadKind::Vector, OptMode::Spidey, DiskGrade::NvmePcie3, 14, 250),
        ];
        for (ram, cpu, tier, workload, mode, grade, version, conns) in grid {
            let request = TuneRequest::new(
                TuneOptions::builder(ram, cpu)
                    .version(version)
                    .tier(tier)
                    .workload(workload)
                    .opt_mode(mode)
                    .connections(conns)
                    .data_disk(disk(grade))
                    .wal_disk(disk(grade))
                    .build()
                    .unwrap(),
            );
            let response = optimize(&request).unwrap_or_else(|e| {
                panic!("v{version} {tier:?} {workload:?} failed: {e}")
            });
            let label = format!("v{version} {tier:?} {workload:?}");
            let usable = request.options.usable_ram();

            let sb = bytes_of(&response, "shared_buffers");
            let ecs = bytes_of(&response, "effective_cache_size");
            assert!(sb + ecs <= usable, "{label}: cache exceeds usable RAM");

            let max_wal = bytes_of(&response, "max_wal_size");
            let min_wal = bytes_of(&response, "min_wal_size");
            let seg = request.options.keywords.wal_segment_size;
            assert!(min_wal <= max_wal, "{label}: wal bounds inverted");
            assert_eq!(max_wal % seg, 0, "{label}: max_wal_size unaligned");
            assert_eq!(min_wal % seg, 0, "{label}: min_wal_size unaligned");

            let autovac = int_of(&response, "autovacuum_max_workers");
            let workers = int_of(&response, "max_worker_processes");
            assert!(autovac <= workers, "{label}: autovacuum workers exceed pool");

            let per_gather = int_of(&response, "max_parallel_workers_per_gather");
            let parallel = int_of(&response, "max_parallel_workers");
            assert!(per_gather <= parallel, "{label}: per-gather exceeds pool");
            assert!(parallel <= workers, "{label}: parallel exceeds workers");

            let conns_total = int_of(&response, "max_connections");
            let su = int_of(&response, "superuser_reserved_connections");
            let res = response.cache().int_or("reserved_connections", 0);
            assert!(su + res < conns_total, "{label}: reserved pool too large");

            assert_eq!(bytes_of(&response, "work_mem") % (8 * KI), 0, "{label}");
        }
    }

    /// More RAM or CPU never shrinks the corresponding budgets.
    #[test]
    fn doubling_resources_never_shrinks_budgets() {
        let build = |ram: u64, cpu: u32| {
            TuneRequest::new(
                TuneOptions::builder(ram, cpu)
                    .version(16)
                    .tier(Tier::Large)
                    .workload(WorkloadKind::Htap)
                    .opt_mode(OptMode::Spidey)
                    .connections(200)
                    .build()
                    .unwrap(),
            )
        };
        let mut prev_sb = 0u64;
        let mut prev_workers = 0i64;
        for (ram, cpu) in [(8 * GI, 4u32), (16 * GI, 8), (32 * GI, 16), (64 * GI, 32)] {
            let response = optimize(&build(ram, cpu)).unwrap();
            let sb = bytes_of(&response, "shared_buffers");
            let workers = int_of(&response, "max_worker_processes");
            assert!(sb >= prev_sb, "shared_buffers shrank at {ram}");
            assert!(workers >= prev_workers, "workers shrank at {cpu}");
            prev_sb = sb;
            prev_workers = workers;
        }
    }

    /// Keyword overrides flow into the derived values.
    #[test]
    fn keyword_overrides_apply() {
        let kw = TuneKeywords::from_pairs([
            ("shared_buffers_ratio", 0.20),
            ("wal_segment_size", (64 * MI) as f64),
        ])
        .unwrap();
        let request = TuneRequest::new(
            TuneOptions::builder(16 * GI, 8)
                .version(16)
                .tier(Tier::Medium)
                .connections(100)
                .keywords(kw)
                .build()
                .unwrap(),
        );
        let response = optimize(&request).unwrap();
        // 20% of 16 GiB instead of the 25% tier default, floor-aligned to MiB.
        assert_eq!(bytes_of(&response, "shared_buffers"), 3_276 * MI);
        assert_eq!(bytes_of(&response, "max_wal_size") % (64 * MI), 0);
        assert_eq!(bytes_of(&response, "wal_buffers") % (64 * MI), 0);
    }

    /// The scope mask drives which surface is tuned; `optimize` takes the
    /// first scope, `optimize_all` walks the whole mask.
    #[test]
    fn scope_mask_selects_the_tuned_surface() {
        let request = TuneRequest::new(
            TuneOptions::builder(8 * GI, 4)
                .version(16)
                .tier(Tier::Medium)
                .connections(100)
                .tune_scopes(vec![TunerScope::KernelSysctl, TunerScope::DatabaseConfig])
                .build()
                .unwrap(),
        );
        let responses = optimize_all(&request).unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].tuner_scope, TunerScope::KernelSysctl);
        assert!(responses[0].groups().is_empty());
        assert_eq!(responses[1].tuner_scope, TunerScope::DatabaseConfig);
        assert!(responses[1].contains("shared_buffers"));

        let first = optimize(&request).unwrap();
        assert_eq!(first.tuner_scope, TunerScope::KernelSysctl);
        assert!(
            first
                .render_at(chrono::DateTime::from_timestamp(0, 0).unwrap())
                .unwrap()
                .contains("Kernel parameters are host-wide")
        );
    }

    /// v18 drops vacuum_cost_page_dirty; the vacuum model falls back to
    /// the classic cost and the pass still converges.
    #[test]
    fn v18_without_dirty_page_cost_still_tunes() {
        let request = TuneRequest::new(
            TuneOptions::builder(8 * GI, 4)
                .version(18)
                .tier(Tier::Medium)
                .connections(100)
                .build()
                .unwrap(),
        );
        let response = optimize(&request).unwrap();
        assert!(!response.contains("vacuum_cost_page_dirty"));
        assert!(response.contains("io_method"));
    }

    /// Spinning data disks get the gentler completion target.
    #[test]
    fn hdd_gets_gentler_checkpoint_target() {
        let request = TuneRequest::new(
            TuneOptions::builder(8 * GI, 4)
                .version(16)
                .tier(Tier::Medium)
                .data_disk(disk(DiskGrade::Hdd2))
                .wal_disk(disk(DiskGrade::Hdd2))
                .connections(100)
                .build()
                .unwrap(),
        );
        let response = optimize(&request).unwrap();
        let target = response
            .cache()
            .float("checkpoint_completion_target")
            .unwrap();
        assert_eq!(target, 0.8);
        // The HDD cannot absorb an unthrottled vacuum budget; the delay grew.
        assert!(int_of(&response, "autovacuum_vacuum_cost_delay") > 2);
    }
}
