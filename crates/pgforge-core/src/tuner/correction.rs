//! The correction tuner: a fixed-point pass enforcing the cross-parameter
//! constraints that no single initial formula can see.
//!
//! Each phase is a pure function of the request and the response cache; the
//! top-level loop re-runs the memory/WAL/vacuum/parallelism phases until a
//! sweep leaves the cache untouched, bounded by [`MAX_SWEEPS`].

use crate::catalog::{ManagedCache, SettingValue};
use crate::error::TuneError;
use crate::model::disks::iops_to_throughput;
use crate::model::options::{TuneOptions, TuneRequest};
use crate::model::scope::TunerScope;
use crate::model::workload::{OptMode, WorkloadKind};
use crate::response::Response;
use crate::tuner::estimate::{checkpoint_time, vacuum_time, wal_time};
use crate::units::{KI, cap_value, cap_value_redirect, realign_value};

/// Sweep cap for the fixed-point loop.
const MAX_SWEEPS: usize = 4;

/// A full WAL-buffer flush must complete within this many writer delays.
const WAL_FLUSH_SAFETY_FACTOR: f64 = 2.0;

/// Busiest tolerated data-disk share during a worst-case checkpoint flush.
const CHECKPOINT_DISK_UTILIZATION_CAP: f64 = 0.9;

/// Checkpoint cadence ladder, seconds.
const CHECKPOINT_LADDER: [i64; 5] = [300, 600, 900, 1_800, 3_600];

pub fn correction_tuning(
    request: &TuneRequest,
    response: &mut Response,
) -> Result<(), TuneError> {
    if response.tuner_scope != TunerScope::DatabaseConfig {
        return Ok(());
    }
    let options = &request.options;

    phase_connections(options, response)?;

    let mut converged = false;
    let mut residual: Vec<String> = Vec::new();
    for _sweep in 0..MAX_SWEEPS {
        let snapshot = response.cache().clone();
        phase_memory(options, response)?;
        phase_wal_checkpoint(options, response)?;
        phase_vacuum(options, response)?;
        phase_parallelism(options, response)?;
        residual = diff_keys(&snapshot, response.cache());
        if residual.is_empty() {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(TuneError::CorrectionDidNotConverge(residual));
    }

    phase_logging(options, response)?;
    Ok(())
}

/// Keys whose cached value differs between two cache states.
fn diff_keys(before: &ManagedCache, after: &ManagedCache) -> Vec<String> {
    let mut keys: Vec<String> = after
        .iter()
        .filter(|(key, value)| before.get(key) != Some(value))
        .map(|(key, _)| key.to_string())
        .collect();
    keys.sort();
    keys
}

fn cache_bytes(response: &Response, key: &'static str) -> Result<u64, TuneError> {
    response
        .cache()
        .bytes(key)
        .map_err(|cause| TuneError::CatalogEval {
            key: key.to_string(),
            cause,
        })
}

fn cache_int(response: &Response, key: &'static str) -> Result<i64, TuneError> {
    response
        .cache()
        .int(key)
        .map_err(|cause| TuneError::CatalogEval {
            key: key.to_string(),
            cause,
        })
}

// ---------------------------------------------------------------------------
// Phase 1 — connection budget
// ---------------------------------------------------------------------------

/// Clamp analytics connection targets and size the reserved pools.
/// `reserved_connections` only exists from v16 on; `trigger_tuning` skips it
/// on older catalogs.
fn phase_connections(options: &TuneOptions, response: &mut Response) -> Result<(), TuneError> {
    response.trigger_tuning(
        options,
        &[
            "max_connections",
            "reserved_connections",
            "superuser_reserved_connections",
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Phase 2 — memory budget
// ---------------------------------------------------------------------------

/// Worst-case concurrent allocation: every backend holds its temp buffers
/// plus `parallel_factor` sort spaces, on top of the shared cache and one
/// maintenance budget per autovacuum worker.
fn worst_case_mem(options: &TuneOptions, response: &Response) -> Result<u64, TuneError> {
    let sb = cache_bytes(response, "shared_buffers")?;
    let work_mem = cache_bytes(response, "work_mem")?;
    let temp_buffers = cache_bytes(response, "temp_buffers")?;
    let maintenance = cache_bytes(response, "maintenance_work_mem")?;
    let conns = cache_int(response, "max_connections")?.max(0) as u64;
    let autovac = cache_int(response, "autovacuum_max_workers")?.max(0) as u64;
    let per_conn =
        temp_buffers as f64 + options.opt_mode.parallel_factor() * work_mem as f64;
    Ok(sb + (conns as f64 * per_conn) as u64 + maintenance * autovac)
}

fn phase_memory(options: &TuneOptions, response: &mut Response) -> Result<(), TuneError> {
    response.trigger_tuning(
        options,
        &[
            "shared_buffers",
            "effective_cache_size",
            "work_mem",
            "maintenance_work_mem",
            "temp_buffers",
            "wal_buffers",
        ],
    )?;

    let usable = options.usable_ram();
    let worst = worst_case_mem(options, response)?;
    if worst <= usable {
        return Ok(());
    }

    // One proportional shrink of work_mem, then give up.
    let factor = usable as f64 / worst as f64;
    let work_mem = cache_bytes(response, "work_mem")?;
    let shrunk = realign_value((work_mem as f64 * factor) as u64, 8 * KI)
        .0
        .max(64 * KI);
    response.set_item("work_mem", SettingValue::Int(shrunk as i64))?;
    response.trigger_tuning(options, &["temp_buffers"])?;

    let worst = worst_case_mem(options, response)?;
    if worst > usable {
        return Err(TuneError::MemoryBudgetInfeasible {
            worst_case: worst,
            usable,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Phase 3 — WAL and checkpoint
// ---------------------------------------------------------------------------

fn phase_wal_checkpoint(options: &TuneOptions, response: &mut Response) -> Result<(), TuneError> {
    response.trigger_tuning(options, &["wal_buffers"])?;

    // Writer delay: a full wal_buffers flush (rotate + write) must fit into
    // WAL_FLUSH_SAFETY_FACTOR writer rounds.
    let wal_buffers = cache_bytes(response, "wal_buffers")?;
    let seg = options.keywords.wal_segment_size;
    let flush = wal_time(wal_buffers, 1.0, seg, 0, options.wal_disk.throughput_mib);
    let needed_ms = (flush.total_time_ms / WAL_FLUSH_SAFETY_FACTOR).ceil() as i64;
    let delay = cap_value(((needed_ms + 9) / 10) * 10, 200, 10_000);
    response.set_item("wal_writer_delay", SettingValue::Int(delay))?;

    // Checkpoint cadence: tier base, one step up for Primordial, one step
    // down for OLTP at aggressive modes, then stretched while the worst-case
    // flush would saturate the data disk.
    let base_step: usize = match options.tier.index() {
        0 | 1 => 2,
        2 | 3 | 4 => 3,
        _ => 4,
    };
    let mut step = base_step;
    if options.opt_mode == OptMode::Primordial {
        step = (step + 1).min(CHECKPOINT_LADDER.len() - 1);
    }
    if matches!(options.workload, WorkloadKind::Tp | WorkloadKind::Soltp)
        && options.opt_mode >= OptMode::OptimusPrime
    {
        step = step.saturating_sub(1);
    }
    let completion = if options.data_disk.spinning { 0.8 } else { 0.9 };
    let ratio = options.workload.checkpoint_flush_ratio();
    for _ in 0..3 {
        let model = checkpoint_time(
            CHECKPOINT_LADDER[step],
            completion,
            options.wal_disk.throughput_mib,
            options.data_disk.random_iops,
            wal_buffers,
            ratio,
            seg,
        );
        if model.data_disk_utilization <= CHECKPOINT_DISK_UTILIZATION_CAP
            || step == CHECKPOINT_LADDER.len() - 1
        {
            break;
        }
        step += 1;
    }
    response.set_item("checkpoint_timeout", SettingValue::Int(CHECKPOINT_LADDER[step]))?;

    response.trigger_tuning(
        options,
        &[
            "checkpoint_completion_target",
            "max_wal_size",
            "min_wal_size",
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Phase 4 — vacuum and autovacuum
// ---------------------------------------------------------------------------

fn phase_vacuum(options: &TuneOptions, response: &mut Response) -> Result<(), TuneError> {
    response.trigger_tuning(options, &["autovacuum_max_workers", "vacuum_cost_limit"])?;

    let hit = response.cache().int_or("vacuum_cost_page_hit", 1);
    let miss = response.cache().int_or("vacuum_cost_page_miss", 2);
    // Removed from the v18 catalog; the model keeps the classic cost.
    let dirty = response.cache().int_or("vacuum_cost_page_dirty", 20);
    // -1 inherits vacuum_cost_limit.
    let cost_limit = cap_value_redirect(
        response.cache().int_or("autovacuum_vacuum_cost_limit", -1),
        1,
        10_000,
        (-1, cache_int(response, "vacuum_cost_limit")?),
    );

    // Double the delay until the dirty-page budget fits the data disk and the
    // frequent-vacuum mix leaves half the disk to everyone else.
    let disk_mib = iops_to_throughput(options.data_disk.random_iops);
    let mut delay = cache_int(response, "autovacuum_vacuum_cost_delay")?.max(1);
    loop {
        let model = vacuum_time(hit, miss, dirty, delay, cost_limit, options.data_disk.random_iops);
        let fits = model.max_dirty_data_mib <= disk_mib
            && model.five_five_one_data_mib <= 0.5 * disk_mib;
        if fits || delay >= 100 {
            break;
        }
        delay = (delay * 2).min(100);
    }
    response.set_item("autovacuum_vacuum_cost_delay", SettingValue::Int(delay))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Phase 5 — parallelism and background writer
// ---------------------------------------------------------------------------

fn phase_parallelism(options: &TuneOptions, response: &mut Response) -> Result<(), TuneError> {
    response.trigger_tuning(
        options,
        &[
            "max_worker_processes",
            "max_parallel_workers",
            "max_parallel_workers_per_gather",
            "max_parallel_maintenance_workers",
            "bgwriter_delay",
            "bgwriter_lru_maxpages",
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Phase 6 — logging
// ---------------------------------------------------------------------------

fn phase_logging(options: &TuneOptions, response: &mut Response) -> Result<(), TuneError> {
    response.trigger_tuning(
        options,
        &[
            "log_min_duration_statement",
            "log_statement",
            "log_error_verbosity",
            "log_duration",
        ],
    )?;
    Ok(())
}
