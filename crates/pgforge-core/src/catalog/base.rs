//! Base rule set (version 0): every tunable the engine manages, with its
//! static default, per-tier defaults and formulas. Version overlays in
//! [`super::overlays`] specialize this list per PostgreSQL major version.
//!
//! Declaration order matters twice: it is the render order inside each scope
//! group, and the initial pass evaluates formulas in this order against a
//! cache pre-seeded with defaults, so dependent entries are declared after
//! the entries they read.

use super::{EvalCtx, SettingValue, TuneEntry, Unit};
use crate::model::scope::PgScope;
use crate::model::workload::{OptMode, WorkloadKind};
use crate::units::{GI, KI, MI, cap_value, realign_value};

fn int(v: i64) -> SettingValue {
    SettingValue::Int(v)
}

fn bytes(v: u64) -> SettingValue {
    SettingValue::Int(v as i64)
}

fn flt(v: f64) -> SettingValue {
    SettingValue::Float(v)
}

fn txt(v: &'static str) -> SettingValue {
    SettingValue::Text(v.into())
}

// ---------------------------------------------------------------------------
// Shared formulas
// ---------------------------------------------------------------------------

/// `shared_buffers` RAM fraction by tier, MINI..HUGE.
const SHARED_BUFFERS_RATIO: [f64; 6] = [0.15, 0.25, 0.25, 0.30, 0.35, 0.40];

/// `max_wal_size` working target by tier, MINI..HUGE.
const MAX_WAL_TARGET_GIB: [u64; 6] = [2, 4, 16, 32, 48, 64];

pub(super) fn shared_buffers(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let o = ctx.options;
    let ratio = if o.keywords.shared_buffers_ratio > 0.0 {
        o.keywords.shared_buffers_ratio
    } else {
        SHARED_BUFFERS_RATIO[o.tier.index()]
    };
    let raw = (o.total_ram as f64 * ratio) as u64;
    let capped = cap_value(raw, 128 * MI, o.usable_ram() * 2 / 5);
    Ok(bytes(realign_value(capped, MI).0))
}

pub(super) fn effective_cache_size(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let o = ctx.options;
    let sb = ctx.cache.bytes("shared_buffers")?;
    let raw = ((o.total_ram as f64 * o.keywords.effective_cache_size_ratio) as u64)
        .saturating_sub(sb);
    let capped = cap_value(raw, 256 * MI, o.usable_ram().saturating_sub(sb));
    Ok(bytes(realign_value(capped, MI).0))
}

pub(super) fn work_mem(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let o = ctx.options;
    let sb = ctx.cache.bytes("shared_buffers")?;
    let ecs = ctx.cache.bytes("effective_cache_size")?;
    let conns = ctx.cache.int("max_connections")?.max(1) as f64;
    let pool = o.total_ram.saturating_sub(sb).saturating_sub(ecs) as f64;
    let per_op = pool / (conns * o.opt_mode.parallel_factor()) * o.keywords.work_mem_scale;
    let raw = (per_op as u64).max(64 * KI);
    Ok(bytes(realign_value(raw, 8 * KI).0.max(64 * KI)))
}

pub(super) fn maintenance_work_mem(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let o = ctx.options;
    let capped = cap_value(o.total_ram / 16, 64 * MI, 2 * GI);
    Ok(bytes(realign_value(capped, MI).0))
}

pub(super) fn temp_buffers(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let wm = ctx.cache.bytes("work_mem")?;
    Ok(bytes(cap_value(wm, 8 * MI, 128 * MI)))
}

pub(super) fn wal_buffers(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let sb = ctx.cache.bytes("shared_buffers")?;
    let seg = ctx.options.keywords.wal_segment_size;
    let capped = cap_value(sb / 32, 16 * MI, 2 * GI);
    Ok(bytes(realign_value(capped, seg).1))
}

pub(super) fn max_wal_size(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let o = ctx.options;
    let target = MAX_WAL_TARGET_GIB[o.tier.index()]
        * GI
        * if o.opt_mode >= OptMode::OptimusPrime { 2 } else { 1 };
    // Never size the WAL beyond what the disk can write back within one
    // checkpoint window.
    let timeout = ctx.cache.int("checkpoint_timeout")? as f64;
    let completion = ctx.cache.float("checkpoint_completion_target")?;
    let window = (timeout * completion * o.wal_disk.throughput_mib as f64) as u64 * MI;
    let capped = cap_value(target.min(window), 2 * GI, 64 * GI);
    Ok(bytes(realign_value(capped, o.keywords.wal_segment_size).0))
}

pub(super) fn min_wal_size(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let seg = ctx.options.keywords.wal_segment_size;
    let max = ctx.cache.bytes("max_wal_size")?;
    Ok(bytes(realign_value(max / 4, seg).0.max(2 * seg)))
}

pub(super) fn checkpoint_completion_target(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    Ok(flt(if ctx.options.data_disk.spinning { 0.8 } else { 0.9 }))
}

pub(super) fn max_connections(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let o = ctx.options;
    let requested = o.requested_connections() as i64;
    let tier_default = [30i64, 50, 100, 200, 400, 600][o.tier.index()];
    let base = if requested > 0 { requested } else { tier_default };
    // Floor of 10 leaves room for the reserved pools on tiny requests.
    Ok(int(if o.workload.is_analytic() {
        cap_value(base, 10, 40)
    } else {
        base.max(10)
    }))
}

/// Reserved pool cap: the floors (2 superuser + 1 reserved) always fit.
fn reserved_pool_cap(conns: i64) -> i64 {
    (conns / 4).max(3)
}

pub(super) fn superuser_reserved_connections(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let conns = ctx.cache.int("max_connections")?;
    let reserved = ctx.cache.int_or("reserved_connections", 0);
    let su = ((conns as f64 * 0.05).ceil() as i64).max(2);
    Ok(int(su.min(reserved_pool_cap(conns) - reserved).max(2)))
}

pub(super) fn reserved_connections(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let conns = ctx.cache.int("max_connections")?;
    let res = ((conns as f64 * 0.02).ceil() as i64).max(1);
    Ok(int(res.min(reserved_pool_cap(conns) - 2).max(1)))
}

pub(super) fn autovacuum_max_workers(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let cpu = ctx.options.vcpu as i64;
    Ok(int(cap_value((cpu + 3) / 4, 1, 8)))
}

pub(super) fn vacuum_cost_limit(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    Ok(int(match ctx.options.opt_mode {
        OptMode::None => 200,
        OptMode::Spidey => 1_000,
        OptMode::OptimusPrime => 2_000,
        OptMode::Primordial => 5_000,
    }))
}

pub(super) fn max_worker_processes(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    Ok(int((ctx.options.vcpu as i64).max(8)))
}

pub(super) fn max_parallel_workers(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let workers = ctx.cache.int("max_worker_processes")?;
    let target = ((ctx.options.vcpu as f64 * 0.75).ceil() as i64).max(2);
    Ok(int(target.min(workers)))
}

pub(super) fn max_parallel_workers_per_gather(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    const LADDER: [i64; 4] = [0, 2, 4, 8];
    let base_step = [1usize, 1, 2, 2, 3, 3][ctx.options.tier.index()];
    let step = match ctx.options.opt_mode {
        OptMode::None => base_step.saturating_sub(1),
        OptMode::Spidey => base_step,
        OptMode::OptimusPrime | OptMode::Primordial => (base_step + 1).min(3),
    };
    let pool = ctx.cache.int("max_parallel_workers")?;
    Ok(int(LADDER[step].min(pool)))
}

pub(super) fn max_parallel_maintenance_workers(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let cpu = ctx.options.vcpu as i64;
    Ok(int(((cpu + 3) / 4).min(4)))
}

pub(super) fn bgwriter_delay(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    Ok(int(match ctx.options.opt_mode {
        OptMode::None => 200,
        OptMode::Spidey => 150,
        OptMode::OptimusPrime => 100,
        OptMode::Primordial => 50,
    }))
}

pub(super) fn bgwriter_lru_maxpages(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let delay_ms = ctx.cache.int("bgwriter_delay")? as f64;
    // One background-writer round may claim at most 10% of the disk's IOPS.
    let budget = ctx.options.data_disk.random_iops as f64 * 0.1 * delay_ms / 1_000.0;
    Ok(int(cap_value(budget as i64, 100, 2_000)))
}

pub(super) fn effective_io_concurrency(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let iops = ctx.options.data_disk.random_iops as i64;
    Ok(int(cap_value(iops / 250, 2, 512)))
}

pub(super) fn maintenance_io_concurrency(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let iops = ctx.options.data_disk.random_iops as i64;
    Ok(int(cap_value(iops / 500, 10, 256)))
}

pub(super) fn random_page_cost(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let iops = ctx.options.data_disk.random_iops;
    Ok(flt(if iops < 1_000 {
        4.0
    } else if iops < 40_000 {
        1.5
    } else {
        1.1
    }))
}

pub(super) fn jit(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    Ok(txt(if ctx.options.workload.favors_jit() {
        "on"
    } else {
        "off"
    }))
}

pub(super) fn default_statistics_target(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    let base = [100i64, 100, 200, 300, 500, 500][ctx.options.tier.index()];
    let scaled = if ctx.options.workload.favors_jit() {
        base * 2
    } else {
        base
    };
    Ok(int(scaled.min(1_000)))
}

pub(super) fn archive_timeout(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    Ok(int(ctx.options.backup_tool.archive_timeout_secs()))
}

pub(super) fn idle_in_transaction_session_timeout(
    ctx: &EvalCtx<'_>,
) -> Result<SettingValue, String> {
    Ok(int(match ctx.options.workload {
        WorkloadKind::Tp | WorkloadKind::Soltp => 300_000,
        _ => 0,
    }))
}

fn logging_step(mode: OptMode) -> usize {
    match mode {
        OptMode::None => 0,
        OptMode::Spidey => 1,
        OptMode::OptimusPrime => 2,
        OptMode::Primordial => 3,
    }
}

pub(super) fn log_min_duration_statement(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    Ok(int([100, 500, 1_000, 5_000][logging_step(ctx.options.opt_logging)]))
}

pub(super) fn log_statement(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    Ok(txt(
        ["mod", "mod", "ddl", "none"][logging_step(ctx.options.opt_logging)],
    ))
}

pub(super) fn log_error_verbosity(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    Ok(txt(
        ["verbose", "default", "default", "terse"][logging_step(ctx.options.opt_logging)],
    ))
}

pub(super) fn log_duration(ctx: &EvalCtx<'_>) -> Result<SettingValue, String> {
    Ok(txt(
        ["on", "on", "off", "off"][logging_step(ctx.options.opt_logging)],
    ))
}

// ---------------------------------------------------------------------------
// The base profile
// ---------------------------------------------------------------------------

/// Every rule of the version-0 catalog, in declaration (and render) order.
pub(super) fn base_profile() -> Vec<TuneEntry> {
    use PgScope::*;

    vec![
        // --- connections ------------------------------------------------
        TuneEntry::new("listen_addresses", Connection, txt("*"), Unit::Text,
            "Accept connections on every interface; restrict via pg_hba"),
        TuneEntry::new("max_connections", Connection, int(100), Unit::Count,
            "Total backend slots, including the reserved pools")
            .with_tiers([int(30), int(50), int(100), int(200), int(400), int(600)])
            .with_formula(max_connections),
        TuneEntry::new("superuser_reserved_connections", Connection, int(3), Unit::Count,
            "Slots held back for superuser emergency access")
            .with_formula(superuser_reserved_connections),
        // --- memory -----------------------------------------------------
        TuneEntry::new("shared_buffers", Memory, bytes(128 * MI), Unit::Bytes,
            "Shared page cache; the per-tier RAM fraction, bounded by usable RAM")
            .with_formula(shared_buffers),
        TuneEntry::new("effective_cache_size", Memory, bytes(4 * GI), Unit::Bytes,
            "Planner estimate of OS + shared cache available for one query")
            .with_formula(effective_cache_size),
        TuneEntry::new("work_mem", Memory, bytes(4 * MI), Unit::Bytes,
            "Per-sort/hash budget; derived from RAM left after the caches")
            .with_formula(work_mem),
        TuneEntry::new("maintenance_work_mem", Memory, bytes(64 * MI), Unit::Bytes,
            "Budget for VACUUM, CREATE INDEX and friends")
            .with_formula(maintenance_work_mem),
        TuneEntry::new("autovacuum_work_mem", Memory, int(-1), Unit::Bytes,
            "-1 inherits maintenance_work_mem"),
        TuneEntry::new("temp_buffers", Memory, bytes(8 * MI), Unit::Bytes,
            "Per-session temporary table buffers")
            .with_formula(temp_buffers),
        TuneEntry::new("logical_decoding_work_mem", Memory, bytes(64 * MI), Unit::Bytes,
            "Per-walsender decoding buffer before spilling to disk"),
        TuneEntry::new("wal_buffers", Memory, bytes(16 * MI), Unit::Bytes,
            "WAL staging in shared memory, ceil-aligned to one segment")
            .with_formula(wal_buffers),
        // --- filesystem -------------------------------------------------
        TuneEntry::new("temp_file_limit", Filesystem, int(-1), Unit::Bytes,
            "Unlimited; set when temp spill can fill the volume"),
        TuneEntry::new("max_files_per_process", Filesystem, int(1_000), Unit::Count,
            "Open file descriptors per backend")
            .with_tiers([int(1_000), int(1_000), int(2_000), int(2_000), int(4_000), int(4_000)]),
        TuneEntry::new("stats_temp_directory", Filesystem, txt("pg_stat_tmp"), Unit::Text,
            "Statistics scratch directory; point at tmpfs when possible"),
        // --- disk / wal / checkpoint ------------------------------------
        TuneEntry::new("fsync", DiskIops, txt("on"), Unit::Text,
            "Never disable on data you want back"),
        TuneEntry::new("synchronous_commit", DiskIops, txt("on"), Unit::Text,
            "Commit durability; relax per-session, not globally"),
        TuneEntry::new("full_page_writes", DiskIops, txt("on"), Unit::Text,
            "Torn-page protection after checkpoints"),
        TuneEntry::new("wal_compression", DiskIops, txt("on"), Unit::Text,
            "Compress full-page images"),
        TuneEntry::new("wal_writer_delay", DiskIops, int(200), Unit::Ms,
            "Wake-up cadence of the WAL writer; sized so a full wal_buffers flush fits two rounds"),
        TuneEntry::new("wal_writer_flush_after", DiskIops, bytes(MI), Unit::Bytes,
            "Coalesce WAL writes up to this amount"),
        TuneEntry::new("checkpoint_timeout", DiskIops, int(900), Unit::Secs,
            "Checkpoint cadence by tier; stretched when the flush model says the data disk cannot keep up")
            .with_tiers([int(900), int(900), int(1_800), int(1_800), int(1_800), int(3_600)]),
        TuneEntry::new("checkpoint_completion_target", DiskIops, flt(0.9), Unit::Ratio,
            "Spread checkpoint writes across the interval; gentler on spindles")
            .with_formula(checkpoint_completion_target),
        TuneEntry::new("checkpoint_flush_after", DiskIops, bytes(256 * KI), Unit::Bytes,
            "Force writeback in small batches during checkpoints"),
        TuneEntry::new("checkpoint_warning", DiskIops, int(30), Unit::Secs,
            "Complain when WAL fills faster than the checkpoint cadence"),
        TuneEntry::new("max_wal_size", DiskIops, bytes(GI), Unit::Bytes,
            "WAL working target by tier, never beyond one checkpoint window of disk writeback")
            .with_tiers([
                bytes(2 * GI), bytes(4 * GI), bytes(16 * GI),
                bytes(32 * GI), bytes(48 * GI), bytes(64 * GI),
            ])
            .with_formula(max_wal_size),
        TuneEntry::new("min_wal_size", DiskIops, bytes(512 * MI), Unit::Bytes,
            "Recycled floor, one quarter of max_wal_size")
            .with_formula(min_wal_size),
        TuneEntry::new("bgwriter_delay", DiskIops, int(200), Unit::Ms,
            "Background writer cadence by optimization mode")
            .with_formula(bgwriter_delay),
        TuneEntry::new("bgwriter_lru_maxpages", DiskIops, int(100), Unit::Count,
            "Pages per round, capped at 10% of the data disk IOPS")
            .with_formula(bgwriter_lru_maxpages),
        TuneEntry::new("bgwriter_lru_multiplier", DiskIops, flt(2.0), Unit::Ratio,
            "Headroom over recent backend demand"),
        TuneEntry::new("bgwriter_flush_after", DiskIops, bytes(512 * KI), Unit::Bytes,
            "Writeback batching for the background writer"),
        TuneEntry::new("effective_io_concurrency", DiskIops, int(2), Unit::Count,
            "Concurrent prefetch depth, scaled from the data disk IOPS")
            .with_formula(effective_io_concurrency),
        // --- network ----------------------------------------------------
        TuneEntry::new("tcp_keepalives_idle", Network, int(300), Unit::Secs,
            "Probe idle client connections after five minutes"),
        TuneEntry::new("tcp_keepalives_interval", Network, int(30), Unit::Secs,
            "Seconds between keepalive probes"),
        TuneEntry::new("tcp_keepalives_count", Network, int(3), Unit::Count,
            "Probes before the connection is declared dead"),
        // --- logging ----------------------------------------------------
        TuneEntry::new("logging_collector", Logging, txt("on"), Unit::Text,
            "Capture stderr into managed log files"),
        TuneEntry::new("log_destination", Logging, txt("stderr"), Unit::Text, ""),
        TuneEntry::new("log_directory", Logging, txt("log"), Unit::Text, ""),
        TuneEntry::new("log_filename", Logging, txt("postgresql-%Y-%m-%d_%H%M.log"), Unit::Text, ""),
        TuneEntry::new("log_truncate_on_rotation", Logging, txt("on"), Unit::Text,
            "Overwrite on time-based reuse of a file name"),
        TuneEntry::new("log_rotation_age", Logging, int(1_440), Unit::Mins,
            "Bigger systems rotate more often by time")
            .with_tiers([int(4_320), int(1_440), int(1_440), int(360), int(360), int(240)]),
        TuneEntry::new("log_rotation_size", Logging, bytes(256 * MI), Unit::Bytes,
            "Size-based rotation backstop")
            .with_tiers([
                bytes(32 * MI), bytes(32 * MI), bytes(256 * MI),
                bytes(256 * MI), bytes(256 * MI), bytes(256 * MI),
            ]),
        TuneEntry::new("log_checkpoints", Logging, txt("on"), Unit::Text, ""),
        TuneEntry::new("log_connections & log_disconnections", Logging, txt("on"), Unit::Text,
            "Session audit trail"),
        TuneEntry::new("log_duration", Logging, txt("on"), Unit::Text,
            "Quieter at higher logging optimization")
            .with_formula(log_duration),
        TuneEntry::new("log_error_verbosity", Logging, txt("verbose"), Unit::Text, "")
            .with_formula(log_error_verbosity),
        TuneEntry::new("log_line_prefix", Logging,
            txt("%m [%p] %quser=%u@%r,db=%d,app=%a,xid=%x "), Unit::Text, ""),
        TuneEntry::new("log_lock_waits", Logging, txt("on"), Unit::Text,
            "Log waits longer than deadlock_timeout"),
        TuneEntry::new("log_statement", Logging, txt("mod"), Unit::Text, "")
            .with_formula(log_statement),
        TuneEntry::new("log_min_duration_statement", Logging, int(100), Unit::Ms,
            "Slow-query threshold by logging optimization mode")
            .with_formula(log_min_duration_statement),
        TuneEntry::new("log_temp_files", Logging, bytes(10 * MI), Unit::Bytes,
            "Log temp files at least this large"),
        TuneEntry::new("log_autovacuum_min_duration", Logging, int(300_000), Unit::Ms,
            "Log autovacuum runs over five minutes"),
        TuneEntry::new("log_timezone", Logging, txt("UTC"), Unit::Text, ""),
        // --- query tuning -----------------------------------------------
        TuneEntry::new("random_page_cost", QueryTuning, flt(4.0), Unit::Ratio,
            "Random read penalty from the data disk class")
            .with_formula(random_page_cost),
        TuneEntry::new("seq_page_cost", QueryTuning, flt(1.0), Unit::Ratio, ""),
        TuneEntry::new("cpu_tuple_cost", QueryTuning, flt(0.01), Unit::Ratio, ""),
        TuneEntry::new("cpu_index_tuple_cost", QueryTuning, flt(0.005), Unit::Ratio, ""),
        TuneEntry::new("cpu_operator_cost", QueryTuning, flt(0.0025), Unit::Ratio, ""),
        TuneEntry::new("parallel_setup_cost", QueryTuning, flt(1_000.0), Unit::Ratio, ""),
        TuneEntry::new("parallel_tuple_cost", QueryTuning, flt(0.1), Unit::Ratio, ""),
        TuneEntry::new("default_statistics_target", QueryTuning, int(100), Unit::Count,
            "Histogram resolution; doubled for scan-heavy workloads")
            .with_formula(default_statistics_target),
        TuneEntry::new("jit", QueryTuning, txt("off"), Unit::Text,
            "Pays off on large scans only")
            .with_formula(jit),
        TuneEntry::new("jit_above_cost", QueryTuning, flt(100_000.0), Unit::Ratio, ""),
        TuneEntry::new("jit_inline_above_cost", QueryTuning, flt(500_000.0), Unit::Ratio, ""),
        TuneEntry::new("jit_optimize_above_cost", QueryTuning, flt(500_000.0), Unit::Ratio, ""),
        TuneEntry::new("plan_cache_mode", QueryTuning, txt("auto"), Unit::Text, ""),
        TuneEntry::new("max_parallel_workers_per_gather", QueryTuning, int(2), Unit::Count,
            "Per-query parallel fan-out by tier and mode")
            .with_formula(max_parallel_workers_per_gather),
        TuneEntry::new("max_parallel_maintenance_workers", QueryTuning, int(2), Unit::Count, "")
            .with_formula(max_parallel_maintenance_workers),
        // --- vm ---------------------------------------------------------
        TuneEntry::new("max_worker_processes", Vm, int(8), Unit::Count,
            "Instance-wide background worker slots, at least one per vCPU")
            .with_formula(max_worker_processes),
        TuneEntry::new("max_parallel_workers", Vm, int(8), Unit::Count,
            "Parallel query slice of the worker pool")
            .with_formula(max_parallel_workers),
        TuneEntry::new("huge_pages", Vm, txt("try"), Unit::Text,
            "Use huge pages when the kernel provides them"),
        TuneEntry::new("shared_memory_type", Vm, txt("mmap"), Unit::Text, ""),
        TuneEntry::new("dynamic_shared_memory_type", Vm, txt("posix"), Unit::Text, ""),
        // --- maintenance / vacuum ---------------------------------------
        TuneEntry::new("autovacuum", Maintenance, txt("on"), Unit::Text, ""),
        TuneEntry::new("autovacuum_max_workers", Maintenance, int(3), Unit::Count,
            "One worker per four vCPUs, at most eight")
            .with_formula(autovacuum_max_workers),
        TuneEntry::new("autovacuum_naptime", Maintenance, int(60), Unit::Secs,
            "Scheduler wake-up; busier boxes check more often")
            .with_tiers([int(60), int(60), int(30), int(30), int(15), int(15)]),
        TuneEntry::new("autovacuum_vacuum_threshold", Maintenance, int(50), Unit::Count,
            "Dead-tuple floor before scale factor applies")
            .with_tiers([int(50), int(100), int(500), int(1_000), int(2_000), int(5_000)]),
        TuneEntry::new("autovacuum_vacuum_scale_factor", Maintenance, flt(0.2), Unit::Ratio,
            "Smaller on larger estates so big tables still get vacuumed")
            .with_tiers([flt(0.2), flt(0.1), flt(0.05), flt(0.02), flt(0.01), flt(0.005)]),
        TuneEntry::new("autovacuum_analyze_threshold", Maintenance, int(50), Unit::Count, "")
            .with_tiers([int(50), int(100), int(500), int(1_000), int(2_000), int(5_000)]),
        TuneEntry::new("autovacuum_analyze_scale_factor", Maintenance, flt(0.1), Unit::Ratio, "")
            .with_tiers([flt(0.1), flt(0.05), flt(0.025), flt(0.01), flt(0.005), flt(0.0025)]),
        TuneEntry::new("autovacuum_vacuum_cost_delay", Maintenance, int(2), Unit::Ms,
            "Stretched when the cost model would out-write the data disk"),
        TuneEntry::new("autovacuum_vacuum_cost_limit", Maintenance, int(-1), Unit::Count,
            "-1 inherits vacuum_cost_limit"),
        TuneEntry::new("vacuum_cost_delay", Maintenance, int(0), Unit::Ms,
            "Foreground VACUUM runs unthrottled"),
        TuneEntry::new("vacuum_cost_limit", Maintenance, int(200), Unit::Count,
            "Cost budget per delay round, by optimization mode")
            .with_formula(vacuum_cost_limit),
        TuneEntry::new("vacuum_cost_page_hit", Maintenance, int(1), Unit::Count, ""),
        TuneEntry::new("vacuum_cost_page_miss", Maintenance, int(10), Unit::Count, ""),
        TuneEntry::new("vacuum_cost_page_dirty", Maintenance, int(20), Unit::Count, ""),
        TuneEntry::new("vacuum_freeze_min_age", Maintenance, int(50_000_000), Unit::Count, ""),
        TuneEntry::new("vacuum_freeze_table_age", Maintenance, int(150_000_000), Unit::Count, ""),
        TuneEntry::new("autovacuum_freeze_max_age", Maintenance, int(200_000_000), Unit::Count,
            "Hard anti-wraparound trigger"),
        TuneEntry::new("old_snapshot_threshold", Maintenance, int(-1), Unit::Count,
            "Disabled; snapshot-too-old pruning is a foot-gun"),
        // --- archive / recovery / backup --------------------------------
        TuneEntry::new("wal_level", Archive, txt("replica"), Unit::Text,
            "Enough WAL detail for physical replication and PITR"),
        TuneEntry::new("archive_mode", Archive, txt("on"), Unit::Text,
            "Enabled so archiving can be switched on without a restart"),
        TuneEntry::new("archive_command", Archive, txt(""), Unit::Text,
            "Set by the operator; empty means archiving is parked"),
        TuneEntry::new("archive_timeout", Archive, int(1_800), Unit::Secs,
            "Forced segment switch cadence by backup tool")
            .with_formula(archive_timeout),
        TuneEntry::new("max_wal_senders", Archive, int(3), Unit::Count,
            "Replication and base-backup streams")
            .with_tiers([int(3), int(3), int(5), int(5), int(7), int(7)]),
        TuneEntry::new("max_replication_slots", Archive, int(3), Unit::Count, "")
            .with_tiers([int(3), int(3), int(5), int(5), int(7), int(7)]),
        TuneEntry::new("max_slot_wal_keep_size", Archive, int(-1), Unit::Bytes,
            "Unbounded; bound it when a dead slot may fill the WAL volume"),
        TuneEntry::new("wal_sender_timeout", Archive, int(60), Unit::Secs, ""),
        TuneEntry::new("wal_receiver_timeout", Archive, int(60), Unit::Secs, ""),
        TuneEntry::new("hot_standby", Archive, txt("on"), Unit::Text, ""),
        TuneEntry::new("hot_standby_feedback", Archive, txt("off"), Unit::Text,
            "Keep bloat on the standby, not the primary"),
        // --- extra ------------------------------------------------------
        TuneEntry::new("statement_timeout", Extra, int(0), Unit::Ms,
            "No global kill switch; set per role where needed"),
        TuneEntry::new("lock_timeout", Extra, int(0), Unit::Ms, ""),
        TuneEntry::new("idle_in_transaction_session_timeout", Extra, int(0), Unit::Ms,
            "Five minutes on OLTP; open transactions hold back vacuum")
            .with_formula(idle_in_transaction_session_timeout),
        TuneEntry::new("deadlock_timeout", Extra, int(1_000), Unit::Ms, ""),
        TuneEntry::new("default_transaction_isolation", Extra, txt("read committed"), Unit::Text, ""),
        TuneEntry::new("shared_preload_libraries", Extra, txt("pg_stat_statements"), Unit::Text,
            "Query statistics are table stakes"),
        TuneEntry::new("password_encryption", Extra, txt("scram-sha-256"), Unit::Text, ""),
        // --- others -----------------------------------------------------
        TuneEntry::new("track_activities", Others, txt("on"), Unit::Text, ""),
        TuneEntry::new("track_counts", Others, txt("on"), Unit::Text, ""),
        TuneEntry::new("track_io_timing", Others, txt("on"), Unit::Text,
            "Cheap on anything with a sane clock source"),
        TuneEntry::new("track_functions", Others, txt("none"), Unit::Text, ""),
        TuneEntry::new("track_activity_query_size", Others, bytes(2 * KI), Unit::Bytes, "")
            .with_tiers([
                bytes(KI), bytes(2 * KI), bytes(2 * KI),
                bytes(4 * KI), bytes(4 * KI), bytes(8 * KI),
            ]),
    ]
}
