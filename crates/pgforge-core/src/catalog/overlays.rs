//! Per-version overlays against the base rule set.
//!
//! Each overlay carries what changed in that PostgreSQL major release, as far
//! as this engine manages it: new settings appear with `Add`, changed server
//! defaults with `Merge`, retired settings with `Remove`. Resolution applies
//! every overlay up to the requested version in order.

use super::base;
use super::merge::{EntryDelta, Patch};
use super::{SettingValue, TuneEntry, Unit};
use crate::model::scope::PgScope::*;
use crate::units::{KI, MI};

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

pub(super) fn overlay_for(version: u32) -> Vec<Patch> {
    match version {
        13 => overlay_v13(),
        14 => overlay_v14(),
        15 => overlay_v15(),
        16 => overlay_v16(),
        17 => overlay_v17(),
        18 => overlay_v18(),
        _ => Vec::new(),
    }
}

fn overlay_v13() -> Vec<Patch> {
    vec![
        Patch::Add(
            TuneEntry::new("wal_keep_size", Archive, bytes(0), Unit::Bytes,
                "Segment retention beyond the slots; replaces wal_keep_segments"),
        ),
        Patch::Add(
            TuneEntry::new("maintenance_io_concurrency", DiskIops, int(10), Unit::Count,
                "Prefetch depth for maintenance work")
                .with_op(base::maintenance_io_concurrency),
        ),
        Patch::Add(
            TuneEntry::new("hash_mem_multiplier", Memory, flt(1.0), Unit::Ratio,
                "Hash tables may exceed work_mem by this factor"),
        ),
        Patch::Add(
            TuneEntry::new("autovacuum_vacuum_insert_threshold", Maintenance, int(1_000), Unit::Count,
                "Vacuum append-only tables too")
                .with_tiers([
                    int(1_000), int(1_000), int(5_000),
                    int(10_000), int(10_000), int(20_000),
                ]),
        ),
        Patch::Add(
            TuneEntry::new("autovacuum_vacuum_insert_scale_factor", Maintenance, flt(0.2), Unit::Ratio, "")
                .with_tiers([flt(0.2), flt(0.1), flt(0.05), flt(0.02), flt(0.01), flt(0.005)]),
        ),
    ]
}

fn overlay_v14() -> Vec<Patch> {
    vec![
        Patch::Add(TuneEntry::new("compute_query_id", Others, txt("auto"), Unit::Text, "")),
        Patch::Add(
            TuneEntry::new("track_wal_io_timing", Others, txt("on"), Unit::Text,
                "WAL timing alongside block IO timing"),
        ),
        Patch::Add(TuneEntry::new("idle_session_timeout", Extra, int(0), Unit::Ms, "")),
        Patch::Add(
            TuneEntry::new("vacuum_failsafe_age", Maintenance, int(1_600_000_000), Unit::Count,
                "Emergency brake well before wraparound"),
        ),
        Patch::Add(TuneEntry::new("huge_page_size", Vm, bytes(0), Unit::Bytes,
            "0 follows the kernel default size")),
        // Server default dropped from 10 to 2 with the new cost model.
        Patch::Merge(EntryDelta::new("vacuum_cost_page_miss").default_value(int(2))),
        // lz4 became available for full-page image compression.
        Patch::Merge(
            EntryDelta::new("wal_compression")
                .default_value(txt("lz4"))
                .comment("Compress full-page images with lz4"),
        ),
    ]
}

fn overlay_v15() -> Vec<Patch> {
    vec![
        Patch::Add(TuneEntry::new("stats_fetch_consistency", Others, txt("cache"), Unit::Text, "")),
        Patch::Add(
            TuneEntry::new("recovery_prefetch", Archive, txt("try"), Unit::Text,
                "Prefetch referenced blocks during WAL replay"),
        ),
        // The statistics collector moved into shared memory.
        Patch::Remove("stats_temp_directory"),
        Patch::Merge(EntryDelta::new("hash_mem_multiplier").default_value(flt(2.0))),
    ]
}

fn overlay_v16() -> Vec<Patch> {
    vec![
        Patch::Add(
            TuneEntry::new("reserved_connections", Connection, int(0), Unit::Count,
                "Slots for roles with pg_use_reserved_connections")
                .with_trigger(base::reserved_connections),
        ),
        Patch::Add(
            TuneEntry::new("vacuum_buffer_usage_limit", Maintenance, bytes(2 * MI), Unit::Bytes,
                "Ring buffer for vacuum page access"),
        ),
    ]
}

fn overlay_v17() -> Vec<Patch> {
    vec![
        Patch::Add(TuneEntry::new("summarize_wal", Archive, txt("off"), Unit::Text,
            "Required for incremental base backups")),
        Patch::Add(TuneEntry::new("wal_summary_keep_time", Archive, int(14_400), Unit::Mins, "")),
        Patch::Add(
            TuneEntry::new("io_combine_limit", DiskIops, bytes(128 * KI), Unit::Bytes,
                "Merge adjacent reads up to this size"),
        ),
        Patch::Remove("old_snapshot_threshold"),
    ]
}

fn overlay_v18() -> Vec<Patch> {
    vec![
        Patch::Add(TuneEntry::new("io_method", DiskIops, txt("worker"), Unit::Text,
            "Asynchronous IO backend")),
        Patch::Add(
            TuneEntry::new("io_workers", DiskIops, int(3), Unit::Count, "")
                .with_tiers([int(3), int(3), int(4), int(6), int(8), int(8)]),
        ),
        Patch::Add(
            TuneEntry::new("autovacuum_worker_slots", Maintenance, int(16), Unit::Count,
                "Ceiling for raising autovacuum_max_workers without restart"),
        ),
        Patch::Remove("vacuum_cost_page_dirty"),
    ]
}
