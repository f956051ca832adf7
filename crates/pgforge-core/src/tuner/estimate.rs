//! Closed-form timing models backing the correction pass.
//!
//! These estimate how long WAL flushes, checkpoints and vacuum rounds take on
//! the described hardware; the correction phases compare the estimates
//! against their utilization budgets and tighten parameters until they fit.

use crate::model::disks::iops_to_throughput;
use crate::units::{DB_PAGE_SIZE, MI};

/// Time to create, open and close one WAL segment file, in milliseconds.
/// Measured with cold caches on NTFS and EXT4/XFS; roughly doubles under
/// virtualization, which is the figure used here.
const FILE_ROTATION_TIME_MS: f64 = 0.21 * 2.0;

/// Cost of flushing `wal_buffers * data_amount_ratio` bytes of WAL.
#[derive(Debug, Clone, Copy)]
pub struct WalTime {
    pub num_wal_files: u64,
    pub rotate_time_ms: f64,
    pub write_time_ms: f64,
    pub delay_time_ms: f64,
    pub total_time_ms: f64,
}

/// Estimate the time to flush the queued WAL to disk: segment rotation plus
/// sequential write plus the writer delays incurred while the queue refills.
pub fn wal_time(
    wal_buffers: u64,
    data_amount_ratio: f64,
    wal_segment_size: u64,
    wal_writer_delay_ms: i64,
    wal_throughput_mib: u64,
) -> WalTime {
    let data_amount = (wal_buffers as f64 * data_amount_ratio) as u64;
    let num_wal_files = data_amount / wal_segment_size + 1;
    let rotate_time_ms = num_wal_files as f64 * FILE_ROTATION_TIME_MS;
    let write_time_ms = (data_amount as f64 / MI as f64) / wal_throughput_mib as f64 * 1_000.0;

    let mut delay_time_ms = 0.0;
    if data_amount_ratio > 1.0 {
        let mut num_delay = data_amount_ratio.floor();
        if data_amount_ratio.fract() == 0.0 {
            num_delay -= 1.0;
        }
        delay_time_ms = num_delay * wal_writer_delay_ms as f64;
    }

    WalTime {
        num_wal_files,
        rotate_time_ms,
        write_time_ms,
        delay_time_ms,
        total_time_ms: rotate_time_ms + write_time_ms + delay_time_ms,
    }
}

/// Disk pressure during the spread-out portion of one checkpoint.
#[derive(Debug, Clone, Copy)]
pub struct CheckpointTime {
    pub checkpoint_duration_secs: u64,
    pub data_disk_translated_tput_mib: f64,
    pub data_amount: u64,
    pub page_amount: u64,
    pub wal_amount: u64,
    pub wal_read_time_secs: u64,
    pub wal_disk_utilization: f64,
    pub data_write_time_secs: u64,
    pub data_disk_utilization: f64,
}

/// Model one worst-case checkpoint: read `wal_buffers * data_amount_ratio`
/// of WAL and write the corresponding pages back through the data disk's
/// random-IO budget, all inside `checkpoint_timeout * completion_target`.
pub fn checkpoint_time(
    checkpoint_timeout_secs: i64,
    checkpoint_completion_target: f64,
    wal_disk_tput_mib: u64,
    data_disk_iops: u64,
    wal_buffers: u64,
    data_amount_ratio: f64,
    wal_segment_size: u64,
) -> CheckpointTime {
    let checkpoint_duration_secs =
        (checkpoint_timeout_secs as f64 * checkpoint_completion_target).ceil() as u64;
    let data_disk_translated_tput_mib = iops_to_throughput(data_disk_iops);

    let data_amount = (wal_buffers as f64 * data_amount_ratio) as u64;
    let page_amount = data_amount / DB_PAGE_SIZE;
    let wal_amount = data_amount / wal_segment_size;

    let data_mib = data_amount as f64 / MI as f64;
    let wal_read_time_secs = (data_mib / wal_disk_tput_mib as f64).floor() as u64;
    let data_write_time_secs = (data_mib / data_disk_translated_tput_mib).floor() as u64;
    let duration = checkpoint_duration_secs.max(1) as f64;

    CheckpointTime {
        checkpoint_duration_secs,
        data_disk_translated_tput_mib,
        data_amount,
        page_amount,
        wal_amount,
        wal_read_time_secs,
        wal_disk_utilization: wal_read_time_secs as f64 / duration,
        data_write_time_secs,
        data_disk_utilization: data_write_time_secs as f64 / duration,
    }
}

/// Per-second page budgets of the vacuum cost model.
#[derive(Debug, Clone, Copy)]
pub struct VacuumTime {
    pub budget_per_sec: u64,
    pub max_num_hit_page: u64,
    pub max_num_miss_page: u64,
    pub max_num_dirty_page: u64,
    /// Throughput equivalents, MiB/s.
    pub max_hit_data_mib: f64,
    pub max_miss_data_mib: f64,
    pub max_dirty_data_mib: f64,
    /// The frequent-vacuum scenario: 5 hit + 5 miss + 1 dirty per unit.
    pub five_five_one_page: u64,
    pub five_five_one_data_mib: f64,
    /// The rare-vacuum scenario: 1:1:1.
    pub one_one_one_page: u64,
    pub one_one_one_data_mib: f64,
}

/// Estimate how many pages one vacuum round may touch per second under the
/// given cost parameters, and the disk throughput that implies.
pub fn vacuum_time(
    hit_cost: i64,
    miss_cost: i64,
    dirty_cost: i64,
    delay_ms: i64,
    cost_limit: i64,
    _data_disk_iops: u64,
) -> VacuumTime {
    let budget_per_sec = (cost_limit as f64 / delay_ms as f64 * 1_000.0).ceil() as u64;

    let max_num_hit_page = budget_per_sec / hit_cost as u64;
    let max_num_miss_page = budget_per_sec / miss_cost as u64;
    let max_num_dirty_page = budget_per_sec / dirty_cost as u64;

    let five_five_one_page =
        budget_per_sec / (5 * hit_cost + 5 * miss_cost + dirty_cost) as u64;
    let one_one_one_page = budget_per_sec / (hit_cost + miss_cost + dirty_cost) as u64;

    VacuumTime {
        budget_per_sec,
        max_num_hit_page,
        max_num_miss_page,
        max_num_dirty_page,
        max_hit_data_mib: iops_to_throughput(max_num_hit_page),
        max_miss_data_mib: iops_to_throughput(max_num_miss_page),
        max_dirty_data_mib: iops_to_throughput(max_num_dirty_page),
        five_five_one_page,
        five_five_one_data_mib: iops_to_throughput(five_five_one_page * 5 + five_five_one_page),
        one_one_one_page,
        one_one_one_data_mib: iops_to_throughput(one_one_one_page + one_one_one_page),
    }
}

/// Dead-tuple counts at which a table of the given size triggers vacuum.
#[derive(Debug, Clone, Copy)]
pub struct VacuumScale {
    pub at_10k: u64,
    pub at_300k: u64,
    pub at_5m: u64,
    pub at_25m: u64,
    pub at_300m: u64,
    pub at_1b: u64,
    pub at_10b: u64,
}

/// Evaluate `threshold + scale_factor * rows` across representative table
/// sizes; the tier tables are chosen so this curve stays sub-linear.
pub fn vacuum_scale(threshold: i64, scale_factor: f64) -> VacuumScale {
    let f = |rows: u64| (threshold as f64 + scale_factor * rows as f64).floor() as u64;
    VacuumScale {
        at_10k: f(10_000),
        at_300k: f(300_000),
        at_5m: f(5_000_000),
        at_25m: f(25_000_000),
        at_300m: f(300_000_000),
        at_1b: f(1_000_000_000),
        at_10b: f(10_000_000_000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::GI;

    #[test]
    fn wal_time_adds_rotation_write_and_delay() {
        // 32 MiB over 350 MiB/s: 3 segment files, ~91.4 ms write.
        let wt = wal_time(32 * MI, 1.0, 16 * MI, 200, 350);
        assert_eq!(wt.num_wal_files, 3);
        assert_eq!(wt.delay_time_ms, 0.0);
        assert!((wt.write_time_ms - 91.43).abs() < 0.1);
        assert!(wt.total_time_ms > wt.write_time_ms);

        // Ratio 2.5 queues two full writer delays.
        let wt = wal_time(32 * MI, 2.5, 16 * MI, 200, 350);
        assert_eq!(wt.delay_time_ms, 400.0);
        // Whole ratios count one delay fewer.
        let wt = wal_time(32 * MI, 2.0, 16 * MI, 200, 350);
        assert_eq!(wt.delay_time_ms, 200.0);
    }

    #[test]
    fn checkpoint_utilization_scales_with_disk_speed() {
        let fast = checkpoint_time(900, 0.9, 350, 40_000, 32 * MI, 2.0, 16 * MI);
        assert_eq!(fast.checkpoint_duration_secs, 810);
        assert!(fast.data_disk_utilization < 0.1);

        // The same flush against a spindle saturates.
        let slow = checkpoint_time(900, 0.9, 160, 200, 2 * GI, 6.0, 16 * MI);
        assert!(slow.data_disk_utilization > 0.9);
    }

    #[test]
    fn vacuum_budget_divides_by_page_costs() {
        let vt = vacuum_time(1, 2, 20, 2, 200, 40_000);
        assert_eq!(vt.budget_per_sec, 100_000);
        assert_eq!(vt.max_num_hit_page, 100_000);
        assert_eq!(vt.max_num_miss_page, 50_000);
        assert_eq!(vt.max_num_dirty_page, 5_000);
        // 5:5:1 mix: 100000 / (5 + 10 + 20) = 2857 units.
        assert_eq!(vt.five_five_one_page, 2_857);
    }

    #[test]
    fn vacuum_scale_is_linear_in_rows_for_fixed_factor() {
        let vs = vacuum_scale(50, 0.2);
        assert_eq!(vs.at_10k, 2_050);
        assert_eq!(vs.at_300k, 60_050);
        // Tier tables shrink the factor as tables grow; emulate the HUGE tier
        // and check the curve stays well under linear growth.
        let huge = vacuum_scale(5_000, 0.005);
        assert_eq!(huge.at_300m, 1_505_000);
        assert!(huge.at_300m < vs.at_300m);
    }
}
