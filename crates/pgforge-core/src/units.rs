//! Byte-size parsing and formatting, PostgreSQL unit conversion, and the
//! small numeric helpers shared by the disk model, the rule catalog and the
//! tuners.
//!
//! All helpers that feed integer settings floor fractional results; the few
//! places that need a ceiling (WAL segment alignment) do so explicitly via
//! [`realign_value`].

pub const KI: u64 = 1024;
pub const MI: u64 = 1024 * 1024;
pub const GI: u64 = 1024 * 1024 * 1024;
pub const TI: u64 = 1024 * GI;
pub const K10: u64 = 1000;

/// One PostgreSQL heap page. The server only ships with 8 KiB pages and the
/// whole disk model (IOPS ↔ throughput) assumes this size.
pub const DB_PAGE_SIZE: u64 = 8 * KI;

/// Default WAL segment size (`--with-wal-segsize=16`).
pub const WAL_SEGMENT_SIZE: u64 = 16 * MI;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a byte-size literal: `"8192"`, `"512MB"`, `"4 GiB"`, `"1.5tb"`.
///
/// Suffixes are binary multiples regardless of spelling (`kB` == `KiB`),
/// matching how the server itself reads memory settings. Fractional values
/// are floored to whole bytes.
pub fn parse_bytesize(text: &str) -> Result<u64, String> {
    let s = text.trim();
    if s.is_empty() {
        return Err("empty byte-size literal".to_string());
    }
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num, suffix) = s.split_at(split);
    let value: f64 = num
        .parse()
        .map_err(|_| format!("bad byte-size number in '{text}'"))?;
    let mult = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => KI,
        "m" | "mb" | "mib" => MI,
        "g" | "gb" | "gib" => GI,
        "t" | "tb" | "tib" => TI,
        other => return Err(format!("unknown byte-size suffix '{other}' in '{text}'")),
    };
    if value < 0.0 {
        return Err(format!("negative byte-size '{text}'"));
    }
    Ok((value * mult as f64).floor() as u64)
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Format a byte count as human-readable size: `"1.5 GiB"`, `"512 B"`.
pub fn bytesize_to_hr(bytes: u64) -> String {
    let f = bytes as f64;
    if bytes >= GI {
        format!("{:.1} GiB", f / GI as f64)
    } else if bytes >= MI {
        format!("{:.1} MiB", f / MI as f64)
    } else if bytes >= KI {
        format!("{:.1} KiB", f / KI as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Format a byte count as a PostgreSQL setting literal using the largest of
/// `GB`/`MB`/`kB` that divides the value exactly.
///
/// Returns `None` when the value is not a whole number of kB — the engine
/// aligns every byte-valued setting to at least 8 KiB, so hitting `None` at
/// render time is a unit mismatch, not a formatting concern.
pub fn bytesize_to_pg(bytes: u64) -> Option<String> {
    if bytes == 0 {
        return Some("0".to_string());
    }
    if bytes % GI == 0 {
        Some(format!("{}GB", bytes / GI))
    } else if bytes % MI == 0 {
        Some(format!("{}MB", bytes / MI))
    } else if bytes % KI == 0 {
        Some(format!("{}kB", bytes / KI))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// PostgreSQL unit conversion
// ---------------------------------------------------------------------------

/// Convert a byte value into an integer count of `unit`, after midpoint
/// rounding to `min_unit`: a remainder of at least `ceil(min_unit / 2)`
/// rounds up, anything less rounds down.
///
/// `min_unit` must divide `unit`; both must be positive.
pub fn bytesize_to_unit(value: u64, unit: u64, min_unit: u64) -> Result<u64, String> {
    if unit == 0 || min_unit == 0 {
        return Err("unit and min_unit must be positive".to_string());
    }
    if min_unit > unit {
        return Err("min_unit must not exceed unit".to_string());
    }
    if unit % min_unit != 0 {
        return Err("unit must be divisible by min_unit".to_string());
    }
    let d = value / min_unit;
    let m = value % min_unit;
    let rounded = min_unit * if m >= min_unit.div_ceil(2) { d + 1 } else { d };
    Ok(rounded / unit)
}

/// Return the `(floor, ceil)` multiples of `page` around `value`.
pub fn realign_value(value: u64, page: u64) -> (u64, u64) {
    let d = value / page;
    let m = value % page;
    (d * page, (d + u64::from(m > 0)) * page)
}

// ---------------------------------------------------------------------------
// Clamping
// ---------------------------------------------------------------------------

/// Clamp `value` into `[lo, hi]`.
pub fn cap_value<T: PartialOrd>(value: T, lo: T, hi: T) -> T {
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

/// Clamp after an identity redirect: if `value == redirect.0` it is replaced
/// by `redirect.1` first. Used for `-1` sentinel settings that mean "inherit
/// from another parameter".
pub fn cap_value_redirect<T: PartialOrd + PartialEq>(
    value: T,
    lo: T,
    hi: T,
    redirect: (T, T),
) -> T {
    let value = if value == redirect.0 { redirect.1 } else { value };
    cap_value(value, lo, hi)
}

// ---------------------------------------------------------------------------
// Generalized mean
// ---------------------------------------------------------------------------

/// Power mean `(Σ xᵢᵖ / n)^(1/p)` over the inputs.
///
/// `p = 1` is the arithmetic mean; negative `p` pulls toward the smallest
/// input, positive toward the largest. `p = 0` is substituted with `1e-6` to
/// dodge the singularity. The result is rounded to 4 decimal places so that
/// blends are platform-stable.
pub fn generalized_mean(xs: &[f64], p: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let level = if p == 0.0 { 1e-6 } else { p };
    let n = xs.len() as f64;
    let sum: f64 = xs.iter().map(|x| x.powf(level) / n).sum();
    let mean = sum.powf(1.0 / level);
    (mean * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_bare_and_suffixed() {
        assert_eq!(parse_bytesize("8192").unwrap(), 8192);
        assert_eq!(parse_bytesize("4GiB").unwrap(), 4 * GI);
        assert_eq!(parse_bytesize("512 MB").unwrap(), 512 * MI);
        assert_eq!(parse_bytesize("1.5gb").unwrap(), GI + GI / 2);
        assert_eq!(parse_bytesize("64kB").unwrap(), 64 * KI);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_bytesize("").is_err());
        assert!(parse_bytesize("fast").is_err());
        assert!(parse_bytesize("12parsecs").is_err());
    }

    #[test]
    fn pg_literal_uses_largest_exact_unit() {
        assert_eq!(bytesize_to_pg(2 * GI).unwrap(), "2GB");
        assert_eq!(bytesize_to_pg(614 * MI).unwrap(), "614MB");
        assert_eq!(bytesize_to_pg(64 * KI).unwrap(), "64kB");
        assert_eq!(bytesize_to_pg(0).unwrap(), "0");
        assert!(bytesize_to_pg(100).is_none());
    }

    #[test]
    fn unit_conversion_rounds_at_midpoint() {
        // 12 KiB with 8 KiB min unit: remainder 4 KiB >= ceil(8/2) -> up.
        assert_eq!(bytesize_to_unit(12 * KI, 8 * KI, 8 * KI).unwrap(), 2);
        // 11 KiB: remainder 3 KiB < 4 KiB -> down.
        assert_eq!(bytesize_to_unit(11 * KI, 8 * KI, 8 * KI).unwrap(), 1);
        // min unit below the output unit.
        assert_eq!(bytesize_to_unit(MI + 600 * KI, MI, 512 * KI).unwrap(), 1);
        assert!(bytesize_to_unit(MI, KI, 2 * KI).is_err());
        assert!(bytesize_to_unit(MI, 3 * KI, 2 * KI).is_err());
    }

    #[test]
    fn realign_returns_floor_and_ceil() {
        assert_eq!(realign_value(10, 8), (8, 16));
        assert_eq!(realign_value(16, 8), (16, 16));
        assert_eq!(realign_value(0, 8), (0, 0));
    }

    #[test]
    fn cap_redirect_substitutes_sentinel() {
        assert_eq!(cap_value(5, 1, 10), 5);
        assert_eq!(cap_value(0, 1, 10), 1);
        assert_eq!(cap_value_redirect(-1, 0, 100, (-1, 64)), 64);
        assert_eq!(cap_value_redirect(200, 0, 100, (-1, 64)), 100);
    }

    #[test]
    fn generalized_mean_levels() {
        assert_eq!(generalized_mean(&[2.0, 8.0], 1.0), 5.0);
        // p = 0 falls back to a tiny positive level (geometric-ish).
        let g = generalized_mean(&[2.0, 8.0], 0.0);
        assert!((g - 4.0).abs() < 0.01, "geometric mean ~4, got {g}");
        // Negative p pulls toward the minimum.
        assert!(generalized_mean(&[2.0, 8.0], -2.0) < 4.0);
        assert_eq!(generalized_mean(&[], 1.0), 0.0);
    }
}
