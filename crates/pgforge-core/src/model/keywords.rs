//! User keyword overrides.
//!
//! A small validated bag of knobs that shift the tuning formulas without
//! replacing them. Unknown keys and out-of-range values are rejected at
//! construction, never silently ignored.

use serde::{Deserialize, Serialize};

use crate::error::TuneError;
use crate::units::{GI, MI};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TuneKeywords {
    /// Overrides the connection target from the options when non-zero.
    pub user_max_connections: u32,
    /// Overrides the per-tier `shared_buffers` RAM fraction when non-zero.
    /// Accepted range 0.10 ..= 0.60.
    pub shared_buffers_ratio: f64,
    /// Fraction of RAM assumed cacheable by the OS. Range 0.50 ..= 0.95.
    pub effective_cache_size_ratio: f64,
    /// Multiplier on the derived `work_mem`. Range 0.25 ..= 4.0.
    pub work_mem_scale: f64,
    /// WAL segment size the cluster was initialized with. Must be a power of
    /// two within 16 MiB ..= 1 GiB.
    pub wal_segment_size: u64,
}

impl Default for TuneKeywords {
    fn default() -> Self {
        TuneKeywords {
            user_max_connections: 0,
            shared_buffers_ratio: 0.0,
            effective_cache_size_ratio: 0.70,
            work_mem_scale: 1.0,
            wal_segment_size: 16 * MI,
        }
    }
}

impl TuneKeywords {
    /// Build from `(key, value)` pairs. Unknown keys fail the request.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, TuneError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut kw = TuneKeywords::default();
        for (key, value) in pairs {
            kw.set(key, value)?;
        }
        kw.validate()?;
        Ok(kw)
    }

    /// Set a single keyword by name.
    pub fn set(&mut self, key: &str, value: f64) -> Result<(), TuneError> {
        match key {
            "user_max_connections" => {
                if value < 0.0 || value.fract() != 0.0 {
                    return Err(TuneError::InvalidRequest(format!(
                        "user_max_connections must be a non-negative integer, got {value}"
                    )));
                }
                self.user_max_connections = value as u32;
            }
            "shared_buffers_ratio" => self.shared_buffers_ratio = value,
            "effective_cache_size_ratio" => self.effective_cache_size_ratio = value,
            "work_mem_scale" => self.work_mem_scale = value,
            "wal_segment_size" => {
                if value < 0.0 || value.fract() != 0.0 {
                    return Err(TuneError::InvalidRequest(format!(
                        "wal_segment_size must be a whole byte count, got {value}"
                    )));
                }
                self.wal_segment_size = value as u64;
            }
            other => {
                return Err(TuneError::InvalidRequest(format!(
                    "unknown tuning keyword '{other}'"
                )));
            }
        }
        Ok(())
    }

    /// Range-check every field; called by every constructor path.
    pub fn validate(&self) -> Result<(), TuneError> {
        if self.shared_buffers_ratio != 0.0
            && !(0.10..=0.60).contains(&self.shared_buffers_ratio)
        {
            return Err(TuneError::InvalidRequest(format!(
                "shared_buffers_ratio {} outside 0.10..=0.60",
                self.shared_buffers_ratio
            )));
        }
        if !(0.50..=0.95).contains(&self.effective_cache_size_ratio) {
            return Err(TuneError::InvalidRequest(format!(
                "effective_cache_size_ratio {} outside 0.50..=0.95",
                self.effective_cache_size_ratio
            )));
        }
        if !(0.25..=4.0).contains(&self.work_mem_scale) {
            return Err(TuneError::InvalidRequest(format!(
                "work_mem_scale {} outside 0.25..=4.0",
                self.work_mem_scale
            )));
        }
        let seg = self.wal_segment_size;
        if !seg.is_power_of_two() || !(16 * MI..=GI).contains(&seg) {
            return Err(TuneError::InvalidRequest(format!(
                "wal_segment_size {seg} must be a power of two within 16 MiB..=1 GiB"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        TuneKeywords::default().validate().unwrap();
    }

    #[test]
    fn unknown_key_fails() {
        let err = TuneKeywords::from_pairs([("turbo_mode", 1.0)]).unwrap_err();
        assert!(matches!(err, TuneError::InvalidRequest(_)));
    }

    #[test]
    fn out_of_range_ratio_fails() {
        assert!(TuneKeywords::from_pairs([("shared_buffers_ratio", 0.9)]).is_err());
        assert!(TuneKeywords::from_pairs([("shared_buffers_ratio", 0.3)]).is_ok());
    }

    #[test]
    fn wal_segment_size_must_be_power_of_two() {
        assert!(TuneKeywords::from_pairs([("wal_segment_size", (48 * MI) as f64)]).is_err());
        let kw = TuneKeywords::from_pairs([("wal_segment_size", (64 * MI) as f64)]).unwrap();
        assert_eq!(kw.wal_segment_size, 64 * MI);
    }
}
