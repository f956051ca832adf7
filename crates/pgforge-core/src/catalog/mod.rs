//! The versioned rule catalog.
//!
//! Each tunable is a data record: a static default, optional per-tier
//! defaults, an optional initial formula (`tune_op`) and an optional
//! correction formula (`trigger`). The base catalog holds every rule;
//! per-version overlays add, merge into, or remove entries. Catalogs are
//! process-wide immutable singletons, built once per version on first use.

mod base;
mod merge;
mod overlays;

pub use merge::{EntryDelta, Patch};

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use serde::Serialize;

use crate::model::options::{MAX_SUPPORTED_VERSION, MIN_SUPPORTED_VERSION, TuneOptions};
use crate::model::scope::PgScope;
use crate::model::sizing::Tier;
use crate::units::bytesize_to_pg;

/// Separator for composite keys registering several synonyms on one record.
pub const MULTI_ITEMS_SPLIT: char = '&';

// ---------------------------------------------------------------------------
// Values and display units
// ---------------------------------------------------------------------------

/// A single setting value. Integers carry bytes, milliseconds, seconds,
/// minutes or plain counts depending on the entry's [`Unit`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Int(i64),
    Float(f64),
    Text(Cow<'static, str>),
}

impl SettingValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            SettingValue::Int(v) => Some(*v as f64),
            SettingValue::Float(v) => Some(*v),
            SettingValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<u64> for SettingValue {
    fn from(v: u64) -> Self {
        SettingValue::Int(v as i64)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Float(v)
    }
}

impl From<&'static str> for SettingValue {
    fn from(v: &'static str) -> Self {
        SettingValue::Text(Cow::Borrowed(v))
    }
}

impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        SettingValue::Text(Cow::Owned(v))
    }
}

/// Display unit driving the `postgresql.conf` literal for a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Byte sizes; rendered with the largest exact GB/MB/kB unit. `-1` is
    /// passed through for "inherit" sentinels.
    Bytes,
    /// Milliseconds; whole seconds and minutes collapse to `s` / `min`.
    Ms,
    /// Seconds; whole minutes collapse to `min`.
    Secs,
    /// Minutes; whole hours and days collapse to `h` / `d`.
    Mins,
    /// Bare integer.
    Count,
    /// Bare float.
    Ratio,
    /// Single-quoted string.
    Text,
}

impl Unit {
    /// Format a value for the rendered configuration. A mismatch between the
    /// declared unit and the value shape is an error surfaced as
    /// [`crate::error::TuneError::Render`] by the caller.
    pub fn display(self, value: &SettingValue) -> Result<String, String> {
        match (self, value) {
            (Unit::Bytes, SettingValue::Int(v)) => {
                if *v < 0 {
                    return Ok(v.to_string());
                }
                bytesize_to_pg(*v as u64)
                    .ok_or_else(|| format!("{v} bytes is not a whole number of kB"))
            }
            (Unit::Ms, SettingValue::Int(v)) => {
                if *v < 0 {
                    Ok(v.to_string())
                } else if *v >= 60_000 && *v % 60_000 == 0 {
                    Ok(format!("{}min", v / 60_000))
                } else if *v >= 1_000 && *v % 1_000 == 0 {
                    Ok(format!("{}s", v / 1_000))
                } else {
                    Ok(format!("{v}ms"))
                }
            }
            (Unit::Secs, SettingValue::Int(v)) => {
                if *v < 0 {
                    Ok(v.to_string())
                } else if *v >= 60 && *v % 60 == 0 {
                    Ok(format!("{}min", v / 60))
                } else {
                    Ok(format!("{v}s"))
                }
            }
            (Unit::Mins, SettingValue::Int(v)) => {
                if *v < 0 {
                    Ok(v.to_string())
                } else if *v >= 1_440 && *v % 1_440 == 0 {
                    Ok(format!("{}d", v / 1_440))
                } else if *v >= 60 && *v % 60 == 0 {
                    Ok(format!("{}h", v / 60))
                } else {
                    Ok(format!("{v}min"))
                }
            }
            (Unit::Count, SettingValue::Int(v)) => Ok(v.to_string()),
            (Unit::Ratio, SettingValue::Float(v)) => Ok(format!("{v}")),
            (Unit::Ratio, SettingValue::Int(v)) => Ok(v.to_string()),
            (Unit::Text, SettingValue::Text(v)) => Ok(format!("'{v}'")),
            (unit, value) => Err(format!("value {value:?} does not fit unit {unit:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Formulas and their evaluation context
// ---------------------------------------------------------------------------

/// Flat `key -> value` mirror of the response, giving formulas O(1) reads of
/// every other tunable. Seeded with resolved defaults before the first
/// formula runs, so a missing dependency reads as its static default.
#[derive(Clone, Debug, Default)]
pub struct ManagedCache {
    values: HashMap<&'static str, SettingValue>,
}

impl ManagedCache {
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: &'static str, value: SettingValue) {
        self.values.insert(key, value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &SettingValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Integer read; errors name the missing dependency so a bad catalog
    /// wiring shows up as `CatalogEvalError` with a usable message.
    pub fn int(&self, key: &str) -> Result<i64, String> {
        self.get(key)
            .ok_or_else(|| format!("missing dependency '{key}'"))?
            .as_int()
            .ok_or_else(|| format!("dependency '{key}' is not an integer"))
    }

    /// Integer read with a fallback for keys that are version-gated.
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(SettingValue::as_int).unwrap_or(default)
    }

    pub fn float(&self, key: &str) -> Result<f64, String> {
        self.get(key)
            .ok_or_else(|| format!("missing dependency '{key}'"))?
            .as_float()
            .ok_or_else(|| format!("dependency '{key}' is not numeric"))
    }

    /// Byte read: a non-negative integer.
    pub fn bytes(&self, key: &str) -> Result<u64, String> {
        let v = self.int(key)?;
        u64::try_from(v).map_err(|_| format!("dependency '{key}' is negative"))
    }
}

/// What a formula sees: the immutable request and the current flat cache.
/// Group-local and global reads go through the same map; scope grouping only
/// matters for rendering.
pub struct EvalCtx<'a> {
    pub options: &'a TuneOptions,
    pub cache: &'a ManagedCache,
}

/// A tuning formula: pure function of the request and the current cache.
pub type TuneFn = dyn Fn(&EvalCtx<'_>) -> Result<SettingValue, String> + Send + Sync;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One catalog record. `key` may be a composite `"a & b"`; every synonym
/// registers a separate item sharing this record.
#[derive(Clone)]
pub struct TuneEntry {
    pub key: &'static str,
    pub scope: PgScope,
    pub default: SettingValue,
    pub tier_defaults: Option<[SettingValue; 6]>,
    pub tune_op: Option<Arc<TuneFn>>,
    pub trigger: Option<Arc<TuneFn>>,
    pub unit: Unit,
    pub comment: &'static str,
}

impl TuneEntry {
    pub fn new(
        key: &'static str,
        scope: PgScope,
        default: impl Into<SettingValue>,
        unit: Unit,
        comment: &'static str,
    ) -> Self {
        TuneEntry {
            key,
            scope,
            default: default.into(),
            tier_defaults: None,
            tune_op: None,
            trigger: None,
            unit,
            comment,
        }
    }

    pub fn with_tiers(mut self, tiers: [SettingValue; 6]) -> Self {
        self.tier_defaults = Some(tiers);
        self
    }

    pub fn with_op<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvalCtx<'_>) -> Result<SettingValue, String> + Send + Sync + 'static,
    {
        self.tune_op = Some(Arc::new(f));
        self
    }

    pub fn with_trigger<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvalCtx<'_>) -> Result<SettingValue, String> + Send + Sync + 'static,
    {
        self.trigger = Some(Arc::new(f));
        self
    }

    /// Shared formula installed as both the initial op and the re-trigger.
    pub fn with_formula<F>(mut self, f: F) -> Self
    where
        F: Fn(&EvalCtx<'_>) -> Result<SettingValue, String> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.tune_op = Some(f.clone());
        self.trigger = Some(f);
        self
    }
}

/// A fully resolved single-key item after synonym expansion.
#[derive(Clone)]
pub struct CatalogItem {
    pub key: &'static str,
    pub scope: PgScope,
    pub default: SettingValue,
    pub tier_defaults: Option<[SettingValue; 6]>,
    pub tune_op: Option<Arc<TuneFn>>,
    pub trigger: Option<Arc<TuneFn>>,
    pub unit: Unit,
    pub comment: &'static str,
}

impl CatalogItem {
    /// The default used to seed the cache: the per-tier column when present,
    /// the static default otherwise.
    pub fn resolved_default(&self, tier: Tier) -> SettingValue {
        match &self.tier_defaults {
            Some(tiers) => tiers[tier.index()].clone(),
            None => self.default.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The resolved rule set for one PostgreSQL major version.
pub struct Catalog {
    pub version: u32,
    items: Vec<CatalogItem>,
    index: HashMap<&'static str, usize>,
    /// Non-fatal oddities observed while applying overlays; copied onto every
    /// response built from this catalog.
    pub warnings: Vec<String>,
}

impl Catalog {
    /// Items in declaration order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, key: &str) -> Option<&CatalogItem> {
        self.index.get(key).map(|&i| &self.items[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Build the catalog for a version by applying every overlay up to and
    /// including it onto the base rule set.
    fn build(version: u32) -> Catalog {
        let mut entries = base::base_profile();
        let mut warnings = Vec::new();
        for v in MIN_SUPPORTED_VERSION..=version {
            merge::apply_patches(&mut entries, overlays::overlay_for(v), &mut warnings);
        }
        let items = expand_synonyms(&entries);
        let mut index = HashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let prev = index.insert(item.key, i);
            assert!(prev.is_none(), "duplicate catalog key '{}'", item.key);
        }
        for w in &warnings {
            tracing::warn!(version, "{w}");
        }
        Catalog {
            version,
            items,
            index,
            warnings,
        }
    }
}

/// Split composite keys into per-synonym items sharing one record.
fn expand_synonyms(entries: &[TuneEntry]) -> Vec<CatalogItem> {
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        for key in entry.key.split(MULTI_ITEMS_SPLIT) {
            let key = key.trim();
            assert!(
                !key.is_empty() && !key.contains(char::is_whitespace),
                "bad synonym in composite key '{}'",
                entry.key
            );
            items.push(CatalogItem {
                key,
                scope: entry.scope,
                default: entry.default.clone(),
                tier_defaults: entry.tier_defaults.clone(),
                tune_op: entry.tune_op.clone(),
                trigger: entry.trigger.clone(),
                unit: entry.unit,
                comment: entry.comment,
            });
        }
    }
    items
}

/// Shared, lazily built catalogs for every supported version.
static CATALOGS: LazyLock<Vec<Catalog>> = LazyLock::new(|| {
    (MIN_SUPPORTED_VERSION..=MAX_SUPPORTED_VERSION)
        .map(Catalog::build)
        .collect()
});

/// The process-wide catalog for a supported PostgreSQL major version.
///
/// Callers validate the version at request construction; an out-of-range
/// version here is a programming error.
pub fn catalog_for(version: u32) -> &'static Catalog {
    assert!(
        (MIN_SUPPORTED_VERSION..=MAX_SUPPORTED_VERSION).contains(&version),
        "unsupported PostgreSQL version {version}"
    );
    &CATALOGS[(version - MIN_SUPPORTED_VERSION) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{GI, MI};

    #[test]
    fn every_version_resolves_with_valid_defaults() {
        for version in MIN_SUPPORTED_VERSION..=MAX_SUPPORTED_VERSION {
            let catalog = catalog_for(version);
            assert!(!catalog.items().is_empty());
            for item in catalog.items() {
                // Non-null default, tier columns cover all six tiers by
                // construction, and every default fits its display unit.
                for tier in Tier::ALL {
                    let value = item.resolved_default(tier);
                    item.unit.display(&value).unwrap_or_else(|e| {
                        panic!("v{version} {} ({tier:?}): {e}", item.key)
                    });
                }
            }
        }
    }

    #[test]
    fn composite_keys_expand_to_synonyms() {
        let catalog = catalog_for(16);
        assert!(catalog.contains("log_connections"));
        assert!(catalog.contains("log_disconnections"));
        assert!(!catalog.contains("log_connections & log_disconnections"));
    }

    #[test]
    fn version_gated_keys_follow_overlays() {
        assert!(!catalog_for(13).contains("compute_query_id"));
        assert!(catalog_for(14).contains("compute_query_id"));
        assert!(!catalog_for(15).contains("reserved_connections"));
        assert!(catalog_for(16).contains("reserved_connections"));
        // Removed upstream in v17.
        assert!(catalog_for(16).contains("old_snapshot_threshold"));
        assert!(!catalog_for(17).contains("old_snapshot_threshold"));
        // Removed in v18.
        assert!(catalog_for(17).contains("vacuum_cost_page_dirty"));
        assert!(!catalog_for(18).contains("vacuum_cost_page_dirty"));
    }

    #[test]
    fn unit_display_formats() {
        assert_eq!(Unit::Bytes.display(&SettingValue::Int((2 * GI) as i64)).unwrap(), "2GB");
        assert_eq!(Unit::Bytes.display(&SettingValue::Int(-1)).unwrap(), "-1");
        assert_eq!(Unit::Ms.display(&SettingValue::Int(200)).unwrap(), "200ms");
        assert_eq!(Unit::Ms.display(&SettingValue::Int(300_000)).unwrap(), "5min");
        assert_eq!(Unit::Secs.display(&SettingValue::Int(900)).unwrap(), "15min");
        assert_eq!(Unit::Mins.display(&SettingValue::Int(1_440)).unwrap(), "1d");
        assert_eq!(Unit::Ratio.display(&SettingValue::Float(0.9)).unwrap(), "0.9");
        assert_eq!(Unit::Text.display(&SettingValue::Text("mod".into())).unwrap(), "'mod'");
        assert!(Unit::Bytes.display(&SettingValue::Int((MI + 100) as i64)).is_err());
        assert!(Unit::Count.display(&SettingValue::Text("x".into())).is_err());
    }
}
