//! Overlay merge machinery.
//!
//! An overlay is an ordered list of patches against the entry list built so
//! far. `Add` appends or replaces a whole record, `Merge` rewrites individual
//! fields of an existing record (primitive leaves: overlay wins), `Remove`
//! deletes a key. Removing or merging a key that does not exist is a warning,
//! not an error; applying the same overlay twice yields the same result.

use std::sync::Arc;

use super::{SettingValue, TuneEntry, TuneFn, Unit};
use crate::model::scope::PgScope;

/// Field-wise rewrite of an existing entry; `None` keeps the current value.
#[derive(Default)]
pub struct EntryDelta {
    pub key: &'static str,
    pub scope: Option<PgScope>,
    pub default: Option<SettingValue>,
    pub tier_defaults: Option<[SettingValue; 6]>,
    pub tune_op: Option<Arc<TuneFn>>,
    pub trigger: Option<Arc<TuneFn>>,
    pub unit: Option<Unit>,
    pub comment: Option<&'static str>,
}

impl EntryDelta {
    pub fn new(key: &'static str) -> Self {
        EntryDelta {
            key,
            ..EntryDelta::default()
        }
    }

    pub fn default_value(mut self, value: impl Into<SettingValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn tiers(mut self, tiers: [SettingValue; 6]) -> Self {
        self.tier_defaults = Some(tiers);
        self
    }

    pub fn comment(mut self, comment: &'static str) -> Self {
        self.comment = Some(comment);
        self
    }
}

/// One overlay action. The delete marker of the source format (`"-key"`)
/// maps onto [`Patch::Remove`].
pub enum Patch {
    /// Append a new record, or replace an existing one wholesale.
    Add(TuneEntry),
    /// Recursive merge into an existing record.
    Merge(EntryDelta),
    /// Delete a key; warns when the key is absent.
    Remove(&'static str),
}

/// Apply an overlay in order, collecting non-fatal oddities into `warnings`.
pub fn apply_patches(
    entries: &mut Vec<TuneEntry>,
    patches: Vec<Patch>,
    warnings: &mut Vec<String>,
) {
    for patch in patches {
        match patch {
            Patch::Add(entry) => {
                match entries.iter_mut().find(|e| e.key == entry.key) {
                    Some(existing) => *existing = entry,
                    None => entries.push(entry),
                }
            }
            Patch::Merge(delta) => {
                let Some(existing) = entries.iter_mut().find(|e| e.key == delta.key) else {
                    warnings.push(format!(
                        "overlay merges into '{}' which is not in the catalog; skipped",
                        delta.key
                    ));
                    continue;
                };
                if let Some(scope) = delta.scope {
                    existing.scope = scope;
                }
                if let Some(default) = delta.default {
                    existing.default = default;
                }
                if let Some(tiers) = delta.tier_defaults {
                    existing.tier_defaults = Some(tiers);
                }
                if let Some(op) = delta.tune_op {
                    existing.tune_op = Some(op);
                }
                if let Some(trigger) = delta.trigger {
                    existing.trigger = Some(trigger);
                }
                if let Some(unit) = delta.unit {
                    existing.unit = unit;
                }
                if let Some(comment) = delta.comment {
                    existing.comment = comment;
                }
            }
            Patch::Remove(key) => {
                let before = entries.len();
                entries.retain(|e| e.key != key);
                if entries.len() == before {
                    warnings.push(format!(
                        "overlay removes '{key}' which is not in the catalog"
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<TuneEntry> {
        vec![
            TuneEntry::new("alpha", PgScope::Memory, 1i64, Unit::Count, "first"),
            TuneEntry::new("beta", PgScope::Memory, 2i64, Unit::Count, "second"),
        ]
    }

    #[test]
    fn add_replaces_or_appends() {
        let mut entries = sample();
        let mut warnings = Vec::new();
        apply_patches(
            &mut entries,
            vec![
                Patch::Add(TuneEntry::new("alpha", PgScope::Vm, 9i64, Unit::Count, "new")),
                Patch::Add(TuneEntry::new("gamma", PgScope::Vm, 3i64, Unit::Count, "third")),
            ],
            &mut warnings,
        );
        assert_eq!(entries.len(), 3);
        let alpha = entries.iter().find(|e| e.key == "alpha").unwrap();
        assert_eq!(alpha.default, SettingValue::Int(9));
        assert_eq!(alpha.scope, PgScope::Vm);
        assert!(warnings.is_empty());
    }

    #[test]
    fn merge_rewrites_only_given_fields() {
        let mut entries = sample();
        let mut warnings = Vec::new();
        apply_patches(
            &mut entries,
            vec![Patch::Merge(EntryDelta::new("beta").default_value(20i64))],
            &mut warnings,
        );
        let beta = entries.iter().find(|e| e.key == "beta").unwrap();
        assert_eq!(beta.default, SettingValue::Int(20));
        assert_eq!(beta.comment, "second");
        assert!(warnings.is_empty());
    }

    #[test]
    fn remove_deletes_and_warns_on_missing() {
        let mut entries = sample();
        let mut warnings = Vec::new();
        apply_patches(
            &mut entries,
            vec![Patch::Remove("beta"), Patch::Remove("ghost")],
            &mut warnings,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ghost"));
    }

    #[test]
    fn merge_on_missing_key_warns_and_skips() {
        let mut entries = sample();
        let mut warnings = Vec::new();
        apply_patches(
            &mut entries,
            vec![Patch::Merge(EntryDelta::new("ghost").default_value(1i64))],
            &mut warnings,
        );
        assert_eq!(entries.len(), 2);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn applying_an_overlay_twice_is_idempotent() {
        let build = |times: usize| {
            let mut entries = sample();
            let mut warnings = Vec::new();
            for _ in 0..times {
                apply_patches(
                    &mut entries,
                    vec![
                        Patch::Add(TuneEntry::new("gamma", PgScope::Vm, 3i64, Unit::Count, "g")),
                        Patch::Merge(EntryDelta::new("alpha").default_value(5i64)),
                        Patch::Remove("beta"),
                    ],
                    &mut warnings,
                );
            }
            entries
                .iter()
                .map(|e| (e.key, e.default.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(build(1), build(2));
    }
}
