//! The tuning response: scope-grouped item states, the flat managed cache,
//! and the `postgresql.conf` renderer.
//!
//! The two-level structure is the source of truth; the cache is a projection
//! kept in lock-step by the single mutator [`Response::set_item`]. A response
//! is created by the general tuner, mutated only by the correction tuner,
//! rendered and dropped.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::catalog::{EvalCtx, ManagedCache, SettingValue, TuneFn, Unit};
use crate::error::TuneError;
use crate::model::options::TuneOptions;
use crate::model::scope::{PgScope, TunerScope};

/// Engine version stamped into the render header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One managed tunable inside the response.
pub struct TuneItemState {
    pub key: &'static str,
    pub scope: PgScope,
    /// Value after the general pass.
    pub before: SettingValue,
    /// Current value; mirrored in the managed cache.
    pub after: SettingValue,
    pub unit: Unit,
    pub comment: &'static str,
    /// Bound correction formula, when the catalog defines one.
    pub trigger: Option<Arc<TuneFn>>,
}

impl TuneItemState {
    /// Display form of the current value, or a render error message.
    pub fn out_display(&self) -> Result<String, String> {
        self.unit.display(&self.after)
    }
}

pub struct Response {
    pub pgsql_version: u32,
    pub tuner_scope: TunerScope,
    /// Scope groups in catalog declaration order; items likewise.
    groups: Vec<(PgScope, Vec<TuneItemState>)>,
    /// `key -> (group, item)` position index.
    index: HashMap<&'static str, (usize, usize)>,
    cache: ManagedCache,
    /// Non-fatal oddities (overlay deletes of missing keys and the like).
    /// Flushed through `tracing` once the correction pass finishes.
    pub warnings: Vec<String>,
    /// Narration of every committed change, for debug tracing.
    pub change_log: Vec<String>,
}

impl Response {
    pub fn new(pgsql_version: u32, tuner_scope: TunerScope) -> Self {
        Response {
            pgsql_version,
            tuner_scope,
            groups: Vec::new(),
            index: HashMap::new(),
            cache: ManagedCache::default(),
            warnings: Vec::new(),
            change_log: Vec::new(),
        }
    }

    /// Append an item during the general pass. Items arrive in catalog
    /// declaration order; each key appears exactly once.
    pub(crate) fn push_item(&mut self, item: TuneItemState) {
        debug_assert!(
            !self.index.contains_key(item.key),
            "duplicate response key '{}'",
            item.key
        );
        self.cache.insert(item.key, item.after.clone());
        let group_idx = match self.groups.iter().position(|(s, _)| *s == item.scope) {
            Some(i) => i,
            None => {
                self.groups.push((item.scope, Vec::new()));
                self.groups.len() - 1
            }
        };
        let items = &mut self.groups[group_idx].1;
        self.index.insert(item.key, (group_idx, items.len()));
        items.push(item);
    }

    pub fn groups(&self) -> &[(PgScope, Vec<TuneItemState>)] {
        &self.groups
    }

    pub fn get(&self, key: &str) -> Option<&TuneItemState> {
        self.index.get(key).map(|&(g, i)| &self.groups[g].1[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// The flat `key -> after` mirror used by formulas.
    pub fn cache(&self) -> &ManagedCache {
        &self.cache
    }

    /// The single mutator: commit a new `after` for `key`, keeping the cache
    /// in sync. Returns whether the value actually changed.
    pub fn set_item(
        &mut self,
        key: &str,
        value: SettingValue,
    ) -> Result<bool, TuneError> {
        let &(g, i) = self
            .index
            .get(key)
            .ok_or_else(|| TuneError::UnknownTunable(key.to_string()))?;
        let item = &mut self.groups[g].1[i];
        if item.after == value {
            return Ok(false);
        }
        self.change_log.push(format!(
            "{}: {:?} -> {:?}",
            item.key, item.after, value
        ));
        item.after = value.clone();
        self.cache.insert(item.key, value);
        Ok(true)
    }

    /// Re-evaluate the bound trigger of every listed key against the current
    /// cache and commit the results. Keys without a trigger, or absent from
    /// this version's catalog, are skipped. Returns the keys whose value
    /// actually changed, so callers can detect convergence.
    pub fn trigger_tuning(
        &mut self,
        options: &TuneOptions,
        keys: &[&str],
    ) -> Result<Vec<&'static str>, TuneError> {
        let mut changed = Vec::new();
        for &key in keys {
            let Some(&(g, i)) = self.index.get(key) else {
                continue;
            };
            let item = &self.groups[g].1[i];
            let Some(trigger) = item.trigger.clone() else {
                continue;
            };
            let static_key = item.key;
            let value = {
                let ctx = EvalCtx {
                    options,
                    cache: &self.cache,
                };
                trigger(&ctx).map_err(|cause| TuneError::CatalogEval {
                    key: static_key.to_string(),
                    cause,
                })?
            };
            if self.set_item(static_key, value)? {
                changed.push(static_key);
            }
        }
        Ok(changed)
    }

    /// Flush the collected warnings and change narration through `tracing`.
    pub fn flush_warnings(&self) {
        for message in &self.warnings {
            tracing::warn!(target: "pgforge::tuning", "{message}");
        }
        for message in &self.change_log {
            tracing::debug!(target: "pgforge::tuning", "{message}");
        }
    }

    // -----------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------

    /// Render with the current wall clock in the header.
    pub fn render(&self) -> Result<String, TuneError> {
        self.render_at(Utc::now())
    }

    /// Render with an explicit timestamp; identical requests render to
    /// byte-identical output for a fixed timestamp.
    pub fn render_at(&self, now: DateTime<Utc>) -> Result<String, TuneError> {
        let mut out = String::with_capacity(8 * 1024);
        out.push_str(&format!(
            "# pgforge {VERSION} — PostgreSQL {} tuning profile ({})\n",
            self.pgsql_version,
            self.tuner_scope.as_str(),
        ));
        out.push_str(&format!(
            "# generated: {}\n",
            now.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        out.push_str(self.tuner_scope.disclaimer());
        out.push('\n');
        for (scope, items) in &self.groups {
            out.push('\n');
            out.push_str(&format!("# --- {} ---\n", scope.as_str()));
            for item in items {
                let value = item.out_display().map_err(TuneError::Render)?;
                let line = format!("{} = {}", item.key, value);
                if item.comment.is_empty() {
                    out.push_str(&line);
                } else {
                    out.push_str(&format!("{line:<48}# {}", item.comment));
                }
                out.push('\n');
            }
        }
        Ok(out)
    }
}
