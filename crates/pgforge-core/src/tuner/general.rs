//! The general tuner: catalog rules to an initial response.

use crate::catalog::{EvalCtx, ManagedCache, catalog_for};
use crate::error::TuneError;
use crate::model::options::TuneRequest;
use crate::model::scope::TunerScope;
use crate::response::{Response, TuneItemState};

/// Build the initial response for one tuning scope.
///
/// The cache is seeded with every entry's resolved default first, so a
/// formula reading a dependency that has not been computed yet sees that
/// dependency's default rather than failing. Formulas then run in catalog
/// declaration order; a raising formula or a value that does not fit its
/// display unit is a fatal catalog bug.
pub fn general_tuning(
    request: &TuneRequest,
    scope: TunerScope,
) -> Result<Response, TuneError> {
    let options = &request.options;
    let mut response = Response::new(options.pgsql_version, scope);
    if scope != TunerScope::DatabaseConfig {
        // Kernel tuning is fed by host probes outside the engine; the
        // response stays empty but carries the right disclaimer.
        return Ok(response);
    }

    let catalog = catalog_for(options.pgsql_version);
    response.warnings.extend(catalog.warnings.iter().cloned());

    let mut cache = ManagedCache::default();
    for item in catalog.items() {
        cache.insert(item.key, item.resolved_default(options.tier));
    }

    for item in catalog.items() {
        if let Some(op) = &item.tune_op {
            let value = {
                let ctx = EvalCtx {
                    options,
                    cache: &cache,
                };
                op(&ctx).map_err(|cause| TuneError::CatalogEval {
                    key: item.key.to_string(),
                    cause,
                })?
            };
            item.unit
                .display(&value)
                .map_err(|cause| TuneError::CatalogEval {
                    key: item.key.to_string(),
                    cause: format!("formula result does not fit its unit: {cause}"),
                })?;
            cache.insert(item.key, value);
        }
    }

    for item in catalog.items() {
        let value = cache
            .get(item.key)
            .cloned()
            .unwrap_or_else(|| item.resolved_default(options.tier));
        response.push_item(TuneItemState {
            key: item.key,
            scope: item.scope,
            before: value.clone(),
            after: value,
            unit: item.unit,
            comment: item.comment,
            trigger: item.trigger.clone(),
        });
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::options::TuneOptions;
    use crate::model::sizing::Tier;
    use crate::units::GI;

    fn request(ram: u64, cpu: u32) -> TuneRequest {
        TuneRequest::new(
            TuneOptions::builder(ram, cpu)
                .version(16)
                .tier(Tier::Mini)
                .connections(50)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn every_catalog_key_appears_exactly_once() {
        let response = general_tuning(&request(4 * GI, 2), TunerScope::DatabaseConfig).unwrap();
        let catalog = catalog_for(16);
        let total: usize = response.groups().iter().map(|(_, items)| items.len()).sum();
        assert_eq!(total, catalog.items().len());
        for item in catalog.items() {
            assert!(response.contains(item.key), "missing {}", item.key);
        }
    }

    #[test]
    fn initial_values_have_before_equal_after() {
        let response = general_tuning(&request(4 * GI, 2), TunerScope::DatabaseConfig).unwrap();
        for (_, items) in response.groups() {
            for item in items {
                assert_eq!(item.before, item.after, "{}", item.key);
            }
        }
    }

    #[test]
    fn kernel_scope_yields_empty_response() {
        let response = general_tuning(&request(4 * GI, 2), TunerScope::KernelSysctl).unwrap();
        assert!(response.groups().is_empty());
    }

    #[test]
    fn formulas_read_dependencies_from_the_seeded_cache() {
        let response = general_tuning(&request(4 * GI, 2), TunerScope::DatabaseConfig).unwrap();
        // max_connections comes from the request, and work_mem read it.
        assert_eq!(
            response.cache().int("max_connections").unwrap(),
            50,
        );
        let work_mem = response.cache().bytes("work_mem").unwrap();
        assert!(work_mem >= 4 * crate::units::MI, "got {work_mem}");
    }
}
