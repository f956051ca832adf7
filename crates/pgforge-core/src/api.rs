//! JSON projection of a response for HTTP and CLI consumers.

use serde::Serialize;

use crate::catalog::SettingValue;
use crate::error::TuneError;
use crate::response::Response;

/// The `managed` body of the web API: scope groups in render order, each item
/// with its raw values and the display literal.
#[derive(Serialize)]
pub struct ApiReport {
    pub pgsql_version: u32,
    pub scope: &'static str,
    pub groups: Vec<ApiGroup>,
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct ApiGroup {
    pub scope: &'static str,
    pub items: Vec<ApiItem>,
}

#[derive(Serialize)]
pub struct ApiItem {
    pub key: &'static str,
    pub before: SettingValue,
    pub after: SettingValue,
    pub display: String,
    pub comment: &'static str,
}

impl Response {
    /// Ordered JSON view; fails on a value/unit mismatch like the renderer.
    pub fn to_api(&self) -> Result<ApiReport, TuneError> {
        let mut groups = Vec::with_capacity(self.groups().len());
        for (scope, items) in self.groups() {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(ApiItem {
                    key: item.key,
                    before: item.before.clone(),
                    after: item.after.clone(),
                    display: item.out_display().map_err(TuneError::Render)?,
                    comment: item.comment,
                });
            }
            groups.push(ApiGroup {
                scope: scope.as_str(),
                items: out,
            });
        }
        Ok(ApiReport {
            pgsql_version: self.pgsql_version,
            scope: self.tuner_scope.as_str(),
            groups,
            warnings: self.warnings.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::model::options::{TuneOptions, TuneRequest};
    use crate::model::sizing::Tier;
    use crate::tuner::optimize;
    use crate::units::GI;

    #[test]
    fn api_report_serializes_with_display_literals() {
        let request = TuneRequest::new(
            TuneOptions::builder(8 * GI, 4)
                .version(16)
                .tier(Tier::Medium)
                .connections(100)
                .build()
                .unwrap(),
        );
        let report = optimize(&request).unwrap().to_api().unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pgsql_version"], 16);
        let groups = json["groups"].as_array().unwrap();
        assert!(!groups.is_empty());
        let first_scope = groups[0]["scope"].as_str().unwrap();
        assert_eq!(first_scope, "conn");
        // Every item carries a display literal.
        for group in groups {
            for item in group["items"].as_array().unwrap() {
                assert!(item["display"].as_str().is_some());
            }
        }
    }
}
