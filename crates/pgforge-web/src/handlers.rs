//! Request handlers: JSON body to engine request, engine response to JSON.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pgforge_core::model::{
    BackupTool, DiskPerf, DiskSpec, OptMode, Tier, TuneKeywords, TuneOptions, TuneRequest,
    TunerScope, WorkloadKind,
};
use pgforge_core::units::parse_bytesize;
use pgforge_core::{TuneError, optimize};

// ============================================================
// Wire format
// ============================================================

/// RAM accepts either a byte count or a human literal like `"4GiB"`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RamSpec {
    Bytes(u64),
    Literal(String),
}

impl RamSpec {
    fn resolve(&self) -> Result<u64, TuneError> {
        match self {
            RamSpec::Bytes(v) => Ok(*v),
            RamSpec::Literal(s) => parse_bytesize(s).map_err(TuneError::InvalidRequest),
        }
    }
}

#[derive(Deserialize)]
pub struct TuneBody {
    pub version: u32,
    pub workload: WorkloadKind,
    pub options: BodyOptions,
    pub disks: BodyDisks,
    #[serde(default)]
    pub keywords: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
pub struct BodyOptions {
    pub total_ram: RamSpec,
    pub vcpu: u32,
    pub tier: Tier,
    #[serde(default)]
    pub connections: u32,
    pub opt_mode: Option<OptMode>,
    pub opt_logging: Option<OptMode>,
    pub backup_tool: Option<BackupTool>,
    /// Tuning scope; defaults to the database configuration.
    pub scope: Option<TunerScope>,
}

#[derive(Deserialize)]
pub struct BodyDisks {
    pub data: DiskSpec,
    pub wal: DiskSpec,
}

#[derive(Serialize)]
pub struct TuneReply {
    pub managed: pgforge_core::api::ApiReport,
    pub render: String,
}

#[derive(Serialize)]
struct ErrorReply {
    error: String,
}

// ============================================================
// Handlers
// ============================================================

pub async fn handle_healthz() -> &'static str {
    "ok"
}

pub async fn handle_tune(Json(body): Json<TuneBody>) -> Response {
    match tune(body) {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(err) => {
            let status = match &err {
                TuneError::InvalidRequest(_) | TuneError::InvalidDiskSpec(_) => {
                    warn!(error = %err, "rejected tuning request");
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => {
                    tracing::error!(error = %err, "engine failure");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (
                status,
                Json(ErrorReply {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn tune(body: TuneBody) -> Result<TuneReply, TuneError> {
    let mut keyword_pairs = Vec::with_capacity(body.keywords.len());
    for (key, value) in &body.keywords {
        let value = value.as_f64().ok_or_else(|| {
            TuneError::InvalidRequest(format!("keyword '{key}' must be numeric"))
        })?;
        keyword_pairs.push((key.as_str(), value));
    }
    let keywords = TuneKeywords::from_pairs(keyword_pairs)?;

    let data_disk = DiskPerf::from_spec(&body.disks.data)?;
    let wal_disk = DiskPerf::from_spec(&body.disks.wal)?;

    let mut builder = TuneOptions::builder(body.options.total_ram.resolve()?, body.options.vcpu)
        .version(body.version)
        .workload(body.workload)
        .tier(body.options.tier)
        .connections(body.options.connections)
        .data_disk(data_disk)
        .wal_disk(wal_disk)
        .keywords(keywords);
    if let Some(mode) = body.options.opt_mode {
        builder = builder.opt_mode(mode);
    }
    if let Some(mode) = body.options.opt_logging {
        builder = builder.opt_logging(mode);
    }
    if let Some(tool) = body.options.backup_tool {
        builder = builder.backup_tool(tool);
    }
    if let Some(scope) = body.options.scope {
        builder = builder.tune_scopes(vec![scope]);
    }

    let request = TuneRequest::new(builder.build()?);
    let response = optimize(&request)?;
    info!(
        version = request.options.pgsql_version,
        tier = request.options.tier.as_str(),
        workload = request.options.workload.as_str(),
        "tuning request served"
    );
    Ok(TuneReply {
        managed: response.to_api()?,
        render: response.render()?,
    })
}
