//! Request/response envelope around the compressor, shaped like the
//! serverless route `POST /royalty-compressor/compress`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use crate::compressor::{compress, CompressorConfig};
use crate::error::{Result, RoyaltyError};
use crate::store::BlobStore;

pub const COMPRESS_ROUTE: &str = "/royalty-compressor/compress";
const OUTPUT_PREFIX: &str = "processed_reports";
const DOWNLOAD_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub http_method: String,
    pub path: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct CompressBody {
    s3_key: Option<String>,
    grouping_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompressOk {
    download_url: String,
    output_key: String,
    input_key: String,
    rows: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl Response {
    fn ok(body: &impl Serialize) -> Self {
        let body = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
        Self { status_code: 200, body }
    }

    fn from_error(e: &RoyaltyError) -> Self {
        let body = serde_json::to_string(&ErrorBody {
            error: e.code(),
            message: e.public_message(),
        })
        .unwrap_or_else(|_| "{}".to_string());
        Self { status_code: e.status(), body }
    }
}

/// First 16 hex chars of the input digest, used when the caller supplies no request id.
fn derive_request_id(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)[..16].to_string()
}

pub fn output_key_for(request_id: &str) -> String {
    format!("{OUTPUT_PREFIX}/royalty_report_{request_id}.csv")
}

/// Route and run a request. Every failure becomes a categorized error response.
pub fn handle(request: &Request, store: &dyn BlobStore, config: &CompressorConfig) -> Response {
    let result = if request.http_method == "POST" && request.path == COMPRESS_ROUTE {
        compress_object(request, store, config)
    } else {
        Err(RoyaltyError::MalformedInput(format!(
            "invalid route: {} {}",
            request.http_method, request.path
        )))
    };
    match result {
        Ok(ok) => Response::ok(&ok),
        Err(e) => {
            match &e {
                RoyaltyError::UnexpectedFailure(detail) => {
                    error!(%detail, retryable = e.is_retryable(), "compression failed")
                }
                other => warn!(code = other.code(), "rejected request: {other}"),
            }
            Response::from_error(&e)
        }
    }
}

fn compress_object(request: &Request, store: &dyn BlobStore, config: &CompressorConfig) -> Result<CompressOk> {
    let raw_body = request
        .body
        .as_deref()
        .ok_or_else(|| RoyaltyError::MalformedInput("missing request body".to_string()))?;
    let body: CompressBody = serde_json::from_str(raw_body)
        .map_err(|e| RoyaltyError::MalformedInput(format!("invalid request body: {e}")))?;
    let input_key = body
        .s3_key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| RoyaltyError::MalformedInput("missing s3_key".to_string()))?;

    let config = match body.grouping_key.as_deref() {
        Some(key) if !key.trim().is_empty() => config.clone().with_grouping_key(key),
        _ => config.clone(),
    };

    let raw = store.get(&input_key)?;
    info!(key = %input_key, size = raw.len(), "fetched input report");

    let compressed = compress(&raw, &config)?;

    let request_id = request
        .request_id
        .clone()
        .unwrap_or_else(|| derive_request_id(&raw));
    let output_key = store.put(&output_key_for(&request_id), &compressed.bytes, "text/csv")?;
    let download_url = match store.presign_get(&output_key, DOWNLOAD_TTL) {
        Ok(url) => url,
        Err(e) => {
            if let Err(cleanup) = store.delete(&output_key) {
                warn!(key = %output_key, "could not remove output after failed presign: {cleanup}");
            }
            return Err(e);
        }
    };
    info!(key = %output_key, rows = compressed.summary.output_rows, "stored compressed report");

    Ok(CompressOk {
        download_url,
        output_key,
        input_key,
        rows: compressed.summary.output_rows,
    })
}
