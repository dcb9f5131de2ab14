// Query-string encoding and snapshot request signing
use crate::domain::snapshot::SnapshotRequest;
use crate::infrastructure::credentials::MapKitCredentials;
use serde_json::{Map, Value};

pub const SNAPSHOT_PATH: &str = "/api/v1/snapshot";

/// `key=value` pairs joined with `&`, in map order.
///
/// Strings and scalars are percent-encoded as-is; objects and arrays are
/// JSON-serialized first. The exact output is what gets signed.
pub fn encode_parameters(params: &Map<String, Value>) -> String {
    params
        .iter()
        .map(|(key, value)| {
            let raw = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}={}", key, urlencoding::encode(&raw))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Append the team/key identity to `path?query`, sign the whole string and
/// append the signature as the final parameter.
pub fn sign_request(path: &str, query: &str, credentials: &MapKitCredentials) -> String {
    let complete = format!(
        "{}?{}&teamId={}&keyId={}",
        path, query, credentials.team_id, credentials.key_id
    );
    let signature = credentials.sign(complete.as_bytes());
    format!("{}&signature={}", complete, signature)
}

/// Absolute signed URL for a snapshot on `host` (e.g. `https://snapshot.apple-mapkit.com`).
pub fn snapshot_url(host: &str, request: &SnapshotRequest, credentials: &MapKitCredentials) -> String {
    let query = encode_parameters(&request.parameters());
    format!(
        "{}{}",
        host.trim_end_matches('/'),
        sign_request(SNAPSHOT_PATH, &query, credentials)
    )
}
