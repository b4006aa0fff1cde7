//! Request signing for authenticated REST calls.
//!
//! Signed requests carry every parameter plus a millisecond `timestamp` in the
//! query string, sorted by key. The signature is the hex HMAC-SHA256 of that
//! exact string under the API secret, appended as `signature`.

use crate::error::{ExchangeError, ExchangeResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `payload`.
pub fn sign(secret: &[u8], payload: &str) -> ExchangeResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| ExchangeError::Authentication(format!("Invalid API secret: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Join parameters as `k=v&k=v`, sorted by key.
pub fn canonical_query(params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the full signed query string (`...&timestamp=..&signature=..`).
pub fn signed_query(
    params: &[(&str, String)],
    timestamp_ms: i64,
    secret: &[u8],
) -> ExchangeResult<String> {
    let mut all: Vec<(&str, String)> = params.to_vec();
    all.push(("timestamp", timestamp_ms.to_string()));

    let query = canonical_query(&all);
    let signature = sign(secret, &query)?;
    Ok(format!("{query}&signature={signature}"))
}
