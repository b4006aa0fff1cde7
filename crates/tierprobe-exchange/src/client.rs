//! BingX perpetual-swap REST client.
//!
//! Only three endpoints are used:
//! - `GET  /openApi/swap/v2/trade/leverage` (signed): current leverage
//! - `POST /openApi/swap/v2/trade/leverage` (signed): set leverage
//! - `GET  /openApi/swap/v2/quote/contracts` (public): contract metadata

use crate::api::{BoxFuture, LeverageApi, LeverageUpdate};
use crate::credentials::Credentials;
use crate::error::{ExchangeError, ExchangeResult};
use crate::response::{ApiEnvelope, ContractInfo, LeverageData, SetLeverageData};
use crate::signing::signed_query;
use reqwest::{Client, Method, StatusCode};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tierprobe_core::{Leverage, Notional, Symbol};
use tracing::{debug, info, warn};

/// Production REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://open-api.bingx.com";

const LEVERAGE_PATH: &str = "/openApi/swap/v2/trade/leverage";
const CONTRACTS_PATH: &str = "/openApi/swap/v2/quote/contracts";
const API_KEY_HEADER: &str = "X-BX-APIKEY";

/// Business codes that mean the request was not authenticated.
const AUTH_ERROR_CODES: &[i64] = &[
    100001, // signature verification failed
    100412, // null signature
    100413, // incorrect API key
    100419, // IP not whitelisted
];

/// Business codes for temporary conditions; the request may succeed later.
const TRANSIENT_ERROR_CODES: &[i64] = &[
    100410, // rate limited
    100500, // internal system error
    100503, // server busy
];

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// REST client for the BingX swap API.
pub struct BingxClient {
    http: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl std::fmt::Debug for BingxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BingxClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl BingxClient {
    /// Create a client. Signed endpoints fail with
    /// [`ExchangeError::Authentication`] when `credentials` is `None`.
    pub fn new(config: ClientConfig, credentials: Option<Credentials>) -> ExchangeResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExchangeError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Contract metadata for a symbol, or `None` if it is not listed.
    pub async fn contract(&self, symbol: &Symbol) -> ExchangeResult<Option<ContractInfo>> {
        let url = format!("{}{CONTRACTS_PATH}?symbol={symbol}", self.base_url);
        debug!(%symbol, "Fetching contract info");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(format!("HTTP request failed: {e}")))?;

        let envelope: ApiEnvelope<Vec<ContractInfo>> = read_envelope(response).await?;
        if envelope.code != 0 {
            return Err(classify_read_error(envelope.code, envelope.msg));
        }

        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .find(|c| c.symbol.eq_ignore_ascii_case(symbol.as_str())))
    }

    fn credentials(&self) -> ExchangeResult<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::Authentication(format!(
                "API keys not configured. Set {} and {}",
                crate::credentials::API_KEY_ENV,
                crate::credentials::API_SECRET_ENV
            ))
        })
    }

    async fn signed_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<ApiEnvelope<T>> {
        let credentials = self.credentials()?;
        let timestamp = chrono::Utc::now().timestamp_millis();
        let query = signed_query(params, timestamp, credentials.api_secret())?;
        let url = format!("{}{path}?{query}", self.base_url);

        let response = self
            .http
            .request(method, &url)
            .header(API_KEY_HEADER, credentials.api_key())
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(format!("HTTP request failed: {e}")))?;

        read_envelope(response).await
    }

    async fn fetch_leverage(&self, symbol: &Symbol) -> ExchangeResult<Leverage> {
        let params = [("symbol", symbol.to_string())];
        let envelope: ApiEnvelope<LeverageData> =
            self.signed_request(Method::GET, LEVERAGE_PATH, &params).await?;

        if envelope.code != 0 {
            return Err(classify_read_error(envelope.code, envelope.msg));
        }

        let data = envelope
            .data
            .ok_or_else(|| ExchangeError::Parse("leverage response has no data".to_string()))?;
        let leverage = decimal_to_leverage(data.long_leverage)?;
        debug!(%symbol, %leverage, "Read current leverage");
        Ok(leverage)
    }

    async fn update_leverage(
        &self,
        symbol: &Symbol,
        leverage: Leverage,
    ) -> ExchangeResult<LeverageUpdate> {
        let params = [
            ("leverage", leverage.get().to_string()),
            ("side", "LONG".to_string()),
            ("symbol", symbol.to_string()),
        ];
        let envelope: ApiEnvelope<SetLeverageData> =
            self.signed_request(Method::POST, LEVERAGE_PATH, &params).await?;

        if envelope.code != 0 {
            debug!(%symbol, %leverage, code = envelope.code, msg = %envelope.msg, "Set leverage failed");
            return Err(classify_set_error(leverage, envelope.code, envelope.msg));
        }

        let max_position = envelope
            .data
            .and_then(|d| d.max_position_long_val)
            .ok_or_else(|| {
                ExchangeError::Parse("set leverage response has no maxPositionLongVal".to_string())
            })?;
        let max_position_value =
            Notional::new(max_position).map_err(|e| ExchangeError::Parse(e.to_string()))?;

        info!(%symbol, %leverage, max_position = %max_position_value, "Leverage set");
        Ok(LeverageUpdate {
            leverage,
            max_position_value,
        })
    }
}

impl LeverageApi for BingxClient {
    fn current_leverage<'a>(&'a self, symbol: &'a Symbol) -> BoxFuture<'a, ExchangeResult<Leverage>> {
        Box::pin(self.fetch_leverage(symbol))
    }

    fn set_leverage<'a>(
        &'a self,
        symbol: &'a Symbol,
        leverage: Leverage,
    ) -> BoxFuture<'a, ExchangeResult<LeverageUpdate>> {
        Box::pin(self.update_leverage(symbol, leverage))
    }
}

/// Check HTTP status, then decode the JSON envelope.
async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> ExchangeResult<ApiEnvelope<T>> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ExchangeError::Transport(format!("Failed to read response body: {e}")))?;

    if let Some(err) = classify_status(status, &body) {
        warn!(%status, "HTTP error from exchange");
        return Err(err);
    }

    serde_json::from_str(&body)
        .map_err(|e| ExchangeError::Parse(format!("Failed to parse response: {e}")))
}

/// Map a non-success HTTP status to an error. `None` for 2xx.
fn classify_status(status: StatusCode, body: &str) -> Option<ExchangeError> {
    if status.is_success() {
        return None;
    }
    let message = format!("HTTP {status}: {body}");
    Some(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ExchangeError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            ExchangeError::Transport(message)
        }
        s if s.is_server_error() => ExchangeError::Transport(message),
        s => ExchangeError::Api {
            code: i64::from(s.as_u16()),
            message,
        },
    })
}

fn classify_read_error(code: i64, message: String) -> ExchangeError {
    if AUTH_ERROR_CODES.contains(&code) {
        auth_error(code, message)
    } else if TRANSIENT_ERROR_CODES.contains(&code) {
        transient_error(code, message)
    } else {
        ExchangeError::Api { code, message }
    }
}

/// A non-zero code on a leverage change is a rejection of that leverage
/// unless it is an auth or transient code.
fn classify_set_error(leverage: Leverage, code: i64, message: String) -> ExchangeError {
    if AUTH_ERROR_CODES.contains(&code) {
        auth_error(code, message)
    } else if TRANSIENT_ERROR_CODES.contains(&code) {
        transient_error(code, message)
    } else {
        ExchangeError::LeverageRejected {
            leverage,
            code,
            message,
        }
    }
}

fn transient_error(code: i64, message: String) -> ExchangeError {
    ExchangeError::Transport(format!("code {code}: {message}"))
}

fn auth_error(code: i64, message: String) -> ExchangeError {
    ExchangeError::Authentication(format!("code {code}: {message}"))
}

fn decimal_to_leverage(value: Decimal) -> ExchangeResult<Leverage> {
    let raw = value
        .trunc()
        .to_u32()
        .ok_or_else(|| ExchangeError::Parse(format!("leverage out of range: {value}")))?;
    Leverage::new(raw).map_err(|e| ExchangeError::Parse(e.to_string()))
}
