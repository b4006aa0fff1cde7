//! Mock BingX REST server for integration tests.
//!
//! Serves the leverage and contracts endpoints, checks signatures against a
//! known secret, and records every request it receives.

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tierprobe_exchange::signing::sign;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const API_KEY: &str = "test-key";
pub const API_SECRET: &str = "test-secret";

/// (max leverage, max position value) pairs, highest leverage first.
pub const SCHEDULE: &[(u32, u64)] = &[(150, 300_000), (100, 800_000), (50, 3_000_000)];

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub params: HashMap<String, String>,
    pub api_key: Option<String>,
}

struct ServerState {
    current_leverage: Mutex<u32>,
    forced_status: Mutex<Option<StatusCode>>,
    forced_code: Mutex<Option<(i64, String)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// A mock BingX server bound to an ephemeral local port.
pub struct MockBingxServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl MockBingxServer {
    /// Start the server with the account at `initial_leverage`.
    pub async fn start(initial_leverage: u32) -> Self {
        let state = Arc::new(ServerState {
            current_leverage: Mutex::new(initial_leverage),
            forced_status: Mutex::new(None),
            forced_code: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(
                "/openApi/swap/v2/trade/leverage",
                get(get_leverage).post(set_leverage),
            )
            .route("/openApi/swap/v2/quote/contracts", get(contracts))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer every request with `status` and an empty body.
    pub fn force_status(&self, status: StatusCode) {
        *self.state.forced_status.lock() = Some(status);
    }

    /// Answer signed requests with HTTP 200 and business `code`.
    pub fn force_code(&self, code: i64, msg: &str) {
        *self.state.forced_code.lock() = Some((code, msg.to_string()));
    }

    pub fn current_leverage(&self) -> u32 {
        *self.state.current_leverage.lock()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }
}

impl Drop for MockBingxServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Record the request and check its signature. Returns the params on success,
/// or the error response to send.
fn authenticate(
    state: &ServerState,
    method: &str,
    path: &str,
    headers: &HeaderMap,
    query: Option<String>,
) -> Result<HashMap<String, String>, (StatusCode, Json<Value>)> {
    let query = query.unwrap_or_default();
    let params = parse_query(&query);
    let api_key = headers
        .get("X-BX-APIKEY")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.requests.lock().push(RecordedRequest {
        method: method.to_string(),
        path: path.to_string(),
        params: params.clone(),
        api_key: api_key.clone(),
    });

    if let Some(status) = *state.forced_status.lock() {
        return Err((status, Json(json!({}))));
    }

    if let Some((code, msg)) = state.forced_code.lock().clone() {
        return Err((StatusCode::OK, Json(json!({"code": code, "msg": msg}))));
    }

    if api_key.as_deref() != Some(API_KEY) {
        return Err((
            StatusCode::OK,
            Json(json!({"code": 100413, "msg": "Incorrect apiKey"})),
        ));
    }

    let signed = query
        .split_once("&signature=")
        .map(|(payload, signature)| sign(API_SECRET.as_bytes(), payload).unwrap() == signature)
        .unwrap_or(false);
    if !signed {
        return Err((
            StatusCode::OK,
            Json(json!({"code": 100001, "msg": "Signature verification failed"})),
        ));
    }

    Ok(params)
}

async fn get_leverage(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> (StatusCode, Json<Value>) {
    if let Err(response) = authenticate(
        &state,
        "GET",
        "/openApi/swap/v2/trade/leverage",
        &headers,
        query,
    ) {
        return response;
    }

    let current = *state.current_leverage.lock();
    (
        StatusCode::OK,
        Json(json!({
            "code": 0,
            "msg": "",
            "data": {
                "longLeverage": current,
                "shortLeverage": current,
                "maxLongLeverage": SCHEDULE[0].0,
            }
        })),
    )
}

async fn set_leverage(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> (StatusCode, Json<Value>) {
    let params = match authenticate(
        &state,
        "POST",
        "/openApi/swap/v2/trade/leverage",
        &headers,
        query,
    ) {
        Ok(params) => params,
        Err(response) => return response,
    };

    let leverage: u32 = params
        .get("leverage")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let max_position = SCHEDULE
        .iter()
        .filter(|(max_lev, _)| *max_lev >= leverage)
        .last()
        .map(|(_, cap)| *cap);

    match max_position {
        Some(cap) if leverage > 0 => {
            *state.current_leverage.lock() = leverage;
            (
                StatusCode::OK,
                Json(json!({
                    "code": 0,
                    "msg": "",
                    "data": {
                        "leverage": leverage,
                        "symbol": params.get("symbol"),
                        "maxPositionLongVal": cap.to_string(),
                    }
                })),
            )
        }
        _ => (
            StatusCode::OK,
            Json(json!({"code": 109400, "msg": "leverage exceeds the maximum allowed"})),
        ),
    }
}

async fn contracts(
    State(state): State<Arc<ServerState>>,
    RawQuery(query): RawQuery,
) -> (StatusCode, Json<Value>) {
    let params = parse_query(&query.unwrap_or_default());
    state.requests.lock().push(RecordedRequest {
        method: "GET".to_string(),
        path: "/openApi/swap/v2/quote/contracts".to_string(),
        params: params.clone(),
        api_key: None,
    });

    if let Some(status) = *state.forced_status.lock() {
        return (status, Json(json!({})));
    }

    let all = vec![
        json!({
            "symbol": "BTC-USDT",
            "maxLongLeverage": 150,
            "maxShortLeverage": 150,
            "pricePrecision": 1,
            "tradeMinUSDT": 2,
            "status": 1
        }),
        json!({
            "symbol": "ETH-USDT",
            "maxLongLeverage": 100,
            "maxShortLeverage": 100,
            "pricePrecision": 2,
            "tradeMinUSDT": "2",
            "status": 1
        }),
    ];
    let data: Vec<Value> = match params.get("symbol") {
        Some(symbol) => all
            .into_iter()
            .filter(|c| c["symbol"].as_str() == Some(symbol.as_str()))
            .collect(),
        None => all,
    };

    (
        StatusCode::OK,
        Json(json!({"code": 0, "msg": "", "data": data})),
    )
}
