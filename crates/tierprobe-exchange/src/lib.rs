//! Leverage-setting capability and BingX REST client.
//!
//! The discovery engine only needs two authenticated operations: read the
//! current leverage and set a new one. They are expressed as the
//! [`LeverageApi`] trait so the engine can run against the live exchange
//! ([`BingxClient`]) or a simulated schedule ([`MockLeverageApi`]).
//!
//! The client never places orders; its only write is the leverage setting.

pub mod api;
pub mod client;
pub mod credentials;
pub mod error;
pub mod response;
pub mod retry;
pub mod signing;

pub use api::{BoxFuture, DynLeverageApi, LeverageApi, LeverageUpdate, MockLeverageApi};
pub use client::{BingxClient, ClientConfig, DEFAULT_BASE_URL};
pub use credentials::Credentials;
pub use error::{ExchangeError, ExchangeResult};
pub use response::ContractInfo;
pub use retry::{with_retry, with_retry_when, RetryPolicy};
