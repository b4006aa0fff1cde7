//! tierprobe command-line application.
//!
//! Wires configuration, the reference store, the BingX client, discovery and
//! validation together behind the `tierprobe` binary:
//! - `discover`: probe one symbol and print its tiers
//! - `list`: symbols with reference data
//! - `validate`: discover and compare against reference data
//! - `check`: offline integrity check of the reference dataset

pub mod app;
pub mod config;
pub mod error;
pub mod output;

pub use app::{Application, CommandOutput};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
