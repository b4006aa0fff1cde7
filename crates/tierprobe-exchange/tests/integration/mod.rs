//! Integration tests for tierprobe-exchange.
//!
//! These tests run the REST client against a local mock of the BingX swap API.

pub mod common;
