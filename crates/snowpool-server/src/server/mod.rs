//! HTTP transport and process bootstrap for the Snowflake ID pool.
//!
//! ## Structure
//!
//! - [`config`] - CLI/env configuration and its validation.
//! - [`error`] - request errors and their HTTP status codes.
//! - [`handler`] - axum router and request handlers.
//! - [`telemetry`] - tracing subscriber setup.

pub mod config;
pub mod error;
pub mod handler;
pub mod telemetry;
