//! Errors surfaced to HTTP clients.
//!
//! ## Error Cases
//! - `InvalidCount`: the `count` parameter is not an integer in range.
//! - `Allocation`: the batch stopped early, e.g. on a clock regression.
//! - `TaskFailed`: the blocking allocation task panicked or was cancelled.
//!
//! Partial batches are not exposed to clients; only the failure is.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use snowpool::BatchError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid count; must be a valid integer from 1 to {max}")]
    InvalidCount { max: usize },

    #[error("{}", .0.source)]
    Allocation(#[from] BatchError),

    #[error("allocation task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCount { .. } => StatusCode::BAD_REQUEST,
            Self::Allocation(_) | Self::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::InvalidCount { .. } => tracing::debug!("Rejected request: {self}"),
            Self::Allocation(err) => tracing::warn!(
                produced = err.ids.len(),
                requested = err.requested,
                "Allocation failed: {}",
                err.source
            ),
            Self::TaskFailed(err) => tracing::error!("Allocation task failed: {err}"),
        }
        (self.status(), format!("{self}\n")).into_response()
    }
}
