//! HTTP endpoints for batch Snowflake ID generation.
//!
//! `GET /?count=N` (or `/ids?count=N`) returns N identifiers as decimal text,
//! one per line. The allocation itself runs on the blocking thread pool: it
//! may wait for a free worker or for the clock to reach the next millisecond,
//! neither of which may stall an async worker thread.

use crate::server::error::ApiError;
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use snowpool::{Allocator, TimeSource};
use std::{
    collections::HashMap,
    fmt::Write,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// Shared state of the HTTP service.
pub struct AppState<T>
where
    T: TimeSource,
{
    allocator: Allocator<T>,
    max_count: usize,
    serving: Arc<AtomicBool>,
}

impl<T> Clone for AppState<T>
where
    T: TimeSource,
{
    fn clone(&self) -> Self {
        Self {
            allocator: self.allocator.clone(),
            max_count: self.max_count,
            serving: Arc::clone(&self.serving),
        }
    }
}

impl<T> AppState<T>
where
    T: TimeSource,
{
    pub fn new(allocator: Allocator<T>, max_count: usize) -> Self {
        Self {
            allocator,
            max_count,
            serving: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Reports the service as not serving on `/health`.
    pub fn set_not_serving(&self) {
        self.serving.store(false, Ordering::Release);
    }
}

pub fn router<T>(state: AppState<T>) -> Router
where
    T: TimeSource + Send + 'static,
{
    Router::new()
        .route("/", get(next_ids::<T>))
        .route("/ids", get(next_ids::<T>))
        .route("/health", get(health::<T>))
        .with_state(state)
}

/// Parses the optional `count` parameter. Missing or empty means one ID.
fn parse_count(raw: Option<&str>, max_count: usize) -> Result<usize, ApiError> {
    let count = match raw {
        None | Some("") => 1,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ApiError::InvalidCount { max: max_count })?,
    };
    if !(1..=max_count).contains(&count) {
        return Err(ApiError::InvalidCount { max: max_count });
    }
    Ok(count)
}

#[tracing::instrument(level = "debug", skip_all)]
async fn next_ids<T>(
    State(state): State<AppState<T>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, ApiError>
where
    T: TimeSource + Send + 'static,
{
    let count = parse_count(params.get("count").map(String::as_str), state.max_count)?;

    let allocator = state.allocator.clone();
    let ids = tokio::task::spawn_blocking(move || allocator.allocate(count)).await??;

    // 19 digits covers any 63-bit value.
    let mut body = String::with_capacity(ids.len() * 20);
    for id in &ids {
        // Writing to a String cannot fail.
        let _ = writeln!(body, "{id}");
    }
    Ok(body)
}

async fn health<T>(State(state): State<AppState<T>>) -> (StatusCode, &'static str)
where
    T: TimeSource + Send + 'static,
{
    if state.serving.load(Ordering::Acquire) {
        (StatusCode::OK, "ok\n")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "shutting down\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use core::time::Duration;
    use snowpool::{Layout, SnowflakeId, SystemClock};
    use std::sync::atomic::AtomicU64;
    use tower::ServiceExt;

    /// A clock that steps back one millisecond on every reading.
    #[derive(Clone)]
    struct RewindingClock(Arc<AtomicU64>);

    impl TimeSource for RewindingClock {
        fn current_millis(&self) -> u64 {
            self.0.fetch_sub(1, Ordering::SeqCst)
        }
    }

    fn app(workers: usize) -> Router {
        let allocator = Allocator::with_range(0, workers, Layout::default(), SystemClock).unwrap();
        router(AppState::new(allocator, 500))
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn parse_ids(body: &str) -> Vec<SnowflakeId> {
        body.lines()
            .map(|line| SnowflakeId::from_raw(line.parse().unwrap()))
            .collect()
    }

    #[test]
    fn parses_count_bounds() {
        assert_eq!(parse_count(None, 500).unwrap(), 1);
        assert_eq!(parse_count(Some(""), 500).unwrap(), 1);
        assert_eq!(parse_count(Some("1"), 500).unwrap(), 1);
        assert_eq!(parse_count(Some("500"), 500).unwrap(), 500);
        for bad in ["0", "501", "-1", "abc", "1.5", "99999999999999999999999"] {
            assert!(
                matches!(
                    parse_count(Some(bad), 500),
                    Err(ApiError::InvalidCount { max: 500 })
                ),
                "{bad} accepted"
            );
        }
    }

    #[tokio::test]
    async fn defaults_to_one_id() {
        let (status, body) = fetch(app(1), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse_ids(&body).len(), 1);
        assert!(body.ends_with('\n'));
    }

    #[tokio::test]
    async fn returns_requested_ids_one_per_line() {
        let (status, body) = fetch(app(2), "/?count=25").await;
        assert_eq!(status, StatusCode::OK);

        let ids = parse_ids(&body);
        assert_eq!(ids.len(), 25);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        let worker_id = Layout::default().decode(ids[0]).worker_id;
        assert!(
            ids.iter()
                .all(|id| Layout::default().decode(*id).worker_id == worker_id)
        );
    }

    #[tokio::test]
    async fn ids_route_matches_root() {
        let (status, body) = fetch(app(1), "/ids?count=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse_ids(&body).len(), 3);
    }

    #[tokio::test]
    async fn serves_plain_text() {
        let response = app(1)
            .oneshot(Request::builder().uri("/?count=2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
    }

    #[tokio::test]
    async fn rejects_out_of_range_counts() {
        for uri in ["/?count=0", "/?count=501", "/?count=ten", "/?count=-3"] {
            let (status, body) = fetch(app(1), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(
                body,
                "invalid count; must be a valid integer from 1 to 500\n"
            );
        }
    }

    #[tokio::test]
    async fn clock_regression_is_a_server_error() {
        let layout = Layout::new(Duration::ZERO, 10, 12).unwrap();
        let clock = RewindingClock(Arc::new(AtomicU64::new(1_000_000)));
        let allocator = Allocator::with_range(0, 1, layout, clock).unwrap();
        let pool = Arc::clone(allocator.pool());
        let app = router(AppState::new(allocator, 500));

        let (status, body) = fetch(app, "/?count=5").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("invalid system clock"), "{body}");
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn health_reflects_shutdown() {
        let allocator = Allocator::with_range(0, 1, Layout::default(), SystemClock).unwrap();
        let state = AppState::new(allocator, 500);

        let (status, _) = fetch(router(state.clone()), "/health").await;
        assert_eq!(status, StatusCode::OK);

        state.set_not_serving();
        let (status, _) = fetch(router(state), "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
