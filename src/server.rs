//! HTTP surface of the quote service

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::core::quote::QuoteProvider;
use crate::persist::Persistor;

pub const QUOTE_PATH: &str = "/cotacao";

/// Shared by every request task. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn QuoteProvider>,
    persistor: Persistor,
}

impl AppState {
    pub fn new(provider: Arc<dyn QuoteProvider>, persistor: Persistor) -> Self {
        AppState {
            provider,
            persistor,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(QUOTE_PATH, any(get_quote))
        .fallback(not_found)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Serves until ctrl-c is received.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "Quote server listening on http://{addr}{QUOTE_PATH}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Quote server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn get_quote(State(state): State<AppState>) -> Response {
    let quote = match state.provider.fetch_quote().await {
        Ok(quote) => quote,
        Err(e) => {
            error!(kind = e.kind(), error = %e, "Failed to fetch exchange rate");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // The body is fixed before persistence starts
    let body = match serde_json::to_vec(&quote) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "Failed to encode exchange rate");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    state.persistor.persist(&quote).await;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    let res = next.run(req).await;
    debug!(%method, %uri, status = %res.status(), "Handled request");
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PersistConfig;
    use crate::core::error::FetchError;
    use crate::core::quote::{Quote, UsdBrl};
    use crate::store::{MemoryRateStore, RateStore};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;
    use tower::ServiceExt;

    struct StubProvider {
        call_count: AtomicUsize,
        fail: bool,
    }

    impl StubProvider {
        fn ok() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl QuoteProvider for StubProvider {
        async fn fetch_quote(&self) -> Result<Quote, FetchError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Timeout(200));
            }
            Ok(Quote {
                usdbrl: UsdBrl {
                    code: Some("USD".to_string()),
                    bid: Some("5.4321".to_string()),
                    ask: Some("5.4325".to_string()),
                    timestamp: Some("1700000000".to_string()),
                    ..Default::default()
                },
            })
        }
    }

    fn app(provider: Arc<StubProvider>, store: MemoryRateStore) -> Router {
        let persistor = Persistor::new(Arc::new(store), &PersistConfig::default());
        router(AppState::new(provider, persistor))
    }

    async fn call(app: Router, uri: &str) -> Response {
        app.oneshot(
            axum::http::Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_is_returned_and_persisted() {
        let provider = Arc::new(StubProvider::ok());
        let store = MemoryRateStore::new();

        let res = call(app(provider.clone(), store.clone()), QUOTE_PATH).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "USDBRL": {"code": "USD", "bid": "5.4321", "ask": "5.4325", "timestamp": "1700000000"}
            })
        );

        let rates = store.all().await.unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].bid, Decimal::from_str("5.4321").unwrap());
        assert_eq!(provider.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_other_paths_are_not_found_without_upstream_call() {
        let provider = Arc::new(StubProvider::ok());
        let store = MemoryRateStore::new();

        for uri in ["/", "/cotacao/extra", "/quote"] {
            let res = call(app(provider.clone(), store.clone()), uri).await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND, "path {uri}");
        }

        assert_eq!(provider.call_count.load(Ordering::SeqCst), 0);
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_empty_500_without_persistence() {
        let provider = Arc::new(StubProvider::failing());
        let store = MemoryRateStore::new();

        let res = call(app(provider.clone(), store.clone()), QUOTE_PATH).await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
        assert_eq!(provider.call_count.load(Ordering::SeqCst), 1);
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_adds_at_most_the_deadline() {
        let provider = Arc::new(StubProvider::ok());
        let store = MemoryRateStore::with_latency(Duration::from_secs(5));

        let started = Instant::now();
        let res = call(app(provider, store.clone()), QUOTE_PATH).await;
        let elapsed = started.elapsed();

        // Response content is unaffected by the abandoned write
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let quote: Quote = serde_json::from_slice(&body).unwrap();
        assert_eq!(quote.bid(), "5.4321");

        assert!(elapsed <= Duration::from_millis(11), "took {elapsed:?}");
        assert!(store.all().await.unwrap().is_empty());
    }
}
