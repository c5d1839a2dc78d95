//! Metrics HTTP server.
//!
//! - `GET /metrics` - Prometheus text exposition of the balance gauges
//! - `GET /` - Static landing page

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use mcsbalance_store::BalanceGauges;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

/// Server-side limit for handling one request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// How long in-flight requests may run after shutdown starts.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Builds the router.
pub fn router(gauges: Arc<BalanceGauges>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .with_state(gauges)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn metrics(State(gauges): State<Arc<BalanceGauges>>) -> Response {
    match gauges.render() {
        Ok(body) => ([(header::CONTENT_TYPE, gauges.content_type())], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}

/// Serves `router` on `listener` until `shutdown` resolves, then lets
/// in-flight requests finish for at most [`SHUTDOWN_GRACE`].
///
/// # Errors
///
/// Returns the I/O error if the server fails.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::pin!(shutdown);
    tokio::select! {
        result = &mut server => return join_result(result),
        () = &mut shutdown => {}
    }

    let _ = stop_tx.send(());
    info!(grace_secs = SHUTDOWN_GRACE.as_secs(), "Draining in-flight requests");
    match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
        Ok(result) => join_result(result),
        Err(_) => {
            server.abort();
            info!("Grace period elapsed, closing remaining connections");
            Ok(())
        }
    }
}

fn join_result(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> std::io::Result<()> {
    result.map_err(std::io::Error::other)?
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get_path(app: Router, path: &str) -> (StatusCode, Option<String>, String) {
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let gauges = Arc::new(BalanceGauges::new().unwrap());
        gauges.set("Alpha", 12.5);
        gauges.set("Beta", 0.0);

        let (status, content_type, body) = get_path(router(Arc::clone(&gauges)), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/plain"));
        assert!(body.contains(r#"balance_mcs{project="Alpha"} 12.5"#));
        assert!(body.contains(r#"balance_mcs{project="Beta"} 0"#));
    }

    #[tokio::test]
    async fn test_metrics_before_first_poll() {
        let gauges = Arc::new(BalanceGauges::new().unwrap());
        let (status, _, body) = get_path(router(gauges), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("balance_mcs{"));
    }

    #[tokio::test]
    async fn test_index_page() {
        let gauges = Arc::new(BalanceGauges::new().unwrap());
        let (status, content_type, body) = get_path(router(gauges), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert!(body.contains(r#"<a href="/metrics">"#));
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let gauges = Arc::new(BalanceGauges::new().unwrap());
        let (status, _, _) = get_path(router(gauges), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let gauges = Arc::new(BalanceGauges::new().unwrap());
        gauges.set("Alpha", 1.0);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, router(gauges), async move {
            let _ = rx.await;
        }));

        let body = reqwest::get(format!("http://{addr}/metrics"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains(r#"balance_mcs{project="Alpha"} 1"#));

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
