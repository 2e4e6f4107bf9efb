mod config;
mod encoder;
mod error;
mod handlers;

use anyhow::Context;
use axum::{
    body::Body,
    http::Request,
    routing::{any, get},
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::encoder::{PngDataUrlEncoder, QrEncoder};

#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub server: String,
}

impl PackageInfo {
    pub fn new(name: String, version: String, server: String) -> Self {
        Self { name, version, server }
    }

    /// Crate metadata plus the hostname of the machine we run on.
    pub fn current() -> Self {
        let server = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());

        Self::new(
            env!("CARGO_PKG_NAME").to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
            server,
        )
    }
}

pub struct AppState {
    pub encoder: Arc<dyn QrEncoder>,
    pub package: PackageInfo,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(encoder: Arc<dyn QrEncoder>, package: PackageInfo) -> Self {
        Self {
            encoder,
            package,
            started_at: Utc::now(),
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    // Path only: the query carries caller data.
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        info_span!(
            "request",
            id = %uuid::Uuid::new_v4(),
            method = %request.method(),
            path = %request.uri().path(),
        )
    });

    Router::new()
        .route("/", any(handlers::qr::generate_qr))
        .route("/generateQr", any(handlers::qr::generate_qr))
        .route("/health", get(handlers::health::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(trace)
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining in-flight requests");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = ServerConfig::from_env().context("Invalid configuration")?;
    let package = PackageInfo::current();
    info!("Package: {} v{}", package.name, package.version);
    info!("Host: {}", package.server);
    info!(
        "QR encoder: level {:?}, {}px modules",
        config.ec_level, config.module_size
    );

    let encoder = Arc::new(PngDataUrlEncoder::new(config.ec_level, config.module_size));
    let state = Arc::new(AppState::new(encoder, package));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("Server listening on http://{}", config.bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Method, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let package = PackageInfo::new("qrcode-function".into(), "1.2.3".into(), "box-1".into());
        Arc::new(AppState::new(Arc::new(PngDataUrlEncoder::default()), package))
    }

    #[tokio::test]
    async fn health_reports_package_info() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["name"], "qrcode-function");
        assert_eq!(body["version"], "1.2.3");
        assert_eq!(body["server"], "box-1");
        assert!(body["uptimeSeconds"].as_i64().unwrap() >= 0);
        assert!(body["startedAt"].is_string());
    }

    #[tokio::test]
    async fn cors_headers_are_present() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/generateQr?data=abc")
            .header(header::ORIGIN, "https://shop.example")
            .body(Body::empty())
            .unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[test]
    fn current_package_info_uses_crate_metadata() {
        let package = PackageInfo::current();
        assert_eq!(package.name, env!("CARGO_PKG_NAME"));
        assert_eq!(package.version, env!("CARGO_PKG_VERSION"));
        assert!(!package.server.is_empty());
    }
}
