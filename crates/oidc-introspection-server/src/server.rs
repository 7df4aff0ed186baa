use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use oidc_introspection::{
    AuthError, CipherError, InMemoryServiceCatalog, InMemoryTokenResolver, IntrospectionCore,
    introspection_router_from_config,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

/// Errors raised while assembling or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A seeded registered service was rejected by the catalog.
    #[error("service catalog: {0}")]
    Catalog(#[from] AuthError),

    /// The signing key could not be loaded or generated.
    #[error("signing key: {0}")]
    Cipher(#[from] CipherError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Builds the application router from configuration.
pub fn build_app(cfg: &AppConfig) -> Result<Router, ServerError> {
    let catalog = InMemoryServiceCatalog::with_services(cfg.services.iter().cloned())?;
    let resolver = InMemoryTokenResolver::with_tokens(cfg.tokens.iter().cloned());
    let core = IntrospectionCore::from_config(
        &cfg.introspection,
        Arc::new(resolver),
        Arc::new(catalog),
    )?;

    let endpoint = cfg.introspection.endpoint_path();
    tracing::info!(
        issuer = %cfg.introspection.normalized_issuer(),
        endpoint = %endpoint,
        services = cfg.services.len(),
        tokens = cfg.tokens.len(),
        dynamic_issuers = cfg.introspection.allow_dynamic_issuers,
        "Introspection endpoint configured"
    );

    Ok(Router::new()
        .route("/healthz", get(healthz))
        .merge(introspection_router_from_config(Arc::new(core), &cfg.introspection))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http.request",
                    http.method = %req.method(),
                    http.target = %req.uri(),
                )
            }),
        ))
}

pub struct IntrospectionServer {
    addr: SocketAddr,
    app: Router,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> Result<IntrospectionServer, ServerError> {
        let app = build_app(&self.config)?;
        Ok(IntrospectionServer {
            addr: self.addr,
            app,
        })
    }
}

impl IntrospectionServer {
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
