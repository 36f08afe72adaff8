//! Membership Matrix Server
//!
//! Serves the membership matrix over HTTP:
//! - Matrix APIs: view, cell toggle, column toggle (under `/api/matrix`)
//! - Health: `/health`
//! - OpenAPI: `/q/openapi`, Swagger UI at `/swagger-ui`
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MEMBERSHIP_MATRIX_CONFIG` | - | Path to a TOML config file |
//! | `MEMBERSHIP_MATRIX_HTTP_PORT` | `8080` | HTTP API port |
//! | `MEMBERSHIP_MATRIX_DIRECTORY_BACKEND` | `memory` | `memory` or `rest` |
//! | `MEMBERSHIP_MATRIX_DIRECTORY_URL` | - | REST directory site root |
//! | `MEMBERSHIP_MATRIX_DIRECTORY_TOKEN` | - | Bearer token for the REST directory |
//! | `MEMBERSHIP_MATRIX_SESSION_SECRET` | - | Key session tokens are signed with; writes need it |
//! | `MEMBERSHIP_MATRIX_SESSION_ALGORITHM` | `HS256` | `HS256`, `HS384` or `HS512` |
//! | `MEMBERSHIP_MATRIX_PAGE_SIZE` | `25` | Rows per "load more" |
//! | `MEMBERSHIP_MATRIX_MAX_PAGES` | `20` | Largest row limit a client may request, in pages |
//! | `MEMBERSHIP_MATRIX_DEV_MODE` | `false` | Seed the in-memory directory |
//! | `LOG_FORMAT` | `text` | `json` or `text` |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{http::HeaderValue, Router};
use jsonwebtoken::Algorithm;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use mm_config::{AppConfig, ConfigLoader, DirectoryBackend};
use mm_matrix::{
    health_router, matrix_router, Directory, InMemoryDirectory, MatrixService, MatrixSettings,
    MatrixState, RestDirectory, RolePolicy, SessionVerifier, TracingNotifier,
};

#[tokio::main]
async fn main() -> Result<()> {
    mm_common::init_logging("mm-server");

    info!("Starting Membership Matrix Server");

    let config = ConfigLoader::new().load()?;
    let directory = build_directory(&config)?;

    let service = MatrixService::new(
        directory,
        Arc::new(RolePolicy::new(config.matrix.manager_role.clone())),
        Arc::new(TracingNotifier),
        MatrixSettings {
            page_size: config.matrix.page_size,
            max_pages: config.matrix.max_pages,
            ..Default::default()
        },
    )
    .with_session_verifier(build_session_verifier(&config)?);
    let matrix_state = MatrixState::new(service)
        .with_directory_size(config.directory.many_users, config.directory.many_groups);

    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/api/matrix", matrix_router(matrix_state))
        .merge(health_router())
        .split_for_parts();

    openapi.info.title = "Membership Matrix API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description = Some("View and edit user/group memberships".to_string());

    let app = Router::new()
        .merge(router)
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Membership Matrix Server shutdown complete");
    Ok(())
}

fn build_directory(config: &AppConfig) -> Result<Arc<dyn Directory>> {
    match config.directory.backend {
        DirectoryBackend::Memory => {
            let directory = if config.dev_mode {
                info!("Using seeded in-memory directory");
                InMemoryDirectory::seeded()
            } else {
                info!("Using empty in-memory directory");
                InMemoryDirectory::new()
            };
            Ok(Arc::new(directory))
        }
        DirectoryBackend::Rest => {
            info!(base_url = %config.directory.base_url, "Using REST directory");
            let directory = RestDirectory::new(
                config.directory.base_url.clone(),
                Duration::from_millis(config.directory.timeout_ms),
            )?
            .with_token(config.directory.token.clone());
            Ok(Arc::new(directory))
        }
    }
}

fn build_session_verifier(config: &AppConfig) -> Result<SessionVerifier> {
    let algorithm: Algorithm = config
        .session
        .algorithm
        .parse()
        .with_context(|| format!("invalid session algorithm '{}'", config.session.algorithm))?;

    let verifier = SessionVerifier::hmac(algorithm, config.session.secret.as_bytes())
        .with_leeway(config.session.leeway_secs);
    if !verifier.is_enabled() {
        warn!("No session secret configured, membership changes are disabled");
    }
    Ok(verifier)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.dev_mode || config.http.cors_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .http
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received...");
}
