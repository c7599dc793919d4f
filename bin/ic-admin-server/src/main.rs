//! Identity Console Admin Server
//!
//! Hosts the identity administration REST APIs:
//! - `/api/identity/users`, `/api/identity/roles`, `/api/identity/claim-types`
//! - `/api/identity/health`
//! - Swagger UI at `/swagger-ui`, OpenAPI document at `/q/openapi`
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `IDCONSOLE_CONFIG` | - | Path to the TOML configuration file |
//! | `IDCONSOLE_HTTP_PORT` | `8080` | HTTP API port |
//! | `IDCONSOLE_STORE_BACKEND` | `memory` | `memory` or `mongodb` |
//! | `IDCONSOLE_MONGODB_URI` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `IDCONSOLE_MONGODB_DATABASE` | `identity_console` | MongoDB database name |
//! | `IDCONSOLE_DEV_MODE` | `false` | Seed demo principals |
//! | `LOG_FORMAT` | `text` | `json` for structured logs |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::Result;
use axum::http::HeaderValue;
use axum::Router;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use ic_config::{AppConfig, ConfigLoader, StoreBackend};
use ic_identity::{
    identity_router, ClaimTypeCatalog, DevDataSeeder, IdentityContext, InMemoryPrincipalStore,
    MongoPrincipalStore, PasswordService, PrincipalStore,
};
use ic_identity::store::PasswordPolicy;

#[tokio::main]
async fn main() -> Result<()> {
    ic_common::logging::init_logging("ic-admin-server");

    info!("Starting Identity Console Admin Server");

    let config = ConfigLoader::new().load()?;
    if config.dev_mode {
        warn!("Dev mode enabled: demo principals will be seeded");
    }

    let catalog = ClaimTypeCatalog::well_known().with_extra(config.claims.extra_types.clone())?;
    info!(claim_types = catalog.len(), "Claim type catalog built");

    let store = build_store(&config).await?;
    let ctx = IdentityContext::new(store, catalog, &config);

    if config.dev_mode {
        DevDataSeeder::new(ctx.store.clone(), ctx.catalog.clone()).seed().await?;
    }

    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/api/identity", identity_router(&ctx))
        .split_for_parts();

    openapi.info.title = "Identity Console API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description = Some("Administration of users, roles, memberships and claims".to_string());

    let app = Router::new()
        .merge(router)
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.http.cors_origins));

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Identity Console Admin Server shutdown complete");
    Ok(())
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn PrincipalStore>> {
    let passwords = PasswordService::new(PasswordPolicy::from(&config.password));
    let store: Arc<dyn PrincipalStore> = match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory principal store");
            Arc::new(InMemoryPrincipalStore::from_config(&config.store, passwords))
        }
        StoreBackend::Mongodb => {
            info!(uri = %config.store.mongodb_uri, "Using MongoDB principal store");
            Arc::new(MongoPrincipalStore::connect(&config.store, passwords).await?)
        }
    };
    Ok(store)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
