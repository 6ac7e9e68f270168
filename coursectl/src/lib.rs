//! # coursectl: group provisioning for course management
//!
//! `coursectl` turns approved student groups into resources on a code-hosting provider. When a
//! teacher changes a group's status, the service makes sure the course directory holds a private
//! repository named after the group, records that repository locally, stores the new status and
//! creates a provider team of the group's members with access to the repository.
//!
//! ## Architecture
//!
//! - [`api`]: Axum handlers under `/api/v1`, with a per-group guard against concurrent runs
//! - [`auth`]: Caller identification from a request header, and role checks
//! - [`provisioning`]: The staged workflow; see its module docs for failure semantics
//! - [`scm`]: Hosting-provider clients (GitHub, and an in-memory dummy) and the session cache
//! - [`db`]: The [`db::Store`] trait with PostgreSQL and in-memory implementations
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use coursectl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = coursectl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     coursectl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     Application::new(config)
//!         .await?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.ok();
//!         })
//!         .await
//! }
//! ```
//!
//! ## Database Setup
//!
//! With `database.type: external` migrations run on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! coursectl::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod provisioning;
pub mod scm;
pub mod telemetry;
#[cfg(test)]
mod test_utils;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, routing::get};
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};
use utoipa::OpenApi;

pub use config::Config;
pub use openapi::ApiDoc;

use crate::{
    api::{handlers, locks::GroupLocks},
    config::{DatabaseConfig, PoolSettings},
    db::{InMemoryStore, PostgresStore, Store},
    scm::ScmSessions,
};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    /// Live provider clients, keyed by access token
    #[builder(default)]
    pub sessions: ScmSessions,
    #[builder(default)]
    pub group_locks: GroupLocks,
}

/// Get the coursectl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the HTTP router over `state`
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().route(
        "/groups/{group_id}",
        get(handlers::groups::get_group)
            .patch(handlers::groups::update_group_status)
            .delete(handlers::groups::delete_group),
    );

    Router::new()
        .route("/healthz", get(handlers::probes::healthz))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api/v1", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

async fn connect(url: &str, pool: &PoolSettings) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .acquire_timeout(Duration::from_secs(pool.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(pool.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(pool.max_lifetime_secs))
        .connect(url)
        .await?;
    migrator().run(&pool).await?;
    Ok(pool)
}

/// A configured server, ready to listen
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Connect to the store, run migrations and build the router
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting coursectl with configuration: {:#?}", config);

        let (store, pool): (Arc<dyn Store>, Option<PgPool>) = match &config.database {
            DatabaseConfig::Memory => {
                info!("Using in-memory store; data will be lost on shutdown");
                (Arc::new(InMemoryStore::new()), None)
            }
            DatabaseConfig::External { url, pool } => {
                info!("Using external database");
                let pool = connect(url, pool).await?;
                (Arc::new(PostgresStore::new(pool.clone())), Some(pool))
            }
        };

        Ok(Self::with_store(config, store, pool))
    }

    /// Build the server over an already opened store
    pub fn with_store(config: Config, store: Arc<dyn Store>, pool: Option<PgPool>) -> Self {
        let state = AppState::builder().config(config.clone()).store(store).build();
        Self {
            router: build_router(state),
            config,
            pool,
        }
    }

    /// Serve until `shutdown` resolves, then release resources
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("coursectl listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }
        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::groups::GroupProvisionResponse;
    use crate::test_utils::{Fixture, TEACHER_ID, create_test_config, create_test_state};

    #[tokio::test]
    async fn test_healthz_and_openapi() {
        let server = axum_test::TestServer::new(build_router(create_test_state(InMemoryStore::new()))).unwrap();

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");

        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();
        let doc: serde_json::Value = response.json();
        assert!(doc["paths"]["/api/v1/groups/{group_id}"]["patch"].is_object());
    }

    #[tokio::test]
    async fn test_application_with_memory_store() {
        let app = Application::new(Config::default()).await.unwrap();
        assert!(app.pool.is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_application_provisions_with_configured_provider() {
        let fixture = Fixture::new();
        let app = Application::with_store(create_test_config(), Arc::new(fixture.store.clone()), None);
        let server = axum_test::TestServer::new(app.router).unwrap();

        let response = server
            .patch(&format!("/api/v1/groups/{}", fixture.group_id))
            .add_header("x-coursectl-user", TEACHER_ID.to_string())
            .json(&serde_json::json!({ "status": 2 }))
            .await;

        response.assert_status_ok();
        let body: GroupProvisionResponse = response.json();
        assert!(body.repository.created);
        assert_eq!(body.repository.path, "g42");
        assert_eq!(body.team.members, vec!["user-7", "user-9"]);
        assert_eq!(fixture.store.repositories().len(), 1);
        // The fixture's own client was never registered with this server
        assert!(fixture.scm.calls().is_empty());
    }
}
