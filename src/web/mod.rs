//! Web server module.

mod handlers;

pub use handlers::*;

use crate::config::ServerConfig;
use crate::store::Inventory;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub inventory: Inventory,
}

/// Web server for cloudhost.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig, inventory: Inventory) -> Self {
        Self {
            state: AppState { config, inventory },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/api/dashboard", get(handlers::handle_dashboard))
            // Hosts
            .route(
                "/api/hosts",
                get(handlers::handle_list_hosts).post(handlers::handle_create_host),
            )
            .route("/api/hosts/public-pool", get(handlers::handle_public_pool))
            .route(
                "/api/hosts/{id}",
                get(handlers::handle_get_host)
                    .put(handlers::handle_update_host)
                    .delete(handlers::handle_delete_host),
            )
            .route("/api/hosts/{id}/labels", get(handlers::handle_host_labels))
            // Efficiency & changes
            .route("/api/inefficient", get(handlers::handle_inefficient))
            .route("/api/changes", get(handlers::handle_changes))
            .route("/api/changes/labels", get(handlers::handle_change_labels))
            .route("/api/changes/{ip}/restore", post(handlers::handle_restore))
            // Metrics
            .route("/api/metrics", get(handlers::handle_metrics))
            .route("/api/metrics/business", get(handlers::handle_business_metrics))
            .route("/api/metrics/custom", get(handlers::handle_custom_metrics))
            .route("/api/metrics/keys", get(handlers::handle_metric_keys))
            .route("/api/metrics/projection", post(handlers::handle_projection))
            .route("/api/reset", post(handlers::handle_reset))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
