// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    activate_handler, health_handler, install_handler, metrics_handler,
    notification_click_handler, proxy_handler, push_handler, sync_handler,
};
use super::middleware::{body_limit_layer, request_id_layers};
use crate::agent::CacheLifecycleManager;
use crate::config::AppConfig;
use crate::error::Result;
use axum::{routing::{get, post}, Router};
use tower_http::trace::TraceLayer;

/// Prefix of the agent's own endpoints; everything else is proxied.
pub const ADMIN_PREFIX: &str = "/__agent";

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub agent: CacheLifecycleManager,
}

pub fn create_router(config: AppConfig, agent: CacheLifecycleManager) -> Result<Router> {
    let body_limit = body_limit_layer(&config.server);
    let state = AppState { config, agent };

    let (set_request_id, propagate_request_id) = request_id_layers();

    let admin = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/install", post(install_handler))
        .route("/activate", post(activate_handler))
        .route("/sync", post(sync_handler))
        .route("/push", post(push_handler))
        .route("/notificationclick", post(notification_click_handler));

    let app = Router::new()
        .nest(ADMIN_PREFIX, admin)
        .fallback(proxy_handler)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
