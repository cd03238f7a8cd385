use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::CodeLists;
use domain::store::DocumentStore;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{admin, events, gallery, health, invitations, lodging, responses};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<Config>,
    pub code_lists: Arc<CodeLists>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

pub fn create_app(config: Config, store: Arc<dyn DocumentStore>) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        store,
        code_lists: Arc::new(config.invitations.code_lists()),
        rate_limiter: RateLimiterState::from_config(config.security.rate_limit_per_minute)
            .map(Arc::new),
        config: config.clone(),
    };

    let cors = if config.security.cors_origins.is_empty() {
        // Development: allow any origin
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Guest-facing routes, keyed by invitation code
    let guest_routes = Router::new()
        .route("/api/v1/invitations/access", post(invitations::open))
        .route(
            "/api/v1/invitations/:code/guests",
            get(invitations::list_guests),
        )
        .route(
            "/api/v1/invitations/:code/guests/events",
            get(events::invitation_events),
        )
        .route(
            "/api/v1/invitations/:code/responses",
            post(responses::submit),
        )
        .route("/api/v1/lodging", get(lodging::get_lodging))
        .route("/api/v1/gallery", get(gallery::get_gallery))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let admin_routes = Router::new()
        .route("/api/v1/admin/guests", get(admin::list_guests))
        .route("/api/v1/admin/stats", get(admin::get_stats))
        .route("/api/v1/admin/export", get(admin::export_csv))
        .route("/api/v1/admin/events", get(events::dashboard_events))
        .route(
            "/api/v1/admin/invitations",
            post(admin::create_invitation),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(guest_routes)
        .merge(admin_routes)
        // Global middleware (bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
