use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use domain::services::{AuditFailureMode, TransitionEngine};
use persistence::repositories::PgTransitionStore;
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_admin, require_super_admin,
    security_headers_middleware, trace_id, LoginRateLimiter,
};
use crate::routes::{
    admins, analytics, audit_logs, auth, catalog, entities, health, transitions, users,
};
use crate::services::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub auth: AuthService,
    pub engine: TransitionEngine,
    pub login_limiter: Option<Arc<LoginRateLimiter>>,
    pub audit_mode: AuditFailureMode,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Result<Self, JwtError> {
        let jwt = JwtConfig::new(
            &config.jwt.secret,
            config.jwt.issuer.clone(),
            config.jwt.access_token_expiry_secs,
            config.jwt.leeway_secs,
        )?;

        // Zero disables the login limit.
        let login_limiter =
            LoginRateLimiter::new(config.security.login_rate_limit_per_minute).map(Arc::new);

        Ok(Self {
            auth: AuthService::new(pool.clone(), Arc::new(jwt)),
            engine: TransitionEngine::new(Arc::new(PgTransitionStore::new(pool.clone()))),
            audit_mode: config.audit.mode(),
            login_limiter,
            config: Arc::new(config),
            pool,
        })
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    Ok(create_router(AppState::new(config, pool)?))
}

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
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

    // Any active admin
    let admin_routes = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        .route(
            "/api/v1/transitions/:subject_kind/:subject_id/:transition",
            post(transitions::apply_transition),
        )
        .route("/api/v1/entities/:kind", get(entities::list_entities))
        .route("/api/v1/entities/:kind/:id", get(entities::get_entity))
        .route("/api/v1/discount-codes", post(catalog::create_discount_code))
        .route(
            "/api/v1/discount-codes/:id",
            patch(catalog::update_discount_code).delete(catalog::delete_discount_code),
        )
        .route(
            "/api/v1/discount-codes/:id/stats",
            get(catalog::discount_code_stats),
        )
        .route("/api/v1/gifts", post(catalog::create_gift))
        .route(
            "/api/v1/gifts/:id",
            patch(catalog::update_gift).delete(catalog::delete_gift),
        )
        .route("/api/v1/users/:id/notes", put(users::update_notes))
        .route("/api/v1/admins", get(admins::list_admins))
        .route("/api/v1/audit", get(audit_logs::list_audit_logs))
        .route("/api/v1/audit/stats", get(audit_logs::audit_stats))
        .route(
            "/api/v1/audit/timeline/:subject_id",
            get(audit_logs::subject_timeline),
        )
        .route("/api/v1/audit/:id", get(audit_logs::get_audit_log))
        .route("/api/v1/analytics/:metric", get(analytics::get_metric))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // SUPER_ADMIN only
    let super_admin_routes = Router::new()
        .route("/api/v1/admins", post(admins::create_admin))
        .route("/api/v1/admins/:id/role", patch(admins::change_role))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_super_admin,
        ));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/auth/login", post(auth::login));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .merge(super_admin_routes)
        // Global middleware (order matters: bottom layers run first)
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
