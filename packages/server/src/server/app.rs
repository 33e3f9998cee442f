//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::middleware::{jwt_auth_middleware, AuthVerifier};
use crate::server::routes::{
    access, commissions, corrections, documents, health_handler, participation, results,
    territorial,
};

/// PV scans are photos or PDFs; anything above this is not a ballot record.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: ServerDeps,
}

/// Build the Axum application router.
///
/// All submission and reporting routes sit behind the JWT middleware; the
/// middleware never rejects by itself, handlers require authentication
/// through `CurrentUser::require`.
pub fn build_app(deps: ServerDeps, verifier: Arc<AuthVerifier>) -> Router {
    let app_state = AppState { deps };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    // Submission bursts around polling close are expected; the limiter only
    // guards against runaway clients. The client key comes from
    // x-forwarded-for / x-real-ip, falling back to the peer address.
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(20)
            .burst_size(50)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .expect("Rate limiter configuration is valid and should never fail"),
    );
    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    Router::new()
        .route("/territorial/hierarchy", get(territorial::hierarchy_handler))
        .route("/access/check", get(access::check_handler))
        .route(
            "/access/grants",
            get(access::list_grants_handler).post(access::create_grant_handler),
        )
        .route(
            "/access/grants/:id/deactivate",
            post(access::deactivate_grant_handler),
        )
        .route(
            "/participation/:department",
            post(participation::upsert_department_handler),
        )
        .route(
            "/participation/:department/aggregate",
            get(participation::department_aggregate_handler),
        )
        .route(
            "/participation/stations/:station",
            post(participation::upsert_station_handler),
        )
        .route(
            "/results/stations/:station",
            post(results::upsert_station_votes_handler),
        )
        .route("/results/national", get(results::national_results_handler))
        .route(
            "/results/departments/:department",
            get(results::department_results_handler),
        )
        .route(
            "/corrections/:kind/:station",
            post(corrections::submit_handler),
        )
        .route(
            "/corrections/:kind/:station/history",
            get(corrections::history_handler),
        )
        .route(
            "/corrections/review/:id/:action",
            post(corrections::review_handler),
        )
        .route(
            "/documents/stations/:station",
            get(documents::list_handler).post(documents::upload_handler),
        )
        .route(
            "/commissions/:department/members",
            get(commissions::list_members_handler).post(commissions::upsert_member_handler),
        )
        // Health check (no rate limit)
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(verifier.clone(), req, next)
        }))
        .layer(rate_limit_layer)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
