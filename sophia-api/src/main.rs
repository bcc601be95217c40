use axum::routing::{delete, get, patch, post};
use axum::Router;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use sophia_shared::clients::analytics_provider::AnalyticsProviderClient;
use sophia_shared::clients::llm::LlmClient;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub analytics: AnalyticsProviderClient,
    pub llm: LlmClient,
    pub metrics: metrics_exporter_prometheus::PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sophia_shared::middleware::init_tracing("sophia-api");

    let config = AppConfig::load()?;
    let port = config.port;

    // Set JWT_SECRET env var so the shared auth extractor can read it
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    let analytics = AnalyticsProviderClient::new(&config.analytics_api_url, &config.analytics_api_token);
    let llm = LlmClient::new(&config.llm_model);
    let metrics = sophia_shared::middleware::init_metrics();

    let state = Arc::new(AppState { db, config, analytics, llm, metrics });

    // Spawn the periodic uptime sweep over active businesses
    services::uptime_monitor::spawn_uptime_monitor(state.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        // Auth
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/auth/change-password", post(routes::auth::change_password))
        .route("/api/auth/refresh-token", post(routes::auth::refresh_token))
        .route("/api/auth/account", delete(routes::auth::delete_account))
        // Businesses
        .route("/api/businesses", post(routes::businesses::create_business).get(routes::businesses::list_businesses))
        .route("/api/businesses/search", get(routes::businesses::search_businesses))
        .route("/api/businesses/statistics", get(routes::businesses::business_statistics))
        .route(
            "/api/businesses/:id",
            get(routes::businesses::get_business)
                .put(routes::businesses::update_business)
                .delete(routes::businesses::delete_business),
        )
        .route("/api/businesses/:id/status", patch(routes::businesses::update_business_status))
        .route("/api/businesses/:id/deployments", get(routes::businesses::list_deployments))
        .route("/api/businesses/:id/campaigns", post(routes::campaigns::create_campaign).get(routes::campaigns::list_campaigns))
        .route("/api/businesses/:id/campaigns/:campaign_id/status", patch(routes::campaigns::update_campaign_status))
        // Analytics
        .route("/api/analytics/:id/setup", post(routes::analytics::setup_tracking))
        .route("/api/analytics/:id/summary", get(routes::analytics::metrics_summary))
        .route("/api/analytics/:id/insights", get(routes::analytics::metrics_insights))
        .route("/api/analytics/:id/compare", get(routes::analytics::compare_periods))
        .route("/api/analytics/:id/trend/:metric", get(routes::analytics::metric_trend))
        .route("/api/analytics/:id/conversions", post(routes::analytics::track_conversion).get(routes::analytics::list_conversions))
        // Monitoring
        .route("/api/monitoring/:id/uptime", get(routes::monitoring::check_uptime))
        .route("/api/monitoring/:id/audit", get(routes::monitoring::run_audit))
        .route("/api/monitoring/:id/payment-test", post(routes::monitoring::test_payment_flow))
        // Agent
        .route("/api/agent/:id/market-analysis", get(routes::agent::market_analysis))
        .route("/api/agent/:id/business-plan", post(routes::agent::business_plan))
        .route("/api/agent/:id/recommendations", get(routes::agent::recommendations))
        .layer(axum::middleware::from_fn(sophia_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "sophia-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
