use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use sophia_shared::errors::{AppError, AppResult, ErrorCode};
use sophia_shared::types::auth::AuthUser;
use sophia_shared::types::pagination::{Paginated, PaginationParams};
use sophia_shared::types::ApiResponse;

use crate::models::{BusinessMetric, ConversionEvent, NewConversionEvent};
use crate::services::insights::{
    self, Forecast, MetricsSummary, Seasonality, Trend, TrendAnalysis,
};
use crate::services::{analytics_service, business_service};
use crate::services::analytics_service::MetricKind;
use crate::{AppState, DbPool};

// --- DTOs ---

#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 { 30 }

impl DaysQuery {
    fn period(&self) -> i64 {
        self.days.clamp(1, 365)
    }
}

#[derive(Debug, Serialize)]
pub struct TrackingSetup {
    pub property_id: String,
    pub measurement_id: String,
    pub stream_id: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub period_days: i64,
    pub summary: MetricsSummary,
    pub performance_score: u32,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub period_days: i64,
    pub performance_score: u32,
    pub visitors_trend: TrendAnalysis,
    pub revenue_trend: TrendAnalysis,
    pub seasonality: Seasonality,
    pub revenue_forecast: Forecast,
}

#[derive(Debug, Serialize)]
pub struct FieldChange {
    pub change_pct: f64,
    pub trend: Trend,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub period_days: i64,
    pub current: MetricsSummary,
    pub previous: MetricsSummary,
    pub active_users: FieldChange,
    pub conversions: FieldChange,
    pub revenue: FieldChange,
    pub page_views: FieldChange,
}

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub metric: String,
    pub period_days: i64,
    pub points: usize,
    pub analysis: TrendAnalysis,
    pub forecast: Forecast,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TrackConversionRequest {
    #[validate(length(min = 1, max = 120, message = "event_name must be 1-120 characters"))]
    pub event_name: String,
    pub value: Option<f64>,
    pub metadata: Option<serde_json::Value>,
}

// --- Handlers ---

/// POST /api/analytics/:id/setup
pub async fn setup_tracking(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<ApiResponse<TrackingSetup>>)> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let business = business_service::get_owned(&mut conn, business_id, auth.id)?;

    if business.tracking_config().is_some() {
        return Err(AppError::new(
            ErrorCode::TrackingAlreadyConfigured,
            "analytics tracking is already configured for this business",
        ));
    }

    let website = business.website_url.as_deref().ok_or_else(|| {
        AppError::new(
            ErrorCode::MissingWebsiteUrl,
            "a website URL is required before analytics can be set up",
        )
    })?;

    let provisioned = state
        .analytics
        .create_property(&business.name, website)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, business_id = %business_id, "provider provisioning failed");
            AppError::new(ErrorCode::ProviderUnavailable, "analytics provider request failed")
        })?;

    analytics_service::save_tracking_ids(
        &mut conn,
        business_id,
        &provisioned.property_id,
        &provisioned.measurement_id,
        &provisioned.stream_id,
    )?;

    tracing::info!(business_id = %business_id, property_id = %provisioned.property_id, "tracking configured");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(TrackingSetup {
            property_id: provisioned.property_id,
            measurement_id: provisioned.measurement_id,
            stream_id: provisioned.stream_id,
        })),
    ))
}

/// GET /api/analytics/:id/summary?days=30
///
/// Pulls the provider report, persists unseen days, and aggregates the
/// trailing window. Requires complete tracking configuration.
pub async fn metrics_summary(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Query(query): Query<DaysQuery>,
) -> AppResult<Json<ApiResponse<SummaryResponse>>> {
    let days = query.period();
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let business = business_service::get_owned(&mut conn, business_id, auth.id)?;

    let Some((property_id, _, _)) = business.tracking_config() else {
        return Err(AppError::new(
            ErrorCode::TrackingNotConfigured,
            "analytics tracking is not configured for this business",
        ));
    };

    let report = state
        .analytics
        .run_report(property_id, days)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, business_id = %business_id, "provider report failed");
            AppError::new(ErrorCode::ProviderUnavailable, "analytics provider request failed")
        })?;

    analytics_service::store_provider_rows(&mut conn, business_id, &report)?;

    let rows = analytics_service::fetch_recent_metrics(&mut conn, business_id, days)?;
    let summary = insights::aggregate_metrics(&rows);
    let performance_score = insights::performance_score(&summary);

    Ok(Json(ApiResponse::ok(SummaryResponse {
        period_days: days,
        summary,
        performance_score,
    })))
}

/// GET /api/analytics/:id/insights?days=30
pub async fn metrics_insights(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Query(query): Query<DaysQuery>,
) -> AppResult<Json<ApiResponse<InsightsResponse>>> {
    let days = query.period();
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    business_service::get_owned(&mut conn, business_id, auth.id)?;

    let rows = analytics_service::fetch_recent_metrics(&mut conn, business_id, days)?;

    let summary = insights::aggregate_metrics(&rows);
    let visitors = analytics_service::metric_series(&rows, MetricKind::Visitors);
    let revenue = analytics_service::metric_series(&rows, MetricKind::Revenue);
    let visitor_points: Vec<_> = rows.iter().map(|r| (r.date, r.visitors as f64)).collect();

    Ok(Json(ApiResponse::ok(InsightsResponse {
        period_days: days,
        performance_score: insights::performance_score(&summary),
        visitors_trend: insights::analyze_trend(&visitors),
        revenue_trend: insights::analyze_trend(&revenue),
        seasonality: insights::detect_seasonality(&visitor_points),
        revenue_forecast: insights::forecast_next_period(&revenue),
    })))
}

/// GET /api/analytics/:id/compare?days=7
///
/// Current period against the one before it; the two window fetches run
/// concurrently.
pub async fn compare_periods(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Query(query): Query<DaysQuery>,
) -> AppResult<Json<ApiResponse<CompareResponse>>> {
    let days = query.period();

    {
        let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
        business_service::get_owned(&mut conn, business_id, auth.id)?;
    }

    // Current window covers the trailing `days` days including today; the
    // previous window is the same length immediately before it.
    let today = Utc::now().date_naive();
    let current_from = today - Duration::days(days - 1);
    let current_to = today + Duration::days(1);
    let previous_from = current_from - Duration::days(days);

    let (current_rows, previous_rows) = tokio::join!(
        fetch_range(state.db.clone(), business_id, current_from, current_to),
        fetch_range(state.db.clone(), business_id, previous_from, current_from),
    );
    let (current_rows, previous_rows) = (current_rows?, previous_rows?);

    let current = insights::aggregate_metrics(&current_rows);
    let previous = insights::aggregate_metrics(&previous_rows);

    let field = |cur: f64, prev: f64| FieldChange {
        change_pct: insights::percentage_change(prev, cur),
        trend: insights::determine_trend(cur, prev),
    };

    Ok(Json(ApiResponse::ok(CompareResponse {
        period_days: days,
        active_users: field(current.active_users as f64, previous.active_users as f64),
        conversions: field(current.conversions as f64, previous.conversions as f64),
        revenue: field(current.revenue, previous.revenue),
        page_views: field(current.page_views as f64, previous.page_views as f64),
        current,
        previous,
    })))
}

async fn fetch_range(
    pool: DbPool,
    business_id: Uuid,
    from: chrono::NaiveDate,
    to: chrono::NaiveDate,
) -> AppResult<Vec<BusinessMetric>> {
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;
        analytics_service::fetch_metrics_range(&mut conn, business_id, from, to)
    })
    .await
    .map_err(|e| AppError::internal(format!("metrics fetch task failed: {e}")))?
}

/// GET /api/analytics/:id/trend/:metric?days=30
pub async fn metric_trend(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path((business_id, metric)): Path<(Uuid, String)>,
    Query(query): Query<DaysQuery>,
) -> AppResult<Json<ApiResponse<TrendResponse>>> {
    let kind = MetricKind::from_str(&metric)
        .map_err(|e| AppError::new(ErrorCode::UnknownMetric, e))?;

    let days = query.period();
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    business_service::get_owned(&mut conn, business_id, auth.id)?;

    let rows = analytics_service::fetch_recent_metrics(&mut conn, business_id, days)?;
    let series = analytics_service::metric_series(&rows, kind);

    Ok(Json(ApiResponse::ok(TrendResponse {
        metric,
        period_days: days,
        points: series.len(),
        analysis: insights::analyze_trend(&series),
        forecast: insights::forecast_next_period(&series),
    })))
}

/// POST /api/analytics/:id/conversions
pub async fn track_conversion(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Json(req): Json<TrackConversionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ConversionEvent>>)> {
    req.validate().map_err(AppError::from_validation)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    business_service::get_owned(&mut conn, business_id, auth.id)?;

    let event = analytics_service::record_conversion(
        &mut conn,
        NewConversionEvent {
            business_id,
            event_name: req.event_name,
            value: req.value,
            metadata: req.metadata,
        },
    )?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(event))))
}

/// GET /api/analytics/:id/conversions?page=1&per_page=20
pub async fn list_conversions(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<ConversionEvent>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    business_service::get_owned(&mut conn, business_id, auth.id)?;

    let page = analytics_service::list_conversions(&mut conn, business_id, &params)?;
    Ok(Json(ApiResponse::ok(page)))
}
