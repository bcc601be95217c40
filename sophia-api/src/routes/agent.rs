use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

use sophia_shared::errors::{AppError, AppResult};
use sophia_shared::types::auth::AuthUser;
use sophia_shared::types::ApiResponse;

use crate::models::Business;
use crate::services::agent_service::{BusinessPlan, MarketAnalysis, Recommendation};
use crate::services::{agent_service, business_service};
use crate::AppState;

fn load_business(state: &AppState, business_id: Uuid, owner_id: Uuid) -> AppResult<Business> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    business_service::get_owned(&mut conn, business_id, owner_id)
}

/// GET /api/agent/:id/market-analysis
pub async fn market_analysis(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MarketAnalysis>>> {
    let business = load_business(&state, business_id, auth.id)?;
    let analysis = agent_service::market_analysis(&state.llm, &business).await;
    Ok(Json(ApiResponse::ok(analysis)))
}

/// POST /api/agent/:id/business-plan
pub async fn business_plan(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BusinessPlan>>> {
    let business = load_business(&state, business_id, auth.id)?;
    let plan = agent_service::business_plan(&state.llm, &business).await;
    Ok(Json(ApiResponse::ok(plan)))
}

/// GET /api/agent/:id/recommendations
pub async fn recommendations(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Recommendation>>>> {
    let business = load_business(&state, business_id, auth.id)?;
    let recs = agent_service::recommendations(&state.llm, &business).await;
    Ok(Json(ApiResponse::ok(recs)))
}
