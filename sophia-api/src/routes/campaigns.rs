use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use sophia_shared::errors::{AppError, AppResult, ErrorCode};
use sophia_shared::types::auth::AuthUser;
use sophia_shared::types::business::CampaignStatus;
use sophia_shared::types::ApiResponse;

use crate::models::{MarketingCampaign, NewMarketingCampaign};
use crate::schema::marketing_campaigns;
use crate::services::business_service;
use crate::AppState;

// --- DTOs ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 60, message = "channel must be 1-60 characters"))]
    pub channel: String,
    #[validate(range(min = 0.0, message = "budget cannot be negative"))]
    pub budget: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCampaignStatusRequest {
    pub status: String,
}

// --- Handlers ---

pub async fn create_campaign(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Json(req): Json<CreateCampaignRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<MarketingCampaign>>)> {
    req.validate().map_err(AppError::from_validation)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    business_service::get_owned(&mut conn, business_id, auth.id)?;

    let new_campaign = NewMarketingCampaign {
        business_id,
        name: req.name,
        channel: req.channel,
        budget: req.budget,
        status: CampaignStatus::Draft.to_string(),
    };

    let campaign: MarketingCampaign = diesel::insert_into(marketing_campaigns::table)
        .values(&new_campaign)
        .get_result(&mut conn)?;

    tracing::info!(business_id = %business_id, campaign_id = %campaign.id, "campaign created");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(campaign))))
}

pub async fn list_campaigns(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<MarketingCampaign>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    business_service::get_owned(&mut conn, business_id, auth.id)?;

    let rows: Vec<MarketingCampaign> = marketing_campaigns::table
        .filter(marketing_campaigns::business_id.eq(business_id))
        .order(marketing_campaigns::created_at.desc())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(rows)))
}

pub async fn update_campaign_status(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path((business_id, campaign_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateCampaignStatusRequest>,
) -> AppResult<Json<ApiResponse<MarketingCampaign>>> {
    let status = CampaignStatus::from_str(&req.status)
        .map_err(|e| AppError::new(ErrorCode::InvalidCampaignStatus, e))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    business_service::get_owned(&mut conn, business_id, auth.id)?;

    let existing: MarketingCampaign = marketing_campaigns::table
        .find(campaign_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::CampaignNotFound, "campaign not found"))?;

    if existing.business_id != business_id {
        return Err(AppError::new(ErrorCode::CampaignNotFound, "campaign not found"));
    }

    let campaign: MarketingCampaign = diesel::update(marketing_campaigns::table.find(campaign_id))
        .set((
            marketing_campaigns::status.eq(status.to_string()),
            marketing_campaigns::updated_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(campaign)))
}
