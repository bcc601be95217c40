use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use sophia_shared::errors::{AppError, AppResult, ErrorCode};
use sophia_shared::types::auth::AuthUser;
use sophia_shared::types::business::BusinessStatus;
use sophia_shared::types::pagination::{Paginated, PaginationParams};
use sophia_shared::types::ApiResponse;

use crate::models::{Business, BusinessChanges, Deployment, NewBusiness};
use crate::schema::deployments;
use crate::services::business_service;
use crate::services::business_service::BusinessStatistics;
use crate::AppState;

// --- DTOs ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBusinessRequest {
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 80, message = "industry must be 1-80 characters"))]
    pub industry: String,
    #[validate(range(min = 0.0, message = "monthly price cannot be negative"))]
    pub monthly_price: f64,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: String,
    #[validate(url(message = "website_url must be a valid URL"))]
    pub website_url: Option<String>,
    #[validate(url(message = "repo_url must be a valid URL"))]
    pub repo_url: Option<String>,
    #[validate(url(message = "landing_url must be a valid URL"))]
    pub landing_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBusinessRequest {
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 80, message = "industry must be 1-80 characters"))]
    pub industry: Option<String>,
    #[validate(range(min = 0.0, message = "monthly price cannot be negative"))]
    pub monthly_price: Option<f64>,
    #[validate(length(equal = 3, message = "currency must be a 3-letter code"))]
    pub currency: Option<String>,
    #[validate(url(message = "website_url must be a valid URL"))]
    pub website_url: Option<String>,
    #[validate(url(message = "repo_url must be a valid URL"))]
    pub repo_url: Option<String>,
    #[validate(url(message = "landing_url must be a valid URL"))]
    pub landing_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

// --- Handlers ---

pub async fn create_business(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBusinessRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Business>>)> {
    req.validate().map_err(AppError::from_validation)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let new_business = NewBusiness {
        owner_id: auth.id,
        name: req.name,
        description: req.description,
        industry: req.industry,
        monthly_price: req.monthly_price,
        currency: req.currency.to_uppercase(),
        status: BusinessStatus::Planning.to_string(),
        website_url: req.website_url,
        repo_url: req.repo_url,
        landing_url: req.landing_url,
    };

    let business = business_service::create(&mut conn, new_business)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(business))))
}

pub async fn list_businesses(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Business>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let page = business_service::list(&mut conn, auth.id, &params)?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_business(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Business>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let business = business_service::get_owned(&mut conn, business_id, auth.id)?;
    Ok(Json(ApiResponse::ok(business)))
}

pub async fn update_business(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Json(req): Json<UpdateBusinessRequest>,
) -> AppResult<Json<ApiResponse<Business>>> {
    req.validate().map_err(AppError::from_validation)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let changes = BusinessChanges {
        name: req.name,
        description: req.description,
        industry: req.industry,
        monthly_price: req.monthly_price,
        currency: req.currency.map(|c| c.to_uppercase()),
        website_url: req.website_url,
        repo_url: req.repo_url,
        landing_url: req.landing_url,
        updated_at: None,
    };

    let business = business_service::update(&mut conn, business_id, auth.id, changes)?;
    Ok(Json(ApiResponse::ok(business)))
}

pub async fn update_business_status(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<Business>>> {
    let status = BusinessStatus::from_str(&req.status)
        .map_err(|e| AppError::new(ErrorCode::InvalidBusinessStatus, e))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let business = business_service::update_status(&mut conn, business_id, auth.id, status)?;
    Ok(Json(ApiResponse::ok(business)))
}

pub async fn delete_business(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    business_service::delete(&mut conn, business_id, auth.id)?;
    Ok(Json(ApiResponse::ok_with_message((), "business deleted")))
}

pub async fn search_businesses(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<Business>>>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::bad_request("search query cannot be empty"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let results = business_service::search(&mut conn, Some(auth.id), q)?;
    Ok(Json(ApiResponse::ok(results)))
}

pub async fn business_statistics(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<BusinessStatistics>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let stats = business_service::statistics(&mut conn, Some(auth.id))?;
    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn list_deployments(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Deployment>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    business_service::get_owned(&mut conn, business_id, auth.id)?;

    let rows: Vec<Deployment> = deployments::table
        .filter(deployments::business_id.eq(business_id))
        .order(deployments::deployed_at.desc())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(rows)))
}
