use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use sophia_shared::errors::{AppError, AppResult, ErrorCode};
use sophia_shared::types::auth::{AuthUser, TokenPair};
use sophia_shared::types::ApiResponse;

use crate::models::{NewRefreshToken, NewUser, RefreshToken, User};
use crate::schema::{refresh_tokens, users};
use crate::services::{auth_service, business_service, token_service};
use crate::AppState;

// --- DTOs ---

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

// --- Handlers ---

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    req.validate().map_err(AppError::from_validation)?;
    auth_service::validate_password(&req.password)?;

    let password_hash = auth_service::hash_password(&req.password)?;
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let exists: bool = users::table
        .filter(users::email.eq(&req.email.to_lowercase()))
        .count()
        .get_result::<i64>(&mut conn)
        .map(|c| c > 0)
        .unwrap_or(false);

    if exists {
        return Err(AppError::new(ErrorCode::EmailAlreadyExists, "email already registered"));
    }

    let new_user = NewUser {
        email: req.email.to_lowercase(),
        password_hash,
        name: req.name,
    };

    let user: User = diesel::insert_into(users::table)
        .values(&new_user)
        .get_result(&mut conn)?;

    let (tokens, refresh_hash) = token_service::create_token_pair(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_access_ttl,
    )?;

    store_refresh_token(&mut conn, user.id, refresh_hash, state.config.jwt_refresh_ttl)?;

    tracing::info!(user_id = %user.id, email = %user.email, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(AuthResponse {
            user: user.into(),
            tokens,
        })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user: User = users::table
        .filter(users::email.eq(req.email.to_lowercase()))
        .first(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"))?;

    let valid = auth_service::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(AppError::new(ErrorCode::InvalidCredentials, "invalid email or password"));
    }

    let (tokens, refresh_hash) = token_service::create_token_pair(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_access_ttl,
    )?;

    store_refresh_token(&mut conn, user.id, refresh_hash, state.config.jwt_refresh_ttl)?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(ApiResponse::ok(AuthResponse {
        user: user.into(),
        tokens,
    })))
}

pub async fn me(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user: User = users::table
        .find(auth.id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    Ok(Json(ApiResponse::ok(user.into())))
}

pub async fn change_password(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    auth_service::validate_password(&req.new_password)?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user: User = users::table
        .find(auth.id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let valid = auth_service::verify_password(&req.current_password, &user.password_hash)?;
    if !valid {
        return Err(AppError::new(ErrorCode::InvalidCredentials, "current password is incorrect"));
    }

    let new_hash = auth_service::hash_password(&req.new_password)?;
    diesel::update(users::table.find(auth.id))
        .set((
            users::password_hash.eq(new_hash),
            users::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    // A password change invalidates every outstanding session.
    diesel::update(
        refresh_tokens::table
            .filter(refresh_tokens::user_id.eq(auth.id))
            .filter(refresh_tokens::revoked_at.is_null()),
    )
    .set(refresh_tokens::revoked_at.eq(Utc::now()))
    .execute(&mut conn)?;

    tracing::info!(user_id = %auth.id, "password changed");

    Ok(Json(ApiResponse::ok_with_message((), "password changed")))
}

pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let token_hash = token_service::hash_token(&req.refresh_token);
    let stored: RefreshToken = refresh_tokens::table
        .filter(refresh_tokens::token_hash.eq(&token_hash))
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::TokenInvalid, "unknown refresh token"))?;

    if stored.revoked_at.is_some() {
        return Err(AppError::new(ErrorCode::RefreshTokenRevoked, "refresh token has been revoked"));
    }
    if stored.expires_at < Utc::now() {
        return Err(AppError::new(ErrorCode::TokenExpired, "refresh token has expired"));
    }

    // Rotation: the presented token is single-use.
    diesel::update(refresh_tokens::table.find(stored.id))
        .set(refresh_tokens::revoked_at.eq(Utc::now()))
        .execute(&mut conn)?;

    let (tokens, refresh_hash) = token_service::create_token_pair(
        stored.user_id,
        &state.config.jwt_secret,
        state.config.jwt_access_ttl,
    )?;

    store_refresh_token(&mut conn, stored.user_id, refresh_hash, state.config.jwt_refresh_ttl)?;

    Ok(Json(ApiResponse::ok(tokens)))
}

pub async fn delete_account(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteAccountRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user: User = users::table
        .find(auth.id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let valid = auth_service::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(AppError::new(ErrorCode::InvalidCredentials, "password is incorrect"));
    }

    // Tear down owned businesses first, each with its dependent rows.
    let owned: Vec<Uuid> = crate::schema::businesses::table
        .filter(crate::schema::businesses::owner_id.eq(auth.id))
        .select(crate::schema::businesses::id)
        .load(&mut conn)?;
    for business_id in owned {
        business_service::delete(&mut conn, business_id, auth.id)?;
    }

    diesel::delete(refresh_tokens::table.filter(refresh_tokens::user_id.eq(auth.id)))
        .execute(&mut conn)?;
    diesel::delete(users::table.find(auth.id)).execute(&mut conn)?;

    tracing::info!(user_id = %auth.id, "account deleted");

    Ok(Json(ApiResponse::ok_with_message((), "account deleted")))
}

fn store_refresh_token(
    conn: &mut diesel::pg::PgConnection,
    user_id: Uuid,
    token_hash: String,
    ttl_secs: i64,
) -> AppResult<()> {
    let new_rt = NewRefreshToken {
        user_id,
        token_hash,
        expires_at: Utc::now() + chrono::Duration::seconds(ttl_secs),
    };
    diesel::insert_into(refresh_tokens::table)
        .values(&new_rt)
        .execute(conn)?;
    Ok(())
}
