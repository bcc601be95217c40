use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

use sophia_shared::clients::browser::{BrowserDriver, ChromeDriver, UnavailableDriver};
use sophia_shared::errors::{AppError, AppResult, ErrorCode};
use sophia_shared::types::auth::AuthUser;
use sophia_shared::types::ApiResponse;

use crate::services::monitoring_service::{PaymentFlowResult, SiteAudit, UptimeCheck};
use crate::services::{business_service, monitoring_service};
use crate::AppState;

/// Resolve the checked business's website URL, owner-scoped.
fn website_for(
    state: &AppState,
    business_id: Uuid,
    owner_id: Uuid,
) -> AppResult<String> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let business = business_service::get_owned(&mut conn, business_id, owner_id)?;
    business.website_url.ok_or_else(|| {
        AppError::new(
            ErrorCode::MissingWebsiteUrl,
            "this business has no website URL to monitor",
        )
    })
}

/// Browser work is seconds-long and synchronous; run it off the async
/// workers. A failed launch degrades into a result, not an error.
async fn with_browser<T, F>(url: String, run: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn BrowserDriver, &str) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let driver: Box<dyn BrowserDriver> = match ChromeDriver::launch() {
            Ok(driver) => Box::new(driver),
            Err(e) => Box::new(UnavailableDriver(e)),
        };
        run(driver.as_ref(), &url)
    })
    .await
    .map_err(|e| AppError::internal(format!("monitoring task failed: {e}")))
}

/// GET /api/monitoring/:id/uptime
pub async fn check_uptime(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UptimeCheck>>> {
    let url = website_for(&state, business_id, auth.id)?;
    let check = with_browser(url, |driver, url| {
        monitoring_service::check_uptime(driver, url)
    })
    .await?;
    Ok(Json(ApiResponse::ok(check)))
}

/// GET /api/monitoring/:id/audit
pub async fn run_audit(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SiteAudit>>> {
    let url = website_for(&state, business_id, auth.id)?;
    let audit = with_browser(url, |driver, url| {
        monitoring_service::run_site_audit(driver, url)
    })
    .await?;
    Ok(Json(ApiResponse::ok(audit)))
}

/// POST /api/monitoring/:id/payment-test
pub async fn test_payment_flow(
    auth: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PaymentFlowResult>>> {
    let url = website_for(&state, business_id, auth.id)?;
    let result = with_browser(url, |driver, url| {
        monitoring_service::test_payment_flow(driver, url)
    })
    .await?;
    Ok(Json(ApiResponse::ok(result)))
}
