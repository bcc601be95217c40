use std::sync::Arc;

use metrics::gauge;
use sophia_shared::clients::browser::ChromeDriver;

use crate::services::{business_service, monitoring_service};
use crate::AppState;

/// Spawn the periodic uptime sweep over every ACTIVE business with a
/// website. Best-effort: a missing browser or a down site is logged and
/// recorded, never fatal.
pub fn spawn_uptime_monitor(state: Arc<AppState>) {
    let interval_secs = state.config.monitor_interval_secs;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));

        loop {
            interval.tick().await;

            tracing::info!("running uptime sweep");
            if let Err(e) = run_sweep(&state) {
                tracing::error!(error = %e, "uptime sweep failed");
            }
        }
    });
}

fn run_sweep(state: &AppState) -> anyhow::Result<()> {
    let mut conn = state.db.get()?;
    let businesses = business_service::active_businesses(&mut conn)
        .map_err(|e| anyhow::anyhow!("loading active businesses failed: {e}"))?;

    let targets: Vec<_> = businesses
        .into_iter()
        .filter_map(|b| b.website_url.clone().map(|url| (b, url)))
        .collect();

    if targets.is_empty() {
        tracing::debug!("no active businesses with a website to check");
        return Ok(());
    }

    let driver = match ChromeDriver::launch() {
        Ok(driver) => driver,
        Err(e) => {
            tracing::warn!(error = %e, "browser unavailable, skipping uptime sweep");
            return Ok(());
        }
    };

    for (business, url) in targets {
        let check = monitoring_service::check_uptime(&driver, &url);

        let labels = [("business_id", business.id.to_string())];
        gauge!("business_site_up", &labels).set(if check.is_up { 1.0 } else { 0.0 });
        gauge!("business_site_response_ms", &labels).set(check.response_time_ms as f64);

        if check.is_up && !check.has_errors {
            tracing::info!(
                business_id = %business.id,
                url = %url,
                response_ms = check.response_time_ms,
                "site healthy"
            );
        } else {
            tracing::warn!(
                business_id = %business.id,
                url = %url,
                is_up = check.is_up,
                errors = ?check.error_messages,
                "site check reported problems"
            );
        }
    }

    Ok(())
}
