use chrono::NaiveDate;
use reqwest::Client;
use serde_json::{json, Value};

/// Client for the external analytics provider (GA4-style admin + data API).
///
/// Provisioning creates a property plus a web data stream; reporting pulls a
/// per-day metrics table. Both talk JSON over HTTP with a bearer token.
#[derive(Clone)]
pub struct AnalyticsProviderClient {
    client: Client,
    base_url: String,
    api_token: String,
}

/// Identifiers returned by provisioning. A business is "configured" only when
/// all three are persisted on its record.
#[derive(Debug, Clone)]
pub struct ProvisionedProperty {
    pub property_id: String,
    pub measurement_id: String,
    pub stream_id: String,
}

/// One per-day row of a provider report, mapped into the internal shape.
/// Any metric the provider omits comes back as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDailyRow {
    pub date: NaiveDate,
    pub visitors: i64,
    pub conversions: i64,
    pub revenue: f64,
    pub bounce_rate: f64,
    pub session_duration: f64,
    pub page_views: i64,
}

impl AnalyticsProviderClient {
    pub fn new(base_url: &str, api_token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        }
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, String> {
        let response = self.client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("analytics provider request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("analytics provider error ({status}): {body}"));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| format!("analytics provider returned invalid JSON: {e}"))
    }

    /// Provision a property and web stream for a business site.
    pub async fn create_property(
        &self,
        display_name: &str,
        website_url: &str,
    ) -> Result<ProvisionedProperty, String> {
        let property = self
            .post("/v1/properties", json!({ "displayName": display_name }))
            .await?;

        let property_id = property
            .get("name")
            .and_then(|v| v.as_str())
            .and_then(|name| name.rsplit('/').next())
            .ok_or_else(|| "provider response missing property name".to_string())?
            .to_string();

        let stream = self
            .post(
                &format!("/v1/properties/{property_id}/dataStreams"),
                json!({
                    "type": "WEB_DATA_STREAM",
                    "displayName": display_name,
                    "webStreamData": { "defaultUri": website_url },
                }),
            )
            .await?;

        let stream_id = stream
            .get("name")
            .and_then(|v| v.as_str())
            .and_then(|name| name.rsplit('/').next())
            .ok_or_else(|| "provider response missing stream name".to_string())?
            .to_string();

        let measurement_id = stream
            .get("webStreamData")
            .and_then(|w| w.get("measurementId"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| "provider response missing measurement id".to_string())?
            .to_string();

        tracing::info!(property_id = %property_id, stream_id = %stream_id, "analytics property provisioned");

        Ok(ProvisionedProperty {
            property_id,
            measurement_id,
            stream_id,
        })
    }

    /// Pull a per-day report for the trailing `days` days.
    pub async fn run_report(
        &self,
        property_id: &str,
        days: i64,
    ) -> Result<Vec<ProviderDailyRow>, String> {
        let report = self
            .post(
                &format!("/v1/properties/{property_id}:runReport"),
                json!({
                    "dateRanges": [{ "startDate": format!("{days}daysAgo"), "endDate": "today" }],
                    "dimensions": [{ "name": "date" }],
                    "metrics": [
                        { "name": "activeUsers" },
                        { "name": "conversions" },
                        { "name": "totalRevenue" },
                        { "name": "bounceRate" },
                        { "name": "averageSessionDuration" },
                        { "name": "screenPageViews" },
                    ],
                }),
            )
            .await?;

        let rows = report
            .get("rows")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(rows.iter().filter_map(map_report_row).collect())
    }
}

/// Map one provider report row into the internal per-day shape.
/// Rows with an unparseable date dimension are dropped; missing or
/// malformed metric values default to 0.
fn map_report_row(row: &Value) -> Option<ProviderDailyRow> {
    let date_str = row
        .get("dimensionValues")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|v| v.get("value"))
        .and_then(|v| v.as_str())?;

    let date = NaiveDate::parse_from_str(date_str, "%Y%m%d").ok()?;

    let metric = |idx: usize| -> f64 {
        row.get("metricValues")
            .and_then(|m| m.as_array())
            .and_then(|m| m.get(idx))
            .and_then(|v| v.get("value"))
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    Some(ProviderDailyRow {
        date,
        visitors: metric(0) as i64,
        conversions: metric(1) as i64,
        revenue: metric(2),
        bounce_rate: metric(3),
        session_duration: metric(4),
        page_views: metric(5) as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_report_row_with_all_metrics() {
        let row = json!({
            "dimensionValues": [{ "value": "20250301" }],
            "metricValues": [
                { "value": "120" },
                { "value": "4" },
                { "value": "99.5" },
                { "value": "41.2" },
                { "value": "183.0" },
                { "value": "340" },
            ],
        });

        let mapped = map_report_row(&row).unwrap();
        assert_eq!(mapped.date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(mapped.visitors, 120);
        assert_eq!(mapped.conversions, 4);
        assert_eq!(mapped.revenue, 99.5);
        assert_eq!(mapped.page_views, 340);
    }

    #[test]
    fn missing_metrics_default_to_zero() {
        let row = json!({
            "dimensionValues": [{ "value": "20250301" }],
            "metricValues": [{ "value": "15" }],
        });

        let mapped = map_report_row(&row).unwrap();
        assert_eq!(mapped.visitors, 15);
        assert_eq!(mapped.conversions, 0);
        assert_eq!(mapped.revenue, 0.0);
        assert_eq!(mapped.bounce_rate, 0.0);
    }

    #[test]
    fn bad_date_drops_row() {
        let row = json!({
            "dimensionValues": [{ "value": "not-a-date" }],
            "metricValues": [],
        });
        assert!(map_report_row(&row).is_none());
    }
}
