use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{
    business_metrics, businesses, conversion_events, deployments, marketing_campaigns,
    refresh_tokens, users,
};

// --- Users ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

// --- Refresh Tokens ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = refresh_tokens)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

// --- Businesses ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = businesses)]
pub struct Business {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub industry: String,
    pub monthly_price: f64,
    pub currency: String,
    pub status: String,
    pub website_url: Option<String>,
    pub repo_url: Option<String>,
    pub landing_url: Option<String>,
    pub analytics_property_id: Option<String>,
    pub analytics_measurement_id: Option<String>,
    pub analytics_stream_id: Option<String>,
    pub stripe_product_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Business {
    /// Analytics is configured only when the property, measurement, and
    /// stream ids are all present; a partial set counts as unconfigured.
    pub fn tracking_config(&self) -> Option<(&str, &str, &str)> {
        match (
            self.analytics_property_id.as_deref(),
            self.analytics_measurement_id.as_deref(),
            self.analytics_stream_id.as_deref(),
        ) {
            (Some(p), Some(m), Some(s)) => Some((p, m, s)),
            _ => None,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = businesses)]
pub struct NewBusiness {
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub industry: String,
    pub monthly_price: f64,
    pub currency: String,
    pub status: String,
    pub website_url: Option<String>,
    pub repo_url: Option<String>,
    pub landing_url: Option<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = businesses)]
pub struct BusinessChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub monthly_price: Option<f64>,
    pub currency: Option<String>,
    pub website_url: Option<String>,
    pub repo_url: Option<String>,
    pub landing_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

// --- Business Metrics ---

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = business_metrics)]
pub struct BusinessMetric {
    pub id: Uuid,
    pub business_id: Uuid,
    pub date: NaiveDate,
    pub visitors: i64,
    pub conversions: i64,
    pub revenue: f64,
    pub bounce_rate: f64,
    pub session_duration: f64,
    pub page_views: i64,
    pub ad_clicks: i64,
    pub subscriptions: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = business_metrics)]
pub struct NewBusinessMetric {
    pub business_id: Uuid,
    pub date: NaiveDate,
    pub visitors: i64,
    pub conversions: i64,
    pub revenue: f64,
    pub bounce_rate: f64,
    pub session_duration: f64,
    pub page_views: i64,
    pub ad_clicks: i64,
    pub subscriptions: i64,
}

// --- Conversion Events ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = conversion_events)]
pub struct ConversionEvent {
    pub id: Uuid,
    pub business_id: Uuid,
    pub event_name: String,
    pub value: Option<f64>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = conversion_events)]
pub struct NewConversionEvent {
    pub business_id: Uuid,
    pub event_name: String,
    pub value: Option<f64>,
    pub metadata: Option<serde_json::Value>,
}

// --- Marketing Campaigns ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = marketing_campaigns)]
pub struct MarketingCampaign {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub channel: String,
    pub budget: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = marketing_campaigns)]
pub struct NewMarketingCampaign {
    pub business_id: Uuid,
    pub name: String,
    pub channel: String,
    pub budget: f64,
    pub status: String,
}

// --- Deployments ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = deployments)]
pub struct Deployment {
    pub id: Uuid,
    pub business_id: Uuid,
    pub environment: String,
    pub url: String,
    pub status: String,
    pub deployed_at: DateTime<Utc>,
}
