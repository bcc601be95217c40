use chrono::{Duration, NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use sophia_shared::clients::analytics_provider::ProviderDailyRow;
use sophia_shared::errors::AppResult;
use sophia_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::{BusinessMetric, ConversionEvent, NewBusinessMetric, NewConversionEvent};
use crate::schema::{business_metrics, conversion_events, businesses};

/// Which per-day column a series is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Visitors,
    Conversions,
    Revenue,
    PageViews,
    BounceRate,
    SessionDuration,
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visitors" => Ok(MetricKind::Visitors),
            "conversions" => Ok(MetricKind::Conversions),
            "revenue" => Ok(MetricKind::Revenue),
            "page_views" => Ok(MetricKind::PageViews),
            "bounce_rate" => Ok(MetricKind::BounceRate),
            "session_duration" => Ok(MetricKind::SessionDuration),
            _ => Err(format!("unknown metric: {s}")),
        }
    }
}

/// Extract one column as an ordered series.
pub fn metric_series(rows: &[BusinessMetric], kind: MetricKind) -> Vec<f64> {
    rows.iter()
        .map(|r| match kind {
            MetricKind::Visitors => r.visitors as f64,
            MetricKind::Conversions => r.conversions as f64,
            MetricKind::Revenue => r.revenue,
            MetricKind::PageViews => r.page_views as f64,
            MetricKind::BounceRate => r.bounce_rate,
            MetricKind::SessionDuration => r.session_duration,
        })
        .collect()
}

/// Rows for the trailing `days` calendar days, oldest first.
pub fn fetch_recent_metrics(
    conn: &mut PgConnection,
    business_id: Uuid,
    days: i64,
) -> AppResult<Vec<BusinessMetric>> {
    let since = Utc::now().date_naive() - Duration::days(days);
    let rows: Vec<BusinessMetric> = business_metrics::table
        .filter(business_metrics::business_id.eq(business_id))
        .filter(business_metrics::date.gt(since))
        .order(business_metrics::date.asc())
        .load(conn)?;
    Ok(rows)
}

/// Rows in [from, to), oldest first. Used by period comparison.
pub fn fetch_metrics_range(
    conn: &mut PgConnection,
    business_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> AppResult<Vec<BusinessMetric>> {
    let rows: Vec<BusinessMetric> = business_metrics::table
        .filter(business_metrics::business_id.eq(business_id))
        .filter(business_metrics::date.ge(from))
        .filter(business_metrics::date.lt(to))
        .order(business_metrics::date.asc())
        .load(conn)?;
    Ok(rows)
}

/// Persist provider report rows for days we have not seen yet. Existing
/// rows win; the provider is re-queried often and days repeat.
pub fn store_provider_rows(
    conn: &mut PgConnection,
    business_id: Uuid,
    rows: &[ProviderDailyRow],
) -> AppResult<usize> {
    if rows.is_empty() {
        return Ok(0);
    }

    let earliest = match rows.iter().map(|r| r.date).min() {
        Some(date) => date,
        None => return Ok(0),
    };
    let known: Vec<NaiveDate> = business_metrics::table
        .filter(business_metrics::business_id.eq(business_id))
        .filter(business_metrics::date.ge(earliest))
        .select(business_metrics::date)
        .load(conn)?;

    let fresh: Vec<NewBusinessMetric> = rows
        .iter()
        .filter(|r| !known.contains(&r.date))
        .map(|r| NewBusinessMetric {
            business_id,
            date: r.date,
            visitors: r.visitors,
            conversions: r.conversions,
            revenue: r.revenue,
            bounce_rate: r.bounce_rate,
            session_duration: r.session_duration,
            page_views: r.page_views,
            ad_clicks: 0,
            subscriptions: 0,
        })
        .collect();

    if fresh.is_empty() {
        return Ok(0);
    }

    let inserted = diesel::insert_into(business_metrics::table)
        .values(&fresh)
        .execute(conn)?;

    tracing::debug!(business_id = %business_id, inserted = inserted, "provider metrics stored");

    Ok(inserted)
}

/// Persist the ids returned by provider provisioning on the business row.
pub fn save_tracking_ids(
    conn: &mut PgConnection,
    business_id: Uuid,
    property_id: &str,
    measurement_id: &str,
    stream_id: &str,
) -> AppResult<()> {
    diesel::update(businesses::table.find(business_id))
        .set((
            businesses::analytics_property_id.eq(property_id),
            businesses::analytics_measurement_id.eq(measurement_id),
            businesses::analytics_stream_id.eq(stream_id),
            businesses::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;
    Ok(())
}

pub fn record_conversion(
    conn: &mut PgConnection,
    event: NewConversionEvent,
) -> AppResult<ConversionEvent> {
    let stored: ConversionEvent = diesel::insert_into(conversion_events::table)
        .values(&event)
        .get_result(conn)?;

    tracing::info!(
        business_id = %stored.business_id,
        event = %stored.event_name,
        "conversion recorded"
    );

    Ok(stored)
}

pub fn list_conversions(
    conn: &mut PgConnection,
    business_id: Uuid,
    params: &PaginationParams,
) -> AppResult<Paginated<ConversionEvent>> {
    let total: i64 = conversion_events::table
        .filter(conversion_events::business_id.eq(business_id))
        .count()
        .get_result(conn)?;

    let items: Vec<ConversionEvent> = conversion_events::table
        .filter(conversion_events::business_id.eq(business_id))
        .order(conversion_events::created_at.desc())
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load(conn)?;

    Ok(Paginated::new(items, total as u64, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn metric_names_parse() {
        assert_eq!(MetricKind::from_str("visitors").unwrap(), MetricKind::Visitors);
        assert_eq!(MetricKind::from_str("bounce_rate").unwrap(), MetricKind::BounceRate);
        assert!(MetricKind::from_str("mood").is_err());
    }

    #[test]
    fn series_extraction_keeps_order() {
        let mk = |date, visitors: i64, revenue: f64| BusinessMetric {
            id: uuid::Uuid::new_v4(),
            business_id: uuid::Uuid::new_v4(),
            date,
            visitors,
            conversions: 0,
            revenue,
            bounce_rate: 0.0,
            session_duration: 0.0,
            page_views: 0,
            ad_clicks: 0,
            subscriptions: 0,
            created_at: Utc::now(),
        };
        let d = |n| NaiveDate::from_ymd_opt(2025, 3, n).unwrap();
        let rows = vec![mk(d(1), 10, 1.5), mk(d(2), 20, 2.5), mk(d(3), 30, 3.5)];

        assert_eq!(metric_series(&rows, MetricKind::Visitors), vec![10.0, 20.0, 30.0]);
        assert_eq!(metric_series(&rows, MetricKind::Revenue), vec![1.5, 2.5, 3.5]);
    }
}
