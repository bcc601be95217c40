// Closed-form metric interpretation: aggregation, trend classification,
// performance scoring, day-of-week seasonality, and a short-horizon forecast.
// Everything here is pure computation over already-fetched rows.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::BusinessMetric;

// ─── Aggregation ────────────────────────────────────────────────────────────

/// Period totals and averages over per-day metric rows.
///
/// Additive fields are summed; bounce rate and session duration are the
/// arithmetic mean across rows (not traffic-weighted).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub active_users: i64,
    pub conversions: i64,
    pub revenue: f64,
    pub page_views: i64,
    pub avg_bounce_rate: f64,
    pub avg_session_duration: f64,
}

pub fn aggregate_metrics(rows: &[BusinessMetric]) -> MetricsSummary {
    if rows.is_empty() {
        return MetricsSummary::default();
    }

    let n = rows.len() as f64;
    MetricsSummary {
        active_users: rows.iter().map(|r| r.visitors).sum(),
        conversions: rows.iter().map(|r| r.conversions).sum(),
        revenue: rows.iter().map(|r| r.revenue).sum(),
        page_views: rows.iter().map(|r| r.page_views).sum(),
        avg_bounce_rate: rows.iter().map(|r| r.bounce_rate).sum::<f64>() / n,
        avg_session_duration: rows.iter().map(|r| r.session_duration).sum::<f64>() / n,
    }
}

// ─── Period-over-period comparison ──────────────────────────────────────────

/// Relative change in percent. A zero baseline maps to 100 when the new
/// value is positive and 0 otherwise, never IEEE infinity.
pub fn percentage_change(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        if new > 0.0 { 100.0 } else { 0.0 }
    } else {
        (new - old) / old * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Classify a period-over-period move. The ±5% band is fixed.
pub fn determine_trend(current: f64, previous: f64) -> Trend {
    let change = percentage_change(previous, current);
    if change > 5.0 {
        Trend::Up
    } else if change < -5.0 {
        Trend::Down
    } else {
        Trend::Stable
    }
}

// ─── Performance score ──────────────────────────────────────────────────────

/// Composite 0-100 score: four independent 0-25 buckets for traffic,
/// conversion rate, bounce rate (inverted, lower is better), and revenue.
pub fn performance_score(summary: &MetricsSummary) -> u32 {
    let traffic = match summary.active_users {
        u if u >= 10_000 => 25,
        u if u >= 5_000 => 20,
        u if u >= 1_000 => 15,
        u if u >= 100 => 10,
        u if u >= 1 => 5,
        _ => 0,
    };

    let conversion_rate = if summary.active_users > 0 {
        summary.conversions as f64 / summary.active_users as f64 * 100.0
    } else {
        0.0
    };
    let conversion = match conversion_rate {
        r if r >= 10.0 => 25,
        r if r >= 5.0 => 20,
        r if r >= 2.5 => 15,
        r if r >= 1.0 => 10,
        r if r > 0.0 => 5,
        _ => 0,
    };

    // A bounce rate only means something once there is traffic.
    let bounce = if summary.active_users > 0 {
        match summary.avg_bounce_rate {
            b if b <= 20.0 => 25,
            b if b <= 35.0 => 20,
            b if b <= 50.0 => 15,
            b if b <= 65.0 => 10,
            b if b <= 80.0 => 5,
            _ => 0,
        }
    } else {
        0
    };

    let revenue = match summary.revenue {
        r if r >= 10_000.0 => 25,
        r if r >= 5_000.0 => 20,
        r if r >= 1_000.0 => 15,
        r if r >= 100.0 => 10,
        r if r > 0.0 => 5,
        _ => 0,
    };

    (traffic + conversion + bounce + revenue).min(100)
}

// ─── Series trend analysis ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    Volatile,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    /// Relative slope magnitude, clamped to [0, 1].
    pub strength: f64,
    pub slope: f64,
}

/// Minimum |slope|/mean for a series to count as moving at all.
const SLOPE_THRESHOLD: f64 = 0.02;

/// Coefficient of variation above which a series is volatile regardless
/// of its slope sign.
const VOLATILITY_THRESHOLD: f64 = 0.5;

/// Least-squares trend over a daily series (index as x).
///
/// Volatility is checked before slope sign: a series whose stdev/mean
/// exceeds 0.5 is classified volatile even when it drifts consistently.
pub fn analyze_trend(values: &[f64]) -> TrendAnalysis {
    if values.len() < 2 {
        return TrendAnalysis {
            direction: TrendDirection::Stable,
            strength: 0.0,
            slope: 0.0,
        };
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean == 0.0 {
        return TrendAnalysis {
            direction: TrendDirection::Stable,
            strength: 0.0,
            slope: 0.0,
        };
    }

    let slope = ols_slope(values);
    let strength = (slope.abs() / mean.abs()).min(1.0);

    if stdev(values) / mean.abs() > VOLATILITY_THRESHOLD {
        return TrendAnalysis {
            direction: TrendDirection::Volatile,
            strength,
            slope,
        };
    }

    let direction = if slope.abs() / mean.abs() > SLOPE_THRESHOLD {
        if slope > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        }
    } else {
        TrendDirection::Stable
    };

    TrendAnalysis { direction, strength, slope }
}

fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }

    if den == 0.0 { 0.0 } else { num / den }
}

fn stdev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}

// ─── Seasonality ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Seasonality {
    pub sufficient_data: bool,
    pub seasonal: bool,
    /// Average value per weekday, Monday first. Weekdays with no data stay 0.
    pub weekday_averages: [f64; 7],
    /// (max - min) / min over weekday averages with data.
    pub spread: f64,
}

/// Minimum points for a meaningful day-of-week comparison (two full weeks).
const SEASONALITY_MIN_POINTS: usize = 14;

/// Spread of weekday averages above which the series is flagged seasonal.
const SEASONALITY_THRESHOLD: f64 = 0.3;

pub fn detect_seasonality(points: &[(NaiveDate, f64)]) -> Seasonality {
    let mut averages = [0.0_f64; 7];

    if points.len() < SEASONALITY_MIN_POINTS {
        return Seasonality {
            sufficient_data: false,
            seasonal: false,
            weekday_averages: averages,
            spread: 0.0,
        };
    }

    let mut sums = [0.0_f64; 7];
    let mut counts = [0_u32; 7];
    for (date, value) in points {
        let day = date.weekday().num_days_from_monday() as usize;
        sums[day] += value;
        counts[day] += 1;
    }

    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for day in 0..7 {
        if counts[day] > 0 {
            averages[day] = sums[day] / counts[day] as f64;
            min = min.min(averages[day]);
            max = max.max(averages[day]);
        }
    }

    // A weekday that averages zero against nonzero peers is itself a weekly
    // pattern; the relative spread is undefined there.
    let (seasonal, spread) = if min > 0.0 {
        let spread = (max - min) / min;
        (spread > SEASONALITY_THRESHOLD, spread)
    } else {
        (max > 0.0, 0.0)
    };

    Seasonality {
        sufficient_data: true,
        seasonal,
        weekday_averages: averages,
        spread,
    }
}

// ─── Forecast ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub value: f64,
    /// 0.3 floor, 0.9 cap; shrinks as the series gets noisier.
    pub confidence: f64,
}

/// Next-period estimate: trailing 3-point moving average with a
/// noise-derived confidence.
pub fn forecast_next_period(values: &[f64]) -> Forecast {
    if values.is_empty() {
        return Forecast { value: 0.0, confidence: 0.3 };
    }

    let window = &values[values.len().saturating_sub(3)..];
    let value = window.iter().sum::<f64>() / window.len() as f64;

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let confidence = if mean == 0.0 {
        0.3
    } else {
        (1.0 - stdev(values) / mean.abs()).clamp(0.3, 0.9)
    };

    Forecast { value, confidence }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn metric(date: NaiveDate, visitors: i64, conversions: i64, revenue: f64, bounce: f64) -> BusinessMetric {
        BusinessMetric {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            date,
            visitors,
            conversions,
            revenue,
            bounce_rate: bounce,
            session_duration: 120.0,
            page_views: visitors * 3,
            ad_clicks: 0,
            subscriptions: 0,
            created_at: chrono::Utc::now(),
        }
    }

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap() + Duration::days(offset)
    }

    #[test]
    fn aggregate_sums_and_averages() {
        let rows = vec![
            metric(day(0), 100, 5, 40.0, 45.5),
            metric(day(1), 50, 3, 10.0, 50.0),
        ];

        let summary = aggregate_metrics(&rows);
        assert_eq!(summary.active_users, 150);
        assert_eq!(summary.conversions, 8);
        assert_eq!(summary.revenue, 50.0);
        assert_eq!(summary.page_views, 450);
        assert_eq!(summary.avg_bounce_rate, 47.75);
    }

    #[test]
    fn aggregate_of_nothing_is_zero() {
        let summary = aggregate_metrics(&[]);
        assert_eq!(summary, MetricsSummary::default());
    }

    #[test]
    fn percentage_change_cases() {
        assert_eq!(percentage_change(100.0, 120.0), 20.0);
        assert_eq!(percentage_change(100.0, 80.0), -20.0);
        assert_eq!(percentage_change(100.0, 100.0), 0.0);
        assert_eq!(percentage_change(0.0, 50.0), 100.0);
        assert_eq!(percentage_change(0.0, 0.0), 0.0);
    }

    #[test]
    fn trend_band_is_five_percent() {
        assert_eq!(determine_trend(120.0, 100.0), Trend::Up);
        assert_eq!(determine_trend(80.0, 100.0), Trend::Down);
        assert_eq!(determine_trend(102.0, 100.0), Trend::Stable);
        assert_eq!(determine_trend(105.0, 100.0), Trend::Stable);
        assert_eq!(determine_trend(94.0, 100.0), Trend::Down);
    }

    #[test]
    fn score_of_empty_summary_is_zero() {
        assert_eq!(performance_score(&MetricsSummary::default()), 0);
    }

    #[test]
    fn score_maxes_at_one_hundred() {
        let summary = MetricsSummary {
            active_users: 50_000,
            conversions: 6_000,
            revenue: 25_000.0,
            page_views: 150_000,
            avg_bounce_rate: 15.0,
            avg_session_duration: 300.0,
        };
        assert_eq!(performance_score(&summary), 100);
    }

    #[test]
    fn score_mid_range() {
        // 1_000 users -> 15, 2% conversion -> 10, 40% bounce -> 15,
        // 500 revenue -> 10.
        let summary = MetricsSummary {
            active_users: 1_000,
            conversions: 20,
            revenue: 500.0,
            page_views: 3_000,
            avg_bounce_rate: 40.0,
            avg_session_duration: 95.0,
        };
        assert_eq!(performance_score(&summary), 50);
    }

    #[test]
    fn steady_growth_is_increasing() {
        let values: Vec<f64> = (0..10).map(|v| 100.0 + v as f64 * 10.0).collect();
        let analysis = analyze_trend(&values);
        assert_eq!(analysis.direction, TrendDirection::Increasing);
        assert!(analysis.strength > 0.0);
    }

    #[test]
    fn steady_decline_is_decreasing() {
        let values: Vec<f64> = (0..10).map(|v| 190.0 - v as f64 * 10.0).collect();
        assert_eq!(analyze_trend(&values).direction, TrendDirection::Decreasing);
    }

    #[test]
    fn flat_series_is_stable() {
        let values = vec![50.0; 12];
        let analysis = analyze_trend(&values);
        assert_eq!(analysis.direction, TrendDirection::Stable);
        assert_eq!(analysis.strength, 0.0);
    }

    #[test]
    fn noisy_series_is_volatile_before_slope() {
        // Strong upward drift, but the swings dominate the mean.
        let values = vec![10.0, 300.0, 5.0, 280.0, 20.0, 350.0, 8.0, 400.0];
        assert_eq!(analyze_trend(&values).direction, TrendDirection::Volatile);
    }

    #[test]
    fn short_series_is_stable() {
        assert_eq!(analyze_trend(&[42.0]).direction, TrendDirection::Stable);
        assert_eq!(analyze_trend(&[]).direction, TrendDirection::Stable);
    }

    #[test]
    fn seasonality_needs_two_weeks() {
        let points: Vec<(NaiveDate, f64)> = (0..13).map(|i| (day(i), 100.0)).collect();
        let report = detect_seasonality(&points);
        assert!(!report.sufficient_data);
        assert!(!report.seasonal);
    }

    #[test]
    fn weekend_spikes_are_seasonal() {
        // day(0) is a Monday; weekends carry double the traffic.
        let points: Vec<(NaiveDate, f64)> = (0..28)
            .map(|i| {
                let date = day(i);
                let value = if i % 7 >= 5 { 200.0 } else { 100.0 };
                (date, value)
            })
            .collect();

        let report = detect_seasonality(&points);
        assert!(report.sufficient_data);
        assert!(report.seasonal);
        assert!(report.spread > 0.3);
    }

    #[test]
    fn uniform_weeks_are_not_seasonal() {
        let points: Vec<(NaiveDate, f64)> = (0..28).map(|i| (day(i), 100.0)).collect();
        assert!(!detect_seasonality(&points).seasonal);
    }

    #[test]
    fn forecast_is_trailing_average() {
        let forecast = forecast_next_period(&[10.0, 10.0, 40.0, 70.0]);
        assert_eq!(forecast.value, 40.0);
    }

    #[test]
    fn forecast_confidence_bounds() {
        let steady = forecast_next_period(&[100.0; 10]);
        assert_eq!(steady.confidence, 0.9);

        let wild = forecast_next_period(&[1.0, 500.0, 2.0, 400.0]);
        assert_eq!(wild.confidence, 0.3);

        let empty = forecast_next_period(&[]);
        assert_eq!(empty.value, 0.0);
        assert_eq!(empty.confidence, 0.3);
    }
}
