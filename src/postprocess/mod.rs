//! Result post-processing
//!
//! Query rows come back as [`ReadingRow`]s; this stage turns them into
//! the user-facing pieces: scalar metrics keyed by aggregation, chart
//! series for grouped and comparison shapes, a delta/trend summary for
//! comparisons, and a localized narrative sentence. Every number in the
//! output is computed here from the rows; the completion backend may
//! only rephrase the finished text, never the values in it.

mod chart;
mod narrative;


use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{Aggregation, Grouping};
use crate::semantic::{SemanticDescriptor, TimeRangeSpec};
use crate::store::ReadingRow;
use crate::timerange::TimeRangeToken;

pub use chart::{chart_series, detect_chart_request, ChartPoint, ChartSeries, ChartType};
pub use narrative::{narrative, paraphrase, period_phrase};
pub(crate) use narrative::render_value;

/// Direction of change between two compared periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Delta analysis for a comparison query. The first-mentioned period is
/// the subject, the last-mentioned one the baseline, so "this week vs
/// last week" reads as this week measured against last week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub subject: TimeRangeToken,
    pub baseline: TimeRangeToken,
    pub subject_value: f64,
    pub baseline_value: f64,
    pub delta: f64,
    /// Absent when the baseline value is zero.
    pub percent_change: Option<f64>,
    pub trend: Trend,
}

/// Percent band inside which a comparison counts as stable.
const STABLE_BAND_PERCENT: f64 = 1.0;

/// Extract scalar metrics from result rows. Keys follow
/// [`Aggregation::metric_key`]; comparison results prefix each key with
/// the canonical period label so every period keeps its own group.
pub fn extract_metrics(
    rows: &[ReadingRow],
    descriptor: &SemanticDescriptor,
) -> BTreeMap<String, f64> {
    if rows.is_empty() {
        return BTreeMap::new();
    }

    if let TimeRangeSpec::Comparison(periods) = &descriptor.time_range {
        return comparison_metrics(rows, descriptor.aggregation, periods);
    }
    if descriptor.grouping != Grouping::None {
        return grouped_metrics(rows, descriptor.aggregation);
    }

    match descriptor.aggregation {
        Aggregation::None => raw_metrics(rows),
        Aggregation::Stddev => stddev_metrics(rows),
        aggregation => {
            let mut metrics = BTreeMap::new();
            for (key, value) in named_fields(&rows[0], aggregation) {
                metrics.insert(key.to_string(), value);
            }
            metrics
        }
    }
}

/// Delta and trend between the subject and baseline periods of a
/// comparison descriptor. `None` when the descriptor is not a
/// comparison or either side has no data.
pub fn comparison_summary(
    rows: &[ReadingRow],
    descriptor: &SemanticDescriptor,
) -> Option<ComparisonSummary> {
    let periods = match &descriptor.time_range {
        TimeRangeSpec::Comparison(periods) => periods,
        _ => return None,
    };
    let subject = *periods.first()?;
    let baseline = *periods.last()?;

    let subject_value = period_value(rows, subject, descriptor.aggregation)?;
    let baseline_value = period_value(rows, baseline, descriptor.aggregation)?;

    let delta = subject_value - baseline_value;
    let percent_change = if baseline_value != 0.0 {
        Some(delta / baseline_value.abs() * 100.0)
    } else {
        None
    };
    let trend = match percent_change {
        Some(pct) if pct.abs() < STABLE_BAND_PERCENT => Trend::Stable,
        _ if delta > 0.0 => Trend::Increasing,
        _ if delta < 0.0 => Trend::Decreasing,
        _ => Trend::Stable,
    };

    Some(ComparisonSummary {
        subject,
        baseline,
        subject_value,
        baseline_value,
        delta,
        percent_change,
        trend,
    })
}

/// The column an aggregation reads its headline value from.
fn primary_value(row: &ReadingRow, aggregation: Aggregation) -> Option<f64> {
    match aggregation {
        Aggregation::Min => row.min_value,
        Aggregation::Max => row.max_value,
        Aggregation::Count => row.data_points.map(|n| n as f64),
        Aggregation::Sum => row.value,
        // Grouped and comparison variability questions fall back to the
        // bucket averages; per-bucket spread is not a projected column.
        Aggregation::Average | Aggregation::Stddev | Aggregation::None => row.avg_value,
    }
}

fn period_value(
    rows: &[ReadingRow],
    period: TimeRangeToken,
    aggregation: Aggregation,
) -> Option<f64> {
    let label = period.canonical();
    rows.iter()
        .find(|row| row.time_period.as_deref() == Some(label.as_str()))
        .and_then(|row| primary_value(row, aggregation))
}

/// Metric entries present on one aggregate row.
fn named_fields(row: &ReadingRow, aggregation: Aggregation) -> Vec<(&'static str, f64)> {
    let mut fields = Vec::new();
    if let Some(avg) = row.avg_value {
        fields.push(("average", avg));
    }
    if let Some(min) = row.min_value {
        fields.push(("min", min));
    }
    if let Some(max) = row.max_value {
        fields.push(("max", max));
    }
    // The sum rides the value column; no other shape projects it.
    if aggregation == Aggregation::Sum {
        if let Some(total) = row.value {
            fields.push(("sum", total));
        }
    }
    if let Some(points) = row.data_points {
        fields.push(("data_points", points as f64));
        if aggregation == Aggregation::Count {
            fields.push(("count", points as f64));
        }
    }
    fields
}

fn comparison_metrics(
    rows: &[ReadingRow],
    aggregation: Aggregation,
    periods: &[TimeRangeToken],
) -> BTreeMap<String, f64> {
    let mut metrics = BTreeMap::new();
    for period in periods {
        let label = period.canonical();
        let row = rows
            .iter()
            .find(|row| row.time_period.as_deref() == Some(label.as_str()));
        let Some(row) = row else { continue };
        for (key, value) in named_fields(row, aggregation) {
            metrics.insert(format!("{label}_{key}"), value);
        }
    }
    metrics
}

/// Roll bucket rows up into one overall metric set: bucket averages
/// weighted by their point counts, extremes across buckets, and the
/// newest bucket's average as `latest`.
fn grouped_metrics(rows: &[ReadingRow], aggregation: Aggregation) -> BTreeMap<String, f64> {
    let mut metrics = BTreeMap::new();
    let mut total_points = 0_i64;
    let mut weighted_sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut total = 0.0;
    let mut latest = None;

    for row in rows {
        let points = row.data_points.unwrap_or(0);
        total_points += points;
        if let Some(avg) = row.avg_value {
            weighted_sum += avg * points as f64;
            // Buckets arrive in chronological order.
            latest = Some(avg);
        }
        if let Some(value) = row.min_value {
            min = min.min(value);
        }
        if let Some(value) = row.max_value {
            max = max.max(value);
        }
        if let Some(value) = row.value {
            total += value;
        }
    }

    if total_points > 0 {
        metrics.insert("average".to_string(), weighted_sum / total_points as f64);
    }
    if min.is_finite() {
        metrics.insert("min".to_string(), min);
    }
    if max.is_finite() {
        metrics.insert("max".to_string(), max);
    }
    metrics.insert("data_points".to_string(), total_points as f64);
    if aggregation == Aggregation::Count {
        metrics.insert("count".to_string(), total_points as f64);
    }
    if aggregation == Aggregation::Sum {
        metrics.insert("sum".to_string(), total);
    }
    if let Some(latest) = latest {
        metrics.insert("latest".to_string(), latest);
    }
    metrics
}

/// Spread over a raw window scan. Sample deviation; a lone reading has
/// no spread and reports zero.
fn stddev_metrics(rows: &[ReadingRow]) -> BTreeMap<String, f64> {
    let values: Vec<f64> = rows.iter().filter_map(|row| row.value).collect();
    let mut metrics = BTreeMap::new();
    if values.is_empty() {
        return metrics;
    }

    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    metrics.insert("average".to_string(), mean);
    metrics.insert("stddev".to_string(), sample_stddev(&values, mean));
    metrics.insert(
        "min".to_string(),
        values.iter().copied().fold(f64::INFINITY, f64::min),
    );
    metrics.insert(
        "max".to_string(),
        values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    );
    metrics.insert("data_points".to_string(), count);
    metrics
}

fn sample_stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Metrics for non-aggregated rows. A single row is a current-value
/// answer; several rows get summarized.
fn raw_metrics(rows: &[ReadingRow]) -> BTreeMap<String, f64> {
    let values: Vec<f64> = rows.iter().filter_map(|row| row.value).collect();
    let mut metrics = BTreeMap::new();
    let Some(&first) = values.first() else {
        return metrics;
    };

    if rows.len() == 1 {
        metrics.insert("current_value".to_string(), first);
        return metrics;
    }

    let count = values.len() as f64;
    metrics.insert("count".to_string(), count);
    metrics.insert(
        "average".to_string(),
        values.iter().sum::<f64>() / count,
    );
    metrics.insert(
        "min".to_string(),
        values.iter().copied().fold(f64::INFINITY, f64::min),
    );
    metrics.insert(
        "max".to_string(),
        values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    );
    let latest = rows
        .iter()
        .filter(|row| row.value.is_some())
        .max_by_key(|row| row.timestamp)
        .and_then(|row| row.value)
        .unwrap_or(first);
    metrics.insert("latest".to_string(), latest);
    metrics
}
