//! Descriptor-to-SQL compilation
//!
//! Turns a validated [`SemanticDescriptor`] into one parameterized SELECT
//! against the `sensor_data` table. Every user-derived value is bound as a
//! `?` placeholder; the only interpolated fragments are the fixed
//! time-bucket expressions in [`bucket_expr`]. Time bounds render as
//! RFC 3339 UTC so they compare lexicographically with stored timestamps.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::core::error::{AgriQueryError, Result};
use crate::core::types::{Aggregation, Grouping};
use crate::semantic::{SemanticDescriptor, TimeRangeSpec};
use crate::timerange::TimeRangeToken;

pub mod guard;
#[cfg(test)]
mod tests;

pub use guard::SqlGuard;

/// The one table queries may read from.
pub const SENSOR_TABLE: &str = "sensor_data";

/// Projection for raw (non-aggregated) row queries.
const RAW_COLUMNS: &str = "timestamp, sensor_type, value, location, unit";

/// Per-bucket aggregates shared by grouped and comparison shapes.
const BUCKET_AGGREGATES: &str = "AVG(value) AS avg_value, MIN(value) AS min_value, \
     MAX(value) AS max_value, COUNT(value) AS data_points";

/// A compiled, parameterized SELECT statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub sql: String,
    /// Bind values in placeholder order. All text: sensor ids, RFC 3339
    /// bounds, comparison period labels.
    pub params: Vec<String>,
}

impl SqlStatement {
    /// Number of `?` placeholders in the statement.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// Compile a descriptor against the current wall clock.
pub fn compile(descriptor: &SemanticDescriptor) -> Result<SqlStatement> {
    compile_at(descriptor, Utc::now())
}

/// Compile a descriptor with an injected `now`, keeping bound resolution
/// deterministic for callers that need it.
pub fn compile_at(descriptor: &SemanticDescriptor, now: DateTime<Utc>) -> Result<SqlStatement> {
    if let Err(err) = descriptor.validate() {
        // Descriptors are validated at construction; one failing here is
        // an upstream bug, not a user input problem.
        debug_assert!(false, "invalid descriptor reached the compiler: {err}");
        return Err(AgriQueryError::Internal(format!(
            "invalid descriptor reached the compiler: {err}"
        )));
    }

    let stmt = match &descriptor.time_range {
        TimeRangeSpec::Comparison(tokens) => compile_comparison(descriptor, tokens, now),
        TimeRangeSpec::Single(token) => compile_single(descriptor, Some(*token), now),
        TimeRangeSpec::None => compile_single(descriptor, None, now),
    };

    debug_assert_eq!(stmt.placeholder_count(), stmt.params.len());
    tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "compiled query");
    Ok(stmt)
}

/// Latest-row, single-aggregate, raw-scan, and grouped shapes. `token`
/// present means a bounded `[start, end)` window.
fn compile_single(
    descriptor: &SemanticDescriptor,
    token: Option<TimeRangeToken>,
    now: DateTime<Utc>,
) -> SqlStatement {
    let mut params = vec![descriptor.entity.clone()];
    let mut bounds = "";
    if let Some(token) = token {
        let (start, end) = token.resolve(now);
        bounds = " AND timestamp >= ? AND timestamp < ?";
        params.push(rfc3339(start));
        params.push(rfc3339(end));
    }

    let sql = match (descriptor.grouping, descriptor.aggregation) {
        (Grouping::None, Aggregation::None) => format!(
            "SELECT {RAW_COLUMNS} FROM {SENSOR_TABLE} \
             WHERE sensor_type = ?{bounds} ORDER BY timestamp DESC LIMIT 1"
        ),
        // SQLite has no STDDEV; fetch the window and compute downstream.
        (Grouping::None, Aggregation::Stddev) => format!(
            "SELECT {RAW_COLUMNS} FROM {SENSOR_TABLE} \
             WHERE sensor_type = ?{bounds} ORDER BY timestamp ASC"
        ),
        (Grouping::None, aggregation) => format!(
            "SELECT {} FROM {SENSOR_TABLE} WHERE sensor_type = ?{bounds}",
            aggregate_projection(aggregation)
        ),
        (grouping, aggregation) => format!(
            "SELECT {} AS time_period, {} FROM {SENSOR_TABLE} \
             WHERE sensor_type = ?{bounds} \
             GROUP BY time_period ORDER BY time_period ASC",
            bucket_expr(grouping),
            bucket_projection(aggregation),
        ),
    };

    SqlStatement { sql, params }
}

/// One bounded SELECT per period, tagged with its canonical label and
/// joined by `UNION ALL`. Period order follows the descriptor.
fn compile_comparison(
    descriptor: &SemanticDescriptor,
    tokens: &[TimeRangeToken],
    now: DateTime<Utc>,
) -> SqlStatement {
    let projection = bucket_projection(descriptor.aggregation);
    let mut arms = Vec::with_capacity(tokens.len());
    let mut params = Vec::with_capacity(tokens.len() * 4);

    for token in tokens {
        let (start, end) = token.resolve(now);
        arms.push(format!(
            "SELECT ? AS time_period, {projection} FROM {SENSOR_TABLE} \
             WHERE sensor_type = ? AND timestamp >= ? AND timestamp < ?"
        ));
        params.push(token.canonical());
        params.push(descriptor.entity.clone());
        params.push(rfc3339(start));
        params.push(rfc3339(end));
    }

    SqlStatement {
        sql: arms.join(" UNION ALL "),
        params,
    }
}

/// Projection for a single aggregate row over a whole range.
fn aggregate_projection(aggregation: Aggregation) -> &'static str {
    match aggregation {
        Aggregation::Average => BUCKET_AGGREGATES,
        Aggregation::Min => "MIN(value) AS min_value, COUNT(value) AS data_points",
        Aggregation::Max => "MAX(value) AS max_value, COUNT(value) AS data_points",
        Aggregation::Count => "COUNT(value) AS data_points",
        // The column set has no separate total alias; the sum rides the
        // value column.
        Aggregation::Sum => "SUM(value) AS value, COUNT(value) AS data_points",
        Aggregation::Stddev | Aggregation::None => {
            unreachable!("aggregate projection requested for {aggregation:?}")
        }
    }
}

/// Per-bucket projection for grouped and comparison shapes.
fn bucket_projection(aggregation: Aggregation) -> String {
    match aggregation {
        Aggregation::Sum => format!("SUM(value) AS value, {BUCKET_AGGREGATES}"),
        _ => BUCKET_AGGREGATES.to_string(),
    }
}

/// Fixed time-bucket fragments. User text never reaches these.
fn bucket_expr(grouping: Grouping) -> &'static str {
    match grouping {
        Grouping::ByHour => "strftime('%Y-%m-%d %H:00', timestamp)",
        Grouping::ByDay => "DATE(timestamp)",
        Grouping::ByWeek => "strftime('%Y-%W', timestamp)",
        Grouping::None => unreachable!("bucket expression requested for ungrouped query"),
    }
}

fn rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}
