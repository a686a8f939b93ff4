//! Core data types for AgriQuery
//!
//! Closed vocabularies shared by every pipeline stage. Keeping these as
//! enums (not open strings) makes invalid stage combinations
//! unrepresentable.

use serde::{Deserialize, Serialize};

/// Supported query languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Persian (Farsi)
    Fa,
    /// English
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Fa => "fa",
            Language::En => "en",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query intent classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Question about sensor data
    DataQuery,
    /// Alert creation or management request
    AlertManagement,
    /// Both a data question and an alert request in one utterance
    Mixed,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::DataQuery => "data_query",
            Intent::AlertManagement => "alert_management",
            Intent::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation applied to the value column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Average,
    Min,
    Max,
    Count,
    Sum,
    Stddev,
    /// No aggregation: the most recent single reading
    None,
}

impl Aggregation {
    /// SQL function name, if the aggregation maps to one
    pub fn sql_fn(&self) -> Option<&'static str> {
        match self {
            Aggregation::Average => Some("AVG"),
            Aggregation::Min => Some("MIN"),
            Aggregation::Max => Some("MAX"),
            Aggregation::Count => Some("COUNT"),
            Aggregation::Sum => Some("SUM"),
            // SQLite has no built-in STDDEV; computed from raw rows instead
            Aggregation::Stddev => None,
            Aggregation::None => None,
        }
    }

    /// Metric key used for the aggregate value in query results
    pub fn metric_key(&self) -> &'static str {
        match self {
            Aggregation::Average => "average",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Count => "count",
            Aggregation::Sum => "sum",
            Aggregation::Stddev => "stddev",
            Aggregation::None => "current_value",
        }
    }
}

/// Time-bucket granularity for grouped results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// No bucketing
    None,
    ByHour,
    ByDay,
    ByWeek,
}

impl Grouping {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grouping::None => "none",
            Grouping::ByHour => "by_hour",
            Grouping::ByDay => "by_day",
            Grouping::ByWeek => "by_week",
        }
    }
}

impl std::fmt::Display for Grouping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_serde_round_trip() {
        let json = serde_json::to_string(&Language::Fa).unwrap();
        assert_eq!(json, "\"fa\"");
        let back: Language = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Language::Fa);
    }

    #[test]
    fn test_intent_wire_names() {
        assert_eq!(
            serde_json::to_string(&Intent::AlertManagement).unwrap(),
            "\"alert_management\""
        );
        assert_eq!(Intent::DataQuery.as_str(), "data_query");
    }

    #[test]
    fn test_aggregation_sql_mapping() {
        assert_eq!(Aggregation::Average.sql_fn(), Some("AVG"));
        assert_eq!(Aggregation::Sum.sql_fn(), Some("SUM"));
        assert_eq!(Aggregation::None.sql_fn(), None);
        assert_eq!(Aggregation::Stddev.sql_fn(), None);
        assert_eq!(Aggregation::None.metric_key(), "current_value");
    }

    #[test]
    fn test_grouping_wire_names() {
        assert_eq!(
            serde_json::to_string(&Grouping::ByDay).unwrap(),
            "\"by_day\""
        );
        assert_eq!(Grouping::ByHour.as_str(), "by_hour");
    }
}
