//! Alert-intent extraction
//!
//! Turns an alert-creation utterance into a structured [`AlertSpec`]:
//! canonical sensor, comparison operator and numeric threshold. The
//! extracted spec is handed back to the caller; persisting alerts and
//! evaluating them against live readings happen outside this crate.
//!
//! A missing piece is an error, never a guessed default, so the caller
//! can ask the user for exactly the part that is absent.


use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::error::AlertParseError;
use crate::ontology::{fold_text, Ontology};

/// Comparison operator of an alert condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = ">")]
    Above,
    #[serde(rename = "<")]
    Below,
    #[serde(rename = "=")]
    Equal,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Above => ">",
            ComparisonOperator::Below => "<",
            ComparisonOperator::Equal => "=",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured alert condition extracted from natural language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSpec {
    /// Canonical sensor identifier
    pub sensor_type: String,
    /// Trigger comparison, serialized as `>`, `<` or `=`
    pub comparison_operator: ComparisonOperator,
    /// Numeric trigger value
    pub threshold: f64,
}

/// An alert-management utterance routed to its command.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertCommand {
    /// Create a new alert with the extracted condition
    Create(AlertSpec),
    /// List the session's existing alerts
    List,
    /// Delete an alert, optionally narrowed to one sensor
    Delete { target: Option<String> },
}

lazy_static! {
    // Operator tables are scanned in order; the first one that matches
    // decides, so "is above 25" reads as `>` even though it also
    // contains an equality word. Matching is word-bounded: the "is"
    // inside "this" or "moisture" is not an equality marker.
    static ref ABOVE_MARKERS: Regex = Regex::new(
        r"\b(?:exceeds?|above|over|more than|greater than|higher than)\b|>|\b(?:بیشتر|بالاتر|فراتر|زیادتر|بالای)\b",
    )
    .unwrap();
    static ref BELOW_MARKERS: Regex = Regex::new(
        r"\b(?:below|under|less than|lower than)\b|<|\b(?:کمتر|پایینتر|پایین تر|زیر)\b",
    )
    .unwrap();
    static ref EQUAL_MARKERS: Regex = Regex::new(
        r"\b(?:equals?|reaches|is)\b|=|\b(?:برابر|مساوی)\b",
    )
    .unwrap();

    // First standalone number in the text. The leading boundary keeps
    // digits glued to a word (the 2 in "co2") from counting.
    static ref THRESHOLD: Regex = Regex::new(r"-?\b\d+(?:\.\d+)?").unwrap();

    static ref DELETE_MARKERS: Regex =
        Regex::new(r"\b(?:delete|remove|cancel|disable)\b|حذف|پاک کن|لغو|غیرفعال").unwrap();
    static ref LIST_MARKERS: Regex =
        Regex::new(r"\b(?:show|list|view)\b.*\balerts?\b|\bmy alerts\b|هشدارها|لیست هشدار|نمایش هشدار")
            .unwrap();
}

/// Extracts structured alert conditions from translated query text.
#[derive(Clone)]
pub struct AlertExtractor {
    ontology: Arc<Ontology>,
}

impl AlertExtractor {
    pub fn new(ontology: Arc<Ontology>) -> Self {
        Self { ontology }
    }

    /// Extract the condition of an alert-creation request.
    ///
    /// All three parts are required. Resolution order is sensor, then
    /// operator, then threshold, so the error names the first part a
    /// clarifying question should ask about.
    pub fn extract(&self, text: &str) -> Result<AlertSpec, AlertParseError> {
        let folded = fold_text(text);

        let sensor_type = self
            .ontology
            .resolve_in_text(&folded)
            .map(|hit| hit.id)
            .ok_or(AlertParseError::MissingSensor)?;

        let comparison_operator =
            operator_of(&folded).ok_or(AlertParseError::MissingOperator)?;

        let threshold = THRESHOLD
            .find(&folded)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .ok_or(AlertParseError::MissingThreshold)?;

        tracing::debug!(
            sensor = %sensor_type,
            operator = %comparison_operator,
            threshold,
            "alert condition extracted"
        );

        Ok(AlertSpec {
            sensor_type,
            comparison_operator,
            threshold,
        })
    }

    /// Route an alert-management utterance to its command.
    ///
    /// Deletion and listing words are checked before creation so that
    /// "delete the temperature alert" is never read as a new alert.
    pub fn parse_command(&self, text: &str) -> Result<AlertCommand, AlertParseError> {
        let folded = fold_text(text);

        if DELETE_MARKERS.is_match(&folded) {
            let target = self.ontology.resolve_in_text(&folded).map(|hit| hit.id);
            return Ok(AlertCommand::Delete { target });
        }
        if LIST_MARKERS.is_match(&folded) {
            return Ok(AlertCommand::List);
        }
        self.extract(text).map(AlertCommand::Create)
    }
}

fn operator_of(folded: &str) -> Option<ComparisonOperator> {
    if ABOVE_MARKERS.is_match(folded) {
        Some(ComparisonOperator::Above)
    } else if BELOW_MARKERS.is_match(folded) {
        Some(ComparisonOperator::Below)
    } else if EQUAL_MARKERS.is_match(folded) {
        Some(ComparisonOperator::Equal)
    } else {
        None
    }
}
