//! Semantic descriptors
//!
//! A [`SemanticDescriptor`] is the canonical, fully-typed form of a data
//! question: which sensor, which aggregation, which time window(s),
//! which grouping granularity. Every downstream stage (SQL compilation,
//! post-processing, charting) works from the descriptor alone and never
//! re-reads the user's text.

mod builder;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::core::error::SemanticError;
use crate::core::types::{Aggregation, Grouping};
use crate::timerange::TimeRangeToken;

pub use builder::DescriptorBuilder;

/// Time scope of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRangeSpec {
    /// No temporal phrase: the most recent reading (or one aggregate
    /// over all data when an aggregation is requested).
    None,
    /// One canonical window.
    Single(TimeRangeToken),
    /// Ordered comparison periods, always at least two. The list is
    /// built once by the canonicalizer and must never be merged or
    /// collapsed downstream.
    Comparison(Vec<TimeRangeToken>),
}

impl TimeRangeSpec {
    pub fn is_comparison(&self) -> bool {
        matches!(self, TimeRangeSpec::Comparison(_))
    }
}

/// Canonical representation of a data question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticDescriptor {
    /// Canonical sensor id from the ontology.
    pub entity: String,

    /// Aggregation over the value column.
    pub aggregation: Aggregation,

    /// Time window(s).
    pub time_range: TimeRangeSpec,

    /// Bucket granularity for series output.
    pub grouping: Grouping,
}

impl SemanticDescriptor {
    /// Whether this descriptor compares multiple periods.
    pub fn is_comparison(&self) -> bool {
        self.time_range.is_comparison()
    }

    /// Check structural invariants. The builder always produces valid
    /// descriptors; this is the net for hand-built ones.
    pub fn validate(&self) -> Result<(), SemanticError> {
        if self.entity.is_empty() {
            return Err(SemanticError::InvalidDescriptor {
                reason: "entity is empty".to_string(),
            });
        }

        match &self.time_range {
            TimeRangeSpec::Comparison(periods) => {
                if periods.len() < 2 {
                    return Err(SemanticError::InvalidDescriptor {
                        reason: "comparison needs at least two periods".to_string(),
                    });
                }
                if self.grouping != Grouping::None {
                    return Err(SemanticError::InvalidDescriptor {
                        reason: "comparison does not support grouping".to_string(),
                    });
                }
                if self.aggregation == Aggregation::None {
                    return Err(SemanticError::InvalidDescriptor {
                        reason: "comparison needs an aggregation".to_string(),
                    });
                }
            }
            TimeRangeSpec::None | TimeRangeSpec::Single(_) => {
                // A grouped query is a bucketed aggregate; raw buckets
                // are not a thing.
                if self.grouping != Grouping::None && self.aggregation == Aggregation::None {
                    return Err(SemanticError::InvalidDescriptor {
                        reason: "grouping requires an aggregation".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
