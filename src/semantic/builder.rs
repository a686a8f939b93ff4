//! Descriptor construction from translated query text.

use std::sync::Arc;

use crate::core::config::SemanticConfig;
use crate::core::error::SemanticError;
use crate::core::types::{Aggregation, Grouping};
use crate::memory::ConversationTurn;
use crate::ontology::normalize::fold_text;
use crate::ontology::Ontology;
use crate::timerange::{self, TimeRangeToken, TimeUnit};

use super::{SemanticDescriptor, TimeRangeSpec};

/// Builds descriptors by resolving entity, aggregation, time range and
/// grouping from query text. Marker tables are bilingual so a query
/// that skipped translation still resolves.
pub struct DescriptorBuilder {
    ontology: Arc<Ontology>,
    config: SemanticConfig,
    aggregation_markers: Vec<(&'static str, Aggregation)>,
    grouping_markers: Vec<(&'static str, Grouping)>,
    trend_markers: Vec<&'static str>,
}

impl DescriptorBuilder {
    pub fn new(ontology: Arc<Ontology>, config: SemanticConfig) -> Self {
        Self {
            ontology,
            config,
            aggregation_markers: vec![
                ("average", Aggregation::Average),
                ("avg", Aggregation::Average),
                ("mean", Aggregation::Average),
                ("how much", Aggregation::Average),
                ("میانگین", Aggregation::Average),
                ("متوسط", Aggregation::Average),
                ("total", Aggregation::Sum),
                ("sum", Aggregation::Sum),
                ("مجموع", Aggregation::Sum),
                ("جمع کل", Aggregation::Sum),
                ("minimum", Aggregation::Min),
                ("lowest", Aggregation::Min),
                ("کمترین", Aggregation::Min),
                ("حداقل", Aggregation::Min),
                ("maximum", Aggregation::Max),
                ("highest", Aggregation::Max),
                ("بیشترین", Aggregation::Max),
                ("حداکثر", Aggregation::Max),
                ("how many", Aggregation::Count),
                ("count", Aggregation::Count),
                ("تعداد", Aggregation::Count),
                ("standard deviation", Aggregation::Stddev),
                ("انحراف معیار", Aggregation::Stddev),
            ],
            grouping_markers: vec![
                ("per hour", Grouping::ByHour),
                ("hourly", Grouping::ByHour),
                ("by hour", Grouping::ByHour),
                ("ساعتی", Grouping::ByHour),
                ("هر ساعت", Grouping::ByHour),
                ("per day", Grouping::ByDay),
                ("daily", Grouping::ByDay),
                ("by day", Grouping::ByDay),
                ("روزانه", Grouping::ByDay),
                ("هر روز", Grouping::ByDay),
                ("per week", Grouping::ByWeek),
                ("weekly", Grouping::ByWeek),
                ("by week", Grouping::ByWeek),
                ("هفتگی", Grouping::ByWeek),
            ],
            trend_markers: vec!["trend", "روند", "نمودار", "chart", "graph", "plot"],
        }
    }

    /// Build a descriptor from query text.
    ///
    /// Entity resolution order: explicit sensor in the text, then the
    /// previous turns' entity (follow-ups), then the feature context's
    /// default sensor. `dashboard` is unrestricted and has no default,
    /// so an entity-less dashboard query is ambiguous.
    pub fn build(
        &self,
        text: &str,
        feature_context: &str,
        history: &[ConversationTurn],
    ) -> Result<SemanticDescriptor, SemanticError> {
        let folded = fold_text(text);

        let entity = self.resolve_entity(&folded, feature_context, history)?;
        let mut aggregation = self.resolve_aggregation(&folded);
        let time_range = self.resolve_time_range(text)?;
        let mut grouping = self.resolve_grouping(&folded, &time_range);

        // Comparisons produce one aggregate row per period.
        if time_range.is_comparison() {
            grouping = Grouping::None;
            if aggregation == Aggregation::None {
                aggregation = Aggregation::Average;
            }
        } else if grouping != Grouping::None && aggregation == Aggregation::None {
            // Buckets are aggregates; default to the mean.
            aggregation = Aggregation::Average;
        }

        // An explicit granularity with no window still needs bounds.
        let time_range = match (&time_range, grouping) {
            (TimeRangeSpec::None, Grouping::ByHour) => TimeRangeSpec::Single(TimeRangeToken::Today),
            (TimeRangeSpec::None, Grouping::ByDay) => TimeRangeSpec::Single(TimeRangeToken::Relative {
                n: 7,
                unit: TimeUnit::Days,
            }),
            (TimeRangeSpec::None, Grouping::ByWeek) => {
                TimeRangeSpec::Single(TimeRangeToken::Relative {
                    n: 4,
                    unit: TimeUnit::Weeks,
                })
            }
            _ => time_range,
        };

        let descriptor = SemanticDescriptor {
            entity,
            aggregation,
            time_range,
            grouping,
        };
        descriptor.validate()?;

        tracing::debug!(
            entity = %descriptor.entity,
            aggregation = ?descriptor.aggregation,
            grouping = descriptor.grouping.as_str(),
            comparison = descriptor.is_comparison(),
            "built semantic descriptor"
        );
        Ok(descriptor)
    }

    fn resolve_entity(
        &self,
        folded: &str,
        feature_context: &str,
        history: &[ConversationTurn],
    ) -> Result<String, SemanticError> {
        // A sensor named in the text always wins, even against the
        // feature context's own set.
        if let Some(resolved) = self.ontology.resolve_in_text(folded) {
            return Ok(resolved.id);
        }

        // Follow-up queries lean on the conversation.
        if let Some(entity) = history.iter().rev().find_map(|turn| turn.entity.clone()) {
            tracing::debug!(entity = %entity, "entity inherited from conversation");
            return Ok(entity);
        }

        if let Some(default) = self.ontology.context_default(feature_context) {
            tracing::debug!(entity = %default, context = feature_context, "entity from feature context");
            return Ok(default.to_string());
        }

        Err(SemanticError::EntityUnresolved {
            feature_context: feature_context.to_string(),
        })
    }

    fn resolve_aggregation(&self, folded: &str) -> Aggregation {
        for (marker, aggregation) in &self.aggregation_markers {
            if folded.contains(marker) {
                return *aggregation;
            }
        }
        // Trend phrasing asks for a bucketed mean.
        if self.has_trend_marker(folded) {
            return Aggregation::Average;
        }
        Aggregation::None
    }

    fn resolve_time_range(&self, text: &str) -> Result<TimeRangeSpec, SemanticError> {
        if let Some(periods) = timerange::comparison_list(text) {
            return Ok(TimeRangeSpec::Comparison(periods));
        }
        // Comparison phrasing without two resolvable periods cannot be
        // guessed at; the user is asked to rephrase.
        if timerange::has_comparison_phrasing(text) {
            return Err(SemanticError::ComparisonUnresolved);
        }
        match timerange::parse_phrase(text) {
            Some(token) => Ok(TimeRangeSpec::Single(token)),
            None => Ok(TimeRangeSpec::None),
        }
    }

    fn resolve_grouping(&self, folded: &str, time_range: &TimeRangeSpec) -> Grouping {
        for (marker, grouping) in &self.grouping_markers {
            if folded.contains(marker) {
                return *grouping;
            }
        }

        if self.has_trend_marker(folded) {
            return match time_range {
                TimeRangeSpec::Single(token) if token.is_multi_day() => self.config.default_grouping,
                // Sub-day trends bucket by hour.
                _ => Grouping::ByHour,
            };
        }

        match time_range {
            TimeRangeSpec::Single(token) if token.is_multi_day() => self.config.default_grouping,
            _ => Grouping::None,
        }
    }

    fn has_trend_marker(&self, folded: &str) -> bool {
        self.trend_markers.iter().any(|m| folded.contains(m))
    }
}
