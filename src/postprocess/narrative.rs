//! Narrative assembly
//!
//! The response sentence is filled from computed metrics and ontology
//! display names, in the query's language. The completion backend may
//! rewrite the finished sentence for tone, and the rewrite is dropped
//! whenever it loses a number the template carried.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::config::CompletionConfig;
use crate::core::types::{Aggregation, Language};
use crate::llm::{CompletionRequest, TextCompletion};
use crate::ontology::Ontology;
use crate::semantic::{SemanticDescriptor, TimeRangeSpec};
use crate::timerange::{TimeRangeToken, TimeUnit};

use super::{ComparisonSummary, Trend};

const PARAPHRASE_SYSTEM: &str =
    "You rephrase sensor reports in a friendly conversational tone. Keep every \
     number and unit exactly as written, add no new facts, and answer in the \
     language named in the request.";

lazy_static! {
    static ref NUMBER_TOKENS: Regex = Regex::new(r"\d+(?:\.\d+)?").unwrap();
}

/// Localized phrase for one period token.
pub fn period_phrase(token: TimeRangeToken, language: Language) -> String {
    match (token, language) {
        (TimeRangeToken::Today, Language::En) => "today".to_string(),
        (TimeRangeToken::Today, Language::Fa) => "امروز".to_string(),
        (TimeRangeToken::Yesterday, Language::En) => "yesterday".to_string(),
        (TimeRangeToken::Yesterday, Language::Fa) => "دیروز".to_string(),
        (TimeRangeToken::ThisWeek, Language::En) => "this week".to_string(),
        (TimeRangeToken::ThisWeek, Language::Fa) => "این هفته".to_string(),
        (TimeRangeToken::LastWeek, Language::En) => "last week".to_string(),
        (TimeRangeToken::LastWeek, Language::Fa) => "هفته گذشته".to_string(),
        (TimeRangeToken::Relative { n, unit }, Language::En) => {
            let (one, many) = match unit {
                TimeUnit::Hours => ("hour", "hours"),
                TimeUnit::Days => ("day", "days"),
                TimeUnit::Weeks => ("week", "weeks"),
            };
            if n == 1 {
                format!("the last {one}")
            } else {
                format!("the last {n} {many}")
            }
        }
        (TimeRangeToken::Relative { n, unit }, Language::Fa) => {
            let word = match unit {
                TimeUnit::Hours => "ساعت",
                TimeUnit::Days => "روز",
                TimeUnit::Weeks => "هفته",
            };
            format!("{n} {word} گذشته")
        }
    }
}

/// Localized phrase for the descriptor's whole time scope, `None` when
/// it has none.
pub fn range_phrase(range: &TimeRangeSpec, language: Language) -> Option<String> {
    match range {
        TimeRangeSpec::None => None,
        TimeRangeSpec::Single(token) => Some(period_phrase(*token, language)),
        TimeRangeSpec::Comparison(periods) => {
            let joiner = match language {
                Language::En => " vs ",
                Language::Fa => " در مقابل ",
            };
            let parts: Vec<String> = periods
                .iter()
                .map(|token| period_phrase(*token, language))
                .collect();
            Some(parts.join(joiner))
        }
    }
}

/// Fill the response sentence from computed metrics. Falls back to a
/// no-data sentence when the metrics carry no usable value.
pub fn narrative(
    descriptor: &SemanticDescriptor,
    metrics: &BTreeMap<String, f64>,
    comparison: Option<&ComparisonSummary>,
    ontology: &Ontology,
    language: Language,
) -> String {
    let display = ontology
        .display_name(&descriptor.entity, language)
        .unwrap_or(&descriptor.entity)
        .to_string();
    let unit = match descriptor.aggregation {
        Aggregation::Count => None,
        _ => ontology.unit(&descriptor.entity),
    };
    let range = range_phrase(&descriptor.time_range, language);

    if descriptor.is_comparison() {
        if let Some(summary) = comparison {
            return comparison_text(summary, descriptor.aggregation, &display, unit, language);
        }
        if let Some(text) = partial_comparison_text(descriptor, metrics, &display, unit, language)
        {
            return text;
        }
        return no_data_text(&display, language);
    }

    let text = match descriptor.aggregation {
        Aggregation::None => current_text(metrics, &display, unit, language),
        Aggregation::Count => count_text(metrics, &display, range.as_deref(), language),
        // A grouped variability question carries no stddev metric and
        // degrades to the bucket-average sentence.
        Aggregation::Stddev => {
            aggregate_text(Aggregation::Stddev, metrics, &display, unit, range.as_deref(), language)
                .or_else(|| {
                    aggregate_text(
                        Aggregation::Average,
                        metrics,
                        &display,
                        unit,
                        range.as_deref(),
                        language,
                    )
                })
        }
        aggregation => {
            aggregate_text(aggregation, metrics, &display, unit, range.as_deref(), language)
        }
    };

    text.unwrap_or_else(|| no_data_text(&display, language))
}

/// Optionally rephrase assembled text through the completion seam. Any
/// failure, and any rewrite that drops a number, keeps the template
/// output unchanged.
pub async fn paraphrase(
    text: &str,
    language: Language,
    completion: &dyn TextCompletion,
    config: &CompletionConfig,
) -> String {
    if !config.enable_paraphrase || !completion.is_available() {
        return text.to_string();
    }

    let target = match language {
        Language::En => "English",
        Language::Fa => "Persian (Farsi)",
    };
    let request = CompletionRequest::new(format!("Language: {target}\n\n{text}"))
        .with_system(PARAPHRASE_SYSTEM)
        .with_max_tokens(300)
        .with_temperature(0.4);

    match completion.complete(request).await {
        Ok(response) => {
            let rewritten = response.text.trim();
            if rewritten.is_empty() || !preserves_numbers(text, rewritten) {
                tracing::debug!("paraphrase dropped a number, keeping template text");
                return text.to_string();
            }
            rewritten.to_string()
        }
        Err(err) => {
            tracing::debug!(error = %err, "paraphrase unavailable, keeping template text");
            text.to_string()
        }
    }
}

fn preserves_numbers(template: &str, rewritten: &str) -> bool {
    NUMBER_TOKENS
        .find_iter(template)
        .all(|number| rewritten.contains(number.as_str()))
}

fn comparison_text(
    summary: &ComparisonSummary,
    aggregation: Aggregation,
    display: &str,
    unit: Option<&str>,
    language: Language,
) -> String {
    // Comparison arms project bucket aggregates, so variability and
    // bare-value questions both compare period averages.
    let aggregation = match aggregation {
        Aggregation::Stddev | Aggregation::None => Aggregation::Average,
        other => other,
    };
    let label = aggregation_label(aggregation, language);
    let subject = period_phrase(summary.subject, language);
    let baseline = period_phrase(summary.baseline, language);
    let subject_value = render_value(summary.subject_value, unit);
    let baseline_value = render_value(summary.baseline_value, unit);

    let delta = fmt_signed(summary.delta);
    let change = match summary.percent_change {
        Some(pct) => match language {
            Language::En => format!("{delta} ({}%)", fmt_signed(pct)),
            Language::Fa => format!("{delta} ({}٪)", fmt_signed(pct)),
        },
        None => delta,
    };
    let trend = trend_word(summary.trend, language);

    match language {
        Language::En => format!(
            "{label} {display} for {subject}: {subject_value}; \
             for {baseline}: {baseline_value}. Change: {change}, {trend}."
        ),
        Language::Fa => format!(
            "{label} {display} برای {subject} {subject_value} و برای {baseline} \
             {baseline_value} بود. تغییر: {change} ({trend})."
        ),
    }
}

/// Per-period listing for comparisons where the delta could not be
/// computed because a side has no data.
fn partial_comparison_text(
    descriptor: &SemanticDescriptor,
    metrics: &BTreeMap<String, f64>,
    display: &str,
    unit: Option<&str>,
    language: Language,
) -> Option<String> {
    let periods = match &descriptor.time_range {
        TimeRangeSpec::Comparison(periods) => periods,
        _ => return None,
    };
    let aggregation = match descriptor.aggregation {
        Aggregation::Stddev | Aggregation::None => Aggregation::Average,
        other => other,
    };

    let mut segments = Vec::new();
    let mut any_value = false;
    for period in periods {
        let phrase = period_phrase(*period, language);
        let key = format!("{}_{}", period.canonical(), aggregation.metric_key());
        match metrics.get(&key) {
            Some(&value) => {
                any_value = true;
                let value = render_value(value, unit);
                segments.push(match language {
                    Language::En => format!("for {phrase}: {value}"),
                    Language::Fa => format!("برای {phrase}: {value}"),
                });
            }
            None => segments.push(match language {
                Language::En => format!("no data for {phrase}"),
                Language::Fa => format!("برای {phrase} داده‌ای ثبت نشده"),
            }),
        }
    }
    if !any_value {
        return None;
    }

    let label = aggregation_label(aggregation, language);
    let joined = segments.join(match language {
        Language::En => "; ",
        Language::Fa => "؛ ",
    });
    Some(format!("{label} {display} {joined}."))
}

fn current_text(
    metrics: &BTreeMap<String, f64>,
    display: &str,
    unit: Option<&str>,
    language: Language,
) -> Option<String> {
    let value = metrics
        .get("current_value")
        .or_else(|| metrics.get("latest"))
        .copied()?;
    let value = render_value(value, unit);
    Some(match language {
        Language::En => format!("Current {display}: {value}."),
        Language::Fa => format!("{display} در حال حاضر {value} است."),
    })
}

fn count_text(
    metrics: &BTreeMap<String, f64>,
    display: &str,
    range: Option<&str>,
    language: Language,
) -> Option<String> {
    let count = metrics
        .get("count")
        .or_else(|| metrics.get("data_points"))
        .copied()?;
    let count = fmt_number(count);
    Some(match (language, range) {
        (Language::En, Some(range)) => {
            format!("{count} {display} readings recorded for {range}.")
        }
        (Language::En, None) => format!("{count} {display} readings recorded."),
        (Language::Fa, Some(range)) => {
            format!("برای {range} {count} قرائت {display} ثبت شده است.")
        }
        (Language::Fa, None) => format!("{count} قرائت {display} ثبت شده است."),
    })
}

fn aggregate_text(
    aggregation: Aggregation,
    metrics: &BTreeMap<String, f64>,
    display: &str,
    unit: Option<&str>,
    range: Option<&str>,
    language: Language,
) -> Option<String> {
    let value = metrics.get(aggregation.metric_key()).copied()?;
    let value = render_value(value, unit);
    let label = aggregation_label(aggregation, language);

    let mut details: Vec<String> = Vec::new();
    match aggregation {
        Aggregation::Average => {
            if let Some(&min) = metrics.get("min") {
                details.push(match language {
                    Language::En => format!("min {}", render_value(min, unit)),
                    Language::Fa => format!("کمینه {}", render_value(min, unit)),
                });
            }
            if let Some(&max) = metrics.get("max") {
                details.push(match language {
                    Language::En => format!("max {}", render_value(max, unit)),
                    Language::Fa => format!("بیشینه {}", render_value(max, unit)),
                });
            }
        }
        Aggregation::Stddev => {
            if let Some(&mean) = metrics.get("average") {
                details.push(match language {
                    Language::En => format!("mean {}", render_value(mean, unit)),
                    Language::Fa => format!("میانگین {}", render_value(mean, unit)),
                });
            }
        }
        _ => {}
    }
    if let Some(&points) = metrics.get("data_points") {
        if points > 0.0 {
            details.push(match language {
                Language::En => format!("{} readings", fmt_number(points)),
                Language::Fa => format!("{} قرائت", fmt_number(points)),
            });
        }
    }

    let mut text = match (language, range) {
        (Language::En, Some(range)) => format!("{label} {display} for {range}: {value}"),
        (Language::En, None) => format!("{label} {display}: {value}"),
        (Language::Fa, Some(range)) => {
            format!("{label} {display} برای {range} برابر {value} است")
        }
        (Language::Fa, None) => format!("{label} {display} برابر {value} است"),
    };
    if !details.is_empty() {
        let joined = details.join(match language {
            Language::En => ", ",
            Language::Fa => "، ",
        });
        text.push_str(&format!(" ({joined})"));
    }
    text.push('.');
    Some(text)
}

fn no_data_text(display: &str, language: Language) -> String {
    match language {
        Language::En => format!("No {display} readings were found for the requested period."),
        Language::Fa => format!("داده‌ای برای {display} در بازه درخواستی ثبت نشده است."),
    }
}

fn aggregation_label(aggregation: Aggregation, language: Language) -> &'static str {
    match (aggregation, language) {
        (Aggregation::Average, Language::En) => "Average",
        (Aggregation::Average, Language::Fa) => "میانگین",
        (Aggregation::Min, Language::En) => "Minimum",
        (Aggregation::Min, Language::Fa) => "کمترین",
        (Aggregation::Max, Language::En) => "Maximum",
        (Aggregation::Max, Language::Fa) => "بیشترین",
        (Aggregation::Sum, Language::En) => "Total",
        (Aggregation::Sum, Language::Fa) => "مجموع",
        (Aggregation::Count, Language::En) => "Reading count of",
        (Aggregation::Count, Language::Fa) => "تعداد قرائت‌های",
        (Aggregation::Stddev, Language::En) => "Standard deviation of",
        (Aggregation::Stddev, Language::Fa) => "انحراف معیار",
        (Aggregation::None, Language::En) => "Current",
        (Aggregation::None, Language::Fa) => "مقدار فعلی",
    }
}

fn trend_word(trend: Trend, language: Language) -> &'static str {
    match (trend, language) {
        (Trend::Increasing, Language::En) => "increasing",
        (Trend::Increasing, Language::Fa) => "افزایشی",
        (Trend::Decreasing, Language::En) => "decreasing",
        (Trend::Decreasing, Language::Fa) => "کاهشی",
        (Trend::Stable, Language::En) => "stable",
        (Trend::Stable, Language::Fa) => "ثابت",
    }
}

pub(crate) fn render_value(value: f64, unit: Option<&str>) -> String {
    match unit {
        Some(unit) => format!("{} {unit}", fmt_number(value)),
        None => fmt_number(value),
    }
}

/// Two decimals, trailing zeros trimmed.
fn fmt_number(value: f64) -> String {
    let rendered = format!("{value:.2}");
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" || trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn fmt_signed(value: f64) -> String {
    let rendered = fmt_number(value);
    if value > 0.0 && rendered != "0" {
        format!("+{rendered}")
    } else {
        rendered
    }
}
