//! Chart series assembly
//!
//! Only grouped and comparison results produce a series; everything
//! else answers with a number. The user may still steer the shape with
//! explicit chart vocabulary ("bar chart", "نمودار میله‌ای"), matched
//! against folded text the same way the ontology matches synonyms.

use serde::{Deserialize, Serialize};

use crate::core::types::{Aggregation, Grouping, Language};
use crate::ontology::normalize::fold_text;
use crate::ontology::Ontology;
use crate::semantic::SemanticDescriptor;
use crate::store::ReadingRow;

use super::narrative::range_phrase;
use super::primary_value;

/// Rendering hint for the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Histogram,
    Pie,
}

/// One labeled point: a bucket identifier or comparison period label
/// plus its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Chart-ready series with display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub chart_type: ChartType,
    pub title: String,
    pub y_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub points: Vec<ChartPoint>,
}

struct ChartVocabulary {
    chart_type: ChartType,
    persian: &'static [&'static str],
    english: &'static [&'static str],
}

/// Scanned in order; the specific shapes come before the generic trend
/// words so "bar chart" never reads as a plain line request. Persian
/// terms are listed in folded form (zero-width joiners removed).
const CHART_VOCABULARIES: &[ChartVocabulary] = &[
    ChartVocabulary {
        chart_type: ChartType::Bar,
        persian: &[
            "نمودار ستونی",
            "گراف ستونی",
            "نمودار میلهای",
            "گراف میلهای",
            "ستونی",
            "میلهای",
            "نسبت به",
            "در مقابل",
            "مقایسه",
        ],
        english: &[
            "bar chart",
            "bar graph",
            "column chart",
            "comparison chart",
            "side by side",
            "versus",
            "compare",
        ],
    },
    ChartVocabulary {
        chart_type: ChartType::Histogram,
        persian: &["هیستوگرام", "توزیع", "پراکندگی"],
        english: &["histogram", "distribution", "spread"],
    },
    ChartVocabulary {
        chart_type: ChartType::Pie,
        persian: &[
            "نمودار دایرهای",
            "گراف دایرهای",
            "دایرهای",
            "کیکی",
            "درصد",
            "سهم",
            "نسبت",
        ],
        english: &[
            "pie chart",
            "donut chart",
            "percentage",
            "proportion",
            "share of total",
        ],
    },
    ChartVocabulary {
        chart_type: ChartType::Line,
        persian: &["نمودار خطی", "روند", "نمودار", "گراف", "تغییرات", "نوسانات"],
        english: &[
            "line chart",
            "trend",
            "timeline",
            "over time",
            "chart",
            "graph",
            "fluctuations",
        ],
    },
];

/// Detect an explicit chart-type request in the query text, scanning
/// the detected language's vocabulary first.
pub fn detect_chart_request(text: &str, language: Language) -> Option<ChartType> {
    let folded = fold_text(text);
    for vocabulary in CHART_VOCABULARIES {
        let (first, second) = match language {
            Language::Fa => (vocabulary.persian, vocabulary.english),
            Language::En => (vocabulary.english, vocabulary.persian),
        };
        let matched = first
            .iter()
            .chain(second.iter())
            .any(|term| folded.contains(term));
        if matched {
            return Some(vocabulary.chart_type);
        }
    }
    None
}

/// Build the series for a grouped or comparison result. Point order
/// follows the rows: chronological buckets, or comparison periods in
/// declaration order. Rows without a usable value contribute no point.
pub fn chart_series(
    rows: &[ReadingRow],
    descriptor: &SemanticDescriptor,
    requested: Option<ChartType>,
    ontology: &Ontology,
    language: Language,
) -> Option<ChartSeries> {
    let comparison = descriptor.is_comparison();
    if descriptor.grouping == Grouping::None && !comparison {
        return None;
    }

    let points: Vec<ChartPoint> = rows
        .iter()
        .filter_map(|row| {
            let label = row.time_period.clone()?;
            let value = primary_value(row, descriptor.aggregation)?;
            Some(ChartPoint { label, value })
        })
        .collect();
    if points.is_empty() {
        return None;
    }

    let chart_type = requested.unwrap_or(if comparison {
        ChartType::Bar
    } else {
        ChartType::Line
    });

    let display = ontology
        .display_name(&descriptor.entity, language)
        .unwrap_or(&descriptor.entity)
        .to_string();
    let title = match range_phrase(&descriptor.time_range, language) {
        Some(phrase) => format!("{display} ({phrase})"),
        None => display.clone(),
    };
    let unit = match descriptor.aggregation {
        Aggregation::Count => None,
        _ => ontology.unit(&descriptor.entity).map(str::to_string),
    };

    Some(ChartSeries {
        chart_type,
        title,
        y_label: display,
        unit,
        points,
    })
}
