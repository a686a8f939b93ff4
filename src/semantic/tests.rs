use super::*;

use std::sync::Arc;

use crate::core::config::{OntologyConfig, SemanticConfig};
use crate::core::types::{Intent, Language};
use crate::memory::ConversationTurn;
use crate::ontology::Ontology;
use crate::timerange::{TimeRangeToken, TimeUnit};

fn builder() -> DescriptorBuilder {
    let ontology = Arc::new(Ontology::from_builtin(OntologyConfig::default()).unwrap());
    DescriptorBuilder::new(ontology, SemanticConfig::default())
}

#[test]
fn bare_value_request_is_latest_reading() {
    let d = builder().build("what is the current temperature?", "dashboard", &[]).unwrap();
    assert_eq!(d.entity, "temperature");
    assert_eq!(d.aggregation, Aggregation::None);
    assert_eq!(d.time_range, TimeRangeSpec::None);
    assert_eq!(d.grouping, Grouping::None);
    assert!(!d.is_comparison());
}

#[test]
fn average_over_multi_day_range_groups_by_day() {
    let d = builder()
        .build("average soil moisture over the last 3 days", "dashboard", &[])
        .unwrap();
    assert_eq!(d.entity, "soil_moisture");
    assert_eq!(d.aggregation, Aggregation::Average);
    assert_eq!(
        d.time_range,
        TimeRangeSpec::Single(TimeRangeToken::Relative {
            n: 3,
            unit: TimeUnit::Days
        })
    );
    assert_eq!(d.grouping, Grouping::ByDay);
}

#[test]
fn sub_day_range_does_not_group() {
    let d = builder()
        .build("average humidity today", "dashboard", &[])
        .unwrap();
    assert_eq!(d.aggregation, Aggregation::Average);
    assert_eq!(d.time_range, TimeRangeSpec::Single(TimeRangeToken::Today));
    assert_eq!(d.grouping, Grouping::None);
}

#[test]
fn explicit_grouping_word_wins() {
    let d = builder()
        .build("hourly temperature for the last 2 days", "dashboard", &[])
        .unwrap();
    assert_eq!(d.grouping, Grouping::ByHour);
    // Grouped queries are always aggregates.
    assert_eq!(d.aggregation, Aggregation::Average);
}

#[test]
fn grouping_without_range_gets_a_default_window() {
    let d = builder().build("hourly temperature", "dashboard", &[]).unwrap();
    assert_eq!(d.grouping, Grouping::ByHour);
    assert_eq!(d.time_range, TimeRangeSpec::Single(TimeRangeToken::Today));

    let d = builder().build("daily water usage", "dashboard", &[]).unwrap();
    assert_eq!(d.grouping, Grouping::ByDay);
    assert_eq!(
        d.time_range,
        TimeRangeSpec::Single(TimeRangeToken::Relative {
            n: 7,
            unit: TimeUnit::Days
        })
    );
}

#[test]
fn trend_phrasing_implies_grouped_average() {
    let d = builder()
        .build("show me the temperature trend for the past week", "dashboard", &[])
        .unwrap();
    assert_eq!(d.aggregation, Aggregation::Average);
    assert_eq!(d.grouping, Grouping::ByDay);
}

#[test]
fn comparison_builds_ordered_period_list() {
    let d = builder()
        .build("compare average soil moisture this week vs last week", "irrigation", &[])
        .unwrap();
    assert_eq!(d.entity, "soil_moisture");
    assert_eq!(d.aggregation, Aggregation::Average);
    assert_eq!(
        d.time_range,
        TimeRangeSpec::Comparison(vec![TimeRangeToken::ThisWeek, TimeRangeToken::LastWeek])
    );
    assert_eq!(d.grouping, Grouping::None);
    assert!(d.is_comparison());
}

#[test]
fn comparison_defaults_to_average() {
    let d = builder()
        .build("مقایسه دمای امروز با دیروز", "environment", &[])
        .unwrap();
    assert_eq!(d.entity, "temperature");
    assert_eq!(d.aggregation, Aggregation::Average);
    assert_eq!(
        d.time_range,
        TimeRangeSpec::Comparison(vec![TimeRangeToken::Today, TimeRangeToken::Yesterday])
    );
}

#[test]
fn comparison_phrasing_without_two_periods_is_ambiguous() {
    let err = builder()
        .build("compare the temperature today", "dashboard", &[])
        .unwrap_err();
    assert!(matches!(err, SemanticError::ComparisonUnresolved));
}

#[test]
fn persian_query_resolves_without_translation() {
    let d = builder().build("دمای ۳ روز پیش", "dashboard", &[]).unwrap();
    assert_eq!(d.entity, "temperature");
    assert_eq!(
        d.time_range,
        TimeRangeSpec::Single(TimeRangeToken::Relative {
            n: 3,
            unit: TimeUnit::Days
        })
    );
}

#[test]
fn explicit_sensor_beats_feature_context() {
    // Pest context, but the text names temperature.
    let d = builder()
        .build("what is the temperature?", "pest", &[])
        .unwrap();
    assert_eq!(d.entity, "temperature");
}

#[test]
fn feature_context_supplies_default_entity() {
    let d = builder().build("how much was used today?", "irrigation", &[]).unwrap();
    assert_eq!(d.entity, "soil_moisture");

    let d = builder().build("what is the status?", "pest", &[]).unwrap();
    assert_eq!(d.entity, "pest_count");
}

#[test]
fn follow_up_inherits_entity_from_history() {
    let history = vec![ConversationTurn::new(
        "soil moisture today",
        Language::En,
        Intent::DataQuery,
    )
    .with_entity("soil_moisture")];

    let d = builder()
        .build("what about yesterday?", "dashboard", &history)
        .unwrap();
    assert_eq!(d.entity, "soil_moisture");
    assert_eq!(d.time_range, TimeRangeSpec::Single(TimeRangeToken::Yesterday));
}

#[test]
fn dashboard_without_entity_is_ambiguous() {
    let err = builder()
        .build("what is the status of everything?", "dashboard", &[])
        .unwrap_err();
    assert!(matches!(err, SemanticError::EntityUnresolved { .. }));
}

#[test]
fn aggregation_markers_resolve_bilingually() {
    let b = builder();
    let cases = [
        ("maximum temperature yesterday", Aggregation::Max),
        ("lowest humidity today", Aggregation::Min),
        ("total water usage this week", Aggregation::Sum),
        ("how many pests today", Aggregation::Count),
        ("میانگین رطوبت امروز", Aggregation::Average),
        ("بیشترین دمای دیروز", Aggregation::Max),
    ];
    for (text, expected) in cases {
        let d = b.build(text, "dashboard", &[]).unwrap();
        assert_eq!(d.aggregation, expected, "for {:?}", text);
    }
}

#[test]
fn validate_rejects_inconsistent_descriptors() {
    let d = SemanticDescriptor {
        entity: String::new(),
        aggregation: Aggregation::None,
        time_range: TimeRangeSpec::None,
        grouping: Grouping::None,
    };
    assert!(d.validate().is_err());

    let d = SemanticDescriptor {
        entity: "temperature".to_string(),
        aggregation: Aggregation::Average,
        time_range: TimeRangeSpec::Comparison(vec![TimeRangeToken::Today]),
        grouping: Grouping::None,
    };
    assert!(d.validate().is_err());

    let d = SemanticDescriptor {
        entity: "temperature".to_string(),
        aggregation: Aggregation::None,
        time_range: TimeRangeSpec::Single(TimeRangeToken::ThisWeek),
        grouping: Grouping::ByDay,
    };
    assert!(d.validate().is_err());

    let d = SemanticDescriptor {
        entity: "temperature".to_string(),
        aggregation: Aggregation::Average,
        time_range: TimeRangeSpec::Comparison(vec![
            TimeRangeToken::ThisWeek,
            TimeRangeToken::LastWeek,
        ]),
        grouping: Grouping::ByDay,
    };
    assert!(d.validate().is_err());
}

#[test]
fn descriptor_serializes_with_canonical_tokens() {
    let d = SemanticDescriptor {
        entity: "temperature".to_string(),
        aggregation: Aggregation::Average,
        time_range: TimeRangeSpec::Comparison(vec![
            TimeRangeToken::ThisWeek,
            TimeRangeToken::LastWeek,
        ]),
        grouping: Grouping::None,
    };
    let json = serde_json::to_value(&d).unwrap();
    assert_eq!(json["entity"], "temperature");
    assert_eq!(json["time_range"]["comparison"][0], "this_week");
    assert_eq!(json["time_range"]["comparison"][1], "last_week");

    let back: SemanticDescriptor = serde_json::from_value(json).unwrap();
    assert_eq!(back, d);
}
