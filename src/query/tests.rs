use super::*;

use chrono::TimeZone;
use proptest::prelude::*;

use crate::core::error::SqlGuardError;
use crate::core::types::{Aggregation, Grouping};
use crate::semantic::{SemanticDescriptor, TimeRangeSpec};
use crate::timerange::{TimeRangeToken, TimeUnit};

/// 2024-01-15 was a Monday, which keeps week bounds easy to read.
fn anchor() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}

fn descriptor(
    entity: &str,
    aggregation: Aggregation,
    time_range: TimeRangeSpec,
    grouping: Grouping,
) -> SemanticDescriptor {
    SemanticDescriptor {
        entity: entity.to_string(),
        aggregation,
        time_range,
        grouping,
    }
}

#[test]
fn latest_row_shape() {
    let stmt = compile_at(
        &descriptor(
            "temperature",
            Aggregation::None,
            TimeRangeSpec::None,
            Grouping::None,
        ),
        anchor(),
    )
    .unwrap();

    assert_eq!(
        stmt.sql,
        "SELECT timestamp, sensor_type, value, location, unit FROM sensor_data \
         WHERE sensor_type = ? ORDER BY timestamp DESC LIMIT 1"
    );
    assert_eq!(stmt.params, vec!["temperature".to_string()]);
}

#[test]
fn latest_row_within_bounded_window() {
    let stmt = compile_at(
        &descriptor(
            "temperature",
            Aggregation::None,
            TimeRangeSpec::Single(TimeRangeToken::Yesterday),
            Grouping::None,
        ),
        anchor(),
    )
    .unwrap();

    assert!(stmt.sql.contains("AND timestamp >= ? AND timestamp < ?"));
    assert!(stmt.sql.ends_with("ORDER BY timestamp DESC LIMIT 1"));
    assert_eq!(
        stmt.params,
        vec![
            "temperature".to_string(),
            "2024-01-14T00:00:00Z".to_string(),
            "2024-01-15T00:00:00Z".to_string(),
        ]
    );
}

#[test]
fn unbounded_aggregate_is_a_single_row() {
    let stmt = compile_at(
        &descriptor(
            "soil_moisture",
            Aggregation::Average,
            TimeRangeSpec::None,
            Grouping::None,
        ),
        anchor(),
    )
    .unwrap();

    assert_eq!(
        stmt.sql,
        "SELECT AVG(value) AS avg_value, MIN(value) AS min_value, \
         MAX(value) AS max_value, COUNT(value) AS data_points FROM sensor_data \
         WHERE sensor_type = ?"
    );
    assert_eq!(stmt.params, vec!["soil_moisture".to_string()]);
}

#[test]
fn bounded_aggregate_carries_week_bounds() {
    let stmt = compile_at(
        &descriptor(
            "humidity",
            Aggregation::Average,
            TimeRangeSpec::Single(TimeRangeToken::ThisWeek),
            Grouping::None,
        ),
        anchor(),
    )
    .unwrap();

    assert!(stmt.sql.contains("AVG(value) AS avg_value"));
    assert!(!stmt.sql.contains("GROUP BY"));
    assert_eq!(
        stmt.params,
        vec![
            "humidity".to_string(),
            "2024-01-15T00:00:00Z".to_string(),
            "2024-01-22T00:00:00Z".to_string(),
        ]
    );
}

#[test]
fn aggregate_projection_per_kind() {
    let range = || TimeRangeSpec::Single(TimeRangeToken::Today);
    let cases = [
        (Aggregation::Min, "MIN(value) AS min_value, COUNT(value) AS data_points"),
        (Aggregation::Max, "MAX(value) AS max_value, COUNT(value) AS data_points"),
        (Aggregation::Count, "COUNT(value) AS data_points"),
        (Aggregation::Sum, "SUM(value) AS value, COUNT(value) AS data_points"),
    ];
    for (aggregation, projection) in cases {
        let stmt = compile_at(
            &descriptor("water_usage", aggregation, range(), Grouping::None),
            anchor(),
        )
        .unwrap();
        assert!(
            stmt.sql.contains(projection),
            "{aggregation:?} missing {projection:?} in {}",
            stmt.sql
        );
    }
}

#[test]
fn stddev_compiles_to_a_raw_scan() {
    let stmt = compile_at(
        &descriptor(
            "temperature",
            Aggregation::Stddev,
            TimeRangeSpec::Single(TimeRangeToken::Relative {
                n: 7,
                unit: TimeUnit::Days,
            }),
            Grouping::None,
        ),
        anchor(),
    )
    .unwrap();

    assert!(stmt.sql.starts_with("SELECT timestamp, sensor_type, value"));
    assert!(stmt.sql.ends_with("ORDER BY timestamp ASC"));
    assert!(!stmt.sql.contains("AVG"));
}

#[test]
fn grouped_query_buckets_and_orders_chronologically() {
    let stmt = compile_at(
        &descriptor(
            "temperature",
            Aggregation::Average,
            TimeRangeSpec::Single(TimeRangeToken::Relative {
                n: 7,
                unit: TimeUnit::Days,
            }),
            Grouping::ByDay,
        ),
        anchor(),
    )
    .unwrap();

    assert!(stmt.sql.contains("DATE(timestamp) AS time_period"));
    assert!(stmt
        .sql
        .ends_with("GROUP BY time_period ORDER BY time_period ASC"));
    assert_eq!(stmt.params.len(), 3);
    // by_day never leaks another granularity's fragment
    assert!(!stmt.sql.contains("%H"));
    assert!(!stmt.sql.contains("%W"));
}

#[test]
fn bucket_fragment_per_grouping() {
    let compiled = |grouping| {
        compile_at(
            &descriptor(
                "humidity",
                Aggregation::Average,
                TimeRangeSpec::Single(TimeRangeToken::Today),
                grouping,
            ),
            anchor(),
        )
        .unwrap()
        .sql
    };

    assert!(compiled(Grouping::ByHour).contains("strftime('%Y-%m-%d %H:00', timestamp)"));
    assert!(compiled(Grouping::ByDay).contains("DATE(timestamp)"));
    assert!(compiled(Grouping::ByWeek).contains("strftime('%Y-%W', timestamp)"));
}

#[test]
fn comparison_unions_one_labeled_arm_per_period() {
    let stmt = compile_at(
        &descriptor(
            "soil_moisture",
            Aggregation::Average,
            TimeRangeSpec::Comparison(vec![TimeRangeToken::ThisWeek, TimeRangeToken::LastWeek]),
            Grouping::None,
        ),
        anchor(),
    )
    .unwrap();

    assert_eq!(stmt.sql.matches(" UNION ALL ").count(), 1);
    assert_eq!(stmt.sql.matches("? AS time_period").count(), 2);
    assert_eq!(
        stmt.params,
        vec![
            "this_week".to_string(),
            "soil_moisture".to_string(),
            "2024-01-15T00:00:00Z".to_string(),
            "2024-01-22T00:00:00Z".to_string(),
            "last_week".to_string(),
            "soil_moisture".to_string(),
            "2024-01-08T00:00:00Z".to_string(),
            "2024-01-15T00:00:00Z".to_string(),
        ]
    );
}

#[test]
fn comparison_labels_follow_declaration_order() {
    let stmt = compile_at(
        &descriptor(
            "temperature",
            Aggregation::Average,
            TimeRangeSpec::Comparison(vec![TimeRangeToken::Yesterday, TimeRangeToken::Today]),
            Grouping::None,
        ),
        anchor(),
    )
    .unwrap();

    assert_eq!(stmt.params[0], "yesterday");
    assert_eq!(stmt.params[4], "today");
}

#[test]
#[should_panic(expected = "invalid descriptor reached the compiler")]
fn invalid_descriptor_fails_loudly() {
    let bad = descriptor(
        "temperature",
        Aggregation::Average,
        TimeRangeSpec::Comparison(vec![TimeRangeToken::ThisWeek, TimeRangeToken::LastWeek]),
        // comparison may not carry a grouping
        Grouping::ByDay,
    );
    let _ = compile_at(&bad, anchor());
}

#[test]
fn every_compiled_shape_passes_the_guard() {
    let guard = SqlGuard::new();
    let shapes = vec![
        descriptor(
            "temperature",
            Aggregation::None,
            TimeRangeSpec::None,
            Grouping::None,
        ),
        descriptor(
            "humidity",
            Aggregation::Average,
            TimeRangeSpec::Single(TimeRangeToken::ThisWeek),
            Grouping::None,
        ),
        descriptor(
            "water_usage",
            Aggregation::Sum,
            TimeRangeSpec::Single(TimeRangeToken::Yesterday),
            Grouping::None,
        ),
        descriptor(
            "temperature",
            Aggregation::Stddev,
            TimeRangeSpec::Single(TimeRangeToken::Today),
            Grouping::None,
        ),
        descriptor(
            "temperature",
            Aggregation::Average,
            TimeRangeSpec::Single(TimeRangeToken::Relative {
                n: 24,
                unit: TimeUnit::Hours,
            }),
            Grouping::ByHour,
        ),
        descriptor(
            "soil_moisture",
            Aggregation::Average,
            TimeRangeSpec::Comparison(vec![TimeRangeToken::ThisWeek, TimeRangeToken::LastWeek]),
            Grouping::None,
        ),
    ];

    for d in shapes {
        let stmt = compile_at(&d, anchor()).unwrap();
        assert!(
            guard.validate(&stmt.sql).is_ok(),
            "guard rejected compiled sql: {}",
            stmt.sql
        );
        assert_eq!(stmt.placeholder_count(), stmt.params.len());
    }
}

#[test]
fn guard_tolerates_trailing_semicolon() {
    let guard = SqlGuard::new();
    assert!(guard.validate("SELECT value FROM sensor_data;").is_ok());
    assert!(guard.validate("SELECT value FROM sensor_data ;  ").is_ok());
}

#[test]
fn guard_rejects_multiple_statements() {
    let guard = SqlGuard::new();
    let err = guard
        .validate("SELECT value FROM sensor_data; DROP TABLE sensor_data")
        .unwrap_err();
    assert!(matches!(err, SqlGuardError::MultipleStatements));
}

#[test]
fn guard_rejects_non_select_head() {
    let guard = SqlGuard::new();
    let err = guard.validate("DROP TABLE sensor_data").unwrap_err();
    assert!(matches!(err, SqlGuardError::NotSelect));

    let err = guard
        .validate("UPDATE sensor_data SET value = 0")
        .unwrap_err();
    assert!(matches!(err, SqlGuardError::NotSelect));
}

#[test]
fn guard_rejects_foreign_tables_and_subqueries() {
    let guard = SqlGuard::new();

    let err = guard.validate("SELECT value FROM user_accounts").unwrap_err();
    assert!(matches!(err, SqlGuardError::ForbiddenTable { table } if table == "user_accounts"));

    let err = guard
        .validate("SELECT value FROM (SELECT value FROM sensor_data)")
        .unwrap_err();
    assert!(matches!(err, SqlGuardError::ForbiddenTable { table } if table == "subquery"));

    let err = guard.validate("SELECT 1").unwrap_err();
    assert!(matches!(err, SqlGuardError::ForbiddenTable { .. }));
}

#[test]
fn guard_denies_keywords_as_whole_tokens_only() {
    let guard = SqlGuard::new();

    let err = guard
        .validate("SELECT value FROM sensor_data WHERE exec")
        .unwrap_err();
    assert!(matches!(err, SqlGuardError::ForbiddenKeyword { keyword } if keyword == "EXEC"));

    // `updates` is a distinct token; it fails as a column, not a keyword
    let err = guard.validate("SELECT updates FROM sensor_data").unwrap_err();
    assert!(matches!(err, SqlGuardError::ForbiddenColumn { column } if column == "updates"));

    // quoted text is data, not a token
    assert!(guard
        .validate("SELECT value FROM sensor_data WHERE location = 'DROP'")
        .is_ok());
}

#[test]
fn guard_rejects_unlisted_columns() {
    let guard = SqlGuard::new();
    let err = guard
        .validate("SELECT password FROM sensor_data")
        .unwrap_err();
    assert!(matches!(err, SqlGuardError::ForbiddenColumn { column } if column == "password"));
}

#[test]
fn guard_accepts_lowercase_and_star() {
    let guard = SqlGuard::new();
    assert!(guard
        .validate("select * from sensor_data where sensor_type = ?")
        .is_ok());
}

#[test]
fn guard_checks_run_in_contract_order() {
    let guard = SqlGuard::new();

    // multi-statement beats the deny-listed verb inside it
    let err = guard
        .validate("SELECT value FROM sensor_data; PRAGMA journal_mode")
        .unwrap_err();
    assert!(matches!(err, SqlGuardError::MultipleStatements));

    // foreign table beats the deny-listed token further right
    let err = guard
        .validate("SELECT value FROM accounts WHERE exec")
        .unwrap_err();
    assert!(matches!(err, SqlGuardError::ForbiddenTable { .. }));
}

fn token_strategy() -> impl Strategy<Value = TimeRangeToken> {
    prop_oneof![
        (1u32..=1000, 0usize..3).prop_map(|(n, unit_idx)| TimeRangeToken::Relative {
            n,
            unit: [TimeUnit::Hours, TimeUnit::Days, TimeUnit::Weeks][unit_idx],
        }),
        Just(TimeRangeToken::Today),
        Just(TimeRangeToken::Yesterday),
        Just(TimeRangeToken::ThisWeek),
        Just(TimeRangeToken::LastWeek),
    ]
}

fn descriptor_strategy() -> impl Strategy<Value = SemanticDescriptor> {
    let entity = prop_oneof![
        Just("temperature".to_string()),
        Just("soil_moisture".to_string()),
        Just("humidity".to_string()),
        Just("water_usage".to_string()),
    ];
    let aggregation = prop_oneof![
        Just(Aggregation::Average),
        Just(Aggregation::Min),
        Just(Aggregation::Max),
        Just(Aggregation::Count),
        Just(Aggregation::Sum),
        Just(Aggregation::Stddev),
        Just(Aggregation::None),
    ];
    let grouping = prop_oneof![
        Just(Grouping::None),
        Just(Grouping::ByHour),
        Just(Grouping::ByDay),
        Just(Grouping::ByWeek),
    ];
    let time_range = prop_oneof![
        Just(TimeRangeSpec::None),
        token_strategy().prop_map(TimeRangeSpec::Single),
        proptest::collection::vec(token_strategy(), 2..4).prop_map(TimeRangeSpec::Comparison),
    ];

    (entity, aggregation, time_range, grouping).prop_map(
        |(entity, mut aggregation, time_range, mut grouping)| {
            // steer generated combinations inside the descriptor invariants
            if matches!(time_range, TimeRangeSpec::Comparison(_)) {
                grouping = Grouping::None;
                if aggregation == Aggregation::None {
                    aggregation = Aggregation::Average;
                }
            }
            if grouping != Grouping::None && aggregation == Aggregation::None {
                aggregation = Aggregation::Average;
            }
            SemanticDescriptor {
                entity,
                aggregation,
                time_range,
                grouping,
            }
        },
    )
}

proptest! {
    #[test]
    fn any_valid_descriptor_compiles_guard_clean(d in descriptor_strategy()) {
        let stmt = compile_at(&d, anchor()).unwrap();
        let guard = SqlGuard::new();
        prop_assert!(guard.validate(&stmt.sql).is_ok(), "rejected: {}", stmt.sql);
        prop_assert_eq!(stmt.placeholder_count(), stmt.params.len());
    }

    #[test]
    fn deny_listed_tokens_are_always_rejected(
        prefix in "[A-Za-z0-9 ]{0,40}",
        suffix in "[A-Za-z0-9 ]{0,40}",
        idx in 0usize..8,
    ) {
        let keyword = ["DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "ATTACH", "PRAGMA", "EXEC"][idx];
        let sql = format!("{prefix} {keyword} {suffix}");
        let guard = SqlGuard::new();
        prop_assert!(guard.validate(&sql).is_err());
    }
}
