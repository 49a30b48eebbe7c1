use chrono::{NaiveDate, NaiveTime};

use availability_cell::models::{DayConfig, MacroPeriodUnit, PartOfDay, Selection};
use availability_cell::services::conflict::{conflict_dates, detect, ConflictDetector};
use shared_utils::test_utils::MockBackendResponses;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn units() -> Vec<MacroPeriodUnit> {
    vec![
        serde_json::from_value(MockBackendResponses::unit_response(1, "Unidade A", 2)).unwrap(),
        serde_json::from_value(MockBackendResponses::unit_response(2, "Unidade B", 1)).unwrap(),
        serde_json::from_value(MockBackendResponses::unit_response(3, "Unidade C", 1)).unwrap(),
    ]
}

fn pick(unit_id: i64, day: &str, part: PartOfDay) -> Selection {
    Selection::new(unit_id, date(day), DayConfig::of(part), None)
}

fn custom(unit_id: i64, day: &str, start: (u32, u32), end: (u32, u32)) -> Selection {
    Selection::new(
        unit_id,
        date(day),
        DayConfig::custom(
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        ),
        None,
    )
}

fn messages(selections: &[Selection]) -> Vec<String> {
    detect(&units(), selections).into_iter().map(|c| c.message).collect()
}

#[test]
fn test_no_selections_no_conflicts() {
    assert!(detect(&units(), &[]).is_empty());
}

#[test]
fn test_full_day_conflicts_with_morning_in_other_unit() {
    let selections = vec![
        pick(1, "2025-04-01", PartOfDay::FullDay),
        pick(1, "2025-04-02", PartOfDay::FullDay),
        pick(2, "2025-04-01", PartOfDay::Morning),
    ];

    let conflicts = detect(&units(), &selections);

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].date, date("2025-04-01"));
    assert_eq!(
        conflicts[0].message,
        "FULL_DAY in Unidade A conflicts with Morning in Unidade B"
    );
}

#[test]
fn test_full_day_is_exclusive_even_against_custom() {
    let selections = vec![
        pick(1, "2025-04-03", PartOfDay::FullDay),
        custom(2, "2025-04-03", (18, 0), (20, 0)),
    ];

    assert_eq!(
        messages(&selections),
        vec!["FULL_DAY in Unidade A conflicts with 18:00 - 20:00 in Unidade B".to_string()]
    );
}

#[test]
fn test_duplicate_full_day_across_units() {
    let selections = vec![
        pick(2, "2025-04-05", PartOfDay::FullDay),
        pick(1, "2025-04-05", PartOfDay::FullDay),
    ];

    assert_eq!(
        messages(&selections),
        vec!["Duplicate FULL_DAY across units: Unidade A, Unidade B".to_string()]
    );
}

#[test]
fn test_split_day_between_units_is_valid() {
    let selections = vec![
        pick(1, "2025-04-01", PartOfDay::Morning),
        pick(2, "2025-04-01", PartOfDay::Afternoon),
    ];

    assert!(messages(&selections).is_empty());
}

#[test]
fn test_exactly_one_duplicate_morning_for_three_units() {
    let selections = vec![
        pick(1, "2025-04-02", PartOfDay::Morning),
        pick(2, "2025-04-02", PartOfDay::Morning),
        pick(3, "2025-04-02", PartOfDay::Morning),
    ];

    let found = messages(&selections);

    assert_eq!(found.len(), 1);
    assert_eq!(found[0], "Duplicate Morning across units: Unidade A, Unidade B, Unidade C");
}

#[test]
fn test_duplicate_afternoon_reported_per_date() {
    let selections = vec![
        pick(1, "2025-04-02", PartOfDay::Afternoon),
        pick(2, "2025-04-02", PartOfDay::Afternoon),
        pick(1, "2025-04-04", PartOfDay::Afternoon),
        pick(3, "2025-04-04", PartOfDay::Afternoon),
    ];

    let conflicts = detect(&units(), &selections);
    let dates = conflict_dates(&conflicts);

    assert_eq!(conflicts.len(), 2);
    assert!(dates.contains(&date("2025-04-02")));
    assert!(dates.contains(&date("2025-04-04")));
}

#[test]
fn test_custom_ranges_are_not_compared() {
    let selections = vec![
        custom(1, "2025-04-06", (9, 0), (11, 0)),
        custom(2, "2025-04-06", (10, 0), (12, 0)),
        pick(3, "2025-04-06", PartOfDay::Morning),
    ];

    assert!(messages(&selections).is_empty());
}

#[test]
fn test_detection_is_idempotent() {
    let selections = vec![
        pick(1, "2025-04-01", PartOfDay::FullDay),
        pick(2, "2025-04-01", PartOfDay::Morning),
        pick(3, "2025-04-01", PartOfDay::Morning),
    ];
    let units = units();
    let detector = ConflictDetector::new(&units);

    let first = detector.detect(&selections);
    let second = detector.detect(&selections);

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn test_detection_is_order_independent() {
    let mut selections = vec![
        pick(3, "2025-04-02", PartOfDay::Morning),
        pick(1, "2025-04-01", PartOfDay::FullDay),
        pick(2, "2025-04-01", PartOfDay::Afternoon),
        pick(2, "2025-04-02", PartOfDay::Morning),
        pick(1, "2025-04-01", PartOfDay::Morning),
    ];
    let forward = detect(&units(), &selections);

    selections.reverse();
    let reversed = detect(&units(), &selections);

    selections.swap(0, 3);
    let shuffled = detect(&units(), &selections);

    assert_eq!(forward, reversed);
    assert_eq!(forward, shuffled);
    assert!(!forward.is_empty());
}

#[test]
fn test_unknown_unit_falls_back_to_id() {
    let selections = vec![
        pick(1, "2025-04-01", PartOfDay::FullDay),
        pick(99, "2025-04-01", PartOfDay::Afternoon),
    ];

    assert_eq!(
        messages(&selections),
        vec!["FULL_DAY in Unidade A conflicts with Afternoon in unit #99".to_string()]
    );
}
