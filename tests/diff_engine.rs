use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};

use demowatch::domain::{
    diff, Change, ChangeKind, EventRecord, InvalidRecordPolicy, KeyedSnapshot, MarkerStyle,
};

fn event(date: &str, start: &str, topic: &str, route: Option<&str>) -> EventRecord {
    EventRecord {
        date: Some(date.to_string()),
        start_location: Some(start.to_string()),
        topic: Some(topic.to_string()),
        route_description: route.map(str::to_string),
        ..Default::default()
    }
}

fn now_2024() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn keyed(records: &[EventRecord]) -> KeyedSnapshot {
    KeyedSnapshot::build(records, now_2024(), InvalidRecordPolicy::Abort)
        .unwrap()
        .snapshot
}

fn kinds(changes: &[Change]) -> Vec<ChangeKind> {
    changes.iter().map(Change::kind).collect()
}

#[test]
fn route_change_yields_one_modified_record() {
    let old = keyed(&[event("01.01.2099", "A", "T", Some("R1"))]);
    let new = keyed(&[event("01.01.2099", "A", "T", Some("R2"))]);

    let result = diff(&old, &new, MarkerStyle::Glyph);

    assert_eq!(
        result.changes,
        vec![Change::Modified {
            date: "01.01.2099".into(),
            start_location: "A".into(),
            topic: "T".into(),
            postal_code: None,
            street_address: None,
            old_route: Some("R1".into()),
            new_route: Some("R2".into()),
        }]
    );
    assert_eq!(result.display.len(), 1);
}

#[test]
fn event_appearing_from_nothing_is_new() {
    let old = keyed(&[]);
    let new = keyed(&[event("01.01.2099", "B", "U", None)]);

    let result = diff(&old, &new, MarkerStyle::Glyph);

    assert_eq!(kinds(&result.changes), vec![ChangeKind::New]);
    assert_eq!(result.changes[0].headline(), ("01.01.2099", "B", "U"));
}

#[test]
fn past_events_never_show_up_as_deleted() {
    let old = keyed(&[event("01.01.2020", "C", "V", None)]);
    let new = keyed(&[]);

    assert!(diff(&old, &new, MarkerStyle::Glyph).is_empty());
}

#[test]
fn comparing_a_snapshot_with_itself_is_a_no_op() {
    let records = vec![
        event("01.01.2099", "A", "T", Some("R1")),
        event("02.01.2099", "B", "U", None),
        event("03.01.2099", "C", "V", Some("")),
    ];
    let s = keyed(&records);

    let result = diff(&s, &s, MarkerStyle::Plain);
    assert!(result.is_empty());
    assert!(result.display.is_empty());
}

#[test]
fn only_the_route_is_compared_for_existing_events() {
    let before = event("01.01.2099", "A", "T", Some("R1"));
    let mut after = before.clone();
    after.postal_code = Some("10115".into());
    after.street_address = Some("Invalidenstr. 1".into());
    after
        .extra
        .insert("lfdnr".into(), serde_json::json!(42));

    let result = diff(&keyed(&[before.clone()]), &keyed(&[after.clone()]), MarkerStyle::Glyph);
    assert!(result.is_empty());

    after.route_description = Some("R2".into());
    let result = diff(&keyed(&[before]), &keyed(&[after]), MarkerStyle::Glyph);
    assert_eq!(kinds(&result.changes), vec![ChangeKind::Modified]);
}

#[test]
fn missing_route_differs_from_empty_route() {
    let old = keyed(&[event("01.01.2099", "A", "T", None)]);
    let new = keyed(&[event("01.01.2099", "A", "T", Some(""))]);

    let result = diff(&old, &new, MarkerStyle::Glyph);
    match &result.changes[..] {
        [Change::Modified {
            old_route,
            new_route,
            ..
        }] => {
            assert_eq!(old_route, &None);
            assert_eq!(new_route.as_deref(), Some(""));
        }
        other => panic!("expected one Modified, got {other:?}"),
    }
}

#[test]
fn topic_change_is_a_deletion_plus_an_addition() {
    let old = keyed(&[event("01.01.2099", "A", "Old topic", Some("R"))]);
    let new = keyed(&[event("01.01.2099", "A", "New topic", Some("R"))]);

    let result = diff(&old, &new, MarkerStyle::Glyph);
    assert_eq!(kinds(&result.changes), vec![ChangeKind::New, ChangeKind::Deleted]);
}

#[test]
fn output_is_new_then_modified_then_deleted() {
    let old = keyed(&[
        event("01.01.2099", "gone-1", "T", None),
        event("02.01.2099", "mod-1", "T", Some("a")),
        event("03.01.2099", "mod-2", "T", Some("b")),
        event("04.01.2099", "gone-2", "T", None),
    ]);
    let new = keyed(&[
        event("03.01.2099", "mod-2", "T", Some("b2")),
        event("05.01.2099", "new-1", "T", None),
        event("02.01.2099", "mod-1", "T", Some("a2")),
        event("06.01.2099", "new-2", "T", None),
    ]);

    let result = diff(&old, &new, MarkerStyle::Plain);
    let locations: Vec<&str> = result.changes.iter().map(|c| c.headline().1).collect();

    assert_eq!(
        locations,
        vec!["new-1", "new-2", "mod-2", "mod-1", "gone-1", "gone-2"]
    );
    assert!(result.display[0].starts_with("New "));
    assert!(result.display[2].starts_with("Modified "));
    assert!(result.display[4].starts_with("Deleted "));
}

#[test]
fn every_key_lands_in_exactly_one_class() {
    let old_records = vec![
        event("01.01.2099", "A", "T", Some("same")),
        event("02.01.2099", "B", "T", Some("before")),
        event("03.01.2099", "C", "T", None),
        event("01.01.2020", "P", "T", None),
    ];
    let new_records = vec![
        event("01.01.2099", "A", "T", Some("same")),
        event("02.01.2099", "B", "T", Some("after")),
        event("04.01.2099", "D", "T", None),
        event("02.01.2020", "Q", "T", None),
    ];
    let old = keyed(&old_records);
    let new = keyed(&new_records);

    let result = diff(&old, &new, MarkerStyle::Glyph);

    let changed: Vec<String> = result
        .changes
        .iter()
        .map(|c| {
            let (d, l, t) = c.headline();
            format!("{d}_{l}_{t}")
        })
        .collect();
    let changed_set: HashSet<&str> = changed.iter().map(String::as_str).collect();
    assert_eq!(changed.len(), changed_set.len(), "a key produced two changes");

    let all_keys: HashSet<&str> = old.keys().chain(new.keys()).collect();
    let unchanged: Vec<&str> = all_keys
        .iter()
        .copied()
        .filter(|k| !changed_set.contains(k))
        .collect();

    assert_eq!(unchanged, vec!["01.01.2099_A_T"]);
    assert_eq!(changed.len() + unchanged.len(), all_keys.len());
    assert_eq!(
        kinds(&result.changes),
        vec![ChangeKind::New, ChangeKind::Modified, ChangeKind::Deleted]
    );
}

#[test]
fn new_and_deleted_carry_their_own_side_of_the_record() {
    let mut gone = event("01.01.2099", "A", "T", Some("old route"));
    gone.postal_code = Some("10999".into());
    let mut fresh = event("02.01.2099", "B", "U", Some("new route"));
    fresh.street_address = Some("Oranienstr. 5".into());

    let result = diff(&keyed(&[gone]), &keyed(&[fresh]), MarkerStyle::Glyph);

    assert_eq!(
        result.changes,
        vec![
            Change::New {
                date: "02.01.2099".into(),
                start_location: "B".into(),
                topic: "U".into(),
                postal_code: None,
                street_address: Some("Oranienstr. 5".into()),
                route_description: Some("new route".into()),
            },
            Change::Deleted {
                date: "01.01.2099".into(),
                start_location: "A".into(),
                topic: "T".into(),
                postal_code: Some("10999".into()),
                street_address: None,
                route_description: Some("old route".into()),
            },
        ]
    );
}
