use chrono::{NaiveDate, NaiveDateTime};

use demowatch::application::usecases::parse_feed;
use demowatch::application::AppError;
use demowatch::domain::{CoreError, EventRecord, InvalidRecordPolicy, KeyedSnapshot};

fn event(date: &str, start: &str, topic: &str, route: Option<&str>) -> EventRecord {
    EventRecord {
        date: Some(date.to_string()),
        start_location: Some(start.to_string()),
        topic: Some(topic.to_string()),
        route_description: route.map(str::to_string),
        ..Default::default()
    }
}

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

#[test]
fn key_joins_date_location_and_topic() {
    let e = event("01.05.2099", "Alexanderplatz", "Mieten runter", None);
    assert_eq!(e.make_key().unwrap(), "01.05.2099_Alexanderplatz_Mieten runter");
}

#[test]
fn key_is_stable_and_ignores_other_fields() {
    let a = event("01.05.2099", "A", "T", Some("R1"));
    let mut b = a.clone();
    b.postal_code = Some("10178".into());
    b.route_description = Some("R2".into());

    assert_eq!(a.make_key().unwrap(), a.make_key().unwrap());
    assert_eq!(a.make_key().unwrap(), b.make_key().unwrap());
}

#[test]
fn key_requires_all_identity_fields() {
    let mut e = event("01.05.2099", "A", "T", None);
    e.topic = None;
    assert_eq!(
        e.make_key(),
        Err(CoreError::MissingField { field: "topic" })
    );

    let mut e = event("01.05.2099", "A", "T", None);
    e.start_location = None;
    assert_eq!(
        e.make_key(),
        Err(CoreError::MissingField {
            field: "start_location"
        })
    );
}

#[test]
fn future_check_is_strictly_after_now() {
    let e = event("01.01.2099", "A", "T", None);

    // midnight of the event day is not "after"
    assert!(!e.is_future(at(2099, 1, 1, 0)).unwrap());
    assert!(!e.is_future(at(2099, 1, 1, 9)).unwrap());
    assert!(e.is_future(at(2098, 12, 31, 0)).unwrap());
    assert!(e.is_future(at(2098, 12, 31, 23)).unwrap());
}

#[test]
fn malformed_date_is_a_distinct_error() {
    let e = event("2099-01-01", "A", "T", None);
    assert!(matches!(
        e.is_future(at(2024, 1, 1, 0)),
        Err(CoreError::DateParse { ref value, .. }) if value == "2099-01-01"
    ));

    let mut e = event("01.01.2099", "A", "T", None);
    e.date = None;
    assert_eq!(
        e.is_future(at(2024, 1, 1, 0)),
        Err(CoreError::MissingField { field: "date" })
    );
}

#[test]
fn filtering_drops_past_events() {
    let records = vec![
        event("01.01.2020", "C", "V", None),
        event("02.01.2024", "A", "T", None),
    ];
    let out = KeyedSnapshot::build(&records, at(2024, 1, 1, 12), InvalidRecordPolicy::Abort).unwrap();

    assert_eq!(out.snapshot.keys().collect::<Vec<_>>(), vec!["02.01.2024_A_T"]);
    assert!(out.collisions.is_empty());
}

#[test]
fn collisions_keep_the_last_record_at_the_first_position() {
    let records = vec![
        event("01.01.2099", "A", "T", Some("first")),
        event("02.01.2099", "B", "U", None),
        event("01.01.2099", "A", "T", Some("second")),
    ];
    let out = KeyedSnapshot::build(&records, at(2024, 1, 1, 0), InvalidRecordPolicy::Abort).unwrap();

    assert_eq!(out.snapshot.len(), 2);
    assert_eq!(
        out.snapshot.keys().collect::<Vec<_>>(),
        vec!["01.01.2099_A_T", "02.01.2099_B_U"]
    );
    let kept = out.snapshot.get("01.01.2099_A_T").unwrap();
    assert_eq!(kept.record.route_description.as_deref(), Some("second"));
    assert_eq!(out.collisions, vec!["01.01.2099_A_T".to_string()]);
}

#[test]
fn collision_keeps_the_identity_of_the_winning_record() {
    // both join to "01.01.2099_X_Y_Z"
    let records = vec![
        event("01.01.2099", "X_Y", "Z", None),
        event("01.01.2099", "X", "Y_Z", None),
    ];
    let out = KeyedSnapshot::build(&records, at(2024, 1, 1, 0), InvalidRecordPolicy::Abort).unwrap();

    assert_eq!(out.collisions, vec!["01.01.2099_X_Y_Z".to_string()]);
    let kept = out.snapshot.get("01.01.2099_X_Y_Z").unwrap();
    assert_eq!(kept.identity.start_location, "X");
    assert_eq!(kept.identity.topic, "Y_Z");
    assert_eq!(kept.record.start_location.as_deref(), Some("X"));
}

#[test]
fn abort_policy_fails_on_first_invalid_record() {
    let mut broken = event("01.01.2099", "A", "T", None);
    broken.topic = None;
    let records = vec![event("02.01.2099", "B", "U", None), broken];

    let err = KeyedSnapshot::build(&records, at(2024, 1, 1, 0), InvalidRecordPolicy::Abort).unwrap_err();
    assert_eq!(err, CoreError::MissingField { field: "topic" });
}

#[test]
fn skip_policy_reports_and_drops_invalid_records() {
    let mut broken = event("01.01.2099", "A", "T", None);
    broken.topic = None;
    let records = vec![
        event("02.01.2099", "B", "U", None),
        broken,
        event("31.02.2099", "C", "V", None),
    ];

    let out = KeyedSnapshot::build(&records, at(2024, 1, 1, 0), InvalidRecordPolicy::Skip).unwrap();
    assert_eq!(out.snapshot.keys().collect::<Vec<_>>(), vec!["02.01.2099_B_U"]);
    assert_eq!(out.skipped.len(), 2);
    assert!(matches!(out.skipped[1], CoreError::DateParse { .. }));
}

#[test]
fn past_record_with_missing_topic_is_not_an_error() {
    let mut old = event("01.01.2020", "A", "T", None);
    old.topic = None;

    let out = KeyedSnapshot::build(&[old], at(2024, 1, 1, 0), InvalidRecordPolicy::Abort).unwrap();
    assert!(out.snapshot.is_empty());
}

#[test]
fn feed_records_use_the_upstream_field_names() {
    let payload = r#"{
        "index": [
            {
                "id": 17,
                "datum": "01.05.2099",
                "von": "Alexanderplatz",
                "thema": "Demo",
                "plz": 10178,
                "strasse_nr": "Alexanderplatz 1",
                "aufzugsstrecke": null
            },
            { "datum": "02.05.2099", "von": "B", "thema": "U", "aufzugsstrecke": "" }
        ]
    }"#;

    let records = parse_feed(payload.as_bytes(), "index", InvalidRecordPolicy::Abort)
        .unwrap()
        .records;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].postal_code.as_deref(), Some("10178"));
    assert_eq!(records[0].street_address.as_deref(), Some("Alexanderplatz 1"));
    assert_eq!(records[0].route_description, None);
    assert_eq!(records[0].extra.get("id"), Some(&serde_json::json!(17)));
    assert_eq!(records[1].route_description.as_deref(), Some(""));
}

#[test]
fn feed_without_envelope_key_is_rejected() {
    let err = parse_feed(br#"{"items": []}"#, "index", InvalidRecordPolicy::Skip).unwrap_err();
    assert!(matches!(err, AppError::InvalidFeed(_)));

    let err = parse_feed(b"not json", "index", InvalidRecordPolicy::Skip).unwrap_err();
    assert!(matches!(err, AppError::InvalidFeed(_)));

    let err = parse_feed(br#"{"index": {"datum": "01.05.2099"}}"#, "index", InvalidRecordPolicy::Skip)
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidFeed(_)));
}

#[test]
fn undecodable_feed_entries_follow_the_policy() {
    let payload = br#"{
        "index": [
            { "datum": "01.05.2099", "von": "A", "thema": "T" },
            { "datum": "02.05.2099", "von": "B", "thema": { "x": 1 } },
            "not a record",
            { "datum": "03.05.2099", "von": "C", "thema": "V" }
        ]
    }"#;

    let err = parse_feed(payload, "index", InvalidRecordPolicy::Abort).unwrap_err();
    assert!(matches!(
        err,
        AppError::Core(CoreError::MalformedRecord { index: 1, .. })
    ));

    let feed = parse_feed(payload, "index", InvalidRecordPolicy::Skip).unwrap();
    let topics: Vec<_> = feed.records.iter().map(|r| r.topic.as_deref()).collect();
    assert_eq!(topics, vec![Some("T"), Some("V")]);
    assert_eq!(feed.skipped.len(), 2);
    assert!(matches!(feed.skipped[1], CoreError::MalformedRecord { index: 2, .. }));
}
