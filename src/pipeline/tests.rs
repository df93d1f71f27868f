//! Tests for pipeline module

use super::*;
use crate::error::Error;
use crate::output::json_to_arrow;
use crate::schema::{catalog_schema, event_schema};
use crate::types::{LevelPolicy, RecordSet, TimestampPolicy};
use arrow::array::{Array, AsArray, StringArray};
use arrow::datatypes::{DataType, Int32Type, TimeUnit, TimestampMillisecondType};
use chrono::{FixedOffset, Offset, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

fn catalog(records: Vec<Value>) -> RecordSet {
    json_to_arrow(&records, &catalog_schema()).unwrap()
}

fn events(records: Vec<Value>) -> RecordSet {
    json_to_arrow(&records, &event_schema()).unwrap()
}

fn song(song_id: &str, title: &str, artist_id: &str) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": 35.14968,
        "artist_longitude": -90.04892,
        "artist_location": "Memphis, TN",
        "artist_name": "Artist",
        "song_id": song_id,
        "title": title,
        "duration": 200.5,
        "year": 2004
    })
}

fn play(user_id: &str, level: &str, song: &str, ts: i64) -> Value {
    json!({
        "artist": "Artist",
        "auth": "Logged In",
        "firstName": "Lily",
        "gender": "F",
        "itemInSession": 0,
        "lastName": "Koch",
        "length": 200.5,
        "level": level,
        "location": "Chicago-Naperville-Elgin, IL-IN-WI",
        "method": "PUT",
        "page": "NextSong",
        "registration": 1_540_000_000_000.0,
        "sessionId": 818,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0",
        "userId": user_id
    })
}

fn strings(batch: &RecordSet, name: &str) -> Vec<Option<String>> {
    batch
        .column_by_name(name)
        .unwrap()
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(String::from))
        .collect()
}

fn ints(batch: &RecordSet, name: &str) -> Vec<i32> {
    batch
        .column_by_name(name)
        .unwrap()
        .as_primitive::<Int32Type>()
        .values()
        .to_vec()
}

fn column_names(batch: &RecordSet) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

fn utc() -> FixedOffset {
    Utc.fix()
}

// ============================================================================
// Timestamp Decomposition Tests
// ============================================================================

#[test]
fn test_decompose_reference_ts() {
    let parts = decompose_ts(1_541_121_934_796, &utc()).unwrap();
    assert_eq!(parts.year, 2018);
    assert_eq!(parts.month, 11);
    assert_eq!(parts.day, 2);
    assert_eq!(parts.hour, 1);
    assert_eq!(parts.week, 44);
    assert_eq!(parts.weekday, 4);
    assert_eq!(parts.start_time, 1_541_121_934_796);
}

#[test]
fn test_decompose_with_offset() {
    let offset = FixedOffset::west_opt(4 * 3600).unwrap();
    let parts = decompose_ts(1_541_121_934_796, &offset).unwrap();
    assert_eq!(parts.day, 1);
    assert_eq!(parts.hour, 21);
    assert_eq!(parts.weekday, 3);
    assert_eq!(parts.start_time, 1_541_121_934_796 - 4 * 3_600_000);
}

#[test_case(0, 1970, 1, 1, 0, 1, 3 ; "epoch")]
#[test_case(1_546_300_799_999, 2018, 12, 31, 23, 1, 0 ; "last millisecond of 2018")]
#[test_case(1_546_300_800_000, 2019, 1, 1, 0, 1, 1 ; "first millisecond of 2019")]
#[test_case(1_609_459_200_000, 2021, 1, 1, 0, 53, 4 ; "iso week of previous year")]
#[test_case(1_582_934_400_000, 2020, 2, 29, 0, 9, 5 ; "leap day")]
fn test_decompose_calendar(
    ts: i64,
    year: i32,
    month: i32,
    day: i32,
    hour: i32,
    week: i32,
    weekday: i32,
) {
    let parts = decompose_ts(ts, &utc()).unwrap();
    assert_eq!(
        (parts.year, parts.month, parts.day, parts.hour, parts.week, parts.weekday),
        (year, month, day, hour, week, weekday)
    );
}

#[test]
fn test_decompose_rejects_negative_and_huge() {
    assert!(decompose_ts(-1, &utc()).is_err());
    assert!(decompose_ts(i64::MAX, &utc()).is_err());
}

// ============================================================================
// Catalog Tests
// ============================================================================

#[test]
fn test_catalog_tables_project_every_row() {
    let batch = catalog(vec![
        song("SOA", "Alpha", "ARA"),
        song("SOB", "Beta", "ARA"),
        song("SOA", "Alpha", "ARA"),
    ]);

    let tables = build_catalog_tables(&batch).unwrap();
    assert_eq!(tables.songs.num_rows(), 3);
    assert_eq!(tables.artists.num_rows(), 3);
    assert_eq!(
        column_names(&tables.songs),
        vec!["song_id", "title", "artist_id", "year", "duration"]
    );
    assert_eq!(
        column_names(&tables.artists),
        vec![
            "artist_id",
            "artist_name",
            "artist_location",
            "artist_latitude",
            "artist_longitude"
        ]
    );
    assert_eq!(
        strings(&tables.songs, "song_id"),
        vec![
            Some("SOA".to_string()),
            Some("SOB".to_string()),
            Some("SOA".to_string())
        ]
    );
}

#[test]
fn test_catalog_tables_empty() {
    let tables = build_catalog_tables(&catalog(vec![])).unwrap();
    assert_eq!(tables.songs.num_rows(), 0);
    assert_eq!(tables.artists.num_rows(), 0);
}

#[test]
fn test_project_missing_column() {
    let batch = events(vec![]);
    let err = project(&batch, &["song_id"]).unwrap_err();
    assert!(matches!(err, Error::MissingColumn { .. }));
}

// ============================================================================
// Join Tests
// ============================================================================

#[test]
fn test_inner_join_indices_duplicates_and_nulls() {
    let left = StringArray::from(vec![Some("a"), Some("b"), Some("a"), None]);
    let right = StringArray::from(vec![Some("a"), None, Some("c"), Some("b")]);

    let (l, r) = inner_join_indices(&left, &right);
    assert_eq!(l.values().to_vec(), vec![0, 2, 1]);
    assert_eq!(r.values().to_vec(), vec![0, 0, 3]);
}

// ============================================================================
// Event Tests
// ============================================================================

#[test]
fn test_filter_plays_only_next_song() {
    let mut home = play("8", "free", "Alpha", 1);
    home["page"] = json!("Home");
    let mut no_page = play("8", "free", "Alpha", 2);
    no_page.as_object_mut().unwrap().remove("page");

    let batch = events(vec![play("8", "free", "Alpha", 3), home, no_page]);
    let plays = filter_plays(&batch).unwrap();
    assert_eq!(plays.num_rows(), 1);
}

#[test]
fn test_event_tables_reference_scenario() {
    let catalog = catalog(vec![song("SOA", "Alpha", "ARA")]);
    let mut home = play("39", "free", "Alpha", 1_541_121_934_796);
    home["page"] = json!("Home");
    let events = events(vec![play("39", "free", "Alpha", 1_541_121_934_796), home]);

    let tables = build_event_tables(&events, &catalog, &EventOptions::default()).unwrap();

    assert_eq!(tables.plays, 1);
    assert_eq!(tables.users.num_rows(), 1);
    assert_eq!(tables.time.num_rows(), 1);
    assert_eq!(tables.songplays.num_rows(), 1);
    assert_eq!(tables.unmatched_plays, 0);

    assert_eq!(
        column_names(&tables.users),
        vec!["userId", "firstName", "lastName", "gender", "level"]
    );
    assert_eq!(
        column_names(&tables.time),
        vec!["start_time", "hour", "day", "week", "month", "year", "weekday"]
    );
    assert_eq!(
        column_names(&tables.songplays),
        vec![
            "start_time",
            "userId",
            "level",
            "song_id",
            "artist_id",
            "sessionId",
            "location",
            "userAgent",
            "year",
            "month"
        ]
    );

    assert_eq!(ints(&tables.time, "year"), vec![2018]);
    assert_eq!(ints(&tables.time, "month"), vec![11]);
    assert_eq!(ints(&tables.time, "day"), vec![2]);
    assert_eq!(ints(&tables.time, "hour"), vec![1]);
    assert_eq!(ints(&tables.time, "week"), vec![44]);
    assert_eq!(ints(&tables.time, "weekday"), vec![4]);

    let start_time = tables.time.column_by_name("start_time").unwrap();
    assert_eq!(
        start_time.data_type(),
        &DataType::Timestamp(TimeUnit::Millisecond, None)
    );
    assert_eq!(
        start_time
            .as_primitive::<TimestampMillisecondType>()
            .value(0),
        1_541_121_934_796
    );

    assert_eq!(strings(&tables.songplays, "song_id"), vec![Some("SOA".to_string())]);
    assert_eq!(strings(&tables.songplays, "artist_id"), vec![Some("ARA".to_string())]);
    assert_eq!(strings(&tables.songplays, "userId"), vec![Some("39".to_string())]);
}

#[test]
fn test_event_tables_utc_offset() {
    let options = EventOptions::new(LevelPolicy::KeepAll, TimestampPolicy::Fail, -240).unwrap();
    let events = events(vec![play("39", "free", "Alpha", 1_541_121_934_796)]);

    let tables = build_event_tables(&events, &catalog(vec![]), &options).unwrap();
    assert_eq!(ints(&tables.time, "day"), vec![1]);
    assert_eq!(ints(&tables.time, "hour"), vec![21]);
}

#[test]
fn test_event_options_rejects_bad_offset() {
    assert!(EventOptions::new(LevelPolicy::KeepAll, TimestampPolicy::Fail, 24 * 60).is_err());
}

#[test]
fn test_unknown_song_contributes_no_songplay() {
    let catalog = catalog(vec![song("SOA", "Alpha", "ARA")]);
    let events = events(vec![
        play("8", "free", "Alpha", 1_541_121_934_796),
        play("8", "free", "Unknown Song", 1_541_121_999_000),
    ]);

    let tables = build_event_tables(&events, &catalog, &EventOptions::default()).unwrap();
    assert_eq!(tables.songplays.num_rows(), 1);
    assert_eq!(tables.unmatched_plays, 1);
    assert_eq!(tables.users.num_rows(), 2);
    assert_eq!(tables.time.num_rows(), 2);
}

#[test]
fn test_duplicate_titles_yield_one_row_per_pair() {
    let catalog = catalog(vec![song("SOA", "Alpha", "ARA"), song("SOB", "Alpha", "ARB")]);
    let events = events(vec![play("8", "free", "Alpha", 1_541_121_934_796)]);

    let tables = build_event_tables(&events, &catalog, &EventOptions::default()).unwrap();
    assert_eq!(
        strings(&tables.songplays, "song_id"),
        vec![Some("SOA".to_string()), Some("SOB".to_string())]
    );
    assert_eq!(tables.unmatched_plays, 0);
}

#[test]
fn test_every_songplay_matches_a_catalog_record() {
    let catalog = catalog(vec![
        song("SOA", "Alpha", "ARA"),
        song("SOB", "Beta", "ARB"),
        song("SOC", "Gamma", "ARC"),
    ]);
    let events = events(vec![
        play("1", "free", "Beta", 1_541_121_934_796),
        play("2", "paid", "Delta", 1_541_121_934_797),
        play("3", "free", "Alpha", 1_541_121_934_798),
        play("4", "paid", "Beta", 1_541_121_934_799),
    ]);

    let tables = build_event_tables(&events, &catalog, &EventOptions::default()).unwrap();
    let pairs: Vec<(String, String)> = strings(&tables.songplays, "song_id")
        .into_iter()
        .zip(strings(&tables.songplays, "artist_id"))
        .map(|(s, a)| (s.unwrap(), a.unwrap()))
        .collect();

    assert_eq!(
        pairs,
        vec![
            ("SOB".to_string(), "ARB".to_string()),
            ("SOA".to_string(), "ARA".to_string()),
            ("SOB".to_string(), "ARB".to_string()),
        ]
    );
    assert_eq!(tables.unmatched_plays, 1);
}

#[test]
fn test_empty_events() {
    let catalog = catalog(vec![song("SOA", "Alpha", "ARA")]);
    let tables = build_event_tables(&events(vec![]), &catalog, &EventOptions::default()).unwrap();

    assert_eq!(tables.users.num_rows(), 0);
    assert_eq!(tables.time.num_rows(), 0);
    assert_eq!(tables.songplays.num_rows(), 0);
    assert_eq!(tables.songplays.num_columns(), 10);
}

#[test]
fn test_null_ts_fails_by_default() {
    let mut bad = play("8", "free", "Alpha", 0);
    bad["ts"] = Value::Null;
    let events = events(vec![play("8", "free", "Alpha", 1_541_121_934_796), bad]);

    let err = build_event_tables(&events, &catalog(vec![]), &EventOptions::default()).unwrap_err();
    match err {
        Error::TimestampDecode { row, ts, .. } => {
            assert_eq!(row, 1);
            assert_eq!(ts, "null");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_negative_ts_fails_by_default() {
    let events = events(vec![play("8", "free", "Alpha", -5)]);
    let err = build_event_tables(&events, &catalog(vec![]), &EventOptions::default()).unwrap_err();
    assert!(err.to_string().contains("-5"));
}

#[test]
fn test_bad_ts_skipped_everywhere() {
    let catalog = catalog(vec![song("SOA", "Alpha", "ARA")]);
    let events = events(vec![
        play("8", "free", "Alpha", 1_541_121_934_796),
        play("9", "paid", "Alpha", -5),
    ]);
    let options = EventOptions::new(LevelPolicy::KeepAll, TimestampPolicy::Skip, 0).unwrap();

    let tables = build_event_tables(&events, &catalog, &options).unwrap();
    assert_eq!(tables.skipped_timestamps, 1);
    assert_eq!(tables.plays, 1);
    assert_eq!(tables.users.num_rows(), 1);
    assert_eq!(tables.time.num_rows(), 1);
    assert_eq!(tables.songplays.num_rows(), 1);
    assert_eq!(strings(&tables.users, "userId"), vec![Some("8".to_string())]);
}

// ============================================================================
// Level Policy Tests
// ============================================================================

#[test]
fn test_keep_all_levels() {
    let events = events(vec![
        play("8", "free", "Alpha", 1_000),
        play("8", "paid", "Alpha", 2_000),
    ]);

    let tables = build_event_tables(&events, &catalog(vec![]), &EventOptions::default()).unwrap();
    assert_eq!(
        strings(&tables.users, "level"),
        vec![Some("free".to_string()), Some("paid".to_string())]
    );
}

#[test]
fn test_latest_level_per_user() {
    let events = events(vec![
        play("8", "paid", "Alpha", 3_000),
        play("9", "free", "Alpha", 1_000),
        play("8", "free", "Alpha", 2_000),
        play("9", "paid", "Alpha", 1_000),
    ]);
    let options = EventOptions::new(LevelPolicy::Latest, TimestampPolicy::Fail, 0).unwrap();

    let tables = build_event_tables(&events, &catalog(vec![]), &options).unwrap();
    assert_eq!(
        strings(&tables.users, "userId"),
        vec![Some("8".to_string()), Some("9".to_string())]
    );
    assert_eq!(
        strings(&tables.users, "level"),
        vec![Some("paid".to_string()), Some("paid".to_string())]
    );
    assert_eq!(tables.time.num_rows(), 4);
}
