use chrono::NaiveDate;
use cycletrack_core::{
    CycleStore, CycleValidationError, ErrorKind, NewCycle, RepoError, SqliteCycleStore,
    CYCLES_DEFAULT_LIMIT,
};
use std::sync::Arc;
use std::thread;

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

fn add(store: &SqliteCycleStore, start: &str, end: &str) -> i64 {
    store
        .add_cycle(&NewCycle::parse(start, end).unwrap())
        .unwrap()
}

#[test]
fn first_record_has_no_cycle_length() {
    let store = SqliteCycleStore::open_in_memory().unwrap();

    let id = add(&store, "2024-01-01", "2024-01-05");

    let cycles = store.get_cycles(None).unwrap();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].id, id);
    assert_eq!(cycles[0].cycle_length, None);
    assert_eq!(cycles[0].period_length, 5);
}

#[test]
fn successive_records_derive_lengths_from_previous_start() {
    let store = SqliteCycleStore::open_in_memory().unwrap();

    let a = add(&store, "2024-01-01", "2024-01-05");
    let b = add(&store, "2024-01-29", "2024-02-02");
    let c = add(&store, "2024-02-26", "2024-03-01");
    assert!(a < b && b < c);

    let cycles = store.get_cycles(None).unwrap();
    let summary: Vec<(i64, Option<i64>, i64)> = cycles
        .iter()
        .map(|cycle| (cycle.id, cycle.cycle_length, cycle.period_length))
        .collect();
    assert_eq!(
        summary,
        vec![(c, Some(28), 5), (b, Some(28), 5), (a, None, 5)]
    );
}

#[test]
fn previous_cycle_is_the_closest_earlier_start() {
    let store = SqliteCycleStore::open_in_memory().unwrap();
    let a = add(&store, "2024-01-01", "2024-01-05");
    let b = add(&store, "2024-01-29", "2024-02-02");

    let previous = store.get_previous_cycle(date("2024-02-26")).unwrap().unwrap();
    assert_eq!(previous.id, b);

    let previous = store.get_previous_cycle(date("2024-01-29")).unwrap().unwrap();
    assert_eq!(previous.id, a);

    assert!(store.get_previous_cycle(date("2024-01-01")).unwrap().is_none());
}

#[test]
fn inserted_cycle_length_matches_its_antecedent() {
    let store = SqliteCycleStore::open_in_memory().unwrap();
    add(&store, "2024-01-01", "2024-01-05");
    add(&store, "2024-01-31", "2024-02-03");
    let latest_id = add(&store, "2024-03-01", "2024-03-04");

    let latest = store
        .get_cycles(Some(1))
        .unwrap()
        .into_iter()
        .next()
        .unwrap();
    assert_eq!(latest.id, latest_id);

    let antecedent = store.get_previous_cycle(latest.start_date).unwrap().unwrap();
    assert_eq!(antecedent.start_date, date("2024-01-31"));
    assert_eq!(
        latest.cycle_length,
        Some((latest.start_date - antecedent.start_date).num_days())
    );
}

#[test]
fn backfilled_record_does_not_recompute_later_lengths() {
    let store = SqliteCycleStore::open_in_memory().unwrap();
    let later = add(&store, "2024-02-26", "2024-03-01");
    let backfilled = add(&store, "2024-01-29", "2024-02-02");

    let cycles = store.get_cycles(None).unwrap();
    let later_record = cycles.iter().find(|cycle| cycle.id == later).unwrap();
    let backfilled_record = cycles.iter().find(|cycle| cycle.id == backfilled).unwrap();

    assert_eq!(later_record.cycle_length, None);
    assert_eq!(backfilled_record.cycle_length, None);
}

#[test]
fn end_before_start_is_rejected_without_writing() {
    let store = SqliteCycleStore::open_in_memory().unwrap();
    add(&store, "2024-01-01", "2024-01-05");

    let invalid = NewCycle {
        end_date: date("2024-01-20"),
        ..NewCycle::parse("2024-01-29", "2024-02-02").unwrap()
    };
    let err = store.add_cycle(&invalid).unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(CycleValidationError::EndBeforeStart { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(store.count_cycles().unwrap(), 1);
}

#[test]
fn five_digit_years_are_rejected_without_writing() {
    let store = SqliteCycleStore::open_in_memory().unwrap();
    add(&store, "2024-01-01", "2024-01-05");

    let far_future = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
    let invalid = NewCycle {
        start_date: far_future,
        end_date: far_future + chrono::Duration::days(4),
        ..NewCycle::parse("2024-01-29", "2024-02-02").unwrap()
    };
    let err = store.add_cycle(&invalid).unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(CycleValidationError::DateOutOfRange {
            field: "start_date",
            ..
        })
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(store.count_cycles().unwrap(), 1);

    assert!(NewCycle::parse("+10000-01-01", "+10000-01-05").is_err());

    let latest = add(&store, "9999-12-01", "9999-12-05");
    let cycles = store.get_cycles(None).unwrap();
    assert_eq!(cycles[0].id, latest);
    assert_eq!(
        cycles[0].cycle_length,
        Some((date("9999-12-01") - date("2024-01-01")).num_days())
    );
}

#[test]
fn optional_fields_are_normalized_and_round_trip() {
    let store = SqliteCycleStore::open_in_memory().unwrap();
    let cycle = NewCycle::parse("2024-01-01", "2024-01-05")
        .unwrap()
        .with_symptoms(["Cramps", " Headache ", "Cramps", ""])
        .with_mood("Relaxed")
        .with_flow_level("Medium")
        .with_notes("   ");
    store.add_cycle(&cycle).unwrap();

    let stored = store.get_cycles(None).unwrap().remove(0);
    assert_eq!(stored.symptoms, vec!["Cramps", "Headache"]);
    assert_eq!(stored.mood.as_deref(), Some("Relaxed"));
    assert_eq!(stored.flow_level.as_deref(), Some("Medium"));
    assert_eq!(stored.notes, None);
    assert!(stored.created_at.date() >= date("2024-01-01"));
}

#[test]
fn symptoms_are_persisted_as_json_array_or_null() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("symptoms.sqlite3");
    let file_store = SqliteCycleStore::open(&path).unwrap();
    file_store
        .add_cycle(
            &NewCycle::parse("2024-01-01", "2024-01-05")
                .unwrap()
                .with_symptoms(["Cramps", "Bloating"]),
        )
        .unwrap();
    add(&file_store, "2024-01-29", "2024-02-02");
    file_store.close().unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    let raw: Vec<Option<String>> = conn
        .prepare("SELECT symptoms FROM cycles ORDER BY id;")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        raw,
        vec![Some(r#"["Cramps","Bloating"]"#.to_string()), None]
    );
}

#[test]
fn corrupt_symptoms_column_is_reported_as_invalid_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.sqlite3");
    let store = SqliteCycleStore::open(&path).unwrap();
    add(&store, "2024-01-01", "2024-01-05");
    store.close().unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("UPDATE cycles SET symptoms = 'Cramps, Bloating';", [])
        .unwrap();
    drop(conn);

    let store = SqliteCycleStore::open(&path).unwrap();
    let err = store.get_cycles(None).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[test]
fn get_cycles_honors_limit_and_default_cap() {
    let store = SqliteCycleStore::open_in_memory().unwrap();
    let first = date("2020-01-01");
    for offset in 0..(CYCLES_DEFAULT_LIMIT as i64 + 5) {
        let start = first + chrono::Duration::days(offset * 28);
        store
            .add_cycle(&NewCycle::new(start, start + chrono::Duration::days(4)).unwrap())
            .unwrap();
    }

    assert_eq!(
        store.get_cycles(None).unwrap().len(),
        CYCLES_DEFAULT_LIMIT as usize
    );
    assert_eq!(
        store.get_cycles(Some(0)).unwrap().len(),
        CYCLES_DEFAULT_LIMIT as usize
    );

    let recent = store.get_cycles(Some(3)).unwrap();
    assert_eq!(recent.len(), 3);
    assert!(recent
        .windows(2)
        .all(|pair| pair[0].start_date > pair[1].start_date));

    assert_eq!(
        store.get_cycles(Some(1000)).unwrap().len(),
        CYCLES_DEFAULT_LIMIT as usize + 5
    );
}

#[test]
fn stats_only_cover_records_with_cycle_length() {
    let store = SqliteCycleStore::open_in_memory().unwrap();

    let empty = store.get_cycle_stats().unwrap();
    assert_eq!(empty.total_cycles, 0);
    assert_eq!(empty.avg_cycle_length, None);
    assert_eq!(empty.first_record_date, None);

    add(&store, "2024-01-01", "2024-01-07");
    add(&store, "2024-01-29", "2024-02-02");
    add(&store, "2024-02-28", "2024-03-02");

    let stats = store.get_cycle_stats().unwrap();
    assert_eq!(store.count_cycles().unwrap(), 3);
    assert_eq!(stats.total_cycles, 2);
    assert_eq!(stats.avg_cycle_length, Some(29.0));
    assert_eq!(stats.avg_period_length, Some(4.5));
    assert_eq!(stats.first_record_date, Some(date("2024-01-29")));
    assert_eq!(stats.last_record_date, Some(date("2024-02-28")));
}

#[test]
fn store_can_be_shared_across_threads() {
    let store = Arc::new(SqliteCycleStore::open_in_memory().unwrap());
    add(&store, "2023-12-04", "2023-12-08");

    let handles: Vec<_> = (0..4)
        .map(|index| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let start = date("2024-01-01") + chrono::Duration::days(index * 30);
                store
                    .add_cycle(&NewCycle::new(start, start + chrono::Duration::days(3)).unwrap())
                    .unwrap()
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();

    assert_eq!(ids.len(), 4);
    assert_eq!(store.count_cycles().unwrap(), 5);
    for cycle in store.get_cycles(None).unwrap() {
        assert_eq!(cycle.period_length, (cycle.end_date - cycle.start_date).num_days() + 1);
    }
}
