mod common;

use std::cell::{Cell, RefCell};
use std::time::Duration;

use common::*;
use vodsync_catalog::types::*;
use vodsync_db::*;
use vodsync_import::*;

/// A movie row that runs another connection's write while its own phase
/// is between the id-map read and the first insert.
struct ContendedRow {
    other: RefCell<Option<Connection>>,
    other_committed: Cell<Option<bool>>,
}

impl FeedRow for ContendedRow {
    const KIND: EntityKind = EntityKind::Movie;

    fn raw_native_id(&self) -> Option<&str> {
        Some("10")
    }

    fn fields(&self, _native_id: &str, _categories: &CategoryMap) -> EntityFields {
        if let Some(other) = self.other.borrow_mut().take() {
            let committed = std::thread::spawn(move || {
                other.busy_timeout(Duration::from_millis(50)).unwrap();
                upsert_feed(
                    &other,
                    "beta",
                    &[movie("1", "Other Movie", "5")],
                    &CategoryMap::default(),
                    ScanStart::from_millis(1_000),
                )
                .is_ok()
            })
            .join()
            .unwrap();
            self.other_committed.set(Some(committed));
        }
        EntityFields {
            name: "Held Movie".to_string(),
            category_name: UNCATEGORIZED_MOVIES.to_string(),
            ..Default::default()
        }
    }
}

#[test]
fn phase_holds_write_lock_from_its_first_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    let conn = open_database(&path).unwrap();
    upsert_provider(&conn, &xtream("acme")).unwrap();
    upsert_provider(&conn, &xtream("beta")).unwrap();

    let row = ContendedRow {
        other: RefCell::new(Some(open_database(&path).unwrap())),
        other_committed: Cell::new(None),
    };
    let stats = upsert_feed(
        &conn,
        "acme",
        std::slice::from_ref(&row),
        &CategoryMap::default(),
        ScanStart::from_millis(1_000),
    )
    .unwrap();

    assert_eq!(stats.created, 1);
    // The other writer could not get in while the phase was open.
    assert_eq!(row.other_committed.get(), Some(false));

    let retry = open_database(&path).unwrap();
    upsert_feed(
        &retry,
        "beta",
        &[movie("1", "Other Movie", "5")],
        &CategoryMap::default(),
        ScanStart::from_millis(1_000),
    )
    .unwrap();
    assert_eq!(count(&conn, "provider_movie_relations"), 2);
}

#[test]
fn providers_sync_concurrently_on_one_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    open_database(&path).unwrap();

    let handles: Vec<_> = ["acme", "beta", "gamma", "delta"]
        .into_iter()
        .map(|id| {
            let path = path.clone();
            std::thread::spawn(move || {
                let conn = open_database(&path).unwrap();
                let feed = FakeClient {
                    vod_categories: vec![Category::new("5", "Action")],
                    movies: (0..50)
                        .map(|n| movie(&n.to_string(), &format!("{id} movie {n}"), "5"))
                        .collect(),
                    series: vec![series("20", "The Show", "5")],
                    ..Default::default()
                };
                sync_provider_at(
                    &conn,
                    &xtream(id),
                    &feed,
                    &SilentSink,
                    ScanStart::from_millis(1_000),
                )
                .unwrap()
            })
        })
        .collect();

    for handle in handles {
        let report = handle.join().unwrap();
        assert!(report.is_complete(), "{} ended {}", report.provider_id, report.outcome_label());
    }

    let conn = open_database(&path).unwrap();
    assert_eq!(count(&conn, "movies"), 200);
    assert_eq!(count(&conn, "provider_series_relations"), 4);
}
