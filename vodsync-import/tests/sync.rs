mod common;

use common::*;
use vodsync_catalog::types::*;
use vodsync_db::*;
use vodsync_import::*;

fn t(millis: i64) -> ScanStart {
    ScanStart::from_millis(millis)
}

fn action_feed() -> FakeClient {
    FakeClient {
        vod_categories: vec![Category::new("5", "Action")],
        movies: vec![movie("10", "A Movie (2001)", "5")],
        ..Default::default()
    }
}

#[test]
fn sync_creates_entity_and_relation_then_reaps_on_empty_feed() {
    let conn = open_memory().unwrap();
    let provider = xtream("acme");

    let report = sync_provider_at(&conn, &provider, &action_feed(), &SilentSink, t(1_000)).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.movies.created, 1);

    let entity = find_entity_by_unique_id(&conn, EntityKind::Movie, "movie:acme:10")
        .unwrap()
        .unwrap();
    assert_eq!(entity.name, "A Movie (2001)");
    assert_eq!(entity.year, Some(2001));
    assert_eq!(entity.category_name, "Action");

    let relation = find_relation(&conn, EntityKind::Movie, "acme", "10")
        .unwrap()
        .unwrap();
    assert_eq!(relation.entity_id, entity.id);
    assert_eq!(relation.container, "mp4");
    assert_eq!(relation.last_seen, 1_000);

    let empty = FakeClient {
        vod_categories: vec![Category::new("5", "Action")],
        ..Default::default()
    };
    let report = sync_provider_at(&conn, &provider, &empty, &SilentSink, t(2_000)).unwrap();
    assert_eq!(report.reaped.movie_relations, 1);
    assert_eq!(report.reaped.movies, 1);
    assert!(find_relation(&conn, EntityKind::Movie, "acme", "10").unwrap().is_none());
    assert!(get_entity(&conn, EntityKind::Movie, entity.id).unwrap().is_none());
}

#[test]
fn unchanged_feed_is_idempotent() {
    let conn = open_memory().unwrap();
    let provider = xtream("acme");
    let mut feed = action_feed();
    feed.series = vec![series("77", "The Show", "5")];

    sync_provider_at(&conn, &provider, &feed, &SilentSink, t(1_000)).unwrap();
    let first = find_entity_by_unique_id(&conn, EntityKind::Movie, "movie:acme:10")
        .unwrap()
        .unwrap();

    let report = sync_provider_at(&conn, &provider, &feed, &SilentSink, t(2_000)).unwrap();
    assert_eq!(report.movies.created, 0);
    assert_eq!(report.movies.updated, 0);
    assert_eq!(report.movies.unchanged, 1);
    assert_eq!(report.series.unchanged, 1);
    assert_eq!(report.reaped.relations(), 0);

    let second = find_entity_by_unique_id(&conn, EntityKind::Movie, "movie:acme:10")
        .unwrap()
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.name, first.name);
    assert_eq!(second.updated_at, first.updated_at);

    let stats = catalog_stats(&conn).unwrap();
    assert_eq!(stats.movies, 1);
    assert_eq!(stats.series, 1);
    assert_eq!(stats.movie_relations, 1);
}

#[test]
fn identity_survives_field_changes() {
    let conn = open_memory().unwrap();
    let provider = xtream("acme");

    sync_provider_at(&conn, &provider, &action_feed(), &SilentSink, t(1_000)).unwrap();
    let before = find_relation(&conn, EntityKind::Movie, "acme", "10")
        .unwrap()
        .unwrap();

    let mut renamed = action_feed();
    renamed.movies = vec![movie("10", "A Movie: Director's Cut (2002)", "5")];
    let report = sync_provider_at(&conn, &provider, &renamed, &SilentSink, t(2_000)).unwrap();
    assert_eq!(report.movies.updated, 1);
    assert_eq!(report.movies.created, 0);

    let entity = get_entity(&conn, EntityKind::Movie, before.entity_id)
        .unwrap()
        .unwrap();
    assert_eq!(entity.name, "A Movie: Director's Cut (2002)");
    assert_eq!(entity.year, Some(2002));
    assert_eq!(entity.provider_unique_id, "movie:acme:10");
}

#[test]
fn entity_referenced_elsewhere_survives_cleanup() {
    let conn = open_memory().unwrap();
    let acme = xtream("acme");
    sync_provider_at(&conn, &acme, &action_feed(), &SilentSink, t(1_000)).unwrap();
    let shared = find_relation(&conn, EntityKind::Movie, "acme", "10")
        .unwrap()
        .unwrap();

    upsert_provider(&conn, &xtream("beta")).unwrap();
    upsert_relation(
        &conn,
        EntityKind::Movie,
        &Relation {
            provider_id: "beta".to_string(),
            entity_id: shared.entity_id,
            native_id: "b-10".to_string(),
            container: "mkv".to_string(),
            last_seen: 1_000,
        },
    )
    .unwrap();

    let empty = FakeClient::default();
    let report = sync_provider_at(&conn, &acme, &empty, &SilentSink, t(2_000)).unwrap();
    assert_eq!(report.reaped.movie_relations, 1);
    assert_eq!(report.reaped.movies, 0);
    assert!(get_entity(&conn, EntityKind::Movie, shared.entity_id).unwrap().is_some());
    assert!(find_relation(&conn, EntityKind::Movie, "beta", "b-10").unwrap().is_some());
}

#[test]
fn series_category_name_wins_and_stored_names_are_kept() {
    let conn = open_memory().unwrap();
    let provider = xtream("acme");
    let mut feed = FakeClient {
        vod_categories: vec![Category::new("5", "Action")],
        series_categories: vec![Category::new("5", "Drama")],
        movies: vec![movie("10", "Heat", "5")],
        ..Default::default()
    };

    sync_provider_at(&conn, &provider, &feed, &SilentSink, t(1_000)).unwrap();
    let entity = find_entity_by_unique_id(&conn, EntityKind::Movie, "movie:acme:10")
        .unwrap()
        .unwrap();
    assert_eq!(entity.category_name, "Drama");
    assert_eq!(
        list_categories(&conn, "acme").unwrap(),
        vec![Category::new("5", "Drama")]
    );

    // The store keeps its first name; the run's merged map names entities.
    feed.series_categories = vec![Category::new("5", "Thriller")];
    sync_provider_at(&conn, &provider, &feed, &SilentSink, t(2_000)).unwrap();
    let entity = find_entity_by_unique_id(&conn, EntityKind::Movie, "movie:acme:10")
        .unwrap()
        .unwrap();
    assert_eq!(entity.category_name, "Thriller");
    assert_eq!(list_categories(&conn, "acme").unwrap()[0].name, "Drama");
}

#[test]
fn unknown_category_falls_back_to_generic_label() {
    let conn = open_memory().unwrap();
    let feed = FakeClient {
        movies: vec![movie("10", "Heat", "404")],
        series: vec![series("20", "The Show", "404")],
        ..Default::default()
    };

    sync_provider_at(&conn, &xtream("acme"), &feed, &SilentSink, t(1_000)).unwrap();
    let movie = find_entity_by_unique_id(&conn, EntityKind::Movie, "movie:acme:10")
        .unwrap()
        .unwrap();
    let show = find_entity_by_unique_id(&conn, EntityKind::Series, "series:acme:20")
        .unwrap()
        .unwrap();
    assert_eq!(movie.category_name, "Uncategorized Movies");
    assert_eq!(show.category_name, "Uncategorized Series");
}

#[test]
fn category_failure_aborts_before_any_entity_write() {
    let conn = open_memory().unwrap();
    let feed = action_feed().fail("get_series_categories");
    let sink = RecordingSink::default();

    let err = sync_provider_at(&conn, &xtream("acme"), &feed, &sink, t(1_000)).unwrap_err();
    assert!(matches!(err, SyncError::Categories(_)));
    assert_eq!(count(&conn, "movies"), 0);
    assert_eq!(count(&conn, "categories"), 0);
    assert_eq!(sink.errors().len(), 1);

    let logs = list_sync_logs(&conn, Some("acme"), 10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].outcome, "aborted");
}

#[test]
fn series_failure_does_not_block_movies_or_get_reaped() {
    let conn = open_memory().unwrap();
    let provider = xtream("acme");
    let mut feed = action_feed();
    feed.series = vec![series("20", "The Show", "5")];
    sync_provider_at(&conn, &provider, &feed, &SilentSink, t(1_000)).unwrap();

    let mut broken = action_feed().fail("get_series");
    broken.movies.push(movie("11", "Second Movie", "5"));
    let sink = RecordingSink::default();
    let report = sync_provider_at(&conn, &provider, &broken, &sink, t(2_000)).unwrap();

    assert!(report.movies_outcome.succeeded());
    assert!(matches!(report.series_outcome, PhaseOutcome::Failed(_)));
    assert!(report.cleanup_outcome.succeeded());
    assert!(!report.is_complete());
    assert_eq!(report.outcome_label(), "partial");
    assert_eq!(report.movies.created, 1);

    // The series relation still carries the old watermark but is kept.
    let kept = find_relation(&conn, EntityKind::Series, "acme", "20")
        .unwrap()
        .unwrap();
    assert_eq!(kept.last_seen, 1_000);
    assert!(get_entity(&conn, EntityKind::Series, kept.entity_id).unwrap().is_some());
    assert!(sink.errors().iter().any(|m| m.contains("series")));
}

#[test]
fn movie_failure_rolls_back_and_keeps_previous_movies() {
    let conn = open_memory().unwrap();
    let provider = xtream("acme");
    sync_provider_at(&conn, &provider, &action_feed(), &SilentSink, t(1_000)).unwrap();

    let broken = action_feed().fail("get_vod_streams");
    let report = sync_provider_at(&conn, &provider, &broken, &SilentSink, t(2_000)).unwrap();
    assert!(matches!(report.movies_outcome, PhaseOutcome::Failed(_)));
    assert_eq!(report.reaped.movie_relations, 0);
    assert_eq!(count(&conn, "movies"), 1);
    assert_eq!(count(&conn, "provider_movie_relations"), 1);
}

#[test]
fn store_error_mid_phase_rolls_back_only_that_phase() {
    let conn = open_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER one_movie_only BEFORE INSERT ON movies
         WHEN (SELECT COUNT(*) FROM movies) >= 1
         BEGIN SELECT RAISE(ABORT, 'movie table full'); END;",
    )
    .unwrap();

    let mut feed = action_feed();
    feed.movies.push(movie("11", "Second Movie", "5"));
    feed.series = vec![series("20", "The Show", "5")];
    let sink = RecordingSink::default();
    let report = sync_provider_at(&conn, &xtream("acme"), &feed, &sink, t(1_000)).unwrap();

    assert!(matches!(report.movies_outcome, PhaseOutcome::Failed(_)));
    assert!(report.series_outcome.succeeded());
    assert!(report.cleanup_outcome.succeeded());
    assert_eq!(report.outcome_label(), "partial");
    assert_eq!(count(&conn, "movies"), 0);
    assert_eq!(count(&conn, "provider_movie_relations"), 0);
    assert_eq!(count(&conn, "series"), 1);
    assert_eq!(count(&conn, "provider_series_relations"), 1);
    assert!(sink.errors().iter().any(|m| m.contains("movie table full")));
}

#[test]
fn cleanup_failure_keeps_committed_phases() {
    let conn = open_memory().unwrap();
    let provider = xtream("acme");
    let mut feed = action_feed();
    feed.movies.push(movie("11", "Second Movie", "5"));
    sync_provider_at(&conn, &provider, &feed, &SilentSink, t(1_000)).unwrap();

    conn.execute_batch(
        "CREATE TRIGGER keep_movie_relations BEFORE DELETE ON provider_movie_relations
         BEGIN SELECT RAISE(ABORT, 'relations are pinned'); END;",
    )
    .unwrap();

    let mut next = action_feed();
    next.series = vec![series("20", "The Show", "5")];
    let report = sync_provider_at(&conn, &provider, &next, &SilentSink, t(2_000)).unwrap();

    assert!(report.movies_outcome.succeeded());
    assert!(report.series_outcome.succeeded());
    assert!(matches!(report.cleanup_outcome, PhaseOutcome::Failed(_)));
    assert_eq!(report.reaped, ReapStats::default());
    assert_eq!(report.outcome_label(), "partial");

    let refreshed = find_relation(&conn, EntityKind::Movie, "acme", "10")
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.last_seen, 2_000);
    let stale = find_relation(&conn, EntityKind::Movie, "acme", "11")
        .unwrap()
        .unwrap();
    assert_eq!(stale.last_seen, 1_000);
    assert_eq!(count(&conn, "movies"), 2);
    assert_eq!(count(&conn, "series"), 1);

    let logs = list_sync_logs(&conn, Some("acme"), 10).unwrap();
    assert_eq!(logs[0].outcome, "partial");
}

#[test]
fn rows_without_native_id_are_skipped() {
    let conn = open_memory().unwrap();
    let mut feed = action_feed();
    feed.movies.push(vodsync_provider::MovieFeedRow {
        native_id: Some("   ".to_string()),
        name: Some("Blank id".to_string()),
        ..Default::default()
    });
    feed.movies.push(vodsync_provider::MovieFeedRow {
        name: Some("No id".to_string()),
        ..Default::default()
    });

    let report = sync_provider_at(&conn, &xtream("acme"), &feed, &SilentSink, t(1_000)).unwrap();
    assert_eq!(report.movies.created, 1);
    assert_eq!(report.movies.skipped, 2);
    assert_eq!(count(&conn, "movies"), 1);
    assert_eq!(count(&conn, "provider_movie_relations"), 1);
}

#[test]
fn duplicate_rows_in_one_feed_share_an_entity() {
    let conn = open_memory().unwrap();
    let mut feed = action_feed();
    feed.movies.push(movie("10", "A Movie (2001)", "5"));

    let report = sync_provider_at(&conn, &xtream("acme"), &feed, &SilentSink, t(1_000)).unwrap();
    assert_eq!(report.movies.created, 1);
    assert_eq!(report.movies.unchanged, 1);
    assert_eq!(count(&conn, "movies"), 1);
}

#[test]
fn missing_credentials_fail_before_any_fetch() {
    let conn = open_memory().unwrap();
    let mut provider = xtream("acme");
    provider.password = None;
    let feed = action_feed();

    let err = sync_provider_at(&conn, &provider, &feed, &SilentSink, t(1_000)).unwrap_err();
    assert!(matches!(err, SyncError::Credentials(_)));
    assert_eq!(feed.calls.get(), 0);
    assert!(get_provider(&conn, "acme").unwrap().is_none());
}

#[test]
fn playlist_provider_is_rejected_by_api_sync() {
    let conn = open_memory().unwrap();
    let err = sync_provider_at(&conn, &m3u("list"), &action_feed(), &SilentSink, t(1_000))
        .unwrap_err();
    assert!(matches!(err, SyncError::WrongKind { .. }));
}

#[test]
fn sync_log_records_the_run() {
    let conn = open_memory().unwrap();
    sync_provider_at(&conn, &xtream("acme"), &action_feed(), &SilentSink, t(1_000)).unwrap();

    let logs = list_sync_logs(&conn, Some("acme"), 10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].source, "api");
    assert_eq!(logs[0].outcome, "ok");
    assert_eq!(logs[0].started_at, 1_000);
    assert_eq!(logs[0].movies_created, 1);
}

#[test]
fn dropped_series_takes_its_episodes_along() {
    let conn = open_memory().unwrap();
    let provider = xtream("acme");
    let mut feed = action_feed();
    feed.series = vec![series("20", "The Show", "5")];
    feed.episodes.insert(
        "20".to_string(),
        vec![episode("201", "Pilot", 1, 1), episode("202", "Second", 1, 2)],
    );
    sync_provider_at(&conn, &provider, &feed, &SilentSink, t(1_000)).unwrap();
    refresh_series_episodes_at(&conn, "acme", "20", &feed, &SilentSink, t(1_500)).unwrap();
    assert_eq!(count(&conn, "provider_episode_relations"), 2);

    feed.series.clear();
    let report = sync_provider_at(&conn, &provider, &feed, &SilentSink, t(2_000)).unwrap();
    assert_eq!(report.reaped.series_relations, 1);
    assert_eq!(report.reaped.episode_relations, 2);
    assert_eq!(report.reaped.series, 1);
    assert_eq!(count(&conn, "series"), 0);
}

#[test]
fn api_sync_keeps_episodes_of_listed_series() {
    let conn = open_memory().unwrap();
    let provider = xtream("acme");
    let mut feed = action_feed();
    feed.series = vec![series("20", "The Show", "5")];
    feed.episodes
        .insert("20".to_string(), vec![episode("201", "Pilot", 1, 1)]);
    sync_provider_at(&conn, &provider, &feed, &SilentSink, t(1_000)).unwrap();
    refresh_series_episodes_at(&conn, "acme", "20", &feed, &SilentSink, t(1_500)).unwrap();

    let report = sync_provider_at(&conn, &provider, &feed, &SilentSink, t(2_000)).unwrap();
    assert_eq!(report.reaped.episode_relations, 0);
    assert_eq!(count(&conn, "provider_episode_relations"), 1);
}

#[test]
fn remove_provider_collects_orphans() {
    let conn = open_memory().unwrap();
    let mut feed = action_feed();
    feed.series = vec![series("20", "The Show", "5")];
    sync_provider_at(&conn, &xtream("acme"), &feed, &SilentSink, t(1_000)).unwrap();

    let stats = remove_provider(&conn, "acme").unwrap();
    assert_eq!(stats.movies, 1);
    assert_eq!(stats.series, 1);
    assert_eq!(count(&conn, "provider_movie_relations"), 0);
    assert_eq!(count(&conn, "categories"), 0);

    let err = remove_provider(&conn, "acme").unwrap_err();
    assert!(matches!(err, SyncError::UnknownProvider(_)));
}

#[test]
fn channel_sink_sees_phase_failures() {
    let conn = open_memory().unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<StatusEvent>();
    let feed = action_feed().fail("get_vod_streams");

    sync_provider_at(&conn, &xtream("acme"), &feed, &tx, t(1_000)).unwrap();
    drop(tx);

    let mut errors = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if event.severity == Severity::Error {
            errors.push(event.message);
        }
    }
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("movies phase failed"));
}
