mod common;

use common::*;
use vodsync_catalog::types::*;
use vodsync_db::*;
use vodsync_import::*;

const PLAYLIST: &str = "#EXTM3U x-tvg-url=\"http://epg.example\"\r\n\
#EXTINF:-1 tvg-logo=\"http://img.example/heat.jpg\" group-title=\"Action\",Heat (1995)\r\n\
http://host.example/movie/u/p/1234.mkv\r\n\
#EXTINF:-1 group-title=\"Drama\",The Show S01E01\r\n\
http://host.example/series/u/p/5001.mp4\r\n\
#EXTINF:-1 group-title=\"Drama\",The Show S01E02\r\n\
http://host.example/series/u/p/5002.mp4\r\n\
#EXTINF:-1 group-title=\"News\",Channel One\r\n\
http://host.example/live/u/p/1.ts\r\n";

fn t(millis: i64) -> ScanStart {
    ScanStart::from_millis(millis)
}

#[test]
fn playlist_populates_movies_series_and_episodes() {
    let conn = open_memory().unwrap();
    let report = ingest_playlist_at(&conn, &m3u("list"), PLAYLIST, &SilentSink, t(1_000)).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.movies.created, 1);
    assert_eq!(report.series.created, 1);

    let heat = find_entity_by_unique_id(&conn, EntityKind::Movie, "movie:list:1234")
        .unwrap()
        .unwrap();
    assert_eq!(heat.name, "Heat (1995)");
    assert_eq!(heat.year, Some(1995));
    assert_eq!(heat.category_name, "Action");
    assert_eq!(heat.logo.as_deref(), Some("http://img.example/heat.jpg"));
    let relation = find_relation(&conn, EntityKind::Movie, "list", "1234")
        .unwrap()
        .unwrap();
    assert_eq!(relation.container, "mkv");

    let show = find_entity_by_unique_id(&conn, EntityKind::Series, "series:list:the-show")
        .unwrap()
        .unwrap();
    assert_eq!(show.name, "The Show");
    assert_eq!(show.category_name, "Drama");

    let episodes = episodes_for_series(&conn, show.id).unwrap();
    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[0].native_id, "5001");
    assert_eq!(episodes[0].season, Some(1));
    assert_eq!(episodes[1].episode_num, Some(2));
    assert_eq!(episodes[1].container, "mp4");

    // Live channels are dropped.
    assert_eq!(count(&conn, "movies"), 1);
    assert_eq!(count(&conn, "series"), 1);
}

#[test]
fn reingesting_the_same_playlist_changes_nothing() {
    let conn = open_memory().unwrap();
    let provider = m3u("list");
    ingest_playlist_at(&conn, &provider, PLAYLIST, &SilentSink, t(1_000)).unwrap();
    let report = ingest_playlist_at(&conn, &provider, PLAYLIST, &SilentSink, t(2_000)).unwrap();

    assert_eq!(report.movies.created, 0);
    assert_eq!(report.series.created, 0);
    assert_eq!(report.reaped.relations(), 0);
    assert_eq!(count(&conn, "provider_episode_relations"), 2);
}

#[test]
fn removed_episode_is_reaped_by_watermark() {
    let conn = open_memory().unwrap();
    let provider = m3u("list");
    ingest_playlist_at(&conn, &provider, PLAYLIST, &SilentSink, t(1_000)).unwrap();

    let shorter = "#EXTM3U\n\
        #EXTINF:-1 group-title=\"Drama\",The Show S01E01\n\
        http://host.example/series/u/p/5001.mp4\n";
    let report = ingest_playlist_at(&conn, &provider, shorter, &SilentSink, t(2_000)).unwrap();

    assert_eq!(report.reaped.episode_relations, 1);
    assert_eq!(report.reaped.movie_relations, 1);
    assert_eq!(report.reaped.movies, 1);
    assert_eq!(report.reaped.series, 0);
    assert_eq!(count(&conn, "provider_episode_relations"), 1);
}

#[test]
fn entries_without_group_title_use_fallback_categories() {
    let conn = open_memory().unwrap();
    let text = "#EXTM3U\n\
        #EXTINF:-1 type=\"movie\",Untitled Thing\n\
        http://host.example/vod/77.avi\n";
    ingest_playlist_at(&conn, &m3u("list"), text, &SilentSink, t(1_000)).unwrap();

    let entity = find_entity_by_unique_id(&conn, EntityKind::Movie, "movie:list:77")
        .unwrap()
        .unwrap();
    assert_eq!(entity.category_name, "Uncategorized Movies");
    assert_eq!(entity.year, None);
}

#[test]
fn invalid_provider_id_is_rejected() {
    let conn = open_memory().unwrap();
    let err = ingest_playlist_at(&conn, &m3u("bad:id"), PLAYLIST, &SilentSink, t(1_000))
        .unwrap_err();
    assert!(matches!(err, SyncError::Credentials(_)));
    assert_eq!(count(&conn, "providers"), 0);
}

#[test]
fn playlist_run_is_logged() {
    let conn = open_memory().unwrap();
    ingest_playlist_at(&conn, &m3u("list"), PLAYLIST, &SilentSink, t(1_000)).unwrap();

    let logs = list_sync_logs(&conn, None, 10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].source, "playlist");
    assert_eq!(logs[0].series_created, 1);
}
