#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use vodsync_catalog::types::*;
use vodsync_db::Connection;
use vodsync_import::{Severity, StatusEvent, StatusSink};
use vodsync_provider::{EpisodeFeedRow, MovieFeedRow, ProviderClient, ProviderError, SeriesFeedRow};

/// Scripted in-process provider feed.
#[derive(Default)]
pub struct FakeClient {
    pub vod_categories: Vec<Category>,
    pub series_categories: Vec<Category>,
    pub movies: Vec<MovieFeedRow>,
    pub series: Vec<SeriesFeedRow>,
    pub episodes: HashMap<String, Vec<EpisodeFeedRow>>,
    /// Actions that fail with HTTP 500.
    pub failing: HashSet<&'static str>,
    pub calls: Cell<usize>,
}

impl FakeClient {
    pub fn fail(mut self, action: &'static str) -> Self {
        self.failing.insert(action);
        self
    }

    fn call(&self, action: &'static str) -> Result<(), ProviderError> {
        self.calls.set(self.calls.get() + 1);
        if self.failing.contains(action) {
            return Err(ProviderError::Http {
                status: 500,
                action: action.to_string(),
            });
        }
        Ok(())
    }
}

impl ProviderClient for FakeClient {
    fn fetch_vod_categories(&self) -> Result<Vec<Category>, ProviderError> {
        self.call("get_vod_categories")?;
        Ok(self.vod_categories.clone())
    }

    fn fetch_series_categories(&self) -> Result<Vec<Category>, ProviderError> {
        self.call("get_series_categories")?;
        Ok(self.series_categories.clone())
    }

    fn fetch_movies(&self) -> Result<Vec<MovieFeedRow>, ProviderError> {
        self.call("get_vod_streams")?;
        Ok(self.movies.clone())
    }

    fn fetch_series(&self) -> Result<Vec<SeriesFeedRow>, ProviderError> {
        self.call("get_series")?;
        Ok(self.series.clone())
    }

    fn fetch_series_episodes(
        &self,
        series_id: &str,
    ) -> Result<Vec<EpisodeFeedRow>, ProviderError> {
        self.call("get_series_info")?;
        Ok(self.episodes.get(series_id).cloned().unwrap_or_default())
    }
}

/// Collects every reported message.
#[derive(Default)]
pub struct RecordingSink {
    pub events: RefCell<Vec<StatusEvent>>,
}

impl RecordingSink {
    pub fn errors(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .map(|e| e.message.clone())
            .collect()
    }
}

impl StatusSink for RecordingSink {
    fn report(&self, message: &str, severity: Severity) {
        self.events.borrow_mut().push(StatusEvent {
            message: message.to_string(),
            severity,
        });
    }
}

pub fn xtream(id: &str) -> Provider {
    Provider {
        id: id.to_string(),
        name: format!("{id} tv"),
        kind: ProviderKind::Xtream,
        base_url: format!("http://{id}.example"),
        username: Some("user".to_string()),
        password: Some("pass".to_string()),
        created_at: String::new(),
    }
}

pub fn m3u(id: &str) -> Provider {
    Provider {
        id: id.to_string(),
        name: format!("{id} playlist"),
        kind: ProviderKind::M3u,
        base_url: format!("http://{id}.example/get.php"),
        username: None,
        password: None,
        created_at: String::new(),
    }
}

pub fn movie(native_id: &str, name: &str, category_id: &str) -> MovieFeedRow {
    MovieFeedRow {
        native_id: Some(native_id.to_string()),
        name: Some(name.to_string()),
        category_id: Some(category_id.to_string()),
        ..Default::default()
    }
}

pub fn series(native_id: &str, name: &str, category_id: &str) -> SeriesFeedRow {
    SeriesFeedRow {
        native_id: Some(native_id.to_string()),
        name: Some(name.to_string()),
        category_id: Some(category_id.to_string()),
        ..Default::default()
    }
}

pub fn episode(native_id: &str, title: &str, season: i32, episode_num: i32) -> EpisodeFeedRow {
    EpisodeFeedRow {
        native_id: Some(native_id.to_string()),
        title: Some(title.to_string()),
        season: Some(season),
        episode_num: Some(episode_num),
        container: Some("mkv".to_string()),
    }
}

pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}
