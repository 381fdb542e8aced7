use std::time::Duration;

use serde::de::DeserializeOwned;
use vodsync_catalog::types::{Category, Provider};

use crate::config::HttpSettings;
use crate::credentials::Credentials;
use crate::error::ProviderError;
use crate::types::{
    CategoryRow, EpisodeFeedRow, MovieFeedRow, SeriesFeedRow, SeriesInfoResponse,
};

/// A remote catalog that can list categories, movies, and series.
///
/// Each call completes the whole fetch before returning, so callers never
/// hold a database transaction open across network I/O.
pub trait ProviderClient {
    fn fetch_vod_categories(&self) -> Result<Vec<Category>, ProviderError>;

    fn fetch_series_categories(&self) -> Result<Vec<Category>, ProviderError>;

    fn fetch_movies(&self) -> Result<Vec<MovieFeedRow>, ProviderError>;

    fn fetch_series(&self) -> Result<Vec<SeriesFeedRow>, ProviderError>;

    /// Episodes of one series, fetched on demand.
    fn fetch_series_episodes(&self, series_id: &str)
    -> Result<Vec<EpisodeFeedRow>, ProviderError>;
}

/// Blocking HTTP client for the Xtream-style `player_api.php` listing API.
pub struct XtreamClient {
    http: reqwest::blocking::Client,
    creds: Credentials,
}

impl XtreamClient {
    /// Build a client for a provider. Fails with a credential error before
    /// any request is sent if the descriptor is incomplete.
    pub fn new(provider: &Provider, settings: &HttpSettings) -> Result<Self, ProviderError> {
        let creds = Credentials::from_provider(provider)?;
        Ok(Self {
            http: build_http(settings)?,
            creds,
        })
    }

    fn api_url(&self) -> String {
        format!("{}/player_api.php", self.creds.base_url)
    }

    /// Call one `action` and decode the JSON body.
    fn get_action<T: DeserializeOwned>(
        &self,
        action: &str,
        extra: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let mut query = vec![
            ("username", self.creds.username()),
            ("password", self.creds.password()),
            ("action", action),
        ];
        query.extend_from_slice(extra);

        log::debug!("GET {} action={}", self.api_url(), action);
        let resp = self.http.get(self.api_url()).query(&query).send()?;
        let text = read_body(resp, action)?;

        serde_json::from_str(&text).map_err(|e| ProviderError::Malformed {
            action: action.to_string(),
            message: format!("{e}. Response: {}", excerpt(&text)),
        })
    }

    fn fetch_categories(&self, action: &str) -> Result<Vec<Category>, ProviderError> {
        let rows: Vec<CategoryRow> = self.get_action(action, &[])?;
        Ok(rows
            .into_iter()
            .filter_map(CategoryRow::into_category)
            .collect())
    }
}

impl ProviderClient for XtreamClient {
    fn fetch_vod_categories(&self) -> Result<Vec<Category>, ProviderError> {
        self.fetch_categories("get_vod_categories")
    }

    fn fetch_series_categories(&self) -> Result<Vec<Category>, ProviderError> {
        self.fetch_categories("get_series_categories")
    }

    fn fetch_movies(&self) -> Result<Vec<MovieFeedRow>, ProviderError> {
        self.get_action("get_vod_streams", &[])
    }

    fn fetch_series(&self) -> Result<Vec<SeriesFeedRow>, ProviderError> {
        self.get_action("get_series", &[])
    }

    fn fetch_series_episodes(
        &self,
        series_id: &str,
    ) -> Result<Vec<EpisodeFeedRow>, ProviderError> {
        let info: SeriesInfoResponse =
            self.get_action("get_series_info", &[("series_id", series_id)])?;
        Ok(info.into_episodes())
    }
}

/// Download the playlist document of an M3U provider.
pub fn fetch_playlist(provider: &Provider, settings: &HttpSettings) -> Result<String, ProviderError> {
    let creds = Credentials::from_provider(provider)?;
    let http = build_http(settings)?;

    log::debug!("GET playlist for provider '{}'", provider.id);
    let resp = http.get(&creds.base_url).send()?;
    read_body(resp, "playlist")
}

fn build_http(settings: &HttpSettings) -> Result<reqwest::blocking::Client, ProviderError> {
    let http = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .user_agent(settings.user_agent.clone())
        .build()?;
    Ok(http)
}

/// Map status codes and empty bodies to provider errors.
fn read_body(resp: reqwest::blocking::Response, action: &str) -> Result<String, ProviderError> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ProviderError::Unauthorized(status.as_u16()));
    }
    if !status.is_success() {
        return Err(ProviderError::Http {
            status: status.as_u16(),
            action: action.to_string(),
        });
    }

    let text = resp.text()?;
    if text.trim().is_empty() {
        return Err(ProviderError::EmptyBody(action.to_string()));
    }
    Ok(text)
}

fn excerpt(text: &str) -> &str {
    let mut end = text.len().min(200);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
