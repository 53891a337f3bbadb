//! Client for the mmoui addon catalog feeds.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_ENDPOINT: &str = "https://api.mmoui.com/v3";
const GLOBAL_CONFIG: &str = "globalconfig.json";
const GAME_ID: &str = "ESO";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to build catalog http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("game '{game}' is not listed in {url}")]
    GameNotListed { game: String, url: String },
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Client(_) => "http_client",
            Self::Request { .. } => "network",
            Self::Decode { .. } => "malformed_response",
            Self::GameNotListed { .. } => "game_not_listed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GlobalConfig {
    #[serde(rename = "GAMES")]
    games: Vec<GameConfig>,
}

#[derive(Debug, Deserialize)]
struct GameConfig {
    #[serde(rename = "GameID")]
    game_id: String,
    #[serde(rename = "GameConfig")]
    game_config: String,
}

#[derive(Debug, Deserialize)]
struct GameFeeds {
    #[serde(rename = "APIFeeds")]
    api_feeds: ApiFeeds,
}

#[derive(Debug, Deserialize)]
struct ApiFeeds {
    #[serde(rename = "FileList")]
    file_list: String,
}

// The feed has served UID both as a string and as a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Uid {
    Text(String),
    Number(u64),
}

#[derive(Debug, Deserialize)]
struct FileListItem {
    #[serde(rename = "UID")]
    id: Uid,
    #[serde(rename = "UIName")]
    name: String,
    #[serde(rename = "UIVersion", default)]
    version: String,
    #[serde(rename = "UIDate", default)]
    date_millis: Option<i64>,
}

impl From<FileListItem> for CatalogEntry {
    fn from(item: FileListItem) -> Self {
        let id = match item.id {
            Uid::Text(id) => id,
            Uid::Number(id) => id.to_string(),
        };
        Self {
            id,
            name: item.name,
            version: item.version,
            released_at: item.date_millis.and_then(DateTime::<Utc>::from_timestamp_millis),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    endpoint: String,
}

impl CatalogClient {
    pub fn new(endpoint: &str) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("addon-manager/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CatalogError::Client)?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Resolves the ESO feed through the global config, then downloads the file list.
    pub async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let global_url = format!("{}/{GLOBAL_CONFIG}", self.endpoint);
        let global: GlobalConfig = self.get_json(&global_url).await?;
        let game = global
            .games
            .into_iter()
            .find(|game| game.game_id == GAME_ID)
            .ok_or_else(|| CatalogError::GameNotListed {
                game: GAME_ID.to_string(),
                url: global_url.clone(),
            })?;

        let feeds: GameFeeds = self.get_json(&game.game_config).await?;
        let items: Vec<FileListItem> = self.get_json(&feeds.api_feeds.file_list).await?;
        Ok(items.into_iter().map(CatalogEntry::from).collect())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        tracing::debug!(url, "requesting catalog feed");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| CatalogError::Request {
                url: url.to_string(),
                source,
            })?;
        response
            .json::<T>()
            .await
            .map_err(|source| CatalogError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
