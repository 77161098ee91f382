//! HTTP client for the remote map catalog.
//!
//! The catalog is a GitHub repository: the contents API lists a category
//! folder as a JSON array, and the raw host serves file bytes. Both calls go
//! through one shared [`reqwest::Client`] carrying the configured timeout and
//! `User-Agent`.
//!
//! Status codes are mapped, not retried: 404 becomes
//! [`CatalogError::NotFound`], any other non-2xx becomes
//! [`CatalogError::ServiceUnavailable`].

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use serde::Deserialize;
use tracing::{debug, info};

/// Map file suffix.
pub const MAP_SUFFIX: &str = ".dd2vtt";

/// Description file suffix published next to each map.
pub const DESCRIPTION_SUFFIX: &str = ".md";

/// Kind of a listing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    /// `symlink`, `submodule`, or anything newer.
    #[serde(other)]
    Other,
}

/// One row of a category listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Direct download link, when the listing provides one.
    #[serde(default)]
    pub download_url: Option<String>,
}

impl CatalogEntry {
    /// True for `.dd2vtt` files.
    pub fn is_map(&self) -> bool {
        self.kind == EntryKind::File && self.name.ends_with(MAP_SUFFIX)
    }

    /// Name without the `.dd2vtt` suffix.
    pub fn map_name(&self) -> &str {
        self.name.strip_suffix(MAP_SUFFIX).unwrap_or(&self.name)
    }
}

/// Keep only `.dd2vtt` file entries, preserving listing order.
pub fn filter_maps(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    entries.into_iter().filter(CatalogEntry::is_map).collect()
}

/// Client for listing and fetching catalog files.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    config: CatalogConfig,
}

impl CatalogClient {
    /// Build a client from the given configuration.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CatalogError::ClientBuild(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// `{api_base}/{category}`
    pub fn listing_url(&self, category: &str) -> String {
        join_segments(&self.config.api_base, &[category])
    }

    /// `{raw_base}/{category}/{file_name}`, with both segments percent-encoded.
    pub fn raw_url(&self, category: &str, file_name: &str) -> String {
        join_segments(&self.config.raw_base, &[category, file_name])
    }

    /// List every entry of a category folder.
    pub async fn list_directory(&self, category: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        let url = self.listing_url(category);
        info!("Scanning {} folder", category);

        let body = self.fetch_bytes(&url).await?;
        let entries: Vec<CatalogEntry> =
            serde_json::from_slice(&body).map_err(|e| CatalogError::InvalidListing {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        debug!("{}: {} entries", url, entries.len());
        Ok(entries)
    }

    /// List only the `.dd2vtt` maps of a category.
    pub async fn list_maps(&self, category: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        let maps = filter_maps(self.list_directory(category).await?);
        info!("Found {} maps in {}", maps.len(), category);
        Ok(maps)
    }

    /// GET a URL and return the body.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        let secs = self.config.request_timeout_secs;
        let transport = |e: reqwest::Error| {
            if e.is_timeout() {
                CatalogError::Timeout {
                    url: url.to_string(),
                    secs,
                }
            } else {
                CatalogError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        let response = self.http.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(CatalogError::ServiceUnavailable {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(transport)?;
        debug!("GET {} → {} bytes", url, bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Append path segments to a base URL, percent-encoding `#`, `?`, `/` and
/// friends inside each segment.
fn join_segments(base: &str, segments: &[&str]) -> String {
    let base = base.trim_end_matches('/');
    let Ok(mut url) = reqwest::Url::parse(base) else {
        return format!("{}/{}", base, segments.join("/"));
    };
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url.into()
}
