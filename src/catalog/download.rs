//! Bulk downloader: list a category, fetch every map, save it to disk.
//!
//! Requests are strictly sequential with a fixed pause after each saved map.
//! Failures are per item: a map that fails to download is recorded in the
//! [`CategoryReport`] and the loop moves on; a category whose listing fails is
//! recorded in the [`DownloadSummary`] and the next category is tried.

use crate::catalog::client::{CatalogClient, DESCRIPTION_SUFFIX, MAP_SUFFIX};
use crate::error::CatalogError;
use crate::output::{CategoryReport, DownloadSummary, DownloadedMap, MapFailure};
use std::path::{Path, PathBuf};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Downloads maps from a [`CatalogClient`] into `output_dir/{category}/`.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: CatalogClient,
}

impl Downloader {
    pub fn new(client: CatalogClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    /// Folder that receives a category's maps.
    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.client.config().output_dir.join(category)
    }

    fn ensure_known(&self, category: &str) -> Result<(), CatalogError> {
        let config = self.client.config();
        if config.has_category(category) {
            Ok(())
        } else {
            Err(CatalogError::UnknownCategory {
                category: category.to_string(),
                available: config.categories.join(", "),
            })
        }
    }

    /// Download one map (and its description, when enabled).
    ///
    /// `map_name` is the file stem, e.g. `simple-beach`. A missing
    /// description is not an error: the map still counts as downloaded.
    pub async fn download_map(
        &self,
        category: &str,
        map_name: &str,
    ) -> Result<DownloadedMap, CatalogError> {
        self.ensure_known(category)?;
        let url = self
            .client
            .raw_url(category, &format!("{map_name}{MAP_SUFFIX}"));
        self.fetch_map(category, map_name, &url).await
    }

    /// Fetch a map from `url` and save it as `{category}/{map_name}.dd2vtt`.
    async fn fetch_map(
        &self,
        category: &str,
        map_name: &str,
        url: &str,
    ) -> Result<DownloadedMap, CatalogError> {
        let dir = self.category_dir(category);
        let file_name = format!("{map_name}{MAP_SUFFIX}");
        info!("Downloading {}/{}", category, map_name);

        let bytes = self.client.fetch_bytes(url).await?;
        let dd2vtt_path = dir.join(&file_name);
        save(&dd2vtt_path, &bytes).await?;
        info!("Saved DD2VTT: {}", dd2vtt_path.display());

        let description_path = if self.client.config().fetch_descriptions {
            self.download_description(category, map_name, &dir).await
        } else {
            None
        };

        Ok(DownloadedMap {
            category: category.to_string(),
            name: map_name.to_string(),
            dd2vtt_path,
            description_path,
        })
    }

    async fn download_description(&self, category: &str, map_name: &str, dir: &Path) -> Option<PathBuf> {
        let file_name = format!("{map_name}{DESCRIPTION_SUFFIX}");
        let url = self.client.raw_url(category, &file_name);
        let path = dir.join(&file_name);

        let result = match self.client.fetch_bytes(&url).await {
            Ok(bytes) => save(&path, &bytes).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                debug!("Saved description: {}", path.display());
                Some(path)
            }
            Err(e) => {
                debug!("No description for {}/{}: {}", category, map_name, e);
                None
            }
        }
    }

    /// Discover the maps of a category and download up to `limit` of them.
    ///
    /// # Errors
    /// Only a failed listing is returned as `Err`; per-map failures land in
    /// [`CategoryReport::failures`].
    pub async fn download_category(
        &self,
        category: &str,
        limit: Option<usize>,
    ) -> Result<CategoryReport, CatalogError> {
        self.ensure_known(category)?;
        let mut maps = self.client.list_maps(category).await?;
        let available = maps.len();

        if let Some(limit) = limit {
            if limit < maps.len() {
                info!("Limiting {} to {} maps", category, limit);
                maps.truncate(limit);
            }
        }

        let total = maps.len();
        let progress = self.client.config().progress_callback.clone();
        let throttle = self.client.config().throttle();

        if let Some(ref cb) = progress {
            cb.on_batch_start(category, total);
        }

        let mut report = CategoryReport {
            category: category.to_string(),
            available,
            attempted: total,
            ..Default::default()
        };

        for (i, entry) in maps.iter().enumerate() {
            let index = i + 1;
            let name = entry.map_name();
            if let Some(ref cb) = progress {
                cb.on_item_start(index, total, name);
            }

            // The listing's own link wins over one built from the name.
            let url = match entry.download_url.as_deref() {
                Some(url) => url.to_string(),
                None => self.client.raw_url(category, &entry.name),
            };
            match self.fetch_map(category, name, &url).await {
                Ok(map) => {
                    if let Some(ref cb) = progress {
                        cb.on_item_complete(index, total, name);
                    }
                    report.downloaded.push(map);
                    if !throttle.is_zero() {
                        sleep(throttle).await;
                    }
                }
                Err(error) => {
                    warn!("Failed to download {}/{}: {}", category, name, error);
                    if let Some(ref cb) = progress {
                        cb.on_item_error(index, total, name, &error.to_string());
                    }
                    report.failures.push(MapFailure {
                        name: name.to_string(),
                        error,
                    });
                }
            }
        }

        if let Some(ref cb) = progress {
            cb.on_batch_complete(category, total, report.downloaded.len());
        }
        info!(
            "Downloaded {}/{} maps from {}",
            report.downloaded.len(),
            total,
            category
        );
        Ok(report)
    }

    /// Download several categories in order. One category's failure never
    /// stops the others.
    pub async fn download_categories<S: AsRef<str>>(
        &self,
        categories: &[S],
        limit: Option<usize>,
    ) -> DownloadSummary {
        let mut summary = DownloadSummary::default();
        for category in categories {
            let category = category.as_ref();
            let result = self.download_category(category, limit).await;
            if let Err(ref e) = result {
                warn!("Failed to access {}: {}", category, e);
            }
            summary.categories.push((category.to_string(), result));
        }
        summary
    }

    /// Download every configured category.
    pub async fn download_all(&self, limit_per_category: Option<usize>) -> DownloadSummary {
        let categories = self.client.config().categories.clone();
        self.download_categories(&categories, limit_per_category).await
    }

    /// Two maps from every category.
    pub async fn download_sample(&self) -> DownloadSummary {
        self.download_all(Some(SAMPLE_PER_CATEGORY)).await
    }
}

/// Maps per category fetched by [`Downloader::download_sample`].
pub const SAMPLE_PER_CATEGORY: usize = 2;

async fn save(path: &Path, bytes: &[u8]) -> Result<(), CatalogError> {
    let fail = |source| CatalogError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }
    tokio::fs::write(path, bytes).await.map_err(fail)
}
