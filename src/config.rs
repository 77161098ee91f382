//! Configuration for the catalog client and the local map library.
//!
//! Everything that used to be a hard-coded constant (API endpoints, the
//! category list, folder names, the politeness delay) lives in one of two
//! structs and is handed to the component that needs it at construction
//! time. Both come with a builder that validates in `build()`.
//!
//! - [`CatalogConfig`]: where maps are listed and fetched from, and where
//!   downloads land.
//! - [`LibraryConfig`]: where local maps live and where exports go.

use crate::error::ConfigError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// GitHub contents API listing the `maps/` folder of `mbround18/vtt-maps`.
pub const DEFAULT_API_BASE: &str = "https://api.github.com/repos/mbround18/vtt-maps/contents/maps";

/// Raw file host for the same folder.
pub const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com/mbround18/vtt-maps/main/maps";

/// Category folders published in the repository.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "beach",
    "dungeons",
    "forest",
    "taverns",
    "locations",
    "encounters",
    "travel",
    "desert",
    "tundra",
    "cyberpunk",
    "base_building",
    "spires",
    "other",
];

/// Default local folder for downloaded maps.
pub const DEFAULT_MAPS_DIR: &str = "maps";

/// Per-category subfolder that receives exported PNGs.
pub const DEFAULT_EXPORT_DIR: &str = "exported_pngs";

/// Remote catalog settings.
///
/// # Example
/// ```rust
/// use vtt_maps::CatalogConfig;
///
/// let config = CatalogConfig::builder()
///     .categories(["beach", "taverns"])
///     .throttle_ms(250)
///     .build()
///     .unwrap();
/// assert_eq!(config.categories.len(), 2);
/// ```
#[derive(Clone)]
pub struct CatalogConfig {
    /// Listing endpoint; `{api_base}/{category}` returns a JSON array.
    pub api_base: String,

    /// Raw download host; `{raw_base}/{category}/{file}` returns the bytes.
    pub raw_base: String,

    /// Categories known to exist in the catalog.
    pub categories: Vec<String>,

    /// Downloads are written to `{output_dir}/{category}/`. Default: `maps`.
    pub output_dir: PathBuf,

    /// Per-request timeout in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// Pause after each successful map download, in ms. Default: 500.
    ///
    /// GitHub's unauthenticated rate limits are tight; the pause keeps a bulk
    /// run from tripping them.
    pub throttle_ms: u64,

    /// `User-Agent` header. GitHub's API rejects requests without one.
    pub user_agent: String,

    /// Also fetch the `.md` description next to each map. Default: true.
    pub fetch_descriptions: bool,

    /// Optional progress callback for downloads.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            raw_base: DEFAULT_RAW_BASE.to_string(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            output_dir: PathBuf::from(DEFAULT_MAPS_DIR),
            request_timeout_secs: 60,
            throttle_ms: 500,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            fetch_descriptions: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("api_base", &self.api_base)
            .field("raw_base", &self.raw_base)
            .field("categories", &self.categories)
            .field("output_dir", &self.output_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("throttle_ms", &self.throttle_ms)
            .field("user_agent", &self.user_agent)
            .field("fetch_descriptions", &self.fetch_descriptions)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProgressCallback>"),
            )
            .finish()
    }
}

impl CatalogConfig {
    /// Create a new builder for `CatalogConfig`.
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder {
            config: Self::default(),
        }
    }

    /// True when `category` is one of the configured categories.
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

/// Builder for [`CatalogConfig`].
#[derive(Debug)]
pub struct CatalogConfigBuilder {
    config: CatalogConfig,
}

impl CatalogConfigBuilder {
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.config.api_base = url.into();
        self
    }

    pub fn raw_base(mut self, url: impl Into<String>) -> Self {
        self.config.raw_base = url.into();
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn throttle_ms(mut self, ms: u64) -> Self {
        self.config.throttle_ms = ms;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn fetch_descriptions(mut self, v: bool) -> Self {
        self.config.fetch_descriptions = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CatalogConfig, ConfigError> {
        let c = &self.config;
        for (name, url) in [("api_base", &c.api_base), ("raw_base", &c.raw_base)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be an HTTP/HTTPS URL, got '{url}'"
                )));
            }
        }
        if c.categories.is_empty() {
            return Err(ConfigError::Invalid(
                "At least one category is required".into(),
            ));
        }
        if let Some(bad) = c
            .categories
            .iter()
            .find(|cat| cat.is_empty() || cat.contains(['/', '\\']) || cat.as_str() == "..")
        {
            return Err(ConfigError::Invalid(format!(
                "Category '{bad}' is not a plain folder name"
            )));
        }
        if c.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("User-Agent must not be empty".into()));
        }
        Ok(self.config)
    }
}

/// Local map library settings.
#[derive(Clone)]
pub struct LibraryConfig {
    /// Root folder holding `{category}/{map}.dd2vtt`. Default: `maps`.
    pub maps_dir: PathBuf,

    /// Subfolder (per category) that receives exported PNGs.
    pub export_dir_name: String,

    /// Index file name written under `maps_dir`. Default: `index.json`.
    pub index_file_name: String,

    /// Optional progress callback for batch exports.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            maps_dir: PathBuf::from(DEFAULT_MAPS_DIR),
            export_dir_name: DEFAULT_EXPORT_DIR.to_string(),
            index_file_name: "index.json".to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for LibraryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryConfig")
            .field("maps_dir", &self.maps_dir)
            .field("export_dir_name", &self.export_dir_name)
            .field("index_file_name", &self.index_file_name)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProgressCallback>"),
            )
            .finish()
    }
}

impl LibraryConfig {
    /// Create a new builder for `LibraryConfig`.
    pub fn builder() -> LibraryConfigBuilder {
        LibraryConfigBuilder {
            config: Self::default(),
        }
    }

    /// Absolute-or-relative path of the index file.
    pub fn index_path(&self) -> PathBuf {
        self.maps_dir.join(&self.index_file_name)
    }
}

/// Builder for [`LibraryConfig`].
#[derive(Debug)]
pub struct LibraryConfigBuilder {
    config: LibraryConfig,
}

impl LibraryConfigBuilder {
    pub fn maps_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.maps_dir = dir.into();
        self
    }

    pub fn export_dir_name(mut self, name: impl Into<String>) -> Self {
        self.config.export_dir_name = name.into();
        self
    }

    pub fn index_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.index_file_name = name.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<LibraryConfig, ConfigError> {
        let c = &self.config;
        for (field, value) in [
            ("export_dir_name", &c.export_dir_name),
            ("index_file_name", &c.index_file_name),
        ] {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be a plain file name, got '{value}'"
                )));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_defaults_match_upstream_repo() {
        let c = CatalogConfig::default();
        assert_eq!(c.categories.len(), 13);
        assert!(c.has_category("base_building"));
        assert!(!c.has_category("moon"));
        assert_eq!(c.throttle(), Duration::from_millis(500));
        assert!(c.api_base.ends_with("/contents/maps"));
        assert!(c.user_agent.starts_with("vtt-maps/"));
    }

    #[test]
    fn builder_rejects_non_http_base() {
        let err = CatalogConfig::builder()
            .api_base("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("api_base"), "got: {err}");
    }

    #[test]
    fn builder_rejects_path_like_categories() {
        assert!(CatalogConfig::builder().categories(["../etc"]).build().is_err());
        assert!(CatalogConfig::builder()
            .categories(Vec::<String>::new())
            .build()
            .is_err());
    }

    #[test]
    fn timeout_is_clamped() {
        let c = CatalogConfig::builder().request_timeout_secs(0).build().unwrap();
        assert_eq!(c.request_timeout_secs, 1);
    }

    #[test]
    fn library_builder_validates_names() {
        assert!(LibraryConfig::builder().export_dir_name("a/b").build().is_err());
        let c = LibraryConfig::builder().maps_dir("/tmp/m").build().unwrap();
        assert_eq!(c.index_path(), PathBuf::from("/tmp/m/index.json"));
        assert_eq!(c.export_dir_name, "exported_pngs");
    }

    #[test]
    fn debug_hides_callback() {
        let dbg = format!("{:?}", LibraryConfig::default());
        assert!(dbg.contains("progress_callback: None"));
    }
}
