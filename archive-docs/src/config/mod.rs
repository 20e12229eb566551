use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ArchiveDocsError, Result};

pub const DEFAULT_SOURCE_URL: &str =
    "https://github.com/jlowin/fastmcp/archive/refs/heads/main.zip";
pub const PROJECT_CONFIG_FILE: &str = ".archive-docs.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub fetch: FetchConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub cache_path: PathBuf,
    pub strip_prefix: String,
    pub extensions: Vec<String>,
    pub fallback_encoding: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            cache_path: PathBuf::from("fastmcp-main.zip"),
            strip_prefix: "fastmcp-main/".to_string(),
            extensions: vec!["md".to_string(), "mdx".to_string()],
            fallback_encoding: "windows-1252".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("archive-docs/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub preview_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            preview_chars: 300,
        }
    }
}

/// Partial config as read from a TOML file; only keys that are present
/// override the layer below.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    source: SourceFile,
    #[serde(default)]
    fetch: FetchFile,
    #[serde(default)]
    search: SearchFile,
}

#[derive(Debug, Default, Deserialize)]
struct SourceFile {
    url: Option<String>,
    cache_path: Option<PathBuf>,
    strip_prefix: Option<String>,
    extensions: Option<Vec<String>>,
    fallback_encoding: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FetchFile {
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchFile {
    default_limit: Option<usize>,
    preview_chars: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        if let Some(global) = Self::global_path() {
            config = config.merge_file(&global)?;
        }
        config = config.merge_file(Path::new(PROJECT_CONFIG_FILE))?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Loads defaults overlaid with a single explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ArchiveDocsError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let mut config = Self::default().merge_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn global_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "archive-docs")
            .map(|d| d.config_dir().join("config.toml"))
    }

    fn merge_file(self, path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(self);
        }
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)
            .map_err(|e| ArchiveDocsError::Config(format!("{}: {e}", path.display())))?;
        Ok(self.merge(file))
    }

    fn merge(mut self, file: ConfigFile) -> Self {
        let ConfigFile {
            source,
            fetch,
            search,
        } = file;

        if let Some(url) = source.url {
            self.source.url = url;
        }
        if let Some(cache_path) = source.cache_path {
            self.source.cache_path = cache_path;
        }
        if let Some(prefix) = source.strip_prefix {
            self.source.strip_prefix = prefix;
        }
        if let Some(extensions) = source.extensions {
            self.source.extensions = extensions;
        }
        if let Some(encoding) = source.fallback_encoding {
            self.source.fallback_encoding = encoding;
        }
        if let Some(timeout) = fetch.timeout_secs {
            self.fetch.timeout_secs = timeout;
        }
        if let Some(agent) = fetch.user_agent {
            self.fetch.user_agent = agent;
        }
        if let Some(limit) = search.default_limit {
            self.search.default_limit = limit;
        }
        if let Some(chars) = search.preview_chars {
            self.search.preview_chars = chars;
        }
        self
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("ARCHIVE_DOCS_URL") {
            self.source.url = url;
        }
        if let Some(path) = var("ARCHIVE_DOCS_CACHE") {
            self.source.cache_path = PathBuf::from(path);
        }
        if let Some(prefix) = var("ARCHIVE_DOCS_PREFIX") {
            self.source.strip_prefix = prefix;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(ArchiveDocsError::Config("source.url is empty".to_string()));
        }
        if self.source.cache_path.as_os_str().is_empty() {
            return Err(ArchiveDocsError::Config(
                "source.cache_path is empty".to_string(),
            ));
        }
        if self.source.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(ArchiveDocsError::Config(
                "source.extensions must name at least one extension".to_string(),
            ));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ArchiveDocsError::Config(
                "fetch.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
