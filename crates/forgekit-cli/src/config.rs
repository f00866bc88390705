//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value. The CLI
//! layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (applied at the call-site, not here)
//! 2. Environment variables `FORGEKIT__<SECTION>__<KEY>`, e.g.
//!    `FORGEKIT__DEFAULTS__ORM=drizzle`
//! 3. `--config FILE` (must exist)
//! 4. `./forgekit.toml` (optional)
//! 5. The user config file from [`AppConfig::config_path`] (optional)
//! 6. Built-in defaults (always present)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_FILE: &str = "forgekit.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default values for new projects.
    pub defaults: Defaults,
    /// Output settings.
    pub output: OutputConfig,
    /// Template settings.
    pub templates: TemplateConfig,
    /// Render cache settings.
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub orm: String,
    /// `None` picks the ORM's default database.
    pub database: Option<String>,
    pub package_manager: String,
    pub docker: bool,
    pub testing: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            orm: "prisma".into(),
            database: None,
            package_manager: "npm".into(),
            docker: false,
            testing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    /// `auto`, `human`, `plain` or `json`.
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory replacing the built-in templates.
    pub local_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Overrides the platform cache directory.
    pub dir: Option<PathBuf>,
    /// Age limit for `forgekit cache cleanup`.
    pub max_age_days: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            max_age_days: 30,
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        days(self.max_age_days)
    }
}

/// `n` days as a [`Duration`].
pub fn days(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(24 * 60 * 60))
}

impl AppConfig {
    /// Load configuration from every layer in the module-level order.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        Self::load_from(
            Self::config_path().as_deref(),
            Some(Path::new(LOCAL_CONFIG_FILE)),
            config_file.map(PathBuf::as_path),
        )
    }

    fn load_from(
        user_file: Option<&Path>,
        local_file: Option<&Path>,
        explicit_file: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .context("Failed to encode built-in defaults")?;

        let mut builder = Config::builder().add_source(defaults);

        for path in [user_file, local_file].into_iter().flatten() {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        if let Some(path) = explicit_file {
            if !path.is_file() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("FORGEKIT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Path to the user configuration file, if the platform has a config
    /// directory.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "forgekit", "forgekit")
            .map(|d| d.config_dir().join("config.toml"))
    }

    /// Directory holding the disk tier of the render cache.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache.dir.clone().unwrap_or_else(|| {
            ProjectDirs::from("dev", "forgekit", "forgekit")
                .map(|d| d.cache_dir().join("renders"))
                .unwrap_or_else(|| PathBuf::from(".forgekit-cache").join("renders"))
        })
    }

    /// Serialize as a TOML document.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialise configuration")
    }

    /// Look up one dotted key, e.g. `defaults.orm`.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = serde_json::to_value(self).ok()?;
        let found = key
            .split('.')
            .try_fold(&value, |node, segment| node.get(segment))?;
        Some(match found {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}
