//! Configuration types for seed discovery and execution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::SeedError;

/// Default name of the seed directory inside each app.
pub const DEFAULT_SEED_DIR: &str = "seeds";

/// Default glob pattern for seed files.
pub const DEFAULT_FILE_PATTERN: &str = "setup_*.sql";

/// Default settings file name, looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "seedkit.json";

/// Placeholder image services supported by [`crate::helpers::placeholder_image`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderService {
    /// picsum.photos - real photos, stable per seed value.
    #[default]
    Picsum,
    /// placehold.co - plain colored placeholders.
    Placehold,
}

/// Seeding options, read from the `SEEDKIT` section of the settings file.
///
/// ```json
/// {
///     "SEEDKIT": {
///         "SEED_DIR": "seeds",
///         "FILE_PATTERN": "setup_*.sql",
///         "ATOMIC": true,
///         "EXCLUDE_APPS": [],
///         "PLACEHOLDER_SERVICE": "picsum",
///         "LOG_LEVEL": "info"
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SeedkitConfig {
    /// Name of the seed directory within each app.
    pub seed_dir: String,

    /// Glob pattern matched against file names in the seed directory.
    pub file_pattern: String,

    /// Whether to wrap the whole batch in one database transaction.
    pub atomic: bool,

    /// App names never searched for seeds.
    pub exclude_apps: Vec<String>,

    /// Service used for placeholder image URLs.
    pub placeholder_service: PlaceholderService,

    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for SeedkitConfig {
    fn default() -> Self {
        Self {
            seed_dir: DEFAULT_SEED_DIR.to_string(),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            atomic: true,
            exclude_apps: Vec::new(),
            placeholder_service: PlaceholderService::Picsum,
            log_level: "info".to_string(),
        }
    }
}

impl SeedkitConfig {
    /// Applies `SEEDKIT_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `SEEDKIT_*` overrides from an arbitrary lookup.
    ///
    /// Unparseable `SEEDKIT_ATOMIC` values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(seed_dir) = lookup("SEEDKIT_SEED_DIR") {
            self.seed_dir = seed_dir;
        }
        if let Some(pattern) = lookup("SEEDKIT_FILE_PATTERN") {
            self.file_pattern = pattern;
        }
        if let Some(atomic) = lookup("SEEDKIT_ATOMIC").and_then(|v| parse_flag(&v)) {
            self.atomic = atomic;
        }
        if let Some(level) = lookup("SEEDKIT_LOG_LEVEL") {
            self.log_level = level;
        }
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// An `installed_apps` entry as written in the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppEntry {
    /// Bare app name; its directory is derived from the name.
    Name(String),
    /// Explicit app with an optional directory.
    Detailed {
        name: String,
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

impl AppEntry {
    pub fn name(&self) -> &str {
        match self {
            AppEntry::Name(name) => name,
            AppEntry::Detailed { name, .. } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default)]
    base_dir: Option<PathBuf>,
    #[serde(default)]
    installed_apps: Vec<AppEntry>,
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default, rename = "SEEDKIT")]
    seedkit: SeedkitConfig,
}

/// Project-level settings: where the project lives, which apps it has,
/// and how to seed them.
#[derive(Debug, Clone)]
pub struct ProjectSettings {
    /// Project root; apps outside it are never seeded.
    pub base_dir: PathBuf,

    /// Installed apps in registration order.
    pub installed_apps: Vec<AppEntry>,

    /// Database connection string, if configured.
    pub database_url: Option<String>,

    /// Seeding options.
    pub seedkit: SeedkitConfig,
}

impl ProjectSettings {
    /// Loads settings from a JSON file.
    ///
    /// A relative `base_dir` is resolved against the settings file's
    /// directory; when absent, that directory is the project root.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let origin = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        Self::from_json(&contents, origin).map_err(|source| SeedError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses settings from JSON, resolving relative paths against `origin`.
    pub fn from_json(contents: &str, origin: &Path) -> Result<Self, serde_json::Error> {
        let raw: RawSettings = serde_json::from_str(contents)?;

        let base_dir = match raw.base_dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => origin.join(dir),
            None => origin.to_path_buf(),
        };

        Ok(Self {
            base_dir,
            installed_apps: raw.installed_apps,
            database_url: raw.database_url,
            seedkit: raw.seedkit,
        })
    }
}
