//! Seed file discovery across installed apps.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use wax::{Glob, Pattern};

use crate::config::{DEFAULT_FILE_PATTERN, DEFAULT_SEED_DIR, SeedkitConfig};
use crate::errors::SeedError;
use crate::output::{Level, NullOutput, OutputSink};
use crate::registry::AppRegistry;

/// Stem of the package marker file, never treated as a seed.
const PACKAGE_MARKER_STEM: &str = "__init__";

/// A discovered seed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFile {
    pub app_name: String,
    pub file_path: PathBuf,
    /// Dotted path relative to the project root, e.g. `blog.seeds.setup_posts`.
    pub module_path: String,
}

impl SeedFile {
    /// File name without its directory.
    pub fn file_name(&self) -> &str {
        self.file_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.module_path)
    }
}

/// Seed files belonging to one app, sorted by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSeeds {
    pub app_name: String,
    pub files: Vec<SeedFile>,
}

impl AppSeeds {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Finds seed files in each installed app's seed directory.
///
/// Only apps located inside the project root are searched, so seeds that
/// ship inside third-party dependencies are never picked up.
#[derive(Debug, Clone)]
pub struct Discovery {
    base_dir: PathBuf,
    seed_dir: String,
    file_pattern: String,
    app_filter: Option<HashSet<String>>,
    exclude_apps: HashSet<String>,
}

impl Discovery {
    /// Creates a discovery rooted at `base_dir` with default directory and pattern.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            seed_dir: DEFAULT_SEED_DIR.to_string(),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            app_filter: None,
            exclude_apps: HashSet::new(),
        }
    }

    /// Creates a discovery using the configured directory, pattern and exclusions.
    pub fn from_config(base_dir: impl Into<PathBuf>, config: &SeedkitConfig) -> Self {
        Self::new(base_dir)
            .with_seed_dir(&config.seed_dir)
            .with_file_pattern(&config.file_pattern)
            .with_excluded_apps(config.exclude_apps.iter().cloned())
    }

    pub fn with_seed_dir(mut self, seed_dir: impl Into<String>) -> Self {
        self.seed_dir = seed_dir.into();
        self
    }

    pub fn with_file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = pattern.into();
        self
    }

    /// Restricts discovery to the named apps. An empty list means no restriction.
    pub fn with_app_filter<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filter: HashSet<String> = apps.into_iter().map(Into::into).collect();
        self.app_filter = (!filter.is_empty()).then_some(filter);
        self
    }

    pub fn with_excluded_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_apps.extend(apps.into_iter().map(Into::into));
        self
    }

    /// Discovers seed files, grouped per app in registration order.
    ///
    /// Apps without a directory, outside the project root, filtered out, or
    /// lacking a seed directory are skipped. Apps with no matching files
    /// produce no group.
    pub fn discover(&self, registry: &impl AppRegistry) -> Result<Vec<AppSeeds>, SeedError> {
        self.discover_with(registry, &mut NullOutput)
    }

    /// Like [`Discovery::discover`], reporting skipped apps and per-app
    /// file counts to `output`.
    pub fn discover_with(
        &self,
        registry: &impl AppRegistry,
        output: &mut impl OutputSink,
    ) -> Result<Vec<AppSeeds>, SeedError> {
        let glob = Glob::new(&self.file_pattern).map_err(|e| SeedError::InvalidPattern {
            pattern: self.file_pattern.clone(),
            message: e.to_string(),
        })?;
        let base_dir = std::fs::canonicalize(&self.base_dir)?;
        let app_configs = registry.app_configs();

        if let Some(filter) = &self.app_filter {
            for name in filter {
                if !app_configs.iter().any(|app| &app.name == name) {
                    warn!(app = %name, "Requested app is not installed");
                    output.write(Level::Warning, &format!("App {name} is not installed"));
                }
            }
        }

        let mut discovered = Vec::new();

        for app in app_configs {
            let Some(path) = &app.path else {
                debug!(app = %app.name, "Skipping app without a path");
                output.write(Level::Plain, &format!("Skipping {} (no path)", app.name));
                continue;
            };

            let Some(app_path) = resolve_app_path(path)? else {
                debug!(app = %app.name, path = %path.display(), "Skipping app with missing directory");
                output.write(Level::Plain, &format!("Skipping {} (directory not found)", app.name));
                continue;
            };

            if !app_path.starts_with(&base_dir) {
                debug!(app = %app.name, path = %app_path.display(), "Skipping app outside project root");
                output.write(Level::Plain, &format!("Skipping {} (outside project root)", app.name));
                continue;
            }

            if self.exclude_apps.contains(&app.name) {
                debug!(app = %app.name, "Skipping excluded app");
                output.write(Level::Plain, &format!("Skipping {} (excluded)", app.name));
                continue;
            }

            if let Some(filter) = &self.app_filter {
                if !filter.contains(&app.name) {
                    continue;
                }
            }

            let seed_dir = app_path.join(&self.seed_dir);
            if !seed_dir.is_dir() {
                continue;
            }

            let files = find_seed_files(&seed_dir, &glob)?
                .into_iter()
                .filter_map(|file_path| {
                    let module_path = file_to_module(&file_path, &base_dir)?;
                    Some(SeedFile {
                        app_name: app.name.clone(),
                        file_path,
                        module_path,
                    })
                })
                .collect::<Vec<_>>();

            if !files.is_empty() {
                debug!(app = %app.name, count = files.len(), "Discovered seed files");
                output.write(
                    Level::Plain,
                    &format!("Found {} seed file(s) in {}", files.len(), app.name),
                );
                discovered.push(AppSeeds {
                    app_name: app.name,
                    files,
                });
            }
        }

        Ok(discovered)
    }
}

/// Canonical app directory, or `None` when it does not exist.
fn resolve_app_path(path: &Path) -> Result<Option<PathBuf>, SeedError> {
    match std::fs::canonicalize(path) {
        Ok(resolved) => Ok(Some(resolved)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Files directly inside `seed_dir` matching `glob`, sorted by name.
fn find_seed_files(seed_dir: &Path, glob: &Glob<'_>) -> Result<Vec<PathBuf>, SeedError> {
    let mut matches = Vec::new();

    for entry in std::fs::read_dir(seed_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_package_marker(&path) || !glob.is_match(name) {
            continue;
        }

        matches.push((name.to_string(), path));
    }

    matches.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(matches.into_iter().map(|(_, path)| path).collect())
}

fn is_package_marker(path: &Path) -> bool {
    path.file_stem().and_then(|s| s.to_str()) == Some(PACKAGE_MARKER_STEM)
}

/// Converts a file path to a dotted module path relative to `base_dir`.
///
/// `<base>/blog/seeds/setup_posts.sql` becomes `blog.seeds.setup_posts`.
pub fn file_to_module(file_path: &Path, base_dir: &Path) -> Option<String> {
    let relative = file_path.strip_prefix(base_dir).ok()?.with_extension("");
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();

    (!parts.is_empty()).then(|| parts.join("."))
}
