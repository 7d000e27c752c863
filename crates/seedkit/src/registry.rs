//! Installed app registry.
//!
//! Discovery only needs the ordered list of registered apps and their
//! directories; [`AppRegistry`] is that seam.

use std::path::{Path, PathBuf};

use crate::config::{AppEntry, ProjectSettings};

/// A registered app and its directory, if it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub name: String,
    pub path: Option<PathBuf>,
}

impl AppConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
        }
    }

    /// An app with no filesystem location.
    pub fn without_path(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }
}

/// Source of registered apps, in registration order.
pub trait AppRegistry {
    fn app_configs(&self) -> Vec<AppConfig>;
}

impl AppRegistry for Vec<AppConfig> {
    fn app_configs(&self) -> Vec<AppConfig> {
        self.clone()
    }
}

/// Registry built from the settings file's `installed_apps`.
#[derive(Debug, Clone, Default)]
pub struct InstalledApps {
    apps: Vec<AppConfig>,
}

impl InstalledApps {
    /// Resolves each entry against the project root.
    ///
    /// A bare name `a.b` lives at `<base_dir>/a/b`; relative explicit paths
    /// are joined onto `base_dir`.
    pub fn from_settings(settings: &ProjectSettings) -> Self {
        let apps = settings
            .installed_apps
            .iter()
            .map(|entry| resolve_entry(entry, &settings.base_dir))
            .collect();
        Self { apps }
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl AppRegistry for InstalledApps {
    fn app_configs(&self) -> Vec<AppConfig> {
        self.apps.clone()
    }
}

fn resolve_entry(entry: &AppEntry, base_dir: &Path) -> AppConfig {
    match entry {
        AppEntry::Name(name) => {
            let path = name
                .split('.')
                .fold(base_dir.to_path_buf(), |acc, part| acc.join(part));
            AppConfig::new(name.clone(), path)
        }
        AppEntry::Detailed { name, path } => AppConfig {
            name: name.clone(),
            path: path.as_ref().map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    base_dir.join(p)
                }
            }),
        },
    }
}
