//! Capabilities the runner needs from its environment.
//!
//! A [`SeedHost`] opens execution sessions; a [`SeedSession`] executes seed
//! modules by dotted path and either commits or rolls back. The PostgreSQL
//! implementation lives in [`crate::db`].

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use wax::{Glob, Pattern};

use crate::config::{DEFAULT_FILE_PATTERN, ProjectSettings};
use crate::errors::{ScriptError, SeedError};

/// Opens sessions for executing seed modules.
#[async_trait]
pub trait SeedHost: Send + Sync {
    type Session: SeedSession;

    /// Begins a session.
    ///
    /// An atomic session is a single transaction: nothing it executes is
    /// visible after [`SeedSession::rollback`]. A non-atomic session applies
    /// each module's effects as they happen.
    async fn begin(&self, atomic: bool) -> Result<Self::Session, SeedError>;
}

/// An open execution session.
#[async_trait]
pub trait SeedSession: Send {
    /// Runs the module's top-level code, even if it ran before.
    async fn execute_fresh(&mut self, import_path: &str) -> Result<(), ScriptError>;

    async fn commit(self) -> Result<(), SeedError>;

    async fn rollback(self) -> Result<(), SeedError>;
}

/// Maps dotted module paths back to script files under the project root.
///
/// The last path segment is a file stem; the file is whichever entry in the
/// parent directory has that stem and matches the seed file pattern, so any
/// extension the pattern admits resolves the same way discovery found it.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    base_dir: PathBuf,
    file_pattern: String,
}

impl ModuleResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
        }
    }

    pub fn with_file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.file_pattern = pattern.into();
        self
    }

    pub fn from_settings(settings: &ProjectSettings) -> Self {
        Self::new(&settings.base_dir).with_file_pattern(&settings.seedkit.file_pattern)
    }

    /// `blog.seeds.setup_posts` resolves to `<base>/blog/seeds/setup_posts.<ext>`.
    pub fn resolve(&self, import_path: &str) -> Result<PathBuf, ScriptError> {
        let glob = Glob::new(&self.file_pattern).map_err(|e| {
            ScriptError::Failed(format!("Invalid file pattern `{}`: {e}", self.file_pattern))
        })?;

        let (package, stem) = import_path.rsplit_once('.').unwrap_or(("", import_path));
        let dir = package
            .split('.')
            .filter(|part| !part.is_empty())
            .fold(self.base_dir.clone(), |acc, part| acc.join(part));
        let not_found = || ScriptError::ModuleNotFound {
            import_path: import_path.to_string(),
            path: dir.join(stem),
        };

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        let mut candidates = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.file_stem().and_then(|s| s.to_str()) != Some(stem) {
                continue;
            }
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| glob.is_match(name))
            {
                candidates.push(path);
            }
        }

        candidates.sort();
        candidates.into_iter().next().ok_or_else(not_found)
    }

    /// Reads the module's source from disk. Never cached.
    pub fn load(&self, import_path: &str) -> Result<String, ScriptError> {
        let path = self.resolve(import_path)?;
        match std::fs::read_to_string(&path) {
            Ok(source) => Ok(source),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ScriptError::ModuleNotFound {
                import_path: import_path.to_string(),
                path,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_seed(root: &std::path::Path, name: &str, sql: &str) {
        let seeds = root.join("blog/seeds");
        std::fs::create_dir_all(&seeds).unwrap();
        std::fs::write(seeds.join(name), sql).unwrap();
    }

    #[test]
    fn test_resolve_dotted_path() {
        let root = tempfile::tempdir().unwrap();
        write_seed(root.path(), "setup_posts.sql", "SELECT 1;");

        let resolver = ModuleResolver::new(root.path());
        assert_eq!(
            resolver.resolve("blog.seeds.setup_posts").unwrap(),
            root.path().join("blog/seeds/setup_posts.sql")
        );
    }

    #[test]
    fn test_resolve_any_extension_the_pattern_admits() {
        let root = tempfile::tempdir().unwrap();
        write_seed(root.path(), "setup_a.psql", "SELECT 1;");
        write_seed(root.path(), "setup_b.sql", "SELECT 2;");
        write_seed(root.path(), "setup_a.txt", "not a seed");

        let resolver = ModuleResolver::new(root.path()).with_file_pattern("setup_*.{sql,psql}");
        assert_eq!(
            resolver.resolve("blog.seeds.setup_a").unwrap(),
            root.path().join("blog/seeds/setup_a.psql")
        );
        assert_eq!(resolver.load("blog.seeds.setup_b").unwrap(), "SELECT 2;");
    }

    #[test]
    fn test_resolve_extensionless_pattern() {
        let root = tempfile::tempdir().unwrap();
        write_seed(root.path(), "setup_users.psql", "SELECT 1;");

        let resolver = ModuleResolver::new(root.path()).with_file_pattern("setup_*");
        assert_eq!(resolver.load("blog.seeds.setup_users").unwrap(), "SELECT 1;");
    }

    #[test]
    fn test_resolve_ignores_files_outside_pattern() {
        let root = tempfile::tempdir().unwrap();
        write_seed(root.path(), "setup_posts.txt", "SELECT 1;");

        let resolver = ModuleResolver::new(root.path());
        assert!(matches!(
            resolver.resolve("blog.seeds.setup_posts"),
            Err(ScriptError::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn test_load_reads_fresh_source() {
        let root = tempfile::tempdir().unwrap();
        write_seed(root.path(), "setup_posts.sql", "SELECT 1;");

        let resolver = ModuleResolver::new(root.path());
        assert_eq!(resolver.load("blog.seeds.setup_posts").unwrap(), "SELECT 1;");

        write_seed(root.path(), "setup_posts.sql", "SELECT 2;");
        assert_eq!(resolver.load("blog.seeds.setup_posts").unwrap(), "SELECT 2;");
    }

    #[test]
    fn test_load_missing_module() {
        let root = tempfile::tempdir().unwrap();
        let resolver = ModuleResolver::new(root.path());

        let err = resolver.load("blog.seeds.setup_missing").unwrap_err();
        assert!(matches!(err, ScriptError::ModuleNotFound { .. }));
    }
}
