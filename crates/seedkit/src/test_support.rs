//! In-memory doubles for exercising discovery output and the runner
//! without a database.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::discovery::SeedFile;
use crate::errors::{ScriptError, SeedError};
use crate::host::{SeedHost, SeedSession};
use crate::output::{Level, OutputSink};

/// A fake seed module: mutates the row set or reports an error.
pub type Script = Arc<dyn Fn(&mut Vec<String>) -> Result<(), String> + Send + Sync>;

#[derive(Default)]
struct State {
    rows: Vec<String>,
    executed: Vec<String>,
    sessions_opened: usize,
}

/// Seed host backed by a shared list of rows.
///
/// Atomic sessions stage changes on a copy that only replaces the shared
/// rows on commit; direct sessions write through immediately.
#[derive(Clone, Default)]
pub struct InMemoryHost {
    scripts: Arc<HashMap<String, Script>>,
    state: Arc<Mutex<State>>,
    refuse_sessions: bool,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module at `import_path`.
    pub fn with_script<F>(mut self, import_path: &str, script: F) -> Self
    where
        F: Fn(&mut Vec<String>) -> Result<(), String> + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.scripts).insert(import_path.to_string(), Arc::new(script));
        self
    }

    /// Makes every `begin` fail.
    pub fn refusing_sessions(mut self) -> Self {
        self.refuse_sessions = true;
        self
    }

    /// A module that inserts `row` unless it already exists.
    pub fn insert(
        row: &str,
    ) -> impl Fn(&mut Vec<String>) -> Result<(), String> + Send + Sync + use<> {
        let row = row.to_string();
        move |rows: &mut Vec<String>| {
            if !rows.contains(&row) {
                rows.push(row.clone());
            }
            Ok(())
        }
    }

    /// A module that always fails with `message`.
    pub fn fail(
        message: &str,
    ) -> impl Fn(&mut Vec<String>) -> Result<(), String> + Send + Sync + use<> {
        let message = message.to_string();
        move |_: &mut Vec<String>| Err(message.clone())
    }

    /// Committed rows.
    pub fn rows(&self) -> Vec<String> {
        self.lock().rows.clone()
    }

    /// Module paths in the order they were executed, across all sessions.
    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.lock().sessions_opened
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("in-memory host state poisoned")
    }
}

#[async_trait]
impl SeedHost for InMemoryHost {
    type Session = InMemorySession;

    async fn begin(&self, atomic: bool) -> Result<InMemorySession, SeedError> {
        if self.refuse_sessions {
            return Err(SeedError::Host("sessions refused".into()));
        }

        let mut state = self.lock();
        state.sessions_opened += 1;
        let staged = atomic.then(|| state.rows.clone());
        drop(state);

        Ok(InMemorySession {
            host: self.clone(),
            staged,
        })
    }
}

/// Session over an [`InMemoryHost`].
pub struct InMemorySession {
    host: InMemoryHost,
    staged: Option<Vec<String>>,
}

#[async_trait]
impl SeedSession for InMemorySession {
    async fn execute_fresh(&mut self, import_path: &str) -> Result<(), ScriptError> {
        self.host.lock().executed.push(import_path.to_string());

        let script = self
            .host
            .scripts
            .get(import_path)
            .cloned()
            .ok_or_else(|| ScriptError::ModuleNotFound {
                import_path: import_path.to_string(),
                path: PathBuf::from(import_path),
            })?;

        let outcome = match &mut self.staged {
            Some(rows) => script(rows),
            None => script(&mut self.host.lock().rows),
        };
        outcome.map_err(ScriptError::Failed)
    }

    async fn commit(self) -> Result<(), SeedError> {
        if let Some(rows) = self.staged {
            self.host.lock().rows = rows;
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), SeedError> {
        Ok(())
    }
}

/// Output sink that records every message.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    entries: Vec<(Level, String, bool)>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in write order, inline fragments included.
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.entries
            .iter()
            .map(|(level, message, _)| (*level, message.clone()))
            .collect()
    }

    /// Text as it would appear on screen, one entry per line.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        for (_, message, line_end) in &self.entries {
            current.push_str(message);
            if *line_end {
                lines.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

impl OutputSink for RecordingOutput {
    fn write(&mut self, level: Level, message: &str) {
        self.entries.push((level, message.to_string(), true));
    }

    fn write_inline(&mut self, level: Level, message: &str) {
        self.entries.push((level, message.to_string(), false));
    }
}

/// A seed file for `app` at the conventional location under `/project`.
pub fn seed_file(app: &str, file_name: &str) -> SeedFile {
    let stem = file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem);
    SeedFile {
        app_name: app.to_string(),
        file_path: PathBuf::from(format!("/project/{app}/seeds/{file_name}")),
        module_path: format!("{app}.seeds.{stem}"),
    }
}
