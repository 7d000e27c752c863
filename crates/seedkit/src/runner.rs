//! Seed execution with transaction handling.
//!
//! Seeds run strictly in discovery order. The first failing seed aborts the
//! batch; in atomic mode the whole batch is then rolled back, including
//! seeds that had already succeeded.

use tracing::{error, info, warn};

use crate::discovery::{AppSeeds, SeedFile};
use crate::errors::{ScriptError, SeedError};
use crate::host::{SeedHost, SeedSession};
use crate::output::{ConsoleOutput, Level, OutputSink};

/// Execution policy for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Wrap the whole batch in one transaction.
    pub atomic: bool,
    /// Report progress to the output sink.
    pub verbose: bool,
    /// List what would run without executing anything.
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            atomic: true,
            verbose: true,
            dry_run: false,
        }
    }
}

/// A seed that failed, by module path.
#[derive(Debug)]
pub struct SeedFailure {
    pub module_path: String,
    pub error: ScriptError,
}

/// Outcome of a seeding run.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    /// Files never attempted because an earlier seed failed.
    pub skipped: usize,
    pub errors: Vec<SeedFailure>,
}

impl SeedResult {
    /// True when no seed failed.
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Executes discovered seed files through a [`SeedHost`].
pub struct SeedRunner<H, O = ConsoleOutput> {
    host: H,
    config: RunConfig,
    output: O,
}

impl<H: SeedHost, O: OutputSink> SeedRunner<H, O> {
    pub fn new(host: H, config: RunConfig, output: O) -> Self {
        Self {
            host,
            config,
            output,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Executes all seed files.
    ///
    /// A failing seed is reported in the returned [`SeedResult`], not as an
    /// `Err`; `Err` means the session itself could not be opened or closed.
    pub async fn run(&mut self, app_seeds: &[AppSeeds]) -> Result<SeedResult, SeedError> {
        let mut result = SeedResult {
            total_files: app_seeds.iter().map(AppSeeds::len).sum(),
            ..SeedResult::default()
        };

        if app_seeds.is_empty() {
            self.write(Level::Warning, "No seed files to run");
            return Ok(result);
        }

        if self.config.dry_run {
            self.write(
                Level::Success,
                &format!("Dry run - would execute {} file(s):", result.total_files),
            );
            for app in app_seeds {
                self.write(Level::Info, &format!("  {}:", app.app_name));
                for seed_file in &app.files {
                    self.write(Level::Plain, &format!("    - {}", seed_file.file_name()));
                }
            }
            return Ok(result);
        }

        info!(
            files = result.total_files,
            atomic = self.config.atomic,
            "Running seed files"
        );
        self.write(
            Level::Success,
            &format!("Running {} seed file(s)...", result.total_files),
        );

        let mut session = self.host.begin(self.config.atomic).await?;
        self.execute_seeds(&mut session, app_seeds, &mut result).await;

        if result.success() {
            session.commit().await?;
        } else {
            session.rollback().await?;
            result.skipped = result.total_files - result.successful - result.failed;
        }

        if result.success() {
            info!(successful = result.successful, "Seeding complete");
            self.write(Level::Success, "Seeding complete!");
        } else {
            warn!(
                failed = result.failed,
                skipped = result.skipped,
                "Seeding failed"
            );
            self.write(
                Level::Error,
                &format!("Seeding failed with {} error(s)", result.failed),
            );
        }

        Ok(result)
    }

    /// Executes a single seed file in its own session.
    ///
    /// Returns `false` on any failure; the error is logged.
    pub async fn run_single(&self, seed_file: &SeedFile) -> bool {
        let mut session = match self.host.begin(self.config.atomic).await {
            Ok(session) => session,
            Err(e) => {
                error!(module = %seed_file.module_path, "Failed to open seed session: {e}");
                return false;
            }
        };

        match session.execute_fresh(&seed_file.module_path).await {
            Ok(()) => match session.commit().await {
                Ok(()) => true,
                Err(e) => {
                    error!(module = %seed_file.module_path, "Failed to commit seed: {e}");
                    false
                }
            },
            Err(e) => {
                error!(module = %seed_file.module_path, "Seed failed: {e}");
                if let Err(e) = session.rollback().await {
                    error!(module = %seed_file.module_path, "Failed to roll back seed: {e}");
                }
                false
            }
        }
    }

    /// Runs seeds in order until the first failure.
    async fn execute_seeds(
        &mut self,
        session: &mut H::Session,
        app_seeds: &[AppSeeds],
        result: &mut SeedResult,
    ) {
        for app in app_seeds {
            self.write(Level::Info, &format!("{}:", app.app_name));

            for seed_file in &app.files {
                self.write_inline(
                    Level::Plain,
                    &format!("  Importing {}...", seed_file.file_name()),
                );

                match session.execute_fresh(&seed_file.module_path).await {
                    Ok(()) => {
                        self.write(Level::Success, " OK");
                        result.successful += 1;
                    }
                    Err(e) => {
                        error!(module = %seed_file.module_path, "Seed failed: {e}");
                        self.write(Level::Error, " FAILED");
                        self.write(Level::Error, &format!("    Error: {e}"));
                        result.failed += 1;
                        result.errors.push(SeedFailure {
                            module_path: seed_file.module_path.clone(),
                            error: e,
                        });
                        return;
                    }
                }
            }
        }
    }

    fn write(&mut self, level: Level, message: &str) {
        if self.config.verbose {
            self.output.write(level, message);
        }
    }

    fn write_inline(&mut self, level: Level, message: &str) {
        if self.config.verbose {
            self.output.write_inline(level, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemoryHost, RecordingOutput, seed_file};

    fn group(app: &str, files: &[&str]) -> AppSeeds {
        AppSeeds {
            app_name: app.to_string(),
            files: files.iter().map(|name| seed_file(app, name)).collect(),
        }
    }

    fn quiet() -> RunConfig {
        RunConfig {
            verbose: false,
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_success_when_no_failures() {
        let result = SeedResult {
            total_files: 3,
            successful: 3,
            ..SeedResult::default()
        };
        assert!(result.success());
    }

    #[test]
    fn test_not_success_when_failures() {
        let result = SeedResult {
            total_files: 3,
            successful: 2,
            failed: 1,
            ..SeedResult::default()
        };
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_empty_seeds_returns_early() {
        let host = InMemoryHost::new();
        let mut runner = SeedRunner::new(host.clone(), RunConfig::default(), RecordingOutput::new());

        let result = runner.run(&[]).await.unwrap();

        assert_eq!(result.total_files, 0);
        assert!(result.success());
        assert_eq!(host.sessions_opened(), 0);
        assert_eq!(
            runner.output().messages(),
            vec![(Level::Warning, "No seed files to run".to_string())]
        );
    }

    #[tokio::test]
    async fn test_dry_run_does_not_execute() {
        let host = InMemoryHost::new()
            .with_script("blog.seeds.setup_a", InMemoryHost::insert("a"))
            .with_script("blog.seeds.setup_b", InMemoryHost::insert("b"))
            .with_script("shop.seeds.setup_c", InMemoryHost::insert("c"));
        let config = RunConfig {
            dry_run: true,
            ..RunConfig::default()
        };
        let mut runner = SeedRunner::new(host.clone(), config, RecordingOutput::new());
        let seeds = vec![
            group("blog", &["setup_a.sql", "setup_b.sql"]),
            group("shop", &["setup_c.sql"]),
        ];

        let result = runner.run(&seeds).await.unwrap();

        assert_eq!(result.total_files, 3);
        assert_eq!(result.successful, 0);
        assert_eq!(result.failed, 0);
        assert!(host.executed().is_empty());
        assert_eq!(host.sessions_opened(), 0);
        assert!(host.rows().is_empty());

        let lines = runner.output().lines();
        assert_eq!(
            lines,
            vec![
                "Dry run - would execute 3 file(s):",
                "  blog:",
                "    - setup_a.sql",
                "    - setup_b.sql",
                "  shop:",
                "    - setup_c.sql",
            ]
        );
    }

    #[tokio::test]
    async fn test_runs_all_seeds_in_order() {
        let host = InMemoryHost::new()
            .with_script("blog.seeds.setup_a", InMemoryHost::insert("a"))
            .with_script("blog.seeds.setup_b", InMemoryHost::insert("b"))
            .with_script("shop.seeds.setup_c", InMemoryHost::insert("c"));
        let mut runner = SeedRunner::new(host.clone(), quiet(), RecordingOutput::new());
        let seeds = vec![
            group("blog", &["setup_a.sql", "setup_b.sql"]),
            group("shop", &["setup_c.sql"]),
        ];

        let result = runner.run(&seeds).await.unwrap();

        assert!(result.success());
        assert_eq!(result.total_files, 3);
        assert_eq!(result.successful, 3);
        assert_eq!(result.skipped, 0);
        assert_eq!(
            host.executed(),
            vec!["blog.seeds.setup_a", "blog.seeds.setup_b", "shop.seeds.setup_c"]
        );
        assert_eq!(host.rows(), vec!["a", "b", "c"]);
        assert_eq!(host.sessions_opened(), 1);
        assert!(runner.output().messages().is_empty());
    }

    #[tokio::test]
    async fn test_atomic_failure_rolls_back_whole_batch() {
        let host = InMemoryHost::new()
            .with_script("blog.seeds.setup_a", InMemoryHost::insert("a"))
            .with_script("blog.seeds.setup_b", InMemoryHost::fail("duplicate key"))
            .with_script("blog.seeds.setup_c", InMemoryHost::insert("c"));
        let mut runner = SeedRunner::new(host.clone(), quiet(), RecordingOutput::new());
        let seeds = vec![group("blog", &["setup_a.sql", "setup_b.sql", "setup_c.sql"])];

        let result = runner.run(&seeds).await.unwrap();

        assert!(!result.success());
        assert_eq!(result.successful, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].module_path, "blog.seeds.setup_b");
        assert!(host.rows().is_empty());
        assert_eq!(
            host.executed(),
            vec!["blog.seeds.setup_a", "blog.seeds.setup_b"]
        );
    }

    #[tokio::test]
    async fn test_failure_stops_later_groups() {
        let host = InMemoryHost::new()
            .with_script("blog.seeds.setup_a", InMemoryHost::fail("boom"))
            .with_script("shop.seeds.setup_b", InMemoryHost::insert("b"));
        let mut runner = SeedRunner::new(host.clone(), quiet(), RecordingOutput::new());
        let seeds = vec![group("blog", &["setup_a.sql"]), group("shop", &["setup_b.sql"])];

        let result = runner.run(&seeds).await.unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(host.executed(), vec!["blog.seeds.setup_a"]);
    }

    #[tokio::test]
    async fn test_non_atomic_failure_keeps_earlier_effects() {
        let host = InMemoryHost::new()
            .with_script("blog.seeds.setup_a", InMemoryHost::insert("a"))
            .with_script("blog.seeds.setup_b", InMemoryHost::fail("boom"));
        let config = RunConfig {
            atomic: false,
            ..quiet()
        };
        let mut runner = SeedRunner::new(host.clone(), config, RecordingOutput::new());
        let seeds = vec![group("blog", &["setup_a.sql", "setup_b.sql"])];

        let result = runner.run(&seeds).await.unwrap();

        assert!(!result.success());
        assert_eq!(host.rows(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_missing_module_is_a_seed_failure() {
        let host = InMemoryHost::new();
        let mut runner = SeedRunner::new(host.clone(), quiet(), RecordingOutput::new());
        let seeds = vec![group("blog", &["setup_gone.sql"])];

        let result = runner.run(&seeds).await.unwrap();

        assert!(!result.success());
        assert!(matches!(
            result.errors[0].error,
            ScriptError::ModuleNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_repeated_runs_execute_fresh() {
        let host = InMemoryHost::new()
            .with_script("blog.seeds.setup_admin", InMemoryHost::insert("admin"));
        let mut runner = SeedRunner::new(host.clone(), quiet(), RecordingOutput::new());
        let seeds = vec![group("blog", &["setup_admin.sql"])];

        assert!(runner.run(&seeds).await.unwrap().success());
        assert_eq!(host.rows(), vec!["admin"]);

        assert!(runner.run(&seeds).await.unwrap().success());
        assert_eq!(host.rows(), vec!["admin"]);
        assert_eq!(host.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_verbose_output() {
        let host = InMemoryHost::new()
            .with_script("blog.seeds.setup_a", InMemoryHost::insert("a"))
            .with_script("blog.seeds.setup_b", InMemoryHost::fail("no such table"));
        let mut runner = SeedRunner::new(host, RunConfig::default(), RecordingOutput::new());
        let seeds = vec![group("blog", &["setup_a.sql", "setup_b.sql"])];

        runner.run(&seeds).await.unwrap();

        assert_eq!(
            runner.output().lines(),
            vec![
                "Running 2 seed file(s)...",
                "blog:",
                "  Importing setup_a.sql... OK",
                "  Importing setup_b.sql... FAILED",
                "    Error: no such table",
                "Seeding failed with 1 error(s)",
            ]
        );
    }

    #[tokio::test]
    async fn test_begin_failure_is_an_error() {
        let host = InMemoryHost::new().refusing_sessions();
        let mut runner = SeedRunner::new(host, quiet(), RecordingOutput::new());
        let seeds = vec![group("blog", &["setup_a.sql"])];

        assert!(matches!(runner.run(&seeds).await, Err(SeedError::Host(_))));
    }

    #[tokio::test]
    async fn test_run_single() {
        let host = InMemoryHost::new()
            .with_script("blog.seeds.setup_ok", InMemoryHost::insert("ok"))
            .with_script("blog.seeds.setup_bad", |rows: &mut Vec<String>| {
                rows.push("partial".into());
                Err("constraint violated".into())
            });
        let runner = SeedRunner::new(host.clone(), quiet(), RecordingOutput::new());

        assert!(runner.run_single(&seed_file("blog", "setup_ok.sql")).await);
        assert!(!runner.run_single(&seed_file("blog", "setup_bad.sql")).await);

        assert_eq!(host.rows(), vec!["ok"]);
        assert_eq!(host.sessions_opened(), 2);
    }
}
