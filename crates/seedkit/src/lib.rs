//! Seed data runner for multi-app projects.
//!
//! This crate discovers seed scripts inside each installed app's seed
//! directory and executes them against the database, wrapping the whole
//! batch in a single transaction so a failing script leaves no partial state.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use seedkit::prelude::*;
//!
//! let settings = ProjectSettings::load("seedkit.json")?;
//! let registry = InstalledApps::from_settings(&settings);
//!
//! let seeds = Discovery::from_config(&settings.base_dir, &settings.seedkit)
//!     .discover(&registry)?;
//!
//! let host = PgSeedHost::connect_lazy(&database_url, ModuleResolver::from_settings(&settings))?;
//! let mut runner = SeedRunner::new(host, RunConfig::default(), ConsoleOutput::new());
//! let result = runner.run(&seeds).await?;
//! ```

pub mod command;
pub mod config;
pub mod db;
pub mod discovery;
pub mod errors;
pub mod helpers;
pub mod host;
pub mod output;
pub mod registry;
pub mod runner;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use errors::{ScriptError, SeedError};

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::command::list_seed_files;
    pub use crate::config::{PlaceholderService, ProjectSettings, SeedkitConfig};
    pub use crate::db::{PgSeedHost, PgSession};
    pub use crate::discovery::{AppSeeds, Discovery, SeedFile};
    pub use crate::errors::{ScriptError, SeedError};
    pub use crate::helpers::{make_hash_id, make_slug, placeholder_image};
    pub use crate::host::{ModuleResolver, SeedHost, SeedSession};
    pub use crate::output::{ConsoleOutput, Level, NullOutput, OutputSink};
    pub use crate::registry::{AppConfig, AppRegistry, InstalledApps};
    pub use crate::runner::{RunConfig, SeedFailure, SeedResult, SeedRunner};
}
