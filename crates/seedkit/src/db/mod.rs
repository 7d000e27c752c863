//! PostgreSQL seed host.
//!
//! [`PgSeedHost`] runs seed scripts through a [`sqlx::PgPool`], either inside
//! one transaction per batch or directly on a pooled connection.

mod host;

pub use host::{PgSeedHost, PgSession};
