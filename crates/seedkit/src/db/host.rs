//! sqlx-backed implementation of the seed host capabilities.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool, Postgres, Transaction};
use tracing::{debug, info};

use crate::errors::{ScriptError, SeedError};
use crate::host::{ModuleResolver, SeedHost, SeedSession};

/// Seed host executing SQL seed scripts against PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgSeedHost {
    pool: PgPool,
    resolver: ModuleResolver,
}

impl PgSeedHost {
    /// Creates a host over an existing pool.
    pub fn new(pool: PgPool, resolver: ModuleResolver) -> Self {
        Self { pool, resolver }
    }

    /// Creates a host whose pool connects on first use, so listing and dry
    /// runs never touch the database.
    pub fn connect_lazy(database_url: &str, resolver: ModuleResolver) -> Result<Self, SeedError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect_lazy(database_url)?;
        Ok(Self::new(pool, resolver))
    }
}

#[async_trait]
impl SeedHost for PgSeedHost {
    type Session = PgSession;

    async fn begin(&self, atomic: bool) -> Result<PgSession, SeedError> {
        let conn = if atomic {
            SessionConn::Atomic(self.pool.begin().await?)
        } else {
            SessionConn::Direct(self.pool.acquire().await?)
        };
        info!(atomic, "Opened seed session");

        Ok(PgSession {
            conn,
            resolver: self.resolver.clone(),
        })
    }
}

enum SessionConn {
    Atomic(Transaction<'static, Postgres>),
    Direct(PoolConnection<Postgres>),
}

/// An open session: a transaction or a plain pooled connection.
pub struct PgSession {
    conn: SessionConn,
    resolver: ModuleResolver,
}

#[async_trait]
impl SeedSession for PgSession {
    async fn execute_fresh(&mut self, import_path: &str) -> Result<(), ScriptError> {
        let sql = self.resolver.load(import_path)?;
        debug!(module = import_path, bytes = sql.len(), "Executing seed script");

        let result = match &mut self.conn {
            SessionConn::Atomic(tx) => tx.execute(sqlx::raw_sql(&sql)).await?,
            SessionConn::Direct(conn) => conn.execute(sqlx::raw_sql(&sql)).await?,
        };

        debug!(module = import_path, rows = result.rows_affected(), "Seed script finished");
        Ok(())
    }

    async fn commit(self) -> Result<(), SeedError> {
        if let SessionConn::Atomic(tx) = self.conn {
            tx.commit().await?;
            info!("Committed seed transaction");
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), SeedError> {
        if let SessionConn::Atomic(tx) = self.conn {
            tx.rollback().await?;
            info!("Rolled back seed transaction");
        }
        Ok(())
    }
}
