//! Schema migrations.
//!
//! One migration set serves two strategies. Development and production
//! databases apply outstanding files incrementally, tracked in the
//! `dispatch_schema_migrations` table. Test databases (any `DATABASE_URL`
//! containing `test`) are rebuilt from scratch instead; a session-scoped
//! advisory lock serializes rebuilds so parallel test runners sharing one
//! database never race on schema initialization.
//!
//! Files live in `migrations/` and are named
//! `YYYYMMDDHHMMSS_description.sql`; version order is application order.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

/// Advisory lock key reserved for test-database rebuilds
const REBUILD_LOCK_KEY: i64 = 8264031750923417;

/// One discovered `migrations/*.sql` file
#[derive(Debug, Clone)]
struct MigrationFile {
    /// Fourteen-digit timestamp prefix
    version: String,
    /// Description part of the filename, underscores spaced
    label: String,
    path: PathBuf,
}

impl MigrationFile {
    /// Parse a `YYYYMMDDHHMMSS_description.sql` path; anything else is
    /// skipped rather than treated as an error.
    fn from_path(path: &Path) -> Option<Self> {
        if !path.extension().map_or(false, |ext| ext == "sql") {
            return None;
        }

        let stem = path.file_stem()?.to_str()?;
        if stem.len() < 15 {
            return None;
        }

        let (version, rest) = stem.split_at(14);
        if !version.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let label = rest.strip_prefix('_')?.replace('_', " ");

        Some(Self {
            version: version.to_string(),
            label,
            path: path.to_path_buf(),
        })
    }
}

/// Applies the dispatch schema migrations
pub struct DispatchMigrations;

impl DispatchMigrations {
    /// Bring the database up to date, picking the strategy for the
    /// environment.
    pub async fn run_all(pool: &PgPool) -> Result<(), sqlx::Error> {
        let mut conn = pool.acquire().await?;

        if Self::is_test_database() {
            Self::fresh_rebuild(&mut conn).await
        } else {
            Self::apply_outstanding(&mut conn).await
        }
    }

    fn is_test_database() -> bool {
        std::env::var("DATABASE_URL")
            .map(|url| url.contains("test"))
            .unwrap_or(false)
    }

    /// Rebuild the schema under an advisory lock.
    ///
    /// Lock and unlock run on the same acquired connection, so the
    /// session-scoped lock pairs up correctly even behind a pool. Waiters
    /// that acquire after the first rebuild find the schema current and
    /// skip their own.
    async fn fresh_rebuild(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(REBUILD_LOCK_KEY)
            .execute(&mut *conn)
            .await?;

        let outcome = Self::rebuild_if_stale(&mut *conn).await;

        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(REBUILD_LOCK_KEY)
            .execute(&mut *conn)
            .await?;

        outcome
    }

    async fn rebuild_if_stale(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        let files = Self::discover()?;
        if Self::schema_current(&mut *conn, &files).await? {
            debug!("Schema already current, rebuild skipped");
            return Ok(());
        }

        info!(migrations = files.len(), "Rebuilding schema from scratch");
        sqlx::raw_sql(
            "DROP SCHEMA public CASCADE;
             CREATE SCHEMA public;
             GRANT ALL ON SCHEMA public TO PUBLIC",
        )
        .execute(&mut *conn)
        .await?;

        Self::ensure_tracking_table(&mut *conn).await?;
        for file in &files {
            Self::apply(&mut *conn, file).await?;
        }

        Ok(())
    }

    /// Apply every discovered migration not yet recorded
    async fn apply_outstanding(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        Self::ensure_tracking_table(&mut *conn).await?;
        let applied = Self::applied_versions(&mut *conn).await?;

        for file in Self::discover()? {
            if applied.contains(&file.version) {
                continue;
            }
            info!(version = %file.version, label = %file.label, "Applying migration");
            Self::apply(&mut *conn, &file).await?;
        }

        Ok(())
    }

    /// Execute one migration file and record its version
    async fn apply(conn: &mut PgConnection, file: &MigrationFile) -> Result<(), sqlx::Error> {
        let sql = fs::read_to_string(&file.path).map_err(sqlx::Error::Io)?;
        sqlx::raw_sql(&sql).execute(&mut *conn).await?;

        sqlx::query("INSERT INTO dispatch_schema_migrations (version) VALUES ($1)")
            .bind(&file.version)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Whether the tracking table exists and covers every discovered file
    async fn schema_current(
        conn: &mut PgConnection,
        files: &[MigrationFile],
    ) -> Result<bool, sqlx::Error> {
        let tracked: bool = sqlx::query_scalar(
            "SELECT to_regclass('public.dispatch_schema_migrations') IS NOT NULL",
        )
        .fetch_one(&mut *conn)
        .await?;
        if !tracked {
            return Ok(false);
        }

        let applied = Self::applied_versions(&mut *conn).await?;
        Ok(files.iter().all(|file| applied.contains(&file.version)))
    }

    async fn ensure_tracking_table(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS dispatch_schema_migrations (
                version VARCHAR(14) PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(conn)
        .await?;

        Ok(())
    }

    async fn applied_versions(conn: &mut PgConnection) -> Result<HashSet<String>, sqlx::Error> {
        let versions: Vec<String> =
            sqlx::query_scalar("SELECT version FROM dispatch_schema_migrations")
                .fetch_all(&mut *conn)
                .await?;

        Ok(versions.into_iter().collect())
    }

    /// Find every migration file, sorted by version
    fn discover() -> Result<Vec<MigrationFile>, sqlx::Error> {
        let dir = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("migrations");

        let mut found = Vec::new();
        if !dir.is_dir() {
            return Ok(found);
        }

        for entry in fs::read_dir(&dir).map_err(sqlx::Error::Io)? {
            let entry = entry.map_err(sqlx::Error::Io)?;
            if !entry.file_type().map_err(sqlx::Error::Io)?.is_file() {
                continue;
            }
            if let Some(file) = MigrationFile::from_path(&entry.path()) {
                found.push(file);
            }
        }

        found.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(found)
    }
}
