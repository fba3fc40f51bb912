// # SQLite Package Store
//
// This crate provides a relational PackageStore implementation for the
// DevTrack system, backed by SQLite through sqlx.
//
// ## Schema
//
// ```sql
// packages        (id PK AUTOINCREMENT, code UNIQUE, title, weight)
// package_updates (id PK AUTOINCREMENT, package_id FK -> packages.id,
//                  status, delivered, update_date)
// ```
//
// Tables are created on connect if missing. Writes run in a transaction:
// a package and its updates are stored together or not at all.
//
// ## Concurrency
//
// The `UNIQUE` constraint on `code` and SQLite's write lock are the only
// coordination between concurrent requests. Every transaction opens with a
// write, so concurrent writers queue on the busy timeout instead of failing
// on a read-to-write lock upgrade.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use devtrack_core::traits::PackageStore;
use devtrack_core::{Error, Package, PackageUpdate, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

const SCHEMA: &[&str] = &[
    r"CREATE TABLE IF NOT EXISTS packages (
        id     INTEGER PRIMARY KEY AUTOINCREMENT,
        code   TEXT    NOT NULL UNIQUE,
        title  TEXT    NOT NULL,
        weight REAL    NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS package_updates (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        package_id  INTEGER NOT NULL REFERENCES packages(id),
        status      TEXT    NOT NULL,
        delivered   INTEGER NOT NULL,
        update_date TEXT    NOT NULL
    )",
    r"CREATE INDEX IF NOT EXISTS idx_package_updates_package_id
        ON package_updates(package_id)",
];

/// How long a writer waits for SQLite's write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, FromRow)]
struct PackageRow {
    id: i64,
    code: String,
    title: String,
    weight: f64,
}

impl PackageRow {
    fn into_package(self, updates: Vec<PackageUpdate>) -> Package {
        Package {
            id: self.id,
            code: self.code,
            title: self.title,
            weight: self.weight,
            updates,
        }
    }
}

#[derive(Debug, FromRow)]
struct PackageUpdateRow {
    id: i64,
    package_id: i64,
    status: String,
    delivered: bool,
    update_date: DateTime<Utc>,
}

impl From<PackageUpdateRow> for PackageUpdate {
    fn from(row: PackageUpdateRow) -> Self {
        Self {
            id: row.id,
            package_id: row.package_id,
            status: row.status,
            delivered: row.delivered,
            update_date: row.update_date,
        }
    }
}

fn storage_error(err: sqlx::Error) -> Error {
    Error::storage(err.to_string())
}

fn not_stored(package: &Package) -> Error {
    Error::not_found(format!("package {} is not stored", package.code))
}

/// SQLite-backed package store
#[derive(Debug, Clone)]
pub struct SqlitePackageStore {
    pool: SqlitePool,
}

impl SqlitePackageStore {
    /// Open (or create) the database at `url` and ensure the schema exists
    ///
    /// In-memory databases (`sqlite::memory:`) are pinned to a single
    /// connection that is never recycled, since each connection would
    /// otherwise see its own empty database.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::config(format!("Invalid database URL '{url}': {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(storage_error)?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and ensure the schema exists
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// The underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(storage_error)?;
        }
        tracing::debug!("SQLite schema ready");
        Ok(())
    }

    async fn load_updates(&self, package_id: i64) -> Result<Vec<PackageUpdate>> {
        let rows: Vec<PackageUpdateRow> = sqlx::query_as(
            r"SELECT * FROM package_updates WHERE package_id=?1 ORDER BY id",
        )
        .bind(package_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert the package's unassigned updates
    ///
    /// Returns the new ids by position in `package.updates`; they are only
    /// written back once the transaction has committed.
    async fn insert_pending_updates(
        tx: &mut Transaction<'_, Sqlite>,
        package_id: i64,
        package: &Package,
    ) -> Result<Vec<(usize, i64)>> {
        let mut assigned = Vec::new();
        for (index, update) in package.updates.iter().enumerate() {
            if update.is_persisted() {
                continue;
            }
            let id = sqlx::query(
                r"INSERT INTO package_updates (package_id, status, delivered, update_date)
                  VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(package_id)
            .bind(&update.status)
            .bind(update.delivered)
            .bind(update.update_date)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e
                    && db.is_foreign_key_violation()
                {
                    return not_stored(package);
                }
                storage_error(e)
            })?
            .last_insert_rowid();
            assigned.push((index, id));
        }
        Ok(assigned)
    }
}

fn apply_update_ids(package: &mut Package, assigned: Vec<(usize, i64)>) {
    let package_id = package.id;
    for (index, id) in assigned {
        let update = &mut package.updates[index];
        update.id = id;
        update.package_id = package_id;
    }
}

#[async_trait]
impl PackageStore for SqlitePackageStore {
    async fn get_all(&self) -> Result<Vec<Package>> {
        let packages: Vec<PackageRow> = sqlx::query_as(r"SELECT * FROM packages ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;
        let updates: Vec<PackageUpdateRow> =
            sqlx::query_as(r"SELECT * FROM package_updates ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error)?;

        let mut by_package: HashMap<i64, Vec<PackageUpdate>> = HashMap::new();
        for row in updates {
            by_package.entry(row.package_id).or_default().push(row.into());
        }

        Ok(packages
            .into_iter()
            .map(|row| {
                let updates = by_package.remove(&row.id).unwrap_or_default();
                row.into_package(updates)
            })
            .collect())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Package>> {
        let row: Option<PackageRow> = sqlx::query_as(r"SELECT * FROM packages WHERE code=?1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let updates = self.load_updates(row.id).await?;
        Ok(Some(row.into_package(updates)))
    }

    async fn add(&self, package: &mut Package) -> Result<()> {
        if package.is_persisted() {
            return Err(Error::storage(format!(
                "package {} is already stored",
                package.id
            )));
        }

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let package_id = sqlx::query(
            r"INSERT INTO packages (code, title, weight) VALUES (?1, ?2, ?3)",
        )
        .bind(&package.code)
        .bind(&package.title)
        .bind(package.weight)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?
        .last_insert_rowid();

        let assigned = Self::insert_pending_updates(&mut tx, package_id, package).await?;
        tx.commit().await.map_err(storage_error)?;

        package.id = package_id;
        apply_update_ids(package, assigned);

        tracing::debug!("Stored package {} ({})", package.id, package.code);
        Ok(())
    }

    async fn update(&self, package: &mut Package) -> Result<()> {
        if !package.is_persisted() {
            return Err(not_stored(package));
        }

        // Checked outside the transaction so that it starts with the insert
        let exists: Option<(i64,)> = sqlx::query_as(r"SELECT id FROM packages WHERE id=?1")
            .bind(package.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        if exists.is_none() {
            return Err(not_stored(package));
        }

        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        let assigned = Self::insert_pending_updates(&mut tx, package.id, package).await?;
        tx.commit().await.map_err(storage_error)?;

        tracing::debug!(
            "Appended {} update(s) to package {}",
            assigned.len(),
            package.code
        );
        apply_update_ids(package, assigned);
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "sqlite"
    }
}
