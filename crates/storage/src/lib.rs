use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{normalize_path, ResourceKind};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// A row of the contents table. `body` is populated only when the lookup
/// asked for content.
#[derive(Debug, Clone)]
pub struct StoredResource {
    pub path: String,
    pub kind: ResourceKind,
    pub mime_type: Option<String>,
    pub size_bytes: u64,
    pub body: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Upserts a resource under its normalized path.
    pub async fn put(
        &self,
        path: &str,
        kind: ResourceKind,
        body: &[u8],
        mime_type: Option<&str>,
    ) -> Result<()> {
        let size_bytes = i64::try_from(body.len()).unwrap_or(i64::MAX);
        sqlx::query(
            "INSERT INTO contents (path, kind, body, mime_type, size_bytes)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(path) DO UPDATE SET
                kind = excluded.kind,
                body = excluded.body,
                mime_type = excluded.mime_type,
                size_bytes = excluded.size_bytes,
                updated_at = CURRENT_TIMESTAMP",
        )
        .bind(normalize_path(path))
        .bind(match kind {
            ResourceKind::Notebook => "notebook",
            ResourceKind::File => "file",
        })
        .bind(body)
        .bind(mime_type)
        .bind(size_bytes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Looks up a resource by path. With `with_content` false only the
    /// metadata columns are fetched and `body` stays `None`.
    pub async fn get(&self, path: &str, with_content: bool) -> Result<Option<StoredResource>> {
        let path = normalize_path(path);
        let row = if with_content {
            sqlx::query(
                "SELECT path, kind, mime_type, size_bytes, body, created_at, updated_at
                 FROM contents WHERE path = ?",
            )
            .bind(path)
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT path, kind, mime_type, size_bytes, NULL AS body, created_at, updated_at
                 FROM contents WHERE path = ?",
            )
            .bind(path)
            .fetch_optional(&self.pool)
            .await?
        };
        Ok(row.map(resource_from_row))
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM contents WHERE path = ?")
            .bind(normalize_path(path))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn delete(&self, path: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contents WHERE path = ?")
            .bind(normalize_path(path))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn resource_from_row(r: SqliteRow) -> StoredResource {
    StoredResource {
        path: r.get::<String, _>(0),
        // Unknown kind values fall back to the plain-file classification.
        kind: match r.get::<String, _>(1).as_str() {
            "notebook" => ResourceKind::Notebook,
            _ => ResourceKind::File,
        },
        mime_type: r.get::<Option<String>, _>(2),
        size_bytes: r.get::<Option<i64>, _>(3).unwrap_or_default() as u64,
        body: r.get::<Option<Vec<u8>>, _>(4),
        created_at: r.get::<DateTime<Utc>, _>(5),
        updated_at: r.get::<DateTime<Utc>, _>(6),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
