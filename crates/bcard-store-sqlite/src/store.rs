//! [`SqliteCredentialStore`]: the SQLite implementation of
//! [`CredentialStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use bcard_core::{
  credential::Credential,
  store::{CredentialStore, TOKEN_KEY},
};

use crate::{Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A durable key-value store in a single SQLite file. The current credential
/// lives under [`TOKEN_KEY`].
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteCredentialStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteCredentialStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Raw key-value access ──────────────────────────────────────────────────

  pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
    let key = key.to_owned();
    let value: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM kv WHERE key = ?1",
              rusqlite::params![key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(value)
  }

  /// Insert or overwrite `key`. Last writer wins.
  pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
    let key = key.to_owned();
    let value = value.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO kv (key, value) VALUES (?1, ?2)
           ON CONFLICT(key) DO UPDATE SET
             value      = excluded.value,
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
          rusqlite::params![key, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Delete `key`; returns whether a row was removed.
  pub async fn remove_value(&self, key: &str) -> Result<bool> {
    let key = key.to_owned();
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?)
      })
      .await?;
    Ok(removed > 0)
  }
}

// ─── CredentialStore impl ────────────────────────────────────────────────────

impl CredentialStore for SqliteCredentialStore {
  type Error = crate::Error;

  async fn get(&self) -> Result<Option<Credential>> {
    Ok(self.get_value(TOKEN_KEY).await?.map(Credential::from))
  }

  async fn set(&self, credential: &Credential) -> Result<()> {
    self.set_value(TOKEN_KEY, credential.as_str()).await
  }

  async fn clear(&self) -> Result<()> {
    if self.remove_value(TOKEN_KEY).await? {
      tracing::debug!("stored credential removed");
    }
    Ok(())
  }
}
