//! SQL schema for the key-value table backing the credential store.

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
  key        TEXT PRIMARY KEY NOT NULL,
  value      TEXT NOT NULL,
  updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
";
