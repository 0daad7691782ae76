//! Client configuration: defaults, then the config file, then `BCARD_*`
//! environment variables. Command-line flags are applied on top by `main`.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use bcard_session::SessionConfig;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://monkfish-app-z9uza.ondigitalocean.app/bcard2";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  /// Root of the REST service; paths like `/users/{id}` are appended.
  pub base_url:   String,
  /// SQLite file holding the stored credential. `~` is expanded.
  pub store_path: PathBuf,
  pub session:    SessionConfig,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url:   DEFAULT_BASE_URL.to_string(),
      store_path: PathBuf::from("~/.local/share/bcard/session.db"),
      session:    SessionConfig::default(),
    }
  }
}

impl ClientConfig {
  /// Read `path` (if it exists) layered with the environment.
  ///
  /// Nested keys use a double underscore, e.g.
  /// `BCARD_SESSION__FETCH_TIMEOUT_SECS=10`.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("BCARD")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ClientConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("bcard-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn missing_file_gives_defaults() {
    let cfg = ClientConfig::load(Path::new("/nonexistent/bcard.toml")).unwrap();
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.session.fetch_timeout_secs, 30);
    assert_eq!(cfg.session.toggle_timeout_secs, 30);
    assert!(cfg.store_path.ends_with(".local/share/bcard/session.db"));
  }

  #[test]
  fn file_overrides_defaults() {
    let path = temp_file(
      "override.toml",
      r#"
        base_url = "http://localhost:8181"
        store_path = "/tmp/bcard-test.db"

        [session]
        fetch_timeout_secs = 5
      "#,
    );
    let cfg = ClientConfig::load(&path).unwrap();
    assert_eq!(cfg.base_url, "http://localhost:8181");
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/bcard-test.db"));
    assert_eq!(cfg.session.fetch_timeout_secs, 5);
    assert_eq!(cfg.session.toggle_timeout_secs, 30);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else {
      return;
    };
    assert_eq!(
      expand_tilde(Path::new("~/bcard/session.db")),
      PathBuf::from(home).join("bcard/session.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs/path")), PathBuf::from("/abs/path"));
  }
}
