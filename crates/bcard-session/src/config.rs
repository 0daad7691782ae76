//! Tunables for the session layer.

use std::time::Duration;

use serde::Deserialize;

/// Timeouts applied to the two remote calls the session layer makes.
///
/// Deserialised from the `[session]` table of the client config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
  /// Profile fetch during hydration. On expiry the session is invalidated.
  pub fetch_timeout_secs:  u64,
  /// Like toggle. On expiry the card is rolled back.
  pub toggle_timeout_secs: u64,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      fetch_timeout_secs:  30,
      toggle_timeout_secs: 30,
    }
  }
}

impl SessionConfig {
  pub fn fetch_timeout(&self) -> Duration {
    Duration::from_secs(self.fetch_timeout_secs)
  }

  pub fn toggle_timeout(&self) -> Duration {
    Duration::from_secs(self.toggle_timeout_secs)
  }
}
