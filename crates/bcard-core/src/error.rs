//! Error types for `bcard-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::guard::Role;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed credential: {0}")]
  MalformedCredential(String),

  #[error("credential expired at {0}")]
  ExpiredCredential(DateTime<Utc>),

  #[error("profile fetch failed: {0}")]
  ProfileFetchFailed(String),

  #[error("like toggle rejected for card {card_id}: {reason}")]
  ToggleRejected { card_id: String, reason: String },

  #[error("a like toggle for card {0} is already in flight")]
  ToggleInFlight(String),

  /// The session was replaced or ended while a request was outstanding.
  #[error("session changed before the response for card {0} arrived")]
  SessionChanged(String),

  #[error("card not found: {0}")]
  CardNotFound(String),

  #[error("sign-in required")]
  Unauthorized,

  #[error("the {0} role is required")]
  Forbidden(Role),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
