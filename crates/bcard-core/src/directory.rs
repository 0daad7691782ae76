//! The `Directory` trait: the remote card/user service as seen by the
//! session layer.
//!
//! Implemented by transport backends (e.g. the reqwest client in `bcard-cli`)
//! and by fakes in tests. Higher layers depend on this abstraction only.

use std::future::Future;

use crate::{card::Card, credential::Credential, profile::UserProfile};

pub trait Directory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// `GET /users/{subject_id}`, authorised with `credential`.
  fn fetch_profile<'a>(
    &'a self,
    credential: &'a Credential,
    subject_id: &'a str,
  ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send + 'a;

  /// Flip the caller's like on `card_id` and return the server's copy of the
  /// card afterwards.
  ///
  /// The request carries no like/unlike intent; the server decides the
  /// direction from its own state. Retrying after a lost response may
  /// therefore flip twice.
  fn toggle_like<'a>(
    &'a self,
    credential: &'a Credential,
    card_id: &'a str,
  ) -> impl Future<Output = Result<Card, Self::Error>> + Send + 'a;
}
