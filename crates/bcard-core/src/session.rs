//! The in-memory session shared (read-only) with the rest of the app.

use serde::Serialize;

use crate::{credential::IdentityClaim, profile::UserProfile};

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  #[default]
  Anonymous,
  /// A stored credential is being decoded and its profile fetched.
  Hydrating,
  Authenticated,
  /// Transient: the credential failed validation and is being discarded.
  Invalid,
}

/// Identity and profile of the signed-in user.
///
/// Either both halves are present or neither is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
  identity: Option<IdentityClaim>,
  profile:  Option<UserProfile>,
}

impl Session {
  pub fn empty() -> Self { Self::default() }

  pub fn authenticated(identity: IdentityClaim, profile: UserProfile) -> Self {
    Self {
      identity: Some(identity),
      profile:  Some(profile),
    }
  }

  pub fn identity(&self) -> Option<&IdentityClaim> { self.identity.as_ref() }

  pub fn profile(&self) -> Option<&UserProfile> { self.profile.as_ref() }

  pub fn subject_id(&self) -> Option<&str> {
    self.identity.as_ref().map(|i| i.subject_id.as_str())
  }

  pub fn is_authenticated(&self) -> bool { self.identity.is_some() }

  /// Swap in a freshly updated profile. Returns `false`, leaving the session
  /// untouched, when nobody is signed in or the profile belongs to someone
  /// else.
  pub fn replace_profile(&mut self, profile: UserProfile) -> bool {
    match (&self.identity, &mut self.profile) {
      (Some(identity), Some(current)) if identity.subject_id == profile.id => {
        *current = profile;
        true
      }
      _ => false,
    }
  }
}
