//! The remote user profile.

use serde::{Deserialize, Serialize};

use crate::contact::{Address, Image, Name};

/// A user record as returned by `GET /users/{id}`.
///
/// Replaced as a whole on every fetch or update; never patched field by
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  #[serde(rename = "_id")]
  pub id:          String,
  pub name:        Name,
  pub email:       String,
  #[serde(default)]
  pub phone:       String,
  #[serde(default)]
  pub address:     Option<Address>,
  #[serde(default)]
  pub image:       Option<Image>,
  #[serde(default)]
  pub is_business: bool,
  #[serde(default)]
  pub is_admin:    bool,
}

impl UserProfile {
  pub fn display_name(&self) -> String { self.name.full() }
}
