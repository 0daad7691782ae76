//! Business cards and their `likes` relationship.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contact::{Address, Image};

/// A business card as returned by the `/cards` endpoints.
///
/// `likes` is the only field the session layer ever changes locally, and
/// only optimistically: the server's copy always replaces the local one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
  #[serde(rename = "_id")]
  pub id:          String,
  pub title:       String,
  #[serde(default)]
  pub subtitle:    String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub phone:       String,
  #[serde(default)]
  pub email:       String,
  #[serde(default)]
  pub web:         Option<String>,
  #[serde(default)]
  pub image:       Option<Image>,
  #[serde(default)]
  pub address:     Option<Address>,
  #[serde(default)]
  pub biz_number:  Option<u64>,
  /// Subject ids of every user who liked the card. A set, so each subject
  /// appears at most once.
  #[serde(default)]
  pub likes:       BTreeSet<String>,
  /// Owner of the card.
  #[serde(default, rename = "user_id")]
  pub owner_id:    Option<String>,
  #[serde(default)]
  pub created_at:  Option<DateTime<Utc>>,
}

impl Card {
  pub fn is_liked_by(&self, subject_id: &str) -> bool {
    self.likes.contains(subject_id)
  }

  /// Flip `subject_id`'s like locally and return the new liked state.
  pub fn toggle_like(&mut self, subject_id: &str) -> bool {
    if self.likes.remove(subject_id) {
      false
    } else {
      self.likes.insert(subject_id.to_owned());
      true
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn card(likes: &[&str]) -> Card {
    Card {
      id:          "c1".into(),
      title:       "Falafel Bros".into(),
      subtitle:    String::new(),
      description: String::new(),
      phone:       String::new(),
      email:       String::new(),
      web:         None,
      image:       None,
      address:     None,
      biz_number:  None,
      likes:       likes.iter().map(|s| s.to_string()).collect(),
      owner_id:    None,
      created_at:  None,
    }
  }

  #[test]
  fn toggle_flips_membership() {
    let mut c = card(&["u1"]);
    assert!(!c.toggle_like("u1"));
    assert!(c.likes.is_empty());
    assert!(c.toggle_like("u1"));
    assert!(c.is_liked_by("u1"));
    assert_eq!(c.likes.len(), 1);
  }

  #[test]
  fn duplicate_likes_collapse() {
    let json = r#"{"_id":"c1","title":"t","likes":["u1","u1","u2"]}"#;
    let c: Card = serde_json::from_str(json).unwrap();
    assert_eq!(c.likes.len(), 2);
  }

  #[test]
  fn parses_service_payload() {
    let json = r#"{
      "_id": "c9", "title": "Bakery", "subtitle": "Fresh bread",
      "description": "Open daily", "phone": "03-1234567",
      "email": "bake@example.com", "web": "https://bake.example.com",
      "image": { "url": "https://example.com/b.png", "alt": "bread" },
      "address": { "state": "", "country": "Israel", "city": "Jaffa",
                   "street": "Yefet", "houseNumber": 2, "zip": 0 },
      "bizNumber": 4321987, "likes": ["u3"], "user_id": "u5",
      "createdAt": "2024-03-01T10:00:00.000Z", "__v": 0
    }"#;
    let c: Card = serde_json::from_str(json).unwrap();
    assert_eq!(c.biz_number, Some(4_321_987));
    assert_eq!(c.owner_id.as_deref(), Some("u5"));
    assert!(c.is_liked_by("u3"));
    assert!(c.created_at.is_some());
  }
}
