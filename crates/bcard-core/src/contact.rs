//! Contact-detail sub-types shared by user profiles and cards.
//!
//! Field names follow the remote service's camelCase JSON.

use serde::{Deserialize, Serialize};

/// A person's structured name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
  pub first:  String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub middle: Option<String>,
  pub last:   String,
}

impl Name {
  /// First, middle and last joined with single spaces, skipping blanks.
  pub fn full(&self) -> String {
    [Some(self.first.as_str()), self.middle.as_deref(), Some(self.last.as_str())]
      .into_iter()
      .flatten()
      .map(str::trim)
      .filter(|part| !part.is_empty())
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// A remote image reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
  pub url: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub alt: Option<String>,
}

/// A postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
  #[serde(default)]
  pub state:        Option<String>,
  pub country:      String,
  pub city:         String,
  pub street:       String,
  pub house_number: u32,
  /// Sent as a number by some endpoints and a string by others.
  #[serde(default, with = "zip")]
  pub zip:          Option<String>,
}

mod zip {
  use serde::{Deserialize, Deserializer, Serialize, Serializer};

  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Number(u64),
    Text(String),
  }

  pub fn serialize<S: Serializer>(
    value: &Option<String>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    value.serialize(serializer)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<String>, D::Error> {
    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
      Raw::Number(n) => n.to_string(),
      Raw::Text(s) => s,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn full_name_skips_missing_middle() {
    let name = Name { first: "Dana".into(), middle: None, last: "Levi".into() };
    assert_eq!(name.full(), "Dana Levi");

    let name = Name {
      first:  "Dana".into(),
      middle: Some("  ".into()),
      last:   "Levi".into(),
    };
    assert_eq!(name.full(), "Dana Levi");
  }

  #[test]
  fn zip_accepts_number_or_string() {
    let json = r#"{"country":"IL","city":"Haifa","street":"Herzl","houseNumber":4,"zip":3303}"#;
    let addr: Address = serde_json::from_str(json).unwrap();
    assert_eq!(addr.zip.as_deref(), Some("3303"));

    let json = r#"{"country":"IL","city":"Haifa","street":"Herzl","houseNumber":4,"zip":"3303"}"#;
    let addr: Address = serde_json::from_str(json).unwrap();
    assert_eq!(addr.zip.as_deref(), Some("3303"));

    let json = r#"{"country":"IL","city":"Haifa","street":"Herzl","houseNumber":4}"#;
    let addr: Address = serde_json::from_str(json).unwrap();
    assert_eq!(addr.zip, None);
  }
}
