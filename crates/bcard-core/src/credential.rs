//! Credentials and the identity decoder.
//!
//! A credential is a signed `header.payload.signature` token issued by the
//! remote service. Only the payload is decoded here; the signature is the
//! server's business. Decoding is strict: a missing or ill-typed claim fails
//! the whole decode, so there is no such thing as a partial [`IdentityClaim`].

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Credential ──────────────────────────────────────────────────────────────

/// An opaque bearer token. `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
  pub fn new(token: impl Into<String>) -> Self { Self(token.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Credential(<redacted>)")
  }
}

impl From<String> for Credential {
  fn from(token: String) -> Self { Self(token) }
}

// ─── Identity claim ──────────────────────────────────────────────────────────

/// The identity embedded in a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaim {
  pub subject_id:  String,
  pub is_business: bool,
  pub expires_at:  DateTime<Utc>,
}

impl IdentityClaim {
  /// A claim expiring exactly at `now` is already expired.
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    self.expires_at <= now
  }

  /// Return the claim if it is still valid at `now`.
  pub fn validate_at(self, now: DateTime<Utc>) -> Result<Self> {
    if self.is_expired_at(now) {
      return Err(Error::ExpiredCredential(self.expires_at));
    }
    Ok(self)
  }
}

/// Wire shape of the token payload. Unknown claims (`iat`, `isAdmin`, ...) are
/// ignored.
#[derive(Deserialize)]
struct RawClaim {
  #[serde(rename = "_id", alias = "subjectId")]
  subject_id:  String,
  #[serde(rename = "isBusiness")]
  is_business: bool,
  #[serde(rename = "exp", alias = "expiresAt")]
  expires_at:  NumericDate,
}

/// Seconds since the epoch. Fractional values are allowed and truncated to
/// whole seconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumericDate {
  Whole(i64),
  Fractional(f64),
}

impl NumericDate {
  fn whole_seconds(self) -> i64 {
    match self {
      Self::Whole(secs) => secs,
      Self::Fractional(secs) => secs.trunc() as i64,
    }
  }
}

// ─── Decoder ─────────────────────────────────────────────────────────────────

/// Decode the identity claim embedded in `credential`.
///
/// Fails with [`Error::MalformedCredential`] when the token does not have
/// three segments, the payload is not base64url JSON, or any required claim
/// is missing or has the wrong type. Expiry is *not* checked here; see
/// [`IdentityClaim::validate_at`].
pub fn decode(credential: &Credential) -> Result<IdentityClaim> {
  let mut segments = credential.as_str().trim().split('.');
  let (Some(_header), Some(payload), Some(_signature), None) = (
    segments.next(),
    segments.next(),
    segments.next(),
    segments.next(),
  ) else {
    return Err(Error::MalformedCredential(
      "expected three dot-separated segments".into(),
    ));
  };

  let bytes = B64
    .decode(payload.trim_end_matches('='))
    .map_err(|e| Error::MalformedCredential(format!("payload is not base64url: {e}")))?;

  let raw: RawClaim = serde_json::from_slice(&bytes)
    .map_err(|e| Error::MalformedCredential(format!("payload claims: {e}")))?;

  if raw.subject_id.trim().is_empty() {
    return Err(Error::MalformedCredential("subject id is empty".into()));
  }

  let exp = raw.expires_at.whole_seconds();
  let expires_at = DateTime::from_timestamp(exp, 0)
    .ok_or_else(|| Error::MalformedCredential(format!("exp {exp} is out of range")))?;

  Ok(IdentityClaim {
    subject_id: raw.subject_id,
    is_business: raw.is_business,
    expires_at,
  })
}
