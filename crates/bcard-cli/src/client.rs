//! Async HTTP client for the bcard REST service.

use std::time::Duration;

use bcard_core::{
  card::Card, credential::Credential, directory::Directory, profile::UserProfile,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{method} {path} → {status}")]
  Status {
    method: &'static str,
    path:   String,
    status: StatusCode,
  },

  #[error("sign-in returned an empty credential")]
  EmptyCredential,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Serialize)]
struct Login<'a> {
  email:    &'a str,
  password: &'a str,
}

/// Async HTTP client for the bcard JSON API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self {
      client,
      base_url: base_url.into(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url.trim_end_matches('/'), path)
  }

  async fn send(
    &self,
    method: &'static str,
    path: &str,
    req: RequestBuilder,
  ) -> Result<reqwest::Response> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
      tracing::debug!(method, path, %status, "request rejected");
      return Err(Error::Status {
        method,
        path: path.to_owned(),
        status,
      });
    }
    Ok(resp)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  /// `POST /users/login`. The service answers with the bare credential.
  pub async fn sign_in(&self, email: &str, password: &str) -> Result<Credential> {
    let path = "/users/login";
    let req = self
      .client
      .post(self.url(path))
      .json(&Login { email, password });
    let body = self.send("POST", path, req).await?.text().await?;

    let token = body.trim().trim_matches('"');
    if token.is_empty() {
      return Err(Error::EmptyCredential);
    }
    Ok(Credential::new(token))
  }

  /// `GET /users/{id}`, authorised with the `x-auth-token` header.
  pub async fn get_user(&self, credential: &Credential, id: &str) -> Result<UserProfile> {
    let path = format!("/users/{id}");
    let req = self
      .client
      .get(self.url(&path))
      .header("x-auth-token", credential.as_str());
    Ok(self.send("GET", &path, req).await?.json().await?)
  }

  // ── Cards ─────────────────────────────────────────────────────────────────

  /// `GET /cards`
  pub async fn list_cards(&self) -> Result<Vec<Card>> {
    let path = "/cards";
    let req = self.client.get(self.url(path));
    Ok(self.send("GET", path, req).await?.json().await?)
  }

  /// `GET /cards/{id}`
  pub async fn get_card(&self, id: &str) -> Result<Card> {
    let path = format!("/cards/{id}");
    let req = self.client.get(self.url(&path));
    Ok(self.send("GET", &path, req).await?.json().await?)
  }

  /// `PATCH /cards/{id}`: flip the caller's like.
  pub async fn patch_card_like(&self, credential: &Credential, id: &str) -> Result<Card> {
    let path = format!("/cards/{id}");
    let req = self
      .client
      .patch(self.url(&path))
      .bearer_auth(credential.as_str());
    Ok(self.send("PATCH", &path, req).await?.json().await?)
  }
}

impl Directory for ApiClient {
  type Error = Error;

  async fn fetch_profile(
    &self,
    credential: &Credential,
    subject_id: &str,
  ) -> Result<UserProfile> {
    self.get_user(credential, subject_id).await
  }

  async fn toggle_like(&self, credential: &Credential, card_id: &str) -> Result<Card> {
    self.patch_card_like(credential, card_id).await
  }
}
