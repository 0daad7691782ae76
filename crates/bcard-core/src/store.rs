//! The `CredentialStore` trait and an in-memory implementation.
//!
//! A credential store is a single durable slot. It performs no validation;
//! the session manager decides what a stored credential is worth.

use std::{
  convert::Infallible,
  future::Future,
  sync::{Arc, PoisonError, RwLock},
};

use crate::credential::Credential;

/// Key under which durable backends keep the current credential.
pub const TOKEN_KEY: &str = "token";

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A single-slot, last-writer-wins home for the current credential.
///
/// All methods return `Send` futures so stores can be shared across tasks.
pub trait CredentialStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The stored credential, or `None` when nobody is signed in.
  fn get(
    &self,
  ) -> impl Future<Output = Result<Option<Credential>, Self::Error>> + Send + '_;

  /// Replace whatever is stored with `credential`.
  fn set<'a>(
    &'a self,
    credential: &'a Credential,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove the stored credential. Clearing an empty store is not an error.
  fn clear(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── In-memory store ─────────────────────────────────────────────────────────

/// Process-local store; nothing survives a restart.
///
/// Cloning is cheap and clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
  slot: Arc<RwLock<Option<Credential>>>,
}

impl MemoryCredentialStore {
  pub fn new() -> Self { Self::default() }

  /// A store that already holds `credential`.
  pub fn with_credential(credential: Credential) -> Self {
    Self {
      slot: Arc::new(RwLock::new(Some(credential))),
    }
  }

  /// Synchronous peek, handy in tests and diagnostics.
  pub fn current(&self) -> Option<Credential> {
    self.slot.read().unwrap_or_else(PoisonError::into_inner).clone()
  }
}

impl CredentialStore for MemoryCredentialStore {
  type Error = Infallible;

  async fn get(&self) -> Result<Option<Credential>, Self::Error> {
    Ok(self.current())
  }

  async fn set(&self, credential: &Credential) -> Result<(), Self::Error> {
    *self.slot.write().unwrap_or_else(PoisonError::into_inner) =
      Some(credential.clone());
    Ok(())
  }

  async fn clear(&self) -> Result<(), Self::Error> {
    self.slot.write().unwrap_or_else(PoisonError::into_inner).take();
    Ok(())
  }
}
