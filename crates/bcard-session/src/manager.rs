//! [`SessionManager`]: the session lifecycle state machine.
//!
//! ```text
//!              hydrate (credential stored)
//!  Anonymous ─────────────────────────────▶ Hydrating
//!      ▲  ▲                                  │     │
//!      │  │ logout         profile fetched   │     │ decode / expiry /
//!      │  └────────── Authenticated ◀────────┘     │ fetch failure
//!      │                    ▲                      ▼
//!      │                    │ login             Invalid
//!      └────────────────────┴───────────────────────┘
//!                        (store cleared)
//! ```
//!
//! Every transition that starts or ends a session bumps the epoch. Responses
//! to requests issued under an older epoch are discarded, which is how a
//! logout racing a hydration wins.

use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

use bcard_core::{
  Error,
  credential::{self, Credential, IdentityClaim},
  directory::Directory,
  guard::Role,
  profile::UserProfile,
  session::{Phase, Session},
  store::CredentialStore,
};

use crate::{access::AccessWatch, config::SessionConfig};

// ─── Published state ─────────────────────────────────────────────────────────

/// What the manager publishes to observers.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
  pub phase:   Phase,
  pub session: Session,
  /// Bumped by hydration start, login, logout and invalidation.
  pub epoch:   u64,
  /// The credential behind the current (or hydrating) session.
  credential:  Option<Credential>,
}

impl SessionState {
  /// Everything needed to issue a request on behalf of the signed-in user,
  /// or `None` unless the session is authenticated.
  pub fn ticket(&self) -> Option<SessionTicket> {
    if self.phase != Phase::Authenticated {
      return None;
    }
    Some(SessionTicket {
      credential: self.credential.clone()?,
      subject_id: self.session.subject_id()?.to_owned(),
      epoch:      self.epoch,
    })
  }
}

/// A snapshot of the authenticated session taken when a request is issued.
#[derive(Debug, Clone)]
pub struct SessionTicket {
  pub credential: Credential,
  pub subject_id: String,
  pub epoch:      u64,
}

// ─── Transition results ──────────────────────────────────────────────────────

/// Why a credential was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
  Malformed,
  Expired,
  ProfileFetchFailed,
  TimedOut,
}

impl InvalidReason {
  fn of(err: &Error) -> Self {
    match err {
      Error::ExpiredCredential(_) => Self::Expired,
      Error::MalformedCredential(_) => Self::Malformed,
      _ => Self::ProfileFetchFailed,
    }
  }
}

/// The outcome of a manager operation. Credential problems are reported here
/// and in the published state, never as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  /// A session now exists.
  Authenticated,
  /// A session already existed (or a concurrent hydration produced one).
  AlreadyAuthenticated,
  /// No session: nothing stored, or signed out.
  Anonymous,
  /// Nothing to do.
  Unchanged,
  /// The credential was rejected, the store cleared and the session reset.
  Invalidated(InvalidReason),
  /// The response belonged to a session that has since ended; ignored.
  Discarded,
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Owns the [`SessionState`] and every transition of it.
///
/// Store writes and state changes are serialised by an async mutex; remote
/// fetches run outside it so that logout is never blocked by a slow network.
pub struct SessionManager<C, D> {
  store:       C,
  directory:   D,
  config:      SessionConfig,
  state:       watch::Sender<SessionState>,
  transitions: Mutex<()>,
}

enum HydrationStart {
  Fetch { epoch: u64, credential: Credential },
  Join { epoch: u64 },
  Done(Transition),
}

impl<C, D> SessionManager<C, D>
where
  C: CredentialStore,
  D: Directory,
{
  pub fn new(store: C, directory: D, config: SessionConfig) -> Self {
    let (state, _) = watch::channel(SessionState::default());
    Self {
      store,
      directory,
      config,
      state,
      transitions: Mutex::new(()),
    }
  }

  // ── Observation ───────────────────────────────────────────────────────────

  pub fn subscribe(&self) -> watch::Receiver<SessionState> {
    self.state.subscribe()
  }

  pub fn state(&self) -> SessionState { self.state.borrow().clone() }

  pub fn session(&self) -> Session { self.state.borrow().session.clone() }

  pub fn phase(&self) -> Phase { self.state.borrow().phase }

  /// A guard handle for a view requiring `required`, re-evaluated on every
  /// session change.
  pub fn access(&self, required: Option<Role>) -> AccessWatch {
    AccessWatch::new(self.subscribe(), required)
  }

  pub fn store(&self) -> &C { &self.store }

  pub fn directory(&self) -> &D { &self.directory }

  // ── Hydration ─────────────────────────────────────────────────────────────

  /// Turn the stored credential, if any, into a live session.
  ///
  /// A no-op when already authenticated. A second call for a credential that
  /// is already hydrating waits for the first instead of fetching again.
  pub async fn hydrate(&self) -> Transition {
    let (epoch, credential) = match self.start_hydration().await {
      HydrationStart::Fetch { epoch, credential } => (epoch, credential),
      HydrationStart::Join { epoch } => return self.join_hydration(epoch).await,
      HydrationStart::Done(transition) => return transition,
    };
    // Reverts to Anonymous if this future is dropped mid-fetch.
    let _pending = PendingHydration {
      state: &self.state,
      epoch,
    };

    let identity = match Self::validate(&credential) {
      Ok(identity) => identity,
      Err(e) => {
        warn!(error = %e, "stored credential rejected");
        return self.invalidate(Some(epoch), InvalidReason::of(&e)).await;
      }
    };

    let subject_id = identity.subject_id.clone();
    debug!(%subject_id, epoch, "fetching profile");
    let fetched = tokio::time::timeout(
      self.config.fetch_timeout(),
      self.directory.fetch_profile(&credential, &subject_id),
    )
    .await;

    let profile = match fetched {
      Ok(Ok(profile)) => profile,
      Ok(Err(e)) => {
        warn!(%subject_id, error = %e, "profile fetch failed");
        return self
          .invalidate(Some(epoch), InvalidReason::ProfileFetchFailed)
          .await;
      }
      Err(_) => {
        warn!(
          %subject_id,
          timeout_secs = self.config.fetch_timeout_secs,
          "profile fetch timed out"
        );
        return self.invalidate(Some(epoch), InvalidReason::TimedOut).await;
      }
    };

    let _guard = self.transitions.lock().await;
    let applied = self.state.send_if_modified(|s| {
      if s.epoch != epoch {
        return false;
      }
      s.phase = Phase::Authenticated;
      s.session = Session::authenticated(identity, profile);
      true
    });

    if applied {
      info!(%subject_id, "session authenticated");
      Transition::Authenticated
    } else {
      debug!(%subject_id, epoch, "discarding stale profile response");
      Transition::Discarded
    }
  }

  async fn start_hydration(&self) -> HydrationStart {
    let _guard = self.transitions.lock().await;

    if self.phase() == Phase::Authenticated {
      return HydrationStart::Done(Transition::AlreadyAuthenticated);
    }

    let credential = match self.store.get().await {
      Ok(Some(credential)) => credential,
      Ok(None) => return HydrationStart::Done(Transition::Anonymous),
      Err(e) => {
        error!(error = %e, "reading stored credential failed");
        return HydrationStart::Done(Transition::Anonymous);
      }
    };

    let mut start = None;
    self.state.send_if_modified(|s| {
      if s.phase == Phase::Hydrating && s.credential.as_ref() == Some(&credential) {
        start = Some(HydrationStart::Join { epoch: s.epoch });
        return false;
      }
      s.epoch += 1;
      s.phase = Phase::Hydrating;
      s.session = Session::empty();
      s.credential = Some(credential.clone());
      start = Some(HydrationStart::Fetch {
        epoch: s.epoch,
        credential,
      });
      true
    });
    start.unwrap_or(HydrationStart::Done(Transition::Unchanged))
  }

  async fn join_hydration(&self, epoch: u64) -> Transition {
    debug!(epoch, "hydration already in flight; waiting for it");
    let mut rx = self.state.subscribe();
    let phase = match rx
      .wait_for(|s| s.epoch != epoch || s.phase != Phase::Hydrating)
      .await
    {
      Ok(s) => s.phase,
      Err(_) => Phase::Anonymous,
    };
    match phase {
      Phase::Authenticated => Transition::AlreadyAuthenticated,
      _ => Transition::Anonymous,
    }
  }

  // ── Login / logout ────────────────────────────────────────────────────────

  /// Enter a session handed over by the sign-in flow, without re-fetching the
  /// profile. The credential is persisted for the next start.
  pub async fn login(&self, credential: Credential, profile: UserProfile) -> Transition {
    let identity = match Self::validate(&credential) {
      Ok(identity) => identity,
      Err(e) => {
        warn!(error = %e, "credential handed to login rejected");
        return self.invalidate(None, InvalidReason::of(&e)).await;
      }
    };
    let subject_id = identity.subject_id.clone();

    let _guard = self.transitions.lock().await;
    if let Err(e) = self.store.set(&credential).await {
      error!(error = %e, "persisting credential failed; session will not survive a restart");
    }
    self.state.send_modify(|s| {
      s.epoch += 1;
      s.phase = Phase::Authenticated;
      s.session = Session::authenticated(identity, profile);
      s.credential = Some(credential);
    });

    info!(%subject_id, "signed in");
    Transition::Authenticated
  }

  /// End the session and forget the stored credential. No network calls.
  ///
  /// A credential that was stored but never hydrated is still removed, and
  /// that counts as signing out. `Unchanged` means there was neither a
  /// session nor a stored credential.
  pub async fn logout(&self) -> Transition {
    let _guard = self.transitions.lock().await;
    let stored = match self.store.get().await {
      Ok(credential) => credential.is_some(),
      Err(e) => {
        error!(error = %e, "reading stored credential failed");
        false
      }
    };
    if let Err(e) = self.store.clear().await {
      error!(error = %e, "clearing stored credential failed");
    }
    let changed = self.state.send_if_modified(|s| {
      if s.phase == Phase::Anonymous {
        return false;
      }
      s.epoch += 1;
      s.phase = Phase::Anonymous;
      s.session = Session::empty();
      s.credential = None;
      true
    });

    if changed || stored {
      info!("signed out");
      Transition::Anonymous
    } else {
      Transition::Unchanged
    }
  }

  /// Swap in the profile returned by a successful update round trip.
  ///
  /// Returns `false` unless `profile` belongs to the authenticated subject.
  pub fn replace_profile(&self, profile: UserProfile) -> bool {
    self.state.send_if_modified(|s| {
      s.phase == Phase::Authenticated && s.session.replace_profile(profile)
    })
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  fn validate(credential: &Credential) -> Result<IdentityClaim, Error> {
    credential::decode(credential)?.validate_at(Utc::now())
  }

  /// Reset to an empty session and clear the store. With `Some(epoch)` this
  /// only happens if that epoch is still current.
  ///
  /// `Invalid` and `Anonymous` are published back to back with no await in
  /// between, so a caller dropped while the store is cleared never leaves
  /// the phase at `Invalid`. The rejected credential may then survive in the
  /// store; the next hydration rejects it again.
  async fn invalidate(&self, expected: Option<u64>, reason: InvalidReason) -> Transition {
    let _guard = self.transitions.lock().await;
    let invalid = self.state.send_if_modified(|s| {
      if expected.is_some_and(|epoch| epoch != s.epoch) {
        return false;
      }
      s.epoch += 1;
      s.phase = Phase::Invalid;
      s.session = Session::empty();
      s.credential = None;
      true
    });
    if !invalid {
      return Transition::Discarded;
    }
    self.state.send_modify(|s| s.phase = Phase::Anonymous);
    warn!(?reason, "session invalidated");

    if let Err(e) = self.store.clear().await {
      error!(error = %e, "clearing rejected credential failed");
    }
    Transition::Invalidated(reason)
  }
}

/// Drop guard for an in-flight hydration. If the hydrating future is dropped
/// before it resolves, the phase falls back to `Anonymous` so later calls do
/// not wait on a fetch that will never finish. The stored credential is kept.
struct PendingHydration<'a> {
  state: &'a watch::Sender<SessionState>,
  epoch: u64,
}

impl Drop for PendingHydration<'_> {
  fn drop(&mut self) {
    let epoch = self.epoch;
    self.state.send_if_modified(|s| {
      if s.epoch != epoch || s.phase != Phase::Hydrating {
        return false;
      }
      s.phase = Phase::Anonymous;
      s.credential = None;
      true
    });
  }
}
