//! [`FavoriteReconciler`]: optimistic like toggles confirmed by the server.
//!
//! The local card is flipped immediately so a view can show the new state,
//! then overwritten by whatever the server returns. If the request fails,
//! times out, or the session changes while it is outstanding, the card goes
//! back to exactly what it was before the toggle.
//!
//! The toggle endpoint is a blind flip. A response lost after the server
//! applied it looks like a failure here, and retrying would flip again, so
//! nothing in this module retries on its own.

use std::{
  collections::HashSet,
  sync::{Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use tokio::sync::watch;
use tracing::{debug, warn};

use bcard_core::{Error, Result, card::Card, directory::Directory};

use crate::{
  config::SessionConfig,
  manager::{SessionState, SessionTicket},
};

/// `(subject_id, card_id)`
type ToggleKey = (String, String);

/// Result of a confirmed toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
  /// Whether the current user likes the card according to the server.
  pub liked: bool,
}

pub struct FavoriteReconciler<D> {
  directory: D,
  sessions:  watch::Receiver<SessionState>,
  timeout:   Duration,
  in_flight: Mutex<HashSet<ToggleKey>>,
}

impl<D: Directory> FavoriteReconciler<D> {
  pub fn new(
    directory: D,
    sessions: watch::Receiver<SessionState>,
    config: &SessionConfig,
  ) -> Self {
    Self {
      directory,
      sessions,
      timeout: config.toggle_timeout(),
      in_flight: Mutex::new(HashSet::new()),
    }
  }

  /// Liking is only offered to signed-in users.
  pub fn is_offered(&self) -> bool { self.sessions.borrow().ticket().is_some() }

  /// Whether the current user has a toggle outstanding for `card_id`.
  pub fn is_in_flight(&self, card_id: &str) -> bool {
    let Some(subject_id) = self.sessions.borrow().session.subject_id().map(str::to_owned)
    else {
      return false;
    };
    self.lock().contains(&(subject_id, card_id.to_owned()))
  }

  /// Flip the current user's like on `card` and wait for the server.
  ///
  /// On success `card` is replaced by the server's copy. On any failure, or
  /// if the returned future is dropped early, it is restored to its value
  /// before the call. Views that must render the flipped card while the
  /// request is outstanding use [`FavoriteReconciler::begin`] instead.
  pub async fn toggle_like(&self, card: &mut Card) -> Result<ToggleOutcome> {
    let pending = self.begin(card)?;
    let optimistic = Optimistic {
      before: Some(pending.before.clone()),
      card,
    };
    let subject_id = pending.ticket.subject_id.clone();

    let confirmed = pending.confirm().await?;
    let liked = confirmed.is_liked_by(&subject_id);
    optimistic.confirm(confirmed);
    Ok(ToggleOutcome { liked })
  }

  /// Apply the optimistic flip to `card` and reserve the toggle slot, without
  /// sending anything yet.
  ///
  /// `card` is free to be read and rendered while the returned
  /// [`PendingToggle`] is outstanding. Nothing is flipped on error.
  pub fn begin(&self, card: &mut Card) -> Result<PendingToggle<'_, D>> {
    let ticket = self.sessions.borrow().ticket().ok_or(Error::Unauthorized)?;
    let intent = self.reserve(&ticket.subject_id, &card.id)?;

    let before = card.clone();
    let liked = card.toggle_like(&ticket.subject_id);
    debug!(card_id = %card.id, liked, "optimistic like toggle applied");

    Ok(PendingToggle {
      reconciler: self,
      card_id: card.id.clone(),
      ticket,
      before,
      liked,
      _intent: intent,
    })
  }

  fn reserve(&self, subject_id: &str, card_id: &str) -> Result<ToggleIntent<'_>> {
    let key = (subject_id.to_owned(), card_id.to_owned());
    if !self.lock().insert(key.clone()) {
      return Err(Error::ToggleInFlight(card_id.to_owned()));
    }
    Ok(ToggleIntent {
      in_flight: &self.in_flight,
      key,
    })
  }

  fn lock(&self) -> MutexGuard<'_, HashSet<ToggleKey>> {
    self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// An outstanding toggle; releases its slot when dropped, including when the
/// toggling future is cancelled.
struct ToggleIntent<'a> {
  in_flight: &'a Mutex<HashSet<ToggleKey>>,
  key:       ToggleKey,
}

impl Drop for ToggleIntent<'_> {
  fn drop(&mut self) {
    self
      .in_flight
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&self.key);
  }
}

/// A like flip that has been applied locally but not yet sent.
///
/// Holds the toggle slot for its card until it is confirmed or dropped.
pub struct PendingToggle<'r, D> {
  reconciler: &'r FavoriteReconciler<D>,
  card_id:    String,
  ticket:     SessionTicket,
  before:     Card,
  liked:      bool,
  _intent:    ToggleIntent<'r>,
}

impl<D: Directory> PendingToggle<'_, D> {
  pub fn card_id(&self) -> &str { &self.card_id }

  /// The liked state shown while the request is outstanding.
  pub fn liked(&self) -> bool { self.liked }

  /// The card as it was before the flip. Put it back if
  /// [`PendingToggle::confirm`] fails or is abandoned.
  pub fn before(&self) -> &Card { &self.before }

  /// Send the toggle and return the server's copy of the card, which the
  /// caller should store as is.
  ///
  /// Fails if the request fails, times out, returns a different card, or the
  /// session changed while it was outstanding. The caller then restores
  /// [`PendingToggle::before`].
  pub async fn confirm(self) -> Result<Card> {
    let card_id = self.card_id;
    let reconciler = self.reconciler;

    let response = tokio::time::timeout(
      reconciler.timeout,
      reconciler.directory.toggle_like(&self.ticket.credential, &card_id),
    )
    .await;

    if reconciler.sessions.borrow().epoch != self.ticket.epoch {
      debug!(%card_id, "session changed mid-toggle; response dropped");
      return Err(Error::SessionChanged(card_id));
    }

    let reason = match response {
      Ok(Ok(confirmed)) if confirmed.id == card_id => return Ok(confirmed),
      Ok(Ok(other)) => format!("server answered with card {}", other.id),
      Ok(Err(e)) => e.to_string(),
      Err(_) => format!("no response within {}s", reconciler.timeout.as_secs()),
    };

    warn!(%card_id, %reason, "like toggle failed");
    Err(Error::ToggleRejected { card_id, reason })
  }
}

/// A card with an unconfirmed like flip applied. Restores the original card
/// on drop unless [`Optimistic::confirm`] was called.
struct Optimistic<'c> {
  card:   &'c mut Card,
  before: Option<Card>,
}

impl Optimistic<'_> {
  /// Replace the card with the server's copy; no merge with local state.
  fn confirm(mut self, confirmed: Card) {
    *self.card = confirmed;
    self.before = None;
  }
}

impl Drop for Optimistic<'_> {
  fn drop(&mut self) {
    if let Some(before) = self.before.take() {
      *self.card = before;
    }
  }
}
