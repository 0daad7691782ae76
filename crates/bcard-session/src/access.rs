//! [`AccessWatch`]: a route guard that follows the session.

use tokio::sync::watch;

use bcard_core::guard::{Access, Role, can_enter};

use crate::manager::SessionState;

/// Re-runs [`can_enter`] for one protected view every time the session
/// changes, so a logout while the view is mounted revokes access at once.
#[derive(Debug, Clone)]
pub struct AccessWatch {
  sessions: watch::Receiver<SessionState>,
  required: Option<Role>,
}

impl AccessWatch {
  pub fn new(sessions: watch::Receiver<SessionState>, required: Option<Role>) -> Self {
    Self { sessions, required }
  }

  pub fn required(&self) -> Option<Role> { self.required }

  /// The decision for the session as it is right now.
  pub fn current(&self) -> Access {
    can_enter(&self.sessions.borrow().session, self.required)
  }

  /// Wait for the next session change and return the new decision.
  ///
  /// Returns `None` once the session manager has been dropped.
  pub async fn changed(&mut self) -> Option<Access> {
    self.sessions.changed().await.ok()?;
    let access = can_enter(&self.sessions.borrow_and_update().session, self.required);
    Some(access)
  }
}
