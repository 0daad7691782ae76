//! Session lifecycle, route access and like reconciliation for bcard.
//!
//! [`SessionManager`] is the only writer of the process-wide [`SessionState`].
//! Everything else ([`AccessWatch`], [`FavoriteReconciler`], [`CardList`])
//! observes it through a `tokio::sync::watch` receiver.

pub mod access;
pub mod config;
pub mod list;
pub mod manager;
pub mod reconciler;

pub use access::AccessWatch;
pub use config::SessionConfig;
pub use list::{CardList, ListFilter};
pub use manager::{InvalidReason, SessionManager, SessionState, SessionTicket, Transition};
pub use reconciler::{FavoriteReconciler, PendingToggle, ToggleOutcome};
