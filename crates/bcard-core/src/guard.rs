//! Route access decisions.
//!
//! [`can_enter`] is pure: the router calls it with the current [`Session`]
//! and acts on the decision. Re-evaluating on session changes is the job of
//! the caller (see `bcard_session::AccessWatch`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, session::Session};

/// An elevated capability a view may require on top of being signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Business,
  Admin,
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Business => "business",
      Self::Admin => "admin",
    })
  }
}

/// Where the router should send a denied user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
  SignIn,
  Home,
}

impl Redirect {
  pub fn path(self) -> &'static str {
    match self {
      Self::SignIn => "/signin",
      Self::Home => "/",
    }
  }
}

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
  /// Nobody is signed in.
  Unauthorized,
  /// Signed in, but without the required role.
  Forbidden(Role),
}

impl Denial {
  pub fn redirect(self) -> Redirect {
    match self {
      Self::Unauthorized => Redirect::SignIn,
      Self::Forbidden(_) => Redirect::Home,
    }
  }
}

impl From<Denial> for Error {
  fn from(denial: Denial) -> Self {
    match denial {
      Denial::Unauthorized => Error::Unauthorized,
      Denial::Forbidden(role) => Error::Forbidden(role),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  Allow,
  Deny(Denial),
}

impl Access {
  pub fn is_allowed(self) -> bool { matches!(self, Self::Allow) }
}

/// Decide whether `session` may enter a view requiring `required`.
///
/// Role checks read the profile, not the token claim: the profile is the
/// fresher of the two.
pub fn can_enter(session: &Session, required: Option<Role>) -> Access {
  if !session.is_authenticated() {
    return Access::Deny(Denial::Unauthorized);
  }
  let Some(role) = required else {
    return Access::Allow;
  };
  let granted = session.profile().is_some_and(|p| match role {
    Role::Business => p.is_business,
    Role::Admin => p.is_admin,
  });
  if granted {
    Access::Allow
  } else {
    Access::Deny(Denial::Forbidden(role))
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};

  use super::*;
  use crate::{contact::Name, credential::IdentityClaim, profile::UserProfile};

  fn session(is_business: bool, is_admin: bool) -> Session {
    let identity = IdentityClaim {
      subject_id:  "u42".into(),
      is_business,
      expires_at:  Utc::now() + Duration::hours(1),
    };
    let profile = UserProfile {
      id:          "u42".into(),
      name:        Name { first: "Noa".into(), middle: None, last: "Cohen".into() },
      email:       "noa@example.com".into(),
      phone:       String::new(),
      address:     None,
      image:       None,
      is_business,
      is_admin,
    };
    Session::authenticated(identity, profile)
  }

  #[test]
  fn anonymous_is_sent_to_sign_in() {
    for required in [None, Some(Role::Business), Some(Role::Admin)] {
      let access = can_enter(&Session::empty(), required);
      assert_eq!(access, Access::Deny(Denial::Unauthorized));
    }
    assert_eq!(Denial::Unauthorized.redirect().path(), "/signin");
  }

  #[test]
  fn regular_user_is_sent_home_from_business_views() {
    let s = session(false, false);
    assert_eq!(can_enter(&s, None), Access::Allow);
    assert_eq!(
      can_enter(&s, Some(Role::Business)),
      Access::Deny(Denial::Forbidden(Role::Business))
    );
    assert_eq!(Denial::Forbidden(Role::Business).redirect(), Redirect::Home);
  }

  #[test]
  fn business_flag_grants_business_views() {
    for (is_business, is_admin) in [(false, false), (false, true), (true, false), (true, true)] {
      let s = session(is_business, is_admin);
      assert_eq!(can_enter(&s, Some(Role::Business)).is_allowed(), is_business);
      assert_eq!(can_enter(&s, Some(Role::Admin)).is_allowed(), is_admin);
    }
  }

  #[test]
  fn denial_converts_into_error() {
    assert!(matches!(Error::from(Denial::Unauthorized), Error::Unauthorized));
    assert!(matches!(
      Error::from(Denial::Forbidden(Role::Admin)),
      Error::Forbidden(Role::Admin)
    ));
  }
}
