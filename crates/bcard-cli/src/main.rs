//! `bcard`: command-line client for the business-card directory.
//!
//! # Usage
//!
//! ```text
//! bcard sign-in --email dana@example.com
//! bcard whoami
//! bcard cards --favorites
//! bcard like 65f1c0ffee
//! bcard guard --role business
//! bcard logout
//! ```
//!
//! The credential is kept in a local SQLite file between invocations.

mod client;
mod config;

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use bcard_core::{
  credential,
  guard::{Access, Role},
  session::Session,
};
use bcard_session::{CardList, FavoriteReconciler, SessionManager, Transition};
use bcard_store_sqlite::SqliteCredentialStore;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{
  client::ApiClient,
  config::{ClientConfig, expand_tilde},
};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "bcard", version, about = "Business-card directory client")]
struct Cli {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "~/.config/bcard/config.toml")]
  config: PathBuf,

  /// Base URL of the bcard service (overrides the config file).
  #[arg(long)]
  base_url: Option<String>,

  /// SQLite file holding the stored credential (overrides the config file).
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Sign in with email and password and remember the credential.
  SignIn {
    #[arg(long)]
    email:    String,
    #[arg(long, env = "BCARD_PASSWORD", hide_env_values = true)]
    password: String,
  },
  /// Show the signed-in user, restoring the session from the stored credential.
  Whoami,
  /// Forget the stored credential.
  Logout,
  /// List cards.
  Cards {
    /// Only cards liked by the signed-in user.
    #[arg(long)]
    favorites: bool,
  },
  /// Like or un-like a card.
  Like {
    #[arg(value_name = "CARD_ID")]
    card_id: String,
  },
  /// Check whether the current session may enter a protected view.
  Guard {
    #[arg(long, value_enum)]
    role: Option<RoleArg>,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RoleArg {
  Business,
  Admin,
}

impl From<RoleArg> for Role {
  fn from(arg: RoleArg) -> Self {
    match arg {
      RoleArg::Business => Role::Business,
      RoleArg::Admin => Role::Admin,
    }
  }
}

type Manager = SessionManager<SqliteCredentialStore, ApiClient>;

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let mut cfg = ClientConfig::load(&expand_tilde(&cli.config))?;
  if let Some(base_url) = cli.base_url {
    cfg.base_url = base_url;
  }
  if let Some(store) = cli.store {
    cfg.store_path = expand_tilde(&store);
  }

  if let Some(parent) = cfg.store_path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteCredentialStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  let api = ApiClient::new(&cfg.base_url).context("failed to build HTTP client")?;
  let manager = SessionManager::new(store, api, cfg.session.clone());

  match cli.command {
    Command::SignIn { email, password } => sign_in(&manager, &email, &password).await,
    Command::Whoami => whoami(&manager).await,
    Command::Logout => {
      match manager.logout().await {
        Transition::Unchanged => println!("Not signed in."),
        _ => println!("Signed out."),
      }
      Ok(())
    }
    Command::Cards { favorites } => cards(&manager, favorites).await,
    Command::Like { card_id } => like(&manager, &cfg, &card_id).await,
    Command::Guard { role } => guard(&manager, role.map(Role::from)).await,
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn sign_in(manager: &Manager, email: &str, password: &str) -> Result<()> {
  let api = manager.directory();
  let credential = api.sign_in(email, password).await.context("sign-in failed")?;
  let claim = credential::decode(&credential).context("service issued an unreadable credential")?;
  let profile = api
    .get_user(&credential, &claim.subject_id)
    .await
    .map_err(|e| bcard_core::Error::ProfileFetchFailed(e.to_string()))?;
  let name = profile.display_name();

  match manager.login(credential, profile).await {
    Transition::Authenticated => {
      println!("Signed in as {name}.");
      Ok(())
    }
    other => bail!("sign-in was not accepted ({other:?})"),
  }
}

/// Restore the session from the stored credential and report what happened.
async fn restore(manager: &Manager) -> Session {
  match manager.hydrate().await {
    Transition::Invalidated(reason) => {
      eprintln!("Stored credential was discarded ({reason:?}); please sign in again.");
    }
    Transition::Discarded => eprintln!("Session changed while restoring it."),
    _ => {}
  }
  manager.session()
}

async fn whoami(manager: &Manager) -> Result<()> {
  let session = restore(manager).await;
  let (Some(identity), Some(profile)) = (session.identity(), session.profile()) else {
    println!("Anonymous.");
    return Ok(());
  };

  println!("{} <{}>", profile.display_name(), profile.email);
  println!("  id:       {}", identity.subject_id);
  println!("  business: {}", profile.is_business);
  println!("  admin:    {}", profile.is_admin);
  println!("  expires:  {}", identity.expires_at.to_rfc3339());
  Ok(())
}

async fn cards(manager: &Manager, favorites: bool) -> Result<()> {
  let session = restore(manager).await;
  let all = manager
    .directory()
    .list_cards()
    .await
    .context("failed to list cards")?;

  let list = if favorites {
    let Some(subject_id) = session.subject_id() else {
      bail!(bcard_core::Error::Unauthorized);
    };
    CardList::favorites_of(subject_id, all)
  } else {
    CardList::all(all)
  };

  for card in list.cards() {
    let mark = match session.subject_id() {
      Some(me) if card.is_liked_by(me) => "♥",
      _ => " ",
    };
    println!(
      "{mark} {id}  {title} ({likes} likes)",
      id = card.id,
      title = card.title,
      likes = card.likes.len()
    );
  }
  if list.is_empty() {
    println!("No cards.");
  }
  Ok(())
}

async fn like(manager: &Manager, cfg: &ClientConfig, card_id: &str) -> Result<()> {
  restore(manager).await;
  let reconciler = FavoriteReconciler::new(
    manager.directory().clone(),
    manager.subscribe(),
    &cfg.session,
  );
  if !reconciler.is_offered() {
    bail!(bcard_core::Error::Unauthorized);
  }

  let card = manager
    .directory()
    .get_card(card_id)
    .await
    .with_context(|| format!("failed to load card {card_id}"))?;
  let mut list = CardList::all(vec![card]);
  let outcome = list.toggle_like(&reconciler, card_id).await?;

  let likes = list.get(card_id).map_or(0, |c| c.likes.len());
  if outcome.liked {
    println!("Liked {card_id} ({likes} likes).");
  } else {
    println!("Un-liked {card_id} ({likes} likes).");
  }
  Ok(())
}

async fn guard(manager: &Manager, role: Option<Role>) -> Result<()> {
  restore(manager).await;
  match manager.access(role).current() {
    Access::Allow => println!("allow"),
    Access::Deny(denial) => {
      let reason = bcard_core::Error::from(denial);
      println!("deny: {reason} (redirect to {})", denial.redirect().path());
    }
  }
  Ok(())
}
