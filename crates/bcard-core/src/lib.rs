//! Core types and trait definitions for the bcard session layer.
//!
//! This crate is free of HTTP and database dependencies. It owns the identity
//! decoder, the access guard, and the traits that storage and transport
//! backends implement.

pub mod card;
pub mod contact;
pub mod credential;
pub mod directory;
pub mod error;
pub mod guard;
pub mod profile;
pub mod session;
pub mod store;

pub use error::{Error, Result};
