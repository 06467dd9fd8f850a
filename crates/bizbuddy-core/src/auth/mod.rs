//! Session and credential management.
//!
//! This module provides:
//! - `store`: durable persistence for the single bearer token
//! - `session`: the verification seam and the `SessionController` that owns
//!   the published session state
//!
//! Exactly one token exists at a time; it is created on login/registration
//! and destroyed on logout or when verification rejects it.

pub mod session;
pub mod store;

pub use session::{
    AuthBackend, InvalidCredential, RegisterOutcome, SessionController, SessionState,
};
pub use store::{KeyringTokenStore, MemoryTokenStore, TokenStore};
