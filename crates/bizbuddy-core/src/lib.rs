//! Core library for the BizBuddy terminal client.
//!
//! BizBuddy is a business-advice chat service; this crate holds everything a
//! front-end needs to talk to it:
//!
//! - `api`: HTTP client for the backend (login, registration, token
//!   verification, asking questions)
//! - `auth`: credential storage and the session controller that owns the
//!   published session state
//! - `models`: wire and domain types
//! - `config`: on-disk configuration
//! - `history`: chat transcript persistence

pub mod api;
pub mod auth;
pub mod config;
pub mod history;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{
    AuthBackend, InvalidCredential, KeyringTokenStore, MemoryTokenStore, RegisterOutcome,
    SessionController, SessionState, TokenStore,
};
pub use config::Config;
pub use history::HistoryStore;
pub use models::{AdviceField, ChatAnswer, ChatMessage, Identity, LoginResponse, Sender};
