//! Data models for the BizBuddy client.
//!
//! - `user`: the authenticated identity and the login response envelope
//! - `chat`: advice fields, chat answers, and transcript messages

pub mod chat;
pub mod user;

pub use chat::{AdviceField, ChatAnswer, ChatMessage, Sender};
pub use user::{Identity, LoginResponse};
