//! REST API client module for the BizBuddy backend.
//!
//! This module provides the `ApiClient` for communicating with the advice
//! service: authentication endpoints and the chat endpoint.
//!
//! Authentication uses a bearer token obtained from the login endpoint;
//! the chat endpoint accepts the token but also serves anonymous callers.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
