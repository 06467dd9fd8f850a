use serde::{Deserialize, Serialize};

/// The authenticated user's public profile as returned by the backend.
///
/// Never persisted by the client; always re-derived from the token via
/// verification or returned inline by login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: Identity,
}
