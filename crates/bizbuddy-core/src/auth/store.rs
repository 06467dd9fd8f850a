use std::sync::Mutex;

use anyhow::{Context, Result};
use keyring::Entry;

/// Keychain service name; the token lives under this service.
const SERVICE_NAME: &str = "bizbuddy";

/// Well-known key for the single bearer token.
const TOKEN_KEY: &str = "session-token";

/// Durable persistence for the bearer token.
///
/// The store holds at most one token and performs no validation of its
/// shape; only the `SessionController` writes to it.
pub trait TokenStore: Send + Sync {
    /// Overwrite any existing token.
    fn save(&self, token: &str) -> Result<()>;

    /// The currently stored token, if any.
    fn load(&self) -> Result<Option<String>>;

    /// Remove the token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}

/// Token persistence backed by the OS keychain.
///
/// Survives process restarts for the same OS user.
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, TOKEN_KEY).context("Failed to create keyring entry")
    }
}

impl TokenStore for KeyringTokenStore {
    fn save(&self, token: &str) -> Result<()> {
        Self::entry()?
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn load(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read token from keychain"),
        }
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

/// In-process token store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().unwrap().clone())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save("tok1").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok1"));

        // Save overwrites, never appends
        store.save("tok2").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok2"));
    }

    #[test]
    fn test_memory_store_clear_is_idempotent() {
        let store = MemoryTokenStore::new();
        store.save("tok1").unwrap();

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        // Clearing an already-empty store succeeds
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
