use keyring::Entry;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Keys the client keeps in session storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Token,
    TenantId,
    Environment,
    User,
}

impl SessionKey {
    pub const ALL: [SessionKey; 4] = [
        SessionKey::Token,
        SessionKey::TenantId,
        SessionKey::Environment,
        SessionKey::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::Token => "token",
            SessionKey::TenantId => "tenant_id",
            SessionKey::Environment => "environment",
            SessionKey::User => "user",
        }
    }
}

/// Storage for the token, tenant and user of the signed-in session.
///
/// Read on every request. A 401 clears every key.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> Option<String>;
    fn set(&self, key: SessionKey, value: String);
    fn remove(&self, key: SessionKey);

    fn clear(&self) {
        for key in SessionKey::ALL {
            self.remove(key);
        }
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<SessionKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(SessionKey::Token, token.into());
        store
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn set(&self, key: SessionKey, value: String) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    fn remove(&self, key: SessionKey) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
    }
}

/// Session storage in the OS keychain, one entry per key under a single
/// service name.
pub struct KeyringSessionStore {
    service: String,
}

impl KeyringSessionStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: SessionKey) -> Option<Entry> {
        match Entry::new(&self.service, key.as_str()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Keychain unavailable for {}: {}", key.as_str(), e);
                None
            }
        }
    }
}

impl SessionStore for KeyringSessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        let entry = self.entry(key)?;
        match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                tracing::warn!("Failed to read {} from keychain: {}", key.as_str(), e);
                None
            }
        }
    }

    fn set(&self, key: SessionKey, value: String) {
        if let Some(entry) = self.entry(key) {
            if let Err(e) = entry.set_password(&value) {
                tracing::warn!("Failed to store {} in keychain: {}", key.as_str(), e);
            }
        }
    }

    fn remove(&self, key: SessionKey) {
        if let Some(entry) = self.entry(key) {
            match entry.delete_password() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => tracing::warn!("Failed to delete {} from keychain: {}", key.as_str(), e),
            }
        }
    }
}

/// Sends the user back to the login entry point once the session is gone
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, login_path: &str);
}

/// Redirect for headless use: records the event and leaves navigation to the caller
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        tracing::warn!("Session expired, sign in again at {}", login_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_clear_removes_every_key() {
        let store = MemorySessionStore::with_token("abc");
        store.set(SessionKey::TenantId, "tenant-1".to_string());
        store.set(SessionKey::User, "{\"id\":1}".to_string());

        assert_eq!(store.get(SessionKey::Token).as_deref(), Some("abc"));

        store.clear();
        for key in SessionKey::ALL {
            assert!(store.get(key).is_none());
        }

        // clearing twice is harmless
        store.clear();
    }
}
