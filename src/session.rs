//! Who is logged in. The session is an explicit object handed to the HTTP
//! client; it is started on login and ended on logout, and persisted to a
//! small JSON file so separate CLI invocations share it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Vendor,
    #[serde(other)]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Vendor => "vendor",
            Role::User => "user",
        };
        f.write_str(name)
    }
}

/// Flags kept for the logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub role: Role,
    #[serde(alias = "name")]
    pub display_name: String,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn can_manage_categories(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Shared, explicit session state for the request layer
#[derive(Debug, Default)]
pub struct SessionContext {
    current: RwLock<Option<Session>>,
}

impl SessionContext {
    pub fn new(initial: Option<Session>) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Start a session, replacing any previous one
    pub fn begin(&self, session: Session) {
        info!("Session started for {} ({})", session.display_name, session.role);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(session);
    }

    /// End the session, returning it if there was one
    pub fn end(&self) -> Option<Session> {
        self.current.write().unwrap_or_else(|e| e.into_inner()).take()
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Bearer token of the active session
    pub fn token(&self) -> Option<String> {
        self.current()
            .filter(Session::is_authenticated)
            .map(|session| session.token)
    }
}

/// On-disk home of the session flags
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session; a missing file means logged out
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            debug!("No session file at {}", self.path.display());
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file {}", self.path.display()))?;
        let session = serde_json::from_str(&raw)
            .with_context(|| format!("Session file {} is corrupt", self.path.display()))?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file {}", self.path.display()))
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Session {
        Session {
            token: "tok-123".to_string(),
            role: Role::Admin,
            display_name: "Ada".to_string(),
        }
    }

    fn temp_store(name: &str) -> SessionStore {
        let path = std::env::temp_dir().join(format!("directory-desk-{}-{}.json", name, std::process::id()));
        SessionStore::new(path)
    }

    #[test]
    fn test_context_lifecycle() {
        let context = SessionContext::default();
        assert_eq!(context.token(), None);

        context.begin(admin());
        assert_eq!(context.token().as_deref(), Some("tok-123"));

        assert_eq!(context.end(), Some(admin()));
        assert_eq!(context.current(), None);
    }

    #[test]
    fn test_empty_token_is_not_authenticated() {
        let context = SessionContext::new(Some(Session {
            token: String::new(),
            ..admin()
        }));
        assert_eq!(context.token(), None);
    }

    #[test]
    fn test_store_round_trip_and_clear() {
        let store = temp_store("roundtrip");
        store.save(&admin()).unwrap();
        assert_eq!(store.load().unwrap(), Some(admin()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_login_response_shape() {
        let session: Session =
            serde_json::from_str(r#"{"token": "t", "role": "superuser", "name": "Sam"}"#).unwrap();
        assert_eq!(session.role, Role::User);
        assert_eq!(session.display_name, "Sam");
        assert!(!session.can_manage_categories());
    }
}
