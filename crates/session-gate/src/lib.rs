//! Operator Session Gate
//!
//! Binary access decision for dashboard routes: either the request carries
//! a cookie naming a live operator session, or it does not. Session
//! issuance and credential policy live behind the [`SessionStore`]
//! collaborator; the gate itself holds no persistent state.
//!
//! Device-facing routes never consult this gate. That is a deliberate
//! trust boundary (the embedded client sits inside the network perimeter),
//! not an oversight; hardening it means product-level changes, not a
//! silent gate here.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Name of the session cookie issued at login.
pub const SESSION_COOKIE: &str = "session";

/// An authenticated dashboard operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorIdentity {
    pub id: Uuid,
    pub username: String,
}

impl OperatorIdentity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
        }
    }
}

/// Outcome of [`AccessGate::authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    pub authenticated: bool,
    pub identity: Option<OperatorIdentity>,
}

impl AuthDecision {
    fn denied() -> Self {
        Self {
            authenticated: false,
            identity: None,
        }
    }
}

/// Session resolution collaborator. The gate only ever asks "does this
/// opaque token name a live operator session".
pub trait SessionStore: Send + Sync {
    /// Resolve a token to its operator, if the session is live.
    fn resolve(&self, token: &str) -> Option<OperatorIdentity>;

    /// Start a session for `identity`, returning the opaque token.
    fn issue(&self, identity: OperatorIdentity) -> String;

    /// End a session. Revoking an unknown token is a no-op.
    fn revoke(&self, token: &str);
}

/// In-memory session store.
#[derive(Default)]
pub struct MemorySessions {
    sessions: Mutex<HashMap<String, OperatorIdentity>>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessions {
    fn resolve(&self, token: &str) -> Option<OperatorIdentity> {
        self.sessions
            .lock()
            .ok()
            .and_then(|s| s.get(token).cloned())
    }

    fn issue(&self, identity: OperatorIdentity) -> String {
        let token = Uuid::new_v4().to_string();
        if let Ok(mut sessions) = self.sessions.lock() {
            debug!(username = %identity.username, "issued operator session");
            sessions.insert(token.clone(), identity);
        }
        token
    }

    fn revoke(&self, token: &str) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(token);
        }
    }
}

/// Gate in front of operator-only routes.
pub struct AccessGate {
    sessions: Arc<dyn SessionStore>,
}

impl AccessGate {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    /// Decide from the raw `Cookie` header value. Takes the header as a
    /// plain string so the gate stays free of any HTTP framework types.
    pub fn authorize(&self, cookie_header: Option<&str>) -> AuthDecision {
        let Some(token) = cookie_header.and_then(session_token) else {
            return AuthDecision::denied();
        };
        match self.sessions.resolve(token) {
            Some(identity) => AuthDecision {
                authenticated: true,
                identity: Some(identity),
            },
            None => AuthDecision::denied(),
        }
    }
}

/// Pull the session token out of a `Cookie` header value.
pub fn session_token(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })
}

/// Compare a candidate password against a stored SHA-256 hex digest.
pub fn verify_password(candidate: &str, expected_sha256_hex: &str) -> bool {
    let digest = Sha256::digest(candidate.as_bytes());
    hex::encode(digest).eq_ignore_ascii_case(expected_sha256_hex)
}

/// Hex SHA-256 digest of a password, for seeding configuration.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
