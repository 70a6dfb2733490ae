//! Authenticator implementation

use super::types::{AuthDecision, Credentials, UserEntry};
use base64::Engine;
use std::collections::HashMap;
use tracing::debug;

const BASIC_PREFIX: &str = "Basic ";
const BEARER_PREFIX: &str = "Bearer ";

/// Checks inbound Basic credentials against the user table
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    users: HashMap<String, UserEntry>,
}

impl Authenticator {
    /// Create an authenticator over `users`; later duplicates replace earlier ones
    pub fn new(users: impl IntoIterator<Item = UserEntry>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|user| (user.username.clone(), user))
                .collect(),
        }
    }

    /// Number of known users
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the user table is empty
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Look up a user by verified credentials
    pub fn verify(&self, credentials: &Credentials) -> Option<&UserEntry> {
        self.users
            .get(&credentials.username)
            .filter(|user| user.password == credentials.password)
    }

    /// Decide whether a request carrying `authorization` may call `route`
    pub fn authorize(&self, authorization: Option<&str>, route: &str) -> AuthDecision {
        let Some(credentials) = authorization.and_then(parse_basic_header) else {
            return AuthDecision::Unauthorized;
        };

        match self.verify(&credentials) {
            None => {
                debug!("Rejected credentials for user '{}'", credentials.username);
                AuthDecision::Unauthorized
            }
            Some(user) if !user.may_access(route) => AuthDecision::Forbidden {
                username: user.username.clone(),
            },
            Some(user) => AuthDecision::Granted {
                username: user.username.clone(),
            },
        }
    }
}

/// Decode an `Authorization: Basic <base64(user:pass)>` value
pub fn parse_basic_header(value: &str) -> Option<Credentials> {
    let value = value.trim();
    let encoded = value
        .get(..BASIC_PREFIX.len())
        .filter(|scheme| scheme.eq_ignore_ascii_case(BASIC_PREFIX))
        .map(|_| value[BASIC_PREFIX.len()..].trim())?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Upstream `Authorization` value for a caller's API key
pub fn bearer_credential(api_key: &str) -> String {
    format!("{BEARER_PREFIX}{}", api_key.trim())
}
