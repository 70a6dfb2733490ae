//! Auth types

use serde::{Deserialize, Serialize};

/// One API user
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Login name
    pub username: String,
    /// Password
    pub password: String,
    /// Routes this user may call; empty means every route
    #[serde(default)]
    pub allowed_routes: Vec<String>,
}

impl UserEntry {
    /// Unrestricted user
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            allowed_routes: Vec::new(),
        }
    }

    /// Restrict the user to `route` (may be called repeatedly)
    #[must_use]
    pub fn allow_route(mut self, route: impl Into<String>) -> Self {
        self.allowed_routes.push(route.into());
        self
    }

    /// Whether this user may call `route`
    pub fn may_access(&self, route: &str) -> bool {
        self.allowed_routes.is_empty() || self.allowed_routes.iter().any(|r| r == route)
    }
}

impl std::fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry")
            .field("username", &self.username)
            .field("password", &"****")
            .field("allowed_routes", &self.allowed_routes)
            .finish()
    }
}

/// Decoded Basic credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Result of checking a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// Known user allowed on the route
    Granted {
        /// Authenticated user
        username: String,
    },
    /// Missing, malformed or wrong credentials
    Unauthorized,
    /// Known user, route outside their restriction
    Forbidden {
        /// Authenticated user
        username: String,
    },
}
