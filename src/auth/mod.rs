//! Authentication module
//!
//! Inbound: HTTP Basic credentials checked against the configured user
//! table, with optional per-user route restriction.
//! Outbound: the caller's API key turned into the upstream bearer credential.

mod authenticator;
mod types;

pub use authenticator::{bearer_credential, parse_basic_header, Authenticator};
pub use types::{AuthDecision, Credentials, UserEntry};

#[cfg(test)]
mod tests;
