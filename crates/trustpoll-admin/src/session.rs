//! Admin session gate

/// Text shown when an identity is rejected or a command runs without a session.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized access";

/// Result of an authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub granted: bool,
}

/// Accepts exactly one configured admin identity.
#[derive(Debug, Clone)]
pub struct SessionGate {
    admin_identity: String,
}

impl SessionGate {
    /// Surrounding whitespace in the configured identity is ignored, as it
    /// is for the operator's input.
    pub fn new(admin_identity: impl Into<String>) -> Self {
        Self {
            admin_identity: admin_identity.into().trim().to_string(),
        }
    }

    /// Trimmed input must equal the admin identity byte for byte.
    pub fn check(&self, identity: &str) -> AccessDecision {
        AccessDecision {
            granted: identity.trim() == self.admin_identity,
        }
    }
}
