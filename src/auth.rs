//! Login verification.
//!
//! Access is gated behind a shared secret. The check itself is pluggable: a
//! [`CredentialVerifier`] exposes a single verify operation, and the shipped
//! implementation compares against secrets sourced from configuration rather
//! than embedded constants.

/// Verifies operator login credentials.
pub trait CredentialVerifier: Send + Sync {
    /// Returns true if the supplied id/password pair is acceptable.
    fn verify(&self, id: &str, password: &str) -> bool;
}

/// Verifier backed by a single configured id/password pair.
#[derive(Debug, Clone)]
pub struct StaticVerifier {
    id: String,
    password: String,
}

impl StaticVerifier {
    /// Creates a verifier for the given pair.
    pub fn new(id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            password: password.into(),
        }
    }
}

impl CredentialVerifier for StaticVerifier {
    fn verify(&self, id: &str, password: &str) -> bool {
        id == self.id && password == self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_verifier() {
        let verifier = StaticVerifier::new("admin", "s3cret");
        assert!(verifier.verify("admin", "s3cret"));
        assert!(!verifier.verify("admin", "wrong"));
        assert!(!verifier.verify("other", "s3cret"));
        assert!(!verifier.verify("", ""));
    }
}
