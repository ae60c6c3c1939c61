use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{Error, Result};

/// The one place that knows how account passwords are stored.
pub trait CredentialVerifier: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, stored: &str) -> Result<bool>;
}

/// argon2id with the crate's default parameters.
#[derive(Default)]
pub struct Argon2Credentials {
    argon2: Argon2<'static>,
}

impl Argon2Credentials {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom memory (KiB) and iteration cost, for constrained hosts and tests.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| Error::Config(format!("invalid argon2 params: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl CredentialVerifier for Argon2Credentials {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Credential(format!("failed to hash password: {e}")))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored)
            .map_err(|e| Error::Credential(format!("invalid password hash: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Credential(format!("failed to verify password: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_round_trip() {
        let creds = Argon2Credentials::new();
        let hash = creds.hash("1234").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(creds.verify("1234", &hash).unwrap());
        assert!(!creds.verify("12345", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salt() {
        let creds = Argon2Credentials::new();
        assert_ne!(creds.hash("secret").unwrap(), creds.hash("secret").unwrap());
    }

    #[test]
    fn test_cheap_cost_still_verifies() {
        let creds = Argon2Credentials::with_cost(1024, 1).unwrap();
        let hash = creds.hash("pw").unwrap();
        assert!(creds.verify("pw", &hash).unwrap());
        assert!(matches!(
            Argon2Credentials::with_cost(0, 1),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_plaintext_stored_value_is_rejected() {
        let creds = Argon2Credentials::new();
        assert!(matches!(
            creds.verify("1234", "1234"),
            Err(Error::Credential(_))
        ));
    }
}
