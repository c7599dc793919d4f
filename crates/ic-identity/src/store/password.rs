//! Password policy and hashing
//!
//! Argon2id hashes with a policy taken from `[password]` configuration.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use ic_config::PasswordConfig;

use crate::shared::error::{IdentityError, Result};

#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::from(&PasswordConfig::default())
    }
}

impl From<&PasswordConfig> for PasswordPolicy {
    fn from(config: &PasswordConfig) -> Self {
        Self {
            min_length: config.min_length,
            max_length: 128,
            require_uppercase: config.require_uppercase,
            require_lowercase: config.require_lowercase,
            require_digit: config.require_digit,
            require_special: config.require_special,
        }
    }
}

impl PasswordPolicy {
    /// Every rule the password breaks, empty when it passes.
    pub fn violations(&self, password: &str) -> Vec<String> {
        let mut errors = Vec::new();
        let length = password.chars().count();

        if length < self.min_length {
            errors.push(format!("Password must be at least {} characters", self.min_length));
        }
        if length > self.max_length {
            errors.push(format!("Password must be at most {} characters", self.max_length));
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            errors.push("Password must contain at least one uppercase letter".to_string());
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            errors.push("Password must contain at least one lowercase letter".to_string());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("Password must contain at least one digit".to_string());
        }
        if self.require_special && password.chars().all(|c| c.is_alphanumeric()) {
            errors.push("Password must contain at least one special character".to_string());
        }

        errors
    }

    pub fn validate(&self, password: &str) -> Result<()> {
        let errors = self.violations(password);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(IdentityError::validation(errors.join("; ")))
        }
    }
}

pub struct PasswordService {
    argon2: Argon2<'static>,
    policy: PasswordPolicy,
}

impl PasswordService {
    pub fn new(policy: PasswordPolicy) -> Self {
        Self {
            argon2: Argon2::default(),
            policy,
        }
    }

    /// Cheap parameters for tests.
    pub fn testing(policy: PasswordPolicy) -> Result<Self> {
        let params = Params::new(4096, 1, 1, Some(32))
            .map_err(|e| IdentityError::internal(format!("Invalid Argon2 params: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            policy,
        })
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Check the policy, then hash.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        self.policy.validate(password)?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| IdentityError::internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| IdentityError::internal(format!("Invalid password hash format: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(IdentityError::internal(format!("Password verification error: {}", e))),
        }
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(PasswordPolicy::default())
    }
}
