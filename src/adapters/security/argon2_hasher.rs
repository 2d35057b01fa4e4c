//! Argon2id implementation of the PasswordHasher port. Hashes are stored in PHC string form.

use crate::domain::DomainError;
use crate::ports::PasswordHasher;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Library-default cost (19 MiB, 2 passes).
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Custom cost. Used to keep seeding and tests fast.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, DomainError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| DomainError::Repo(format!("invalid argon2 params: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        password_hash::PasswordHasher::hash_password(&self.argon2(), password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::Repo(format!("password hashing failed: {e}")))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, DomainError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| DomainError::Repo(format!("unreadable password hash: {e}")))?;
        // Cost parameters come from the stored hash, so older hashes keep verifying.
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(DomainError::Repo(format!("password verification failed: {e}"))),
        }
    }
}
