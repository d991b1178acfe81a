//! Password hashing with Argon2id.

use argon2::{
    password_hash::{
        PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use rand::rngs::OsRng;

pub struct PasswordService;

impl PasswordService {
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }

    pub fn verify_password(
        password: &str,
        password_hash: &str,
    ) -> Result<bool, argon2::password_hash::Error> {
        let parsed_hash = PasswordHash::new(password_hash)?;
        let argon2 = Argon2::default();
        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_password() {
        let password = "secure_password_123";
        let hash = PasswordService::hash_password(password).expect("hashing should succeed");

        let is_valid = PasswordService::verify_password(password, &hash)
            .expect("verification should succeed");
        assert!(is_valid);
    }

    #[test]
    fn wrong_password_fails_verification() {
        let hash = PasswordService::hash_password("correct horse").expect("hashing should succeed");

        let is_valid = PasswordService::verify_password("battery staple", &hash)
            .expect("verification should succeed");
        assert!(!is_valid);
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = PasswordService::hash_password("12345678").unwrap();
        let second = PasswordService::hash_password("12345678").unwrap();
        assert_ne!(first, second);
    }
}
