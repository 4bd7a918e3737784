use bcrypt::{hash, verify, DEFAULT_COST};

use crate::errors::AppResult;

pub fn hash_password(plain: &str) -> AppResult<String> {
    Ok(hash(plain.as_bytes(), DEFAULT_COST)?)
}

pub fn verify_password(plain: &str, hashed: &str) -> AppResult<bool> {
    Ok(verify(plain, hashed)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hashed = hash_password("print-queue-pass").unwrap();
        assert!(verify_password("print-queue-pass", &hashed).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hashed = hash_password("correct-password").unwrap();
        assert!(!verify_password("wrong-password", &hashed).unwrap());
    }
}
