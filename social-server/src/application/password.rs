use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};

use crate::domain::error::DomainError;

/// One-way salted Argon2id hash in PHC string format.
pub(crate) fn hash_password(raw_password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = argon2()?
        .hash_password(raw_password.as_bytes(), &salt)
        .map_err(|err| DomainError::Unexpected(err.to_string()))?;
    Ok(password_hash.to_string())
}

fn argon2() -> Result<Argon2<'static>, DomainError> {
    let params = Params::new(19 * 1024, 2, 1, None)
        .map_err(|err| DomainError::Unexpected(err.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

#[cfg(test)]
mod tests {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    use super::{argon2, hash_password};

    #[test]
    fn hash_is_salted_and_verifiable() {
        let first = hash_password("correct-horse").expect("hash must be created");
        let second = hash_password("correct-horse").expect("hash must be created");

        assert_ne!(first, second);
        assert!(!first.contains("correct-horse"));
        assert!(first.starts_with("$argon2id$"));

        let parsed = PasswordHash::new(&first).expect("hash must parse");
        let verifier = argon2().expect("params must be valid");
        assert!(verifier.verify_password(b"correct-horse", &parsed).is_ok());
        assert!(verifier.verify_password(b"wrong-horse", &parsed).is_err());
    }
}
