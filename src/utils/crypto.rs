use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

const TIME_COST: u32 = 2;
const MEMORY_COST_KIB: u32 = 102_400;
const PARALLELISM: u32 = 8;
const HASH_LENGTH: usize = 32;

/// Argon2id with the server pepper as the keyed secret. An empty pepper
/// hashes without a secret.
fn hasher(pepper: &[u8]) -> Result<Argon2<'_>, password_hash::Error> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, Some(HASH_LENGTH))?;
    if pepper.is_empty() {
        return Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params));
    }
    Ok(Argon2::new_with_secret(
        pepper,
        Algorithm::Argon2id,
        Version::V0x13,
        params,
    )?)
}

pub fn hash_password(plain: &str, pepper: &[u8]) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = hasher(pepper)?
        .hash_password(plain.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(
    plain: &str,
    hashed: &str,
    pepper: &[u8],
) -> Result<bool, password_hash::Error> {
    let parsed_hash = PasswordHash::new(hashed)?;
    let ok = hasher(pepper)?
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok();
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("hunter2", b"").unwrap();
        assert!(hashed.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hashed, b"").unwrap());
        assert!(!verify_password("hunter3", &hashed, b"").unwrap());
    }

    #[test]
    fn pepper_must_match() {
        let hashed = hash_password("hunter2", b"pepper").unwrap();
        assert!(verify_password("hunter2", &hashed, b"pepper").unwrap());
        assert!(!verify_password("hunter2", &hashed, b"salt").unwrap());
        assert!(!verify_password("hunter2", &hashed, b"").unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password("x", "not-a-hash", b"").is_err());
    }
}
