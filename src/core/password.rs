//! Salted PBKDF2-HMAC-SHA256 password hashes.
//!
//! Stored format: `pbkdf2:sha256:<iterations>$<salt>$<hex digest>`.

use pbkdf2::pbkdf2_hmac;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::Sha256;

const METHOD_PREFIX: &str = "pbkdf2:sha256:";
const SALT_LENGTH: usize = 16;
const DIGEST_LENGTH: usize = 32;

#[cfg(not(test))]
const DEFAULT_ITERATIONS: u32 = 600_000;
// Debug builds are slow at the real work factor; verification reads the count from the hash.
#[cfg(test)]
const DEFAULT_ITERATIONS: u32 = 1_000;

/// Hash a password with a fresh random salt
pub fn generate_password_hash(password: &str) -> String {
    let salt: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect();
    let digest = hash_with(password, &salt, DEFAULT_ITERATIONS);
    format!("{}{}${}${}", METHOD_PREFIX, DEFAULT_ITERATIONS, salt, digest)
}

/// Check a password against a stored hash; malformed hashes never match
pub fn check_password_hash(stored: &str, password: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(method), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let iterations = match method.strip_prefix(METHOD_PREFIX).map(str::parse::<u32>) {
        Some(Ok(iterations)) if iterations > 0 => iterations,
        _ => return false,
    };

    let actual = hash_with(password, salt, iterations);
    constant_time_eq(actual.as_bytes(), expected.as_bytes())
}

fn hash_with(password: &str, salt: &str, iterations: u32) -> String {
    let mut digest = [0u8; DIGEST_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut digest);
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
