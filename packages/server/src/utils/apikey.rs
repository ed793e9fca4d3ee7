use rand::RngCore;
use sha2::{Digest, Sha256};

/// Prefix on every issued key, so keys are recognizable in logs and configs.
pub const KEY_PREFIX: &str = "ak_";

const KEY_BYTES: usize = 24;

/// Generate a fresh plaintext API key (`ak_` + 48 hex chars).
///
/// Returned to the caller exactly once at registration; only the digest is
/// ever stored.
pub fn generate() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    format!("{KEY_PREFIX}{}", hex::encode(bytes))
}

/// SHA-256 digest of a key as lowercase hex, the stored form.
pub fn hash(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_have_expected_shape() {
        let key = generate();
        assert!(key.starts_with(KEY_PREFIX));
        assert_eq!(key.len(), KEY_PREFIX.len() + KEY_BYTES * 2);
        assert!(key[KEY_PREFIX.len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_keys_are_unique() {
        assert_ne!(generate(), generate());
    }

    #[test]
    fn hash_is_stable_and_key_dependent() {
        let key = generate();
        assert_eq!(hash(&key), hash(&key));
        assert_ne!(hash(&key), hash("ak_other"));
        // hex-encoded SHA-256
        assert_eq!(hash(&key).len(), 64);
    }
}
