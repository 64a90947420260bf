use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as BASE64};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Bytes of entropy in a generated key.
const KEY_BYTES: usize = 32;

/// A freshly generated key: the raw secret for the caller and the digest
/// for storage.
pub struct GeneratedKey {
    pub raw: String,
    pub hash: String,
}

/// Generate a random API key and its storage hash.
pub fn generate_api_key() -> GeneratedKey {
    let mut bytes = [0u8; KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let raw = BASE64.encode(bytes);
    let hash = hash_api_key(&raw);
    GeneratedKey { raw, hash }
}

/// Lowercase hex SHA-256 of a raw key.
pub fn hash_api_key(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_hash_matches_raw() {
        let key = generate_api_key();
        assert_eq!(key.hash, hash_api_key(&key.raw));
        assert_eq!(key.hash.len(), 64);
        assert_ne!(key.raw, key.hash);
    }

    #[test]
    fn keys_are_unique() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert_ne!(a.raw, b.raw);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn known_digest() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
