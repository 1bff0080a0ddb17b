use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Keyed hashing of national registration numbers.
///
/// The plaintext number is never persisted; the engine stores only the
/// HMAC-SHA256 digest, which is stable per key and therefore usable for
/// duplicate detection and history lookups. Verification goes through the
/// MAC's constant-time comparison.
#[derive(Clone)]
pub struct IdentityHasher {
    key: Vec<u8>,
}

impl IdentityHasher {
    pub fn new(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }

    fn normalize(registration_number: &str) -> String {
        registration_number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect()
    }

    /// HMAC-SHA256 digest of the normalized number, hex-encoded (64 chars)
    pub fn identity_token(&self, registration_number: &str) -> String {
        let normalized = Self::normalize(registration_number);
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(normalized.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time check of a plaintext number against a stored token
    pub fn verify(&self, registration_number: &str, expected_token: &str) -> bool {
        let Ok(expected) = hex::decode(expected_token) else {
            return false;
        };
        let normalized = Self::normalize(registration_number);
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(normalized.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

impl std::fmt::Debug for IdentityHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // the key never reaches logs
        f.debug_struct("IdentityHasher").finish_non_exhaustive()
    }
}
