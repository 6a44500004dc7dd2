use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SCHEME: &str = "sha256";

/// Salted, iterated SHA-256 password hashes in the form
/// `sha256$<rounds>$<salt>$<digest>`.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    rounds: u32,
}

impl PasswordHasher {
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
        }
    }

    pub fn hash(&self, password: &str) -> String {
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let digest = derive(password, &salt, self.rounds);
        format!(
            "{SCHEME}${}${salt}${}",
            self.rounds,
            STANDARD_NO_PAD.encode(digest)
        )
    }

    /// Rounds are read from the stored hash, so changing the configured
    /// rounds does not invalidate existing users.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let mut parts = stored.split('$');
        let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };
        let Ok(rounds) = rounds.parse::<u32>() else {
            return false;
        };
        let Ok(expected) = STANDARD_NO_PAD.decode(expected) else {
            return false;
        };

        let actual = derive(password, salt, rounds.max(1));
        actual.as_slice().ct_eq(expected.as_slice()).into()
    }
}

fn derive(password: &str, salt: &str, rounds: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());

    for _ in 1..rounds {
        let mut hasher = Sha256::new();
        hasher.update(out);
        hasher.update(salt.as_bytes());
        out.copy_from_slice(&hasher.finalize());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = PasswordHasher::new(50);
        let stored = h.hash("hunter22");
        assert!(stored.starts_with("sha256$50$"));
        assert!(h.verify("hunter22", &stored));
        assert!(!h.verify("hunter23", &stored));
    }

    #[test]
    fn salts_differ_per_hash() {
        let h = PasswordHasher::new(10);
        assert_ne!(h.hash("same"), h.hash("same"));
    }

    #[test]
    fn rounds_come_from_stored_hash() {
        let stored = PasswordHasher::new(7).hash("pw123");
        assert!(PasswordHasher::new(10_000).verify("pw123", &stored));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        let h = PasswordHasher::new(10);
        for bad in ["", "plain", "md5$1$s$d", "sha256$x$s$d", "sha256$1$s$d$extra"] {
            assert!(!h.verify("pw", bad), "{bad} should not verify");
        }
    }

    #[test]
    fn truncated_digest_never_verifies() {
        let h = PasswordHasher::new(3);
        let stored = h.hash("pw123");
        let (prefix, digest) = stored.rsplit_once('$').unwrap();
        let truncated = format!("{prefix}${}", &digest[..digest.len() - 4]);
        assert!(!h.verify("pw123", &truncated));
        assert!(!h.verify("pw123", &format!("{prefix}$")));
    }
}
