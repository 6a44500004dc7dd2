use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsUser {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user: ClaimsUser,
    /// Issued-at, unix seconds.
    pub iat: i64,
}

/// Issues and checks `base64url(payload).base64url(hmac_sha256(payload))`
/// session tokens.
#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.key).map_err(|_| AuthError::InvalidKey)
    }

    pub fn sign(&self, user_id: &str) -> Result<String, AuthError> {
        let claims = Claims {
            user: ClaimsUser {
                id: user_id.to_string(),
            },
            iat: chrono::Utc::now().timestamp(),
        };
        let payload = serde_json::to_vec(&claims).map_err(AuthError::Decode)?;
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac()?;
        mac.update(payload_b64.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload_b64}.{sig}"))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let (payload_b64, sig_b64) = token.trim().split_once('.').ok_or(AuthError::Malformed)?;
        let sig = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| AuthError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&sig).map_err(|_| AuthError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::Malformed)?;
        serde_json::from_slice(&payload).map_err(AuthError::Decode)
    }
}
