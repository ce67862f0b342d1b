use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::{
    config::SIGNING_KEY_LEN,
    error::{AppError, Result},
    models::session::Claims,
};

/// Header segment carried by every issued token.
const TOKEN_HEADER: &str = r#"{"alg":"BLAKE3-KEYED","typ":"JWT"}"#;

/// Why a token string could not be turned into claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Not three dot-separated segments.
    Malformed,
    /// The signature does not match the header and payload.
    BadSignature,
    /// The payload is not base64url-encoded structured data.
    Undecodable,
    /// The payload carries no expiry.
    MissingExpiry,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClaims {
    user_id: Option<Uuid>,
    email: Option<String>,
    exp: Option<i64>,
}

/// Signs and verifies session tokens with a keyed BLAKE3 MAC.
#[derive(Clone)]
pub struct TokenSigner {
    key: Arc<Zeroizing<[u8; SIGNING_KEY_LEN]>>,
}

impl TokenSigner {
    /// Creates a signer from raw key bytes.
    ///
    /// # Arguments
    ///
    /// * `key` - Exactly 32 bytes of key material.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `TokenSigner`.
    pub fn new(key: &[u8]) -> Result<Self> {
        let mut bytes = Zeroizing::new([0u8; SIGNING_KEY_LEN]);
        if key.len() != SIGNING_KEY_LEN {
            return Err(AppError::Internal(format!(
                "Signing key must be {} bytes, got {}",
                SIGNING_KEY_LEN,
                key.len()
            )));
        }
        bytes.copy_from_slice(key);
        Ok(Self { key: Arc::new(bytes) })
    }

    fn mac(&self, signing_input: &str) -> blake3::Hash {
        blake3::keyed_hash(&self.key, signing_input.as_bytes())
    }

    /// Joins already-encoded header and payload segments with their signature.
    pub(crate) fn seal(&self, header: &str, payload: &str) -> String {
        let signing_input = format!("{}.{}", header, payload);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&signing_input).as_bytes());
        format!("{}.{}", signing_input, signature)
    }

    /// Encodes and signs `claims`.
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        let header = URL_SAFE_NO_PAD.encode(TOKEN_HEADER);
        let payload = URL_SAFE_NO_PAD.encode(sonic_rs::to_string(claims)?);
        Ok(self.seal(&header, &payload))
    }

    /// Checks the signature of `token` and decodes its claims.
    ///
    /// Expiry is not checked here, only its presence.
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(TokenError::Malformed);
        };

        let provided = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::BadSignature)?;
        let expected = self.mac(&format!("{}.{}", header, payload));
        if !bool::from(expected.as_bytes().as_slice().ct_eq(provided.as_slice())) {
            return Err(TokenError::BadSignature);
        }

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Undecodable)?;
        let raw: RawClaims =
            sonic_rs::from_slice(&payload_bytes).map_err(|_| TokenError::Undecodable)?;

        let exp = raw.exp.ok_or(TokenError::MissingExpiry)?;
        let user_id = raw.user_id.ok_or(TokenError::Undecodable)?;

        Ok(Claims {
            user_id,
            email: raw.email.unwrap_or_default(),
            exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(&[42u8; SIGNING_KEY_LEN]).unwrap()
    }

    fn claims() -> Claims {
        Claims {
            user_id: Uuid::new_v4(),
            email: "demo@example.com".to_string(),
            exp: 1_700_000_000,
        }
    }

    #[test]
    fn signed_token_has_three_segments_and_verifies() {
        let signer = signer();
        let claims = claims();
        let token = signer.sign(&claims).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(signer.verify(&token), Ok(claims));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        let signer = signer();
        assert_eq!(signer.verify(""), Err(TokenError::Malformed));
        assert_eq!(signer.verify("a.b"), Err(TokenError::Malformed));
        assert_eq!(signer.verify("a.b.c.d"), Err(TokenError::Malformed));
    }

    #[test]
    fn rejects_tampered_payload() {
        let signer = signer();
        let token = signer.sign(&claims()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut forged = claims();
        forged.exp = i64::MAX;
        let forged_payload = URL_SAFE_NO_PAD.encode(sonic_rs::to_string(&forged).unwrap());
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(signer.verify(&tampered), Err(TokenError::BadSignature));
    }

    #[test]
    fn rejects_token_from_another_key() {
        let other = TokenSigner::new(&[7u8; SIGNING_KEY_LEN]).unwrap();
        let token = other.sign(&claims()).unwrap();
        assert_eq!(signer().verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn rejects_constant_demo_signature() {
        let header = URL_SAFE_NO_PAD.encode(TOKEN_HEADER);
        let payload = URL_SAFE_NO_PAD.encode(sonic_rs::to_string(&claims()).unwrap());
        let token = format!("{}.{}.{}", header, payload, URL_SAFE_NO_PAD.encode("demo-signature"));
        assert_eq!(signer().verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn rejects_undecodable_payload() {
        let signer = signer();
        let header = URL_SAFE_NO_PAD.encode(TOKEN_HEADER);

        let not_base64 = signer.seal(&header, "%%%");
        assert_eq!(signer.verify(&not_base64), Err(TokenError::Undecodable));

        let not_json = signer.seal(&header, &URL_SAFE_NO_PAD.encode("plain text"));
        assert_eq!(signer.verify(&not_json), Err(TokenError::Undecodable));
    }

    #[test]
    fn rejects_payload_without_expiry() {
        let signer = signer();
        let header = URL_SAFE_NO_PAD.encode(TOKEN_HEADER);
        let payload = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"userId":"{}","email":"demo@example.com"}}"#,
            Uuid::new_v4()
        ));
        let token = signer.seal(&header, &payload);
        assert_eq!(signer.verify(&token), Err(TokenError::MissingExpiry));
    }
}
