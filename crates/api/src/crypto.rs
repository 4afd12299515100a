//! Access-token verification.
//!
//! The auth provider issues HMAC-SHA256 JWTs signed with a secret shared with
//! this server. We only verify them (and sign test tokens); issuing real
//! sessions is the provider's job.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::ServiceError;

/// JWT header (always HS256).
const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Default access-token lifetime used by [`sign_jwt`]: 1 hour.
pub const JWT_EXPIRY_SECS: u64 = 3600;

/// Claims this server reads from an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    /// Seconds until expiry (0 when already expired).
    pub fn remaining(&self, now_unix: u64) -> u64 {
        self.exp.saturating_sub(now_unix)
    }
}

/// Sign a JWT for `sub` that expires `ttl_secs` after `now_unix`.
pub fn sign_jwt_with_ttl(sub: &str, secret: &str, now_unix: u64, ttl_secs: u64) -> String {
    let header_b64 = URL_SAFE_NO_PAD.encode(JWT_HEADER.as_bytes());

    let claims = Claims {
        sub: sub.to_string(),
        iat: now_unix,
        exp: now_unix + ttl_secs,
    };
    let payload = serde_json::to_vec(&claims).unwrap_or_default();
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload);

    let signing_input = format!("{header_b64}.{payload_b64}");
    let signature = hmac_sha256(secret.as_bytes(), signing_input.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(signature);

    format!("{signing_input}.{sig_b64}")
}

/// Sign a JWT with the default lifetime.
pub fn sign_jwt(sub: &str, secret: &str, now_unix: u64) -> String {
    sign_jwt_with_ttl(sub, secret, now_unix, JWT_EXPIRY_SECS)
}

/// Verify signature and expiry, returning the claims.
pub fn verify_jwt(token: &str, secret: &str, now_unix: u64) -> Result<Claims, ServiceError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ServiceError::Unauthorized("invalid JWT format".into()));
    }

    let signing_input = format!("{}.{}", parts[0], parts[1]);
    let actual_sig = URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|_| ServiceError::Unauthorized("invalid JWT signature encoding".into()))?;

    let mut mac = new_mac(secret.as_bytes());
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&actual_sig)
        .map_err(|_| ServiceError::Unauthorized("invalid JWT signature".into()))?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|_| ServiceError::Unauthorized("invalid JWT payload encoding".into()))?;
    let claims: Claims = serde_json::from_slice(&payload_bytes)
        .map_err(|_| ServiceError::Unauthorized("invalid JWT payload".into()))?;

    if now_unix > claims.exp {
        return Err(ServiceError::Unauthorized("JWT expired".into()));
    }
    if claims.sub.is_empty() {
        return Err(ServiceError::Unauthorized("missing sub claim".into()));
    }

    Ok(claims)
}

/// Constant-time comparison for shared secrets (hook and webhook headers).
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let a = provided.as_bytes();
    let b = expected.as_bytes();
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ── Internal ────────────────────────────────────────────────────────────────

fn new_mac(key: &[u8]) -> Hmac<Sha256> {
    Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take key of any size")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = new_mac(key);
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
