//! Compact signed-token codec.
//!
//! A token is two URL-safe base64 segments joined by a dot: the JSON claims
//! followed by an HMAC-SHA256 signature of the claims bytes. Verification
//! recomputes the MAC before any claim is trusted, so a tampered payload is
//! treated exactly like a malformed one.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Current wall-clock time as unix seconds.
pub fn now_unix() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(_) => 0,
    }
}

/// Claims carried inside a signed token.
///
/// Every token carries an expiry and the issuing service's tag. Long-lived
/// layout tokens additionally carry the server identity, the shared phrase,
/// and the GUID minted at registration; a handshake token leaves those out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Issuing service tag; rejects tokens minted by an unrelated service
    /// that happens to share the signing key.
    pub magic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
}

impl Claims {
    /// A short-lived handshake claim set: expiry and service tag only.
    pub fn handshake(magic: impl Into<String>, expires_at: i64) -> Self {
        Claims {
            exp: expires_at,
            magic: magic.into(),
            server: None,
            secret: None,
            guid: None,
        }
    }

    /// A long-lived layout claim set bound to a server identity and GUID.
    pub fn layout(
        magic: impl Into<String>,
        expires_at: i64,
        server: impl Into<String>,
        secret: impl Into<String>,
        guid: impl Into<String>,
    ) -> Self {
        Claims {
            exp: expires_at,
            magic: magic.into(),
            server: Some(server.into()),
            secret: Some(secret.into()),
            guid: Some(guid.into()),
        }
    }

    /// Whether the claims carry the registration triple.
    pub fn is_layout(&self) -> bool {
        self.server.is_some() && self.secret.is_some() && self.guid.is_some()
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.exp <= now
    }
}

/// Signs and verifies compact tokens with a fixed HMAC key.
#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
}

impl TokenSigner {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        TokenSigner {
            key: key.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length, so this cannot fail.
        HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length")
    }

    /// Encode and sign a claim set into a compact token.
    pub fn issue(&self, claims: &Claims) -> Result<String> {
        let payload = serde_json::to_vec(claims)
            .map_err(|err| Error::unauthorized(format!("cannot encode claims: {err}")))?;
        let mut mac = self.mac();
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verify a compact token's signature and decode its claims.
    ///
    /// Does not check expiry; the caller decides how stale claims are
    /// reported. Any structural or signature problem comes back as a
    /// generic invalid-token error so callers cannot probe the format.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let invalid = || Error::unauthorized("invalid token");
        let (payload_b64, signature_b64) = token.split_once('.').ok_or_else(invalid)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| invalid())?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| invalid())?;
        let mut mac = self.mac();
        mac.update(&payload);
        mac.verify_slice(&signature).map_err(|_| invalid())?;
        serde_json::from_slice(&payload).map_err(|_| invalid())
    }
}
