//! Access control: who may drive the layout.
//!
//! Two admission paths, tried in order:
//!
//! 1. **Static token**: the presented string equals the configured master
//!    token, appears in the configured accept list, or is bound in the
//!    client registry. No expiry.
//! 2. **Signed token**: an HMAC-signed, expiring token (see [`token`]).
//!    A token carrying only the service tag is accepted when its exact
//!    value is the master token or already registered. A token carrying
//!    the server/secret/GUID triple is accepted when the triple matches
//!    this service's configuration; the first use binds the GUID to that
//!    exact token, and later uses must present the identical token.
//!
//! New GUID/token pairs enter the registry only through the registration
//! handshake ([`Authenticator::register`]). Every rejection is recorded in
//! the registry's audit map; there is no lockout or throttling.

mod registry;
mod token;

pub use registry::{ClientRegistry, Registration, RejectionRecord};
pub use token::{now_unix, Claims, TokenSigner};

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Who a validated credential represents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Principal {
    /// Master token or a member of the configured accept list.
    Static,
    /// Signed service token whose value is already known to the registry.
    System,
    /// Signed layout token bound to a registered GUID.
    Layout {
        /// The GUID minted for this client at registration.
        guid: String,
    },
}

/// Validates credentials and runs the registration handshake.
///
/// Cheap to clone; the registry is shared behind an `Arc` so every clone
/// observes the same bindings and audit trail.
#[derive(Clone)]
pub struct Authenticator {
    config: Arc<AuthConfig>,
    signer: TokenSigner,
    registry: Arc<ClientRegistry>,
}

impl Authenticator {
    pub fn new(config: AuthConfig, registry: Arc<ClientRegistry>) -> Self {
        let signer = TokenSigner::new(&config.secret_key);
        Authenticator {
            config: Arc::new(config),
            signer,
            registry,
        }
    }

    /// The shared registry, for inspection.
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Validate a credential. Every rejection is audited before it is
    /// returned.
    pub fn authenticate(&self, credential: &str) -> Result<Principal> {
        match self.check(credential) {
            Ok(principal) => {
                debug!(?principal, "credential accepted");
                Ok(principal)
            }
            Err(err) => {
                let presenter = presenter_key(credential);
                self.registry.record_rejection(&presenter, now_unix());
                warn!(presenter, error = %err, "credential rejected");
                Err(err)
            }
        }
    }

    fn check(&self, credential: &str) -> Result<Principal> {
        if credential.is_empty() {
            return Err(Error::unauthorized("missing credential"));
        }

        // Path 1: static token, exact string match, no expiry.
        if self.is_static(credential) {
            return Ok(Principal::Static);
        }

        // Path 2: signed token.
        let claims = self.signer.decode(credential)?;
        if claims.is_expired(now_unix()) {
            return Err(Error::ExpiredToken);
        }
        if claims.magic != self.config.api_name {
            return Err(Error::unauthorized("token was minted for another service"));
        }

        if claims.is_layout() {
            self.check_layout(credential, &claims)
        } else if self.registry.contains_token(credential) {
            Ok(Principal::System)
        } else {
            Err(Error::unauthorized("token is not registered"))
        }
    }

    fn is_static(&self, credential: &str) -> bool {
        if let Some(master) = &self.config.master_token {
            if master == credential {
                return true;
            }
        }
        self.config
            .static_tokens
            .iter()
            .any(|accepted| accepted == credential)
            || self.registry.contains_token(credential)
    }

    fn check_layout(&self, credential: &str, claims: &Claims) -> Result<Principal> {
        if claims.secret.as_deref() != Some(self.config.secret_phrase.as_str()) {
            return Err(Error::unauthorized("secret phrase mismatch"));
        }
        if claims.server.as_deref() != Some(self.config.server_id.as_str()) {
            return Err(Error::unauthorized("server identity mismatch"));
        }
        let guid = match &claims.guid {
            Some(guid) => guid.clone(),
            None => return Err(Error::unauthorized("token carries no client id")),
        };
        match self.registry.token_for(&guid) {
            // First use binds the GUID to this exact token.
            None => {
                self.registry.bind(&guid, credential);
                info!(%guid, "layout client bound on first use");
                Ok(Principal::Layout { guid })
            }
            Some(bound) if bound == credential => Ok(Principal::Layout { guid }),
            Some(_) => Err(Error::unauthorized(
                "client id is bound to a different token",
            )),
        }
    }

    /// Run the registration handshake.
    ///
    /// The presented token must be a valid, unexpired signed token whose
    /// `server` claim names this service. Re-presenting a handshake token
    /// that already produced a registration returns the same pair; a fresh
    /// GUID and long-lived token are minted only when nothing is on file.
    pub fn register(&self, handshake_token: &str) -> Result<Registration> {
        let claims = self.signer.decode(handshake_token).map_err(|err| {
            self.registry
                .record_rejection(&presenter_key(handshake_token), now_unix());
            err
        })?;
        if claims.is_expired(now_unix()) {
            self.registry
                .record_rejection(&presenter_key(handshake_token), now_unix());
            return Err(Error::ExpiredToken);
        }
        if claims.magic != self.config.api_name {
            return Err(Error::unauthorized("token was minted for another service"));
        }
        if claims.server.as_deref() != Some(self.config.server_id.as_str()) {
            return Err(Error::unauthorized("server identity mismatch"));
        }

        if let Some(existing) = self.registry.registration_for_handshake(handshake_token) {
            debug!(guid = %existing.guid, "handshake replayed, returning bound token");
            return Ok(existing);
        }

        let guid = Uuid::new_v4().to_string();
        let claims = Claims::layout(
            self.config.api_name.clone(),
            now_unix() + self.config.layout_ttl_secs,
            self.config.server_id.clone(),
            self.config.secret_phrase.clone(),
            guid.clone(),
        );
        let token = self.signer.issue(&claims)?;
        self.registry.bind(&guid, &token);
        let registration = Registration {
            guid: guid.clone(),
            token,
        };
        self.registry
            .index_handshake(handshake_token, registration.clone());
        info!(%guid, "layout client registered");
        Ok(registration)
    }

    /// Mint a short-lived handshake token for a client of this service.
    pub fn issue_handshake_token(&self) -> Result<String> {
        let claims = Claims {
            exp: now_unix() + self.config.handshake_ttl_secs,
            magic: self.config.api_name.clone(),
            server: Some(self.config.server_id.clone()),
            secret: None,
            guid: None,
        };
        self.signer.issue(&claims)
    }
}

/// Audit key for a presented credential: enough of a prefix to correlate
/// repeat offenders without writing whole credentials to the audit map.
fn presenter_key(credential: &str) -> String {
    if credential.is_empty() {
        return "<empty>".to_string();
    }
    credential.chars().take(12).collect()
}
