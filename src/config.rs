//! Service configuration.
//!
//! # Example
//!
//! ```rust
//! use trackside::config::{AuthConfig, Config, WebConfig};
//!
//! // Use defaults
//! let config = Config::default();
//!
//! // Or customize
//! let config = Config::default()
//!     .with_web(WebConfig::default().with_port(3000))
//!     .with_auth(AuthConfig::default().with_master_token("open-sesame"))
//!     .with_clamp_speed(true);
//! ```
//!
//! [`Config::from_env`] overlays `TRACKSIDE_*` environment variables on the
//! defaults for deployment without a config file.

use std::env;

// ============================================================================
// Main Config
// ============================================================================

/// Complete service configuration.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// HTTP listener configuration.
    pub web: WebConfig,
    /// Access-control configuration.
    pub auth: AuthConfig,
    /// Clamp out-of-range speed requests to the dialect bound instead of
    /// rejecting them.
    pub clamp_speed: bool,
}

impl Config {
    /// Set web configuration.
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set auth configuration.
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Enable or disable speed clamping.
    pub fn with_clamp_speed(mut self, clamp: bool) -> Self {
        self.clamp_speed = clamp;
        self
    }

    /// Build a configuration from `TRACKSIDE_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(port) = env::var("TRACKSIDE_PORT") {
            if let Ok(port) = port.parse() {
                config.web.port = port;
            }
        }
        if let Ok(host) = env::var("TRACKSIDE_HOST") {
            config.web.host = host;
        }
        if let Ok(key) = env::var("TRACKSIDE_SECRET_KEY") {
            config.auth.secret_key = key;
        }
        if let Ok(token) = env::var("TRACKSIDE_MASTER_TOKEN") {
            config.auth.master_token = Some(token);
        }
        if let Ok(tokens) = env::var("TRACKSIDE_STATIC_TOKENS") {
            config.auth.static_tokens = tokens
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(server) = env::var("TRACKSIDE_SERVER_ID") {
            config.auth.server_id = server;
        }
        if let Ok(phrase) = env::var("TRACKSIDE_SECRET_PHRASE") {
            config.auth.secret_phrase = phrase;
        }
        if let Ok(clamp) = env::var("TRACKSIDE_CLAMP_SPEED") {
            config.clamp_speed = matches!(clamp.as_str(), "1" | "true" | "yes");
        }
        config
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// HTTP listener configuration.
#[derive(Clone, Debug)]
pub struct WebConfig {
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl WebConfig {
    /// Set the bind address.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The address string to bind the listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Auth Config
// ============================================================================

/// Access-control configuration.
///
/// The default secret key is suitable only for local development; deployments
/// must set `TRACKSIDE_SECRET_KEY`.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HMAC key used to sign and verify tokens.
    pub secret_key: String,
    /// Tag embedded in every minted token identifying this service.
    pub api_name: String,
    /// Master static token. `None` disables the master path.
    pub master_token: Option<String>,
    /// Additional opaque tokens accepted as-is.
    pub static_tokens: Vec<String>,
    /// This installation's server identity, matched against the `server`
    /// claim during registration.
    pub server_id: String,
    /// Shared phrase embedded in long-lived layout tokens.
    pub secret_phrase: String,
    /// Lifetime of minted handshake tokens, seconds.
    pub handshake_ttl_secs: i64,
    /// Lifetime of minted layout tokens, seconds.
    pub layout_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: "trackside-dev-key".to_string(),
            api_name: "trackside".to_string(),
            master_token: None,
            static_tokens: Vec::new(),
            server_id: "trackside".to_string(),
            secret_phrase: "TRACKSIDE".to_string(),
            handshake_ttl_secs: 5 * 60,
            layout_ttl_secs: 365 * 24 * 60 * 60,
        }
    }
}

impl AuthConfig {
    /// Set the signing key.
    pub fn with_secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = key.into();
        self
    }

    /// Set the master token.
    pub fn with_master_token(mut self, token: impl Into<String>) -> Self {
        self.master_token = Some(token.into());
        self
    }

    /// Add an opaque token to the accept list.
    pub fn with_static_token(mut self, token: impl Into<String>) -> Self {
        self.static_tokens.push(token.into());
        self
    }

    /// Set the server identity.
    pub fn with_server_id(mut self, server: impl Into<String>) -> Self {
        self.server_id = server.into();
        self
    }

    /// Set the shared secret phrase.
    pub fn with_secret_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.secret_phrase = phrase.into();
        self
    }

    /// Set the handshake token lifetime.
    pub fn with_handshake_ttl_secs(mut self, secs: i64) -> Self {
        self.handshake_ttl_secs = secs;
        self
    }

    /// Set the layout token lifetime.
    pub fn with_layout_ttl_secs(mut self, secs: i64) -> Self {
        self.layout_ttl_secs = secs;
        self
    }
}
