//! Registered-client bookkeeping and the rejection audit trail.

use std::collections::HashMap;
use std::sync::RwLock;

/// How many distinct rejected presenters the audit trail retains. Oldest
/// entries are not evicted in order; the map simply stops growing.
const AUDIT_CAPACITY: usize = 1024;

/// A registered layout client: the GUID minted for it and the long-lived
/// token it was handed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub guid: String,
    pub token: String,
}

/// One presenter's rejection history.
#[derive(Clone, Copy, Debug, Default)]
pub struct RejectionRecord {
    /// Total rejections observed for this presenter.
    pub count: u64,
    /// Unix seconds of the most recent rejection.
    pub last_seen: i64,
}

/// In-memory registry of layout clients plus an audit map of rejected
/// credentials.
///
/// GUID bindings are insert-only: once a GUID maps to a token, later calls
/// never overwrite it. Re-registration idempotency is handled separately by
/// indexing on the handshake token that was presented, so a client retrying
/// the same handshake gets the same long-lived token back rather than a
/// fresh identity.
#[derive(Default)]
pub struct ClientRegistry {
    by_guid: RwLock<HashMap<String, String>>,
    by_handshake: RwLock<HashMap<String, Registration>>,
    rejections: RwLock<HashMap<String, RejectionRecord>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a GUID to its long-lived token. Returns false (and leaves the
    /// existing binding untouched) if the GUID is already registered.
    pub fn bind(&self, guid: &str, token: &str) -> bool {
        let mut map = match self.by_guid.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        if map.contains_key(guid) {
            return false;
        }
        map.insert(guid.to_string(), token.to_string());
        true
    }

    /// Whether a GUID is registered.
    pub fn is_registered(&self, guid: &str) -> bool {
        match self.by_guid.read() {
            Ok(map) => map.contains_key(guid),
            Err(poisoned) => poisoned.into_inner().contains_key(guid),
        }
    }

    /// The exact token bound to a GUID, if registered.
    pub fn token_for(&self, guid: &str) -> Option<String> {
        match self.by_guid.read() {
            Ok(map) => map.get(guid).cloned(),
            Err(poisoned) => poisoned.into_inner().get(guid).cloned(),
        }
    }

    /// Whether a token value is bound to any registered GUID. The registry
    /// stays small (one entry per layout client), so a scan is fine.
    pub fn contains_token(&self, token: &str) -> bool {
        match self.by_guid.read() {
            Ok(map) => map.values().any(|bound| bound == token),
            Err(poisoned) => poisoned.into_inner().values().any(|bound| bound == token),
        }
    }

    /// Remember which handshake token produced a registration, so retries
    /// of the same handshake are idempotent.
    pub fn index_handshake(&self, handshake_token: &str, registration: Registration) {
        let mut map = match self.by_handshake.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(handshake_token.to_string()).or_insert(registration);
    }

    /// Look up a prior registration for a handshake token.
    pub fn registration_for_handshake(&self, handshake_token: &str) -> Option<Registration> {
        match self.by_handshake.read() {
            Ok(map) => map.get(handshake_token).cloned(),
            Err(poisoned) => poisoned.into_inner().get(handshake_token).cloned(),
        }
    }

    /// Record a rejected credential for the audit trail.
    ///
    /// The key is whatever the caller chooses to identify the presenter by
    /// (a token prefix, a peer address). Only counts and timestamps are
    /// kept; rejection never slows the caller down.
    pub fn record_rejection(&self, presenter: &str, now: i64) {
        let mut map = match self.rejections.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        if map.len() >= AUDIT_CAPACITY && !map.contains_key(presenter) {
            return;
        }
        let record = map.entry(presenter.to_string()).or_default();
        record.count += 1;
        record.last_seen = now;
    }

    /// The audit record for a presenter, if any rejections were seen.
    pub fn rejection_record(&self, presenter: &str) -> Option<RejectionRecord> {
        match self.rejections.read() {
            Ok(map) => map.get(presenter).copied(),
            Err(poisoned) => poisoned.into_inner().get(presenter).copied(),
        }
    }

    /// Number of registered clients.
    pub fn registered_count(&self) -> usize {
        match self.by_guid.read() {
            Ok(map) => map.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
