//! External collaborator seams: state queries and command submission.
//!
//! The layout process (serial/network transport, live state maintenance) is
//! not this crate's business. Two narrow traits cover everything we need
//! from it:
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`LayoutState`] | read the current descriptive state of a component |
//! | [`CommandSink`] | enqueue a fully-formed low-level command, best-effort |
//!
//! Both are synchronous calls with no internal retry; a failure is reported
//! straight back to the original caller. [`MockLayout`] implements both for
//! tests and desktop development.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::commands::CommandDescriptor;
use crate::dialect::Dialect;
use crate::scope::CommandScope;

// ============================================================================
// Component state
// ============================================================================

/// Descriptive state of a component as maintained by the layout process.
///
/// Only fields the translator and the read endpoints use; the layout keeps
/// much more.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentState {
    /// Assigned TMCC id.
    pub id: u16,
    /// Component scope.
    pub scope: CommandScope,
    /// Detected dialect; `None` for static units, which are dialect-free.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<Dialect>,
    /// Road name assigned by the user or read from a sensor track.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_name: Option<String>,
    /// Road number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_number: Option<String>,
    /// Current speed step, movable units only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u16>,
    /// Current direction label, movable units only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Switch position or accessory aux state, static units only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl ComponentState {
    /// Minimal state for a movable unit with the given dialect.
    pub fn movable(scope: CommandScope, id: u16, dialect: Dialect) -> Self {
        Self {
            id,
            scope,
            dialect: Some(dialect),
            road_name: None,
            road_number: None,
            speed: None,
            direction: None,
            state: None,
        }
    }

    /// Minimal state for a static unit.
    pub fn fixed(scope: CommandScope, id: u16) -> Self {
        Self {
            id,
            scope,
            dialect: None,
            road_name: None,
            road_number: None,
            speed: None,
            direction: None,
            state: None,
        }
    }

    /// The unit's dialect, defaulting to classic when the layout has not
    /// reported one. Unknown units are driven as TMCC since every Legacy
    /// unit also understands the classic opcodes.
    pub fn dialect_or_classic(&self) -> Dialect {
        self.dialect.unwrap_or(Dialect::Classic)
    }
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Read access to the layout's live component state.
pub trait LayoutState: Send + Sync {
    /// Current state for `(scope, id)`, or `None` when the component is
    /// unknown. Called fresh on every dialect-sensitive request; results
    /// must never be cached across requests.
    fn query(&self, scope: CommandScope, id: u16) -> Option<ComponentState>;
}

/// Best-effort submission of low-level commands to the layout.
pub trait CommandSink: Send + Sync {
    /// Enqueue one descriptor for transmission. Fire-and-forget: a `Ok(())`
    /// means accepted for delivery, not delivered. Ordering between
    /// concurrent submissions is the transport's concern.
    fn submit(&self, descriptor: &CommandDescriptor) -> Result<(), String>;
}

// ============================================================================
// Mock implementation
// ============================================================================

/// In-memory layout double for tests and desktop development.
///
/// Components are seeded up front; submitted descriptors are recorded for
/// inspection. `fail_submissions` flips every submit into an error to
/// exercise dispatch failure paths.
#[derive(Default)]
pub struct MockLayout {
    components: Mutex<HashMap<(CommandScope, u16), ComponentState>>,
    submitted: Mutex<Vec<CommandDescriptor>>,
    fail_submissions: Mutex<bool>,
}

impl MockLayout {
    /// Empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a component.
    pub fn add(&self, state: ComponentState) {
        self.components
            .lock()
            .expect("components lock")
            .insert((state.scope, state.id), state);
    }

    /// Seeded convenience: an engine or train with the given dialect.
    pub fn add_movable(&self, scope: CommandScope, id: u16, dialect: Dialect) {
        self.add(ComponentState::movable(scope, id, dialect));
    }

    /// Everything submitted so far, in order.
    pub fn submitted(&self) -> Vec<CommandDescriptor> {
        self.submitted.lock().expect("submitted lock").clone()
    }

    /// Drop the submission record.
    pub fn clear_submitted(&self) {
        self.submitted.lock().expect("submitted lock").clear();
    }

    /// Make every subsequent submit fail.
    pub fn set_fail_submissions(&self, fail: bool) {
        *self.fail_submissions.lock().expect("fail flag lock") = fail;
    }
}

impl LayoutState for MockLayout {
    fn query(&self, scope: CommandScope, id: u16) -> Option<ComponentState> {
        self.components
            .lock()
            .expect("components lock")
            .get(&(scope, id))
            .cloned()
    }
}

impl CommandSink for MockLayout {
    fn submit(&self, descriptor: &CommandDescriptor) -> Result<(), String> {
        if *self.fail_submissions.lock().expect("fail flag lock") {
            return Err("transport unavailable".to_string());
        }
        self.submitted
            .lock()
            .expect("submitted lock")
            .push(descriptor.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandCode, Tmcc1EngineCommand};

    #[test]
    fn query_returns_seeded_state() {
        let layout = MockLayout::new();
        layout.add_movable(CommandScope::Engine, 12, Dialect::Classic);

        let state = layout.query(CommandScope::Engine, 12).unwrap();
        assert_eq!(state.dialect, Some(Dialect::Classic));
        assert!(layout.query(CommandScope::Engine, 13).is_none());
        assert!(layout.query(CommandScope::Train, 12).is_none());
    }

    #[test]
    fn submit_records_descriptors_in_order() {
        let layout = MockLayout::new();
        let first = CommandDescriptor::new(
            CommandCode::Tmcc1(Tmcc1EngineCommand::RingBell),
            CommandScope::Engine,
            12,
        );
        let second = CommandDescriptor::new(CommandCode::Halt, CommandScope::Engine, 99);

        layout.submit(&first).unwrap();
        layout.submit(&second).unwrap();

        let submitted = layout.submitted();
        assert_eq!(submitted, vec![first, second]);
    }

    #[test]
    fn failing_sink_reports_errors() {
        let layout = MockLayout::new();
        layout.set_fail_submissions(true);
        let cmd = CommandDescriptor::new(CommandCode::Halt, CommandScope::Engine, 99);
        assert!(layout.submit(&cmd).is_err());
        assert!(layout.submitted().is_empty());
    }

    #[test]
    fn unknown_dialect_defaults_to_classic() {
        let mut state = ComponentState::movable(CommandScope::Engine, 5, Dialect::Legacy);
        state.dialect = None;
        assert_eq!(state.dialect_or_classic(), Dialect::Classic);
    }
}
