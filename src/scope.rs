//! Component scopes and identifier validation.
//!
//! Every controllable item on a layout belongs to exactly one
//! [`CommandScope`], which determines both its action vocabulary and the
//! identifier range it may occupy. Engines and trains are "movable units"
//! addressed in 1-9999; switches, accessories, and routes are "static units"
//! addressed in 1-99.
//!
//! Identifier validation happens here, before any state lookup or
//! translation, so an out-of-range id never reaches the layout.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The universal address used to target every engine or train at once.
pub const ALL_UNITS_ID: u16 = 99;

/// Kind of layout component a request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandScope {
    /// A single locomotive.
    Engine,
    /// A lashed-up consist addressed as one unit.
    Train,
    /// A track switch (turnout).
    Switch,
    /// An operating accessory (ASC2/BPC2 driven or TMCC aux).
    Accessory,
    /// A route: a recorded set of switch positions fired together.
    Route,
}

impl CommandScope {
    /// Returns the lowercase label used in URLs and status strings.
    pub const fn label(&self) -> &'static str {
        match self {
            CommandScope::Engine => "engine",
            CommandScope::Train => "train",
            CommandScope::Switch => "switch",
            CommandScope::Accessory => "accessory",
            CommandScope::Route => "route",
        }
    }

    /// Capitalized label for user-facing confirmation strings.
    pub const fn title(&self) -> &'static str {
        match self {
            CommandScope::Engine => "Engine",
            CommandScope::Train => "Train",
            CommandScope::Switch => "Switch",
            CommandScope::Accessory => "Accessory",
            CommandScope::Route => "Route",
        }
    }

    /// True for scopes with the full movable-unit action set (speed, bell,
    /// horn, couplers, ...).
    pub const fn is_movable(&self) -> bool {
        matches!(self, CommandScope::Engine | CommandScope::Train)
    }

    /// Inclusive identifier range for this scope.
    ///
    /// Movable units use the extended 1-9999 range; everything else is
    /// limited to the classic 1-99 address space.
    pub const fn id_range(&self) -> (u16, u16) {
        if self.is_movable() {
            (1, 9999)
        } else {
            (1, 99)
        }
    }

    /// Validates `id` against this scope's range.
    ///
    /// Returns a [`Error::Validation`] naming the offending value and the
    /// correct bounds; no state query or translation happens after a
    /// rejection here.
    pub fn validate_id(&self, id: u16) -> Result<(), Error> {
        let (lo, hi) = self.id_range();
        if id < lo || id > hi {
            return Err(Error::Validation {
                detail: format!(
                    "{} id {} out of range; must be between {} and {}",
                    self.label(),
                    id,
                    lo,
                    hi
                ),
            });
        }
        Ok(())
    }
}
