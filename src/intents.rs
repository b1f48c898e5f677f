//! Protocol-agnostic action intents.
//!
//! An intent names *what* the caller wants ("ring the bell once", "speed
//! 45") without committing to either dialect. The translator pairs an
//! intent with the unit's detected dialect to produce concrete command
//! descriptors.
//!
//! Movable units (engines, trains) and static units (switches, accessories,
//! routes) have disjoint vocabularies, modeled as separate enums so a
//! switch can never be asked to blow a horn at the type level.

use serde::{Deserialize, Serialize};

use crate::dialect::SpeedValue;

// ============================================================================
// Option enums
// ============================================================================

/// Bell sub-state for movable units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BellOption {
    /// Bell off (Legacy only).
    Off,
    /// Bell steady on (Legacy only).
    On,
    /// One-shot multi-ding (Legacy only).
    Once,
    /// Toggle the bell; the default, and the only classic behavior.
    #[default]
    Toggle,
}

/// Horn effect for movable units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HornOption {
    /// Plain blast.
    #[default]
    Sound,
    /// Grade-crossing signal sequence (Legacy only).
    Grade,
    /// Variable-intensity quilling horn (Legacy only).
    Quilling,
}

/// Smoke unit level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmokeOption {
    /// Smoke off.
    Off,
    /// Smoke on; aliases to low on Legacy units.
    On,
    /// Low output (Legacy only).
    Low,
    /// Medium output (Legacy only).
    Medium,
    /// High output (Legacy only).
    High,
}

/// Auxiliary button selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuxOption {
    /// Aux1.
    Aux1,
    /// Aux2.
    Aux2,
    /// Aux3.
    Aux3,
}

/// Binary accessory state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOffOption {
    /// Off.
    Off,
    /// On.
    On,
}

// ============================================================================
// Movable-unit intents
// ============================================================================

/// Actions available on engines and trains.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MovableAction {
    /// Change speed. `immediate` snaps, `dialog` ramps with announcement;
    /// with neither set the unit ramps smoothly. Classic units always snap.
    Speed {
        /// Requested step or preset.
        value: SpeedValue,
        /// Snap to the value with no ramp.
        immediate: bool,
        /// Ramp with spoken announcement (Legacy only).
        dialog: bool,
    },
    /// Start the unit up, optionally with spoken dialog.
    Startup {
        /// Play the start-up dialog (Legacy only; ignored on classic).
        dialog: bool,
    },
    /// Shut the unit down, optionally with spoken dialog.
    Shutdown {
        /// Play the shutdown dialog (Legacy only; ignored on classic).
        dialog: bool,
    },
    /// Stop in place.
    Stop,
    /// Select forward travel.
    Forward,
    /// Select reverse travel.
    Reverse,
    /// Flip the current direction.
    ToggleDirection,
    /// Bell control.
    Bell(BellOption),
    /// Horn control.
    Horn {
        /// Which horn effect.
        option: HornOption,
        /// Quilling intensity 0-15; ignored for other options.
        intensity: u8,
    },
    /// Smoke unit control.
    Smoke(SmokeOption),
    /// Fire the front coupler.
    FrontCoupler,
    /// Fire the rear coupler.
    RearCoupler,
    /// Sound volume up one notch.
    VolumeUp,
    /// Sound volume down one notch.
    VolumeDown,
    /// Reset; `hold` emulates the long refuel press.
    Reset {
        /// Hold the reset button (refuel).
        hold: bool,
    },
    /// Numeric keypad digit 0-9.
    Numeric(u8),
    /// Auxiliary button press.
    Aux(AuxOption),
}

// ============================================================================
// Static-unit intents
// ============================================================================

/// Actions available on accessories.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AccessoryAction {
    /// Drive the binary control output, optionally for a bounded duration.
    Pulse {
        /// Desired state.
        state: OnOffOption,
        /// Seconds to hold the state before releasing; `None` latches.
        duration: Option<f64>,
    },
    /// Switch a BPC2 power district on or off. Power is latched, never
    /// pulsed.
    Power {
        /// Desired state.
        state: OnOffOption,
    },
    /// Boost button, optionally held for a duration.
    Boost {
        /// Seconds to hold.
        duration: Option<f64>,
    },
    /// Brake button, optionally held for a duration.
    Brake {
        /// Seconds to hold.
        duration: Option<f64>,
    },
    /// Numeric keypad digit 0-9.
    Numeric {
        /// Digit to send.
        number: u8,
        /// Seconds to hold.
        duration: Option<f64>,
    },
    /// Relative speed nudge, -5..5.
    RelativeSpeed {
        /// Signed nudge amount.
        speed: i8,
        /// Seconds to hold.
        duration: Option<f64>,
    },
    /// Fire the front coupler.
    FrontCoupler {
        /// Seconds to hold.
        duration: Option<f64>,
    },
    /// Fire the rear coupler.
    RearCoupler {
        /// Seconds to hold.
        duration: Option<f64>,
    },
    /// Auxiliary button press.
    Aux {
        /// Which aux button.
        option: AuxOption,
        /// Seconds to hold.
        duration: Option<f64>,
    },
}

/// Actions available on switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchAction {
    /// Throw to the through position.
    Thru,
    /// Throw to the out position.
    Out,
}

/// Actions available on routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteAction {
    /// Fire the route.
    Fire,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_defaults_to_toggle() {
        assert_eq!(BellOption::default(), BellOption::Toggle);
    }

    #[test]
    fn horn_defaults_to_sound() {
        assert_eq!(HornOption::default(), HornOption::Sound);
    }

    #[test]
    fn option_enums_deserialize_lowercase() {
        let opt: BellOption = serde_json::from_str("\"once\"").unwrap();
        assert_eq!(opt, BellOption::Once);
        let opt: HornOption = serde_json::from_str("\"quilling\"").unwrap();
        assert_eq!(opt, HornOption::Quilling);
        let opt: SmokeOption = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(opt, SmokeOption::High);
        let opt: AuxOption = serde_json::from_str("\"aux2\"").unwrap();
        assert_eq!(opt, AuxOption::Aux2);
    }
}
