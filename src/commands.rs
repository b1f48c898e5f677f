//! Low-level command codes and the dispatch descriptor.
//!
//! The translator's output is a list of [`CommandDescriptor`]s: fully
//! resolved, dialect-specific instructions ready to hand to the layout's
//! submission interface. The wire encoding of these codes is the transport's
//! business, not ours. A descriptor only says *which* command, for *which*
//! unit, with what payload and repetition.
//!
//! Command codes are grouped by protocol family, mirroring the command sets
//! of the underlying control system: TMCC1 (classic) and TMCC2 (Legacy)
//! engine commands, TMCC2 effects, composed sequences, and the TMCC1-only
//! switch/route/aux families shared by both dialects.

use serde::{Deserialize, Serialize};

use crate::scope::CommandScope;

// ============================================================================
// Command code families
// ============================================================================

/// TMCC1 (classic) engine and train commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tmcc1EngineCommand {
    /// Snap to an absolute speed step (0-31).
    AbsoluteSpeed,
    /// Start the unit immediately; TMCC1 has no dialog variant.
    StartUpImmediate,
    /// Shut the unit down immediately.
    ShutdownImmediate,
    /// Stop in place.
    StopImmediate,
    /// Select forward travel.
    ForwardDirection,
    /// Select reverse travel.
    ReverseDirection,
    /// Flip the current direction.
    ToggleDirection,
    /// Ring the bell once; TMCC1's only bell action.
    RingBell,
    /// Single horn blast.
    BlowHorn,
    /// Smoke unit on.
    SmokeOn,
    /// Smoke unit off.
    SmokeOff,
    /// Fire the front coupler.
    FrontCoupler,
    /// Fire the rear coupler.
    RearCoupler,
    /// Sound volume up one notch.
    VolumeUp,
    /// Sound volume down one notch.
    VolumeDown,
    /// Reset; repeated to emulate a held refuel press.
    Reset,
    /// Numeric keypad digit (data 0-9).
    Numeric,
    /// Aux1 button.
    Aux1,
    /// Aux2 button.
    Aux2,
    /// Aux3 button.
    Aux3,
}

/// TMCC2 (Legacy) engine and train commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tmcc2EngineCommand {
    /// Snap to an absolute speed step (0-199).
    AbsoluteSpeed,
    /// Start with spoken dialog.
    StartUpDelayed,
    /// Start immediately.
    StartUpImmediate,
    /// Shut down with spoken dialog.
    ShutdownDelayed,
    /// Shut down immediately.
    ShutdownImmediate,
    /// Stop in place.
    StopImmediate,
    /// Select forward travel.
    ForwardDirection,
    /// Select reverse travel.
    ReverseDirection,
    /// Flip the current direction.
    ToggleDirection,
    /// Toggle the bell.
    RingBell,
    /// Bell steady on.
    BellOn,
    /// Bell off.
    BellOff,
    /// One-shot multi-ding bell; data carries the ding count.
    BellOneShotDing,
    /// Single horn blast.
    BlowHorn,
    /// Variable-intensity quilling horn; data carries intensity 0-15.
    QuillingHorn,
    /// Fire the front coupler.
    FrontCoupler,
    /// Fire the rear coupler.
    RearCoupler,
    /// Sound volume up one notch.
    VolumeUp,
    /// Sound volume down one notch.
    VolumeDown,
    /// Reset; repeated to emulate a held refuel press.
    Reset,
    /// Numeric keypad digit (data 0-9).
    Numeric,
    /// Aux1 button.
    Aux1,
    /// Aux2 button.
    Aux2,
    /// Aux3 button.
    Aux3,
}

/// TMCC2 effects controls (smoke unit).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tmcc2Effects {
    /// Smoke off.
    SmokeOff,
    /// Smoke low.
    SmokeLow,
    /// Smoke medium.
    SmokeMedium,
    /// Smoke high.
    SmokeHigh,
}

/// Composed multi-step sequences issued as single higher-level commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceCommand {
    /// Smooth ramp to the target speed.
    RampedSpeed,
    /// Smooth ramp with spoken speed announcement.
    RampedSpeedDialog,
    /// Grade-crossing horn signal (long-long-short-long).
    GradeCrossing,
}

/// TMCC1 switch commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchCommand {
    /// Throw to the through (straight) position.
    Thru,
    /// Throw to the out (diverging) position.
    Out,
}

/// TMCC1 route commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteCommand {
    /// Fire the route: throw every member switch to its recorded position.
    Fire,
}

/// Accessory commands (TMCC1 aux family plus ASC2/BPC2 controller ops).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessoryCommand {
    /// ASC2 binary control; data 1 = on, 0 = off, with optional timed pulse.
    Control,
    /// Deferred release after a timed pulse; carries the residual hold.
    ControlHold,
    /// BPC2 power-district set; data 1 = on, 0 = off. Never timed.
    PowerDistrict,
    /// Aux1 button.
    Aux1,
    /// Aux2 button.
    Aux2,
    /// Aux3 button.
    Aux3,
    /// Boost.
    Boost,
    /// Brake.
    Brake,
    /// Numeric keypad digit (data 0-9).
    Numeric,
    /// Relative speed nudge (data -5..5).
    RelativeSpeed,
    /// Fire the front coupler.
    FrontCoupler,
    /// Fire the rear coupler.
    RearCoupler,
}

/// Every low-level command the layer can emit, tagged by family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCode {
    /// System-wide halt: all motion stops, all power districts off.
    Halt,
    /// TMCC1 engine/train command.
    Tmcc1(Tmcc1EngineCommand),
    /// TMCC2 engine/train command.
    Tmcc2(Tmcc2EngineCommand),
    /// TMCC2 effects command.
    Effects(Tmcc2Effects),
    /// Composed sequence.
    Seq(SequenceCommand),
    /// Switch command.
    Switch(SwitchCommand),
    /// Route command.
    Route(RouteCommand),
    /// Accessory command.
    Accessory(AccessoryCommand),
}

// ============================================================================
// Command descriptor
// ============================================================================

/// A fully resolved, dialect-specific instruction ready for submission.
///
/// One action intent may translate to zero descriptors (an error), one, or
/// two (a long accessory pulse splits into an initial timed pulse plus a
/// deferred hold).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Which low-level command to issue.
    pub code: CommandCode,
    /// Scope of the target component.
    pub scope: CommandScope,
    /// Target identifier.
    pub id: u16,
    /// Optional numeric payload (speed step, intensity, digit, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<i16>,
    /// How many times to issue the command back-to-back. Repetition is how
    /// a held button is emulated on a protocol with no long-press primitive.
    pub repeat: u16,
    /// Length of the initial timed pulse, seconds (accessory control only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_secs: Option<f64>,
    /// Residual duration for a deferred action, seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl CommandDescriptor {
    /// New descriptor with no payload, issued once.
    pub fn new(code: CommandCode, scope: CommandScope, id: u16) -> Self {
        Self {
            code,
            scope,
            id,
            data: None,
            repeat: 1,
            pulse_secs: None,
            duration_secs: None,
        }
    }

    /// Attach a numeric payload.
    pub fn with_data(mut self, data: i16) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the repeat count.
    pub fn with_repeat(mut self, repeat: u16) -> Self {
        self.repeat = repeat;
        self
    }

    /// Set the initial pulse length.
    pub fn with_pulse(mut self, secs: f64) -> Self {
        self.pulse_secs = Some(secs);
        self
    }

    /// Set the residual duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults() {
        let d = CommandDescriptor::new(
            CommandCode::Tmcc1(Tmcc1EngineCommand::RingBell),
            CommandScope::Engine,
            12,
        );
        assert_eq!(d.repeat, 1);
        assert_eq!(d.data, None);
        assert_eq!(d.pulse_secs, None);
        assert_eq!(d.duration_secs, None);
    }

    #[test]
    fn descriptor_builders_compose() {
        let d = CommandDescriptor::new(
            CommandCode::Tmcc2(Tmcc2EngineCommand::QuillingHorn),
            CommandScope::Train,
            501,
        )
        .with_data(15)
        .with_repeat(2);
        assert_eq!(d.data, Some(15));
        assert_eq!(d.repeat, 2);
    }

    #[test]
    fn descriptor_serializes_without_empty_fields() {
        let d = CommandDescriptor::new(CommandCode::Halt, CommandScope::Engine, 99);
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("data"));
        assert!(!json.contains("pulse_secs"));
        assert!(!json.contains("duration_secs"));
    }
}
