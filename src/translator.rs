//! Intent-to-command translation, the core of the crate.
//!
//! `translate_*` functions pair an action intent with the target's dialect
//! and produce the exact low-level descriptors that dialect requires:
//! numeric encodings, clamping, preset lookups, and repeat/timing rules.
//!
//! Every (dialect, intent) pair is handled by an exhaustive `match`, so a
//! new intent or dialect variant that lacks a mapping fails to compile
//! rather than falling through to the wrong command. Where the classic
//! dialect genuinely has no equivalent for a requested option (grade or
//! quilling horn), translation returns an error naming the combination;
//! it never substitutes a different effect than the documented ones.
//!
//! Translation is pure and synchronous; nothing here talks to the layout.

use crate::commands::{
    AccessoryCommand, CommandCode, CommandDescriptor, RouteCommand, SequenceCommand,
    SwitchCommand, Tmcc1EngineCommand, Tmcc2EngineCommand, Tmcc2Effects,
};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::intents::{
    AccessoryAction, AuxOption, BellOption, HornOption, MovableAction, OnOffOption, RouteAction,
    SmokeOption, SwitchAction,
};
use crate::scope::{CommandScope, ALL_UNITS_ID};

// ============================================================================
// Timing and repetition constants
// ============================================================================

/// Ding count for the Legacy one-shot bell.
pub const BELL_DING_COUNT: i16 = 3;

/// Repeats for a plain horn blast; back-to-back blasts read as one long one.
pub const HORN_REPEAT: u16 = 10;

/// Repeats emulating a held reset button (refuel).
pub const REFUEL_REPEAT: u16 = 40;

/// Above this many seconds an accessory pulse splits into pulse + hold.
pub const PULSE_SPLIT_THRESHOLD_SECS: f64 = 2.5;

/// Length of the initial timed pulse when a long pulse is split.
pub const INITIAL_PULSE_SECS: f64 = 0.6;

/// Maximum quilling horn intensity.
pub const MAX_QUILLING_INTENSITY: u8 = 15;

// ============================================================================
// Options
// ============================================================================

/// Knobs affecting translation behavior.
#[derive(Clone, Copy, Debug, Default)]
pub struct TranslatorOptions {
    /// Clamp out-of-range speed steps to the dialect bound instead of
    /// rejecting them. Off by default; rejection is the documented
    /// behavior, clamping is an explicit opt-in.
    pub clamp_speed: bool,
}

impl TranslatorOptions {
    /// Enable or disable speed clamping.
    pub fn clamp_speed(mut self, clamp: bool) -> Self {
        self.clamp_speed = clamp;
        self
    }
}

// ============================================================================
// Movable units
// ============================================================================

/// Translate an engine/train action for the unit's detected dialect.
///
/// Returns one or more descriptors, or a client error when the value is out
/// of range or the option has no mapping for the dialect.
pub fn translate_movable(
    scope: CommandScope,
    id: u16,
    dialect: Dialect,
    action: MovableAction,
    options: TranslatorOptions,
) -> Result<Vec<CommandDescriptor>> {
    let one = |code: CommandCode| vec![CommandDescriptor::new(code, scope, id)];

    let descriptors = match (dialect, action) {
        // --- Speed -----------------------------------------------------
        (dialect, MovableAction::Speed { value, immediate, dialog }) => {
            let step = value.resolve(dialect, options.clamp_speed)?;
            // Classic units have no ramped-speed primitive; every change
            // snaps regardless of the caller's flags.
            let code = if immediate || dialect == Dialect::Classic {
                match dialect {
                    Dialect::Classic => CommandCode::Tmcc1(Tmcc1EngineCommand::AbsoluteSpeed),
                    Dialect::Legacy => CommandCode::Tmcc2(Tmcc2EngineCommand::AbsoluteSpeed),
                }
            } else if dialog {
                CommandCode::Seq(SequenceCommand::RampedSpeedDialog)
            } else {
                CommandCode::Seq(SequenceCommand::RampedSpeed)
            };
            vec![CommandDescriptor::new(code, scope, id).with_data(step as i16)]
        }

        // --- Start-up / shutdown --------------------------------------
        (Dialect::Classic, MovableAction::Startup { .. }) => {
            one(CommandCode::Tmcc1(Tmcc1EngineCommand::StartUpImmediate))
        }
        (Dialect::Legacy, MovableAction::Startup { dialog }) => one(CommandCode::Tmcc2(
            if dialog {
                Tmcc2EngineCommand::StartUpDelayed
            } else {
                Tmcc2EngineCommand::StartUpImmediate
            },
        )),
        (Dialect::Classic, MovableAction::Shutdown { .. }) => {
            one(CommandCode::Tmcc1(Tmcc1EngineCommand::ShutdownImmediate))
        }
        (Dialect::Legacy, MovableAction::Shutdown { dialog }) => one(CommandCode::Tmcc2(
            if dialog {
                Tmcc2EngineCommand::ShutdownDelayed
            } else {
                Tmcc2EngineCommand::ShutdownImmediate
            },
        )),

        // --- Stop / direction -----------------------------------------
        (Dialect::Classic, MovableAction::Stop) => {
            one(CommandCode::Tmcc1(Tmcc1EngineCommand::StopImmediate))
        }
        (Dialect::Legacy, MovableAction::Stop) => {
            one(CommandCode::Tmcc2(Tmcc2EngineCommand::StopImmediate))
        }
        (Dialect::Classic, MovableAction::Forward) => {
            one(CommandCode::Tmcc1(Tmcc1EngineCommand::ForwardDirection))
        }
        (Dialect::Legacy, MovableAction::Forward) => {
            one(CommandCode::Tmcc2(Tmcc2EngineCommand::ForwardDirection))
        }
        (Dialect::Classic, MovableAction::Reverse) => {
            one(CommandCode::Tmcc1(Tmcc1EngineCommand::ReverseDirection))
        }
        (Dialect::Legacy, MovableAction::Reverse) => {
            one(CommandCode::Tmcc2(Tmcc2EngineCommand::ReverseDirection))
        }
        (Dialect::Classic, MovableAction::ToggleDirection) => {
            one(CommandCode::Tmcc1(Tmcc1EngineCommand::ToggleDirection))
        }
        (Dialect::Legacy, MovableAction::ToggleDirection) => {
            one(CommandCode::Tmcc2(Tmcc2EngineCommand::ToggleDirection))
        }

        // --- Bell ------------------------------------------------------
        // Classic has exactly one bell action; the option is ignored.
        (Dialect::Classic, MovableAction::Bell(_)) => {
            one(CommandCode::Tmcc1(Tmcc1EngineCommand::RingBell))
        }
        (Dialect::Legacy, MovableAction::Bell(option)) => match option {
            BellOption::Toggle => one(CommandCode::Tmcc2(Tmcc2EngineCommand::RingBell)),
            BellOption::On => one(CommandCode::Tmcc2(Tmcc2EngineCommand::BellOn)),
            BellOption::Off => one(CommandCode::Tmcc2(Tmcc2EngineCommand::BellOff)),
            BellOption::Once => vec![CommandDescriptor::new(
                CommandCode::Tmcc2(Tmcc2EngineCommand::BellOneShotDing),
                scope,
                id,
            )
            .with_data(BELL_DING_COUNT)],
        },

        // --- Horn ------------------------------------------------------
        (Dialect::Classic, MovableAction::Horn { option, .. }) => match option {
            HornOption::Sound => vec![CommandDescriptor::new(
                CommandCode::Tmcc1(Tmcc1EngineCommand::BlowHorn),
                scope,
                id,
            )
            .with_repeat(HORN_REPEAT)],
            HornOption::Grade | HornOption::Quilling => {
                return Err(Error::unsupported(format!(
                    "{:?} horn is not available on TMCC {} {}",
                    option,
                    scope.label(),
                    id
                )))
            }
        },
        (Dialect::Legacy, MovableAction::Horn { option, intensity }) => match option {
            HornOption::Sound => vec![CommandDescriptor::new(
                CommandCode::Tmcc2(Tmcc2EngineCommand::BlowHorn),
                scope,
                id,
            )
            .with_repeat(HORN_REPEAT)],
            HornOption::Grade => one(CommandCode::Seq(SequenceCommand::GradeCrossing)),
            HornOption::Quilling => {
                if intensity > MAX_QUILLING_INTENSITY {
                    return Err(Error::validation(format!(
                        "quilling intensity must be between 0 and {MAX_QUILLING_INTENSITY}: {intensity}"
                    )));
                }
                vec![CommandDescriptor::new(
                    CommandCode::Tmcc2(Tmcc2EngineCommand::QuillingHorn),
                    scope,
                    id,
                )
                .with_data(intensity as i16)]
            }
        },

        // --- Smoke -----------------------------------------------------
        // Classic smoke is binary: anything but off is on.
        (Dialect::Classic, MovableAction::Smoke(level)) => match level {
            SmokeOption::Off => one(CommandCode::Tmcc1(Tmcc1EngineCommand::SmokeOff)),
            _ => one(CommandCode::Tmcc1(Tmcc1EngineCommand::SmokeOn)),
        },
        (Dialect::Legacy, MovableAction::Smoke(level)) => match level {
            SmokeOption::Off => one(CommandCode::Effects(Tmcc2Effects::SmokeOff)),
            SmokeOption::On | SmokeOption::Low => one(CommandCode::Effects(Tmcc2Effects::SmokeLow)),
            SmokeOption::Medium => one(CommandCode::Effects(Tmcc2Effects::SmokeMedium)),
            SmokeOption::High => one(CommandCode::Effects(Tmcc2Effects::SmokeHigh)),
        },

        // --- Couplers / volume ----------------------------------------
        (Dialect::Classic, MovableAction::FrontCoupler) => {
            one(CommandCode::Tmcc1(Tmcc1EngineCommand::FrontCoupler))
        }
        (Dialect::Legacy, MovableAction::FrontCoupler) => {
            one(CommandCode::Tmcc2(Tmcc2EngineCommand::FrontCoupler))
        }
        (Dialect::Classic, MovableAction::RearCoupler) => {
            one(CommandCode::Tmcc1(Tmcc1EngineCommand::RearCoupler))
        }
        (Dialect::Legacy, MovableAction::RearCoupler) => {
            one(CommandCode::Tmcc2(Tmcc2EngineCommand::RearCoupler))
        }
        (Dialect::Classic, MovableAction::VolumeUp) => {
            one(CommandCode::Tmcc1(Tmcc1EngineCommand::VolumeUp))
        }
        (Dialect::Legacy, MovableAction::VolumeUp) => {
            one(CommandCode::Tmcc2(Tmcc2EngineCommand::VolumeUp))
        }
        (Dialect::Classic, MovableAction::VolumeDown) => {
            one(CommandCode::Tmcc1(Tmcc1EngineCommand::VolumeDown))
        }
        (Dialect::Legacy, MovableAction::VolumeDown) => {
            one(CommandCode::Tmcc2(Tmcc2EngineCommand::VolumeDown))
        }

        // --- Reset / refuel -------------------------------------------
        // Refuel is a held reset; the protocol has no long-press, so the
        // hold is emulated with an amplified repeat count.
        (dialect, MovableAction::Reset { hold }) => {
            let code = match dialect {
                Dialect::Classic => CommandCode::Tmcc1(Tmcc1EngineCommand::Reset),
                Dialect::Legacy => CommandCode::Tmcc2(Tmcc2EngineCommand::Reset),
            };
            vec![CommandDescriptor::new(code, scope, id)
                .with_repeat(if hold { REFUEL_REPEAT } else { 1 })]
        }

        // --- Numeric keypad -------------------------------------------
        (dialect, MovableAction::Numeric(number)) => {
            if number > 9 {
                return Err(Error::validation(format!(
                    "numeric digit must be between 0 and 9: {number}"
                )));
            }
            let code = match dialect {
                Dialect::Classic => CommandCode::Tmcc1(Tmcc1EngineCommand::Numeric),
                Dialect::Legacy => CommandCode::Tmcc2(Tmcc2EngineCommand::Numeric),
            };
            vec![CommandDescriptor::new(code, scope, id).with_data(number as i16)]
        }

        // --- Aux buttons ----------------------------------------------
        (Dialect::Classic, MovableAction::Aux(option)) => one(CommandCode::Tmcc1(match option {
            AuxOption::Aux1 => Tmcc1EngineCommand::Aux1,
            AuxOption::Aux2 => Tmcc1EngineCommand::Aux2,
            AuxOption::Aux3 => Tmcc1EngineCommand::Aux3,
        })),
        (Dialect::Legacy, MovableAction::Aux(option)) => one(CommandCode::Tmcc2(match option {
            AuxOption::Aux1 => Tmcc2EngineCommand::Aux1,
            AuxOption::Aux2 => Tmcc2EngineCommand::Aux2,
            AuxOption::Aux3 => Tmcc2EngineCommand::Aux3,
        })),
    };

    Ok(descriptors)
}

// ============================================================================
// Accessories
// ============================================================================

/// Translate an accessory action. Accessories are dialect-free.
pub fn translate_accessory(id: u16, action: AccessoryAction) -> Result<Vec<CommandDescriptor>> {
    let scope = CommandScope::Accessory;
    let timed = |code: AccessoryCommand, duration: Option<f64>| {
        let mut d = CommandDescriptor::new(CommandCode::Accessory(code), scope, id);
        if let Some(secs) = duration {
            d = d.with_duration(secs);
        }
        vec![d]
    };

    let descriptors = match action {
        AccessoryAction::Pulse { state, duration } => {
            if let Some(secs) = duration {
                if secs <= 0.0 {
                    return Err(Error::validation(format!(
                        "duration must be positive: {secs}"
                    )));
                }
            }
            match state {
                // Off releases the output immediately; any duration is moot.
                OnOffOption::Off => {
                    vec![CommandDescriptor::new(
                        CommandCode::Accessory(AccessoryCommand::Control),
                        scope,
                        id,
                    )
                    .with_data(0)]
                }
                OnOffOption::On => match duration {
                    None => vec![CommandDescriptor::new(
                        CommandCode::Accessory(AccessoryCommand::Control),
                        scope,
                        id,
                    )
                    .with_data(1)],
                    // The hardware can only natively time short pulses. A
                    // long request becomes a short timed pulse plus a
                    // deferred release covering the remainder.
                    Some(secs) if secs > PULSE_SPLIT_THRESHOLD_SECS => vec![
                        CommandDescriptor::new(
                            CommandCode::Accessory(AccessoryCommand::Control),
                            scope,
                            id,
                        )
                        .with_data(1)
                        .with_pulse(INITIAL_PULSE_SECS),
                        CommandDescriptor::new(
                            CommandCode::Accessory(AccessoryCommand::ControlHold),
                            scope,
                            id,
                        )
                        .with_duration(secs - INITIAL_PULSE_SECS),
                    ],
                    Some(secs) => vec![CommandDescriptor::new(
                        CommandCode::Accessory(AccessoryCommand::Control),
                        scope,
                        id,
                    )
                    .with_data(1)
                    .with_pulse(secs)],
                },
            }
        }
        AccessoryAction::Power { state } => {
            vec![CommandDescriptor::new(
                CommandCode::Accessory(AccessoryCommand::PowerDistrict),
                scope,
                id,
            )
            .with_data(match state {
                OnOffOption::Off => 0,
                OnOffOption::On => 1,
            })]
        }
        AccessoryAction::Boost { duration } => timed(AccessoryCommand::Boost, duration),
        AccessoryAction::Brake { duration } => timed(AccessoryCommand::Brake, duration),
        AccessoryAction::FrontCoupler { duration } => {
            timed(AccessoryCommand::FrontCoupler, duration)
        }
        AccessoryAction::RearCoupler { duration } => timed(AccessoryCommand::RearCoupler, duration),
        AccessoryAction::Numeric { number, duration } => {
            if number > 9 {
                return Err(Error::validation(format!(
                    "numeric digit must be between 0 and 9: {number}"
                )));
            }
            let mut descriptors = timed(AccessoryCommand::Numeric, duration);
            descriptors[0].data = Some(number as i16);
            descriptors
        }
        AccessoryAction::RelativeSpeed { speed, duration } => {
            if !(-5..=5).contains(&speed) {
                return Err(Error::validation(format!(
                    "relative speed must be between -5 and 5: {speed}"
                )));
            }
            let mut descriptors = timed(AccessoryCommand::RelativeSpeed, duration);
            descriptors[0].data = Some(speed as i16);
            descriptors
        }
        AccessoryAction::Aux { option, duration } => timed(
            match option {
                AuxOption::Aux1 => AccessoryCommand::Aux1,
                AuxOption::Aux2 => AccessoryCommand::Aux2,
                AuxOption::Aux3 => AccessoryCommand::Aux3,
            },
            duration,
        ),
    };

    Ok(descriptors)
}

// ============================================================================
// Switches, routes, system-wide
// ============================================================================

/// Translate a switch action.
pub fn translate_switch(id: u16, action: SwitchAction) -> Vec<CommandDescriptor> {
    let code = match action {
        SwitchAction::Thru => SwitchCommand::Thru,
        SwitchAction::Out => SwitchCommand::Out,
    };
    vec![CommandDescriptor::new(
        CommandCode::Switch(code),
        CommandScope::Switch,
        id,
    )]
}

/// Translate a route action.
pub fn translate_route(id: u16, action: RouteAction) -> Vec<CommandDescriptor> {
    let RouteAction::Fire = action;
    vec![CommandDescriptor::new(
        CommandCode::Route(RouteCommand::Fire),
        CommandScope::Route,
        id,
    )]
}

/// The system-wide halt: stops all motion and cuts power regardless of
/// dialect.
pub fn halt_descriptor() -> CommandDescriptor {
    CommandDescriptor::new(CommandCode::Halt, CommandScope::Engine, ALL_UNITS_ID)
}

/// Stop every engine and train by addressing the universal id in each
/// dialect: trains and engines in Legacy, then engines in classic.
pub fn stop_all_descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new(
            CommandCode::Tmcc2(Tmcc2EngineCommand::StopImmediate),
            CommandScope::Train,
            ALL_UNITS_ID,
        ),
        CommandDescriptor::new(
            CommandCode::Tmcc2(Tmcc2EngineCommand::StopImmediate),
            CommandScope::Engine,
            ALL_UNITS_ID,
        ),
        CommandDescriptor::new(
            CommandCode::Tmcc1(Tmcc1EngineCommand::StopImmediate),
            CommandScope::Engine,
            ALL_UNITS_ID,
        ),
    ]
}
