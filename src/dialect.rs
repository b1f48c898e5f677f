//! Command dialects and speed domains.
//!
//! A movable unit speaks exactly one of two mutually incompatible command
//! vocabularies:
//!
//! - [`Dialect::Classic`] (TMCC1): 32 speed steps, single-shot bell and
//!   horn, on/off smoke.
//! - [`Dialect::Legacy`] (TMCC2): 200 speed steps, stateful bell, quilling
//!   horn, graded smoke, spoken start-up/shutdown dialog.
//!
//! The dialect is a property of the unit as detected by the layout, not
//! something a caller supplies. It is re-read from the state store on every
//! request because units can be reprogrammed between requests.
//!
//! # Speed presets
//!
//! Named railroad speeds (`roll` .. `highball`) map to dialect-specific
//! step constants. The wire protocol also reserves 201-207 as numeric
//! sentinels for the same presets, so `speed=203` and `speed=slow` are the
//! same request.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Which command vocabulary a movable unit speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// TMCC1: the narrow, first-generation command set.
    Classic,
    /// TMCC2: the extended Legacy command set.
    Legacy,
}

impl Dialect {
    /// Maximum absolute speed step for this dialect (inclusive).
    pub const fn max_speed(&self) -> u16 {
        match self {
            Dialect::Classic => 31,
            Dialect::Legacy => 199,
        }
    }

    /// Lowercase name for log fields and error messages.
    pub const fn label(&self) -> &'static str {
        match self {
            Dialect::Classic => "TMCC",
            Dialect::Legacy => "Legacy",
        }
    }
}

// ============================================================================
// Speed presets
// ============================================================================

/// First numeric sentinel reserved for named presets.
pub const PRESET_SENTINEL_BASE: u16 = 201;

/// Named railroad speeds, slowest to fastest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedPreset {
    /// Barely moving; yard crawl.
    Roll,
    /// Restricted speed.
    Restricted,
    /// Slow.
    Slow,
    /// Medium.
    Medium,
    /// Limited.
    Limited,
    /// Normal running speed.
    Normal,
    /// Track speed; as fast as the dialect allows.
    Highball,
}

impl SpeedPreset {
    const ALL: [SpeedPreset; 7] = [
        SpeedPreset::Roll,
        SpeedPreset::Restricted,
        SpeedPreset::Slow,
        SpeedPreset::Medium,
        SpeedPreset::Limited,
        SpeedPreset::Normal,
        SpeedPreset::Highball,
    ];

    /// Parse a preset from its lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "roll" => Some(SpeedPreset::Roll),
            "restricted" => Some(SpeedPreset::Restricted),
            "slow" => Some(SpeedPreset::Slow),
            "medium" => Some(SpeedPreset::Medium),
            "limited" => Some(SpeedPreset::Limited),
            "normal" => Some(SpeedPreset::Normal),
            "highball" => Some(SpeedPreset::Highball),
            _ => None,
        }
    }

    /// Parse a preset from its reserved numeric sentinel (201-207).
    pub fn from_sentinel(value: u16) -> Option<Self> {
        let idx = value.checked_sub(PRESET_SENTINEL_BASE)? as usize;
        Self::ALL.get(idx).copied()
    }

    /// The internal speed step this preset resolves to for `dialect`.
    ///
    /// Deterministic: the same preset and dialect always yield the same
    /// step.
    pub const fn step(&self, dialect: Dialect) -> u16 {
        match dialect {
            Dialect::Classic => match self {
                SpeedPreset::Roll => 3,
                SpeedPreset::Restricted => 5,
                SpeedPreset::Slow => 10,
                SpeedPreset::Medium => 15,
                SpeedPreset::Limited => 20,
                SpeedPreset::Normal => 25,
                SpeedPreset::Highball => 31,
            },
            Dialect::Legacy => match self {
                SpeedPreset::Roll => 7,
                SpeedPreset::Restricted => 24,
                SpeedPreset::Slow => 59,
                SpeedPreset::Medium => 92,
                SpeedPreset::Limited => 118,
                SpeedPreset::Normal => 145,
                SpeedPreset::Highball => 199,
            },
        }
    }
}

// ============================================================================
// Speed values
// ============================================================================

/// A requested speed: either a raw step or a named preset.
///
/// Numeric values in the 201-207 sentinel band are normalized to presets at
/// parse time, before any dialect-specific resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedValue {
    /// Raw numeric step in the dialect's domain.
    Step(u16),
    /// Named preset resolved per dialect.
    Preset(SpeedPreset),
}

impl SpeedValue {
    /// Parse speed text from a request path: digits or a preset name.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let trimmed = text.trim();
        if let Ok(n) = trimmed.parse::<u16>() {
            if let Some(preset) = SpeedPreset::from_sentinel(n) {
                return Ok(SpeedValue::Preset(preset));
            }
            return Ok(SpeedValue::Step(n));
        }
        SpeedPreset::from_name(trimmed)
            .map(SpeedValue::Preset)
            .ok_or_else(|| {
                Error::validation(format!(
                    "speed must be a number or one of roll, restricted, slow, \
                     medium, limited, normal, highball: {trimmed}"
                ))
            })
    }

    /// Resolve to a concrete step for `dialect`, rejecting values outside
    /// the dialect's domain with a message that cites the correct bound.
    ///
    /// With `clamp` set, out-of-range steps snap to the nearest bound
    /// instead of failing. Presets can never be out of range.
    pub fn resolve(&self, dialect: Dialect, clamp: bool) -> Result<u16, Error> {
        match self {
            SpeedValue::Preset(preset) => Ok(preset.step(dialect)),
            SpeedValue::Step(step) => {
                let max = dialect.max_speed();
                if *step <= max {
                    Ok(*step)
                } else if clamp {
                    Ok(max)
                } else {
                    Err(Error::validation(format!(
                        "{} speeds must be between 0 and {} inclusive: {}",
                        dialect.label(),
                        max,
                        step
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_speed_domains() {
        assert_eq!(Dialect::Classic.max_speed(), 31);
        assert_eq!(Dialect::Legacy.max_speed(), 199);
    }

    #[test]
    fn presets_resolve_deterministically() {
        for preset in SpeedPreset::ALL {
            assert_eq!(preset.step(Dialect::Classic), preset.step(Dialect::Classic));
            assert!(preset.step(Dialect::Classic) <= 31);
            assert!(preset.step(Dialect::Legacy) <= 199);
        }
        assert_eq!(SpeedPreset::Highball.step(Dialect::Classic), 31);
        assert_eq!(SpeedPreset::Highball.step(Dialect::Legacy), 199);
    }

    #[test]
    fn sentinels_map_to_presets() {
        assert_eq!(SpeedPreset::from_sentinel(201), Some(SpeedPreset::Roll));
        assert_eq!(SpeedPreset::from_sentinel(204), Some(SpeedPreset::Medium));
        assert_eq!(SpeedPreset::from_sentinel(207), Some(SpeedPreset::Highball));
        assert_eq!(SpeedPreset::from_sentinel(208), None);
        assert_eq!(SpeedPreset::from_sentinel(200), None);
    }

    #[test]
    fn parse_accepts_numbers_names_and_sentinels() {
        assert_eq!(SpeedValue::parse("45").unwrap(), SpeedValue::Step(45));
        assert_eq!(
            SpeedValue::parse("slow").unwrap(),
            SpeedValue::Preset(SpeedPreset::Slow)
        );
        assert_eq!(
            SpeedValue::parse("203").unwrap(),
            SpeedValue::Preset(SpeedPreset::Slow)
        );
        assert!(SpeedValue::parse("warp9").is_err());
    }

    #[test]
    fn resolve_rejects_out_of_range_citing_dialect_bound() {
        let err = SpeedValue::Step(45)
            .resolve(Dialect::Classic, false)
            .unwrap_err();
        assert!(err.to_string().contains("between 0 and 31"));

        let err = SpeedValue::Step(200)
            .resolve(Dialect::Legacy, false)
            .unwrap_err();
        assert!(err.to_string().contains("between 0 and 199"));
    }

    #[test]
    fn resolve_accepts_in_range() {
        assert_eq!(SpeedValue::Step(31).resolve(Dialect::Classic, false).unwrap(), 31);
        assert_eq!(SpeedValue::Step(199).resolve(Dialect::Legacy, false).unwrap(), 199);
        assert_eq!(SpeedValue::Step(0).resolve(Dialect::Classic, false).unwrap(), 0);
    }

    #[test]
    fn clamp_opt_in_snaps_to_bound() {
        assert_eq!(SpeedValue::Step(45).resolve(Dialect::Classic, true).unwrap(), 31);
        assert_eq!(SpeedValue::Step(500).resolve(Dialect::Legacy, true).unwrap(), 199);
        // in-range values are untouched
        assert_eq!(SpeedValue::Step(12).resolve(Dialect::Classic, true).unwrap(), 12);
    }
}
