//! Tunable numbers of the encounter engine.
//!
//! Every field has a serde default so an empty JSON object is a valid,
//! complete configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    ABILITY_RATE_BOOST, CLEANSE_MULTIPLIER, FISHING_CHAIN_CAP, FISHING_GRIP_MULTIPLIER,
    FISHING_RATE_GOOD_ROD, FISHING_RATE_OLD_ROD, FISHING_RATE_SUPER_ROD, FISHING_STREAK_GUARANTEE,
    FISHING_STREAK_STEP, FREQUENCY_DECREASE_FACTOR, FREQUENCY_INCREASE_FACTOR, HORDE_SIZE,
    LEVEL_MAX_CHANCE, LOW_LEVEL_GAP, LOW_LEVEL_PENALTY, MAX_REJECTION_RETRIES,
    SHINY_CHAIN_BONUS_PER_LINK, SHINY_ODDS, WEIGHT_SCALE,
};
use crate::data::ToolKind;
use crate::error::EncounterError;

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum EncounterConfigError {
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must be positive (got {value:.2})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be at least {min} (got {value})")]
    CountTooSmall {
        field: &'static str,
        min: u32,
        value: u32,
    },
}

fn check_probability(field: &'static str, value: f64) -> Result<(), EncounterConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EncounterConfigError::RangeViolation {
            field,
            min: 0.0,
            max: 1.0,
            value,
        })
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), EncounterConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EncounterConfigError::NotPositive { field, value })
    }
}

fn check_count(field: &'static str, min: u32, value: u32) -> Result<(), EncounterConfigError> {
    if value >= min {
        Ok(())
    } else {
        Err(EncounterConfigError::CountTooSmall { field, min, value })
    }
}

/// Fishing success gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishingConfig {
    #[serde(default = "FishingConfig::default_old_rod")]
    pub old_rod: f64,
    #[serde(default = "FishingConfig::default_good_rod")]
    pub good_rod: f64,
    #[serde(default = "FishingConfig::default_super_rod")]
    pub super_rod: f64,
    #[serde(default = "FishingConfig::default_grip_multiplier")]
    pub grip_multiplier: f64,
    #[serde(default = "FishingConfig::default_streak_step")]
    pub streak_step: f64,
    /// Streak bonus at or above which a bite is guaranteed.
    #[serde(default = "FishingConfig::default_streak_guarantee")]
    pub streak_guarantee: u32,
    #[serde(default = "FishingConfig::default_chain_cap")]
    pub chain_cap: u32,
}

impl FishingConfig {
    const fn default_old_rod() -> f64 {
        FISHING_RATE_OLD_ROD
    }

    const fn default_good_rod() -> f64 {
        FISHING_RATE_GOOD_ROD
    }

    const fn default_super_rod() -> f64 {
        FISHING_RATE_SUPER_ROD
    }

    const fn default_grip_multiplier() -> f64 {
        FISHING_GRIP_MULTIPLIER
    }

    const fn default_streak_step() -> f64 {
        FISHING_STREAK_STEP
    }

    const fn default_streak_guarantee() -> u32 {
        FISHING_STREAK_GUARANTEE
    }

    const fn default_chain_cap() -> u32 {
        FISHING_CHAIN_CAP
    }

    /// Base bite rate for a rod; terrain tools have no gate.
    #[must_use]
    pub const fn base_rate(&self, tool: ToolKind) -> Option<f64> {
        match tool {
            ToolKind::OldRod => Some(self.old_rod),
            ToolKind::GoodRod => Some(self.good_rod),
            ToolKind::SuperRod => Some(self.super_rod),
            ToolKind::RockSmash | ToolKind::Headbutt => None,
        }
    }
}

impl Default for FishingConfig {
    fn default() -> Self {
        Self {
            old_rod: Self::default_old_rod(),
            good_rod: Self::default_good_rod(),
            super_rod: Self::default_super_rod(),
            grip_multiplier: Self::default_grip_multiplier(),
            streak_step: Self::default_streak_step(),
            streak_guarantee: Self::default_streak_guarantee(),
            chain_cap: Self::default_chain_cap(),
        }
    }
}

/// Selection-rate multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
    #[serde(default = "RateConfig::default_ability_boost")]
    pub ability_boost: f64,
    #[serde(default = "RateConfig::default_low_level_penalty")]
    pub low_level_penalty: f64,
    /// Candidates more than this many levels below the leader are "low level".
    #[serde(default = "RateConfig::default_low_level_gap")]
    pub low_level_gap: u8,
    #[serde(default = "RateConfig::default_cleanse_multiplier")]
    pub cleanse_multiplier: f64,
    /// Fixed-point scale applied before real weights become integers.
    #[serde(default = "RateConfig::default_weight_scale")]
    pub weight_scale: u32,
    #[serde(default = "RateConfig::default_level_max_chance")]
    pub level_max_chance: f64,
    #[serde(default = "RateConfig::default_max_rejection_retries")]
    pub max_rejection_retries: u32,
}

impl RateConfig {
    const fn default_ability_boost() -> f64 {
        ABILITY_RATE_BOOST
    }

    const fn default_low_level_penalty() -> f64 {
        LOW_LEVEL_PENALTY
    }

    const fn default_low_level_gap() -> u8 {
        LOW_LEVEL_GAP
    }

    const fn default_cleanse_multiplier() -> f64 {
        CLEANSE_MULTIPLIER
    }

    const fn default_weight_scale() -> u32 {
        WEIGHT_SCALE
    }

    const fn default_level_max_chance() -> f64 {
        LEVEL_MAX_CHANCE
    }

    const fn default_max_rejection_retries() -> u32 {
        MAX_REJECTION_RETRIES
    }
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            ability_boost: Self::default_ability_boost(),
            low_level_penalty: Self::default_low_level_penalty(),
            low_level_gap: Self::default_low_level_gap(),
            cleanse_multiplier: Self::default_cleanse_multiplier(),
            weight_scale: Self::default_weight_scale(),
            level_max_chance: Self::default_level_max_chance(),
            max_rejection_retries: Self::default_max_rejection_retries(),
        }
    }
}

/// Step countdown scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "SchedulerConfig::default_increase_factor")]
    pub increase_factor: f64,
    #[serde(default = "SchedulerConfig::default_decrease_factor")]
    pub decrease_factor: f64,
}

impl SchedulerConfig {
    const fn default_increase_factor() -> f64 {
        FREQUENCY_INCREASE_FACTOR
    }

    const fn default_decrease_factor() -> f64 {
        FREQUENCY_DECREASE_FACTOR
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            increase_factor: Self::default_increase_factor(),
            decrease_factor: Self::default_decrease_factor(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShinyConfig {
    /// One in `odds` instances is shiny.
    #[serde(default = "ShinyConfig::default_odds")]
    pub odds: u32,
    /// Extra winning values per fishing-chain link.
    #[serde(default = "ShinyConfig::default_chain_bonus_per_link")]
    pub chain_bonus_per_link: u32,
}

impl ShinyConfig {
    const fn default_odds() -> u32 {
        SHINY_ODDS
    }

    const fn default_chain_bonus_per_link() -> u32 {
        SHINY_CHAIN_BONUS_PER_LINK
    }
}

impl Default for ShinyConfig {
    fn default() -> Self {
        Self {
            odds: Self::default_odds(),
            chain_bonus_per_link: Self::default_chain_bonus_per_link(),
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    #[serde(default)]
    pub fishing: FishingConfig,
    #[serde(default)]
    pub rates: RateConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub shiny: ShinyConfig,
    #[serde(default = "EncounterConfig::default_horde_size")]
    pub horde_size: usize,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            fishing: FishingConfig::default(),
            rates: RateConfig::default(),
            scheduler: SchedulerConfig::default(),
            shiny: ShinyConfig::default(),
            horde_size: Self::default_horde_size(),
        }
    }
}

impl EncounterConfig {
    const fn default_horde_size() -> usize {
        HORDE_SIZE
    }

    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or an invariant is violated.
    pub fn from_json(json: &str) -> Result<Self, EncounterError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), EncounterConfigError> {
        check_probability("fishing.old_rod", self.fishing.old_rod)?;
        check_probability("fishing.good_rod", self.fishing.good_rod)?;
        check_probability("fishing.super_rod", self.fishing.super_rod)?;
        check_positive("fishing.grip_multiplier", self.fishing.grip_multiplier)?;
        if !(self.fishing.streak_step.is_finite() && self.fishing.streak_step >= 0.0) {
            return Err(EncounterConfigError::NotPositive {
                field: "fishing.streak_step",
                value: self.fishing.streak_step,
            });
        }
        check_positive("rates.ability_boost", self.rates.ability_boost)?;
        check_positive("rates.low_level_penalty", self.rates.low_level_penalty)?;
        check_positive("rates.cleanse_multiplier", self.rates.cleanse_multiplier)?;
        check_count("rates.weight_scale", 1, self.rates.weight_scale)?;
        check_probability("rates.level_max_chance", self.rates.level_max_chance)?;
        check_positive("scheduler.increase_factor", self.scheduler.increase_factor)?;
        check_positive("scheduler.decrease_factor", self.scheduler.decrease_factor)?;
        check_count("shiny.odds", 1, self.shiny.odds)?;
        check_count(
            "horde_size",
            1,
            u32::try_from(self.horde_size).unwrap_or(u32::MAX),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLOAT_EPSILON;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg = EncounterConfig::from_json("{}").unwrap();
        assert_eq!(cfg, EncounterConfig::default());
        assert_eq!(cfg.horde_size, 5);
        assert_eq!(cfg.fishing.chain_cap, 20);
        assert!((cfg.rates.cleanse_multiplier - 0.33).abs() < FLOAT_EPSILON);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg = EncounterConfig::from_json(r#"{"fishing": {"old_rod": 0.25}}"#).unwrap();
        assert!((cfg.fishing.old_rod - 0.25).abs() < FLOAT_EPSILON);
        assert!((cfg.fishing.super_rod - FISHING_RATE_SUPER_ROD).abs() < FLOAT_EPSILON);
    }

    #[test]
    fn validation_reports_field() {
        let mut cfg = EncounterConfig::default();
        cfg.fishing.good_rod = 1.4;
        assert_eq!(
            cfg.validate(),
            Err(EncounterConfigError::RangeViolation {
                field: "fishing.good_rod",
                min: 0.0,
                max: 1.0,
                value: 1.4,
            })
        );

        let mut cfg = EncounterConfig::default();
        cfg.shiny.odds = 0;
        assert!(matches!(
            cfg.validate(),
            Err(EncounterConfigError::CountTooSmall { field: "shiny.odds", .. })
        ));
    }

    #[test]
    fn from_json_rejects_invalid_values() {
        let err = EncounterConfig::from_json(r#"{"scheduler": {"increase_factor": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, EncounterError::Config(_)));
    }

    #[test]
    fn terrain_tools_have_no_bite_rate() {
        let cfg = FishingConfig::default();
        assert!(cfg.base_rate(ToolKind::RockSmash).is_none());
        assert!(cfg.base_rate(ToolKind::OldRod).is_some());
    }
}
