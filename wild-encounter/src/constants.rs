//! Centralized balance and tuning constants for wild encounter resolution.
//!
//! These values back the serde defaults of [`crate::config::EncounterConfig`].
//! Authored JSON may override them per game; the numbers here are what an
//! empty configuration resolves to.

// Fishing -----------------------------------------------------------------
pub(crate) const FISHING_RATE_OLD_ROD: f64 = 0.50;
pub(crate) const FISHING_RATE_GOOD_ROD: f64 = 0.65;
pub(crate) const FISHING_RATE_SUPER_ROD: f64 = 0.80;
pub(crate) const FISHING_GRIP_MULTIPLIER: f64 = 1.5;
pub(crate) const FISHING_STREAK_STEP: f64 = 0.1;
pub(crate) const FISHING_STREAK_GUARANTEE: u32 = 3;
pub(crate) const FISHING_CHAIN_CAP: u32 = 20;

// Selection rates ----------------------------------------------------------
pub(crate) const ABILITY_RATE_BOOST: f64 = 1.5;
pub(crate) const LOW_LEVEL_PENALTY: f64 = 0.5;
pub(crate) const LOW_LEVEL_GAP: u8 = 5;
pub(crate) const CLEANSE_MULTIPLIER: f64 = 0.33;
pub(crate) const WEIGHT_SCALE: u32 = 100;
pub(crate) const LEVEL_MAX_CHANCE: f64 = 0.5;
pub(crate) const MAX_REJECTION_RETRIES: u32 = 64;

// Step scheduling ----------------------------------------------------------
pub(crate) const FREQUENCY_INCREASE_FACTOR: f64 = 0.5;
pub(crate) const FREQUENCY_DECREASE_FACTOR: f64 = 2.0;
pub(crate) const NEUTRAL_FREQUENCY_FACTOR: f64 = 1.0;
pub(crate) const TRIGGER_THRESHOLD: i32 = 1;

// Party sizes --------------------------------------------------------------
pub(crate) const HORDE_SIZE: usize = 5;
pub(crate) const ALLY_MIN_COUNT: usize = 2;

// Shiny --------------------------------------------------------------------
pub(crate) const SHINY_ODDS: u32 = 4096;
pub(crate) const SHINY_CHAIN_BONUS_PER_LINK: u32 = 2;

// Creature defaults --------------------------------------------------------
pub(crate) const NATURE_COUNT: u8 = 25;

// RNG ----------------------------------------------------------------------
pub(crate) const WILD_STREAM_TAG: &[u8] = b"wild-encounter";

#[cfg(test)]
pub(crate) const FLOAT_EPSILON: f64 = 1e-9;
