//! Ability and item registries consulted by scheduling and selection.
//!
//! Abilities map onto a closed set of strategies. The table is assembled once
//! through [`AbilityRegistryBuilder`] and is immutable afterwards.
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::{RateConfig, SchedulerConfig};
use crate::constants::NEUTRAL_FREQUENCY_FACTOR;
use crate::creature::{AbilityId, Creature, ElementType, ItemId};
use crate::world::{LocationQuery, WeatherTag};

/// Per-candidate selection-rate strategy bound to a leader ability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RateModifier {
    /// Halve candidates more than the configured gap below the leader.
    LowLevelPenalty,
    /// Boost candidates of the opposite gender to the leader.
    OppositeGender,
    /// Boost candidates carrying an element type.
    TypeAffinity { element: ElementType },
    /// Boost candidates generated holding an item.
    HeldItemAffinity,
    /// Boost candidates sharing the leader's nature.
    SameNature,
}

impl RateModifier {
    /// Apply this strategy to `rate` for one candidate.
    #[must_use]
    pub fn apply(
        &self,
        rate: f64,
        candidate: &Creature,
        leader: &Creature,
        cfg: &RateConfig,
    ) -> f64 {
        let boosted = rate * cfg.ability_boost;
        match self {
            Self::LowLevelPenalty => {
                let gap_floor = candidate.level.saturating_add(cfg.low_level_gap);
                if gap_floor < leader.level {
                    rate * cfg.low_level_penalty
                } else {
                    rate
                }
            }
            Self::OppositeGender if candidate.gender.is_opposite_of(leader.gender) => boosted,
            Self::TypeAffinity { element } if candidate.has_type(*element) => boosted,
            Self::HeldItemAffinity if candidate.held_item.is_some() => boosted,
            Self::SameNature if candidate.nature == leader.nature => boosted,
            _ => rate,
        }
    }
}

/// Extra predicate a frequency ability needs before it takes effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FrequencyGate {
    #[default]
    Always,
    Weather { tag: WeatherTag },
}

impl FrequencyGate {
    #[must_use]
    pub fn is_open<W: LocationQuery + ?Sized>(&self, world: &W) -> bool {
        match self {
            Self::Always => true,
            Self::Weather { tag } => world.weather().as_ref() == Some(tag),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrequencyShift {
    Increase,
    Decrease,
}

/// Frozen ability/item lookup tables.
#[derive(Debug, Clone, Default)]
pub struct AbilityRegistry {
    rate_modifiers: HashMap<AbilityId, RateModifier>,
    frequency: HashMap<AbilityId, (FrequencyShift, FrequencyGate)>,
    level_maxing: HashSet<AbilityId>,
    grip: HashSet<AbilityId>,
    cleanse_items: HashSet<ItemId>,
}

impl AbilityRegistry {
    #[must_use]
    pub fn builder() -> AbilityRegistryBuilder {
        AbilityRegistryBuilder::default()
    }

    /// Registry with the standard ability roster.
    #[must_use]
    pub fn standard() -> Self {
        let weather = |tag: &str| FrequencyGate::Weather {
            tag: WeatherTag::new(tag),
        };
        Self::builder()
            .rate_modifier("keen_eye", RateModifier::LowLevelPenalty)
            .rate_modifier("intimidate", RateModifier::LowLevelPenalty)
            .rate_modifier("cute_charm", RateModifier::OppositeGender)
            .rate_modifier(
                "magnet_pull",
                RateModifier::TypeAffinity {
                    element: ElementType::Steel,
                },
            )
            .rate_modifier("compound_eyes", RateModifier::HeldItemAffinity)
            .rate_modifier("super_luck", RateModifier::HeldItemAffinity)
            .rate_modifier(
                "static",
                RateModifier::TypeAffinity {
                    element: ElementType::Electric,
                },
            )
            .rate_modifier(
                "lightning_rod",
                RateModifier::TypeAffinity {
                    element: ElementType::Electric,
                },
            )
            .rate_modifier(
                "storm_drain",
                RateModifier::TypeAffinity {
                    element: ElementType::Water,
                },
            )
            .rate_modifier(
                "flash_fire",
                RateModifier::TypeAffinity {
                    element: ElementType::Fire,
                },
            )
            .rate_modifier(
                "harvest",
                RateModifier::TypeAffinity {
                    element: ElementType::Grass,
                },
            )
            .rate_modifier("synchronize", RateModifier::SameNature)
            .frequency_increase("illuminate", FrequencyGate::Always)
            .frequency_increase("arena_trap", FrequencyGate::Always)
            .frequency_increase("no_guard", FrequencyGate::Always)
            .frequency_decrease("stench", FrequencyGate::Always)
            .frequency_decrease("white_smoke", FrequencyGate::Always)
            .frequency_decrease("quick_feet", FrequencyGate::Always)
            .frequency_decrease("sand_veil", weather("sandstorm"))
            .frequency_decrease("snow_cloak", weather("hail"))
            .level_maxing("hustle")
            .level_maxing("pressure")
            .level_maxing("vital_spirit")
            .grip("suction_cups")
            .grip("sticky_hold")
            .cleanse_item("cleanse_tag")
            .build()
    }

    #[must_use]
    pub fn rate_modifier(&self, ability: &AbilityId) -> Option<&RateModifier> {
        self.rate_modifiers.get(ability)
    }

    /// Gate of a registered frequency-increase ability.
    #[must_use]
    pub fn frequency_increase_gate(&self, ability: &AbilityId) -> Option<&FrequencyGate> {
        self.frequency_gate(ability, FrequencyShift::Increase)
    }

    /// Gate of a registered frequency-decrease ability.
    #[must_use]
    pub fn frequency_decrease_gate(&self, ability: &AbilityId) -> Option<&FrequencyGate> {
        self.frequency_gate(ability, FrequencyShift::Decrease)
    }

    fn frequency_gate(&self, ability: &AbilityId, shift: FrequencyShift) -> Option<&FrequencyGate> {
        self.frequency
            .get(ability)
            .filter(|(registered, _)| *registered == shift)
            .map(|(_, gate)| gate)
    }

    /// Countdown multiplier derived from the party leader's ability.
    #[must_use]
    pub fn frequency_factor<W: LocationQuery + ?Sized>(
        &self,
        leader: Option<&Creature>,
        world: &W,
        cfg: &SchedulerConfig,
    ) -> f64 {
        let Some(ability) = leader.and_then(|leader| leader.ability.as_ref()) else {
            return NEUTRAL_FREQUENCY_FACTOR;
        };
        match self.frequency.get(ability) {
            Some((FrequencyShift::Increase, gate)) if gate.is_open(world) => cfg.increase_factor,
            Some((FrequencyShift::Decrease, gate)) if gate.is_open(world) => cfg.decrease_factor,
            _ => NEUTRAL_FREQUENCY_FACTOR,
        }
    }

    #[must_use]
    pub fn forces_level_max(&self, leader: &Creature) -> bool {
        leader
            .ability
            .as_ref()
            .is_some_and(|ability| self.level_maxing.contains(ability))
    }

    #[must_use]
    pub fn has_grip(&self, leader: &Creature) -> bool {
        leader
            .ability
            .as_ref()
            .is_some_and(|ability| self.grip.contains(ability))
    }

    #[must_use]
    pub fn holds_cleanse_item(&self, leader: &Creature) -> bool {
        leader
            .held_item
            .as_ref()
            .is_some_and(|item| self.cleanse_items.contains(item))
    }
}

/// One-shot builder; later registrations of the same ability replace earlier ones.
#[derive(Debug, Default)]
pub struct AbilityRegistryBuilder {
    registry: AbilityRegistry,
}

impl AbilityRegistryBuilder {
    #[must_use]
    pub fn rate_modifier(mut self, ability: &str, modifier: RateModifier) -> Self {
        self.registry
            .rate_modifiers
            .insert(AbilityId::new(ability), modifier);
        self
    }

    #[must_use]
    pub fn frequency_increase(mut self, ability: &str, gate: FrequencyGate) -> Self {
        self.registry
            .frequency
            .insert(AbilityId::new(ability), (FrequencyShift::Increase, gate));
        self
    }

    #[must_use]
    pub fn frequency_decrease(mut self, ability: &str, gate: FrequencyGate) -> Self {
        self.registry
            .frequency
            .insert(AbilityId::new(ability), (FrequencyShift::Decrease, gate));
        self
    }

    #[must_use]
    pub fn level_maxing(mut self, ability: &str) -> Self {
        self.registry.level_maxing.insert(AbilityId::new(ability));
        self
    }

    #[must_use]
    pub fn grip(mut self, ability: &str) -> Self {
        self.registry.grip.insert(AbilityId::new(ability));
        self
    }

    #[must_use]
    pub fn cleanse_item(mut self, item: &str) -> Self {
        self.registry.cleanse_items.insert(ItemId::new(item));
        self
    }

    #[must_use]
    pub fn build(self) -> AbilityRegistry {
        self.registry
    }
}
