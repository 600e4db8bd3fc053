//! Collaborator interfaces the engine reads from.
//!
//! The overworld, the party container and the bag live outside this crate.
//! The engine only ever reads them through these traits; it never writes
//! back.
use serde::{Deserialize, Serialize};

use crate::creature::Creature;

/// Map identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(pub u32);

/// Tile system tag (`"tall_grass"`, `"water"`, `"cave_floor"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemTag(pub String);

impl SystemTag {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

/// Numeric terrain tag painted on tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TerrainTag(pub u8);

/// Zone classification used by roaming creatures (`"grass"`, `"sea"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneKind(pub String);

impl ZoneKind {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

/// Weather label (`"sandstorm"`, `"hail"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherTag(pub String);

impl WeatherTag {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    #[default]
    Day,
    Evening,
    Night,
}

/// Location queries exposed by the overworld.
pub trait LocationQuery {
    fn system_tag(&self) -> SystemTag;
    fn terrain_tag(&self) -> TerrainTag;
    fn map_id(&self) -> MapId;
    /// Zone kind of the player's position. `observed` distinguishes the
    /// zone the player stands in from the zone shown on the region map.
    fn zone_kind(&self, observed: bool) -> ZoneKind;

    fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::Day
    }

    fn weather(&self) -> Option<WeatherTag> {
        None
    }

    /// Read a game switch; unknown switches read as off.
    fn switch(&self, _id: u32) -> bool {
        false
    }
}

/// Party and bag queries exposed by the player state container.
pub trait PartyQuery {
    fn leader(&self) -> Option<Creature>;
    fn party_alive_count(&self) -> usize;
    fn repel_turns_remaining(&self) -> u32;
    /// Repel expired on this step and still suppresses the step it expired on.
    fn repel_on_cooldown(&self) -> bool;

    fn battle_in_progress(&self) -> bool {
        false
    }

    /// Name of the partner trainer walking with the player, if any.
    fn ally_trainer(&self) -> Option<String> {
        None
    }

    /// Environmental fishing streak counter owned by the overworld.
    fn fishing_streak_bonus(&self) -> u32 {
        0
    }
}

/// Everything the resolver needs from its surroundings.
pub trait EncounterWorld: LocationQuery + PartyQuery {}

impl<T: LocationQuery + PartyQuery> EncounterWorld for T {}

/// Point-in-time copy of the location queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    pub map_id: MapId,
    pub zone_kind: ZoneKind,
    pub system_tag: SystemTag,
    pub terrain_tag: TerrainTag,
}

impl LocationSnapshot {
    /// Capture the player's current location.
    #[must_use]
    pub fn capture<W: LocationQuery + ?Sized>(world: &W) -> Self {
        Self {
            map_id: world.map_id(),
            zone_kind: world.zone_kind(false),
            system_tag: world.system_tag(),
            terrain_tag: world.terrain_tag(),
        }
    }
}

/// Repel suppresses organic encounters while turns remain and on the step
/// it runs out.
#[must_use]
pub fn repel_active<W: PartyQuery + ?Sized>(world: &W) -> bool {
    world.repel_turns_remaining() > 0 || world.repel_on_cooldown()
}
