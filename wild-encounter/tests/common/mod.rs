#![allow(dead_code)]

use std::collections::HashSet;

use wild_encounter::{
    Creature, EncounterCatalog, LocationQuery, MapId, PartyQuery, SystemTag, TerrainTag,
    TimeOfDay, WeatherTag, ZoneKind,
};

pub fn load_catalog() -> EncounterCatalog {
    EncounterCatalog::from_json(include_str!("../../data/catalog.json")).unwrap()
}

/// Scripted overworld and party state.
#[derive(Debug, Clone)]
pub struct TestWorld {
    pub map: u32,
    pub system_tag: &'static str,
    pub terrain: u8,
    pub zone: &'static str,
    pub time: TimeOfDay,
    pub weather: Option<&'static str>,
    pub switches: HashSet<u32>,
    pub leader: Option<Creature>,
    pub alive: usize,
    pub repel_turns: u32,
    pub repel_cooldown: bool,
    pub battle: bool,
    pub ally: Option<String>,
    pub streak: u32,
}

impl TestWorld {
    pub fn route_grass() -> Self {
        Self {
            map: 1,
            system_tag: "tall_grass",
            terrain: 0,
            zone: "grass",
            time: TimeOfDay::Day,
            weather: None,
            switches: HashSet::new(),
            leader: Some(Creature::new("bulbasaur", 5)),
            alive: 1,
            repel_turns: 0,
            repel_cooldown: false,
            battle: false,
            ally: None,
            streak: 0,
        }
    }

    pub fn route_water() -> Self {
        Self {
            system_tag: "water",
            zone: "sea",
            ..Self::route_grass()
        }
    }

    pub fn cave() -> Self {
        Self {
            map: 2,
            system_tag: "cave_floor",
            zone: "cave",
            ..Self::route_grass()
        }
    }

    pub fn at(mut self, map: u32, system_tag: &'static str, terrain: u8) -> Self {
        self.map = map;
        self.system_tag = system_tag;
        self.terrain = terrain;
        self
    }

    pub fn with_leader(mut self, leader: Creature) -> Self {
        self.leader = Some(leader);
        self
    }
}

impl LocationQuery for TestWorld {
    fn system_tag(&self) -> SystemTag {
        SystemTag::new(self.system_tag)
    }

    fn terrain_tag(&self) -> TerrainTag {
        TerrainTag(self.terrain)
    }

    fn map_id(&self) -> MapId {
        MapId(self.map)
    }

    fn zone_kind(&self, _observed: bool) -> ZoneKind {
        ZoneKind::new(self.zone)
    }

    fn time_of_day(&self) -> TimeOfDay {
        self.time
    }

    fn weather(&self) -> Option<WeatherTag> {
        self.weather.map(WeatherTag::new)
    }

    fn switch(&self, id: u32) -> bool {
        self.switches.contains(&id)
    }
}

impl PartyQuery for TestWorld {
    fn leader(&self) -> Option<Creature> {
        self.leader.clone()
    }

    fn party_alive_count(&self) -> usize {
        self.alive
    }

    fn repel_turns_remaining(&self) -> u32 {
        self.repel_turns
    }

    fn repel_on_cooldown(&self) -> bool {
        self.repel_cooldown
    }

    fn battle_in_progress(&self) -> bool {
        self.battle
    }

    fn ally_trainer(&self) -> Option<String> {
        self.ally.clone()
    }

    fn fishing_streak_bonus(&self) -> u32 {
        self.streak
    }
}
