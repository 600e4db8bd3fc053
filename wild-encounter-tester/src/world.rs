use wild_encounter::{
    Creature, LocationQuery, MapId, PartyQuery, SystemTag, TerrainTag, TimeOfDay, WeatherTag,
    ZoneKind,
};

/// Overworld stand-in driven by the scenario scripts.
#[derive(Debug, Clone)]
pub struct SimWorld {
    pub map: u32,
    pub system_tag: String,
    pub terrain: u8,
    pub zone: String,
    pub time: TimeOfDay,
    pub weather: Option<String>,
    pub leader: Creature,
    pub alive: usize,
    pub repel_turns: u32,
    pub ally: Option<String>,
    pub streak: u32,
}

impl SimWorld {
    /// Grass tile on the starting route with a low-level leader.
    pub fn route() -> Self {
        Self {
            map: 1,
            system_tag: "tall_grass".to_string(),
            terrain: 0,
            zone: "grass".to_string(),
            time: TimeOfDay::Day,
            weather: None,
            leader: Creature::new("bulbasaur", 5),
            alive: 1,
            repel_turns: 0,
            ally: None,
            streak: 0,
        }
    }

    pub fn shore() -> Self {
        Self {
            system_tag: "water".to_string(),
            zone: "sea".to_string(),
            ..Self::route()
        }
    }

    #[must_use]
    pub fn on_tile(mut self, map: u32, system_tag: &str, terrain: u8) -> Self {
        self.map = map;
        self.system_tag = system_tag.to_string();
        self.terrain = terrain;
        self
    }

    #[must_use]
    pub fn led_by(mut self, leader: Creature) -> Self {
        self.leader = leader;
        self
    }
}

impl LocationQuery for SimWorld {
    fn system_tag(&self) -> SystemTag {
        SystemTag::new(&self.system_tag)
    }

    fn terrain_tag(&self) -> TerrainTag {
        TerrainTag(self.terrain)
    }

    fn map_id(&self) -> MapId {
        MapId(self.map)
    }

    fn zone_kind(&self, _observed: bool) -> ZoneKind {
        ZoneKind::new(&self.zone)
    }

    fn time_of_day(&self) -> TimeOfDay {
        self.time
    }

    fn weather(&self) -> Option<WeatherTag> {
        self.weather.as_deref().map(WeatherTag::new)
    }
}

impl PartyQuery for SimWorld {
    fn leader(&self) -> Option<Creature> {
        Some(self.leader.clone())
    }

    fn party_alive_count(&self) -> usize {
        self.alive
    }

    fn repel_turns_remaining(&self) -> u32 {
        self.repel_turns
    }

    fn repel_on_cooldown(&self) -> bool {
        false
    }

    fn ally_trainer(&self) -> Option<String> {
        self.ally.clone()
    }

    fn fishing_streak_bonus(&self) -> u32 {
        self.streak
    }
}
