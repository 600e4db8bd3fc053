//! Authored spawn data: tables, groups, tools and the catalog holding them.
use serde::{Deserialize, Serialize};

use crate::constants::{ALLY_MIN_COUNT, HORDE_SIZE};
use crate::creature::{ElementType, ItemId, SpeciesId};
use crate::error::{EncounterError, InvalidRequest};
use crate::world::{LocationQuery, MapId, SystemTag, TerrainTag, TimeOfDay, WeatherTag};

/// Mechanism gating fishing and hidden-tile encounter groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    OldRod,
    GoodRod,
    SuperRod,
    RockSmash,
    Headbutt,
}

impl ToolKind {
    pub const ALL: [Self; 5] = [
        Self::OldRod,
        Self::GoodRod,
        Self::SuperRod,
        Self::RockSmash,
        Self::Headbutt,
    ];

    #[must_use]
    pub const fn is_fishing(self) -> bool {
        matches!(self, Self::OldRod | Self::GoodRod | Self::SuperRod)
    }

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::OldRod => "old_rod",
            Self::GoodRod => "good_rod",
            Self::SuperRod => "super_rod",
            Self::RockSmash => "rock_smash",
            Self::Headbutt => "headbutt",
        }
    }

    /// Parse an externally supplied tool identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest::UnknownTool`] when no tool uses this id.
    pub fn from_id(id: &str) -> Result<Self, EncounterError> {
        let trimmed = id.trim();
        Self::ALL
            .into_iter()
            .find(|tool| tool.id().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| InvalidRequest::UnknownTool(trimmed.to_string()).into())
    }
}

/// Fishing vs everything else; history resets when this changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolClass {
    Fishing,
    Ground,
}

impl ToolClass {
    #[must_use]
    pub const fn of(tool: Option<ToolKind>) -> Self {
        match tool {
            Some(tool) if tool.is_fishing() => Self::Fishing,
            _ => Self::Ground,
        }
    }
}

/// How many wild creatures a group fields at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CountClass {
    #[default]
    Single,
    Double,
    Triple,
    Horde,
}

impl CountClass {
    #[must_use]
    pub const fn base_count(self, horde_size: usize) -> usize {
        match self {
            Self::Single => 1,
            Self::Double => 2,
            Self::Triple => 3,
            Self::Horde => horde_size,
        }
    }

    /// Count after ally escalation: a partner trainer always faces at
    /// least two wild creatures, hordes are left alone.
    #[must_use]
    pub fn effective_count(self, has_ally: bool, horde_size: usize) -> usize {
        let base = self.base_count(horde_size);
        if has_ally && !matches!(self, Self::Horde) {
            base.max(ALLY_MIN_COUNT)
        } else {
            base
        }
    }
}

/// The pair of tile tags a group is valid on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationFilter {
    pub system_tag: SystemTag,
    #[serde(default)]
    pub terrain_tag: TerrainTag,
}

impl LocationFilter {
    #[must_use]
    pub fn new(system_tag: &str, terrain_tag: u8) -> Self {
        Self {
            system_tag: SystemTag::new(system_tag),
            terrain_tag: TerrainTag(terrain_tag),
        }
    }

    #[must_use]
    pub fn matches(&self, system_tag: &SystemTag, terrain_tag: TerrainTag) -> bool {
        &self.system_tag == system_tag && self.terrain_tag == terrain_tag
    }

    #[must_use]
    pub fn matches_world<W: LocationQuery + ?Sized>(&self, world: &W) -> bool {
        self.matches(&world.system_tag(), world.terrain_tag())
    }
}

/// Gender distribution of a table entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "female_chance")]
pub enum GenderRatio {
    #[default]
    Genderless,
    /// Probability in `[0, 1]` that an instance is female.
    Gendered(f64),
}

/// Item a wild instance may be generated holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldItemDrop {
    pub item: ItemId,
    /// Probability in `[0, 1]`.
    pub chance: f64,
}

/// One weighted entry inside a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterTable {
    pub species: SpeciesId,
    #[serde(default)]
    pub form: u8,
    pub level_range: (u8, u8),
    #[serde(default = "default_rarity")]
    pub rarity_weight: u32,
    #[serde(default)]
    pub types: Vec<ElementType>,
    #[serde(default)]
    pub gender: GenderRatio,
    #[serde(default)]
    pub held_item: Option<HeldItemDrop>,
}

const fn default_rarity() -> u32 {
    1
}

impl EncounterTable {
    #[must_use]
    pub fn new(species: &str, min_level: u8, max_level: u8, rarity_weight: u32) -> Self {
        Self {
            species: SpeciesId::new(species),
            form: 0,
            level_range: (min_level, max_level),
            rarity_weight,
            types: Vec::new(),
            gender: GenderRatio::Genderless,
            held_item: None,
        }
    }

    #[must_use]
    pub fn with_types(mut self, types: &[ElementType]) -> Self {
        self.types = types.to_vec();
        self
    }

    #[must_use]
    pub const fn with_gender(mut self, gender: GenderRatio) -> Self {
        self.gender = gender;
        self
    }

    #[must_use]
    pub fn with_held_item(mut self, item: &str, chance: f64) -> Self {
        self.held_item = Some(HeldItemDrop {
            item: ItemId::new(item),
            chance,
        });
        self
    }

    #[must_use]
    pub const fn min_level(&self) -> u8 {
        self.level_range.0
    }

    #[must_use]
    pub const fn max_level(&self) -> u8 {
        self.level_range.1
    }
}

/// Data-authored piece of a group's eligibility predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GroupCondition {
    Maps { ids: Vec<MapId> },
    TimeOfDay { periods: Vec<TimeOfDay> },
    Switch { id: u32, value: bool },
    Weather { tag: WeatherTag },
}

impl GroupCondition {
    #[must_use]
    pub fn holds<W: LocationQuery + ?Sized>(&self, world: &W) -> bool {
        match self {
            Self::Maps { ids } => ids.contains(&world.map_id()),
            Self::TimeOfDay { periods } => periods.contains(&world.time_of_day()),
            Self::Switch { id, value } => world.switch(*id) == *value,
            Self::Weather { tag } => world.weather().as_ref() == Some(tag),
        }
    }
}

/// Stable identifier of a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

impl GroupId {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

/// A named spawn table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterGroup {
    pub id: GroupId,
    pub tables: Vec<EncounterTable>,
    #[serde(default)]
    pub count: CountClass,
    #[serde(default)]
    pub tool: Option<ToolKind>,
    pub location: LocationFilter,
    pub average_steps: u32,
    #[serde(default)]
    pub conditions: Vec<GroupCondition>,
}

impl EncounterGroup {
    #[must_use]
    pub fn new(id: &str, location: LocationFilter, average_steps: u32) -> Self {
        Self {
            id: GroupId::new(id),
            tables: Vec::new(),
            count: CountClass::Single,
            tool: None,
            location,
            average_steps,
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: EncounterTable) -> Self {
        self.tables.push(table);
        self
    }

    #[must_use]
    pub const fn with_count(mut self, count: CountClass) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub const fn with_tool(mut self, tool: ToolKind) -> Self {
        self.tool = Some(tool);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: GroupCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Eligibility predicate: every authored condition holds.
    #[must_use]
    pub fn is_eligible<W: LocationQuery + ?Sized>(&self, world: &W) -> bool {
        self.conditions.iter().all(|condition| condition.holds(world))
    }

    #[must_use]
    pub const fn is_fishing(&self) -> bool {
        matches!(self.tool, Some(tool) if tool.is_fishing())
    }

    fn validate(&self) -> Result<(), EncounterError> {
        let fail = |reason| EncounterError::Catalog {
            group: self.id.0.clone(),
            reason,
        };
        if self.average_steps == 0 {
            return Err(fail("average_steps must be positive"));
        }
        if self.tables.is_empty() {
            return Err(fail("group has no tables"));
        }
        for table in &self.tables {
            if table.rarity_weight == 0 {
                return Err(fail("rarity_weight must be positive"));
            }
            if table.min_level() == 0 || table.min_level() > table.max_level() {
                return Err(fail("level_range must satisfy 1 <= min <= max"));
            }
            if let GenderRatio::Gendered(chance) = table.gender
                && !(0.0..=1.0).contains(&chance)
            {
                return Err(fail("female chance must be within [0, 1]"));
            }
            if let Some(drop) = &table.held_item
                && !(0.0..=1.0).contains(&drop.chance)
            {
                return Err(fail("held item chance must be within [0, 1]"));
            }
        }
        Ok(())
    }
}

/// All groups known to the engine, in load order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EncounterCatalog {
    pub groups: Vec<EncounterGroup>,
}

impl EncounterCatalog {
    /// Build a catalog from pre-parsed groups.
    ///
    /// # Errors
    ///
    /// Returns [`EncounterError::Catalog`] when a group violates authoring rules.
    pub fn from_groups(groups: Vec<EncounterGroup>) -> Result<Self, EncounterError> {
        let catalog = Self { groups };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a group violates authoring rules.
    pub fn from_json(json: &str) -> Result<Self, EncounterError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check every group's authoring invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in load order.
    pub fn validate(&self) -> Result<(), EncounterError> {
        self.groups.iter().try_for_each(EncounterGroup::validate)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&EncounterGroup> {
        self.groups.get(index)
    }

    #[must_use]
    pub fn index_of(&self, id: &GroupId) -> Option<usize> {
        self.groups.iter().position(|group| &group.id == id)
    }

    /// Indices of groups whose eligibility predicate currently holds.
    #[must_use]
    pub fn eligible_indices<W: LocationQuery + ?Sized>(&self, world: &W) -> Vec<usize> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, group)| group.is_eligible(world))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// The single eligible group for `tool` at the player's tile.
    #[must_use]
    pub fn tool_group<W: LocationQuery + ?Sized>(
        &self,
        tool: ToolKind,
        world: &W,
    ) -> Option<usize> {
        let system_tag = world.system_tag();
        let terrain_tag = world.terrain_tag();
        self.groups.iter().position(|group| {
            group.tool == Some(tool)
                && group.location.matches(&system_tag, terrain_tag)
                && group.is_eligible(world)
        })
    }
}
