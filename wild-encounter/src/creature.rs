//! Creature model shared by tables, the party collaborator and the battle
//! setup descriptor.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Species identifier as authored in data (`"pidgey"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(pub String);

impl SpeciesId {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Ability identifier (`"cute_charm"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(pub String);

impl AbilityId {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

/// Item identifier (`"cleanse_tag"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Genderless,
    Male,
    Female,
}

impl Gender {
    /// True when both sides have a gender and they differ.
    #[must_use]
    pub const fn is_opposite_of(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Male, Self::Female) | (Self::Female, Self::Male)
        )
    }
}

/// Elemental typing used by type-attracting abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Normal,
    Fire,
    Water,
    Grass,
    Electric,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

/// Nature index in `0..25`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Nature(pub u8);

/// Inline storage for one or two element types.
pub type TypeSet = SmallVec<[ElementType; 2]>;

/// A concrete creature instance: a wild candidate, a party member, or a
/// roaming creature owned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub species: SpeciesId,
    #[serde(default)]
    pub form: u8,
    pub level: u8,
    pub hp: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub types: TypeSet,
    #[serde(default)]
    pub nature: Nature,
    #[serde(default)]
    pub ability: Option<AbilityId>,
    #[serde(default)]
    pub held_item: Option<ItemId>,
    #[serde(default)]
    pub shiny: bool,
}

impl Creature {
    /// Minimal creature with full-placeholder hp; fields are filled by builders.
    #[must_use]
    pub fn new(species: &str, level: u8) -> Self {
        Self {
            species: SpeciesId::new(species),
            form: 0,
            level,
            hp: u32::from(level.max(1)) * 3,
            gender: Gender::Genderless,
            types: TypeSet::new(),
            nature: Nature::default(),
            ability: None,
            held_item: None,
            shiny: false,
        }
    }

    #[must_use]
    pub fn with_ability(mut self, ability: &str) -> Self {
        self.ability = Some(AbilityId::new(ability));
        self
    }

    #[must_use]
    pub fn with_item(mut self, item: &str) -> Self {
        self.held_item = Some(ItemId::new(item));
        self
    }

    #[must_use]
    pub const fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    #[must_use]
    pub const fn with_nature(mut self, nature: Nature) -> Self {
        self.nature = nature;
        self
    }

    #[must_use]
    pub fn with_types(mut self, types: &[ElementType]) -> Self {
        self.types = types.iter().copied().collect();
        self
    }

    #[must_use]
    pub const fn with_hp(mut self, hp: u32) -> Self {
        self.hp = hp;
        self
    }

    #[must_use]
    pub const fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    #[must_use]
    pub fn has_type(&self, element: ElementType) -> bool {
        self.types.contains(&element)
    }

    #[must_use]
    pub fn has_ability(&self, ability: &AbilityId) -> bool {
        self.ability.as_ref() == Some(ability)
    }

    #[must_use]
    pub fn holds(&self, item: &ItemId) -> bool {
        self.held_item.as_ref() == Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_gender_requires_both_sides_gendered() {
        assert!(Gender::Male.is_opposite_of(Gender::Female));
        assert!(Gender::Female.is_opposite_of(Gender::Male));
        assert!(!Gender::Male.is_opposite_of(Gender::Male));
        assert!(!Gender::Genderless.is_opposite_of(Gender::Female));
    }

    #[test]
    fn builders_compose() {
        let creature = Creature::new("magnemite", 12)
            .with_types(&[ElementType::Electric, ElementType::Steel])
            .with_item("metal_coat")
            .with_ability("magnet_pull");
        assert!(creature.has_type(ElementType::Steel));
        assert!(creature.holds(&ItemId::new("metal_coat")));
        assert!(creature.has_ability(&AbilityId::new("magnet_pull")));
        assert!(!creature.is_fainted());
        assert!(creature.with_hp(0).is_fainted());
    }

    #[test]
    fn creature_deserializes_with_defaults() {
        let creature: Creature =
            serde_json::from_str(r#"{"species":"zubat","level":4,"hp":12}"#).unwrap();
        assert_eq!(creature.species.as_str(), "zubat");
        assert_eq!(creature.gender, Gender::Genderless);
        assert!(creature.types.is_empty());
        assert!(!creature.shiny);
    }
}
