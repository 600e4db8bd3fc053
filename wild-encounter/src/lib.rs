//! Wild Encounter Engine
//!
//! Decides when a wild encounter starts, which creatures appear, and how
//! persistent state (roaming creatures, fishing chains, step countdowns)
//! evolves. The crate has no UI or platform dependencies; the overworld is
//! read through the [`world::EncounterWorld`] traits and the result is a
//! [`resolver::BattleSetupDescriptor`] for the battle subsystem.

pub mod config;
mod constants;
pub mod creature;
pub mod data;
pub mod error;
pub mod fishing;
pub mod history;
pub mod numbers;
pub mod registry;
pub mod resolver;
pub mod rng;
pub mod roaming;
pub mod scheduler;
pub mod selection;
pub mod world;

// Re-export commonly used types
pub use config::{
    EncounterConfig, EncounterConfigError, FishingConfig, RateConfig, SchedulerConfig, ShinyConfig,
};
pub use creature::{AbilityId, Creature, ElementType, Gender, ItemId, Nature, SpeciesId};
pub use data::{
    CountClass, EncounterCatalog, EncounterGroup, EncounterTable, GenderRatio, GroupCondition,
    GroupId, LocationFilter, ToolClass, ToolKind,
};
pub use error::{EncounterError, InvalidRequest};
pub use fishing::ToolOutcome;
pub use history::{HistoryLog, HistoryRecord};
pub use registry::{AbilityRegistry, FrequencyGate, RateModifier};
pub use resolver::{BattleSetupDescriptor, EncounterResolver, EncounterSource, PlayerSide};
pub use rng::{CountingRng, WildRng};
pub use roaming::{MigrationPolicy, RoamingCreature, RoamingId, RoamingLocation};
pub use selection::{SelectionTrace, WildParty};
pub use world::{
    EncounterWorld, LocationQuery, LocationSnapshot, MapId, PartyQuery, SystemTag, TerrainTag,
    TimeOfDay, WeatherTag, ZoneKind,
};

/// Source of authored encounter data.
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the encounter catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<EncounterCatalog, Self::Error>;

    /// Load tuning overrides. Defaults apply when none are authored.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config(&self) -> Result<EncounterConfig, Self::Error> {
        Ok(EncounterConfig::default())
    }
}

/// Build a resolver from a loader with the standard ability roster.
///
/// # Errors
///
/// Returns an error if loading fails or the loaded data is invalid.
pub fn resolver_from_loader<L>(loader: &L, seed: u64) -> Result<EncounterResolver, EncounterError>
where
    L: CatalogLoader<Error = EncounterError>,
{
    let catalog = loader.load_catalog()?;
    let config = loader.load_config()?;
    EncounterResolver::new(catalog, config, AbilityRegistry::standard(), seed)
}
