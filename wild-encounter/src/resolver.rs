//! Encounter orchestration: availability in priority order, selection,
//! history bookkeeping and the battle setup descriptor.
use serde::{Deserialize, Serialize};

use crate::config::EncounterConfig;
use crate::creature::Creature;
use crate::data::{EncounterCatalog, EncounterGroup, GroupId, ToolKind};
use crate::error::{EncounterError, InvalidRequest};
use crate::fishing::{ToolOutcome, roll_bite};
use crate::history::HistoryLog;
use crate::registry::AbilityRegistry;
use crate::rng::WildRng;
use crate::roaming::{MigrationPolicy, RoamingId, RoamingRegistry};
use crate::scheduler::StepScheduler;
use crate::selection::{SelectionContext, SelectionTrace, WildParty, select};
use crate::world::{EncounterWorld, LocationQuery, LocationSnapshot, repel_active};

/// Where a resolved encounter came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EncounterSource {
    Forced,
    Tool { tool: ToolKind, group: GroupId },
    Roaming { id: RoamingId },
    Step { group: GroupId },
}

/// Player-side information handed to the battle subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSide {
    pub leader: Option<Creature>,
    pub ally: Option<String>,
    pub alive_count: usize,
}

/// Everything the battle subsystem needs to start a wild battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSetupDescriptor {
    pub source: EncounterSource,
    pub player_side: PlayerSide,
    pub wild_party: WildParty,
    pub simultaneous_count: usize,
    pub fishing: bool,
    pub event_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<SelectionTrace>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Forced,
    Tool { tool: ToolKind, group: usize },
    Roaming(RoamingId),
    Step { group: usize },
}

/// Root of the engine. Owns countdowns, history, roaming creatures and the
/// dedicated RNG stream; collaborators are only read through [`EncounterWorld`].
#[derive(Debug)]
pub struct EncounterResolver {
    catalog: EncounterCatalog,
    config: EncounterConfig,
    registry: AbilityRegistry,
    scheduler: StepScheduler,
    history: HistoryLog,
    roaming: RoamingRegistry,
    rng: WildRng,
    active_groups: Vec<usize>,
    forced: Option<WildParty>,
    tool: Option<ToolKind>,
    pending: Option<Pending>,
}

impl EncounterResolver {
    /// Build a resolver over a validated catalog and configuration.
    ///
    /// No group is active until the first [`Self::on_location_changed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or catalog is invalid.
    pub fn new(
        catalog: EncounterCatalog,
        config: EncounterConfig,
        registry: AbilityRegistry,
        seed: u64,
    ) -> Result<Self, EncounterError> {
        config.validate()?;
        catalog.validate()?;
        Ok(Self {
            catalog,
            config,
            registry,
            scheduler: StepScheduler::new(),
            history: HistoryLog::new(),
            roaming: RoamingRegistry::new(),
            rng: WildRng::from_user_seed(seed),
            active_groups: Vec::new(),
            forced: None,
            tool: None,
            pending: None,
        })
    }

    /// Resolver with default configuration and the standard ability roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog is invalid.
    pub fn with_defaults(catalog: EncounterCatalog, seed: u64) -> Result<Self, EncounterError> {
        Self::new(
            catalog,
            EncounterConfig::default(),
            AbilityRegistry::standard(),
            seed,
        )
    }

    fn frequency_factor<W: EncounterWorld + ?Sized>(&self, world: &W) -> f64 {
        let leader = world.leader();
        self.registry
            .frequency_factor(leader.as_ref(), world, &self.config.scheduler)
    }

    // Events -----------------------------------------------------------------

    /// Map load or zone/time change: re-filter groups, redraw every
    /// countdown, and run the roaming reset checkpoint.
    pub fn on_location_changed<W: EncounterWorld + ?Sized>(&mut self, world: &W) {
        self.active_groups = self.catalog.eligible_indices(world);
        let factor = self.frequency_factor(world);
        let catalog = &self.catalog;
        let active = self.active_groups.iter().filter_map(|idx| {
            catalog.get(*idx).map(|group| (*idx, group.average_steps))
        });
        self.scheduler.reset(active, factor, &mut self.rng);
        let snapshot = LocationSnapshot::capture(world);
        let moved = self.roaming.checkpoint(&snapshot, &mut self.rng);
        log::debug!(
            "location changed to map {:?}: {} active groups, {moved} roamers moved",
            snapshot.map_id,
            self.active_groups.len()
        );
        self.tool = None;
        self.pending = None;
    }

    /// Accepted player step: decrement countdowns, redraw the depleted ones.
    pub fn on_step_taken<W: EncounterWorld + ?Sized>(&mut self, world: &W) {
        let factor = self.frequency_factor(world);
        self.scheduler.tick(factor, &mut self.rng);
        self.pending = None;
    }

    /// The player looked at the region map.
    pub fn on_map_observed(&mut self) {
        self.roaming.mark_all_spotted();
    }

    /// Battle context ended: purge fainted roamers and migrate survivors.
    pub fn on_battle_finished<W: EncounterWorld + ?Sized>(&mut self, world: &W) {
        let snapshot = LocationSnapshot::capture(world);
        self.roaming.checkpoint(&snapshot, &mut self.rng);
        self.pending = None;
    }

    // Requests ---------------------------------------------------------------

    /// Register a migration policy for roaming creatures.
    pub fn register_migration_policy(&mut self, policy: MigrationPolicy) -> usize {
        self.roaming.register_policy(policy)
    }

    /// Release a roaming creature and place it with its policy.
    ///
    /// # Errors
    ///
    /// Returns an invalid request for a zero divisor or an unknown policy id.
    pub fn release_roaming_creature<W: LocationQuery + ?Sized>(
        &mut self,
        creature: Creature,
        chance_divisor: u32,
        policy: usize,
        world: &W,
    ) -> Result<RoamingId, EncounterError> {
        let snapshot = LocationSnapshot::capture(world);
        self.roaming
            .release(creature, chance_divisor, policy, &snapshot, &mut self.rng)
    }

    /// Register a scripted encounter that bypasses every table.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest::EmptyForcedList`] when `creatures` is empty.
    pub fn set_forced_encounter(&mut self, creatures: Vec<Creature>) -> Result<(), EncounterError> {
        if creatures.is_empty() {
            return Err(InvalidRequest::EmptyForcedList.into());
        }
        self.forced = Some(creatures.into_iter().collect());
        self.pending = None;
        Ok(())
    }

    /// Register and immediately resolve a scripted encounter.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest::EmptyForcedList`] when `creatures` is empty.
    pub fn resolve_forced<W: EncounterWorld + ?Sized>(
        &mut self,
        world: &W,
        creatures: Vec<Creature>,
        event_id: Option<u32>,
    ) -> Result<BattleSetupDescriptor, EncounterError> {
        self.set_forced_encounter(creatures)?;
        let party = self.forced.take().unwrap_or_default();
        Ok(self.finish_forced(world, party, event_id))
    }

    /// Use a tool on the current tile.
    ///
    /// Rods roll the bite gate first; a miss resets the history log. A hit
    /// (or an ungated tool) arms the encounter when a group matches.
    pub fn start_tool_encounter<W: EncounterWorld + ?Sized>(
        &mut self,
        tool: ToolKind,
        world: &W,
    ) -> ToolOutcome {
        self.pending = None;
        self.tool = None;
        let leader = world.leader();
        let bite = roll_bite(
            tool,
            leader.as_ref(),
            world.fishing_streak_bonus(),
            &self.registry,
            &self.config.fishing,
            &mut self.rng,
        );
        if !bite {
            self.history.clear();
            return ToolOutcome::NoBite;
        }
        if self.catalog.tool_group(tool, world).is_none() {
            return ToolOutcome::NothingHere;
        }
        self.tool = Some(tool);
        ToolOutcome::Encounter
    }

    /// [`Self::start_tool_encounter`] for an externally supplied tool id.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest::UnknownTool`] for an unregistered id.
    pub fn start_tool_encounter_by_id<W: EncounterWorld + ?Sized>(
        &mut self,
        tool_id: &str,
        world: &W,
    ) -> Result<ToolOutcome, EncounterError> {
        let tool = ToolKind::from_id(tool_id)?;
        Ok(self.start_tool_encounter(tool, world))
    }

    pub fn cancel_tool_encounter(&mut self) {
        self.tool = None;
        self.pending = None;
    }

    // Availability -----------------------------------------------------------

    /// Whether an encounter would start now. Polled once per step; the
    /// answer is kept for the following [`Self::resolve`].
    pub fn is_encounter_available<W: EncounterWorld + ?Sized>(&mut self, world: &W) -> bool {
        self.pending = self.check_availability(world);
        self.pending.is_some()
    }

    fn check_availability<W: EncounterWorld + ?Sized>(&mut self, world: &W) -> Option<Pending> {
        if self.forced.is_some() {
            return Some(Pending::Forced);
        }
        if let Some(tool) = self.tool {
            return self
                .catalog
                .tool_group(tool, world)
                .map(|group| Pending::Tool { tool, group });
        }
        if world.battle_in_progress() || world.party_alive_count() == 0 {
            return None;
        }

        let triggered = self.triggered_group(world);

        self.roaming.purge_dead();
        let snapshot = LocationSnapshot::capture(world);
        if let Some(id) = self.roaming.find_appearing(&snapshot, &mut self.rng) {
            log::debug!("{id} appears on map {:?}", snapshot.map_id);
            return Some(Pending::Roaming(id));
        }

        triggered.map(|group| Pending::Step { group })
    }

    /// First triggered, tool-less group valid on the current tile, in load order.
    fn triggered_group<W: EncounterWorld + ?Sized>(&self, world: &W) -> Option<usize> {
        let system_tag = world.system_tag();
        let terrain_tag = world.terrain_tag();
        let mut triggered: Vec<usize> = self.scheduler.triggered().collect();
        triggered.sort_unstable();
        triggered.into_iter().find(|idx| {
            self.catalog.get(*idx).is_some_and(|group| {
                group.tool.is_none()
                    && group.location.matches(&system_tag, terrain_tag)
                    && group.is_eligible(world)
            })
        })
    }

    // Resolution -------------------------------------------------------------

    /// Produce the battle setup for the pending encounter, computing
    /// availability first if nothing is pending. `Ok(None)` means no
    /// encounter.
    ///
    /// # Errors
    ///
    /// Returns an invalid request when a roaming encounter references a
    /// creature that no longer exists.
    pub fn resolve<W: EncounterWorld + ?Sized>(
        &mut self,
        world: &W,
        event_id: Option<u32>,
    ) -> Result<Option<BattleSetupDescriptor>, EncounterError> {
        let pending = match self.pending.take() {
            Some(pending) => Some(pending),
            None => self.check_availability(world),
        };
        let Some(pending) = pending else {
            return Ok(None);
        };
        match pending {
            Pending::Forced => {
                let party = self.forced.take().unwrap_or_default();
                Ok(Some(self.finish_forced(world, party, event_id)))
            }
            Pending::Tool { tool, group } => {
                self.tool = None;
                let source = EncounterSource::Tool {
                    tool,
                    group: self.group_id(group),
                };
                Ok(self.resolve_group(world, group, source, event_id))
            }
            Pending::Roaming(id) => {
                let roamer = self
                    .roaming
                    .get(id)
                    .ok_or(InvalidRequest::UnknownRoamer(id.0))?;
                let party: WildParty = std::iter::once(roamer.creature.clone()).collect();
                Ok(Some(self.descriptor(
                    world,
                    EncounterSource::Roaming { id },
                    party,
                    false,
                    event_id,
                    None,
                )))
            }
            Pending::Step { group } => {
                let source = EncounterSource::Step {
                    group: self.group_id(group),
                };
                let descriptor = self.resolve_group(world, group, source, event_id);
                if descriptor.is_some() {
                    self.consume_countdown(world, group);
                }
                Ok(descriptor)
            }
        }
    }

    fn group_id(&self, group: usize) -> GroupId {
        self.catalog
            .get(group)
            .map_or_else(|| GroupId::new("unknown"), |g| g.id.clone())
    }

    fn finish_forced<W: EncounterWorld + ?Sized>(
        &mut self,
        world: &W,
        party: WildParty,
        event_id: Option<u32>,
    ) -> BattleSetupDescriptor {
        self.tool = None;
        self.pending = None;
        log::debug!("forced encounter with {} creatures", party.len());
        self.descriptor(world, EncounterSource::Forced, party, false, event_id, None)
    }

    fn resolve_group<W: EncounterWorld + ?Sized>(
        &mut self,
        world: &W,
        group_idx: usize,
        source: EncounterSource,
        event_id: Option<u32>,
    ) -> Option<BattleSetupDescriptor> {
        let group: &EncounterGroup = self.catalog.get(group_idx)?;
        let leader = world.leader();
        let fishing = group.is_fishing();
        let has_ally = world.ally_trainer().is_some();
        let ctx = SelectionContext {
            leader: leader.as_ref(),
            repel_active: repel_active(world),
            fishing,
            has_ally,
            fishing_chain: self.fishing_chain_length(),
        };
        let selection = select(group, &ctx, &self.registry, &self.config, &mut self.rng)?;
        self.history.record_encounter(
            selection.party.iter(),
            &group.location,
            group.tool,
            self.config.fishing.chain_cap,
        );
        log::debug!(
            "group {} produced {} creatures (history {})",
            group.id.0,
            selection.party.len(),
            self.history.len()
        );
        Some(self.descriptor(
            world,
            source,
            selection.party,
            fishing,
            event_id,
            Some(selection.trace),
        ))
    }

    /// A group that produced an encounter starts a fresh countdown.
    fn consume_countdown<W: EncounterWorld + ?Sized>(&mut self, world: &W, group: usize) {
        let factor = self.frequency_factor(world);
        self.scheduler.deplete(group);
        self.scheduler.regenerate_depleted(factor, &mut self.rng);
    }

    fn descriptor<W: EncounterWorld + ?Sized>(
        &self,
        world: &W,
        source: EncounterSource,
        wild_party: WildParty,
        fishing: bool,
        event_id: Option<u32>,
        trace: Option<SelectionTrace>,
    ) -> BattleSetupDescriptor {
        BattleSetupDescriptor {
            source,
            player_side: PlayerSide {
                leader: world.leader(),
                ally: world.ally_trainer(),
                alive_count: world.party_alive_count(),
            },
            simultaneous_count: wild_party.len(),
            wild_party,
            fishing,
            event_id,
            trace,
        }
    }

    // Queries ----------------------------------------------------------------

    /// Trailing run of fishing records in the history, capped.
    #[must_use]
    pub fn fishing_chain_length(&self) -> u32 {
        self.history.fishing_chain(self.config.fishing.chain_cap)
    }

    #[must_use]
    pub const fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    /// Current countdown of an active group.
    #[must_use]
    pub fn countdown(&self, group: &GroupId) -> Option<i32> {
        self.catalog
            .index_of(group)
            .and_then(|idx| self.scheduler.countdown(idx))
    }

    /// Ids of the groups active at the current location, in load order.
    #[must_use]
    pub fn active_groups(&self) -> Vec<&GroupId> {
        self.active_groups
            .iter()
            .filter_map(|idx| self.catalog.get(*idx))
            .map(|group| &group.id)
            .collect()
    }

    #[must_use]
    pub const fn roaming(&self) -> &RoamingRegistry {
        &self.roaming
    }

    /// Mutable access to a roaming creature so the battle subsystem can
    /// write back damage.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest::UnknownRoamer`] for an unknown id.
    pub fn roaming_creature_mut(&mut self, id: RoamingId) -> Result<&mut Creature, EncounterError> {
        self.roaming
            .creature_mut(id)
            .ok_or_else(|| InvalidRequest::UnknownRoamer(id.0).into())
    }

    #[must_use]
    pub const fn catalog(&self) -> &EncounterCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &EncounterConfig {
        &self.config
    }

    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rng.draws()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EncounterTable, LocationFilter};
    use crate::world::{MapId, PartyQuery, SystemTag, TerrainTag, ZoneKind};

    struct Meadow {
        tag: &'static str,
    }

    impl LocationQuery for Meadow {
        fn system_tag(&self) -> SystemTag {
            SystemTag::new(self.tag)
        }

        fn terrain_tag(&self) -> TerrainTag {
            TerrainTag(0)
        }

        fn map_id(&self) -> MapId {
            MapId(1)
        }

        fn zone_kind(&self, _observed: bool) -> ZoneKind {
            ZoneKind::new("grass")
        }
    }

    impl PartyQuery for Meadow {
        fn leader(&self) -> Option<Creature> {
            Some(Creature::new("eevee", 10))
        }

        fn party_alive_count(&self) -> usize {
            1
        }

        fn repel_turns_remaining(&self) -> u32 {
            0
        }

        fn repel_on_cooldown(&self) -> bool {
            false
        }
    }

    fn meadow_resolver() -> EncounterResolver {
        let catalog = EncounterCatalog::from_groups(vec![
            EncounterGroup::new("meadow", LocationFilter::new("grass", 0), 4)
                .with_table(EncounterTable::new("sentret", 10, 12, 1)),
            EncounterGroup::new("pond", LocationFilter::new("water", 0), 1)
                .with_table(EncounterTable::new("magikarp", 10, 12, 1))
                .with_tool(ToolKind::GoodRod),
        ])
        .unwrap();
        EncounterResolver::with_defaults(catalog, 99).unwrap()
    }

    #[test]
    fn invalid_config_is_refused() {
        let cfg = EncounterConfig {
            horde_size: 0,
            ..EncounterConfig::default()
        };
        let err = EncounterResolver::new(
            EncounterCatalog::default(),
            cfg,
            AbilityRegistry::standard(),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, EncounterError::Config(_)));
    }

    #[test]
    fn resolved_group_gets_a_fresh_countdown() {
        let world = Meadow { tag: "grass" };
        let mut resolver = meadow_resolver();
        resolver.on_location_changed(&world);
        let meadow = GroupId::new("meadow");
        let mut resolved = false;
        for _ in 0..100 {
            resolver.on_step_taken(&world);
            if resolver.is_encounter_available(&world) {
                assert!(resolver.resolve(&world, None).unwrap().is_some());
                resolved = true;
                break;
            }
        }
        assert!(resolved);
        assert!(resolver.countdown(&meadow).is_some_and(|steps| steps >= 1));
    }

    #[test]
    fn cancelled_tool_encounter_resolves_nothing() {
        let world = Meadow { tag: "water" };
        let mut resolver = meadow_resolver();
        resolver.on_location_changed(&world);
        let outcome = loop {
            let outcome = resolver.start_tool_encounter(ToolKind::GoodRod, &world);
            if outcome.is_encounter() {
                break outcome;
            }
        };
        assert_eq!(outcome, ToolOutcome::Encounter);
        resolver.cancel_tool_encounter();
        assert!(!resolver.is_encounter_available(&world));
        assert_eq!(resolver.resolve(&world, Some(3)).unwrap(), None);
    }

    #[test]
    fn draws_are_counted() {
        let world = Meadow { tag: "grass" };
        let mut resolver = meadow_resolver();
        assert_eq!(resolver.rng_draws(), 0);
        resolver.on_location_changed(&world);
        assert!(resolver.rng_draws() > 0);
    }
}
