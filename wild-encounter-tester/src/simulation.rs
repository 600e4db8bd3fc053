use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use wild_encounter::{
    BattleSetupDescriptor, Creature, EncounterCatalog, EncounterConfig, EncounterResolver,
    MigrationPolicy, RoamingLocation, ToolKind, ToolOutcome,
};

use crate::world::SimWorld;

/// Map with no authored groups; only roamers can appear there.
const EMPTY_MAP: u32 = 99;
const ROAMER_DIVISOR: u32 = 3;
const CASTS_PER_STEP_BLOCK: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Walk,
    Repel,
    Fishing,
    Roaming,
    Horde,
    Determinism,
}

impl Scenario {
    pub const ALL: [Self; 6] = [
        Self::Walk,
        Self::Repel,
        Self::Fishing,
        Self::Roaming,
        Self::Horde,
        Self::Determinism,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Repel => "repel",
            Self::Fishing => "fishing",
            Self::Roaming => "roaming",
            Self::Horde => "horde",
            Self::Determinism => "determinism",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Walk => "Step encounters on route grass draw only authored species",
            Self::Repel => "A strong leader with repel active meets nothing",
            Self::Fishing => "Rod casts bite, build a chain, and respect the chain cap",
            Self::Roaming => "A 1-in-3 roamer appears at roughly a third of polls",
            Self::Horde => "Horde tiles always field a full horde",
            Self::Determinism => "Identical seeds replay identical encounters",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.key().eq_ignore_ascii_case(key))
    }
}

/// Expand scenario tokens, resolving `all` to every scenario.
pub fn expand_scenarios(tokens: &[String]) -> (Vec<Scenario>, Vec<String>) {
    let mut scenarios = Vec::new();
    let mut unknown = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("all") {
            for scenario in Scenario::ALL {
                if !scenarios.contains(&scenario) {
                    scenarios.push(scenario);
                }
            }
            continue;
        }
        match Scenario::from_key(token) {
            Some(scenario) if !scenarios.contains(&scenario) => scenarios.push(scenario),
            Some(_) => {}
            None => unknown.push(token.clone()),
        }
    }
    (scenarios, unknown)
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub steps: usize,
    pub encounters: usize,
    pub species: BTreeMap<String, usize>,
    pub max_fishing_chain: u32,
    pub rng_draws: u64,
    pub failures: Vec<String>,
    pub duration: Duration,
}

#[derive(Debug, Default)]
struct Tally {
    encounters: usize,
    species: BTreeMap<String, usize>,
    party_sizes: Vec<usize>,
    transcript: Vec<String>,
}

impl Tally {
    fn record(&mut self, descriptor: &BattleSetupDescriptor) -> Result<()> {
        self.encounters += 1;
        self.party_sizes.push(descriptor.wild_party.len());
        for creature in &descriptor.wild_party {
            *self
                .species
                .entry(creature.species.as_str().to_string())
                .or_default() += 1;
        }
        self.transcript
            .push(serde_json::to_string(descriptor).context("serialize descriptor")?);
        Ok(())
    }
}

/// Runs scenarios against one catalog and configuration.
#[derive(Debug, Clone)]
pub struct Simulation {
    catalog: EncounterCatalog,
    config: EncounterConfig,
    steps: usize,
    verbose: bool,
}

impl Simulation {
    pub const fn new(
        catalog: EncounterCatalog,
        config: EncounterConfig,
        steps: usize,
        verbose: bool,
    ) -> Self {
        Self {
            catalog,
            config,
            steps,
            verbose,
        }
    }

    fn resolver(&self, seed: u64) -> Result<EncounterResolver> {
        EncounterResolver::new(
            self.catalog.clone(),
            self.config.clone(),
            wild_encounter::AbilityRegistry::standard(),
            seed,
        )
        .context("build resolver")
    }

    pub fn run(&self, scenario: Scenario, seed: u64) -> Result<ScenarioResult> {
        let start = Instant::now();
        let mut failures = Vec::new();
        let mut max_chain = 0;
        let (tally, draws) = match scenario {
            Scenario::Walk => self.walk(&SimWorld::route(), seed, &mut failures)?,
            Scenario::Repel => self.repel(seed, &mut failures)?,
            Scenario::Fishing => self.fishing(seed, &mut failures, &mut max_chain)?,
            Scenario::Roaming => self.roaming(seed, &mut failures)?,
            Scenario::Horde => self.horde(seed, &mut failures)?,
            Scenario::Determinism => self.determinism(seed, &mut failures)?,
        };
        let result = ScenarioResult {
            scenario_name: scenario.key().to_string(),
            seed,
            passed: failures.is_empty(),
            steps: self.steps,
            encounters: tally.encounters,
            species: tally.species,
            max_fishing_chain: max_chain,
            rng_draws: draws,
            failures,
            duration: start.elapsed(),
        };
        if self.verbose {
            log::info!(
                "{} seed {}: {} encounters, {} draws",
                result.scenario_name,
                seed,
                result.encounters,
                result.rng_draws
            );
        }
        Ok(result)
    }

    fn walk_tally(&self, world: &SimWorld, seed: u64) -> Result<(Tally, u64)> {
        let mut resolver = self.resolver(seed)?;
        resolver.on_location_changed(world);
        let mut tally = Tally::default();
        for _ in 0..self.steps {
            resolver.on_step_taken(world);
            if resolver.is_encounter_available(world)
                && let Some(descriptor) = resolver.resolve(world, None)?
            {
                tally.record(&descriptor)?;
                resolver.on_battle_finished(world);
            }
        }
        Ok((tally, resolver.rng_draws()))
    }

    /// Species authored for tool-less groups valid on `world`'s tile.
    fn authored_species(&self, world: &SimWorld) -> BTreeSet<String> {
        self.catalog
            .groups
            .iter()
            .filter(|group| {
                group.tool.is_none()
                    && group.location.matches_world(world)
                    && group.is_eligible(world)
            })
            .flat_map(|group| group.tables.iter())
            .map(|table| table.species.as_str().to_string())
            .collect()
    }

    fn walk(
        &self,
        world: &SimWorld,
        seed: u64,
        failures: &mut Vec<String>,
    ) -> Result<(Tally, u64)> {
        let (tally, draws) = self.walk_tally(world, seed)?;
        if tally.encounters == 0 {
            failures.push(format!("no encounters in {} steps", self.steps));
        }
        let authored = self.authored_species(world);
        for species in tally.species.keys() {
            if !authored.contains(species) {
                failures.push(format!("unexpected species {species}"));
            }
        }
        Ok((tally, draws))
    }

    fn repel(&self, seed: u64, failures: &mut Vec<String>) -> Result<(Tally, u64)> {
        let world = SimWorld {
            repel_turns: u32::MAX,
            ..SimWorld::route().led_by(Creature::new("dragonite", 100))
        };
        let (tally, draws) = self.walk_tally(&world, seed)?;
        if tally.encounters > 0 {
            failures.push(format!("{} encounters slipped through repel", tally.encounters));
        }
        Ok((tally, draws))
    }

    fn fishing(
        &self,
        seed: u64,
        failures: &mut Vec<String>,
        max_chain: &mut u32,
    ) -> Result<(Tally, u64)> {
        let mut world = SimWorld::shore();
        let mut resolver = self.resolver(seed)?;
        resolver.on_location_changed(&world);
        let mut tally = Tally::default();
        let casts = (self.steps / CASTS_PER_STEP_BLOCK).max(1);
        let cap = self.config.fishing.chain_cap;
        for cast in 0..casts {
            world.streak = u32::try_from(cast % 4).unwrap_or(0);
            if resolver.start_tool_encounter(ToolKind::SuperRod, &world) == ToolOutcome::Encounter
                && let Some(descriptor) = resolver.resolve(&world, None)?
            {
                tally.record(&descriptor)?;
            }
            let chain = resolver.fishing_chain_length();
            if chain > cap {
                failures.push(format!("fishing chain {chain} exceeds cap {cap}"));
            }
            *max_chain = (*max_chain).max(chain);
        }
        if tally.encounters == 0 {
            failures.push(format!("no bites in {casts} casts"));
        }
        Ok((tally, resolver.rng_draws()))
    }

    fn roaming(&self, seed: u64, failures: &mut Vec<String>) -> Result<(Tally, u64)> {
        let world = SimWorld::route().on_tile(EMPTY_MAP, "tall_grass", 0);
        let mut resolver = self.resolver(seed)?;
        resolver.on_location_changed(&world);
        let policy = resolver.register_migration_policy(MigrationPolicy::fixed(
            RoamingLocation::new(EMPTY_MAP, &world.zone, world.terrain),
        ));
        resolver
            .release_roaming_creature(Creature::new("raikou", 40), ROAMER_DIVISOR, policy, &world)
            .context("release roamer")?;

        let mut tally = Tally::default();
        for _ in 0..self.steps {
            if resolver.is_encounter_available(&world)
                && let Some(descriptor) = resolver.resolve(&world, None)?
            {
                tally.record(&descriptor)?;
            }
        }
        if self.steps >= 300 {
            #[allow(clippy::cast_precision_loss)]
            let ratio = tally.encounters as f64 / self.steps as f64;
            if !(0.25..=0.42).contains(&ratio) {
                failures.push(format!("roamer appeared at ratio {ratio:.3}"));
            }
        }
        Ok((tally, resolver.rng_draws()))
    }

    fn horde(&self, seed: u64, failures: &mut Vec<String>) -> Result<(Tally, u64)> {
        let world = SimWorld::route().on_tile(1, "tall_grass", 2);
        let (tally, draws) = self.walk_tally(&world, seed)?;
        let expected = self.config.horde_size;
        if let Some(size) = tally.party_sizes.iter().find(|size| **size != expected) {
            failures.push(format!("horde fielded {size} creatures, expected {expected}"));
        }
        if tally.encounters == 0 {
            failures.push(format!("no hordes in {} steps", self.steps));
        }
        Ok((tally, draws))
    }

    fn determinism(&self, seed: u64, failures: &mut Vec<String>) -> Result<(Tally, u64)> {
        let world = SimWorld::route();
        let (first, draws) = self.walk_tally(&world, seed)?;
        let (second, replay_draws) = self.walk_tally(&world, seed)?;
        if first.transcript != second.transcript {
            failures.push("replay produced a different transcript".to_string());
        }
        if draws != replay_draws {
            failures.push(format!("replay drew {replay_draws} values, expected {draws}"));
        }
        Ok((first, draws))
    }
}
