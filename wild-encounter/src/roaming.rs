//! Roaming creatures: persistent wild creatures that migrate between maps on
//! their own schedule instead of spawning from step tables.
//!
//! Relocation needs a [`MigrationToken`], which only the registry can mint.
//! Each token carries an epoch, and a creature moves at most once per epoch,
//! so a policy cannot fire twice inside one unlocked bracket.
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::creature::Creature;
use crate::error::{EncounterError, InvalidRequest};
use crate::world::{LocationSnapshot, MapId, TerrainTag, ZoneKind};

/// Handle to a released roaming creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoamingId(pub u32);

impl fmt::Display for RoamingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "roamer#{}", self.0)
    }
}

/// Where a roaming creature currently lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoamingLocation {
    pub map_id: MapId,
    pub zone_kind: ZoneKind,
    pub terrain_tag: TerrainTag,
}

impl RoamingLocation {
    #[must_use]
    pub fn new(map_id: u32, zone_kind: &str, terrain_tag: u8) -> Self {
        Self {
            map_id: MapId(map_id),
            zone_kind: ZoneKind::new(zone_kind),
            terrain_tag: TerrainTag(terrain_tag),
        }
    }

    /// Exact match on map, zone kind and terrain tag.
    #[must_use]
    pub fn matches(&self, snapshot: &LocationSnapshot) -> bool {
        self.map_id == snapshot.map_id
            && self.zone_kind == snapshot.zone_kind
            && self.terrain_tag == snapshot.terrain_tag
    }
}

/// Inputs a migration policy may look at.
#[derive(Debug, Clone, Copy)]
pub struct MigrationContext<'a> {
    pub snapshot: &'a LocationSnapshot,
    pub current: Option<&'a RoamingLocation>,
    pub spotted: bool,
    /// Uniform draw made by the registry for this creature and bracket.
    pub roll: u32,
}

type MigrationRule = Box<dyn Fn(&MigrationContext<'_>) -> Option<RoamingLocation>>;

/// Pure function from a location snapshot to the next location.
/// `None` keeps the creature where it is.
pub struct MigrationPolicy {
    name: String,
    rule: MigrationRule,
}

impl fmt::Debug for MigrationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationPolicy")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl MigrationPolicy {
    pub fn custom<F>(name: &str, rule: F) -> Self
    where
        F: Fn(&MigrationContext<'_>) -> Option<RoamingLocation> + 'static,
    {
        Self {
            name: name.to_string(),
            rule: Box::new(rule),
        }
    }

    /// Always lives at `location`.
    #[must_use]
    pub fn fixed(location: RoamingLocation) -> Self {
        Self::custom("fixed", move |_| Some(location.clone()))
    }

    /// Picks a new location from `locations` on every bracket.
    #[must_use]
    pub fn rotate(locations: Vec<RoamingLocation>) -> Self {
        Self::custom("rotate", move |ctx| pick(&locations, ctx.roll))
    }

    /// Stays put until the player has spotted it, then moves on.
    #[must_use]
    pub fn rotate_when_spotted(locations: Vec<RoamingLocation>) -> Self {
        Self::custom("rotate_when_spotted", move |ctx| {
            if ctx.spotted || ctx.current.is_none() {
                pick(&locations, ctx.roll)
            } else {
                None
            }
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn next_location(&self, ctx: &MigrationContext<'_>) -> Option<RoamingLocation> {
        (self.rule)(ctx)
    }
}

fn pick(locations: &[RoamingLocation], roll: u32) -> Option<RoamingLocation> {
    if locations.is_empty() {
        return None;
    }
    let index = usize::try_from(roll).unwrap_or(0) % locations.len();
    locations.get(index).cloned()
}

/// Proof that the registry is unlocked for one controlled mutation.
#[derive(Debug)]
pub struct MigrationToken {
    epoch: u64,
}

/// A roaming creature and its migration state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoamingCreature {
    pub id: RoamingId,
    pub creature: Creature,
    pub chance_divisor: u32,
    pub policy: usize,
    pub location: Option<RoamingLocation>,
    pub spotted: bool,
    #[serde(default)]
    migrated_epoch: u64,
}

impl RoamingCreature {
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.creature.is_fainted()
    }

    /// Relocate through `policy`. Dead creatures never move, and a creature
    /// moves at most once per token.
    fn migrate(
        &mut self,
        token: &MigrationToken,
        policy: &MigrationPolicy,
        snapshot: &LocationSnapshot,
        roll: u32,
    ) -> bool {
        if !self.is_alive() || self.migrated_epoch == token.epoch {
            return false;
        }
        self.migrated_epoch = token.epoch;
        let ctx = MigrationContext {
            snapshot,
            current: self.location.as_ref(),
            spotted: self.spotted,
            roll,
        };
        let Some(next) = policy.next_location(&ctx) else {
            return false;
        };
        log::debug!(
            "{} migrates via {} to map {:?}",
            self.id,
            policy.name(),
            next.map_id
        );
        self.location = Some(next);
        self.spotted = false;
        true
    }
}

/// All roaming creatures plus the registered migration policies.
#[derive(Debug, Default)]
pub struct RoamingRegistry {
    creatures: Vec<RoamingCreature>,
    policies: Vec<MigrationPolicy>,
    next_id: u32,
    epoch: u64,
}

impl RoamingRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy and return its id.
    pub fn register_policy(&mut self, policy: MigrationPolicy) -> usize {
        self.policies.push(policy);
        self.policies.len() - 1
    }

    #[must_use]
    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }

    fn unlock(&mut self) -> MigrationToken {
        self.epoch = self.epoch.saturating_add(1);
        MigrationToken { epoch: self.epoch }
    }

    /// Release a new roaming creature and place it immediately.
    ///
    /// # Errors
    ///
    /// Returns an invalid request for a zero divisor or an unknown policy.
    pub fn release<R: Rng + ?Sized>(
        &mut self,
        creature: Creature,
        chance_divisor: u32,
        policy: usize,
        snapshot: &LocationSnapshot,
        rng: &mut R,
    ) -> Result<RoamingId, EncounterError> {
        if chance_divisor == 0 {
            return Err(InvalidRequest::ZeroChanceDivisor.into());
        }
        if policy >= self.policies.len() {
            return Err(InvalidRequest::UnknownMigrationPolicy(policy).into());
        }
        let id = RoamingId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.creatures.push(RoamingCreature {
            id,
            creature,
            chance_divisor,
            policy,
            location: None,
            spotted: false,
            migrated_epoch: 0,
        });

        let token = self.unlock();
        let roll = rng.r#gen::<u32>();
        let Self {
            creatures,
            policies,
            ..
        } = self;
        if let Some(roamer) = creatures.last_mut() {
            roamer.migrate(&token, &policies[policy], snapshot, roll);
        }
        Ok(id)
    }

    /// Drop every creature whose hp reached zero.
    pub fn purge_dead(&mut self) -> Vec<RoamingId> {
        let dead: Vec<RoamingId> = self
            .creatures
            .iter()
            .filter(|roamer| !roamer.is_alive())
            .map(|roamer| roamer.id)
            .collect();
        if !dead.is_empty() {
            log::debug!("purging fainted roamers {dead:?}");
            self.creatures.retain(RoamingCreature::is_alive);
        }
        dead
    }

    /// Reset checkpoint: purge the dead, then migrate every survivor once
    /// under a single token. Returns how many creatures moved.
    pub fn checkpoint<R: Rng + ?Sized>(
        &mut self,
        snapshot: &LocationSnapshot,
        rng: &mut R,
    ) -> usize {
        self.purge_dead();
        let token = self.unlock();
        let Self {
            creatures,
            policies,
            ..
        } = self;
        let mut moved = 0;
        for roamer in creatures.iter_mut() {
            let Some(policy) = policies.get(roamer.policy) else {
                continue;
            };
            let roll = rng.r#gen::<u32>();
            if roamer.migrate(&token, policy, snapshot, roll) {
                moved += 1;
            }
        }
        moved
    }

    /// The player looked at the region map: every roamer is now spotted.
    pub fn mark_all_spotted(&mut self) {
        for roamer in &mut self.creatures {
            roamer.spotted = true;
        }
    }

    /// First living roamer at `snapshot` that passes its `1 / divisor` draw.
    /// The winner is marked spotted.
    pub fn find_appearing<R: Rng + ?Sized>(
        &mut self,
        snapshot: &LocationSnapshot,
        rng: &mut R,
    ) -> Option<RoamingId> {
        for roamer in &mut self.creatures {
            let here = roamer
                .location
                .as_ref()
                .is_some_and(|location| location.matches(snapshot));
            if !roamer.is_alive() || !here {
                continue;
            }
            if rng.gen_range(0..roamer.chance_divisor) == 0 {
                roamer.spotted = true;
                return Some(roamer.id);
            }
        }
        None
    }

    #[must_use]
    pub fn get(&self, id: RoamingId) -> Option<&RoamingCreature> {
        self.creatures.iter().find(|roamer| roamer.id == id)
    }

    /// Mutable access to the owned creature, used to write back battle damage.
    pub fn creature_mut(&mut self, id: RoamingId) -> Option<&mut Creature> {
        self.creatures
            .iter_mut()
            .find(|roamer| roamer.id == id)
            .map(|roamer| &mut roamer.creature)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoamingCreature> {
        self.creatures.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.creatures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }
}
