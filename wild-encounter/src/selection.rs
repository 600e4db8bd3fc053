//! Weighted sampling of wild creatures from an encounter group.
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::EncounterConfig;
use crate::constants::NATURE_COUNT;
use crate::creature::{Creature, Gender, Nature, SpeciesId};
use crate::data::{EncounterGroup, EncounterTable, GenderRatio, GroupId};
use crate::numbers::round_f64_to_u32;
use crate::registry::AbilityRegistry;

/// Wild creatures produced by one resolution.
pub type WildParty = SmallVec<[Creature; 3]>;

/// Per-resolution inputs that are not part of the group.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionContext<'a> {
    pub leader: Option<&'a Creature>,
    pub repel_active: bool,
    /// Tool-gated fishing resolution; repel does not apply.
    pub fishing: bool,
    pub has_ally: bool,
    pub fishing_chain: u32,
}

/// One concrete instance a table entry was expanded into.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub table: usize,
    pub creature: Creature,
    pub rarity_weight: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTrace {
    pub species: SpeciesId,
    pub level: u8,
    pub rate: f64,
    pub rarity_weight: u32,
    pub real_weight: u32,
}

/// Record of how a selection was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionTrace {
    pub group: GroupId,
    pub candidates: Vec<CandidateTrace>,
    pub rolls: Vec<u64>,
    pub chosen: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub party: WildParty,
    pub trace: SelectionTrace,
}

/// Number of wild creatures a group fields in this context.
#[must_use]
pub fn required_count(
    group: &EncounterGroup,
    ctx: &SelectionContext<'_>,
    cfg: &EncounterConfig,
) -> usize {
    group.count.effective_count(ctx.has_ally, cfg.horde_size)
}

fn roll_level<R: Rng + ?Sized>(
    table: &EncounterTable,
    ctx: &SelectionContext<'_>,
    registry: &AbilityRegistry,
    cfg: &EncounterConfig,
    rng: &mut R,
) -> u8 {
    let (min, max) = (table.min_level(), table.max_level().max(table.min_level()));
    let maxing = ctx
        .leader
        .is_some_and(|leader| registry.forces_level_max(leader));
    if maxing && rng.gen_bool(cfg.rates.level_max_chance) {
        max
    } else {
        rng.gen_range(min..=max)
    }
}

fn roll_gender<R: Rng + ?Sized>(ratio: GenderRatio, rng: &mut R) -> Gender {
    match ratio {
        GenderRatio::Genderless => Gender::Genderless,
        GenderRatio::Gendered(female_chance) => {
            if rng.gen_bool(female_chance.clamp(0.0, 1.0)) {
                Gender::Female
            } else {
                Gender::Male
            }
        }
    }
}

fn roll_shiny<R: Rng + ?Sized>(
    ctx: &SelectionContext<'_>,
    cfg: &EncounterConfig,
    rng: &mut R,
) -> bool {
    let per_link = cfg.shiny.chain_bonus_per_link;
    let bonus = if ctx.fishing {
        ctx.fishing_chain.saturating_mul(per_link)
    } else {
        0
    };
    let winning = bonus.saturating_add(1);
    rng.gen_range(0..cfg.shiny.odds.max(1)) < winning
}

/// Build one wild instance from a table entry.
pub fn instantiate<R: Rng + ?Sized>(
    table: &EncounterTable,
    ctx: &SelectionContext<'_>,
    registry: &AbilityRegistry,
    cfg: &EncounterConfig,
    rng: &mut R,
) -> Creature {
    let level = roll_level(table, ctx, registry, cfg, rng);
    let mut creature = Creature::new(table.species.as_str(), level)
        .with_types(&table.types)
        .with_gender(roll_gender(table.gender, rng))
        .with_nature(Nature(rng.gen_range(0..NATURE_COUNT)));
    creature.form = table.form;
    if let Some(drop) = &table.held_item
        && rng.gen_bool(drop.chance.clamp(0.0, 1.0))
    {
        creature.held_item = Some(drop.item.clone());
    }
    creature.shiny = roll_shiny(ctx, cfg, rng);
    creature
}

/// Expand every table entry into `count` instances, in table order.
pub fn expand_candidates<R: Rng + ?Sized>(
    group: &EncounterGroup,
    count: usize,
    ctx: &SelectionContext<'_>,
    registry: &AbilityRegistry,
    cfg: &EncounterConfig,
    rng: &mut R,
) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(group.tables.len() * count);
    for (table_idx, table) in group.tables.iter().enumerate() {
        for _ in 0..count {
            candidates.push(Candidate {
                table: table_idx,
                creature: instantiate(table, ctx, registry, cfg, rng),
                rarity_weight: table.rarity_weight,
            });
        }
    }
    candidates
}

/// Selection rate of one candidate: at most one ability modifier, then the
/// cleanse item and repel rules for candidates below the leader's level.
#[must_use]
pub fn selection_rate(
    candidate: &Creature,
    ctx: &SelectionContext<'_>,
    registry: &AbilityRegistry,
    cfg: &EncounterConfig,
) -> f64 {
    let mut rate = 1.0;
    let Some(leader) = ctx.leader else {
        return rate;
    };
    if let Some(modifier) = leader
        .ability
        .as_ref()
        .and_then(|ability| registry.rate_modifier(ability))
    {
        rate = modifier.apply(rate, candidate, leader, &cfg.rates);
    }
    if candidate.level < leader.level {
        if registry.holds_cleanse_item(leader) {
            rate *= cfg.rates.cleanse_multiplier;
        }
        if ctx.repel_active && !ctx.fishing {
            rate = 0.0;
        }
    }
    rate
}

/// Rate times rarity, in fixed point.
#[must_use]
pub fn real_weight(rate: f64, rarity_weight: u32, cfg: &EncounterConfig) -> u32 {
    round_f64_to_u32(rate * f64::from(rarity_weight) * f64::from(cfg.rates.weight_scale))
}

/// Cumulative weights for prefix-sum sampling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedPool {
    prefix: Vec<u64>,
}

impl WeightedPool {
    #[must_use]
    pub fn new(weights: &[u32]) -> Self {
        let prefix = weights
            .iter()
            .scan(0_u64, |running, weight| {
                *running += u64::from(*weight);
                Some(*running)
            })
            .collect();
        Self { prefix }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.prefix.last().copied().unwrap_or(0)
    }

    /// Index of the first prefix strictly greater than `roll`.
    #[must_use]
    pub fn locate(&self, roll: u64) -> Option<usize> {
        let idx = self.prefix.partition_point(|&cumulative| cumulative <= roll);
        (idx < self.prefix.len()).then_some(idx)
    }

    #[must_use]
    pub fn weight(&self, idx: usize) -> u64 {
        let upper = self.prefix.get(idx).copied().unwrap_or(0);
        let lower = idx
            .checked_sub(1)
            .and_then(|prev| self.prefix.get(prev))
            .copied()
            .unwrap_or(0);
        upper - lower
    }
}

/// Draw among unpicked positive-weight entries, with removal.
fn draw_remaining<R: Rng + ?Sized>(
    pool: &WeightedPool,
    picked: &[usize],
    rng: &mut R,
) -> Option<(usize, u64)> {
    let open = |idx: &usize| !picked.contains(idx) && pool.weight(*idx) > 0;
    let remaining: u64 = (0..pool.prefix.len())
        .filter(open)
        .map(|idx| pool.weight(idx))
        .sum();
    if remaining == 0 {
        return None;
    }
    let roll = rng.gen_range(0..remaining);
    let mut current = 0_u64;
    for idx in (0..pool.prefix.len()).filter(open) {
        current += pool.weight(idx);
        if roll < current {
            return Some((idx, roll));
        }
    }
    None
}

/// Pick up to `picks` distinct indices, proportional to `weights`.
///
/// Each pick redraws on a duplicate up to `max_retries` times, then falls
/// back to drawing with removal. Returns `None` when the total weight is
/// zero; the result is shorter than `picks` when fewer positive-weight
/// entries exist.
pub fn sample_without_replacement<R: Rng + ?Sized>(
    weights: &[u32],
    picks: usize,
    max_retries: u32,
    rng: &mut R,
) -> Option<(Vec<usize>, Vec<u64>)> {
    let pool = WeightedPool::new(weights);
    let total = pool.total();
    if total == 0 {
        return None;
    }
    let mut chosen = Vec::with_capacity(picks);
    let mut rolls = Vec::with_capacity(picks);
    for _ in 0..picks {
        let mut winner = None;
        for _ in 0..=max_retries {
            let roll = rng.gen_range(0..total);
            if let Some(idx) = pool.locate(roll)
                && !chosen.contains(&idx)
            {
                winner = Some((idx, roll));
                break;
            }
        }
        let Some((idx, roll)) = winner.or_else(|| draw_remaining(&pool, &chosen, rng)) else {
            break;
        };
        chosen.push(idx);
        rolls.push(roll);
    }
    (!chosen.is_empty()).then_some((chosen, rolls))
}

/// Full selection pass over a group. `None` means no encounter.
pub fn select<R: Rng + ?Sized>(
    group: &EncounterGroup,
    ctx: &SelectionContext<'_>,
    registry: &AbilityRegistry,
    cfg: &EncounterConfig,
    rng: &mut R,
) -> Option<Selection> {
    let count = required_count(group, ctx, cfg);
    let candidates = expand_candidates(group, count, ctx, registry, cfg, rng);

    let traces: Vec<CandidateTrace> = candidates
        .iter()
        .map(|candidate| {
            let rate = selection_rate(&candidate.creature, ctx, registry, cfg);
            let weight = real_weight(rate, candidate.rarity_weight, cfg);
            log::trace!(
                "candidate {} lv{} rate {rate:.3} weight {weight}",
                candidate.creature.species.as_str(),
                candidate.creature.level
            );
            CandidateTrace {
                species: candidate.creature.species.clone(),
                level: candidate.creature.level,
                rate,
                rarity_weight: candidate.rarity_weight,
                real_weight: weight,
            }
        })
        .collect();
    let weights: Vec<u32> = traces.iter().map(|trace| trace.real_weight).collect();

    let Some((chosen, rolls)) =
        sample_without_replacement(&weights, count, cfg.rates.max_rejection_retries, rng)
    else {
        log::debug!("group {} has zero total weight", group.id.0);
        return None;
    };

    let party: WildParty = chosen
        .iter()
        .filter_map(|idx| candidates.get(*idx))
        .map(|candidate| candidate.creature.clone())
        .collect();
    Some(Selection {
        party,
        trace: SelectionTrace {
            group: group.id.clone(),
            candidates: traces,
            rolls,
            chosen,
        },
    })
}
