//! Tool-gated encounters: the fishing bite gate and the outcome of starting
//! a tool encounter.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::FishingConfig;
use crate::creature::Creature;
use crate::data::ToolKind;
use crate::numbers::u32_to_f64;
use crate::registry::AbilityRegistry;

/// Result of using a tool on the current tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    /// A group matched and an encounter is pending.
    Encounter,
    /// The fishing gate failed; history was reset.
    NoBite,
    /// No group is authored for this tool here.
    NothingHere,
}

impl ToolOutcome {
    #[must_use]
    pub const fn is_encounter(self) -> bool {
        matches!(self, Self::Encounter)
    }
}

/// Bite probability for a rod, before the streak guarantee.
///
/// `None` for terrain tools, which are not gated.
#[must_use]
pub fn bite_chance(
    tool: ToolKind,
    leader: Option<&Creature>,
    streak_bonus: u32,
    registry: &AbilityRegistry,
    cfg: &FishingConfig,
) -> Option<f64> {
    let base = cfg.base_rate(tool)?;
    let grip = if leader.is_some_and(|leader| registry.has_grip(leader)) {
        cfg.grip_multiplier
    } else {
        1.0
    };
    let streak = cfg.streak_step.mul_add(u32_to_f64(streak_bonus), 1.0);
    Some(base * grip * streak)
}

/// Roll the bite gate. Terrain tools and streaks at the guarantee
/// threshold always succeed.
pub fn roll_bite<R: Rng + ?Sized>(
    tool: ToolKind,
    leader: Option<&Creature>,
    streak_bonus: u32,
    registry: &AbilityRegistry,
    cfg: &FishingConfig,
    rng: &mut R,
) -> bool {
    let Some(chance) = bite_chance(tool, leader, streak_bonus, registry, cfg) else {
        return true;
    };
    if streak_bonus >= cfg.streak_guarantee {
        return true;
    }
    let draw: f64 = rng.r#gen();
    let bite = draw < chance;
    log::debug!(
        "fishing with {} chance {chance:.3} draw {draw:.3} bite {bite}",
        tool.id()
    );
    bite
}
