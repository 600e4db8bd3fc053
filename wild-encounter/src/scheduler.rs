//! Per-group step countdowns.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::TRIGGER_THRESHOLD;
use crate::numbers::round_f64_to_i32;

/// Draw a fresh countdown: two uniform draws in `[0, average_steps)` plus one.
///
/// The sum is triangular around `average_steps` and never below 1.
pub fn draw_countdown<R: Rng + ?Sized>(average_steps: u32, rng: &mut R) -> i32 {
    let average = average_steps.max(1);
    let first = u64::from(rng.gen_range(0..average));
    let second = u64::from(rng.gen_range(0..average));
    let sum = first + second + 1;
    i32::try_from(sum).unwrap_or(i32::MAX)
}

/// Draw a countdown and scale it by the frequency factor, rounding to nearest.
pub fn draw_scaled_countdown<R: Rng + ?Sized>(average_steps: u32, factor: f64, rng: &mut R) -> i32 {
    let drawn = draw_countdown(average_steps, rng);
    let scaled = round_f64_to_i32(f64::from(drawn) * factor);
    scaled.max(1)
}

/// Countdown bound to one active catalog group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCountdown {
    pub group: usize,
    pub average_steps: u32,
    pub remaining: i32,
}

impl GroupCountdown {
    #[must_use]
    pub const fn is_triggered(&self) -> bool {
        self.remaining <= TRIGGER_THRESHOLD
    }
}

/// Countdowns for exactly the currently active groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepScheduler {
    counters: Vec<GroupCountdown>,
}

impl StepScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active set and redraw every counter.
    ///
    /// `active` pairs a catalog index with its group's average step count.
    /// Counters of groups missing from `active` are dropped.
    pub fn reset<R, I>(&mut self, active: I, factor: f64, rng: &mut R)
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = (usize, u32)>,
    {
        self.counters = active
            .into_iter()
            .map(|(group, average_steps)| GroupCountdown {
                group,
                average_steps,
                remaining: draw_scaled_countdown(average_steps, factor, rng),
            })
            .collect();
    }

    /// Accepted player step: decrement every counter, then redraw the
    /// depleted ones.
    pub fn tick<R: Rng + ?Sized>(&mut self, factor: f64, rng: &mut R) {
        for counter in &mut self.counters {
            counter.remaining = counter.remaining.saturating_sub(1);
        }
        self.regenerate_depleted(factor, rng);
    }

    /// Redraw only counters at or below zero; untouched counters keep their value.
    pub fn regenerate_depleted<R: Rng + ?Sized>(&mut self, factor: f64, rng: &mut R) {
        for counter in &mut self.counters {
            if counter.remaining <= 0 {
                counter.remaining = draw_scaled_countdown(counter.average_steps, factor, rng);
            }
        }
    }

    /// Zero a group's counter so the next regeneration redraws it.
    pub fn deplete(&mut self, group: usize) {
        if let Some(counter) = self.counters.iter_mut().find(|counter| counter.group == group) {
            counter.remaining = 0;
        }
    }

    /// Catalog indices of triggered groups, in load order.
    pub fn triggered(&self) -> impl Iterator<Item = usize> + '_ {
        self.counters
            .iter()
            .filter(|counter| counter.is_triggered())
            .map(|counter| counter.group)
    }

    #[must_use]
    pub fn countdown(&self, group: usize) -> Option<i32> {
        self.counters
            .iter()
            .find(|counter| counter.group == group)
            .map(|counter| counter.remaining)
    }

    #[must_use]
    pub fn counters(&self) -> &[GroupCountdown] {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn draw_is_never_below_one() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        for average in [1, 2, 5, 40, 300] {
            for _ in 0..500 {
                let value = draw_countdown(average, &mut rng);
                assert!(value >= 1);
                assert!(value <= i32::try_from(2 * average - 1).unwrap());
            }
        }
        assert_eq!(draw_countdown(0, &mut rng), 1);
    }

    #[test]
    fn huge_average_saturates_instead_of_overflowing() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..200 {
            let value = draw_countdown(u32::MAX, &mut rng);
            assert!(value >= 1);
        }
        let mut scheduler = StepScheduler::new();
        scheduler.reset([(0, u32::MAX)], 1.0, &mut rng);
        assert!(scheduler.countdown(0).unwrap() >= 1);
    }

    #[test]
    fn draw_centers_near_average() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let trials = 4000;
        let total: i64 = (0..trials)
            .map(|_| i64::from(draw_countdown(30, &mut rng)))
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = total as f64 / f64::from(trials);
        assert!((mean - 30.0).abs() < 1.5, "mean {mean}");
    }

    #[test]
    fn scaling_rounds_and_floors_at_one() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        for _ in 0..200 {
            assert!(draw_scaled_countdown(1, 0.5, &mut rng) >= 1);
        }
        let mut rng_a = ChaCha20Rng::seed_from_u64(9);
        let mut rng_b = ChaCha20Rng::seed_from_u64(9);
        let base = draw_countdown(50, &mut rng_a);
        let doubled = draw_scaled_countdown(50, 2.0, &mut rng_b);
        assert_eq!(doubled, base * 2);
    }

    #[test]
    fn tick_preserves_untouched_counters() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut scheduler = StepScheduler::new();
        scheduler.reset([(0, 10), (3, 10)], 1.0, &mut rng);
        scheduler.counters[0].remaining = 1;
        scheduler.counters[1].remaining = 7;
        scheduler.tick(1.0, &mut rng);
        assert_eq!(scheduler.countdown(3), Some(6));
        assert!(scheduler.countdown(0).unwrap() >= 1, "depleted counter redrawn");
    }

    #[test]
    fn triggered_reports_counters_at_or_below_one() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let mut scheduler = StepScheduler::new();
        scheduler.reset([(0, 10), (1, 500), (2, 10)], 1.0, &mut rng);
        scheduler.counters[0].remaining = 4;
        scheduler.counters[1].remaining = 1;
        scheduler.counters[2].remaining = 2;
        assert_eq!(scheduler.triggered().collect::<Vec<_>>(), vec![1]);
        scheduler.tick(1.0, &mut rng);
        let triggered: Vec<_> = scheduler.triggered().collect();
        assert!(triggered.contains(&2));
        assert!(!triggered.contains(&0));
    }

    #[test]
    fn reset_discards_stale_groups() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let mut scheduler = StepScheduler::new();
        scheduler.reset([(0, 10), (1, 10)], 1.0, &mut rng);
        scheduler.reset([(1, 10)], 1.0, &mut rng);
        assert_eq!(scheduler.countdown(0), None);
        assert!(scheduler.countdown(1).is_some());
        assert_eq!(scheduler.counters().len(), 1);
    }
}
