//! Log of organic encounters driving fishing chains and chain resets.
use serde::{Deserialize, Serialize};

use crate::creature::{Creature, SpeciesId};
use crate::data::{LocationFilter, ToolClass, ToolKind};
use crate::numbers::usize_to_u32;

/// One creature produced by a table-driven encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub species: SpeciesId,
    pub form: u8,
    pub location: LocationFilter,
    pub tool: Option<ToolKind>,
}

impl HistoryRecord {
    #[must_use]
    pub fn from_creature(
        creature: &Creature,
        location: &LocationFilter,
        tool: Option<ToolKind>,
    ) -> Self {
        Self {
            species: creature.species.clone(),
            form: creature.form,
            location: location.clone(),
            tool,
        }
    }

    #[must_use]
    pub const fn tool_class(&self) -> ToolClass {
        ToolClass::of(self.tool)
    }
}

/// Ordered records, newest last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLog {
    records: Vec<HistoryRecord>,
}

impl HistoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&HistoryRecord> {
        self.records.last()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Clear the log when `tool`'s class differs from the newest record's.
    /// Returns whether a reset happened.
    pub fn reset_on_class_change(&mut self, tool: Option<ToolKind>) -> bool {
        let changed = self
            .last()
            .is_some_and(|last| last.tool_class() != ToolClass::of(tool));
        if changed {
            self.records.clear();
        }
        changed
    }

    /// Log the creatures of one resolution.
    ///
    /// Applies the class-change reset first, then appends, then clears the
    /// whole log when any produced creature is shiny. At most `retain`
    /// newest records are kept (never fewer than one).
    pub fn record_encounter<'a, I>(
        &mut self,
        creatures: I,
        location: &LocationFilter,
        tool: Option<ToolKind>,
        retain: u32,
    ) where
        I: IntoIterator<Item = &'a Creature>,
    {
        self.reset_on_class_change(tool);
        let mut shiny = false;
        for creature in creatures {
            shiny |= creature.shiny;
            self.records
                .push(HistoryRecord::from_creature(creature, location, tool));
        }
        if shiny {
            self.records.clear();
            return;
        }
        self.truncate_oldest(retain);
    }

    fn truncate_oldest(&mut self, retain: u32) {
        let keep = usize::try_from(retain).unwrap_or(usize::MAX).max(1);
        if self.records.len() > keep {
            let excess = self.records.len() - keep;
            self.records.drain(..excess);
        }
    }

    /// Consecutive trailing fishing records, newest first, capped at `cap`.
    #[must_use]
    pub fn fishing_chain(&self, cap: u32) -> u32 {
        let trailing = self
            .records
            .iter()
            .rev()
            .take_while(|record| record.tool_class() == ToolClass::Fishing)
            .count();
        usize_to_u32(trailing).min(cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_of(tools: &[Option<ToolKind>]) -> HistoryLog {
        let location = LocationFilter::new("water", 0);
        let mut log = HistoryLog::new();
        for tool in tools {
            log.records.push(HistoryRecord::from_creature(
                &Creature::new("magikarp", 5),
                &location,
                *tool,
            ));
        }
        log
    }

    #[test]
    fn fishing_chain_counts_trailing_run_only() {
        let old = Some(ToolKind::OldRod);
        let broken = log_of(&[old, old, None, old]);
        assert_eq!(broken.fishing_chain(20), 1);
        let unbroken = log_of(&[old, old, old]);
        assert_eq!(unbroken.fishing_chain(20), 3);
        assert_eq!(log_of(&[]).fishing_chain(20), 0);
    }

    #[test]
    fn fishing_chain_is_capped() {
        let tools = vec![Some(ToolKind::SuperRod); 25];
        assert_eq!(log_of(&tools).fishing_chain(20), 20);
    }

    #[test]
    fn ground_encounter_after_rod_resets_before_append() {
        let mut log = log_of(&[Some(ToolKind::OldRod)]);
        let location = LocationFilter::new("tall_grass", 0);
        log.record_encounter([&Creature::new("pidgey", 3)], &location, None, 20);
        assert_eq!(log.len(), 1);
        assert_eq!(log.records()[0].tool, None);
        assert_eq!(log.records()[0].species.as_str(), "pidgey");
    }

    #[test]
    fn rods_of_different_tier_share_a_class() {
        let mut log = log_of(&[Some(ToolKind::OldRod)]);
        let location = LocationFilter::new("water", 0);
        log.record_encounter(
            [&Creature::new("goldeen", 12)],
            &location,
            Some(ToolKind::GoodRod),
            20,
        );
        assert_eq!(log.fishing_chain(20), 2);
    }

    #[test]
    fn terrain_tools_count_as_ground() {
        let mut log = log_of(&[None]);
        assert!(!log.reset_on_class_change(Some(ToolKind::Headbutt)));
        assert!(log.reset_on_class_change(Some(ToolKind::OldRod)));
        assert!(log.is_empty());
    }

    #[test]
    fn shiny_clears_log() {
        let mut log = log_of(&[Some(ToolKind::OldRod), Some(ToolKind::OldRod)]);
        let mut shiny = Creature::new("magikarp", 8);
        shiny.shiny = true;
        let location = LocationFilter::new("water", 0);
        log.record_encounter([&shiny], &location, Some(ToolKind::OldRod), 20);
        assert!(log.is_empty());
    }

    #[test]
    fn long_ground_streak_stays_within_retention() {
        let location = LocationFilter::new("tall_grass", 0);
        let mut log = HistoryLog::new();
        for _ in 0..10_000 {
            log.record_encounter([&Creature::new("pidgey", 3)], &location, None, 20);
        }
        assert_eq!(log.len(), 20);
        assert_eq!(log.last().map(|r| r.tool), Some(None));
    }

    #[test]
    fn retention_keeps_newest_fishing_records() {
        let location = LocationFilter::new("water", 0);
        let mut log = log_of(&[None, None, None]);
        for _ in 0..4 {
            log.record_encounter(
                [&Creature::new("magikarp", 5)],
                &location,
                Some(ToolKind::OldRod),
                3,
            );
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.fishing_chain(20), 3);
    }

    #[test]
    fn zero_retention_still_keeps_newest_record() {
        let location = LocationFilter::new("tall_grass", 0);
        let mut log = HistoryLog::new();
        let party = [Creature::new("pidgey", 3), Creature::new("rattata", 2)];
        log.record_encounter(party.iter(), &location, None, 0);
        assert_eq!(log.len(), 1);
        assert_eq!(log.records()[0].species.as_str(), "rattata");
    }
}
