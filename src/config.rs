//! Meet configuration.
//!
//! One explicit value threaded into grouping, model building, optimization
//! and validation. Loadable from TOML; every field has a default.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{MeetError, MeetResult};
use crate::models::FieldDiscipline;

/// Configuration of one scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetConfig {
    /// Maximum participants per track heat.
    pub heat_capacity: usize,
    /// Smallest field group. Packing moves categories into smaller groups
    /// from larger ones in the same bucket; groups still below it are
    /// reported as undersized.
    pub field_group_min: usize,
    /// Largest field group.
    pub field_group_max: usize,
    /// Re-buckets field tiers when cross-venue groups block each other.
    pub adaptive_field_tiers: bool,
    /// Shared participants above which two field groups at different
    /// venues split their middle tier by age.
    pub tier_split_shared: usize,
    /// Shortest cross-venue group that counts as blocking for a gender split.
    pub gender_split_blocking_minutes: u32,
    /// Smallest mixed-gender field group considered for a gender split.
    pub gender_split_min_group: usize,
    /// Shared same-gender participants that trigger a gender split.
    pub gender_split_min_shared: usize,
    /// Mixed-gender groups longer than this split on one shared participant.
    pub gender_split_long_minutes: u32,
    /// Enables the secondary venues for the youngest tier.
    pub use_secondary_venues: bool,
    /// Disciplines whose youngest-tier groups move to a secondary venue.
    pub secondary_disciplines: Vec<FieldDiscipline>,
    /// Slot length in minutes.
    pub slot_minutes: u32,
    /// Wall-clock instant of slot 0.
    pub meet_start: NaiveDateTime,
    /// Inclusive upper ages of every tier but the oldest, ascending.
    pub tier_upper_ages: Vec<u8>,
    /// Allows mixed-gender track heats.
    pub mix_genders_track: bool,
    /// Initial domain bound in slots.
    pub max_slots: u32,
    /// Hard cap for bound widening.
    pub max_slots_cap: u32,
    /// Widening step in slots.
    pub widen_step_slots: u32,
    /// Optional deadline for all track groups, minutes after meet start.
    pub track_finish_minutes: Option<u32>,
    /// Enables changeover spacing between consecutive track groups.
    pub track_changeover: bool,
    /// Per-phase solver budget in seconds.
    pub phase_time_limit_secs: f64,
    /// Seed for randomized search.
    pub solver_seed: u64,
}

impl Default for MeetConfig {
    fn default() -> Self {
        Self {
            heat_capacity: 8,
            field_group_min: 3,
            field_group_max: 8,
            adaptive_field_tiers: true,
            tier_split_shared: 5,
            gender_split_blocking_minutes: 25,
            gender_split_min_group: 4,
            gender_split_min_shared: 2,
            gender_split_long_minutes: 50,
            use_secondary_venues: false,
            secondary_disciplines: vec![FieldDiscipline::ShotPut, FieldDiscipline::HighJump],
            slot_minutes: 5,
            meet_start: default_meet_start(),
            tier_upper_ages: vec![10, 14],
            mix_genders_track: false,
            max_slots: 48,
            max_slots_cap: 144,
            widen_step_slots: 12,
            track_finish_minutes: None,
            track_changeover: false,
            phase_time_limit_secs: 10.0,
            solver_seed: 0x5EED,
        }
    }
}

fn default_meet_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(17, 0, 0))
        .unwrap_or_default()
}

impl MeetConfig {
    /// Parses and validates a TOML document. Missing keys take defaults.
    pub fn from_toml_str(input: &str) -> MeetResult<Self> {
        let config: MeetConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> MeetResult<()> {
        if self.heat_capacity == 0 {
            return Err(MeetError::InvalidConfig("heat_capacity must be at least 1".into()));
        }
        if self.field_group_max == 0 || self.field_group_min > self.field_group_max {
            return Err(MeetError::InvalidConfig(format!(
                "field group bounds [{}, {}] are empty",
                self.field_group_min, self.field_group_max
            )));
        }
        if self.gender_split_min_shared == 0 {
            return Err(MeetError::InvalidConfig(
                "gender_split_min_shared must be at least 1".into(),
            ));
        }
        if self.slot_minutes == 0 {
            return Err(MeetError::InvalidConfig("slot_minutes must be at least 1".into()));
        }
        if self.max_slots == 0 || self.max_slots > self.max_slots_cap {
            return Err(MeetError::InvalidConfig(format!(
                "max_slots {} must be in 1..={}",
                self.max_slots, self.max_slots_cap
            )));
        }
        if self.widen_step_slots == 0 {
            return Err(MeetError::InvalidConfig("widen_step_slots must be at least 1".into()));
        }
        if self.tier_upper_ages.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MeetError::InvalidConfig(
                "tier_upper_ages must be strictly ascending".into(),
            ));
        }
        if !(self.phase_time_limit_secs.is_finite() && self.phase_time_limit_secs > 0.0) {
            return Err(MeetError::InvalidConfig(
                "phase_time_limit_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Number of tiers.
    pub fn tier_count(&self) -> usize {
        self.tier_upper_ages.len() + 1
    }

    /// Tier index of an age; 0 is the youngest tier.
    pub fn tier_of(&self, age: u8) -> usize {
        self.tier_upper_ages.iter().filter(|upper| age > **upper).count()
    }

    /// Index of the oldest tier.
    pub fn oldest_tier(&self) -> usize {
        self.tier_upper_ages.len()
    }

    /// Human label of a tier ("≤10", "11–14", "15+").
    pub fn tier_label(&self, tier: usize) -> String {
        let lower = match tier {
            0 => None,
            t => self.tier_upper_ages.get(t - 1).map(|a| a + 1),
        };
        match (lower, self.tier_upper_ages.get(tier)) {
            (None, Some(upper)) => format!("≤{upper}"),
            (Some(lower), Some(upper)) => format!("{lower}–{upper}"),
            (Some(lower), None) => format!("{lower}+"),
            (None, None) => "all".to_string(),
        }
    }

    /// Per-phase budget.
    pub fn phase_time_limit(&self) -> Duration {
        Duration::from_secs_f64(self.phase_time_limit_secs)
    }

    /// Track deadline in slots (rounded down to a slot boundary).
    pub fn track_finish_slot(&self) -> Option<i64> {
        self.track_finish_minutes
            .map(|m| i64::from(m / self.slot_minutes.max(1)))
    }

    /// Slots needed for a number of minutes (at least 1).
    pub fn slots_for_minutes(&self, minutes: u32) -> i64 {
        let slot = self.slot_minutes.max(1);
        i64::from(minutes.div_ceil(slot).max(1))
    }

    pub fn with_heat_capacity(mut self, capacity: usize) -> Self {
        self.heat_capacity = capacity;
        self
    }

    pub fn with_field_group_bounds(mut self, min: usize, max: usize) -> Self {
        self.field_group_min = min;
        self.field_group_max = max;
        self
    }

    /// Enables or disables the adaptive field tier regrouping.
    pub fn with_adaptive_field_tiers(mut self, enabled: bool) -> Self {
        self.adaptive_field_tiers = enabled;
        self
    }

    /// Sets the shared participant count above which a middle tier splits.
    pub fn with_tier_split_shared(mut self, shared: usize) -> Self {
        self.tier_split_shared = shared;
        self
    }

    /// Sets the gender split thresholds: blocking group minutes, smallest
    /// mixed group, shared participants and the long-group minutes.
    pub fn with_gender_split_thresholds(
        mut self,
        blocking_minutes: u32,
        min_group: usize,
        min_shared: usize,
        long_minutes: u32,
    ) -> Self {
        self.gender_split_blocking_minutes = blocking_minutes;
        self.gender_split_min_group = min_group;
        self.gender_split_min_shared = min_shared;
        self.gender_split_long_minutes = long_minutes;
        self
    }

    /// Age bounds `(lower, mid, upper)` of a middle tier that can be split
    /// in two by age. `None` for the youngest and oldest tiers and for a
    /// tier spanning a single age.
    pub fn middle_tier_split(&self, tier: usize) -> Option<(u8, u8, u8)> {
        if tier == 0 || tier >= self.oldest_tier() {
            return None;
        }
        let lower = self.tier_upper_ages.get(tier - 1)?.saturating_add(1);
        let upper = *self.tier_upper_ages.get(tier)?;
        (upper > lower).then(|| (lower, lower + (upper - lower) / 2, upper))
    }

    pub fn with_secondary_venues(mut self, enabled: bool) -> Self {
        self.use_secondary_venues = enabled;
        self
    }

    pub fn with_slot_minutes(mut self, minutes: u32) -> Self {
        self.slot_minutes = minutes;
        self
    }

    pub fn with_meet_start(mut self, start: NaiveDateTime) -> Self {
        self.meet_start = start;
        self
    }

    pub fn with_tier_upper_ages(mut self, ages: Vec<u8>) -> Self {
        self.tier_upper_ages = ages;
        self
    }

    pub fn with_mixed_gender_track(mut self, enabled: bool) -> Self {
        self.mix_genders_track = enabled;
        self
    }

    /// Sets the initial bound, cap and widening step.
    pub fn with_slot_bounds(mut self, max_slots: u32, cap: u32, step: u32) -> Self {
        self.max_slots = max_slots;
        self.max_slots_cap = cap;
        self.widen_step_slots = step;
        self
    }

    pub fn with_track_finish_minutes(mut self, minutes: Option<u32>) -> Self {
        self.track_finish_minutes = minutes;
        self
    }

    pub fn with_track_changeover(mut self, enabled: bool) -> Self {
        self.track_changeover = enabled;
        self
    }

    pub fn with_phase_time_limit(mut self, limit: Duration) -> Self {
        self.phase_time_limit_secs = limit.as_secs_f64();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.solver_seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = MeetConfig::default();
        assert_eq!(c.heat_capacity, 8);
        assert_eq!(c.slot_minutes, 5);
        assert_eq!(c.meet_start.to_string(), "2025-01-01 17:00:00");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_tiers() {
        let c = MeetConfig::default();
        assert_eq!(c.tier_count(), 3);
        assert_eq!(c.tier_of(9), 0);
        assert_eq!(c.tier_of(10), 0);
        assert_eq!(c.tier_of(11), 1);
        assert_eq!(c.tier_of(14), 1);
        assert_eq!(c.tier_of(15), 2);
        assert_eq!(c.tier_of(99), 2);
        assert_eq!(c.oldest_tier(), 2);
        assert_eq!(c.tier_label(0), "≤10");
        assert_eq!(c.tier_label(1), "11–14");
        assert_eq!(c.tier_label(2), "15+");
        assert_eq!(c.middle_tier_split(0), None);
        assert_eq!(c.middle_tier_split(1), Some((11, 12, 14)));
        assert_eq!(c.middle_tier_split(2), None);
    }

    #[test]
    fn test_adaptive_defaults() {
        let c = MeetConfig::default();
        assert!(c.adaptive_field_tiers);
        assert_eq!(c.tier_split_shared, 5);
        assert_eq!(c.gender_split_blocking_minutes, 25);
        assert_eq!(c.gender_split_min_group, 4);
        assert_eq!(c.gender_split_min_shared, 2);
        assert_eq!(c.gender_split_long_minutes, 50);
        let single = MeetConfig::default().with_tier_upper_ages(vec![10, 11]);
        assert_eq!(single.middle_tier_split(1), None);
    }

    #[test]
    fn test_slot_conversions() {
        let c = MeetConfig::default().with_track_finish_minutes(Some(123));
        assert_eq!(c.slots_for_minutes(0), 1);
        assert_eq!(c.slots_for_minutes(5), 1);
        assert_eq!(c.slots_for_minutes(6), 2);
        assert_eq!(c.track_finish_slot(), Some(24));
    }

    #[test]
    fn test_from_toml_partial() {
        let c = MeetConfig::from_toml_str(
            r#"
            heat_capacity = 6
            slot_minutes = 10
            meet_start = "2025-06-14T10:00:00"
            secondary_disciplines = ["ShotPut"]
            "#,
        )
        .unwrap();
        assert_eq!(c.heat_capacity, 6);
        assert_eq!(c.slot_minutes, 10);
        assert_eq!(c.field_group_max, 8);
        assert_eq!(c.secondary_disciplines, vec![FieldDiscipline::ShotPut]);
        assert_eq!(c.meet_start.to_string(), "2025-06-14 10:00:00");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(MeetConfig::default().with_heat_capacity(0).validate().is_err());
        assert!(MeetConfig::default().with_field_group_bounds(5, 3).validate().is_err());
        assert!(MeetConfig::default().with_slot_minutes(0).validate().is_err());
        assert!(MeetConfig::default().with_slot_bounds(200, 100, 10).validate().is_err());
        assert!(MeetConfig::default().with_slot_bounds(48, 144, 0).validate().is_err());
        assert!(MeetConfig::default().with_tier_upper_ages(vec![14, 10]).validate().is_err());
        assert!(MeetConfig::default()
            .with_gender_split_thresholds(25, 4, 0, 50)
            .validate()
            .is_err());
        assert!(MeetConfig::from_toml_str("heat_capacity = 0").is_err());
    }
}
