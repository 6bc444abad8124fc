//! Duration policy.
//!
//! Track groups cost a fixed time per heat, by distance. Field groups cost
//! a fixed time per participant and round of attempts, by discipline, with
//! cheaper rates for the youngest categories. Each category's share is
//! capped, and bar events pay one setup per group.

use crate::models::{EventKind, FieldDiscipline};

/// Cap on one category's time within a field group.
pub const MAX_CATEGORY_MINUTES: u32 = 60;

/// Bar setup before the first attempt (high jump, pole vault).
pub const BAR_SETUP_MINUTES: u32 = 5;

/// Minutes per heat for a track distance.
pub fn heat_minutes(distance_m: u32) -> u32 {
    match distance_m {
        0..=800 => 5,
        801..=2999 => 10,
        _ => 15,
    }
}

/// Minutes per participant for a field discipline at a category age.
pub fn participant_minutes(discipline: FieldDiscipline, age: u8) -> u32 {
    use FieldDiscipline::*;
    match (discipline, age) {
        (ShotPut, 0..=12) => 2,
        (Discus | Hammer, 11..=12) => 4,
        (LongJump, 0..=10) => 3,
        (LongJump, 11..=12) => 4,
        (HighJump, 0..=10) => 3,
        (BallThrow, _) => 3,
        (PoleVault, _) => 12,
        _ => 6,
    }
}

/// Heats needed for a number of participants.
pub fn heats_for(participants: usize, heat_capacity: usize) -> u32 {
    let cap = heat_capacity.max(1);
    u32::try_from(participants.div_ceil(cap).max(1)).unwrap_or(u32::MAX)
}

/// Minutes for a track group.
pub fn track_minutes(distance_m: u32, heats: u32) -> u32 {
    heat_minutes(distance_m).saturating_mul(heats.max(1))
}

/// Minutes one category contributes to a field group.
pub fn field_category_minutes(discipline: FieldDiscipline, age: u8, participants: usize) -> u32 {
    let n = u32::try_from(participants).unwrap_or(u32::MAX);
    participant_minutes(discipline, age)
        .saturating_mul(n)
        .min(MAX_CATEGORY_MINUTES)
}

/// Minutes for a field group from its (age, participants) per category.
pub fn field_group_minutes(discipline: FieldDiscipline, categories: &[(u8, usize)]) -> u32 {
    let attempts: u32 = categories
        .iter()
        .map(|&(age, n)| field_category_minutes(discipline, age, n))
        .sum();
    if discipline.has_bar_setup() {
        attempts + BAR_SETUP_MINUTES
    } else {
        attempts
    }
}

/// Minutes for a group of the given kind.
///
/// `categories` lists (age, participants) per member category; `heats`
/// is only read for track kinds.
pub fn group_minutes(kind: &EventKind, categories: &[(u8, usize)], heats: u32) -> u32 {
    match kind {
        EventKind::Track { distance_m, .. } => track_minutes(*distance_m, heats),
        EventKind::Field(d) => field_group_minutes(*d, categories),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_minutes() {
        assert_eq!(heat_minutes(60), 5);
        assert_eq!(heat_minutes(800), 5);
        assert_eq!(heat_minutes(1500), 10);
        assert_eq!(heat_minutes(3000), 15);
        assert_eq!(heat_minutes(5000), 15);
    }

    #[test]
    fn test_heats_for() {
        assert_eq!(heats_for(0, 8), 1);
        assert_eq!(heats_for(8, 8), 1);
        assert_eq!(heats_for(9, 8), 2);
        assert_eq!(heats_for(17, 8), 3);
    }

    #[test]
    fn test_young_overrides() {
        assert_eq!(participant_minutes(FieldDiscipline::ShotPut, 10), 2);
        assert_eq!(participant_minutes(FieldDiscipline::ShotPut, 13), 6);
        assert_eq!(participant_minutes(FieldDiscipline::Discus, 10), 6);
        assert_eq!(participant_minutes(FieldDiscipline::Discus, 12), 4);
        assert_eq!(participant_minutes(FieldDiscipline::LongJump, 10), 3);
        assert_eq!(participant_minutes(FieldDiscipline::LongJump, 12), 4);
        assert_eq!(participant_minutes(FieldDiscipline::HighJump, 10), 3);
        assert_eq!(participant_minutes(FieldDiscipline::HighJump, 11), 6);
        assert_eq!(participant_minutes(FieldDiscipline::PoleVault, 17), 12);
        assert_eq!(participant_minutes(FieldDiscipline::BallThrow, 9), 3);
    }

    #[test]
    fn test_field_group_minutes() {
        // 5 × 6 + 3 × 6
        assert_eq!(field_group_minutes(FieldDiscipline::LongJump, &[(15, 5), (16, 3)]), 48);
        // capped at 60 per category
        assert_eq!(field_group_minutes(FieldDiscipline::PoleVault, &[(17, 8)]), 60);
        // bar setup once per group
        assert_eq!(field_group_minutes(FieldDiscipline::HighJump, &[(15, 2), (16, 2)]), 29);
    }

    #[test]
    fn test_group_minutes_track() {
        assert_eq!(group_minutes(&EventKind::sprint(100), &[(15, 12)], 2), 10);
        assert_eq!(group_minutes(&EventKind::sprint(1500), &[(15, 4)], 1), 10);
    }
}
