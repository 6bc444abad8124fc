//! Constraint model builder for a meet.
//!
//! Emits, for one domain bound:
//! - an interval per event group (fixed duration, inside the bound)
//! - a no-overlap set per venue
//! - a no-overlap set per participant group set
//! - a precedence chain over track groups in track order
//! - an optional deadline over all track groups
//!
//! The builder performs no search.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use super::model::{CpModel, CpSolution, IntervalVar, Objective};
use crate::config::MeetConfig;
use crate::models::{EventGroup, EventKind, Participant, ScheduledGroup};

/// Categories at or below this age count as young on the track.
pub const YOUNG_TRACK_AGE: u8 = 12;

/// Builds constraint models from event groups.
#[derive(Debug, Clone)]
pub struct MeetModelBuilder<'a> {
    groups: &'a [EventGroup],
    participants: &'a [Participant],
    config: &'a MeetConfig,
}

impl<'a> MeetModelBuilder<'a> {
    /// Creates a builder.
    pub fn new(
        groups: &'a [EventGroup],
        participants: &'a [Participant],
        config: &'a MeetConfig,
    ) -> Self {
        Self {
            groups,
            participants,
            config,
        }
    }

    /// Event groups.
    pub fn groups(&self) -> &'a [EventGroup] {
        self.groups
    }

    /// Builds the model for a domain bound (slots).
    pub fn build(&self, bound_slots: i64) -> CpModel {
        let mut model = CpModel::new("meet", bound_slots);

        for group in self.groups {
            let d = group.duration_slots;
            model.add_interval(IntervalVar::new(&group.id, 0, bound_slots - d, d, bound_slots));
        }

        for ids in self.venue_sets().into_values() {
            if ids.len() > 1 {
                model.add_no_overlap(ids);
            }
        }

        for ids in self.participant_sets() {
            model.add_no_overlap(ids);
        }

        let order = track_order(self.groups);
        for pair in order.windows(2) {
            let delay = if self.config.track_changeover {
                changeover_slots(pair[0], pair[1])
            } else {
                0
            };
            model.add_precedence(&pair[0].id, &pair[1].id, delay);
        }

        if let Some(finish) = self.config.track_finish_slot() {
            let ids: Vec<String> = order.iter().map(|g| g.id.clone()).collect();
            if !ids.is_empty() {
                model.add_end_before(ids, finish);
            }
        }

        model.set_objective(Objective::MinimizeMaxEnd(Vec::new()));
        debug!(
            bound_slots,
            intervals = model.interval_count(),
            constraints = model.constraint_count(),
            "built meet model"
        );
        model
    }

    /// Group ids per venue name.
    pub fn venue_sets(&self) -> BTreeMap<String, Vec<String>> {
        let mut sets: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for group in self.groups {
            sets.entry(group.venue.name.clone())
                .or_default()
                .push(group.id.clone());
        }
        sets
    }

    /// Distinct sets of groups shared by one participant (two or more groups).
    pub fn participant_sets(&self) -> Vec<Vec<String>> {
        let sets: BTreeSet<Vec<String>> = self
            .groups_by_participant()
            .into_values()
            .filter(|ids| ids.len() > 1)
            .collect();
        sets.into_iter().collect()
    }

    /// Group ids whose categories all fall in a tier.
    pub fn groups_in_tier(&self, tier: usize) -> Vec<String> {
        self.groups
            .iter()
            .filter(|g| {
                g.events
                    .iter()
                    .all(|e| self.config.tier_of(e.category.age) == tier)
            })
            .map(|g| g.id.clone())
            .collect()
    }

    /// Group sets of oldest-tier participants entered in two or more events.
    pub fn recovery_sets(&self) -> Vec<Vec<String>> {
        let oldest = self.config.oldest_tier();
        let by_participant = self.groups_by_participant();
        let sets: BTreeSet<Vec<String>> = self
            .participants
            .iter()
            .filter(|p| self.config.tier_of(p.category.age) == oldest && p.event_count() > 1)
            .filter_map(|p| by_participant.get(&p.id))
            .filter(|ids| ids.len() > 1)
            .cloned()
            .collect();
        sets.into_iter().collect()
    }

    fn groups_by_participant(&self) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for group in self.groups {
            for p in &group.participants {
                map.entry(p.clone()).or_default().push(group.id.clone());
            }
        }
        for ids in map.values_mut() {
            ids.sort();
        }
        map
    }

    /// Decodes a solution into placements.
    pub fn decode(&self, solution: &CpSolution) -> Vec<ScheduledGroup> {
        self.groups
            .iter()
            .filter_map(|g| {
                let sol = solution.intervals.get(&g.id)?;
                Some(ScheduledGroup::new(&g.id, &g.venue.name, sol.start, sol.end))
            })
            .collect()
    }
}

/// Track groups in run order: distance, flat before hurdles, youngest
/// category first, then id.
///
/// Groups with equal keys, such as `100m_G15` and `100m_J15`, are still
/// totally ordered by id, so one of them must finish before the other
/// starts even though neither outranks the other on the track.
pub fn track_order(groups: &[EventGroup]) -> Vec<&EventGroup> {
    let mut track: Vec<(&EventGroup, (u32, bool, u8))> = groups
        .iter()
        .filter_map(|g| g.track_order_key().map(|k| (g, k)))
        .collect();
    track.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.id.cmp(&b.0.id)));
    track.into_iter().map(|(g, _)| g).collect()
}

/// Starting position block on the track.
fn start_block(distance_m: u32) -> u8 {
    match distance_m {
        0..=80 => 0,
        81..=110 => 1,
        400 => 3,
        800 => 4,
        _ => 2,
    }
}

/// Slots required between two consecutive track groups.
///
/// Two slots when the start position moves or hurdles must be set out,
/// none between two young groups, one otherwise.
pub fn changeover_slots(earlier: &EventGroup, later: &EventGroup) -> i64 {
    let (
        EventKind::Track {
            distance_m: d1,
            hurdles: h1,
        },
        EventKind::Track {
            distance_m: d2,
            hurdles: h2,
        },
    ) = (earlier.kind, later.kind)
    else {
        return 0;
    };

    if (h2 && !h1) || start_block(d1) != start_block(d2) {
        2
    } else if earlier.oldest_age() <= YOUNG_TRACK_AGE && later.oldest_age() <= YOUNG_TRACK_AGE {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{BranchAndBoundSolver, CpConstraint, CpSolver, SolveRequest, SolveStatus};
    use crate::models::{Category, Event, FieldDiscipline, VenueResource};

    fn group(id: &str, kind: EventKind, cat: &str, people: &[&str], slots: i64) -> EventGroup {
        EventGroup::new(id, kind, VenueResource::for_event(&kind))
            .with_event(Event::new(Category::parse(cat).unwrap(), kind))
            .with_participants(people.iter().copied())
            .with_duration(slots as u32 * 5, slots)
    }

    fn sample() -> (Vec<EventGroup>, Vec<Participant>) {
        let lj = EventKind::Field(FieldDiscipline::LongJump);
        let groups = vec![
            group("100h_J15", EventKind::hurdles(100), "J15", &["ann"], 1),
            group("100_J15", EventKind::sprint(100), "J15", &["ann", "eva"], 1),
            group("60_J10", EventKind::sprint(60), "J10", &["liv"], 1),
            group("lj_J15", lj, "J15", &["eva"], 3),
            group("lj_J10", lj, "J10", &["liv"], 2),
        ];
        let j15 = Category::parse("J15").unwrap();
        let participants = vec![
            Participant::new("ann", j15.clone()),
            Participant::new("eva", j15),
            Participant::new("liv", Category::parse("J10").unwrap()),
        ];
        (groups, participants)
    }

    #[test]
    fn test_track_order() {
        let (groups, _) = sample();
        let ids: Vec<&str> = track_order(&groups).iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["60_J10", "100_J15", "100h_J15"]);
    }

    #[test]
    fn test_build_model_shape() {
        let (groups, participants) = sample();
        let config = MeetConfig::default();
        let builder = MeetModelBuilder::new(&groups, &participants, &config);
        let model = builder.build(48);

        assert_eq!(model.interval_count(), 5);
        // 2 venues + 3 participant sets (ann, eva, liv) + 2 precedences
        assert_eq!(model.constraint_count(), 7);
        assert_eq!(model.interval("lj_J15").unwrap().start_max, 45);
    }

    #[test]
    fn test_tier_and_recovery_sets() {
        let (groups, mut participants) = sample();
        let config = MeetConfig::default();
        let lj = EventKind::Field(FieldDiscipline::LongJump);
        participants[1] = participants[1]
            .clone()
            .with_event(crate::models::EventKey::new("J15", EventKind::sprint(100)))
            .with_event(crate::models::EventKey::new("J15", lj));
        let builder = MeetModelBuilder::new(&groups, &participants, &config);

        assert_eq!(builder.groups_in_tier(0), vec!["60_J10", "lj_J10"]);
        assert!(builder.groups_in_tier(1).is_empty());
        assert_eq!(
            builder.recovery_sets(),
            vec![vec!["100_J15".to_string(), "lj_J15".to_string()]]
        );
    }

    #[test]
    fn test_changeover_slots() {
        let (groups, _) = sample();
        let h = &groups[0];
        let flat = &groups[1];
        let sixty = &groups[2];
        assert_eq!(changeover_slots(flat, h), 2); // hurdles set out
        assert_eq!(changeover_slots(sixty, flat), 2); // start block moves
        let g60 = group("60_G11", EventKind::sprint(60), "G11", &["ola"], 1);
        assert_eq!(changeover_slots(sixty, &g60), 0);
        let g60_old = group("60_G15", EventKind::sprint(60), "G15", &["per"], 1);
        assert_eq!(changeover_slots(&g60, &g60_old), 1);
    }

    #[test]
    fn test_solve_and_decode() {
        let (groups, participants) = sample();
        let config = MeetConfig::default()
            .with_track_changeover(true)
            .with_track_finish_minutes(Some(60));
        let builder = MeetModelBuilder::new(&groups, &participants, &config);
        let model = builder.build(48);
        assert!(model.constraints().iter().any(|c| matches!(c, CpConstraint::EndBefore { .. })));

        let solution = BranchAndBoundSolver::new().solve(&SolveRequest::new(&model));
        assert_eq!(solution.status, SolveStatus::Optimal);

        let placed = builder.decode(&solution);
        assert_eq!(placed.len(), 5);
        let at = |id: &str| placed.iter().find(|p| p.group_id == id).unwrap();
        assert!(at("60_J10").end_slot + 2 <= at("100_J15").start_slot);
        assert!(at("100_J15").end_slot + 2 <= at("100h_J15").start_slot);
        assert_eq!(at("lj_J15").venue, "jumping pit");
    }
}
