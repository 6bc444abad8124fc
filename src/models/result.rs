//! Scheduling result model.
//!
//! A result is a complete assignment of event groups to venues and slot
//! intervals, together with the groups and participants it was computed
//! over. It is built once and only read afterwards; edits go through the
//! overview and produce a new schedule instead.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{EventGroup, Participant, SlotWindow};

/// Placement of one event group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledGroup {
    /// Event group identifier.
    pub group_id: String,
    /// Venue name.
    pub venue: String,
    /// Start slot (inclusive).
    pub start_slot: i64,
    /// End slot (exclusive).
    pub end_slot: i64,
}

impl ScheduledGroup {
    /// Creates a new placement.
    pub fn new(
        group_id: impl Into<String>,
        venue: impl Into<String>,
        start_slot: i64,
        end_slot: i64,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            venue: venue.into(),
            start_slot,
            end_slot,
        }
    }

    /// Occupied slot window.
    #[inline]
    pub fn window(&self) -> SlotWindow {
        SlotWindow::new(self.start_slot, self.end_slot)
    }

    /// Duration in slots.
    #[inline]
    pub fn duration_slots(&self) -> i64 {
        self.end_slot - self.start_slot
    }
}

/// Outcome status attached to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    /// Every phase completed.
    Solved,
    /// Some later phase timed out and kept its best value.
    SolvedPartial,
}

/// Immutable output of a scheduling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingResult {
    status: ScheduleStatus,
    slot_minutes: u32,
    bound_slots: i64,
    assignments: Vec<ScheduledGroup>,
    groups: Vec<EventGroup>,
    participants: Vec<Participant>,
}

impl SchedulingResult {
    /// Builds a result. Assignments are stored by start slot, then id.
    pub fn new(
        status: ScheduleStatus,
        slot_minutes: u32,
        bound_slots: i64,
        mut assignments: Vec<ScheduledGroup>,
        groups: Vec<EventGroup>,
        participants: Vec<Participant>,
    ) -> Self {
        assignments.sort_by(|a, b| {
            a.start_slot
                .cmp(&b.start_slot)
                .then_with(|| a.group_id.cmp(&b.group_id))
        });
        Self {
            status,
            slot_minutes,
            bound_slots,
            assignments,
            groups,
            participants,
        }
    }

    /// Outcome status.
    pub fn status(&self) -> ScheduleStatus {
        self.status
    }

    /// Slot length in minutes.
    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    /// Domain bound the schedule was solved under.
    pub fn bound_slots(&self) -> i64 {
        self.bound_slots
    }

    /// Placements, ordered by start slot.
    pub fn assignments(&self) -> &[ScheduledGroup] {
        &self.assignments
    }

    /// Event groups the schedule covers.
    pub fn groups(&self) -> &[EventGroup] {
        &self.groups
    }

    /// Participants the schedule covers.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Placement of a group.
    pub fn assignment_for(&self, group_id: &str) -> Option<&ScheduledGroup> {
        self.assignments.iter().find(|a| a.group_id == group_id)
    }

    /// Group by id.
    pub fn group(&self, group_id: &str) -> Option<&EventGroup> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    /// Placements of all groups a participant competes in, by start slot.
    pub fn assignments_for_participant(&self, participant_id: &str) -> Vec<&ScheduledGroup> {
        let ids: Vec<&str> = self
            .groups
            .iter()
            .filter(|g| g.has_participant(participant_id))
            .map(|g| g.id.as_str())
            .collect();
        self.assignments
            .iter()
            .filter(|a| ids.contains(&a.group_id.as_str()))
            .collect()
    }

    /// Placements at a venue, by start slot.
    pub fn assignments_for_venue(&self, venue: &str) -> Vec<&ScheduledGroup> {
        self.assignments.iter().filter(|a| a.venue == venue).collect()
    }

    /// Latest end slot over all groups.
    pub fn makespan(&self) -> i64 {
        self.assignments.iter().map(|a| a.end_slot).max().unwrap_or(0)
    }

    /// Busy slots per venue.
    pub fn venue_load(&self) -> HashMap<String, i64> {
        let mut load: HashMap<String, i64> = HashMap::new();
        for a in &self.assignments {
            *load.entry(a.venue.clone()).or_insert(0) += a.duration_slots();
        }
        load
    }

    /// Copy of the placements, for editing and re-validation.
    pub fn to_schedule(&self) -> Vec<ScheduledGroup> {
        self.assignments.clone()
    }
}
