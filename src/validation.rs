//! Schedule validation.
//!
//! Re-checks a schedule of event groups against every hard constraint,
//! independently of any solver state. The schedule may be freshly solved
//! or hand-edited. Violations are reported, never raised: the result is
//! always a [`ValidationReport`].
//!
//! Checks:
//! 1. Every group is scheduled exactly once; no unknown groups
//! 2. Intervals lie inside the slot axis and match the group duration
//! 3. Groups sit at a venue able to host them
//! 4. No two groups overlap at one venue
//! 5. No participant is in two overlapping groups
//! 6. Track groups run in track order (every pair)
//! 7. Track changeover spacing and the track deadline, when configured

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::info;

use crate::config::MeetConfig;
use crate::cp::{changeover_slots, track_order};
use crate::models::{EventGroup, EventKey, Participant, ScheduledGroup, VenueResource};

/// Kinds of violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A group has no placement.
    MissingGroup,
    /// A placement names no known group.
    UnknownGroup,
    /// A group is placed more than once.
    DuplicateGroup,
    /// A placement lies outside the slot axis or is empty.
    OutOfBounds,
    /// Declared interval length differs from the group duration.
    DurationMismatch,
    /// A time does not fall on a slot boundary.
    Alignment,
    /// An overview row could not be read or contradicts its group.
    MalformedRow,
    /// A group sits at a venue that cannot host it.
    VenueMismatch,
    /// Two groups overlap at one venue.
    VenueOverlap,
    /// A participant is in two overlapping groups.
    ParticipantOverlap,
    /// Two track groups run out of order.
    TrackOrder,
    /// Consecutive track groups lack changeover spacing.
    TrackChangeover,
    /// A track group ends after the track deadline.
    TrackFinish,
}

/// One violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Constraint kind.
    pub kind: DiagnosticKind,
    /// Offending groups.
    pub event_group_ids: Vec<String>,
    /// Concrete conflict (intervals, participant, venue).
    pub detail: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    pub fn new(kind: DiagnosticKind, ids: Vec<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            event_group_ids: ids,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} [{}]: {}",
            self.kind,
            self.event_group_ids.join(", "),
            self.detail
        )
    }
}

/// Validation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether no violation was found.
    pub passed: bool,
    /// All violations, in check order.
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Builds a report from diagnostics.
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            passed: diagnostics.is_empty(),
            diagnostics,
        }
    }

    /// Number of diagnostics of a kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    /// Whether any diagnostic has this kind.
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.count(kind) > 0
    }
}

/// Validates a schedule against groups, participants and configuration.
pub fn validate_schedule(
    schedule: &[ScheduledGroup],
    groups: &[EventGroup],
    participants: &[Participant],
    config: &MeetConfig,
) -> ValidationReport {
    let mut out = Vec::new();
    let by_id: HashMap<&str, &EventGroup> = groups.iter().map(|g| (g.id.as_str(), g)).collect();

    // 1. coverage
    let mut placed: BTreeMap<&str, &ScheduledGroup> = BTreeMap::new();
    for entry in schedule {
        if !by_id.contains_key(entry.group_id.as_str()) {
            out.push(Diagnostic::new(
                DiagnosticKind::UnknownGroup,
                vec![entry.group_id.clone()],
                format!("no event group '{}'", entry.group_id),
            ));
        } else if placed.insert(entry.group_id.as_str(), entry).is_some() {
            out.push(Diagnostic::new(
                DiagnosticKind::DuplicateGroup,
                vec![entry.group_id.clone()],
                format!("event group '{}' is scheduled more than once", entry.group_id),
            ));
        }
    }
    for group in groups {
        if !placed.contains_key(group.id.as_str()) {
            out.push(Diagnostic::new(
                DiagnosticKind::MissingGroup,
                vec![group.id.clone()],
                format!("event group '{}' is not scheduled", group.id),
            ));
        }
    }

    // 2-3. per-group checks
    let bound = i64::from(config.max_slots_cap);
    for group in groups {
        let Some(entry) = placed.get(group.id.as_str()) else {
            continue;
        };
        let ids = vec![group.id.clone()];
        if entry.start_slot < 0 || entry.end_slot > bound || entry.end_slot <= entry.start_slot {
            out.push(Diagnostic::new(
                DiagnosticKind::OutOfBounds,
                ids.clone(),
                format!(
                    "interval [{}, {}) outside [0, {bound})",
                    entry.start_slot, entry.end_slot
                ),
            ));
        }
        if entry.duration_slots() != group.duration_slots {
            out.push(Diagnostic::new(
                DiagnosticKind::DurationMismatch,
                ids.clone(),
                format!(
                    "interval [{}, {}) spans {} slots, group needs {}",
                    entry.start_slot,
                    entry.end_slot,
                    entry.duration_slots(),
                    group.duration_slots
                ),
            ));
        }
        if !can_host(group, &entry.venue, config) {
            out.push(Diagnostic::new(
                DiagnosticKind::VenueMismatch,
                ids,
                format!("{} cannot be held at '{}'", group.kind, entry.venue),
            ));
        }
    }

    // 4. venues
    let mut by_venue: BTreeMap<&str, Vec<&ScheduledGroup>> = BTreeMap::new();
    for entry in placed.values() {
        by_venue.entry(entry.venue.as_str()).or_default().push(entry);
    }
    for (venue, entries) in &by_venue {
        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                if a.window().overlaps(&b.window()) {
                    out.push(Diagnostic::new(
                        DiagnosticKind::VenueOverlap,
                        vec![a.group_id.clone(), b.group_id.clone()],
                        format!(
                            "both at '{venue}': [{}, {}) and [{}, {})",
                            a.start_slot, a.end_slot, b.start_slot, b.end_slot
                        ),
                    ));
                }
            }
        }
    }

    // 5. participants, derived from their entries
    let group_of_event: HashMap<EventKey, &str> = groups
        .iter()
        .flat_map(|g| g.events.iter().map(move |e| (e.key(), g.id.as_str())))
        .collect();
    for participant in participants {
        let mut mine: Vec<&ScheduledGroup> = participant
            .events
            .iter()
            .filter_map(|k| group_of_event.get(k))
            .filter_map(|id| placed.get(id).copied())
            .collect();
        mine.sort_by(|a, b| a.group_id.cmp(&b.group_id));
        mine.dedup_by(|a, b| a.group_id == b.group_id);
        for (i, a) in mine.iter().enumerate() {
            for b in &mine[i + 1..] {
                if a.window().overlaps(&b.window()) {
                    out.push(Diagnostic::new(
                        DiagnosticKind::ParticipantOverlap,
                        vec![a.group_id.clone(), b.group_id.clone()],
                        format!(
                            "'{}' is in [{}, {}) and [{}, {})",
                            participant.id, a.start_slot, a.end_slot, b.start_slot, b.end_slot
                        ),
                    ));
                }
            }
        }
    }

    // 6-7. track
    let order: Vec<(&EventGroup, &ScheduledGroup)> = track_order(groups)
        .into_iter()
        .filter_map(|g| placed.get(g.id.as_str()).map(|e| (g, *e)))
        .collect();
    for (i, (ga, a)) in order.iter().enumerate() {
        for (gb, b) in &order[i + 1..] {
            if a.end_slot > b.start_slot {
                out.push(Diagnostic::new(
                    DiagnosticKind::TrackOrder,
                    vec![ga.id.clone(), gb.id.clone()],
                    format!(
                        "{} {} must end (slot {}) before {} {} starts (slot {})",
                        ga.kind,
                        ga.category_list(),
                        a.end_slot,
                        gb.kind,
                        gb.category_list(),
                        b.start_slot
                    ),
                ));
            }
        }
    }
    if config.track_changeover {
        for pair in order.windows(2) {
            let ((ga, a), (gb, b)) = (pair[0], pair[1]);
            let need = changeover_slots(ga, gb);
            if a.end_slot <= b.start_slot && b.start_slot - a.end_slot < need {
                out.push(Diagnostic::new(
                    DiagnosticKind::TrackChangeover,
                    vec![ga.id.clone(), gb.id.clone()],
                    format!(
                        "{} slot(s) between groups, changeover needs {need}",
                        b.start_slot - a.end_slot
                    ),
                ));
            }
        }
    }
    if let Some(finish) = config.track_finish_slot() {
        for (g, e) in &order {
            if e.end_slot > finish {
                out.push(Diagnostic::new(
                    DiagnosticKind::TrackFinish,
                    vec![g.id.clone()],
                    format!("ends at slot {}, track closes at slot {finish}", e.end_slot),
                ));
            }
        }
    }

    let report = ValidationReport::from_diagnostics(out);
    info!(
        groups = groups.len(),
        diagnostics = report.diagnostics.len(),
        passed = report.passed,
        "validated schedule"
    );
    report
}

/// Whether a venue can host a group: its own venue, the primary venue for
/// its event type, or the discipline's secondary venue when secondary
/// venues are enabled for it and every category is in the youngest tier.
fn can_host(group: &EventGroup, venue: &str, config: &MeetConfig) -> bool {
    if group.venue.name == venue || VenueResource::for_event(&group.kind).name == venue {
        return true;
    }
    let Some(discipline) = group.kind.discipline() else {
        return false;
    };
    config.use_secondary_venues
        && config.secondary_disciplines.contains(&discipline)
        && group.events.iter().all(|e| config.tier_of(e.category.age) == 0)
        && VenueResource::secondary_for(discipline).is_some_and(|v| v.name == venue)
}
