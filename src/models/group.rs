//! EventGroup model.
//!
//! An EventGroup is the schedulable unit: one or more events of the same
//! event type, merged to run together at one venue in one contiguous
//! window. Groups are produced by the grouping engine and are read-only
//! input to model building and validation.

use serde::{Deserialize, Serialize};

use super::{Event, EventKind, VenueResource};

/// Separator used when listing a group's categories in one string.
pub const CATEGORY_SEPARATOR: &str = "; ";

/// A merged, schedulable unit of same-type events.
///
/// # Invariants
///
/// - All member events share `kind`.
/// - `events` is ordered youngest category first.
/// - `participants` is sorted and deduplicated.
/// - A track group with several categories has at most `heat_capacity`
///   participants; a single-category track group may run several heats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventGroup {
    /// Unique group identifier.
    pub id: String,
    /// Event type shared by all members.
    pub kind: EventKind,
    /// Member events.
    pub events: Vec<Event>,
    /// Identities of all participants competing in this group.
    pub participants: Vec<String>,
    /// Venue this group occupies.
    pub venue: VenueResource,
    /// Duration in slots (≥ 1).
    pub duration_slots: i64,
    /// Unrounded duration in minutes.
    pub duration_minutes: u32,
    /// Number of heats (track) or 1 (field).
    pub heats: u32,
    /// Heat capacity (track only).
    pub heat_capacity: Option<usize>,
}

impl EventGroup {
    /// Creates an empty group of one slot.
    pub fn new(id: impl Into<String>, kind: EventKind, venue: VenueResource) -> Self {
        Self {
            id: id.into(),
            kind,
            events: Vec::new(),
            participants: Vec::new(),
            venue,
            duration_slots: 1,
            duration_minutes: 0,
            heats: 1,
            heat_capacity: None,
        }
    }

    /// Adds a member event, keeping youngest-first order.
    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self.events.sort_by(|a, b| a.category.cmp(&b.category));
        self
    }

    /// Adds participants.
    pub fn with_participants<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participants.extend(ids.into_iter().map(Into::into));
        self.participants.sort();
        self.participants.dedup();
        self
    }

    /// Sets the duration.
    pub fn with_duration(mut self, minutes: u32, slots: i64) -> Self {
        self.duration_minutes = minutes;
        self.duration_slots = slots.max(1);
        self
    }

    /// Sets the heat layout of a track group.
    pub fn with_heats(mut self, heats: u32, capacity: usize) -> Self {
        self.heats = heats.max(1);
        self.heat_capacity = Some(capacity);
        self
    }

    /// Whether this is a track group.
    pub fn is_track(&self) -> bool {
        self.kind.is_track()
    }

    /// Category names, youngest first.
    pub fn categories(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.category.name.as_str()).collect()
    }

    /// Category names joined into one display string.
    pub fn category_list(&self) -> String {
        self.categories().join(CATEGORY_SEPARATOR)
    }

    /// Age of the youngest member category.
    pub fn youngest_age(&self) -> u8 {
        self.events.iter().map(|e| e.category.age).min().unwrap_or(0)
    }

    /// Age of the oldest member category.
    pub fn oldest_age(&self) -> u8 {
        self.events.iter().map(|e| e.category.age).max().unwrap_or(0)
    }

    /// Track ordering key: (distance, hurdles, youngest age).
    pub fn track_order_key(&self) -> Option<(u32, bool, u8)> {
        self.kind
            .track_key()
            .map(|(distance, hurdles)| (distance, hurdles, self.youngest_age()))
    }

    /// Number of distinct participants.
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Whether a participant competes in this group.
    pub fn has_participant(&self, id: &str) -> bool {
        self.participants
            .binary_search_by(|p| p.as_str().cmp(id))
            .is_ok()
    }

    /// Whether two groups share at least one participant.
    pub fn shares_participant(&self, other: &EventGroup) -> bool {
        self.shared_participants(other).next().is_some()
    }

    /// Participants competing in both groups, in id order.
    pub fn shared_participants<'a>(
        &'a self,
        other: &'a EventGroup,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let (mut i, mut j) = (0, 0);
        std::iter::from_fn(move || {
            while i < self.participants.len() && j < other.participants.len() {
                match self.participants[i].cmp(&other.participants[j]) {
                    std::cmp::Ordering::Less => i += 1,
                    std::cmp::Ordering::Greater => j += 1,
                    std::cmp::Ordering::Equal => {
                        i += 1;
                        j += 1;
                        return Some(self.participants[i - 1].as_str());
                    }
                }
            }
            None
        })
    }
}
