//! Participant model.
//!
//! A participant is one registered competitor: an identity, the category
//! they compete in, and the ordered set of events they are entered in.

use serde::{Deserialize, Serialize};

use super::{Category, EventKey};

/// A registered competitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Unique participant identity (name or bib).
    pub id: String,
    /// Registration category.
    pub category: Category,
    /// Events entered, in registration order, without duplicates.
    pub events: Vec<EventKey>,
}

impl Participant {
    /// Creates a participant with no entries.
    pub fn new(id: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            category,
            events: Vec::new(),
        }
    }

    /// Adds an event entry. Duplicate entries are ignored.
    pub fn with_event(mut self, key: EventKey) -> Self {
        self.add_event(key);
        self
    }

    pub(crate) fn add_event(&mut self, key: EventKey) {
        if !self.events.contains(&key) {
            self.events.push(key);
        }
    }

    /// Whether the participant is entered in the given event.
    pub fn is_entered(&self, key: &EventKey) -> bool {
        self.events.contains(key)
    }

    /// Number of events entered.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of field events entered.
    pub fn field_event_count(&self) -> usize {
        self.events.iter().filter(|k| k.kind.is_field()).count()
    }
}
