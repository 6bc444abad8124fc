//! Entry records.
//!
//! The grouping engine consumes flat `{participant, category, event_type}`
//! records. Each record is parsed on its own: a malformed record is
//! skipped and reported, and the batch proceeds as long as something
//! valid remains.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Read;
use tracing::warn;

use crate::error::{MeetError, MeetResult};
use crate::models::{Category, Event, EventKey, EventKind, Participant};

/// One registration: a participant entered in one event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Participant identity.
    pub participant: String,
    /// Category name.
    pub category: String,
    /// Event type name.
    pub event_type: String,
}

impl EntryRecord {
    /// Creates a new record.
    pub fn new(
        participant: impl Into<String>,
        category: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            participant: participant.into(),
            category: category.into(),
            event_type: event_type.into(),
        }
    }

    /// Reads records from CSV with a `participant,category,event_type` header.
    pub fn read_csv<R: Read>(reader: R) -> MeetResult<Vec<EntryRecord>> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut records = Vec::new();
        for row in rdr.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }
}

/// A record that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Zero-based record index.
    pub record: usize,
    /// Why it was skipped.
    pub reason: String,
}

/// Participants and events derived from a record batch.
#[derive(Debug, Clone, Default)]
pub struct EntrySet {
    /// Participants, in order of first appearance.
    pub participants: Vec<Participant>,
    /// Distinct events, in order of first appearance.
    pub events: Vec<Event>,
    /// Skipped records.
    pub rejected: Vec<RejectedRecord>,
    /// Categories seen in the input that ended up with no valid event.
    pub dropped_categories: Vec<String>,
}

impl EntrySet {
    /// Identities of the participants entered in an event.
    pub fn entrants(&self, key: &EventKey) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .participants
            .iter()
            .filter(|p| p.is_entered(key))
            .map(|p| p.id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Participant by id.
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }
}

/// Parses a record batch into participants and events.
///
/// # Errors
///
/// `NoValidRecords` if every record was rejected.
pub fn parse_entries(records: &[EntryRecord]) -> MeetResult<EntrySet> {
    let mut set = EntrySet::default();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut seen_categories: BTreeSet<String> = BTreeSet::new();
    let mut event_keys: HashSet<EventKey> = HashSet::new();

    for (i, record) in records.iter().enumerate() {
        match parse_record(i, record) {
            Ok((id, category, kind)) => {
                seen_categories.insert(category.name.clone());
                let key = EventKey::new(category.name.clone(), kind);
                let slot = match index.get(&id) {
                    Some(&slot) => slot,
                    None => {
                        set.participants.push(Participant::new(id.clone(), category.clone()));
                        index.insert(id.clone(), set.participants.len() - 1);
                        set.participants.len() - 1
                    }
                };
                let participant = &mut set.participants[slot];
                if participant.category.name != category.name {
                    let err = MeetError::MalformedInput {
                        record: i,
                        reason: format!(
                            "participant '{}' already registered in category '{}'",
                            id, participant.category.name
                        ),
                    };
                    reject(&mut set, i, err);
                    continue;
                }
                participant.add_event(key.clone());
                if event_keys.insert(key) {
                    set.events.push(Event::new(category, kind));
                }
            }
            Err((category, err)) => {
                if let Some(name) = category {
                    seen_categories.insert(name);
                }
                reject(&mut set, i, err);
            }
        }
    }

    for name in seen_categories {
        if !set.events.iter().any(|e| e.category.name == name) {
            warn!(category = %name, "category has no valid event entries; dropped");
            set.dropped_categories.push(name);
        }
    }

    if set.events.is_empty() {
        return Err(MeetError::NoValidRecords);
    }
    Ok(set)
}

type ParsedRecord = (String, Category, EventKind);

fn parse_record(
    i: usize,
    record: &EntryRecord,
) -> Result<ParsedRecord, (Option<String>, MeetError)> {
    let malformed = |reason: String| MeetError::MalformedInput { record: i, reason };

    let id = record.participant.trim();
    if id.is_empty() {
        return Err((None, malformed("missing participant".into())));
    }
    let category = Category::parse(&record.category).ok_or_else(|| {
        (None, malformed(format!("unrecognized category '{}'", record.category)))
    })?;
    let kind = EventKind::parse(&record.event_type).ok_or_else(|| {
        (
            Some(category.name.clone()),
            malformed(format!("unrecognized event type '{}'", record.event_type)),
        )
    })?;
    Ok((id.to_string(), category, kind))
}

fn reject(set: &mut EntrySet, record: usize, err: MeetError) {
    warn!(record, error = %err, "skipping entry");
    set.rejected.push(RejectedRecord {
        record,
        reason: err.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldDiscipline;

    #[test]
    fn test_parse_entries_builds_participants_and_events() {
        let records = vec![
            EntryRecord::new("Ann", "J15", "100m"),
            EntryRecord::new("Ann", "J15", "Lengde"),
            EntryRecord::new("Eva", "J15", "100m"),
            EntryRecord::new("Ola", "G14", "60m hekk"),
        ];
        let set = parse_entries(&records).unwrap();

        assert_eq!(set.participants.len(), 3);
        assert_eq!(set.events.len(), 3);
        assert!(set.rejected.is_empty());

        let ann = set.participant("Ann").unwrap();
        assert_eq!(ann.event_count(), 2);
        assert_eq!(ann.field_event_count(), 1);

        let key = EventKey::new("J15", EventKind::sprint(100));
        assert_eq!(set.entrants(&key), vec!["Ann", "Eva"]);
        let lj = EventKey::new("J15", EventKind::Field(FieldDiscipline::LongJump));
        assert_eq!(set.entrants(&lj), vec!["Ann"]);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let records = vec![
            EntryRecord::new("", "J15", "100m"),
            EntryRecord::new("Ann", "veterans", "100m"),
            EntryRecord::new("Eva", "J15", "underwater"),
            EntryRecord::new("Ida", "J15", "200m"),
            EntryRecord::new("Ida", "J16", "100m"),
        ];
        let set = parse_entries(&records).unwrap();

        let rejected: Vec<usize> = set.rejected.iter().map(|r| r.record).collect();
        assert_eq!(rejected, vec![0, 1, 2, 4]);
        assert_eq!(set.events.len(), 1);
        assert_eq!(set.participants.len(), 1);
    }

    #[test]
    fn test_category_without_valid_events_is_dropped() {
        let records = vec![
            EntryRecord::new("Ann", "J15", "100m"),
            EntryRecord::new("Ola", "G13", "juggling"),
        ];
        let set = parse_entries(&records).unwrap();
        assert_eq!(set.dropped_categories, vec!["G13".to_string()]);
        assert!(set.participant("Ola").is_none());
    }

    #[test]
    fn test_no_valid_records() {
        let records = vec![EntryRecord::new("Ann", "???", "100m")];
        assert!(matches!(parse_entries(&records), Err(MeetError::NoValidRecords)));
        assert!(matches!(parse_entries(&[]), Err(MeetError::NoValidRecords)));
    }

    #[test]
    fn test_read_csv() {
        let data = "participant,category,event_type\nAnn, J15 ,100m\nOla,G14,Kule\n";
        let records = EntryRecord::read_csv(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], EntryRecord::new("Ann", "J15", "100m"));
        assert_eq!(records[1].event_type, "Kule");
    }
}
