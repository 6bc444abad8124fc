//! Event model.
//!
//! An event is a (category, event-type) pair such as (J15, 100m). The
//! event type carries a fixed kind: a track race with a nominal distance
//! and hurdles flag, or a field discipline.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Category;

/// Field disciplines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldDiscipline {
    ShotPut,
    Discus,
    Hammer,
    Javelin,
    BallThrow,
    LongJump,
    TripleJump,
    HighJump,
    PoleVault,
}

impl FieldDiscipline {
    /// All disciplines.
    pub const ALL: [FieldDiscipline; 9] = [
        FieldDiscipline::ShotPut,
        FieldDiscipline::Discus,
        FieldDiscipline::Hammer,
        FieldDiscipline::Javelin,
        FieldDiscipline::BallThrow,
        FieldDiscipline::LongJump,
        FieldDiscipline::TripleJump,
        FieldDiscipline::HighJump,
        FieldDiscipline::PoleVault,
    ];

    /// Display name.
    pub fn label(self) -> &'static str {
        match self {
            FieldDiscipline::ShotPut => "shot put",
            FieldDiscipline::Discus => "discus",
            FieldDiscipline::Hammer => "hammer",
            FieldDiscipline::Javelin => "javelin",
            FieldDiscipline::BallThrow => "ball throw",
            FieldDiscipline::LongJump => "long jump",
            FieldDiscipline::TripleJump => "triple jump",
            FieldDiscipline::HighJump => "high jump",
            FieldDiscipline::PoleVault => "pole vault",
        }
    }

    /// Accepted spellings: English label, Norwegian name, short code.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            FieldDiscipline::ShotPut => &["shot put", "shot", "kule", "sp"],
            FieldDiscipline::Discus => &["discus", "diskos", "dt"],
            FieldDiscipline::Hammer => &["hammer", "slegge", "ht"],
            FieldDiscipline::Javelin => &["javelin", "spyd", "jt"],
            FieldDiscipline::BallThrow => &["ball throw", "ball", "liten ball", "bt"],
            FieldDiscipline::LongJump => &["long jump", "lengde", "lj"],
            FieldDiscipline::TripleJump => &["triple jump", "tresteg", "tj"],
            FieldDiscipline::HighJump => &["high jump", "høyde", "hoyde", "hj"],
            FieldDiscipline::PoleVault => &["pole vault", "stavsprang", "pv"],
        }
    }

    /// Whether the discipline needs a bar set up before the first attempt.
    pub fn has_bar_setup(self) -> bool {
        matches!(self, FieldDiscipline::HighJump | FieldDiscipline::PoleVault)
    }

    /// Parses a discipline from any accepted spelling (case-insensitive).
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_lowercase().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|d| d.aliases().iter().any(|a| *a == normalized))
    }
}

/// The fixed kind of an event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A race on the track.
    Track {
        /// Nominal distance in meters.
        distance_m: u32,
        /// Whether this is a hurdles race.
        hurdles: bool,
    },
    /// A field discipline.
    Field(FieldDiscipline),
}

impl EventKind {
    /// Creates a flat track race.
    pub fn sprint(distance_m: u32) -> Self {
        EventKind::Track {
            distance_m,
            hurdles: false,
        }
    }

    /// Creates a hurdles race.
    pub fn hurdles(distance_m: u32) -> Self {
        EventKind::Track {
            distance_m,
            hurdles: true,
        }
    }

    /// Whether this is a track event.
    pub fn is_track(&self) -> bool {
        matches!(self, EventKind::Track { .. })
    }

    /// Whether this is a field event.
    pub fn is_field(&self) -> bool {
        matches!(self, EventKind::Field(_))
    }

    /// Field discipline, if any.
    pub fn discipline(&self) -> Option<FieldDiscipline> {
        match self {
            EventKind::Field(d) => Some(*d),
            EventKind::Track { .. } => None,
        }
    }

    /// Track ordering key: distance ascending, flat before hurdles.
    ///
    /// Field events have no track key.
    pub fn track_key(&self) -> Option<(u32, bool)> {
        match self {
            EventKind::Track { distance_m, hurdles } => Some((*distance_m, *hurdles)),
            EventKind::Field(_) => None,
        }
    }

    /// Canonical display name ("100m", "60m hurdles", "long jump").
    pub fn label(&self) -> String {
        match self {
            EventKind::Track {
                distance_m,
                hurdles: false,
            } => format!("{distance_m}m"),
            EventKind::Track {
                distance_m,
                hurdles: true,
            } => format!("{distance_m}m hurdles"),
            EventKind::Field(d) => d.label().to_string(),
        }
    }

    /// Parses an event type.
    ///
    /// Track: `100m`, `100 meter`, `100m-sprint`, `m100`, `60m hurdles`,
    /// `80m hekk`, `m60_hurdles`. Field: see [`FieldDiscipline::parse`].
    pub fn parse(input: &str) -> Option<Self> {
        if let Some(discipline) = FieldDiscipline::parse(input) {
            return Some(EventKind::Field(discipline));
        }

        let lower = input.trim().to_lowercase();
        let body = lower.strip_prefix('m').unwrap_or(&lower);
        let digits: String = body.chars().take_while(|c| c.is_ascii_digit()).collect();
        let distance_m = digits.parse::<u32>().ok().filter(|d| *d > 0)?;
        let rest = &body[digits.len()..];
        let rest = rest.trim_start();
        if !(rest.is_empty() || rest.starts_with('m') || rest.starts_with('_') || rest.starts_with('-')) {
            return None;
        }
        let hurdles = rest.contains("hurdle") || rest.contains("hekk") || rest.starts_with("mh");
        Some(EventKind::Track { distance_m, hurdles })
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Stable identity of an event: category name plus event kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    /// Category name.
    pub category: String,
    /// Event kind.
    pub kind: EventKind,
}

impl EventKey {
    /// Creates a new key.
    pub fn new(category: impl Into<String>, kind: EventKind) -> Self {
        Self {
            category: category.into(),
            kind,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category, self.kind)
    }
}

/// A (category, event-type) pair.
///
/// Produced once from participant data and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Category competing in this event.
    pub category: Category,
    /// Event kind.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event.
    pub fn new(category: Category, kind: EventKind) -> Self {
        Self { category, kind }
    }

    /// Identity of this event.
    pub fn key(&self) -> EventKey {
        EventKey::new(self.category.name.clone(), self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_track() {
        assert_eq!(EventKind::parse("100m"), Some(EventKind::sprint(100)));
        assert_eq!(EventKind::parse("100 meter"), Some(EventKind::sprint(100)));
        assert_eq!(EventKind::parse("100m-sprint"), Some(EventKind::sprint(100)));
        assert_eq!(EventKind::parse("m100"), Some(EventKind::sprint(100)));
        assert_eq!(EventKind::parse("1500m"), Some(EventKind::sprint(1500)));
    }

    #[test]
    fn test_parse_hurdles() {
        assert_eq!(EventKind::parse("60m hurdles"), Some(EventKind::hurdles(60)));
        assert_eq!(EventKind::parse("80m hekk"), Some(EventKind::hurdles(80)));
        assert_eq!(EventKind::parse("m60_hurdles"), Some(EventKind::hurdles(60)));
        assert_eq!(EventKind::parse("100 meter hekk"), Some(EventKind::hurdles(100)));
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(
            EventKind::parse("Lengde"),
            Some(EventKind::Field(FieldDiscipline::LongJump))
        );
        assert_eq!(
            EventKind::parse("shot put"),
            Some(EventKind::Field(FieldDiscipline::ShotPut))
        );
        assert_eq!(
            EventKind::parse("long_jump"),
            Some(EventKind::Field(FieldDiscipline::LongJump))
        );
        assert_eq!(
            EventKind::parse("HJ"),
            Some(EventKind::Field(FieldDiscipline::HighJump))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(EventKind::parse(""), None);
        assert_eq!(EventKind::parse("marathon"), None);
        assert_eq!(EventKind::parse("0m"), None);
        assert_eq!(EventKind::parse("100kg"), None);
    }

    #[test]
    fn test_label_round_trip() {
        for kind in [
            EventKind::sprint(200),
            EventKind::hurdles(60),
            EventKind::Field(FieldDiscipline::PoleVault),
        ] {
            assert_eq!(EventKind::parse(&kind.label()), Some(kind));
        }
    }

    #[test]
    fn test_track_key_order() {
        let flat = EventKind::sprint(100).track_key().unwrap();
        let hurdles = EventKind::hurdles(100).track_key().unwrap();
        let sixty_h = EventKind::hurdles(60).track_key().unwrap();
        assert!(flat < hurdles);
        assert!(sixty_h < flat);
        assert!(EventKind::Field(FieldDiscipline::Discus).track_key().is_none());
    }
}
