//! Venue resource model.
//!
//! A venue is a bookable resource: the track, a jumping pit, a throwing
//! circle. Secondary venues exist only to let the youngest categories run
//! in parallel with older ones when the meet enables them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EventKind, FieldDiscipline};

pub const TRACK: &str = "track";
pub const SHOT_PUT_CIRCLE: &str = "shot put circle";
pub const SHOT_PUT_CIRCLE_2: &str = "shot put circle 2";
pub const THROWING_CIRCLE: &str = "throwing circle";
pub const JAVELIN_AREA: &str = "javelin area";
pub const JUMPING_PIT: &str = "jumping pit";
pub const HIGH_JUMP_AREA: &str = "high jump area";
pub const HIGH_JUMP_AREA_2: &str = "high jump area 2";

/// Venue classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VenueKind {
    /// Regular venue.
    Primary,
    /// Extra venue for controlled parallelism of young categories.
    Secondary,
}

/// A named bookable resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VenueResource {
    /// Venue name (unique).
    pub name: String,
    /// Venue classification.
    pub kind: VenueKind,
}

impl VenueResource {
    /// Creates a primary venue.
    pub fn primary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VenueKind::Primary,
        }
    }

    /// Creates a secondary venue.
    pub fn secondary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VenueKind::Secondary,
        }
    }

    /// Primary venue hosting an event kind.
    pub fn for_event(kind: &EventKind) -> Self {
        let name = match kind {
            EventKind::Track { .. } => TRACK,
            EventKind::Field(d) => match d {
                FieldDiscipline::ShotPut => SHOT_PUT_CIRCLE,
                FieldDiscipline::Discus | FieldDiscipline::Hammer => THROWING_CIRCLE,
                FieldDiscipline::Javelin | FieldDiscipline::BallThrow => JAVELIN_AREA,
                FieldDiscipline::LongJump | FieldDiscipline::TripleJump => JUMPING_PIT,
                FieldDiscipline::HighJump | FieldDiscipline::PoleVault => HIGH_JUMP_AREA,
            },
        };
        Self::primary(name)
    }

    /// Secondary venue configured for a discipline, if one exists.
    pub fn secondary_for(discipline: FieldDiscipline) -> Option<Self> {
        match discipline {
            FieldDiscipline::ShotPut => Some(Self::secondary(SHOT_PUT_CIRCLE_2)),
            FieldDiscipline::HighJump => Some(Self::secondary(HIGH_JUMP_AREA_2)),
            _ => None,
        }
    }

    /// Looks up a known venue by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        let lower = lower.replace('_', " ");
        let kind = match lower.as_str() {
            TRACK | SHOT_PUT_CIRCLE | THROWING_CIRCLE | JAVELIN_AREA | JUMPING_PIT
            | HIGH_JUMP_AREA => VenueKind::Primary,
            SHOT_PUT_CIRCLE_2 | HIGH_JUMP_AREA_2 => VenueKind::Secondary,
            _ => return None,
        };
        Some(Self { name: lower, kind })
    }

    /// Whether this is a secondary venue.
    pub fn is_secondary(&self) -> bool {
        self.kind == VenueKind::Secondary
    }
}

impl fmt::Display for VenueResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
