//! Meet domain models.
//!
//! Immutable value types shared by grouping, model building, optimization
//! and validation.
//!
//! | Type | Meaning |
//! |------|---------|
//! | `Category` | Registration class with a derived age and gender |
//! | `Event` | A (category, event type) pair |
//! | `Participant` | A competitor and the events they entered |
//! | `EventGroup` | Merged events sharing one venue and one window |
//! | `VenueResource` | A bookable venue |
//! | `SchedulingResult` | Group → (venue, start slot, end slot) |

mod category;
mod event;
mod group;
mod participant;
mod result;
mod venue;
mod window;

pub use category::{Category, Gender, RECRUIT_AGE, SENIOR_AGE};
pub use event::{Event, EventKey, EventKind, FieldDiscipline};
pub use group::{EventGroup, CATEGORY_SEPARATOR};
pub use participant::Participant;
pub use result::{ScheduleStatus, ScheduledGroup, SchedulingResult};
pub use venue::{VenueKind, VenueResource};
pub use window::SlotWindow;

pub mod venues {
    //! Known venue names.
    pub use super::venue::{
        HIGH_JUMP_AREA, HIGH_JUMP_AREA_2, JAVELIN_AREA, JUMPING_PIT, SHOT_PUT_CIRCLE,
        SHOT_PUT_CIRCLE_2, THROWING_CIRCLE, TRACK,
    };
}
