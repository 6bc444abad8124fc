//! Grouping engine.
//!
//! Turns entries into event groups. Categories of the same event type are
//! bucketed by age tier; within a bucket they are packed first-fit
//! decreasing by participant count:
//!
//! - **Track**: bins hold at most `heat_capacity` participants, so a merged
//!   group is one heat. A single category above the capacity keeps its own
//!   group and runs several heats. Heats are gender-separated unless mixed
//!   heats are enabled.
//! - **Field**: bins hold at most `field_group_max` participants. Bins
//!   below `field_group_min` take whole categories from larger bins of the
//!   same bucket when both stay within bounds. In the oldest tier, any
//!   category with a participant entered in more than one field event is
//!   kept as its own group for every field event, so the gap between two
//!   groups is the gap that participant actually gets.
//!
//! Youngest-tier field categories move to a secondary venue when secondary
//! venues are enabled for their discipline.
//!
//! # Adaptive field tiers
//!
//! Field groups at different venues that share participants cannot run in
//! parallel. After a first packing, two regroup passes run:
//!
//! 1. When a middle-tier group shares more than `tier_split_shared`
//!    participants with a group at another venue, that tier is split in
//!    two by age (11–14 becomes 11–12 and 13–14).
//! 2. When a mixed-gender group shares participants of only one gender
//!    with a long group at another venue, its tier is split by gender, so
//!    the other gender is not held back.

mod duration;
mod entries;

pub use duration::{
    field_category_minutes, field_group_minutes, group_minutes, heat_minutes, heats_for,
    participant_minutes, track_minutes, BAR_SETUP_MINUTES, MAX_CATEGORY_MINUTES,
};
pub use entries::{parse_entries, EntryRecord, EntrySet, RejectedRecord};

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

use crate::config::MeetConfig;
use crate::error::{MeetError, MeetResult};
use crate::models::{
    Event, EventGroup, EventKind, FieldDiscipline, Gender, Participant, VenueResource,
};

/// Output of a grouping run.
#[derive(Debug, Clone)]
pub struct GroupingOutcome {
    /// Event groups, track first, then by event type and youngest age.
    pub groups: Vec<EventGroup>,
    /// Participants the groups were built from.
    pub participants: Vec<Participant>,
    /// Oldest-tier categories kept unmerged for every field event.
    pub forced_solo: Vec<String>,
    /// Field groups still below `field_group_min`.
    pub undersized: Vec<String>,
    /// Tiers split by age for field events, by label.
    pub split_tiers: Vec<String>,
    /// Field tiers split by gender, by label.
    pub gender_split_tiers: Vec<String>,
    /// Categories dropped for lack of valid entries.
    pub dropped_categories: Vec<String>,
    /// Records skipped as malformed.
    pub rejected: Vec<RejectedRecord>,
}

/// Builds event groups from entries.
#[derive(Debug, Clone)]
pub struct GroupingEngine {
    config: MeetConfig,
}

/// One category's entry in one event, ready for packing.
#[derive(Debug, Clone)]
struct Entry<'a> {
    event: &'a Event,
    entrants: Vec<&'a str>,
}

/// A field tier: a configured tier, or one half of a split middle tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FieldTier {
    tier: usize,
    half: Option<u8>,
}

/// How field categories are bucketed.
#[derive(Debug, Clone, Default)]
struct FieldLayout {
    split_tiers: BTreeSet<usize>,
    gender_split: BTreeSet<FieldTier>,
}

type FieldGroups = Vec<(FieldTier, EventGroup)>;

impl GroupingEngine {
    /// Creates an engine with the given configuration.
    pub fn new(config: MeetConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &MeetConfig {
        &self.config
    }

    /// Parses records and groups them.
    pub fn group_records(&self, records: &[EntryRecord]) -> MeetResult<GroupingOutcome> {
        let set = parse_entries(records)?;
        self.group(&set)
    }

    /// Groups a parsed entry set.
    ///
    /// # Errors
    ///
    /// `CategoryTooLarge` when a field category alone exceeds the field
    /// group maximum.
    pub fn group(&self, set: &EntrySet) -> MeetResult<GroupingOutcome> {
        let forced_solo = self.multi_event_categories(set);
        if !forced_solo.is_empty() {
            debug!(categories = ?forced_solo, "keeping multi-event categories unmerged");
        }

        let mut by_kind: BTreeMap<KindOrder, Vec<Entry<'_>>> = BTreeMap::new();
        for event in &set.events {
            let entrants = set.entrants(&event.key());
            if entrants.is_empty() {
                continue;
            }
            by_kind
                .entry(KindOrder(event.kind))
                .or_default()
                .push(Entry { event, entrants });
        }

        let mut groups = Vec::new();
        let mut field_entries = Vec::new();
        for (KindOrder(kind), entries) in by_kind {
            match kind {
                EventKind::Track { .. } => self.group_track(kind, entries, &mut groups),
                EventKind::Field(_) => field_entries.push((kind, entries)),
            }
        }

        let mut layout = FieldLayout::default();
        let mut field = self.group_field(&field_entries, &forced_solo, &layout)?;
        if self.config.adaptive_field_tiers {
            let crowded = self.crowded_middle_tiers(&field);
            if !crowded.is_empty() {
                layout.split_tiers = crowded;
                field = self.group_field(&field_entries, &forced_solo, &layout)?;
            }
            let blocked = self.gender_blocked_tiers(&field, &set.participants);
            if !blocked.is_empty() {
                layout.gender_split = blocked;
                field = self.group_field(&field_entries, &forced_solo, &layout)?;
            }
        }

        let min = self.config.field_group_min;
        let undersized: Vec<String> = field
            .iter()
            .filter(|(_, g)| g.participant_count() < min)
            .map(|(_, g)| g.id.clone())
            .collect();
        groups.extend(field.into_iter().map(|(_, g)| g));

        info!(
            groups = groups.len(),
            events = set.events.len(),
            participants = set.participants.len(),
            undersized = undersized.len(),
            "grouping complete"
        );

        Ok(GroupingOutcome {
            groups,
            participants: set.participants.clone(),
            forced_solo: forced_solo.into_iter().collect(),
            undersized,
            split_tiers: layout
                .split_tiers
                .iter()
                .map(|t| self.config.tier_label(*t))
                .collect(),
            gender_split_tiers: layout
                .gender_split
                .iter()
                .map(|t| self.field_tier_label(*t))
                .collect(),
            dropped_categories: set.dropped_categories.clone(),
            rejected: set.rejected.clone(),
        })
    }

    /// Oldest-tier categories with a participant in more than one field event.
    fn multi_event_categories(&self, set: &EntrySet) -> BTreeSet<String> {
        let oldest = self.config.oldest_tier();
        set.participants
            .iter()
            .filter(|p| self.config.tier_of(p.category.age) == oldest)
            .filter(|p| p.field_event_count() > 1)
            .map(|p| p.category.name.clone())
            .collect()
    }

    fn group_track(&self, kind: EventKind, entries: Vec<Entry<'_>>, out: &mut Vec<EventGroup>) {
        let capacity = self.config.heat_capacity;
        let mut buckets: BTreeMap<(usize, Option<Gender>), Vec<Entry<'_>>> = BTreeMap::new();
        for entry in entries {
            let tier = self.config.tier_of(entry.event.category.age);
            let gender = if self.config.mix_genders_track {
                None
            } else {
                entry.event.category.gender
            };
            buckets.entry((tier, gender)).or_default().push(entry);
        }

        for (_, bucket) in buckets {
            let (oversized, packable): (Vec<_>, Vec<_>) =
                bucket.into_iter().partition(|e| e.entrants.len() > capacity);
            let mut bins: Vec<Vec<Entry<'_>>> = oversized.into_iter().map(|e| vec![e]).collect();
            bins.extend(first_fit_decreasing(packable, capacity));

            for bin in bins {
                let count: usize = bin.iter().map(|e| e.entrants.len()).sum();
                let heats = heats_for(count, capacity);
                out.push(
                    self.build_group(kind, VenueResource::for_event(&kind), bin, heats)
                        .with_heats(heats, capacity),
                );
            }
        }
    }

    fn group_field(
        &self,
        field_entries: &[(EventKind, Vec<Entry<'_>>)],
        forced_solo: &BTreeSet<String>,
        layout: &FieldLayout,
    ) -> MeetResult<FieldGroups> {
        let (min, max) = (self.config.field_group_min, self.config.field_group_max);
        let oldest = self.config.oldest_tier();
        let mut out = Vec::new();

        for (kind, entries) in field_entries {
            let kind = *kind;
            let mut buckets: BTreeMap<
                (FieldTier, Option<Gender>, String),
                (VenueResource, Vec<Entry<'_>>),
            > = BTreeMap::new();

            for entry in entries {
                let category = &entry.event.category;
                if entry.entrants.len() > max {
                    return Err(MeetError::CategoryTooLarge {
                        category: category.name.clone(),
                        event_type: kind.label(),
                        participants: entry.entrants.len(),
                        max,
                    });
                }
                let tier = self.field_tier(category.age, layout);
                let gender = if layout.gender_split.contains(&tier) {
                    category.gender
                } else {
                    None
                };
                let venue = self.field_venue(kind, tier.tier);
                buckets
                    .entry((tier, gender, venue.name.clone()))
                    .or_insert_with(|| (venue, Vec::new()))
                    .1
                    .push(entry.clone());
            }

            for ((tier, _, _), (venue, bucket)) in buckets {
                let (solo, mergeable): (Vec<_>, Vec<_>) = bucket.into_iter().partition(|e| {
                    tier.tier == oldest && forced_solo.contains(&e.event.category.name)
                });
                let mut bins: Vec<Vec<Entry<'_>>> = solo.into_iter().map(|e| vec![e]).collect();
                let mut packed = first_fit_decreasing(mergeable, max);
                lift_undersized(&mut packed, min, max);
                bins.extend(packed);

                for bin in bins {
                    let group = self.build_group(kind, venue.clone(), bin, 1);
                    if group.participant_count() < min {
                        debug!(
                            group = %group.id,
                            tier = %self.field_tier_label(tier),
                            participants = group.participant_count(),
                            min,
                            "field group below minimum size"
                        );
                    }
                    out.push((tier, group));
                }
            }
        }
        Ok(out)
    }

    fn field_tier(&self, age: u8, layout: &FieldLayout) -> FieldTier {
        let tier = self.config.tier_of(age);
        let half = if layout.split_tiers.contains(&tier) {
            self.config
                .middle_tier_split(tier)
                .map(|(_, mid, _)| u8::from(age > mid))
        } else {
            None
        };
        FieldTier { tier, half }
    }

    fn field_tier_label(&self, tier: FieldTier) -> String {
        match (tier.half, self.config.middle_tier_split(tier.tier)) {
            (Some(0), Some((lower, mid, _))) => age_range(lower, mid),
            (Some(_), Some((_, mid, upper))) => age_range(mid + 1, upper),
            _ => self.config.tier_label(tier.tier),
        }
    }

    /// Middle tiers with a group sharing too many participants with a
    /// group at another venue.
    fn crowded_middle_tiers(&self, field: &FieldGroups) -> BTreeSet<usize> {
        let threshold = self.config.tier_split_shared;
        let mut crowded = BTreeSet::new();
        for (tier, group) in field {
            if crowded.contains(&tier.tier) || self.config.middle_tier_split(tier.tier).is_none() {
                continue;
            }
            let conflict = field
                .iter()
                .filter(|(_, other)| other.id != group.id && other.venue.name != group.venue.name)
                .map(|(_, other)| (other, group.shared_participants(other).count()))
                .find(|(_, shared)| *shared > threshold);
            if let Some((other, shared)) = conflict {
                info!(
                    group = %group.id,
                    other = %other.id,
                    shared,
                    tier = %self.config.tier_label(tier.tier),
                    "cross-venue conflict, splitting field tier by age"
                );
                crowded.insert(tier.tier);
            }
        }
        crowded
    }

    /// Field tiers with a mixed-gender group whose participants of only one
    /// gender are held by a long group at another venue.
    fn gender_blocked_tiers(
        &self,
        field: &FieldGroups,
        participants: &[Participant],
    ) -> BTreeSet<FieldTier> {
        let config = &self.config;
        let gender_of: HashMap<&str, Option<Gender>> = participants
            .iter()
            .map(|p| (p.id.as_str(), p.category.gender))
            .collect();

        let mut blocked = BTreeSet::new();
        for (tier, group) in field {
            if blocked.contains(tier)
                || !is_mixed_gender(group)
                || group.participant_count() < config.gender_split_min_group
            {
                continue;
            }
            let min_shared = if group.duration_minutes > config.gender_split_long_minutes {
                1
            } else {
                config.gender_split_min_shared
            };

            for (_, other) in field {
                if other.id == group.id
                    || other.venue.name == group.venue.name
                    || other.duration_minutes < config.gender_split_blocking_minutes
                {
                    continue;
                }
                let mut counts: BTreeMap<Option<Gender>, usize> = BTreeMap::new();
                for id in group.shared_participants(other) {
                    let gender = gender_of.get(id).copied().flatten();
                    *counts.entry(gender).or_default() += 1;
                }
                let one_sided = match counts.iter().next() {
                    Some((Some(gender), n)) if counts.len() == 1 && *n >= min_shared => {
                        Some((*gender, *n))
                    }
                    _ => None,
                };
                if let Some((gender, shared)) = one_sided {
                    info!(
                        group = %group.id,
                        other = %other.id,
                        ?gender,
                        shared,
                        tier = %self.field_tier_label(*tier),
                        "one gender blocked across venues, splitting field tier by gender"
                    );
                    blocked.insert(*tier);
                    break;
                }
            }
        }
        blocked
    }

    fn field_venue(&self, kind: EventKind, tier: usize) -> VenueResource {
        let secondary = kind.discipline().and_then(|d| {
            let enabled = self.config.use_secondary_venues
                && tier == 0
                && self.config.secondary_disciplines.contains(&d);
            if enabled {
                VenueResource::secondary_for(d)
            } else {
                None
            }
        });
        secondary.unwrap_or_else(|| VenueResource::for_event(&kind))
    }

    fn build_group(
        &self,
        kind: EventKind,
        venue: VenueResource,
        mut bin: Vec<Entry<'_>>,
        heats: u32,
    ) -> EventGroup {
        bin.sort_by(|a, b| a.event.category.cmp(&b.event.category));

        let names: Vec<&str> = bin.iter().map(|e| e.event.category.name.as_str()).collect();
        let id = format!("{}_{}", kind.label().replace(' ', "-"), names.join("+"));
        let shares: Vec<(u8, usize)> = bin
            .iter()
            .map(|e| (e.event.category.age, e.entrants.len()))
            .collect();
        let minutes = group_minutes(&kind, &shares, heats);
        let slots = self.config.slots_for_minutes(minutes);

        debug!(group = %id, venue = %venue, minutes, slots, "event group");

        let mut group = EventGroup::new(id, kind, venue).with_duration(minutes, slots);
        for entry in bin {
            group = group
                .with_event(entry.event.clone())
                .with_participants(entry.entrants.iter().copied());
        }
        group
    }
}

fn age_range(lower: u8, upper: u8) -> String {
    if lower == upper {
        lower.to_string()
    } else {
        format!("{lower}–{upper}")
    }
}

fn is_mixed_gender(group: &EventGroup) -> bool {
    let has = |g: Gender| group.events.iter().any(|e| e.category.gender == Some(g));
    has(Gender::Female) && has(Gender::Male)
}

fn load(bin: &[Entry<'_>]) -> usize {
    bin.iter().map(|e| e.entrants.len()).sum()
}

/// Moves whole categories into bins below `min` from bins that stay at or
/// above it, as long as the receiving bin reaches `min` within `max`.
/// The smallest movable category is taken first.
fn lift_undersized(bins: &mut [Vec<Entry<'_>>], min: usize, max: usize) {
    loop {
        let mut best: Option<(usize, usize, usize, usize)> = None;
        for (to, receiver) in bins.iter().enumerate() {
            let have = load(receiver);
            if have >= min {
                continue;
            }
            for (from, donor) in bins.iter().enumerate() {
                if from == to {
                    continue;
                }
                let spare = load(donor);
                for (idx, entry) in donor.iter().enumerate() {
                    let n = entry.entrants.len();
                    let fits = have + n >= min && have + n <= max && spare - n >= min;
                    if fits && best.map_or(true, |(size, ..)| n < size) {
                        best = Some((n, to, from, idx));
                    }
                }
            }
        }
        let Some((_, to, from, idx)) = best else {
            return;
        };
        let entry = bins[from].remove(idx);
        bins[to].push(entry);
    }
}

/// First-fit decreasing by entrant count into bins of `capacity`.
///
/// Ties keep youngest categories first, so packing is deterministic.
fn first_fit_decreasing<'a>(mut entries: Vec<Entry<'a>>, capacity: usize) -> Vec<Vec<Entry<'a>>> {
    entries.sort_by(|a, b| {
        b.entrants
            .len()
            .cmp(&a.entrants.len())
            .then_with(|| a.event.category.cmp(&b.event.category))
    });

    let mut bins: Vec<(usize, Vec<Entry<'a>>)> = Vec::new();
    for entry in entries {
        let n = entry.entrants.len();
        match bins.iter_mut().find(|(load, _)| load + n <= capacity) {
            Some((load, bin)) => {
                *load += n;
                bin.push(entry);
            }
            None => bins.push((n, vec![entry])),
        }
    }
    bins.into_iter().map(|(_, bin)| bin).collect()
}

/// Orders event kinds: track by (distance, hurdles), then field disciplines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KindOrder(EventKind);

impl KindOrder {
    fn rank(&self) -> (u8, u32, bool, Option<FieldDiscipline>) {
        match self.0 {
            EventKind::Track { distance_m, hurdles } => (0, distance_m, hurdles, None),
            EventKind::Field(d) => (1, 0, false, Some(d)),
        }
    }
}

impl PartialOrd for KindOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KindOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}
