//! Schedule quality metrics (KPIs).
//!
//! Computes the quantities the optimizer works on, from a finished
//! result, so a schedule can be judged without re-solving.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan | Latest end slot |
//! | Tier finish | Latest end of groups entirely in a tier |
//! | Min recovery gap | Smallest gap between consecutive groups of an oldest-tier multi-event participant |
//! | Venue utilization | Busy slots / makespan, per venue |

use std::collections::HashMap;

use crate::config::MeetConfig;
use crate::models::{SchedulingResult, SlotWindow};

/// Schedule performance indicators. Times are in slots.
#[derive(Debug, Clone)]
pub struct ScheduleKpi {
    /// Latest end slot.
    pub makespan_slots: i64,
    /// Makespan in minutes.
    pub makespan_minutes: i64,
    /// Finish slot per tier, youngest first. `None` when no group lies
    /// entirely in the tier.
    pub tier_finish: Vec<Option<i64>>,
    /// Smallest recovery gap, if any participant qualifies.
    pub min_recovery_gap: Option<i64>,
    /// Per-venue utilization (0.0..1.0).
    pub utilization_by_venue: HashMap<String, f64>,
    /// Mean venue utilization.
    pub avg_utilization: f64,
}

impl ScheduleKpi {
    /// Computes KPIs for a result.
    pub fn calculate(result: &SchedulingResult, config: &MeetConfig) -> Self {
        let makespan = result.makespan();

        let mut tier_finish = vec![None; config.tier_count()];
        for a in result.assignments() {
            let Some(group) = result.group(&a.group_id) else {
                continue;
            };
            let Some(first) = group.events.first() else {
                continue;
            };
            let tier = config.tier_of(first.category.age);
            if group.events.iter().all(|e| config.tier_of(e.category.age) == tier) {
                let slot: &mut Option<i64> = &mut tier_finish[tier];
                *slot = Some(slot.map_or(a.end_slot, |f| f.max(a.end_slot)));
            }
        }

        let oldest = config.oldest_tier();
        let mut min_recovery_gap: Option<i64> = None;
        for p in result.participants() {
            if config.tier_of(p.category.age) != oldest || p.event_count() < 2 {
                continue;
            }
            let mut windows: Vec<SlotWindow> = result
                .assignments_for_participant(&p.id)
                .iter()
                .map(|a| a.window())
                .collect();
            windows.sort_by_key(|w| (w.start, w.end));
            for pair in windows.windows(2) {
                let gap = pair[0].gap_to(&pair[1]);
                min_recovery_gap = Some(min_recovery_gap.map_or(gap, |g| g.min(gap)));
            }
        }

        let utilization_by_venue: HashMap<String, f64> = result
            .venue_load()
            .into_iter()
            .map(|(venue, busy)| {
                let u = if makespan > 0 {
                    busy as f64 / makespan as f64
                } else {
                    0.0
                };
                (venue, u)
            })
            .collect();
        let avg_utilization = if utilization_by_venue.is_empty() {
            0.0
        } else {
            utilization_by_venue.values().sum::<f64>() / utilization_by_venue.len() as f64
        };

        Self {
            makespan_slots: makespan,
            makespan_minutes: makespan * i64::from(result.slot_minutes()),
            tier_finish,
            min_recovery_gap,
            utilization_by_venue,
            avg_utilization,
        }
    }

    /// Whether the schedule ends by `max_makespan` and gives every
    /// qualifying participant at least `min_gap` slots of rest.
    pub fn meets_thresholds(&self, max_makespan: i64, min_gap: i64) -> bool {
        self.makespan_slots <= max_makespan && self.min_recovery_gap.map_or(true, |g| g >= min_gap)
    }
}
