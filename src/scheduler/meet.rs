//! Meet scheduler facade.
//!
//! Runs the whole pipeline for one meet: entry parsing, grouping, model
//! building and the phased optimization, and packages the outcome as an
//! immutable [`SchedulingResult`].

use std::io::Read;

use tracing::info;

use super::kpi::ScheduleKpi;
use super::optimizer::{MultiPhaseOptimizer, OptimizationReport};
use crate::config::MeetConfig;
use crate::cp::{BranchAndBoundSolver, CpSolver, MeetModelBuilder};
use crate::error::MeetResult;
use crate::grouping::{EntryRecord, GroupingEngine, RejectedRecord};
use crate::models::{EventGroup, Participant, ScheduleStatus, SchedulingResult};
use crate::overview::{overview_rows, OverviewRow};
use crate::validation::{validate_schedule, ValidationReport};

/// Input container for scheduling.
#[derive(Debug, Clone, Default)]
pub struct ScheduleRequest {
    /// Entry records, one per participant and event type.
    pub records: Vec<EntryRecord>,
}

impl ScheduleRequest {
    /// Creates a request from records.
    pub fn new(records: Vec<EntryRecord>) -> Self {
        Self { records }
    }

    /// Reads records from CSV with a `participant,category,event_type` header.
    pub fn from_csv<R: Read>(reader: R) -> MeetResult<Self> {
        Ok(Self::new(EntryRecord::read_csv(reader)?))
    }

    /// Adds one record.
    pub fn with_entry(
        mut self,
        participant: impl Into<String>,
        category: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        self.records
            .push(EntryRecord::new(participant, category, event_type));
        self
    }
}

/// Everything a scheduling run produced.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub result: SchedulingResult,
    pub report: OptimizationReport,
    /// Categories kept unmerged because of multi-event participants.
    pub forced_solo: Vec<String>,
    /// Field groups below the configured minimum size.
    pub undersized: Vec<String>,
    /// Tiers split by age for field events.
    pub split_tiers: Vec<String>,
    /// Field tiers split by gender.
    pub gender_split_tiers: Vec<String>,
    /// Categories dropped for lack of valid entries.
    pub dropped_categories: Vec<String>,
    /// Skipped input records.
    pub rejected: Vec<RejectedRecord>,
}

impl ScheduleOutcome {
    /// Overall status of the run.
    pub fn status(&self) -> ScheduleStatus {
        self.result.status()
    }

    /// Re-checks the result against every hard constraint.
    pub fn validate(&self, config: &MeetConfig) -> ValidationReport {
        validate_schedule(
            self.result.assignments(),
            self.result.groups(),
            self.result.participants(),
            config,
        )
    }

    /// Quality metrics of the result.
    pub fn kpi(&self, config: &MeetConfig) -> ScheduleKpi {
        ScheduleKpi::calculate(&self.result, config)
    }

    /// Overview rows with wall-clock times.
    pub fn overview(&self, config: &MeetConfig) -> MeetResult<Vec<OverviewRow>> {
        overview_rows(&self.result, config)
    }
}

/// Schedules a meet from entries.
///
/// # Example
///
/// ```
/// use meet_schedule::config::MeetConfig;
/// use meet_schedule::scheduler::{MeetScheduler, ScheduleRequest};
///
/// let request = ScheduleRequest::default()
///     .with_entry("ann", "J15", "100m")
///     .with_entry("ann", "J15", "long jump")
///     .with_entry("bea", "J15", "long jump");
///
/// let scheduler = MeetScheduler::new(MeetConfig::default()).unwrap();
/// let outcome = scheduler.schedule(&request).unwrap();
/// assert_eq!(outcome.result.assignments().len(), 2);
/// assert!(outcome.validate(scheduler.config()).passed);
/// ```
#[derive(Debug, Clone)]
pub struct MeetScheduler<S: CpSolver = BranchAndBoundSolver> {
    config: MeetConfig,
    solver: S,
}

impl MeetScheduler {
    /// Creates a scheduler with the default solver.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the configuration is inconsistent.
    pub fn new(config: MeetConfig) -> MeetResult<Self> {
        Self::with_solver(config, BranchAndBoundSolver::new())
    }
}

impl<S: CpSolver> MeetScheduler<S> {
    /// Creates a scheduler with a custom solver backend.
    pub fn with_solver(config: MeetConfig, solver: S) -> MeetResult<Self> {
        config.validate()?;
        Ok(Self { config, solver })
    }

    /// Configuration in use.
    pub fn config(&self) -> &MeetConfig {
        &self.config
    }

    /// Groups the request's entries and schedules the groups.
    ///
    /// # Errors
    ///
    /// `NoValidRecords` or `CategoryTooLarge` from grouping, `Infeasible`
    /// from the optimizer.
    pub fn schedule(&self, request: &ScheduleRequest) -> MeetResult<ScheduleOutcome> {
        self.schedule_records(&request.records)
    }

    /// Groups records and schedules the groups.
    pub fn schedule_records(&self, records: &[EntryRecord]) -> MeetResult<ScheduleOutcome> {
        let grouping = GroupingEngine::new(self.config.clone()).group_records(records)?;
        let mut outcome = self.schedule_groups(grouping.groups, grouping.participants)?;
        outcome.forced_solo = grouping.forced_solo;
        outcome.undersized = grouping.undersized;
        outcome.split_tiers = grouping.split_tiers;
        outcome.gender_split_tiers = grouping.gender_split_tiers;
        outcome.dropped_categories = grouping.dropped_categories;
        outcome.rejected = grouping.rejected;
        Ok(outcome)
    }

    /// Schedules prepared groups.
    pub fn schedule_groups(
        &self,
        groups: Vec<EventGroup>,
        participants: Vec<Participant>,
    ) -> MeetResult<ScheduleOutcome> {
        let builder = MeetModelBuilder::new(&groups, &participants, &self.config);
        let optimized = MultiPhaseOptimizer::new(&self.solver, &self.config).optimize(&builder)?;
        let report = optimized.report;

        info!(
            groups = groups.len(),
            participants = participants.len(),
            status = ?report.status,
            "meet scheduled"
        );

        let result = SchedulingResult::new(
            report.status,
            self.config.slot_minutes,
            report.bound_slots,
            optimized.placements,
            groups,
            participants,
        );
        Ok(ScheduleOutcome {
            result,
            report,
            forced_solo: Vec::new(),
            undersized: Vec::new(),
            split_tiers: Vec::new(),
            gender_split_tiers: Vec::new(),
            dropped_categories: Vec::new(),
            rejected: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeetError;
    use crate::models::ScheduledGroup;
    use crate::overview::{read_overview, validate_overview, write_overview};
    use crate::scheduler::Phase;
    use crate::validation::DiagnosticKind;
    use std::time::Duration;

    fn config() -> MeetConfig {
        MeetConfig::default().with_phase_time_limit(Duration::from_secs(5))
    }

    fn mini_meet() -> ScheduleRequest {
        ScheduleRequest::default()
            .with_entry("ann", "J15", "100m")
            .with_entry("ann", "J15", "100m hurdles")
            .with_entry("ann", "J15", "long jump")
            .with_entry("bea", "J15", "100m")
            .with_entry("bea", "J15", "long jump")
            .with_entry("cat", "J16", "100m")
            .with_entry("cat", "J16", "shot put")
            .with_entry("dan", "G15", "100m")
            .with_entry("dan", "G15", "shot put")
            .with_entry("eli", "G16", "long jump")
            .with_entry("fay", "J10", "60m")
            .with_entry("fay", "J10", "ball throw")
            .with_entry("gus", "G10", "60m")
            .with_entry("gus", "G10", "ball throw")
    }

    fn overlaps(a: &ScheduledGroup, b: &ScheduledGroup) -> bool {
        a.start_slot < b.end_slot && b.start_slot < a.end_slot
    }

    fn placed<'r>(result: &'r SchedulingResult, id: &str) -> &'r ScheduledGroup {
        result.assignment_for(id).unwrap()
    }

    #[test]
    fn test_mini_meet_groups_and_places_everything() {
        let config = config();
        let scheduler = MeetScheduler::new(config.clone()).unwrap();
        let outcome = scheduler.schedule(&mini_meet()).unwrap();
        let result = &outcome.result;

        let mut ids: Vec<&str> = result.groups().iter().map(|g| g.id.as_str()).collect();
        ids.sort();
        assert_eq!(
            ids,
            vec![
                "100m-hurdles_J15",
                "100m_G15",
                "100m_J15+J16",
                "60m_G10",
                "60m_J10",
                "ball-throw_G10+J10",
                "long-jump_J15+G16",
                "shot-put_G15+J16",
            ]
        );
        assert_eq!(result.assignments().len(), 8);
        assert_eq!(outcome.status(), ScheduleStatus::Solved);
        assert!(outcome.rejected.is_empty());
        assert_eq!(
            outcome.undersized,
            vec!["shot-put_G15+J16".to_string(), "ball-throw_G10+J10".to_string()]
        );
        assert!(outcome.split_tiers.is_empty());
        assert!(outcome.gender_split_tiers.is_empty());
    }

    #[test]
    fn test_venue_and_participant_exclusivity() {
        let config = config();
        let scheduler = MeetScheduler::new(config).unwrap();
        let outcome = scheduler.schedule(&mini_meet()).unwrap();
        let result = &outcome.result;

        let all = result.assignments();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                if a.venue == b.venue {
                    assert!(!overlaps(a, b), "{} and {} share {}", a.group_id, b.group_id, a.venue);
                }
            }
        }
        for p in result.participants() {
            let mine = result.assignments_for_participant(&p.id);
            for (i, a) in mine.iter().enumerate() {
                for b in &mine[i + 1..] {
                    assert!(!overlaps(a, b), "{} double-booked", p.id);
                }
            }
        }
    }

    #[test]
    fn test_track_order_flat_before_hurdles() {
        let scheduler = MeetScheduler::new(config()).unwrap();
        let outcome = scheduler.schedule(&mini_meet()).unwrap();
        let result = &outcome.result;

        let flat = placed(result, "100m_J15+J16");
        let hurdles = placed(result, "100m-hurdles_J15");
        assert!(flat.end_slot <= hurdles.start_slot);
        for sixty in ["60m_J10", "60m_G10"] {
            assert!(placed(result, sixty).end_slot <= flat.start_slot);
            assert!(placed(result, sixty).end_slot <= placed(result, "100m_G15").start_slot);
        }
    }

    #[test]
    fn test_fresh_result_validates_clean() {
        let config = config();
        let scheduler = MeetScheduler::new(config.clone()).unwrap();
        let outcome = scheduler.schedule(&mini_meet()).unwrap();
        let report = outcome.validate(&config);
        assert!(report.passed, "{:?}", report.diagnostics);
    }

    #[test]
    fn test_overview_round_trip_matches_direct_validation() {
        let config = config();
        let scheduler = MeetScheduler::new(config.clone()).unwrap();
        let outcome = scheduler.schedule(&mini_meet()).unwrap();

        let rows = outcome.overview(&config).unwrap();
        let mut buf = Vec::new();
        write_overview(&rows, &mut buf).unwrap();
        let back = read_overview(buf.as_slice()).unwrap();

        let via_overview = validate_overview(
            &back,
            outcome.result.groups(),
            outcome.result.participants(),
            &config,
        );
        assert_eq!(via_overview, outcome.validate(&config));

        // A hand edit that stacks two groups on the track is caught.
        let mut edited = back.clone();
        let first_track = edited.iter().position(|r| r.venue == "track").unwrap();
        let second_track = edited
            .iter()
            .rposition(|r| r.venue == "track")
            .unwrap();
        edited[second_track].start_time = edited[first_track].start_time.clone();
        edited[second_track].end_time = edited[first_track].end_time.clone();
        let report = validate_overview(
            &edited,
            outcome.result.groups(),
            outcome.result.participants(),
            &config,
        );
        assert!(!report.passed);
        assert!(report.has(DiagnosticKind::VenueOverlap));
    }

    #[test]
    fn test_later_phases_never_worsen_makespan() {
        let config = config();
        let scheduler = MeetScheduler::new(config).unwrap();
        let outcome = scheduler.schedule(&mini_meet()).unwrap();
        let frozen = outcome.report.value(Phase::Makespan).unwrap();
        assert_eq!(outcome.result.makespan(), frozen);
        assert!(outcome.report.value(Phase::YoungestFinish).unwrap() <= frozen);
    }

    #[test]
    fn test_multi_event_category_stays_unmerged() {
        let request = ScheduleRequest::default()
            .with_entry("amy", "J15", "long jump")
            .with_entry("amy", "J15", "shot put")
            .with_entry("ada", "J15", "long jump")
            .with_entry("bo", "J16", "long jump")
            .with_entry("bi", "J16", "long jump")
            .with_entry("cy", "J17", "long jump");
        let config = config();
        let scheduler = MeetScheduler::new(config.clone()).unwrap();
        let outcome = scheduler.schedule(&request).unwrap();

        assert_eq!(outcome.forced_solo, vec!["J15".to_string()]);
        let ids: Vec<&str> = outcome
            .result
            .groups()
            .iter()
            .map(|g| g.id.as_str())
            .collect();
        assert!(ids.contains(&"long-jump_J15"));
        assert!(ids.contains(&"long-jump_J16+J17"));
        assert!(ids.contains(&"shot-put_J15"));

        assert!(outcome.report.phase(Phase::RecoveryGap).is_some());
        let mine = outcome.result.assignments_for_participant("amy");
        assert_eq!(mine.len(), 2);
        assert!(!overlaps(mine[0], mine[1]));
        assert!(outcome.validate(&config).passed);
    }

    #[test]
    fn test_full_length_groups_on_one_venue_are_infeasible() {
        let request = ScheduleRequest::default()
            .with_entry("a1", "J10", "long jump")
            .with_entry("a2", "J10", "long jump")
            .with_entry("a3", "J10", "long jump")
            .with_entry("a4", "J10", "long jump")
            .with_entry("b1", "J16", "long jump")
            .with_entry("b2", "J16", "long jump");
        let config = config().with_slot_bounds(3, 3, 1);
        let scheduler = MeetScheduler::new(config).unwrap();
        match scheduler.schedule(&request) {
            Err(MeetError::Infeasible {
                bound_slots,
                cap_slots,
            }) => {
                assert_eq!(bound_slots, 3);
                assert_eq!(cap_slots, 3);
            }
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_changeover_and_finish_respected() {
        let config = config()
            .with_track_changeover(true)
            .with_track_finish_minutes(Some(60));
        let scheduler = MeetScheduler::new(config.clone()).unwrap();
        let outcome = scheduler.schedule(&mini_meet()).unwrap();
        let report = outcome.validate(&config);
        assert!(report.passed, "{:?}", report.diagnostics);
        let finish = config.track_finish_slot().unwrap();
        for a in outcome.result.assignments_for_venue("track") {
            assert!(a.end_slot <= finish);
        }
    }

    #[test]
    fn test_from_csv_skips_malformed_rows() {
        let csv = "participant,category,event_type\n\
                   ann,J15,100m\n\
                   ann,J15,long jump\n\
                   bob,J15,marathon\n\
                   ,J15,100m\n";
        let request = ScheduleRequest::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(request.records.len(), 4);

        let scheduler = MeetScheduler::new(config()).unwrap();
        let outcome = scheduler.schedule(&request).unwrap();
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(outcome.result.assignments().len(), 2);
    }

    #[test]
    fn test_no_valid_records() {
        let request = ScheduleRequest::default().with_entry("x", "veterans", "100m");
        let scheduler = MeetScheduler::new(config()).unwrap();
        assert!(matches!(
            scheduler.schedule(&request),
            Err(MeetError::NoValidRecords)
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = MeetConfig::default().with_heat_capacity(0);
        assert!(matches!(
            MeetScheduler::new(bad),
            Err(MeetError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_kpi_matches_result() {
        let config = config();
        let scheduler = MeetScheduler::new(config.clone()).unwrap();
        let outcome = scheduler.schedule(&mini_meet()).unwrap();
        let kpi = outcome.kpi(&config);
        assert_eq!(kpi.makespan_slots, outcome.result.makespan());
        assert_eq!(kpi.makespan_minutes, outcome.result.makespan() * 5);
        assert_eq!(kpi.tier_finish.len(), 3);
    }
}
