//! Event overview records.
//!
//! One row per event group with wall-clock times, for people to read and
//! edit. Edited rows are read back, turned into slot placements by exact
//! division and validated like any other schedule. A time that is not on
//! a slot boundary is reported, never rounded.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};

use crate::config::MeetConfig;
use crate::error::{MeetError, MeetResult};
use crate::models::{EventGroup, EventKind, Participant, ScheduledGroup, SchedulingResult, VenueResource};
use crate::validation::{validate_schedule, Diagnostic, DiagnosticKind, ValidationReport};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// One overview row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewRow {
    pub event_group_id: String,
    pub event_type: String,
    /// Member categories, youngest first.
    pub categories: String,
    pub venue: String,
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM"
    pub end_time: String,
    pub duration_minutes: i64,
}

/// Rows for every placement of a result, in start order.
///
/// # Errors
///
/// `Overview` when a placement refers to a group the result lacks.
pub fn overview_rows(result: &SchedulingResult, config: &MeetConfig) -> MeetResult<Vec<OverviewRow>> {
    let minutes = i64::from(result.slot_minutes());
    result
        .assignments()
        .iter()
        .map(|a| {
            let group = result.group(&a.group_id).ok_or_else(|| {
                MeetError::Overview(format!("no event group '{}' in result", a.group_id))
            })?;
            Ok(OverviewRow {
                event_group_id: a.group_id.clone(),
                event_type: group.kind.label(),
                categories: group.category_list(),
                venue: a.venue.clone(),
                start_time: clock(config.meet_start, a.start_slot * minutes),
                end_time: clock(config.meet_start, a.end_slot * minutes),
                duration_minutes: a.duration_slots() * minutes,
            })
        })
        .collect()
}

fn clock(start: NaiveDateTime, offset_minutes: i64) -> String {
    (start + chrono::Duration::minutes(offset_minutes))
        .format("%H:%M")
        .to_string()
}

/// Writes rows as CSV with a header.
pub fn write_overview<W: Write>(rows: &[OverviewRow], writer: W) -> MeetResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Reads rows from CSV with a header.
pub fn read_overview<R: Read>(reader: R) -> MeetResult<Vec<OverviewRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Placements recovered from rows, plus problems found on the way.
#[derive(Debug, Clone, Default)]
pub struct ImportedOverview {
    /// Placements of rows that could be converted.
    pub schedule: Vec<ScheduledGroup>,
    /// Row-level problems.
    pub diagnostics: Vec<Diagnostic>,
    /// Groups that had a row but no usable placement.
    pub unplaced: Vec<String>,
}

/// Converts rows to slot placements.
pub fn import_overview(rows: &[OverviewRow], groups: &[EventGroup], config: &MeetConfig) -> ImportedOverview {
    let by_id: HashMap<&str, &EventGroup> = groups.iter().map(|g| (g.id.as_str(), g)).collect();
    let slot = i64::from(config.slot_minutes.max(1));
    let mut out = ImportedOverview::default();

    for row in rows {
        let ids = vec![row.event_group_id.clone()];
        let mut usable = true;

        if let Some(group) = by_id.get(row.event_group_id.as_str()) {
            if EventKind::parse(&row.event_type) != Some(group.kind) {
                out.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MalformedRow,
                    ids.clone(),
                    format!("event type '{}' does not match {}", row.event_type, group.kind),
                ));
            }
            if normalize_categories(&row.categories) != normalize_categories(&group.category_list()) {
                out.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MalformedRow,
                    ids.clone(),
                    format!(
                        "categories '{}' do not match '{}'",
                        row.categories,
                        group.category_list()
                    ),
                ));
            }
        }

        let start = offset_minutes(&row.start_time, config);
        let end = offset_minutes(&row.end_time, config);
        let (Some(start), Some(end_clock)) = (start, end) else {
            out.diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedRow,
                ids,
                format!("unreadable time '{}'-'{}'", row.start_time, row.end_time),
            ));
            out.unplaced.push(row.event_group_id.clone());
            continue;
        };
        if start < 0 {
            out.diagnostics.push(Diagnostic::new(
                DiagnosticKind::OutOfBounds,
                ids,
                format!(
                    "start '{}' is before the meet start {}",
                    row.start_time.trim(),
                    config.meet_start.format("%H:%M")
                ),
            ));
            out.unplaced.push(row.event_group_id.clone());
            continue;
        }
        // An end reading before the start crossed midnight.
        let end = start + (end_clock - start).rem_euclid(MINUTES_PER_DAY);

        for (label, value) in [("start", start), ("end", end)] {
            if value % slot != 0 {
                usable = false;
                out.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::Alignment,
                    ids.clone(),
                    format!("{label} {value} min after meet start is not a multiple of {slot} min"),
                ));
            }
        }
        if row.duration_minutes != end - start {
            out.diagnostics.push(Diagnostic::new(
                DiagnosticKind::DurationMismatch,
                ids.clone(),
                format!(
                    "declared {} min, times span {} min",
                    row.duration_minutes,
                    end - start
                ),
            ));
        }

        if !usable {
            out.unplaced.push(row.event_group_id.clone());
            continue;
        }
        let venue = VenueResource::by_name(&row.venue)
            .map(|v| v.name)
            .unwrap_or_else(|| row.venue.trim().to_string());
        out.schedule.push(ScheduledGroup::new(
            row.event_group_id.clone(),
            venue,
            start / slot,
            end / slot,
        ));
    }
    out
}

/// Imports rows and validates the resulting schedule.
///
/// Row problems come first, then schedule violations. Groups whose row
/// could not be placed are not reported again as missing.
pub fn validate_overview(
    rows: &[OverviewRow],
    groups: &[EventGroup],
    participants: &[Participant],
    config: &MeetConfig,
) -> ValidationReport {
    let imported = import_overview(rows, groups, config);
    let report = validate_schedule(&imported.schedule, groups, participants, config);

    let mut diagnostics = imported.diagnostics;
    diagnostics.extend(report.diagnostics.into_iter().filter(|d| {
        !(d.kind == DiagnosticKind::MissingGroup
            && d.event_group_ids.iter().all(|id| imported.unplaced.contains(id)))
    }));
    ValidationReport::from_diagnostics(diagnostics)
}

/// Signed minutes from the meet start to a clock reading on the meet day.
/// Negative for readings before the meet start.
fn offset_minutes(text: &str, config: &MeetConfig) -> Option<i64> {
    let text = text.trim();
    let time = NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()
        .filter(|t| t.second() == 0)?;
    let minutes = |t: NaiveTime| i64::from(t.hour() * 60 + t.minute());
    Some(minutes(time) - minutes(config.meet_start.time()))
}

fn normalize_categories(list: &str) -> Vec<String> {
    list.split([';', ',', '+'])
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Event, FieldDiscipline, ScheduleStatus};

    fn sample() -> (SchedulingResult, MeetConfig) {
        let config = MeetConfig::default();
        let lj = EventKind::Field(FieldDiscipline::LongJump);
        let k100 = EventKind::sprint(100);
        let j15 = Category::parse("J15").unwrap();
        let j16 = Category::parse("J16").unwrap();
        let groups = vec![
            EventGroup::new("100m_J15", k100, VenueResource::for_event(&k100))
                .with_event(Event::new(j15.clone(), k100))
                .with_participants(["ann"])
                .with_duration(5, 1),
            EventGroup::new("long-jump_J15+J16", lj, VenueResource::for_event(&lj))
                .with_event(Event::new(j16.clone(), lj))
                .with_event(Event::new(j15.clone(), lj))
                .with_participants(["ann", "eva"])
                .with_duration(12, 3),
        ];
        let participants = vec![
            Participant::new("ann", j15.clone())
                .with_event(crate::models::EventKey::new("J15", k100))
                .with_event(crate::models::EventKey::new("J15", lj)),
            Participant::new("eva", j16).with_event(crate::models::EventKey::new("J16", lj)),
        ];
        let result = SchedulingResult::new(
            ScheduleStatus::Solved,
            config.slot_minutes,
            48,
            vec![
                ScheduledGroup::new("100m_J15", "track", 0, 1),
                ScheduledGroup::new("long-jump_J15+J16", "jumping pit", 1, 4),
            ],
            groups,
            participants,
        );
        (result, config)
    }

    #[test]
    fn test_export_rows() {
        let (result, config) = sample();
        let rows = overview_rows(&result, &config).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start_time, "17:00");
        assert_eq!(rows[0].end_time, "17:05");
        assert_eq!(rows[1].event_type, "long jump");
        assert_eq!(rows[1].categories, "J15; J16");
        assert_eq!(rows[1].start_time, "17:05");
        assert_eq!(rows[1].end_time, "17:20");
        assert_eq!(rows[1].duration_minutes, 15);
    }

    #[test]
    fn test_csv_round_trip_validates_clean() {
        let (result, config) = sample();
        let rows = overview_rows(&result, &config).unwrap();
        let mut buf = Vec::new();
        write_overview(&rows, &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with(
            "event_group_id,event_type,categories,venue,start_time,end_time,duration_minutes"
        ));

        let back = read_overview(buf.as_slice()).unwrap();
        assert_eq!(back, rows);

        let direct = validate_schedule(
            &result.to_schedule(),
            result.groups(),
            result.participants(),
            &config,
        );
        let via_overview =
            validate_overview(&back, result.groups(), result.participants(), &config);
        assert!(direct.passed);
        assert_eq!(direct, via_overview);
    }

    #[test]
    fn test_misaligned_time_is_reported_not_rounded() {
        let (result, config) = sample();
        let mut rows = overview_rows(&result, &config).unwrap();
        rows[1].start_time = "17:07".into();
        rows[1].duration_minutes = 13;

        let imported = import_overview(&rows, result.groups(), &config);
        assert_eq!(imported.schedule.len(), 1);
        assert_eq!(imported.unplaced, vec!["long-jump_J15+J16".to_string()]);

        let report = validate_overview(&rows, result.groups(), result.participants(), &config);
        assert!(!report.passed);
        assert_eq!(report.count(DiagnosticKind::Alignment), 1);
        assert!(!report.has(DiagnosticKind::MissingGroup));
    }

    #[test]
    fn test_hand_edit_creates_overlap() {
        let (result, config) = sample();
        let mut rows = overview_rows(&result, &config).unwrap();
        rows[1].start_time = "17:00".into();
        rows[1].end_time = "17:15".into();

        let report = validate_overview(&rows, result.groups(), result.participants(), &config);
        assert_eq!(report.count(DiagnosticKind::ParticipantOverlap), 1);
        assert!(report.diagnostics[0].detail.contains("ann"));
    }

    #[test]
    fn test_declared_duration_checked() {
        let (result, config) = sample();
        let mut rows = overview_rows(&result, &config).unwrap();
        rows[0].duration_minutes = 10;
        let report = validate_overview(&rows, result.groups(), result.participants(), &config);
        assert_eq!(report.count(DiagnosticKind::DurationMismatch), 1);
    }

    #[test]
    fn test_unknown_and_unreadable_rows() {
        let (result, config) = sample();
        let mut rows = overview_rows(&result, &config).unwrap();
        rows[0].end_time = "late".into();
        rows.push(OverviewRow {
            event_group_id: "ghost".into(),
            event_type: "200m".into(),
            categories: "J15".into(),
            venue: "Track".into(),
            start_time: "18:00".into(),
            end_time: "18:05".into(),
            duration_minutes: 5,
        });
        let report = validate_overview(&rows, result.groups(), result.participants(), &config);
        assert_eq!(report.count(DiagnosticKind::MalformedRow), 1);
        assert_eq!(report.count(DiagnosticKind::UnknownGroup), 1);
        assert!(!report.has(DiagnosticKind::MissingGroup));
    }

    #[test]
    fn test_venue_display_names_accepted() {
        let (result, config) = sample();
        let mut rows = overview_rows(&result, &config).unwrap();
        rows[1].venue = "Jumping_Pit".into();
        let report = validate_overview(&rows, result.groups(), result.participants(), &config);
        assert!(report.passed, "{:?}", report.diagnostics);
    }

    #[test]
    fn test_time_before_meet_start_is_out_of_bounds() {
        let (result, config) = sample();
        let mut rows = overview_rows(&result, &config).unwrap();
        rows[0].start_time = "16:55".into();
        rows[0].end_time = "17:00".into();

        let imported = import_overview(&rows, result.groups(), &config);
        assert_eq!(imported.unplaced, vec!["100m_J15".to_string()]);
        assert_eq!(imported.schedule.len(), 1);

        let report = validate_overview(&rows, result.groups(), result.participants(), &config);
        assert_eq!(report.count(DiagnosticKind::OutOfBounds), 1);
        assert_eq!(report.diagnostics[0].event_group_ids, vec!["100m_J15"]);
        assert!(report.diagnostics[0].detail.contains("16:55"));
        assert!(!report.has(DiagnosticKind::MissingGroup));
        assert!(!report.has(DiagnosticKind::Alignment));
    }

    #[test]
    fn test_end_past_midnight_stays_on_the_meet_day() {
        let (result, _) = sample();
        let start = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(23, 50, 0))
            .unwrap();
        let config = MeetConfig::default().with_meet_start(start);
        let rows = overview_rows(&result, &config).unwrap();
        assert_eq!(rows[1].start_time, "23:55");
        assert_eq!(rows[1].end_time, "00:10");

        let imported = import_overview(&rows, result.groups(), &config);
        assert_eq!(imported.schedule, result.to_schedule());
        let report = validate_overview(&rows, result.groups(), result.participants(), &config);
        assert!(report.passed, "{:?}", report.diagnostics);
    }
}
