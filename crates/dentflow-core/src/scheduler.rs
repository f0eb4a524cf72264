//! Calendar views over appointments.
//!
//! Pure filtering and grouping; nothing here books or moves appointments.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Appointment, AppointmentStatus};

/// Filters for the day agenda.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgendaFilter {
    pub dentist_id: Option<String>,
    pub hide_cancelled: bool,
}

/// Appointments starting on `date`, ordered by start time.
pub fn day_agenda<'a>(
    appointments: &'a [Appointment],
    date: NaiveDate,
    filter: &AgendaFilter,
) -> Vec<&'a Appointment> {
    let mut agenda: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.date() == date)
        .filter(|a| filter.dentist_id.as_deref().map_or(true, |d| a.dentist_id == d))
        .filter(|a| !filter.hide_cancelled || a.status != AppointmentStatus::Cancelled)
        .collect();
    agenda.sort_by_key(|a| (a.start, a.end));
    agenda
}

/// Appointment counts for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayLoad {
    pub total: usize,
    /// Not cancelled or no-show
    pub active: usize,
}

/// Counts per day for the month containing `year`/`month`. Days without
/// appointments are absent.
pub fn month_overview(appointments: &[Appointment], year: i32, month: u32) -> BTreeMap<NaiveDate, DayLoad> {
    let mut overview: BTreeMap<NaiveDate, DayLoad> = BTreeMap::new();
    for appointment in appointments {
        let date = appointment.date();
        if date.year() != year || date.month() != month {
            continue;
        }
        let load = overview.entry(date).or_default();
        load.total += 1;
        if appointment.is_active() {
            load.active += 1;
        }
    }
    overview
}

/// Active appointments overlapping `candidate` that share its dentist or
/// patient. The candidate itself (same id) is ignored, so edits can be checked.
pub fn find_conflicts<'a>(appointments: &'a [Appointment], candidate: &Appointment) -> Vec<&'a Appointment> {
    appointments
        .iter()
        .filter(|a| a.id != candidate.id && a.is_active())
        .filter(|a| a.dentist_id == candidate.dentist_id || a.patient_id == candidate.patient_id)
        .filter(|a| a.overlaps(candidate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn appt(patient: &str, dentist: &str, start: NaiveDateTime, mins: i64) -> Appointment {
        Appointment::new(patient.into(), dentist.into(), start, start + chrono::Duration::minutes(mins))
    }

    #[test]
    fn test_day_agenda_sorted_and_filtered() {
        let mut cancelled = appt("p4", "d1", at(1, 8, 0), 30);
        cancelled.status = AppointmentStatus::Cancelled;
        let list = vec![
            appt("p1", "d1", at(1, 11, 0), 30),
            appt("p2", "d2", at(1, 9, 0), 30),
            appt("p3", "d1", at(1, 10, 0), 30),
            appt("p5", "d1", at(2, 9, 0), 30),
            cancelled,
        ];
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();

        let all = day_agenda(&list, date, &AgendaFilter::default());
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].patient_id, "p4");

        let filter = AgendaFilter {
            dentist_id: Some("d1".into()),
            hide_cancelled: true,
        };
        let d1: Vec<_> = day_agenda(&list, date, &filter)
            .iter()
            .map(|a| a.patient_id.as_str())
            .collect();
        assert_eq!(d1, vec!["p3", "p1"]);
    }

    #[test]
    fn test_month_overview() {
        let mut no_show = appt("p3", "d1", at(3, 9, 0), 30);
        no_show.status = AppointmentStatus::NoShow;
        let mut august = appt("p9", "d1", at(3, 9, 0), 30);
        august.start = NaiveDate::from_ymd_opt(2024, 8, 3).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let list = vec![
            appt("p1", "d1", at(3, 9, 0), 30),
            appt("p2", "d2", at(3, 10, 0), 30),
            no_show,
            appt("p4", "d1", at(20, 9, 0), 30),
            august,
        ];

        let overview = month_overview(&list, 2024, 7);
        assert_eq!(overview.len(), 2);
        let third = overview[&NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()];
        assert_eq!(third, DayLoad { total: 3, active: 2 });
    }

    #[test]
    fn test_conflicts_same_dentist_or_patient() {
        let existing = vec![
            appt("p1", "d1", at(1, 9, 0), 60),
            appt("p2", "d2", at(1, 9, 30), 30),
            appt("p3", "d3", at(1, 9, 0), 60),
        ];
        let candidate = appt("p2", "d1", at(1, 9, 45), 30);

        let conflicts = find_conflicts(&existing, &candidate);
        assert_eq!(conflicts.len(), 2);
    }

    #[test]
    fn test_cancelled_and_self_never_conflict() {
        let mut cancelled = appt("p1", "d1", at(1, 9, 0), 60);
        cancelled.status = AppointmentStatus::Cancelled;
        let current = appt("p2", "d1", at(1, 9, 0), 30);
        let existing = vec![cancelled, current.clone()];

        let mut moved = current.clone();
        moved.end = at(1, 9, 45);
        assert!(find_conflicts(&existing, &moved).is_empty());
    }
}
