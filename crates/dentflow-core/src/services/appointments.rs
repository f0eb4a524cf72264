//! Appointment booking.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

use super::{log_failure, Clinic, ServiceResult, StaffService};
use crate::db::Repository;
use crate::models::{Appointment, AppointmentStatus, Patient};
use crate::scheduler::{day_agenda, find_conflicts, month_overview, AgendaFilter, DayLoad};
use crate::validation::{optional_text, Confirmation, ValidationError};

/// Booking form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentInput {
    pub patient_id: String,
    pub dentist_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub reason: Option<String>,
    pub notes: Option<String>,
    /// Book even if it overlaps another appointment
    pub acknowledge_conflicts: bool,
}

pub struct AppointmentService<'a, S: Repository> {
    clinic: &'a Clinic<S>,
}

impl<'a, S: Repository> AppointmentService<'a, S> {
    pub fn new(clinic: &'a Clinic<S>) -> Self {
        Self { clinic }
    }

    pub fn book(&self, input: AppointmentInput) -> ServiceResult<Appointment> {
        self.try_book(input).inspect_err(|e| log_failure("appointments.book", e))
    }

    fn try_book(&self, input: AppointmentInput) -> ServiceResult<Appointment> {
        check_range(input.start, input.end)?;
        self.clinic.store().require::<Patient>(&input.patient_id)?;
        StaffService::new(self.clinic).require_dentist(&input.dentist_id)?;

        let mut appointment = Appointment::new(input.patient_id, input.dentist_id, input.start, input.end);
        appointment.reason = optional_text(input.reason);
        appointment.notes = optional_text(input.notes);
        self.check_conflicts(&appointment, input.acknowledge_conflicts)?;

        self.clinic.store().add(&appointment)?;
        info!(appointment_id = %appointment.id, start = %appointment.start, "appointment booked");
        Ok(appointment)
    }

    pub fn reschedule(
        &self,
        id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        acknowledge_conflicts: bool,
    ) -> ServiceResult<Appointment> {
        self.try_reschedule(id, start, end, acknowledge_conflicts)
            .inspect_err(|e| log_failure("appointments.reschedule", e))
    }

    fn try_reschedule(
        &self,
        id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        acknowledge_conflicts: bool,
    ) -> ServiceResult<Appointment> {
        check_range(start, end)?;
        let mut appointment: Appointment = self.clinic.store().require(id)?;
        appointment.start = start;
        appointment.end = end;
        self.check_conflicts(&appointment, acknowledge_conflicts)?;

        self.clinic.store().update(&appointment)?;
        info!(appointment_id = %appointment.id, start = %start, "appointment rescheduled");
        Ok(appointment)
    }

    /// Change status. Completing an appointment counts as a visit.
    pub fn set_status(&self, id: &str, status: AppointmentStatus) -> ServiceResult<Appointment> {
        let mut appointment: Appointment = self.clinic.store().require(id)?;
        appointment.status = status;

        self.clinic.store().atomically(|store| {
            store.update(&appointment)?;
            if status == AppointmentStatus::Completed {
                let mut patient: Patient = store.require(&appointment.patient_id)?;
                patient.record_visit(appointment.date());
                patient.touch();
                store.update(&patient)?;
            }
            Ok::<_, super::ServiceError>(())
        })?;

        info!(appointment_id = %appointment.id, status = ?status, "appointment status changed");
        Ok(appointment)
    }

    pub fn delete(&self, id: &str, confirmation: Confirmation) -> ServiceResult<bool> {
        confirmation.require()?;
        let removed = self.clinic.store().delete::<Appointment>(id)?;
        if removed {
            info!(appointment_id = id, "appointment deleted");
        }
        Ok(removed)
    }

    pub fn day_agenda(&self, date: NaiveDate, filter: &AgendaFilter) -> ServiceResult<Vec<Appointment>> {
        let appointments: Vec<Appointment> = self.clinic.store().list()?;
        Ok(day_agenda(&appointments, date, filter).into_iter().cloned().collect())
    }

    pub fn month_overview(&self, year: i32, month: u32) -> ServiceResult<BTreeMap<NaiveDate, DayLoad>> {
        let appointments: Vec<Appointment> = self.clinic.store().list()?;
        Ok(month_overview(&appointments, year, month))
    }

    pub fn for_patient(&self, patient_id: &str) -> ServiceResult<Vec<Appointment>> {
        let mut appointments: Vec<Appointment> = self.clinic.store().list_for(patient_id)?;
        appointments.sort_by_key(|a| a.start);
        Ok(appointments)
    }

    fn check_conflicts(&self, candidate: &Appointment, acknowledged: bool) -> ServiceResult<()> {
        if acknowledged {
            return Ok(());
        }
        let appointments: Vec<Appointment> = self.clinic.store().list()?;
        let count = find_conflicts(&appointments, candidate).len();
        if count > 0 {
            return Err(ValidationError::ScheduleConflict { count }.into());
        }
        Ok(())
    }
}

fn check_range(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::InvalidTimeRange { start, end });
    }
    Ok(())
}
