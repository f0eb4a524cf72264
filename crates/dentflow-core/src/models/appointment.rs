//! Appointment models.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Appointment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

/// A calendar entry linking a patient and a dentist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub dentist_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub status: AppointmentStatus,
    /// Reason for visit
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl Appointment {
    pub fn new(
        patient_id: String,
        dentist_id: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            dentist_id,
            start,
            end,
            status: AppointmentStatus::Scheduled,
            reason: None,
            notes: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn is_active(&self) -> bool {
        !matches!(
            self.status,
            AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Half-open interval overlap: back-to-back appointments do not overlap.
    pub fn overlaps(&self, other: &Appointment) -> bool {
        self.start < other.end && other.start < self.end
    }
}
