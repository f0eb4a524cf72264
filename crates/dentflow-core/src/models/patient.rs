//! Patient models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::chart::DentalChart;

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// UUID generated at intake
    pub id: String,
    /// Full name
    pub name: String,
    /// Contact phone as entered
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    /// Free-text medical history
    pub medical_history: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    /// Stored chart (possibly sparse)
    #[serde(default)]
    pub dental_chart: DentalChart,
    /// Uploaded images and documents
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Date of the most recent treatment
    pub last_visit: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// A file stored for a patient (x-ray, photo, consent form).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    /// Retrievable URL returned by the file store
    pub url: String,
    pub content_type: Option<String>,
    pub uploaded_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            phone: None,
            email: None,
            date_of_birth: None,
            gender: None,
            address: None,
            medical_history: None,
            allergies: Vec::new(),
            dental_chart: DentalChart::new(),
            attachments: Vec::new(),
            last_visit: None,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Age in whole years on the given date.
    pub fn age_on(&self, on: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        on.years_since(dob)
    }

    /// Record a visit date. `last_visit` only ever moves forward.
    pub fn record_visit(&mut self, date: NaiveDate) {
        if self.last_visit.map_or(true, |last| date > last) {
            self.last_visit = Some(date);
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_patient() {
        let patient = Patient::new("Mona Adel".into());
        assert_eq!(patient.name, "Mona Adel");
        assert!(patient.dental_chart.is_empty());
        assert_eq!(patient.id.len(), 36); // UUID format
    }

    #[test]
    fn test_age_on() {
        let mut patient = Patient::new("Mona Adel".into());
        assert_eq!(patient.age_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), None);

        patient.date_of_birth = NaiveDate::from_ymd_opt(1990, 6, 15);
        assert_eq!(patient.age_on(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()), Some(33));
        assert_eq!(patient.age_on(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()), Some(34));
    }

    #[test]
    fn test_last_visit_only_advances() {
        let mut patient = Patient::new("Mona Adel".into());
        let march = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        patient.record_visit(march);
        patient.record_visit(jan);
        assert_eq!(patient.last_visit, Some(march));
    }
}
