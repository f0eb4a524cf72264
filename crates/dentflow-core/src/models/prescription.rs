//! Prescription models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A medication line on a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionItem {
    /// Drug name and strength (e.g., "Amoxicillin 500mg")
    pub medication: String,
    /// Amount per dose (e.g., "1 capsule")
    pub dosage: String,
    /// e.g., "every 8 hours"
    pub frequency: Option<String>,
    /// e.g., "5 days"
    pub duration: Option<String>,
    pub instructions: Option<String>,
}

/// A dated prescription for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub id: String,
    pub patient_id: String,
    pub dentist_id: String,
    pub date: NaiveDate,
    pub items: Vec<PrescriptionItem>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl Prescription {
    pub fn new(patient_id: String, dentist_id: String, date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            dentist_id,
            date,
            items: Vec::new(),
            notes: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
