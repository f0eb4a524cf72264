//! Staff models.

use serde::{Deserialize, Serialize};

/// Role of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffRole {
    Owner,
    Manager,
    Dentist,
    Receptionist,
    Assistant,
}

/// A clinic staff member. Dentists are staff with role [`StaffRole::Dentist`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub role: StaffRole,
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl StaffMember {
    pub fn new(name: String, role: StaffRole) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            role,
            specialty: None,
            phone: None,
            email: None,
            active: true,
        }
    }

    pub fn is_dentist(&self) -> bool {
        self.role == StaffRole::Dentist
    }
}
