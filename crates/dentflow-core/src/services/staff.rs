//! Staff roster.

use tracing::info;

use super::{log_failure, Clinic, ServiceResult};
use crate::db::Repository;
use crate::models::{StaffMember, StaffRole};
use crate::validation::{optional_text, required_text, ValidationError};

/// Staff form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StaffInput {
    pub name: String,
    pub role: StaffRole,
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

pub struct StaffService<'a, S: Repository> {
    clinic: &'a Clinic<S>,
}

impl<'a, S: Repository> StaffService<'a, S> {
    pub fn new(clinic: &'a Clinic<S>) -> Self {
        Self { clinic }
    }

    pub fn add(&self, input: StaffInput) -> ServiceResult<StaffMember> {
        self.try_add(input).inspect_err(|e| log_failure("staff.add", e))
    }

    fn try_add(&self, input: StaffInput) -> ServiceResult<StaffMember> {
        let mut member = StaffMember::new(required_text(&input.name, "name")?, input.role);
        member.specialty = optional_text(input.specialty);
        member.phone = optional_text(input.phone);
        member.email = optional_text(input.email);

        self.clinic.store().add(&member)?;
        info!(staff_id = %member.id, role = ?member.role, "staff member added");
        Ok(member)
    }

    pub fn update(&self, id: &str, input: StaffInput) -> ServiceResult<StaffMember> {
        self.try_update(id, input)
            .inspect_err(|e| log_failure("staff.update", e))
    }

    fn try_update(&self, id: &str, input: StaffInput) -> ServiceResult<StaffMember> {
        let mut member: StaffMember = self.clinic.store().require(id)?;
        member.name = required_text(&input.name, "name")?;
        member.role = input.role;
        member.specialty = optional_text(input.specialty);
        member.phone = optional_text(input.phone);
        member.email = optional_text(input.email);

        self.clinic.store().update(&member)?;
        info!(staff_id = %member.id, "staff member updated");
        Ok(member)
    }

    /// Staff are deactivated rather than deleted; their records stay attributed.
    pub fn set_active(&self, id: &str, active: bool) -> ServiceResult<StaffMember> {
        let mut member: StaffMember = self.clinic.store().require(id)?;
        member.active = active;
        self.clinic.store().update(&member)?;
        info!(staff_id = %member.id, active, "staff member activation changed");
        Ok(member)
    }

    pub fn get(&self, id: &str) -> ServiceResult<Option<StaffMember>> {
        Ok(self.clinic.store().get(id)?)
    }

    pub fn list(&self) -> ServiceResult<Vec<StaffMember>> {
        Ok(self.clinic.store().list()?)
    }

    /// Active dentists, by name.
    pub fn dentists(&self) -> ServiceResult<Vec<StaffMember>> {
        let mut dentists: Vec<StaffMember> = self
            .list()?
            .into_iter()
            .filter(|m| m.active && m.is_dentist())
            .collect();
        dentists.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(dentists)
    }

    /// Fetch a staff member who must be a dentist.
    pub(crate) fn require_dentist(&self, id: &str) -> ServiceResult<StaffMember> {
        let member: StaffMember = self.clinic.store().require(id)?;
        if !member.is_dentist() {
            return Err(ValidationError::NotADentist(member.name).into());
        }
        Ok(member)
    }
}
