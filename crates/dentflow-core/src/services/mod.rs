//! Form handlers.
//!
//! Each service validates and shapes input, then mutates through the
//! [`Repository`]. Multi-record changes run inside `atomically` so a rejected
//! step leaves nothing behind.

mod appointments;
mod doctor_payments;
mod inventory;
mod lab_cases;
mod patients;
mod payments;
mod prescriptions;
mod staff;
mod suppliers;
mod treatments;

pub use appointments::*;
pub use doctor_payments::*;
pub use inventory::*;
pub use lab_cases::*;
pub use patients::*;
pub use payments::*;
pub use prescriptions::*;
pub use staff::*;
pub use suppliers::*;
pub use treatments::*;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{error, warn};

use crate::audit::AuditError;
use crate::clock::{Clock, SystemClock};
use crate::config::ClinicConfig;
use crate::db::{DbError, Repository};
use crate::discount::DiscountError;
use crate::messaging::MessagingError;
use crate::storage::{FileStore, StorageError};
use crate::validation::{self, ValidationError};

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(DbError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Discount(#[from] DiscountError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("no file store configured")]
    StorageUnavailable,

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => ServiceError::NotFound(what),
            other => ServiceError::Database(other),
        }
    }
}

impl ServiceError {
    /// User input was refused; the form stays open.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation(_)
                | ServiceError::Discount(_)
                | ServiceError::NotFound(_)
                | ServiceError::Messaging(_)
        )
    }

    /// Stable key for the localized message catalog.
    pub fn message_key(&self) -> &'static str {
        match self {
            ServiceError::Validation(e) => e.message_key(),
            ServiceError::Discount(e) => e.message_key(),
            ServiceError::NotFound(_) => "error.not_found",
            ServiceError::Database(_) => "error.database",
            ServiceError::Storage(_) | ServiceError::StorageUnavailable => "error.upload_failed",
            ServiceError::Audit(_) => "error.audit",
            ServiceError::Messaging(_) => "error.messaging",
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Log a failed operation: rejections at warn, everything else at error.
pub(crate) fn log_failure(operation: &'static str, err: &ServiceError) {
    if err.is_rejection() {
        warn!(operation, key = err.message_key(), "rejected: {err}");
    } else {
        error!(operation, key = err.message_key(), "failed: {err}");
    }
}

/// The clinic core: a store plus the settings every service needs.
pub struct Clinic<S: Repository> {
    store: S,
    config: ClinicConfig,
    clock: Box<dyn Clock>,
    files: Option<Box<dyn FileStore>>,
}

impl<S: Repository> Clinic<S> {
    /// Create a clinic on the system clock without file storage.
    pub fn new(store: S, config: ClinicConfig) -> Self {
        Self {
            store,
            config,
            clock: Box::new(SystemClock),
            files: None,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_file_store(mut self, files: impl FileStore + 'static) -> Self {
        self.files = Some(Box::new(files));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ClinicConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn patients(&self) -> PatientService<'_, S> {
        PatientService::new(self)
    }

    pub fn staff(&self) -> StaffService<'_, S> {
        StaffService::new(self)
    }

    pub fn treatments(&self) -> TreatmentService<'_, S> {
        TreatmentService::new(self)
    }

    pub fn payments(&self) -> PaymentService<'_, S> {
        PaymentService::new(self)
    }

    pub fn doctor_payments(&self) -> DoctorPaymentService<'_, S> {
        DoctorPaymentService::new(self)
    }

    pub fn suppliers(&self) -> SupplierService<'_, S> {
        SupplierService::new(self)
    }

    pub fn lab_cases(&self) -> LabCaseService<'_, S> {
        LabCaseService::new(self)
    }

    pub fn prescriptions(&self) -> PrescriptionService<'_, S> {
        PrescriptionService::new(self)
    }

    pub fn appointments(&self) -> AppointmentService<'_, S> {
        AppointmentService::new(self)
    }

    pub fn inventory(&self) -> InventoryService<'_, S> {
        InventoryService::new(self)
    }

    pub(crate) fn file_store(&self) -> ServiceResult<&dyn FileStore> {
        self.files.as_deref().ok_or(ServiceError::StorageUnavailable)
    }

    /// Apply the future-date rule when configured.
    pub(crate) fn check_date(&self, date: NaiveDate) -> Result<NaiveDate, ValidationError> {
        if self.config.reject_future_dates {
            validation::not_in_future(date, self.today())
        } else {
            Ok(date)
        }
    }

    pub(crate) fn decimals(&self) -> u32 {
        self.config.currency_decimals
    }
}
