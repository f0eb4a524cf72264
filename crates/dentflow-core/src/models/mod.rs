//! Domain models for the clinic core.

pub mod appointment;
pub mod audit;
pub mod chart;
pub mod patient;
pub mod payment;
pub mod prescription;
pub mod staff;
pub mod supplier;
pub mod treatment;

pub use appointment::*;
pub use audit::{AuditAction, AuditEntry};
pub use chart::*;
pub use patient::*;
pub use payment::*;
pub use prescription::*;
pub use staff::*;
pub use supplier::*;
pub use treatment::*;
