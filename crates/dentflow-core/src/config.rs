//! Clinic runtime configuration.
//!
//! Resolved once at startup (from a JSON file or string) and passed into the
//! services. Every field has a default so a partial file is enough.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{StaffRole, ToothStatus};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Clinic identity shown on reports and messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ClinicProfile {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Outbound messaging link settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MessagingConfig {
    /// Base URL of the messaging service; the normalized phone is appended
    pub base_url: String,
    /// Country calling code prefixed to local numbers (digits only)
    pub country_code: String,
    /// Default message template
    pub default_template: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wa.me/".into(),
            country_code: "20".into(),
            default_template: "Hello {patientName}, this is {clinicName}. \
                Address: {clinicAddress}. Phone: {clinicPhone}."
                .into(),
        }
    }
}

/// Core configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClinicConfig {
    pub clinic: ClinicProfile,
    /// ISO 4217 currency code for display
    pub currency: String,
    /// Decimal places money is rounded to
    pub currency_decimals: u32,
    pub messaging: MessagingConfig,
    /// Roles allowed to approve discounts
    pub discount_approver_roles: Vec<StaffRole>,
    /// Accept patient payments larger than the outstanding balance
    pub allow_overpayment: bool,
    /// Reject payments, treatments and expenses dated after today
    pub reject_future_dates: bool,
    /// Reject payments matching an existing one on patient, date and amount
    /// unless the caller acknowledges the duplicate
    pub duplicate_payment_check: bool,
    /// Chart status per treatment definition id, overriding the definition's own
    pub chart_status_overrides: BTreeMap<String, ToothStatus>,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            clinic: ClinicProfile::default(),
            currency: "EGP".into(),
            currency_decimals: 2,
            messaging: MessagingConfig::default(),
            discount_approver_roles: vec![StaffRole::Owner, StaffRole::Manager],
            allow_overpayment: false,
            reject_future_dates: true,
            duplicate_payment_check: true,
            chart_status_overrides: BTreeMap::new(),
        }
    }
}

impl ClinicConfig {
    /// Parse and validate configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ClinicConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.currency_decimals > 6 {
            return Err(ConfigError::Invalid(format!(
                "currency_decimals must be at most 6, got {}",
                self.currency_decimals
            )));
        }
        let code = &self.messaging.country_code;
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid(
                "messaging.country_code must be a non-empty digit string".into(),
            ));
        }
        if url::Url::parse(&self.messaging.base_url).is_err() {
            return Err(ConfigError::Invalid(format!(
                "messaging.base_url is not a valid URL: {}",
                self.messaging.base_url
            )));
        }
        if self.discount_approver_roles.is_empty() {
            return Err(ConfigError::Invalid(
                "discount_approver_roles cannot be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn can_approve_discounts(&self, role: StaffRole) -> bool {
        self.discount_approver_roles.contains(&role)
    }
}
