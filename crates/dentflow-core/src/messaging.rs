//! Outbound messaging links.
//!
//! Builds a URL that opens a chat with the patient in an external messaging
//! service. Nothing is sent from here.

use chrono::NaiveDateTime;
use thiserror::Error;
use url::Url;

use crate::config::{ClinicProfile, MessagingConfig};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MessagingError {
    #[error("phone number has no digits: {0:?}")]
    EmptyPhone(String),

    #[error("invalid messaging URL: {0}")]
    InvalidUrl(String),
}

/// Values substituted into a message template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext<'a> {
    pub patient_name: &'a str,
    pub clinic: Option<&'a ClinicProfile>,
    pub appointment: Option<NaiveDateTime>,
}

/// Digits only, one leading zero dropped, country code prefixed unless the
/// number already starts with it.
pub fn normalize_phone(raw: &str, country_code: &str) -> Result<String, MessagingError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(MessagingError::EmptyPhone(raw.to_string()));
    }
    if let Some(local) = digits.strip_prefix('0') {
        return Ok(format!("{country_code}{local}"));
    }
    if digits.starts_with(country_code) {
        return Ok(digits);
    }
    Ok(format!("{country_code}{digits}"))
}

/// Replace placeholders in `template`. Unknown placeholders are left as-is.
pub fn render_template(template: &str, ctx: &TemplateContext<'_>) -> String {
    let clinic = ctx.clinic.cloned().unwrap_or_default();
    let (date, time) = match ctx.appointment {
        Some(at) => (at.format("%Y-%m-%d").to_string(), at.format("%H:%M").to_string()),
        None => (String::new(), String::new()),
    };

    template
        .replace("{patientName}", ctx.patient_name)
        .replace("{clinicName}", &clinic.name)
        .replace("{clinicAddress}", &clinic.address)
        .replace("{clinicPhone}", &clinic.phone)
        .replace("{appointmentDate}", &date)
        .replace("{appointmentTime}", &time)
}

/// Chat link for `phone` carrying `text`, percent-encoded.
pub fn message_link(config: &MessagingConfig, phone: &str, text: &str) -> Result<Url, MessagingError> {
    let number = normalize_phone(phone, &config.country_code)?;
    let base = if config.base_url.ends_with('/') {
        config.base_url.clone()
    } else {
        format!("{}/", config.base_url)
    };

    let mut url = Url::parse(&base)
        .and_then(|b| b.join(&number))
        .map_err(|e| MessagingError::InvalidUrl(e.to_string()))?;
    if !text.is_empty() {
        url.query_pairs_mut().append_pair("text", text);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("010 1234-5678", "20").unwrap(), "201012345678");
        assert_eq!(normalize_phone("+20 101 234 5678", "20").unwrap(), "201012345678");
        assert_eq!(normalize_phone("1012345678", "20").unwrap(), "201012345678");
        assert!(matches!(
            normalize_phone("n/a", "20"),
            Err(MessagingError::EmptyPhone(_))
        ));
    }

    #[test]
    fn test_render_template() {
        let clinic = ClinicProfile {
            name: "Smile".into(),
            address: "12 Nile St".into(),
            phone: "0223456789".into(),
        };
        let when = chrono::NaiveDate::from_ymd_opt(2024, 9, 1)
            .unwrap()
            .and_hms_opt(16, 30, 0)
            .unwrap();
        let ctx = TemplateContext {
            patient_name: "Mona",
            clinic: Some(&clinic),
            appointment: Some(when),
        };

        let text = render_template(
            "Hi {patientName}, see you {appointmentDate} at {appointmentTime} at {clinicName} ({clinicAddress}, {clinicPhone}). {unknown}",
            &ctx,
        );
        assert_eq!(
            text,
            "Hi Mona, see you 2024-09-01 at 16:30 at Smile (12 Nile St, 0223456789). {unknown}"
        );
    }

    #[test]
    fn test_message_link_encodes_text() {
        let config = MessagingConfig::default();
        let url = message_link(&config, "0101 234 5678", "Hello Mona & family").unwrap();
        assert_eq!(
            url.as_str(),
            "https://wa.me/201012345678?text=Hello+Mona+%26+family"
        );
    }

    #[test]
    fn test_message_link_without_trailing_slash() {
        let config = MessagingConfig {
            base_url: "https://chat.example.com/send".into(),
            ..MessagingConfig::default()
        };
        let url = message_link(&config, "01012345678", "").unwrap();
        assert_eq!(url.as_str(), "https://chat.example.com/send/201012345678");
    }
}
