//! Outbound deep links: dialer, maps and a pre-filled messaging reminder.
//! No messaging API is involved; the links just open the apps.

use crate::config::PracticeConfig;
use crate::model::{Amount, Patient};

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";
const WHATSAPP_URL: &str = "https://wa.me/";

fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// `tel:` link; keeps a leading `+`
pub fn dialer_link(phone: &str) -> Option<String> {
    let digits = digits_only(phone);
    if digits.is_empty() {
        return None;
    }
    let plus = if phone.trim_start().starts_with('+') { "+" } else { "" };
    Some(format!("tel:{}{}", plus, digits))
}

/// The stored maps link, else a search on the address
pub fn maps_link(patient: &Patient) -> Option<String> {
    if let Some(link) = patient.maps_link.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        return Some(link.to_string());
    }
    let address = patient.address.as_deref().map(str::trim).filter(|a| !a.is_empty())?;
    Some(format!("{}{}", MAPS_SEARCH_URL, percent_encode(address)))
}

/// International number for messaging links; 10-digit numbers get the
/// configured country code, a leading trunk `0` is dropped first
pub fn international_number(phone: &str, country_code: &str) -> Option<String> {
    let digits = digits_only(phone);
    if digits.is_empty() {
        return None;
    }
    if phone.trim_start().starts_with('+') {
        return Some(digits);
    }
    let local = digits.strip_prefix('0').unwrap_or(&digits);
    if local.len() == 10 {
        Some(format!("{}{}", country_code, local))
    } else {
        Some(digits)
    }
}

pub fn reminder_message(patient: &Patient, outstanding: Amount, config: &PracticeConfig) -> String {
    let first_name = patient.name.split_whitespace().next().unwrap_or(&patient.name);
    config
        .reminder_template
        .replace("{name}", first_name)
        .replace("{currency}", &config.currency_symbol)
        .replace("{amount}", &outstanding.to_string())
}

pub fn whatsapp_link(phone: &str, message: &str, country_code: &str) -> Option<String> {
    let number = international_number(phone, country_code)?;
    Some(format!("{}{}?text={}", WHATSAPP_URL, number, percent_encode(message)))
}

/// Messaging link reminding the patient of their outstanding balance.
/// `None` when nothing is owed or the patient has no phone.
pub fn payment_reminder_link(patient: &Patient, outstanding: Amount, config: &PracticeConfig) -> Option<String> {
    if outstanding == 0 {
        return None;
    }
    let phone = patient.phone.as_deref()?;
    let message = reminder_message(patient, outstanding, config);
    whatsapp_link(phone, &message, &config.default_country_code)
}

/// RFC 3986 unreserved characters pass through; everything else is
/// UTF-8 percent-encoded
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> Patient {
        let mut p = Patient::new("p1", "Asha Rao", 500);
        p.phone = Some("098765 43210".to_string());
        p.address = Some("12 MG Road, Pune".to_string());
        p
    }

    #[test]
    fn test_dialer_link() {
        assert_eq!(dialer_link("+91 98765-43210").as_deref(), Some("tel:+919876543210"));
        assert_eq!(dialer_link("(022) 2345 6789").as_deref(), Some("tel:02223456789"));
        assert_eq!(dialer_link("n/a"), None);
    }

    #[test]
    fn test_maps_link_prefers_stored_link() {
        let mut p = patient();
        assert_eq!(
            maps_link(&p).as_deref(),
            Some("https://www.google.com/maps/search/?api=1&query=12%20MG%20Road%2C%20Pune")
        );

        p.maps_link = Some("https://maps.app.goo.gl/xyz".to_string());
        assert_eq!(maps_link(&p).as_deref(), Some("https://maps.app.goo.gl/xyz"));

        p.maps_link = None;
        p.address = None;
        assert_eq!(maps_link(&p), None);
    }

    #[test]
    fn test_international_number() {
        assert_eq!(international_number("98765 43210", "91").as_deref(), Some("919876543210"));
        assert_eq!(international_number("098765 43210", "91").as_deref(), Some("919876543210"));
        assert_eq!(international_number("+1 415 555 0100", "91").as_deref(), Some("14155550100"));
    }

    #[test]
    fn test_payment_reminder_link() {
        let config = PracticeConfig::default();
        let link = payment_reminder_link(&patient(), 1500, &config).unwrap();
        assert!(link.starts_with("https://wa.me/919876543210?text=Hello%20Asha%2C"));
        assert!(link.contains("%E2%82%B91500"));

        assert_eq!(payment_reminder_link(&patient(), 0, &config), None);

        let mut no_phone = patient();
        no_phone.phone = None;
        assert_eq!(payment_reminder_link(&no_phone, 100, &config), None);
    }

    #[test]
    fn test_reminder_message_template() {
        let config = PracticeConfig {
            currency_symbol: "$".to_string(),
            reminder_template: "{name} owes {currency}{amount}".to_string(),
            ..PracticeConfig::default()
        };
        assert_eq!(reminder_message(&patient(), 250, &config), "Asha owes $250");
    }
}
