//! Practice data model
//!
//! Patients, visits, payments and media attachments as the rest of the
//! crate sees them. Timestamps are microseconds since the Unix epoch, the
//! same unit the Holochain conductor hands the zomes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::earnings::PatientLedger;
use crate::error::VisitwiseError;

/// Money in whole currency units.
pub type Amount = u64;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

/// When and how the practitioner wants to be nudged about a patient
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderPreferences {
    pub enabled: bool,
    /// 0 = Sunday .. 6 = Saturday
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    /// Local time of day, `HH:MM`
    #[serde(default)]
    pub time: Option<String>,
    /// Send outstanding-balance reminders over the messaging deep link
    #[serde(default)]
    pub payment_reminders: bool,
}

/// A patient in the practitioner's directory
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub maps_link: Option<String>,
    /// Default price of a visit when the visit carries no charge of its own
    #[serde(default)]
    pub charge_per_visit: Amount,
    #[serde(default)]
    pub condition: Option<String>,
    /// Treatment protocol / exercise plan
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// `false` once archived; archived patients keep their history
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub reminders: ReminderPreferences,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

impl Patient {
    /// Active patient with only the fields billing needs
    pub fn new(id: impl Into<String>, name: impl Into<String>, charge_per_visit: Amount) -> Self {
        Patient {
            id: id.into(),
            name: name.into(),
            age: None,
            gender: Gender::default(),
            phone: None,
            address: None,
            maps_link: None,
            charge_per_visit,
            condition: None,
            protocol: None,
            notes: None,
            is_active: true,
            reminders: ReminderPreferences::default(),
            created_at: 0,
            updated_at: 0,
        }
    }
}

/// One day on which the practitioner saw (or plans to see) a patient
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Visit {
    pub id: String,
    pub patient_id: String,
    pub date: NaiveDate,
    #[serde(default = "default_true")]
    pub completed: bool,
    /// Charge for this visit; 0 means "use the patient's charge_per_visit"
    #[serde(default)]
    pub charge: Amount,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: i64,
}

impl Visit {
    pub fn completed(
        id: impl Into<String>,
        patient_id: impl Into<String>,
        date: NaiveDate,
        charge: Amount,
    ) -> Self {
        Visit {
            id: id.into(),
            patient_id: patient_id.into(),
            date,
            completed: true,
            charge,
            notes: None,
            created_at: 0,
        }
    }

    pub fn scheduled(
        id: impl Into<String>,
        patient_id: impl Into<String>,
        date: NaiveDate,
        charge: Amount,
    ) -> Self {
        Visit {
            completed: false,
            ..Visit::completed(id, patient_id, date, charge)
        }
    }

    /// The visit's own charge, or the patient default when it has none
    pub fn effective_charge(&self, default_charge: Amount) -> Amount {
        if self.charge > 0 {
            self.charge
        } else {
            default_charge
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Upi,
    Card,
    Other,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Upi => write!(f, "upi"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Other => write!(f, "other"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = VisitwiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "upi" => Ok(PaymentMethod::Upi),
            "card" => Ok(PaymentMethod::Card),
            "other" => Ok(PaymentMethod::Other),
            other => Err(VisitwiseError::InvalidPaymentMethod(other.to_string())),
        }
    }
}

/// Money received from a patient
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: String,
    pub patient_id: String,
    pub amount: Amount,
    pub date: NaiveDate,
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: i64,
}

impl Payment {
    pub fn new(
        id: impl Into<String>,
        patient_id: impl Into<String>,
        amount: Amount,
        date: NaiveDate,
        method: PaymentMethod,
    ) -> Self {
        Payment {
            id: id.into(),
            patient_id: patient_id.into(),
            amount,
            date,
            method,
            notes: None,
            created_at: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Photo or video attached to a patient
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: String,
    pub patient_id: String,
    pub file_name: String,
    /// Download URL handed back by object storage
    pub url: String,
    /// Object-storage path; derivable from `url` when missing
    #[serde(default)]
    pub storage_path: Option<String>,
    pub kind: MediaKind,
    pub size_bytes: u64,
    pub uploaded_at: i64,
    /// Opaque placeholder hash produced by the capture pipeline
    #[serde(default)]
    pub thumbhash: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

/// Everything a practice owns, as exported to / imported from JSON
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PracticeData {
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub visits: Vec<Visit>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

impl PracticeData {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn patient(&self, patient_id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == patient_id)
    }

    /// Visits and payments grouped under the patient who owns them
    pub fn ledger(&self, patient_id: &str) -> Option<PatientLedger<'_>> {
        self.patient(patient_id)
            .map(|patient| PatientLedger::new(patient, &self.visits, &self.payments))
    }

    pub fn ledgers(&self) -> Vec<PatientLedger<'_>> {
        self.patients
            .iter()
            .map(|patient| PatientLedger::new(patient, &self.visits, &self.payments))
            .collect()
    }
}
