//! Patients Integrity Zome
//!
//! Defines the patient entry for a practitioner's directory and validates
//! it with the same field rules the UI forms apply.

use hdi::prelude::*;
use visitwise_core::validation::validate_patient as check_patient;
use visitwise_core::{Amount, Gender, ReminderPreferences};

/// Patient profile as stored on the source chain
#[hdk_entry_helper]
#[derive(Clone, PartialEq)]
pub struct Patient {
    pub name: String,
    pub age: Option<u32>,
    pub gender: Gender,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Link pasted from a maps app; overrides the address search
    pub maps_link: Option<String>,
    /// Default charge for a visit that carries none
    pub charge_per_visit: Amount,
    pub condition: Option<String>,
    pub protocol: Option<String>,
    pub notes: Option<String>,
    /// Cleared on archive; archived patients keep their history
    pub is_active: bool,
    pub reminders: ReminderPreferences,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Patient {
    /// Core view of this entry under the given id
    pub fn to_core(&self, id: String) -> visitwise_core::Patient {
        visitwise_core::Patient {
            id,
            name: self.name.clone(),
            age: self.age,
            gender: self.gender,
            phone: self.phone.clone(),
            address: self.address.clone(),
            maps_link: self.maps_link.clone(),
            charge_per_visit: self.charge_per_visit,
            condition: self.condition.clone(),
            protocol: self.protocol.clone(),
            notes: self.notes.clone(),
            is_active: self.is_active,
            reminders: self.reminders.clone(),
            created_at: self.created_at.as_micros(),
            updated_at: self.updated_at.as_micros(),
        }
    }

    pub fn from_core(patient: &visitwise_core::Patient) -> Self {
        Patient {
            name: patient.name.trim().to_string(),
            age: patient.age,
            gender: patient.gender,
            phone: patient.phone.clone(),
            address: patient.address.clone(),
            maps_link: patient.maps_link.clone(),
            charge_per_visit: patient.charge_per_visit,
            condition: patient.condition.clone(),
            protocol: patient.protocol.clone(),
            notes: patient.notes.clone(),
            is_active: patient.is_active,
            reminders: patient.reminders.clone(),
            created_at: Timestamp::from_micros(patient.created_at),
            updated_at: Timestamp::from_micros(patient.updated_at),
        }
    }
}

#[hdk_entry_types]
#[unit_enum(UnitEntryTypes)]
pub enum EntryTypes {
    Patient(Patient),
}

#[hdk_link_types]
pub enum LinkTypes {
    /// Practitioner's patients anchor -> patient
    PracticeToPatients,
    /// Original patient -> each update
    PatientUpdates,
}

/// Validation for Patient entries
#[hdk_extern]
pub fn validate(op: Op) -> ExternResult<ValidateCallbackResult> {
    match op.flattened::<EntryTypes, LinkTypes>()? {
        FlatOp::StoreEntry(store_entry) => match store_entry {
            OpEntry::CreateEntry { app_entry, .. } => match app_entry {
                EntryTypes::Patient(patient) => validate_patient(&patient),
            },
            OpEntry::UpdateEntry { app_entry, .. } => match app_entry {
                EntryTypes::Patient(patient) => validate_patient(&patient),
            },
            _ => Ok(ValidateCallbackResult::Valid),
        },
        FlatOp::RegisterCreateLink { link_type, .. } => match link_type {
            LinkTypes::PracticeToPatients => Ok(ValidateCallbackResult::Valid),
            LinkTypes::PatientUpdates => Ok(ValidateCallbackResult::Valid),
        },
        _ => Ok(ValidateCallbackResult::Valid),
    }
}

fn validate_patient(patient: &Patient) -> ExternResult<ValidateCallbackResult> {
    let result = check_patient(&patient.to_core(String::new()));
    if !result.is_valid() {
        return Ok(ValidateCallbackResult::Invalid(result.to_string()));
    }

    if patient.updated_at < patient.created_at {
        return Ok(ValidateCallbackResult::Invalid(
            "updated_at cannot be earlier than created_at".to_string(),
        ));
    }

    Ok(ValidateCallbackResult::Valid)
}
