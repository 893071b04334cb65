//! Visits Integrity Zome
//!
//! One entry per day a practitioner saw (or plans to see) a patient.

use hdi::prelude::*;
use visitwise_core::calendar::parse_date;
use visitwise_core::validation::{validate_date_string, validate_visit as check_visit};
use visitwise_core::Amount;

#[hdk_entry_helper]
#[derive(Clone, PartialEq)]
pub struct Visit {
    pub patient_hash: ActionHash,
    /// YYYY-MM-DD
    pub date: String,
    /// `false` for a planned visit; only completed visits are billed
    pub completed: bool,
    /// 0 means the patient's charge_per_visit applies
    pub charge: Amount,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

impl Visit {
    pub fn to_core(&self, id: String) -> visitwise_core::Result<visitwise_core::Visit> {
        Ok(visitwise_core::Visit {
            id,
            patient_id: self.patient_hash.to_string(),
            date: parse_date(&self.date)?,
            completed: self.completed,
            charge: self.charge,
            notes: self.notes.clone(),
            created_at: self.created_at.as_micros(),
        })
    }

    pub fn from_core(patient_hash: ActionHash, visit: &visitwise_core::Visit) -> Self {
        Visit {
            patient_hash,
            date: visitwise_core::calendar::format_date(visit.date),
            completed: visit.completed,
            charge: visit.charge,
            notes: visit.notes.clone(),
            created_at: Timestamp::from_micros(visit.created_at),
        }
    }
}

#[hdk_entry_types]
#[unit_enum(UnitEntryTypes)]
pub enum EntryTypes {
    Visit(Visit),
}

#[hdk_link_types]
pub enum LinkTypes {
    /// Patient -> visit
    PatientToVisits,
    /// Patient month anchor -> visit, for the calendar view
    MonthToVisits,
    /// Original visit -> each update
    VisitUpdates,
}

/// Validation for Visit entries
#[hdk_extern]
pub fn validate(op: Op) -> ExternResult<ValidateCallbackResult> {
    match op.flattened::<EntryTypes, LinkTypes>()? {
        FlatOp::StoreEntry(store_entry) => match store_entry {
            OpEntry::CreateEntry { app_entry, .. } => match app_entry {
                EntryTypes::Visit(visit) => validate_visit(&visit),
            },
            OpEntry::UpdateEntry { app_entry, .. } => match app_entry {
                EntryTypes::Visit(visit) => validate_visit(&visit),
            },
            _ => Ok(ValidateCallbackResult::Valid),
        },
        FlatOp::RegisterCreateLink { link_type, .. } => match link_type {
            LinkTypes::PatientToVisits => Ok(ValidateCallbackResult::Valid),
            LinkTypes::MonthToVisits => Ok(ValidateCallbackResult::Valid),
            LinkTypes::VisitUpdates => Ok(ValidateCallbackResult::Valid),
        },
        _ => Ok(ValidateCallbackResult::Valid),
    }
}

fn validate_visit(visit: &Visit) -> ExternResult<ValidateCallbackResult> {
    let date_check = validate_date_string(&visit.date, "date");
    if !date_check.is_valid() {
        return Ok(ValidateCallbackResult::Invalid(date_check.to_string()));
    }

    match visit.to_core(String::new()) {
        Ok(core_visit) => {
            let result = check_visit(&core_visit);
            if result.is_valid() {
                Ok(ValidateCallbackResult::Valid)
            } else {
                Ok(ValidateCallbackResult::Invalid(result.to_string()))
            }
        }
        Err(e) => Ok(ValidateCallbackResult::Invalid(e.to_string())),
    }
}
