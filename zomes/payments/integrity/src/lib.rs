//! Payments Integrity Zome
//!
//! Money received from a patient. Payments are not tied to visits; paid
//! status is derived by allocation at read time and never stored.

use hdi::prelude::*;
use visitwise_core::calendar::parse_date;
use visitwise_core::validation::{validate_date_string, validate_payment as check_payment};
use visitwise_core::{Amount, PaymentMethod};

#[hdk_entry_helper]
#[derive(Clone, PartialEq)]
pub struct Payment {
    pub patient_hash: ActionHash,
    pub amount: Amount,
    /// YYYY-MM-DD
    pub date: String,
    pub method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

impl Payment {
    pub fn to_core(&self, id: String) -> visitwise_core::Result<visitwise_core::Payment> {
        Ok(visitwise_core::Payment {
            id,
            patient_id: self.patient_hash.to_string(),
            amount: self.amount,
            date: parse_date(&self.date)?,
            method: self.method,
            notes: self.notes.clone(),
            created_at: self.created_at.as_micros(),
        })
    }

    pub fn from_core(patient_hash: ActionHash, payment: &visitwise_core::Payment) -> Self {
        Payment {
            patient_hash,
            amount: payment.amount,
            date: visitwise_core::calendar::format_date(payment.date),
            method: payment.method,
            notes: payment.notes.clone(),
            created_at: Timestamp::from_micros(payment.created_at),
        }
    }
}

#[hdk_entry_types]
#[unit_enum(UnitEntryTypes)]
pub enum EntryTypes {
    Payment(Payment),
}

#[hdk_link_types]
pub enum LinkTypes {
    PatientToPayments,
    PaymentUpdates,
}

/// Validation for Payment entries
#[hdk_extern]
pub fn validate(op: Op) -> ExternResult<ValidateCallbackResult> {
    match op.flattened::<EntryTypes, LinkTypes>()? {
        FlatOp::StoreEntry(store_entry) => match store_entry {
            OpEntry::CreateEntry { app_entry, .. } => match app_entry {
                EntryTypes::Payment(payment) => validate_payment(&payment),
            },
            OpEntry::UpdateEntry { app_entry, .. } => match app_entry {
                EntryTypes::Payment(payment) => validate_payment(&payment),
            },
            _ => Ok(ValidateCallbackResult::Valid),
        },
        FlatOp::RegisterCreateLink { link_type, .. } => match link_type {
            LinkTypes::PatientToPayments => Ok(ValidateCallbackResult::Valid),
            LinkTypes::PaymentUpdates => Ok(ValidateCallbackResult::Valid),
        },
        _ => Ok(ValidateCallbackResult::Valid),
    }
}

fn validate_payment(payment: &Payment) -> ExternResult<ValidateCallbackResult> {
    let mut result = validate_date_string(&payment.date, "date");
    if let Ok(core_payment) = payment.to_core(String::new()) {
        result.merge(check_payment(&core_payment));
    }

    if result.is_valid() {
        Ok(ValidateCallbackResult::Valid)
    } else {
        Ok(ValidateCallbackResult::Invalid(result.to_string()))
    }
}
