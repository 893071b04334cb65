//! Payments Coordinator Zome
//!
//! Payment ledger plus the billing views built on it. Paid/unpaid status
//! and earnings are recomputed from the patient's current visits and
//! payments on every call; nothing derived is written back.

use std::collections::BTreeMap;

use hdk::prelude::*;
use payments_integrity::*;
use visitwise_core::calendar::{parse_date, YearMonth};
use visitwise_core::ledger::{payments_in_month, payments_newest_first, totals_by_method};
use visitwise_core::validation::validate_payment;
use visitwise_core::{
    allocate_payments, patient_summary, practice_totals, Allocation, Amount, EarningsTotals,
    EarningsWindow, PatientLedger, PatientSummary, PaymentMethod, VisitwiseError,
};
use visitwise_shared::{
    call_local, core_error, decode_entry, delete_links, get_record, hash_id, latest_record,
    now_micros, require_author, require_patient_author, PatientMonthInput, PatientRecord, PaymentRecord, VisitRecord,
    PATIENTS_ZOME, VISITS_ZOME,
};

#[derive(Clone, Debug)]
struct LoadedPayment {
    record: PaymentRecord,
    patient_hash: ActionHash,
}

fn load_payment(original_hash: ActionHash) -> ExternResult<Option<LoadedPayment>> {
    let Some(original) = get(original_hash.clone(), GetOptions::default())? else {
        return Ok(None);
    };
    let update_links = get_links(
        LinkQuery::try_new(original_hash.clone(), LinkTypes::PaymentUpdates)?,
        GetStrategy::default(),
    )?;
    let latest = latest_record(original, update_links)?;
    let entry: Payment = decode_entry(&latest)?;

    Ok(Some(LoadedPayment {
        record: PaymentRecord {
            payment: entry.to_core(hash_id(&original_hash)).map_err(core_error)?,
            original_hash,
            action_hash: latest.action_address().clone(),
        },
        patient_hash: entry.patient_hash,
    }))
}

fn require_payment(original_hash: ActionHash) -> ExternResult<LoadedPayment> {
    load_payment(original_hash.clone())?
        .ok_or_else(|| core_error(VisitwiseError::not_found("Payment", hash_id(&original_hash))))
}

fn patient_payment_links(patient_hash: &ActionHash) -> ExternResult<Vec<Link>> {
    get_links(
        LinkQuery::try_new(patient_hash.clone(), LinkTypes::PatientToPayments)?,
        GetStrategy::default(),
    )
}

fn load_patient_payments(patient_hash: &ActionHash) -> ExternResult<Vec<LoadedPayment>> {
    let mut payments = Vec::new();
    for link in patient_payment_links(patient_hash)? {
        if let Some(hash) = link.target.into_action_hash() {
            if let Some(payment) = load_payment(hash)? {
                payments.push(payment);
            }
        }
    }
    Ok(payments)
}

fn require_patient(patient_hash: &ActionHash) -> ExternResult<PatientRecord> {
    let patient: Option<PatientRecord> = call_local(PATIENTS_ZOME, "get_patient", patient_hash)?;
    patient.ok_or_else(|| core_error(VisitwiseError::not_found("Patient", hash_id(patient_hash))))
}

fn patient_visits(patient_hash: &ActionHash) -> ExternResult<Vec<visitwise_core::Visit>> {
    let visits: Vec<VisitRecord> = call_local(VISITS_ZOME, "get_patient_visits", patient_hash)?;
    Ok(visits.into_iter().map(|r| r.visit).collect())
}

fn remove_payment(loaded: &LoadedPayment) -> ExternResult<ActionHash> {
    let original_hash = &loaded.record.original_hash;
    let links: Vec<Link> = patient_payment_links(&loaded.patient_hash)?
        .into_iter()
        .filter(|link| link.target.clone().into_action_hash().as_ref() == Some(original_hash))
        .collect();
    delete_links(links)?;
    delete_entry(original_hash.clone())
}

/// Input for recording a payment
#[derive(Serialize, Deserialize, Debug)]
pub struct RecordPaymentInput {
    pub patient_hash: ActionHash,
    pub amount: Amount,
    /// YYYY-MM-DD
    pub date: String,
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

#[hdk_extern]
pub fn record_payment(input: RecordPaymentInput) -> ExternResult<PaymentRecord> {
    let patient = require_patient(&input.patient_hash)?;
    let mut payment = visitwise_core::Payment::new(
        String::new(),
        patient.patient.id,
        input.amount,
        parse_date(&input.date).map_err(core_error)?,
        input.method,
    );
    payment.notes = input.notes;
    payment.created_at = now_micros()?;
    validate_payment(&payment).into_result().map_err(core_error)?;

    let payment_hash = create_entry(&EntryTypes::Payment(Payment::from_core(
        input.patient_hash.clone(),
        &payment,
    )))?;
    create_link(
        input.patient_hash,
        payment_hash.clone(),
        LinkTypes::PatientToPayments,
        (),
    )?;
    debug!("Recorded payment {} of {}", payment_hash, payment.amount);

    payment.id = hash_id(&payment_hash);
    Ok(PaymentRecord {
        original_hash: payment_hash.clone(),
        action_hash: payment_hash,
        payment,
    })
}

/// Input for editing a payment
#[derive(Serialize, Deserialize, Debug)]
pub struct UpdatePaymentInput {
    pub original_hash: ActionHash,
    pub amount: Amount,
    pub date: String,
    pub method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Edit a payment. Paid status of every visit may change as a result.
#[hdk_extern]
pub fn update_payment(input: UpdatePaymentInput) -> ExternResult<PaymentRecord> {
    let current = require_payment(input.original_hash.clone())?;
    require_author(&get_record(current.record.action_hash.clone(), "Payment")?)?;

    let updated = visitwise_core::Payment {
        amount: input.amount,
        date: parse_date(&input.date).map_err(core_error)?,
        method: input.method,
        notes: input.notes,
        ..current.record.payment.clone()
    };
    validate_payment(&updated).into_result().map_err(core_error)?;

    let updated_hash = update_entry(
        current.record.action_hash.clone(),
        &Payment::from_core(current.patient_hash.clone(), &updated),
    )?;
    create_link(
        input.original_hash.clone(),
        updated_hash.clone(),
        LinkTypes::PaymentUpdates,
        (),
    )?;

    Ok(PaymentRecord {
        original_hash: input.original_hash,
        action_hash: updated_hash,
        payment: updated,
    })
}

#[hdk_extern]
pub fn delete_payment(original_hash: ActionHash) -> ExternResult<ActionHash> {
    let current = require_payment(original_hash)?;
    require_author(&get_record(current.record.action_hash.clone(), "Payment")?)?;
    remove_payment(&current)
}

/// A patient's payments, newest first
#[hdk_extern]
pub fn get_patient_payments(patient_hash: ActionHash) -> ExternResult<Vec<PaymentRecord>> {
    let loaded = load_patient_payments(&patient_hash)?;
    let payments: Vec<visitwise_core::Payment> = loaded.iter().map(|p| p.record.payment.clone()).collect();

    Ok(payments_newest_first(&payments, &hash_id(&patient_hash))
        .into_iter()
        .filter_map(|p| loaded.iter().find(|l| l.record.payment.id == p.id))
        .map(|l| l.record.clone())
        .collect())
}

/// Paid/unpaid status per completed visit, with all-time totals
#[derive(Serialize, Deserialize, Debug)]
pub struct PaymentStatusOutput {
    pub patient_hash: ActionHash,
    pub allocation: Allocation,
    pub totals: EarningsTotals,
}

#[hdk_extern]
pub fn get_patient_payment_status(patient_hash: ActionHash) -> ExternResult<PaymentStatusOutput> {
    let patient = require_patient(&patient_hash)?;
    let visits = patient_visits(&patient_hash)?;
    let payments: Vec<visitwise_core::Payment> = load_patient_payments(&patient_hash)?
        .into_iter()
        .map(|p| p.record.payment)
        .collect();

    let ledger = PatientLedger::new(&patient.patient, &visits, &payments);
    let allocation = allocate_payments(
        ledger.visits.iter().copied(),
        ledger.payments.iter().copied(),
        patient.patient.charge_per_visit,
    );
    let totals = ledger.totals(EarningsWindow::AllTime);

    Ok(PaymentStatusOutput {
        patient_hash,
        allocation,
        totals,
    })
}

/// All-time summary row for one patient
#[hdk_extern]
pub fn get_patient_billing_summary(patient_hash: ActionHash) -> ExternResult<PatientSummary> {
    let patient = require_patient(&patient_hash)?;
    let visits = patient_visits(&patient_hash)?;
    let payments: Vec<visitwise_core::Payment> = load_patient_payments(&patient_hash)?
        .into_iter()
        .map(|p| p.record.payment)
        .collect();

    Ok(patient_summary(&PatientLedger::new(&patient.patient, &visits, &payments)))
}

/// Home-screen card for one calendar month
#[derive(Serialize, Deserialize, Debug)]
pub struct PracticeMonthTotals {
    pub month: YearMonth,
    pub totals: EarningsTotals,
    pub collected_by_method: BTreeMap<PaymentMethod, Amount>,
}

/// Earnings and collections dated inside `month`, across every patient
#[hdk_extern]
pub fn get_practice_month_totals(month: YearMonth) -> ExternResult<PracticeMonthTotals> {
    let patients: Vec<PatientRecord> = call_local(PATIENTS_ZOME, "get_all_patients", &())?;

    let mut visits: Vec<visitwise_core::Visit> = Vec::new();
    let mut payments: Vec<visitwise_core::Payment> = Vec::new();
    for patient in &patients {
        let in_month: Vec<VisitRecord> = call_local(
            VISITS_ZOME,
            "get_patient_visits_in_month",
            &PatientMonthInput {
                patient_hash: patient.original_hash.clone(),
                month,
            },
        )?;
        visits.extend(in_month.into_iter().map(|r| r.visit));
        payments.extend(
            load_patient_payments(&patient.original_hash)?
                .into_iter()
                .map(|p| p.record.payment),
        );
    }

    let ledgers: Vec<PatientLedger<'_>> = patients
        .iter()
        .map(|p| PatientLedger::new(&p.patient, &visits, &payments))
        .collect();
    let totals = practice_totals(&ledgers, EarningsWindow::Month(month));

    Ok(PracticeMonthTotals {
        month,
        totals,
        collected_by_method: totals_by_method(payments_in_month(&payments, month)),
    })
}

/// Remove every payment of a patient (patient deletion); returns the count
#[hdk_extern]
pub fn delete_patient_payments(patient_hash: ActionHash) -> ExternResult<usize> {
    require_patient_author(&patient_hash)?;
    let payments = load_patient_payments(&patient_hash)?;
    for payment in &payments {
        remove_payment(payment)?;
    }
    Ok(payments.len())
}
