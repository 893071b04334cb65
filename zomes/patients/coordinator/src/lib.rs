//! Patients Coordinator Zome
//!
//! Patient directory: create, update, archive/restore, delete and search.
//! Every list is scoped to the calling practitioner's own anchor.

use hdk::prelude::*;
use patients_integrity::*;
use visitwise_core::directory::{self, PatientFilter, StatusFilter};
use visitwise_core::validation::validate_patient;
use visitwise_core::{Amount, Gender, ReminderPreferences};
use visitwise_shared::{
    core_error, decode_entry, delete_links, get_record, hash_id, latest_record, now_micros,
    practice_anchor, require_author, call_local, MediaRecord, PatientRecord,
    MEDIA_ZOME, PAYMENTS_ZOME, VISITS_ZOME,
};

const PATIENTS_ANCHOR: &str = "patients";

/// Editable patient fields, as submitted by the patient form
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PatientInput {
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
    #[serde(default)]
    pub charge_per_visit: Amount,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub reminders: ReminderPreferences,
}

impl PatientInput {
    fn apply(self, patient: &mut visitwise_core::Patient) {
        patient.name = self.name;
        patient.age = self.age;
        patient.gender = self.gender;
        patient.phone = self.phone;
        patient.address = self.address;
        patient.maps_link = self.maps_link;
        patient.charge_per_visit = self.charge_per_visit;
        patient.condition = self.condition;
        patient.protocol = self.protocol;
        patient.notes = self.notes;
        patient.reminders = self.reminders;
    }
}

/// Resolve a patient to its latest version
fn load_patient(original_hash: ActionHash) -> ExternResult<Option<PatientRecord>> {
    let Some(original) = get(original_hash.clone(), GetOptions::default())? else {
        return Ok(None);
    };
    let update_links = get_links(
        LinkQuery::try_new(original_hash.clone(), LinkTypes::PatientUpdates)?,
        GetStrategy::default(),
    )?;
    let latest = latest_record(original, update_links)?;
    let entry: Patient = decode_entry(&latest)?;

    Ok(Some(PatientRecord {
        patient: entry.to_core(hash_id(&original_hash)),
        original_hash,
        action_hash: latest.action_address().clone(),
    }))
}

fn require_patient(original_hash: ActionHash) -> ExternResult<PatientRecord> {
    load_patient(original_hash.clone())?.ok_or_else(|| {
        core_error(visitwise_core::VisitwiseError::not_found(
            "Patient",
            hash_id(&original_hash),
        ))
    })
}

/// Write a new version of a patient the caller authored
fn write_update(current: &PatientRecord, patient: &visitwise_core::Patient) -> ExternResult<PatientRecord> {
    let latest = get_record(current.action_hash.clone(), "Patient")?;
    require_author(&latest)?;
    validate_patient(patient).into_result().map_err(core_error)?;

    let updated_hash = update_entry(current.action_hash.clone(), &Patient::from_core(patient))?;
    create_link(
        current.original_hash.clone(),
        updated_hash.clone(),
        LinkTypes::PatientUpdates,
        (),
    )?;

    Ok(PatientRecord {
        original_hash: current.original_hash.clone(),
        action_hash: updated_hash,
        patient: patient.clone(),
    })
}

/// Create a new patient in the caller's directory
#[hdk_extern]
pub fn create_patient(input: PatientInput) -> ExternResult<PatientRecord> {
    let now = now_micros()?;
    let mut patient = visitwise_core::Patient::new(String::new(), String::new(), 0);
    input.apply(&mut patient);
    patient.created_at = now;
    patient.updated_at = now;
    validate_patient(&patient).into_result().map_err(core_error)?;

    let patient_hash = create_entry(&EntryTypes::Patient(Patient::from_core(&patient)))?;
    create_link(
        practice_anchor(PATIENTS_ANCHOR)?,
        patient_hash.clone(),
        LinkTypes::PracticeToPatients,
        (),
    )?;
    debug!("Created patient {}", patient_hash);

    patient.id = hash_id(&patient_hash);
    Ok(PatientRecord {
        original_hash: patient_hash.clone(),
        action_hash: patient_hash,
        patient,
    })
}

/// Get the latest version of a patient
#[hdk_extern]
pub fn get_patient(original_hash: ActionHash) -> ExternResult<Option<PatientRecord>> {
    load_patient(original_hash)
}

/// Input for updating a patient
#[derive(Serialize, Deserialize, Debug)]
pub struct UpdatePatientInput {
    pub original_hash: ActionHash,
    pub updated_patient: PatientInput,
}

/// Replace a patient's editable fields; status and creation time are kept
#[hdk_extern]
pub fn update_patient(input: UpdatePatientInput) -> ExternResult<PatientRecord> {
    let current = require_patient(input.original_hash)?;
    let mut patient = current.patient.clone();
    input.updated_patient.apply(&mut patient);
    patient.updated_at = now_micros()?.max(patient.created_at);
    write_update(&current, &patient)
}

/// Hide a patient from the active directory; history is kept
#[hdk_extern]
pub fn archive_patient(original_hash: ActionHash) -> ExternResult<PatientRecord> {
    let current = require_patient(original_hash)?;
    if !current.patient.is_active {
        return Ok(current);
    }
    let mut patient = current.patient.clone();
    directory::archive(&mut patient, now_micros()?);
    write_update(&current, &patient)
}

#[hdk_extern]
pub fn restore_patient(original_hash: ActionHash) -> ExternResult<PatientRecord> {
    let current = require_patient(original_hash)?;
    if current.patient.is_active {
        return Ok(current);
    }
    let mut patient = current.patient.clone();
    directory::restore(&mut patient, now_micros()?);
    write_update(&current, &patient)
}

/// What a patient deletion removed
#[derive(Serialize, Deserialize, Debug)]
pub struct DeletePatientOutput {
    pub deleted: ActionHash,
    pub visits_removed: usize,
    pub payments_removed: usize,
    /// Object-storage paths the client must remove
    pub media_storage_paths: Vec<String>,
}

/// Delete a patient together with their visits, payments and media metadata
#[hdk_extern]
pub fn delete_patient(original_hash: ActionHash) -> ExternResult<DeletePatientOutput> {
    let original = get_record(original_hash.clone(), "Patient")?;
    require_author(&original)?;

    let visits_removed: usize = call_local(VISITS_ZOME, "delete_patient_visits", &original_hash)?;
    let payments_removed: usize = call_local(PAYMENTS_ZOME, "delete_patient_payments", &original_hash)?;
    let removed_media: Vec<MediaRecord> = call_local(MEDIA_ZOME, "delete_patient_media", &original_hash)?;
    let media_storage_paths = removed_media
        .into_iter()
        .filter_map(|record| record.media.storage_path)
        .collect();

    let directory_links: Vec<Link> = get_links(
        LinkQuery::try_new(practice_anchor(PATIENTS_ANCHOR)?, LinkTypes::PracticeToPatients)?,
        GetStrategy::default(),
    )?
    .into_iter()
    .filter(|link| link.target.clone().into_action_hash().as_ref() == Some(&original_hash))
    .collect();
    delete_links(directory_links)?;

    let deleted = delete_entry(original_hash.clone())?;
    debug!(
        "Deleted patient {} ({} visits, {} payments)",
        original_hash, visits_removed, payments_removed
    );

    Ok(DeletePatientOutput {
        deleted,
        visits_removed,
        payments_removed,
        media_storage_paths,
    })
}

fn all_patients() -> ExternResult<Vec<PatientRecord>> {
    let links = get_links(
        LinkQuery::try_new(practice_anchor(PATIENTS_ANCHOR)?, LinkTypes::PracticeToPatients)?,
        GetStrategy::default(),
    )?;

    let mut patients = Vec::new();
    for link in links {
        if let Some(hash) = link.target.into_action_hash() {
            if let Some(record) = load_patient(hash)? {
                patients.push(record);
            }
        }
    }
    Ok(patients)
}

/// Apply a directory filter, keeping the core sort order (by name)
fn filtered(records: Vec<PatientRecord>, filter: &PatientFilter) -> Vec<PatientRecord> {
    let patients: Vec<visitwise_core::Patient> = records.iter().map(|r| r.patient.clone()).collect();
    directory::filter_patients(&patients, filter)
        .into_iter()
        .filter_map(|matched| records.iter().find(|r| r.patient.id == matched.id).cloned())
        .collect()
}

/// Every patient in the caller's directory, active or archived
#[hdk_extern]
pub fn get_all_patients(_: ()) -> ExternResult<Vec<PatientRecord>> {
    let filter = PatientFilter {
        status: StatusFilter::All,
        ..PatientFilter::default()
    };
    Ok(filtered(all_patients()?, &filter))
}

#[hdk_extern]
pub fn get_active_patients(_: ()) -> ExternResult<Vec<PatientRecord>> {
    Ok(filtered(all_patients()?, &PatientFilter::default()))
}

/// Search by name, phone or condition within a status
#[hdk_extern]
pub fn search_patients(filter: PatientFilter) -> ExternResult<Vec<PatientRecord>> {
    Ok(filtered(all_patients()?, &filter))
}

/// Active and archived counts for the directory tabs
#[hdk_extern]
pub fn get_directory_counts(_: ()) -> ExternResult<directory::DirectoryCounts> {
    let patients: Vec<visitwise_core::Patient> = all_patients()?.into_iter().map(|r| r.patient).collect();
    Ok(directory::directory_counts(&patients))
}
