//! Visits Coordinator Zome
//!
//! Per-patient visit calendar. A patient has at most one visit per day;
//! the check runs against the patient's current visits before every write.

use hdk::prelude::*;
use visits_integrity::*;
use visitwise_core::calendar::{parse_date, YearMonth};
use visitwise_core::validation::validate_visit;
use visitwise_core::visit_log::{self, mark_visited, VisitToggle};
use visitwise_core::{Amount, VisitwiseError};
use visitwise_shared::{
    call_local, core_error, decode_entry, delete_links, get_record, hash_id, latest_record,
    now_micros, patient_month_anchor, require_author, require_patient_author, PatientMonthInput, PatientRecord,
    VisitRecord, PATIENTS_ZOME,
};

const VISITS_ANCHOR: &str = "visits";

/// A visit with the patient hash its links hang off
#[derive(Clone, Debug)]
struct LoadedVisit {
    record: VisitRecord,
    patient_hash: ActionHash,
}

fn load_visit(original_hash: ActionHash) -> ExternResult<Option<LoadedVisit>> {
    let Some(original) = get(original_hash.clone(), GetOptions::default())? else {
        return Ok(None);
    };
    let update_links = get_links(
        LinkQuery::try_new(original_hash.clone(), LinkTypes::VisitUpdates)?,
        GetStrategy::default(),
    )?;
    let latest = latest_record(original, update_links)?;
    let entry: Visit = decode_entry(&latest)?;

    Ok(Some(LoadedVisit {
        record: VisitRecord {
            visit: entry.to_core(hash_id(&original_hash)).map_err(core_error)?,
            original_hash,
            action_hash: latest.action_address().clone(),
        },
        patient_hash: entry.patient_hash,
    }))
}

fn require_visit(original_hash: ActionHash) -> ExternResult<LoadedVisit> {
    load_visit(original_hash.clone())?
        .ok_or_else(|| core_error(VisitwiseError::not_found("Visit", hash_id(&original_hash))))
}

fn load_linked(links: Vec<Link>) -> ExternResult<Vec<LoadedVisit>> {
    let mut visits = Vec::new();
    for link in links {
        if let Some(hash) = link.target.into_action_hash() {
            if let Some(visit) = load_visit(hash)? {
                visits.push(visit);
            }
        }
    }
    visits.sort_by_key(|v| v.record.visit.date);
    Ok(visits)
}

fn patient_visit_links(patient_hash: &ActionHash) -> ExternResult<Vec<Link>> {
    get_links(
        LinkQuery::try_new(patient_hash.clone(), LinkTypes::PatientToVisits)?,
        GetStrategy::default(),
    )
}

fn month_visit_links(patient_hash: &ActionHash, month: YearMonth) -> ExternResult<Vec<Link>> {
    get_links(
        LinkQuery::try_new(patient_month_anchor(VISITS_ANCHOR, patient_hash, month)?, LinkTypes::MonthToVisits)?,
        GetStrategy::default(),
    )
}

fn links_targeting(links: Vec<Link>, target: &ActionHash) -> Vec<Link> {
    links
        .into_iter()
        .filter(|link| link.target.clone().into_action_hash().as_ref() == Some(target))
        .collect()
}

fn require_patient(patient_hash: &ActionHash) -> ExternResult<PatientRecord> {
    let patient: Option<PatientRecord> = call_local(PATIENTS_ZOME, "get_patient", patient_hash)?;
    patient.ok_or_else(|| core_error(VisitwiseError::not_found("Patient", hash_id(patient_hash))))
}

/// Create the entry and its patient/month index links
fn write_visit(patient_hash: ActionHash, visit: visitwise_core::Visit) -> ExternResult<VisitRecord> {
    validate_visit(&visit).into_result().map_err(core_error)?;
    let visit_hash = create_entry(&EntryTypes::Visit(Visit::from_core(patient_hash.clone(), &visit)))?;

    create_link(patient_hash.clone(), visit_hash.clone(), LinkTypes::PatientToVisits, ())?;
    create_link(
        patient_month_anchor(VISITS_ANCHOR, &patient_hash, YearMonth::from_date(visit.date))?,
        visit_hash.clone(),
        LinkTypes::MonthToVisits,
        (),
    )?;
    debug!("Logged visit {} on {}", visit_hash, visit.date);

    Ok(VisitRecord {
        original_hash: visit_hash.clone(),
        action_hash: visit_hash.clone(),
        visit: visitwise_core::Visit {
            id: hash_id(&visit_hash),
            ..visit
        },
    })
}

fn remove_visit(loaded: &LoadedVisit) -> ExternResult<ActionHash> {
    let original_hash = &loaded.record.original_hash;
    let month = YearMonth::from_date(loaded.record.visit.date);
    delete_links(links_targeting(patient_visit_links(&loaded.patient_hash)?, original_hash))?;
    delete_links(links_targeting(month_visit_links(&loaded.patient_hash, month)?, original_hash))?;
    delete_entry(original_hash.clone())
}

fn default_completed() -> bool {
    true
}

/// Input for logging a visit
#[derive(Serialize, Deserialize, Debug)]
pub struct LogVisitInput {
    pub patient_hash: ActionHash,
    /// YYYY-MM-DD
    pub date: String,
    /// Defaults to the patient's current charge_per_visit
    #[serde(default)]
    pub charge: Option<Amount>,
    #[serde(default = "default_completed")]
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Log a visit; fails with a conflict if the patient already has one that day
#[hdk_extern]
pub fn log_visit(input: LogVisitInput) -> ExternResult<VisitRecord> {
    let patient = require_patient(&input.patient_hash)?;
    let date = parse_date(&input.date).map_err(core_error)?;
    let existing: Vec<visitwise_core::Visit> = load_linked(patient_visit_links(&input.patient_hash)?)?
        .into_iter()
        .map(|v| v.record.visit)
        .collect();

    let mut visit = mark_visited(&existing, &patient.patient, date, input.charge, now_micros()?)
        .map_err(core_error)?;
    visit.completed = input.completed;
    visit.notes = input.notes;

    write_visit(input.patient_hash, visit)
}

/// Result of tapping a calendar day
#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type", content = "content")]
pub enum ToggleVisitOutput {
    Added(VisitRecord),
    Removed(ActionHash),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ToggleVisitInput {
    pub patient_hash: ActionHash,
    pub date: String,
}

/// Mark a day visited, or undo the visit already on that day
#[hdk_extern]
pub fn toggle_visit(input: ToggleVisitInput) -> ExternResult<ToggleVisitOutput> {
    let patient = require_patient(&input.patient_hash)?;
    let date = parse_date(&input.date).map_err(core_error)?;
    let loaded = load_linked(patient_visit_links(&input.patient_hash)?)?;
    let mut visits: Vec<visitwise_core::Visit> = loaded.iter().map(|v| v.record.visit.clone()).collect();

    match visit_log::toggle_visit(&mut visits, &patient.patient, date, now_micros()?) {
        VisitToggle::Added(visit) => Ok(ToggleVisitOutput::Added(write_visit(input.patient_hash, visit)?)),
        VisitToggle::Removed(visit) => {
            let target = loaded
                .iter()
                .find(|v| v.record.visit.id == visit.id)
                .ok_or_else(|| core_error(VisitwiseError::not_found("Visit", visit.id.clone())))?;
            require_author(&get_record(target.record.action_hash.clone(), "Visit")?)?;
            remove_visit(target)?;
            Ok(ToggleVisitOutput::Removed(target.record.original_hash.clone()))
        }
    }
}

#[hdk_extern]
pub fn get_visit(original_hash: ActionHash) -> ExternResult<Option<VisitRecord>> {
    Ok(load_visit(original_hash)?.map(|v| v.record))
}

/// Input for editing a visit
#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateVisitInput {
    pub original_hash: ActionHash,
    pub date: String,
    pub charge: Amount,
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Edit a visit; moving it onto a day that already has a visit is rejected
#[hdk_extern]
pub fn update_visit(input: UpdateVisitInput) -> ExternResult<VisitRecord> {
    let current = require_visit(input.original_hash.clone())?;
    require_author(&get_record(current.record.action_hash.clone(), "Visit")?)?;

    let updated = visitwise_core::Visit {
        date: parse_date(&input.date).map_err(core_error)?,
        charge: input.charge,
        completed: input.completed,
        notes: input.notes,
        ..current.record.visit.clone()
    };
    validate_visit(&updated).into_result().map_err(core_error)?;

    let mut siblings: Vec<visitwise_core::Visit> = load_linked(patient_visit_links(&current.patient_hash)?)?
        .into_iter()
        .map(|v| v.record.visit)
        .collect();
    visit_log::update_visit(&mut siblings, updated.clone()).map_err(core_error)?;

    let updated_hash = update_entry(
        current.record.action_hash.clone(),
        &Visit::from_core(current.patient_hash.clone(), &updated),
    )?;
    create_link(
        input.original_hash.clone(),
        updated_hash.clone(),
        LinkTypes::VisitUpdates,
        (),
    )?;

    // Re-index when the visit moves to another month
    let old_month = YearMonth::from_date(current.record.visit.date);
    let new_month = YearMonth::from_date(updated.date);
    if old_month != new_month {
        delete_links(links_targeting(
            month_visit_links(&current.patient_hash, old_month)?,
            &input.original_hash,
        ))?;
        create_link(
            patient_month_anchor(VISITS_ANCHOR, &current.patient_hash, new_month)?,
            input.original_hash.clone(),
            LinkTypes::MonthToVisits,
            (),
        )?;
    }

    Ok(VisitRecord {
        original_hash: input.original_hash,
        action_hash: updated_hash,
        visit: updated,
    })
}

#[hdk_extern]
pub fn delete_visit(original_hash: ActionHash) -> ExternResult<ActionHash> {
    let current = require_visit(original_hash)?;
    require_author(&get_record(current.record.action_hash.clone(), "Visit")?)?;
    remove_visit(&current)
}

/// All of a patient's visits, oldest first
#[hdk_extern]
pub fn get_patient_visits(patient_hash: ActionHash) -> ExternResult<Vec<VisitRecord>> {
    Ok(load_linked(patient_visit_links(&patient_hash)?)?
        .into_iter()
        .map(|v| v.record)
        .collect())
}

/// A patient's visits inside one calendar month, oldest first
#[hdk_extern]
pub fn get_patient_visits_in_month(input: PatientMonthInput) -> ExternResult<Vec<VisitRecord>> {
    Ok(load_linked(month_visit_links(&input.patient_hash, input.month)?)?
        .into_iter()
        .map(|v| v.record)
        .filter(|r| input.month.contains(r.visit.date))
        .collect())
}

/// Remove every visit of a patient (patient deletion); returns the count
#[hdk_extern]
pub fn delete_patient_visits(patient_hash: ActionHash) -> ExternResult<usize> {
    require_patient_author(&patient_hash)?;
    let visits = load_linked(patient_visit_links(&patient_hash)?)?;
    for visit in &visits {
        remove_visit(visit)?;
    }
    Ok(visits.len())
}
