//! Patient directory: filtering, search and archive transitions

use serde::{Deserialize, Serialize};

use crate::model::Patient;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Active,
    Archived,
    All,
}

impl StatusFilter {
    fn matches(&self, patient: &Patient) -> bool {
        match self {
            StatusFilter::Active => patient.is_active,
            StatusFilter::Archived => !patient.is_active,
            StatusFilter::All => true,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientFilter {
    pub status: StatusFilter,
    /// Case-insensitive match against name, phone and condition
    pub query: Option<String>,
}

impl PatientFilter {
    pub fn search(query: impl Into<String>) -> Self {
        PatientFilter {
            status: StatusFilter::All,
            query: Some(query.into()),
        }
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        if !self.status.matches(patient) {
            return false;
        }
        let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
            return true;
        };
        let needle = query.to_lowercase();
        let digits: String = needle.chars().filter(|c| c.is_ascii_digit()).collect();

        patient.name.to_lowercase().contains(&needle)
            || patient
                .condition
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
            || (!digits.is_empty()
                && patient.phone.as_deref().is_some_and(|phone| {
                    phone
                        .chars()
                        .filter(|c| c.is_ascii_digit())
                        .collect::<String>()
                        .contains(&digits)
                }))
    }
}

/// Matching patients sorted by name
pub fn filter_patients<'a>(patients: &'a [Patient], filter: &PatientFilter) -> Vec<&'a Patient> {
    let mut matches: Vec<&Patient> = patients.iter().filter(|p| filter.matches(p)).collect();
    matches.sort_by_cached_key(|p| p.name.to_lowercase());
    matches
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryCounts {
    pub active: usize,
    pub archived: usize,
}

pub fn directory_counts(patients: &[Patient]) -> DirectoryCounts {
    patients.iter().fold(DirectoryCounts::default(), |mut counts, p| {
        if p.is_active {
            counts.active += 1;
        } else {
            counts.archived += 1;
        }
        counts
    })
}

/// Archive (soft delete); history is kept. `updated_at` never precedes
/// `created_at`, even with a skewed clock.
pub fn archive(patient: &mut Patient, now: i64) {
    patient.is_active = false;
    patient.updated_at = now.max(patient.created_at);
}

pub fn restore(patient: &mut Patient, now: i64) {
    patient.is_active = true;
    patient.updated_at = now.max(patient.created_at);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Vec<Patient> {
        let mut asha = Patient::new("p1", "Asha Rao", 500);
        asha.phone = Some("+91 98765-43210".to_string());
        asha.condition = Some("Post-op knee".to_string());

        let mut ravi = Patient::new("p2", "ravi kumar", 400);
        ravi.condition = Some("Frozen shoulder".to_string());

        let mut meena = Patient::new("p3", "Meena", 300);
        meena.is_active = false;

        vec![ravi, meena, asha]
    }

    #[test]
    fn test_active_filter_sorted_by_name() {
        let patients = directory();
        let active = filter_patients(&patients, &PatientFilter::default());
        let names: Vec<&str> = active.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Asha Rao", "ravi kumar"]);
    }

    #[test]
    fn test_archived_filter() {
        let patients = directory();
        let filter = PatientFilter {
            status: StatusFilter::Archived,
            query: None,
        };
        let archived = filter_patients(&patients, &filter);
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, "p3");
    }

    #[test]
    fn test_search_by_name_condition_and_phone() {
        let patients = directory();

        assert_eq!(filter_patients(&patients, &PatientFilter::search("RAVI"))[0].id, "p2");
        assert_eq!(filter_patients(&patients, &PatientFilter::search("knee"))[0].id, "p1");
        assert_eq!(filter_patients(&patients, &PatientFilter::search("98765 432"))[0].id, "p1");
        assert!(filter_patients(&patients, &PatientFilter::search("zzz")).is_empty());
        assert_eq!(filter_patients(&patients, &PatientFilter::search("  ")).len(), 3);
    }

    #[test]
    fn test_archive_and_restore() {
        let mut patients = directory();
        archive(&mut patients[0], 42);
        assert!(!patients[0].is_active);
        assert_eq!(patients[0].updated_at, 42);
        assert_eq!(directory_counts(&patients), DirectoryCounts { active: 1, archived: 2 });

        restore(&mut patients[0], 43);
        assert!(patients[0].is_active);
        assert_eq!(directory_counts(&patients).active, 2);
    }

    #[test]
    fn test_status_change_never_predates_creation() {
        let mut patient = Patient::new("p9", "Kavya", 600);
        patient.created_at = 1_000;

        archive(&mut patient, 400);
        assert_eq!(patient.updated_at, 1_000);
        restore(&mut patient, 2_000);
        assert_eq!(patient.updated_at, 2_000);
    }
}
