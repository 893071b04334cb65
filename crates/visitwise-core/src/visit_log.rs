//! Per-patient visit calendar
//!
//! A patient has at most one visit per calendar day. The practitioner taps
//! a day to mark it visited and taps it again to undo.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

use crate::calendar::YearMonth;
use crate::error::VisitwiseError;
use crate::model::{Amount, Patient, Visit};

/// Stable id for a patient's visit on a given day
pub fn visit_id_for(patient_id: &str, date: NaiveDate) -> String {
    format!("{}-{}", patient_id, date.format("%Y%m%d"))
}

pub fn visit_on<'a>(visits: &'a [Visit], patient_id: &str, date: NaiveDate) -> Option<&'a Visit> {
    visits
        .iter()
        .find(|v| v.patient_id == patient_id && v.date == date)
}

/// Create a completed visit for `date`.
///
/// `charge` of `None` records the visit at the patient's current
/// `charge_per_visit`, pinning the price in effect on that day.
pub fn mark_visited(
    visits: &[Visit],
    patient: &Patient,
    date: NaiveDate,
    charge: Option<Amount>,
    now: i64,
) -> crate::Result<Visit> {
    if visit_on(visits, &patient.id, date).is_some() {
        return Err(VisitwiseError::DuplicateVisit {
            patient_id: patient.id.clone(),
            date,
        });
    }

    Ok(Visit {
        id: visit_id_for(&patient.id, date),
        patient_id: patient.id.clone(),
        date,
        completed: true,
        charge: charge.unwrap_or(patient.charge_per_visit),
        notes: None,
        created_at: now,
    })
}

#[derive(Clone, Debug, PartialEq)]
pub enum VisitToggle {
    Added(Visit),
    Removed(Visit),
}

/// Add a visit on `date`, or remove the one already there
pub fn toggle_visit(visits: &mut Vec<Visit>, patient: &Patient, date: NaiveDate, now: i64) -> VisitToggle {
    if let Some(index) = visits
        .iter()
        .position(|v| v.patient_id == patient.id && v.date == date)
    {
        let removed = visits.remove(index);
        log::debug!("Removed visit {} for {}", removed.id, patient.id);
        return VisitToggle::Removed(removed);
    }

    let visit = Visit {
        id: visit_id_for(&patient.id, date),
        patient_id: patient.id.clone(),
        date,
        completed: true,
        charge: patient.charge_per_visit,
        notes: None,
        created_at: now,
    };
    visits.push(visit.clone());
    log::debug!("Added visit {} for {}", visit.id, patient.id);
    VisitToggle::Added(visit)
}

/// The patient's visits inside `month`, oldest first
pub fn visits_in_month<'a>(visits: &'a [Visit], patient_id: &str, month: YearMonth) -> Vec<&'a Visit> {
    let mut in_month: Vec<&Visit> = visits
        .iter()
        .filter(|v| v.patient_id == patient_id && month.contains(v.date))
        .collect();
    in_month.sort_by_key(|v| v.date);
    in_month
}

/// Day-of-month numbers that carry a completed visit
pub fn visited_days(visits: &[Visit], patient_id: &str, month: YearMonth) -> BTreeSet<u32> {
    visits_in_month(visits, patient_id, month)
        .into_iter()
        .filter(|v| v.completed)
        .map(|v| v.date.day())
        .collect()
}

/// Replace a visit by id
pub fn update_visit(visits: &mut [Visit], updated: Visit) -> crate::Result<()> {
    if let Some(clash) = visits
        .iter()
        .find(|v| v.id != updated.id && v.patient_id == updated.patient_id && v.date == updated.date)
    {
        return Err(VisitwiseError::DuplicateVisit {
            patient_id: clash.patient_id.clone(),
            date: clash.date,
        });
    }
    let slot = visits
        .iter_mut()
        .find(|v| v.id == updated.id)
        .ok_or_else(|| VisitwiseError::not_found("Visit", updated.id.clone()))?;
    *slot = updated;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(month: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, d).unwrap()
    }

    #[test]
    fn test_mark_visited_rejects_second_visit_same_day() {
        let patient = Patient::new("p1", "Asha", 500);
        let first = mark_visited(&[], &patient, day(1, 3), None, 1).unwrap();
        assert_eq!(first.id, "p1-20240103");
        assert_eq!(first.charge, 500);
        assert!(first.completed);

        let err = mark_visited(&[first], &patient, day(1, 3), Some(700), 2).unwrap_err();
        assert!(matches!(err, VisitwiseError::DuplicateVisit { .. }));
    }

    #[test]
    fn test_same_day_for_another_patient_is_fine() {
        let asha = Patient::new("p1", "Asha", 500);
        let ravi = Patient::new("p2", "Ravi", 400);
        let first = mark_visited(&[], &asha, day(1, 3), None, 1).unwrap();
        assert!(mark_visited(&[first], &ravi, day(1, 3), None, 1).is_ok());
    }

    #[test]
    fn test_toggle_visit() {
        let patient = Patient::new("p1", "Asha", 500);
        let mut visits = Vec::new();

        assert!(matches!(
            toggle_visit(&mut visits, &patient, day(1, 5), 1),
            VisitToggle::Added(_)
        ));
        assert_eq!(visits.len(), 1);

        assert!(matches!(
            toggle_visit(&mut visits, &patient, day(1, 5), 2),
            VisitToggle::Removed(_)
        ));
        assert!(visits.is_empty());
    }

    #[test]
    fn test_visits_in_month_and_days() {
        let visits = vec![
            Visit::completed("a", "p1", day(1, 20), 0),
            Visit::completed("b", "p1", day(1, 2), 0),
            Visit::scheduled("c", "p1", day(1, 28), 0),
            Visit::completed("d", "p1", day(2, 1), 0),
            Visit::completed("e", "p2", day(1, 9), 0),
        ];
        let jan = YearMonth::new(2024, 1).unwrap();

        let ids: Vec<&str> = visits_in_month(&visits, "p1", jan).iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        let days: Vec<u32> = visited_days(&visits, "p1", jan).into_iter().collect();
        assert_eq!(days, vec![2, 20]);
    }

    #[test]
    fn test_update_visit() {
        let mut visits = vec![
            Visit::completed("a", "p1", day(1, 2), 0),
            Visit::completed("b", "p1", day(1, 3), 0),
        ];

        let mut edited = visits[0].clone();
        edited.charge = 650;
        update_visit(&mut visits, edited).unwrap();
        assert_eq!(visits[0].charge, 650);

        let mut moved = visits[0].clone();
        moved.date = day(1, 3);
        assert!(update_visit(&mut visits, moved).is_err());

        let ghost = Visit::completed("zz", "p1", day(1, 9), 0);
        assert!(matches!(
            update_visit(&mut visits, ghost),
            Err(VisitwiseError::NotFound { .. })
        ));
    }
}
