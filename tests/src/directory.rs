//! Patient Directory Tests
//!
//! Search, archive/restore and the counts shown on the directory tabs.

#[cfg(test)]
mod tests {
    use crate::fixtures::{patient, sample_practice};
    use visitwise_core::directory::{
        archive, directory_counts, filter_patients, restore, PatientFilter, StatusFilter,
    };
    use visitwise_core::validation::validate_patient;
    use visitwise_core::EarningsWindow;

    #[test]
    fn test_search_by_name_condition_and_phone() {
        let data = sample_practice();

        let by_name = filter_patients(&data.patients, &PatientFilter::search("asha"));
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "p1");

        let by_condition = filter_patients(&data.patients, &PatientFilter::search("BACK"));
        assert_eq!(by_condition[0].id, "p2");

        // Spacing and country prefix are ignored for phone search
        let by_phone = filter_patients(&data.patients, &PatientFilter::search("9123456"));
        assert_eq!(by_phone.len(), 1);
        assert_eq!(by_phone[0].id, "p2");
    }

    #[test]
    fn test_archived_patient_keeps_history() {
        let mut data = sample_practice();
        archive(&mut data.patients[0], 1_000);

        let active = filter_patients(&data.patients, &PatientFilter::default());
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "p2");

        let archived = filter_patients(
            &data.patients,
            &PatientFilter { status: StatusFilter::Archived, query: None },
        );
        assert_eq!(archived[0].id, "p1");

        // Visits and payments still count toward earnings
        let totals = data.ledger("p1").unwrap().totals(EarningsWindow::AllTime);
        assert_eq!(totals.earnings, 2500);
        assert_eq!(totals.collected, 1500);
    }

    #[test]
    fn test_restore_round_trip_updates_counts() {
        let mut data = sample_practice();
        archive(&mut data.patients[1], 10);
        let counts = directory_counts(&data.patients);
        assert_eq!((counts.active, counts.archived), (1, 1));

        restore(&mut data.patients[1], 20);
        let counts = directory_counts(&data.patients);
        assert_eq!((counts.active, counts.archived), (2, 0));
        assert_eq!(data.patients[1].updated_at, 20);
    }

    #[test]
    fn test_directory_sorted_by_name() {
        let mut data = sample_practice();
        data.patients.push(patient("p3", "anil Shah", 300));

        let all = filter_patients(&data.patients, &PatientFilter::default());
        let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["anil Shah", "Asha Kulkarni", "Ravi Menon"]);
    }

    #[test]
    fn test_new_patient_requires_name() {
        let unnamed = patient("p4", "   ", 400);
        assert!(!validate_patient(&unnamed).is_valid());
        assert!(validate_patient(&patient("p4", "Meera", 400)).is_valid());
    }
}
