//! Visit Calendar Tests
//!
//! Marking days visited from the month calendar, one visit per day.

#[cfg(test)]
mod tests {
    use crate::fixtures::{day, sample_practice};
    use visitwise_core::visit_log::{
        mark_visited, toggle_visit, update_visit, visited_days, visits_in_month, VisitToggle,
    };
    use visitwise_core::{VisitwiseError, YearMonth};

    #[test]
    fn test_mark_visited_pins_current_charge() {
        let data = sample_practice();
        let asha = data.patient("p1").unwrap();

        let visit = mark_visited(&data.visits, asha, day(2024, 2, 13), None, 42).unwrap();
        assert_eq!(visit.id, "p1-20240213");
        assert_eq!(visit.charge, 500);
        assert!(visit.completed);
        assert_eq!(visit.created_at, 42);

        let discounted = mark_visited(&data.visits, asha, day(2024, 2, 14), Some(300), 43).unwrap();
        assert_eq!(discounted.charge, 300);
    }

    #[test]
    fn test_second_visit_same_day_rejected() {
        let data = sample_practice();
        let asha = data.patient("p1").unwrap();

        let err = mark_visited(&data.visits, asha, day(2024, 1, 9), None, 0).unwrap_err();
        assert!(matches!(err, VisitwiseError::DuplicateVisit { .. }));

        // The same day is free for another patient
        let ravi = data.patient("p2").unwrap();
        assert!(mark_visited(&data.visits, ravi, day(2024, 1, 9), None, 0).is_ok());
    }

    #[test]
    fn test_tapping_a_day_twice_undoes_it() {
        let data = sample_practice();
        let asha = data.patient("p1").unwrap().clone();
        let mut visits = data.visits.clone();
        let before = visits.len();

        let added = toggle_visit(&mut visits, &asha, day(2024, 2, 20), 1);
        assert!(matches!(added, VisitToggle::Added(_)));
        assert_eq!(visits.len(), before + 1);

        let removed = toggle_visit(&mut visits, &asha, day(2024, 2, 20), 2);
        match removed {
            VisitToggle::Removed(visit) => assert_eq!(visit.id, "p1-20240220"),
            other => panic!("expected removal, got {:?}", other),
        }
        assert_eq!(visits, data.visits);
    }

    #[test]
    fn test_month_view_lists_visited_days() {
        let data = sample_practice();
        let january = YearMonth::new(2024, 1).unwrap();

        let days: Vec<u32> = visited_days(&data.visits, "p1", january).into_iter().collect();
        assert_eq!(days, vec![2, 9, 16, 23]);
        assert!(visited_days(&data.visits, "p2", january).is_empty());

        let february = visits_in_month(&data.visits, "p2", january.next());
        assert_eq!(february.len(), 2);
        assert!(february[0].date < february[1].date);
    }

    #[test]
    fn test_scheduled_visit_not_shown_as_visited() {
        let mut data = sample_practice();
        data.visits[4].completed = false;

        let february = YearMonth::new(2024, 2).unwrap();
        assert!(visited_days(&data.visits, "p1", february).is_empty());
        assert_eq!(visits_in_month(&data.visits, "p1", february).len(), 1);
    }

    #[test]
    fn test_moving_visit_onto_taken_day_rejected() {
        let mut data = sample_practice();
        let mut moved = data.visits[0].clone();
        moved.date = day(2024, 1, 9);

        let err = update_visit(&mut data.visits, moved).unwrap_err();
        assert!(matches!(err, VisitwiseError::DuplicateVisit { .. }));

        let mut moved = data.visits[0].clone();
        moved.date = day(2024, 1, 3);
        update_visit(&mut data.visits, moved).unwrap();
        assert_eq!(data.visits[0].date, day(2024, 1, 3));
    }

    #[test]
    fn test_calendar_navigation_across_years() {
        let december = YearMonth::new(2023, 12).unwrap();
        assert_eq!(december.next().to_string(), "2024-01");
        assert_eq!(december.next().prev(), december);
        assert_eq!(YearMonth::new(2024, 2).unwrap().days_in_month(), 29);
        assert!("2024-13".parse::<YearMonth>().is_err());
    }
}
