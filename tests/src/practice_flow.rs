//! Practice Flow Tests
//!
//! A practitioner's session driven through the state store: sign in, load
//! the practice, log visits and payments, chase dues, delete a patient,
//! sign out.

use visitwise_core::session::UserProfile;

pub fn practitioner() -> UserProfile {
    UserProfile {
        uid: "practitioner-1".to_string(),
        display_name: Some("Dr. Neha Rao".to_string()),
        email: Some("neha@example.com".to_string()),
        photo_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{day, payment, sample_practice};
    use std::cell::Cell;
    use std::rc::Rc;
    use visitwise_core::contact::payment_reminder_link;
    use visitwise_core::session::{clear_session, load_session, save_session, MemoryStorage};
    use visitwise_core::store::{NotificationLevel, Theme};
    use visitwise_core::visit_log::mark_visited;
    use visitwise_core::{Action, PaymentStatus, PracticeConfig, Store, YearMonth};

    fn signed_in_store() -> Store {
        let mut store = Store::from_config(&PracticeConfig::default());
        store.dispatch(Action::SignedIn(practitioner()));
        store.dispatch(Action::DataImported(sample_practice()));
        store
    }

    #[test]
    fn test_session_survives_reload() {
        let mut storage = MemoryStorage::new();
        save_session(&mut storage, &practitioner()).unwrap();

        let mut store = Store::default();
        if let Some(user) = load_session(&mut storage) {
            store.dispatch(Action::SignedIn(user));
        }
        assert!(store.state().is_signed_in());

        clear_session(&mut storage);
        assert!(load_session(&mut storage).is_none());
    }

    #[test]
    fn test_logging_visit_updates_home_card() {
        let mut store = signed_in_store();
        let february = YearMonth::new(2024, 2).unwrap();
        assert_eq!(store.state().month_totals(february).earnings, 2100);

        let visit = {
            let state = store.state();
            mark_visited(&state.visits, state.patient("p2").unwrap(), day(2024, 2, 15), None, 0).unwrap()
        };
        store.dispatch(Action::VisitSaved(visit));

        let totals = store.state().month_totals(february);
        assert_eq!(totals.earnings, 2900);
        assert_eq!(totals.outstanding, 2900);
    }

    #[test]
    fn test_deleting_payment_flips_visits_to_unpaid() {
        let mut store = signed_in_store();
        let status = store.state().payment_status("p1").unwrap();
        assert_eq!(status.paid_count, 3);

        store.dispatch(Action::PaymentDeleted("pay1".to_string()));
        let status = store.state().payment_status("p1").unwrap();
        assert_eq!(status.paid_count, 1);
        assert_eq!(status.status_of("p1-20240102"), Some(PaymentStatus::Paid));
        assert_eq!(status.status_of("p1-20240109"), Some(PaymentStatus::Unpaid));

        store.dispatch(Action::PaymentSaved(payment("pay5", "p1", 2000, day(2024, 2, 7))));
        assert_eq!(store.state().payment_status("p1").unwrap().unpaid_count, 0);
    }

    #[test]
    fn test_reminder_link_for_outstanding_balance() {
        let store = signed_in_store();
        let config = PracticeConfig::default();
        let summaries = store.state().patient_summaries();
        let asha = summaries.iter().find(|s| s.patient_id == "p1").unwrap();
        let ravi = summaries.iter().find(|s| s.patient_id == "p2").unwrap();

        let link = payment_reminder_link(store.state().patient("p1").unwrap(), asha.outstanding, &config).unwrap();
        assert!(link.starts_with("https://wa.me/919876543210?text="));
        assert!(link.contains("1000"));

        // Nothing owed, nothing to send
        assert!(payment_reminder_link(store.state().patient("p2").unwrap(), ravi.outstanding, &config).is_none());
    }

    #[test]
    fn test_deleting_patient_drops_their_records() {
        let mut store = signed_in_store();
        store.dispatch(Action::PatientDeleted("p1".to_string()));

        let state = store.state();
        assert!(state.patient("p1").is_none());
        assert!(state.visits.iter().all(|v| v.patient_id == "p2"));
        assert!(state.payments.iter().all(|p| p.patient_id == "p2"));
        assert_eq!(state.patient_summaries().len(), 1);
    }

    #[test]
    fn test_failed_request_reported_then_dismissed() {
        let mut store = signed_in_store();
        store.dispatch(Action::RequestStarted);
        assert!(store.state().ui.is_loading());

        store.dispatch(Action::RequestFailed("Network unavailable".to_string()));
        let ui = &store.state().ui;
        assert!(!ui.is_loading());
        assert_eq!(ui.last_error.as_deref(), Some("Network unavailable"));
        assert_eq!(ui.notifications[0].level, NotificationLevel::Error);

        let id = ui.notifications[0].id;
        store.dispatch(Action::NotificationDismissed(id));
        assert!(store.state().ui.notifications.is_empty());

        // Retrying clears the inline error
        store.dispatch(Action::RequestStarted);
        assert!(store.state().ui.last_error.is_none());
    }

    #[test]
    fn test_sign_out_clears_practice_keeps_theme() {
        let mut store = signed_in_store();
        store.dispatch(Action::ThemeChanged(Theme::Dark));

        let renders = Rc::new(Cell::new(0));
        let counter = Rc::clone(&renders);
        let id = store.subscribe(move |_| counter.set(counter.get() + 1));

        store.dispatch(Action::SignedOut);
        let state = store.state();
        assert!(!state.is_signed_in());
        assert!(state.patients.is_empty());
        assert!(state.visits.is_empty());
        assert!(state.payments.is_empty());
        assert_eq!(state.theme, Theme::Dark);
        assert_eq!(renders.get(), 1);

        assert!(store.unsubscribe(id));
        store.dispatch(Action::ThemeChanged(Theme::Light));
        assert_eq!(renders.get(), 1);
    }
}
