//! Practice Import Tests
//!
//! Loading a practice from its JSON export.

/// Export with one patient, written the way the mobile client stores it
pub const EXPORT_JSON: &str = r#"{
    "patients": [
        {
            "id": "p9",
            "name": "Kavya Iyer",
            "phone": "99887 76655",
            "charge_per_visit": 600,
            "condition": "Post-op knee rehab",
            "reminders": { "enabled": true, "days_of_week": [1, 4], "time": "09:30" }
        }
    ],
    "visits": [
        { "id": "v1", "patient_id": "p9", "date": "2024-03-04" },
        { "id": "v2", "patient_id": "p9", "date": "2024-03-07", "charge": 450 },
        { "id": "v3", "patient_id": "p9", "date": "2024-03-11", "completed": false }
    ],
    "payments": [
        { "id": "pay1", "patient_id": "p9", "amount": 600, "date": "2024-03-04", "method": "upi" }
    ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use visitwise_core::{EarningsWindow, PaymentMethod, PaymentStatus, PracticeData, VisitwiseError};

    #[test]
    fn test_import_fills_defaults() {
        let data = PracticeData::from_json(EXPORT_JSON).unwrap();
        let patient = data.patient("p9").unwrap();

        assert!(patient.is_active);
        assert!(patient.reminders.enabled);
        assert_eq!(patient.reminders.days_of_week, vec![1, 4]);
        assert!(data.visits[0].completed);
        assert_eq!(data.visits[0].charge, 0);
        assert_eq!(data.payments[0].method, PaymentMethod::Upi);
        assert!(data.media.is_empty());
    }

    #[test]
    fn test_imported_practice_bills_correctly() {
        let data = PracticeData::from_json(EXPORT_JSON).unwrap();
        let ledger = data.ledger("p9").unwrap();

        // v1 falls back to 600, v2 carries 450, v3 is only scheduled
        let totals = ledger.totals(EarningsWindow::AllTime);
        assert_eq!(totals.earnings, 1050);
        assert_eq!(totals.outstanding, 450);

        let allocation = visitwise_core::allocate_payments(
            ledger.visits.iter().copied(),
            ledger.payments.iter().copied(),
            ledger.patient.charge_per_visit,
        );
        assert_eq!(allocation.status_of("v1"), Some(PaymentStatus::Paid));
        assert_eq!(allocation.status_of("v2"), Some(PaymentStatus::Unpaid));
        assert_eq!(allocation.status_of("v3"), None);
    }

    #[test]
    fn test_export_reimports_unchanged() {
        let data = PracticeData::from_json(EXPORT_JSON).unwrap();
        let again = PracticeData::from_json(&data.to_json().unwrap()).unwrap();
        assert_eq!(again, data);
    }

    #[test]
    fn test_bad_date_rejected() {
        let broken = EXPORT_JSON.replace("2024-03-04\" },", "2024-02-30\" },");
        let err = PracticeData::from_json(&broken).unwrap_err();
        assert!(matches!(err, VisitwiseError::Json(_)));
    }
}
