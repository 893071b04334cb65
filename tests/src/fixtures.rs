//! Shared practice fixtures

use chrono::NaiveDate;
use visitwise_core::{Amount, Patient, Payment, PaymentMethod, PracticeData, Visit};

pub fn day(year: i32, month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, d).unwrap_or_default()
}

pub fn patient(id: &str, name: &str, charge: Amount) -> Patient {
    Patient::new(id, name, charge)
}

pub fn visit(patient_id: &str, date: NaiveDate, charge: Amount) -> Visit {
    Visit::completed(
        format!("{}-{}", patient_id, date.format("%Y%m%d")),
        patient_id,
        date,
        charge,
    )
}

pub fn payment(id: &str, patient_id: &str, amount: Amount, date: NaiveDate) -> Payment {
    Payment::new(id, patient_id, amount, date, PaymentMethod::Cash)
}

/// Two patients across January and February 2024.
///
/// - Asha (p1, 500/visit): four January visits, one February visit,
///   1500 paid in January
/// - Ravi (p2, 800/visit): two February visits, 2000 paid in advance
pub fn sample_practice() -> PracticeData {
    let mut asha = patient("p1", "Asha Kulkarni", 500);
    asha.phone = Some("98765 43210".to_string());
    asha.condition = Some("Frozen shoulder".to_string());
    let mut ravi = patient("p2", "Ravi Menon", 800);
    ravi.phone = Some("+91 91234 56789".to_string());
    ravi.condition = Some("Lower back pain".to_string());

    PracticeData {
        patients: vec![asha, ravi],
        visits: vec![
            visit("p1", day(2024, 1, 2), 500),
            visit("p1", day(2024, 1, 9), 500),
            visit("p1", day(2024, 1, 16), 500),
            visit("p1", day(2024, 1, 23), 500),
            visit("p1", day(2024, 2, 6), 500),
            visit("p2", day(2024, 2, 1), 800),
            visit("p2", day(2024, 2, 8), 800),
        ],
        payments: vec![
            payment("pay1", "p1", 1000, day(2024, 1, 9)),
            payment("pay2", "p1", 500, day(2024, 1, 30)),
            payment("pay3", "p2", 2000, day(2024, 1, 28)),
        ],
        media: Vec::new(),
    }
}
