//! Billing Scenario Tests
//!
//! Paid/unpaid allocation, month vs all-time earnings and the summary
//! screen, checked against a known practice.

use visitwise_core::Amount;

/// Expected all-time figures for one patient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedBalance {
    pub patient_id: &'static str,
    pub earned: Amount,
    pub collected: Amount,
    pub outstanding: Amount,
}

pub fn sample_balances() -> Vec<ExpectedBalance> {
    vec![
        ExpectedBalance { patient_id: "p1", earned: 2500, collected: 1500, outstanding: 1000 },
        ExpectedBalance { patient_id: "p2", earned: 1600, collected: 2000, outstanding: 0 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use visitwise_core::{EarningsTotals, EarningsWindow, PaymentStatus, YearMonth};
    use crate::fixtures::{day, payment, sample_practice, visit};
    use visitwise_core::{allocate_payments, patient_summary, practice_summary, practice_totals};

    fn month(year: i32, month: u32) -> EarningsWindow {
        EarningsWindow::Month(YearMonth::new(year, month).unwrap())
    }

    #[test]
    fn test_all_time_balances() {
        let data = sample_practice();
        for expected in sample_balances() {
            let ledger = data.ledger(expected.patient_id).unwrap();
            let totals = ledger.totals(EarningsWindow::AllTime);
            assert_eq!(totals.earnings, expected.earned, "{}", expected.patient_id);
            assert_eq!(totals.collected, expected.collected, "{}", expected.patient_id);
            assert_eq!(totals.outstanding, expected.outstanding, "{}", expected.patient_id);
        }
    }

    #[test]
    fn test_oldest_visits_paid_first() {
        let data = sample_practice();
        let ledger = data.ledger("p1").unwrap();
        let allocation = allocate_payments(
            ledger.visits.iter().copied(),
            ledger.payments.iter().copied(),
            ledger.patient.charge_per_visit,
        );

        assert_eq!(allocation.status_of("p1-20240102"), Some(PaymentStatus::Paid));
        assert_eq!(allocation.status_of("p1-20240109"), Some(PaymentStatus::Paid));
        assert_eq!(allocation.status_of("p1-20240116"), Some(PaymentStatus::Paid));
        assert_eq!(allocation.status_of("p1-20240123"), Some(PaymentStatus::Unpaid));
        assert_eq!(allocation.status_of("p1-20240206"), Some(PaymentStatus::Unpaid));
        assert_eq!(allocation.unpaid_amount, 1000);
        assert_eq!(allocation.remaining_credit, 0);
    }

    #[test]
    fn test_advance_payment_leaves_credit() {
        let data = sample_practice();
        let ledger = data.ledger("p2").unwrap();
        let allocation = allocate_payments(
            ledger.visits.iter().copied(),
            ledger.payments.iter().copied(),
            ledger.patient.charge_per_visit,
        );

        assert_eq!(allocation.paid_count, 2);
        assert_eq!(allocation.unpaid_count, 0);
        assert_eq!(allocation.remaining_credit, 400);
        assert_eq!(ledger.totals(EarningsWindow::AllTime).credit(), 400);
    }

    #[test]
    fn test_month_window_only_counts_dates_inside() {
        let data = sample_practice();
        let ledgers = data.ledgers();

        // Every payment landed in January
        assert_eq!(practice_totals(&ledgers, month(2024, 1)), EarningsTotals::new(2000, 3500));
        assert_eq!(practice_totals(&ledgers, month(2024, 2)), EarningsTotals::new(2100, 0));
        assert_eq!(practice_totals(&ledgers, month(2024, 3)), EarningsTotals::default());
    }

    #[test]
    fn test_practice_outstanding_nets_across_patients() {
        let data = sample_practice();
        let totals = practice_totals(&data.ledgers(), EarningsWindow::AllTime);

        assert_eq!(totals.earnings, 4100);
        assert_eq!(totals.collected, 3500);
        // Ravi's 400 advance offsets part of Asha's 1000
        assert_eq!(totals.outstanding, 600);
    }

    #[test]
    fn test_summary_sorted_by_outstanding() {
        let data = sample_practice();
        let rows = practice_summary(&data.ledgers());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].patient_id, "p1");
        assert_eq!(rows[0].unpaid_visits, 2);
        assert_eq!(rows[0].last_visit, Some(day(2024, 2, 6)));
        assert_eq!(rows[0].last_payment, Some(day(2024, 1, 30)));
        assert_eq!(rows[1].patient_id, "p2");
        assert_eq!(rows[1].outstanding, 0);
    }

    #[test]
    fn test_charge_change_keeps_old_visit_prices() {
        let mut data = sample_practice();
        // Asha's rate goes up; visits already logged keep their pinned charge
        data.patients[0].charge_per_visit = 700;
        data.visits.push(visit("p1", day(2024, 2, 13), 700));

        let ledger = data.ledger("p1").unwrap();
        assert_eq!(ledger.totals(EarningsWindow::AllTime).earnings, 3200);
        assert_eq!(ledger.totals(month(2024, 1)).earnings, 2000);
    }

    #[test]
    fn test_top_up_clears_dues() {
        let mut data = sample_practice();
        data.payments.push(payment("pay4", "p1", 1000, day(2024, 2, 10)));

        let summary = patient_summary(&data.ledger("p1").unwrap());
        assert_eq!(summary.outstanding, 0);
        assert_eq!(summary.unpaid_visits, 0);
        assert_eq!(summary.paid_visits, 5);
    }
}
