//! Payment allocation
//!
//! Derives which completed visits are paid by pouring the total of a
//! patient's payments over their visits, oldest visit first. A visit is
//! either fully covered or not covered at all; a pool too small for the
//! next visit is carried forward untouched and may still cover a cheaper
//! later one.
//!
//! Paid status is never stored. Every call starts from scratch, so editing
//! or deleting a payment (even an old one) can flip earlier visits back to
//! unpaid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{Amount, Payment, Visit};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

/// Outcome of allocating a patient's payments across their visits
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Allocation {
    /// Paid/unpaid per completed visit id
    pub statuses: BTreeMap<String, PaymentStatus>,
    /// Payment pool left after covering every visit it could
    pub remaining_credit: Amount,
    pub paid_count: usize,
    pub unpaid_count: usize,
    /// Effective charges of the visits left unpaid
    pub unpaid_amount: Amount,
}

impl Allocation {
    pub fn status_of(&self, visit_id: &str) -> Option<PaymentStatus> {
        self.statuses.get(visit_id).copied()
    }

    pub fn is_paid(&self, visit_id: &str) -> bool {
        self.status_of(visit_id) == Some(PaymentStatus::Paid)
    }

    pub fn unpaid_visit_ids(&self) -> impl Iterator<Item = &str> {
        self.statuses
            .iter()
            .filter(|(_, status)| **status == PaymentStatus::Unpaid)
            .map(|(id, _)| id.as_str())
    }
}

/// Allocate payments to completed visits, oldest first.
///
/// Scheduled (not completed) visits are ignored. Visits on the same day
/// keep their input order. A visit whose effective charge is zero is always
/// paid.
///
/// # Arguments
/// * `visits` - the patient's visits, any order
/// * `payments` - the patient's payments; only amounts matter
/// * `default_charge` - the patient's `charge_per_visit`
pub fn allocate_payments<'a, V, P>(visits: V, payments: P, default_charge: Amount) -> Allocation
where
    V: IntoIterator<Item = &'a Visit>,
    P: IntoIterator<Item = &'a Payment>,
{
    let mut completed: Vec<&Visit> = visits.into_iter().filter(|v| v.completed).collect();
    // Stable: same-day visits stay in input order
    completed.sort_by_key(|v| v.date);

    let mut pool: Amount = payments
        .into_iter()
        .fold(0, |total: Amount, p| total.saturating_add(p.amount));

    let mut allocation = Allocation::default();
    for visit in completed {
        let charge = visit.effective_charge(default_charge);
        let status = if pool >= charge {
            pool -= charge;
            allocation.paid_count += 1;
            PaymentStatus::Paid
        } else {
            allocation.unpaid_count += 1;
            allocation.unpaid_amount = allocation.unpaid_amount.saturating_add(charge);
            PaymentStatus::Unpaid
        };
        allocation.statuses.insert(visit.id.clone(), status);
    }
    allocation.remaining_credit = pool;

    log::debug!(
        "Allocated payments: {} paid, {} unpaid, {} credit left",
        allocation.paid_count,
        allocation.unpaid_count,
        allocation.remaining_credit
    );

    allocation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentMethod;
    use chrono::NaiveDate;

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn payment(id: &str, amount: Amount) -> Payment {
        Payment::new(id, "p1", amount, jan(28), PaymentMethod::Cash)
    }

    #[test]
    fn test_no_payments_leaves_everything_unpaid() {
        let visits = vec![
            Visit::completed("v1", "p1", jan(1), 500),
            Visit::completed("v2", "p1", jan(2), 500),
        ];
        let payments: Vec<Payment> = Vec::new();
        let allocation = allocate_payments(&visits, &payments, 0);

        assert_eq!(allocation.unpaid_count, 2);
        assert_eq!(allocation.paid_count, 0);
        assert_eq!(allocation.unpaid_amount, 1000);
        assert_eq!(allocation.unpaid_visit_ids().count(), 2);
    }

    #[test]
    fn test_earliest_visit_is_paid_first() {
        let visits = vec![
            Visit::completed("v3", "p1", jan(3), 500),
            Visit::completed("v1", "p1", jan(1), 500),
        ];
        let allocation = allocate_payments(&visits, &[payment("pay1", 500)], 0);

        assert_eq!(allocation.status_of("v1"), Some(PaymentStatus::Paid));
        assert_eq!(allocation.status_of("v3"), Some(PaymentStatus::Unpaid));
        assert_eq!(allocation.remaining_credit, 0);
    }

    #[test]
    fn test_no_partial_credit() {
        let visits = vec![Visit::completed("v1", "p1", jan(1), 500)];
        let allocation = allocate_payments(&visits, &[payment("pay1", 499)], 0);

        assert!(!allocation.is_paid("v1"));
        assert_eq!(allocation.remaining_credit, 499);
    }

    #[test]
    fn test_leftover_pool_can_cover_a_cheaper_later_visit() {
        let visits = vec![
            Visit::completed("v1", "p1", jan(1), 800),
            Visit::completed("v2", "p1", jan(2), 300),
        ];
        let allocation = allocate_payments(&visits, &[payment("pay1", 500)], 0);

        assert!(!allocation.is_paid("v1"));
        assert!(allocation.is_paid("v2"));
        assert_eq!(allocation.remaining_credit, 200);
    }

    #[test]
    fn test_default_charge_fallback() {
        let visits = vec![
            Visit::completed("v1", "p1", jan(1), 0),
            Visit::completed("v2", "p1", jan(2), 0),
        ];
        let allocation = allocate_payments(&visits, &[payment("pay1", 300)], 300);

        assert!(allocation.is_paid("v1"));
        assert!(!allocation.is_paid("v2"));
        assert_eq!(allocation.unpaid_amount, 300);
    }

    #[test]
    fn test_zero_charge_visit_is_always_paid() {
        let visits = vec![Visit::completed("v1", "p1", jan(1), 0)];
        let payments: Vec<Payment> = Vec::new();
        let allocation = allocate_payments(&visits, &payments, 0);
        assert!(allocation.is_paid("v1"));
    }

    #[test]
    fn test_scheduled_visits_are_ignored() {
        let visits = vec![
            Visit::scheduled("v1", "p1", jan(1), 500),
            Visit::completed("v2", "p1", jan(2), 500),
        ];
        let allocation = allocate_payments(&visits, &[payment("pay1", 500)], 0);

        assert_eq!(allocation.status_of("v1"), None);
        assert!(allocation.is_paid("v2"));
    }

    #[test]
    fn test_deleting_a_payment_recomputes_from_scratch() {
        let visits = vec![
            Visit::completed("v1", "p1", jan(1), 500),
            Visit::completed("v2", "p1", jan(2), 500),
        ];
        let mut payments = vec![payment("pay1", 500), payment("pay2", 500)];
        assert_eq!(allocate_payments(&visits, &payments, 0).paid_count, 2);

        payments.retain(|p| p.id != "pay1");
        let allocation = allocate_payments(&visits, &payments, 0);
        assert!(allocation.is_paid("v1"));
        assert!(!allocation.is_paid("v2"));
    }
}
