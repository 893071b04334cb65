//! Earnings aggregation
//!
//! Two windows exist and are deliberately kept apart:
//!
//! - [`EarningsWindow::Month`] feeds the home-screen card: visits and
//!   payments dated inside one calendar month.
//! - [`EarningsWindow::AllTime`] feeds the per-patient summary screen.
//!
//! A month's totals do not add up to the all-time totals in any useful
//! way (a payment made in February for January visits counts as February
//! collection), and nothing here tries to reconcile them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::allocation::allocate_payments;
use crate::calendar::YearMonth;
use crate::model::{Amount, Patient, Payment, Visit};

/// Which dates an aggregation counts
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "window", content = "month")]
pub enum EarningsWindow {
    Month(YearMonth),
    AllTime,
}

impl EarningsWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            EarningsWindow::Month(month) => month.contains(date),
            EarningsWindow::AllTime => true,
        }
    }
}

/// Earned vs collected over a window
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EarningsTotals {
    /// Effective charges of completed visits
    pub earnings: Amount,
    /// Payments received
    pub collected: Amount,
    /// `max(0, earnings - collected)`
    pub outstanding: Amount,
}

impl EarningsTotals {
    pub fn new(earnings: Amount, collected: Amount) -> Self {
        EarningsTotals {
            earnings,
            collected,
            outstanding: earnings.saturating_sub(collected),
        }
    }

    /// Collected beyond what was earned (advance payments)
    pub fn credit(&self) -> Amount {
        self.collected.saturating_sub(self.earnings)
    }
}

/// A patient with the visits and payments that belong to them
#[derive(Clone, Debug)]
pub struct PatientLedger<'a> {
    pub patient: &'a Patient,
    pub visits: Vec<&'a Visit>,
    pub payments: Vec<&'a Payment>,
}

impl<'a> PatientLedger<'a> {
    /// Pick the patient's own records out of practice-wide collections
    pub fn new<V, P>(patient: &'a Patient, visits: V, payments: P) -> Self
    where
        V: IntoIterator<Item = &'a Visit>,
        P: IntoIterator<Item = &'a Payment>,
    {
        PatientLedger {
            patient,
            visits: visits
                .into_iter()
                .filter(|v| v.patient_id == patient.id)
                .collect(),
            payments: payments
                .into_iter()
                .filter(|p| p.patient_id == patient.id)
                .collect(),
        }
    }

    pub fn totals(&self, window: EarningsWindow) -> EarningsTotals {
        let default_charge = self.patient.charge_per_visit;
        let earnings = self
            .visits
            .iter()
            .filter(|v| v.completed && window.contains(v.date))
            .fold(0, |total: Amount, v| {
                total.saturating_add(v.effective_charge(default_charge))
            });
        let collected = self
            .payments
            .iter()
            .filter(|p| window.contains(p.date))
            .fold(0, |total: Amount, p| total.saturating_add(p.amount));
        EarningsTotals::new(earnings, collected)
    }
}

/// Practice-wide totals for a window.
///
/// Outstanding is floored once over the practice totals, so one patient's
/// advance payment offsets another patient's dues on the card.
pub fn practice_totals(ledgers: &[PatientLedger<'_>], window: EarningsWindow) -> EarningsTotals {
    let (earnings, collected) = ledgers.iter().fold((0, 0), |(e, c): (Amount, Amount), ledger| {
        let totals = ledger.totals(window);
        (e.saturating_add(totals.earnings), c.saturating_add(totals.collected))
    });
    EarningsTotals::new(earnings, collected)
}

/// One row of the summary screen (all-time)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientSummary {
    pub patient_id: String,
    pub patient_name: String,
    pub is_active: bool,
    pub completed_visits: usize,
    pub total_earned: Amount,
    pub total_collected: Amount,
    pub outstanding: Amount,
    pub paid_visits: usize,
    pub unpaid_visits: usize,
    pub unpaid_amount: Amount,
    pub last_visit: Option<NaiveDate>,
    pub last_payment: Option<NaiveDate>,
}

pub fn patient_summary(ledger: &PatientLedger<'_>) -> PatientSummary {
    let totals = ledger.totals(EarningsWindow::AllTime);
    let allocation = allocate_payments(
        ledger.visits.iter().copied(),
        ledger.payments.iter().copied(),
        ledger.patient.charge_per_visit,
    );

    PatientSummary {
        patient_id: ledger.patient.id.clone(),
        patient_name: ledger.patient.name.clone(),
        is_active: ledger.patient.is_active,
        completed_visits: ledger.visits.iter().filter(|v| v.completed).count(),
        total_earned: totals.earnings,
        total_collected: totals.collected,
        outstanding: totals.outstanding,
        paid_visits: allocation.paid_count,
        unpaid_visits: allocation.unpaid_count,
        unpaid_amount: allocation.unpaid_amount,
        last_visit: ledger
            .visits
            .iter()
            .filter(|v| v.completed)
            .map(|v| v.date)
            .max(),
        last_payment: ledger.payments.iter().map(|p| p.date).max(),
    }
}

/// Summary rows, largest outstanding first, then by name
pub fn practice_summary(ledgers: &[PatientLedger<'_>]) -> Vec<PatientSummary> {
    let mut rows: Vec<PatientSummary> = ledgers.iter().map(patient_summary).collect();
    rows.sort_by(|a, b| {
        Reverse(a.outstanding)
            .cmp(&Reverse(b.outstanding))
            .then_with(|| a.patient_name.to_lowercase().cmp(&b.patient_name.to_lowercase()))
    });
    rows
}
