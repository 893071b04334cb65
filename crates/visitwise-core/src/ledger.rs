//! Payment ledger
//!
//! Payments are appended, edited or removed; there is no refund or reversal
//! entry. Any change means allocation must be recomputed by the caller.

use std::collections::BTreeMap;

use crate::calendar::YearMonth;
use crate::error::VisitwiseError;
use crate::model::{Amount, Payment, PaymentMethod};

/// The patient's payments, newest first (ties: most recently recorded first)
pub fn payments_newest_first<'a>(payments: &'a [Payment], patient_id: &str) -> Vec<&'a Payment> {
    let mut own: Vec<&Payment> = payments.iter().filter(|p| p.patient_id == patient_id).collect();
    own.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    own
}

pub fn payments_in_month<'a, I>(payments: I, month: YearMonth) -> Vec<&'a Payment>
where
    I: IntoIterator<Item = &'a Payment>,
{
    payments.into_iter().filter(|p| month.contains(p.date)).collect()
}

pub fn total_amount<'a, I>(payments: I) -> Amount
where
    I: IntoIterator<Item = &'a Payment>,
{
    payments
        .into_iter()
        .fold(0, |total: Amount, p| total.saturating_add(p.amount))
}

pub fn totals_by_method<'a, I>(payments: I) -> BTreeMap<PaymentMethod, Amount>
where
    I: IntoIterator<Item = &'a Payment>,
{
    let mut totals = BTreeMap::new();
    for payment in payments {
        let entry = totals.entry(payment.method).or_insert(0);
        *entry = Amount::saturating_add(*entry, payment.amount);
    }
    totals
}

/// Replace a payment by id (an edit)
pub fn replace_payment(payments: &mut [Payment], updated: Payment) -> crate::Result<()> {
    let slot = payments
        .iter_mut()
        .find(|p| p.id == updated.id)
        .ok_or_else(|| VisitwiseError::not_found("Payment", updated.id.clone()))?;
    *slot = updated;
    Ok(())
}

pub fn remove_payment(payments: &mut Vec<Payment>, payment_id: &str) -> crate::Result<Payment> {
    let index = payments
        .iter()
        .position(|p| p.id == payment_id)
        .ok_or_else(|| VisitwiseError::not_found("Payment", payment_id))?;
    Ok(payments.remove(index))
}
