use crate::models::CanonicalTransaction;

/// Outcome of checking a statement's transactions against its printed balances.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_reconciled: bool,
    pub opening_balance: f64,
    pub closing_balance: f64,
    pub calculated_balance: f64,
    pub discrepancy: f64,
}

/// True when the transactions carry `opening` to `closing`, to the cent.
pub fn validate(transactions: &[CanonicalTransaction], opening: f64, closing: f64) -> bool {
    balances_match(calculated_balance(transactions, opening), closing)
}

/// Like [`validate`], keeping the figures for the report.
pub fn reconcile(
    transactions: &[CanonicalTransaction],
    opening: f64,
    closing: f64,
) -> ValidationResult {
    let calculated = calculated_balance(transactions, opening);
    ValidationResult {
        is_reconciled: validate(transactions, opening, closing),
        opening_balance: opening,
        closing_balance: closing,
        calculated_balance: calculated,
        discrepancy: round_cents((calculated - closing).abs()),
    }
}

fn calculated_balance(transactions: &[CanonicalTransaction], opening: f64) -> f64 {
    let total = round_cents(transactions.iter().map(|t| t.amount).sum());
    round_cents(opening + total)
}

// Both sides are rounded to cents; anything left over is float noise.
fn balances_match(calculated: f64, closing: f64) -> bool {
    (calculated - closing).abs() < 0.005
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
