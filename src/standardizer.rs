use chrono::{Datelike, NaiveDate};

use crate::error::{AuditError, Result};
use crate::metadata::clean_amount;
use crate::models::{CanonicalTransaction, RawTable};
use crate::profiles::{AmountColumns, ColumnMapping};

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// A raw row reduced to the mapped columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRow {
    pub date: String,
    pub description: String,
    pub amount: AmountCells,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AmountCells {
    Signed(String),
    Split { debit: String, credit: String },
}

impl AmountCells {
    fn is_empty(&self) -> bool {
        match self {
            Self::Signed(a) => a.trim().is_empty(),
            Self::Split { debit, credit } => debit.trim().is_empty() && credit.trim().is_empty(),
        }
    }
}

/// Turn a raw statement table into canonical transactions, in input row order.
pub fn standardize(
    table: &RawTable,
    mapping: &ColumnMapping,
    reference_year: i32,
) -> Result<Vec<CanonicalTransaction>> {
    let mut rows = project(table, mapping)?;

    if matches!(mapping.amount, AmountColumns::Split { .. }) {
        rows.retain(|r| !r.amount.is_empty());
        forward_fill_dates(&mut rows);
    }
    let rows = drop_undated(rows);

    let mut transactions = rows
        .into_iter()
        .map(|row| {
            Ok(CanonicalTransaction {
                date: parse_date_token(&row.date, reference_year)?,
                description: row.description.trim().to_string(),
                amount: signed_amount(&row.amount)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    apply_year_rollover(&mut transactions);
    Ok(transactions)
}

/// Keep only the mapped columns; a mapped column missing from the table is a layout bug.
pub fn project(table: &RawTable, mapping: &ColumnMapping) -> Result<Vec<ProjectedRow>> {
    let index = |name: &str| {
        table.column_index(name).ok_or_else(|| {
            AuditError::Extraction(format!("column '{name}' missing from extracted table"))
        })
    };
    let date = index(mapping.date)?;
    let description = index(mapping.description)?;
    let amount = match mapping.amount {
        AmountColumns::Signed { amount } => (index(amount)?, None),
        AmountColumns::Split { debit, credit } => (index(debit)?, Some(index(credit)?)),
    };

    Ok(table
        .rows
        .iter()
        .map(|row| {
            let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
            ProjectedRow {
                date: cell(date).trim().to_string(),
                description: cell(description),
                amount: match amount {
                    (a, None) => AmountCells::Signed(cell(a)),
                    (debit, Some(credit)) => AmountCells::Split {
                        debit: cell(debit),
                        credit: cell(credit),
                    },
                },
            }
        })
        .collect())
}

/// Rows printed under the same day carry a blank date cell.
pub fn forward_fill_dates(rows: &mut [ProjectedRow]) {
    let mut last = String::new();
    for row in rows.iter_mut() {
        if row.date.is_empty() {
            row.date = last.clone();
        } else {
            last = row.date.clone();
        }
    }
}

/// Rows without a date are balance lines or headers.
pub fn drop_undated(rows: Vec<ProjectedRow>) -> Vec<ProjectedRow> {
    rows.into_iter().filter(|r| !r.date.is_empty()).collect()
}

fn signed_amount(cells: &AmountCells) -> Result<f64> {
    match cells {
        AmountCells::Signed(raw) => {
            clean_amount(raw).ok_or_else(|| AuditError::InvalidAmount(raw.clone()))
        }
        AmountCells::Split { debit, credit } => Ok(optional_amount(credit)? - optional_amount(debit)?),
    }
}

fn optional_amount(raw: &str) -> Result<f64> {
    if raw.trim().is_empty() {
        return Ok(0.0);
    }
    clean_amount(raw).ok_or_else(|| AuditError::InvalidAmount(raw.to_string()))
}

/// Month number from a name or its three-letter abbreviation, any case.
pub fn month_number(name: &str) -> Option<u32> {
    let upper = name.trim().to_uppercase();
    let abbr = upper.get(..3)?;
    MONTHS.iter().position(|m| *m == abbr).map(|i| i as u32 + 1)
}

/// Resolve a year-less statement date such as `DEC13`, `JUN03` or `4Sep`.
pub fn parse_date_token(token: &str, year: i32) -> Result<NaiveDate> {
    let invalid = |reason: &str| AuditError::InvalidDate {
        token: token.to_string(),
        year,
        reason: reason.to_string(),
    };

    let compact: String = token
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let (letters, digits) = if compact.starts_with(|c: char| c.is_ascii_alphabetic()) {
        let split = compact
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(compact.len());
        (&compact[..split], &compact[split..])
    } else {
        let split = compact
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(compact.len());
        (&compact[split..], &compact[..split])
    };

    let month = month_number(letters).ok_or_else(|| invalid("unknown month"))?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("missing day"));
    }
    let day: u32 = digits.parse().map_err(|_| invalid("missing day"))?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid("day is out of range for month"))
}

/// A statement that contains January activity spans a year boundary: its December rows
/// belong to the year before the reference year.
pub fn apply_year_rollover(transactions: &mut [CanonicalTransaction]) {
    if !transactions.iter().any(|t| t.date.month() == 1) {
        return;
    }
    for txn in transactions.iter_mut().filter(|t| t.date.month() == 12) {
        if let Some(prior) = NaiveDate::from_ymd_opt(txn.date.year() - 1, 12, txn.date.day()) {
            txn.date = prior;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::LayoutRegistry;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> RawTable {
        let mut t = RawTable::new(columns);
        t.rows = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        t
    }

    fn mapping(account_type: &str) -> ColumnMapping {
        LayoutRegistry::default().lookup("RBC", account_type).unwrap().mapping
    }

    const CHEQUING: &[&str] = &["Date", "Description", "Withdrawals", "Deposits", "Balance"];
    const VISA: &[&str] = &["Transaction Date", "Posting Date", "Activity Description", "Amount"];

    #[test]
    fn test_chequing_merges_split_columns_and_fills_dates() {
        let raw = table(
            CHEQUING,
            &[
                &["", "OpeningBalance", "", "", "1111.11"],
                &["12Aug", "Interacpurchase-9999 TEST-CO", "222.22", "", "888.89"],
                &["", "ContactlessInteracpurchase-9999\nBATTLEBOX-SQU", "11.11", "", "877.78"],
                &["13Aug", "BIGMONEY-NOWHAMMIES", "", "1000.00", ""],
                &["", "ContactlessInteracpurchase-9999\nSTARBUCKS#1234", "11.11", "", "1866.67"],
                &["26Aug", "BillPayment BIGBILLS", "11.11", "", "1855.56"],
                &["4Sep", "Interacpurchase-7777 BIGBOXSTORE#", "22.22", "", ""],
                &["", "Interacpurchase-4444 ABCD/EFG#1234", "33.33", "", "1800.01"],
                &["11Sep", "ContactlessInteracpurchase-1234\nTABLEROCKLOBSTER", "6.66", "", ""],
            ],
        );
        let txns = standardize(&raw, &mapping("Chequing"), 2020).unwrap();
        assert_eq!(txns.len(), 8);
        assert_eq!(txns[0].date, d(2020, 8, 12));
        assert_eq!(txns[0].amount, -222.22);
        assert_eq!(txns[1].date, d(2020, 8, 12));
        assert_eq!(txns[1].description, "ContactlessInteracpurchase-9999\nBATTLEBOX-SQU");
        assert_eq!(txns[2].amount, 1000.0);
        assert_eq!(txns[3].date, d(2020, 8, 13));
        assert_eq!(txns[6].date, d(2020, 9, 4));
        assert_eq!(txns[7].date, d(2020, 9, 11));
    }

    #[test]
    fn test_split_amount_sign_convention() {
        let raw = table(
            CHEQUING,
            &[
                &["1Mar", "deposit only", "", "50.00", ""],
                &["2Mar", "withdrawal only", "20.00", "", ""],
                &["3Mar", "neither", "", "", "30.00"],
            ],
        );
        let txns = standardize(&raw, &mapping("Chequing"), 2021).unwrap();
        assert_eq!(txns.len(), 2);
        assert!(txns[0].amount > 0.0);
        assert!(txns[1].amount < 0.0);
    }

    #[test]
    fn test_visa_drops_balance_rows_and_parses_signed_amounts() {
        let raw = table(
            VISA,
            &[
                &["JUN13", "JUN14", "AMAZON.CA*AB1CD23E4AMAZON.CAON", "$11.11"],
                &["JUN24", "JUN27", "PAYMENT-THANKYOU/PAIEMENT-MERCI", "-$1,000.00"],
                &["", "", "CREDITBALANCE", "-$532.75"],
                &["JUL03", "JUL04", "UBERCANADA/UBEREATSTORONTOON", "$66.66"],
            ],
        );
        let txns = standardize(&raw, &mapping("Visa"), 2020).unwrap();
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0].amount, 11.11);
        assert_eq!(txns[1].amount, -1000.0);
        assert_eq!(txns[2].date, d(2020, 7, 3));
        assert_eq!(txns[2].description, "UBERCANADA/UBEREATSTORONTOON");
    }

    #[test]
    fn test_visa_year_rollover() {
        let raw = table(
            VISA,
            &[
                &["DEC13", "DEC14", "AMAZON", "$11.11"],
                &["DEC24", "DEC27", "PAYMENT", "-$1,000.00"],
                &["JAN03", "JAN04", "UBER", "$66.66"],
            ],
        );
        let txns = standardize(&raw, &mapping("Visa"), 2020).unwrap();
        assert_eq!(txns[0].date, d(2019, 12, 13));
        assert_eq!(txns[1].date, d(2019, 12, 24));
        assert_eq!(txns[2].date, d(2020, 1, 3));
    }

    #[test]
    fn test_december_without_january_keeps_reference_year() {
        let raw = table(
            VISA,
            &[&["NOV13", "NOV14", "AMAZON", "$11.11"], &["DEC03", "DEC04", "UBER", "$66.66"]],
        );
        let txns = standardize(&raw, &mapping("Visa"), 2020).unwrap();
        assert_eq!(txns[0].date, d(2020, 11, 13));
        assert_eq!(txns[1].date, d(2020, 12, 3));
    }

    #[test]
    fn test_parse_date_token_forms() {
        assert_eq!(parse_date_token("DEC13", 2020).unwrap(), d(2020, 12, 13));
        assert_eq!(parse_date_token("JUN03", 2020).unwrap(), d(2020, 6, 3));
        assert_eq!(parse_date_token("12Aug", 2020).unwrap(), d(2020, 8, 12));
        assert_eq!(parse_date_token("4Sep", 2020).unwrap(), d(2020, 9, 4));
        assert_eq!(parse_date_token(" jan 5 ", 2021).unwrap(), d(2021, 1, 5));
    }

    #[test]
    fn test_month_number() {
        assert_eq!(month_number("January"), Some(1));
        assert_eq!(month_number("dec"), Some(12));
        assert_eq!(month_number("Ju"), None);
        assert_eq!(month_number("Smarch"), None);
    }

    #[test]
    fn test_leap_day() {
        assert_eq!(parse_date_token("FEB29", 2020).unwrap(), d(2020, 2, 29));
        let err = parse_date_token("FEB29", 2021).unwrap_err();
        assert!(err.to_string().contains("day is out of range for month"));
    }

    #[test]
    fn test_bad_tokens() {
        assert!(parse_date_token("XYZ12", 2020).is_err());
        assert!(parse_date_token("DEC", 2020).is_err());
        assert!(parse_date_token("", 2020).is_err());
        assert!(parse_date_token("DEC1X", 2020).is_err());
    }

    #[test]
    fn test_drop_undated_is_idempotent() {
        let raw = table(
            VISA,
            &[
                &["JUN13", "", "A", "$1.00"],
                &["", "", "BALANCE", "$2.00"],
                &["JUN14", "", "B", "$3.00"],
            ],
        );
        let rows = project(&raw, &mapping("Visa")).unwrap();
        let once = drop_undated(rows);
        let twice = drop_undated(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_rollover_leaves_input_order() {
        let mut txns = vec![
            CanonicalTransaction { date: d(2021, 1, 2), description: "a".into(), amount: 1.0 },
            CanonicalTransaction { date: d(2021, 12, 30), description: "b".into(), amount: 2.0 },
        ];
        apply_year_rollover(&mut txns);
        assert_eq!(txns[0].description, "a");
        assert_eq!(txns[1].date, d(2020, 12, 30));
    }

    #[test]
    fn test_unparseable_amount_is_error() {
        let raw = table(VISA, &[&["JUN13", "", "A", "$abc"]]);
        let err = standardize(&raw, &mapping("Visa"), 2020).unwrap_err();
        assert!(matches!(err, AuditError::InvalidAmount(_)));
    }
}
