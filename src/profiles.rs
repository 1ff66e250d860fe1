//! Static layout table: one entry per (institution, account type).
//!
//! Supporting a new statement layout means adding an entry to [`LAYOUTS`]; the
//! extractor, metadata reader and standardizer are driven entirely by these values.

use crate::document::{Region, RowStrategy, TableSettings};
use crate::error::{AuditError, Result};

/// Which table geometry applies to which page.
#[derive(Debug, Clone, PartialEq)]
pub enum PagePlan {
    /// First page uses its own crop; later pages alternate by index parity because the
    /// printed layout shifts with the binding margin.
    Alternating {
        first: TableSettings,
        odd: TableSettings,
        even: TableSettings,
    },
    /// One geometry for every page.
    Uniform(TableSettings),
}

impl PagePlan {
    pub fn settings_for_page(&self, index: usize) -> &TableSettings {
        match self {
            Self::Alternating { first, odd, even } => {
                if index == 0 {
                    first
                } else if index % 2 == 1 {
                    even
                } else {
                    odd
                }
            }
            Self::Uniform(settings) => settings,
        }
    }
}

/// Keeps only pages and rows whose amount cell carries a currency marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerFilter {
    pub column: &'static str,
    pub marker: char,
    /// Cells containing this are column headers such as "Amount($)".
    pub header_marker: char,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmountColumns {
    /// One column, already signed in the source text.
    Signed { amount: &'static str },
    /// Separate withdrawal/deposit columns; amount = credit - debit.
    Split {
        debit: &'static str,
        credit: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnMapping {
    pub date: &'static str,
    pub description: &'static str,
    pub amount: AmountColumns,
}

/// Regexes run against first-page text; the last capture group holds the value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetadataPatterns {
    pub reference_year: &'static str,
    /// Captures the month name that closes the statement period.
    pub period_end: &'static str,
    pub opening_balance: &'static str,
    pub closing_balance: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatementLayout {
    pub institution: &'static str,
    pub account_type: &'static str,
    pub pages: PagePlan,
    pub columns: &'static [&'static str],
    /// Header rows dropped from the top of every page's grid.
    pub header_rows: usize,
    pub marker_filter: Option<MarkerFilter>,
    pub mapping: ColumnMapping,
    pub patterns: MetadataPatterns,
}

impl StatementLayout {
    pub fn key(&self) -> String {
        format!(
            "{}_{}",
            self.institution.to_lowercase(),
            self.account_type.to_lowercase()
        )
    }
}

// Column boundaries were measured against printed statements.
pub(crate) const RBC_CHEQUING_ODD: &[f32] = &[45.0, 85.0, 300.0, 400.0, 500.0, 595.0];
pub(crate) const RBC_CHEQUING_EVEN: &[f32] = &[15.0, 55.0, 270.0, 370.0, 470.0, 565.0];
const RBC_VISA_COLUMNS: &[f32] = &[57.0, 95.0, 128.0, 305.0, 350.0];

pub static LAYOUTS: &[StatementLayout] = &[
    StatementLayout {
        institution: "RBC",
        account_type: "Chequing",
        pages: PagePlan::Alternating {
            first: TableSettings {
                crop: Some(Region::new(0.0, 400.0, 612.0, 792.0)),
                columns: RBC_CHEQUING_ODD,
                rows: RowStrategy::Lines { wrap_column: 1 },
            },
            odd: TableSettings {
                crop: None,
                columns: RBC_CHEQUING_ODD,
                rows: RowStrategy::Lines { wrap_column: 1 },
            },
            even: TableSettings {
                crop: None,
                columns: RBC_CHEQUING_EVEN,
                rows: RowStrategy::Lines { wrap_column: 1 },
            },
        },
        columns: &["Date", "Description", "Withdrawals", "Deposits", "Balance"],
        header_rows: 1,
        marker_filter: None,
        mapping: ColumnMapping {
            date: "Date",
            description: "Description",
            amount: AmountColumns::Split {
                debit: "Withdrawals",
                credit: "Deposits",
            },
        },
        patterns: MetadataPatterns {
            reference_year: r"(?i)From\s*[A-Za-z]+\s*\d{1,2},\s*\d{4}\s*to\s*[A-Za-z]+\s*\d{1,2},\s*(\d{4})",
            period_end: r"(?i)From\s*[A-Za-z]+\s*\d{1,2},\s*\d{4}\s*to\s*([A-Za-z]+)\s*\d{1,2},\s*\d{4}",
            opening_balance: r"(?i)Your\s*opening\s*balance\s*on\s*[A-Za-z]+\s*\d{1,2},\s*\d{4}\s*(-?\$?[0-9,]+\.\d{2})",
            closing_balance: r"(?i)Your\s*closing\s*balance\s*on\s*[A-Za-z]+\s*\d{1,2},\s*\d{4}\s*=?\s*(-?\$?[0-9,]+\.\d{2})",
        },
    },
    StatementLayout {
        institution: "RBC",
        account_type: "Visa",
        pages: PagePlan::Uniform(TableSettings {
            crop: Some(Region::new(55.0, 140.0, 350.0, 598.0)),
            columns: RBC_VISA_COLUMNS,
            rows: RowStrategy::Text,
        }),
        columns: &["Transaction Date", "Posting Date", "Activity Description", "Amount"],
        header_rows: 1,
        marker_filter: Some(MarkerFilter {
            column: "Amount",
            marker: '$',
            header_marker: ')',
        }),
        mapping: ColumnMapping {
            date: "Transaction Date",
            description: "Activity Description",
            amount: AmountColumns::Signed { amount: "Amount" },
        },
        patterns: MetadataPatterns {
            reference_year: r"(?i)STATEMENT\s*FROM\s*[A-Z]{3}\s*\d{1,2}(?:,\s*\d{4})?\s*TO\s*[A-Z]{3}\s*\d{1,2},\s*(\d{4})",
            period_end: r"(?i)STATEMENT\s*FROM\s*[A-Z]{3}\s*\d{1,2}(?:,\s*\d{4})?\s*TO\s*([A-Z]{3})\s*\d{1,2},\s*\d{4}",
            opening_balance: r"(?i)PREVIOUS\s*STATEMENT\s*BALANCE\s*(-?\$?[0-9,]+\.\d{2})",
            closing_balance: r"(?i)(CREDIT\s*BALANCE\s*|NEW\s*BALANCE\s*)(-?\$?[0-9,]+\.\d{2})",
        },
    },
];

/// Lookup over a layout table, case-insensitive on both key parts.
#[derive(Debug, Clone, Copy)]
pub struct LayoutRegistry {
    layouts: &'static [StatementLayout],
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self { layouts: LAYOUTS }
    }
}

impl LayoutRegistry {
    pub fn all(&self) -> &'static [StatementLayout] {
        self.layouts
    }

    pub fn supports_institution(&self, institution: &str) -> bool {
        self.layouts
            .iter()
            .any(|l| l.institution.eq_ignore_ascii_case(institution))
    }

    /// Account types registered for an institution, in table order.
    pub fn account_types(&self, institution: &str) -> Vec<&'static str> {
        self.layouts
            .iter()
            .filter(|l| l.institution.eq_ignore_ascii_case(institution))
            .map(|l| l.account_type)
            .collect()
    }

    pub fn lookup(&self, institution: &str, account_type: &str) -> Result<&'static StatementLayout> {
        if !self.supports_institution(institution) {
            return Err(AuditError::UnsupportedInstitution(institution.to_string()));
        }
        self.layouts
            .iter()
            .find(|l| {
                l.institution.eq_ignore_ascii_case(institution)
                    && l.account_type.eq_ignore_ascii_case(account_type)
            })
            .ok_or_else(|| {
                AuditError::UnknownStatementType(format!("{institution} {account_type}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let reg = LayoutRegistry::default();
        let layout = reg.lookup("rbc", "CHEQUING").unwrap();
        assert_eq!(layout.key(), "rbc_chequing");
    }

    #[test]
    fn test_lookup_errors() {
        let reg = LayoutRegistry::default();
        assert!(matches!(
            reg.lookup("TD", "Visa"),
            Err(AuditError::UnsupportedInstitution(_))
        ));
        assert!(matches!(
            reg.lookup("RBC", "Savings"),
            Err(AuditError::UnknownStatementType(_))
        ));
    }

    #[test]
    fn test_alternating_plan_by_page_parity() {
        let layout = LayoutRegistry::default().lookup("RBC", "Chequing").unwrap();
        let first = layout.pages.settings_for_page(0);
        assert!(first.crop.is_some());
        assert_eq!(layout.pages.settings_for_page(1).columns, RBC_CHEQUING_EVEN);
        assert_eq!(layout.pages.settings_for_page(2).columns, RBC_CHEQUING_ODD);
        assert_eq!(layout.pages.settings_for_page(3).columns, RBC_CHEQUING_EVEN);
    }

    #[test]
    fn test_every_layout_geometry_matches_its_columns() {
        for layout in LAYOUTS {
            for page in 0..4 {
                assert_eq!(
                    layout.pages.settings_for_page(page).column_count(),
                    layout.columns.len(),
                    "{}",
                    layout.key()
                );
            }
        }
    }

    #[test]
    fn test_account_types_for_institution() {
        let reg = LayoutRegistry::default();
        assert_eq!(reg.account_types("rbc"), vec!["Chequing", "Visa"]);
        assert!(reg.account_types("td").is_empty());
    }
}
