use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

/// Label used to pad shallower lineages up to the batch depth.
pub const LEVEL_SENTINEL: &str = "NONE";

/// Folder lineage identifying one logical account: institution first, then sub-folders.
/// Labels are upper-cased on construction so case-variant folder names share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HierarchyKey(Vec<String>);

impl HierarchyKey {
    pub fn new<I, S>(institution: &str, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut labels = vec![normalize_label(institution)];
        labels.extend(levels.into_iter().map(|l| normalize_label(l.as_ref())));
        Self(labels)
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }

    /// Number of sub-folder levels below the institution.
    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }

    pub fn padded(mut self, depth: usize) -> Self {
        while self.depth() < depth {
            self.0.push(LEVEL_SENTINEL.to_string());
        }
        self
    }
}

impl fmt::Display for HierarchyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" / "))
    }
}

fn normalize_label(label: &str) -> String {
    label.trim().to_uppercase()
}

/// A date truncated to the first day of its month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthStamp(NaiveDate);

impl MonthStamp {
    pub fn from_date(date: NaiveDate) -> Self {
        // Day 1 exists in every month.
        Self(date.with_day(1).unwrap_or(date))
    }

    pub fn from_ym(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn next(&self) -> Self {
        let (y, m) = if self.0.month() == 12 {
            (self.0.year() + 1, 1)
        } else {
            (self.0.year(), self.0.month() + 1)
        };
        Self::from_ym(y, m).unwrap_or(*self)
    }
}

impl fmt::Display for MonthStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl Serialize for MonthStamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.format("%Y-%m-%d").to_string())
    }
}

/// Ordered rows of text cells for one document, named by the layout's raw columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalTransaction {
    pub date: NaiveDate,
    pub description: String,
    /// Signed: money entering the account is positive.
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatementMetadata {
    pub reference_year: i32,
    /// Month the statement period closes in, when the period line names it.
    pub period_end: Option<MonthStamp>,
    pub opening_balance: f64,
    pub closing_balance: f64,
    /// True when the opening-balance pattern was absent and 0.0 was assumed (new account).
    pub opening_defaulted: bool,
}

/// One observed month for a hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageRecord {
    pub key: HierarchyKey,
    pub month: MonthStamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageGroup {
    pub key: HierarchyKey,
    pub min_month: MonthStamp,
    pub max_month: MonthStamp,
    /// First-seen order after de-duplication.
    pub observed_months: Vec<MonthStamp>,
    /// Ascending; empty means full coverage.
    pub gap_months: Vec<MonthStamp>,
}

/// A reconciled transaction tagged with its lineage, ready for the tabular writer.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub key: HierarchyKey,
    pub transaction: CanonicalTransaction,
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_key_normalizes_case() {
        let a = HierarchyKey::new("rbc", ["a", "B"]);
        let b = HierarchyKey::new("RBC", ["A", "b"]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "RBC / A / B");
    }

    #[test]
    fn test_hierarchy_key_padding() {
        let key = HierarchyKey::new("RBC", ["A"]).padded(3);
        assert_eq!(key.labels(), &["RBC", "A", "NONE", "NONE"]);
        assert_eq!(key.depth(), 3);
    }

    #[test]
    fn test_month_stamp_truncates_and_advances() {
        let d = NaiveDate::from_ymd_opt(1999, 12, 13).unwrap();
        let m = MonthStamp::from_date(d);
        assert_eq!(m, MonthStamp::from_ym(1999, 12).unwrap());
        assert_eq!(m.next(), MonthStamp::from_ym(2000, 1).unwrap());
        assert_eq!(m.to_string(), "1999-12");
    }

    #[test]
    fn test_same_month_dates_are_equal_stamps() {
        let a = MonthStamp::from_date(NaiveDate::from_ymd_opt(2020, 8, 2).unwrap());
        let b = MonthStamp::from_date(NaiveDate::from_ymd_opt(2020, 8, 29).unwrap());
        assert_eq!(a, b);
    }
}
