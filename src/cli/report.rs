use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::fmt::{money, month_runs};
use crate::models::{CanonicalTransaction, CoverageGroup};
use crate::pipeline::{BatchReport, StatementOutcome};
use crate::profiles::{AmountColumns, PagePlan, StatementLayout};

// ---------------------------------------------------------------------------
// Pure formatting functions (report data -> String)
// ---------------------------------------------------------------------------

pub fn format_coverage(groups: &[CoverageGroup]) -> String {
    if groups.is_empty() {
        return "No dated statements found.".to_string();
    }
    let depth = groups.iter().map(|g| g.key.depth()).max().unwrap_or(0);

    let mut header = vec!["Institution".to_string()];
    header.extend((1..=depth).map(|i| format!("Level {i}")));
    header.extend(["First", "Last", "Months", "Missing"].map(String::from));

    let mut table = Table::new();
    table.set_header(header);
    for g in groups {
        let mut row: Vec<Cell> = g
            .key
            .clone()
            .padded(depth)
            .labels()
            .iter()
            .map(Cell::new)
            .collect();
        row.push(Cell::new(g.min_month));
        row.push(Cell::new(g.max_month));
        row.push(Cell::new(g.observed_months.len()));
        row.push(if g.gap_months.is_empty() {
            Cell::new("none".green())
        } else {
            Cell::new(month_runs(&g.gap_months).red())
        });
        table.add_row(row);
    }

    let missing: usize = groups.iter().map(|g| g.gap_months.len()).sum();
    let footer = if missing == 0 {
        "Full coverage.".green().bold().to_string()
    } else {
        format!("{missing} missing month(s).").yellow().bold().to_string()
    };
    format!("{table}\n{footer}")
}

pub fn format_summary(report: &BatchReport) -> String {
    let mut lines = vec![format!(
        "{} statements parsed, {} reconciled, {} transactions in ledger",
        report.statements.len(),
        report.reconciled(),
        report.ledger.len()
    )];
    if !report.duplicates.is_empty() {
        lines.push(format!("{} duplicate file(s) skipped", report.duplicates.len()));
    }

    let unreconciled: Vec<_> = report.statements.iter().filter(|s| !s.reconciled).collect();
    if !unreconciled.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Unreconciled", "Opening", "Closing", "Calculated", "Ledger"]);
        for s in unreconciled {
            table.add_row(vec![
                Cell::new(&s.source),
                Cell::new(money(s.opening_balance)),
                Cell::new(money(s.closing_balance)),
                Cell::new(money(s.calculated_balance).red()),
                Cell::new(if s.included { "kept" } else { "excluded" }),
            ]);
        }
        lines.push(table.to_string());
    }

    if !report.failures.is_empty() {
        let counts = report
            .failure_counts()
            .iter()
            .map(|(kind, n)| format!("{kind}: {n}"))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("{} ({counts})", "Failures".red().bold()));
        let mut table = Table::new();
        table.set_header(vec!["Source", "Kind", "Detail"]);
        for f in &report.failures {
            table.add_row(vec![
                Cell::new(&f.source),
                Cell::new(f.kind.label()),
                Cell::new(&f.message),
            ]);
        }
        lines.push(table.to_string());
    }

    lines.join("\n")
}

pub fn format_statement(outcome: &StatementOutcome) -> String {
    let meta = &outcome.metadata;
    let v = &outcome.validation;
    let mut out = format!(
        "Reference year {}\nOpening {}{}  Closing {}\n",
        meta.reference_year,
        money(meta.opening_balance),
        if meta.opening_defaulted { " (assumed)" } else { "" },
        money(meta.closing_balance),
    );
    out.push_str(&format_transactions(&outcome.transactions));
    out.push('\n');
    if v.is_reconciled {
        out.push_str(&"Reconciled.".green().bold().to_string());
    } else {
        out.push_str(
            &format!(
                "Does not reconcile: calculated {}, off by {}",
                money(v.calculated_balance),
                money(v.discrepancy)
            )
            .red()
            .bold()
            .to_string(),
        );
    }
    out
}

pub fn format_transactions(transactions: &[CanonicalTransaction]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Amount"]);
    for t in transactions {
        let amount = money(t.amount);
        table.add_row(vec![
            Cell::new(t.date.format("%Y-%m-%d")),
            Cell::new(t.description.replace('\n', " ")),
            if t.amount < 0.0 {
                Cell::new(amount.red())
            } else {
                Cell::new(amount.green())
            },
        ]);
    }
    table.to_string()
}

pub fn format_profiles(layouts: &[StatementLayout]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Institution", "Account type", "Pages", "Columns", "Amounts"]);
    for l in layouts {
        let pages = match l.pages {
            PagePlan::Alternating { .. } => "first / odd / even",
            PagePlan::Uniform(_) => "uniform",
        };
        let amounts = match l.mapping.amount {
            AmountColumns::Signed { amount } => format!("signed '{amount}'"),
            AmountColumns::Split { debit, credit } => format!("'{credit}' - '{debit}'"),
        };
        table.add_row(vec![
            Cell::new(l.institution),
            Cell::new(l.account_type),
            Cell::new(pages),
            Cell::new(l.columns.join(", ")),
            Cell::new(amounts),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HierarchyKey, MonthStamp};
    use crate::profiles::LAYOUTS;

    fn m(y: i32, mo: u32) -> MonthStamp {
        MonthStamp::from_ym(y, mo).unwrap()
    }

    #[test]
    fn test_format_coverage_lists_gaps() {
        colored::control::set_override(false);
        let groups = vec![
            CoverageGroup {
                key: HierarchyKey::new("RBC", ["Joint", "Chequing"]),
                min_month: m(1999, 11),
                max_month: m(2000, 3),
                observed_months: vec![m(1999, 11), m(2000, 2), m(2000, 3)],
                gap_months: vec![m(1999, 12), m(2000, 1)],
            },
            CoverageGroup {
                key: HierarchyKey::new("RBC", ["Visa"]),
                min_month: m(2000, 1),
                max_month: m(2000, 1),
                observed_months: vec![m(2000, 1)],
                gap_months: vec![],
            },
        ];
        let out = format_coverage(&groups);
        assert!(out.contains("Level 2"));
        assert!(out.contains("1999-12..2000-01"));
        assert!(out.contains("NONE"));
        assert!(out.contains("2 missing month(s)."));
    }

    #[test]
    fn test_format_coverage_empty() {
        assert_eq!(format_coverage(&[]), "No dated statements found.");
    }

    #[test]
    fn test_format_profiles_lists_every_layout() {
        let out = format_profiles(LAYOUTS);
        assert!(out.contains("Chequing"));
        assert!(out.contains("Visa"));
        assert!(out.contains("'Deposits' - 'Withdrawals'"));
    }
}
