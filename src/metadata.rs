use regex::Regex;

use crate::document::StatementDocument;
use crate::error::{AuditError, Result};
use crate::models::{MonthStamp, StatementMetadata};
use crate::profiles::{MetadataPatterns, StatementLayout};
use crate::standardizer::month_number;

/// Read the reference year and balances from a statement's first page.
pub fn extract_metadata<D: StatementDocument + ?Sized>(
    doc: &D,
    layout: &StatementLayout,
) -> Result<StatementMetadata> {
    if doc.page_count() == 0 {
        return Err(AuditError::Extraction("document has no pages".to_string()));
    }
    let text = doc.page_text(0)?;
    parse_metadata(&text, &layout.patterns)
}

pub fn parse_metadata(text: &str, patterns: &MetadataPatterns) -> Result<StatementMetadata> {
    let year_raw = last_capture(patterns.reference_year, text)?.ok_or_else(|| {
        AuditError::MetadataParse {
            field: "reference year",
            detail: "statement period not found".to_string(),
        }
    })?;
    let reference_year: i32 = year_raw.parse().map_err(|_| AuditError::MetadataParse {
        field: "reference year",
        detail: format!("'{year_raw}' is not a year"),
    })?;
    let period_end = last_capture(patterns.period_end, text)?
        .and_then(|name| month_number(&name))
        .and_then(|month| MonthStamp::from_ym(reference_year, month));

    // A missing opening balance means the account opened during this period.
    let (opening_balance, opening_defaulted) =
        match last_capture(patterns.opening_balance, text)? {
            Some(raw) => (parse_balance(&raw, "opening balance")?, false),
            None => (0.0, true),
        };

    let closing_raw = last_capture(patterns.closing_balance, text)?.ok_or_else(|| {
        AuditError::MetadataParse {
            field: "closing balance",
            detail: "pattern did not match".to_string(),
        }
    })?;
    let closing_balance = parse_balance(&closing_raw, "closing balance")?;

    Ok(StatementMetadata {
        reference_year,
        period_end,
        opening_balance,
        closing_balance,
        opening_defaulted,
    })
}

/// Strip the currency symbol and thousands separators, then parse.
pub fn clean_amount(raw: &str) -> Option<f64> {
    let s = raw.trim().replace(['$', ','], "");
    s.trim().parse().ok()
}

fn parse_balance(raw: &str, field: &'static str) -> Result<f64> {
    clean_amount(raw).ok_or_else(|| AuditError::MetadataParse {
        field,
        detail: format!("'{raw}' is not an amount"),
    })
}

fn last_capture(pattern: &str, text: &str) -> Result<Option<String>> {
    let re = Regex::new(pattern)
        .map_err(|e| AuditError::Other(format!("bad metadata pattern {pattern}: {e}")))?;
    Ok(re.captures(text).and_then(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .last()
            .map(|m| m.as_str().to_string())
    }))
}
