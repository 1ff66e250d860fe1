use tracing::debug;

use crate::document::StatementDocument;
use crate::error::{AuditError, Result};
use crate::models::RawTable;
use crate::profiles::{MarkerFilter, StatementLayout};

/// Pull one ordered table out of every page of a statement.
///
/// Pages are concatenated in order. A page whose grid comes back empty is treated as
/// blank and dropped; a page whose grid has the wrong width fails the whole document.
pub fn extract_table<D: StatementDocument + ?Sized>(
    doc: &D,
    layout: &StatementLayout,
) -> Result<RawTable> {
    let mut table = RawTable::new(layout.columns);
    let width = layout.columns.len();
    let marker = layout
        .marker_filter
        .map(|f| marker_column(layout, &f).map(|idx| (f, idx)))
        .transpose()?;

    for page in 0..doc.page_count() {
        let settings = layout.pages.settings_for_page(page);
        if settings.column_count() != width {
            return Err(AuditError::Extraction(format!(
                "{}: page {} geometry has {} columns, layout expects {width}",
                layout.key(),
                page + 1,
                settings.column_count(),
            )));
        }

        let Some(grid) = doc.extract_table(page, settings)? else {
            debug!(page = page + 1, "blank page, ignoring");
            continue;
        };

        let mut rows: Vec<Vec<String>> = grid.into_iter().skip(layout.header_rows).collect();
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(AuditError::Extraction(format!(
                "{}: page {} row has {} cells, expected {width}",
                layout.key(),
                page + 1,
                bad.len(),
            )));
        }

        if let Some((filter, idx)) = marker {
            if !rows.iter().any(|r| r[idx].contains(filter.marker)) {
                debug!(page = page + 1, "no amounts on page, treating as disclosure text");
                continue;
            }
            rows.retain(|r| {
                r[idx].contains(filter.marker) && !r[idx].contains(filter.header_marker)
            });
        }

        table.rows.extend(rows);
    }

    Ok(table)
}

fn marker_column(layout: &StatementLayout, filter: &MarkerFilter) -> Result<usize> {
    layout
        .columns
        .iter()
        .position(|c| *c == filter.column)
        .ok_or_else(|| {
            AuditError::Extraction(format!(
                "{}: marker column '{}' is not a layout column",
                layout.key(),
                filter.column
            ))
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::document::{Grid, TableSettings};
    use crate::profiles::{LayoutRegistry, RBC_CHEQUING_EVEN, RBC_CHEQUING_ODD};

    /// In-memory document: one optional grid and one text blob per page.
    pub(crate) struct FakeDocument {
        pub pages: Vec<Option<Grid>>,
        pub first_page_text: String,
        pub checksum: Option<String>,
        /// Geometry handed to `extract_table`, by page.
        pub requested: RefCell<Vec<(usize, TableSettings)>>,
    }

    impl FakeDocument {
        pub fn new(pages: Vec<Option<Grid>>) -> Self {
            Self {
                pages,
                first_page_text: String::new(),
                checksum: None,
                requested: RefCell::new(Vec::new()),
            }
        }

        pub fn with_text(mut self, text: &str) -> Self {
            self.first_page_text = text.to_string();
            self
        }
    }

    impl StatementDocument for FakeDocument {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, page: usize) -> Result<String> {
            Ok(if page == 0 { self.first_page_text.clone() } else { String::new() })
        }

        fn extract_table(&self, page: usize, settings: &TableSettings) -> Result<Option<Grid>> {
            self.requested.borrow_mut().push((page, settings.clone()));
            Ok(self.pages[page].clone())
        }

        fn checksum(&self) -> Option<&str> {
            self.checksum.as_deref()
        }
    }

    pub(crate) fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_chequing_pages_concatenate_and_skip_headers() {
        let layout = LayoutRegistry::default().lookup("RBC", "Chequing").unwrap();
        let header: &[&str] = &["Date", "Description", "Withdrawals ($)", "Deposits ($)", "Balance ($)"];
        let doc = FakeDocument::new(vec![
            Some(grid(&[header, &["12Aug", "TEST-CO", "222.22", "", "888.89"]])),
            None,
            Some(grid(&[header, &["13Aug", "PAYROLL", "", "1000.00", ""]])),
        ]);
        let table = extract_table(&doc, layout).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], "12Aug");
        assert_eq!(table.rows[1][1], "PAYROLL");
    }

    #[test]
    fn test_each_page_gets_its_own_geometry() {
        let layout = LayoutRegistry::default().lookup("RBC", "Chequing").unwrap();
        let doc = FakeDocument::new(vec![None, None, None, None]);
        extract_table(&doc, layout).unwrap();

        let requested = doc.requested.borrow();
        let pages: Vec<usize> = requested.iter().map(|(page, _)| *page).collect();
        assert_eq!(pages, vec![0, 1, 2, 3]);
        assert!(requested[0].1.crop.is_some());
        assert_eq!(requested[1].1.columns, RBC_CHEQUING_EVEN);
        assert!(requested[1].1.crop.is_none());
        assert_eq!(requested[2].1.columns, RBC_CHEQUING_ODD);
        assert!(requested[2].1.crop.is_none());
        assert_eq!(requested[3].1.columns, RBC_CHEQUING_EVEN);
    }

    #[test]
    fn test_visa_drops_disclosure_pages_and_header_rows() {
        let layout = LayoutRegistry::default().lookup("RBC", "Visa").unwrap();
        let header: &[&str] = &["TRANSACTION DATE", "POSTING DATE", "ACTIVITY DESCRIPTION", "AMOUNT"];
        let doc = FakeDocument::new(vec![
            Some(grid(&[
                header,
                &["", "", "", "Amount($)"],
                &["JUN13", "JUN14", "AMAZON.CA", "$11.11"],
                &["", "", "CONTINUED", ""],
                &["", "", "CREDITBALANCE", "-$532.75"],
            ])),
            Some(grid(&[header, &["", "", "Interest rates apply", ""]])),
        ]);
        let table = extract_table(&doc, layout).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][3], "$11.11");
        assert_eq!(table.rows[1][2], "CREDITBALANCE");
    }

    #[test]
    fn test_wrong_width_is_extraction_error() {
        let layout = LayoutRegistry::default().lookup("RBC", "Visa").unwrap();
        let doc = FakeDocument::new(vec![Some(grid(&[
            &["h", "h", "h", "h"],
            &["JUN13", "AMAZON.CA", "$11.11"],
        ]))]);
        let err = extract_table(&doc, layout).unwrap_err();
        assert!(matches!(err, AuditError::Extraction(_)));
    }

    #[test]
    fn test_all_blank_pages_give_empty_table() {
        let layout = LayoutRegistry::default().lookup("RBC", "Chequing").unwrap();
        let doc = FakeDocument::new(vec![None, None]);
        let table = extract_table(&doc, layout).unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(table.columns.len(), 5);
    }
}
