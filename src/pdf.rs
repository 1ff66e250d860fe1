use std::io::BufWriter;

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfPageIndex, Point,
};

use crate::error::{AuditError, Result};
use crate::fmt::{money, month_runs};
use crate::models::CoverageGroup;
use crate::pipeline::BatchReport;

// US Letter, landscape (mm)
const PAGE_W: f32 = 279.4;
const PAGE_H: f32 = 215.9;
const MARGIN: f32 = 15.0;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 10.0;

/// Rough Helvetica advance per character, in mm per point of font size.
const CHAR_W: f32 = 0.18;

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

impl Col {
    const fn left(width: f32) -> Self {
        Self { width, align: Align::Left }
    }

    const fn right(width: f32) -> Self {
        Self { width, align: Align::Right }
    }

    fn max_chars(&self) -> usize {
        ((self.width - 2.0) / (FONT_SIZE * CHAR_W)).max(1.0) as usize
    }
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    page: PdfPageIndex,
    layer: PdfLayerIndex,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AuditError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AuditError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            page,
            layer,
            y: MARGIN,
        })
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
            self.page = page;
            self.layer = layer;
            self.y = MARGIN;
        }
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        self.doc
            .get_page(self.page)
            .get_layer(self.layer)
            .use_text(s, size, Mm(x), Mm(PAGE_H - self.y), font);
    }

    fn rule(&mut self) {
        let layer = self.doc.get_page(self.page).get_layer(self.layer);
        layer.set_outline_thickness(0.5);
        let y = Mm(PAGE_H - self.y);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), y), false),
                (Point::new(Mm(PAGE_W - MARGIN), y), false),
            ],
            is_closed: false,
        });
        self.y += 2.0;
    }

    fn header(&mut self, title: &str, subtitle: &str) {
        self.text(title, MARGIN, TITLE_SIZE, true);
        self.y += 7.0;
        if !subtitle.is_empty() {
            self.text(subtitle, MARGIN, SUBTITLE_SIZE, false);
            self.y += 5.0;
        }
        let ts = chrono::Local::now()
            .format("Generated %Y-%m-%d %H:%M")
            .to_string();
        self.text(&ts, MARGIN, 8.0, false);
        self.y += 5.0;
        self.rule();
        self.y += 3.0;
    }

    fn section(&mut self, label: &str) {
        self.ensure_space(ROW_H * 3.0);
        self.text(label, MARGIN, SUBTITLE_SIZE, true);
        self.y += ROW_H + 1.0;
    }

    fn cells(&mut self, cols: &[Col], values: &[&str], bold: bool) {
        self.ensure_space(ROW_H);
        let mut x = MARGIN;
        for (col, value) in cols.iter().zip(values) {
            match col.align {
                Align::Left => self.text(value, x, FONT_SIZE, bold),
                Align::Right => {
                    let tw = value.chars().count() as f32 * FONT_SIZE * CHAR_W;
                    self.text(value, x + col.width - tw, FONT_SIZE, bold);
                }
            }
            x += col.width;
        }
        self.y += ROW_H;
    }

    fn table_header(&mut self, cols: &[Col], headers: &[&str]) {
        self.ensure_space(ROW_H * 2.0);
        self.cells(cols, headers, true);
        self.rule();
    }

    /// One logical row; left-aligned cells that overflow wrap onto continuation lines.
    fn table_row(&mut self, cols: &[Col], values: &[&str]) {
        let wrapped: Vec<Vec<String>> = cols
            .iter()
            .zip(values)
            .map(|(col, value)| match col.align {
                Align::Left => wrap(value, col.max_chars()),
                Align::Right => vec![value.to_string()],
            })
            .collect();
        let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);
        for line in 0..height {
            let row: Vec<&str> = wrapped
                .iter()
                .map(|cell| cell.get(line).map(String::as_str).unwrap_or(""))
                .collect();
            self.cells(cols, &row, false);
        }
    }

    fn note(&mut self, text: &str) {
        self.ensure_space(ROW_H);
        self.text(text, MARGIN, FONT_SIZE, false);
        self.y += ROW_H;
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| AuditError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| AuditError::Pdf(e.to_string()))
    }
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn coverage_table(pdf: &mut PdfWriter, groups: &[CoverageGroup]) {
    let cols = [
        Col::left(80.0),
        Col::left(22.0),
        Col::left(22.0),
        Col::right(18.0),
        Col::left(107.4),
    ];
    pdf.table_header(&cols, &["Account", "First", "Last", "Months", "Missing"]);
    for g in groups {
        let missing = if g.gap_months.is_empty() {
            "none".to_string()
        } else {
            month_runs(&g.gap_months)
        };
        pdf.table_row(
            &cols,
            &[
                &g.key.to_string(),
                &g.min_month.to_string(),
                &g.max_month.to_string(),
                &g.observed_months.len().to_string(),
                &missing,
            ],
        );
    }
}

/// Coverage, reconciliation and failure summary for a parsed archive.
pub fn render_coverage(report: &BatchReport, subtitle: &str) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new("Statement Coverage")?;
    pdf.header("Statement Coverage", subtitle);

    pdf.section("Summary");
    pdf.note(&format!(
        "{} statements parsed, {} reconciled, {} failed, {} duplicates",
        report.statements.len(),
        report.reconciled(),
        report.failures.len(),
        report.duplicates.len(),
    ));
    for (kind, count) in report.failure_counts() {
        pdf.note(&format!("  {kind}: {count}"));
    }
    pdf.y += ROW_H;

    pdf.section("Coverage");
    coverage_table(&mut pdf, &report.coverage);
    pdf.y += ROW_H;

    let unreconciled: Vec<_> = report.statements.iter().filter(|s| !s.reconciled).collect();
    if !unreconciled.is_empty() {
        pdf.section("Unreconciled statements");
        let cols = [
            Col::left(120.0),
            Col::right(34.0),
            Col::right(34.0),
            Col::right(34.0),
            Col::left(27.4),
        ];
        pdf.table_header(&cols, &["Source", "Opening", "Closing", "Calculated", "  Ledger"]);
        for s in unreconciled {
            let ledger = if s.included { "  kept" } else { "  excluded" };
            pdf.table_row(
                &cols,
                &[
                    &s.source,
                    &money(s.opening_balance),
                    &money(s.closing_balance),
                    &money(s.calculated_balance),
                    ledger,
                ],
            );
        }
        pdf.y += ROW_H;
    }

    if !report.failures.is_empty() {
        pdf.section("Failures");
        let cols = [Col::left(90.0), Col::left(35.0), Col::left(124.4)];
        pdf.table_header(&cols, &["Source", "Kind", "Detail"]);
        for f in &report.failures {
            pdf.table_row(&cols, &[&f.source, f.kind.label(), &f.message]);
        }
    }

    pdf.to_bytes()
}

/// Coverage from file-name dates only.
pub fn render_filename_coverage(groups: &[CoverageGroup], subtitle: &str) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new("Statement File Coverage")?;
    pdf.header("Statement File Coverage", subtitle);
    coverage_table(&mut pdf, groups);
    pdf.to_bytes()
}
