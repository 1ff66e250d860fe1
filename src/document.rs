use crate::error::Result;

/// Rows of text cells for one page.
pub type Grid = Vec<Vec<String>>;

/// Page area in PDF points, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl Region {
    pub const fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self { x0, top, x1, bottom }
    }

    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }
}

/// How visual text lines become table rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowStrategy {
    /// Every visual line is its own row.
    Text,
    /// Ruled tables: a line carrying text only in `wrap_column` continues the row above.
    Lines { wrap_column: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSettings {
    pub crop: Option<Region>,
    /// Explicit vertical boundaries; n boundaries make n - 1 columns.
    pub columns: &'static [f32],
    pub rows: RowStrategy,
}

impl TableSettings {
    pub fn column_count(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }
}

/// A positioned word as reported by the text layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
    pub text: String,
}

impl Word {
    fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.top + self.bottom) / 2.0)
    }
}

/// Table-extraction primitive for one statement file.
pub trait StatementDocument {
    fn page_count(&self) -> usize;

    /// Plain text of a page, lines separated by `\n`.
    fn page_text(&self, page: usize) -> Result<String>;

    /// Grid for a page, or `None` when nothing in the region forms a row.
    fn extract_table(&self, page: usize, settings: &TableSettings) -> Result<Option<Grid>>;

    /// Content fingerprint used to spot byte-identical copies.
    fn checksum(&self) -> Option<&str> {
        None
    }
}

/// Words whose vertical centres are this close (points) sit on one line.
const LINE_TOLERANCE: f32 = 3.0;

/// Slice a page's words into a grid using explicit column boundaries.
pub fn build_grid(words: &[Word], settings: &TableSettings) -> Option<Grid> {
    let ncols = settings.column_count();
    if ncols == 0 {
        return None;
    }

    let mut placed: Vec<(usize, &Word)> = words
        .iter()
        .filter(|w| {
            let (cx, cy) = w.center();
            settings.crop.map_or(true, |r| r.contains(cx, cy))
        })
        .filter_map(|w| column_for(w.center().0, settings.columns).map(|c| (c, w)))
        .collect();
    if placed.is_empty() {
        return None;
    }
    placed.sort_by(|a, b| {
        a.1.top
            .partial_cmp(&b.1.top)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.x0.partial_cmp(&b.1.x0).unwrap_or(std::cmp::Ordering::Equal))
    });

    // Cluster into visual lines.
    let mut lines: Vec<Vec<(usize, &Word)>> = Vec::new();
    let mut line_center = f32::MIN;
    for (col, word) in placed {
        let cy = word.center().1;
        match lines.last_mut() {
            Some(line) if (cy - line_center).abs() <= LINE_TOLERANCE => line.push((col, word)),
            _ => {
                lines.push(vec![(col, word)]);
                line_center = cy;
            }
        }
    }

    let mut grid: Grid = Vec::with_capacity(lines.len());
    for mut line in lines {
        line.sort_by(|a, b| a.1.x0.partial_cmp(&b.1.x0).unwrap_or(std::cmp::Ordering::Equal));
        let mut row = vec![String::new(); ncols];
        for (col, word) in line {
            if !row[col].is_empty() {
                row[col].push(' ');
            }
            row[col].push_str(&word.text);
        }

        if let RowStrategy::Lines { wrap_column } = settings.rows {
            let continues = row
                .iter()
                .enumerate()
                .all(|(i, cell)| i == wrap_column || cell.is_empty());
            if continues {
                if let Some(prev) = grid.last_mut() {
                    if let Some(cell) = prev.get_mut(wrap_column) {
                        if !cell.is_empty() {
                            cell.push('\n');
                        }
                        cell.push_str(&row[wrap_column]);
                        continue;
                    }
                }
            }
        }
        grid.push(row);
    }
    Some(grid)
}

fn column_for(x: f32, boundaries: &[f32]) -> Option<usize> {
    boundaries
        .windows(2)
        .position(|edge| x >= edge[0] && x < edge[1])
}
