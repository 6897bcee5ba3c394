use super::CellSpec;
use galley_style::{TextAlign, VerticalAlign};
use galley_types::Color;
use itertools::Itertools;

/// A cell that will receive content, at its final grid position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCell {
    pub row: usize,
    pub col: usize,
    pub rowspan: usize,
    pub colspan: usize,
    pub text: String,
    pub align: Option<TextAlign>,
    pub valign: Option<VerticalAlign>,
    pub shading: Option<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRange {
    pub row: usize,
    pub col: usize,
    pub rowspan: usize,
    pub colspan: usize,
}

impl MergeRange {
    pub fn area(&self) -> usize {
        self.rowspan * self.colspan
    }
}

/// Dense layout of a table: which slot each cell occupies and which slots are
/// covered by spans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridPlan {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<PlannedCell>,
    /// `covered[r][c]` is true when some planned cell occupies the slot.
    pub covered: Vec<Vec<bool>>,
    pub merges: Vec<MergeRange>,
    /// Number of row spans that were flattened into per-row cells.
    pub degraded_spans: usize,
    /// Cells dropped because their row had no free column left.
    pub dropped_cells: usize,
}

impl GridPlan {
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&PlannedCell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }
}

/// Lays sparse rows of cells out on a `rows` × `cols` grid.
///
/// Each row keeps a column cursor that skips slots already covered by a span
/// from an earlier row. Spans are trimmed so they never overlap another cell
/// or leave the grid. A span taller than `max_rowspan` becomes one cell per
/// covered row, the first carrying the text.
pub fn plan_grid(rows: usize, cols: usize, data: &[Vec<CellSpec>], max_rowspan: usize) -> GridPlan {
    let mut plan = GridPlan {
        rows,
        cols,
        covered: vec![vec![false; cols]; rows],
        ..Default::default()
    };

    for (r, row) in data.iter().enumerate().take(rows) {
        let mut col = 0;
        for cell in row {
            while col < cols && plan.covered[r][col] {
                col += 1;
            }
            if col >= cols {
                plan.dropped_cells += 1;
                continue;
            }
            if cell.is_placeholder() {
                col += cell.colspan.max(1);
                continue;
            }

            // Stop the span at the first covered slot to the right ...
            let mut colspan = 1;
            while colspan < cell.colspan && col + colspan < cols && !plan.covered[r][col + colspan] {
                colspan += 1;
            }
            // ... and at the first row below where any of its columns is taken.
            let mut rowspan = 1;
            while rowspan < cell.rowspan
                && r + rowspan < rows
                && (col..col + colspan).all(|c| !plan.covered[r + rowspan][c])
            {
                rowspan += 1;
            }

            if cell.rowspan > max_rowspan {
                log::warn!(
                    "Row span of {} at ({}, {}) exceeds {}; emitting {} separate rows.",
                    cell.rowspan,
                    r,
                    col,
                    max_rowspan,
                    rowspan
                );
                plan.degraded_spans += 1;
                for offset in 0..rowspan {
                    let text = if offset == 0 { cell.text.clone() } else { String::new() };
                    plan.place(cell, r + offset, col, 1, colspan, text);
                }
            } else {
                plan.place(cell, r, col, rowspan, colspan, cell.text.clone());
            }
            col += colspan;
        }
    }

    if plan.dropped_cells > 0 {
        log::warn!("{} table cells did not fit the {}x{} grid and were dropped.", plan.dropped_cells, rows, cols);
    }
    plan
}

impl GridPlan {
    fn place(&mut self, spec: &CellSpec, row: usize, col: usize, rowspan: usize, colspan: usize, text: String) {
        for r in row..row + rowspan {
            for c in col..col + colspan {
                self.covered[r][c] = true;
            }
        }
        if rowspan > 1 || colspan > 1 {
            self.merges.push(MergeRange {
                row,
                col,
                rowspan,
                colspan,
            });
        }
        self.cells.push(PlannedCell {
            row,
            col,
            rowspan,
            colspan,
            text,
            align: spec.align,
            valign: spec.valign,
            shading: spec.shading,
        });
    }
}

/// Merge application order: right-most column first, larger areas first
/// within a column, so earlier merges never shift later ones.
pub fn merge_order(merges: &[MergeRange]) -> Vec<MergeRange> {
    merges
        .iter()
        .copied()
        .sorted_by(|a, b| b.col.cmp(&a.col).then(b.area().cmp(&a.area())))
        .collect()
}
