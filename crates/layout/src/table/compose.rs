//! Builds a planned table in the host and flows it.

use super::borders::CellBlock;
use super::grid::{GridPlan, merge_order, plan_grid};
use super::widths::{clamp_min_widths, even_widths, resolve_column_widths};
use super::TableSpec;
use crate::LayoutError;
use crate::composer::Composer;
use crate::flow::FlowReport;
use crate::state::{PartialLayout, states_equal};
use crate::strategy::{attempt, describe_failures, try_in_order};
use galley_traits::{BreakKind, CellFormat, ColumnWidth, DocumentHost};
use galley_types::TableId;

#[derive(Debug, Clone, PartialEq)]
pub struct TableOutcome {
    pub table: TableId,
    /// Widths handed to the host, one per realized column.
    pub widths: Vec<f32>,
    pub degraded_spans: usize,
    pub merges_failed: usize,
    /// The resolved widths could not be applied and the columns were divided
    /// evenly instead.
    pub widths_fallback: bool,
    pub flow: FlowReport,
}

impl<H: DocumentHost> Composer<H> {
    /// Composes a table at the end of the active story.
    ///
    /// A table asking for a different layout starts on a new page with that
    /// layout; the default layout is restored once the table has settled.
    /// Cell, merge, width and border failures degrade the table instead of
    /// failing it.
    pub fn place_table(&mut self, spec: &TableSpec) -> Result<TableOutcome, LayoutError> {
        let (rows, cols) = spec.dimensions();
        if rows == 0 || cols == 0 {
            return Err(LayoutError::InvalidSpec(format!("table of {}x{} cells", rows, cols)));
        }

        if let Some(layout) = &spec.layout {
            self.switch_layout_for_table(layout)?;
        }
        self.close_paragraph()?;
        self.break_if_table_wont_fit(spec)?;

        let story = self.cursor.story;
        let header_rows = spec.header_rows.min(rows);
        let table = self.host.insert_table(story, rows, cols, header_rows)?;
        let plan = plan_grid(rows, cols, &spec.data, self.config.max_rowspan_inline);
        let inset = spec.cell_inset;
        self.populate_cells(table, &plan, inset);

        let container = self.cursor.container;
        let inner = self
            .host
            .container_bounds(container)?
            .inset(&self.host.container_inset(container)?);
        let (widths, widths_fallback) = self.apply_column_widths(table, spec, cols, inner.width)?;

        if let Some(heights) = spec.row_heights.as_ref().filter(|h| h.len() == rows) {
            for (row, height) in heights.iter().enumerate() {
                if let Err(e) = self.host.set_row_height(table, row, *height) {
                    log::warn!("Could not set height of row {} in {}: {}", row, table, e);
                }
            }
        }

        let merges_failed = self.apply_merges(table, &plan, inset);

        if let Some(borders) = &spec.borders {
            // Slots no source cell reached (short rows) are stroked as 1x1 blocks.
            let padding = (0..rows)
                .flat_map(|row| (0..cols).map(move |col| (row, col)))
                .filter(|(row, col)| !plan.covered[*row][*col])
                .map(|(row, col)| CellBlock {
                    row,
                    col,
                    rowspan: 1,
                    colspan: 1,
                });
            let blocks = plan
                .cells
                .iter()
                .map(|cell| CellBlock {
                    row: cell.row,
                    col: cell.col,
                    rowspan: cell.rowspan,
                    colspan: cell.colspan,
                })
                .chain(padding);
            for block in blocks {
                let edges = borders.edges_for(block, rows, cols, header_rows);
                if let Err(e) = self.host.set_cell_edges(table, block.row, block.col, &edges) {
                    log::warn!("Could not stroke cell ({}, {}) of {}: {}", block.row, block.col, table, e);
                }
            }
        }

        self.host.insert_break(story, BreakKind::Paragraph)?;
        self.cursor.at_paragraph_start = true;
        let flow = self.flush_overflow()?;
        if flow.settled() {
            self.restore_pending_layout()?;
        } else if self.cursor.pending_restore.is_some() {
            log::warn!("{} still overflows; keeping its layout for now.", table);
        }

        log::debug!(
            "Placed {} ({}x{}, {} merges, {} degraded spans).",
            table,
            rows,
            cols,
            plan.merges.len(),
            plan.degraded_spans
        );
        Ok(TableOutcome {
            table,
            widths,
            degraded_spans: plan.degraded_spans,
            merges_failed,
            widths_fallback,
            flow,
        })
    }

    /// Returns to the default layout after a table layout switch, on a new page.
    pub(crate) fn restore_pending_layout(&mut self) -> Result<bool, LayoutError> {
        let Some(restore) = self.cursor.pending_restore.take() else {
            return Ok(false);
        };
        if states_equal(&self.cursor.layout, &restore) {
            return Ok(false);
        }
        self.host.insert_break(self.cursor.story, BreakKind::Page)?;
        self.cursor.at_paragraph_start = true;
        let switched = self.ensure_layout(&PartialLayout::from(restore))?;
        log::debug!("Restored {} layout after table.", restore.orientation);
        Ok(switched)
    }

    fn switch_layout_for_table(&mut self, layout: &PartialLayout) -> Result<(), LayoutError> {
        let target = layout.resolve(&self.cursor.layout);
        if states_equal(&self.cursor.layout, &target) {
            return Ok(());
        }
        // Pending overflow must land in the current layout, not the new one.
        self.flush_overflow()?;
        let restore = self.default_layout;
        self.host.insert_break(self.cursor.story, BreakKind::Page)?;
        self.cursor.at_paragraph_start = true;
        if self.ensure_layout(&PartialLayout::from(target))? {
            self.cursor.pending_restore.get_or_insert(restore);
        }
        Ok(())
    }

    /// Starts a fresh container when the table is not expected to fit below
    /// the last composed line.
    fn break_if_table_wont_fit(&mut self, spec: &TableSpec) -> Result<(), LayoutError> {
        let story = self.cursor.story;
        self.host.recompose(story)?;
        let container = self.cursor.container;
        // Content already moved on to a later, empty container.
        if self.host.story_tail_container(story)? != Some(container) {
            return Ok(());
        }
        let Some(baseline) = self.host.last_baseline(container)? else {
            return Ok(());
        };
        let inner = self
            .host
            .container_bounds(container)?
            .inset(&self.host.container_inset(container)?);
        let remaining = inner.bottom() - baseline;
        let needed = spec.estimated_height(self.config.approx_line_height, self.config.header_padding);
        if needed > remaining {
            log::debug!(
                "Table needs ~{:.1}pt but {} has {:.1}pt left; breaking.",
                needed,
                container,
                remaining
            );
            self.host.insert_break(story, BreakKind::Frame)?;
        }
        Ok(())
    }

    fn populate_cells(&mut self, table: TableId, plan: &GridPlan, inset: Option<f32>) {
        for cell in &plan.cells {
            if !cell.text.is_empty() {
                if let Err(e) = self.host.set_cell_text(table, cell.row, cell.col, &cell.text) {
                    log::warn!("Skipping cell ({}, {}) in {}: {}", cell.row, cell.col, table, e);
                    continue;
                }
            }
            let format = CellFormat {
                align: cell.align,
                valign: cell.valign,
                shading: cell.shading,
                inset,
            };
            if format.is_empty() {
                continue;
            }
            if let Err(e) = self.host.set_cell_format(table, cell.row, cell.col, &format) {
                log::warn!("Could not format cell ({}, {}) in {}: {}", cell.row, cell.col, table, e);
            }
        }
    }

    /// Merges right to left and restores the anchor cell formats the merge
    /// cleared. Returns the number of merges the host refused.
    fn apply_merges(&mut self, table: TableId, plan: &GridPlan, inset: Option<f32>) -> usize {
        let mut failed = 0;
        for merge in merge_order(&plan.merges) {
            if let Err(e) = self
                .host
                .merge_cells(table, merge.row, merge.col, merge.rowspan, merge.colspan)
            {
                log::warn!(
                    "Could not merge {}x{} at ({}, {}) in {}: {}",
                    merge.rowspan,
                    merge.colspan,
                    merge.row,
                    merge.col,
                    table,
                    e
                );
                failed += 1;
                continue;
            }
            if let Some(cell) = plan.cell_at(merge.row, merge.col) {
                let format = CellFormat {
                    align: cell.align,
                    valign: cell.valign,
                    shading: cell.shading,
                    inset,
                };
                if format.is_empty() {
                    continue;
                }
                if let Err(e) = self.host.set_cell_format(table, merge.row, merge.col, &format) {
                    log::warn!("Could not reformat merged cell ({}, {}): {}", merge.row, merge.col, e);
                }
            }
        }
        failed
    }

    /// Resolves and applies column widths. The second value is true when the
    /// even fallback was used.
    fn apply_column_widths(
        &mut self,
        table: TableId,
        spec: &TableSpec,
        cols: usize,
        inner_width: f32,
    ) -> Result<(Vec<f32>, bool), LayoutError> {
        let mut widths = resolve_column_widths(
            cols,
            spec.col_width_frac.as_deref(),
            spec.col_widths_pt.as_deref(),
            spec.width_policy,
            inner_width,
        );
        clamp_min_widths(&mut widths, self.config.min_column_width, self.config.min_column_fraction);

        let realized = self.host.table_column_count(table)?;
        if realized == cols && self.set_widths(table, &widths) {
            return Ok((widths, false));
        }
        if realized != cols {
            log::warn!("{} has {} columns instead of {}; dividing evenly.", table, realized, cols);
        }

        let even = even_widths(realized, inner_width);
        if !self.set_widths(table, &even) {
            log::warn!("Even column widths were also refused for {}.", table);
        }
        Ok((even, true))
    }

    fn set_widths(&mut self, table: TableId, widths: &[f32]) -> bool {
        widths.iter().enumerate().all(|(col, width)| {
            let width = *width;
            let applied = try_in_order(
                &mut self.host,
                "column width",
                vec![
                    attempt("points", move |h: &mut H| h.set_column_width(table, col, &ColumnWidth::Points(width))),
                    attempt("measure", move |h: &mut H| {
                        h.set_column_width(table, col, &ColumnWidth::Measure(format!("{:.2}pt", width)))
                    }),
                    attempt("number", move |h: &mut H| {
                        h.set_column_width(table, col, &ColumnWidth::Number(f64::from(width)))
                    }),
                ],
            );
            match applied {
                Ok((via, ())) => {
                    log::trace!("Column {} of {} set to {:.2}pt via {}.", col, table, width, via);
                    true
                }
                Err(failures) => {
                    log::warn!("Column {} of {}: {}", col, table, describe_failures(&failures));
                    false
                }
            }
        })
    }
}
