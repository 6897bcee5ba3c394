//! Table Composition Engine.
//!
//! A [`TableSpec`] describes cells row by row with optional spans. The grid
//! planner turns that into a dense matrix with every spanned slot marked,
//! widths are resolved against the active container, and the table is built,
//! merged, bordered and flowed through the host.

mod borders;
mod compose;
mod grid;
mod widths;

pub use borders::BorderSpec;
pub use compose::TableOutcome;
pub use grid::{GridPlan, MergeRange, PlannedCell, merge_order, plan_grid};
pub use widths::{clamp_min_widths, even_widths, resolve_column_widths};

use crate::state::PartialLayout;
use galley_style::{TextAlign, VerticalAlign};
use galley_types::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidthPolicy {
    /// Explicit widths are rescaled to fill the available width.
    #[default]
    Fit,
    /// Explicit widths are kept unless they exceed the available width.
    Exact,
    /// Columns share the available width evenly.
    Even,
}

fn one() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellObject {
    #[serde(default)]
    text: String,
    #[serde(default = "one")]
    rowspan: usize,
    #[serde(default = "one")]
    colspan: usize,
    #[serde(default)]
    align: Option<TextAlign>,
    #[serde(default)]
    valign: Option<VerticalAlign>,
    #[serde(default)]
    shading: Option<Color>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CellRepr {
    Text(String),
    Full(CellObject),
    Scalar(serde_json::Value),
}

/// One entry of a table row. A span of 0 marks a placeholder that emits
/// nothing but still advances the column cursor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "CellRepr")]
pub struct CellSpec {
    pub text: String,
    pub rowspan: usize,
    pub colspan: usize,
    pub align: Option<TextAlign>,
    pub valign: Option<VerticalAlign>,
    pub shading: Option<Color>,
}

impl CellSpec {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rowspan: 1,
            colspan: 1,
            align: None,
            valign: None,
            shading: None,
        }
    }

    pub fn spanning(text: impl Into<String>, rowspan: usize, colspan: usize) -> Self {
        Self {
            rowspan,
            colspan,
            ..Self::text(text)
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.rowspan == 0 || self.colspan == 0
    }
}

impl From<CellRepr> for CellSpec {
    fn from(repr: CellRepr) -> Self {
        match repr {
            CellRepr::Text(text) => CellSpec::text(text),
            CellRepr::Full(obj) => CellSpec {
                text: obj.text,
                rowspan: obj.rowspan,
                colspan: obj.colspan,
                align: obj.align,
                valign: obj.valign,
                shading: obj.shading,
            },
            CellRepr::Scalar(serde_json::Value::Null) => CellSpec::text(""),
            CellRepr::Scalar(other) => CellSpec::text(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableSpec {
    /// Row count; inferred from `data` when 0.
    pub rows: usize,
    /// Column count; inferred from the widest row of `data` when 0.
    pub cols: usize,
    pub data: Vec<Vec<CellSpec>>,
    pub header_rows: usize,
    #[serde(alias = "colWidths")]
    pub col_widths_pt: Option<Vec<f32>>,
    pub col_width_frac: Option<Vec<f32>>,
    pub width_policy: WidthPolicy,
    pub borders: Option<BorderSpec>,
    /// Page layout the table needs; the previous layout is restored after it.
    pub layout: Option<PartialLayout>,
    pub cell_inset: Option<f32>,
    pub row_heights: Option<Vec<f32>>,
}

impl TableSpec {
    /// Row and column counts, falling back to what `data` implies.
    pub fn dimensions(&self) -> (usize, usize) {
        let rows = if self.rows > 0 { self.rows } else { self.data.len() };
        let cols = if self.cols > 0 {
            self.cols
        } else {
            self.data
                .iter()
                .map(|row| row.iter().map(|c| c.colspan.max(1)).sum::<usize>())
                .max()
                .unwrap_or(0)
        };
        (rows, cols)
    }

    /// Height the table is expected to need before it is composed.
    pub fn estimated_height(&self, approx_line_height: f32, header_padding: f32) -> f32 {
        let (rows, _) = self.dimensions();
        let body = match &self.row_heights {
            Some(heights) if heights.len() == rows => heights.iter().sum(),
            _ => rows as f32 * approx_line_height,
        };
        body + if self.header_rows > 0 { header_padding } else { 0.0 }
    }
}
