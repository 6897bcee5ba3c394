use galley_traits::{CellEdges, EdgeStroke};
use galley_types::Color;
use serde::{Deserialize, Serialize};

fn yes() -> bool {
    true
}

fn default_weight() -> f32 {
    0.5
}

/// Uniform cell strokes with per-class switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderSpec {
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub color: Color,
    #[serde(default = "yes")]
    pub inner_horizontal: bool,
    #[serde(default = "yes")]
    pub inner_vertical: bool,
    #[serde(default = "yes")]
    pub outer: bool,
    /// Stroke weight of the rule below the last header row.
    #[serde(default)]
    pub header_rule: Option<f32>,
}

impl Default for BorderSpec {
    fn default() -> Self {
        Self {
            weight: default_weight(),
            color: Color::BLACK,
            inner_horizontal: true,
            inner_vertical: true,
            outer: true,
            header_rule: None,
        }
    }
}

/// Position of a cell block inside its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBlock {
    pub row: usize,
    pub col: usize,
    pub rowspan: usize,
    pub colspan: usize,
}

impl BorderSpec {
    fn stroke(&self, enabled: bool) -> EdgeStroke {
        if enabled {
            EdgeStroke {
                weight: self.weight,
                color: self.color,
            }
        } else {
            EdgeStroke::none()
        }
    }

    /// Strokes for the four edges of a cell block in a `rows` × `cols` table.
    pub fn edges_for(&self, block: CellBlock, rows: usize, cols: usize, header_rows: usize) -> CellEdges {
        let last_row = block.row + block.rowspan.max(1);
        let last_col = block.col + block.colspan.max(1);

        let top_outer = block.row == 0;
        let bottom_outer = last_row >= rows;
        let left_outer = block.col == 0;
        let right_outer = last_col >= cols;

        let mut edges = CellEdges {
            top: self.stroke(if top_outer { self.outer } else { self.inner_horizontal }),
            bottom: self.stroke(if bottom_outer { self.outer } else { self.inner_horizontal }),
            left: self.stroke(if left_outer { self.outer } else { self.inner_vertical }),
            right: self.stroke(if right_outer { self.outer } else { self.inner_vertical }),
        };

        if let Some(weight) = self.header_rule.filter(|_| header_rows > 0) {
            let rule = EdgeStroke {
                weight,
                color: self.color,
            };
            if last_row == header_rows {
                edges.bottom = rule;
            }
            if block.row == header_rows {
                edges.top = rule;
            }
        }
        edges
    }
}
