//! Plain data records held by [`crate::MemoryDocument`].

use galley_traits::{BreakKind, CellEdges, CellFormat, CharFormat, NoteKind, ParagraphFormat, TextWrap};
use galley_types::{
    ContainerId, GraphicId, Margins, NoteId, PageId, Rect, Size, SpreadId, StoryId, TableId,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub spread: SpreadId,
    /// Pages are positioned at the origin; only their size matters.
    pub bounds: Rect,
    pub margins: Margins,
}

impl Page {
    pub fn margin_box(&self) -> Rect {
        self.bounds.inset(&self.margins)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Spread {
    pub id: SpreadId,
    pub pages: Vec<PageId>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: ContainerId,
    pub page: PageId,
    pub story: StoryId,
    pub bounds: Rect,
    pub inset: Margins,
    pub next: Option<ContainerId>,
    pub prev: Option<ContainerId>,
    /// Number of composed pieces (lines, graphics, table rows) shown here.
    pub pieces: usize,
    pub last_baseline: Option<f32>,
}

impl Container {
    pub fn inner(&self) -> Rect {
        self.bounds.inset(&self.inset)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "item")]
pub enum StoryItem {
    Text { text: String, format: CharFormat },
    Break { kind: BreakKind },
    ParagraphFormat { format: ParagraphFormat },
    Inline { graphic: GraphicId },
    Table { table: TableId },
    NoteRef { note: NoteId },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub containers: Vec<ContainerId>,
    pub items: Vec<StoryItem>,
    pub overflows: bool,
    pub tail: Option<ContainerId>,
    /// Content was added since the last composition.
    #[serde(skip)]
    pub dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GraphicPlacement {
    /// A free frame on a page.
    Page(PageId),
    /// Anchored inline in a story; `page` is filled in by composition.
    Inline { story: StoryId, page: Option<PageId> },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Graphic {
    pub id: GraphicId,
    pub placement: GraphicPlacement,
    pub bounds: Rect,
    pub natural_size: Size,
    pub asset: Option<PathBuf>,
    pub wrap: TextWrap,
    pub fitted: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub text: String,
    pub format: CellFormat,
    pub edges: CellEdges,
    /// Anchor of the merged block this cell was absorbed into.
    pub merged_into: Option<(usize, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Merge {
    pub row: usize,
    pub col: usize,
    pub rowspan: usize,
    pub colspan: usize,
}

impl Merge {
    pub fn covers(&self, row: usize, col: usize) -> bool {
        row >= self.row && row < self.row + self.rowspan && col >= self.col && col < self.col + self.colspan
    }

    pub fn overlaps(&self, other: &Merge) -> bool {
        self.row < other.row + other.rowspan
            && other.row < self.row + self.rowspan
            && self.col < other.col + other.colspan
            && other.col < self.col + self.colspan
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: TableId,
    pub story: StoryId,
    pub rows: usize,
    pub cols: usize,
    pub header_rows: usize,
    pub cells: Vec<Vec<Cell>>,
    pub column_widths: Vec<f32>,
    pub row_heights: Vec<Option<f32>>,
    pub merges: Vec<Merge>,
}

impl Table {
    pub fn width(&self) -> f32 {
        self.column_widths.iter().sum()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    pub fn merge_at(&self, row: usize, col: usize) -> Option<&Merge> {
        self.merges.iter().find(|m| m.row == row && m.col == col)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub kind: NoteKind,
    pub story: StoryId,
    pub content: String,
}
