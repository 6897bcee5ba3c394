//! DocumentHost trait for abstracting the paginated document model.
//!
//! The composition engine never owns pages or text itself. It drives a host
//! (a desktop-publishing document, or the in-memory model used in tests and the
//! CLI) through this trait. Every call can fail; the engine decides whether a
//! failure degrades a feature, skips a content unit, or aborts.

use galley_style::{TextAlign, VerticalAlign};
use galley_types::{
    Color, ContainerId, GraphicId, Margins, NoteId, PageId, Rect, Size, SpreadId, StoryId, TableId,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for host document operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("{kind} {id} does not exist")]
    Missing { kind: &'static str, id: u32 },

    #[error("Host rejected '{op}': {reason}")]
    Rejected { op: &'static str, reason: String },

    #[error("Container {0} already links to another container")]
    AlreadyLinked(ContainerId),

    #[error("Cell ({row}, {col}) is outside the table")]
    CellOutOfRange { row: usize, col: usize },

    #[error("Could not place asset '{0}'")]
    Placement(String),
}

impl HostError {
    pub fn rejected(op: &'static str, reason: impl Into<String>) -> Self {
        HostError::Rejected {
            op,
            reason: reason.into(),
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakKind {
    Paragraph,
    Column,
    Frame,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoteKind {
    Footnote,
    Endnote,
}

/// Character-level formatting applied to a text run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub small_caps: bool,
    pub char_style: Option<String>,
    pub point_size: Option<f32>,
}

/// Paragraph-level formatting applied to the paragraph at the end of a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphFormat {
    pub style: String,
    pub point_size: f32,
    pub leading: f32,
    pub space_before: f32,
    pub space_after: f32,
    pub align: TextAlign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WrapMode {
    #[default]
    None,
    Square,
    Tight,
    TopBottom,
    Behind,
    Front,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextWrap {
    pub mode: WrapMode,
    /// Stand-off distances around the graphic.
    pub offsets: Margins,
}

impl TextWrap {
    pub fn none() -> Self {
        Self::default()
    }
}

/// What the host actually created when an image was placed inline.
///
/// Placement may hand back the image itself or a frame wrapping it; either way
/// the engine needs the frame that carries the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacedItem {
    Frame(GraphicId),
    Image { frame: GraphicId },
    Group { frame: GraphicId, depth: u8 },
}

impl PlacedItem {
    pub fn frame(self) -> GraphicId {
        match self {
            PlacedItem::Frame(frame) => frame,
            PlacedItem::Image { frame } | PlacedItem::Group { frame, .. } => frame,
        }
    }
}

/// The representations a column width can be handed to the host in.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnWidth {
    /// A typed point measurement.
    Points(f32),
    /// A unit-bearing measurement string such as `"120pt"`.
    Measure(String),
    /// A bare number in the host's default unit.
    Number(f64),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    pub align: Option<TextAlign>,
    pub valign: Option<VerticalAlign>,
    pub shading: Option<Color>,
    pub inset: Option<f32>,
}

impl CellFormat {
    pub fn is_empty(&self) -> bool {
        self.align.is_none() && self.valign.is_none() && self.shading.is_none() && self.inset.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeStroke {
    pub weight: f32,
    pub color: Color,
}

impl EdgeStroke {
    pub fn none() -> Self {
        Self {
            weight: 0.0,
            color: Color::BLACK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CellEdges {
    pub top: EdgeStroke,
    pub bottom: EdgeStroke,
    pub left: EdgeStroke,
    pub right: EdgeStroke,
}

/// The paginated document model the composition engine drives.
pub trait DocumentHost {
    // --- Pages and spreads ---

    fn page_count(&self) -> usize;

    fn page_at(&self, index: usize) -> Option<PageId>;

    fn page_index(&self, page: PageId) -> HostResult<usize>;

    /// Adds a page directly after `after`, or at the end of the document when
    /// `after` is `None`. `new_spread` starts a fresh spread for the page.
    fn add_page(&mut self, after: Option<PageId>, new_spread: bool) -> HostResult<PageId>;

    fn remove_page(&mut self, page: PageId) -> HostResult<()>;

    fn page_spread(&self, page: PageId) -> HostResult<SpreadId>;

    fn page_bounds(&self, page: PageId) -> HostResult<Rect>;

    fn resize_page(&mut self, page: PageId, size: Size) -> HostResult<()>;

    fn page_margins(&self, page: PageId) -> HostResult<Margins>;

    fn set_page_margins(&mut self, page: PageId, margins: Margins) -> HostResult<()>;

    /// True when no container or graphic lives on the page.
    fn page_is_empty(&self, page: PageId) -> HostResult<bool>;

    // --- Containers ---

    /// Creates a writable text container on `page`. The container starts a new story.
    fn create_text_container(&mut self, page: PageId, bounds: Rect) -> HostResult<ContainerId>;

    /// Appends `to` after `from` in `from`'s story chain. `from` must be the chain
    /// tail and `to` must be an unlinked, empty container.
    fn link_containers(&mut self, from: ContainerId, to: ContainerId) -> HostResult<()>;

    fn next_container(&self, container: ContainerId) -> HostResult<Option<ContainerId>>;

    fn container_story(&self, container: ContainerId) -> HostResult<StoryId>;

    fn container_page(&self, container: ContainerId) -> HostResult<PageId>;

    fn container_bounds(&self, container: ContainerId) -> HostResult<Rect>;

    fn container_inset(&self, container: ContainerId) -> HostResult<Margins>;

    fn container_is_empty(&self, container: ContainerId) -> HostResult<bool>;

    /// Absolute y of the last composed baseline in the container, if any.
    fn last_baseline(&self, container: ContainerId) -> HostResult<Option<f32>>;

    /// Removes an empty container at the end of its chain.
    fn remove_container(&mut self, container: ContainerId) -> HostResult<()>;

    // --- Stories ---

    fn story_containers(&self, story: StoryId) -> HostResult<Vec<ContainerId>>;

    fn story_overflows(&self, story: StoryId) -> HostResult<bool>;

    fn recompose(&mut self, story: StoryId) -> HostResult<()>;

    /// The container currently displaying the end of the story's composed content.
    fn story_tail_container(&self, story: StoryId) -> HostResult<Option<ContainerId>>;

    /// Number of content items in the story.
    fn story_length(&self, story: StoryId) -> HostResult<usize>;

    fn insert_text(&mut self, story: StoryId, text: &str, format: &CharFormat) -> HostResult<()>;

    fn insert_break(&mut self, story: StoryId, kind: BreakKind) -> HostResult<()>;

    fn set_paragraph_format(&mut self, story: StoryId, format: &ParagraphFormat) -> HostResult<()>;

    fn insert_note(&mut self, story: StoryId, kind: NoteKind, content: &str) -> HostResult<NoteId>;

    // --- Graphics ---

    fn create_graphic_frame(&mut self, page: PageId, bounds: Rect) -> HostResult<GraphicId>;

    /// Deletes a free frame that ended up unused.
    fn remove_graphic(&mut self, graphic: GraphicId) -> HostResult<()>;

    /// Loads an asset into a frame and returns the asset's natural size.
    fn place_asset(&mut self, graphic: GraphicId, asset: &Path) -> HostResult<Size>;

    fn fit_content_proportionally(&mut self, graphic: GraphicId) -> HostResult<()>;

    fn set_text_wrap(&mut self, graphic: GraphicId, wrap: &TextWrap) -> HostResult<()>;

    /// Places an asset inline at the end of the story.
    fn place_inline(&mut self, story: StoryId, asset: &Path) -> HostResult<PlacedItem>;

    fn graphic_bounds(&self, graphic: GraphicId) -> HostResult<Rect>;

    fn set_graphic_bounds(&mut self, graphic: GraphicId, bounds: Rect) -> HostResult<()>;

    /// Sizes an anchored object through its anchor settings rather than its bounds.
    fn set_anchored_size(&mut self, graphic: GraphicId, size: Size) -> HostResult<()>;

    fn scale_graphic(&mut self, graphic: GraphicId, factor: f32) -> HostResult<()>;

    fn graphic_natural_size(&self, graphic: GraphicId) -> HostResult<Size>;

    /// The page a graphic ends up on after composition.
    fn graphic_page(&self, graphic: GraphicId) -> HostResult<Option<PageId>>;

    // --- Tables ---

    fn insert_table(
        &mut self,
        story: StoryId,
        rows: usize,
        cols: usize,
        header_rows: usize,
    ) -> HostResult<TableId>;

    fn table_column_count(&self, table: TableId) -> HostResult<usize>;

    fn set_cell_text(&mut self, table: TableId, row: usize, col: usize, text: &str) -> HostResult<()>;

    fn set_cell_format(
        &mut self,
        table: TableId,
        row: usize,
        col: usize,
        format: &CellFormat,
    ) -> HostResult<()>;

    /// Merges the block starting at (row, col). Merging resets the cell's formatting.
    fn merge_cells(
        &mut self,
        table: TableId,
        row: usize,
        col: usize,
        rowspan: usize,
        colspan: usize,
    ) -> HostResult<()>;

    fn set_column_width(&mut self, table: TableId, col: usize, width: &ColumnWidth) -> HostResult<()>;

    fn set_row_height(&mut self, table: TableId, row: usize, height: f32) -> HostResult<()>;

    fn set_cell_edges(
        &mut self,
        table: TableId,
        row: usize,
        col: usize,
        edges: &CellEdges,
    ) -> HostResult<()>;
}
