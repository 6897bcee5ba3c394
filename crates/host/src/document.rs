use crate::compose;
use crate::model::{
    Cell, Container, Graphic, GraphicPlacement, Merge, Note, Page, Spread, Story, StoryItem, Table,
};
use galley_traits::{
    BreakKind, CellEdges, CellFormat, CharFormat, ColumnWidth, DocumentHost, HostError, HostResult,
    NoteKind, ParagraphFormat, PlacedItem, TextWrap,
};
use galley_types::{
    ContainerId, GraphicId, Margins, NoteId, PageId, Rect, Size, SpreadId, StoryId, TableId,
};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Measurement model used by composition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Average glyph advance as a fraction of the point size.
    pub char_width_factor: f32,
    pub default_point_size: f32,
    /// Auto leading as a multiple of the point size.
    pub leading_factor: f32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width_factor: 0.5,
            default_point_size: 12.0,
            leading_factor: 1.2,
        }
    }
}

/// Which column width representations the host understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthAcceptance {
    pub points: bool,
    pub measure: bool,
    pub number: bool,
}

impl Default for WidthAcceptance {
    fn default() -> Self {
        Self {
            points: true,
            measure: true,
            number: true,
        }
    }
}

/// Document defaults plus switches that make individual host calls fail, so
/// the engine's fallback paths can be exercised.
#[derive(Debug, Clone)]
pub struct HostOptions {
    pub default_page_size: Size,
    pub default_margins: Margins,
    pub facing_pages: bool,
    pub metrics: TextMetrics,
    pub cell_inset: f32,
    pub default_column_width: f32,
    pub default_natural_size: Size,
    /// How many wrapper levels inline placement reports (0 = the frame itself).
    pub placement_depth: u8,
    pub width_acceptance: WidthAcceptance,
    /// Tables are created with this many columns fewer than requested.
    pub column_deficit: usize,
    pub reject_add_page_after: bool,
    /// Refuses every new page, wherever it would go.
    pub reject_new_pages: bool,
    pub reject_resize: bool,
    pub reject_margins: bool,
    pub reject_graphic_bounds: bool,
    pub reject_anchored_size: bool,
    pub reject_scale: bool,
    pub reject_page_frames: bool,
    pub reject_merges: bool,
    pub reject_footnotes: bool,
    pub reject_endnotes: bool,
    pub reject_unknown_assets: bool,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            default_page_size: Size::new(612.0, 792.0),
            default_margins: Margins::all(36.0),
            facing_pages: true,
            metrics: TextMetrics::default(),
            cell_inset: 4.0,
            default_column_width: 72.0,
            default_natural_size: Size::new(200.0, 150.0),
            placement_depth: 0,
            width_acceptance: WidthAcceptance::default(),
            column_deficit: 0,
            reject_add_page_after: false,
            reject_new_pages: false,
            reject_resize: false,
            reject_margins: false,
            reject_graphic_bounds: false,
            reject_anchored_size: false,
            reject_scale: false,
            reject_page_frames: false,
            reject_merges: false,
            reject_footnotes: false,
            reject_endnotes: false,
            reject_unknown_assets: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryDocument {
    pub(crate) options: HostOptions,
    pub(crate) pages: BTreeMap<PageId, Page>,
    pub(crate) page_order: Vec<PageId>,
    pub(crate) spreads: BTreeMap<SpreadId, Spread>,
    pub(crate) containers: BTreeMap<ContainerId, Container>,
    pub(crate) stories: BTreeMap<StoryId, Story>,
    pub(crate) graphics: BTreeMap<GraphicId, Graphic>,
    pub(crate) tables: BTreeMap<TableId, Table>,
    pub(crate) notes: BTreeMap<NoteId, Note>,
    asset_sizes: HashMap<PathBuf, Size>,
    next_id: u32,
}

impl MemoryDocument {
    /// An empty document (no pages) with default options.
    pub fn new() -> Self {
        Self::with_options(HostOptions::default())
    }

    pub fn with_options(options: HostOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut HostOptions {
        &mut self.options
    }

    /// Registers the natural size reported when `path` is placed.
    pub fn register_asset(&mut self, path: impl Into<PathBuf>, natural_size: Size) {
        self.asset_sizes.insert(path.into(), natural_size);
    }

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    // --- Inspection helpers ---

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.page_order.iter().filter_map(|id| self.pages.get(id))
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.get(&id)
    }

    pub fn spreads(&self) -> impl Iterator<Item = &Spread> {
        self.spreads.values()
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(&id)
    }

    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    pub fn story(&self, id: StoryId) -> Option<&Story> {
        self.stories.get(&id)
    }

    pub fn graphic(&self, id: GraphicId) -> Option<&Graphic> {
        self.graphics.get(&id)
    }

    pub fn graphics(&self) -> impl Iterator<Item = &Graphic> {
        self.graphics.values()
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(&id)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    /// Concatenated story text; breaks become `\n` (paragraph) or `\u{c}` (others).
    pub fn story_text(&self, id: StoryId) -> String {
        let Some(story) = self.stories.get(&id) else {
            return String::new();
        };
        let mut out = String::new();
        for item in &story.items {
            match item {
                StoryItem::Text { text, .. } => out.push_str(text),
                StoryItem::Break {
                    kind: BreakKind::Paragraph,
                } => out.push('\n'),
                StoryItem::Break { .. } => out.push('\u{c}'),
                _ => {}
            }
        }
        out
    }

    // --- Lookup helpers returning host errors ---

    pub(crate) fn page_ref(&self, id: PageId) -> HostResult<&Page> {
        self.pages.get(&id).ok_or(HostError::Missing {
            kind: "page",
            id: id.raw(),
        })
    }

    fn page_mut(&mut self, id: PageId) -> HostResult<&mut Page> {
        self.pages.get_mut(&id).ok_or(HostError::Missing {
            kind: "page",
            id: id.raw(),
        })
    }

    pub(crate) fn container_ref(&self, id: ContainerId) -> HostResult<&Container> {
        self.containers.get(&id).ok_or(HostError::Missing {
            kind: "container",
            id: id.raw(),
        })
    }

    fn container_mut(&mut self, id: ContainerId) -> HostResult<&mut Container> {
        self.containers.get_mut(&id).ok_or(HostError::Missing {
            kind: "container",
            id: id.raw(),
        })
    }

    pub(crate) fn story_ref(&self, id: StoryId) -> HostResult<&Story> {
        self.stories.get(&id).ok_or(HostError::Missing {
            kind: "story",
            id: id.raw(),
        })
    }

    fn story_mut(&mut self, id: StoryId) -> HostResult<&mut Story> {
        self.stories.get_mut(&id).ok_or(HostError::Missing {
            kind: "story",
            id: id.raw(),
        })
    }

    fn graphic_ref(&self, id: GraphicId) -> HostResult<&Graphic> {
        self.graphics.get(&id).ok_or(HostError::Missing {
            kind: "graphic",
            id: id.raw(),
        })
    }

    fn graphic_mut(&mut self, id: GraphicId) -> HostResult<&mut Graphic> {
        self.graphics.get_mut(&id).ok_or(HostError::Missing {
            kind: "graphic",
            id: id.raw(),
        })
    }

    fn table_ref(&self, id: TableId) -> HostResult<&Table> {
        self.tables.get(&id).ok_or(HostError::Missing {
            kind: "table",
            id: id.raw(),
        })
    }

    fn table_mut(&mut self, id: TableId) -> HostResult<&mut Table> {
        self.tables.get_mut(&id).ok_or(HostError::Missing {
            kind: "table",
            id: id.raw(),
        })
    }

    fn cell_mut(&mut self, table: TableId, row: usize, col: usize) -> HostResult<&mut Cell> {
        self.table_mut(table)?
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(HostError::CellOutOfRange { row, col })
    }

    fn push_item(&mut self, story: StoryId, item: StoryItem) -> HostResult<()> {
        let story = self.story_mut(story)?;
        story.items.push(item);
        story.dirty = true;
        Ok(())
    }

    fn mark_table_dirty(&mut self, table: TableId) -> HostResult<()> {
        let story = self.table_ref(table)?.story;
        self.story_mut(story)?.dirty = true;
        Ok(())
    }

    fn natural_size_for(&self, asset: &Path) -> HostResult<Size> {
        match self.asset_sizes.get(asset) {
            Some(size) => Ok(*size),
            None if self.options.reject_unknown_assets => {
                Err(HostError::Placement(asset.display().to_string()))
            }
            None => Ok(self.options.default_natural_size),
        }
    }

    fn new_spread_with(&mut self, page: PageId) -> SpreadId {
        let id = SpreadId::new(self.alloc_id());
        self.spreads.insert(
            id,
            Spread {
                id,
                pages: vec![page],
            },
        );
        id
    }
}

impl DocumentHost for MemoryDocument {
    fn page_count(&self) -> usize {
        self.page_order.len()
    }

    fn page_at(&self, index: usize) -> Option<PageId> {
        self.page_order.get(index).copied()
    }

    fn page_index(&self, page: PageId) -> HostResult<usize> {
        self.page_order
            .iter()
            .position(|p| *p == page)
            .ok_or(HostError::Missing {
                kind: "page",
                id: page.raw(),
            })
    }

    fn add_page(&mut self, after: Option<PageId>, new_spread: bool) -> HostResult<PageId> {
        if self.options.reject_new_pages {
            return Err(HostError::rejected("add_page", "document is closed to new pages"));
        }
        if after.is_some() && self.options.reject_add_page_after {
            return Err(HostError::rejected("add_page", "cannot insert after a given page"));
        }
        let (position, template) = match after {
            Some(base) => {
                let idx = self.page_index(base)?;
                (idx + 1, Some(base))
            }
            None => (self.page_order.len(), self.page_order.last().copied()),
        };

        let (bounds, margins) = match template.and_then(|p| self.pages.get(&p)) {
            Some(p) => (p.bounds, p.margins),
            None => (
                Rect::new(
                    0.0,
                    0.0,
                    self.options.default_page_size.width,
                    self.options.default_page_size.height,
                ),
                self.options.default_margins,
            ),
        };

        let id = PageId::new(self.alloc_id());
        let joinable = template
            .filter(|_| !new_spread && self.options.facing_pages)
            .and_then(|p| self.pages.get(&p))
            .map(|p| p.spread)
            .filter(|s| self.spreads.get(s).is_some_and(|sp| sp.pages.len() < 2));
        let spread = match joinable {
            Some(spread) => {
                if let Some(sp) = self.spreads.get_mut(&spread) {
                    sp.pages.push(id);
                }
                spread
            }
            None => self.new_spread_with(id),
        };

        self.pages.insert(
            id,
            Page {
                id,
                spread,
                bounds,
                margins,
            },
        );
        self.page_order.insert(position, id);
        Ok(id)
    }

    fn remove_page(&mut self, page: PageId) -> HostResult<()> {
        if !self.page_is_empty(page)? {
            return Err(HostError::rejected("remove_page", format!("{} is not empty", page)));
        }
        let spread = self.page_ref(page)?.spread;
        self.pages.remove(&page);
        self.page_order.retain(|p| *p != page);
        if let Some(sp) = self.spreads.get_mut(&spread) {
            sp.pages.retain(|p| *p != page);
            if sp.pages.is_empty() {
                self.spreads.remove(&spread);
            }
        }
        Ok(())
    }

    fn page_spread(&self, page: PageId) -> HostResult<SpreadId> {
        Ok(self.page_ref(page)?.spread)
    }

    fn page_bounds(&self, page: PageId) -> HostResult<Rect> {
        Ok(self.page_ref(page)?.bounds)
    }

    fn resize_page(&mut self, page: PageId, size: Size) -> HostResult<()> {
        if self.options.reject_resize {
            return Err(HostError::rejected("resize_page", "page size is locked"));
        }
        if !(size.width.is_finite() && size.height.is_finite()) || size.width <= 0.0 || size.height <= 0.0 {
            return Err(HostError::rejected("resize_page", format!("invalid size {:?}", size)));
        }
        let p = self.page_mut(page)?;
        p.bounds.width = size.width;
        p.bounds.height = size.height;
        Ok(())
    }

    fn page_margins(&self, page: PageId) -> HostResult<Margins> {
        Ok(self.page_ref(page)?.margins)
    }

    fn set_page_margins(&mut self, page: PageId, margins: Margins) -> HostResult<()> {
        if self.options.reject_margins {
            return Err(HostError::rejected("set_page_margins", "margins are locked"));
        }
        self.page_mut(page)?.margins = margins;
        Ok(())
    }

    fn page_is_empty(&self, page: PageId) -> HostResult<bool> {
        self.page_ref(page)?;
        let has_container = self.containers.values().any(|c| c.page == page);
        let has_graphic = self
            .graphics
            .values()
            .any(|g| g.placement == GraphicPlacement::Page(page));
        Ok(!has_container && !has_graphic)
    }

    fn create_text_container(&mut self, page: PageId, bounds: Rect) -> HostResult<ContainerId> {
        self.page_ref(page)?;
        let id = ContainerId::new(self.alloc_id());
        let story = StoryId::new(self.alloc_id());
        self.stories.insert(
            story,
            Story {
                id: story,
                containers: vec![id],
                items: Vec::new(),
                overflows: false,
                tail: Some(id),
                dirty: false,
            },
        );
        self.containers.insert(
            id,
            Container {
                id,
                page,
                story,
                bounds,
                inset: Margins::zero(),
                next: None,
                prev: None,
                pieces: 0,
                last_baseline: None,
            },
        );
        Ok(id)
    }

    fn link_containers(&mut self, from: ContainerId, to: ContainerId) -> HostResult<()> {
        if from == to {
            return Err(HostError::rejected("link_containers", "cannot link a container to itself"));
        }
        let from_c = self.container_ref(from)?;
        if from_c.next.is_some() {
            return Err(HostError::AlreadyLinked(from));
        }
        let target_story = from_c.story;
        let to_c = self.container_ref(to)?;
        if to_c.prev.is_some() {
            return Err(HostError::rejected("link_containers", format!("{} already has a predecessor", to)));
        }
        let orphan_story = to_c.story;
        let orphan = self.story_ref(orphan_story)?;
        if !orphan.items.is_empty() || orphan.containers.len() > 1 {
            return Err(HostError::rejected("link_containers", format!("{} is not empty", to)));
        }

        self.stories.remove(&orphan_story);
        self.container_mut(from)?.next = Some(to);
        let to_c = self.container_mut(to)?;
        to_c.prev = Some(from);
        to_c.story = target_story;
        let story = self.story_mut(target_story)?;
        story.containers.push(to);
        story.dirty = true;
        Ok(())
    }

    fn next_container(&self, container: ContainerId) -> HostResult<Option<ContainerId>> {
        Ok(self.container_ref(container)?.next)
    }

    fn container_story(&self, container: ContainerId) -> HostResult<StoryId> {
        Ok(self.container_ref(container)?.story)
    }

    fn container_page(&self, container: ContainerId) -> HostResult<PageId> {
        Ok(self.container_ref(container)?.page)
    }

    fn container_bounds(&self, container: ContainerId) -> HostResult<Rect> {
        Ok(self.container_ref(container)?.bounds)
    }

    fn container_inset(&self, container: ContainerId) -> HostResult<Margins> {
        Ok(self.container_ref(container)?.inset)
    }

    fn container_is_empty(&self, container: ContainerId) -> HostResult<bool> {
        Ok(self.container_ref(container)?.pieces == 0)
    }

    fn last_baseline(&self, container: ContainerId) -> HostResult<Option<f32>> {
        Ok(self.container_ref(container)?.last_baseline)
    }

    fn remove_container(&mut self, container: ContainerId) -> HostResult<()> {
        let c = self.container_ref(container)?;
        if c.next.is_some() {
            return Err(HostError::rejected("remove_container", "only the chain tail can be removed"));
        }
        if c.pieces > 0 {
            return Err(HostError::rejected("remove_container", format!("{} shows content", container)));
        }
        let (prev, story_id) = (c.prev, c.story);
        match prev {
            Some(prev) => {
                self.container_mut(prev)?.next = None;
                let story = self.story_mut(story_id)?;
                story.containers.retain(|id| *id != container);
                if story.tail == Some(container) {
                    story.tail = Some(prev);
                }
            }
            None => {
                if !self.story_ref(story_id)?.items.is_empty() {
                    return Err(HostError::rejected("remove_container", "story still has content"));
                }
                self.stories.remove(&story_id);
            }
        }
        self.containers.remove(&container);
        Ok(())
    }

    fn story_containers(&self, story: StoryId) -> HostResult<Vec<ContainerId>> {
        Ok(self.story_ref(story)?.containers.clone())
    }

    fn story_overflows(&self, story: StoryId) -> HostResult<bool> {
        Ok(self.story_ref(story)?.overflows)
    }

    fn recompose(&mut self, story: StoryId) -> HostResult<()> {
        compose::compose_story(self, story)
    }

    fn story_tail_container(&self, story: StoryId) -> HostResult<Option<ContainerId>> {
        Ok(self.story_ref(story)?.tail)
    }

    fn story_length(&self, story: StoryId) -> HostResult<usize> {
        Ok(self.story_ref(story)?.items.len())
    }

    fn insert_text(&mut self, story: StoryId, text: &str, format: &CharFormat) -> HostResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.push_item(
            story,
            StoryItem::Text {
                text: text.to_string(),
                format: format.clone(),
            },
        )
    }

    fn insert_break(&mut self, story: StoryId, kind: BreakKind) -> HostResult<()> {
        self.push_item(story, StoryItem::Break { kind })
    }

    fn set_paragraph_format(&mut self, story: StoryId, format: &ParagraphFormat) -> HostResult<()> {
        self.push_item(
            story,
            StoryItem::ParagraphFormat {
                format: format.clone(),
            },
        )
    }

    fn insert_note(&mut self, story: StoryId, kind: NoteKind, content: &str) -> HostResult<NoteId> {
        let rejected = match kind {
            NoteKind::Footnote => self.options.reject_footnotes,
            NoteKind::Endnote => self.options.reject_endnotes,
        };
        if rejected {
            return Err(HostError::rejected("insert_note", format!("{:?} not supported here", kind)));
        }
        self.story_ref(story)?;
        let id = NoteId::new(self.alloc_id());
        self.notes.insert(
            id,
            Note {
                id,
                kind,
                story,
                content: content.to_string(),
            },
        );
        self.push_item(story, StoryItem::NoteRef { note: id })?;
        Ok(id)
    }

    fn create_graphic_frame(&mut self, page: PageId, bounds: Rect) -> HostResult<GraphicId> {
        if self.options.reject_page_frames {
            return Err(HostError::rejected("create_graphic_frame", "free frames are disabled"));
        }
        self.page_ref(page)?;
        let id = GraphicId::new(self.alloc_id());
        self.graphics.insert(
            id,
            Graphic {
                id,
                placement: GraphicPlacement::Page(page),
                bounds,
                natural_size: Size::zero(),
                asset: None,
                wrap: TextWrap::none(),
                fitted: false,
            },
        );
        Ok(id)
    }

    fn remove_graphic(&mut self, graphic: GraphicId) -> HostResult<()> {
        if !matches!(self.graphic_ref(graphic)?.placement, GraphicPlacement::Page(_)) {
            return Err(HostError::rejected("remove_graphic", "anchored graphics live in their story"));
        }
        self.graphics.remove(&graphic);
        Ok(())
    }

    fn place_asset(&mut self, graphic: GraphicId, asset: &Path) -> HostResult<Size> {
        let natural = self.natural_size_for(asset)?;
        let g = self.graphic_mut(graphic)?;
        g.asset = Some(asset.to_path_buf());
        g.natural_size = natural;
        Ok(natural)
    }

    fn fit_content_proportionally(&mut self, graphic: GraphicId) -> HostResult<()> {
        let g = self.graphic_mut(graphic)?;
        if g.asset.is_none() {
            return Err(HostError::rejected("fit_content_proportionally", "frame is empty"));
        }
        g.fitted = true;
        Ok(())
    }

    fn set_text_wrap(&mut self, graphic: GraphicId, wrap: &TextWrap) -> HostResult<()> {
        self.graphic_mut(graphic)?.wrap = *wrap;
        Ok(())
    }

    fn place_inline(&mut self, story: StoryId, asset: &Path) -> HostResult<PlacedItem> {
        self.story_ref(story)?;
        let natural = self.natural_size_for(asset)?;
        let id = GraphicId::new(self.alloc_id());
        self.graphics.insert(
            id,
            Graphic {
                id,
                placement: GraphicPlacement::Inline { story, page: None },
                bounds: Rect::new(0.0, 0.0, natural.width, natural.height),
                natural_size: natural,
                asset: Some(asset.to_path_buf()),
                wrap: TextWrap::none(),
                fitted: false,
            },
        );
        self.push_item(story, StoryItem::Inline { graphic: id })?;
        Ok(match self.options.placement_depth {
            0 => PlacedItem::Frame(id),
            1 => PlacedItem::Image { frame: id },
            depth => PlacedItem::Group { frame: id, depth },
        })
    }

    fn graphic_bounds(&self, graphic: GraphicId) -> HostResult<Rect> {
        Ok(self.graphic_ref(graphic)?.bounds)
    }

    fn set_graphic_bounds(&mut self, graphic: GraphicId, bounds: Rect) -> HostResult<()> {
        if self.options.reject_graphic_bounds {
            return Err(HostError::rejected("set_graphic_bounds", "geometry is locked"));
        }
        let g = self.graphic_mut(graphic)?;
        g.bounds = bounds;
        if let GraphicPlacement::Inline { story, .. } = g.placement {
            self.story_mut(story)?.dirty = true;
        }
        Ok(())
    }

    fn set_anchored_size(&mut self, graphic: GraphicId, size: Size) -> HostResult<()> {
        if self.options.reject_anchored_size {
            return Err(HostError::rejected("set_anchored_size", "anchor settings are locked"));
        }
        let g = self.graphic_mut(graphic)?;
        let GraphicPlacement::Inline { story, .. } = g.placement else {
            return Err(HostError::rejected("set_anchored_size", "graphic is not anchored"));
        };
        g.bounds.width = size.width;
        g.bounds.height = size.height;
        self.story_mut(story)?.dirty = true;
        Ok(())
    }

    fn scale_graphic(&mut self, graphic: GraphicId, factor: f32) -> HostResult<()> {
        if self.options.reject_scale || !factor.is_finite() || factor <= 0.0 {
            return Err(HostError::rejected("scale_graphic", format!("factor {}", factor)));
        }
        let g = self.graphic_mut(graphic)?;
        g.bounds.width *= factor;
        g.bounds.height *= factor;
        if let GraphicPlacement::Inline { story, .. } = g.placement {
            self.story_mut(story)?.dirty = true;
        }
        Ok(())
    }

    fn graphic_natural_size(&self, graphic: GraphicId) -> HostResult<Size> {
        Ok(self.graphic_ref(graphic)?.natural_size)
    }

    fn graphic_page(&self, graphic: GraphicId) -> HostResult<Option<PageId>> {
        Ok(match self.graphic_ref(graphic)?.placement {
            GraphicPlacement::Page(page) => Some(page),
            GraphicPlacement::Inline { page, .. } => page,
        })
    }

    fn insert_table(
        &mut self,
        story: StoryId,
        rows: usize,
        cols: usize,
        header_rows: usize,
    ) -> HostResult<TableId> {
        if rows == 0 || cols == 0 {
            return Err(HostError::rejected("insert_table", "a table needs at least one cell"));
        }
        self.story_ref(story)?;
        let realized_cols = cols.saturating_sub(self.options.column_deficit).max(1);
        let id = TableId::new(self.alloc_id());
        self.tables.insert(
            id,
            Table {
                id,
                story,
                rows,
                cols: realized_cols,
                header_rows: header_rows.min(rows),
                cells: vec![vec![Cell::default(); realized_cols]; rows],
                column_widths: vec![self.options.default_column_width; realized_cols],
                row_heights: vec![None; rows],
                merges: Vec::new(),
            },
        );
        self.push_item(story, StoryItem::Table { table: id })?;
        Ok(id)
    }

    fn table_column_count(&self, table: TableId) -> HostResult<usize> {
        Ok(self.table_ref(table)?.cols)
    }

    fn set_cell_text(&mut self, table: TableId, row: usize, col: usize, text: &str) -> HostResult<()> {
        self.cell_mut(table, row, col)?.text = text.to_string();
        self.mark_table_dirty(table)
    }

    fn set_cell_format(
        &mut self,
        table: TableId,
        row: usize,
        col: usize,
        format: &CellFormat,
    ) -> HostResult<()> {
        self.cell_mut(table, row, col)?.format = format.clone();
        self.mark_table_dirty(table)
    }

    fn merge_cells(
        &mut self,
        table: TableId,
        row: usize,
        col: usize,
        rowspan: usize,
        colspan: usize,
    ) -> HostResult<()> {
        if self.options.reject_merges {
            return Err(HostError::rejected("merge_cells", "merging is disabled"));
        }
        let merge = Merge {
            row,
            col,
            rowspan,
            colspan,
        };
        let t = self.table_mut(table)?;
        if rowspan == 0 || colspan == 0 || row + rowspan > t.rows || col + colspan > t.cols {
            return Err(HostError::CellOutOfRange {
                row: row + rowspan.saturating_sub(1),
                col: col + colspan.saturating_sub(1),
            });
        }
        if t.merges.iter().any(|m| m.overlaps(&merge)) {
            return Err(HostError::rejected("merge_cells", "range overlaps an existing merge"));
        }

        let mut absorbed = Vec::new();
        for r in row..row + rowspan {
            for c in col..col + colspan {
                if (r, c) == (row, col) {
                    continue;
                }
                let cell = &mut t.cells[r][c];
                if !cell.text.is_empty() {
                    absorbed.push(std::mem::take(&mut cell.text));
                }
                cell.merged_into = Some((row, col));
            }
        }
        let anchor = &mut t.cells[row][col];
        for text in absorbed {
            if !anchor.text.is_empty() {
                anchor.text.push('\n');
            }
            anchor.text.push_str(&text);
        }
        anchor.format = CellFormat::default();
        t.merges.push(merge);
        self.mark_table_dirty(table)
    }

    fn set_column_width(&mut self, table: TableId, col: usize, width: &ColumnWidth) -> HostResult<()> {
        let accept = self.options.width_acceptance;
        let points = match width {
            ColumnWidth::Points(v) if accept.points => *v,
            ColumnWidth::Measure(s) if accept.measure => galley_style::parse_length_str(s)
                .map_err(|e| HostError::rejected("set_column_width", e.to_string()))?,
            ColumnWidth::Number(n) if accept.number => *n as f32,
            other => {
                return Err(HostError::rejected(
                    "set_column_width",
                    format!("unsupported representation {:?}", other),
                ));
            }
        };
        if !points.is_finite() || points <= 0.0 {
            return Err(HostError::rejected("set_column_width", format!("invalid width {}", points)));
        }
        let t = self.table_mut(table)?;
        let slot = t
            .column_widths
            .get_mut(col)
            .ok_or(HostError::CellOutOfRange { row: 0, col })?;
        *slot = points;
        self.mark_table_dirty(table)
    }

    fn set_row_height(&mut self, table: TableId, row: usize, height: f32) -> HostResult<()> {
        let t = self.table_mut(table)?;
        let slot = t
            .row_heights
            .get_mut(row)
            .ok_or(HostError::CellOutOfRange { row, col: 0 })?;
        *slot = Some(height.max(0.0));
        self.mark_table_dirty(table)
    }

    fn set_cell_edges(
        &mut self,
        table: TableId,
        row: usize,
        col: usize,
        edges: &CellEdges,
    ) -> HostResult<()> {
        self.cell_mut(table, row, col)?.edges = *edges;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_page() -> (MemoryDocument, PageId) {
        let mut doc = MemoryDocument::new();
        let page = doc.add_page(None, true).unwrap();
        (doc, page)
    }

    #[test]
    fn pages_insert_after_base_and_share_spreads() {
        let (mut doc, first) = doc_with_page();
        let last = doc.add_page(None, false).unwrap();
        let middle = doc.add_page(Some(first), true).unwrap();
        assert_eq!(doc.page_index(middle).unwrap(), 1);
        assert_eq!(doc.page_index(last).unwrap(), 2);
        assert_eq!(doc.page_spread(first).unwrap(), doc.page_spread(last).unwrap());
        assert_ne!(doc.page_spread(first).unwrap(), doc.page_spread(middle).unwrap());
    }

    #[test]
    fn linking_is_append_only() {
        let (mut doc, page) = doc_with_page();
        let a = doc.create_text_container(page, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let b = doc.create_text_container(page, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let c = doc.create_text_container(page, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        doc.link_containers(a, b).unwrap();
        assert_eq!(doc.link_containers(a, c), Err(HostError::AlreadyLinked(a)));
        doc.link_containers(b, c).unwrap();
        let story = doc.container_story(a).unwrap();
        assert_eq!(doc.story_containers(story).unwrap(), vec![a, b, c]);
        assert_eq!(doc.container_story(c).unwrap(), story);
    }

    #[test]
    fn linking_rejects_non_empty_targets() {
        let (mut doc, page) = doc_with_page();
        let a = doc.create_text_container(page, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let b = doc.create_text_container(page, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let other = doc.container_story(b).unwrap();
        doc.insert_text(other, "taken", &CharFormat::default()).unwrap();
        assert!(matches!(doc.link_containers(a, b), Err(HostError::Rejected { .. })));
    }

    #[test]
    fn column_width_representations_follow_acceptance() {
        let (mut doc, page) = doc_with_page();
        doc.options_mut().width_acceptance = WidthAcceptance {
            points: false,
            measure: true,
            number: false,
        };
        let c = doc.create_text_container(page, Rect::new(0.0, 0.0, 400.0, 400.0)).unwrap();
        let story = doc.container_story(c).unwrap();
        let t = doc.insert_table(story, 2, 2, 0).unwrap();
        assert!(doc.set_column_width(t, 0, &ColumnWidth::Points(100.0)).is_err());
        doc.set_column_width(t, 0, &ColumnWidth::Measure("100pt".into())).unwrap();
        assert!(doc.set_column_width(t, 1, &ColumnWidth::Number(50.0)).is_err());
        assert_eq!(doc.table(t).unwrap().column_widths, vec![100.0, 72.0]);
    }

    #[test]
    fn merge_resets_anchor_format_and_absorbs_text() {
        let (mut doc, page) = doc_with_page();
        let c = doc.create_text_container(page, Rect::new(0.0, 0.0, 400.0, 400.0)).unwrap();
        let story = doc.container_story(c).unwrap();
        let t = doc.insert_table(story, 2, 2, 0).unwrap();
        doc.set_cell_text(t, 0, 0, "a").unwrap();
        doc.set_cell_text(t, 1, 0, "b").unwrap();
        let fmt = CellFormat {
            align: Some(galley_style::TextAlign::Center),
            ..Default::default()
        };
        doc.set_cell_format(t, 0, 0, &fmt).unwrap();
        doc.merge_cells(t, 0, 0, 2, 1).unwrap();

        let table = doc.table(t).unwrap();
        assert_eq!(table.cell(0, 0).unwrap().text, "a\nb");
        assert!(table.cell(0, 0).unwrap().format.is_empty());
        assert_eq!(table.cell(1, 0).unwrap().merged_into, Some((0, 0)));
        assert!(doc.merge_cells(t, 1, 0, 1, 2).is_err());
    }

    #[test]
    fn removing_tail_container_unlinks_it() {
        let (mut doc, page) = doc_with_page();
        let a = doc.create_text_container(page, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let extra = doc.add_page(None, false).unwrap();
        let b = doc.create_text_container(extra, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        doc.link_containers(a, b).unwrap();
        assert!(doc.remove_container(a).is_err());
        doc.remove_container(b).unwrap();
        assert_eq!(doc.next_container(a).unwrap(), None);
        assert!(doc.page_is_empty(extra).unwrap());
        doc.remove_page(extra).unwrap();
        assert_eq!(doc.page_count(), 1);
    }
}
