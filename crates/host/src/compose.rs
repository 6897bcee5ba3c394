//! Story composition for the in-memory host.
//!
//! Content is turned into a sequence of pieces (text lines, inline graphics,
//! table rows) which are stacked top-down into the story's container chain.
//! A piece too large for an empty container moves on to the next one; once
//! the chain is exhausted the story stays overset and its tail does not
//! advance.

use crate::document::MemoryDocument;
use crate::model::{GraphicPlacement, StoryItem, Table};
use galley_traits::{BreakKind, HostResult};
use galley_types::{ContainerId, GEOMETRY_EPSILON, GraphicId, PageId, Rect, StoryId};

/// Characters that take no horizontal space.
const ZERO_WIDTH: [char; 4] = ['\u{200b}', '\u{200c}', '\u{200d}', '\u{feff}'];

/// Minimum width a container needs to hold a line of text.
const MIN_LINE_WIDTH: f32 = 1.0;

/// Floor for the advance of a text line.
const MIN_LEADING: f32 = 0.1;

#[derive(Debug, Clone, Copy)]
struct Frame {
    id: ContainerId,
    page: PageId,
    inner: Rect,
}

#[derive(Debug, Clone, Copy)]
struct LineMetrics {
    point_size: f32,
    leading: f32,
    space_before: f32,
    space_after: f32,
}

/// Stacks pieces into frames, tracking the fill of the current one.
struct Placer {
    frames: Vec<Frame>,
    idx: usize,
    y: f32,
    pieces: Vec<usize>,
    baselines: Vec<Option<f32>>,
    pending_breaks: Vec<BreakKind>,
}

impl Placer {
    fn new(frames: Vec<Frame>) -> Self {
        let n = frames.len();
        Self {
            frames,
            idx: 0,
            y: 0.0,
            pieces: vec![0; n],
            baselines: vec![None; n],
            pending_breaks: Vec::new(),
        }
    }

    fn current_has_pieces(&self) -> bool {
        self.pieces.get(self.idx).is_some_and(|n| *n > 0)
    }

    fn current_page(&self) -> Option<PageId> {
        self.frames.get(self.idx).map(|f| f.page)
    }

    fn advance(&mut self) {
        self.idx += 1;
        self.y = 0.0;
    }

    /// Moves past the frames closed by breaks since the last piece, whether or
    /// not those frames received anything.
    fn apply_pending_breaks(&mut self) {
        for kind in std::mem::take(&mut self.pending_breaks) {
            let Some(page) = self.current_page() else {
                return;
            };
            match kind {
                BreakKind::Page => {
                    while self.current_page() == Some(page) {
                        self.advance();
                    }
                }
                BreakKind::Frame | BreakKind::Column => self.advance(),
                BreakKind::Paragraph => {}
            }
        }
    }

    /// Adds vertical space in the current frame, if it already shows something.
    fn add_space(&mut self, space: f32) {
        if self.current_has_pieces() {
            self.y += space;
        }
    }

    /// Places a piece and returns the frame index it landed in, or `None` when
    /// no remaining frame of the chain can hold it.
    fn place(&mut self, width: f32, height: f32) -> Option<usize> {
        self.apply_pending_breaks();
        loop {
            let frame = self.frames.get(self.idx)?;
            let fits_width = width <= frame.inner.width + GEOMETRY_EPSILON;
            let fits_height = self.y + height <= frame.inner.height + GEOMETRY_EPSILON;
            if fits_width && fits_height {
                self.y += height;
                self.pieces[self.idx] += 1;
                self.baselines[self.idx] = Some(frame.inner.top() + self.y);
                return Some(self.idx);
            }
            self.advance();
        }
    }
}

struct Outcome {
    pieces: Vec<usize>,
    baselines: Vec<Option<f32>>,
    graphic_pages: Vec<(GraphicId, Option<PageId>)>,
    overflows: bool,
}

fn visible_chars(text: &str) -> usize {
    text.chars()
        .filter(|c| !ZERO_WIDTH.contains(c) && *c != '\n')
        .count()
}

impl MemoryDocument {
    fn text_width(&self, text: &str, point_size: f32) -> f32 {
        visible_chars(text) as f32 * point_size * self.options.metrics.char_width_factor
    }

    fn default_line_metrics(&self) -> LineMetrics {
        let pt = self.options.metrics.default_point_size;
        LineMetrics {
            point_size: pt,
            leading: pt * self.options.metrics.leading_factor,
            space_before: 0.0,
            space_after: 0.0,
        }
    }

    fn row_height(&self, table: &Table, row: usize) -> f32 {
        if let Some(Some(explicit)) = table.row_heights.get(row) {
            return *explicit;
        }
        let pt = self.options.metrics.default_point_size;
        let leading = pt * self.options.metrics.leading_factor;
        let mut tallest: f32 = 0.0;
        for (col, cell) in table.cells[row].iter().enumerate() {
            if cell.merged_into.is_some() {
                continue;
            }
            let inset = cell.format.inset.unwrap_or(self.options.cell_inset);
            let available = (table.column_widths.get(col).copied().unwrap_or(0.0) - 2.0 * inset)
                .max(MIN_LINE_WIDTH);
            let lines: f32 = cell
                .text
                .split('\n')
                .map(|segment| (self.text_width(segment, pt) / available).ceil().max(1.0))
                .sum();
            tallest = tallest.max(lines * leading + 2.0 * inset);
        }
        tallest
    }

    /// Places `width` points of paragraph text as lines; returns false on overset.
    fn place_lines(&self, placer: &mut Placer, mut width: f32, metrics: &LineMetrics) -> bool {
        let leading = metrics.leading.max(MIN_LEADING);
        loop {
            let Some(idx) = placer.place(MIN_LINE_WIDTH, leading) else {
                return false;
            };
            width -= placer.frames[idx].inner.width;
            if width <= GEOMETRY_EPSILON {
                return true;
            }
        }
    }

    fn layout_story(&self, story: StoryId) -> HostResult<Outcome> {
        let story_ref = self.story_ref(story)?;
        let mut frames = Vec::with_capacity(story_ref.containers.len());
        for id in &story_ref.containers {
            let c = self.container_ref(*id)?;
            frames.push(Frame {
                id: c.id,
                page: c.page,
                inner: c.inner(),
            });
        }

        let mut placer = Placer::new(frames);
        let mut metrics = self.default_line_metrics();
        let mut graphic_pages = Vec::new();
        // Width of the paragraph text not yet placed, and whether the
        // paragraph has had its first line.
        let mut pending_width: f32 = 0.0;
        let mut pending_text = false;
        let mut paragraph_started = false;
        let mut overflows = false;

        for item in &story_ref.items {
            let ok = match item {
                StoryItem::Text { text, format } => {
                    let pt = format.point_size.unwrap_or(metrics.point_size);
                    pending_width += self.text_width(text, pt);
                    pending_text = true;
                    true
                }
                StoryItem::NoteRef { .. } => {
                    pending_width += self.text_width("0", metrics.point_size);
                    pending_text = true;
                    true
                }
                StoryItem::ParagraphFormat { format } => {
                    metrics = LineMetrics {
                        point_size: format.point_size,
                        leading: format.leading,
                        space_before: format.space_before,
                        space_after: format.space_after,
                    };
                    true
                }
                StoryItem::Break { kind } => {
                    let mut ok = true;
                    if pending_text || *kind == BreakKind::Paragraph {
                        if !paragraph_started {
                            placer.add_space(metrics.space_before);
                        }
                        ok = self.place_lines(&mut placer, pending_width, &metrics);
                        placer.add_space(metrics.space_after);
                    }
                    pending_width = 0.0;
                    pending_text = false;
                    paragraph_started = false;
                    if *kind != BreakKind::Paragraph {
                        placer.pending_breaks.push(*kind);
                    }
                    ok
                }
                StoryItem::Inline { graphic } => {
                    let mut ok = true;
                    if pending_text {
                        ok = self.place_lines(&mut placer, pending_width, &metrics);
                        pending_width = 0.0;
                        pending_text = false;
                        paragraph_started = true;
                    }
                    let bounds = self.graphics.get(graphic).map(|g| g.bounds).unwrap_or_default();
                    let placed = if ok {
                        placer.place(bounds.width, bounds.height)
                    } else {
                        None
                    };
                    graphic_pages.push((*graphic, placed.map(|idx| placer.frames[idx].page)));
                    placed.is_some()
                }
                StoryItem::Table { table } => {
                    let mut ok = true;
                    if pending_text {
                        ok = self.place_lines(&mut placer, pending_width, &metrics);
                        pending_width = 0.0;
                        pending_text = false;
                        paragraph_started = true;
                    }
                    if let (true, Some(t)) = (ok, self.tables.get(table)) {
                        let width = t.width();
                        for row in 0..t.rows {
                            if placer.place(width, self.row_height(t, row)).is_none() {
                                ok = false;
                                break;
                            }
                        }
                    }
                    ok
                }
            };
            if !ok {
                overflows = true;
                break;
            }
        }

        if !overflows && pending_text && !self.place_lines(&mut placer, pending_width, &metrics) {
            overflows = true;
        }

        Ok(Outcome {
            pieces: placer.pieces,
            baselines: placer.baselines,
            graphic_pages,
            overflows,
        })
    }
}

/// Recomposes `story` and writes piece counts, baselines, overflow and tail
/// back into the document.
pub(crate) fn compose_story(doc: &mut MemoryDocument, story: StoryId) -> HostResult<()> {
    let outcome = doc.layout_story(story)?;
    let containers = doc.story_ref(story)?.containers.clone();

    for (i, id) in containers.iter().enumerate() {
        if let Some(c) = doc.containers.get_mut(id) {
            c.pieces = outcome.pieces[i];
            c.last_baseline = outcome.baselines[i];
        }
    }

    // Graphics that were not reached keep no page.
    for g in doc.graphics.values_mut() {
        if let GraphicPlacement::Inline { story: s, page } = &mut g.placement {
            if *s == story {
                *page = None;
            }
        }
    }
    for (id, placed_page) in outcome.graphic_pages {
        if let Some(GraphicPlacement::Inline { page, .. }) =
            doc.graphics.get_mut(&id).map(|g| &mut g.placement)
        {
            *page = placed_page;
        }
    }

    let tail = containers
        .iter()
        .zip(&outcome.pieces)
        .filter(|(_, n)| **n > 0)
        .map(|(id, _)| *id)
        .last()
        .or_else(|| containers.first().copied());

    if let Some(s) = doc.stories.get_mut(&story) {
        s.overflows = outcome.overflows;
        s.tail = tail;
        s.dirty = false;
    }
    log::trace!(
        "Composed {}: overflows={}, tail={:?}",
        story,
        outcome.overflows,
        tail
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{HostOptions, MemoryDocument};
    use galley_traits::{BreakKind, CharFormat, DocumentHost, ParagraphFormat};
    use galley_types::{Margins, Rect, Size};

    fn doc() -> MemoryDocument {
        MemoryDocument::with_options(HostOptions {
            default_margins: Margins::zero(),
            ..Default::default()
        })
    }

    #[test]
    fn text_overflows_small_container_until_linked() {
        let mut doc = doc();
        let page = doc.add_page(None, true).unwrap();
        // 100pt wide, two lines of 14.4pt.
        let a = doc.create_text_container(page, Rect::new(0.0, 0.0, 100.0, 30.0)).unwrap();
        let story = doc.container_story(a).unwrap();
        // 60 glyphs * 6pt = 360pt of text -> four lines.
        doc.insert_text(story, &"x".repeat(60), &CharFormat::default()).unwrap();
        doc.recompose(story).unwrap();
        assert!(doc.story_overflows(story).unwrap());
        assert_eq!(doc.story_tail_container(story).unwrap(), Some(a));

        let b = doc.create_text_container(page, Rect::new(0.0, 40.0, 100.0, 30.0)).unwrap();
        doc.link_containers(a, b).unwrap();
        doc.recompose(story).unwrap();
        assert!(!doc.story_overflows(story).unwrap());
        assert_eq!(doc.story_tail_container(story).unwrap(), Some(b));
        assert_eq!(doc.container(a).unwrap().pieces, 2);
        assert_eq!(doc.container(b).unwrap().pieces, 2);
    }

    #[test]
    fn zero_width_characters_take_no_space() {
        let mut doc = doc();
        let page = doc.add_page(None, true).unwrap();
        let a = doc.create_text_container(page, Rect::new(0.0, 0.0, 60.0, 15.0)).unwrap();
        let story = doc.container_story(a).unwrap();
        doc.insert_text(story, "abcdefghij\u{200d}\u{200d}", &CharFormat::default()).unwrap();
        doc.recompose(story).unwrap();
        assert!(!doc.story_overflows(story).unwrap());
    }

    #[test]
    fn frame_break_moves_to_next_container() {
        let mut doc = doc();
        let page = doc.add_page(None, true).unwrap();
        let a = doc.create_text_container(page, Rect::new(0.0, 0.0, 200.0, 200.0)).unwrap();
        let b = doc.create_text_container(page, Rect::new(0.0, 300.0, 200.0, 200.0)).unwrap();
        doc.link_containers(a, b).unwrap();
        let story = doc.container_story(a).unwrap();
        doc.insert_text(story, "one", &CharFormat::default()).unwrap();
        doc.insert_break(story, BreakKind::Frame).unwrap();
        doc.insert_text(story, "two", &CharFormat::default()).unwrap();
        doc.recompose(story).unwrap();
        assert_eq!(doc.container(b).unwrap().pieces, 1);
        assert_eq!(doc.story_tail_container(story).unwrap(), Some(b));
        let baseline = doc.last_baseline(b).unwrap().unwrap();
        assert!((baseline - 314.4).abs() < 0.01);
    }

    #[test]
    fn page_break_at_story_start_leaves_first_page_empty() {
        let mut doc = doc();
        let first = doc.add_page(None, true).unwrap();
        let second = doc.add_page(None, true).unwrap();
        let a = doc.create_text_container(first, Rect::new(0.0, 0.0, 200.0, 200.0)).unwrap();
        let b = doc.create_text_container(second, Rect::new(0.0, 0.0, 200.0, 200.0)).unwrap();
        doc.link_containers(a, b).unwrap();
        let story = doc.container_story(a).unwrap();
        doc.insert_break(story, BreakKind::Page).unwrap();
        doc.insert_text(story, "hello", &CharFormat::default()).unwrap();
        doc.recompose(story).unwrap();
        assert_eq!(doc.container(a).unwrap().pieces, 0);
        assert_eq!(doc.container(b).unwrap().pieces, 1);
        assert_eq!(doc.story_tail_container(story).unwrap(), Some(b));
    }

    #[test]
    fn consecutive_page_breaks_each_close_a_page() {
        let mut doc = doc();
        let mut containers = Vec::new();
        for _ in 0..3 {
            let page = doc.add_page(None, true).unwrap();
            containers.push(doc.create_text_container(page, Rect::new(0.0, 0.0, 200.0, 200.0)).unwrap());
        }
        doc.link_containers(containers[0], containers[1]).unwrap();
        doc.link_containers(containers[1], containers[2]).unwrap();
        let story = doc.container_story(containers[0]).unwrap();
        doc.insert_text(story, "one", &CharFormat::default()).unwrap();
        doc.insert_break(story, BreakKind::Page).unwrap();
        doc.insert_break(story, BreakKind::Page).unwrap();
        doc.insert_text(story, "three", &CharFormat::default()).unwrap();
        doc.recompose(story).unwrap();
        let pieces: Vec<usize> = containers.iter().map(|c| doc.container(*c).unwrap().pieces).collect();
        assert_eq!(pieces, vec![1, 0, 1]);
    }

    #[test]
    fn piece_too_wide_for_empty_frame_moves_to_wider_one() {
        let mut doc = doc();
        doc.register_asset("wide.png", Size::new(250.0, 50.0));
        let page = doc.add_page(None, true).unwrap();
        let a = doc.create_text_container(page, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let b = doc.create_text_container(page, Rect::new(0.0, 200.0, 300.0, 100.0)).unwrap();
        doc.link_containers(a, b).unwrap();
        let story = doc.container_story(a).unwrap();
        let placed = doc.place_inline(story, std::path::Path::new("wide.png")).unwrap();
        doc.recompose(story).unwrap();
        assert!(!doc.story_overflows(story).unwrap());
        assert_eq!(doc.container(b).unwrap().pieces, 1);
        assert_eq!(doc.graphic_page(placed.frame()).unwrap(), Some(page));
    }

    #[test]
    fn zero_leading_still_composes() {
        let mut doc = doc();
        let page = doc.add_page(None, true).unwrap();
        let a = doc.create_text_container(page, Rect::new(0.0, 0.0, 100.0, 10.0)).unwrap();
        let story = doc.container_story(a).unwrap();
        let format = ParagraphFormat {
            style: "flat".to_string(),
            point_size: 12.0,
            leading: 0.0,
            space_before: 0.0,
            space_after: 0.0,
            align: Default::default(),
        };
        doc.set_paragraph_format(story, &format).unwrap();
        doc.insert_text(story, &"x".repeat(10_000), &CharFormat::default()).unwrap();
        doc.recompose(story).unwrap();
        assert!(doc.story_overflows(story).unwrap());
        assert!(doc.container(a).unwrap().pieces > 0);
    }

    #[test]
    fn oversized_graphic_sticks_and_keeps_tail() {
        let mut doc = doc();
        doc.register_asset("big.png", Size::new(500.0, 500.0));
        let page = doc.add_page(None, true).unwrap();
        let a = doc.create_text_container(page, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let story = doc.container_story(a).unwrap();
        doc.insert_text(story, "before", &CharFormat::default()).unwrap();
        doc.insert_break(story, BreakKind::Paragraph).unwrap();
        let placed = doc.place_inline(story, std::path::Path::new("big.png")).unwrap();

        let b = doc.create_text_container(page, Rect::new(0.0, 200.0, 100.0, 100.0)).unwrap();
        doc.link_containers(a, b).unwrap();
        doc.recompose(story).unwrap();
        assert!(doc.story_overflows(story).unwrap());
        assert_eq!(doc.story_tail_container(story).unwrap(), Some(a));
        assert_eq!(doc.graphic_page(placed.frame()).unwrap(), None);
    }

    #[test]
    fn table_rows_split_across_containers() {
        let mut doc = doc();
        let page = doc.add_page(None, true).unwrap();
        let a = doc.create_text_container(page, Rect::new(0.0, 0.0, 200.0, 50.0)).unwrap();
        let story = doc.container_story(a).unwrap();
        let t = doc.insert_table(story, 4, 2, 0).unwrap();
        for row in 0..4 {
            doc.set_row_height(t, row, 20.0).unwrap();
        }
        doc.recompose(story).unwrap();
        assert!(doc.story_overflows(story).unwrap());
        assert_eq!(doc.container(a).unwrap().pieces, 2);
    }
}
