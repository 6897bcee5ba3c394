use crate::inline::RunFormat;
use crate::state::LayoutState;
use galley_traits::NoteKind;
use galley_types::{ContainerId, PageId, StoryId};
use std::collections::HashSet;

/// The "current position" of a composition run.
///
/// Every engine operation reads and updates this explicitly. `container` is
/// always the tail of the active story's chain.
#[derive(Debug, Clone)]
pub struct FlowCursor {
    pub page: PageId,
    pub container: ContainerId,
    pub story: StoryId,
    /// Geometry of the active page.
    pub layout: LayoutState,
    /// True when the next inserted text begins a new paragraph.
    pub at_paragraph_start: bool,
    /// Story length right after the most recent float anchor.
    pub last_anchor: Option<usize>,
    /// Layout to return to once a table with its own layout has settled.
    pub pending_restore: Option<LayoutState>,
    pub paragraphs_since_flush: usize,
    pub run_format: RunFormat,
    /// Paragraph style applied to the next paragraph, if one was requested.
    pub next_paragraph_style: Option<String>,
    pub(crate) notes_seen: HashSet<(NoteKind, u32)>,
}

impl FlowCursor {
    pub fn new(page: PageId, container: ContainerId, story: StoryId, layout: LayoutState) -> Self {
        Self {
            page,
            container,
            story,
            layout,
            at_paragraph_start: true,
            last_anchor: None,
            pending_restore: None,
            paragraphs_since_flush: 0,
            run_format: RunFormat::default(),
            next_paragraph_style: None,
            notes_seen: HashSet::new(),
        }
    }

    /// Moves the write position to a freshly linked container.
    pub(crate) fn advance_to(&mut self, page: PageId, container: ContainerId) {
        self.page = page;
        self.container = container;
    }
}
