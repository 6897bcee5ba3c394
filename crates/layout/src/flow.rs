//! Flow Controller: resolves story overflow by allocating linked containers.

use crate::LayoutError;
use crate::composer::Composer;
use crate::manager::FrameOptions;
use galley_traits::DocumentHost;
use galley_types::ContainerId;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    /// The story no longer overflows.
    Settled,
    /// The per-flush allocation cap was hit; the story may still overflow.
    GuardTripped,
    /// The document-wide page limit was hit; the story may still overflow.
    PageLimitReached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowReport {
    pub status: FlowStatus,
    pub containers_added: usize,
    /// Container holding the story tail after the last recompose.
    pub tail: Option<ContainerId>,
}

impl FlowReport {
    pub fn settled(&self) -> bool {
        self.status == FlowStatus::Settled
    }
}

impl<H: DocumentHost> Composer<H> {
    /// Allocates containers until the active story stops overflowing.
    ///
    /// Each new container is placed on a page after the active one, using the
    /// active layout. The story tail is checked after every allocation; when it
    /// stays in the same container for `stall_limit` allocations in a row the
    /// flush fails with [`LayoutError::Stalled`]. The per-call cap and the
    /// document page limit end the flush without an error, reported through
    /// [`FlowReport::status`].
    pub fn flush_overflow(&mut self) -> Result<FlowReport, LayoutError> {
        let story = self.cursor.story;
        self.host.recompose(story)?;

        let mut report = FlowReport {
            status: FlowStatus::Settled,
            containers_added: 0,
            tail: self.host.story_tail_container(story)?,
        };
        let mut repeats = 0;

        while self.host.story_overflows(story)? {
            if report.containers_added >= self.config.max_pages_per_flush {
                log::error!(
                    "Overflow guard tripped after {} containers for {}; continuing with overset text.",
                    report.containers_added,
                    story
                );
                report.status = FlowStatus::GuardTripped;
                break;
            }

            let layout = self.cursor.layout;
            let options = FrameOptions::after(self.cursor.page);
            let (page, container) = match self.create_layout_frame(&layout, Some(self.cursor.container), options) {
                Ok(created) => created,
                Err(LayoutError::PageLimit(limit)) => {
                    log::error!("Page limit of {} reached while flowing {}.", limit, story);
                    report.status = FlowStatus::PageLimitReached;
                    break;
                }
                Err(e) => return Err(e),
            };
            self.cursor.advance_to(page, container);
            report.containers_added += 1;

            self.settle();
            self.host.recompose(story)?;
            let tail = self.host.story_tail_container(story)?;
            if tail == report.tail {
                repeats += 1;
                log::debug!("Tail of {} still in {:?} ({} repeats).", story, tail, repeats);
                if repeats >= self.config.stall_limit {
                    let container = tail.unwrap_or(container);
                    log::error!("Flow of {} stalled in {}.", story, container);
                    return Err(LayoutError::Stalled { container, repeats });
                }
            } else {
                repeats = 0;
                report.tail = tail;
            }
        }

        if report.containers_added > 0 {
            log::debug!("Flushed {}: {} containers added, {:?}.", story, report.containers_added, report.status);
        }
        Ok(report)
    }

    /// Busy-waits for the configured settle time.
    pub(crate) fn settle(&self) {
        let wait = self.config.settle_wait();
        if wait.is_zero() {
            return;
        }
        let until = Instant::now() + wait;
        while Instant::now() < until {
            std::hint::spin_loop();
        }
    }
}
