//! Co-locating floats that came from the same source page.

use crate::LayoutError;
use crate::composer::Composer;
use galley_traits::DocumentHost;
use galley_types::PageId;
use std::collections::BTreeMap;

/// Source page number → realized page, plus the first observation as a base
/// for deriving pages of sequences not seen yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordPageSequenceMap {
    pages: BTreeMap<u32, PageId>,
    base: Option<(u32, PageId)>,
}

impl WordPageSequenceMap {
    pub fn get(&self, seq: u32) -> Option<PageId> {
        self.pages.get(&seq).copied()
    }

    pub fn base(&self) -> Option<(u32, PageId)> {
        self.base
    }

    /// Records the page for `seq` unless one is already known. The first
    /// record ever made also becomes the base. Returns whether it was stored.
    pub fn record(&mut self, seq: u32, page: PageId) -> bool {
        if self.pages.contains_key(&seq) {
            return false;
        }
        self.pages.insert(seq, page);
        self.base.get_or_insert((seq, page));
        true
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl<H: DocumentHost> Composer<H> {
    /// The page a float with source page `seq` belongs on.
    ///
    /// A known sequence returns its recorded page. Otherwise the page is
    /// derived from the base entry by the difference in sequence numbers,
    /// appending pages if the document is too short. Without a base the
    /// active page is used. The result is recorded.
    pub fn page_for_sequence(&mut self, seq: u32) -> Result<PageId, LayoutError> {
        if let Some(page) = self.sequences.get(seq) {
            if self.host.page_index(page).is_ok() {
                return Ok(page);
            }
            log::warn!("Page recorded for sequence {} no longer exists.", seq);
        }

        let page = match self.sequences.base() {
            Some((base_seq, base_page)) => {
                let base_index = self.host.page_index(base_page)? as i64;
                let target = (base_index + i64::from(seq) - i64::from(base_seq)).max(0) as usize;
                self.extend_to(target)?
            }
            None => self.cursor.page,
        };
        self.sequences.record(seq, page);
        log::debug!("Sequence {} mapped to {}.", seq, page);
        Ok(page)
    }

    /// Appends pages in the active layout until `index` exists.
    fn extend_to(&mut self, index: usize) -> Result<PageId, LayoutError> {
        while self.host.page_count() <= index {
            let limit = self.config.safe_page_limit;
            if self.host.page_count() >= limit {
                return Err(LayoutError::PageLimit(limit));
            }
            let page = self.host.add_page(None, false)?;
            if let Err(e) = self.host.resize_page(page, self.cursor.layout.page_size()) {
                log::warn!("Could not size appended {}: {}", page, e);
            }
            if let Err(e) = self.host.set_page_margins(page, self.cursor.layout.margins) {
                log::warn!("Could not set margins on appended {}: {}", page, e);
            }
        }
        self.host
            .page_at(index)
            .ok_or_else(|| LayoutError::Geometry(format!("page {} missing after extension", index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn first_write_wins() {
        let mut map = WordPageSequenceMap::default();
        assert!(map.record(5, PageId::new(1)));
        assert!(!map.record(5, PageId::new(9)));
        assert!(map.record(6, PageId::new(2)));
        assert_eq!(map.get(5), Some(PageId::new(1)));
        assert_eq!(map.base(), Some((5, PageId::new(1))));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn derives_pages_from_base_offset() {
        let mut composer = composer();
        let first = composer.page_for_sequence(3).unwrap();
        assert_eq!(first, composer.cursor().page);

        // Sequence 5 is two pages after the base; the document grows to fit.
        let later = composer.page_for_sequence(5).unwrap();
        assert_eq!(composer.host().page_index(later).unwrap(), 2);
        assert_eq!(composer.host().page_count(), 3);

        // Lower sequences clamp at the first page.
        let earlier = composer.page_for_sequence(1).unwrap();
        assert_eq!(composer.host().page_index(earlier).unwrap(), 0);
        assert_eq!(composer.page_for_sequence(5).unwrap(), later);
    }
}
