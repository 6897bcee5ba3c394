//! Newtype wrappers for host object identifiers.
//!
//! Pages, containers, stories and the rest all live in separate id spaces on the
//! host side. Wrapping the raw integer keeps a `ContainerId` from being handed to
//! an API that expects a `PageId`.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! host_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }

            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

host_id!(
    /// A page in the host document.
    PageId,
    "page"
);
host_id!(
    /// A spread groups one or more facing pages.
    SpreadId,
    "spread"
);
host_id!(
    /// A geometric region that displays a slice of a story.
    ContainerId,
    "container"
);
host_id!(
    /// The flowing content owned by a chain of containers.
    StoryId,
    "story"
);
host_id!(
    /// A graphic frame, either free on a page or anchored inline in a story.
    GraphicId,
    "graphic"
);
host_id!(TableId, "table");
host_id!(NoteId, "note");

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn ids_display_with_kind_prefix() {
        assert_eq!(PageId::new(3).to_string(), "page#3");
        assert_eq!(ContainerId::from(7).to_string(), "container#7");
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&StoryId::new(12)).unwrap();
        assert_eq!(json, "12");
        let back: StoryId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StoryId::new(12));
    }

    #[test]
    fn ids_work_as_map_keys() {
        let mut pages = HashMap::new();
        pages.insert(PageId::new(0), "first");
        pages.insert(PageId::new(1), "second");
        assert_eq!(pages.get(&PageId::new(1)), Some(&"second"));
        assert_eq!(PageId::new(1).index(), 1);
    }
}
