pub mod color;
pub mod geometry;
pub mod ids;

pub use color::Color;
pub use geometry::{GEOMETRY_EPSILON, Margins, Rect, Size};
pub use ids::{ContainerId, GraphicId, NoteId, PageId, SpreadId, StoryId, TableId};
