pub mod catalog;
pub mod parsers;
pub mod text;

pub use catalog::{CharacterStyle, ParagraphStyle, StyleCatalog, StyleGroup, normalize_style_name};
pub use parsers::{Dimension, StyleParseError, Unit, lenient_length, parse_attributes, parse_dimension_str, parse_length_str};
pub use text::{TextAlign, VerticalAlign};
