pub mod asset;
pub mod host;

pub use asset::{
    AssetError, AssetResolver, InMemoryAssetResolver, ResolvedAsset, extension_candidates,
};
pub use host::{
    BreakKind, CellEdges, CellFormat, CharFormat, ColumnWidth, DocumentHost, EdgeStroke, HostError,
    HostResult, NoteKind, ParagraphFormat, PlacedItem, TextWrap, WrapMode,
};
