//! # Paginated Rendering
//!
//! Markdown subset parsing, page layout, and footer finalization for
//! exported evidence.

pub mod document;
pub mod layout;
pub mod markdown;

pub use document::{
    pagination_line, seal_line, DraftDocument, Element, ExportFormat, Footer, Page, SealedDocument, SealedPage,
    TextStyle,
};
pub use layout::{wrap, Layout, LayoutConfig};
pub use markdown::{parse, MdBlock};
