//! PowerPoint (.pptx) template tables.
//!
//! A template slide holds a table whose first row is a header and whose remaining
//! rows contain tags such as `{name}`. [`SlideTable`] fills those rows from caller
//! data, cloning the slide whenever the rows run out.
//!
//! - [`deck`]: the [`SlideDeck`] operations plus the in-memory [`MemoryDeck`]
//! - [`package`]: [`PptxDeck`], a deck backed by a .pptx package
//! - [`table`]: table model, tag substitution, column removal and pagination
pub mod deck;
pub mod format;
pub mod package;
pub mod table;

pub use deck::{ImageResource, MemoryDeck, MemorySlide, SlideDeck};
pub use format::ImageFormat;
pub use package::{PptxDeck, SlideRef, TableLocation};
pub use table::{
    BackgroundPicture, CellDirective, DuplicateTagPolicy, FillOptions, ImageEmbedding,
    LogicalRow, Paragraph, SlideTable, Table,
};
