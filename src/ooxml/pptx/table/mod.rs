//! Template tables: the owned table model and everything that fills it.
//!
//! - [`Table`]: deep copy of an `a:tbl`, row 0 is the header
//! - [`Paragraph`]: tag replacement and text extraction over text runs
//! - [`SlideTable`]: column titles, column removal and row filling for one table
//! - [`RowPaginator`]: spills rows onto cloned slides
pub mod background;
mod columns;
pub mod directive;
mod facade;
mod model;
pub mod options;
pub mod paginate;
pub mod text;

pub use background::{BackgroundAttacher, BackgroundPicture, FillRect};
pub use directive::{CellDirective, LogicalRow};
pub use facade::SlideTable;
pub use model::{GridColumn, Table, TableCell, TableRow};
pub use options::{DuplicateTagPolicy, FillOptions, ImageEmbedding};
pub use paginate::{Action, Cursor, RowPaginator, advance};
pub use text::{Inline, Paragraph, TextRun};

#[cfg(test)]
pub(crate) use model::fixtures;
