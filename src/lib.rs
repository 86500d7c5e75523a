//! Slidefill - fill PowerPoint template tables with row data
//!
//! A template slide carries a table: one header row plus a few data rows whose
//! cells contain tags such as `{name}`. Slidefill replaces the tags row by row and,
//! when the data outgrows the table, continues on fresh copies of the slide.
//!
//! # Features
//!
//! - **Tag substitution**: tags may be split across text runs; formatting of the
//!   run where a tag starts is kept
//! - **Pagination**: overflow rows spill onto cloned slides inserted in order,
//!   unused template rows are trimmed and the template slide is removed
//! - **Cell backgrounds**: a matching tag can attach a picture as the cell fill
//! - **Column removal**: drop columns from the grid and every row
//!
//! # Example
//!
//! ```no_run
//! use slidefill::{CellDirective, LogicalRow, PptxDeck, SlideTable};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut deck = PptxDeck::open("template.pptx")?;
//! let slide = deck.slides()?[0].clone();
//! let location = deck.tables(&slide)?.remove(0);
//!
//! let table = SlideTable::new(&mut deck, slide, location.id, location.name)?;
//! let rows: Vec<LogicalRow> = [("Ada", "London"), ("Grace", "New York")]
//!     .iter()
//!     .map(|(name, city)| {
//!         LogicalRow::new()
//!             .with(CellDirective::new("{name}", *name))
//!             .with(CellDirective::new("{city}", *city))
//!     })
//!     .collect();
//! let slides = table.set_rows(&rows)?;
//! println!("rendered onto {} slides", slides.len());
//!
//! deck.save("report.pptx")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Without a package
//!
//! [`MemoryDeck`] implements the same [`SlideDeck`] operations in memory, which is
//! handy for checking how rows will paginate:
//!
//! ```
//! use slidefill::ooxml::xml::XmlDocument;
//! use slidefill::{CellDirective, LogicalRow, MemoryDeck, SlideTable, Table};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let xml = r#"<a:tbl xmlns:a="urn:a"><a:tblGrid><a:gridCol w="100"/></a:tblGrid>
//!   <a:tr h="10"><a:tc><a:txBody><a:p><a:r><a:t>Name</a:t></a:r></a:p></a:txBody></a:tc></a:tr>
//!   <a:tr h="10"><a:tc><a:txBody><a:p><a:r><a:t>{name}</a:t></a:r></a:p></a:txBody></a:tc></a:tr>
//! </a:tbl>"#;
//! let table = Table::from_element(XmlDocument::parse(xml.as_bytes())?.root())?;
//!
//! let mut deck = MemoryDeck::new();
//! let template = deck.add_slide([(1, table)]);
//! let rows: Vec<LogicalRow> = ["a", "b", "c"]
//!     .iter()
//!     .map(|name| LogicalRow::new().with(CellDirective::new("{name}", *name)))
//!     .collect();
//!
//! let slides = SlideTable::new(&mut deck, template, 1, "names")?.set_rows(&rows)?;
//! assert_eq!(slides.len(), 3);
//! # Ok(())
//! # }
//! ```

/// OOXML (Office Open XML) support
///
/// Package handling, the XML tree used for edited parts, and the PresentationML
/// table machinery.
pub mod ooxml;

// Re-export commonly used types for convenience
pub use ooxml::error::{OoxmlError, Result};
pub use ooxml::pptx::{
    BackgroundPicture, CellDirective, DuplicateTagPolicy, FillOptions, ImageEmbedding,
    ImageFormat, ImageResource, LogicalRow, MemoryDeck, MemorySlide, Paragraph, PptxDeck,
    SlideDeck, SlideRef, SlideTable, Table, TableLocation,
};
