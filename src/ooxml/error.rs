/// Error types for OOXML operations.
use thiserror::Error;

/// Result type for OOXML operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Error types for OOXML operations.
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// OPC package error
    #[error("OPC error: {0}")]
    Opc(#[from] crate::ooxml::opc::error::OpcError),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Part not found
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// The slide handle does not belong to the deck
    #[error("Slide not found: {0}")]
    SlideNotFound(String),

    /// A slide was asked to follow itself in the slide order
    #[error("Slide {0} cannot be placed after itself")]
    SelfInsertion(String),

    /// No table with the requested id on the slide
    #[error("Table {id} not found on slide {slide}")]
    TableNotFound { slide: String, id: u32 },

    /// The table tree does not have the expected grid/row/cell shape
    #[error("Malformed table: {0}")]
    MalformedTable(String),

    /// A column index past the end of the grid
    #[error("Column index {index} out of range for a table with {count} columns")]
    ColumnOutOfRange { index: usize, count: usize },

    /// The template table has a header row but no data rows to fill
    #[error("Template table has no data rows")]
    NoTemplateRows,

    /// A logical row names the same tag twice while duplicates are rejected
    #[error("Duplicate tag {tag:?} in logical row {row}")]
    DuplicateTag { row: usize, tag: String },

    /// Invalid format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for OoxmlError {
    fn from(err: quick_xml::Error) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for OoxmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}

impl From<std::str::Utf8Error> for OoxmlError {
    fn from(err: std::str::Utf8Error) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}
