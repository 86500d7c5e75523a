/// Errors raised while reading, editing or writing an OPC package.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpcError {
    /// No file at the given path
    #[error("Package file does not exist: {0}")]
    PackageNotFound(String),

    /// A partname that does not start with `/` or cannot be allocated
    #[error("Invalid partname: {0}")]
    InvalidPackUri(String),

    #[error("No such part in package: {0}")]
    PartNotFound(String),

    #[error("Missing relationship: {0}")]
    RelationshipNotFound(String),

    /// Neither an Override nor an extension Default covers the part
    #[error("No content type registered for {0}")]
    ContentTypeNotFound(String),

    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    /// Malformed `.rels` or `[Content_Types].xml`
    #[error("Malformed package XML: {0}")]
    XmlError(String),

    #[error("ZIP container error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("XML reader error: {0}")]
    QuickXmlError(#[from] quick_xml::Error),

    #[error("Invalid UTF-8 in package XML: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    #[error("Malformed XML attribute: {0}")]
    AttrError(String),
}

impl From<quick_xml::events::attributes::AttrError> for OpcError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::AttrError(err.to_string())
    }
}

/// Result alias for package operations.
pub type Result<T> = std::result::Result<T, OpcError>;
