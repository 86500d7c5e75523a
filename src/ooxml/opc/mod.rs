/// Open Packaging Conventions (OPC) implementation.
///
/// Just enough of the packaging model to edit a presentation in place:
///
/// - Pack URIs and relative reference resolution
/// - Part relationships (`_rels/*.rels`)
/// - Content type registry (`[Content_Types].xml`)
/// - ZIP-based physical packaging, read fully into memory and written back
pub mod constants;
pub mod content_types;
pub mod error;
pub mod package;
pub mod packuri;
pub mod phys_pkg;
pub mod rel;

// Re-export commonly used types
pub use content_types::ContentTypes;
pub use package::{OpcPackage, Part};
pub use packuri::PackURI;
pub use rel::{Relationship, Relationships};
