//! Office Open XML (OOXML) support.
//!
//! 1. **XML layer** (`xml`): owned element tree for the parts that get edited
//! 2. **OPC layer** (`opc`): package handling (ZIP, parts, relationships, content types)
//! 3. **PresentationML** (`pptx`): template tables in slides
pub mod error;
pub mod opc;
pub mod pptx;
pub mod xml;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};

// Re-export error types
pub use error::{OoxmlError, Result};
