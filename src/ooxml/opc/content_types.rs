//! The `[Content_Types].xml` registry.
//!
//! Implements the OPC content type discovery algorithm: an `Override` for the exact
//! partname wins, otherwise the `Default` registered for the file extension applies.
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// (lowercased extension, content type) in document order
    defaults: Vec<(String, String)>,
    /// (partname, content type) in document order
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse content types from `[Content_Types].xml`.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut map = Self::new();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let key_attr: Option<&[u8]> = match e.local_name().as_ref() {
                        b"Default" => Some(b"Extension"),
                        b"Override" => Some(b"PartName"),
                        _ => None,
                    };

                    if let Some(key_attr) = key_attr {
                        let mut key = None;
                        let mut content_type = None;
                        for attr in e.attributes() {
                            let attr = attr?;
                            let value = unescape(std::str::from_utf8(&attr.value)?)
                                .map_err(|e| OpcError::XmlError(e.to_string()))?
                                .into_owned();
                            if attr.key.as_ref() == key_attr {
                                key = Some(value);
                            } else if attr.key.as_ref() == b"ContentType" {
                                content_type = Some(value);
                            }
                        }

                        if let (Some(key), Some(ct)) = (key, content_type) {
                            if key_attr == b"Extension" {
                                map.add_default(&key, &ct);
                            } else {
                                map.add_override(&key, &ct);
                            }
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!(
                        "Content types parse error: {}",
                        e
                    )));
                },
                _ => {},
            }
            buf.clear();
        }

        Ok(map)
    }

    /// Register a default content type for a file extension.
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        let extension = extension.to_ascii_lowercase();
        match self.defaults.iter_mut().find(|(ext, _)| *ext == extension) {
            Some(slot) => slot.1 = content_type.to_string(),
            None => self.defaults.push((extension, content_type.to_string())),
        }
    }

    /// Register an override content type for a specific partname.
    pub fn add_override(&mut self, partname: &str, content_type: &str) {
        match self.overrides.iter_mut().find(|(pn, _)| pn == partname) {
            Some(slot) => slot.1 = content_type.to_string(),
            None => self
                .overrides
                .push((partname.to_string(), content_type.to_string())),
        }
    }

    /// Drop the override for a partname, if any.
    pub fn remove_override(&mut self, partname: &PackURI) {
        self.overrides.retain(|(pn, _)| pn != partname.as_str());
    }

    /// Whether a default is registered for an extension.
    pub fn has_default(&self, extension: &str) -> bool {
        let extension = extension.to_ascii_lowercase();
        self.defaults.iter().any(|(ext, _)| *ext == extension)
    }

    /// Content type of a partname: override first, then extension default.
    pub fn get(&self, partname: &PackURI) -> Result<&str> {
        if let Some((_, ct)) = self.overrides.iter().find(|(pn, _)| pn == partname.as_str()) {
            return Ok(ct);
        }
        let ext = partname.ext().to_ascii_lowercase();
        self.defaults
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, ct)| ct.as_str())
            .ok_or_else(|| OpcError::ContentTypeNotFound(partname.to_string()))
    }

    /// Serialize back to `[Content_Types].xml`.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.overrides.len() * 160);
        xml.push_str(crate::ooxml::xml::XML_DECLARATION);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns=""#);
        xml.push_str(namespace::OPC_CONTENT_TYPES);
        xml.push_str(r#"">"#);
        for (ext, ct) in &self.defaults {
            xml.push_str(r#"<Default Extension=""#);
            xml.push_str(&escape(ext.as_str()));
            xml.push_str(r#"" ContentType=""#);
            xml.push_str(&escape(ct.as_str()));
            xml.push_str(r#""/>"#);
        }
        for (pn, ct) in &self.overrides {
            xml.push_str(r#"<Override PartName=""#);
            xml.push_str(&escape(pn.as_str()));
            xml.push_str(r#"" ContentType=""#);
            xml.push_str(&escape(ct.as_str()));
            xml.push_str(r#""/>"#);
        }
        xml.push_str("</Types>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;

    const TYPES: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="XML" ContentType="application/xml"/>
  <Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>
</Types>"#;

    #[test]
    fn test_lookup_prefers_override() {
        let types = ContentTypes::from_xml(TYPES).unwrap();
        let slide = PackURI::new("/ppt/slides/slide1.xml").unwrap();
        assert_eq!(types.get(&slide).unwrap(), ct::PML_SLIDE);

        let other = PackURI::new("/ppt/other.xml").unwrap();
        assert_eq!(types.get(&other).unwrap(), ct::XML);

        let png = PackURI::new("/ppt/media/image1.png").unwrap();
        assert!(types.get(&png).is_err());
    }

    #[test]
    fn test_add_and_remove() {
        let mut types = ContentTypes::from_xml(TYPES).unwrap();
        assert!(!types.has_default("png"));
        types.add_default("PNG", ct::PNG);
        assert!(types.has_default("png"));

        let slide2 = PackURI::new("/ppt/slides/slide2.xml").unwrap();
        types.add_override(slide2.as_str(), ct::PML_SLIDE);
        assert_eq!(types.get(&slide2).unwrap(), ct::PML_SLIDE);
        types.remove_override(&slide2);
        assert_eq!(types.get(&slide2).unwrap(), ct::XML);

        let reparsed = ContentTypes::from_xml(types.to_xml().as_bytes()).unwrap();
        assert_eq!(reparsed, types);
    }
}
