/// The in-memory OPC package.
///
/// OpcPackage holds every part's bytes together with its content type and outgoing
/// relationships. `.rels` members and `[Content_Types].xml` are not parts; they are
/// parsed on load and regenerated on save.
use crate::ooxml::opc::constants::{content_type, relationship_type};
use crate::ooxml::opc::content_types::ContentTypes;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::{PhysPkgReader, PhysPkgWriter};
use crate::ooxml::opc::rel::Relationships;
use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::path::Path;

/// A part: bytes, content type and relationships.
#[derive(Debug, Clone)]
pub struct Part {
    partname: PackURI,
    content_type: String,
    blob: Vec<u8>,
    rels: Relationships,
}

impl Part {
    pub fn new(partname: PackURI, content_type: impl Into<String>, blob: Vec<u8>) -> Self {
        Self {
            partname,
            content_type: content_type.into(),
            blob,
            rels: Relationships::new(),
        }
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[inline]
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    pub fn set_blob(&mut self, blob: Vec<u8>) {
        self.blob = blob;
    }

    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    pub fn set_rels(&mut self, rels: Relationships) {
        self.rels = rels;
    }
}

/// Main API class for working with OPC packages.
pub struct OpcPackage {
    /// Package-level relationships (`/_rels/.rels`)
    rels: Relationships,

    /// All parts, ordered by partname so saved archives are deterministic
    parts: BTreeMap<PackURI, Part>,

    content_types: ContentTypes,
}

impl OpcPackage {
    /// Create a new empty OPC package.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(),
            parts: BTreeMap::new(),
            content_types: ContentTypes::new(),
        }
    }

    /// Open an OPC package from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::unmarshal(PhysPkgReader::open(path)?)
    }

    /// Load an OPC package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::unmarshal(PhysPkgReader::from_reader(reader)?)
    }

    /// Load an OPC package from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::unmarshal(PhysPkgReader::from_bytes(data)?)
    }

    fn unmarshal(phys: PhysPkgReader) -> Result<Self> {
        let mut members = phys.into_members();

        let ct_pos = members
            .iter()
            .position(|(uri, _)| uri.as_str() == CONTENT_TYPES_URI)
            .ok_or_else(|| OpcError::PartNotFound(CONTENT_TYPES_URI.to_string()))?;
        let (_, ct_blob) = members.swap_remove(ct_pos);
        let mut content_types = ContentTypes::from_xml(&ct_blob)?;
        if !content_types.has_default("rels") {
            content_types.add_default("rels", content_type::OPC_RELATIONSHIPS);
        }

        let mut package = Self {
            rels: Relationships::new(),
            parts: BTreeMap::new(),
            content_types,
        };

        let mut rels_members = Vec::new();
        for (uri, blob) in members {
            if uri.ext() == "rels" && uri.rels_source().is_some() {
                rels_members.push((uri, blob));
                continue;
            }
            let content_type = match package.content_types.get(&uri) {
                Ok(ct) => ct.to_string(),
                Err(_) => {
                    log::warn!("no content type registered for {}", uri);
                    "application/octet-stream".to_string()
                },
            };
            package
                .parts
                .insert(uri.clone(), Part::new(uri, content_type, blob));
        }

        for (uri, blob) in rels_members {
            let rels = Relationships::from_xml(&blob)?;
            // rels_source() was checked above
            let Some(source) = uri.rels_source() else {
                continue;
            };
            if source.as_str() == PACKAGE_URI {
                package.rels = rels;
            } else if let Some(part) = package.parts.get_mut(&source) {
                part.set_rels(rels);
            } else {
                log::warn!("dropping relationships of missing part {}", source);
            }
        }

        Ok(package)
    }

    /// Partname of the main document (e.g. `/ppt/presentation.xml`).
    pub fn main_document_partname(&self) -> Result<PackURI> {
        self.rels
            .by_reltype(relationship_type::OFFICE_DOCUMENT)?
            .target_partname(PACKAGE_URI)
    }

    pub fn part(&self, partname: &PackURI) -> Result<&Part> {
        self.parts
            .get(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    pub fn part_mut(&mut self, partname: &PackURI) -> Result<&mut Part> {
        self.parts
            .get_mut(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    #[inline]
    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname)
    }

    /// Add a part, registering an Override content type unless the extension
    /// default already yields the part's content type.
    pub fn add_part(&mut self, part: Part) {
        let covered = self
            .content_types
            .get(part.partname())
            .is_ok_and(|ct| ct == part.content_type());
        if !covered {
            self.content_types
                .add_override(part.partname().as_str(), part.content_type());
        }
        self.parts.insert(part.partname().clone(), part);
    }

    /// Remove a part and its Override entry.
    pub fn remove_part(&mut self, partname: &PackURI) -> Option<Part> {
        self.content_types.remove_override(partname);
        self.parts.remove(partname)
    }

    pub fn iter_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    #[inline]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    #[inline]
    pub fn content_types_mut(&mut self) -> &mut ContentTypes {
        &mut self.content_types
    }

    /// Next free partname for a template with a `%d` placeholder,
    /// e.g. `/ppt/media/image%d.png`.
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        let mut fmt = itoa::Buffer::new();
        for n in 1u32..=100_000 {
            let candidate = template.replace("%d", fmt.format(n));
            let uri = PackURI::new(candidate).map_err(OpcError::InvalidPackUri)?;
            if !self.parts.contains_key(&uri) {
                return Ok(uri);
            }
        }
        Err(OpcError::InvalidPackUri(format!(
            "no free partname for template {}",
            template
        )))
    }

    /// Serialize the package to ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = PhysPkgWriter::new();

        let ct_uri = PackURI::new(CONTENT_TYPES_URI).map_err(OpcError::InvalidPackUri)?;
        writer.write(&ct_uri, self.content_types.to_xml().as_bytes())?;

        let pkg_rels_uri = PackURI::new(PACKAGE_URI)
            .map_err(OpcError::InvalidPackUri)?
            .rels_uri();
        writer.write(&pkg_rels_uri, self.rels.to_xml().as_bytes())?;

        for part in self.parts.values() {
            writer.write(part.partname(), part.blob())?;
            if !part.rels().is_empty() {
                writer.write(&part.partname().rels_uri(), part.rels().to_xml().as_bytes())?;
            }
        }

        writer.finish()
    }

    /// Write the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn create_minimal_pptx() -> Vec<u8> {
        let mut zip_data = Vec::new();
        {
            let cursor = Cursor::new(&mut zip_data);
            let mut writer = ZipWriter::new(cursor);
            let options = SimpleFileOptions::default();

            writer.start_file("[Content_Types].xml", options).unwrap();
            writer.write_all(br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
</Types>"#).unwrap();

            writer.start_file("_rels/.rels", options).unwrap();
            writer.write_all(br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
</Relationships>"#).unwrap();

            writer.start_file("ppt/presentation.xml", options).unwrap();
            writer
                .write_all(br#"<p:presentation xmlns:p="urn:p"/>"#)
                .unwrap();

            writer.finish().unwrap();
        }
        zip_data
    }

    #[test]
    fn test_open_package() {
        let pkg = OpcPackage::from_reader(Cursor::new(create_minimal_pptx())).unwrap();
        assert_eq!(pkg.part_count(), 1);

        let main = pkg.main_document_partname().unwrap();
        assert_eq!(main.as_str(), "/ppt/presentation.xml");
        assert_eq!(pkg.part(&main).unwrap().content_type(), ct::PML_PRESENTATION_MAIN);
    }

    #[test]
    fn test_add_part_registers_content_type() {
        let mut pkg = OpcPackage::from_bytes(&create_minimal_pptx()).unwrap();
        let image = pkg.next_partname("/ppt/media/image%d.png").unwrap();
        assert_eq!(image.as_str(), "/ppt/media/image1.png");

        pkg.add_part(Part::new(image.clone(), ct::PNG, vec![1, 2, 3]));
        assert_eq!(pkg.content_types().get(&image).unwrap(), ct::PNG);
        assert_eq!(
            pkg.next_partname("/ppt/media/image%d.png").unwrap().as_str(),
            "/ppt/media/image2.png"
        );
    }

    #[test]
    fn test_save_round_trip() {
        let mut pkg = OpcPackage::from_bytes(&create_minimal_pptx()).unwrap();
        let main = pkg.main_document_partname().unwrap();
        pkg.part_mut(&main)
            .unwrap()
            .rels_mut()
            .add(relationship_type::SLIDE, "slides/slide1.xml");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pptx");
        pkg.save(&path).unwrap();

        let reopened = OpcPackage::open(&path).unwrap();
        let part = reopened.part(&main).unwrap();
        assert_eq!(part.blob(), br#"<p:presentation xmlns:p="urn:p"/>"#);
        assert_eq!(part.rels().len(), 1);
    }

    #[test]
    fn test_missing_content_types() {
        let mut writer = PhysPkgWriter::new();
        writer
            .write(&PackURI::new("/a.xml").unwrap(), b"<a/>")
            .unwrap();
        let bytes = writer.finish().unwrap();
        assert!(OpcPackage::from_bytes(&bytes).is_err());
    }
}
