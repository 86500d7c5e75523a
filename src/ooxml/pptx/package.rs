/// A PowerPoint (.pptx) package opened for table filling.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{namespace, relationship_type as rt};
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::{OpcPackage, PackURI, Part, Relationship, Relationships};
use crate::ooxml::pptx::deck::{ImageResource, SlideDeck};
use crate::ooxml::pptx::format::ImageFormat;
use crate::ooxml::pptx::table::Table;
use crate::ooxml::xml::{XmlDocument, XmlElement, XmlNode, local_part};
use std::path::Path;

/// Slide ids below this value are reserved.
const MIN_SLIDE_ID: u32 = 256;

/// Handle to a slide part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlideRef {
    partname: PackURI,
}

impl SlideRef {
    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }
}

/// A table found on a slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocation {
    /// `p:cNvPr/@id` of the enclosing graphic frame.
    pub id: u32,
    /// `p:cNvPr/@name` of the enclosing graphic frame.
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

/// A presentation package implementing [`SlideDeck`].
///
/// Slide order lives in the presentation part's `p:sldIdLst`; every edit to it is
/// written back to the part immediately.
pub struct PptxDeck {
    package: OpcPackage,
    presentation_uri: PackURI,
    presentation: XmlDocument,
}

impl PptxDeck {
    /// Open a .pptx file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_package(OpcPackage::open(path)?)
    }

    /// Load a .pptx from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_package(OpcPackage::from_bytes(data)?)
    }

    fn from_package(package: OpcPackage) -> Result<Self> {
        let presentation_uri = package.main_document_partname()?;
        let part = package.part(&presentation_uri)?;
        // presentations, templates, slide shows and their macro-enabled variants
        if !part.content_type().contains("presentationml") {
            return Err(OoxmlError::InvalidFormat(format!(
                "not a presentation: {}",
                part.content_type()
            )));
        }
        let presentation = XmlDocument::parse(part.blob())?;
        Ok(Self {
            package,
            presentation_uri,
            presentation,
        })
    }

    /// Write the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        Ok(self.package.save(path)?)
    }

    /// Serialize the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.package.to_bytes()?)
    }

    /// The underlying package.
    #[inline]
    pub fn package(&self) -> &OpcPackage {
        &self.package
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> Result<Vec<SlideRef>> {
        let Some(list) = self.presentation.root().child("sldIdLst") else {
            return Ok(Vec::new());
        };
        let rels = self.package.part(&self.presentation_uri)?.rels();
        list.elements()
            .filter(|el| el.local_name() == "sldId")
            .map(|el| -> Result<SlideRef> {
                let r_id = relationship_attr(el).ok_or_else(|| {
                    OoxmlError::Xml("p:sldId without a relationship id".to_string())
                })?;
                let rel = rels
                    .get(r_id)
                    .ok_or_else(|| OpcError::RelationshipNotFound(r_id.to_string()))?;
                Ok(SlideRef {
                    partname: rel.target_partname(self.presentation_uri.base_uri())?,
                })
            })
            .collect()
    }

    #[inline]
    pub fn slide_count(&self) -> usize {
        self.presentation
            .root()
            .child("sldIdLst")
            .map_or(0, |list| list.elements().filter(|el| el.local_name() == "sldId").count())
    }

    /// Every table on a slide, in document order.
    pub fn tables(&self, slide: &SlideRef) -> Result<Vec<TableLocation>> {
        let doc = self.slide_document(slide)?;
        let mut frames = Vec::new();
        doc.root().descendants_where(
            &|el: &XmlElement| el.local_name() == "graphicFrame" && el.find("tbl").is_some(),
            &mut frames,
        );

        let mut tables = Vec::with_capacity(frames.len());
        for frame in frames {
            let Some(props) = frame_properties(frame) else {
                log::warn!("graphic frame without p:cNvPr on {}", slide.partname);
                continue;
            };
            let Some(id) = props.attr("id").and_then(|id| id.parse().ok()) else {
                log::warn!("graphic frame with a non-numeric id on {}", slide.partname);
                continue;
            };
            let Some(tbl) = frame.find("tbl") else {
                continue;
            };
            tables.push(TableLocation {
                id,
                name: props.attr("name").unwrap_or_default().to_string(),
                rows: tbl.elements().filter(|el| el.local_name() == "tr").count(),
                columns: tbl.child("tblGrid").map_or(0, |grid| {
                    grid.elements().filter(|el| el.local_name() == "gridCol").count()
                }),
            });
        }
        Ok(tables)
    }

    fn slide_part(&self, slide: &SlideRef) -> Result<&Part> {
        self.package
            .part(&slide.partname)
            .map_err(|_| OoxmlError::SlideNotFound(slide.partname.to_string()))
    }

    fn slide_part_mut(&mut self, slide: &SlideRef) -> Result<&mut Part> {
        self.package
            .part_mut(&slide.partname)
            .map_err(|_| OoxmlError::SlideNotFound(slide.partname.to_string()))
    }

    fn slide_document(&self, slide: &SlideRef) -> Result<XmlDocument> {
        XmlDocument::parse(self.slide_part(slide)?.blob())
    }

    fn presentation_rels(&self) -> Result<&Relationships> {
        Ok(self.package.part(&self.presentation_uri)?.rels())
    }

    /// Store the edited presentation tree back into its part.
    fn write_presentation(&mut self) -> Result<()> {
        let blob = self.presentation.to_bytes();
        self.package.part_mut(&self.presentation_uri)?.set_blob(blob);
        Ok(())
    }

    /// Relationship id under which the presentation references `slide`.
    fn slide_r_id(&self, slide: &SlideRef) -> Result<Option<String>> {
        Ok(self
            .presentation_rels()?
            .find_target(self.presentation_uri.base_uri(), &slide.partname)
            .map(|rel| rel.r_id().to_string()))
    }
}

impl SlideDeck for PptxDeck {
    type Slide = SlideRef;

    fn locate_table(&self, slide: &SlideRef, table_id: u32) -> Result<Table> {
        let doc = self.slide_document(slide)?;
        let not_found = || OoxmlError::TableNotFound {
            slide: slide.partname.to_string(),
            id: table_id,
        };
        let mut frames = Vec::new();
        doc.root()
            .descendants_where(&|el: &XmlElement| is_frame(el, table_id), &mut frames);
        let tbl = frames
            .first()
            .and_then(|frame| frame.find("tbl"))
            .ok_or_else(not_found)?;
        Table::from_element(tbl)
    }

    fn clone_slide(&mut self, slide: &SlideRef) -> Result<SlideRef> {
        let source = self.slide_part(slide)?;
        let partname = self.package.next_partname("/ppt/slides/slide%d.xml")?;

        let source_base = slide.partname.base_uri();
        let mut rels = Relationships::new();
        for rel in source.rels().iter() {
            // a notes slide belongs to exactly one slide
            if rel.reltype() == rt::NOTES_SLIDE {
                continue;
            }
            let target_ref = if rel.is_external() {
                rel.target_ref().to_string()
            } else {
                rel.target_partname(source_base)?
                    .relative_ref(partname.base_uri())
            };
            rels.insert(Relationship::new(
                rel.r_id().to_string(),
                rel.reltype().to_string(),
                target_ref,
                rel.is_external(),
            ));
        }

        let mut part = Part::new(
            partname.clone(),
            source.content_type(),
            source.blob().to_vec(),
        );
        part.set_rels(rels);
        self.package.add_part(part);
        Ok(SlideRef { partname })
    }

    fn insert_after(&mut self, slide: &SlideRef, after: &SlideRef) -> Result<()> {
        self.slide_part(slide)?;
        if slide == after {
            return Err(OoxmlError::SelfInsertion(slide.partname.to_string()));
        }
        let after_r_id = self
            .slide_r_id(after)?
            .ok_or_else(|| OoxmlError::SlideNotFound(after.partname.to_string()))?;

        let base = self.presentation_uri.base_uri().to_string();
        let rels = self.package.part_mut(&self.presentation_uri)?.rels_mut();
        let r_id = match rels.find_target(&base, &slide.partname) {
            Some(rel) => rel.r_id().to_string(),
            None => rels.add(rt::SLIDE, &slide.partname.relative_ref(&base)),
        };

        let root = self.presentation.root_mut();
        let r_prefix = relationship_prefix(root);
        let list = root
            .child_mut("sldIdLst")
            .ok_or_else(|| OoxmlError::Xml("presentation has no p:sldIdLst".to_string()))?;

        // drop a stale entry for the same slide
        list.children_mut().retain(|node| match node {
            XmlNode::Element(el) => relationship_attr(el) != Some(r_id.as_str()),
            _ => true,
        });

        let next_id = list
            .elements()
            .filter_map(|el| el.attr("id")?.parse::<u32>().ok())
            .max()
            .map_or(MIN_SLIDE_ID, |max| (max + 1).max(MIN_SLIDE_ID));
        let insert_at = list
            .children()
            .iter()
            .position(|node| {
                matches!(node, XmlNode::Element(el) if relationship_attr(el) == Some(after_r_id.as_str()))
            })
            .map(|pos| pos + 1)
            .ok_or_else(|| OoxmlError::SlideNotFound(after.partname.to_string()))?;

        let mut buf = itoa::Buffer::new();
        let entry = XmlElement::new(list.qualify("sldId"))
            .with_attr("id", buf.format(next_id))
            .with_attr(format!("{}:id", r_prefix), r_id);
        list.children_mut().insert(insert_at, XmlNode::Element(entry));

        self.write_presentation()
    }

    fn remove_slide(&mut self, slide: &SlideRef) -> Result<()> {
        let part = self.slide_part(slide)?;
        let notes: Vec<PackURI> = part
            .rels()
            .iter()
            .filter(|rel| rel.reltype() == rt::NOTES_SLIDE && !rel.is_external())
            .filter_map(|rel| rel.target_partname(slide.partname.base_uri()).ok())
            .collect();

        let base = self.presentation_uri.base_uri().to_string();
        let rels = self.package.part_mut(&self.presentation_uri)?.rels_mut();
        if let Some(r_id) = rels
            .find_target(&base, &slide.partname)
            .map(|rel| rel.r_id().to_string())
        {
            rels.remove(&r_id);
            if let Some(list) = self.presentation.root_mut().child_mut("sldIdLst") {
                list.children_mut().retain(|node| match node {
                    XmlNode::Element(el) => {
                        relationship_attr(el) != Some(r_id.as_str())
                    },
                    _ => true,
                });
            }
            self.write_presentation()?;
        }

        for partname in notes {
            log::debug!("removing notes part {}", partname);
            self.package.remove_part(&partname);
        }
        self.package.remove_part(&slide.partname);
        Ok(())
    }

    fn persist(&mut self, slide: &SlideRef, table_id: u32, table: &Table) -> Result<()> {
        let mut doc = self.slide_document(slide)?;
        let root = doc.root_mut();
        if root.attr("xmlns:r").is_none() {
            root.set_attr("xmlns:r", namespace::OFC_RELATIONSHIPS);
        }
        let tbl = root
            .find_where_mut(&|el: &XmlElement| is_frame(el, table_id))
            .and_then(|frame| frame.find_where_mut(&|el: &XmlElement| el.local_name() == "tbl"))
            .ok_or_else(|| OoxmlError::TableNotFound {
                slide: slide.partname.to_string(),
                id: table_id,
            })?;
        *tbl = table.to_element();

        let blob = doc.to_bytes();
        self.slide_part_mut(slide)?.set_blob(blob);
        Ok(())
    }

    fn embed_image(
        &mut self,
        slide: &SlideRef,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<ImageResource> {
        let format = ImageFormat::from_mime_type(content_type)
            .or_else(|| ImageFormat::detect_from_bytes(bytes))
            .ok_or_else(|| {
                OoxmlError::InvalidFormat(format!("unsupported image type {}", content_type))
            })?;
        self.slide_part(slide)?;

        let ext = format.extension();
        let partname = self
            .package
            .next_partname(&format!("/ppt/media/image%d.{}", ext))?;
        if !self.package.content_types().has_default(ext) {
            self.package
                .content_types_mut()
                .add_default(ext, format.mime_type());
        }
        self.package
            .add_part(Part::new(partname.clone(), format.mime_type(), bytes.to_vec()));

        let target_ref = partname.relative_ref(slide.partname.base_uri());
        let r_id = self
            .slide_part_mut(slide)?
            .rels_mut()
            .add(rt::IMAGE, &target_ref);
        log::debug!("embedded {} as {} on {}", partname, r_id, slide.partname);
        Ok(ImageResource::new(partname.as_str(), r_id))
    }
}

/// `p:nvGraphicFramePr/p:cNvPr` of a graphic frame.
fn frame_properties(frame: &XmlElement) -> Option<&XmlElement> {
    frame.child("nvGraphicFramePr")?.child("cNvPr")
}

fn is_frame(el: &XmlElement, table_id: u32) -> bool {
    el.local_name() == "graphicFrame"
        && frame_properties(el)
            .and_then(|props| props.attr("id"))
            .and_then(|id| id.parse::<u32>().ok())
            == Some(table_id)
}

/// The namespaced `r:id` attribute of an element, whatever its prefix.
fn relationship_attr(el: &XmlElement) -> Option<&str> {
    el.attributes()
        .iter()
        .find(|(key, _)| key.contains(':') && !key.starts_with("xmlns") && local_part(key) == "id")
        .map(|(_, value)| value.as_str())
}

/// Prefix bound to the office relationships namespace on `root`, `r` by default.
fn relationship_prefix(root: &XmlElement) -> String {
    root.attributes()
        .iter()
        .find(|(key, value)| key.starts_with("xmlns:") && value == namespace::OFC_RELATIONSHIPS)
        .map_or_else(|| "r".to_string(), |(key, _)| local_part(key).to_string())
}
