//! Picture backgrounds for table cells.
//!
//! A picture background is an `a:blipFill` in the cell's `a:tcPr`:
//!
//! ```xml
//! <a:blipFill>
//!   <a:blip r:embed="rId3"/>
//!   <a:srcRect/>
//!   <a:stretch><a:fillRect l="0" t="0" r="0" b="0"/></a:stretch>
//! </a:blipFill>
//! ```
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::deck::{ImageResource, SlideDeck};
use crate::ooxml::pptx::format::ImageFormat;
use crate::ooxml::pptx::table::options::ImageEmbedding;
use crate::ooxml::pptx::table::TableCell;
use crate::ooxml::xml::XmlElement;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Edges of the stretch rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillRect {
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
    pub left: i64,
}

/// Image bytes plus the rectangle they are stretched into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundPicture {
    bytes: Vec<u8>,
    content_type: String,
    rect: FillRect,
}

impl BackgroundPicture {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
            rect: FillRect::default(),
        }
    }

    /// Build a picture whose content type is sniffed from the bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        let format = ImageFormat::detect_from_bytes(&bytes)
            .ok_or_else(|| OoxmlError::InvalidFormat("unrecognized image data".to_string()))?;
        Ok(Self::new(bytes, format.mime_type()))
    }

    pub fn with_offsets(mut self, top: i64, right: i64, bottom: i64, left: i64) -> Self {
        self.rect = FillRect {
            top,
            right,
            bottom,
            left,
        };
        self
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[inline]
    pub fn rect(&self) -> FillRect {
        self.rect
    }

    /// The `a:blipFill` referencing `reference_id`, qualified like `cell`.
    fn blip_fill(&self, cell: &TableCell, reference_id: &str) -> XmlElement {
        let mut buf = itoa::Buffer::new();
        let mut fill_rect = XmlElement::new(cell.qualify("fillRect"));
        fill_rect.set_attr("l", buf.format(self.rect.left));
        fill_rect.set_attr("t", buf.format(self.rect.top));
        fill_rect.set_attr("r", buf.format(self.rect.right));
        fill_rect.set_attr("b", buf.format(self.rect.bottom));

        XmlElement::new(cell.qualify("blipFill"))
            .with_child(XmlElement::new(cell.qualify("blip")).with_attr("r:embed", reference_id))
            .with_child(XmlElement::new(cell.qualify("srcRect")))
            .with_child(XmlElement::new(cell.qualify("stretch")).with_child(fill_rect))
    }
}

/// Embeds pictures and installs them as cell fills.
#[derive(Debug)]
pub struct BackgroundAttacher<S> {
    policy: ImageEmbedding,
    reuse: Option<(S, HashMap<[u8; 32], ImageResource>)>,
}

impl<S: Clone + PartialEq> BackgroundAttacher<S> {
    pub fn new(policy: ImageEmbedding) -> Self {
        Self {
            policy,
            reuse: None,
        }
    }

    /// Embed `picture` into `slide` and make it the background of `cell`.
    pub fn attach<D>(
        &mut self,
        deck: &mut D,
        slide: &S,
        cell: &mut TableCell,
        picture: &BackgroundPicture,
    ) -> Result<ImageResource>
    where
        D: SlideDeck<Slide = S>,
    {
        let resource = match self.policy {
            ImageEmbedding::PerAttachment => {
                deck.embed_image(slide, picture.bytes(), picture.content_type())?
            },
            ImageEmbedding::ReuseIdentical => self.embed_once(deck, slide, picture)?,
        };
        cell.set_fill(picture.blip_fill(cell, resource.reference_id()));
        Ok(resource)
    }

    fn embed_once<D>(
        &mut self,
        deck: &mut D,
        slide: &S,
        picture: &BackgroundPicture,
    ) -> Result<ImageResource>
    where
        D: SlideDeck<Slide = S>,
    {
        if self.reuse.as_ref().is_none_or(|(current, _)| current != slide) {
            self.reuse = Some((slide.clone(), HashMap::new()));
        }
        let digest: [u8; 32] = Sha256::digest(picture.bytes()).into();
        if let Some((_, cache)) = &self.reuse
            && let Some(resource) = cache.get(&digest)
        {
            return Ok(resource.clone());
        }

        let resource = deck.embed_image(slide, picture.bytes(), picture.content_type())?;
        if let Some((_, cache)) = &mut self.reuse {
            cache.insert(digest, resource.clone());
        }
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::deck::MemoryDeck;
    use crate::ooxml::pptx::table::fixtures;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

    #[test]
    fn test_blip_fill_shape() {
        let mut deck = MemoryDeck::new();
        let slide = deck.add_slide([]);
        let mut table = fixtures::table(&["A"], 1);
        let cell = &mut table.row_mut(1).unwrap().cells_mut()[0];

        let picture = BackgroundPicture::new(PNG, "image/png").with_offsets(10, 20, 30, 40);
        let mut attacher = BackgroundAttacher::new(ImageEmbedding::PerAttachment);
        let resource = attacher.attach(&mut deck, &slide, cell, &picture).unwrap();

        let fill = cell.properties().unwrap().child("blipFill").unwrap();
        assert_eq!(
            fill.child("blip").unwrap().attr("r:embed"),
            Some(resource.reference_id())
        );
        assert!(fill.child("srcRect").unwrap().attributes().is_empty());
        let rect = fill.find("fillRect").unwrap();
        assert_eq!(rect.attr("t"), Some("10"));
        assert_eq!(rect.attr("r"), Some("20"));
        assert_eq!(rect.attr("b"), Some("30"));
        assert_eq!(rect.attr("l"), Some("40"));
    }

    #[test]
    fn test_identical_bytes_embed_twice_by_default() {
        let mut deck = MemoryDeck::new();
        let slide = deck.add_slide([]);
        let mut table = fixtures::table(&["A", "B"], 1);
        let picture = BackgroundPicture::new(PNG, "image/png");
        let mut attacher = BackgroundAttacher::new(ImageEmbedding::PerAttachment);

        let cells = table.row_mut(1).unwrap().cells_mut();
        let a = attacher.attach(&mut deck, &slide, &mut cells[0], &picture).unwrap();
        let b = attacher.attach(&mut deck, &slide, &mut cells[1], &picture).unwrap();
        assert_ne!(a, b);
        assert_eq!(deck.images(&slide).len(), 2);
    }

    #[test]
    fn test_reuse_identical_is_per_slide() {
        let mut deck = MemoryDeck::new();
        let first = deck.add_slide([]);
        let second = deck.add_slide([]);
        let mut table = fixtures::table(&["A", "B"], 1);
        let picture = BackgroundPicture::new(PNG, "image/png");
        let mut attacher = BackgroundAttacher::new(ImageEmbedding::ReuseIdentical);

        let cells = table.row_mut(1).unwrap().cells_mut();
        let a = attacher.attach(&mut deck, &first, &mut cells[0], &picture).unwrap();
        let b = attacher.attach(&mut deck, &first, &mut cells[1], &picture).unwrap();
        assert_eq!(a, b);
        assert_eq!(deck.images(&first).len(), 1);

        attacher.attach(&mut deck, &second, &mut cells[0], &picture).unwrap();
        assert_eq!(deck.images(&second).len(), 1);
    }

    #[test]
    fn test_sniffed_content_type() {
        let picture = BackgroundPicture::from_bytes(PNG).unwrap();
        assert_eq!(picture.content_type(), "image/png");
        assert!(BackgroundPicture::from_bytes(&b"nope"[..]).is_err());
    }
}
