//! The slide-deck operations table filling depends on.
//!
//! [`SlideDeck`] is implemented by [`PptxDeck`](crate::ooxml::pptx::package::PptxDeck)
//! for real packages and by [`MemoryDeck`] for tests and dry runs.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::table::Table;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// An embedded image, addressable from the slide that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResource {
    target: String,
    reference_id: String,
}

impl ImageResource {
    pub fn new(target: impl Into<String>, reference_id: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            reference_id: reference_id.into(),
        }
    }

    /// Relationship id used by `r:embed` on the owning slide.
    #[inline]
    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    /// Partname of the media part holding the image bytes.
    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Slide storage used while filling a table.
///
/// Tables move in and out of a deck by value: `locate_table` hands out a deep copy
/// of the persisted table and `persist` writes an edited copy back.
pub trait SlideDeck {
    /// Handle to one slide.
    type Slide: Clone + PartialEq + fmt::Debug;

    /// Read the table with `table_id` from the slide's persisted state.
    fn locate_table(&self, slide: &Self::Slide, table_id: u32) -> Result<Table>;

    /// Copy a slide. The copy is not part of the slide order until inserted.
    fn clone_slide(&mut self, slide: &Self::Slide) -> Result<Self::Slide>;

    /// Place `slide` directly after `after` in the slide order.
    fn insert_after(&mut self, slide: &Self::Slide, after: &Self::Slide) -> Result<()>;

    /// Remove a slide from the deck.
    fn remove_slide(&mut self, slide: &Self::Slide) -> Result<()>;

    /// Write `table` back as the slide's table `table_id`.
    fn persist(&mut self, slide: &Self::Slide, table_id: u32, table: &Table) -> Result<()>;

    /// Store image bytes as a new resource owned by `slide`.
    fn embed_image(
        &mut self,
        slide: &Self::Slide,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<ImageResource>;
}

/// Handle to a slide in a [`MemoryDeck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemorySlide(u32);

/// An image stored in a [`MemoryDeck`] slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub resource: ImageResource,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
struct SlideData {
    tables: BTreeMap<u32, Table>,
    images: Vec<StoredImage>,
}

/// A deck that lives entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryDeck {
    order: Vec<MemorySlide>,
    slides: HashMap<MemorySlide, SlideData>,
    next_slide: u32,
    next_media: u32,
    persisted: Vec<MemorySlide>,
}

impl MemoryDeck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slide holding the given tables.
    pub fn add_slide(&mut self, tables: impl IntoIterator<Item = (u32, Table)>) -> MemorySlide {
        let slide = self.allocate(SlideData {
            tables: tables.into_iter().collect(),
            images: Vec::new(),
        });
        self.order.push(slide);
        slide
    }

    fn allocate(&mut self, data: SlideData) -> MemorySlide {
        self.next_slide += 1;
        let slide = MemorySlide(self.next_slide);
        self.slides.insert(slide, data);
        slide
    }

    fn data(&self, slide: &MemorySlide) -> Result<&SlideData> {
        self.slides
            .get(slide)
            .ok_or_else(|| OoxmlError::SlideNotFound(format!("{:?}", slide)))
    }

    fn data_mut(&mut self, slide: &MemorySlide) -> Result<&mut SlideData> {
        self.slides
            .get_mut(slide)
            .ok_or_else(|| OoxmlError::SlideNotFound(format!("{:?}", slide)))
    }

    /// Slides in deck order.
    #[inline]
    pub fn slides(&self) -> &[MemorySlide] {
        &self.order
    }

    /// Persisted table of a slide.
    pub fn table(&self, slide: &MemorySlide, table_id: u32) -> Option<&Table> {
        self.slides.get(slide)?.tables.get(&table_id)
    }

    /// Images embedded into a slide, in embedding order.
    pub fn images(&self, slide: &MemorySlide) -> &[StoredImage] {
        match self.slides.get(slide) {
            Some(data) => data.images.as_slice(),
            None => &[],
        }
    }

    /// Every `persist` call so far, in call order.
    #[inline]
    pub fn persisted(&self) -> &[MemorySlide] {
        &self.persisted
    }
}

impl SlideDeck for MemoryDeck {
    type Slide = MemorySlide;

    fn locate_table(&self, slide: &MemorySlide, table_id: u32) -> Result<Table> {
        self.data(slide)?
            .tables
            .get(&table_id)
            .cloned()
            .ok_or_else(|| OoxmlError::TableNotFound {
                slide: format!("{:?}", slide),
                id: table_id,
            })
    }

    fn clone_slide(&mut self, slide: &MemorySlide) -> Result<MemorySlide> {
        let data = self.data(slide)?.clone();
        Ok(self.allocate(data))
    }

    fn insert_after(&mut self, slide: &MemorySlide, after: &MemorySlide) -> Result<()> {
        self.data(slide)?;
        if slide == after {
            return Err(OoxmlError::SelfInsertion(format!("{:?}", slide)));
        }
        if !self.order.contains(after) {
            return Err(OoxmlError::SlideNotFound(format!("{:?}", after)));
        }
        self.order.retain(|s| s != slide);
        if let Some(pos) = self.order.iter().position(|s| s == after) {
            self.order.insert(pos + 1, *slide);
        }
        Ok(())
    }

    fn remove_slide(&mut self, slide: &MemorySlide) -> Result<()> {
        self.slides
            .remove(slide)
            .ok_or_else(|| OoxmlError::SlideNotFound(format!("{:?}", slide)))?;
        self.order.retain(|s| s != slide);
        Ok(())
    }

    fn persist(&mut self, slide: &MemorySlide, table_id: u32, table: &Table) -> Result<()> {
        self.data_mut(slide)?.tables.insert(table_id, table.clone());
        self.persisted.push(*slide);
        Ok(())
    }

    fn embed_image(
        &mut self,
        slide: &MemorySlide,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<ImageResource> {
        self.next_media += 1;
        let target = format!("/media/image{}", self.next_media);
        let data = self.data_mut(slide)?;
        let resource = ImageResource::new(target, format!("rId{}", data.images.len() + 1));
        data.images.push(StoredImage {
            resource: resource.clone(),
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        });
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::table::fixtures;

    #[test]
    fn test_clone_is_detached_until_inserted() {
        let mut deck = MemoryDeck::new();
        let first = deck.add_slide([(4, fixtures::table(&["A"], 1))]);
        let last = deck.add_slide([]);

        let copy = deck.clone_slide(&first).unwrap();
        assert_eq!(deck.slides(), [first, last]);
        assert!(deck.locate_table(&copy, 4).is_ok());

        deck.insert_after(&copy, &first).unwrap();
        assert_eq!(deck.slides(), [first, copy, last]);

        deck.remove_slide(&first).unwrap();
        assert_eq!(deck.slides(), [copy, last]);
        assert!(deck.locate_table(&first, 4).is_err());
    }

    #[test]
    fn test_insert_after_itself_is_rejected() {
        let mut deck = MemoryDeck::new();
        let first = deck.add_slide([]);
        let second = deck.add_slide([]);

        let err = deck.insert_after(&second, &second).unwrap_err();
        assert!(matches!(err, OoxmlError::SelfInsertion(_)));
        assert_eq!(deck.slides(), [first, second]);
    }

    #[test]
    fn test_locate_returns_copy() {
        let mut deck = MemoryDeck::new();
        let slide = deck.add_slide([(1, fixtures::table(&["A"], 3))]);

        let mut table = deck.locate_table(&slide, 1).unwrap();
        table.truncate_rows(1);
        assert_eq!(deck.table(&slide, 1).unwrap().row_count(), 4);

        deck.persist(&slide, 1, &table).unwrap();
        assert_eq!(deck.table(&slide, 1).unwrap().row_count(), 1);
        assert_eq!(deck.persisted(), [slide]);
    }

    #[test]
    fn test_missing_table() {
        let mut deck = MemoryDeck::new();
        let slide = deck.add_slide([]);
        let err = deck.locate_table(&slide, 9).unwrap_err();
        assert!(matches!(err, OoxmlError::TableNotFound { id: 9, .. }));
    }

    #[test]
    fn test_embed_image_allocates_fresh_resources() {
        let mut deck = MemoryDeck::new();
        let slide = deck.add_slide([]);
        let a = deck.embed_image(&slide, b"img", "image/png").unwrap();
        let b = deck.embed_image(&slide, b"img", "image/png").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.reference_id(), "rId1");
        assert_eq!(b.reference_id(), "rId2");
        assert_eq!(deck.images(&slide).len(), 2);
    }
}
