//! Row pagination.
//!
//! Logical rows are poured into the template's data-row slots. When a slide runs
//! out of slots it is persisted and a fresh copy of the template slide is inserted
//! after it. The decision of what to do next is the pure [`advance`] step; the
//! [`RowPaginator`] carries out the resulting actions against a [`SlideDeck`].
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::deck::SlideDeck;
use crate::ooxml::pptx::table::background::{BackgroundAttacher, BackgroundPicture};
use crate::ooxml::pptx::table::directive::{CellDirective, LogicalRow};
use crate::ooxml::pptx::table::options::ImageEmbedding;
use crate::ooxml::pptx::table::{Table, TableCell};

/// Position of the next free data-row slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    /// Index of the slide being filled among the produced slides.
    pub slide_index: usize,
    /// Table row the next logical row goes into. Row 0 is the header.
    pub row_index: usize,
}

impl Cursor {
    /// First data row of the first produced slide.
    pub const START: Cursor = Cursor {
        slide_index: 0,
        row_index: 1,
    };
}

impl Default for Cursor {
    fn default() -> Self {
        Self::START
    }
}

/// What to do with the pending logical row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Write the row into table row `row_index`; the logical row is consumed.
    Fill { row_index: usize },
    /// Persist the current slide and continue on a new copy of the template. The
    /// logical row is retried there.
    FlushAndClone,
}

/// Step the cursor for one pending logical row on a table with `row_count` rows
/// (header included).
pub fn advance(cursor: Cursor, row_count: usize) -> (Cursor, Action) {
    if cursor.row_index < row_count {
        let next = Cursor {
            row_index: cursor.row_index + 1,
            ..cursor
        };
        (next, Action::Fill {
            row_index: cursor.row_index,
        })
    } else {
        let next = Cursor {
            slide_index: cursor.slide_index + 1,
            row_index: Cursor::START.row_index,
        };
        (next, Action::FlushAndClone)
    }
}

/// Fills a template table across as many slide copies as the rows need.
///
/// Single use: [`run`](Self::run) removes the template slide.
pub struct RowPaginator<'d, D: SlideDeck> {
    deck: &'d mut D,
    template: D::Slide,
    table_id: u32,
    attacher: BackgroundAttacher<D::Slide>,
}

impl<'d, D: SlideDeck> RowPaginator<'d, D> {
    pub fn new(deck: &'d mut D, template: D::Slide, table_id: u32, images: ImageEmbedding) -> Self {
        Self {
            deck,
            template,
            table_id,
            attacher: BackgroundAttacher::new(images),
        }
    }

    /// Fill `rows` in order and return the produced slides in document order.
    ///
    /// # Errors
    /// `NoTemplateRows` when the template table has no data rows; nothing is cloned
    /// in that case. Deck failures are passed through.
    pub fn run(mut self, rows: &[LogicalRow]) -> Result<Vec<D::Slide>> {
        let template_table = self.deck.locate_table(&self.template, self.table_id)?;
        if template_table.data_row_count() == 0 {
            return Err(OoxmlError::NoTemplateRows);
        }

        let template = self.template.clone();
        let mut slide = self.clone_template(&template)?;
        let mut table = self.deck.locate_table(&slide, self.table_id)?;
        let mut produced = vec![slide.clone()];
        let mut cursor = Cursor::START;
        let mut pending = 0;

        while pending < rows.len() {
            let (next, action) = advance(cursor, table.row_count());
            match action {
                Action::Fill { row_index } => {
                    log::trace!(
                        "row {} -> slide {} row {}",
                        pending,
                        cursor.slide_index,
                        row_index
                    );
                    self.fill_row(&slide, &mut table, row_index, &rows[pending])?;
                    pending += 1;
                },
                Action::FlushAndClone => {
                    self.deck.persist(&slide, self.table_id, &table)?;
                    log::debug!("slide {} full, continuing on a new copy", cursor.slide_index);
                    slide = self.clone_template(&slide)?;
                    table = self.deck.locate_table(&slide, self.table_id)?;
                    produced.push(slide.clone());
                },
            }
            cursor = next;
        }

        let unused = table.row_count().saturating_sub(cursor.row_index);
        if unused > 0 {
            log::debug!("trimming {} unused template rows", unused);
        }
        table.truncate_rows(cursor.row_index);
        self.deck.persist(&slide, self.table_id, &table)?;

        self.deck.remove_slide(&self.template)?;
        log::debug!("removed template slide, produced {} slides", produced.len());
        Ok(produced)
    }

    /// Clone the template and insert the copy right after `after`.
    fn clone_template(&mut self, after: &D::Slide) -> Result<D::Slide> {
        let slide = self.deck.clone_slide(&self.template)?;
        self.deck.insert_after(&slide, after)?;
        log::debug!("cloned template slide as {:?}", slide);
        Ok(slide)
    }

    fn fill_row(
        &mut self,
        slide: &D::Slide,
        table: &mut Table,
        row_index: usize,
        data: &LogicalRow,
    ) -> Result<()> {
        let row = table.row_mut(row_index).ok_or_else(|| {
            OoxmlError::MalformedTable(format!("template row {} disappeared", row_index))
        })?;
        let directives = data.effective_directives();
        for cell in row.cells_mut() {
            let pictures = substitute(cell, &directives);
            for picture in pictures {
                self.attacher.attach(self.deck, slide, cell, picture)?;
            }
        }
        Ok(())
    }
}

/// Apply `directives` to every paragraph of `cell`, in directive order.
/// Returns the pictures of matching directives in match order.
fn substitute<'a>(
    cell: &mut TableCell,
    directives: &[&'a CellDirective],
) -> Vec<&'a BackgroundPicture> {
    let mut pictures = Vec::new();
    for paragraph in cell.paragraphs_mut() {
        for &directive in directives {
            if paragraph.replace_tag(directive.tag(), directive.new_text())
                && let Some(picture) = directive.picture()
            {
                pictures.push(picture);
            }
        }
    }
    pictures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::deck::MemoryDeck;
    use crate::ooxml::pptx::table::fixtures;
    use proptest::prelude::*;

    const ID: u32 = 7;

    fn deck_with_template(capacity: usize) -> (MemoryDeck, crate::ooxml::pptx::deck::MemorySlide) {
        let mut deck = MemoryDeck::new();
        let template = deck.add_slide([(ID, fixtures::table(&["Name", "Age"], capacity))]);
        (deck, template)
    }

    fn people(n: usize) -> Vec<LogicalRow> {
        (0..n)
            .map(|i| {
                [("{name}", format!("person{}", i)), ("{age}", i.to_string())]
                    .into_iter()
                    .collect::<LogicalRow>()
            })
            .collect()
    }

    fn names(deck: &MemoryDeck, slide: &crate::ooxml::pptx::deck::MemorySlide) -> Vec<String> {
        deck.table(slide, ID)
            .unwrap()
            .rows()
            .iter()
            .skip(1)
            .map(|row| row.cells()[0].text())
            .collect()
    }

    #[test]
    fn test_advance() {
        let (c, a) = advance(Cursor::START, 3);
        assert_eq!(a, Action::Fill { row_index: 1 });
        let (c, a) = advance(c, 3);
        assert_eq!(a, Action::Fill { row_index: 2 });
        let (c, a) = advance(c, 3);
        assert_eq!(a, Action::FlushAndClone);
        assert_eq!(c, Cursor {
            slide_index: 1,
            row_index: 1
        });
    }

    #[test]
    fn test_spills_onto_new_slides_in_order() {
        let (mut deck, template) = deck_with_template(2);
        let slides = RowPaginator::new(&mut deck, template, ID, ImageEmbedding::PerAttachment)
            .run(&people(5))
            .unwrap();

        assert_eq!(slides.len(), 3);
        assert_eq!(deck.slides(), slides.as_slice());
        assert!(!deck.slides().contains(&template));

        assert_eq!(names(&deck, &slides[0]), ["person0", "person1"]);
        assert_eq!(names(&deck, &slides[1]), ["person2", "person3"]);
        assert_eq!(names(&deck, &slides[2]), ["person4"]);
        assert_eq!(deck.table(&slides[2], ID).unwrap().rows()[0].cells()[1].text(), "Age");
    }

    #[test]
    fn test_each_slide_persisted_once_in_order() {
        let (mut deck, template) = deck_with_template(1);
        let slides = RowPaginator::new(&mut deck, template, ID, ImageEmbedding::PerAttachment)
            .run(&people(3))
            .unwrap();
        assert_eq!(deck.persisted(), slides.as_slice());
    }

    #[test]
    fn test_no_rows_gives_header_only_slide() {
        let (mut deck, template) = deck_with_template(3);
        let slides = RowPaginator::new(&mut deck, template, ID, ImageEmbedding::PerAttachment)
            .run(&[])
            .unwrap();
        assert_eq!(slides.len(), 1);
        assert_eq!(deck.table(&slides[0], ID).unwrap().row_count(), 1);
    }

    #[test]
    fn test_no_template_rows_is_refused_before_cloning() {
        let (mut deck, template) = deck_with_template(0);
        let err = RowPaginator::new(&mut deck, template, ID, ImageEmbedding::PerAttachment)
            .run(&people(1))
            .unwrap_err();
        assert!(matches!(err, OoxmlError::NoTemplateRows));
        assert_eq!(deck.slides(), [template]);
    }

    #[test]
    fn test_unmatched_tag_is_noop() {
        let (mut deck, template) = deck_with_template(1);
        let rows = vec![LogicalRow::new().with(CellDirective::new("{nowhere}", "x"))];
        let slides = RowPaginator::new(&mut deck, template, ID, ImageEmbedding::PerAttachment)
            .run(&rows)
            .unwrap();
        let table = deck.table(&slides[0], ID).unwrap();
        assert_eq!(table.rows()[1].cells()[0].text(), "{name}");
        assert_eq!(table.rows()[1].cells()[1].text(), "{age}");
    }

    #[test]
    fn test_last_directive_applies() {
        let (mut deck, template) = deck_with_template(1);
        let rows = vec![
            LogicalRow::new()
                .with(CellDirective::new("{name}", "first"))
                .with(CellDirective::new("{name}", "second")),
        ];
        let slides = RowPaginator::new(&mut deck, template, ID, ImageEmbedding::PerAttachment)
            .run(&rows)
            .unwrap();
        assert_eq!(names(&deck, &slides[0]), ["second"]);
    }

    #[test]
    fn test_earlier_duplicate_picture_is_skipped() {
        let (mut deck, template) = deck_with_template(1);
        let picture = BackgroundPicture::new(vec![1, 2, 3], "image/png");
        let rows = vec![
            LogicalRow::new()
                .with(CellDirective::new("{name}", "first").with_picture(picture))
                .with(CellDirective::new("{name}", "second")),
        ];
        let slides = RowPaginator::new(&mut deck, template, ID, ImageEmbedding::PerAttachment)
            .run(&rows)
            .unwrap();

        assert_eq!(names(&deck, &slides[0]), ["second"]);
        assert!(deck.images(&slides[0]).is_empty());
        let cell = &deck.table(&slides[0], ID).unwrap().rows()[1].cells()[0];
        assert!(cell.properties().and_then(|p| p.child("blipFill")).is_none());
    }

    #[test]
    fn test_pictures_attach_to_matching_cells_only() {
        let (mut deck, template) = deck_with_template(2);
        let picture = BackgroundPicture::new(vec![1, 2, 3], "image/png");
        let rows = vec![
            LogicalRow::new()
                .with(CellDirective::new("{name}", "Ada").with_picture(picture.clone()))
                .with(CellDirective::new("{age}", "36")),
            LogicalRow::new().with(CellDirective::new("{name}", "Bob")),
        ];
        let slides = RowPaginator::new(&mut deck, template, ID, ImageEmbedding::PerAttachment)
            .run(&rows)
            .unwrap();

        let table = deck.table(&slides[0], ID).unwrap();
        let has_fill = |row: usize, col: usize| {
            table.rows()[row].cells()[col]
                .properties()
                .and_then(|p| p.child("blipFill"))
                .is_some()
        };
        assert!(has_fill(1, 0));
        assert!(!has_fill(1, 1));
        assert!(!has_fill(2, 0));
        assert_eq!(deck.images(&slides[0]).len(), 1);
    }

    proptest! {
        #[test]
        fn prop_slide_count_and_last_slide_rows(capacity in 1usize..6, n in 0usize..40) {
            let (mut deck, template) = deck_with_template(capacity);
            let slides = RowPaginator::new(&mut deck, template, ID, ImageEmbedding::PerAttachment)
                .run(&people(n))
                .unwrap();

            let expected = n.div_ceil(capacity).max(1);
            prop_assert_eq!(slides.len(), expected);
            prop_assert_eq!(deck.slides().len(), expected);

            let last_filled = if n == 0 { 0 } else if n % capacity == 0 { capacity } else { n % capacity };
            let last = deck.table(slides.last().unwrap(), ID).unwrap();
            prop_assert_eq!(last.row_count(), last_filled + 1);

            for slide in &slides[..slides.len() - 1] {
                prop_assert_eq!(deck.table(slide, ID).unwrap().row_count(), capacity + 1);
            }

            let all: Vec<String> = slides.iter().flat_map(|s| names(&deck, s)).collect();
            let want: Vec<String> = (0..n).map(|i| format!("person{}", i)).collect();
            prop_assert_eq!(all, want);
        }
    }
}
