use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::deck::SlideDeck;
use crate::ooxml::pptx::table::directive::LogicalRow;
use crate::ooxml::pptx::table::options::{DuplicateTagPolicy, FillOptions};
use crate::ooxml::pptx::table::paginate::RowPaginator;

/// A template table located in a slide.
///
/// The slide, table id and title are fixed when the handle is created.
/// [`set_rows`](Self::set_rows) consumes the handle: after it the template slide
/// no longer exists.
///
/// # Examples
///
/// ```no_run
/// use slidefill::{CellDirective, LogicalRow, PptxDeck, SlideTable};
///
/// let mut deck = PptxDeck::open("report.pptx")?;
/// let slide = deck.slides()?[0].clone();
/// let table_id = deck.tables(&slide)?[0].id;
///
/// let mut table = SlideTable::new(&mut deck, slide, table_id, "people")?;
/// println!("{:?}", table.column_titles()?);
/// table.remove_columns(&[2])?;
///
/// let rows: Vec<LogicalRow> = vec![
///     LogicalRow::new().with(CellDirective::new("{name}", "Ada")),
///     LogicalRow::new().with(CellDirective::new("{name}", "Grace")),
/// ];
/// let slides = table.set_rows(&rows)?;
/// println!("filled {} slides", slides.len());
///
/// deck.save("filled.pptx")?;
/// # Ok::<(), slidefill::OoxmlError>(())
/// ```
pub struct SlideTable<'d, D: SlideDeck> {
    deck: &'d mut D,
    slide: D::Slide,
    id: u32,
    title: String,
    options: FillOptions,
}

impl<'d, D: SlideDeck> SlideTable<'d, D> {
    /// Bind to table `id` of `slide`.
    ///
    /// # Errors
    /// `TableNotFound` when the slide holds no such table.
    pub fn new(deck: &'d mut D, slide: D::Slide, id: u32, title: impl Into<String>) -> Result<Self> {
        deck.locate_table(&slide, id)?;
        Ok(Self {
            deck,
            slide,
            id,
            title: title.into(),
            options: FillOptions::default(),
        })
    }

    pub fn with_options(mut self, options: FillOptions) -> Self {
        self.options = options;
        self
    }

    /// Caller-supplied label of this table.
    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn slide(&self) -> &D::Slide {
        &self.slide
    }

    #[inline]
    pub fn options(&self) -> FillOptions {
        self.options
    }

    /// Header cell texts, left to right.
    pub fn column_titles(&self) -> Result<Vec<String>> {
        let table = self.deck.locate_table(&self.slide, self.id)?;
        Ok(table
            .row(0)
            .map(|header| header.cells().iter().map(|cell| cell.text()).collect())
            .unwrap_or_default())
    }

    /// Remove columns by 0-based index and persist the slide once.
    pub fn remove_columns(&mut self, indexes: &[usize]) -> Result<()> {
        let mut table = self.deck.locate_table(&self.slide, self.id)?;
        table.remove_columns(indexes)?;
        self.deck.persist(&self.slide, self.id, &table)
    }

    /// Fill the table with `rows`, cloning the slide as often as needed, and
    /// remove the template slide. Returns the produced slides in document order.
    ///
    /// # Errors
    /// `DuplicateTag` under [`DuplicateTagPolicy::Reject`], `NoTemplateRows` when the
    /// table has no data rows. Both are reported before the deck is modified.
    pub fn set_rows(self, rows: &[LogicalRow]) -> Result<Vec<D::Slide>> {
        if self.options.duplicate_tags == DuplicateTagPolicy::Reject {
            for (row, data) in rows.iter().enumerate() {
                if let Some(tag) = data.duplicate_tag() {
                    return Err(OoxmlError::DuplicateTag {
                        row,
                        tag: tag.to_string(),
                    });
                }
            }
        }

        log::debug!("filling table '{}' with {} rows", self.title, rows.len());
        RowPaginator::new(self.deck, self.slide, self.id, self.options.images).run(rows)
    }
}
