/// Owned table model for DrawingML tables (`a:tbl`).
///
/// A table is read out of a slide as a deep copy, edited as plain values and
/// written back in one piece. Row 0 is the header; rows 1.. are the template data
/// rows. Every row carries exactly one cell per grid column.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::table::text::Paragraph;
use crate::ooxml::xml::XmlElement;

/// Local names of the mutually exclusive fill elements in `a:tcPr`.
const FILL_ELEMENTS: [&str; 6] = ["noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill"];

/// A table in a graphic frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    shell: XmlElement,
    properties: Option<XmlElement>,
    grid: XmlElement,
    columns: Vec<GridColumn>,
    rows: Vec<TableRow>,
    trailing: Vec<XmlElement>,
}

/// One `a:gridCol`: a column width in EMUs plus any extension content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridColumn {
    element: XmlElement,
}

impl GridColumn {
    /// Column width in EMUs, 0 when absent or malformed.
    pub fn width(&self) -> i64 {
        self.element
            .attr("w")
            .and_then(|w| w.parse().ok())
            .unwrap_or(0)
    }
}

/// A row (`a:tr`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    shell: XmlElement,
    cells: Vec<TableCell>,
    trailing: Vec<XmlElement>,
}

/// A cell (`a:tc`): text body, property block and anything else carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    shell: XmlElement,
    body: Option<TextBody>,
    properties: Option<XmlElement>,
    trailing: Vec<XmlElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextBody {
    shell: XmlElement,
    leading: Vec<XmlElement>,
    paragraphs: Vec<Paragraph>,
}

impl Table {
    /// Build the model from an `a:tbl` element.
    ///
    /// # Errors
    /// `MalformedTable` when the grid is missing or a row's cell count differs from
    /// the number of grid columns.
    pub fn from_element(element: &XmlElement) -> Result<Self> {
        if element.local_name() != "tbl" {
            return Err(OoxmlError::MalformedTable(format!(
                "expected a:tbl, found {}",
                element.name()
            )));
        }

        let mut properties = None;
        let mut grid = None;
        let mut columns = Vec::new();
        let mut rows = Vec::new();
        let mut trailing = Vec::new();

        for child in element.elements() {
            match child.local_name() {
                "tblPr" => properties = Some(child.clone()),
                "tblGrid" => {
                    grid = Some(child.shallow_clone());
                    columns = child
                        .elements()
                        .filter(|el| el.local_name() == "gridCol")
                        .map(|el| GridColumn { element: el.clone() })
                        .collect();
                },
                "tr" => rows.push(TableRow::from_element(child)),
                _ => trailing.push(child.clone()),
            }
        }

        let grid = grid.ok_or_else(|| OoxmlError::MalformedTable("missing a:tblGrid".to_string()))?;
        for (index, row) in rows.iter().enumerate() {
            if row.cells.len() != columns.len() {
                return Err(OoxmlError::MalformedTable(format!(
                    "row {} has {} cells but the grid has {} columns",
                    index,
                    row.cells.len(),
                    columns.len()
                )));
            }
        }

        Ok(Self {
            shell: element.shallow_clone(),
            properties,
            grid,
            columns,
            rows,
            trailing,
        })
    }

    /// Serialize back to an `a:tbl` element.
    pub fn to_element(&self) -> XmlElement {
        let mut element = self.shell.clone();
        if let Some(props) = &self.properties {
            element.push(props.clone());
        }
        let mut grid = self.grid.clone();
        for column in &self.columns {
            grid.push(column.element.clone());
        }
        element.push(grid);
        for row in &self.rows {
            element.push(row.to_element());
        }
        for el in &self.trailing {
            element.push(el.clone());
        }
        element
    }

    /// Number of grid columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows, header included.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of template data rows (rows after the header).
    #[inline]
    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    #[inline]
    pub fn columns(&self) -> &[GridColumn] {
        &self.columns
    }

    #[inline]
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&TableRow> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut TableRow> {
        self.rows.get_mut(index)
    }

    /// Remove the cell at `column` from every row, then its grid column.
    pub(crate) fn remove_column_at(&mut self, column: usize) {
        for row in &mut self.rows {
            row.cells.remove(column);
        }
        self.columns.remove(column);
    }

    /// Drop every row at index `keep` and above, highest index first.
    pub(crate) fn truncate_rows(&mut self, keep: usize) {
        while self.rows.len() > keep {
            self.rows.pop();
        }
    }
}

impl TableRow {
    fn from_element(element: &XmlElement) -> Self {
        let mut cells = Vec::new();
        let mut trailing = Vec::new();
        for child in element.elements() {
            if child.local_name() == "tc" {
                cells.push(TableCell::from_element(child));
            } else {
                trailing.push(child.clone());
            }
        }
        Self {
            shell: element.shallow_clone(),
            cells,
            trailing,
        }
    }

    fn to_element(&self) -> XmlElement {
        let mut element = self.shell.clone();
        for cell in &self.cells {
            element.push(cell.to_element());
        }
        for el in &self.trailing {
            element.push(el.clone());
        }
        element
    }

    /// Row height in EMUs, 0 when absent.
    pub fn height(&self) -> i64 {
        self.shell
            .attr("h")
            .and_then(|h| h.parse().ok())
            .unwrap_or(0)
    }

    #[inline]
    pub fn cells(&self) -> &[TableCell] {
        &self.cells
    }

    #[inline]
    pub fn cells_mut(&mut self) -> &mut [TableCell] {
        &mut self.cells
    }
}

impl TableCell {
    fn from_element(element: &XmlElement) -> Self {
        let mut body = None;
        let mut properties = None;
        let mut trailing = Vec::new();
        for child in element.elements() {
            match child.local_name() {
                "txBody" => body = Some(TextBody::from_element(child)),
                "tcPr" => properties = Some(child.clone()),
                _ => trailing.push(child.clone()),
            }
        }
        Self {
            shell: element.shallow_clone(),
            body,
            properties,
            trailing,
        }
    }

    fn to_element(&self) -> XmlElement {
        let mut element = self.shell.clone();
        if let Some(body) = &self.body {
            element.push(body.to_element());
        }
        if let Some(props) = &self.properties {
            element.push(props.clone());
        }
        for el in &self.trailing {
            element.push(el.clone());
        }
        element
    }

    /// Paragraphs of the cell's text body; empty when the cell has none.
    pub fn paragraphs(&self) -> &[Paragraph] {
        match &self.body {
            Some(body) => body.paragraphs.as_slice(),
            None => &[],
        }
    }

    pub fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        match self.body.as_mut() {
            Some(body) => body.paragraphs.as_mut_slice(),
            None => &mut [],
        }
    }

    /// Cell text: the paragraph texts concatenated.
    pub fn text(&self) -> String {
        self.paragraphs().iter().map(Paragraph::text).collect()
    }

    /// The `a:tcPr` block, if any.
    #[inline]
    pub fn properties(&self) -> Option<&XmlElement> {
        self.properties.as_ref()
    }

    /// Whether this cell is covered by a horizontal or vertical merge.
    pub fn is_merged_continuation(&self) -> bool {
        self.shell.attr("hMerge") == Some("1") || self.shell.attr("vMerge") == Some("1")
    }

    /// Install `fill` as the cell's fill, replacing any previous fill choice.
    ///
    /// The fill goes in front of `a:headers`/`a:extLst` to keep `a:tcPr` in schema
    /// order. A property block is created when the cell has none.
    pub fn set_fill(&mut self, fill: XmlElement) {
        let shell = &self.shell;
        let props = self.properties.get_or_insert_with(|| {
            log::debug!("cell has no property block, creating one");
            XmlElement::new(shell.qualify("tcPr"))
        });

        let children = props.children_mut();
        children.retain(|node| match node {
            crate::ooxml::xml::XmlNode::Element(el) => !FILL_ELEMENTS.contains(&el.local_name()),
            _ => true,
        });
        let pos = children
            .iter()
            .position(|node| match node {
                crate::ooxml::xml::XmlNode::Element(el) => {
                    matches!(el.local_name(), "headers" | "extLst")
                },
                _ => false,
            })
            .unwrap_or(children.len());
        children.insert(pos, crate::ooxml::xml::XmlNode::Element(fill));
    }

    /// Qualified name in the cell's namespace (`a:` for standard slides).
    pub(crate) fn qualify(&self, local: &str) -> String {
        self.shell.qualify(local)
    }
}

impl TextBody {
    fn from_element(element: &XmlElement) -> Self {
        let mut leading = Vec::new();
        let mut paragraphs = Vec::new();
        for child in element.elements() {
            if child.local_name() == "p" {
                paragraphs.push(Paragraph::from_element(child));
            } else {
                leading.push(child.clone());
            }
        }
        Self {
            shell: element.shallow_clone(),
            leading,
            paragraphs,
        }
    }

    fn to_element(&self) -> XmlElement {
        let mut element = self.shell.clone();
        for el in &self.leading {
            element.push(el.clone());
        }
        for p in &self.paragraphs {
            element.push(p.to_element());
        }
        element
    }
}
