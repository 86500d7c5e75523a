//! Column removal.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::table::Table;
use smallvec::SmallVec;

impl Table {
    /// Remove the given columns from the grid and from every row, header included.
    ///
    /// Indexes are 0-based; duplicates are ignored. Every index is checked before
    /// anything is removed, so an out-of-range index leaves the table untouched.
    /// Returns the number of columns removed.
    pub fn remove_columns(&mut self, indexes: &[usize]) -> Result<usize> {
        let count = self.column_count();
        if let Some(&index) = indexes.iter().find(|&&i| i >= count) {
            return Err(OoxmlError::ColumnOutOfRange { index, count });
        }

        let mut ordered: SmallVec<[usize; 8]> = indexes.iter().copied().collect();
        ordered.sort_unstable_by(|a, b| b.cmp(a));
        ordered.dedup();

        // highest first so pending lower indexes stay valid
        for &index in &ordered {
            self.remove_column_at(index);
        }
        Ok(ordered.len())
    }
}

#[cfg(test)]
mod tests {
    use crate::ooxml::error::OoxmlError;
    use crate::ooxml::pptx::table::fixtures;

    #[test]
    fn test_remove_first_and_last() {
        let mut table = fixtures::table(&["Name", "Age", "City"], 2);
        assert_eq!(table.remove_columns(&[0, 2]).unwrap(), 2);

        assert_eq!(table.column_count(), 1);
        assert_eq!(table.to_element().find("tblGrid").unwrap().elements().count(), 1);
        for row in table.rows() {
            assert_eq!(row.cells().len(), 1);
        }
        assert_eq!(table.rows()[0].cells()[0].text(), "Age");
        assert_eq!(table.rows()[1].cells()[0].text(), "{age}");
    }

    #[test]
    fn test_duplicates_are_harmless() {
        let mut table = fixtures::table(&["A", "B", "C"], 1);
        assert_eq!(table.remove_columns(&[1, 1, 1]).unwrap(), 1);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.rows()[0].cells()[1].text(), "C");
    }

    #[test]
    fn test_empty_set_is_noop() {
        let mut table = fixtures::table(&["A", "B"], 1);
        let before = table.clone();
        assert_eq!(table.remove_columns(&[]).unwrap(), 0);
        assert_eq!(table, before);
    }

    #[test]
    fn test_out_of_range_leaves_table_untouched() {
        let mut table = fixtures::table(&["A", "B", "C"], 1);
        let before = table.clone();
        let err = table.remove_columns(&[0, 3]).unwrap_err();
        assert!(matches!(err, OoxmlError::ColumnOutOfRange { index: 3, count: 3 }));
        assert_eq!(table, before);
    }
}
