use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;

/// A cell coordinate. Orders row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub column: usize,
}

impl CellRef {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A set of cells to aggregate over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Half-open row and column ranges.
    Rect {
        rows: Range<usize>,
        columns: Range<usize>,
    },
    /// Arbitrary, possibly disjoint cells.
    Cells(BTreeSet<CellRef>),
}

impl Selection {
    pub fn rect(rows: Range<usize>, columns: Range<usize>) -> Self {
        Selection::Rect { rows, columns }
    }

    /// Every row of one column.
    pub fn column(column: usize, row_count: usize) -> Self {
        Selection::Rect {
            rows: 0..row_count,
            columns: column..column + 1,
        }
    }

    pub fn cell(row: usize, column: usize) -> Self {
        Selection::Cells(BTreeSet::from([CellRef::new(row, column)]))
    }

    pub fn cells(cells: impl IntoIterator<Item = CellRef>) -> Self {
        Selection::Cells(cells.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Selection::Rect { rows, columns } => rows.len() * columns.len(),
            Selection::Cells(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exclusive upper bounds `(rows, columns)` touched by the selection, if any.
    /// Saturates at `usize::MAX`.
    pub fn extent(&self) -> Option<(usize, usize)> {
        match self {
            Selection::Rect { rows, columns } => {
                if rows.is_empty() || columns.is_empty() {
                    None
                } else {
                    Some((rows.end, columns.end))
                }
            }
            Selection::Cells(cells) => {
                let max_row = cells.iter().map(|c| c.row).max()?;
                let max_col = cells.iter().map(|c| c.column).max()?;
                Some((max_row.saturating_add(1), max_col.saturating_add(1)))
            }
        }
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = CellRef> + '_> {
        match self {
            Selection::Rect { rows, columns } => {
                let columns = columns.clone();
                Box::new(rows.clone().flat_map(move |row| {
                    columns.clone().map(move |column| CellRef::new(row, column))
                }))
            }
            Selection::Cells(cells) => Box::new(cells.iter().copied()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_iterates_row_major() {
        let cells: Vec<_> = Selection::rect(0..2, 1..3).iter().collect();
        assert_eq!(
            cells,
            vec![
                CellRef::new(0, 1),
                CellRef::new(0, 2),
                CellRef::new(1, 1),
                CellRef::new(1, 2),
            ]
        );
    }

    #[test]
    fn extent_of_disjoint_cells() {
        let selection = Selection::cells([CellRef::new(4, 0), CellRef::new(1, 3)]);
        assert_eq!(selection.extent(), Some((5, 4)));
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn extent_saturates_at_the_last_index() {
        let selection = Selection::cells([CellRef::new(usize::MAX, 0)]);
        assert_eq!(selection.extent(), Some((usize::MAX, 1)));
    }

    #[test]
    fn empty_rect_has_no_extent() {
        let selection = Selection::rect(3..3, 0..2);
        assert!(selection.is_empty());
        assert_eq!(selection.extent(), None);
    }
}
