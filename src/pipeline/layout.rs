//! Layout engine: chunk normalized images into fixed-width grid rows.
//!
//! Rows are always exactly `columns` wide; a short trailing row is padded
//! with [`GridCell::Empty`] so the rendered table stays rectangular. Order
//! is preserved and nothing is sorted, filtered or deduplicated.

use crate::pipeline::normalize::NormalizedImage;

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCell {
    Occupied(NormalizedImage),
    Empty,
}

impl GridCell {
    pub fn is_occupied(&self) -> bool {
        matches!(self, GridCell::Occupied(_))
    }
}

/// One table row of exactly `columns` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub cells: Vec<GridCell>,
}

impl GridRow {
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_occupied()).count()
    }
}

/// Partition `images` into rows of `columns` cells.
///
/// `columns` of 0 is treated as 1.
pub fn layout(images: Vec<NormalizedImage>, columns: usize) -> Vec<GridRow> {
    let columns = columns.max(1);
    let mut rows = Vec::with_capacity(images.len().div_ceil(columns));
    let mut iter = images.into_iter().peekable();

    while iter.peek().is_some() {
        let mut cells: Vec<GridCell> = iter
            .by_ref()
            .take(columns)
            .map(GridCell::Occupied)
            .collect();
        cells.resize(columns, GridCell::Empty);
        rows.push(GridRow { cells });
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::ImageEncoding;

    fn img(tag: u8) -> NormalizedImage {
        NormalizedImage {
            bytes: vec![tag],
            encoding: ImageEncoding::Jpeg,
            display_width: 128,
            display_height: 170,
        }
    }

    fn batch(n: usize) -> Vec<NormalizedImage> {
        (0..n).map(|i| img(i as u8)).collect()
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(layout(Vec::new(), 3).is_empty());
    }

    #[test]
    fn seven_images_three_columns() {
        let rows = layout(batch(7), 3);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.cells.len() == 3));
        assert_eq!(rows[0].occupied(), 3);
        assert_eq!(rows[1].occupied(), 3);
        assert_eq!(rows[2].occupied(), 1);
        assert_eq!(rows[2].cells[1], GridCell::Empty);
        assert_eq!(rows[2].cells[2], GridCell::Empty);
    }

    #[test]
    fn row_count_and_trailing_occupancy_for_many_sizes() {
        for columns in 1..=5 {
            for n in 0..=17 {
                let rows = layout(batch(n), columns);
                assert_eq!(rows.len(), n.div_ceil(columns), "n={n} c={columns}");
                assert!(rows.iter().all(|r| r.cells.len() == columns));
                if let Some(last) = rows.last() {
                    let expected = if n % columns == 0 { columns } else { n % columns };
                    assert_eq!(last.occupied(), expected, "n={n} c={columns}");
                }
                let total: usize = rows.iter().map(GridRow::occupied).sum();
                assert_eq!(total, n);
            }
        }
    }

    #[test]
    fn preserves_input_order() {
        let rows = layout(batch(5), 2);
        let tags: Vec<u8> = rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .filter_map(|c| match c {
                GridCell::Occupied(i) => Some(i.bytes[0]),
                GridCell::Empty => None,
            })
            .collect();
        assert_eq!(tags, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn duplicates_are_kept() {
        let rows = layout(vec![img(9), img(9)], 3);
        assert_eq!(rows[0].occupied(), 2);
    }

    #[test]
    fn zero_columns_treated_as_one() {
        let rows = layout(batch(2), 0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells.len(), 1);
    }
}
