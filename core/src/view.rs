//! Read-only snapshots of the grid handed to systems.

use std::collections::BTreeMap;

use crate::{Category, CellCoord, ItemId, PaletteIndex, Transform};

/// Immutable representation of a single item used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemSnapshot {
    /// Identifier allocated to the item.
    pub id: ItemId,
    /// Category carried by the item.
    pub category: Category,
    /// Whether the player may drag the item.
    pub draggable: bool,
    /// Whether the player may exchange the item with another one.
    pub exchangeable: bool,
    /// Whether the item plays its idle animation.
    pub idle: bool,
}

/// Immutable representation of a single cell used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSnapshot {
    /// Coordinate of the cell.
    pub coord: CellCoord,
    /// Item occupying the cell, if any.
    pub item: Option<ItemSnapshot>,
    /// Whether the cell belongs to a resolved row.
    pub consolidated: bool,
    /// Whether the cell's row is being consolidated.
    pub pending: bool,
    /// Whether the cell shows its stacked visual.
    pub stacked: bool,
    /// Anchor transform of the cell.
    pub transform: Transform,
    /// Palette entry recoloring the cell background, if any.
    pub tint: Option<PaletteIndex>,
}

impl CellSnapshot {
    /// Category of the occupying item, if any.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        self.item.map(|item| item.category)
    }

    /// Reports whether the cell holds no item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }
}

/// Read-only snapshot of every cell in the grid.
#[derive(Clone, Debug, Default)]
pub struct GridView {
    columns: u32,
    rows: u32,
    cells: Vec<CellSnapshot>,
}

impl GridView {
    /// Creates a new grid view, ordering cells by row and then column.
    #[must_use]
    pub fn from_snapshots(columns: u32, rows: u32, mut cells: Vec<CellSnapshot>) -> Self {
        cells.sort_by_key(|cell| (cell.coord.row(), cell.coord.column()));
        Self {
            columns,
            rows,
            cells,
        }
    }

    /// Every cell of the layout in row-major order.
    #[must_use]
    pub fn all_cells(&self) -> &[CellSnapshot] {
        &self.cells
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn column_count(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn row_count(&self) -> u32 {
        self.rows
    }

    /// Number of items a complete row holds.
    #[must_use]
    pub const fn row_capacity(&self) -> usize {
        self.columns as usize
    }

    /// Snapshot of the cell at the provided coordinate, if it exists.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&CellSnapshot> {
        self.cells.iter().find(|cell| cell.coord == coord)
    }

    /// Groups the cells by row index, in ascending row order.
    #[must_use]
    pub fn rows(&self) -> Vec<RowView<'_>> {
        let mut grouped: BTreeMap<u32, Vec<&CellSnapshot>> = BTreeMap::new();
        for cell in &self.cells {
            grouped.entry(cell.coord.row()).or_default().push(cell);
        }
        grouped
            .into_iter()
            .map(|(index, cells)| RowView::new(index, cells, self.row_capacity()))
            .collect()
    }

    /// Cells of a single row ordered by column.
    #[must_use]
    pub fn row(&self, index: u32) -> Option<RowView<'_>> {
        let cells: Vec<&CellSnapshot> = self
            .cells
            .iter()
            .filter(|cell| cell.coord.row() == index)
            .collect();
        if cells.is_empty() {
            return None;
        }
        Some(RowView::new(index, cells, self.row_capacity()))
    }

    /// Indices of every complete, fully occupied, unconsolidated row in
    /// ascending order.
    #[must_use]
    pub fn unpaired_rows(&self) -> Vec<u32> {
        self.rows()
            .iter()
            .filter(|row| row.is_unpaired())
            .map(RowView::index)
            .collect()
    }
}

/// Cells sharing a row index.
#[derive(Clone, Debug)]
pub struct RowView<'a> {
    index: u32,
    cells: Vec<&'a CellSnapshot>,
    capacity: usize,
}

impl<'a> RowView<'a> {
    fn new(index: u32, mut cells: Vec<&'a CellSnapshot>, capacity: usize) -> Self {
        cells.sort_by_key(|cell| cell.coord.column());
        Self {
            index,
            cells,
            capacity,
        }
    }

    /// Row index shared by the cells.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Cells of the row ordered by column.
    #[must_use]
    pub fn cells(&self) -> &[&'a CellSnapshot] {
        &self.cells
    }

    /// Coordinates of the row's cells ordered by column.
    #[must_use]
    pub fn coords(&self) -> Vec<CellCoord> {
        self.cells.iter().map(|cell| cell.coord).collect()
    }

    /// Reports whether the row has exactly one cell per column.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cells.len() == self.capacity
    }

    /// Reports whether any cell of the row is empty.
    #[must_use]
    pub fn has_empty(&self) -> bool {
        self.cells.iter().any(|cell| cell.is_empty())
    }

    /// Reports whether every cell of the row is consolidated.
    #[must_use]
    pub fn is_fully_consolidated(&self) -> bool {
        self.cells.iter().all(|cell| cell.consolidated)
    }

    /// Reports whether any cell of the row is consolidated.
    #[must_use]
    pub fn has_consolidated(&self) -> bool {
        self.cells.iter().any(|cell| cell.consolidated)
    }

    /// Complete, fully occupied and not fully consolidated.
    #[must_use]
    pub fn is_unpaired(&self) -> bool {
        self.is_complete() && !self.has_empty() && !self.is_fully_consolidated()
    }

    /// Category shared by every item in the row, if the row is uniform.
    #[must_use]
    pub fn uniform_category(&self) -> Option<Category> {
        let first = self.cells.first()?.category()?;
        self.cells
            .iter()
            .all(|cell| cell.category() == Some(first))
            .then_some(first)
    }

    /// Mean anchor position of the row's cells.
    #[must_use]
    pub fn center(&self) -> glam::Vec2 {
        if self.cells.is_empty() {
            return glam::Vec2::ZERO;
        }
        let sum: glam::Vec2 = self.cells.iter().map(|cell| cell.transform.position).sum();
        sum / self.cells.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    fn cell(column: u32, row: u32, category: Option<u16>) -> CellSnapshot {
        CellSnapshot {
            coord: CellCoord::new(column, row),
            item: category.map(|value| ItemSnapshot {
                id: ItemId::new(row * 10 + column),
                category: Category::new(value),
                draggable: true,
                exchangeable: true,
                idle: true,
            }),
            consolidated: false,
            pending: false,
            stacked: false,
            transform: Transform::at(Vec2::new(column as f32, -(row as f32))),
            tint: None,
        }
    }

    #[test]
    fn uniform_category_requires_every_cell() {
        let view = GridView::from_snapshots(
            3,
            2,
            vec![
                cell(0, 0, Some(1)),
                cell(1, 0, Some(1)),
                cell(2, 0, Some(1)),
                cell(0, 1, Some(1)),
                cell(1, 1, Some(2)),
                cell(2, 1, Some(1)),
            ],
        );
        let rows = view.rows();
        assert_eq!(rows[0].uniform_category(), Some(Category::new(1)));
        assert_eq!(rows[1].uniform_category(), None);
    }

    #[test]
    fn rows_with_holes_or_gaps_are_not_unpaired() {
        let view = GridView::from_snapshots(
            2,
            3,
            vec![
                cell(0, 0, Some(1)),
                cell(1, 0, None),
                cell(0, 1, Some(1)),
                cell(0, 2, Some(3)),
                cell(1, 2, Some(4)),
            ],
        );
        assert_eq!(view.unpaired_rows(), vec![2]);
    }

    #[test]
    fn row_center_averages_anchor_positions() {
        let view = GridView::from_snapshots(
            2,
            1,
            vec![cell(0, 0, Some(1)), cell(1, 0, Some(1))],
        );
        let row = view.row(0).expect("row exists");
        assert_eq!(row.center(), Vec2::new(0.5, 0.0));
    }
}
