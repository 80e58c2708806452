#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state management for Row Match.

mod items;

use glam::Vec2;
use log::warn;
use rowmatch_core::{
    CellCoord, CellSnapshot, Command, Event, ExchangeError, ItemId, PaletteIndex, Transform,
};

use crate::items::ItemRegistry;

const DEFAULT_GRID_COLUMNS: u32 = 4;
const DEFAULT_GRID_ROWS: u32 = 6;
const DEFAULT_SPACING: Vec2 = Vec2::ONE;

/// Describes the discrete layout of the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    columns: u32,
    rows: u32,
    origin: Vec2,
    spacing: Vec2,
}

impl GridLayout {
    /// Creates a new layout description.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, origin: Vec2, spacing: Vec2) -> Self {
        Self {
            columns,
            rows,
            origin,
            spacing,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Grid-aligned anchor of the provided cell. Row zero is the topmost row.
    #[must_use]
    pub fn anchor(&self, cell: CellCoord) -> Transform {
        let offset = Vec2::new(
            cell.column() as f32 * self.spacing.x,
            -(cell.row() as f32) * self.spacing.y,
        );
        Transform::at(self.origin + offset)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    fn capacity(&self) -> usize {
        let capacity = u64::from(self.columns) * u64::from(self.rows);
        usize::try_from(capacity).unwrap_or(0)
    }
}

#[derive(Clone, Debug)]
struct Cell {
    coord: CellCoord,
    item: Option<ItemId>,
    consolidated: bool,
    pending: bool,
    stacked: bool,
    transform: Transform,
    tint: Option<PaletteIndex>,
}

impl Cell {
    fn new(coord: CellCoord, transform: Transform) -> Self {
        Self {
            coord,
            item: None,
            consolidated: false,
            pending: false,
            stacked: false,
            transform,
            tint: None,
        }
    }
}

/// Represents the authoritative Row Match grid state.
#[derive(Debug)]
pub struct World {
    layout: GridLayout,
    cells: Vec<Option<Cell>>,
    items: ItemRegistry,
}

impl World {
    /// Creates a new world with the default, empty grid.
    #[must_use]
    pub fn new() -> Self {
        let layout = GridLayout::new(
            DEFAULT_GRID_COLUMNS,
            DEFAULT_GRID_ROWS,
            Vec2::ZERO,
            DEFAULT_SPACING,
        );
        Self {
            cells: build_cells(&layout, &[]),
            layout,
            items: ItemRegistry::new(),
        }
    }

    fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        self.layout
            .index(coord)
            .and_then(|index| self.cells.get(index))
            .and_then(Option::as_ref)
    }

    fn cell_mut(&mut self, coord: CellCoord) -> Option<&mut Cell> {
        self.layout
            .index(coord)
            .and_then(|index| self.cells.get_mut(index))
            .and_then(Option::as_mut)
    }

    fn row_cells_mut(&mut self, row: u32) -> impl Iterator<Item = &mut Cell> {
        self.cells
            .iter_mut()
            .flatten()
            .filter(move |cell| cell.coord.row() == row)
    }

    fn exchange(&mut self, first: CellCoord, second: CellCoord) -> Result<(), ExchangeError> {
        if first == second {
            return Err(ExchangeError::SameCell);
        }
        let (Some(first_cell), Some(second_cell)) = (self.cell(first), self.cell(second)) else {
            return Err(ExchangeError::OutOfBounds);
        };
        if first_cell.consolidated || second_cell.consolidated {
            return Err(ExchangeError::Locked);
        }
        let (Some(first_item), Some(second_item)) = (first_cell.item, second_cell.item) else {
            return Err(ExchangeError::EmptyCell);
        };
        let movable = [first_item, second_item].iter().all(|item| {
            self.items
                .get(*item)
                .map_or(false, |state| state.is_movable())
        });
        if !movable {
            return Err(ExchangeError::Locked);
        }

        self.swap_occupancy(first, second);
        Ok(())
    }

    fn swap_occupancy(&mut self, first: CellCoord, second: CellCoord) {
        let first_item = self.cell(first).and_then(|cell| cell.item);
        let second_item = self.cell(second).and_then(|cell| cell.item);
        if let Some(cell) = self.cell_mut(first) {
            cell.item = second_item;
        }
        if let Some(cell) = self.cell_mut(second) {
            cell.item = first_item;
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid {
            columns,
            rows,
            holes,
            origin,
            spacing,
        } => {
            world.layout = GridLayout::new(columns, rows, origin, spacing);
            world.cells = build_cells(&world.layout, &holes);
            world.items = ItemRegistry::new();
            out_events.push(Event::GridConfigured { columns, rows });
        }
        Command::PlaceItem { cell, category } => {
            let occupied = match world.cell(cell) {
                None => {
                    out_events.push(Event::CellMissing { cell });
                    return;
                }
                Some(existing) => existing.item.is_some(),
            };
            if occupied {
                warn!("refusing to place an item into occupied cell {cell:?}");
                return;
            }
            let item = world.items.create(category);
            if let Some(slot) = world.cell_mut(cell) {
                slot.item = Some(item);
            }
            out_events.push(Event::ItemPlaced {
                cell,
                item,
                category,
            });
        }
        Command::ExchangeItems { first, second } => match world.exchange(first, second) {
            Ok(()) => out_events.push(Event::ItemsExchanged { first, second }),
            Err(reason) => out_events.push(Event::ExchangeRejected {
                first,
                second,
                reason,
            }),
        },
        Command::SwapItems { first, second } => {
            for cell in [first, second] {
                if world.cell(cell).is_none() {
                    out_events.push(Event::CellMissing { cell });
                    return;
                }
            }
            world.swap_occupancy(first, second);
            out_events.push(Event::ItemsSwapped { first, second });
        }
        Command::SetItemInteraction { item, enabled } => {
            if let Some(state) = world.items.get_mut(item) {
                state.draggable = enabled;
                state.exchangeable = enabled;
                out_events.push(Event::InteractionChanged { item, enabled });
            }
        }
        Command::SetItemIdle { item, idle } => {
            if let Some(state) = world.items.get_mut(item) {
                state.idle = idle;
            }
        }
        Command::SetRowPending { row, pending } => {
            for cell in world.row_cells_mut(row) {
                cell.pending = pending;
            }
            out_events.push(Event::RowPendingChanged { row, pending });
        }
        Command::SetRowConsolidated { row, consolidated } => {
            for cell in world.row_cells_mut(row) {
                cell.consolidated = consolidated;
            }
            out_events.push(Event::RowConsolidationChanged { row, consolidated });
        }
        Command::SetRowStacked { row, stacked } => {
            for cell in world.row_cells_mut(row) {
                cell.stacked = stacked;
            }
        }
        Command::SetCellTransform { cell, transform } => match world.cell_mut(cell) {
            Some(slot) => slot.transform = transform,
            None => out_events.push(Event::CellMissing { cell }),
        },
        Command::SetCellTint { cell, tint } => match world.cell_mut(cell) {
            Some(slot) => slot.tint = tint,
            None => out_events.push(Event::CellMissing { cell }),
        },
        Command::ClearCell { cell } => {
            let Some(slot) = world.cell_mut(cell) else {
                out_events.push(Event::CellMissing { cell });
                return;
            };
            let item = slot.item.take();
            slot.consolidated = false;
            slot.pending = false;
            if let Some(item) = item {
                let _ = world.items.destroy(item);
            }
            out_events.push(Event::CellCleared { cell, item });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use rowmatch_core::{CellCoord, GridView, ItemId, ItemSnapshot, Transform};

    use super::{GridLayout, World};

    /// Provides read-only access to the grid layout.
    #[must_use]
    pub fn layout(world: &World) -> &GridLayout {
        &world.layout
    }

    /// Captures a read-only view of every cell in the grid.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView {
        let snapshots = world
            .cells
            .iter()
            .flatten()
            .map(|cell| world.snapshot(cell))
            .collect();
        GridView::from_snapshots(world.layout.columns(), world.layout.rows(), snapshots)
    }

    /// Retrieves the current state of an item.
    #[must_use]
    pub fn item(world: &World, item: ItemId) -> Option<ItemSnapshot> {
        world.items.get(item).map(|state| state.snapshot())
    }

    /// Locates the cell currently holding the item.
    #[must_use]
    pub fn cell_of(world: &World, item: ItemId) -> Option<CellCoord> {
        world
            .cells
            .iter()
            .flatten()
            .find(|cell| cell.item == Some(item))
            .map(|cell| cell.coord)
    }

    /// Current anchor transform of a cell.
    #[must_use]
    pub fn cell_transform(world: &World, cell: CellCoord) -> Option<Transform> {
        world.cell(cell).map(|slot| slot.transform)
    }

    /// Number of items alive in the grid.
    #[must_use]
    pub fn item_count(world: &World) -> usize {
        world.items.len()
    }
}

impl World {
    fn snapshot(&self, cell: &Cell) -> CellSnapshot {
        CellSnapshot {
            coord: cell.coord,
            item: cell
                .item
                .and_then(|item| self.items.get(item))
                .map(|state| state.snapshot()),
            consolidated: cell.consolidated,
            pending: cell.pending,
            stacked: cell.stacked,
            transform: cell.transform,
            tint: cell.tint,
        }
    }
}

fn build_cells(layout: &GridLayout, holes: &[CellCoord]) -> Vec<Option<Cell>> {
    let mut cells = Vec::with_capacity(layout.capacity());
    for row in 0..layout.rows() {
        for column in 0..layout.columns() {
            let coord = CellCoord::new(column, row);
            if holes.contains(&coord) {
                cells.push(None);
            } else {
                cells.push(Some(Cell::new(coord, layout.anchor(coord))));
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use rowmatch_core::Category;

    use super::*;

    fn configure(world: &mut World, columns: u32, rows: u32, holes: Vec<CellCoord>) {
        let mut events = Vec::new();
        apply(
            world,
            Command::ConfigureGrid {
                columns,
                rows,
                holes,
                origin: Vec2::ZERO,
                spacing: Vec2::new(2.0, 3.0),
            },
            &mut events,
        );
        assert_eq!(events, vec![Event::GridConfigured { columns, rows }]);
    }

    fn place(world: &mut World, cell: CellCoord, category: u16) -> ItemId {
        let mut events = Vec::new();
        apply(
            world,
            Command::PlaceItem {
                cell,
                category: Category::new(category),
            },
            &mut events,
        );
        match events.as_slice() {
            [Event::ItemPlaced { item, .. }] => *item,
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn configure_grid_lays_out_anchors_row_major() {
        let mut world = World::new();
        configure(&mut world, 3, 2, Vec::new());

        let view = query::grid_view(&world);
        assert_eq!(view.all_cells().len(), 6);
        let anchor = view
            .cell(CellCoord::new(2, 1))
            .expect("cell exists")
            .transform;
        assert_eq!(anchor.position, Vec2::new(4.0, -3.0));
        assert_eq!(anchor.scale, Vec2::ONE);
    }

    #[test]
    fn holes_are_absent_from_the_view() {
        let mut world = World::new();
        configure(&mut world, 3, 2, vec![CellCoord::new(1, 0)]);

        let view = query::grid_view(&world);
        assert_eq!(view.all_cells().len(), 5);
        assert!(view.cell(CellCoord::new(1, 0)).is_none());
        assert!(!view.row(0).expect("row exists").is_complete());
    }

    #[test]
    fn exchange_rejects_locked_items() {
        let mut world = World::new();
        configure(&mut world, 2, 1, Vec::new());
        let first = place(&mut world, CellCoord::new(0, 0), 1);
        let _ = place(&mut world, CellCoord::new(1, 0), 2);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetItemInteraction {
                item: first,
                enabled: false,
            },
            &mut events,
        );
        events.clear();
        apply(
            &mut world,
            Command::ExchangeItems {
                first: CellCoord::new(0, 0),
                second: CellCoord::new(1, 0),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::ExchangeRejected {
                first: CellCoord::new(0, 0),
                second: CellCoord::new(1, 0),
                reason: ExchangeError::Locked,
            }]
        );
        assert_eq!(query::cell_of(&world, first), Some(CellCoord::new(0, 0)));
    }

    #[test]
    fn swap_ignores_interaction_flags() {
        let mut world = World::new();
        configure(&mut world, 2, 1, Vec::new());
        let first = place(&mut world, CellCoord::new(0, 0), 1);
        let second = place(&mut world, CellCoord::new(1, 0), 2);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetItemInteraction {
                item: first,
                enabled: false,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SwapItems {
                first: CellCoord::new(0, 0),
                second: CellCoord::new(1, 0),
            },
            &mut events,
        );

        assert_eq!(query::cell_of(&world, first), Some(CellCoord::new(1, 0)));
        assert_eq!(query::cell_of(&world, second), Some(CellCoord::new(0, 0)));
    }

    #[test]
    fn clear_cell_destroys_item_and_resets_flags() {
        let mut world = World::new();
        configure(&mut world, 2, 1, Vec::new());
        let item = place(&mut world, CellCoord::new(0, 0), 1);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetRowConsolidated {
                row: 0,
                consolidated: true,
            },
            &mut events,
        );
        events.clear();
        apply(
            &mut world,
            Command::ClearCell {
                cell: CellCoord::new(0, 0),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::CellCleared {
                cell: CellCoord::new(0, 0),
                item: Some(item),
            }]
        );
        let view = query::grid_view(&world);
        let cell = view.cell(CellCoord::new(0, 0)).expect("cell exists");
        assert!(cell.is_empty());
        assert!(!cell.consolidated);
        assert!(query::item(&world, item).is_none());
        assert_eq!(query::item_count(&world), 0);
    }

    #[test]
    fn place_into_hole_reports_missing_cell() {
        let mut world = World::new();
        configure(&mut world, 2, 1, vec![CellCoord::new(1, 0)]);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceItem {
                cell: CellCoord::new(1, 0),
                category: Category::new(0),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::CellMissing {
                cell: CellCoord::new(1, 0),
            }]
        );
    }
}
