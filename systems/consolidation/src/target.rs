//! Target row selection for a matched row.

use log::warn;
use rowmatch_core::GridView;

/// Chooses the row that receives the items of the matched row `source`.
///
/// With exactly two unpaired rows left the source consolidates in place.
/// Otherwise the topmost unpaired row wins. Finding no unpaired row at all
/// means the grid disagrees with the queue, so the source is used as a
/// fallback.
pub(crate) fn select_target(grid: &GridView, source: u32) -> u32 {
    let unpaired = grid.unpaired_rows();

    if unpaired.len() == 2 {
        return source;
    }

    match unpaired.first() {
        Some(topmost) => *topmost,
        None => {
            warn!("no unpaired row left while consolidating row {source}; consolidating in place");
            source
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use rowmatch_core::{Category, CellCoord, CellSnapshot, ItemId, ItemSnapshot, Transform};

    use super::*;

    fn grid(rows: &[(u16, bool)]) -> GridView {
        let mut cells = Vec::new();
        for (row, (category, consolidated)) in rows.iter().enumerate() {
            for column in 0..2u32 {
                cells.push(CellSnapshot {
                    coord: CellCoord::new(column, row as u32),
                    item: Some(ItemSnapshot {
                        id: ItemId::new(row as u32 * 2 + column),
                        category: Category::new(*category),
                        draggable: true,
                        exchangeable: true,
                        idle: true,
                    }),
                    consolidated: *consolidated,
                    pending: false,
                    stacked: false,
                    transform: Transform::at(Vec2::ZERO),
                    tint: None,
                });
            }
        }
        GridView::from_snapshots(2, rows.len() as u32, cells)
    }

    #[test]
    fn two_unpaired_rows_consolidate_in_place() {
        let view = grid(&[(0, true), (1, false), (2, false)]);
        assert_eq!(select_target(&view, 2), 2);
    }

    #[test]
    fn topmost_unpaired_row_is_selected() {
        let view = grid(&[(0, true), (1, false), (2, false), (3, false)]);
        assert_eq!(select_target(&view, 3), 1);
    }

    #[test]
    fn falls_back_to_source_without_unpaired_rows() {
        let view = grid(&[(0, true), (1, true)]);
        assert_eq!(select_target(&view, 1), 1);
    }
}
