#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that detects newly uniform rows and queues them for resolution.

use log::info;
use rowmatch_core::{Command, GridView, MatchedRow, RowView};
use rowmatch_system_queue::ResolutionQueue;

/// Scans the grid for rows whose items all share a category.
#[derive(Debug, Default)]
pub struct MatchDetector;

impl MatchDetector {
    /// Creates a new detector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Groups the grid's cells by row and queues every row that qualifies.
    ///
    /// Rows that are incomplete, contain an empty cell, hold consolidated
    /// cells or are already tracked by the queue are skipped. Qualifying rows
    /// have the interaction of their items disabled through `out` before they
    /// are appended to the queue. The returned list is empty when nothing
    /// qualified.
    pub fn scan(
        &mut self,
        grid: &GridView,
        queue: &mut ResolutionQueue,
        out: &mut Vec<Command>,
    ) -> Vec<MatchedRow> {
        let mut matched = Vec::new();

        for row in grid.rows() {
            let Some(entry) = qualify(&row, queue) else {
                continue;
            };

            for cell in row.cells() {
                if let Some(item) = cell.item {
                    out.push(Command::SetItemInteraction {
                        item: item.id,
                        enabled: false,
                    });
                }
            }

            info!(
                "row {} matched on category {}",
                entry.row(),
                entry.category().get()
            );
            queue.enqueue(entry.clone());
            matched.push(entry);
        }

        matched
    }
}

fn qualify(row: &RowView<'_>, queue: &ResolutionQueue) -> Option<MatchedRow> {
    if !row.is_complete() || row.has_empty() || row.is_fully_consolidated() {
        return None;
    }
    if row.has_consolidated() || queue.is_tracked(row.index()) {
        return None;
    }
    let category = row.uniform_category()?;
    Some(MatchedRow::new(row.index(), category, row.coords()))
}
