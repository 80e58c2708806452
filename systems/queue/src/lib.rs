#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! FIFO queue that serializes matched rows into one-at-a-time consolidation.

use std::collections::VecDeque;

use log::debug;
use rowmatch_core::MatchedRow;

/// Strict FIFO of matched rows guarded by an `is_processing` flag.
///
/// At most one row is active at a time. The active row is released only by
/// calling [`ResolutionQueue::process_next`] after its consolidation finished.
#[derive(Debug, Default)]
pub struct ResolutionQueue {
    entries: VecDeque<MatchedRow>,
    processing: bool,
    active: Option<u32>,
}

impl ResolutionQueue {
    /// Creates an empty, idle queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a matched row to the tail of the queue.
    pub fn enqueue(&mut self, row: MatchedRow) {
        debug!("queued row {} ({:?})", row.row(), row.category());
        self.entries.push_back(row);
    }

    /// Releases the active row and hands out the next queued one.
    ///
    /// Clears the processing guard and returns `None` once the queue drained.
    pub fn process_next(&mut self) -> Option<MatchedRow> {
        let Some(next) = self.entries.pop_front() else {
            self.processing = false;
            self.active = None;
            return None;
        };
        self.processing = true;
        self.active = Some(next.row());
        Some(next)
    }

    /// Starts draining the queue unless a row is already being processed.
    pub fn kick(&mut self) -> Option<MatchedRow> {
        if self.processing {
            return None;
        }
        self.process_next()
    }

    /// Stops tracking the active row while keeping the processing guard.
    ///
    /// Called once the active row's items left it, so the row can match
    /// again before the next entry is released.
    pub fn retire_active(&mut self) -> Option<u32> {
        let retired = self.active.take();
        if let Some(row) = retired {
            debug!("row {row} no longer tracked; queue stays busy");
        }
        retired
    }

    /// Reports whether a row is currently being processed.
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        self.processing
    }

    /// Row index of the entry currently being processed.
    #[must_use]
    pub const fn active(&self) -> Option<u32> {
        self.active
    }

    /// Number of entries waiting behind the active row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no entry is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reports whether the row is waiting in the queue or being processed.
    #[must_use]
    pub fn is_tracked(&self, row: u32) -> bool {
        self.active == Some(row) || self.entries.iter().any(|entry| entry.row() == row)
    }

    /// Moves a waiting entry to another row after its items were relocated.
    ///
    /// Returns `false` when no waiting entry referenced `from`.
    pub fn redirect(&mut self, from: u32, to: u32) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|entry| entry.row() == from) else {
            return false;
        };
        debug!("queued row {from} follows its items to row {to}");
        *entry = entry.relocated(to);
        true
    }

    /// Iterator over the waiting entries in dequeue order.
    pub fn iter(&self) -> impl Iterator<Item = &MatchedRow> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use rowmatch_core::{Category, CellCoord};

    use super::*;

    fn matched(row: u32) -> MatchedRow {
        MatchedRow::new(
            row,
            Category::new(1),
            (0..3).map(|column| CellCoord::new(column, row)).collect(),
        )
    }

    #[test]
    fn process_next_on_empty_queue_clears_guard() {
        let mut queue = ResolutionQueue::new();
        assert!(queue.process_next().is_none());
        assert!(!queue.is_processing());
        assert_eq!(queue.active(), None);
    }

    #[test]
    fn kick_is_ignored_while_processing() {
        let mut queue = ResolutionQueue::new();
        queue.enqueue(matched(0));
        queue.enqueue(matched(1));

        assert_eq!(queue.kick().map(|row| row.row()), Some(0));
        assert!(queue.kick().is_none(), "second kick must not dequeue");
        assert_eq!(queue.len(), 1);
        assert!(queue.is_tracked(0));
        assert!(queue.is_tracked(1));
    }

    #[test]
    fn retired_row_is_untracked_but_queue_stays_busy() {
        let mut queue = ResolutionQueue::new();
        queue.enqueue(matched(1));
        let _ = queue.kick();

        assert_eq!(queue.retire_active(), Some(1));
        assert!(!queue.is_tracked(1));
        assert!(queue.is_processing());

        queue.enqueue(matched(1));
        assert!(queue.kick().is_none(), "guard still held until process_next");
        assert_eq!(queue.process_next().map(|row| row.row()), Some(1));
        assert_eq!(queue.retire_active(), Some(1));
        assert_eq!(queue.retire_active(), None);
    }

    #[test]
    fn redirect_rewrites_waiting_entry() {
        let mut queue = ResolutionQueue::new();
        queue.enqueue(matched(2));
        assert!(queue.redirect(2, 5));
        assert!(!queue.redirect(2, 5));

        let entry = queue.iter().next().expect("entry waiting");
        assert_eq!(entry.row(), 5);
        assert!(entry.cells().iter().all(|cell| cell.row() == 5));
    }
}
