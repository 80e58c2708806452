//! Captured anchor transforms used to undo temporary layout changes.

use crate::{CellCoord, Command, Transform};

/// Anchor transforms of a set of cells captured before an animation.
///
/// A snapshot is owned by the sequence that captured it and is consumed by
/// [`PositionSnapshot::restore`], so it cannot be applied twice or outlive the
/// sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionSnapshot {
    entries: Vec<(CellCoord, Transform)>,
}

impl PositionSnapshot {
    /// Captures the provided cell transforms, ordered by cell coordinate.
    #[must_use]
    pub fn capture<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (CellCoord, Transform)>,
    {
        let mut entries: Vec<(CellCoord, Transform)> = entries.into_iter().collect();
        entries.sort_by_key(|(cell, _)| (cell.row(), cell.column()));
        entries.dedup_by_key(|(cell, _)| *cell);
        Self { entries }
    }

    /// Transform captured for the provided cell, if any.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<Transform> {
        self.entries
            .iter()
            .find(|(captured, _)| *captured == cell)
            .map(|(_, transform)| *transform)
    }

    /// Iterator over the captured cells and transforms.
    pub fn iter(&self) -> impl Iterator<Item = &(CellCoord, Transform)> {
        self.entries.iter()
    }

    /// Number of captured cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the snapshot captured no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the snapshot, emitting commands that write every captured
    /// transform back to its cell unchanged.
    pub fn restore(self, out: &mut Vec<Command>) {
        out.extend(
            self.entries
                .into_iter()
                .map(|(cell, transform)| Command::SetCellTransform { cell, transform }),
        );
    }
}
