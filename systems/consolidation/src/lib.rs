#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Row consolidation state machine.
//!
//! A matched row is moved into its target row column by column, the target is
//! flagged as consolidated, settles, receives a collection marker and finally
//! collapses toward its center. Every phase launches its tweens together and
//! waits on a [`JoinBarrier`] before the next phase starts.

mod palette;
mod target;

use std::time::Duration;

use glam::Vec2;
use log::{debug, info, warn};
use rowmatch_core::{
    Category, CellCoord, Command, Easing, EffectCue, Event, GridView, ItemId, JoinBarrier, MarkerId,
    MatchedRow, PaletteColor, PaletteIndex, PositionSnapshot, Services, Transform, TweenRequest,
    TweenSubject,
};
use thiserror::Error;

use crate::palette::Palette;

/// Tuning knobs for the consolidation sequence.
#[derive(Clone, Debug)]
pub struct Config {
    /// Length of each column swap.
    pub swap_duration: Duration,
    /// Length of the settle bounce on the target row.
    pub settle_duration: Duration,
    /// Length of the collapse toward the row center.
    pub collapse_duration: Duration,
    /// Fraction of the original spacing kept by the collapsed row.
    pub collapse_ratio: f32,
    /// Scale the settle bounce starts from, relative to the anchor scale.
    pub settle_scale: f32,
    /// Number of consolidated rows that may still be regenerated.
    pub supplement_budget: u32,
    /// Marker and tint colors handed out in round-robin order.
    pub palette: Vec<PaletteColor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            swap_duration: Duration::from_millis(350),
            settle_duration: Duration::from_millis(200),
            collapse_duration: Duration::from_millis(300),
            collapse_ratio: 0.35,
            settle_scale: 1.15,
            supplement_budget: 0,
            palette: vec![
                PaletteColor::from_rgb(0xf2, 0x6d, 0x5b),
                PaletteColor::from_rgb(0x4f, 0xb4, 0x77),
                PaletteColor::from_rgb(0x3d, 0x8b, 0xd9),
                PaletteColor::from_rgb(0xf5, 0xb9, 0x42),
            ],
        }
    }
}

/// Reasons a queued row cannot start consolidating.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsolidationError {
    /// Another row is still consolidating.
    #[error("row {active} is still consolidating")]
    Busy {
        /// Row currently owned by the consolidator.
        active: u32,
    },
    /// The row no longer holds a uniform, unconsolidated set of items.
    #[error("row {row} no longer qualifies for consolidation")]
    Stale {
        /// Row that was dequeued.
        row: u32,
    },
}

/// Result of a finished consolidation.
#[derive(Debug)]
pub struct Consolidation {
    /// Row that matched.
    pub source: u32,
    /// Row that holds the consolidated items.
    pub target: u32,
    /// Category of the consolidated items.
    pub category: Category,
    /// Marker shown for the row, if the presenter created one.
    pub marker: Option<MarkerId>,
    /// Palette entry used by the marker and the tints.
    pub palette: Option<PaletteIndex>,
    /// Anchors of the target row captured right before it collapsed.
    pub snapshot: PositionSnapshot,
    /// Whether the row should be regenerated. The budget was already spent.
    pub regenerate: bool,
}

#[derive(Clone, Copy, Debug)]
struct ColumnSwap {
    from: CellCoord,
    to: CellCoord,
    from_item: ItemId,
    to_item: ItemId,
    /// The target item was free to move before the swap locked it.
    to_was_free: bool,
}

#[derive(Debug)]
enum Phase {
    Swap {
        barrier: JoinBarrier,
        columns: Vec<ColumnSwap>,
    },
    Settle {
        barrier: JoinBarrier,
    },
    Collapse {
        barrier: JoinBarrier,
        collapsed: Vec<(CellCoord, Transform)>,
        snapshot: PositionSnapshot,
    },
}

#[derive(Debug)]
struct Job {
    source: MatchedRow,
    target: u32,
    target_cells: Vec<CellCoord>,
    phase: Phase,
    marker: Option<MarkerId>,
    palette: Option<PaletteIndex>,
}

/// Consolidates one matched row at a time.
#[derive(Debug)]
pub struct RowConsolidator {
    config: Config,
    palette: Palette,
    supplement_budget: u32,
    job: Option<Job>,
}

impl RowConsolidator {
    /// Creates a consolidator using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            palette: Palette::new(config.palette.clone()),
            supplement_budget: config.supplement_budget,
            config,
            job: None,
        }
    }

    /// Reports whether a row is being consolidated.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    /// Row currently being consolidated, if any.
    #[must_use]
    pub fn active_source(&self) -> Option<u32> {
        self.job.as_ref().map(|job| job.source.row())
    }

    /// Regenerations left.
    #[must_use]
    pub const fn supplement_budget(&self) -> u32 {
        self.supplement_budget
    }

    /// Palette entry the next consolidation will use.
    #[must_use]
    pub fn palette_cursor(&self) -> usize {
        self.palette.cursor()
    }

    /// Selects the target row and launches the column swaps.
    ///
    /// Returns the selected target row.
    pub fn begin(
        &mut self,
        source: MatchedRow,
        grid: &GridView,
        services: &mut Services<'_>,
        out: &mut Vec<Command>,
        events: &mut Vec<Event>,
    ) -> Result<u32, ConsolidationError> {
        if let Some(job) = &self.job {
            return Err(ConsolidationError::Busy {
                active: job.source.row(),
            });
        }

        let still_matches = grid.row(source.row()).map_or(false, |row| {
            row.is_unpaired()
                && !row.has_consolidated()
                && row.uniform_category() == Some(source.category())
        });
        if !still_matches {
            return Err(ConsolidationError::Stale { row: source.row() });
        }

        let target = target::select_target(grid, source.row());
        let target_cells = grid
            .row(target)
            .map(|row| row.coords())
            .unwrap_or_else(|| source.cells().to_vec());
        debug!("consolidating row {} into row {target}", source.row());

        out.push(Command::SetRowPending {
            row: source.row(),
            pending: true,
        });
        events.push(Event::ConsolidationStarted {
            source: source.row(),
            target,
        });

        let mut barrier = JoinBarrier::new();
        let mut columns = Vec::new();
        if target != source.row() {
            for (from, to) in source.cells().iter().zip(target_cells.iter()) {
                let (Some(from_cell), Some(to_cell)) = (grid.cell(*from), grid.cell(*to)) else {
                    warn!("column {} vanished mid-swap; skipping it", from.column());
                    continue;
                };
                let (Some(from_item), Some(to_item)) = (from_cell.item, to_cell.item) else {
                    warn!("column {} lost its item mid-swap; skipping it", from.column());
                    continue;
                };

                let outbound = services.animator.animate(TweenRequest {
                    subject: TweenSubject::Item(from_item.id),
                    from: from_cell.transform,
                    to: to_cell.transform,
                    duration: self.config.swap_duration,
                    easing: Easing::InOutSine,
                });
                let inbound = services.animator.animate(TweenRequest {
                    subject: TweenSubject::Item(to_item.id),
                    from: to_cell.transform,
                    to: from_cell.transform,
                    duration: self.config.swap_duration,
                    easing: Easing::InOutSine,
                });
                barrier.launch([outbound, inbound]);
                let to_was_free = to_item.draggable && to_item.exchangeable;
                if to_was_free {
                    out.push(Command::SetItemInteraction {
                        item: to_item.id,
                        enabled: false,
                    });
                }
                columns.push(ColumnSwap {
                    from: *from,
                    to: *to,
                    from_item: from_item.id,
                    to_item: to_item.id,
                    to_was_free,
                });
            }
        }

        self.job = Some(Job {
            source,
            target,
            target_cells,
            phase: Phase::Swap { barrier, columns },
            marker: None,
            palette: None,
        });
        Ok(target)
    }

    /// Advances the active consolidation by one frame.
    ///
    /// Returns the finished consolidation once the collapse completed.
    pub fn advance(
        &mut self,
        grid: &GridView,
        services: &mut Services<'_>,
        out: &mut Vec<Command>,
        events: &mut Vec<Event>,
    ) -> Option<Consolidation> {
        let mut job = self.job.take()?;

        let finished = match &mut job.phase {
            Phase::Swap { barrier, columns } => {
                if barrier.poll(&*services.animator) {
                    let columns = std::mem::take(columns);
                    self.finish_swap(&job, &columns, grid, services, out, events);
                    job.phase = Phase::Settle {
                        barrier: self.launch_settle(&job, grid, services),
                    };
                }
                None
            }
            Phase::Settle { barrier } => {
                if barrier.poll(&*services.animator) {
                    self.show_marker(&mut job, grid, services, events);
                    job.phase = self.launch_collapse(&job, grid, services, out);
                }
                None
            }
            Phase::Collapse {
                barrier,
                collapsed,
                snapshot,
            } => barrier
                .poll(&*services.animator)
                .then(|| (std::mem::take(collapsed), std::mem::take(snapshot))),
        };

        let Some((collapsed, snapshot)) = finished else {
            self.job = Some(job);
            return None;
        };

        Some(self.complete(job, collapsed, snapshot, services, out, events))
    }

    fn finish_swap(
        &self,
        job: &Job,
        columns: &[ColumnSwap],
        grid: &GridView,
        services: &mut Services<'_>,
        out: &mut Vec<Command>,
        events: &mut Vec<Event>,
    ) {
        let source = job.source.row();
        let mut moved = 0;
        for column in columns {
            let holds = |cell: CellCoord, item: ItemId| {
                grid.cell(cell)
                    .and_then(|snapshot| snapshot.item)
                    .map_or(false, |snapshot| snapshot.id == item)
            };
            let release = |out: &mut Vec<Command>| {
                if column.to_was_free {
                    out.push(Command::SetItemInteraction {
                        item: column.to_item,
                        enabled: true,
                    });
                }
            };
            if !holds(column.from, column.from_item) || !holds(column.to, column.to_item) {
                warn!(
                    "column {} lost its item mid-swap; leaving it in place",
                    column.from.column()
                );
                out.push(Command::SetItemInteraction {
                    item: column.from_item,
                    enabled: true,
                });
                release(out);
                continue;
            }
            out.push(Command::SwapItems {
                first: column.from,
                second: column.to,
            });
            release(out);
            moved += 1;
        }
        if job.target != source {
            out.push(Command::SetRowConsolidated {
                row: source,
                consolidated: false,
            });
        }
        out.push(Command::SetRowConsolidated {
            row: job.target,
            consolidated: true,
        });
        out.push(Command::SetRowPending {
            row: source,
            pending: false,
        });

        info!(
            "row {source} paired into row {} ({moved} columns moved)",
            job.target
        );
        events.push(Event::RowPaired {
            source,
            target: job.target,
            category: job.source.category(),
        });
        services.effects.trigger(EffectCue::RowPaired);
    }

    fn launch_settle(&self, job: &Job, grid: &GridView, services: &mut Services<'_>) -> JoinBarrier {
        let mut barrier = JoinBarrier::new();
        for cell in &job.target_cells {
            let Some(snapshot) = grid.cell(*cell) else {
                continue;
            };
            let anchor = snapshot.transform;
            let token = services.animator.animate(TweenRequest {
                subject: TweenSubject::Cell(*cell),
                from: Transform {
                    position: anchor.position,
                    scale: anchor.scale * self.config.settle_scale,
                },
                to: anchor,
                duration: self.config.settle_duration,
                easing: Easing::OutBounce,
            });
            barrier.launch([token]);
        }
        barrier
    }

    fn show_marker(
        &mut self,
        job: &mut Job,
        grid: &GridView,
        services: &mut Services<'_>,
        events: &mut Vec<Event>,
    ) {
        let Some((palette, color)) = self.palette.next() else {
            return;
        };
        job.palette = Some(palette);

        let anchor = grid
            .row(job.target)
            .map_or(Vec2::ZERO, |row| row.center());
        let category = job.source.category();
        match services
            .markers
            .create_marker(anchor, palette, color, category)
        {
            Some(marker) => {
                job.marker = Some(marker);
                events.push(Event::MarkerCreated {
                    marker,
                    row: job.target,
                    palette,
                    category,
                });
                services.effects.trigger(EffectCue::MarkerShown);
            }
            None => warn!("marker presenter could not show a marker for row {}", job.target),
        }
    }

    /// Collapses the target row toward its center and tints it.
    ///
    /// Each cell tween keeps the anchor's scale, and items get
    /// `SetItemIdle { idle: false }` so no idle pulse rescales them.
    fn launch_collapse(
        &self,
        job: &Job,
        grid: &GridView,
        services: &mut Services<'_>,
        out: &mut Vec<Command>,
    ) -> Phase {
        let Some(row) = grid.row(job.target) else {
            return Phase::Collapse {
                barrier: JoinBarrier::new(),
                collapsed: Vec::new(),
                snapshot: PositionSnapshot::default(),
            };
        };

        let snapshot = PositionSnapshot::capture(
            row.cells()
                .iter()
                .map(|cell| (cell.coord, cell.transform)),
        );
        let center = row.center();

        let mut barrier = JoinBarrier::new();
        let mut collapsed = Vec::with_capacity(row.cells().len());
        for cell in row.cells() {
            let anchor = cell.transform;
            let x = center.x + (anchor.position.x - center.x) * self.config.collapse_ratio;
            let end = anchor.with_position(Vec2::new(x, anchor.position.y));
            let token = services.animator.animate(TweenRequest {
                subject: TweenSubject::Cell(cell.coord),
                from: anchor,
                to: end,
                duration: self.config.collapse_duration,
                easing: Easing::OutQuad,
            });
            barrier.launch([token]);
            collapsed.push((cell.coord, end));

            if let Some(palette) = job.palette {
                out.push(Command::SetCellTint {
                    cell: cell.coord,
                    tint: Some(palette),
                });
            }
            if let Some(item) = cell.item {
                out.push(Command::SetItemIdle {
                    item: item.id,
                    idle: false,
                });
            }
        }

        Phase::Collapse {
            barrier,
            collapsed,
            snapshot,
        }
    }

    fn complete(
        &mut self,
        job: Job,
        collapsed: Vec<(CellCoord, Transform)>,
        snapshot: PositionSnapshot,
        services: &mut Services<'_>,
        out: &mut Vec<Command>,
        events: &mut Vec<Event>,
    ) -> Consolidation {
        for (cell, transform) in collapsed {
            out.push(Command::SetCellTransform { cell, transform });
        }
        events.push(Event::RowCollapsed { row: job.target });
        services.effects.trigger(EffectCue::RowCollapsed);

        let regenerate = self.supplement_budget > 0;
        if regenerate {
            self.supplement_budget -= 1;
        } else {
            debug!("supplement budget exhausted; row {} stays collapsed", job.target);
        }

        Consolidation {
            source: job.source.row(),
            target: job.target,
            category: job.source.category(),
            marker: job.marker,
            palette: job.palette,
            snapshot,
            regenerate,
        }
    }
}
