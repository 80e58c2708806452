#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Regeneration of consolidated rows.
//!
//! A collapsed row is expanded back to its grid slots, stacked onto one
//! column, emptied and refilled with fresh items before the cells spread out
//! again. Every step finishes before the next one starts; the generator moves
//! at most one step per frame.

use std::time::Duration;

use glam::Vec2;
use log::{debug, info, warn};
use rowmatch_core::{
    CellCoord, Command, Easing, EffectCue, Event, GridView, JoinBarrier, MarkerId,
    PositionSnapshot, Progress, Services, Transform, TweenRequest, TweenSubject,
};
use thiserror::Error;

/// Timing and layout knobs for a regeneration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Time the collapsed row and its marker stay on screen.
    pub display_wait: Duration,
    /// Length of the marker shrinking away.
    pub marker_fade_duration: Duration,
    /// Length of the expand back to the grid slots.
    pub expand_duration: Duration,
    /// Length of the gather onto the stack column.
    pub stack_duration: Duration,
    /// Length of the pop-in and settle bounces.
    pub bounce_duration: Duration,
    /// Length of the spread back to the grid slots.
    pub restore_duration: Duration,
    /// Scale fresh items pop in from, relative to the anchor scale.
    pub bounce_scale: f32,
    /// Scale the final settle bounce starts from.
    pub settle_scale: f32,
    /// Column the row gathers onto, counted from one. Clamped to the row.
    pub stack_column: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_wait: Duration::from_millis(600),
            marker_fade_duration: Duration::from_millis(250),
            expand_duration: Duration::from_millis(300),
            stack_duration: Duration::from_millis(250),
            bounce_duration: Duration::from_millis(200),
            restore_duration: Duration::from_millis(300),
            bounce_scale: 0.6,
            settle_scale: 1.1,
            stack_column: 1,
        }
    }
}

/// A consolidated row handed over for regeneration.
#[derive(Debug)]
pub struct Request {
    /// Row to regenerate.
    pub row: u32,
    /// Marker shown for the row.
    pub marker: Option<MarkerId>,
    /// Anchors captured before the row collapsed.
    pub snapshot: PositionSnapshot,
    /// Regenerations left after this one.
    pub remaining_budget: u32,
}

/// Reasons a regeneration cannot start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SupplementError {
    /// Another row is being regenerated.
    #[error("row {active} is still being regenerated")]
    Busy {
        /// Row owned by the generator.
        active: u32,
    },
    /// Nothing was captured for the row, so it cannot be expanded back.
    #[error("row {row} has no captured anchors")]
    EmptySnapshot {
        /// Row that was handed over.
        row: u32,
    },
}

/// Steps of a regeneration in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// Collapsed row stays visible for the display wait.
    WaitDisplay,
    /// Marker shrinks away and is destroyed.
    MarkerDisappear,
    /// Cells return to their pre-collapse anchors.
    Expand,
    /// Cells gather onto the stack column.
    Stack,
    /// Tints are cleared and the row is flagged as stacked.
    Recolor,
    /// Items are destroyed and the cells released.
    ClearItems,
    /// Fresh items are placed.
    Spawn,
    /// Fresh items pop in on the stack.
    BounceRestore,
    /// Cells spread back to their anchors.
    RestorePositions,
    /// Row settles with a bounce.
    SettleBounce,
    /// Completion effects fire.
    Effects,
}

impl Step {
    const fn next(self) -> Option<Self> {
        match self {
            Self::WaitDisplay => Some(Self::MarkerDisappear),
            Self::MarkerDisappear => Some(Self::Expand),
            Self::Expand => Some(Self::Stack),
            Self::Stack => Some(Self::Recolor),
            Self::Recolor => Some(Self::ClearItems),
            Self::ClearItems => Some(Self::Spawn),
            Self::Spawn => Some(Self::BounceRestore),
            Self::BounceRestore => Some(Self::RestorePositions),
            Self::RestorePositions => Some(Self::SettleBounce),
            Self::SettleBounce => Some(Self::Effects),
            Self::Effects => None,
        }
    }
}

#[derive(Debug)]
struct Job {
    row: u32,
    marker: Option<MarkerId>,
    cells: Vec<CellCoord>,
    center: Vec2,
    stack_anchor: Vec2,
    expand: Option<PositionSnapshot>,
    stacked: Option<PositionSnapshot>,
    step: Step,
    barrier: JoinBarrier,
    elapsed: Duration,
}

/// Regenerates one consolidated row at a time.
#[derive(Debug)]
pub struct SupplementGenerator {
    config: Config,
    job: Option<Job>,
}

impl SupplementGenerator {
    /// Creates an idle generator.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config, job: None }
    }

    /// Reports whether a row is being regenerated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.job.is_some()
    }

    /// Row being regenerated, if any.
    #[must_use]
    pub fn active_row(&self) -> Option<u32> {
        self.job.as_ref().map(|job| job.row)
    }

    /// Step the active regeneration is waiting on.
    #[must_use]
    pub fn current_step(&self) -> Option<Step> {
        self.job.as_ref().map(|job| job.step)
    }

    /// Takes ownership of a collapsed row and starts the display wait.
    pub fn begin(
        &mut self,
        request: Request,
        events: &mut Vec<Event>,
    ) -> Result<(), SupplementError> {
        if let Some(job) = &self.job {
            return Err(SupplementError::Busy { active: job.row });
        }
        if request.snapshot.is_empty() {
            return Err(SupplementError::EmptySnapshot { row: request.row });
        }

        let cells: Vec<CellCoord> = request.snapshot.iter().map(|(cell, _)| *cell).collect();
        let positions: Vec<Vec2> = request
            .snapshot
            .iter()
            .map(|(_, transform)| transform.position)
            .collect();
        let center = positions.iter().copied().sum::<Vec2>() / positions.len() as f32;
        let stack_anchor = positions[stack_index(self.config.stack_column, positions.len())];

        debug!(
            "regenerating row {} ({} left afterwards)",
            request.row, request.remaining_budget
        );
        events.push(Event::SupplementStarted {
            row: request.row,
            remaining_budget: request.remaining_budget,
        });
        self.job = Some(Job {
            row: request.row,
            marker: request.marker,
            cells,
            center,
            stack_anchor,
            expand: Some(request.snapshot),
            stacked: None,
            step: Step::WaitDisplay,
            barrier: JoinBarrier::new(),
            elapsed: Duration::ZERO,
        });
        Ok(())
    }

    /// Advances the active regeneration by one frame.
    ///
    /// `resolved_rows` is forwarded to the item spawner.
    pub fn advance(
        &mut self,
        dt: Duration,
        grid: &GridView,
        resolved_rows: u32,
        services: &mut Services<'_>,
        out: &mut Vec<Command>,
        events: &mut Vec<Event>,
    ) -> Progress {
        let Some(mut job) = self.job.take() else {
            return Progress::Done;
        };

        let ready = match job.step {
            Step::WaitDisplay => {
                job.elapsed += dt;
                job.elapsed >= self.config.display_wait
            }
            _ => job.barrier.poll(&*services.animator),
        };
        if !ready {
            self.job = Some(job);
            return Progress::Pending;
        }

        Self::leave(&mut job, services, out);
        let Some(step) = job.step.next() else {
            info!("row {} regenerated", job.row);
            return Progress::Done;
        };
        debug!("row {}: {:?} -> {step:?}", job.row, job.step);
        job.step = step;
        job.barrier = self.enter(&job, grid, resolved_rows, services, out, events);
        self.job = Some(job);
        Progress::Pending
    }

    fn leave(job: &mut Job, services: &mut Services<'_>, out: &mut Vec<Command>) {
        match job.step {
            Step::MarkerDisappear => {
                if let Some(marker) = job.marker.take() {
                    services.markers.destroy_marker(marker);
                }
            }
            Step::Expand => {
                if let Some(snapshot) = job.expand.take() {
                    job.stacked = Some(snapshot.clone());
                    snapshot.restore(out);
                }
            }
            Step::Stack => {
                if let Some(stacked) = &job.stacked {
                    for (cell, anchor) in stacked.iter() {
                        out.push(Command::SetCellTransform {
                            cell: *cell,
                            transform: anchor.with_position(job.stack_anchor),
                        });
                    }
                }
            }
            Step::RestorePositions => {
                if let Some(stacked) = &job.stacked {
                    stacked.clone().restore(out);
                }
                out.push(Command::SetRowStacked {
                    row: job.row,
                    stacked: false,
                });
            }
            _ => {}
        }
    }

    fn enter(
        &self,
        job: &Job,
        grid: &GridView,
        resolved_rows: u32,
        services: &mut Services<'_>,
        out: &mut Vec<Command>,
        events: &mut Vec<Event>,
    ) -> JoinBarrier {
        let mut barrier = JoinBarrier::new();
        let mut tween = |subject, from, to, duration, easing| {
            barrier.launch([services.animator.animate(TweenRequest {
                subject,
                from,
                to,
                duration,
                easing,
            })]);
        };

        match job.step {
            Step::WaitDisplay => {}
            Step::MarkerDisappear => {
                if let Some(marker) = job.marker {
                    let shown = Transform::at(job.center);
                    tween(
                        TweenSubject::Marker(marker),
                        shown,
                        shown.with_uniform_scale(0.0),
                        self.config.marker_fade_duration,
                        Easing::OutQuad,
                    );
                }
            }
            Step::Expand => {
                for (cell, anchor) in job.expand.iter().flat_map(PositionSnapshot::iter) {
                    let from = grid.cell(*cell).map_or(*anchor, |snapshot| snapshot.transform);
                    tween(
                        TweenSubject::Cell(*cell),
                        from,
                        *anchor,
                        self.config.expand_duration,
                        Easing::OutQuad,
                    );
                }
            }
            Step::Stack => {
                for (cell, anchor) in job.stacked.iter().flat_map(PositionSnapshot::iter) {
                    tween(
                        TweenSubject::Cell(*cell),
                        *anchor,
                        anchor.with_position(job.stack_anchor),
                        self.config.stack_duration,
                        Easing::InOutSine,
                    );
                }
            }
            Step::Recolor => {
                for cell in &job.cells {
                    out.push(Command::SetCellTint {
                        cell: *cell,
                        tint: None,
                    });
                }
                out.push(Command::SetRowStacked {
                    row: job.row,
                    stacked: true,
                });
            }
            Step::ClearItems => {
                for cell in &job.cells {
                    out.push(Command::ClearCell { cell: *cell });
                }
            }
            Step::Spawn => {
                let columns = u32::try_from(job.cells.len()).unwrap_or(u32::MAX);
                let categories = services.spawner.spawn(resolved_rows, job.row, columns);
                if categories.len() != job.cells.len() {
                    warn!(
                        "spawner produced {} items for the {} cells of row {}",
                        categories.len(),
                        job.cells.len(),
                        job.row
                    );
                }
                for (cell, category) in job.cells.iter().zip(categories) {
                    out.push(Command::PlaceItem {
                        cell: *cell,
                        category,
                    });
                }
            }
            Step::BounceRestore => {
                for (cell, anchor) in job.stacked.iter().flat_map(PositionSnapshot::iter) {
                    let stacked = anchor.with_position(job.stack_anchor);
                    tween(
                        TweenSubject::Cell(*cell),
                        Transform {
                            position: job.stack_anchor,
                            scale: anchor.scale * self.config.bounce_scale,
                        },
                        stacked,
                        self.config.bounce_duration,
                        Easing::OutBack,
                    );
                }
            }
            Step::RestorePositions => {
                for (cell, anchor) in job.stacked.iter().flat_map(PositionSnapshot::iter) {
                    tween(
                        TweenSubject::Cell(*cell),
                        anchor.with_position(job.stack_anchor),
                        *anchor,
                        self.config.restore_duration,
                        Easing::OutQuad,
                    );
                }
            }
            Step::SettleBounce => {
                for (cell, anchor) in job.stacked.iter().flat_map(PositionSnapshot::iter) {
                    tween(
                        TweenSubject::Cell(*cell),
                        Transform {
                            position: anchor.position,
                            scale: anchor.scale * self.config.settle_scale,
                        },
                        *anchor,
                        self.config.bounce_duration,
                        Easing::OutBounce,
                    );
                }
            }
            Step::Effects => {
                services.effects.trigger(EffectCue::RowRegenerated);
                events.push(Event::RowRegenerated { row: job.row });
            }
        }
        barrier
    }
}

/// Index of the stack cell for a one-based column clamped to the row.
fn stack_index(column: u32, len: usize) -> usize {
    let column = usize::try_from(column).unwrap_or(usize::MAX);
    column.clamp(1, len.max(1)) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_column_is_clamped_to_the_row() {
        assert_eq!(stack_index(0, 4), 0);
        assert_eq!(stack_index(1, 4), 0);
        assert_eq!(stack_index(3, 4), 2);
        assert_eq!(stack_index(9, 4), 3);
    }

    #[test]
    fn steps_run_in_order_and_end_after_effects() {
        let mut step = Step::WaitDisplay;
        let mut visited = vec![step];
        while let Some(next) = step.next() {
            visited.push(next);
            step = next;
        }
        assert_eq!(visited.len(), 11);
        assert_eq!(visited.last(), Some(&Step::Effects));
    }
}
