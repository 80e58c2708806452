#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-driven orchestration of the row-match systems.
//!
//! The engine owns the world and every system. Callers drive it with player
//! actions and [`Engine::advance`], handing in the collaborators for the
//! duration of each call. Every event produced along the way is appended to
//! the caller's buffer and published to subscribers.

mod config;

use std::time::Duration;

use log::{debug, info, warn};
use rowmatch_core::{
    Category, CellCoord, Command, EffectCue, Event, EventBus, GridView, MatchedRow, Progress,
    Services, SubscriptionId,
};
use rowmatch_system_consolidation::{Consolidation, ConsolidationError, RowConsolidator};
use rowmatch_system_detection::MatchDetector;
use rowmatch_system_hint::HintAdvisor;
use rowmatch_system_queue::ResolutionQueue;
use rowmatch_system_supplement::{Request, SupplementGenerator};
use rowmatch_world::{self as world, query, World};

pub use config::{
    ConfigError, ConsolidationConfig, EngineConfig, GridConfig, HintConfig, SupplementConfig,
    TimingConfig,
};

/// What the engine is busy with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Nothing queued or running.
    Idle,
    /// A row is being consolidated.
    Consolidating {
        /// Row that matched.
        row: u32,
    },
    /// A consolidated row is being regenerated.
    Supplementing {
        /// Row being regenerated.
        row: u32,
    },
    /// Waiting before the next queued row is released.
    Cooldown {
        /// Time left before the queue is drained further.
        remaining: Duration,
    },
}

/// Owns the world and drives detection, consolidation, regeneration and hints.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    world: World,
    detector: MatchDetector,
    queue: ResolutionQueue,
    consolidator: RowConsolidator,
    supplement: SupplementGenerator,
    hints: HintAdvisor,
    bus: EventBus,
    stage: Stage,
    resolved_rows: u32,
    victory: bool,
}

impl Engine {
    /// Creates an engine with an empty default world.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            world: World::new(),
            detector: MatchDetector::new(),
            queue: ResolutionQueue::new(),
            consolidator: RowConsolidator::new(config.consolidation()),
            supplement: SupplementGenerator::new(config.supplement()),
            hints: HintAdvisor::new(config.hint()),
            bus: EventBus::new(),
            stage: Stage::Idle,
            resolved_rows: 0,
            victory: false,
            config,
        }
    }

    /// Builds the configured grid and fills every row through the spawner.
    ///
    /// Resets all progress. Observers stay subscribed.
    pub fn configure(&mut self, services: &mut Services<'_>, out: &mut Vec<Event>) {
        self.queue = ResolutionQueue::new();
        self.consolidator = RowConsolidator::new(self.config.consolidation());
        self.supplement = SupplementGenerator::new(self.config.supplement());
        self.hints = HintAdvisor::new(self.config.hint());
        self.stage = Stage::Idle;
        self.resolved_rows = 0;
        self.victory = false;

        let grid = &self.config.grid;
        let holes = grid.hole_cells();
        let mut commands = vec![Command::ConfigureGrid {
            columns: grid.columns,
            rows: grid.rows,
            holes: holes.clone(),
            origin: grid.origin(),
            spacing: grid.spacing(),
        }];
        for row in 0..grid.rows {
            let cells: Vec<CellCoord> = (0..grid.columns)
                .map(|column| CellCoord::new(column, row))
                .filter(|cell| !holes.contains(cell))
                .collect();
            let columns = u32::try_from(cells.len()).unwrap_or(u32::MAX);
            let categories = services.spawner.spawn(0, row, columns);
            if categories.len() != cells.len() {
                warn!(
                    "spawner produced {} items for the {} cells of row {row}",
                    categories.len(),
                    cells.len()
                );
            }
            commands.extend(
                cells
                    .into_iter()
                    .zip(categories)
                    .map(|(cell, category)| Command::PlaceItem { cell, category }),
            );
        }
        info!("configured a {}x{} grid", grid.columns, grid.rows);
        self.commit(commands, Vec::new(), out);
    }

    /// Applies an external command to the world.
    pub fn apply(&mut self, command: Command, out: &mut Vec<Event>) {
        self.commit(vec![command], Vec::new(), out);
    }

    /// Exchanges two items on behalf of the player and rescans the grid.
    ///
    /// Returns whether the exchange was accepted.
    pub fn player_exchange(
        &mut self,
        first: CellCoord,
        second: CellCoord,
        services: &mut Services<'_>,
        out: &mut Vec<Event>,
    ) -> bool {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::ExchangeItems { first, second },
            &mut events,
        );
        let accepted = events
            .iter()
            .any(|event| matches!(event, Event::ItemsExchanged { .. }));
        self.publish(events, out);
        if accepted {
            let _ = self.scan(services, out);
        }
        accepted
    }

    /// Queues every newly uniform row and starts draining the queue when idle.
    ///
    /// Returns whether any row matched.
    pub fn scan(&mut self, services: &mut Services<'_>, out: &mut Vec<Event>) -> bool {
        let view = query::grid_view(&self.world);
        let mut commands = Vec::new();
        let matched = self.detector.scan(&view, &mut self.queue, &mut commands);

        let mut events = Vec::with_capacity(matched.len());
        for row in &matched {
            events.push(Event::RowMatched {
                row: row.row(),
                category: row.category(),
            });
            services.effects.trigger(EffectCue::RowMatched);
        }
        self.commit(commands, events, out);

        if matched.is_empty() {
            return false;
        }
        if let Some(next) = self.queue.kick() {
            self.release(Some(next), services, out);
        }
        true
    }

    /// Advances the active stage by one frame.
    pub fn advance(&mut self, dt: Duration, services: &mut Services<'_>, out: &mut Vec<Event>) {
        match self.stage {
            Stage::Idle => {}
            Stage::Consolidating { .. } => self.advance_consolidation(services, out),
            Stage::Supplementing { .. } => self.advance_supplement(dt, services, out),
            Stage::Cooldown { remaining } => {
                if dt < remaining {
                    self.stage = Stage::Cooldown {
                        remaining: remaining - dt,
                    };
                    return;
                }
                let next = self.queue.process_next();
                self.release(next, services, out);
                if self.stage == Stage::Idle {
                    let _ = self.scan(services, out);
                }
            }
        }
    }

    /// Starts consolidating the first entry that still qualifies.
    fn release(
        &mut self,
        mut next: Option<MatchedRow>,
        services: &mut Services<'_>,
        out: &mut Vec<Event>,
    ) {
        while let Some(entry) = next {
            let row = entry.row();
            if self.begin(entry, services, out) {
                self.stage = Stage::Consolidating { row };
                return;
            }
            next = self.queue.process_next();
        }
        debug!("resolution queue drained");
        self.stage = Stage::Idle;
    }

    fn begin(&mut self, entry: MatchedRow, services: &mut Services<'_>, out: &mut Vec<Event>) -> bool {
        let view = query::grid_view(&self.world);
        let mut commands = Vec::new();
        let mut events = Vec::new();
        let cells = entry.cells().to_vec();
        match self
            .consolidator
            .begin(entry, &view, services, &mut commands, &mut events)
        {
            Ok(_) => {
                self.commit(commands, events, out);
                true
            }
            Err(ConsolidationError::Stale { row }) => {
                warn!("dropping stale queue entry for row {row}");
                let commands = cells
                    .iter()
                    .filter_map(|cell| view.cell(*cell))
                    .filter(|cell| !cell.consolidated)
                    .filter_map(|cell| cell.item)
                    .map(|item| Command::SetItemInteraction {
                        item: item.id,
                        enabled: true,
                    })
                    .collect();
                self.commit(commands, Vec::new(), out);
                false
            }
            Err(error @ ConsolidationError::Busy { .. }) => {
                warn!("{error}; retrying after the active row");
                false
            }
        }
    }

    fn advance_consolidation(&mut self, services: &mut Services<'_>, out: &mut Vec<Event>) {
        let view = query::grid_view(&self.world);
        let mut commands = Vec::new();
        let mut events = Vec::new();
        let finished = self
            .consolidator
            .advance(&view, services, &mut commands, &mut events);

        let mut ended = Vec::new();
        for event in &events {
            if let Event::RowPaired {
                source,
                target,
                category,
            } = event
            {
                let _ = self.queue.retire_active();
                if source != target {
                    let _ = self.queue.redirect(*target, *source);
                }
                if self.hints.end_item_hint(*category, services.hints) {
                    ended.push(Event::HintEnded {
                        category: *category,
                    });
                }
            }
        }
        events.extend(ended);
        self.commit(commands, events, out);

        if let Some(done) = finished {
            self.finish_consolidation(done, services, out);
        }
    }

    fn finish_consolidation(
        &mut self,
        done: Consolidation,
        services: &mut Services<'_>,
        out: &mut Vec<Event>,
    ) {
        self.resolved_rows += 1;
        services.progress.notify_row_resolved();
        info!(
            "row {} resolved into row {} ({} resolved so far)",
            done.source, done.target, self.resolved_rows
        );

        if done.regenerate {
            let row = done.target;
            let mut events = Vec::new();
            let request = Request {
                row,
                marker: done.marker,
                snapshot: done.snapshot,
                remaining_budget: self.consolidator.supplement_budget(),
            };
            match self.supplement.begin(request, &mut events) {
                Ok(()) => {
                    self.publish(events, out);
                    self.stage = Stage::Supplementing { row };
                    return;
                }
                Err(error) => warn!("row {row} cannot be regenerated: {error}"),
            }
        }

        self.check_victory(services, out);
        self.cooldown();
    }

    fn advance_supplement(
        &mut self,
        dt: Duration,
        services: &mut Services<'_>,
        out: &mut Vec<Event>,
    ) {
        let view = query::grid_view(&self.world);
        let mut commands = Vec::new();
        let mut events = Vec::new();
        let progress = self.supplement.advance(
            dt,
            &view,
            self.resolved_rows,
            services,
            &mut commands,
            &mut events,
        );
        self.commit(commands, events, out);

        if progress == Progress::Done {
            self.check_victory(services, out);
            self.cooldown();
            let _ = self.scan(services, out);
        }
    }

    fn cooldown(&mut self) {
        self.stage = Stage::Cooldown {
            remaining: self.config.inter_row_delay(),
        };
    }

    fn check_victory(&mut self, services: &mut Services<'_>, out: &mut Vec<Event>) {
        if self.victory || !services.progress.check_victory() {
            return;
        }
        self.victory = true;
        info!("victory after {} resolved rows", self.resolved_rows);
        services.effects.trigger(EffectCue::Victory);
        self.publish(vec![Event::VictoryDeclared], out);
    }

    /// Highlights a random matchable category.
    pub fn keyword_hint(
        &mut self,
        services: &mut Services<'_>,
        out: &mut Vec<Event>,
    ) -> Option<Category> {
        let view = query::grid_view(&self.world);
        let previous = self.hints.shown_keyword();
        let category = self.hints.keyword_hint(&view, services.hints)?;
        let mut events = Vec::new();
        if let Some(previous) = previous {
            events.push(Event::HintEnded { category: previous });
        }
        events.push(Event::HintShown { category });
        self.publish(events, out);
        Some(category)
    }

    /// Removes the keyword highlight.
    pub fn end_keyword_hint(
        &mut self,
        services: &mut Services<'_>,
        out: &mut Vec<Event>,
    ) -> Option<Category> {
        let category = self.hints.end_keyword_hint(services.hints)?;
        self.publish(vec![Event::HintEnded { category }], out);
        Some(category)
    }

    /// Highlights concrete items of a matchable category.
    pub fn item_hint(
        &mut self,
        services: &mut Services<'_>,
        out: &mut Vec<Event>,
    ) -> Option<Category> {
        let view = query::grid_view(&self.world);
        let category = self.hints.item_hint(&view, services.hints)?;
        self.publish(vec![Event::HintShown { category }], out);
        Some(category)
    }

    /// Removes the item highlight for `category`, if it is the one shown.
    pub fn end_item_hint(
        &mut self,
        category: Category,
        services: &mut Services<'_>,
        out: &mut Vec<Event>,
    ) -> bool {
        let ended = self.hints.end_item_hint(category, services.hints);
        if ended {
            self.publish(vec![Event::HintEnded { category }], out);
        }
        ended
    }

    /// First category that can currently complete a row.
    pub fn find_matchable_category(&mut self) -> Option<Category> {
        let view = query::grid_view(&self.world);
        self.hints.find_matchable_category(&view)
    }

    /// Every category that can currently complete a row.
    pub fn find_all_matchable_categories(&mut self) -> Vec<Category> {
        let view = query::grid_view(&self.world);
        self.hints.find_all_matchable_categories(&view)
    }

    /// Registers an observer for every event the engine publishes.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        self.bus.subscribe(observer)
    }

    /// Removes an observer. Returns `false` for unknown handles.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Read-only access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Snapshot of the grid.
    #[must_use]
    pub fn grid_view(&self) -> GridView {
        query::grid_view(&self.world)
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Rows consolidated since the grid was configured.
    #[must_use]
    pub fn resolved_rows(&self) -> u32 {
        self.resolved_rows
    }

    /// Number of matched rows waiting behind the active one.
    #[must_use]
    pub fn queued_rows(&self) -> usize {
        self.queue.len()
    }

    /// Regenerations left.
    #[must_use]
    pub fn supplement_budget(&self) -> u32 {
        self.consolidator.supplement_budget()
    }

    /// Reports whether victory was declared.
    #[must_use]
    pub fn victory_declared(&self) -> bool {
        self.victory
    }

    fn commit(&mut self, commands: Vec<Command>, mut events: Vec<Event>, out: &mut Vec<Event>) {
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.publish(events, out);
    }

    fn publish(&mut self, events: Vec<Event>, out: &mut Vec<Event>) {
        for event in events {
            self.bus.publish(&event);
            out.push(event);
        }
    }
}
