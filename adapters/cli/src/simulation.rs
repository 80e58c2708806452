//! Drives the engine with random player exchanges.

use std::fmt;
use std::time::Duration;

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rowmatch_core::{CellCoord, EffectCue, Event};
use rowmatch_engine::{Engine, EngineConfig, Stage};

use crate::collaborators::{Collaborators, SeededSpawner};

/// Length of one simulated frame.
pub(crate) const FRAME: Duration = Duration::from_millis(16);

/// Frames played between two player exchanges.
const FRAMES_PER_MOVE: u32 = 6;

/// Inputs of one simulated session.
#[derive(Clone, Debug)]
pub(crate) struct Settings {
    pub(crate) seed: u64,
    pub(crate) moves: u32,
    pub(crate) max_frames: u32,
}

/// Outcome of a simulated session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) moves: u32,
    pub(crate) accepted: u32,
    pub(crate) rejected: u32,
    pub(crate) rows_resolved: u32,
    pub(crate) rows_regenerated: usize,
    pub(crate) hints_shown: usize,
    pub(crate) markers_left: usize,
    pub(crate) victory: bool,
    pub(crate) frames: u32,
    pub(crate) settled: bool,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "moves: {} ({} accepted, {} rejected)",
            self.moves, self.accepted, self.rejected
        )?;
        writeln!(
            f,
            "rows resolved: {}, regenerated: {}",
            self.rows_resolved, self.rows_regenerated
        )?;
        writeln!(
            f,
            "hints shown: {}, markers on screen: {}",
            self.hints_shown, self.markers_left
        )?;
        write!(
            f,
            "frames: {}{}, victory: {}",
            self.frames,
            if self.settled { "" } else { " (frame budget hit)" },
            if self.victory { "yes" } else { "no" }
        )
    }
}

/// Headless session: the engine, its collaborators and a random player.
#[derive(Debug)]
pub(crate) struct Simulation {
    engine: Engine,
    collaborators: Collaborators,
    player: ChaCha8Rng,
    events: Vec<Event>,
    frames: u32,
}

impl Simulation {
    pub(crate) fn new(config: EngineConfig, seed: u64) -> Self {
        let columns = u16::try_from(config.grid.columns).unwrap_or(u16::MAX);
        let goal = config.grid.rows;
        let spawner = SeededSpawner::new(
            seed,
            columns.saturating_sub(1).max(2),
            columns.saturating_add(2),
        );
        let mut collaborators = Collaborators::new(spawner, goal);
        let mut engine = Engine::new(config);
        let mut events = Vec::new();
        engine.configure(&mut collaborators.services(), &mut events);
        Self {
            engine,
            collaborators,
            player: ChaCha8Rng::seed_from_u64(seed.rotate_left(32) ^ 0x9e37_79b9),
            events,
            frames: 0,
        }
    }

    /// Plays the session and reports what happened.
    pub(crate) fn run(mut self, settings: &Settings) -> Summary {
        let mut summary = Summary::default();
        let _ = self.engine.scan(&mut self.collaborators.services(), &mut self.events);

        for _ in 0..settings.moves {
            if self.engine.victory_declared() || self.frames >= settings.max_frames {
                break;
            }
            let Some((first, second)) = self.pick_exchange() else {
                log::info!("no exchangeable pair left after {} moves", summary.moves);
                break;
            };
            if summary.moves % 4 == 0 {
                let _ = self
                    .engine
                    .keyword_hint(&mut self.collaborators.services(), &mut self.events);
            }
            summary.moves += 1;
            if self.engine.player_exchange(
                first,
                second,
                &mut self.collaborators.services(),
                &mut self.events,
            ) {
                summary.accepted += 1;
            } else {
                summary.rejected += 1;
            }
            for _ in 0..FRAMES_PER_MOVE {
                if !self.frame(settings.max_frames) {
                    break;
                }
            }
        }

        summary.settled = self.settle(settings.max_frames);
        let _ = self
            .engine
            .end_keyword_hint(&mut self.collaborators.services(), &mut self.events);

        summary.rows_resolved = self.engine.resolved_rows();
        summary.rows_regenerated = self
            .events
            .iter()
            .filter(|event| matches!(event, Event::RowRegenerated { .. }))
            .count();
        summary.hints_shown = self.collaborators.hints.shown();
        summary.markers_left = self.collaborators.markers.live();
        summary.victory = self.engine.victory_declared();
        summary.frames = self.frames;

        log::info!(
            "session finished: {} rows resolved, {} progress notifications, {} victory cues",
            summary.rows_resolved,
            self.collaborators.progress.resolved(),
            self.collaborators.effects.count(EffectCue::Victory)
        );
        if self.collaborators.hints.highlighted() > 0 {
            log::warn!(
                "{} highlights still visible at shutdown",
                self.collaborators.hints.highlighted()
            );
        }
        summary
    }

    /// Picks two distinct cells whose items the player may exchange.
    fn pick_exchange(&mut self) -> Option<(CellCoord, CellCoord)> {
        let view = self.engine.grid_view();
        let movable: Vec<CellCoord> = view
            .all_cells()
            .iter()
            .filter(|cell| !cell.consolidated)
            .filter(|cell| cell.item.is_some_and(|item| item.exchangeable))
            .map(|cell| cell.coord)
            .collect();
        let mut pair = movable.choose_multiple(&mut self.player, 2).copied();
        Some((pair.next()?, pair.next()?))
    }

    /// Plays one frame unless the budget is spent. Returns whether it ran.
    fn frame(&mut self, max_frames: u32) -> bool {
        if self.frames >= max_frames {
            return false;
        }
        self.frames += 1;
        self.collaborators.animator.tick(FRAME);
        self.engine
            .advance(FRAME, &mut self.collaborators.services(), &mut self.events);
        true
    }

    /// Plays frames until the engine idles. Returns false when the budget ran out.
    fn settle(&mut self, max_frames: u32) -> bool {
        while self.engine.stage() != Stage::Idle {
            if !self.frame(max_frames) {
                log::warn!(
                    "frame budget exhausted in {:?} with {} tweens running",
                    self.engine.stage(),
                    self.collaborators.animator.running()
                );
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(seed: u64) -> Settings {
        Settings {
            seed,
            moves: 60,
            max_frames: 5_000,
        }
    }

    fn session(seed: u64) -> Summary {
        let mut config = EngineConfig::default();
        config.grid.columns = 3;
        config.grid.rows = 5;
        config.supplement.budget = 2;
        let settings = settings(seed);
        Simulation::new(config, settings.seed).run(&settings)
    }

    #[test]
    fn identical_seeds_replay_identically() {
        assert_eq!(session(9), session(9));
    }

    #[test]
    fn sessions_account_for_every_move() {
        let summary = session(4);

        assert!(summary.moves <= 60);
        assert_eq!(summary.accepted + summary.rejected, summary.moves);
        assert!(summary.rows_regenerated <= 2);
        assert!(summary.frames <= 5_000);
    }

    #[test]
    fn frame_budget_caps_the_session() {
        let config = EngineConfig::default();
        let settings = Settings {
            seed: 1,
            moves: 500,
            max_frames: 12,
        };

        let summary = Simulation::new(config, settings.seed).run(&settings);

        assert!(summary.frames <= 12);
        assert!(summary.moves <= 3);
    }

    #[test]
    fn zero_moves_only_settle_the_opening_grid() {
        let settings = Settings {
            seed: 2,
            moves: 0,
            max_frames: 5_000,
        };

        let summary = Simulation::new(EngineConfig::default(), settings.seed).run(&settings);

        assert_eq!(summary.moves, 0);
        assert!(summary.settled);
        assert!(summary.to_string().contains("moves: 0 (0 accepted, 0 rejected)"));
    }
}
