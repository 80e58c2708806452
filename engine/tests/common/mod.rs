#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use glam::Vec2;
use rowmatch_core::{
    Animator, Category, EffectCue, Effects, Event, HintPresenter, ItemId, ItemSpawner,
    LevelProgress, MarkerId, MarkerPresenter, PaletteColor, PaletteIndex, Services, TweenRequest,
    TweenToken,
};
use rowmatch_engine::{Engine, EngineConfig, Stage};

pub const FRAME: Duration = Duration::from_millis(16);

/// Finishes every tween once its duration elapsed on the simulated clock.
#[derive(Default)]
pub struct TimedAnimator {
    now: Duration,
    next: u64,
    due: HashMap<TweenToken, Duration>,
    pub requests: Vec<TweenRequest>,
}

impl TimedAnimator {
    pub fn tick(&mut self, dt: Duration) {
        self.now += dt;
    }
}

impl Animator for TimedAnimator {
    fn animate(&mut self, request: TweenRequest) -> TweenToken {
        self.next += 1;
        let token = TweenToken::new(self.next);
        let _ = self.due.insert(token, self.now + request.duration);
        self.requests.push(request);
        token
    }

    fn is_finished(&self, token: TweenToken) -> bool {
        self.due.get(&token).map_or(true, |due| *due <= self.now)
    }
}

/// Hands out scripted rows first, then rows that never match.
#[derive(Default)]
pub struct ScriptedSpawner {
    pub rows: VecDeque<Vec<u16>>,
    pub calls: Vec<(u32, u32, u32)>,
}

impl ScriptedSpawner {
    pub fn new(rows: &[&[u16]]) -> Self {
        Self {
            rows: rows.iter().map(|row| row.to_vec()).collect(),
            calls: Vec::new(),
        }
    }
}

impl ItemSpawner for ScriptedSpawner {
    fn spawn(&mut self, resolved_rows: u32, row: u32, columns: u32) -> Vec<Category> {
        self.calls.push((resolved_rows, row, columns));
        match self.rows.pop_front() {
            Some(categories) => categories.into_iter().map(Category::new).collect(),
            None => (0..columns)
                .map(|column| Category::new(100 + column as u16))
                .collect(),
        }
    }
}

/// Declares victory once the configured number of rows resolved.
#[derive(Default)]
pub struct CountingProgress {
    pub resolved: u32,
    pub checks: u32,
    pub victory_at: Option<u32>,
}

impl LevelProgress for CountingProgress {
    fn notify_row_resolved(&mut self) {
        self.resolved += 1;
    }

    fn check_victory(&mut self) -> bool {
        self.checks += 1;
        self.victory_at.map_or(false, |goal| self.resolved >= goal)
    }
}

#[derive(Default)]
pub struct RecordingMarkers {
    pub created: Vec<(MarkerId, Vec2, Category)>,
    pub destroyed: Vec<MarkerId>,
}

impl MarkerPresenter for RecordingMarkers {
    fn create_marker(
        &mut self,
        anchor: Vec2,
        _palette: PaletteIndex,
        _color: PaletteColor,
        category: Category,
    ) -> Option<MarkerId> {
        let marker = MarkerId::new(self.created.len() as u32 + 1);
        self.created.push((marker, anchor, category));
        Some(marker)
    }

    fn destroy_marker(&mut self, marker: MarkerId) {
        self.destroyed.push(marker);
    }
}

#[derive(Default)]
pub struct RecordingHints {
    pub highlighted: Vec<Category>,
    pub cleared: Vec<Category>,
    pub highlighted_items: Vec<Vec<ItemId>>,
    pub cleared_items: Vec<Vec<ItemId>>,
}

impl HintPresenter for RecordingHints {
    fn highlight_category(&mut self, category: Category) {
        self.highlighted.push(category);
    }

    fn clear_category(&mut self, category: Category) {
        self.cleared.push(category);
    }

    fn highlight_items(&mut self, items: &[ItemId]) {
        self.highlighted_items.push(items.to_vec());
    }

    fn clear_items(&mut self, items: &[ItemId]) {
        self.cleared_items.push(items.to_vec());
    }
}

#[derive(Default)]
pub struct RecordingEffects {
    pub cues: Vec<EffectCue>,
}

impl Effects for RecordingEffects {
    fn trigger(&mut self, cue: EffectCue) {
        self.cues.push(cue);
    }
}

/// Collaborator doubles shared by one engine under test.
#[derive(Default)]
pub struct Harness {
    pub animator: TimedAnimator,
    pub spawner: ScriptedSpawner,
    pub progress: CountingProgress,
    pub markers: RecordingMarkers,
    pub hints: RecordingHints,
    pub effects: RecordingEffects,
}

impl Harness {
    pub fn with_rows(rows: &[&[u16]]) -> Self {
        Self {
            spawner: ScriptedSpawner::new(rows),
            ..Self::default()
        }
    }

    pub fn services(&mut self) -> Services<'_> {
        Services {
            animator: &mut self.animator,
            spawner: &mut self.spawner,
            progress: &mut self.progress,
            markers: &mut self.markers,
            hints: &mut self.hints,
            effects: &mut self.effects,
        }
    }

    /// Advances the clock and the engine by one frame.
    pub fn frame(&mut self, engine: &mut Engine, out: &mut Vec<Event>) {
        self.animator.tick(FRAME);
        engine.advance(FRAME, &mut self.services(), out);
    }

    /// Runs frames until the engine went idle. Returns the number of frames.
    pub fn run_until_idle(&mut self, engine: &mut Engine, out: &mut Vec<Event>) -> usize {
        for frame in 0..2_000 {
            if engine.stage() == Stage::Idle {
                return frame;
            }
            self.frame(engine, out);
        }
        panic!("engine never went idle, stuck in {:?}", engine.stage());
    }
}

pub fn config(columns: u32, rows: u32, budget: u32) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.grid.columns = columns;
    config.grid.rows = rows;
    config.supplement.budget = budget;
    config.timing.inter_row_delay_ms = 50;
    config.timing.display_wait_ms = 100;
    config
}

/// Configures an engine whose grid is filled with `rows`.
pub fn start(config: EngineConfig, rows: &[&[u16]]) -> (Engine, Harness, Vec<Event>) {
    let mut engine = Engine::new(config);
    let mut harness = Harness::with_rows(rows);
    let mut out = Vec::new();
    engine.configure(&mut harness.services(), &mut out);
    (engine, harness, out)
}

pub fn started(events: &[Event]) -> Vec<(u32, u32)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::ConsolidationStarted { source, target } => Some((*source, *target)),
            _ => None,
        })
        .collect()
}

pub fn row_categories(engine: &Engine, row: u32) -> Vec<Option<Category>> {
    engine
        .grid_view()
        .row(row)
        .map(|row| row.cells().iter().map(|cell| cell.category()).collect())
        .unwrap_or_default()
}
