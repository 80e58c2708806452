//! Headless stand-ins for the presentation collaborators.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rowmatch_core::{
    Animator, Category, EffectCue, Effects, HintPresenter, ItemId, ItemSpawner, LevelProgress,
    MarkerId, MarkerPresenter, PaletteColor, PaletteIndex, Services, TweenRequest, TweenToken,
};

/// Completes tweens once their duration elapsed on a simulated clock.
#[derive(Debug, Default)]
pub(crate) struct ClockAnimator {
    now: Duration,
    next: u64,
    due: HashMap<TweenToken, Duration>,
}

impl ClockAnimator {
    pub(crate) fn tick(&mut self, dt: Duration) {
        self.now += dt;
        let now = self.now;
        self.due.retain(|_, due| *due > now);
    }

    /// Number of tweens still running.
    pub(crate) fn running(&self) -> usize {
        self.due.len()
    }
}

impl Animator for ClockAnimator {
    fn animate(&mut self, request: TweenRequest) -> TweenToken {
        self.next += 1;
        let token = TweenToken::new(self.next);
        if !request.duration.is_zero() {
            let _ = self.due.insert(token, self.now + request.duration);
        }
        token
    }

    fn is_finished(&self, token: TweenToken) -> bool {
        !self.due.contains_key(&token)
    }
}

/// Draws row categories from a seeded generator.
///
/// The category range widens as rows resolve so later rows match less often.
#[derive(Debug)]
pub(crate) struct SeededSpawner {
    rng: ChaCha8Rng,
    base_categories: u16,
    max_categories: u16,
}

impl SeededSpawner {
    pub(crate) fn new(seed: u64, base_categories: u16, max_categories: u16) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            base_categories: base_categories.max(1),
            max_categories: max_categories.max(base_categories.max(1)),
        }
    }

    fn categories_for(&self, resolved_rows: u32) -> u16 {
        let widened = u32::from(self.base_categories) + resolved_rows / 2;
        u16::try_from(widened)
            .unwrap_or(u16::MAX)
            .min(self.max_categories)
    }
}

impl ItemSpawner for SeededSpawner {
    fn spawn(&mut self, resolved_rows: u32, _row: u32, columns: u32) -> Vec<Category> {
        let span = self.categories_for(resolved_rows);
        (0..columns)
            .map(|_| Category::new(self.rng.gen_range(0..span)))
            .collect()
    }
}

/// Wins the level after a fixed number of resolved rows.
#[derive(Debug)]
pub(crate) struct GoalProgress {
    resolved: u32,
    goal: u32,
}

impl GoalProgress {
    pub(crate) fn new(goal: u32) -> Self {
        Self { resolved: 0, goal }
    }

    pub(crate) fn resolved(&self) -> u32 {
        self.resolved
    }
}

impl LevelProgress for GoalProgress {
    fn notify_row_resolved(&mut self) {
        self.resolved += 1;
    }

    fn check_victory(&mut self) -> bool {
        self.resolved >= self.goal
    }
}

/// Tracks which markers are on screen.
#[derive(Debug, Default)]
pub(crate) struct CountingMarkers {
    next: u32,
    live: BTreeSet<MarkerId>,
}

impl CountingMarkers {
    pub(crate) fn live(&self) -> usize {
        self.live.len()
    }
}

impl MarkerPresenter for CountingMarkers {
    fn create_marker(
        &mut self,
        anchor: Vec2,
        palette: PaletteIndex,
        _color: PaletteColor,
        category: Category,
    ) -> Option<MarkerId> {
        self.next += 1;
        let marker = MarkerId::new(self.next);
        log::debug!(
            "marker {} for category {} at {anchor} using palette entry {}",
            marker.get(),
            category.get(),
            palette.get()
        );
        let _ = self.live.insert(marker);
        Some(marker)
    }

    fn destroy_marker(&mut self, marker: MarkerId) {
        if !self.live.remove(&marker) {
            log::warn!("marker {} destroyed twice", marker.get());
        }
    }
}

/// Keeps the currently highlighted categories and items.
#[derive(Debug, Default)]
pub(crate) struct CountingHints {
    categories: BTreeSet<Category>,
    items: BTreeSet<ItemId>,
    shown: usize,
}

impl CountingHints {
    pub(crate) fn shown(&self) -> usize {
        self.shown
    }

    pub(crate) fn highlighted(&self) -> usize {
        self.categories.len() + self.items.len()
    }
}

impl HintPresenter for CountingHints {
    fn highlight_category(&mut self, category: Category) {
        self.shown += 1;
        let _ = self.categories.insert(category);
    }

    fn clear_category(&mut self, category: Category) {
        let _ = self.categories.remove(&category);
    }

    fn highlight_items(&mut self, items: &[ItemId]) {
        self.shown += 1;
        self.items.extend(items.iter().copied());
    }

    fn clear_items(&mut self, items: &[ItemId]) {
        for item in items {
            let _ = self.items.remove(item);
        }
    }
}

/// Counts how often each effect fired.
#[derive(Debug, Default)]
pub(crate) struct CountingEffects {
    counts: HashMap<EffectCue, usize>,
}

impl CountingEffects {
    pub(crate) fn count(&self, cue: EffectCue) -> usize {
        self.counts.get(&cue).copied().unwrap_or(0)
    }
}

impl Effects for CountingEffects {
    fn trigger(&mut self, cue: EffectCue) {
        *self.counts.entry(cue).or_insert(0) += 1;
    }
}

/// Every collaborator the engine needs, owned by the simulation.
#[derive(Debug)]
pub(crate) struct Collaborators {
    pub(crate) animator: ClockAnimator,
    pub(crate) spawner: SeededSpawner,
    pub(crate) progress: GoalProgress,
    pub(crate) markers: CountingMarkers,
    pub(crate) hints: CountingHints,
    pub(crate) effects: CountingEffects,
}

impl Collaborators {
    pub(crate) fn new(spawner: SeededSpawner, goal: u32) -> Self {
        Self {
            animator: ClockAnimator::default(),
            spawner,
            progress: GoalProgress::new(goal),
            markers: CountingMarkers::default(),
            hints: CountingHints::default(),
            effects: CountingEffects::default(),
        }
    }

    pub(crate) fn services(&mut self) -> Services<'_> {
        Services {
            animator: &mut self.animator,
            spawner: &mut self.spawner,
            progress: &mut self.progress,
            markers: &mut self.markers,
            hints: &mut self.hints,
            effects: &mut self.effects,
        }
    }
}
