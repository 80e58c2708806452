//! Narrow contracts through which the core reaches its collaborators.
//!
//! The core never looks collaborators up globally. Every engine entry point
//! receives a [`Services`] bundle borrowing the implementations it may call.

use glam::Vec2;

use crate::{Category, ItemId, MarkerId, PaletteColor, PaletteIndex, TweenRequest, TweenToken};

/// Animation scheduling service that applies transforms over time.
pub trait Animator {
    /// Starts a tween and returns a token that completes once the end
    /// transform was applied.
    fn animate(&mut self, request: TweenRequest) -> TweenToken;

    /// Reports whether the tween behind the token finished.
    fn is_finished(&self, token: TweenToken) -> bool;
}

/// Generates the categories of fresh items for a row.
pub trait ItemSpawner {
    /// Returns one category per column for the provided row.
    ///
    /// `resolved_rows` counts the rows consolidated so far and lets the
    /// spawner scale difficulty and category budgets.
    fn spawn(&mut self, resolved_rows: u32, row: u32, columns: u32) -> Vec<Category>;
}

/// Level-progress collaborator tracking resolved rows and victory.
pub trait LevelProgress {
    /// Records that another row was consolidated.
    fn notify_row_resolved(&mut self);

    /// Evaluates whether the level is won.
    fn check_victory(&mut self) -> bool;
}

/// Creates and destroys collection markers.
pub trait MarkerPresenter {
    /// Shows a marker anchored at the provided position.
    ///
    /// Returns `None` when the presenter lacks the assets to display it.
    fn create_marker(
        &mut self,
        anchor: Vec2,
        palette: PaletteIndex,
        color: PaletteColor,
        category: Category,
    ) -> Option<MarkerId>;

    /// Removes a previously created marker.
    fn destroy_marker(&mut self, marker: MarkerId);
}

/// Hint UI that highlights categories or concrete items.
pub trait HintPresenter {
    /// Highlights the provided category.
    fn highlight_category(&mut self, category: Category);

    /// Removes the highlight for the provided category.
    fn clear_category(&mut self, category: Category);

    /// Highlights exactly the provided items.
    fn highlight_items(&mut self, items: &[ItemId]);

    /// Removes the highlight from exactly the provided items.
    fn clear_items(&mut self, items: &[ItemId]);
}

/// Lifecycle points at which side effects (sound, haptics, analytics) fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectCue {
    /// A uniform row was detected.
    RowMatched,
    /// The items of a matched row reached their target row.
    RowPaired,
    /// A collection marker appeared.
    MarkerShown,
    /// A consolidated row collapsed toward its center.
    RowCollapsed,
    /// A row received fresh items.
    RowRegenerated,
    /// The level was won.
    Victory,
}

/// Fire-and-forget side effects.
pub trait Effects {
    /// Triggers the effect associated with the cue.
    fn trigger(&mut self, cue: EffectCue);
}

/// Collaborators borrowed for the duration of a single engine call.
pub struct Services<'a> {
    /// Animation scheduling service.
    pub animator: &'a mut dyn Animator,
    /// Generator of fresh items.
    pub spawner: &'a mut dyn ItemSpawner,
    /// Level-progress tracker.
    pub progress: &'a mut dyn LevelProgress,
    /// Collection marker presenter.
    pub markers: &'a mut dyn MarkerPresenter,
    /// Hint highlighter.
    pub hints: &'a mut dyn HintPresenter,
    /// Sound, haptics and analytics sink.
    pub effects: &'a mut dyn Effects,
}

impl std::fmt::Debug for Services<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
