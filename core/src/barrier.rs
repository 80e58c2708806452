//! Count-based join over groups of tweens launched together.

use crate::{Animator, TweenToken};

/// Joins a set of concurrently launched tween groups.
///
/// Each call to [`JoinBarrier::launch`] registers one task (a column swap, a
/// cell bounce, ...) made of one or more tweens. The barrier releases once the
/// number of completed tasks equals the number launched. Per-task timing is
/// never assumed to be uniform, so completion order is irrelevant.
#[derive(Clone, Debug, Default)]
pub struct JoinBarrier {
    pending: Vec<Vec<TweenToken>>,
    launched: usize,
    completed: usize,
}

impl JoinBarrier {
    /// Creates an empty barrier that is already released.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task composed of the provided tweens.
    pub fn launch<I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = TweenToken>,
    {
        self.pending.push(tokens.into_iter().collect());
        self.launched += 1;
    }

    /// Number of tasks registered with the barrier.
    #[must_use]
    pub const fn launched(&self) -> usize {
        self.launched
    }

    /// Number of tasks whose tweens all finished.
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.completed
    }

    /// Reports whether every launched task completed.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.completed == self.launched
    }

    /// Collects completion signals from the animation service.
    ///
    /// Returns `true` once the barrier is released.
    pub fn poll(&mut self, animator: &dyn Animator) -> bool {
        let completed = &mut self.completed;
        self.pending.retain(|tokens| {
            let finished = tokens.iter().all(|token| animator.is_finished(*token));
            if finished {
                *completed += 1;
            }
            !finished
        });
        self.is_released()
    }
}
