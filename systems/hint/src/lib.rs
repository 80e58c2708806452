#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Read-only hint queries over the grid.
//!
//! A category is matchable when the unconsolidated items of that category add
//! up to exactly one row's worth, wherever they sit on the grid.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rowmatch_core::{Category, GridView, HintPresenter, ItemId};

/// Hint tuning.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of items highlighted by an item hint.
    pub item_cache_limit: usize,
    /// Seed of the keyword picker.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            item_cache_limit: 4,
            seed: 0x5eed,
        }
    }
}

#[derive(Debug)]
struct ItemHint {
    category: Category,
    items: Vec<ItemId>,
}

/// Answers which categories can currently complete a row and drives the hint
/// presenter.
#[derive(Debug)]
pub struct HintAdvisor {
    config: Config,
    rng: ChaCha8Rng,
    tallies: Vec<(Category, usize)>,
    last_keyword: Option<Category>,
    shown_keyword: Option<Category>,
    item_hint: Option<ItemHint>,
}

impl HintAdvisor {
    /// Creates an advisor with an empty hint history.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            tallies: Vec::new(),
            last_keyword: None,
            shown_keyword: None,
            item_hint: None,
        }
    }

    /// First matchable category in grid order.
    pub fn find_matchable_category(&mut self, grid: &GridView) -> Option<Category> {
        self.find_all_matchable_categories(grid).into_iter().next()
    }

    /// Every matchable category in order of first appearance.
    pub fn find_all_matchable_categories(&mut self, grid: &GridView) -> Vec<Category> {
        self.rebuild_tallies(grid);
        let capacity = grid.row_capacity();
        self.tallies
            .iter()
            .filter(|(_, count)| *count == capacity)
            .map(|(category, _)| *category)
            .collect()
    }

    fn rebuild_tallies(&mut self, grid: &GridView) {
        self.tallies.clear();
        for cell in grid.all_cells() {
            if cell.consolidated {
                continue;
            }
            let Some(category) = cell.category() else {
                continue;
            };
            match self.tallies.iter_mut().find(|(seen, _)| *seen == category) {
                Some((_, count)) => *count += 1,
                None => self.tallies.push((category, 1)),
            }
        }
    }

    /// Highlights a random matchable category.
    ///
    /// The previous keyword is skipped whenever another candidate exists.
    pub fn keyword_hint(
        &mut self,
        grid: &GridView,
        presenter: &mut dyn HintPresenter,
    ) -> Option<Category> {
        let mut candidates = self.find_all_matchable_categories(grid);
        if candidates.len() > 1 {
            if let Some(previous) = self.last_keyword {
                candidates.retain(|category| *category != previous);
            }
        }
        if candidates.is_empty() {
            debug!("no matchable category to hint");
            return None;
        }

        let picked = candidates[self.rng.gen_range(0..candidates.len())];
        if let Some(shown) = self.shown_keyword.take() {
            presenter.clear_category(shown);
        }
        presenter.highlight_category(picked);
        self.last_keyword = Some(picked);
        self.shown_keyword = Some(picked);
        Some(picked)
    }

    /// Removes the highlighted keyword, returning it.
    pub fn end_keyword_hint(&mut self, presenter: &mut dyn HintPresenter) -> Option<Category> {
        let shown = self.shown_keyword.take()?;
        presenter.clear_category(shown);
        Some(shown)
    }

    /// Highlights up to `item_cache_limit` items of the first matchable
    /// category and remembers exactly which ones were highlighted.
    pub fn item_hint(
        &mut self,
        grid: &GridView,
        presenter: &mut dyn HintPresenter,
    ) -> Option<Category> {
        if let Some(previous) = self.item_hint.take() {
            presenter.clear_items(&previous.items);
        }

        let category = self.find_matchable_category(grid)?;
        let items: Vec<ItemId> = grid
            .all_cells()
            .iter()
            .filter(|cell| !cell.consolidated)
            .filter_map(|cell| cell.item)
            .filter(|item| item.category == category)
            .map(|item| item.id)
            .take(self.config.item_cache_limit)
            .collect();

        presenter.highlight_items(&items);
        debug!("highlighting {} items of {category:?}", items.len());
        self.item_hint = Some(ItemHint { category, items });
        Some(category)
    }

    /// Removes the item highlight if it belongs to `category`.
    ///
    /// Clears exactly the cached items, whatever happened to them since.
    pub fn end_item_hint(
        &mut self,
        category: Category,
        presenter: &mut dyn HintPresenter,
    ) -> bool {
        match self.item_hint.take() {
            Some(hint) if hint.category == category => {
                presenter.clear_items(&hint.items);
                true
            }
            other => {
                self.item_hint = other;
                false
            }
        }
    }

    /// Items highlighted by the active item hint.
    #[must_use]
    pub fn cached_items(&self) -> &[ItemId] {
        self.item_hint
            .as_ref()
            .map(|hint| hint.items.as_slice())
            .unwrap_or_default()
    }

    /// Category of the active keyword hint.
    #[must_use]
    pub fn shown_keyword(&self) -> Option<Category> {
        self.shown_keyword
    }
}
