use glam::Vec2;
use rowmatch_core::{Category, CellCoord, Command, GridView, HintPresenter, ItemId};
use rowmatch_system_hint::{Config, HintAdvisor};
use rowmatch_world::{self as world, query, World};

#[derive(Default)]
struct RecordingPresenter {
    shown: Vec<Category>,
    cleared: Vec<Category>,
    highlighted_items: Vec<Vec<ItemId>>,
    cleared_items: Vec<Vec<ItemId>>,
}

impl HintPresenter for RecordingPresenter {
    fn highlight_category(&mut self, category: Category) {
        self.shown.push(category);
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

fn build_world(layout: &[&[u16]]) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureGrid {
            columns: layout[0].len() as u32,
            rows: layout.len() as u32,
            holes: Vec::new(),
            origin: Vec2::ZERO,
            spacing: Vec2::ONE,
        },
        &mut events,
    );
    for (row, categories) in layout.iter().enumerate() {
        for (column, category) in categories.iter().enumerate() {
            world::apply(
                &mut world,
                Command::PlaceItem {
                    cell: CellCoord::new(column as u32, row as u32),
                    category: Category::new(*category),
                },
                &mut events,
            );
        }
    }
    world
}

fn apply(world: &mut World, command: Command) {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
}

fn view(layout: &[&[u16]]) -> GridView {
    query::grid_view(&build_world(layout))
}

#[test]
fn category_needs_exactly_one_row_worth_of_items() {
    let mut advisor = HintAdvisor::new(Config::default());

    let scattered = view(&[&[1, 2, 3, 1], &[2, 1, 3, 4], &[1, 5, 5, 5]]);
    assert_eq!(
        advisor.find_matchable_category(&scattered),
        Some(Category::new(1))
    );

    let surplus = view(&[&[1, 1, 2], &[2, 1, 1]]);
    assert_eq!(advisor.find_matchable_category(&surplus), None);
    assert!(advisor.find_all_matchable_categories(&surplus).is_empty());
}

#[test]
fn consolidated_cells_are_not_counted() {
    let mut world = build_world(&[&[5, 5, 5], &[5, 1, 1], &[5, 5, 2]]);
    let mut advisor = HintAdvisor::new(Config::default());
    assert_eq!(
        advisor.find_matchable_category(&query::grid_view(&world)),
        None
    );

    apply(
        &mut world,
        Command::SetRowConsolidated {
            row: 0,
            consolidated: true,
        },
    );
    assert_eq!(
        advisor.find_matchable_category(&query::grid_view(&world)),
        Some(Category::new(5))
    );
}

#[test]
fn all_matchable_categories_follow_grid_order() {
    let mut advisor = HintAdvisor::new(Config::default());
    let grid = view(&[&[2, 1, 2], &[1, 2, 1]]);
    assert_eq!(
        advisor.find_all_matchable_categories(&grid),
        vec![Category::new(2), Category::new(1)]
    );
}

#[test]
fn keyword_hint_never_repeats_with_two_candidates() {
    let mut advisor = HintAdvisor::new(Config::default());
    let mut presenter = RecordingPresenter::default();
    let grid = view(&[&[1, 2, 1], &[2, 1, 2]]);

    let picks: Vec<Category> = (0..20)
        .map(|_| {
            advisor
                .keyword_hint(&grid, &mut presenter)
                .expect("two candidates")
        })
        .collect();

    for pair in picks.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
    assert_eq!(presenter.shown, picks);
    assert_eq!(presenter.cleared, picks[..19].to_vec());
    assert_eq!(
        advisor.end_keyword_hint(&mut presenter),
        Some(picks[19])
    );
    assert_eq!(advisor.shown_keyword(), None);
}

#[test]
fn single_candidate_may_repeat() {
    let mut advisor = HintAdvisor::new(Config::default());
    let mut presenter = RecordingPresenter::default();
    let grid = view(&[&[3, 3], &[1, 2]]);

    for _ in 0..3 {
        assert_eq!(
            advisor.keyword_hint(&grid, &mut presenter),
            Some(Category::new(3))
        );
    }
}

#[test]
fn keyword_picks_are_reproducible_for_a_seed() {
    let grid = view(&[&[1, 2, 3, 4], &[2, 3, 4, 1], &[3, 4, 1, 2], &[4, 1, 2, 3]]);
    let picks = |seed| {
        let mut advisor = HintAdvisor::new(Config {
            seed,
            ..Config::default()
        });
        let mut presenter = RecordingPresenter::default();
        (0..12)
            .filter_map(|_| advisor.keyword_hint(&grid, &mut presenter))
            .collect::<Vec<_>>()
    };
    assert_eq!(picks(7), picks(7));
}

#[test]
fn ending_an_item_hint_clears_exactly_the_cached_items() {
    let mut world = build_world(&[&[7, 1, 7, 2], &[7, 3, 7, 4]]);
    let mut advisor = HintAdvisor::new(Config::default());
    let mut presenter = RecordingPresenter::default();

    let category = advisor.item_hint(&query::grid_view(&world), &mut presenter);
    assert_eq!(category, Some(Category::new(7)));
    let cached = advisor.cached_items().to_vec();
    assert_eq!(cached.len(), 4);
    assert_eq!(presenter.highlighted_items, vec![cached.clone()]);

    for cell in [CellCoord::new(0, 0), CellCoord::new(2, 1)] {
        apply(&mut world, Command::ClearCell { cell });
    }

    assert!(!advisor.end_item_hint(Category::new(1), &mut presenter));
    assert_eq!(advisor.cached_items(), cached.as_slice());

    assert!(advisor.end_item_hint(Category::new(7), &mut presenter));
    assert_eq!(presenter.cleared_items, vec![cached]);
    assert!(advisor.cached_items().is_empty());
}

#[test]
fn item_hint_respects_the_cache_limit() {
    let grid = view(&[&[7, 1, 7, 2], &[7, 3, 7, 4]]);
    let mut advisor = HintAdvisor::new(Config {
        item_cache_limit: 2,
        ..Config::default()
    });
    let mut presenter = RecordingPresenter::default();

    assert_eq!(
        advisor.item_hint(&grid, &mut presenter),
        Some(Category::new(7))
    );
    assert_eq!(advisor.cached_items().len(), 2);

    let _ = advisor.item_hint(&grid, &mut presenter);
    assert_eq!(presenter.cleared_items.len(), 1, "previous highlight removed");
}
