use rowmatch_core::{Category, CellCoord, MatchedRow};
use rowmatch_system_queue::ResolutionQueue;

fn matched(row: u32, category: u16) -> MatchedRow {
    MatchedRow::new(
        row,
        Category::new(category),
        (0..4).map(|column| CellCoord::new(column, row)).collect(),
    )
}

fn drain(queue: &mut ResolutionQueue) -> Vec<u32> {
    let mut order = Vec::new();
    let mut next = queue.kick();
    while let Some(entry) = next {
        order.push(entry.row());
        next = queue.process_next();
    }
    order
}

#[test]
fn rows_are_released_in_arrival_order() {
    let mut queue = ResolutionQueue::new();
    for row in [4, 1, 3] {
        queue.enqueue(matched(row, 2));
    }

    assert_eq!(drain(&mut queue), vec![4, 1, 3]);
    assert!(queue.is_empty());
    assert!(!queue.is_processing());
}

#[test]
fn rows_enqueued_while_processing_wait_their_turn() {
    let mut queue = ResolutionQueue::new();
    queue.enqueue(matched(0, 1));

    let first = queue.kick().expect("row 0 released");
    assert_eq!(first.row(), 0);
    assert_eq!(queue.active(), Some(0));

    queue.enqueue(matched(2, 5));
    assert!(queue.kick().is_none());
    assert!(queue.is_tracked(2));

    let second = queue.process_next().expect("row 2 released");
    assert_eq!((second.row(), second.category()), (2, Category::new(5)));
    assert!(!queue.is_tracked(0));
    assert!(queue.process_next().is_none());
    assert_eq!(queue.active(), None);
}

#[test]
fn redirected_entries_keep_their_place_in_line() {
    let mut queue = ResolutionQueue::new();
    queue.enqueue(matched(1, 1));
    queue.enqueue(matched(3, 2));
    queue.enqueue(matched(5, 3));

    assert!(queue.redirect(3, 0));
    assert!(!queue.is_tracked(3));
    assert!(queue.is_tracked(0));

    let categories: Vec<(u32, Category)> = queue
        .iter()
        .map(|entry| (entry.row(), entry.category()))
        .collect();
    assert_eq!(
        categories,
        vec![
            (1, Category::new(1)),
            (0, Category::new(2)),
            (5, Category::new(3)),
        ]
    );
    assert_eq!(drain(&mut queue), vec![1, 0, 5]);
}
