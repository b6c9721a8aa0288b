//! Drag-and-drop position math for tasks (per column) and columns (board-wide).
//!
//! Everything here is pure: callers hand in the current group and get back the new
//! one plus the items whose position changed. Persisting is the caller's job.

use crate::domain::{Column, Task};

use super::normalizer::compare_position;

/// Something with a stable id and a position inside its group.
pub trait Ordered: Clone {
    fn key(&self) -> &str;
    fn position(&self) -> Option<i64>;
    fn set_position(&mut self, position: i64);
}

impl Ordered for Task {
    fn key(&self) -> &str {
        &self.id
    }

    fn position(&self) -> Option<i64> {
        self.order
    }

    fn set_position(&mut self, position: i64) {
        self.order = Some(position);
    }
}

impl Ordered for Column {
    fn key(&self) -> &str {
        &self.id
    }

    fn position(&self) -> Option<i64> {
        Some(self.order)
    }

    fn set_position(&mut self, position: i64) {
        self.order = position;
    }
}

/// Result of a within-group move.
#[derive(Debug, Clone)]
pub struct Reordered<T> {
    /// The whole group in its new order, positions `0..n`.
    pub group: Vec<T>,
    /// Items of `group` whose position differs from before the move.
    pub changed: Vec<T>,
}

/// The tasks of one column, sorted by position.
pub fn column_group(tasks: &[Task], column_id: &str) -> Vec<Task> {
    let mut group: Vec<Task> = tasks
        .iter()
        .filter(|t| t.column_id == column_id)
        .cloned()
        .collect();
    group.sort_by(compare_position);
    group
}

/// Moves `dragged` to `to_index` and renumbers the group. `None` when the item is
/// not in the group or the index is out of range.
pub fn move_to_index<T: Ordered>(group: &[T], dragged: &str, to_index: usize) -> Option<Reordered<T>> {
    let from = group.iter().position(|item| item.key() == dragged)?;
    if to_index >= group.len() {
        return None;
    }

    let mut next = group.to_vec();
    let item = next.remove(from);
    next.insert(to_index, item);

    for (index, item) in next.iter_mut().enumerate() {
        item.set_position(index as i64);
    }

    let changed = changed(group, &next);
    Some(Reordered { group: next, changed })
}

/// Moves `dragged` into the slot currently held by `target`. `None` when the ids
/// match or either one is not in the group.
pub fn move_onto<T: Ordered>(group: &[T], dragged: &str, target: &str) -> Option<Reordered<T>> {
    if dragged == target {
        return None;
    }
    let to_index = group.iter().position(|item| item.key() == target)?;
    move_to_index(group, dragged, to_index)
}

/// Items of `after` whose position differs from the same id in `before`.
pub fn changed<T: Ordered>(before: &[T], after: &[T]) -> Vec<T> {
    after
        .iter()
        .filter(|item| {
            before
                .iter()
                .find(|old| old.key() == item.key())
                .map_or(true, |old| old.position() != item.position())
        })
        .cloned()
        .collect()
}

/// Position one past the highest in `items`, or 0 when none has one. `None` once the
/// highest position is `i64::MAX`.
pub fn next_position<'a, T: Ordered + 'a>(items: impl IntoIterator<Item = &'a T>) -> Option<i64> {
    match items.into_iter().filter_map(|item| item.position()).max() {
        Some(max) => max.checked_add(1),
        None => Some(0),
    }
}

/// Position one past the last task in `column_id`, or 0 for an empty column.
pub fn next_order(tasks: &[Task], column_id: &str) -> Option<i64> {
    next_position(tasks.iter().filter(|t| t.column_id == column_id))
}

/// Moves a task to the end of another column. Returns the updated task, or `None`
/// when the task is unknown, already in that column, or the column has no free
/// position left.
pub fn move_across(tasks: &[Task], task_id: &str, target_column: &str) -> Option<Task> {
    let task = tasks.iter().find(|t| t.id == task_id)?;
    if task.column_id == target_column {
        return None;
    }

    let mut moved = task.clone();
    moved.order = Some(next_order(tasks, target_column)?);
    moved.column_id = target_column.to_string();
    Some(moved)
}

/// Replaces items of `items` by id with their counterpart in `updated`.
pub fn splice<T: Ordered>(items: &[T], updated: &[T]) -> Vec<T> {
    items
        .iter()
        .map(|item| {
            updated
                .iter()
                .find(|u| u.key() == item.key())
                .unwrap_or(item)
                .clone()
        })
        .collect()
}
