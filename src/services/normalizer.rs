//! Repairs per-column task ordering on every load.
//!
//! Tasks are grouped by column, sorted by their stored order (tasks without one go
//! last, by creation time), and renumbered `0..n`. The tasks whose stored order
//! changed are returned separately so the caller can write them back.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::Task;

#[derive(Debug, Default)]
pub struct Normalized {
    /// All tasks, grouped by column in first-seen column order, each group densely ordered.
    pub tasks: Vec<Task>,
    /// Copies of the tasks whose `order` differs from what was loaded.
    pub changed: Vec<Task>,
}

/// Position comparator: explicit order first, then creation time, then id so the
/// result is total and stable across runs.
pub fn compare_position(a: &Task, b: &Task) -> Ordering {
    let by_order = match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_order
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn normalize_task_order(tasks: Vec<Task>) -> Normalized {
    let mut groups: Vec<Vec<Task>> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for task in tasks {
        let slot = match slots.get(&task.column_id) {
            Some(&slot) => slot,
            None => {
                groups.push(Vec::new());
                slots.insert(task.column_id.clone(), groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[slot].push(task);
    }

    let mut normalized = Normalized::default();
    for mut group in groups {
        group.sort_by(compare_position);

        for (index, mut task) in group.into_iter().enumerate() {
            let order = index as i64;
            if task.order != Some(order) {
                task.order = Some(order);
                normalized.changed.push(task.clone());
            }
            normalized.tasks.push(task);
        }
    }

    normalized
}

/// True when every column's orders are exactly `0..n`.
pub fn is_dense(tasks: &[Task]) -> bool {
    let mut by_column: HashMap<&str, Vec<i64>> = HashMap::new();
    for task in tasks {
        match task.order {
            Some(order) => by_column.entry(&task.column_id).or_default().push(order),
            None => return false,
        }
    }

    by_column.into_values().all(|mut orders| {
        orders.sort_unstable();
        orders.iter().enumerate().all(|(i, &o)| o == i as i64)
    })
}
