use crate::model::Task;

/// Display order for the task list: incomplete tasks before completed ones,
/// newest first within each group. The sort is stable, so tasks with equal
/// timestamps keep their relative order in the collection.
pub fn display_order(tasks: &[Task]) -> Vec<Task> {
    let mut ordered = tasks.to_vec();
    ordered.sort_by(|a, b| {
        a.completed
            .cmp(&b.completed)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    ordered
}
