//! The ordered, nested sequence of steps making up an automation.
//!
//! A [`StepTree`] is cheap to clone: clones share storage until one of
//! them is edited, so a runner can hold a snapshot while the editor keeps
//! working on its own copy.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::id::StepId;
use crate::step::{Step, Walk, walk};

/// Top-level step sequence with id-addressed editing operations.
///
/// Every editing operation is a no-op when its target cannot be resolved
/// and reports that through its return value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Step>", into = "Vec<Step>")]
pub struct StepTree {
    steps: Arc<Vec<Step>>,
}

impl StepTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level steps in order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of top-level steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Every step, depth-first in pre-order.
    #[must_use]
    pub fn iter(&self) -> Walk<'_> {
        walk(&self.steps)
    }

    /// Locate a step anywhere in the tree.
    #[must_use]
    pub fn find(&self, id: StepId) -> Option<&Step> {
        self.iter().find(|step| step.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: StepId) -> bool {
        self.find(id).is_some()
    }

    /// Dotted 1-based position of a step (`"2.1.3"`), empty when absent.
    #[must_use]
    pub fn position_path(&self, id: StepId) -> String {
        let mut path = Vec::new();
        if position_in(&self.steps, id, &mut path) {
            path.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(".")
        } else {
            String::new()
        }
    }

    /// Smallest id greater than every id in use, `0` for an empty tree.
    #[must_use]
    pub fn next_id(&self) -> StepId {
        self.iter()
            .map(|step| step.id)
            .max()
            .map_or(StepId::new(0), StepId::next)
    }

    /// Append `step` at the end of the top level (`parent` is `None`) or of
    /// the nested sequence of `parent`.
    ///
    /// Returns `false` when `parent` is missing or is not a statement.
    pub fn insert(&mut self, step: Step, parent: Option<StepId>) -> bool {
        match parent {
            None => {
                Arc::make_mut(&mut self.steps).push(step);
                true
            }
            Some(parent) => {
                if !self.find(parent).is_some_and(Step::is_container) {
                    return false;
                }
                find_in_mut(Arc::make_mut(&mut self.steps).as_mut_slice(), parent)
                    .and_then(Step::children_mut)
                    .map(|children| children.push(step))
                    .is_some()
            }
        }
    }

    /// Remove a step (and everything nested below it), returning it.
    pub fn remove(&mut self, id: StepId) -> Option<Step> {
        if !self.contains(id) {
            return None;
        }
        remove_in(Arc::make_mut(&mut self.steps), id)
    }

    /// Replace the step `id` in place. `step.id` must equal `id`.
    ///
    /// Returns `false` when `id` is missing or the ids disagree.
    pub fn replace(&mut self, id: StepId, step: Step) -> bool {
        if step.id != id || !self.contains(id) {
            return false;
        }
        match find_in_mut(Arc::make_mut(&mut self.steps).as_mut_slice(), id) {
            Some(slot) => {
                *slot = step;
                true
            }
            None => false,
        }
    }

    /// Move the step at index `source` to index `destination` within the
    /// top level, or within the nested sequence of `container`.
    ///
    /// Returns `false` when the container is missing or an index is out of
    /// range.
    pub fn reorder(&mut self, source: usize, destination: usize, container: Option<StepId>) -> bool {
        let Some(siblings) = self.siblings(container) else {
            return false;
        };
        if source >= siblings.len() || destination >= siblings.len() {
            return false;
        }
        if source == destination {
            return true;
        }
        let Some(siblings) = siblings_mut(&mut self.steps, container) else {
            return false;
        };
        let step = siblings.remove(source);
        siblings.insert(destination, step);
        true
    }

    /// Empty the top level (`from` is `None`) or the nested sequence of
    /// `from`.
    ///
    /// Returns the removed steps, `None` when `from` is missing or is not a
    /// statement.
    pub fn clear(&mut self, from: Option<StepId>) -> Option<Vec<Step>> {
        self.siblings(from)?;
        siblings_mut(&mut self.steps, from).map(std::mem::take)
    }

    fn siblings(&self, container: Option<StepId>) -> Option<&[Step]> {
        match container {
            None => Some(&self.steps),
            Some(id) => self.find(id)?.children(),
        }
    }
}

fn siblings_mut(steps: &mut Arc<Vec<Step>>, container: Option<StepId>) -> Option<&mut Vec<Step>> {
    let steps = Arc::make_mut(steps);
    match container {
        None => Some(steps),
        Some(id) => find_in_mut(steps, id)?.children_mut(),
    }
}

fn find_in_mut(steps: &mut [Step], id: StepId) -> Option<&mut Step> {
    for step in steps {
        if step.id == id {
            return Some(step);
        }
        if let Some(found) = step.children_mut().and_then(|children| find_in_mut(children, id)) {
            return Some(found);
        }
    }
    None
}

fn remove_in(steps: &mut Vec<Step>, id: StepId) -> Option<Step> {
    if let Some(index) = steps.iter().position(|step| step.id == id) {
        return Some(steps.remove(index));
    }
    steps
        .iter_mut()
        .filter_map(Step::children_mut)
        .find_map(|children| remove_in(children, id))
}

fn position_in(steps: &[Step], id: StepId, path: &mut Vec<usize>) -> bool {
    for (index, step) in steps.iter().enumerate() {
        path.push(index + 1);
        if step.id == id {
            return true;
        }
        if step
            .children()
            .is_some_and(|children| position_in(children, id, path))
        {
            return true;
        }
        path.pop();
    }
    false
}

impl From<Vec<Step>> for StepTree {
    fn from(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(steps),
        }
    }
}

impl From<StepTree> for Vec<Step> {
    fn from(tree: StepTree) -> Self {
        Arc::unwrap_or_clone(tree.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepKind;

    fn sleep(id: u64) -> Step {
        Step::new(StepId::new(id), StepKind::Sleep { time: 1 })
    }

    fn cycle(id: u64, steps: Vec<Step>) -> Step {
        Step::new(
            StepId::new(id),
            StepKind::Cycle {
                iterable: "rows".to_string(),
                save_items_as: "row".to_string(),
                steps,
            },
        )
    }

    fn ids(steps: &[Step]) -> Vec<u64> {
        steps.iter().map(|step| step.id.get()).collect()
    }

    fn sample() -> StepTree {
        StepTree::from(vec![
            sleep(1),
            cycle(2, vec![sleep(3), cycle(4, vec![sleep(5)])]),
            sleep(6),
        ])
    }

    #[test]
    fn should_find_nested_step() {
        let tree = sample();
        assert_eq!(tree.find(StepId::new(5)).unwrap().id, StepId::new(5));
        assert!(tree.find(StepId::new(99)).is_none());
    }

    #[test]
    fn should_compute_dotted_position_path() {
        let tree = sample();
        assert_eq!(tree.position_path(StepId::new(1)), "1");
        assert_eq!(tree.position_path(StepId::new(3)), "2.1");
        assert_eq!(tree.position_path(StepId::new(5)), "2.2.1");
        assert_eq!(tree.position_path(StepId::new(6)), "3");
        assert_eq!(tree.position_path(StepId::new(42)), "");
    }

    #[test]
    fn should_append_inside_container() {
        let mut tree = sample();
        assert!(tree.insert(sleep(7), Some(StepId::new(4))));
        let inner = tree.find(StepId::new(4)).unwrap().children().unwrap();
        assert_eq!(ids(inner), vec![5, 7]);
    }

    #[test]
    fn should_refuse_insert_under_leaf_or_missing_parent() {
        let mut tree = sample();
        let before = tree.clone();
        assert!(!tree.insert(sleep(7), Some(StepId::new(1))));
        assert!(!tree.insert(sleep(7), Some(StepId::new(99))));
        assert_eq!(tree, before);
    }

    #[test]
    fn should_remove_subtree() {
        let mut tree = sample();
        let removed = tree.remove(StepId::new(4)).unwrap();
        assert_eq!(removed.children().unwrap().len(), 1);
        assert!(!tree.contains(StepId::new(5)));
        assert_eq!(ids(tree.steps()), vec![1, 2, 6]);
        assert!(tree.remove(StepId::new(4)).is_none());
    }

    #[test]
    fn should_replace_step_in_place() {
        let mut tree = sample();
        let updated = Step::new(StepId::new(3), StepKind::Move { x: 1, y: 1 });
        assert!(tree.replace(StepId::new(3), updated.clone()));
        assert_eq!(tree.find(StepId::new(3)), Some(&updated));
        assert_eq!(tree.position_path(StepId::new(3)), "2.1");
    }

    #[test]
    fn should_refuse_replace_with_different_id() {
        let mut tree = sample();
        assert!(!tree.replace(StepId::new(3), sleep(8)));
        assert!(!tree.replace(StepId::new(99), sleep(99)));
    }

    #[test]
    fn should_reorder_top_level_and_nested() {
        let mut tree = sample();
        assert!(tree.reorder(0, 2, None));
        assert_eq!(ids(tree.steps()), vec![2, 6, 1]);

        assert!(tree.reorder(1, 0, Some(StepId::new(2))));
        let inner = tree.find(StepId::new(2)).unwrap().children().unwrap();
        assert_eq!(ids(inner), vec![4, 3]);
    }

    #[test]
    fn should_ignore_reorder_out_of_range() {
        let mut tree = sample();
        let before = tree.clone();
        assert!(!tree.reorder(0, 3, None));
        assert!(!tree.reorder(5, 0, None));
        assert!(!tree.reorder(0, 0, Some(StepId::new(1))));
        assert_eq!(tree, before);
    }

    #[test]
    fn should_clear_nested_sequence() {
        let mut tree = sample();
        let removed = tree.clear(Some(StepId::new(2))).unwrap();
        assert_eq!(ids(&removed), vec![3, 4]);
        assert!(tree.find(StepId::new(2)).unwrap().children().unwrap().is_empty());

        let removed = tree.clear(None).unwrap();
        assert_eq!(removed.len(), 3);
        assert!(tree.is_empty());
        assert!(tree.clear(Some(StepId::new(2))).is_none());
    }

    #[test]
    fn should_compute_next_id_from_max() {
        assert_eq!(StepTree::new().next_id(), StepId::new(0));
        assert_eq!(sample().next_id(), StepId::new(7));
    }

    #[test]
    fn should_not_affect_snapshot_when_edited() {
        let mut tree = sample();
        let snapshot = tree.clone();
        tree.remove(StepId::new(1));
        assert_eq!(snapshot.len(), 3);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn should_keep_every_id_reachable_and_unique_across_edits() {
        fn all_ids(tree: &StepTree) -> Vec<u64> {
            let mut ids: Vec<u64> = tree.iter().map(|step| step.id.get()).collect();
            ids.sort_unstable();
            ids
        }

        let mut tree = sample();
        assert_eq!(all_ids(&tree), vec![1, 2, 3, 4, 5, 6]);

        assert!(tree.insert(sleep(7), Some(StepId::new(4))));
        assert_eq!(all_ids(&tree), vec![1, 2, 3, 4, 5, 6, 7]);

        assert!(tree.reorder(2, 0, None));
        assert!(tree.reorder(0, 1, Some(StepId::new(4))));
        assert_eq!(all_ids(&tree), vec![1, 2, 3, 4, 5, 6, 7]);

        assert!(tree.replace(StepId::new(3), cycle(3, vec![sleep(8)])));
        assert_eq!(all_ids(&tree), vec![1, 2, 3, 4, 5, 6, 7, 8]);

        assert!(tree.remove(StepId::new(4)).is_some());
        assert_eq!(all_ids(&tree), vec![1, 2, 3, 6, 8]);

        assert!(tree.insert(sleep(9), None));
        assert!(tree.reorder(3, 1, None));
        let ids = all_ids(&tree);
        assert_eq!(ids, vec![1, 2, 3, 6, 8, 9]);
        for id in ids {
            assert!(tree.find(StepId::new(id)).is_some(), "{id}");
        }
    }

    #[test]
    fn should_serialize_as_plain_array() {
        let tree = StepTree::from(vec![sleep(1)]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "id": 1, "type": "sleep", "data": { "time": 1 } }])
        );
        let back: StepTree = serde_json::from_value(json).unwrap();
        assert_eq!(back, tree);
    }
}
