//! Cascade of a user toggle through the forest.
//!
//! Transition rules, applied in post-order so children settle before their
//! parent's cached flag is recomputed:
//!
//! | node  | value | from indeterminate | effect                                  |
//! |-------|-------|--------------------|-----------------------------------------|
//! | leaf  | true  | true               | select                                  |
//! | leaf  | true  | false              | select only if actionable, else keep    |
//! | leaf  | false | any                | deselect                                |
//! | group | true  | any                | `selected = any leaf descendant selected` |
//! | group | false | any                | `selected = false`                      |
//!
//! A group without leaf descendants takes `value` directly only when it is the
//! target itself; leaf-less groups reached by the cascade have no selected
//! leaves and stay unselected. After the subtree pass, the target's ancestors
//! have their cached flag recomputed.

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::aggregation::aggregate;
use crate::domain::aggregation::aggregate_forest;
use crate::domain::arena::Forest;
use crate::domain::entities::{Eligibility, NodeId, NodeVariant};
use crate::domain::stats::SelectionStats;

/// Inputs of one cascade run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggle {
    /// Requested selection
    pub value: bool,
    /// Display state of the target was indeterminate before the gesture
    pub from_indeterminate: bool,
}

impl Toggle {
    pub fn new(value: bool, from_indeterminate: bool) -> Self {
        Self {
            value,
            from_indeterminate,
        }
    }
}

/// What a cascade run touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Nodes whose selection flag changed, in write order
    pub changed: Vec<NodeId>,
    /// Nodes the subtree pass visited
    pub visited: usize,
}

impl CascadeReport {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Next selection of a leaf reached by a cascade.
pub fn leaf_transition(current: bool, eligibility: Eligibility, toggle: Toggle) -> bool {
    match (toggle.value, toggle.from_indeterminate) {
        (false, _) => false,
        (true, true) => true,
        (true, false) => current || eligibility.is_actionable(),
    }
}

/// Apply a user gesture on `target`, capturing the indeterminate flag first.
pub fn toggle(forest: &mut Forest, target: Index, value: bool) -> CascadeReport {
    let from_indeterminate = aggregate(forest, target).is_indeterminate();
    cascade(forest, target, Toggle::new(value, from_indeterminate))
}

/// Apply a header gesture over every fund root, capturing the indeterminate flag first.
pub fn toggle_forest(forest: &mut Forest, value: bool) -> CascadeReport {
    let from_indeterminate = aggregate_forest(forest).is_indeterminate();
    cascade_forest(forest, Toggle::new(value, from_indeterminate))
}

/// Cascade a toggle from `target`.
///
/// A leaf target is set to `toggle.value` directly: the user clicked that
/// very order, so the eligibility gate does not apply.
#[instrument(level = "debug", skip(forest))]
pub fn cascade(forest: &mut Forest, target: Index, toggle: Toggle) -> CascadeReport {
    let mut report = CascadeReport::default();
    let Some(node) = forest.get_node(target) else {
        return report;
    };

    if node.data.is_leaf() {
        report.visited = 1;
        set_selected(forest, target, toggle.value, &mut report);
    } else {
        apply_subtrees(forest, &[target], Some(target), toggle, &mut report);
    }
    refresh_ancestors(forest, target, &mut report);

    debug!(
        changed = report.changed.len(),
        visited = report.visited,
        "cascade applied"
    );
    report
}

/// Cascade a toggle over every fund root, as the header control does.
#[instrument(level = "debug", skip(forest))]
pub fn cascade_forest(forest: &mut Forest, toggle: Toggle) -> CascadeReport {
    let mut report = CascadeReport::default();
    let roots = forest.roots().to_vec();
    apply_subtrees(forest, &roots, None, toggle, &mut report);

    debug!(
        changed = report.changed.len(),
        visited = report.visited,
        "forest cascade applied"
    );
    report
}

fn apply_subtrees(
    forest: &mut Forest,
    roots: &[Index],
    target: Option<Index>,
    toggle: Toggle,
    report: &mut CascadeReport,
) {
    let order: Vec<Index> = forest.postorder_over(roots).map(|(idx, _)| idx).collect();
    report.visited += order.len();

    for idx in order {
        let Some(node) = forest.get_node(idx) else {
            continue;
        };
        let next = match node.data.variant {
            NodeVariant::Leaf(eligibility) => {
                leaf_transition(node.data.selected(), eligibility, toggle)
            }
            NodeVariant::Group(_) if toggle.value => {
                let stats = SelectionStats::of(forest, idx);
                if !stats.has_leaves() && target == Some(idx) {
                    true
                } else {
                    stats.any_selected()
                }
            }
            NodeVariant::Group(_) => false,
        };
        set_selected(forest, idx, next, report);
    }
}

fn refresh_ancestors(forest: &mut Forest, target: Index, report: &mut CascadeReport) {
    let ancestors: Vec<Index> = forest.ancestors(target).map(|(idx, _)| idx).collect();
    for idx in ancestors {
        let stats = SelectionStats::of(forest, idx);
        // leaf-less ancestors keep their own flag
        if stats.has_leaves() {
            set_selected(forest, idx, stats.any_selected(), report);
        }
    }
}

fn set_selected(forest: &mut Forest, idx: Index, value: bool, report: &mut CascadeReport) {
    if let Some(node) = forest.get_node_mut(idx) {
        if node.data.selected != value {
            node.data.selected = value;
            report.changed.push(node.data.id.clone());
        }
    }
}
