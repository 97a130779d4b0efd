//! Selection statistics over leaf descendants.
//!
//! Counts are recomputed on every call rather than maintained incrementally.
//! Callers evaluate stats once per user action, never per frame.

use std::iter::Sum;
use std::ops::Add;

use generational_arena::Index;

use crate::domain::arena::Forest;
use crate::domain::entities::NodeVariant;

/// Leaf counts below a node (or over a set of roots).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStats {
    /// Selected leaves
    pub selected: usize,
    /// All leaves
    pub total: usize,
    /// Selected leaves that are actionable
    pub actionable_selected: usize,
    /// Leaves that are actionable
    pub actionable_total: usize,
}

impl SelectionStats {
    /// Count leaf descendants of `idx`. A leaf counts itself.
    pub fn of(forest: &Forest, idx: Index) -> Self {
        forest
            .leaves(idx)
            .map(|(_, node)| match node.data.variant {
                NodeVariant::Leaf(eligibility) => {
                    let selected = node.data.selected();
                    let actionable = eligibility.is_actionable();
                    SelectionStats {
                        selected: usize::from(selected),
                        total: 1,
                        actionable_selected: usize::from(selected && actionable),
                        actionable_total: usize::from(actionable),
                    }
                }
                NodeVariant::Group(_) => SelectionStats::default(),
            })
            .sum()
    }

    /// Sum of `of` over each root in `roots`.
    pub fn of_roots(forest: &Forest, roots: &[Index]) -> Self {
        roots.iter().map(|&root| Self::of(forest, root)).sum()
    }

    /// Forest-wide stats, summed over every fund root.
    pub fn of_forest(forest: &Forest) -> Self {
        Self::of_roots(forest, forest.roots())
    }

    pub fn has_leaves(&self) -> bool {
        self.total > 0
    }

    pub fn any_selected(&self) -> bool {
        self.selected > 0
    }

    pub fn all_selected(&self) -> bool {
        self.total > 0 && self.selected == self.total
    }
}

impl Add for SelectionStats {
    type Output = SelectionStats;

    fn add(self, rhs: Self) -> Self::Output {
        SelectionStats {
            selected: self.selected + rhs.selected,
            total: self.total + rhs.total,
            actionable_selected: self.actionable_selected + rhs.actionable_selected,
            actionable_total: self.actionable_total + rhs.actionable_total,
        }
    }
}

impl Sum for SelectionStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(SelectionStats::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Eligibility, GroupKind, NodeData, NodeId};

    fn instruction(selected: &[(bool, Eligibility)]) -> Forest {
        let mut forest = Forest::new();
        let f = forest.insert_node(NodeData::group("f", "", GroupKind::Fund), None).unwrap();
        let c = forest.insert_node(NodeData::group("c", "", GroupKind::Custody), Some(f)).unwrap();
        let i = forest.insert_node(NodeData::group("i", "", GroupKind::Instruction), Some(c)).unwrap();
        for (n, &(sel, elig)) in selected.iter().enumerate() {
            forest
                .insert_node(
                    NodeData::leaf(format!("t{n}"), "", elig).with_selected(sel),
                    Some(i),
                )
                .unwrap();
        }
        forest
    }

    #[test]
    fn given_mixed_leaves_when_counting_then_reports_selected_and_actionable() {
        let forest = instruction(&[
            (true, Eligibility::Actionable),
            (true, Eligibility::Completed),
            (false, Eligibility::Actionable),
        ]);
        let stats = SelectionStats::of_forest(&forest);
        assert_eq!(
            stats,
            SelectionStats {
                selected: 2,
                total: 3,
                actionable_selected: 1,
                actionable_total: 2,
            }
        );
        assert!(stats.any_selected());
        assert!(!stats.all_selected());
    }

    #[test]
    fn given_leaf_when_counting_then_counts_itself() {
        let forest = instruction(&[(true, Eligibility::Completed)]);
        let leaf = forest.lookup(&NodeId::from("t0")).unwrap();
        let stats = SelectionStats::of(&forest, leaf);
        assert_eq!((stats.selected, stats.total), (1, 1));
    }

    #[test]
    fn given_group_without_leaves_when_counting_then_total_is_zero() {
        let forest = instruction(&[]);
        let stats = SelectionStats::of_forest(&forest);
        assert!(!stats.has_leaves());
        assert!(!stats.all_selected());
    }
}
