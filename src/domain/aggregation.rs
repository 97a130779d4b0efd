//! Tri-state display values, derived on demand and never cached.

use std::fmt;

use generational_arena::Index;
use tracing::instrument;

use crate::domain::arena::Forest;
use crate::domain::stats::SelectionStats;

/// Display value of a selection indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriState {
    #[default]
    Unchecked,
    /// Some but not all leaf descendants are selected.
    Indeterminate,
    Checked,
}

impl TriState {
    /// Aggregate leaf counts. `own_flag` is used only when there are no leaves.
    pub fn from_stats(stats: SelectionStats, own_flag: bool) -> Self {
        if !stats.has_leaves() {
            Self::from_flag(own_flag)
        } else if stats.selected == 0 {
            TriState::Unchecked
        } else if stats.selected == stats.total {
            TriState::Checked
        } else {
            TriState::Indeterminate
        }
    }

    pub fn from_flag(flag: bool) -> Self {
        if flag {
            TriState::Checked
        } else {
            TriState::Unchecked
        }
    }

    pub fn is_indeterminate(self) -> bool {
        matches!(self, TriState::Indeterminate)
    }

    pub fn is_checked(self) -> bool {
        matches!(self, TriState::Checked)
    }

    /// Value requested when the indicator is clicked.
    ///
    /// Unchecked and indeterminate both request selection; checked requests
    /// deselection.
    pub fn click_value(self) -> bool {
        !self.is_checked()
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriState::Unchecked => f.write_str("unchecked"),
            TriState::Indeterminate => f.write_str("indeterminate"),
            TriState::Checked => f.write_str("checked"),
        }
    }
}

/// Display state of a single node. Unknown indices read as unchecked.
#[instrument(level = "trace", skip(forest))]
pub fn aggregate(forest: &Forest, idx: Index) -> TriState {
    let Some(node) = forest.get_node(idx) else {
        return TriState::Unchecked;
    };
    if node.data.is_leaf() {
        return TriState::from_flag(node.data.selected());
    }
    TriState::from_stats(SelectionStats::of(forest, idx), node.data.selected())
}

/// Display state of the forest-wide header control.
///
/// A forest without leaves has no flag of its own and reads as unchecked.
#[instrument(level = "trace", skip(forest))]
pub fn aggregate_forest(forest: &Forest) -> TriState {
    TriState::from_stats(SelectionStats::of_forest(forest), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn stats(selected: usize, total: usize) -> SelectionStats {
        SelectionStats {
            selected,
            total,
            ..SelectionStats::default()
        }
    }

    #[rstest]
    #[case(0, 0, false, TriState::Unchecked)]
    #[case(0, 0, true, TriState::Checked)]
    #[case(0, 3, true, TriState::Unchecked)]
    #[case(3, 3, false, TriState::Checked)]
    #[case(1, 3, false, TriState::Indeterminate)]
    #[case(2, 3, true, TriState::Indeterminate)]
    fn given_counts_when_aggregating_then_returns_tri_state(
        #[case] selected: usize,
        #[case] total: usize,
        #[case] own_flag: bool,
        #[case] expected: TriState,
    ) {
        assert_eq!(TriState::from_stats(stats(selected, total), own_flag), expected);
    }

    #[test]
    fn given_each_state_when_clicked_then_requests_expected_value() {
        assert!(TriState::Unchecked.click_value());
        assert!(TriState::Indeterminate.click_value());
        assert!(!TriState::Checked.click_value());
    }
}
