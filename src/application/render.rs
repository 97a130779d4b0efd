//! Tree printing with tri-state indicators.
//!
//! Produces plain strings; coloring is left to the CLI.

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::config::DisplayConfig;
use crate::domain::{aggregate, aggregate_forest, Forest, TriState};

pub trait TreeNodeConvert {
    fn to_tree_string(&self, display: &DisplayConfig) -> Tree<String>;
}

pub fn glyph(display: &DisplayConfig, state: TriState) -> &str {
    match state {
        TriState::Checked => &display.checked,
        TriState::Unchecked => &display.unchecked,
        TriState::Indeterminate => &display.indeterminate,
    }
}

/// One line of the tree, e.g. `[-] C Shanghai Clearing House`.
pub fn node_line(forest: &Forest, idx: Index, display: &DisplayConfig) -> String {
    let Some(node) = forest.get_node(idx) else {
        return String::new();
    };
    let data = &node.data;
    let mut line = format!(
        "{} {} {}",
        glyph(display, aggregate(forest, idx)),
        data.kind().marker(),
        data
    );
    if display.show_ids {
        line.push_str(&format!(" #{}", data.id));
    }
    if display.show_eligibility {
        if let Some(eligibility) = data.eligibility() {
            line.push_str(&format!(" <{eligibility}>"));
        }
    }
    line
}

impl TreeNodeConvert for Forest {
    /// Synthetic root carrying the header state, funds below it.
    #[instrument(level = "debug", skip_all)]
    fn to_tree_string(&self, display: &DisplayConfig) -> Tree<String> {
        fn build_tree(forest: &Forest, idx: Index, display: &DisplayConfig) -> Tree<String> {
            let leaves: Vec<_> = forest
                .children(idx)
                .iter()
                .map(|&child| build_tree(forest, child, display))
                .collect();
            Tree::new(node_line(forest, idx, display)).with_leaves(leaves)
        }

        let root = format!("{} funds", glyph(display, aggregate_forest(self)));
        let leaves: Vec<_> = self
            .roots()
            .iter()
            .map(|&idx| build_tree(self, idx, display))
            .collect();
        Tree::new(root).with_leaves(leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Eligibility, GroupKind, NodeData};

    fn small_forest() -> Forest {
        let mut forest = Forest::new();
        let f = forest
            .insert_node(NodeData::group("f1", "Alpha", GroupKind::Fund), None)
            .expect("fund");
        let c = forest
            .insert_node(NodeData::group("c1", "Bank", GroupKind::Custody), Some(f))
            .expect("custody");
        let i = forest
            .insert_node(NodeData::group("i1", "TI-1", GroupKind::Instruction), Some(c))
            .expect("instruction");
        forest
            .insert_node(
                NodeData::leaf("t1", "T-1", Eligibility::Actionable).with_selected(true),
                Some(i),
            )
            .expect("order");
        forest
            .insert_node(NodeData::leaf("t2", "T-2", Eligibility::Completed), Some(i))
            .expect("order");
        forest
    }

    #[test]
    fn given_partial_selection_when_rendering_then_groups_show_indeterminate() {
        let forest = small_forest();

        let text = forest.to_tree_string(&DisplayConfig::default()).to_string();

        assert!(text.starts_with("[-] funds"));
        assert!(text.contains("[-] F Alpha"));
        assert!(text.contains("[x] T T-1 <actionable>"));
        assert!(text.contains("[ ] T T-2 <completed>"));
    }

    #[test]
    fn given_show_ids_when_rendering_then_appends_ids() {
        let forest = small_forest();
        let display = DisplayConfig {
            show_ids: true,
            show_eligibility: false,
            ..DisplayConfig::default()
        };

        let text = forest.to_tree_string(&display).to_string();

        assert!(text.contains("C Bank #c1"));
        assert!(!text.contains("<actionable>"));
    }
}
