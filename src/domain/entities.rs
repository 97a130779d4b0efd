//! Domain entities: node kinds, eligibility and node payloads

use std::fmt;

/// Stable identifier of a node, unique within a forest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The three grouping levels of the clearing hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Level 1: fund
    Fund,
    /// Level 2: custody institution
    Custody,
    /// Level 3: transfer instruction
    Instruction,
}

/// Kind tag for any node, groups and leaves alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Fund,
    Custody,
    Instruction,
    TradeOrder,
}

impl NodeKind {
    /// Hierarchy level, 1 for funds down to 4 for trade orders.
    pub fn level(self) -> u8 {
        match self {
            NodeKind::Fund => 1,
            NodeKind::Custody => 2,
            NodeKind::Instruction => 3,
            NodeKind::TradeOrder => 4,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            NodeKind::Fund => "fund",
            NodeKind::Custody => "custody institution",
            NodeKind::Instruction => "transfer instruction",
            NodeKind::TradeOrder => "trade order",
        }
    }

    /// Short marker used when printing trees.
    pub fn marker(self) -> &'static str {
        match self {
            NodeKind::Fund => "F",
            NodeKind::Custody => "C",
            NodeKind::Instruction => "I",
            NodeKind::TradeOrder => "T",
        }
    }

    /// Kind of the children a node of this kind owns, None for leaves.
    pub fn child_kind(self) -> Option<NodeKind> {
        match self {
            NodeKind::Fund => Some(NodeKind::Custody),
            NodeKind::Custody => Some(NodeKind::Instruction),
            NodeKind::Instruction => Some(NodeKind::TradeOrder),
            NodeKind::TradeOrder => None,
        }
    }
}

impl From<GroupKind> for NodeKind {
    fn from(kind: GroupKind) -> Self {
        match kind {
            GroupKind::Fund => NodeKind::Fund,
            GroupKind::Custody => NodeKind::Custody,
            GroupKind::Instruction => NodeKind::Instruction,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Whether a trade order may be picked up by a plain "check" gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eligibility {
    /// Instruction not generated yet; auto-selectable.
    Actionable,
    /// Instruction already generated; only selected explicitly.
    Completed,
}

impl Eligibility {
    pub fn is_actionable(self) -> bool {
        matches!(self, Eligibility::Actionable)
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::Actionable => f.write_str("actionable"),
            Eligibility::Completed => f.write_str("completed"),
        }
    }
}

/// Source labels mapped to each eligibility.
///
/// Data sources report trade order status as free text. Labels are compared
/// after trimming; anything not listed as actionable is treated as completed,
/// so unknown statuses are never auto-selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityLabels {
    pub actionable: Vec<String>,
    pub completed: Vec<String>,
}

impl Default for EligibilityLabels {
    fn default() -> Self {
        Self {
            actionable: vec!["未生成".into(), "not generated".into()],
            completed: vec!["已生成".into(), "generated".into()],
        }
    }
}

impl EligibilityLabels {
    /// Classify a source label. Returns the eligibility and whether the label was recognised.
    pub fn classify(&self, label: &str) -> (Eligibility, bool) {
        let label = label.trim();
        if self.actionable.iter().any(|l| l == label) {
            (Eligibility::Actionable, true)
        } else if self.completed.iter().any(|l| l == label) {
            (Eligibility::Completed, true)
        } else {
            (Eligibility::Completed, false)
        }
    }
}

/// The two node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeVariant {
    Group(GroupKind),
    Leaf(Eligibility),
}

/// Payload stored in every arena slot.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub id: NodeId,
    /// Human-readable label (fund name, institution, instruction or order number)
    pub label: String,
    pub variant: NodeVariant,
    /// Authoritative for leaves, cached for groups with leaf descendants
    pub(crate) selected: bool,
}

impl NodeData {
    pub fn group(id: impl Into<NodeId>, label: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            variant: NodeVariant::Group(kind),
            selected: false,
        }
    }

    pub fn leaf(id: impl Into<NodeId>, label: impl Into<String>, eligibility: Eligibility) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            variant: NodeVariant::Leaf(eligibility),
            selected: false,
        }
    }

    /// Initial selection as reported by the data source.
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn kind(&self) -> NodeKind {
        match self.variant {
            NodeVariant::Group(kind) => kind.into(),
            NodeVariant::Leaf(_) => NodeKind::TradeOrder,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.variant, NodeVariant::Leaf(_))
    }

    pub fn eligibility(&self) -> Option<Eligibility> {
        match self.variant {
            NodeVariant::Leaf(e) => Some(e),
            NodeVariant::Group(_) => None,
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}", self.label)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("未生成", Eligibility::Actionable, true)]
    #[case(" 未生成 ", Eligibility::Actionable, true)]
    #[case("已生成", Eligibility::Completed, true)]
    #[case("generated", Eligibility::Completed, true)]
    #[case("pending review", Eligibility::Completed, false)]
    fn given_status_label_when_classify_then_maps_to_eligibility(
        #[case] label: &str,
        #[case] expected: Eligibility,
        #[case] known: bool,
    ) {
        let labels = EligibilityLabels::default();
        assert_eq!(labels.classify(label), (expected, known));
    }

    #[test]
    fn given_kinds_when_walking_child_kinds_then_reaches_trade_order_at_level_four() {
        let mut kind = NodeKind::Fund;
        while let Some(child) = kind.child_kind() {
            assert_eq!(child.level(), kind.level() + 1);
            kind = child;
        }
        assert_eq!(kind, NodeKind::TradeOrder);
    }

    #[test]
    fn given_leaf_data_when_queried_then_reports_trade_order_kind() {
        let leaf = NodeData::leaf("1-1-1-1", "1111", Eligibility::Completed);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.kind(), NodeKind::TradeOrder);
        assert_eq!(leaf.eligibility(), Some(Eligibility::Completed));

        let group = NodeData::group("1", "Fund A", GroupKind::Fund);
        assert_eq!(group.eligibility(), None);
        assert_eq!(group.to_string(), "Fund A");
    }
}
