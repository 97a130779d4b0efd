//! Forest builder: turns source records into an arena forest.

use generational_arena::Index;
use tracing::{instrument, warn};

use crate::domain::arena::Forest;
use crate::domain::entities::{EligibilityLabels, GroupKind, NodeData};
use crate::domain::error::TreeResult;
use crate::domain::records::{CustodyRecord, FundRecord, InstructionRecord, TradeOrderRecord};

/// Constructs a forest from fund records.
///
/// The builder does not police the shape beyond what the arena needs:
/// empty groups are accepted and become leaf-less groups. Ids must be unique
/// across the whole forest.
pub struct ForestBuilder {
    labels: EligibilityLabels,
    unknown_statuses: usize,
}

impl Default for ForestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ForestBuilder {
    pub fn new() -> Self {
        Self::with_labels(EligibilityLabels::default())
    }

    pub fn with_labels(labels: EligibilityLabels) -> Self {
        Self {
            labels,
            unknown_statuses: 0,
        }
    }

    /// Number of trade orders whose status matched no configured label in the last build.
    pub fn unknown_statuses(&self) -> usize {
        self.unknown_statuses
    }

    #[instrument(level = "debug", skip_all, fields(funds = funds.len()))]
    pub fn build(&mut self, funds: &[FundRecord]) -> TreeResult<Forest> {
        self.unknown_statuses = 0;
        let mut forest = Forest::new();

        for fund in funds {
            let fund_idx = forest.insert_node(
                NodeData::group(fund.id.as_str(), fund.label.as_str(), GroupKind::Fund)
                    .with_selected(fund.selected),
                None,
            )?;
            for custody in &fund.children {
                self.add_custody(&mut forest, custody, fund_idx)?;
            }
        }

        if self.unknown_statuses > 0 {
            warn!(
                count = self.unknown_statuses,
                "trade orders with unrecognised status treated as completed"
            );
        }
        Ok(forest)
    }

    fn add_custody(&mut self, forest: &mut Forest, custody: &CustodyRecord, parent: Index) -> TreeResult<()> {
        let idx = forest.insert_node(
            NodeData::group(custody.id.as_str(), custody.label.as_str(), GroupKind::Custody)
                .with_selected(custody.selected),
            Some(parent),
        )?;
        for instruction in &custody.children {
            self.add_instruction(forest, instruction, idx)?;
        }
        Ok(())
    }

    fn add_instruction(
        &mut self,
        forest: &mut Forest,
        instruction: &InstructionRecord,
        parent: Index,
    ) -> TreeResult<()> {
        let idx = forest.insert_node(
            NodeData::group(
                instruction.id.as_str(),
                instruction.label.as_str(),
                GroupKind::Instruction,
            )
            .with_selected(instruction.selected),
            Some(parent),
        )?;
        for order in &instruction.children {
            self.add_order(forest, order, idx)?;
        }
        Ok(())
    }

    fn add_order(&mut self, forest: &mut Forest, order: &TradeOrderRecord, parent: Index) -> TreeResult<()> {
        let (eligibility, known) = self.labels.classify(&order.status);
        if !known {
            self.unknown_statuses += 1;
        }
        forest.insert_node(
            NodeData::leaf(order.id.as_str(), order.label.as_str(), eligibility)
                .with_selected(order.selected),
            Some(parent),
        )?;
        Ok(())
    }
}
