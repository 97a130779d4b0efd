//! Domain layer: the forest and the selection engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod aggregation;
pub mod arena;
pub mod builder;
pub mod cascade;
pub mod entities;
pub mod error;
pub mod records;
pub mod stats;

pub use aggregation::{aggregate, aggregate_forest, TriState};
pub use arena::{Forest, TreeNode};
pub use builder::ForestBuilder;
pub use cascade::{cascade, cascade_forest, toggle, toggle_forest, CascadeReport, Toggle};
pub use entities::*;
pub use error::{DomainError, TreeResult};
pub use records::{CustodyRecord, ForestDocument, FundRecord, InstructionRecord, TradeOrderRecord};
pub use stats::SelectionStats;

pub use generational_arena::Index;
