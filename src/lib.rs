//! clearsel: hierarchical tri-state selection over fund clearing data.
//!
//! A forest of Fund → Custody → Instruction → TradeOrder nodes is held by a
//! [`application::SelectionStore`]. Selecting a node cascades through its
//! subtree, group indicators are derived from leaf counts, and every view
//! of the forest is kept in step through the store's synchronization bus.
//!
//! Layering follows the dependency direction:
//! `domain` ← `application` ← `infrastructure` ← `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
