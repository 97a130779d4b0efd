//! Application layer: selection store, synchronization bus and views
//!
//! This layer owns the mutable session state and depends on I/O boundary
//! traits only through forest sources.

pub mod bus;
pub mod error;
pub mod error_ext;
pub mod header;
pub mod panel;
pub mod render;
pub mod source;
pub mod store;
pub mod view;

pub use bus::{Phase, SelectionEvent, SelectionObserver, SyncBus, Target, ViewId};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::SourceResultExt;
pub use header::HeaderControl;
pub use panel::{ActionPanel, ActionState};
pub use render::TreeNodeConvert;
pub use source::{load_forest, FileSource, ForestSource, SourceFormat, StaticSource};
pub use store::SelectionStore;
pub use view::LevelView;
