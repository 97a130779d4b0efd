//! Selection store: the single owner of a session's forest.
//!
//! Views receive an `Rc<SelectionStore>` at construction. They can read the
//! forest and request mutations; only the store runs the cascade, and every
//! mutation is followed by the two-step notification protocol:
//!
//! 1. `Applied` is delivered synchronously to the originating view, which
//!    refreshes its own indicators.
//! 2. `Changed` is broadcast to every other attached view.
//!
//! Step 1 always completes before step 2 starts.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, instrument};

use crate::application::bus::{Phase, SelectionEvent, SelectionObserver, SyncBus, Target, ViewId};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{self, aggregate, aggregate_forest, CascadeReport, Forest, NodeId, SelectionStats, TriState};

pub struct SelectionStore {
    forest: RefCell<Forest>,
    bus: SyncBus,
}

impl SelectionStore {
    pub fn new(forest: Forest) -> Rc<Self> {
        Rc::new(Self {
            forest: RefCell::new(forest),
            bus: SyncBus::new(),
        })
    }

    /// Run `f` with read access to the forest.
    pub fn read<R>(&self, f: impl FnOnce(&Forest) -> R) -> R {
        // The mutable borrow never outlives a cascade call, which does not call out.
        f(&self.forest.borrow())
    }

    pub fn state_of(&self, id: &NodeId) -> ApplicationResult<TriState> {
        self.read(|forest| -> ApplicationResult<TriState> {
            let idx = forest.require(id)?;
            Ok(aggregate(forest, idx))
        })
    }

    pub fn stats_of(&self, id: &NodeId) -> ApplicationResult<SelectionStats> {
        self.read(|forest| -> ApplicationResult<SelectionStats> {
            let idx = forest.require(id)?;
            Ok(SelectionStats::of(forest, idx))
        })
    }

    /// Forest-wide tri-state shown by the header control.
    pub fn header_state(&self) -> TriState {
        self.read(aggregate_forest)
    }

    /// Forest-wide leaf counts.
    pub fn stats(&self) -> SelectionStats {
        self.read(SelectionStats::of_forest)
    }

    pub fn bus(&self) -> &SyncBus {
        &self.bus
    }

    /// Set `id` to `value`, cascading through its subtree.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle(&self, origin: Option<ViewId>, id: &NodeId, value: bool) -> ApplicationResult<CascadeReport> {
        let report = {
            let mut forest = self
                .forest
                .try_borrow_mut()
                .map_err(|_| ApplicationError::MutationInProgress)?;
            let idx = forest.require(id)?;
            domain::toggle(&mut forest, idx, value)
        };
        self.publish(origin, Target::Node(id.clone()), &report);
        Ok(report)
    }

    /// Click `id`: the value is derived from its current display state.
    pub fn click(&self, origin: Option<ViewId>, id: &NodeId) -> ApplicationResult<CascadeReport> {
        let value = self.state_of(id)?.click_value();
        self.toggle(origin, id, value)
    }

    /// Set every fund root to `value`, as the header control does.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle_all(&self, origin: Option<ViewId>, value: bool) -> ApplicationResult<CascadeReport> {
        let report = {
            let mut forest = self
                .forest
                .try_borrow_mut()
                .map_err(|_| ApplicationError::MutationInProgress)?;
            domain::toggle_forest(&mut forest, value)
        };
        self.publish(origin, Target::Forest, &report);
        Ok(report)
    }

    pub fn click_all(&self, origin: Option<ViewId>) -> ApplicationResult<CascadeReport> {
        let value = self.header_state().click_value();
        self.toggle_all(origin, value)
    }

    /// Register an observer; it stays pending until `acknowledge`.
    pub fn subscribe<O: SelectionObserver + 'static>(&self, observer: &Rc<O>) -> ViewId {
        self.bus.subscribe(observer)
    }

    /// Second half of the attach handshake. See [`SyncBus::acknowledge`].
    pub fn acknowledge(&self, id: ViewId) -> bool {
        self.read(|forest| self.bus.acknowledge(id, forest))
    }

    pub fn unsubscribe(&self, id: ViewId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn is_attached(&self, id: ViewId) -> bool {
        self.bus.phase(id) == Some(Phase::Attached)
    }

    /// Deliver any broadcast held back while the bus was blocked.
    pub fn flush(&self) -> usize {
        self.read(|forest| self.bus.broadcast(None, forest))
    }

    fn publish(&self, origin: Option<ViewId>, target: Target, report: &CascadeReport) {
        let revision = self.bus.advance();
        debug!(revision, changed = report.changed.len(), "selection mutation applied");

        let forest = self.forest.borrow();
        if let Some(origin) = origin {
            let applied = SelectionEvent::Applied {
                revision,
                target,
                changed: report.changed.clone(),
            };
            self.bus.deliver_local(origin, &applied, &forest);
        }
        self.bus.broadcast(origin, &forest);
    }
}
