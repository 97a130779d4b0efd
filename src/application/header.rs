//! Forest-wide "select all" control.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::application::bus::{SelectionEvent, SelectionObserver, ViewId};
use crate::application::store::SelectionStore;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{aggregate_forest, CascadeReport, Forest, TriState};

pub struct HeaderControl {
    store: Weak<SelectionStore>,
    id: Cell<Option<ViewId>>,
    state: Cell<TriState>,
}

impl HeaderControl {
    /// Subscribe and attach in one step; the header has nothing to initialize
    /// beyond its own state.
    pub fn attach(store: &Rc<SelectionStore>) -> Rc<Self> {
        let header = Rc::new(Self {
            store: Rc::downgrade(store),
            id: Cell::new(None),
            state: Cell::new(store.header_state()),
        });
        let id = store.subscribe(&header);
        header.id.set(Some(id));
        store.acknowledge(id);
        header
    }

    pub fn state(&self) -> TriState {
        self.state.get()
    }

    /// Tooltip of the control: clicking a fully checked forest clears it.
    pub fn title(&self) -> &'static str {
        if self.state.get().is_checked() {
            "clear all"
        } else {
            "select all"
        }
    }

    pub fn click(&self) -> ApplicationResult<CascadeReport> {
        let store = self.store.upgrade().ok_or(ApplicationError::ViewDetached)?;
        debug!(state = %self.state.get(), "header clicked");
        store.click_all(self.id.get())
    }

    pub fn view_id(&self) -> Option<ViewId> {
        self.id.get()
    }
}

impl SelectionObserver for HeaderControl {
    fn on_selection_event(&self, _event: &SelectionEvent, forest: &Forest) {
        self.state.set(aggregate_forest(forest));
    }
}

impl Drop for HeaderControl {
    fn drop(&mut self) {
        if let (Some(store), Some(id)) = (self.store.upgrade(), self.id.get()) {
            store.unsubscribe(id);
        }
    }
}
