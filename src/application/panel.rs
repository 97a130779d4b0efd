//! Bulk-action panel: selection summary and the action bar.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::application::bus::{SelectionEvent, SelectionObserver, ViewId};
use crate::application::store::SelectionStore;
use crate::config::{ActionSpec, ActionVariant};
use crate::domain::{Forest, SelectionStats};

/// An action together with its availability for the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionState {
    pub spec: ActionSpec,
    pub enabled: bool,
}

pub struct ActionPanel {
    store: Weak<SelectionStore>,
    id: Cell<Option<ViewId>>,
    summary: Cell<SelectionStats>,
    catalog: Vec<ActionSpec>,
}

impl ActionPanel {
    pub fn attach(store: &Rc<SelectionStore>, catalog: Vec<ActionSpec>) -> Rc<Self> {
        let panel = Rc::new(Self {
            store: Rc::downgrade(store),
            id: Cell::new(None),
            summary: Cell::new(store.stats()),
            catalog,
        });
        let id = store.subscribe(&panel);
        panel.id.set(Some(id));
        store.acknowledge(id);
        panel
    }

    /// Forest-wide counts as of the last notification.
    pub fn summary(&self) -> SelectionStats {
        self.summary.get()
    }

    /// `selected: 3/7 (actionable 2/4)`
    pub fn summary_line(&self) -> String {
        let s = self.summary.get();
        format!(
            "selected: {}/{} (actionable {}/{})",
            s.selected, s.total, s.actionable_selected, s.actionable_total
        )
    }

    pub fn actions(&self) -> Vec<ActionState> {
        let nothing_selected = self.summary.get().selected == 0;
        self.catalog
            .iter()
            .map(|spec| ActionState {
                enabled: !(nothing_selected && spec.variant == ActionVariant::Primary),
                spec: spec.clone(),
            })
            .collect()
    }

    pub fn view_id(&self) -> Option<ViewId> {
        self.id.get()
    }
}

impl SelectionObserver for ActionPanel {
    fn on_selection_event(&self, _event: &SelectionEvent, forest: &Forest) {
        self.summary.set(SelectionStats::of_forest(forest));
    }
}

impl Drop for ActionPanel {
    fn drop(&mut self) {
        if let (Some(store), Some(id)) = (self.store.upgrade(), self.id.get()) {
            store.unsubscribe(id);
        }
    }
}
