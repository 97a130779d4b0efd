//! Headless level views.
//!
//! A `LevelView` models one grid of the workstation: the fund list, or the
//! children of one expanded row. It keeps only the tri-state of its own rows
//! and refreshes them in place on every notification; expansion state lives
//! in the `children` map and is never touched by a refresh.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::application::bus::{SelectionEvent, SelectionObserver, ViewId};
use crate::application::store::SelectionStore;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{aggregate, CascadeReport, DomainError, Forest, NodeId, NodeKind, TriState};

pub struct LevelView {
    store: Weak<SelectionStore>,
    id: Cell<Option<ViewId>>,
    parent: Option<NodeId>,
    level: Option<NodeKind>,
    rows: Vec<NodeId>,
    indicators: RefCell<Vec<TriState>>,
    refreshes: Cell<usize>,
    children: RefCell<BTreeMap<NodeId, Rc<LevelView>>>,
}

impl LevelView {
    /// Create a view over the children of `parent` (fund roots when None)
    /// and subscribe it in the pending phase.
    pub fn mount(store: &Rc<SelectionStore>, parent: Option<&NodeId>) -> ApplicationResult<Rc<Self>> {
        let (rows, level, indicators) = store.read(|forest| -> ApplicationResult<_> {
            let row_indices = match parent {
                None => forest.roots().to_vec(),
                Some(id) => forest.children(forest.require(id)?).to_vec(),
            };
            let rows: Vec<NodeId> = row_indices
                .iter()
                .filter_map(|&idx| forest.get_node(idx).map(|n| n.data.id.clone()))
                .collect();
            let level = match parent {
                None => Some(NodeKind::Fund),
                Some(id) => forest
                    .node_by_id(id)
                    .and_then(|n| n.data.kind().child_kind()),
            };
            let indicators: Vec<TriState> = row_indices.iter().map(|&idx| aggregate(forest, idx)).collect();
            Ok((rows, level, indicators))
        })?;

        let view = Rc::new(Self {
            store: Rc::downgrade(store),
            id: Cell::new(None),
            parent: parent.cloned(),
            level,
            rows,
            indicators: RefCell::new(indicators),
            refreshes: Cell::new(0),
            children: RefCell::new(BTreeMap::new()),
        });
        view.id.set(Some(store.subscribe(&view)));
        debug!(parent = ?view.parent, rows = view.rows.len(), "level view mounted");
        Ok(view)
    }

    /// Mount and immediately complete the attach handshake.
    pub fn open(store: &Rc<SelectionStore>, parent: Option<&NodeId>) -> ApplicationResult<Rc<Self>> {
        let view = Self::mount(store, parent)?;
        view.acknowledge()?;
        Ok(view)
    }

    /// Tell the bus this view has finished initializing.
    ///
    /// Returns `true` if a catch-up refresh happened.
    pub fn acknowledge(&self) -> ApplicationResult<bool> {
        let store = self.store()?;
        let id = self.id.get().ok_or(ApplicationError::ViewDetached)?;
        Ok(store.acknowledge(id))
    }

    /// Click the indicator of `row`.
    pub fn click(&self, row: &NodeId) -> ApplicationResult<CascadeReport> {
        self.ensure_row(row)?;
        let store = self.store()?;
        store.click(self.id.get(), row)
    }

    /// Set `row` to an explicit value.
    pub fn set(&self, row: &NodeId, value: bool) -> ApplicationResult<CascadeReport> {
        self.ensure_row(row)?;
        let store = self.store()?;
        store.toggle(self.id.get(), row, value)
    }

    /// Open the child grid of `row`. An already expanded row returns its existing view.
    pub fn expand(&self, row: &NodeId) -> ApplicationResult<Rc<LevelView>> {
        self.ensure_row(row)?;
        if let Some(child) = self.children.borrow().get(row) {
            return Ok(child.clone());
        }
        let store = self.store()?;
        let child = LevelView::open(&store, Some(row))?;
        self.children.borrow_mut().insert(row.clone(), child.clone());
        Ok(child)
    }

    /// Close the child grid of `row`; its subscription ends when the last handle drops.
    pub fn collapse(&self, row: &NodeId) -> bool {
        self.children.borrow_mut().remove(row).is_some()
    }

    /// Expand the ancestors of `id` below this view and return the view that shows it as a row.
    pub fn reveal(self: &Rc<Self>, id: &NodeId) -> ApplicationResult<Rc<LevelView>> {
        let store = self.store()?;
        let path = store.read(|forest| -> ApplicationResult<Vec<NodeId>> {
            let idx = forest.require(id)?;
            let mut path: Vec<NodeId> = forest
                .ancestors(idx)
                .map(|(_, node)| node.data.id.clone())
                .collect();
            path.reverse();
            Ok(path)
        })?;

        let mut current = self.clone();
        for ancestor in path.iter().skip_while(|a| !self.rows.contains(a)) {
            current = current.expand(ancestor)?;
        }
        current.ensure_row(id)?;
        Ok(current)
    }

    pub fn child(&self, row: &NodeId) -> Option<Rc<LevelView>> {
        self.children.borrow().get(row).cloned()
    }

    pub fn is_expanded(&self, row: &NodeId) -> bool {
        self.children.borrow().contains_key(row)
    }

    pub fn view_id(&self) -> Option<ViewId> {
        self.id.get()
    }

    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    /// Kind of the rows shown, None for an instruction's non-existent children.
    pub fn level(&self) -> Option<NodeKind> {
        self.level
    }

    pub fn rows(&self) -> &[NodeId] {
        &self.rows
    }

    /// Indicator last rendered for `row`.
    pub fn indicator(&self, row: &NodeId) -> Option<TriState> {
        let pos = self.rows.iter().position(|r| r == row)?;
        self.indicators.borrow().get(pos).copied()
    }

    pub fn indicators(&self) -> Vec<(NodeId, TriState)> {
        self.rows
            .iter()
            .cloned()
            .zip(self.indicators.borrow().iter().copied())
            .collect()
    }

    /// Number of indicator refreshes since mount.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.get()
    }

    fn refresh_indicators(&self, forest: &Forest) {
        let fresh: Vec<TriState> = self
            .rows
            .iter()
            .map(|row| {
                forest
                    .lookup(row)
                    .map(|idx| aggregate(forest, idx))
                    .unwrap_or_default()
            })
            .collect();
        *self.indicators.borrow_mut() = fresh;
        self.refreshes.set(self.refreshes.get() + 1);
    }

    fn ensure_row(&self, row: &NodeId) -> ApplicationResult<()> {
        if self.rows.contains(row) {
            Ok(())
        } else {
            Err(DomainError::UnknownNode(row.clone()).into())
        }
    }

    fn store(&self) -> ApplicationResult<Rc<SelectionStore>> {
        self.store.upgrade().ok_or(ApplicationError::ViewDetached)
    }
}

impl SelectionObserver for LevelView {
    fn on_selection_event(&self, event: &SelectionEvent, forest: &Forest) {
        trace!(parent = ?self.parent, revision = event.revision(), "refreshing indicators");
        self.refresh_indicators(forest);
    }
}

impl Drop for LevelView {
    fn drop(&mut self) {
        if let (Some(store), Some(id)) = (self.store.upgrade(), self.id.get()) {
            store.unsubscribe(id);
        }
    }
}
