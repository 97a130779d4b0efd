//! Integration tests for the selection store, its synchronization bus and
//! the headless views that observe it.
//!
//! Notification protocol:
//! - the originating view gets `Applied` synchronously, before anyone else
//! - every other attached view gets one `Changed` per mutation
//! - pending views get nothing until they acknowledge, then at most one catch-up

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use rstest::{fixture, rstest};

use clearsel::application::{
    load_forest, ActionPanel, ApplicationError, ApplicationResult, FileSource, HeaderControl, LevelView,
    SelectionEvent, SelectionObserver, SelectionStore,
};
use clearsel::config::{default_actions, ActionVariant};
use clearsel::domain::{CascadeReport, EligibilityLabels, Forest, NodeId, TriState};
use clearsel::infrastructure::RealFileSystem;
use clearsel::util::testing;

#[fixture]
fn store() -> Rc<SelectionStore> {
    testing::init_test_setup();
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/resources/funds.json");
    let source = FileSource::new(path, Arc::new(RealFileSystem));
    SelectionStore::new(load_forest(&source, &EligibilityLabels::default()).expect("fixture loads"))
}

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

type Log = Rc<RefCell<Vec<String>>>;

struct Recorder {
    name: &'static str,
    log: Log,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Rc<Self> {
        Rc::new(Self {
            name,
            log: log.clone(),
        })
    }
}

impl SelectionObserver for Recorder {
    fn on_selection_event(&self, event: &SelectionEvent, _forest: &Forest) {
        let kind = match event {
            SelectionEvent::Applied { .. } => "applied",
            SelectionEvent::Changed { .. } => "changed",
        };
        self.log
            .borrow_mut()
            .push(format!("{}:{}:{}", self.name, kind, event.revision()));
    }
}

/// Tries to mutate the forest from inside a notification.
struct Reentrant {
    store: Weak<SelectionStore>,
    outcome: RefCell<Option<ApplicationResult<CascadeReport>>>,
}

impl SelectionObserver for Reentrant {
    fn on_selection_event(&self, _event: &SelectionEvent, _forest: &Forest) {
        if let Some(store) = self.store.upgrade() {
            *self.outcome.borrow_mut() = Some(store.toggle(None, &id("2"), true));
        }
    }
}

/// Mounts a fund-level view while a notification is being delivered.
struct Mounter {
    store: Weak<SelectionStore>,
    mounted: RefCell<Option<Rc<LevelView>>>,
}

impl SelectionObserver for Mounter {
    fn on_selection_event(&self, _event: &SelectionEvent, _forest: &Forest) {
        if let Some(store) = self.store.upgrade() {
            if self.mounted.borrow().is_none() {
                let view = LevelView::mount(&store, None).expect("mount inside callback");
                *self.mounted.borrow_mut() = Some(view);
            }
        }
    }
}

#[rstest]
fn given_two_views_when_origin_toggles_then_local_refresh_precedes_broadcast(store: Rc<SelectionStore>) {
    let log: Log = Rc::default();
    let origin = Recorder::new("origin", &log);
    let other = Recorder::new("other", &log);
    let origin_id = store.subscribe(&origin);
    let other_id = store.subscribe(&other);
    store.acknowledge(origin_id);
    store.acknowledge(other_id);

    store.toggle(Some(origin_id), &id("1-1-1"), true).unwrap();

    assert_eq!(*log.borrow(), vec!["origin:applied:1", "other:changed:1"]);
}

#[rstest]
fn given_headless_mutation_when_published_then_every_attached_view_gets_changed(store: Rc<SelectionStore>) {
    let log: Log = Rc::default();
    let a = Recorder::new("a", &log);
    let b = Recorder::new("b", &log);
    let a_id = store.subscribe(&a);
    store.subscribe(&b);
    store.acknowledge(a_id);

    store.toggle_all(None, true).unwrap();

    assert_eq!(*log.borrow(), vec!["a:changed:1"]);
    assert_eq!(store.bus().revision(), 1);
    assert_eq!(store.bus().attached_count(), 1);
}

#[rstest]
fn given_pending_view_when_mutation_missed_then_acknowledge_catches_up_once(store: Rc<SelectionStore>) {
    let view = LevelView::mount(&store, None).unwrap();
    assert!(!store.is_attached(view.view_id().unwrap()));

    store.toggle(None, &id("1"), true).unwrap();
    store.toggle(None, &id("2"), true).unwrap();

    assert_eq!(view.refresh_count(), 0);
    assert_eq!(view.indicator(&id("1")), Some(TriState::Unchecked));

    assert!(view.acknowledge().unwrap());
    assert!(!view.acknowledge().unwrap());

    assert_eq!(view.refresh_count(), 1);
    assert_eq!(view.indicator(&id("1")), Some(TriState::Indeterminate));
    assert_eq!(view.indicator(&id("2")), Some(TriState::Indeterminate));
}

#[rstest]
fn given_view_mounted_during_mutation_when_acknowledged_then_no_catch_up(store: Rc<SelectionStore>) {
    let mounter = Rc::new(Mounter {
        store: Rc::downgrade(&store),
        mounted: RefCell::new(None),
    });
    let mounter_id = store.subscribe(&mounter);
    store.acknowledge(mounter_id);

    store.toggle(None, &id("1-1-1-2"), true).unwrap();

    let view = mounter.mounted.borrow().clone().expect("view mounted");
    assert_eq!(view.indicator(&id("1")), Some(TriState::Indeterminate));
    assert!(!view.acknowledge().unwrap());
    assert_eq!(view.refresh_count(), 0);
}

#[rstest]
fn given_reentrant_toggle_when_notified_then_mutation_in_progress(store: Rc<SelectionStore>) {
    let reentrant = Rc::new(Reentrant {
        store: Rc::downgrade(&store),
        outcome: RefCell::new(None),
    });
    let reentrant_id = store.subscribe(&reentrant);
    store.acknowledge(reentrant_id);

    store.toggle(None, &id("1"), true).unwrap();

    let outcome = reentrant.outcome.borrow_mut().take();
    assert!(matches!(outcome, Some(Err(ApplicationError::MutationInProgress))));
    assert_eq!(store.state_of(&id("2")).unwrap(), TriState::Unchecked);
    assert_eq!(store.bus().revision(), 1);
}

#[rstest]
fn given_nested_views_when_leaf_clicked_then_every_level_refreshes(store: Rc<SelectionStore>) {
    let funds = LevelView::open(&store, None).unwrap();
    let custodies = funds.expand(&id("1")).unwrap();
    let instructions = custodies.expand(&id("1-1")).unwrap();
    let orders = instructions.expand(&id("1-1-1")).unwrap();
    assert_eq!(store.bus().attached_count(), 4);

    orders.click(&id("1-1-1-2")).unwrap();

    assert_eq!(orders.indicator(&id("1-1-1-2")), Some(TriState::Checked));
    assert_eq!(instructions.indicator(&id("1-1-1")), Some(TriState::Indeterminate));
    assert_eq!(custodies.indicator(&id("1-1")), Some(TriState::Indeterminate));
    assert_eq!(funds.indicator(&id("1")), Some(TriState::Indeterminate));
    for view in [&funds, &custodies, &instructions, &orders] {
        assert_eq!(view.refresh_count(), 1);
    }
}

#[rstest]
fn given_deep_node_when_revealed_then_ancestors_are_expanded(store: Rc<SelectionStore>) {
    let funds = LevelView::open(&store, None).unwrap();

    let orders = funds.reveal(&id("2-1-1-1")).unwrap();

    assert_eq!(orders.parent(), Some(&id("2-1-1")));
    assert!(funds.is_expanded(&id("2")));
    assert_eq!(store.bus().subscriber_count(), 4);
    assert!(Rc::ptr_eq(&funds.reveal(&id("2-1-1-1")).unwrap(), &orders));
}

#[rstest]
fn given_row_outside_view_when_clicked_then_unknown_node(store: Rc<SelectionStore>) {
    let funds = LevelView::open(&store, None).unwrap();

    let err = funds.click(&id("1-1")).unwrap_err();

    assert!(matches!(err, ApplicationError::Domain(_)));
    assert_eq!(store.bus().revision(), 0);
}

#[rstest]
fn given_collapsed_row_when_child_dropped_then_subscription_ends(store: Rc<SelectionStore>) {
    let funds = LevelView::open(&store, None).unwrap();
    funds.expand(&id("1")).unwrap();
    assert_eq!(store.bus().subscriber_count(), 2);

    assert!(funds.collapse(&id("1")));

    assert_eq!(store.bus().subscriber_count(), 1);
    drop(funds);
    assert_eq!(store.bus().subscriber_count(), 0);
}

#[rstest]
fn given_blocked_bus_when_flushed_then_views_refresh_once(store: Rc<SelectionStore>) {
    let funds = LevelView::open(&store, None).unwrap();
    store.bus().set_blocked(true);
    assert!(store.bus().is_blocked());

    store.toggle(None, &id("1"), true).unwrap();
    store.toggle(None, &id("2"), true).unwrap();
    assert_eq!(funds.refresh_count(), 0);

    store.bus().set_blocked(false);
    assert!(!store.bus().is_blocked());
    assert_eq!(store.flush(), 1);

    assert_eq!(funds.refresh_count(), 1);
    assert_eq!(funds.indicator(&id("2")), Some(TriState::Indeterminate));
}

#[rstest]
fn given_dropped_store_when_view_clicked_then_detached(store: Rc<SelectionStore>) {
    let funds = LevelView::open(&store, None).unwrap();
    drop(store);

    let err = funds.click(&id("1")).unwrap_err();

    assert!(matches!(err, ApplicationError::ViewDetached));
}

#[rstest]
fn given_header_when_clicked_repeatedly_then_cycles_through_states(store: Rc<SelectionStore>) {
    let header = HeaderControl::attach(&store);
    assert_eq!(header.state(), TriState::Unchecked);
    assert_eq!(header.title(), "select all");

    header.click().unwrap();
    assert_eq!(header.state(), TriState::Indeterminate);
    assert_eq!(store.stats().selected, 3);

    header.click().unwrap();
    assert_eq!(header.state(), TriState::Checked);
    assert_eq!(header.title(), "clear all");

    header.click().unwrap();
    assert_eq!(header.state(), TriState::Unchecked);
    assert_eq!(store.stats().selected, 0);
}

#[rstest]
fn given_panel_when_selection_changes_then_primary_actions_follow(store: Rc<SelectionStore>) {
    let panel = ActionPanel::attach(&store, default_actions());
    let funds = LevelView::open(&store, None).unwrap();

    let disabled: Vec<_> = panel.actions().into_iter().filter(|a| !a.enabled).collect();
    assert_eq!(disabled.len(), 2);
    assert!(disabled.iter().all(|a| a.spec.variant == ActionVariant::Primary));
    assert_eq!(panel.summary_line(), "selected: 0/6 (actionable 0/3)");

    funds.click(&id("2")).unwrap();

    assert!(panel.actions().iter().all(|a| a.enabled));
    assert_eq!(panel.summary_line(), "selected: 1/6 (actionable 1/3)");
}
