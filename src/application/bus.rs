//! Synchronization bus between views of one forest.
//!
//! Every view that renders part of the shared forest subscribes here. A
//! subscription starts out *pending*: the view is still initializing and
//! receives nothing. Once it acknowledges attachment it is *attached* and
//! takes part in broadcasts. The bus tracks a revision counter that advances
//! once per applied mutation; each subscription remembers the last revision
//! it was told about, so a view that acknowledges after missing a mutation
//! gets exactly one catch-up notification.
//!
//! Delivery never holds the subscription table borrowed while an observer
//! runs, so observers may subscribe or drop views from inside a callback.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};
use tracing::{instrument, trace};

use crate::domain::{Forest, NodeId};

new_key_type! {
    /// Identifier of a bus subscription, one per live view.
    pub struct ViewId;
}

/// What a mutation was aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Node(NodeId),
    /// The forest-wide header control
    Forest,
}

/// Notification delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Sent synchronously to the originating view only, before any broadcast.
    Applied {
        revision: u64,
        target: Target,
        changed: Vec<NodeId>,
    },
    /// Sent to every attached view that has not seen `revision` yet.
    Changed {
        revision: u64,
        origin: Option<ViewId>,
    },
}

impl SelectionEvent {
    pub fn revision(&self) -> u64 {
        match self {
            SelectionEvent::Applied { revision, .. } | SelectionEvent::Changed { revision, .. } => {
                *revision
            }
        }
    }
}

/// Receiver of selection notifications.
///
/// The forest is passed read-only; observers re-evaluate whatever they
/// display from it. Requesting a mutation from inside a callback fails with
/// `MutationInProgress`.
pub trait SelectionObserver {
    fn on_selection_event(&self, event: &SelectionEvent, forest: &Forest);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Attached,
}

struct Subscription {
    observer: Weak<dyn SelectionObserver>,
    phase: Phase,
    seen: u64,
}

/// Subscription registry and revision counter.
pub struct SyncBus {
    subscriptions: RefCell<SlotMap<ViewId, Subscription>>,
    revision: Cell<u64>,
    blocked: Cell<bool>,
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncBus {
    pub fn new() -> Self {
        Self {
            subscriptions: RefCell::new(SlotMap::with_key()),
            revision: Cell::new(0),
            blocked: Cell::new(false),
        }
    }

    /// Register an observer in the pending phase.
    ///
    /// The bus keeps only a weak reference; dropping the observer ends its
    /// subscription at the next delivery.
    pub fn subscribe<O: SelectionObserver + 'static>(&self, observer: &Rc<O>) -> ViewId {
        let observer: Rc<dyn SelectionObserver> = observer.clone();
        let id = self.subscriptions.borrow_mut().insert(Subscription {
            observer: Rc::downgrade(&observer),
            phase: Phase::Pending,
            seen: self.revision.get(),
        });
        trace!(?id, revision = self.revision.get(), "view subscribed");
        id
    }

    /// Complete the attach handshake for `id`.
    ///
    /// Returns `true` if a catch-up notification was delivered because the
    /// view missed at least one revision while pending.
    #[instrument(level = "trace", skip(self, forest))]
    pub fn acknowledge(&self, id: ViewId, forest: &Forest) -> bool {
        let revision = self.revision.get();
        let observer = {
            let mut subs = self.subscriptions.borrow_mut();
            let Some(sub) = subs.get_mut(id) else {
                return false;
            };
            sub.phase = Phase::Attached;
            if sub.seen >= revision || self.blocked.get() {
                return false;
            }
            sub.seen = revision;
            sub.observer.upgrade()
        };

        match observer {
            Some(observer) => {
                observer.on_selection_event(&SelectionEvent::Changed { revision, origin: None }, forest);
                true
            }
            None => {
                self.unsubscribe(id);
                false
            }
        }
    }

    pub fn unsubscribe(&self, id: ViewId) -> bool {
        self.subscriptions.borrow_mut().remove(id).is_some()
    }

    pub fn phase(&self, id: ViewId) -> Option<Phase> {
        self.subscriptions.borrow().get(id).map(|s| s.phase)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    pub fn attached_count(&self) -> usize {
        self.subscriptions
            .borrow()
            .values()
            .filter(|s| s.phase == Phase::Attached)
            .count()
    }

    /// Revision of the last applied mutation, 0 before the first one.
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    /// Suspend broadcasts. Revisions keep advancing; `flush` catches views up.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.set(blocked);
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.get()
    }

    pub(crate) fn advance(&self) -> u64 {
        let next = self.revision.get() + 1;
        self.revision.set(next);
        next
    }

    /// Deliver `event` to the originating view only.
    pub(crate) fn deliver_local(&self, origin: ViewId, event: &SelectionEvent, forest: &Forest) -> bool {
        let observer = {
            let mut subs = self.subscriptions.borrow_mut();
            let Some(sub) = subs.get_mut(origin) else {
                return false;
            };
            sub.seen = sub.seen.max(event.revision());
            sub.observer.upgrade()
        };
        match observer {
            Some(observer) => {
                observer.on_selection_event(event, forest);
                true
            }
            None => false,
        }
    }

    /// Deliver `Changed` for the current revision to every attached view that
    /// has not seen it. Returns the number of observers notified.
    #[instrument(level = "trace", skip(self, forest))]
    pub(crate) fn broadcast(&self, origin: Option<ViewId>, forest: &Forest) -> usize {
        if self.blocked.get() {
            trace!("bus blocked, broadcast deferred");
            return 0;
        }
        let revision = self.revision.get();

        let (targets, dead) = {
            let mut subs = self.subscriptions.borrow_mut();
            let mut targets: Vec<Rc<dyn SelectionObserver>> = Vec::new();
            let mut dead = Vec::new();
            for (id, sub) in subs.iter_mut() {
                if sub.phase != Phase::Attached || sub.seen >= revision {
                    continue;
                }
                match sub.observer.upgrade() {
                    Some(observer) => {
                        sub.seen = revision;
                        targets.push(observer);
                    }
                    None => dead.push(id),
                }
            }
            for id in &dead {
                subs.remove(*id);
            }
            (targets, dead)
        };

        trace!(
            revision,
            notified = targets.len(),
            pruned = dead.len(),
            "broadcasting selection change"
        );
        let event = SelectionEvent::Changed { revision, origin };
        for observer in &targets {
            observer.on_selection_event(&event, forest);
        }
        targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<SelectionEvent>>,
    }

    impl SelectionObserver for Recorder {
        fn on_selection_event(&self, event: &SelectionEvent, _forest: &Forest) {
            self.events.borrow_mut().push(event.clone());
        }
    }

    #[test]
    fn given_pending_subscriber_when_broadcasting_then_it_is_skipped() {
        let bus = SyncBus::new();
        let forest = Forest::new();
        let recorder = Rc::new(Recorder::default());
        let id = bus.subscribe(&recorder);

        bus.advance();
        assert_eq!(bus.broadcast(None, &forest), 0);
        assert_eq!(bus.phase(id), Some(Phase::Pending));
        assert!(recorder.events.borrow().is_empty());
    }

    #[test]
    fn given_missed_revision_when_acknowledging_then_delivers_one_catch_up() {
        let bus = SyncBus::new();
        let forest = Forest::new();
        let recorder = Rc::new(Recorder::default());
        let id = bus.subscribe(&recorder);
        bus.advance();
        bus.advance();

        assert!(bus.acknowledge(id, &forest));
        assert!(!bus.acknowledge(id, &forest));
        assert_eq!(
            *recorder.events.borrow(),
            vec![SelectionEvent::Changed { revision: 2, origin: None }]
        );
    }

    #[test]
    fn given_dropped_observer_when_broadcasting_then_subscription_is_pruned() {
        let bus = SyncBus::new();
        let forest = Forest::new();
        let recorder = Rc::new(Recorder::default());
        let id = bus.subscribe(&recorder);
        bus.acknowledge(id, &forest);
        drop(recorder);

        bus.advance();
        assert_eq!(bus.broadcast(None, &forest), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn given_blocked_bus_when_unblocked_then_broadcast_catches_up() {
        let bus = SyncBus::new();
        let forest = Forest::new();
        let recorder = Rc::new(Recorder::default());
        let id = bus.subscribe(&recorder);
        bus.acknowledge(id, &forest);

        bus.set_blocked(true);
        bus.advance();
        assert_eq!(bus.broadcast(None, &forest), 0);
        bus.advance();
        bus.set_blocked(false);
        assert_eq!(bus.broadcast(None, &forest), 1);
        assert_eq!(recorder.events.borrow().len(), 1);
        assert_eq!(recorder.events.borrow()[0].revision(), 2);
    }
}
