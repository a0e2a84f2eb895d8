//! In-process event source.

use super::{EventKind, EventSource, GestureEvent, Handler};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type SharedHandler = Rc<RefCell<Handler>>;

/// Event source driven by explicit [`dispatch`](LocalEventSource::dispatch) calls.
///
/// Handlers run in subscription order. A handler that is already running
/// (re-entrant dispatch) is skipped for the nested event.
pub struct LocalEventSource {
    handlers: RefCell<Vec<(EventKind, SharedHandler)>>,
    enabled: Cell<bool>,
}

impl LocalEventSource {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            enabled: Cell::new(true),
        }
    }

    /// Deliver `event` to its subscribers. Returns how many handlers ran.
    pub fn dispatch(&self, event: &mut GestureEvent) -> usize {
        let kind = event.kind();
        if kind.is_recognition() && !self.enabled.get() {
            log::debug!("Recognition disabled, dropping {}", kind);
            return 0;
        }

        // Snapshot so handlers may subscribe or toggle the source while running.
        let matching: Vec<SharedHandler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, h)| Rc::clone(h))
            .collect();

        let mut delivered = 0;
        for handler in matching {
            match handler.try_borrow_mut() {
                Ok(mut handler) => {
                    let handler: &mut Handler = &mut handler;
                    handler(event);
                    delivered += 1;
                }
                Err(_) => log::warn!("Skipping re-entrant {} handler", kind),
            }
        }
        delivered
    }

    /// Number of handlers subscribed to `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.borrow().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl Default for LocalEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for LocalEventSource {
    fn subscribe(&self, kind: EventKind, handler: Handler) {
        self.handlers
            .borrow_mut()
            .push((kind, Rc::new(RefCell::new(handler))));
    }

    fn disable(&self) {
        self.enabled.set(false);
    }

    fn enable(&self) {
        self.enabled.set(true);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}
