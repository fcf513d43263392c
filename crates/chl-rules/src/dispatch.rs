//! Event dispatch table.
//!
//! Handlers are kept per [`EventKind`] in a fixed order: every `Normal`
//! handler runs before any `Monitor` handler, and within a slot handlers run
//! in registration order. Handlers only see the event by shared reference.

use std::collections::HashMap;

use chl_core::{DomainEvent, EventKind};

/// Ordering slot of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DispatchSlot {
    /// Runs first.
    Normal,
    /// Read-only observers that run after every `Normal` handler.
    Monitor,
}

/// A handler closure over context `C`.
pub type Handler<C> = Box<dyn FnMut(&DomainEvent, &mut C) + Send>;

struct Registered<C> {
    slot: DispatchSlot,
    seq: u64,
    handler: Handler<C>,
}

/// Ordered handler lists keyed by event kind.
pub struct EventDispatcher<C> {
    table: HashMap<EventKind, Vec<Registered<C>>>,
    next_seq: u64,
}

impl<C> std::fmt::Debug for EventDispatcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self.table.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventDispatcher")
            .field("handlers", &counts)
            .finish()
    }
}

impl<C> Default for EventDispatcher<C> {
    fn default() -> Self {
        Self {
            table: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<C> EventDispatcher<C> {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler for `kind` in `slot`.
    pub fn subscribe(&mut self, kind: EventKind, slot: DispatchSlot, handler: Handler<C>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let handlers = self.table.entry(kind).or_default();
        let at = handlers.partition_point(|h| (h.slot, h.seq) < (slot, seq));
        handlers.insert(at, Registered { slot, seq, handler });
    }

    /// Deliver `event` to every handler subscribed to its kind, in order.
    /// Returns how many handlers ran.
    pub fn dispatch(&mut self, event: &DomainEvent, ctx: &mut C) -> usize {
        let Some(handlers) = self.table.get_mut(&event.kind()) else {
            return 0;
        };
        for registered in handlers.iter_mut() {
            (registered.handler)(event, ctx);
        }
        handlers.len()
    }

    /// Number of handlers subscribed to `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.table.get(&kind).map(Vec::len).unwrap_or(0)
    }
}
