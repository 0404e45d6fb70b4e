//! Outbound notifications.

use crate::connection::ConnectionId;
use crate::shapes::WidgetId;

/// Something listeners may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagramEvent {
    /// The user tied two widgets together.
    LinkTied {
        start: WidgetId,
        end: WidgetId,
        connection: ConnectionId,
    },
    /// A connection between two widgets was removed.
    LinkUntied {
        start: WidgetId,
        end: WidgetId,
        connection: ConnectionId,
    },
    /// Anything on the diagram changed.
    DiagramChanged,
}

/// Handle returned by [`EventBus::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&DiagramEvent)>;

/// Fire-and-forget dispatch to any number of listeners.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&DiagramEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the listener was already gone.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: DiagramEvent) {
        if self.listeners.is_empty() {
            return;
        }
        log::debug!("Emitting {:?}", event);
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
