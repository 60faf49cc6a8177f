//! Navigation notifications.
//!
//! The navigator publishes [`NavEvent`]s on an [`EventBus`]. Components
//! subscribe a [`NavListener`] and never hold a reference to the
//! navigator itself. [`ChannelListener`] forwards events into an mpsc
//! channel for consumers living elsewhere.

use std::sync::mpsc::{self, Receiver, Sender};

use pjax_html::{Document, NodeId};

// -------------------------------------------------------------------
// NavEvent
// -------------------------------------------------------------------

/// A notification published during a navigation.
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    /// The fragment was extracted and is about to replace the content.
    BeforeReplace {
        url: String,
        path: String,
        /// Markup of the extracted fragment.
        content: String,
    },

    /// The swap finished and the target page's `on_load` ran.
    Complete {
        url: String,
        path: String,
        title: String,
    },

    /// Published right after [`NavEvent::Complete`].
    AfterReplace { url: String, path: String },

    /// A custom element inside the new content was reinitialized.
    Reinitialize {
        /// The custom element.
        target: NodeId,
        tag: String,
        /// Bubbling path: the target first, then each ancestor up to and
        /// including the content container.
        path: Vec<NodeId>,
        /// Always `true` for swaps done by the navigator.
        pjax: bool,
    },
}

impl NavEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeforeReplace { .. } => "pjax:before-replace",
            Self::Complete { .. } => "pjax:complete",
            Self::AfterReplace { .. } => "pjax:after-replace",
            Self::Reinitialize { .. } => "component:reinitialize",
        }
    }
}

// -------------------------------------------------------------------
// Listeners
// -------------------------------------------------------------------

/// Observer of navigation events. Listeners may mutate the live
/// document (outside the content container).
pub trait NavListener {
    fn on_event(&mut self, event: &NavEvent, document: &mut Document);
}

/// Handle returned by [`EventBus::subscribe`].
pub type ListenerId = u64;

/// Ordered list of listeners; events are delivered in subscription
/// order.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, Box<dyn NavListener>)>,
    next_id: ListenerId,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn NavListener>) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Remove and return a listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> Option<Box<dyn NavListener>> {
        let pos = self.listeners.iter().position(|(lid, _)| *lid == id)?;
        Some(self.listeners.remove(pos).1)
    }

    pub fn emit(&mut self, event: &NavEvent, document: &mut Document) {
        log::trace!("Emitting {}", event.name());
        for (_, listener) in &mut self.listeners {
            listener.on_event(event, document);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Forwards a clone of every event into an mpsc channel.
pub struct ChannelListener {
    tx: Sender<NavEvent>,
}

impl ChannelListener {
    pub fn new(tx: Sender<NavEvent>) -> Self {
        Self { tx }
    }

    /// A listener and the receiving end of its channel.
    pub fn channel() -> (Self, Receiver<NavEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }
}

impl NavListener for ChannelListener {
    fn on_event(&mut self, event: &NavEvent, _document: &mut Document) {
        if self.tx.send(event.clone()).is_err() {
            log::debug!("Receiver dropped; {} not delivered", event.name());
        }
    }
}
