//! Render notifications.
//!
//! The session reports every state change as a [`ViewEvent`] to a
//! [`RenderSink`]. Sinks can draw, forward the event to subscribers, log it,
//! or drop it.

use std::fmt;
use std::sync::Arc;

use parley_types::{Message, MessageId, UserId};
use tokio::sync::broadcast;

use crate::error::Notice;
use crate::session::SessionState;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// The message list changed. `scroll_to_newest` is set when the tail grew.
    Messages {
        snapshot: Vec<Message>,
        scroll_to_newest: bool,
    },
    Composer {
        draft: String,
        picker_open: bool,
        can_send: bool,
    },
    Menu { target: Option<MessageId> },
    Session {
        state: SessionState,
        peer: Option<UserId>,
    },
    Notice(Notice),
    NoticeDismissed,
}

impl fmt::Display for ViewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Messages { snapshot, scroll_to_newest } => {
                write!(f, "messages len={} scroll={}", snapshot.len(), scroll_to_newest)
            }
            Self::Composer { draft, picker_open, can_send } => {
                write!(f, "composer chars={} picker={} can_send={}", draft.chars().count(), picker_open, can_send)
            }
            Self::Menu { target: Some(id) } => write!(f, "menu open={}", id),
            Self::Menu { target: None } => write!(f, "menu closed"),
            Self::Session { state, peer: Some(peer) } => write!(f, "session {:?} peer={}", state, peer),
            Self::Session { state, peer: None } => write!(f, "session {:?}", state),
            Self::Notice(notice) => write!(f, "notice: {}", notice),
            Self::NoticeDismissed => write!(f, "notice dismissed"),
        }
    }
}

/// Receiver of view events. Called synchronously from the event loop.
pub trait RenderSink: Send + Sync {
    fn notify(&self, event: &ViewEvent);
}

impl<S: RenderSink + ?Sized> RenderSink for Arc<S> {
    fn notify(&self, event: &ViewEvent) {
        (**self).notify(event)
    }
}

/// Sink that writes every event to `tracing`.
pub struct TracingSink;

impl RenderSink for TracingSink {
    fn notify(&self, event: &ViewEvent) {
        match event {
            ViewEvent::Notice(_) | ViewEvent::Session { .. } => tracing::debug!("{}", event),
            _ => tracing::trace!("{}", event),
        }
    }
}

/// Sink that discards all events.
pub struct NullSink;

impl RenderSink for NullSink {
    fn notify(&self, _event: &ViewEvent) {}
}

/// Sink that broadcasts events to any number of subscribers.
///
/// Events sent while nobody is subscribed are dropped.
#[derive(Clone)]
pub struct ChannelSink {
    tx: broadcast::Sender<ViewEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.tx.subscribe()
    }
}

impl RenderSink for ChannelSink {
    fn notify(&self, event: &ViewEvent) {
        let _ = self.tx.send(event.clone());
    }
}
