//! Parley conversation core.
//!
//! Keeps the local view of a two-party thread consistent with the remote
//! store:
//! - `MessageStore`: ordered, id-unique message set with idempotent mutations
//! - `ConversationSession`: Idle/Loading/Ready lifecycle, send and delete
//!   reconciliation, stale-response guard
//! - `ComposerState` / `MenuState`: draft, emoji picker and action menu
//! - `ConversationView`: event loop running requests concurrently on one task

pub mod composer;
pub mod error;
pub mod menu;
pub mod presentation;
pub mod render;
pub mod session;
pub mod store;
pub mod transport;
pub mod view;

pub use composer::{ComposerState, Interaction, InteractionSource, Region};
pub use error::{ErrorKind, Notice, Operation, TransportError};
pub use menu::MenuState;
pub use presentation::{EMPTY_THREAD_PLACEHOLDER, TextDirection, sender_label, thread_title};
pub use render::{ChannelSink, NullSink, RenderSink, TracingSink, ViewEvent};
pub use session::{ConversationSession, DeleteTicket, LoadTicket, SendTicket, SessionState};
pub use store::{MessageStore, StoreChange};
pub use transport::MessageTransport;
pub use view::{ConversationView, UiCommand, ViewHandle};
