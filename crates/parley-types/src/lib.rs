//! Parley wire and domain types.
//!
//! Shared by the conversation core, the HTTP transport and the terminal
//! front end so each layer speaks the same message shape.

pub mod api;
pub mod models;

pub use api::{ErrorResponse, MessageCreatedResponse, NewMessage, ThreadResponse};
pub use models::{ConversationKey, Message, MessageId, UserId};
