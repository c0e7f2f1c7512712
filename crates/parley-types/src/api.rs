use serde::{Deserialize, Serialize};

use crate::models::{Message, UserId};

// -- Messages --

/// Body of a message creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender: UserId,
    pub receiver: UserId,
    pub text: String,
}

/// Reply to a thread fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadResponse {
    pub messages: Vec<Message>,
}

/// Reply to a message creation, carrying the store-assigned id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreatedResponse {
    pub message: Message,
}

/// Error body returned by the store on non-success statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}
