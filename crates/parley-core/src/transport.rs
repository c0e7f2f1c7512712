use std::future::Future;

use parley_types::{Message, MessageId, NewMessage, UserId};

use crate::error::TransportError;

/// Remote message store as seen by a conversation.
///
/// Implementations own credential handling; the core only sees typed results.
pub trait MessageTransport: Send + Sync {
    /// All messages exchanged between `a` and `b`, in any order.
    fn fetch_thread(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> impl Future<Output = Result<Vec<Message>, TransportError>> + Send;

    /// Persist a new message. The reply carries the store-assigned id and timestamp.
    fn create_message(
        &self,
        message: &NewMessage,
    ) -> impl Future<Output = Result<Message, TransportError>> + Send;

    fn delete_message(&self, id: &MessageId) -> impl Future<Output = Result<(), TransportError>> + Send;
}
