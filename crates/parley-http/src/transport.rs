use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use parley_core::{MessageTransport, TransportError};
use parley_types::{
    ErrorResponse, Message, MessageCreatedResponse, MessageId, NewMessage, ThreadResponse, UserId,
};

use crate::config::ClientConfig;

/// REST client for the message store.
///
/// Routes:
/// - `GET    /messages/{a}/{b}` thread between two users
/// - `POST   /messages/send`    create a message
/// - `DELETE /messages/{id}`    delete a message
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(Client::new(), &config.server_url, &config.token)
    }

    pub fn with_client(client: Client, base_url: &str, token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL extended by `segments`, each percent-encoded as one path
    /// segment so ids cannot change the route.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let invalid = || TransportError::Network(format!("invalid server url {}", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Best effort: the store usually explains itself in a JSON body.
        let body = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("no reason given").to_string()
                } else {
                    body.trim().to_string()
                }
            });
        warn!(status = status.as_u16(), "{}", reason);
        Err(status_error(status, reason))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::UnexpectedResponse {
            status: Some(status.as_u16()),
            reason: format!("invalid body: {}", e),
        })
    }
}

/// Map a non-success status onto the error kinds the session understands.
pub fn status_error(status: StatusCode, reason: String) -> TransportError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError::Authentication(reason),
        StatusCode::NOT_FOUND => TransportError::NotFound(reason),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => TransportError::Validation(reason),
        _ => TransportError::UnexpectedResponse {
            status: Some(status.as_u16()),
            reason,
        },
    }
}

impl MessageTransport for HttpTransport {
    async fn fetch_thread(&self, a: &UserId, b: &UserId) -> Result<Vec<Message>, TransportError> {
        let url = self.endpoint(&["messages", a.as_str(), b.as_str()])?;
        debug!(%url, "fetching thread");
        let response = self.execute(self.client.get(url)).await?;
        let thread: ThreadResponse = Self::decode(response).await?;
        Ok(thread.messages)
    }

    async fn create_message(&self, message: &NewMessage) -> Result<Message, TransportError> {
        let url = self.endpoint(&["messages", "send"])?;
        debug!(receiver = %message.receiver, "creating message");
        let response = self.execute(self.client.post(url).json(message)).await?;
        let created: MessageCreatedResponse = Self::decode(response).await?;
        Ok(created.message)
    }

    async fn delete_message(&self, id: &MessageId) -> Result<(), TransportError> {
        let url = self.endpoint(&["messages", id.as_str()])?;
        debug!(%id, "deleting message");
        self.execute(self.client.delete(url)).await?;
        Ok(())
    }
}
