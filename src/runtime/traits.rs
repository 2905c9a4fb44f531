//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the dispatcher with mock implementations.

use crate::script::Payload;
use crate::state_machine::UserId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound side of a transport
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError>;

    /// Deliver the payload. Implementations report an unavailable payload
    /// to the user themselves.
    async fn send_payload(&self, user_id: UserId, payload: &Payload) -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    async fn send_text(&self, user_id: UserId, text: &str) -> Result<(), DeliveryError> {
        (**self).send_text(user_id, text).await
    }

    async fn send_payload(&self, user_id: UserId, payload: &Payload) -> Result<(), DeliveryError> {
        (**self).send_payload(user_id, payload).await
    }
}
