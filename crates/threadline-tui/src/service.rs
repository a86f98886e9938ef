//! Session service collaborator.
//!
//! Revert, unrevert and message fetches go to the server. The engine never
//! calls these directly: it emits a [`ServiceCall`] and the actor runs it in
//! the background, feeding the [`ServiceOutcome`] back as a message.

use async_trait::async_trait;
use thiserror::Error;
use threadline_core::{MessageWithParts, Session};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("session service unavailable")]
    Unavailable,
}

/// Remote operations on a session.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Move the revert boundary to `message_id`. Returns the updated session.
    async fn revert(
        &self,
        session_id: &str,
        message_id: &str,
        part_id: Option<&str>,
    ) -> Result<Session, ServiceError>;

    /// Clear the revert boundary.
    async fn unrevert(&self, session_id: &str) -> Result<Session, ServiceError>;

    /// Fetch one message, typically from a child session.
    async fn fetch_message(
        &self,
        session_id: &str,
        message_id: &str,
    ) -> Result<MessageWithParts, ServiceError>;
}

/// Service for offline use: every call fails with [`ServiceError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedService;

#[async_trait]
impl SessionService for DetachedService {
    async fn revert(&self, _: &str, _: &str, _: Option<&str>) -> Result<Session, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn unrevert(&self, _: &str) -> Result<Session, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn fetch_message(&self, _: &str, _: &str) -> Result<MessageWithParts, ServiceError> {
        Err(ServiceError::Unavailable)
    }
}

/// A request the engine wants executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    Revert {
        session_id: String,
        message_id: String,
        part_id: Option<String>,
    },
    Unrevert {
        session_id: String,
    },
    /// Preview the tool call behind a permission raised in another session.
    FetchMessage {
        session_id: String,
        message_id: String,
        permission_id: String,
    },
}

/// Result of a [`ServiceCall`], delivered back to the engine.
#[derive(Debug, Clone)]
pub enum ServiceOutcome {
    /// Revert or unrevert finished.
    Reverted(Result<Session, ServiceError>),
    Fetched {
        permission_id: String,
        result: Result<MessageWithParts, ServiceError>,
    },
}

impl ServiceCall {
    pub async fn execute(self, service: &dyn SessionService) -> ServiceOutcome {
        match self {
            ServiceCall::Revert {
                session_id,
                message_id,
                part_id,
            } => ServiceOutcome::Reverted(
                service
                    .revert(&session_id, &message_id, part_id.as_deref())
                    .await,
            ),
            ServiceCall::Unrevert { session_id } => {
                ServiceOutcome::Reverted(service.unrevert(&session_id).await)
            }
            ServiceCall::FetchMessage {
                session_id,
                message_id,
                permission_id,
            } => ServiceOutcome::Fetched {
                permission_id,
                result: service.fetch_message(&session_id, &message_id).await,
            },
        }
    }
}
