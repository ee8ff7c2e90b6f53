//! Notification port - Fire-and-forget user notifications and chat messages

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ActorId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    /// Stable key the client may localize, e.g. `no-class`
    pub code: Option<String>,
    pub message: String,
    /// Persistent notifications stay until dismissed
    pub permanent: bool,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            code: None,
            message: message.into(),
            permanent: false,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            code: None,
            message: message.into(),
            permanent: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            code: None,
            message: message.into(),
            permanent: true,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub speaker: String,
    pub actor_id: Option<ActorId>,
    pub content: String,
}

/// Port for user-visible messages. Delivery is best effort and never fails
/// the caller.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn notify(&self, user: &UserId, notification: Notification);

    async fn post_chat(&self, message: ChatMessage);
}
