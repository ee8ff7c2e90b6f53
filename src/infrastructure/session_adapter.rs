//! Session Manager Adapter - Implements the host-facing ports over WebSocket sessions
//!
//! Notifications, the user directory, the approval channel and interactive
//! advancement workflows all reach users through their connected clients.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tracing::debug;

use crate::application::dto::ApprovalMessage;
use crate::application::ports::outbound::{
    AdvancementHostError, AdvancementHostPort, AdvancementWorkflow, ApprovalChannelPort,
    ChannelError, ChatMessage, Notification, NotificationPort, UserDirectoryError,
    UserDirectoryPort,
};
use crate::domain::entities::{OwnedItem, UserInfo};
use crate::domain::value_objects::{ActorId, UserId, WorkflowId};
use crate::infrastructure::session::{ClientId, SessionError, SessionManager, WorkflowResult};
use crate::infrastructure::websocket::ServerMessage;

const APPROVAL_CHANNEL_CAPACITY: usize = 64;

/// Adapter that wraps SessionManager and implements the host ports
#[derive(Clone)]
pub struct SessionManagerAdapter {
    inner: Arc<RwLock<SessionManager>>,
    approvals: broadcast::Sender<ApprovalMessage>,
}

impl Default for SessionManagerAdapter {
    fn default() -> Self {
        Self::new(Arc::new(RwLock::new(SessionManager::new())))
    }
}

impl SessionManagerAdapter {
    pub fn new(manager: Arc<RwLock<SessionManager>>) -> Self {
        let (approvals, _) = broadcast::channel(APPROVAL_CHANNEL_CAPACITY);
        Self {
            inner: manager,
            approvals,
        }
    }

    /// Get the inner SessionManager (for infrastructure-level operations)
    pub fn inner(&self) -> &Arc<RwLock<SessionManager>> {
        &self.inner
    }

    pub async fn connect(&self, user: UserInfo, sender: mpsc::UnboundedSender<ServerMessage>) -> ClientId {
        let client_id = ClientId::new();
        self.inner.write().await.join(client_id, user, sender);
        client_id
    }

    pub async fn disconnect(&self, client_id: ClientId) {
        self.inner.write().await.leave(client_id);
    }

    /// Every connection listens to the approval protocol
    pub fn subscribe_approvals(&self) -> broadcast::Receiver<ApprovalMessage> {
        self.approvals.subscribe()
    }

    /// A client reports that the user finished a workflow
    pub async fn complete_workflow(
        &self,
        client_id: ClientId,
        workflow_id: WorkflowId,
        items: Vec<OwnedItem>,
    ) -> Result<(), SessionError> {
        self.inner
            .write()
            .await
            .finish_workflow(workflow_id, client_id, Ok(items))
    }

    /// A client reports that the user dismissed a workflow
    pub async fn cancel_workflow(
        &self,
        client_id: ClientId,
        workflow_id: WorkflowId,
    ) -> Result<(), SessionError> {
        self.inner.write().await.finish_workflow(
            workflow_id,
            client_id,
            Err(AdvancementHostError::Cancelled(workflow_id)),
        )
    }

    /// A client reports that its advancement manager errored
    pub async fn fail_workflow(
        &self,
        client_id: ClientId,
        workflow_id: WorkflowId,
        error: String,
    ) -> Result<(), SessionError> {
        self.inner.write().await.finish_workflow(
            workflow_id,
            client_id,
            Err(AdvancementHostError::Host(error)),
        )
    }
}

#[async_trait]
impl NotificationPort for SessionManagerAdapter {
    async fn notify(&self, user: &UserId, notification: Notification) {
        let delivered = self
            .inner
            .read()
            .await
            .send_to_user(user, &ServerMessage::Notification { notification });
        if delivered == 0 {
            debug!(user_id = %user, "Notification dropped, user not connected");
        }
    }

    async fn post_chat(&self, message: ChatMessage) {
        self.inner.read().await.broadcast(&ServerMessage::Chat { message });
    }
}

#[async_trait]
impl UserDirectoryPort for SessionManagerAdapter {
    async fn get_user(&self, id: &UserId) -> Option<UserInfo> {
        self.inner.read().await.user(id)
    }

    async fn assign_character(&self, id: &UserId, actor_id: ActorId) -> Result<(), UserDirectoryError> {
        let mut sessions = self.inner.write().await;
        if !sessions.assign_character(id, actor_id) {
            return Err(UserDirectoryError::NotFound(id.clone()));
        }
        sessions.send_to_user(id, &ServerMessage::CharacterAssigned { actor_id });
        Ok(())
    }
}

#[async_trait]
impl ApprovalChannelPort for SessionManagerAdapter {
    async fn publish(&self, message: ApprovalMessage) -> Result<(), ChannelError> {
        self.approvals
            .send(message)
            .map(|listeners| debug!(listeners, "Published approval message"))
            .map_err(|_| ChannelError::NoListeners)
    }
}

#[async_trait]
impl AdvancementHostPort for SessionManagerAdapter {
    async fn create_workflow(
        &self,
        user: &UserId,
        actor_id: ActorId,
        item: OwnedItem,
    ) -> Result<Box<dyn AdvancementWorkflow>, AdvancementHostError> {
        let mut sessions = self.inner.write().await;
        let client_id = sessions
            .primary_client(user)
            .ok_or_else(|| SessionError::NoSession(user.clone()))?;

        let id = WorkflowId::new();
        let receiver = sessions.register_workflow(id, client_id);
        debug!(workflow_id = %id, client_id = %client_id, item = %item.name, "Workflow registered");

        Ok(Box::new(WsAdvancementWorkflow {
            id,
            user: user.clone(),
            client_id,
            actor_id,
            item,
            sessions: self.inner.clone(),
            receiver: Some(receiver),
            open: true,
        }))
    }

    async fn open_sheet(&self, user: &UserId, actor_id: ActorId) -> Result<(), AdvancementHostError> {
        let sessions = self.inner.read().await;
        let client_id = sessions
            .primary_client(user)
            .ok_or_else(|| SessionError::NoSession(user.clone()))?;
        if !sessions.send_to_client(client_id, ServerMessage::OpenSheet { actor_id }) {
            return Err(SessionError::NoSession(user.clone()).into());
        }
        Ok(())
    }
}

/// An advancement workflow rendered on one client of the driving user
pub struct WsAdvancementWorkflow {
    id: WorkflowId,
    user: UserId,
    client_id: ClientId,
    actor_id: ActorId,
    item: OwnedItem,
    sessions: Arc<RwLock<SessionManager>>,
    receiver: Option<oneshot::Receiver<WorkflowResult>>,
    open: bool,
}

#[async_trait]
impl AdvancementWorkflow for WsAdvancementWorkflow {
    fn id(&self) -> WorkflowId {
        self.id
    }

    async fn render(&mut self) -> Result<(), AdvancementHostError> {
        let message = ServerMessage::RenderAdvancement {
            workflow_id: self.id,
            actor_id: self.actor_id,
            item: self.item.clone(),
        };
        if !self.sessions.read().await.send_to_client(self.client_id, message) {
            return Err(AdvancementHostError::NoSession(self.user.clone()));
        }
        Ok(())
    }

    async fn completion(&mut self) -> Result<Vec<OwnedItem>, AdvancementHostError> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Err(AdvancementHostError::Closed(self.id));
        };

        // awaiting through `&mut` keeps the receiver if this future is dropped
        let result = match receiver.await {
            Ok(result) => result,
            Err(_) => Err(AdvancementHostError::Closed(self.id)),
        };
        self.receiver = None;
        self.open = false;
        result
    }

    async fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.receiver = None;

        let mut sessions = self.sessions.write().await;
        sessions.discard_workflow(self.id);
        sessions.send_to_client(
            self.client_id,
            ServerMessage::CloseAdvancement {
                workflow_id: self.id,
            },
        );
        debug!(workflow_id = %self.id, "Workflow closed");
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
