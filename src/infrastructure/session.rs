//! Session management for connected host clients
//!
//! Tracks every WebSocket connection, the user behind it, and the
//! advancement workflows currently waiting on a client to finish.
//! A user may be connected from several clients at once; interactive
//! work goes to their most recent connection.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};

use crate::application::ports::outbound::AdvancementHostError;
use crate::domain::entities::{OwnedItem, UserInfo};
use crate::domain::value_objects::{ActorId, UserId, WorkflowId};
use crate::infrastructure::websocket::ServerMessage;

/// Unique identifier for a connected client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(uuid::Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type WorkflowResult = Result<Vec<OwnedItem>, AdvancementHostError>;

/// A connected client
#[derive(Debug, Clone)]
pub struct SessionParticipant {
    pub client_id: ClientId,
    pub user: UserInfo,
    pub joined_at: DateTime<Utc>,
    /// Channel to send messages to this client
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

/// A workflow rendered on a client and waiting for its completion report
#[derive(Debug)]
struct PendingWorkflow {
    client_id: ClientId,
    completion: oneshot::Sender<WorkflowResult>,
}

/// Error types for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("User {0} has no connected client")]
    NoSession(UserId),

    #[error("Unknown or finished workflow: {0}")]
    UnknownWorkflow(WorkflowId),

    #[error("Workflow {0} does not belong to this client")]
    NotWorkflowOwner(WorkflowId),
}

impl From<SessionError> for AdvancementHostError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoSession(user) => AdvancementHostError::NoSession(user),
            SessionError::UnknownWorkflow(id) | SessionError::NotWorkflowOwner(id) => {
                AdvancementHostError::Closed(id)
            }
        }
    }
}

/// Manages connected clients and their pending workflows
#[derive(Default)]
pub struct SessionManager {
    participants: HashMap<ClientId, SessionParticipant>,
    /// Everyone who has connected during this process lifetime
    users: HashMap<UserId, UserInfo>,
    /// Character assigned to each user
    characters: HashMap<UserId, ActorId>,
    workflows: HashMap<WorkflowId, PendingWorkflow>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(
        &mut self,
        client_id: ClientId,
        user: UserInfo,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) {
        tracing::info!(
            "Client {} (user: {}) connected as {:?}",
            client_id,
            user.id,
            user.role
        );
        self.users.insert(user.id.clone(), user.clone());
        self.participants.insert(
            client_id,
            SessionParticipant {
                client_id,
                user,
                joined_at: Utc::now(),
                sender,
            },
        );
    }

    /// Remove a client. Workflows rendered on it are abandoned; their
    /// completion futures resolve as closed.
    pub fn leave(&mut self, client_id: ClientId) -> Option<SessionParticipant> {
        let participant = self.participants.remove(&client_id)?;
        self.workflows.retain(|_, pending| pending.client_id != client_id);
        tracing::info!("Client {} (user: {}) disconnected", client_id, participant.user.id);
        Some(participant)
    }

    pub fn user(&self, id: &UserId) -> Option<UserInfo> {
        self.users.get(id).cloned()
    }

    pub fn assign_character(&mut self, id: &UserId, actor_id: ActorId) -> bool {
        if !self.users.contains_key(id) {
            return false;
        }
        self.characters.insert(id.clone(), actor_id);
        true
    }

    pub fn character(&self, id: &UserId) -> Option<ActorId> {
        self.characters.get(id).copied()
    }

    /// The user's most recently connected client
    pub fn primary_client(&self, id: &UserId) -> Option<ClientId> {
        self.participants
            .values()
            .filter(|p| &p.user.id == id)
            .max_by_key(|p| p.joined_at)
            .map(|p| p.client_id)
    }

    pub fn send_to_client(&self, client_id: ClientId, message: ServerMessage) -> bool {
        self.participants
            .get(&client_id)
            .is_some_and(|p| p.sender.send(message).is_ok())
    }

    /// Send to every client of a user; returns how many received it
    pub fn send_to_user(&self, id: &UserId, message: &ServerMessage) -> usize {
        self.participants
            .values()
            .filter(|p| &p.user.id == id)
            .filter(|p| p.sender.send(message.clone()).is_ok())
            .count()
    }

    pub fn broadcast(&self, message: &ServerMessage) {
        for participant in self.participants.values() {
            if let Err(e) = participant.sender.send(message.clone()) {
                tracing::warn!("Failed to send to client {}: {}", participant.client_id, e);
            }
        }
    }

    pub fn register_workflow(
        &mut self,
        id: WorkflowId,
        client_id: ClientId,
    ) -> oneshot::Receiver<WorkflowResult> {
        let (completion, receiver) = oneshot::channel();
        self.workflows.insert(
            id,
            PendingWorkflow {
                client_id,
                completion,
            },
        );
        receiver
    }

    /// Deliver a client's report for a workflow it was rendering
    pub fn finish_workflow(
        &mut self,
        id: WorkflowId,
        client_id: ClientId,
        result: WorkflowResult,
    ) -> Result<(), SessionError> {
        match self.workflows.get(&id) {
            None => return Err(SessionError::UnknownWorkflow(id)),
            Some(pending) if pending.client_id != client_id => {
                return Err(SessionError::NotWorkflowOwner(id))
            }
            Some(_) => {}
        }
        let pending = self
            .workflows
            .remove(&id)
            .ok_or(SessionError::UnknownWorkflow(id))?;
        // the orchestrator may already have given up on this workflow
        let _ = pending.completion.send(result);
        Ok(())
    }

    /// Drop a workflow without a result; returns the client it was on
    pub fn discard_workflow(&mut self, id: WorkflowId) -> Option<ClientId> {
        self.workflows.remove(&id).map(|pending| pending.client_id)
    }

    pub fn client_count(&self) -> usize {
        self.participants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::UserRole;

    fn connect(manager: &mut SessionManager, user: &str) -> (ClientId, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client_id = ClientId::new();
        manager.join(client_id, UserInfo::new(user, user, UserRole::Player), tx);
        (client_id, rx)
    }

    #[test]
    fn test_send_to_user_reaches_every_client() {
        let mut manager = SessionManager::new();
        let (_, mut first) = connect(&mut manager, "u1");
        let (_, mut second) = connect(&mut manager, "u1");
        let (_, mut other) = connect(&mut manager, "u2");

        let delivered = manager.send_to_user(&UserId::new("u1"), &ServerMessage::Pong);

        assert_eq!(delivered, 2);
        assert!(first.try_recv().is_ok());
        assert!(second.try_recv().is_ok());
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_workflow_result_reaches_waiter() {
        let mut manager = SessionManager::new();
        let (client_id, _rx) = connect(&mut manager, "u1");
        let id = WorkflowId::new();
        let receiver = manager.register_workflow(id, client_id);

        manager.finish_workflow(id, client_id, Ok(Vec::new())).unwrap();

        assert!(receiver.await.unwrap().unwrap().is_empty());
        assert!(matches!(
            manager.finish_workflow(id, client_id, Ok(Vec::new())),
            Err(SessionError::UnknownWorkflow(_))
        ));
    }

    #[tokio::test]
    async fn test_only_rendering_client_can_finish_workflow() {
        let mut manager = SessionManager::new();
        let (client_id, _rx) = connect(&mut manager, "u1");
        let (intruder, _rx2) = connect(&mut manager, "u2");
        let id = WorkflowId::new();
        let _receiver = manager.register_workflow(id, client_id);

        assert!(matches!(
            manager.finish_workflow(id, intruder, Ok(Vec::new())),
            Err(SessionError::NotWorkflowOwner(_))
        ));
    }

    #[tokio::test]
    async fn test_disconnect_abandons_workflows() {
        let mut manager = SessionManager::new();
        let (client_id, _rx) = connect(&mut manager, "u1");
        let receiver = manager.register_workflow(WorkflowId::new(), client_id);

        manager.leave(client_id);

        assert!(receiver.await.is_err());
        assert_eq!(manager.client_count(), 0);
        assert!(manager.user(&UserId::new("u1")).is_some());
    }
}
