//! Advancement host port - Interactive advancement workflows run by the host
//!
//! The host owns the interactive surface where a user makes the choices an
//! item's advancement steps require (hit points, skill picks, granted items).
//! Each workflow exposes its own completion future, so completions are never
//! matched up by timing.

use async_trait::async_trait;

use crate::domain::entities::OwnedItem;
use crate::domain::value_objects::{ActorId, UserId, WorkflowId};

#[derive(Debug, Clone, thiserror::Error)]
pub enum AdvancementHostError {
    #[error("User {0} has no connected session to run the workflow")]
    NoSession(UserId),
    #[error("Workflow {0} was cancelled")]
    Cancelled(WorkflowId),
    #[error("Workflow {0} was closed before completion")]
    Closed(WorkflowId),
    #[error("Host error: {0}")]
    Host(String),
}

/// One running advancement workflow for a single item
#[async_trait]
pub trait AdvancementWorkflow: Send {
    fn id(&self) -> WorkflowId;

    /// Present the interactive surface to the user
    async fn render(&mut self) -> Result<(), AdvancementHostError>;

    /// Wait until the user finishes every step. Resolves with the items the
    /// workflow produced: the advanced item itself plus anything it granted.
    /// Cancel-safe: dropping the future leaves the workflow open.
    async fn completion(&mut self) -> Result<Vec<OwnedItem>, AdvancementHostError>;

    /// Tear the workflow down. Idempotent.
    async fn close(&mut self);

    fn is_open(&self) -> bool;
}

#[async_trait]
pub trait AdvancementHostPort: Send + Sync {
    /// Build a workflow that will apply `item` to `actor_id`, driven by `user`
    async fn create_workflow(
        &self,
        user: &UserId,
        actor_id: ActorId,
        item: OwnedItem,
    ) -> Result<Box<dyn AdvancementWorkflow>, AdvancementHostError>;

    /// Open the actor's sheet for review on the user's session
    async fn open_sheet(&self, user: &UserId, actor_id: ActorId) -> Result<(), AdvancementHostError>;
}
