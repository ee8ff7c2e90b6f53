//! Approval Service - GM approval of characters submitted by restricted users
//!
//! A user who may not create actors submits their finished form for review.
//! Every connected session hears the protocol messages on the approval
//! channel and asks this service what, if anything, to do about each one:
//! - GM sessions present a new submission for accept/reject
//! - The requester's session resumes advancement once approved
//! - The requester's session reopens the form once rejected
//!
//! # Idempotency
//!
//! Both sides clear their state before acting. A submission is taken out of
//! the pending map before the approver creates anything, and a requester is
//! taken out of the awaiting set before their session resumes, so a duplicate
//! or stale message finds nothing and is ignored.
//!
//! # Architecture
//!
//! This service depends only on the `ApprovalChannelPort`. Creating the actor
//! and resuming advancement belong to `CharacterCreationService`, which calls
//! into this service.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::application::dto::ApprovalMessage;
use crate::application::ports::outbound::{ApprovalChannelPort, ChannelError};
use crate::domain::entities::{PendingSubmission, UserInfo};
use crate::domain::value_objects::{ActorId, FormSubmission, UserId};

/// Errors that can occur during approval processing
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error("Not authorized to approve submissions")]
    NotAuthorized,

    #[error("No pending submission for user {0}")]
    SubmissionNotFound(UserId),

    #[error("Approval channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// What the receiving session should do with a protocol message
#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalAction {
    /// Show the submission to the GM for accept/reject
    PresentForApproval(PendingSubmission),
    /// Run advancement on the approved actor from the requester's session
    ResumeAdvancement {
        actor_id: ActorId,
        actor_name: String,
        form: FormSubmission,
    },
    /// Let the requester revise and resubmit
    ReopenForm,
}

pub struct ApprovalService {
    channel: Arc<dyn ApprovalChannelPort>,
    /// Submissions awaiting a GM decision, keyed by requester
    pending: RwLock<HashMap<UserId, PendingSubmission>>,
    /// Requesters waiting for an answer
    awaiting: RwLock<HashSet<UserId>>,
}

impl ApprovalService {
    pub fn new(channel: Arc<dyn ApprovalChannelPort>) -> Self {
        Self {
            channel,
            pending: RwLock::new(HashMap::new()),
            awaiting: RwLock::new(HashSet::new()),
        }
    }

    /// Record a submission and broadcast it to GMs.
    ///
    /// A newer submission from the same user replaces the older one.
    #[instrument(skip(self, form), fields(user_id = %requester.id))]
    pub async fn request_approval(
        &self,
        requester: &UserInfo,
        form: FormSubmission,
    ) -> Result<PendingSubmission, ApprovalError> {
        let submission = PendingSubmission::new(requester.id.clone(), requester.name.clone(), form);

        self.pending
            .write()
            .await
            .insert(requester.id.clone(), submission.clone());
        self.awaiting.write().await.insert(requester.id.clone());

        let message = ApprovalMessage::SubmitCharacter {
            user_id: requester.id.clone(),
            user_name: requester.name.clone(),
            character_data: submission.form.clone(),
        };
        if let Err(e) = self.channel.publish(message).await {
            self.pending.write().await.remove(&requester.id);
            self.awaiting.write().await.remove(&requester.id);
            return Err(e.into());
        }

        info!("Character submitted for approval");
        Ok(submission)
    }

    /// Remove and return a pending submission. The GM's decision is acted on
    /// only by whoever takes it first.
    pub async fn take_pending(
        &self,
        approver: &UserInfo,
        requester: &UserId,
    ) -> Result<PendingSubmission, ApprovalError> {
        if !approver.is_gm() {
            return Err(ApprovalError::NotAuthorized);
        }
        self.pending
            .write()
            .await
            .remove(requester)
            .ok_or_else(|| ApprovalError::SubmissionNotFound(requester.clone()))
    }

    pub async fn pending_for(&self, requester: &UserId) -> Option<PendingSubmission> {
        self.pending.read().await.get(requester).cloned()
    }

    /// Submissions not yet decided, oldest first
    pub async fn pending_submissions(&self) -> Vec<PendingSubmission> {
        let mut submissions: Vec<PendingSubmission> =
            self.pending.read().await.values().cloned().collect();
        submissions.sort_by_key(|s| s.submitted_at);
        submissions
    }

    pub async fn is_awaiting(&self, requester: &UserId) -> bool {
        self.awaiting.read().await.contains(requester)
    }

    pub async fn announce_approved(
        &self,
        requester: &UserId,
        actor_id: ActorId,
        actor_name: String,
        form: FormSubmission,
    ) -> Result<(), ApprovalError> {
        self.channel
            .publish(ApprovalMessage::CharacterApproved {
                user_id: requester.clone(),
                actor_id,
                actor_name,
                character_data: form,
            })
            .await?;
        Ok(())
    }

    pub async fn announce_rejected(&self, requester: &UserId) -> Result<(), ApprovalError> {
        self.channel
            .publish(ApprovalMessage::CharacterRejected {
                user_id: requester.clone(),
            })
            .await?;
        Ok(())
    }

    /// Decide what the session of `local` should do with a message
    pub async fn route(&self, local: &UserInfo, message: &ApprovalMessage) -> Option<ApprovalAction> {
        match message {
            ApprovalMessage::SubmitCharacter { user_id, .. } => {
                if !local.is_gm() {
                    return None;
                }
                let submission = self.pending.read().await.get(user_id).cloned();
                if submission.is_none() {
                    debug!(requester = %user_id, "Ignoring already decided submission");
                }
                submission.map(ApprovalAction::PresentForApproval)
            }
            ApprovalMessage::CharacterApproved {
                user_id,
                actor_id,
                actor_name,
                character_data,
            } => {
                if !self.claim_answer(local, user_id).await {
                    return None;
                }
                Some(ApprovalAction::ResumeAdvancement {
                    actor_id: *actor_id,
                    actor_name: actor_name.clone(),
                    form: character_data.clone(),
                })
            }
            ApprovalMessage::CharacterRejected { user_id } => self
                .claim_answer(local, user_id)
                .await
                .then_some(ApprovalAction::ReopenForm),
        }
    }

    /// True once per answer, and only on the requester's own session
    async fn claim_answer(&self, local: &UserInfo, requester: &UserId) -> bool {
        if &local.id != requester {
            return false;
        }
        let claimed = self.awaiting.write().await.remove(requester);
        if !claimed {
            debug!(requester = %requester, "Ignoring answer with no submission awaiting it");
        }
        claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::UserRole;
    use crate::test_support::RecordingChannel;

    fn player() -> UserInfo {
        UserInfo::new("u1", "Pat", UserRole::Player)
    }

    fn gm() -> UserInfo {
        UserInfo::new("gm", "Morgan", UserRole::Gamemaster)
    }

    fn service() -> (ApprovalService, Arc<RecordingChannel>) {
        let channel = Arc::new(RecordingChannel::default());
        (ApprovalService::new(channel.clone()), channel)
    }

    #[tokio::test]
    async fn test_submission_is_pending_and_broadcast() {
        let (service, channel) = service();
        let form = FormSubmission::new().with("name", "Ilsa");

        service.request_approval(&player(), form.clone()).await.unwrap();

        let pending = service.pending_for(&UserId::new("u1")).await.unwrap();
        assert_eq!(pending.form, form);
        assert!(matches!(
            channel.messages().as_slice(),
            [ApprovalMessage::SubmitCharacter { user_id, .. }] if user_id.as_str() == "u1"
        ));
    }

    #[tokio::test]
    async fn test_only_gms_are_asked_to_approve() {
        let (service, channel) = service();
        service
            .request_approval(&player(), FormSubmission::new())
            .await
            .unwrap();
        let message = channel.messages().remove(0);

        assert!(service.route(&player(), &message).await.is_none());
        assert!(matches!(
            service.route(&gm(), &message).await,
            Some(ApprovalAction::PresentForApproval(_))
        ));
    }

    #[tokio::test]
    async fn test_pending_is_taken_once() {
        let (service, _) = service();
        service
            .request_approval(&player(), FormSubmission::new())
            .await
            .unwrap();

        assert!(matches!(
            service.take_pending(&player(), &UserId::new("u1")).await,
            Err(ApprovalError::NotAuthorized)
        ));
        assert!(service.take_pending(&gm(), &UserId::new("u1")).await.is_ok());
        assert!(matches!(
            service.take_pending(&gm(), &UserId::new("u1")).await,
            Err(ApprovalError::SubmissionNotFound(_))
        ));
        assert!(service.pending_submissions().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_approval_resumes_once() {
        let (service, channel) = service();
        service
            .request_approval(&player(), FormSubmission::new())
            .await
            .unwrap();
        service
            .announce_approved(&UserId::new("u1"), ActorId::new(), "Ilsa".to_string(), FormSubmission::new())
            .await
            .unwrap();
        let approved = channel.messages().remove(1);

        assert!(service.route(&gm(), &approved).await.is_none());
        assert!(matches!(
            service.route(&player(), &approved).await,
            Some(ApprovalAction::ResumeAdvancement { .. })
        ));
        assert!(service.route(&player(), &approved).await.is_none());
        assert!(!service.is_awaiting(&UserId::new("u1")).await);
    }

    #[tokio::test]
    async fn test_rejection_reopens_form() {
        let (service, channel) = service();
        service
            .request_approval(&player(), FormSubmission::new())
            .await
            .unwrap();
        service.announce_rejected(&UserId::new("u1")).await.unwrap();
        let rejected = channel.messages().remove(1);

        assert_eq!(
            service.route(&player(), &rejected).await,
            Some(ApprovalAction::ReopenForm)
        );
    }

    #[tokio::test]
    async fn test_failed_publish_leaves_no_state() {
        let channel = Arc::new(RecordingChannel::failing());
        let service = ApprovalService::new(channel);

        let result = service.request_approval(&player(), FormSubmission::new()).await;

        assert!(matches!(result, Err(ApprovalError::Channel(_))));
        assert!(service.pending_for(&UserId::new("u1")).await.is_none());
        assert!(!service.is_awaiting(&UserId::new("u1")).await);
    }
}
