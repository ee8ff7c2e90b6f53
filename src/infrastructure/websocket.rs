//! WebSocket handler for host clients
//!
//! Each connection identifies its user through query parameters, e.g.
//! `/ws?user_id=abc&user_name=Pat&role=player`. Besides its own requests a
//! connection listens to the approval channel and acts on the messages
//! addressed to its user.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast::error::RecvError, mpsc};

use crate::application::dto::ApprovalMessage;
use crate::application::ports::outbound::{ChatMessage, Notification};
use crate::application::services::{
    AdvancementReport, ApprovalAction, CreatedCharacter, SubmissionOutcome,
};
use crate::domain::entities::{OwnedItem, PendingSubmission, UserInfo, UserRole};
use crate::domain::value_objects::{ActorId, FormSubmission, UserId, WorkflowId};
use crate::infrastructure::session::ClientId;
use crate::infrastructure::state::AppState;

/// Identity a client presents when connecting
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Actor-creation grant for players and trusted users
    #[serde(default)]
    pub can_create_actor: bool,
}

impl ConnectParams {
    fn into_user(self) -> UserInfo {
        let role = self
            .role
            .as_deref()
            .map(str::parse::<UserRole>)
            .transpose()
            .unwrap_or_else(|e| {
                tracing::warn!("{}, connecting as player", e);
                None
            })
            .unwrap_or(UserRole::Player);
        let name = self.user_name.unwrap_or_else(|| self.user_id.clone());

        let mut user = UserInfo::new(self.user_id, name, role);
        user.actor_create_granted = self.can_create_actor;
        user
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let user = params.into_user();
    ws.on_upgrade(move |socket| handle_socket(socket, state, user))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user: UserInfo) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Create a channel for sending messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let mut approvals = state.sessions.subscribe_approvals();
    let client_id = state.sessions.connect(user.clone(), tx.clone()).await;

    // Spawn a task to forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    let pending_approvals = if user.is_gm() {
        state.approvals.pending_submissions().await
    } else {
        Vec::new()
    };
    let _ = tx.send(ServerMessage::Connected {
        user_id: user.id.clone(),
        role: user.role,
        pending_approvals,
    });

    loop {
        tokio::select! {
            incoming = ws_receiver.next() => {
                let Some(result) = incoming else { break };
                match result {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(msg) => {
                            if let Some(response) =
                                handle_message(msg, &state, &user, client_id, &tx).await
                            {
                                if tx.send(response).is_err() {
                                    break;
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Failed to parse message: {}", e);
                            let error = ServerMessage::Error {
                                code: "PARSE_ERROR".to_string(),
                                message: format!("Invalid message format: {}", e),
                            };
                            if tx.send(error).is_err() {
                                break;
                            }
                        }
                    },
                    Ok(Message::Close(_)) => {
                        tracing::info!("WebSocket connection closed by client: {}", client_id);
                        break;
                    }
                    Ok(Message::Ping(_)) => {
                        let _ = tx.send(ServerMessage::Pong);
                    }
                    Err(e) => {
                        tracing::error!("WebSocket error for client {}: {}", client_id, e);
                        break;
                    }
                    _ => {}
                }
            }
            approval = approvals.recv() => match approval {
                Ok(message) => handle_approval(message, &state, &user, &tx).await,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Client {} missed {} approval messages", client_id, skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    state.sessions.disconnect(client_id).await;
    send_task.abort();

    tracing::info!("WebSocket connection terminated: {}", client_id);
}

/// Handle a request from the client. Long-running work is spawned so the
/// connection keeps reading; advancement completions arrive on this socket.
async fn handle_message(
    msg: ClientMessage,
    state: &Arc<AppState>,
    user: &UserInfo,
    client_id: ClientId,
    sender: &mpsc::UnboundedSender<ServerMessage>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Heartbeat => Some(ServerMessage::Pong),

        ClientMessage::SubmitCharacter { form } => {
            let state = state.clone();
            let sender = sender.clone();
            let user_id = user.id.clone();
            tokio::spawn(async move {
                let response = match state.creation.submit(&user_id, form).await {
                    Ok(SubmissionOutcome::Created(character)) => {
                        ServerMessage::CharacterCreated { character }
                    }
                    Ok(SubmissionOutcome::PendingApproval(_)) => ServerMessage::SubmissionPending,
                    Err(e) => ServerMessage::Error {
                        code: e.code(),
                        message: e.to_string(),
                    },
                };
                let _ = sender.send(response);
            });
            None
        }

        ClientMessage::SaveDraft { form } => {
            state.creation.save_draft(&user.id, &form).await;
            Some(ServerMessage::DraftSaved)
        }

        ClientMessage::LoadDraft => Some(ServerMessage::Draft {
            form: state.creation.load_draft(&user.id).await,
        }),

        ClientMessage::ApproveSubmission { user_id } => {
            let state = state.clone();
            let sender = sender.clone();
            let approver = user.id.clone();
            tokio::spawn(async move {
                let response = match state.creation.approve_submission(&approver, &user_id).await {
                    Ok(character) => ServerMessage::CharacterCreated { character },
                    Err(e) => ServerMessage::Error {
                        code: e.code(),
                        message: e.to_string(),
                    },
                };
                let _ = sender.send(response);
            });
            None
        }

        ClientMessage::RejectSubmission { user_id } => {
            match state.creation.reject_submission(&user.id, &user_id).await {
                Ok(()) => Some(ServerMessage::SubmissionRejected { user_id }),
                Err(e) => Some(ServerMessage::Error {
                    code: e.code(),
                    message: e.to_string(),
                }),
            }
        }

        ClientMessage::AdvancementComplete { workflow_id, items } => state
            .sessions
            .complete_workflow(client_id, workflow_id, items)
            .await
            .err()
            .map(|e| ServerMessage::Error {
                code: "WORKFLOW_ERROR".to_string(),
                message: e.to_string(),
            }),

        ClientMessage::AdvancementCancelled { workflow_id } => state
            .sessions
            .cancel_workflow(client_id, workflow_id)
            .await
            .err()
            .map(|e| ServerMessage::Error {
                code: "WORKFLOW_ERROR".to_string(),
                message: e.to_string(),
            }),

        ClientMessage::AdvancementFailed { workflow_id, error } => state
            .sessions
            .fail_workflow(client_id, workflow_id, error)
            .await
            .err()
            .map(|e| ServerMessage::Error {
                code: "WORKFLOW_ERROR".to_string(),
                message: e.to_string(),
            }),
    }
}

/// Act on an approval protocol message if it concerns this connection
async fn handle_approval(
    message: ApprovalMessage,
    state: &Arc<AppState>,
    user: &UserInfo,
    sender: &mpsc::UnboundedSender<ServerMessage>,
) {
    let Some(action) = state.approvals.route(user, &message).await else {
        return;
    };

    match action {
        ApprovalAction::PresentForApproval(submission) => {
            let _ = sender.send(ServerMessage::ApprovalRequested { submission });
        }
        ApprovalAction::ResumeAdvancement {
            actor_id,
            actor_name,
            form,
        } => {
            let _ = sender.send(ServerMessage::CharacterApproved {
                actor_id,
                actor_name,
            });
            let state = state.clone();
            let sender = sender.clone();
            let user_id = user.id.clone();
            tokio::spawn(async move {
                if let Ok(report) = state
                    .creation
                    .resume_advancement(&user_id, actor_id, form)
                    .await
                {
                    let _ = sender.send(ServerMessage::AdvancementFinished { actor_id, report });
                }
            });
        }
        ApprovalAction::ReopenForm => {
            let draft = state.creation.load_draft(&user.id).await;
            let _ = sender.send(ServerMessage::ReopenForm { draft });
        }
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Messages from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Submit a finished creation form
    SubmitCharacter { form: FormSubmission },
    /// Persist the form in progress
    SaveDraft { form: FormSubmission },
    LoadDraft,
    /// GM accepts a pending submission
    ApproveSubmission { user_id: UserId },
    /// GM declines a pending submission
    RejectSubmission { user_id: UserId },
    /// The user finished an advancement workflow
    AdvancementComplete {
        workflow_id: WorkflowId,
        #[serde(default)]
        items: Vec<OwnedItem>,
    },
    /// The user dismissed an advancement workflow
    AdvancementCancelled { workflow_id: WorkflowId },
    /// The client's advancement manager raised an error
    AdvancementFailed { workflow_id: WorkflowId, error: String },
    /// Heartbeat ping
    Heartbeat,
}

/// Messages from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    Connected {
        user_id: UserId,
        role: UserRole,
        /// Submissions still waiting for a GM, for GM connections
        pending_approvals: Vec<PendingSubmission>,
    },
    Notification {
        notification: Notification,
    },
    Chat {
        message: ChatMessage,
    },
    CharacterCreated {
        character: CreatedCharacter,
    },
    CharacterAssigned {
        actor_id: ActorId,
    },
    /// The submission went to a GM for approval
    SubmissionPending,
    ApprovalRequested {
        submission: PendingSubmission,
    },
    /// A GM created the actor; advancement follows on this client
    CharacterApproved {
        actor_id: ActorId,
        actor_name: String,
    },
    SubmissionRejected {
        user_id: UserId,
    },
    /// Present the creation form again, prefilled with the draft
    ReopenForm {
        draft: Option<FormSubmission>,
    },
    DraftSaved,
    Draft {
        form: Option<FormSubmission>,
    },
    /// Show the interactive advancement surface for one item
    RenderAdvancement {
        workflow_id: WorkflowId,
        actor_id: ActorId,
        item: OwnedItem,
    },
    CloseAdvancement {
        workflow_id: WorkflowId,
    },
    AdvancementFinished {
        actor_id: ActorId,
        report: AdvancementReport,
    },
    OpenSheet {
        actor_id: ActorId,
    },
    Error {
        code: String,
        message: String,
    },
    Pong,
}
