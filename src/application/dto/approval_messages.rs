//! Approval protocol messages exchanged over the broadcast channel

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ActorId, FormSubmission, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalMessage {
    /// A user without creation rights asks a GM to create their character
    SubmitCharacter {
        user_id: UserId,
        user_name: String,
        character_data: FormSubmission,
    },
    /// A GM created the bare actor; the requester resumes advancement
    CharacterApproved {
        user_id: UserId,
        actor_id: ActorId,
        actor_name: String,
        character_data: FormSubmission,
    },
    /// A GM declined; the requester may revise and resubmit
    CharacterRejected { user_id: UserId },
}

impl ApprovalMessage {
    /// The user the message is about
    pub fn user_id(&self) -> &UserId {
        match self {
            ApprovalMessage::SubmitCharacter { user_id, .. }
            | ApprovalMessage::CharacterApproved { user_id, .. }
            | ApprovalMessage::CharacterRejected { user_id } => user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format_uses_type_tag() {
        let message = ApprovalMessage::CharacterRejected {
            user_id: UserId::new("u1"),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"type": "CHARACTER_REJECTED", "user_id": "u1"})
        );
    }
}
