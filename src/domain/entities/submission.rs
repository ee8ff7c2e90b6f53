//! Character submissions awaiting GM approval

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{FormSubmission, UserId};

/// A submission from a user who lacks actor-creation rights.
/// Created on submit, destroyed on approve or reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSubmission {
    pub requester_id: UserId,
    pub requester_name: String,
    pub form: FormSubmission,
    pub submitted_at: DateTime<Utc>,
}

impl PendingSubmission {
    pub fn new(requester_id: UserId, requester_name: impl Into<String>, form: FormSubmission) -> Self {
        Self {
            requester_id,
            requester_name: requester_name.into(),
            form,
            submitted_at: Utc::now(),
        }
    }
}
