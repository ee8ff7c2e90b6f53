//! Advancement Orchestrator - Applies template items to a new character
//!
//! Items without advancement steps are created directly in one batch. Items
//! with steps are driven through the host's interactive workflow one at a
//! time, in the order given:
//!
//! ```text
//! Pending -> Running -> Succeeded
//!                    \-> Failed
//! ```
//!
//! Construction of a workflow is retried a bounded number of times, each try
//! under a short timeout. Completion is awaited once under a long timeout; a
//! workflow that times out is closed and the item is marked failed. A failure
//! never stops the remaining items. Once every item has been attempted the
//! outcome is reported, the character is validated, any workflow left open is
//! closed and the character sheet is opened.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

use crate::application::ports::outbound::{
    ActorRepositoryPort, ActorStoreError, AdvancementHostError, AdvancementHostPort,
    AdvancementWorkflow, Notification, NotificationPort,
};
use crate::domain::entities::OwnedItem;
use crate::domain::services::{validate_character, ExpectedTemplates, ValidationReport};
use crate::domain::value_objects::{ActorId, MancerSettings, UserId};

#[derive(Debug, thiserror::Error)]
pub enum AdvancementError {
    #[error("Could not start advancement for '{item}' after {attempts} attempts: {source}")]
    Construction {
        item: String,
        attempts: u32,
        #[source]
        source: AdvancementHostError,
    },
    #[error("Starting advancement for '{item}' timed out after {attempts} attempts")]
    ConstructionTimeout { item: String, attempts: u32 },
    #[error("Advancement for '{item}' was not completed within {timeout:?}")]
    CompletionTimeout { item: String, timeout: Duration },
    #[error("Advancement for '{item}' failed: {source}")]
    Workflow {
        item: String,
        #[source]
        source: AdvancementHostError,
    },
    #[error("Could not add '{item}' to the character: {source}")]
    Store {
        item: String,
        #[source]
        source: ActorStoreError,
    },
}

/// Timing and retry budget for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvancementPolicy {
    pub construct_timeout: Duration,
    pub completion_timeout: Duration,
    pub max_attempts: u32,
    pub settle_delay: Duration,
}

impl From<&MancerSettings> for AdvancementPolicy {
    fn from(settings: &MancerSettings) -> Self {
        Self {
            construct_timeout: settings.construct_timeout(),
            completion_timeout: settings.completion_timeout(),
            max_attempts: settings.workflow_max_attempts.max(1),
            settle_delay: settings.settle_delay(),
        }
    }
}

impl Default for AdvancementPolicy {
    fn default() -> Self {
        Self::from(&MancerSettings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvancementStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Outcome for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvancementAttempt {
    pub item_name: String,
    pub item_type: String,
    pub status: AdvancementStatus,
    /// Construction attempts used; 0 for items created directly
    pub attempts: u32,
    pub error: Option<String>,
}

impl AdvancementAttempt {
    fn pending(item: &OwnedItem) -> Self {
        Self {
            item_name: item.name.clone(),
            item_type: item.item_type.clone(),
            status: AdvancementStatus::Pending,
            attempts: 0,
            error: None,
        }
    }

    fn succeed(&mut self) {
        self.status = AdvancementStatus::Succeeded;
    }

    fn fail(&mut self, error: impl ToString) {
        self.status = AdvancementStatus::Failed;
        self.error = Some(error.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdvancementReport {
    pub attempts: Vec<AdvancementAttempt>,
    pub validation: ValidationReport,
}

impl AdvancementReport {
    fn names(&self, status: AdvancementStatus) -> Vec<String> {
        self.attempts
            .iter()
            .filter(|a| a.status == status)
            .map(|a| a.item_name.clone())
            .collect()
    }

    pub fn succeeded(&self) -> Vec<String> {
        self.names(AdvancementStatus::Succeeded)
    }

    pub fn failed(&self) -> Vec<String> {
        self.names(AdvancementStatus::Failed)
    }
}

/// One orchestration request. `items` is already in advancement order.
#[derive(Debug, Clone)]
pub struct AdvancementRun {
    pub user: UserId,
    pub actor_id: ActorId,
    pub items: Vec<OwnedItem>,
    pub expected: ExpectedTemplates,
    pub policy: AdvancementPolicy,
}

pub struct AdvancementOrchestrator {
    host: Arc<dyn AdvancementHostPort>,
    actors: Arc<dyn ActorRepositoryPort>,
    notifier: Arc<dyn NotificationPort>,
}

impl AdvancementOrchestrator {
    pub fn new(
        host: Arc<dyn AdvancementHostPort>,
        actors: Arc<dyn ActorRepositoryPort>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        Self {
            host,
            actors,
            notifier,
        }
    }

    #[instrument(skip(self, run), fields(actor_id = %run.actor_id, user_id = %run.user, items = run.items.len()))]
    pub async fn run(&self, run: AdvancementRun) -> AdvancementReport {
        let (stepped, direct): (Vec<OwnedItem>, Vec<OwnedItem>) = run
            .items
            .iter()
            .cloned()
            .partition(|item| !item.advancement.is_empty());

        let mut attempts = self.create_direct(run.actor_id, direct).await;
        let mut current: Option<Box<dyn AdvancementWorkflow>> = None;

        for item in stepped {
            if let Some(previous) = current.as_mut() {
                if previous.is_open() {
                    previous.close().await;
                }
            }

            let mut attempt = AdvancementAttempt::pending(&item);
            attempt.status = AdvancementStatus::Running;
            info!(item = %item.name, "Starting advancement");

            match self.advance(&run, item, &mut attempt).await {
                Ok(workflow) => {
                    attempt.succeed();
                    current = Some(workflow);
                    sleep(run.policy.settle_delay).await;
                }
                Err(e) => {
                    warn!(item = %attempt.item_name, error = %e, "Advancement failed");
                    attempt.fail(e);
                }
            }
            attempts.push(attempt);
        }

        self.report_outcome(&run.user, &attempts).await;
        let validation = self.validate(&run).await;

        if let Some(mut workflow) = current {
            if workflow.is_open() {
                workflow.close().await;
            }
        }
        if let Err(e) = self.host.open_sheet(&run.user, run.actor_id).await {
            warn!(error = %e, "Failed to open character sheet");
        }

        AdvancementReport {
            attempts,
            validation,
        }
    }

    async fn create_direct(&self, actor_id: ActorId, items: Vec<OwnedItem>) -> Vec<AdvancementAttempt> {
        if items.is_empty() {
            return Vec::new();
        }
        let mut attempts: Vec<AdvancementAttempt> = items.iter().map(AdvancementAttempt::pending).collect();

        match self.actors.create_embedded_items(actor_id, items).await {
            Ok(created) => {
                debug!(count = created.len(), "Created items without advancement");
                attempts.iter_mut().for_each(AdvancementAttempt::succeed);
            }
            Err(e) => {
                warn!(error = %e, "Failed to create items without advancement");
                attempts.iter_mut().for_each(|a| a.fail(&e));
            }
        }
        attempts
    }

    /// Drive one item through its workflow. On success the workflow is handed
    /// back so it can be closed later if the host left it open.
    async fn advance(
        &self,
        run: &AdvancementRun,
        item: OwnedItem,
        attempt: &mut AdvancementAttempt,
    ) -> Result<Box<dyn AdvancementWorkflow>, AdvancementError> {
        let mut workflow = self.construct(run, &item, attempt).await?;

        let produced = match self.complete(run, workflow.as_mut(), &item.name).await {
            Ok(produced) => produced,
            Err(e) => {
                workflow.close().await;
                return Err(e);
            }
        };

        let (own, granted): (Vec<OwnedItem>, Vec<OwnedItem>) =
            produced.into_iter().partition(|produced| produced.id == item.id);
        let own = if own.is_empty() { vec![item.clone()] } else { own };
        self.actors
            .create_embedded_items(run.actor_id, own)
            .await
            .map_err(|source| AdvancementError::Store {
                item: item.name.clone(),
                source,
            })?;
        self.create_granted(run.actor_id, &item.name, granted).await;

        info!(item = %item.name, workflow_id = %workflow.id(), "Advancement complete");
        Ok(workflow)
    }

    /// Items granted by a workflow are added one by one; one that cannot be
    /// added does not cost the item that granted it.
    async fn create_granted(&self, actor_id: ActorId, granted_by: &str, granted: Vec<OwnedItem>) {
        for extra in granted {
            let name = extra.name.clone();
            if let Err(e) = self.actors.create_embedded_items(actor_id, vec![extra]).await {
                warn!(item = %name, granted_by = %granted_by, error = %e, "Skipped granted item");
            }
        }
    }

    /// Bounded construction loop; every try gets a fresh copy of the item
    async fn construct(
        &self,
        run: &AdvancementRun,
        item: &OwnedItem,
        attempt: &mut AdvancementAttempt,
    ) -> Result<Box<dyn AdvancementWorkflow>, AdvancementError> {
        let max_attempts = run.policy.max_attempts.max(1);
        loop {
            attempt.attempts += 1;
            let tries = attempt.attempts;
            let created = timeout(
                run.policy.construct_timeout,
                self.host.create_workflow(&run.user, run.actor_id, item.clone()),
            )
            .await;

            let error = match created {
                Ok(Ok(workflow)) => return Ok(workflow),
                Ok(Err(source)) => AdvancementError::Construction {
                    item: item.name.clone(),
                    attempts: tries,
                    source,
                },
                Err(_) => AdvancementError::ConstructionTimeout {
                    item: item.name.clone(),
                    attempts: tries,
                },
            };

            if tries >= max_attempts {
                return Err(error);
            }
            warn!(item = %item.name, attempt = tries, error = %error, "Retrying workflow construction");
        }
    }

    async fn complete(
        &self,
        run: &AdvancementRun,
        workflow: &mut dyn AdvancementWorkflow,
        item_name: &str,
    ) -> Result<Vec<OwnedItem>, AdvancementError> {
        let workflow_error = |source| AdvancementError::Workflow {
            item: item_name.to_string(),
            source,
        };

        workflow.render().await.map_err(workflow_error)?;
        match timeout(run.policy.completion_timeout, workflow.completion()).await {
            Ok(result) => result.map_err(workflow_error),
            Err(_) => Err(AdvancementError::CompletionTimeout {
                item: item_name.to_string(),
                timeout: run.policy.completion_timeout,
            }),
        }
    }

    async fn report_outcome(&self, user: &UserId, attempts: &[AdvancementAttempt]) {
        if attempts.is_empty() {
            return;
        }
        let names = |status| {
            attempts
                .iter()
                .filter(|a| a.status == status)
                .map(|a| a.item_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let succeeded = names(AdvancementStatus::Succeeded);
        let failed = names(AdvancementStatus::Failed);

        let notification = if failed.is_empty() {
            Notification::info(format!("Advancement complete: {succeeded}"))
        } else if succeeded.is_empty() {
            Notification::warning(format!("Advancement failed: {failed}"))
        } else {
            Notification::warning(format!(
                "Advancement complete: {succeeded}. Failed: {failed}"
            ))
        };
        self.notifier
            .notify(user, notification.with_code("advancement-summary"))
            .await;
    }

    async fn validate(&self, run: &AdvancementRun) -> ValidationReport {
        let report = match self.actors.get_actor(run.actor_id).await {
            Ok(Some(actor)) => validate_character(&actor.items, &run.expected),
            Ok(None) => ValidationReport::unavailable(format!("actor {} no longer exists", run.actor_id)),
            Err(e) => ValidationReport::unavailable(e.to_string()),
        };

        for issue in &report.errors {
            error!(code = %issue.code(), "{}", issue);
            self.notifier
                .notify(&run.user, Notification::error(issue.to_string()).with_code(issue.code()))
                .await;
        }
        for issue in &report.warnings {
            warn!(code = %issue.code(), "{}", issue);
            self.notifier
                .notify(&run.user, Notification::warning(issue.to_string()).with_code(issue.code()))
                .await;
        }
        report
    }
}
