//! Character Creation Service - Turns a submitted form into a character
//!
//! The flow runs in two halves around the first irreversible step, creating
//! the actor document:
//!
//! 1. Before it, every failure aborts the submission: missing mandatory
//!    fields, an unknown user, or an unresolvable background, race or class.
//! 2. After it, every failure only degrades the result and is reported as a
//!    warning, so the user always ends up with an actor they can fix up.
//!
//! Users who may not create actors are routed through [`ApprovalService`]:
//! a GM creates the actor without advancement, and advancement then resumes
//! on the requester's own session.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::{
    merge_sources, AdvancementOrchestrator, AdvancementPolicy, AdvancementReport, AdvancementRun,
    ApprovalError, ApprovalService, CompendiumResolver, EquipmentAssembler, OrderingPolicy,
    ResolveError, ResolvedTemplates, SettingsService, WealthResolver, total_wealth,
};
use crate::application::ports::outbound::{
    ActorRepositoryPort, ActorStoreError, AdvancementHostPort, ChatMessage, CompendiumPort,
    DraftRepositoryPort, Notification, NotificationPort, UserDirectoryPort,
};
use crate::domain::entities::{
    AbilityScores, Actor, Biography, CharacterDraft, OwnedItem, PendingSubmission, UserInfo,
};
use crate::domain::services::character_summary;
use crate::domain::value_objects::{
    ActorId, Currency, EquipmentSource, FormSubmission, MancerSettings, TokenConfig, UserId,
};

/// Name given to a character whose form left the name blank
pub const DEFAULT_CHARACTER_NAME: &str = "New Character";

#[derive(Debug, thiserror::Error)]
pub enum CreationError {
    #[error("Required fields are missing: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("Unknown user: {0}")]
    UnknownUser(UserId),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Character could not be created: {0}")]
    Actor(#[from] ActorStoreError),
    #[error(transparent)]
    Approval(#[from] ApprovalError),
}

impl CreationError {
    /// Notification key for the user
    pub fn code(&self) -> String {
        match self {
            CreationError::MissingFields(_) => "missing-fields".to_string(),
            CreationError::UnknownUser(_) => "unknown-user".to_string(),
            CreationError::Resolve(e) => e.code(),
            CreationError::Actor(_) => "actor-creation-failed".to_string(),
            CreationError::Approval(_) => "approval-failed".to_string(),
        }
    }
}

/// The ports the creation flow talks to
#[derive(Clone)]
pub struct CreationPorts {
    pub compendium: Arc<dyn CompendiumPort>,
    pub actors: Arc<dyn ActorRepositoryPort>,
    pub users: Arc<dyn UserDirectoryPort>,
    pub drafts: Arc<dyn DraftRepositoryPort>,
    pub notifier: Arc<dyn NotificationPort>,
    pub host: Arc<dyn AdvancementHostPort>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedCharacter {
    pub actor_id: ActorId,
    pub name: String,
    pub owner: UserId,
    pub currency: Currency,
    pub equipment: usize,
    /// Absent when advancement is left to the requester's session
    pub advancement: Option<AdvancementReport>,
}

#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    Created(CreatedCharacter),
    PendingApproval(PendingSubmission),
}

pub struct CharacterCreationService {
    settings: Arc<SettingsService>,
    approvals: Arc<ApprovalService>,
    ordering: OrderingPolicy,
    resolver: CompendiumResolver,
    equipment: EquipmentAssembler,
    orchestrator: AdvancementOrchestrator,
    actors: Arc<dyn ActorRepositoryPort>,
    users: Arc<dyn UserDirectoryPort>,
    drafts: Arc<dyn DraftRepositoryPort>,
    notifier: Arc<dyn NotificationPort>,
}

impl CharacterCreationService {
    pub fn new(
        ports: CreationPorts,
        settings: Arc<SettingsService>,
        approvals: Arc<ApprovalService>,
    ) -> Self {
        Self {
            ordering: OrderingPolicy::new(settings.clone()),
            resolver: CompendiumResolver::new(ports.compendium.clone()),
            equipment: EquipmentAssembler::new(
                ports.compendium,
                ports.actors.clone(),
                ports.notifier.clone(),
            ),
            orchestrator: AdvancementOrchestrator::new(
                ports.host,
                ports.actors.clone(),
                ports.notifier.clone(),
            ),
            settings,
            approvals,
            actors: ports.actors,
            users: ports.users,
            drafts: ports.drafts,
            notifier: ports.notifier,
        }
    }

    /// Handle a finished creation form from `acting`.
    ///
    /// Errors are also reported to the user as a permanent notification.
    #[instrument(skip(self, form), fields(user_id = %acting))]
    pub async fn submit(
        &self,
        acting: &UserId,
        form: FormSubmission,
    ) -> Result<SubmissionOutcome, CreationError> {
        let result = self.try_submit(acting, form).await;
        if let Err(e) = &result {
            error!(error = %e, "Character submission failed");
            self.report_error(acting, e).await;
        }
        result
    }

    async fn try_submit(
        &self,
        acting: &UserId,
        form: FormSubmission,
    ) -> Result<SubmissionOutcome, CreationError> {
        let settings = self.settings.get().await;

        let missing = form.missing_fields(&settings.mandatory_fields);
        if !missing.is_empty() {
            return Err(CreationError::MissingFields(
                missing.into_iter().map(str::to_string).collect(),
            ));
        }

        let user = self.user(acting).await?;
        if !user.can_create_actor() {
            let submission = self.approvals.request_approval(&user, form).await?;
            self.notifier
                .notify(
                    acting,
                    Notification::info("Your character was sent to the GM for approval")
                        .with_code("awaiting-approval"),
                )
                .await;
            return Ok(SubmissionOutcome::PendingApproval(submission));
        }

        let owner = self.target_user(&user, &form).await;
        let (mut created, templates) = self.create_character(acting, &owner, &form, &settings).await?;
        let report = self
            .advance(acting, created.actor_id, &created.name, &templates, &settings)
            .await;
        created.advancement = Some(report);

        self.clear_draft(acting).await;
        Ok(SubmissionOutcome::Created(created))
    }

    /// GM accepts a pending submission: the actor is created for the
    /// requester without advancement, and the requester is told to resume.
    #[instrument(skip(self), fields(approver = %approver, requester = %requester))]
    pub async fn approve_submission(
        &self,
        approver: &UserId,
        requester: &UserId,
    ) -> Result<CreatedCharacter, CreationError> {
        let result = async {
            let approver_info = self.user(approver).await?;
            let submission = self.approvals.take_pending(&approver_info, requester).await?;
            let settings = self.settings.get().await;

            let (created, _) = match self
                .create_character(approver, requester, &submission.form, &settings)
                .await
            {
                Ok(created) => created,
                Err(e) => {
                    self.release_failed_approval(requester, &e).await;
                    return Err(e);
                }
            };

            if let Err(e) = self
                .approvals
                .announce_approved(requester, created.actor_id, created.name.clone(), submission.form)
                .await
            {
                warn!(error = %e, "Failed to announce approval");
                self.notifier
                    .notify(approver, Notification::warning(e.to_string()).with_code("approval-failed"))
                    .await;
            }
            info!(actor_id = %created.actor_id, "Submission approved");
            Ok::<_, CreationError>(created)
        }
        .await;

        if let Err(e) = &result {
            self.report_error(approver, e).await;
        }
        result
    }

    /// The submission was taken but no actor came of it. The requester is
    /// answered with a rejection so they can revise and resubmit.
    async fn release_failed_approval(&self, requester: &UserId, error: &CreationError) {
        warn!(requester = %requester, error = %error, "Approved submission could not be created");
        if let Err(e) = self.approvals.announce_rejected(requester).await {
            warn!(error = %e, "Failed to release requester after failed approval");
        }
        self.notifier
            .notify(
                requester,
                Notification::warning(format!("Your character could not be created: {error}"))
                    .with_code("approval-failed"),
            )
            .await;
    }

    /// GM declines a pending submission
    #[instrument(skip(self), fields(approver = %approver, requester = %requester))]
    pub async fn reject_submission(
        &self,
        approver: &UserId,
        requester: &UserId,
    ) -> Result<(), CreationError> {
        let approver_info = self.user(approver).await?;
        self.approvals.take_pending(&approver_info, requester).await?;
        self.approvals.announce_rejected(requester).await?;
        info!("Submission rejected");
        Ok(())
    }

    /// Run advancement for an approved actor on the requester's session
    #[instrument(skip(self, form), fields(user_id = %user, actor_id = %actor_id))]
    pub async fn resume_advancement(
        &self,
        user: &UserId,
        actor_id: ActorId,
        form: FormSubmission,
    ) -> Result<AdvancementReport, CreationError> {
        let result = async {
            let actor = self
                .actors
                .get_actor(actor_id)
                .await?
                .ok_or(ActorStoreError::NotFound(actor_id))?;
            let settings = self.settings.get().await;
            let templates = self.templates(&form).await?;
            let report = self
                .advance(user, actor_id, &actor.name, &templates, &settings)
                .await;
            self.clear_draft(user).await;
            Ok::<_, CreationError>(report)
        }
        .await;

        if let Err(e) = &result {
            self.report_error(user, e).await;
        }
        result
    }

    pub async fn save_draft(&self, user: &UserId, form: &FormSubmission) {
        if let Err(e) = self.drafts.save(user, form).await {
            warn!(user_id = %user, error = %e, "Failed to save draft");
        }
    }

    pub async fn load_draft(&self, user: &UserId) -> Option<FormSubmission> {
        match self.drafts.load(user).await {
            Ok(draft) => draft,
            Err(e) => {
                warn!(user_id = %user, error = %e, "Failed to load draft");
                None
            }
        }
    }

    async fn user(&self, id: &UserId) -> Result<UserInfo, CreationError> {
        self.users
            .get_user(id)
            .await
            .ok_or_else(|| CreationError::UnknownUser(id.clone()))
    }

    /// A GM may build a character for a player named in the `player` field
    async fn target_user(&self, acting: &UserInfo, form: &FormSubmission) -> UserId {
        if !acting.is_gm() {
            return acting.id.clone();
        }
        let Some(player) = form.text("player").map(UserId::new) else {
            return acting.id.clone();
        };
        match self.users.get_user(&player).await {
            Some(target) => target.id,
            None => {
                warn!(player = %player, "Selected player does not exist, keeping character");
                acting.id.clone()
            }
        }
    }

    async fn templates(&self, form: &FormSubmission) -> Result<ResolvedTemplates, CreationError> {
        let selections = CompendiumResolver::selections(form)?;
        Ok(self.resolver.resolve_set(&selections).await?)
    }

    /// Everything up to, but not including, advancement. Templates are
    /// resolved before the actor is created so an unresolvable selection
    /// leaves nothing behind.
    async fn create_character(
        &self,
        acting: &UserId,
        owner: &UserId,
        form: &FormSubmission,
        settings: &MancerSettings,
    ) -> Result<(CreatedCharacter, ResolvedTemplates), CreationError> {
        let wealth = WealthResolver::new(settings.enable_starting_wealth);
        let background_wealth = wealth.resolve(form, EquipmentSource::Background);
        let class_wealth = wealth.resolve(form, EquipmentSource::Class);
        for warning in [&background_wealth.warning, &class_wealth.warning]
            .into_iter()
            .flatten()
        {
            self.notifier
                .notify(acting, Notification::warning(warning.clone()).with_code("wealth-formula"))
                .await;
        }

        let (background_equipment, class_equipment) = tokio::join!(
            self.equipment.prepare(EquipmentAssembler::collect(
                form,
                EquipmentSource::Background,
                &background_wealth.decision,
            )),
            self.equipment.prepare(EquipmentAssembler::collect(
                form,
                EquipmentSource::Class,
                &class_wealth.decision,
            )),
        );

        let templates = self.templates(form).await?;

        let draft = CharacterDraft {
            name: form
                .text("name")
                .unwrap_or_else(|| DEFAULT_CHARACTER_NAME.to_string()),
            img: form.text("character-art"),
            token: TokenConfig::from_form(form, settings.enable_token_customization),
            abilities: AbilityScores::from_form(form),
            details: Biography::from_form(form),
        };
        let actor = self.actors.create_actor(draft).await?;
        info!(actor_id = %actor.id, name = %actor.name, "Created character actor");

        self.assign_owner(&actor, owner).await;

        let equipment = self
            .equipment
            .assemble(
                acting,
                actor.id,
                merge_sources(background_equipment, class_equipment),
            )
            .await;

        let currency = total_wealth([&background_wealth.decision, &class_wealth.decision]);
        let currency = if currency.is_empty() {
            currency
        } else {
            match self.actors.add_currency(actor.id, currency).await {
                Ok(total) => total,
                Err(e) => {
                    warn!(error = %e, "Failed to add starting wealth");
                    self.notifier
                        .notify(
                            acting,
                            Notification::warning(format!("Starting wealth could not be added: {e}"))
                                .with_code("currency-failed"),
                        )
                        .await;
                    Currency::default()
                }
            }
        };

        let created = CreatedCharacter {
            actor_id: actor.id,
            name: actor.name,
            owner: owner.clone(),
            currency,
            equipment: equipment.len(),
            advancement: None,
        };
        Ok((created, templates))
    }

    async fn assign_owner(&self, actor: &Actor, owner: &UserId) {
        if let Err(e) = self.actors.set_owner(actor.id, owner).await {
            warn!(error = %e, "Failed to set actor owner");
        }
        if let Err(e) = self.users.assign_character(owner, actor.id).await {
            warn!(error = %e, "Failed to assign character to user");
        }
    }

    async fn advance(
        &self,
        user: &UserId,
        actor_id: ActorId,
        actor_name: &str,
        templates: &ResolvedTemplates,
        settings: &MancerSettings,
    ) -> AdvancementReport {
        let items: Vec<OwnedItem> = self
            .ordering
            .apply_order(
                Some(OwnedItem::from_template(&templates.background)),
                Some(OwnedItem::from_template(&templates.race)),
                Some(OwnedItem::from_template(&templates.class)),
            )
            .await;

        let expected = templates.expected();
        let report = self
            .orchestrator
            .run(AdvancementRun {
                user: user.clone(),
                actor_id,
                items,
                expected: expected.clone(),
                policy: AdvancementPolicy::from(settings),
            })
            .await;

        if settings.publish_chat_summary {
            let content = character_summary(actor_name, &expected, &report.succeeded(), &report.failed());
            self.notifier
                .post_chat(ChatMessage {
                    speaker: actor_name.to_string(),
                    actor_id: Some(actor_id),
                    content,
                })
                .await;
        }
        report
    }

    async fn clear_draft(&self, user: &UserId) {
        if let Err(e) = self.drafts.clear(user).await {
            warn!(user_id = %user, error = %e, "Failed to clear draft");
        }
    }

    async fn report_error(&self, user: &UserId, e: &CreationError) {
        self.notifier
            .notify(user, Notification::error(e.to_string()).with_code(e.code()))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::ApprovalMessage;
    use crate::application::ports::outbound::NotificationLevel;
    use crate::application::services::ApprovalAction;
    use crate::domain::entities::UserRole;
    use crate::domain::value_objects::SelectionKind;
    use crate::infrastructure::persistence::InMemoryActorRepository;
    use crate::test_support::{
        equipment_template, template, FakeAdvancementHost, FakeCompendium, FakeUsers,
        InMemoryDrafts, InMemorySettingsRepository, RecordingChannel, RecordingNotifier,
    };
    use serde_json::json;

    struct Fixture {
        service: CharacterCreationService,
        approvals: Arc<ApprovalService>,
        actors: Arc<InMemoryActorRepository>,
        users: Arc<FakeUsers>,
        drafts: Arc<InMemoryDrafts>,
        notifier: Arc<RecordingNotifier>,
        channel: Arc<RecordingChannel>,
        host: Arc<FakeAdvancementHost>,
    }

    fn fixture() -> Fixture {
        let compendium = FakeCompendium::new()
            .with(template("sage01", "Sage", "background", "dnd5e.backgrounds", 1))
            .with(template("elf01", "Elf", "race", "dnd5e.races", 1))
            .with(template("wiz01", "Wizard", "class", "dnd5e.classes", 2))
            .with(equipment_template("dagger", "Dagger", "dnd5e.items"))
            .with(equipment_template("staff", "Quarterstaff", "dnd5e.items"))
            .with(equipment_template("pouch", "Pouch", "dnd5e.items"));

        let settings = MancerSettings {
            workflow_construct_timeout_ms: 20,
            workflow_completion_timeout_ms: 50,
            workflow_settle_delay_ms: 1,
            ..MancerSettings::default()
        };
        let settings = Arc::new(SettingsService::new(Arc::new(
            InMemorySettingsRepository::with(settings),
        )));

        let actors = Arc::new(InMemoryActorRepository::new());
        let users = Arc::new(
            FakeUsers::default()
                .with(UserInfo::new("gm", "Morgan", UserRole::Gamemaster))
                .with(UserInfo {
                    actor_create_granted: true,
                    ..UserInfo::new("u1", "Pat", UserRole::Player)
                })
                .with(UserInfo::new("u2", "Sam", UserRole::Player)),
        );
        let drafts = Arc::new(InMemoryDrafts::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let channel = Arc::new(RecordingChannel::default());
        let host = Arc::new(FakeAdvancementHost::new());
        let approvals = Arc::new(ApprovalService::new(channel.clone()));

        let ports = CreationPorts {
            compendium: Arc::new(compendium),
            actors: actors.clone(),
            users: users.clone(),
            drafts: drafts.clone(),
            notifier: notifier.clone(),
            host: host.clone(),
        };
        Fixture {
            service: CharacterCreationService::new(ports, settings, approvals.clone()),
            approvals,
            actors,
            users,
            drafts,
            notifier,
            channel,
            host,
        }
    }

    fn form() -> FormSubmission {
        FormSubmission::new()
            .with("name", "Ilsa")
            .with("background", "sage01 [Compendium.dnd5e.backgrounds.Item.sage01]")
            .with("race", "elf01 [Compendium.dnd5e.races.Item.elf01]")
            .with("class", "wiz01 [Compendium.dnd5e.classes.Item.wiz01]")
            .with("abilities[int]", 16)
            .with("backstory", "Raised in a library")
    }

    fn created(outcome: SubmissionOutcome) -> CreatedCharacter {
        match outcome {
            SubmissionOutcome::Created(created) => created,
            other => panic!("expected a created character, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_full_creation_runs_advancement_in_order() {
        let f = fixture();
        f.drafts.save(&UserId::new("u1"), &form()).await.unwrap();

        let character = created(f.service.submit(&UserId::new("u1"), form()).await.unwrap());

        let report = character.advancement.unwrap();
        assert_eq!(report.succeeded(), vec!["Sage", "Elf", "Wizard"]);
        assert!(report.validation.success);
        assert!(report.validation.warnings.is_empty());
        assert_eq!(f.host.created(), vec!["Sage", "Elf", "Wizard"]);

        let actor = f.actors.get_actor(character.actor_id).await.unwrap().unwrap();
        assert_eq!(actor.name, "Ilsa");
        assert_eq!(actor.owner, Some(UserId::new("u1")));
        assert_eq!(actor.abilities.get("int"), Some(16));
        assert_eq!(actor.details.get("backstory"), Some("Raised in a library"));
        assert_eq!(f.users.assigned(&UserId::new("u1")), Some(actor.id));
        assert!(f.drafts.load(&UserId::new("u1")).await.unwrap().is_none());
        assert_eq!(f.notifier.chat().len(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_class_aborts_before_actor_exists() {
        let f = fixture();
        let form = form().with("class", "gone01 [Compendium.dnd5e.classes.Item.gone01]");

        let err = f.service.submit(&UserId::new("u1"), form).await.unwrap_err();

        assert_eq!(err.code(), "no-class");
        assert_eq!(f.actors.actor_count().await, 0);
        let notes = f.notifier.notifications();
        assert!(notes
            .iter()
            .any(|(_, n)| n.level == NotificationLevel::Error && n.code.as_deref() == Some("no-class")));
    }

    #[tokio::test]
    async fn test_missing_mandatory_field_blocks_submission() {
        let f = fixture();
        let form = form().with("name", "");

        let err = f.service.submit(&UserId::new("u1"), form).await.unwrap_err();

        assert!(matches!(err, CreationError::MissingFields(ref fields) if fields == &["name"]));
        assert_eq!(f.actors.actor_count().await, 0);
    }

    #[tokio::test]
    async fn test_wealth_source_contributes_currency_not_equipment() {
        let f = fixture();
        let form = form()
            .with("use-starting-wealth-background", true)
            .with("starting-wealth-formula-background", "50 gp")
            .with(
                "equipment-background",
                json!([{"uuid": "Compendium.dnd5e.items.Item.pouch"}]),
            )
            .with(
                "equipment-class",
                json!([
                    {"uuid": "Compendium.dnd5e.items.Item.dagger"},
                    {"uuid": "Compendium.dnd5e.items.Item.staff"}
                ]),
            );

        let character = created(f.service.submit(&UserId::new("u1"), form).await.unwrap());

        assert_eq!(character.currency.gp, 50);
        assert_eq!(character.equipment, 2);
        let actor = f.actors.get_actor(character.actor_id).await.unwrap().unwrap();
        assert_eq!(actor.currency.gp, 50);
        let equipment: Vec<_> = actor
            .items
            .iter()
            .filter(|i| i.item_type == "equipment")
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(equipment, vec!["Dagger", "Quarterstaff"]);
    }

    #[tokio::test]
    async fn test_restricted_user_goes_through_approval() {
        let f = fixture();

        let outcome = f.service.submit(&UserId::new("u2"), form()).await.unwrap();

        assert!(matches!(outcome, SubmissionOutcome::PendingApproval(ref p) if p.requester_id.as_str() == "u2"));
        assert!(f.approvals.pending_for(&UserId::new("u2")).await.is_some());
        assert!(matches!(
            f.channel.messages().as_slice(),
            [ApprovalMessage::SubmitCharacter { .. }]
        ));
        assert_eq!(f.actors.actor_count().await, 0);
    }

    #[tokio::test]
    async fn test_approved_submission_resumes_on_requester_session() {
        let f = fixture();
        let requester = UserId::new("u2");
        f.service.submit(&requester, form()).await.unwrap();

        let character = f
            .service
            .approve_submission(&UserId::new("gm"), &requester)
            .await
            .unwrap();

        assert_eq!(character.owner, requester);
        assert!(character.advancement.is_none());
        assert!(f.approvals.pending_for(&requester).await.is_none());
        let bare = f.actors.get_actor(character.actor_id).await.unwrap().unwrap();
        assert!(bare.items.iter().all(|i| !i.is_kind(SelectionKind::Class)));

        let approved = f.channel.messages().pop().unwrap();
        let requester_info = UserInfo::new("u2", "Sam", UserRole::Player);
        let Some(ApprovalAction::ResumeAdvancement { actor_id, form, .. }) =
            f.approvals.route(&requester_info, &approved).await
        else {
            panic!("requester should resume advancement");
        };

        let report = f
            .service
            .resume_advancement(&requester, actor_id, form)
            .await
            .unwrap();

        assert!(report.validation.success);
        assert_eq!(f.host.sheets_opened(), vec![character.actor_id]);
    }

    #[tokio::test]
    async fn test_rejection_leaves_nothing_behind() {
        let f = fixture();
        let requester = UserId::new("u2");
        f.service.submit(&requester, form()).await.unwrap();

        f.service
            .reject_submission(&UserId::new("gm"), &requester)
            .await
            .unwrap();

        assert!(f.approvals.pending_for(&requester).await.is_none());
        assert_eq!(f.actors.actor_count().await, 0);
        assert!(matches!(
            f.channel.messages().last(),
            Some(ApprovalMessage::CharacterRejected { .. })
        ));
        // a second decision finds nothing to act on
        assert!(f
            .service
            .approve_submission(&UserId::new("gm"), &requester)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_failed_approval_releases_requester() {
        let f = fixture();
        let requester = UserId::new("u2");
        let form = form().with("class", "gone01 [Compendium.dnd5e.classes.Item.gone01]");
        f.service.submit(&requester, form).await.unwrap();

        let err = f
            .service
            .approve_submission(&UserId::new("gm"), &requester)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "no-class");
        assert_eq!(f.actors.actor_count().await, 0);
        assert!(f.approvals.pending_for(&requester).await.is_none());

        let answer = f.channel.messages().pop().unwrap();
        assert!(matches!(answer, ApprovalMessage::CharacterRejected { .. }));
        let requester_info = UserInfo::new("u2", "Sam", UserRole::Player);
        assert_eq!(
            f.approvals.route(&requester_info, &answer).await,
            Some(ApprovalAction::ReopenForm)
        );
        assert!(!f.approvals.is_awaiting(&requester).await);
        assert!(f
            .notifier
            .notifications()
            .iter()
            .any(|(user, n)| user == &requester && n.code.as_deref() == Some("approval-failed")));
    }

    #[tokio::test]
    async fn test_gm_creates_character_for_player() {
        let f = fixture();

        let character = created(
            f.service
                .submit(&UserId::new("gm"), form().with("player", "u2"))
                .await
                .unwrap(),
        );

        assert_eq!(character.owner, UserId::new("u2"));
        assert_eq!(f.users.assigned(&UserId::new("u2")), Some(character.actor_id));
    }
}
