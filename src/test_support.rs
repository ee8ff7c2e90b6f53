//! In-memory port fakes shared by the service tests

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::application::dto::ApprovalMessage;
use crate::application::ports::outbound::{
    AdvancementHostError, AdvancementHostPort, AdvancementWorkflow, ApprovalChannelPort,
    ChannelError, ChatMessage, CompendiumError, CompendiumPort, DraftRepositoryPort, Notification,
    NotificationPort, SettingsError, SettingsRepositoryPort, UserDirectoryError, UserDirectoryPort,
};
use crate::domain::entities::{
    AbilityScores, AdvancementKind, AdvancementStep, Biography, CharacterDraft, OwnedItem,
    TemplateItem, UserInfo,
};
use crate::domain::value_objects::{
    ActorId, FormSubmission, ItemId, MancerSettings, PackId, TokenConfig, UserId, WorkflowId,
};

fn steps(count: usize) -> Vec<AdvancementStep> {
    (0..count)
        .map(|level| AdvancementStep {
            kind: AdvancementKind::HitPoints,
            level: level as u32 + 1,
            title: None,
            configuration: Value::Null,
        })
        .collect()
}

/// A compendium template with `steps` advancement steps
pub fn template(id: &str, name: &str, item_type: &str, pack: &str, step_count: usize) -> TemplateItem {
    TemplateItem {
        id: ItemId::new(id),
        name: name.to_string(),
        item_type: item_type.to_string(),
        img: None,
        uuid: format!("Compendium.{pack}.Item.{id}"),
        pack_id: Some(PackId::new(pack)),
        advancement: steps(step_count),
        system: Map::new(),
    }
}

/// A full equipment document, as opposed to an index summary
pub fn equipment_template(id: &str, name: &str, pack: &str) -> TemplateItem {
    let system = json!({
        "quantity": 1,
        "weight": 1,
        "price": {"value": 2, "denomination": "gp"},
        "description": {"value": ""},
        "properties": [],
        "activities": {}
    });
    TemplateItem {
        system: system.as_object().cloned().unwrap_or_default(),
        ..template(id, name, "equipment", pack, 0)
    }
}

pub fn owned(id: &str, name: &str, item_type: &str) -> OwnedItem {
    OwnedItem {
        id: ItemId::new(id),
        name: name.to_string(),
        item_type: item_type.to_string(),
        img: None,
        advancement: Vec::new(),
        system: Map::new(),
        source_uuid: Some(format!("Compendium.test.Item.{id}")),
    }
}

/// An owned item carrying one advancement step
pub fn advanced(id: &str, name: &str, item_type: &str) -> OwnedItem {
    OwnedItem {
        advancement: steps(1),
        ..owned(id, name, item_type)
    }
}

pub fn draft(name: &str) -> CharacterDraft {
    CharacterDraft {
        name: name.to_string(),
        img: None,
        token: TokenConfig::default(),
        abilities: AbilityScores::default(),
        details: Biography::default(),
    }
}

// ---------------------------------------------------------------------------
// Settings and drafts
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemorySettingsRepository {
    settings: Mutex<Option<MancerSettings>>,
    failing: bool,
}

impl InMemorySettingsRepository {
    pub fn with(settings: MancerSettings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            settings: Mutex::new(None),
            failing: true,
        }
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.failing {
            return Err(SettingsError::Database("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsRepositoryPort for InMemorySettingsRepository {
    async fn get(&self) -> Result<MancerSettings, SettingsError> {
        self.check()?;
        Ok(self.settings.lock().unwrap().clone().unwrap_or_default())
    }

    async fn save(&self, settings: &MancerSettings) -> Result<(), SettingsError> {
        self.check()?;
        *self.settings.lock().unwrap() = Some(settings.clone());
        Ok(())
    }

    async fn reset(&self) -> Result<MancerSettings, SettingsError> {
        self.check()?;
        *self.settings.lock().unwrap() = None;
        Ok(MancerSettings::default())
    }
}

#[derive(Default)]
pub struct InMemoryDrafts {
    drafts: Mutex<HashMap<UserId, FormSubmission>>,
}

#[async_trait]
impl DraftRepositoryPort for InMemoryDrafts {
    async fn save(&self, user: &UserId, form: &FormSubmission) -> Result<(), SettingsError> {
        self.drafts.lock().unwrap().insert(user.clone(), form.clone());
        Ok(())
    }

    async fn load(&self, user: &UserId) -> Result<Option<FormSubmission>, SettingsError> {
        Ok(self.drafts.lock().unwrap().get(user).cloned())
    }

    async fn clear(&self, user: &UserId) -> Result<(), SettingsError> {
        self.drafts.lock().unwrap().remove(user);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Compendium
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeCompendium {
    documents: HashMap<String, TemplateItem>,
}

impl FakeCompendium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, template: TemplateItem) -> Self {
        self.documents.insert(template.uuid.clone(), template);
        self
    }
}

#[async_trait]
impl CompendiumPort for FakeCompendium {
    async fn get_document(&self, uuid: &str) -> Result<Option<TemplateItem>, CompendiumError> {
        if !uuid.starts_with("Compendium.") || uuid.split('.').count() != 5 {
            return Err(CompendiumError::InvalidUuid(uuid.to_string()));
        }
        Ok(self.documents.get(uuid).cloned())
    }

    async fn get_from_pack(
        &self,
        pack: &PackId,
        item: &ItemId,
    ) -> Result<Option<TemplateItem>, CompendiumError> {
        Ok(self
            .documents
            .values()
            .find(|t| t.pack_id.as_ref() == Some(pack) && &t.id == item)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Users, notifications, approval channel
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeUsers {
    users: HashMap<UserId, UserInfo>,
    assigned: Mutex<HashMap<UserId, ActorId>>,
}

impl FakeUsers {
    pub fn with(mut self, user: UserInfo) -> Self {
        self.users.insert(user.id.clone(), user);
        self
    }

    pub fn assigned(&self, user: &UserId) -> Option<ActorId> {
        self.assigned.lock().unwrap().get(user).copied()
    }
}

#[async_trait]
impl UserDirectoryPort for FakeUsers {
    async fn get_user(&self, id: &UserId) -> Option<UserInfo> {
        self.users.get(id).cloned()
    }

    async fn assign_character(&self, id: &UserId, actor_id: ActorId) -> Result<(), UserDirectoryError> {
        if !self.users.contains_key(id) {
            return Err(UserDirectoryError::NotFound(id.clone()));
        }
        self.assigned.lock().unwrap().insert(id.clone(), actor_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<(UserId, Notification)>>,
    chat: Mutex<Vec<ChatMessage>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<(UserId, Notification)> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn chat(&self) -> Vec<ChatMessage> {
        self.chat.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationPort for RecordingNotifier {
    async fn notify(&self, user: &UserId, notification: Notification) {
        self.notifications
            .lock()
            .unwrap()
            .push((user.clone(), notification));
    }

    async fn post_chat(&self, message: ChatMessage) {
        self.chat.lock().unwrap().push(message);
    }
}

#[derive(Default)]
pub struct RecordingChannel {
    messages: Mutex<Vec<ApprovalMessage>>,
    failing: bool,
}

impl RecordingChannel {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<ApprovalMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApprovalChannelPort for RecordingChannel {
    async fn publish(&self, message: ApprovalMessage) -> Result<(), ChannelError> {
        if self.failing {
            return Err(ChannelError::NoListeners);
        }
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Advancement host
// ---------------------------------------------------------------------------

#[derive(Default)]
struct HostLog {
    created: Vec<String>,
    closed: Vec<String>,
    sheets: Vec<ActorId>,
}

/// Scripted advancement host. Workflows complete immediately with the item
/// they were given, unless told to hang, fail construction, or grant extras.
#[derive(Default)]
pub struct FakeAdvancementHost {
    log: Arc<Mutex<HostLog>>,
    hanging: HashSet<String>,
    construct_failures: Mutex<HashMap<String, u32>>,
    construct_hangs: Mutex<HashMap<String, u32>>,
    grants: HashMap<String, Vec<OwnedItem>>,
}

impl FakeAdvancementHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// The workflow for `item` never completes
    pub fn hanging(mut self, item: &str) -> Self {
        self.hanging.insert(item.to_string());
        self
    }

    /// Construction for `item` fails the next `times` attempts
    pub fn failing_construction(self, item: &str, times: u32) -> Self {
        self.construct_failures
            .lock()
            .unwrap()
            .insert(item.to_string(), times);
        self
    }

    /// Construction for `item` never returns for the next `times` attempts
    pub fn hanging_construction(self, item: &str, times: u32) -> Self {
        self.construct_hangs
            .lock()
            .unwrap()
            .insert(item.to_string(), times);
        self
    }

    /// Completing `item` also grants `extra`
    pub fn granting(mut self, item: &str, extra: OwnedItem) -> Self {
        self.grants.entry(item.to_string()).or_default().push(extra);
        self
    }

    /// Item names workflows were successfully constructed for, in order
    pub fn created(&self) -> Vec<String> {
        self.log.lock().unwrap().created.clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.log.lock().unwrap().closed.clone()
    }

    pub fn sheets_opened(&self) -> Vec<ActorId> {
        self.log.lock().unwrap().sheets.clone()
    }
}

#[async_trait]
impl AdvancementHostPort for FakeAdvancementHost {
    async fn create_workflow(
        &self,
        _user: &UserId,
        _actor_id: ActorId,
        item: OwnedItem,
    ) -> Result<Box<dyn AdvancementWorkflow>, AdvancementHostError> {
        let hang = {
            let mut hangs = self.construct_hangs.lock().unwrap();
            match hangs.get_mut(&item.name) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };
        if hang {
            std::future::pending::<()>().await;
        }
        {
            let mut failures = self.construct_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&item.name) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(AdvancementHostError::Host("manager failed to build".to_string()));
                }
            }
        }

        self.log.lock().unwrap().created.push(item.name.clone());
        let mut produced = vec![item.clone()];
        produced.extend(self.grants.get(&item.name).cloned().unwrap_or_default());
        Ok(Box::new(FakeWorkflow {
            id: WorkflowId::new(),
            name: item.name.clone(),
            hang: self.hanging.contains(&item.name),
            produced,
            open: true,
            log: self.log.clone(),
        }))
    }

    async fn open_sheet(&self, _user: &UserId, actor_id: ActorId) -> Result<(), AdvancementHostError> {
        self.log.lock().unwrap().sheets.push(actor_id);
        Ok(())
    }
}

struct FakeWorkflow {
    id: WorkflowId,
    name: String,
    hang: bool,
    produced: Vec<OwnedItem>,
    open: bool,
    log: Arc<Mutex<HostLog>>,
}

#[async_trait]
impl AdvancementWorkflow for FakeWorkflow {
    fn id(&self) -> WorkflowId {
        self.id
    }

    async fn render(&mut self) -> Result<(), AdvancementHostError> {
        Ok(())
    }

    async fn completion(&mut self) -> Result<Vec<OwnedItem>, AdvancementHostError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.open = false;
        Ok(self.produced.clone())
    }

    async fn close(&mut self) {
        if self.open {
            self.open = false;
            self.log.lock().unwrap().closed.push(self.name.clone());
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
