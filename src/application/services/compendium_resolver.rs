//! Compendium Resolver - Turns form selections into authoritative template items

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::ports::outbound::{CompendiumError, CompendiumPort};
use crate::domain::entities::TemplateItem;
use crate::domain::services::ExpectedTemplates;
use crate::domain::value_objects::{
    FormSubmission, Selection, SelectionKind, SelectionParseError, SelectionSet,
};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("No {0} selected")]
    MissingSelection(SelectionKind),
    #[error("Invalid {kind} selection: {source}")]
    InvalidSelection {
        kind: SelectionKind,
        #[source]
        source: SelectionParseError,
    },
    #[error("{kind} '{reference}' was not found in any accessible compendium")]
    NotFound {
        kind: SelectionKind,
        reference: String,
    },
    #[error("'{name}' is a {found}, not a {expected}")]
    WrongKind {
        expected: SelectionKind,
        found: String,
        name: String,
    },
    #[error("Compendium error: {0}")]
    Compendium(#[from] CompendiumError),
}

impl ResolveError {
    /// Notification key for the user, e.g. `no-class`
    pub fn code(&self) -> String {
        match self {
            ResolveError::MissingSelection(kind)
            | ResolveError::InvalidSelection { kind, .. }
            | ResolveError::NotFound { kind, .. } => format!("no-{kind}"),
            ResolveError::WrongKind { expected, .. } => format!("no-{expected}"),
            ResolveError::Compendium(_) => "compendium-unavailable".to_string(),
        }
    }
}

/// The three templates a character is built from
#[derive(Debug, Clone)]
pub struct ResolvedTemplates {
    pub background: TemplateItem,
    pub race: TemplateItem,
    pub class: TemplateItem,
}

impl ResolvedTemplates {
    pub fn expected(&self) -> ExpectedTemplates {
        ExpectedTemplates {
            race: self.race.name.clone(),
            background: self.background.name.clone(),
            class: self.class.name.clone(),
        }
    }
}

pub struct CompendiumResolver {
    compendium: Arc<dyn CompendiumPort>,
}

impl CompendiumResolver {
    pub fn new(compendium: Arc<dyn CompendiumPort>) -> Self {
        Self { compendium }
    }

    /// Parse the three selection tokens from a form snapshot
    pub fn selections(form: &FormSubmission) -> Result<SelectionSet, ResolveError> {
        let parse = |kind: SelectionKind| -> Result<Option<Selection>, ResolveError> {
            match form.selection_token(kind) {
                Some(token) => Selection::parse(kind, &token)
                    .map_err(|source| ResolveError::InvalidSelection { kind, source }),
                None => Ok(None),
            }
        };
        Ok(SelectionSet {
            background: parse(SelectionKind::Background)?,
            race: parse(SelectionKind::Race)?,
            class: parse(SelectionKind::Class)?,
        })
    }

    /// Fetch the template for one selection
    #[instrument(skip(self), fields(kind = %selection.kind, id = %selection.template_id))]
    pub async fn resolve(&self, selection: &Selection) -> Result<TemplateItem, ResolveError> {
        let mut found = None;
        if let Some(uuid) = selection.lookup_uuid() {
            found = match self.compendium.get_document(&uuid).await {
                Ok(document) => document,
                // not a compendium reference; the pack id may still find it
                Err(CompendiumError::InvalidUuid(_)) => {
                    warn!(uuid = %uuid, "Selection carries an unusable UUID");
                    None
                }
                Err(e) => return Err(e.into()),
            };
        }
        if found.is_none() {
            if let Some(pack_id) = &selection.pack_id {
                found = self
                    .compendium
                    .get_from_pack(pack_id, &selection.template_id)
                    .await?;
            }
        }

        let template = found.ok_or_else(|| ResolveError::NotFound {
            kind: selection.kind,
            reference: selection
                .lookup_uuid()
                .unwrap_or_else(|| selection.template_id.to_string()),
        })?;

        if !template.is_kind(selection.kind) {
            return Err(ResolveError::WrongKind {
                expected: selection.kind,
                found: template.item_type.clone(),
                name: template.name.clone(),
            });
        }

        debug!(name = %template.name, uuid = %template.uuid, "Resolved template");
        Ok(template)
    }

    /// Resolve background, race and class; any missing one is fatal
    pub async fn resolve_set(&self, set: &SelectionSet) -> Result<ResolvedTemplates, ResolveError> {
        let required = |kind: SelectionKind| set.get(kind).ok_or(ResolveError::MissingSelection(kind));

        Ok(ResolvedTemplates {
            background: self.resolve(required(SelectionKind::Background)?).await?,
            race: self.resolve(required(SelectionKind::Race)?).await?,
            class: self.resolve(required(SelectionKind::Class)?).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{template, FakeCompendium};

    fn resolver() -> CompendiumResolver {
        let compendium = FakeCompendium::new()
            .with(template("sage01", "Sage", "background", "dnd5e.backgrounds", 1))
            .with(template("elf01", "Elf", "race", "dnd5e.races", 1))
            .with(template("wiz01", "Wizard", "class", "dnd5e.classes", 2));
        CompendiumResolver::new(Arc::new(compendium))
    }

    fn form() -> FormSubmission {
        FormSubmission::new()
            .with("background", "sage01 [Compendium.dnd5e.backgrounds.Item.sage01]")
            .with("race", "elf01 (dnd5e.races)")
            .with("class", "wiz01 [Compendium.dnd5e.classes.Item.wiz01] (dnd5e.classes)")
    }

    #[tokio::test]
    async fn test_resolves_all_three_templates() {
        let set = CompendiumResolver::selections(&form()).unwrap();
        let templates = resolver().resolve_set(&set).await.unwrap();

        assert_eq!(templates.background.name, "Sage");
        assert_eq!(templates.race.name, "Elf");
        assert_eq!(templates.class.name, "Wizard");
    }

    #[tokio::test]
    async fn test_unresolvable_class_reports_no_class() {
        let form = form().with("class", "gone01 [Compendium.dnd5e.classes.Item.gone01]");
        let set = CompendiumResolver::selections(&form).unwrap();

        let err = resolver().resolve_set(&set).await.unwrap_err();

        assert!(matches!(err, ResolveError::NotFound { kind: SelectionKind::Class, .. }));
        assert_eq!(err.code(), "no-class");
    }

    #[tokio::test]
    async fn test_unusable_uuid_falls_back_to_pack() {
        let form = form().with("class", "wiz01 [Item.wiz01] (dnd5e.classes)");
        let set = CompendiumResolver::selections(&form).unwrap();

        let templates = resolver().resolve_set(&set).await.unwrap();

        assert_eq!(templates.class.name, "Wizard");
    }

    #[tokio::test]
    async fn test_malformed_uuid_without_pack_reports_no_class() {
        let form = form().with("class", "gone [Compendium.dnd5e.classes.gone]");
        let set = CompendiumResolver::selections(&form).unwrap();

        let err = resolver().resolve_set(&set).await.unwrap_err();

        assert!(matches!(err, ResolveError::NotFound { kind: SelectionKind::Class, .. }));
        assert_eq!(err.code(), "no-class");
    }

    #[tokio::test]
    async fn test_missing_selection_is_fatal() {
        let form = form().with("race", "");
        let set = CompendiumResolver::selections(&form).unwrap();

        let err = resolver().resolve_set(&set).await.unwrap_err();

        assert!(matches!(err, ResolveError::MissingSelection(SelectionKind::Race)));
    }

    #[tokio::test]
    async fn test_wrong_document_kind_is_rejected() {
        let form = form().with("race", "wiz01 [Compendium.dnd5e.classes.Item.wiz01]");
        let set = CompendiumResolver::selections(&form).unwrap();

        let err = resolver().resolve_set(&set).await.unwrap_err();

        assert!(matches!(err, ResolveError::WrongKind { expected: SelectionKind::Race, .. }));
    }
}
