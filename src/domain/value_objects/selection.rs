//! Race / class / background selections submitted from the creation form
//!
//! Form inputs carry a compound token of the shape `id [uuid] (packId)`.
//! Both the bracketed UUID and the parenthesized pack id are optional; when the
//! pack id is absent it is derived from a compendium UUID
//! (`Compendium.<scope>.<pack>.Item.<id>`).

use serde::{Deserialize, Serialize};

use super::{ItemId, PackId};

/// The three template kinds every character must carry exactly one of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    Background,
    Race,
    Class,
}

impl SelectionKind {
    pub const ALL: [SelectionKind; 3] = [
        SelectionKind::Background,
        SelectionKind::Race,
        SelectionKind::Class,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionKind::Background => "background",
            SelectionKind::Race => "race",
            SelectionKind::Class => "class",
        }
    }

    /// Item document type carried by templates of this kind
    pub fn item_type(&self) -> &'static str {
        self.as_str()
    }

    pub fn label(&self) -> &'static str {
        match self {
            SelectionKind::Background => "Background",
            SelectionKind::Race => "Race",
            SelectionKind::Class => "Class",
        }
    }
}

impl std::fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionParseError {
    #[error("Unterminated '{0}' in selection token")]
    Unterminated(char),
    #[error("Selection token has no item id")]
    MissingId,
}

/// A parsed selection pointing at a compendium template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub kind: SelectionKind,
    pub template_id: ItemId,
    pub pack_id: Option<PackId>,
    pub uuid: Option<String>,
}

impl Selection {
    /// Parse a compound selection token. Returns `Ok(None)` for an empty token.
    pub fn parse(kind: SelectionKind, token: &str) -> Result<Option<Self>, SelectionParseError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }

        let uuid = delimited(token, '[', ']')?;
        let pack = delimited(token, '(', ')')?;

        let id_end = token.find(['[', '(']).unwrap_or(token.len());
        let id = token[..id_end].trim();
        if id.is_empty() {
            return Err(SelectionParseError::MissingId);
        }

        let pack_id = pack
            .or_else(|| uuid.as_deref().and_then(pack_from_uuid))
            .map(PackId::new);

        Ok(Some(Self {
            kind,
            template_id: ItemId::new(id),
            pack_id,
            uuid,
        }))
    }

    /// UUID to fetch, derived from pack and id when the token carried none
    pub fn lookup_uuid(&self) -> Option<String> {
        self.uuid.clone().or_else(|| {
            self.pack_id
                .as_ref()
                .map(|pack| format!("Compendium.{}.Item.{}", pack, self.template_id))
        })
    }
}

fn delimited(token: &str, open: char, close: char) -> Result<Option<String>, SelectionParseError> {
    let Some(start) = token.find(open) else {
        return Ok(None);
    };
    let rest = &token[start + open.len_utf8()..];
    let end = rest.find(close).ok_or(SelectionParseError::Unterminated(open))?;
    let inner = rest[..end].trim();
    Ok((!inner.is_empty()).then(|| inner.to_string()))
}

/// Derive `<scope>.<pack>` from `Compendium.<scope>.<pack>.Item.<id>`
pub fn pack_from_uuid(uuid: &str) -> Option<String> {
    let mut parts = uuid.split('.');
    if parts.next()? != "Compendium" {
        return None;
    }
    let scope = parts.next()?;
    let pack = parts.next()?;
    Some(format!("{scope}.{pack}"))
}

/// Immutable snapshot of the three selections handed to character creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    pub background: Option<Selection>,
    pub race: Option<Selection>,
    pub class: Option<Selection>,
}

impl SelectionSet {
    pub fn get(&self, kind: SelectionKind) -> Option<&Selection> {
        match kind {
            SelectionKind::Background => self.background.as_ref(),
            SelectionKind::Race => self.race.as_ref(),
            SelectionKind::Class => self.class.as_ref(),
        }
    }
}
