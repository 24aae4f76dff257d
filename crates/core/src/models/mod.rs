//! Shared domain models.

mod card;
mod player;

pub use card::{Card, CardDraft, CardId};
pub use player::{Player, PlayerId, MAX_RESOURCES};

use serde::{Deserialize, Serialize};

/// Canonical entry of the card reference list used for entry assistance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryCard {
    /// Display name, `name - version` when a version tag is present.
    pub full_name: String,
    /// Bare card name.
    pub name: String,
    /// Optional version tag (the card subtitle).
    #[serde(default)]
    pub version: Option<String>,
    /// Printed strength.
    pub strength: u32,
    /// Printed willpower.
    pub willpower: u32,
}

impl RepositoryCard {
    /// Build a canonical record, deriving the full name from name and version.
    pub fn new(name: String, version: Option<String>, strength: u32, willpower: u32) -> Self {
        let version = version.filter(|value| !value.is_empty());
        let full_name = match version.as_deref() {
            Some(version) => format!("{name} - {version}"),
            None => name.clone(),
        };
        Self {
            full_name,
            name,
            version,
            strength,
            willpower,
        }
    }
}
