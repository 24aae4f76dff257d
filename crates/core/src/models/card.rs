#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};

use super::RepositoryCard;

/// Identity of a card in play. Allocated monotonically and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A card on a player's battlefield or in their banished pile.
///
/// Strength and willpower are fixed at creation; only the exhausted flag and
/// the accumulated damage change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub(crate) id: CardId,
    pub(crate) name: String,
    pub(crate) active: bool,
    pub(crate) damage: u32,
    pub(crate) strength: u32,
    pub(crate) willpower: u32,
}

impl Card {
    pub(crate) fn from_draft(id: CardId, draft: &CardDraft) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            active: true,
            damage: 0,
            strength: draft.strength,
            willpower: draft.willpower,
        }
    }

    /// Fresh copy with a new identity, ready and undamaged.
    pub(crate) fn duplicate(&self, id: CardId) -> Self {
        Self {
            id,
            name: self.name.clone(),
            active: true,
            damage: 0,
            strength: self.strength,
            willpower: self.willpower,
        }
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `false` once the card has been exhausted this turn.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn damage(&self) -> u32 {
        self.damage
    }

    pub fn strength(&self) -> u32 {
        self.strength
    }

    pub fn willpower(&self) -> u32 {
        self.willpower
    }

    /// Damage the card can still absorb before being knocked out.
    pub fn remaining_willpower(&self) -> u32 {
        self.willpower.saturating_sub(self.damage)
    }
}

/// User input describing a card about to enter play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDraft {
    pub name: String,
    pub strength: u32,
    pub willpower: u32,
}

impl Default for CardDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            strength: 0,
            willpower: 1,
        }
    }
}

impl CardDraft {
    pub fn new(name: impl Into<String>, strength: u32, willpower: u32) -> Self {
        Self {
            name: name.into(),
            strength,
            willpower,
        }
    }

    /// Pre-fill a draft from a repository suggestion.
    pub fn from_suggestion(card: &RepositoryCard) -> Self {
        Self {
            name: card.full_name.clone(),
            strength: card.strength,
            willpower: card.willpower.max(1),
        }
    }

    /// A draft may enter play only with a non-blank name and positive willpower.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.willpower > 0
    }
}
