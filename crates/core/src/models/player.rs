use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Card, CardId};

/// Upper bound of the resource (ink) counter.
pub const MAX_RESOURCES: u8 = 10;

/// One of the two fixed seats of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    /// The designated first player; a new round starts when the turn returns here.
    One,
    /// The second player.
    Two,
}

impl PlayerId {
    /// Both seats in their fixed iteration order.
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    /// Seat number as shown to users (1 or 2).
    pub fn number(self) -> u8 {
        match self {
            PlayerId::One => 1,
            PlayerId::Two => 2,
        }
    }

    /// Resolve a seat number coming from an outer surface.
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(PlayerId::One),
            2 => Some(PlayerId::Two),
            _ => None,
        }
    }

    /// The opposing seat.
    pub fn other(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    /// Zero-based seat position.
    pub fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }

    /// Display name used when none has been set.
    pub fn default_name(self) -> String {
        format!("Player {}", self.number())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// Per-player counters and card collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub(crate) id: PlayerId,
    pub(crate) name: String,
    pub(crate) score: u32,
    pub(crate) resources: u8,
    pub(crate) field_bonus: u32,
    pub(crate) cards: Vec<Card>,
    pub(crate) banished: Vec<Card>,
}

impl Player {
    /// Fresh seat with default name and everything at zero.
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            name: id.default_name(),
            score: 0,
            resources: 0,
            field_bonus: 0,
            cards: Vec::new(),
            banished: Vec::new(),
        }
    }

    /// Seat this player occupies.
    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Score (lore) counter.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Resource (ink) counter, always within `0..=MAX_RESOURCES`.
    pub fn resources(&self) -> u8 {
        self.resources
    }

    /// Score granted at the start of this player's next turn.
    pub fn field_bonus(&self) -> u32 {
        self.field_bonus
    }

    /// Cards in play, in insertion order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Knocked-out cards, in banishment order.
    pub fn banished(&self) -> &[Card] {
        &self.banished
    }

    /// Look up a card in play.
    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// Look up a banished card.
    pub fn banished_card(&self, id: CardId) -> Option<&Card> {
        self.banished.iter().find(|card| card.id == id)
    }

    pub(crate) fn rename(&mut self, name: &str) {
        let trimmed = name.trim();
        self.name = if trimmed.is_empty() {
            self.id.default_name()
        } else {
            trimmed.to_string()
        };
    }

    pub(crate) fn adjust_score(&mut self, delta: i32) {
        self.score = self.score.saturating_add_signed(delta);
    }

    pub(crate) fn adjust_resources(&mut self, delta: i32) {
        let next = i32::from(self.resources)
            .saturating_add(delta)
            .clamp(0, i32::from(MAX_RESOURCES));
        self.resources = next as u8;
    }

    pub(crate) fn adjust_field_bonus(&mut self, delta: i32) {
        self.field_bonus = self.field_bonus.saturating_add_signed(delta);
    }

    /// Start-of-turn upkeep: collect the field bonus and ready every card.
    pub(crate) fn begin_turn(&mut self) -> u32 {
        let bonus = self.field_bonus;
        self.score = self.score.saturating_add(bonus);
        for card in &mut self.cards {
            card.active = true;
        }
        bonus
    }
}
