//! Every function here takes a player's collections and either applies the
//! transition or leaves them untouched. Unknown card ids are silent no-ops.

use tracing::debug;

use crate::models::{Card, CardId, Player};

/// Result of a damage adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Card missing, or positive damage aimed at an exhausted card.
    Unchanged,
    /// Card stays in play with the given damage.
    Damaged {
        /// Damage after the adjustment.
        damage: u32,
    },
    /// Damage reached willpower; the card moved to the banished pile.
    Banished {
        /// Damage recorded on the banished card, over-kill included.
        damage: u32,
    },
}

/// Add (or heal, with a negative delta) damage on a card in play.
///
/// Damage never drops below zero. Once it reaches the card's willpower the
/// card leaves play for the banished pile; only [`revive`] brings it back.
pub fn apply_damage(player: &mut Player, card_id: CardId, delta: i32) -> DamageOutcome {
    let Some(index) = player.cards.iter().position(|card| card.id == card_id) else {
        return DamageOutcome::Unchanged;
    };

    let card = &mut player.cards[index];
    if delta > 0 && !card.active {
        return DamageOutcome::Unchanged;
    }

    let damage = card.damage.saturating_add_signed(delta);
    if damage >= card.willpower {
        let mut knocked_out = player.cards.remove(index);
        knocked_out.damage = damage;
        debug!(player = %player.id, card = %knocked_out.id, damage, "Card banished");
        player.banished.push(knocked_out);
        DamageOutcome::Banished { damage }
    } else {
        card.damage = damage;
        DamageOutcome::Damaged { damage }
    }
}

/// Return a banished card to play, undamaged and ready, keeping its identity.
pub fn revive(player: &mut Player, card_id: CardId) -> bool {
    let Some(index) = player.banished.iter().position(|card| card.id == card_id) else {
        return false;
    };

    let mut card = player.banished.remove(index);
    card.damage = 0;
    card.active = true;
    player.cards.push(card);
    true
}

/// Put a fresh copy of a banished card into play under `new_id`.
///
/// The banished original stays where it is.
pub fn duplicate(player: &mut Player, card_id: CardId, new_id: CardId) -> Option<CardId> {
    let copy = player.banished_card(card_id).map(|card| card.duplicate(new_id))?;
    player.cards.push(copy);
    Some(new_id)
}

/// Flip the exhausted marker. Damage is not affected.
pub fn toggle_active(player: &mut Player, card_id: CardId) -> Option<bool> {
    let card = player.cards.iter_mut().find(|card| card.id == card_id)?;
    card.active = !card.active;
    Some(card.active)
}

/// Delete a card from play outright, without banishing it.
pub fn remove(player: &mut Player, card_id: CardId) -> Option<Card> {
    let index = player.cards.iter().position(|card| card.id == card_id)?;
    Some(player.cards.remove(index))
}
