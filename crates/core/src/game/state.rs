use serde::{Deserialize, Serialize};
use tracing::info;

use super::lifecycle::{self, DamageOutcome};
use crate::models::{Card, CardDraft, CardId, Player, PlayerId};

/// Score needed to win when nothing else is configured.
pub const DEFAULT_VICTORY_THRESHOLD: u32 = 20;

/// Seat that opens every round.
pub const FIRST_PLAYER: PlayerId = PlayerId::One;

/// Transient interaction targets owned by the match rather than the front-end,
/// so turn boundaries and resets clear them deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Player whose name is being edited.
    pub editing: Option<PlayerId>,
    /// Player receiving a new card.
    pub card_entry: Option<PlayerId>,
}

/// What happened at a turn boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnChange {
    /// Seat that now owns the turn.
    pub owner: PlayerId,
    /// Round counter after the change.
    pub turn: u32,
    /// Field bonus added to the new owner's score.
    pub bonus_applied: u32,
}

/// Full state of a two-player match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    players: [Player; 2],
    turn_owner: PlayerId,
    turn: u32,
    victory_threshold: u32,
    show_resources: bool,
    selection: Selection,
    next_card_id: u64,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new(DEFAULT_VICTORY_THRESHOLD)
    }
}

impl MatchState {
    /// New match at turn 1 with the first player to act.
    pub fn new(victory_threshold: u32) -> Self {
        Self {
            players: PlayerId::ALL.map(Player::new),
            turn_owner: FIRST_PLAYER,
            turn: 1,
            victory_threshold: normalize_threshold(victory_threshold),
            show_resources: true,
            selection: Selection::default(),
            next_card_id: 1,
        }
    }

    /// Both players in fixed seat order.
    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    /// Player occupying `id`.
    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.index()]
    }

    /// Seat whose turn it is.
    pub fn turn_owner(&self) -> PlayerId {
        self.turn_owner
    }

    /// Player whose turn it is.
    pub fn current_player(&self) -> &Player {
        self.player(self.turn_owner)
    }

    /// Round counter, starting at 1.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Score a player needs to win.
    pub fn victory_threshold(&self) -> u32 {
        self.victory_threshold
    }

    /// Whether the resource counters are displayed.
    pub fn show_resources(&self) -> bool {
        self.show_resources
    }

    /// Current interaction targets.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// First player, in seat order, whose score reached the threshold.
    pub fn winner(&self) -> Option<&Player> {
        self.players
            .iter()
            .find(|player| player.score >= self.victory_threshold)
    }

    /// Adjust a player's score, flooring at zero.
    pub fn update_score(&mut self, id: PlayerId, delta: i32) {
        self.player_mut(id).adjust_score(delta);
    }

    /// Adjust a player's resources within `0..=10`.
    pub fn update_resources(&mut self, id: PlayerId, delta: i32) {
        self.player_mut(id).adjust_resources(delta);
    }

    /// Adjust the bonus a player collects at the start of their next turn.
    pub fn update_field_bonus(&mut self, id: PlayerId, delta: i32) {
        self.player_mut(id).adjust_field_bonus(delta);
    }

    /// Hand the turn to the other seat.
    ///
    /// The incoming player collects their field bonus and readies all their
    /// cards. The round counter only advances when the first player is back.
    pub fn end_turn(&mut self) -> TurnChange {
        let next = self.turn_owner.other();
        let bonus_applied = self.player_mut(next).begin_turn();

        self.turn_owner = next;
        if next == FIRST_PLAYER {
            self.turn += 1;
        }
        self.selection.card_entry = None;

        info!(owner = %next, turn = self.turn, bonus = bonus_applied, "Turn ended");
        TurnChange {
            owner: next,
            turn: self.turn,
            bonus_applied,
        }
    }

    /// Start a new match. Threshold, resource display and the card id
    /// sequence carry over; everything else returns to its initial value.
    pub fn reset(&mut self) {
        self.players = PlayerId::ALL.map(Player::new);
        self.turn_owner = FIRST_PLAYER;
        self.turn = 1;
        self.selection = Selection::default();
        info!("Match reset");
    }

    /// Set the score needed to win. Zero restores the default.
    pub fn set_victory_threshold(&mut self, threshold: u32) {
        self.victory_threshold = normalize_threshold(threshold);
    }

    /// Show or hide the resource counters; returns the new setting.
    pub fn toggle_resource_display(&mut self) -> bool {
        self.show_resources = !self.show_resources;
        self.show_resources
    }

    /// Mark a player's name as being edited.
    pub fn begin_rename(&mut self, id: PlayerId) {
        self.selection.editing = Some(id);
    }

    /// Rename a player; a blank name restores the default.
    pub fn rename_player(&mut self, id: PlayerId, name: &str) {
        self.player_mut(id).rename(name);
        self.selection.editing = None;
    }

    /// Leave name editing without renaming.
    pub fn cancel_rename(&mut self) {
        self.selection.editing = None;
    }

    /// Open card entry for a player.
    pub fn begin_card_entry(&mut self, id: PlayerId) {
        self.selection.card_entry = Some(id);
    }

    /// Close card entry without adding anything.
    pub fn cancel_card_entry(&mut self) {
        self.selection.card_entry = None;
    }

    /// Put a new card into play. Invalid drafts are ignored.
    pub fn add_card(&mut self, id: PlayerId, draft: &CardDraft) -> Option<CardId> {
        if !draft.is_valid() {
            return None;
        }
        let card_id = self.allocate_card_id();
        let card = Card::from_draft(card_id, draft);
        self.player_mut(id).cards.push(card);
        self.selection.card_entry = None;
        Some(card_id)
    }

    /// Flip a card between ready and exhausted.
    pub fn toggle_card_active(&mut self, id: PlayerId, card_id: CardId) -> Option<bool> {
        lifecycle::toggle_active(self.player_mut(id), card_id)
    }

    /// Adjust damage on a card in play; see [`lifecycle::apply_damage`].
    pub fn apply_damage(&mut self, id: PlayerId, card_id: CardId, delta: i32) -> DamageOutcome {
        lifecycle::apply_damage(self.player_mut(id), card_id, delta)
    }

    /// Bring a banished card back into play.
    pub fn revive_card(&mut self, id: PlayerId, card_id: CardId) -> bool {
        lifecycle::revive(self.player_mut(id), card_id)
    }

    /// Copy a banished card back into play under a fresh id.
    pub fn duplicate_card(&mut self, id: PlayerId, card_id: CardId) -> Option<CardId> {
        if self.player(id).banished_card(card_id).is_none() {
            return None;
        }
        let new_id = self.allocate_card_id();
        lifecycle::duplicate(self.player_mut(id), card_id, new_id)
    }

    /// Delete a mis-entered card from play.
    pub fn remove_card(&mut self, id: PlayerId, card_id: CardId) -> bool {
        lifecycle::remove(self.player_mut(id), card_id).is_some()
    }

    fn allocate_card_id(&mut self) -> CardId {
        let id = CardId(self.next_card_id);
        self.next_card_id += 1;
        id
    }
}

fn normalize_threshold(threshold: u32) -> u32 {
    if threshold == 0 {
        DEFAULT_VICTORY_THRESHOLD
    } else {
        threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, willpower: u32) -> CardDraft {
        CardDraft::new(name, 1, willpower)
    }

    #[test]
    fn turn_owner_alternates_and_rounds_count_pairs() {
        let mut state = MatchState::default();
        assert_eq!(state.turn_owner(), PlayerId::One);
        assert_eq!(state.turn(), 1);

        let change = state.end_turn();
        assert_eq!(change.owner, PlayerId::Two);
        assert_eq!(state.turn(), 1);

        let change = state.end_turn();
        assert_eq!(change.owner, PlayerId::One);
        assert_eq!(state.turn(), 2);

        for _ in 0..4 {
            state.end_turn();
        }
        assert_eq!(state.turn_owner(), PlayerId::One);
        assert_eq!(state.turn(), 4);
    }

    #[test]
    fn end_turn_applies_bonus_and_readies_incoming_player_only() {
        let mut state = MatchState::default();
        let mine = state.add_card(PlayerId::One, &draft("Aladdin", 3)).unwrap();
        let theirs = state.add_card(PlayerId::Two, &draft("Jafar", 3)).unwrap();
        state.toggle_card_active(PlayerId::One, mine);
        state.toggle_card_active(PlayerId::Two, theirs);
        state.update_field_bonus(PlayerId::Two, 2);
        state.update_field_bonus(PlayerId::One, 5);

        let change = state.end_turn();
        assert_eq!(change.bonus_applied, 2);
        assert_eq!(state.player(PlayerId::Two).score(), 2);
        assert!(state.player(PlayerId::Two).cards()[0].is_active());

        assert_eq!(state.player(PlayerId::One).score(), 0);
        assert!(!state.player(PlayerId::One).cards()[0].is_active());
        // The bonus is an accumulator, not a one-shot.
        assert_eq!(state.player(PlayerId::Two).field_bonus(), 2);
    }

    #[test]
    fn end_turn_cancels_card_entry() {
        let mut state = MatchState::default();
        state.begin_card_entry(PlayerId::One);
        state.end_turn();
        assert_eq!(state.selection().card_entry, None);
    }

    #[test]
    fn counters_are_scoped_to_one_player() {
        let mut state = MatchState::default();
        state.update_score(PlayerId::One, 4);
        state.update_resources(PlayerId::One, 15);
        assert_eq!(state.player(PlayerId::One).score(), 4);
        assert_eq!(state.player(PlayerId::One).resources(), 10);
        assert_eq!(state.player(PlayerId::Two).score(), 0);
        assert_eq!(state.player(PlayerId::Two).resources(), 0);
    }

    #[test]
    fn winner_is_reported_once_threshold_reached() {
        let mut state = MatchState::default();
        for step in 1..=5 {
            state.update_score(PlayerId::One, 5);
            if step < 4 {
                assert!(state.winner().is_none(), "no winner at {}", step * 5);
            } else {
                assert_eq!(state.winner().map(Player::id), Some(PlayerId::One));
            }
        }
    }

    #[test]
    fn tie_goes_to_first_seat() {
        let mut state = MatchState::new(3);
        state.update_score(PlayerId::Two, 3);
        state.update_score(PlayerId::One, 3);
        assert_eq!(state.winner().map(Player::id), Some(PlayerId::One));
    }

    #[test]
    fn zero_threshold_restores_default() {
        let mut state = MatchState::new(0);
        assert_eq!(state.victory_threshold(), DEFAULT_VICTORY_THRESHOLD);
        state.set_victory_threshold(7);
        assert_eq!(state.victory_threshold(), 7);
        state.set_victory_threshold(0);
        assert_eq!(state.victory_threshold(), DEFAULT_VICTORY_THRESHOLD);
    }

    #[test]
    fn reset_restores_initial_players_but_keeps_settings() {
        let mut state = MatchState::new(12);
        let first = state.add_card(PlayerId::One, &draft("Simba", 2)).unwrap();
        state.apply_damage(PlayerId::One, first, 2);
        state.rename_player(PlayerId::Two, "Nala");
        state.update_score(PlayerId::Two, 6);
        state.toggle_resource_display();
        state.end_turn();
        state.begin_rename(PlayerId::One);
        state.begin_card_entry(PlayerId::Two);

        state.reset();

        assert_eq!(state.player(PlayerId::One), &Player::new(PlayerId::One));
        assert_eq!(state.player(PlayerId::Two), &Player::new(PlayerId::Two));
        assert_eq!(state.turn_owner(), FIRST_PLAYER);
        assert_eq!(state.turn(), 1);
        assert_eq!(state.selection(), &Selection::default());
        assert_eq!(state.victory_threshold(), 12);
        assert!(!state.show_resources());

        let next = state.add_card(PlayerId::Two, &draft("Scar", 2)).unwrap();
        assert!(next > first, "card ids are never reused");
        assert!(state.player(PlayerId::One).cards().is_empty());
    }

    #[test]
    fn invalid_drafts_are_rejected() {
        let mut state = MatchState::default();
        state.begin_card_entry(PlayerId::One);
        assert_eq!(state.add_card(PlayerId::One, &draft("  ", 2)), None);
        assert_eq!(state.add_card(PlayerId::One, &draft("Pua", 0)), None);
        assert_eq!(state.selection().card_entry, Some(PlayerId::One));

        assert!(state.add_card(PlayerId::One, &draft("Pua", 1)).is_some());
        assert_eq!(state.selection().card_entry, None);
    }

    #[test]
    fn duplicate_allocates_fresh_ids() {
        let mut state = MatchState::default();
        let id = state.add_card(PlayerId::Two, &draft("Hades", 1)).unwrap();
        state.apply_damage(PlayerId::Two, id, 1);

        let first = state.duplicate_card(PlayerId::Two, id).unwrap();
        let second = state.duplicate_card(PlayerId::Two, id).unwrap();
        assert_ne!(first, id);
        assert_ne!(first, second);
        assert_eq!(state.player(PlayerId::Two).cards().len(), 2);
        assert_eq!(state.player(PlayerId::Two).banished().len(), 1);

        assert_eq!(state.duplicate_card(PlayerId::One, id), None);
    }

    #[test]
    fn rename_clears_editing_target() {
        let mut state = MatchState::default();
        state.begin_rename(PlayerId::Two);
        state.rename_player(PlayerId::Two, "");
        assert_eq!(state.player(PlayerId::Two).name(), "Player 2");
        assert_eq!(state.selection().editing, None);
    }

    #[test]
    fn cancelled_rename_keeps_the_name() {
        let mut state = MatchState::default();
        state.rename_player(PlayerId::One, "Ariel");
        state.begin_rename(PlayerId::One);
        assert_eq!(state.selection().editing, Some(PlayerId::One));

        state.cancel_rename();
        assert_eq!(state.selection().editing, None);
        assert_eq!(state.player(PlayerId::One).name(), "Ariel");
    }
}
