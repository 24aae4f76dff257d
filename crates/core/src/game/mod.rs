//! Match bookkeeping: card lifecycle rules and the turn engine.

/// Card state transitions scoped to a single player's collections.
pub mod lifecycle;
/// Match state, turn order and win detection.
pub mod state;

pub use lifecycle::DamageOutcome;
pub use state::{MatchState, Selection, TurnChange, DEFAULT_VICTORY_THRESHOLD, FIRST_PLAYER};
