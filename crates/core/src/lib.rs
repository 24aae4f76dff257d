#![warn(clippy::all, missing_docs)]

//! Core domain logic for the lorekeeper match tracker.
//!
//! This crate hosts the match state and card lifecycle rules, the card
//! repository (normalisation, durable cache, remote refresh), configuration
//! handling, and the command surface used by the terminal UI.

pub mod config;
pub mod controller;
pub mod error;
pub mod game;
pub mod models;
pub mod repository;

pub use config::AppConfig;
pub use controller::{RepositoryEvent, SessionController, Startup};
pub use error::RepositoryError;
pub use game::{DamageOutcome, MatchState, TurnChange};
pub use models::{Card, CardDraft, CardId, Player, PlayerId, RepositoryCard};
pub use repository::{CardRepository, HttpSource, RepositoryOrigin, RepositoryReport};
