//! Command surface driving a match and the card repository.
//!
//! Match commands never fail: unknown card ids are ignored. Repository
//! commands report a [`RepositoryReport`] or a [`RepositoryError`]; the two
//! background retrievals report through [`RepositoryEvent`]s instead.

#![allow(missing_docs)]

use std::{path::PathBuf, sync::Arc};

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, info};

use crate::{
    config::AppConfig,
    error::RepositoryError,
    game::{DamageOutcome, MatchState, TurnChange},
    models::{CardDraft, CardId, PlayerId, RepositoryCard},
    repository::{
        CacheStatus, CardRepository, DocumentSource, RepositoryOrigin, RepositoryReport,
    },
};

const EVENT_CAPACITY: usize = 8;

/// Completion notice of a background repository retrieval.
#[derive(Debug)]
pub enum RepositoryEvent {
    /// The canonical set was replaced.
    Completed(RepositoryReport),
    /// The retrieval failed; the previous set is still in place.
    Failed {
        /// Retrieval that failed.
        origin: RepositoryOrigin,
        /// The failure.
        error: RepositoryError,
    },
}

impl RepositoryEvent {
    fn from_result(
        origin: RepositoryOrigin,
        result: Result<RepositoryReport, RepositoryError>,
    ) -> Self {
        match result {
            Ok(report) => RepositoryEvent::Completed(report),
            Err(error) => RepositoryEvent::Failed { origin, error },
        }
    }
}

/// How the repository was initialised at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Loaded from the durable slot.
    Cached(usize),
    /// The slot was corrupt and has been cleared; the repository is empty.
    Recovered,
    /// The slot was empty; a remote refresh is running.
    Fetching,
}

/// Orchestrates match commands and repository management.
///
/// Every match command swaps in a new [`MatchState`]; snapshots handed out by
/// [`SessionController::snapshot`] never change afterwards.
pub struct SessionController<S: DocumentSource> {
    state: Arc<MatchState>,
    repository: CardRepository,
    remote: Arc<S>,
    events: mpsc::Sender<RepositoryEvent>,
}

impl<S: DocumentSource> SessionController<S> {
    /// Controller with a fresh match, the configured repository slot, and
    /// `remote` as the refresh source. Background completions arrive on the
    /// returned receiver.
    pub fn new(config: &AppConfig, remote: S) -> (Self, mpsc::Receiver<RepositoryEvent>) {
        Self::with_repository(
            CardRepository::new(config.repository_cache()),
            remote,
            config.victory_threshold,
        )
    }

    /// Controller over an existing repository.
    pub fn with_repository(
        repository: CardRepository,
        remote: S,
        victory_threshold: u32,
    ) -> (Self, mpsc::Receiver<RepositoryEvent>) {
        let (events, receiver) = mpsc::channel(EVENT_CAPACITY);
        let controller = Self {
            state: Arc::new(MatchState::new(victory_threshold)),
            repository,
            remote: Arc::new(remote),
            events,
        };
        (controller, receiver)
    }

    /// Load the cached repository, starting a remote refresh when the slot is
    /// empty. Must run inside a tokio runtime.
    pub fn start(&self) -> Startup {
        match self.repository.load_cached() {
            CacheStatus::Loaded(count) => Startup::Cached(count),
            CacheStatus::Cleared => Startup::Recovered,
            CacheStatus::Missing => {
                info!("No cached card repository; fetching default");
                self.refresh_repository_from_remote();
                Startup::Fetching
            }
        }
    }

    /// Current immutable snapshot of the match.
    pub fn snapshot(&self) -> Arc<MatchState> {
        Arc::clone(&self.state)
    }

    /// Shared handle to the canonical repository.
    pub fn repository(&self) -> &CardRepository {
        &self.repository
    }

    fn mutate<T>(&mut self, apply: impl FnOnce(&mut MatchState) -> T) -> T {
        apply(Arc::make_mut(&mut self.state))
    }

    pub fn update_score(&mut self, player: PlayerId, delta: i32) {
        self.mutate(|state| state.update_score(player, delta));
    }

    pub fn update_resource(&mut self, player: PlayerId, delta: i32) {
        self.mutate(|state| state.update_resources(player, delta));
    }

    pub fn update_field_bonus(&mut self, player: PlayerId, delta: i32) {
        self.mutate(|state| state.update_field_bonus(player, delta));
    }

    pub fn end_turn(&mut self) -> TurnChange {
        self.mutate(MatchState::end_turn)
    }

    pub fn reset_match(&mut self) {
        self.mutate(MatchState::reset);
    }

    /// Open card entry for `player`.
    pub fn begin_card_entry(&mut self, player: PlayerId) {
        self.mutate(|state| state.begin_card_entry(player));
    }

    pub fn cancel_card_entry(&mut self) {
        self.mutate(MatchState::cancel_card_entry);
    }

    /// Returns the new card's id, or `None` when the draft was rejected.
    pub fn add_card(&mut self, player: PlayerId, draft: &CardDraft) -> Option<CardId> {
        self.mutate(|state| state.add_card(player, draft))
    }

    pub fn toggle_card_active(&mut self, player: PlayerId, card: CardId) -> Option<bool> {
        self.mutate(|state| state.toggle_card_active(player, card))
    }

    pub fn apply_damage(&mut self, player: PlayerId, card: CardId, delta: i32) -> DamageOutcome {
        let outcome = self.mutate(|state| state.apply_damage(player, card, delta));
        if let DamageOutcome::Banished { damage } = outcome {
            info!(%player, %card, damage, "Card knocked out");
        }
        outcome
    }

    pub fn revive_card(&mut self, player: PlayerId, card: CardId) -> bool {
        let revived = self.mutate(|state| state.revive_card(player, card));
        if revived {
            info!(%player, %card, "Card revived");
        }
        revived
    }

    pub fn duplicate_card(&mut self, player: PlayerId, card: CardId) -> Option<CardId> {
        self.mutate(|state| state.duplicate_card(player, card))
    }

    pub fn remove_card(&mut self, player: PlayerId, card: CardId) -> bool {
        self.mutate(|state| state.remove_card(player, card))
    }

    /// Mark `player`'s name as being edited.
    pub fn begin_rename(&mut self, player: PlayerId) {
        self.mutate(|state| state.begin_rename(player));
    }

    pub fn cancel_rename(&mut self) {
        self.mutate(MatchState::cancel_rename);
    }

    pub fn rename_player(&mut self, player: PlayerId, name: &str) {
        self.mutate(|state| state.rename_player(player, name));
    }

    pub fn set_victory_threshold(&mut self, threshold: u32) {
        self.mutate(|state| state.set_victory_threshold(threshold));
    }

    pub fn toggle_resource_display(&mut self) -> bool {
        self.mutate(MatchState::toggle_resource_display)
    }

    /// Entry suggestions for a partially typed card name.
    pub fn suggestions(&self, query: &str) -> Vec<RepositoryCard> {
        self.repository.suggestions(query)
    }

    /// Import a document supplied in memory.
    pub fn import_repository(&self, document: &[u8]) -> Result<RepositoryReport, RepositoryError> {
        let result = self.repository.import_document(document);
        if let Err(err) = &result {
            error!(%err, "Repository import failed");
        }
        result
    }

    /// Read and import a file in the background.
    pub fn import_repository_file(&self, path: PathBuf) -> JoinHandle<()> {
        let repository = self.repository.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = repository.import_file(&path).await;
            report(&events, RepositoryOrigin::File, result).await;
        })
    }

    /// Replace the repository with the remote card dump in the background.
    ///
    /// Overlapping refreshes are not cancelled; whichever finishes last wins.
    pub fn refresh_repository_from_remote(&self) -> JoinHandle<()> {
        let repository = self.repository.clone();
        let remote = Arc::clone(&self.remote);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = repository.refresh_from(remote.as_ref()).await;
            report(&events, RepositoryOrigin::Remote, result).await;
        })
    }

    pub fn clear_repository(&self) -> Result<(), RepositoryError> {
        self.repository.clear()
    }
}

async fn report(
    events: &mpsc::Sender<RepositoryEvent>,
    origin: RepositoryOrigin,
    result: Result<RepositoryReport, RepositoryError>,
) {
    if let Err(err) = &result {
        error!(%origin, %err, "Repository retrieval failed");
    }
    // A closed receiver means the front-end is gone; the cache is already updated.
    let _ = events
        .send(RepositoryEvent::from_result(origin, result))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Player, repository::RepositoryCache};
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    struct FakeRemote(Result<&'static str, u16>);

    impl DocumentSource for FakeRemote {
        async fn fetch(&self) -> Result<Vec<u8>, RepositoryError> {
            match self.0 {
                Ok(body) => Ok(body.as_bytes().to_vec()),
                Err(status) => Err(RepositoryError::Status(status)),
            }
        }
    }

    fn controller(
        dir: &std::path::Path,
        remote: FakeRemote,
    ) -> (SessionController<FakeRemote>, mpsc::Receiver<RepositoryEvent>) {
        let repository = CardRepository::new(RepositoryCache::in_dir(dir));
        SessionController::with_repository(repository, remote, 20)
    }

    const REMOTE: &str = r#"[{"Name":"Maui","Subtitle":"Demigod","Strength":5,"Willpower":5}]"#;

    #[test]
    fn snapshots_are_immutable() -> Result<()> {
        let dir = tempdir()?;
        let (mut session, _events) = controller(dir.path(), FakeRemote(Ok(REMOTE)));
        let before = session.snapshot();

        session.update_score(PlayerId::One, 3);
        session.end_turn();

        assert_eq!(before.player(PlayerId::One).score(), 0);
        assert_eq!(before.turn_owner(), PlayerId::One);
        assert_eq!(session.snapshot().player(PlayerId::One).score(), 3);
        assert_eq!(session.snapshot().turn_owner(), PlayerId::Two);
        Ok(())
    }

    #[test]
    fn five_step_score_scenario() -> Result<()> {
        let dir = tempdir()?;
        let (mut session, _events) = controller(dir.path(), FakeRemote(Ok(REMOTE)));
        let mut first_win_at = None;
        for step in 1..=5 {
            session.update_score(PlayerId::One, 5);
            if first_win_at.is_none() && session.snapshot().winner().is_some() {
                first_win_at = Some(step);
            }
        }
        assert_eq!(first_win_at, Some(4));
        assert_eq!(session.snapshot().winner().map(Player::id), Some(PlayerId::One));
        assert_eq!(session.snapshot().player(PlayerId::One).score(), 25);
        Ok(())
    }

    #[test]
    fn card_lifecycle_through_commands() -> Result<()> {
        let dir = tempdir()?;
        let (mut session, _events) = controller(dir.path(), FakeRemote(Ok(REMOTE)));
        let card = session
            .add_card(PlayerId::Two, &CardDraft::new("Flynn", 2, 3))
            .expect("valid draft");

        session.apply_damage(PlayerId::Two, card, 1);
        session.apply_damage(PlayerId::Two, card, 1);
        assert_eq!(
            session.apply_damage(PlayerId::Two, card, 1),
            DamageOutcome::Banished { damage: 3 }
        );
        let snapshot = session.snapshot();
        assert!(snapshot.player(PlayerId::Two).card(card).is_none());
        assert_eq!(snapshot.player(PlayerId::Two).banished()[0].damage(), 3);

        // Stale references are ignored.
        assert_eq!(
            session.apply_damage(PlayerId::One, card, 1),
            DamageOutcome::Unchanged
        );
        assert!(!session.revive_card(PlayerId::One, card));
        assert!(!session.remove_card(PlayerId::Two, card));

        assert!(session.revive_card(PlayerId::Two, card));
        assert_eq!(
            session
                .snapshot()
                .player(PlayerId::Two)
                .card(card)
                .map(|c| c.damage()),
            Some(0)
        );
        Ok(())
    }

    #[test]
    fn cancelled_rename_clears_editing_only() -> Result<()> {
        let dir = tempdir()?;
        let (mut session, _events) = controller(dir.path(), FakeRemote(Ok(REMOTE)));
        session.begin_rename(PlayerId::Two);
        session.cancel_rename();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.selection().editing, None);
        assert_eq!(snapshot.player(PlayerId::Two).name(), "Player 2");
        Ok(())
    }

    #[test]
    fn resource_clamps_at_ten() -> Result<()> {
        let dir = tempdir()?;
        let (mut session, _events) = controller(dir.path(), FakeRemote(Ok(REMOTE)));
        session.update_resource(PlayerId::One, 10);
        session.update_resource(PlayerId::One, 5);
        assert_eq!(session.snapshot().player(PlayerId::One).resources(), 10);
        Ok(())
    }

    #[test]
    fn import_reports_count_and_enables_suggestions() -> Result<()> {
        let dir = tempdir()?;
        let (session, _events) = controller(dir.path(), FakeRemote(Ok(REMOTE)));
        let report = session.import_repository(
            br#"{"cards":[{"name":"X","strength":1,"willpower":2},{"Name":"X","Subtitle":"V2","Strength":3,"Willpower":4}]}"#,
        )?;
        assert_eq!(report.count, 2);
        let names: Vec<String> = session
            .suggestions("x - ")
            .into_iter()
            .map(|card| card.full_name)
            .collect();
        assert_eq!(names, vec!["X - V2".to_string()]);

        assert!(matches!(
            session.import_repository(b"42"),
            Err(RepositoryError::InvalidFormat(_))
        ));
        assert_eq!(session.repository().len(), 2);

        session.clear_repository()?;
        assert!(session.repository().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn empty_cache_triggers_remote_refresh() -> Result<()> {
        let dir = tempdir()?;
        let (session, mut events) = controller(dir.path(), FakeRemote(Ok(REMOTE)));
        assert_eq!(session.start(), Startup::Fetching);

        match events.recv().await {
            Some(RepositoryEvent::Completed(report)) => {
                assert_eq!(report.origin, RepositoryOrigin::Remote);
                assert_eq!(report.count, 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(session.repository().cards()[0].full_name, "Maui - Demigod");

        let (again, _events) = controller(dir.path(), FakeRemote(Err(500)));
        assert_eq!(again.start(), Startup::Cached(1));
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_cache_recovers_without_fetching() -> Result<()> {
        let dir = tempdir()?;
        fs::write(RepositoryCache::in_dir(dir.path()).path(), "not json")?;
        let (session, mut events) = controller(dir.path(), FakeRemote(Ok(REMOTE)));
        assert_eq!(session.start(), Startup::Recovered);
        assert!(session.repository().is_empty());
        drop(session);
        assert!(events.recv().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_set() -> Result<()> {
        let dir = tempdir()?;
        let (session, mut events) = controller(dir.path(), FakeRemote(Err(503)));
        session.import_repository(br#"[{"name":"Kept","strength":1,"willpower":1}]"#)?;

        session.refresh_repository_from_remote().await?;
        match events.recv().await {
            Some(RepositoryEvent::Failed { origin, error }) => {
                assert_eq!(origin, RepositoryOrigin::Remote);
                assert!(matches!(error, RepositoryError::Status(503)));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(session.repository().len(), 1);

        let reopened = CardRepository::new(RepositoryCache::in_dir(dir.path()));
        assert_eq!(reopened.load_cached(), CacheStatus::Loaded(1));
        assert_eq!(reopened.cards()[0].full_name, "Kept");
        Ok(())
    }

    #[tokio::test]
    async fn file_import_runs_in_background() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("cards.json");
        fs::write(&file, r#"[{"name":"Tiana","strength":2,"willpower":4}]"#)?;
        let (session, mut events) = controller(&dir.path().join("cache"), FakeRemote(Ok(REMOTE)));

        session.import_repository_file(file).await?;
        match events.recv().await {
            Some(RepositoryEvent::Completed(report)) => {
                assert_eq!(report.origin, RepositoryOrigin::File);
                assert_eq!(report.count, 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
        Ok(())
    }
}
