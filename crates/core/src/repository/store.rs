use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{
    cache::RepositoryCache,
    normalize::{parse_import_document, parse_remote_document},
    remote::DocumentSource,
};
use crate::{error::RepositoryError, models::RepositoryCard};

/// Maximum number of entry suggestions returned for a query.
pub const MAX_SUGGESTIONS: usize = 5;
/// Shortest query that produces suggestions.
pub const MIN_QUERY_CHARS: usize = 2;

/// Where a canonical set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepositoryOrigin {
    /// A file chosen by the user.
    File,
    /// A document handed over in memory.
    Document,
    /// The well-known remote card dump.
    Remote,
}

impl std::fmt::Display for RepositoryOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryOrigin::File => write!(f, "file"),
            RepositoryOrigin::Document => write!(f, "document"),
            RepositoryOrigin::Remote => write!(f, "remote"),
        }
    }
}

/// Summary of a successful import or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryReport {
    /// Source of the new canonical set.
    pub origin: RepositoryOrigin,
    /// Number of canonical records now cached.
    pub count: usize,
    /// When the new set was stored.
    pub completed_at: DateTime<Utc>,
}

/// Outcome of reading the durable slot at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The slot held a canonical set of the given size.
    Loaded(usize),
    /// The slot was empty.
    Missing,
    /// The slot was corrupt and has been cleared.
    Cleared,
}

/// Shared canonical card set backed by the durable slot.
///
/// Clones share the same set; every successful import replaces it wholesale.
#[derive(Debug, Clone)]
pub struct CardRepository {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug)]
struct Inner {
    cache: RepositoryCache,
    cards: Arc<Vec<RepositoryCard>>,
}

impl CardRepository {
    /// Empty repository persisting into `cache`.
    pub fn new(cache: RepositoryCache) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                cache,
                cards: Arc::new(Vec::new()),
            })),
        }
    }

    /// Populate from the durable slot. A corrupt slot is cleared and the
    /// repository stays empty.
    pub fn load_cached(&self) -> CacheStatus {
        let mut inner = self.inner.write();
        match inner.cache.load() {
            Ok(Some(cards)) => {
                let count = cards.len();
                inner.cards = Arc::new(cards);
                info!(count, "Card repository loaded from cache");
                CacheStatus::Loaded(count)
            }
            Ok(None) => CacheStatus::Missing,
            Err(err) => {
                warn!(
                    %err,
                    path = %inner.cache.path().display(),
                    "Discarding unreadable repository cache"
                );
                if let Err(err) = inner.cache.clear() {
                    warn!(%err, "Failed to clear repository cache");
                }
                inner.cards = Arc::new(Vec::new());
                CacheStatus::Cleared
            }
        }
    }

    /// Snapshot of the canonical set.
    pub fn cards(&self) -> Arc<Vec<RepositoryCard>> {
        Arc::clone(&self.inner.read().cards)
    }

    /// Number of canonical records.
    pub fn len(&self) -> usize {
        self.inner.read().cards.len()
    }

    /// `true` when no records are loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry suggestions: case-insensitive substring match on the full name.
    pub fn suggestions(&self, query: &str) -> Vec<RepositoryCard> {
        if query.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        let cards = self.cards();
        cards
            .iter()
            .filter(|card| card.full_name.to_lowercase().contains(&needle))
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect()
    }

    /// Import a document held in memory.
    pub fn import_document(&self, bytes: &[u8]) -> Result<RepositoryReport, RepositoryError> {
        let cards = parse_import_document(bytes)?;
        self.replace(RepositoryOrigin::Document, cards)
    }

    /// Read and import a user-chosen file.
    pub async fn import_file(&self, path: &Path) -> Result<RepositoryReport, RepositoryError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| RepositoryError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let cards = parse_import_document(&bytes)?;
        self.replace(RepositoryOrigin::File, cards)
    }

    /// Fetch the remote card dump and replace the canonical set with it.
    pub async fn refresh_from<S: DocumentSource>(
        &self,
        source: &S,
    ) -> Result<RepositoryReport, RepositoryError> {
        let bytes = source.fetch().await?;
        let cards = parse_remote_document(&bytes)?;
        self.replace(RepositoryOrigin::Remote, cards)
    }

    /// Persist `cards` as the new durable set, then publish it. On a cache
    /// failure the previous set stays in place.
    pub fn replace(
        &self,
        origin: RepositoryOrigin,
        cards: Vec<RepositoryCard>,
    ) -> Result<RepositoryReport, RepositoryError> {
        let mut inner = self.inner.write();
        inner.cache.persist(&cards)?;
        let count = cards.len();
        inner.cards = Arc::new(cards);
        info!(%origin, count, "Card repository replaced");
        Ok(RepositoryReport {
            origin,
            count,
            completed_at: Utc::now(),
        })
    }

    /// Drop every record and empty the durable slot.
    pub fn clear(&self) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write();
        inner.cards = Arc::new(Vec::new());
        inner.cache.clear()?;
        info!("Card repository cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::{fs, time::Duration};
    use tempfile::tempdir;

    struct StaticSource(&'static [u8]);

    impl DocumentSource for StaticSource {
        async fn fetch(&self) -> Result<Vec<u8>, RepositoryError> {
            Ok(self.0.to_vec())
        }
    }

    struct DelayedSource {
        delay: Duration,
        body: &'static [u8],
    }

    impl DocumentSource for DelayedSource {
        async fn fetch(&self) -> Result<Vec<u8>, RepositoryError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.body.to_vec())
        }
    }

    fn repository(dir: &Path) -> CardRepository {
        CardRepository::new(RepositoryCache::in_dir(dir))
    }

    #[test]
    fn import_persists_and_reloads() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());
        let report = repo.import_document(
            br#"{"cards":[{"name":"X","strength":1,"willpower":2},{"Name":"X","Subtitle":"V2","Strength":3,"Willpower":4}]}"#,
        )?;
        assert_eq!(report.count, 2);
        assert_eq!(report.origin, RepositoryOrigin::Document);

        let reopened = repository(dir.path());
        assert_eq!(reopened.load_cached(), CacheStatus::Loaded(2));
        assert_eq!(reopened.cards(), repo.cards());
        Ok(())
    }

    #[test]
    fn failed_import_leaves_cache_untouched() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());
        repo.import_document(br#"[{"name":"Kept","strength":1,"willpower":1}]"#)?;

        assert!(repo.import_document(br#"{"nope": true}"#).is_err());
        assert!(repo.import_document(b"garbage").is_err());
        assert_eq!(repo.len(), 1);

        let reopened = repository(dir.path());
        assert_eq!(reopened.load_cached(), CacheStatus::Loaded(1));
        Ok(())
    }

    #[test]
    fn corrupt_cache_is_cleared_on_load() -> Result<()> {
        let dir = tempdir()?;
        let cache = RepositoryCache::in_dir(dir.path());
        fs::write(cache.path(), "[{]")?;

        let repo = CardRepository::new(cache.clone());
        assert_eq!(repo.load_cached(), CacheStatus::Cleared);
        assert!(repo.is_empty());
        assert!(!cache.path().exists());
        Ok(())
    }

    #[test]
    fn missing_cache_is_reported() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(repository(dir.path()).load_cached(), CacheStatus::Missing);
        Ok(())
    }

    #[test]
    fn suggestions_need_two_characters_and_cap_at_five() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());
        let records: Vec<String> = (1..=7)
            .map(|n| {
                format!(
                    r#"{{"name":"Mickey Mouse","version":"V{n}","strength":{n},"willpower":{n}}}"#
                )
            })
            .collect();
        let document = format!("[{}]", records.join(","));
        repo.import_document(document.as_bytes())?;

        assert!(repo.suggestions("m").is_empty());
        let found = repo.suggestions("mOuSe");
        assert_eq!(found.len(), MAX_SUGGESTIONS);
        assert_eq!(found[0].full_name, "Mickey Mouse - V1");
        assert!(repo.suggestions("Donald").is_empty());
        Ok(())
    }

    #[test]
    fn clear_empties_memory_and_slot() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());
        repo.import_document(br#"[{"name":"Pete","strength":3,"willpower":4}]"#)?;
        repo.clear()?;
        assert!(repo.is_empty());
        assert_eq!(repository(dir.path()).load_cached(), CacheStatus::Missing);
        Ok(())
    }

    #[tokio::test]
    async fn remote_refresh_replaces_instead_of_merging() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());
        repo.import_document(br#"[{"name":"Local","strength":1,"willpower":1}]"#)?;

        let source = StaticSource(br#"[{"Name":"Remote","Strength":2,"Willpower":2}]"#);
        let report = repo.refresh_from(&source).await?;
        assert_eq!(report.origin, RepositoryOrigin::Remote);
        assert_eq!(report.count, 1);
        assert_eq!(repo.cards()[0].full_name, "Remote");
        Ok(())
    }

    #[tokio::test]
    async fn last_finished_refresh_wins() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());

        let slow = {
            let repo = repo.clone();
            tokio::spawn(async move {
                let source = DelayedSource {
                    delay: Duration::from_millis(100),
                    body: br#"[{"Name":"Slow","Strength":1,"Willpower":1}]"#,
                };
                repo.refresh_from(&source).await
            })
        };
        let fast = {
            let repo = repo.clone();
            tokio::spawn(async move {
                let source = DelayedSource {
                    delay: Duration::from_millis(10),
                    body: br#"[{"Name":"Fast","Strength":2,"Willpower":2}]"#,
                };
                repo.refresh_from(&source).await
            })
        };

        fast.await??;
        slow.await??;
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.cards()[0].full_name, "Slow");

        let reopened = repository(dir.path());
        assert_eq!(reopened.load_cached(), CacheStatus::Loaded(1));
        assert_eq!(reopened.cards()[0].full_name, "Slow");
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_file_reports_read_error() -> Result<()> {
        let dir = tempdir()?;
        let repo = repository(dir.path());
        let err = repo
            .import_file(&dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Read { .. }));
        Ok(())
    }
}
