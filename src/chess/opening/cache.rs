//! Memoized opening tries, keyed by reference path.
//!
//! Building a trie means parsing a whole reference collection, so the result is
//! kept for as long as callers keep asking for the same file.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use tracing::{debug, warn};

use super::trie::OpeningTrie;
use crate::chess::cancel::CancellationToken;
use crate::chess::error::PgnError;
use crate::chess::input::CompressionMode;
use crate::chess::reader::{PgnReader, ReaderOptions};

/// Process-wide cache backing [`opening_trie_for`].
pub static OPENING_CACHE: LazyLock<TrieCache> = LazyLock::new(TrieCache::new);

#[derive(Debug)]
struct CachedTrie {
    source_path: PathBuf,
    trie: Arc<OpeningTrie>,
}

#[derive(Debug, Default)]
pub struct TrieCache {
    slot: Mutex<Option<CachedTrie>>,
}

impl TrieCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&self, path: &Path) -> Result<Arc<OpeningTrie>, PgnError> {
        self.get_or_build_with(path, &CancellationToken::new())
    }

    /// Returns the cached trie when it was built from `path`, otherwise builds
    /// it while holding the lock so concurrent callers share one build.
    /// Failed builds are not cached.
    pub fn get_or_build_with(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<Arc<OpeningTrie>, PgnError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = slot.as_ref()
            && cached.source_path == path
        {
            return Ok(Arc::clone(&cached.trie));
        }

        let trie = Arc::new(load_trie(path, cancel)?);
        *slot = Some(CachedTrie {
            source_path: path.to_path_buf(),
            trie: Arc::clone(&trie),
        });
        Ok(trie)
    }

    pub fn clear(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn cached_path(&self) -> Option<PathBuf> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|cached| cached.source_path.clone())
    }
}

pub fn opening_trie_for(path: &Path) -> Result<Arc<OpeningTrie>, PgnError> {
    OPENING_CACHE.get_or_build(path)
}

/// Builds a trie from a reference file. A missing file or one without any
/// classified game gives an empty trie; parse failures propagate.
pub fn load_trie(path: &Path, cancel: &CancellationToken) -> Result<OpeningTrie, PgnError> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "Reference file not found; openings will not be classified"
        );
        return Ok(OpeningTrie::new());
    }

    let reader = PgnReader::from_path(
        path,
        CompressionMode::detect(path),
        ReaderOptions::default(),
        cancel.clone(),
    )?;
    let trie = OpeningTrie::build(reader)?;

    if trie.is_empty() {
        warn!(
            path = %path.display(),
            "Reference file has no classified games; openings will not be classified"
        );
    }
    debug!(
        path = %path.display(),
        games = trie.games_indexed(),
        nodes = trie.node_count(),
        classified = trie.classified_nodes(),
        "Built opening trie"
    );

    Ok(trie)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;

    fn write_reference(dir: &Path, name: &str, pgn: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, pgn).unwrap();
        path
    }

    #[test]
    fn test_cache_reuses_trie_for_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_reference(dir.path(), "eco.pgn", "[ECO \"C44\"]\n\n1. e4 e5 2. Nf3 *\n");
        let cache = TrieCache::new();

        let first = cache.get_or_build(&path).unwrap();
        // Later edits are not observed while the path stays the same.
        fs::write(&path, "[ECO \"A00\"]\n\n1. a3 *\n").unwrap();
        let second = cache.get_or_build(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            second.find("1. e4 e5 2. Nf3").and_then(|c| c.eco.as_deref()),
            Some("C44")
        );
    }

    #[test]
    fn test_cache_rebuilds_for_new_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_reference(dir.path(), "a.pgn", "[ECO \"B00\"]\n\n1. e4 *\n");
        let b = write_reference(dir.path(), "b.pgn", "[ECO \"A40\"]\n\n1. d4 *\n");
        let cache = TrieCache::new();

        let first = cache.get_or_build(&a).unwrap();
        let second = cache.get_or_build(&b).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.cached_path(), Some(b.clone()));
        assert!(second.find("1. e4").is_none());
        assert!(second.find("1. d4").is_some());
    }

    #[test]
    fn test_missing_reference_gives_empty_trie() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TrieCache::new();
        let trie = cache.get_or_build(&dir.path().join("missing.pgn")).unwrap();
        assert!(trie.is_empty());
        assert!(trie.find("1. e4").is_none());
    }

    #[test]
    fn test_reads_zstd_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eco.pgn.zst");
        let compressed =
            zstd::encode_all("[ECO \"A40\"]\n\n1. d4 *\n".as_bytes(), 3).unwrap();
        fs::write(&path, compressed).unwrap();

        let trie = load_trie(&path, &CancellationToken::new()).unwrap();
        assert_eq!(
            trie.find("1. d4 Nf6").and_then(|c| c.eco.as_deref()),
            Some("A40")
        );
    }

    #[test]
    fn test_cancelled_build_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_reference(dir.path(), "eco.pgn", "[ECO \"C44\"]\n\n1. e4 e5 2. Nf3 *\n");
        let cache = TrieCache::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(matches!(
            cache.get_or_build_with(&path, &cancel),
            Err(PgnError::Cancelled)
        ));
        assert_eq!(cache.cached_path(), None);
        assert!(!cache.get_or_build(&path).unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_callers_share_one_trie() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_reference(dir.path(), "eco.pgn", "[ECO \"C44\"]\n\n1. e4 e5 2. Nf3 *\n");
        let cache = Arc::new(TrieCache::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let path = path.clone();
                thread::spawn(move || cache.get_or_build(&path).unwrap())
            })
            .collect();
        let tries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for trie in &tries[1..] {
            assert!(Arc::ptr_eq(&tries[0], trie));
        }
    }
}
