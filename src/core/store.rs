//! Idempotent on-disk content cache.
//!
//! Every downloadable asset has a [`ContentKey`]: the author's user ID for
//! avatars, `<messageID>_<filename>` for attachments. The key maps to a fixed
//! path, and a file at that path means the asset is archived. [`ContentStore`]
//! fetches each missing key at most once per run:
//!
//! - file present: [`Ensured::Cached`], no network call
//! - key already settled earlier in this run: [`Ensured::Cached`], not counted
//!   again
//! - file missing: download into a temporary file next to the target, rename
//!   into place on success ([`Ensured::Downloaded`])
//! - download failed earlier in this run: [`Ensured::Skipped`], no retry
//!
//! A failed or interrupted download never leaves a partial file behind, so the
//! next run does not mistake it for a cached asset.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::create_private_dir;
use crate::error::{ArchiveError, ContentErrorKind, Result};
use crate::message::local_attachment_name;
use crate::source::ContentFetcher;

/// Kind of binary asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Avatar,
    Attachment,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Avatar => write!(f, "avatar"),
            ContentKind::Attachment => write!(f, "attachment"),
        }
    }
}

/// Stable identifier of an asset; its `id` is the local file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey {
    pub kind: ContentKind,
    pub id: String,
}

impl ContentKey {
    pub fn avatar(user_id: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Avatar,
            id: user_id.into(),
        }
    }

    pub fn attachment(message_id: &str, filename: &str) -> Self {
        Self {
            kind: ContentKind::Attachment,
            id: local_attachment_name(message_id, filename),
        }
    }

    /// Local path of this key inside `dir`.
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.id)
    }

    /// Rejects ids that would escape their directory.
    fn validate(&self) -> std::result::Result<(), ContentErrorKind> {
        let id = self.id.as_str();
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\', '\0']) {
            return Err(ContentErrorKind::InvalidKey(self.id.clone()));
        }
        Ok(())
    }
}

/// Result of [`ContentStore::ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ensured {
    /// The file already existed; nothing was fetched.
    Cached(PathBuf),
    /// The file was downloaded during this call.
    Downloaded { path: PathBuf, bytes: u64 },
    /// An earlier attempt in this run failed; not retried.
    Skipped(PathBuf),
}

impl Ensured {
    pub fn path(&self) -> &Path {
        match self {
            Ensured::Cached(path) | Ensured::Skipped(path) => path.as_path(),
            Ensured::Downloaded { path, .. } => path.as_path(),
        }
    }

    pub fn was_downloaded(&self) -> bool {
        matches!(self, Ensured::Downloaded { .. })
    }
}

/// Counters kept by the store over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Keys downloaded.
    pub downloaded: usize,
    /// Keys found on disk before this run fetched them.
    pub cached: usize,
    /// Keys whose download failed.
    pub failed: usize,
    /// Network fetches issued (successful or not).
    pub fetches: usize,
}

/// Idempotent asset cache backed by the local file system.
pub struct ContentStore<F> {
    fetcher: F,
    /// Keys downloaded or found on disk during this run.
    settled: HashSet<ContentKey>,
    failed: HashSet<ContentKey>,
    stats: StoreStats,
}

impl<F: ContentFetcher> ContentStore<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            settled: HashSet::new(),
            failed: HashSet::new(),
            stats: StoreStats::default(),
        }
    }

    /// Makes sure the asset `key` exists in `dir`, downloading it from `url`
    /// if needed.
    pub fn ensure(&mut self, key: &ContentKey, url: &str, dir: &Path) -> Result<Ensured> {
        key.validate()
            .map_err(|e| ArchiveError::content(key.kind, key.id.clone(), e))?;

        let path = key.path_in(dir);
        if self.settled.contains(key) {
            return Ok(Ensured::Cached(path));
        }
        if path.exists() {
            self.stats.cached += 1;
            self.settled.insert(key.clone());
            return Ok(Ensured::Cached(path));
        }
        if self.failed.contains(key) {
            return Ok(Ensured::Skipped(path));
        }

        self.stats.fetches += 1;
        match self.download(url, dir, &path) {
            Ok(bytes) => {
                self.stats.downloaded += 1;
                self.settled.insert(key.clone());
                debug!(kind = %key.kind, id = %key.id, bytes, "downloaded asset");
                Ok(Ensured::Downloaded { path, bytes })
            }
            Err(source) => {
                self.stats.failed += 1;
                self.failed.insert(key.clone());
                Err(ArchiveError::content(key.kind, key.id.clone(), source))
            }
        }
    }

    fn download(
        &self,
        url: &str,
        dir: &Path,
        path: &Path,
    ) -> std::result::Result<u64, ContentErrorKind> {
        create_private_dir(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        let bytes = self.fetcher.fetch(url, tmp.as_file_mut())?;
        tmp.persist(path).map_err(|e| ContentErrorKind::Io(e.error))?;
        Ok(bytes)
    }

    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    /// Serves fixed bytes, failing for URLs containing "fail".
    #[derive(Default)]
    struct FakeFetcher {
        calls: RefCell<Vec<String>>,
    }

    impl ContentFetcher for FakeFetcher {
        fn fetch(
            &self,
            url: &str,
            sink: &mut dyn Write,
        ) -> std::result::Result<u64, ContentErrorKind> {
            self.calls.borrow_mut().push(url.to_string());
            if url.contains("fail") {
                sink.write_all(b"partial")?;
                return Err(ContentErrorKind::Status(500));
            }
            sink.write_all(url.as_bytes())?;
            Ok(url.len() as u64)
        }
    }

    #[test]
    fn test_key_paths() {
        let dir = Path::new("/archive/42");
        assert_eq!(
            ContentKey::attachment("900", "cat.png").path_in(dir),
            PathBuf::from("/archive/42/900_cat.png")
        );
        assert_eq!(
            ContentKey::avatar("7").path_in(Path::new("/archive/pfps")),
            PathBuf::from("/archive/pfps/7")
        );
    }

    #[test]
    fn test_downloads_missing_file() {
        let dir = tempdir().unwrap();
        let mut store = ContentStore::new(FakeFetcher::default());
        let key = ContentKey::avatar("7");

        let ensured = store.ensure(&key, "https://cdn/7.png", dir.path()).unwrap();

        assert!(ensured.was_downloaded());
        assert_eq!(fs::read(ensured.path()).unwrap(), b"https://cdn/7.png");
        assert_eq!(store.stats().downloaded, 1);
    }

    #[test]
    fn test_existing_file_is_not_fetched() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("7"), b"old").unwrap();
        let mut store = ContentStore::new(FakeFetcher::default());

        let ensured = store
            .ensure(&ContentKey::avatar("7"), "https://cdn/7.png", dir.path())
            .unwrap();

        assert!(matches!(ensured, Ensured::Cached(_)));
        assert!(store.fetcher().calls.borrow().is_empty());
        assert_eq!(fs::read(dir.path().join("7")).unwrap(), b"old");
    }

    #[test]
    fn test_key_downloaded_this_run_is_not_counted_as_cached() {
        let dir = tempdir().unwrap();
        let mut store = ContentStore::new(FakeFetcher::default());
        let key = ContentKey::attachment("900", "a.txt");

        store.ensure(&key, "https://cdn/a.txt", dir.path()).unwrap();
        let second = store.ensure(&key, "https://cdn/a.txt", dir.path()).unwrap();

        assert!(matches!(second, Ensured::Cached(_)));
        assert_eq!(store.fetcher().calls.borrow().len(), 1);
        assert_eq!(
            store.stats(),
            StoreStats {
                downloaded: 1,
                cached: 0,
                failed: 0,
                fetches: 1,
            }
        );
    }

    #[test]
    fn test_existing_file_counted_once_per_run() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("7"), b"old").unwrap();
        let mut store = ContentStore::new(FakeFetcher::default());
        let key = ContentKey::avatar("7");

        for _ in 0..5 {
            store.ensure(&key, "https://cdn/7.png", dir.path()).unwrap();
        }

        assert_eq!(store.stats().cached, 1);
        assert_eq!(store.stats().fetches, 0);
    }

    #[test]
    fn test_failure_leaves_no_file_and_is_not_retried() {
        let dir = tempdir().unwrap();
        let mut store = ContentStore::new(FakeFetcher::default());
        let key = ContentKey::avatar("8");

        let err = store.ensure(&key, "https://cdn/fail", dir.path()).unwrap_err();
        assert!(err.is_content());
        assert!(!dir.path().join("8").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

        let again = store.ensure(&key, "https://cdn/fail", dir.path()).unwrap();
        assert!(matches!(again, Ensured::Skipped(_)));
        assert_eq!(store.fetcher().calls.borrow().len(), 1);
        assert_eq!(store.stats().failed, 1);
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let mut store = ContentStore::new(FakeFetcher::default());
        let key = ContentKey::attachment("900", "../../etc/passwd");

        let err = store.ensure(&key, "https://cdn/x", dir.path()).unwrap_err();

        assert!(matches!(
            err,
            ArchiveError::Content {
                source: ContentErrorKind::InvalidKey(_),
                ..
            }
        ));
        assert!(store.fetcher().calls.borrow().is_empty());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("pfps");
        let mut store = ContentStore::new(FakeFetcher::default());

        store
            .ensure(&ContentKey::avatar("1"), "https://cdn/1.png", &nested)
            .unwrap();

        assert!(nested.join("1").is_file());
    }
}
