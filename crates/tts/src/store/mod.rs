//! On-disk artifact store with time-bounded visibility
//!
//! Layout under the store directory: `index.json` maps id to metadata and
//! each payload lives in `<id>.mp3`. The index is rewritten whole, via a
//! temporary file and rename, on every mutation. One async mutex guards
//! the index and every payload write or removal.

mod metadata;
mod sweeper;

use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use bytes::Bytes;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

pub use metadata::{ArtifactMetadata, ArtifactStatus, NewArtifact};
pub use sweeper::Sweeper;

use crate::error::StoreError;

const INDEX_FILE: &str = "index.json";
/// Stem shared by the index and its temp file
const INDEX_STEM: &str = "index";
const PAYLOAD_EXTENSION: &str = "mp3";
const TEMP_EXTENSION: &str = "tmp";

/// Hex characters kept from the id digest
const ID_LEN: usize = 16;

type Index = BTreeMap<String, ArtifactMetadata>;

#[derive(Deserialize)]
struct IndexFile {
    #[serde(default)]
    artifacts: Index,
}

#[derive(Serialize)]
struct IndexFileRef<'a> {
    artifacts: &'a Index,
}

/// A freshly stored artifact
#[derive(Debug, Clone)]
pub struct Artifact {
    pub id: String,
    pub metadata: ArtifactMetadata,
}

pub struct ArtifactStore {
    directory: PathBuf,
    ttl: SignedDuration,
    index: Mutex<Index>,
    sequence: AtomicU64,
}

impl ArtifactStore {
    /// Open the store at `directory`, creating it if needed
    ///
    /// Artifacts recorded in an existing index become visible again,
    /// expired ones included until the next sweep or read removes them.
    pub async fn open(directory: impl Into<PathBuf>, ttl: Duration) -> Result<Self, StoreError> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await?;

        let index = match tokio::fs::read(directory.join(INDEX_FILE)).await {
            Ok(raw) => serde_json::from_slice::<IndexFile>(&raw)?.artifacts,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Index::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(directory = %directory.display(), artifacts = index.len(), "artifact store opened");

        Ok(Self {
            directory,
            ttl: SignedDuration::try_from(ttl).unwrap_or(SignedDuration::MAX),
            index: Mutex::new(index),
            sequence: AtomicU64::new(0),
        })
    }

    pub async fn put(&self, audio: &[u8], artifact: NewArtifact<'_>) -> Result<Artifact, StoreError> {
        self.put_at(audio, artifact, Timestamp::now()).await
    }

    /// Persist `audio` as a new artifact created at `now`
    pub async fn put_at(&self, audio: &[u8], artifact: NewArtifact<'_>, now: Timestamp) -> Result<Artifact, StoreError> {
        let mut index = self.index.lock().await;

        let id = loop {
            let candidate = self.derive_id(&artifact, now);
            if !index.contains_key(&candidate) {
                break candidate;
            }
        };

        let payload = self.payload_path(&id);
        write_atomic(&payload, audio).await?;

        let expires = now.checked_add(self.ttl).unwrap_or(Timestamp::MAX);
        let metadata = ArtifactMetadata::new(&artifact, u64::try_from(audio.len()).unwrap_or(u64::MAX), now, expires);
        index.insert(id.clone(), metadata.clone());

        if let Err(e) = self.persist(&index).await {
            index.remove(&id);
            remove_payload(&payload).await;
            return Err(e);
        }

        tracing::info!(artifact_id = %id, size = audio.len(), %expires, "artifact stored");

        Ok(Artifact { id, metadata })
    }

    pub async fn get(&self, id: &str) -> Result<(Bytes, ArtifactMetadata), StoreError> {
        self.get_at(id, Timestamp::now()).await
    }

    /// Redeem an artifact as observed at `now`
    ///
    /// An expired artifact is purged on sight and reported as `Expired`;
    /// later reads of the same id see `NotFound`. An index entry whose
    /// payload has vanished is purged and reported as `NotFound`.
    pub async fn get_at(&self, id: &str, now: Timestamp) -> Result<(Bytes, ArtifactMetadata), StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::NotFound(id.to_owned()));
        }

        let mut index = self.index.lock().await;

        let Some(metadata) = index.get(id).cloned() else {
            return Err(StoreError::NotFound(id.to_owned()));
        };

        if metadata.is_expired_at(now) {
            self.purge(&mut index, id).await;
            tracing::debug!(artifact_id = id, "expired artifact purged on read");
            return Err(StoreError::Expired(id.to_owned()));
        }

        match tokio::fs::read(self.payload_path(id)).await {
            Ok(audio) => Ok((Bytes::from(audio), metadata)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(artifact_id = id, "artifact payload missing, dropping index entry");
                self.purge(&mut index, id).await;
                Err(StoreError::NotFound(id.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn status(&self, id: &str) -> Option<ArtifactStatus> {
        self.status_at(id, Timestamp::now()).await
    }

    /// Snapshot of an artifact without touching the index or payload
    pub async fn status_at(&self, id: &str, now: Timestamp) -> Option<ArtifactStatus> {
        if !is_valid_id(id) {
            return None;
        }

        self.index
            .lock()
            .await
            .get(id)
            .map(|metadata| ArtifactStatus::of(metadata, now))
    }

    pub async fn sweep(&self) -> Result<usize, StoreError> {
        self.sweep_at(Timestamp::now()).await
    }

    /// Remove every artifact expired at `now`, returning how many went
    ///
    /// Also deletes payload and temporary files the index does not know
    /// about, which a crash between writing a payload and the index leaves
    /// behind.
    pub async fn sweep_at(&self, now: Timestamp) -> Result<usize, StoreError> {
        let mut index = self.index.lock().await;

        let expired: Vec<String> = index
            .iter()
            .filter(|(_, metadata)| metadata.is_expired_at(now))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            index.remove(id);
            remove_payload(&self.payload_path(id)).await;
        }

        if !expired.is_empty() {
            self.persist(&index).await?;
        }

        let orphans = self.remove_orphans(&index).await?;

        if !expired.is_empty() || orphans > 0 {
            tracing::info!(removed = expired.len(), orphans, remaining = index.len(), "artifact sweep");
        }

        Ok(expired.len())
    }

    /// Number of artifacts in the index, expired-but-unswept included
    pub async fn len(&self) -> usize {
        self.index.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.lock().await.is_empty()
    }

    fn derive_id(&self, artifact: &NewArtifact<'_>, now: Timestamp) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);

        let mut hasher = Sha256::new();
        hasher.update(artifact.text.as_bytes());
        hasher.update(artifact.voice.to_string());
        hasher.update(artifact.speed.to_le_bytes());
        hasher.update(now.as_nanosecond().to_le_bytes());
        hasher.update(sequence.to_le_bytes());

        let mut id = format!("{:x}", hasher.finalize());
        id.truncate(ID_LEN);
        id
    }

    fn payload_path(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{id}.{PAYLOAD_EXTENSION}"))
    }

    async fn persist(&self, index: &Index) -> Result<(), StoreError> {
        let raw = serde_json::to_vec_pretty(&IndexFileRef { artifacts: index })?;
        write_atomic(&self.directory.join(INDEX_FILE), &raw).await?;
        Ok(())
    }

    /// Drop an entry and its payload together
    async fn purge(&self, index: &mut Index, id: &str) {
        index.remove(id);
        remove_payload(&self.payload_path(id)).await;

        if let Err(e) = self.persist(index).await {
            tracing::warn!(artifact_id = id, error = %e, "failed to persist index after purge");
        }
    }

    /// Remove stray payloads and temp files; names that are not ours are left alone
    async fn remove_orphans(&self, index: &Index) -> Result<usize, StoreError> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.directory).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let extension = path.extension().and_then(|ext| ext.to_str());
            let stem = path.file_stem().and_then(|stem| stem.to_str());

            let orphaned = match extension {
                Some(PAYLOAD_EXTENSION) => stem.is_some_and(|stem| is_valid_id(stem) && !index.contains_key(stem)),
                Some(TEMP_EXTENSION) => stem.is_some_and(|stem| is_valid_id(stem) || stem == INDEX_STEM),
                _ => false,
            };

            if orphaned {
                remove_payload(&path).await;
                removed += 1;
            }
        }

        Ok(removed)
    }
}

/// Ids are lowercase hex of a fixed width; anything else cannot name a file we wrote
fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

async fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let temp = path.with_extension(TEMP_EXTENSION);
    tokio::fs::write(&temp, contents).await?;

    if let Err(e) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e);
    }

    Ok(())
}

async fn remove_payload(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove artifact file"),
    }
}

#[cfg(test)]
mod tests {
    use cinder_core::Voice;
    use tempfile::TempDir;

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn artifact(text: &str) -> NewArtifact<'_> {
        NewArtifact {
            text,
            voice: Voice::Shimmer,
            speed: 1.0,
        }
    }

    fn at(second: i64) -> Timestamp {
        Timestamp::from_second(second).unwrap()
    }

    #[tokio::test]
    async fn put_then_get_returns_same_bytes_and_metadata() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path(), HOUR).await.unwrap();

        let stored = store.put_at(b"mp3-bytes", artifact("hello"), at(1_000)).await.unwrap();
        let (audio, metadata) = store.get_at(&stored.id, at(1_010)).await.unwrap();

        assert_eq!(&audio[..], b"mp3-bytes");
        assert_eq!(metadata, stored.metadata);
        assert_eq!(metadata.expires, at(4_600));
        assert_eq!(metadata.size_bytes, 9);
        assert_eq!(stored.id.len(), ID_LEN);
        assert!(dir.path().join(format!("{}.mp3", stored.id)).exists());
    }

    #[tokio::test]
    async fn identical_inputs_get_distinct_ids() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path(), HOUR).await.unwrap();

        let a = store.put_at(b"a", artifact("same"), at(1_000)).await.unwrap();
        let b = store.put_at(b"b", artifact("same"), at(1_000)).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn expired_get_purges_then_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path(), HOUR).await.unwrap();
        let stored = store.put_at(b"old", artifact("hello"), at(1_000)).await.unwrap();

        let first = store.get_at(&stored.id, at(4_600)).await;
        let second = store.get_at(&stored.id, at(4_601)).await;

        assert!(matches!(first, Err(StoreError::Expired(_))));
        assert!(matches!(second, Err(StoreError::NotFound(_))));
        assert!(!dir.path().join(format!("{}.mp3", stored.id)).exists());
    }

    #[tokio::test]
    async fn status_is_a_pure_read_even_when_expired() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path(), HOUR).await.unwrap();
        let stored = store.put_at(b"audio", artifact("hello"), at(1_000)).await.unwrap();

        let status = store.status_at(&stored.id, at(1_000 + 3_700)).await.unwrap();

        assert!(status.expired);
        assert_eq!(status.seconds_remaining, 0);
        assert_eq!(store.len().await, 1);
        assert!(dir.path().join(format!("{}.mp3", stored.id)).exists());
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_not_found() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path(), HOUR).await.unwrap();

        assert!(matches!(store.get("0123456789abcdef").await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.get("../index.json").await, Err(StoreError::NotFound(_))));
        assert!(store.status("nope").await.is_none());
    }

    #[tokio::test]
    async fn missing_payload_purges_stale_entry() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path(), HOUR).await.unwrap();
        let stored = store.put_at(b"audio", artifact("hello"), at(1_000)).await.unwrap();

        std::fs::remove_file(dir.path().join(format!("{}.mp3", stored.id))).unwrap();

        assert!(matches!(store.get_at(&stored.id, at(1_001)).await, Err(StoreError::NotFound(_))));
        assert!(store.status_at(&stored.id, at(1_001)).await.is_none());
    }

    #[tokio::test]
    async fn index_survives_reopen() {
        let dir = TempDir::new().unwrap();

        let stored = {
            let store = ArtifactStore::open(dir.path(), HOUR).await.unwrap();
            store.put_at(b"persisted", artifact("hello"), at(1_000)).await.unwrap()
        };

        let reopened = ArtifactStore::open(dir.path(), HOUR).await.unwrap();
        let (audio, metadata) = reopened.get_at(&stored.id, at(2_000)).await.unwrap();

        assert_eq!(&audio[..], b"persisted");
        assert_eq!(metadata, stored.metadata);
    }

    #[tokio::test]
    async fn corrupt_index_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"{not json").unwrap();

        assert!(matches!(
            ArtifactStore::open(dir.path(), HOUR).await,
            Err(StoreError::Index(_))
        ));
    }

    #[tokio::test]
    async fn sweep_removes_expired_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path(), HOUR).await.unwrap();

        let old = store.put_at(b"old", artifact("old"), at(1_000)).await.unwrap();
        let fresh = store.put_at(b"new", artifact("new"), at(3_000)).await.unwrap();

        assert_eq!(store.sweep_at(at(5_000)).await.unwrap(), 1);
        assert_eq!(store.sweep_at(at(5_000)).await.unwrap(), 0);

        assert!(store.status_at(&old.id, at(5_000)).await.is_none());
        assert!(!dir.path().join(format!("{}.mp3", old.id)).exists());
        assert!(store.get_at(&fresh.id, at(5_000)).await.is_ok());

        let reopened = ArtifactStore::open(dir.path(), HOUR).await.unwrap();
        assert_eq!(reopened.len().await, 1);
    }

    #[tokio::test]
    async fn sweep_deletes_orphaned_files() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path(), HOUR).await.unwrap();
        let kept = store.put_at(b"kept", artifact("kept"), at(1_000)).await.unwrap();

        std::fs::write(dir.path().join("ffffffffffffffff.mp3"), b"orphan").unwrap();
        std::fs::write(dir.path().join("index.tmp"), b"partial").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"unrelated").unwrap();

        assert_eq!(store.sweep_at(at(1_001)).await.unwrap(), 0);

        assert!(!dir.path().join("ffffffffffffffff.mp3").exists());
        assert!(!dir.path().join("index.tmp").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join(format!("{}.mp3", kept.id)).exists());
    }

    #[tokio::test]
    async fn sweep_leaves_files_it_did_not_write() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path(), HOUR).await.unwrap();

        std::fs::write(dir.path().join("song.mp3"), b"someone else's").unwrap();
        std::fs::write(dir.path().join("draft.tmp"), b"editor swap").unwrap();
        std::fs::write(dir.path().join("0123456789ABCDEF.mp3"), b"uppercase").unwrap();

        assert_eq!(store.sweep_at(at(1_001)).await.unwrap(), 0);

        assert!(dir.path().join("song.mp3").exists());
        assert!(dir.path().join("draft.tmp").exists());
        assert!(dir.path().join("0123456789ABCDEF.mp3").exists());
    }

    #[tokio::test]
    async fn sub_second_ttl_is_kept_exactly() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path(), Duration::from_millis(1_500)).await.unwrap();
        let stored = store.put_at(b"short", artifact("brief"), at(1_000)).await.unwrap();

        assert_eq!(stored.metadata.expires, at(1_000) + SignedDuration::from_millis(1_500));
        assert!(store.get_at(&stored.id, at(1_000) + SignedDuration::from_millis(1_200)).await.is_ok());
        assert!(matches!(
            store.get_at(&stored.id, at(1_000) + SignedDuration::from_millis(1_500)).await,
            Err(StoreError::Expired(_))
        ));
    }

    #[tokio::test]
    async fn half_second_ttl_does_not_expire_on_creation() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path(), Duration::from_millis(500)).await.unwrap();
        let stored = store.put_at(b"short", artifact("brief"), at(1_000)).await.unwrap();

        assert!(store.get_at(&stored.id, at(1_000)).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_puts_and_sweeps_lose_nothing() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(ArtifactStore::open(dir.path(), HOUR).await.unwrap());

        let mut tasks = Vec::new();
        for n in 0..20 {
            let store = std::sync::Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                let text = format!("text {n}");
                let stored = store.put(format!("audio {n}").as_bytes(), artifact(&text)).await.unwrap();
                store.sweep().await.unwrap();
                stored.id
            }));
        }

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }

        let reopened = ArtifactStore::open(dir.path(), HOUR).await.unwrap();
        assert_eq!(reopened.len().await, 20);
        for id in ids {
            assert!(reopened.get(&id).await.is_ok());
        }
    }
}
