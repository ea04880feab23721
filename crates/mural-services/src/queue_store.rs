use crate::queue::SubmissionQueue;
use crate::target::Target;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Queue snapshots, one JSON file per target under `dir`.
///
/// The in-memory map is authoritative for the running process. Every `put`
/// also writes the snapshot through to disk so an interrupted run can be
/// resumed by the next process.
#[derive(Clone)]
pub struct QueueStore {
    dir: PathBuf,
    /// target → queue
    queues: Arc<DashMap<Target, SubmissionQueue>>,
}

impl QueueStore {
    /// Open `dir`, creating it if needed, and load every snapshot in it.
    /// Unreadable or corrupt files are skipped with a warning.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Io { path: dir.clone(), message: e.to_string() })?;

        let queues = DashMap::new();
        let entries = std::fs::read_dir(&dir).map_err(|e| StoreError::Io { path: dir.clone(), message: e.to_string() })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match load_snapshot(&path) {
                Ok(queue) => {
                    tracing::debug!(path = %path.display(), target = %queue.target(), "loaded queue");
                    queues.insert(queue.target(), queue);
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping queue snapshot"),
            }
        }

        tracing::info!(dir = %dir.display(), queues = queues.len(), "queue store opened");
        Ok(Self {
            dir,
            queues: Arc::new(queues),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, target: &Target) -> PathBuf {
        self.dir.join(format!("{}.json", target.storage_key()))
    }

    /// Store `queue` in memory and write its snapshot to disk.
    pub fn put(&self, queue: &SubmissionQueue) -> Result<(), StoreError> {
        let path = self.path_for(&queue.target());
        let json = serde_json::to_vec_pretty(queue).map_err(|e| StoreError::Json { path: path.clone(), message: e.to_string() })?;

        // Readers only ever see a complete file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| StoreError::Io { path: tmp.clone(), message: e.to_string() })?;
        std::fs::rename(&tmp, &path).map_err(|e| StoreError::Io { path: path.clone(), message: e.to_string() })?;

        self.queues.insert(queue.target(), queue.clone());
        Ok(())
    }

    /// Look up the queue for a target.
    pub fn get(&self, target: &Target) -> Option<SubmissionQueue> {
        self.queues.get(target).map(|q| q.clone())
    }

    /// Drop the queue for `target`, in memory and on disk.
    pub fn remove(&self, target: &Target) -> Result<Option<SubmissionQueue>, StoreError> {
        let removed = self.queues.remove(target).map(|(_, q)| q);
        let path = self.path_for(target);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Io { path, message: e.to_string() }),
        }
        Ok(removed)
    }

    /// Remove the queue for `target` if every chunk is completed.
    /// Returns true when something was removed.
    pub fn discard_if_complete(&self, target: &Target) -> Result<bool, StoreError> {
        let complete = self.queues.get(target).is_some_and(|q| q.is_complete());
        if complete {
            self.remove(target)?;
            tracing::debug!(%target, "completed queue discarded");
        }
        Ok(complete)
    }

    /// Every target with a stored queue, sorted.
    pub fn targets(&self) -> Vec<Target> {
        let mut targets: Vec<Target> = self.queues.iter().map(|e| *e.key()).collect();
        targets.sort_by_key(|t| (t.contract, t.token_id));
        targets
    }
}

fn load_snapshot(path: &Path) -> Result<SubmissionQueue, StoreError> {
    let bytes = std::fs::read(path).map_err(|e| StoreError::Io { path: path.to_path_buf(), message: e.to_string() })?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Json { path: path.to_path_buf(), message: e.to_string() })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("{}: invalid queue snapshot: {message}", .path.display())]
    Json { path: PathBuf, message: String },
}
