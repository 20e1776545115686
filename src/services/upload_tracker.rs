// src/services/upload_tracker.rs
// DOCUMENTATION: In-memory registry of upload sessions
// PURPOSE: Let the drop zone poll progress of an upload running in another request

use crate::models::{DroppedFile, UploadProgress, UploadSession};
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

/// Write side of one upload session, owned by the request doing the upload
pub struct SessionHandle {
    sender: watch::Sender<UploadSession>,
}

impl SessionHandle {
    /// Detached session that nobody can poll
    #[cfg(test)]
    pub fn detached(id: Uuid, file: &DroppedFile) -> Self {
        let (sender, _) = watch::channel(UploadSession::new(id, file));
        Self { sender }
    }

    pub fn id(&self) -> Uuid {
        self.sender.borrow().id
    }

    pub fn start(&self) {
        self.sender.send_modify(|s| s.start());
    }

    /// Returns the new percentage when it moved
    pub fn record_transfer(&self, bytes_transferred: u64) -> Option<u8> {
        let mut moved = None;
        self.sender
            .send_modify(|s| moved = s.record_transfer(bytes_transferred));
        moved
    }

    pub fn complete(&self, url: String) {
        self.sender.send_modify(|s| s.complete(url));
    }

    pub fn fail(&self) {
        self.sender.send_modify(|s| s.fail());
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> UploadSession {
        self.sender.borrow().clone()
    }
}

/// Upload sessions by id
/// DOCUMENTATION: Finished sessions stay readable for `ttl`, then `cleanup` drops them
pub struct UploadTracker {
    sessions: Arc<RwLock<HashMap<Uuid, watch::Receiver<UploadSession>>>>,
    ttl: Duration,
}

impl UploadTracker {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    /// Register a new session; an existing session with the same id is replaced
    pub async fn begin(&self, id: Uuid, file: &DroppedFile) -> SessionHandle {
        let (sender, receiver) = watch::channel(UploadSession::new(id, file));
        let mut sessions = self.sessions.write().await;
        if sessions.insert(id, receiver).is_some() {
            log::warn!("Upload session {} replaced by a new drop", id);
        }
        SessionHandle { sender }
    }

    pub async fn get(&self, id: &Uuid) -> Option<UploadProgress> {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(|rx| rx.borrow().to_progress())
    }

    /// Drop finished sessions older than the TTL and sessions whose upload went away
    pub async fn cleanup(&self) {
        let ttl = ChronoDuration::from_std(self.ttl).unwrap_or_else(|_| ChronoDuration::zero());
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;
        let before_count = sessions.len();
        sessions.retain(|_, rx| {
            let session = rx.borrow();
            if session.state.is_terminal() {
                session
                    .finished_at
                    .map(|finished_at| now - finished_at < ttl)
                    .unwrap_or(false)
            } else {
                // Sender dropped without a terminal state: the request was aborted
                rx.has_changed().is_ok()
            }
        });
        let after_count = sessions.len();

        if before_count > after_count {
            log::info!(
                "Upload tracker cleanup: removed {} sessions ({} remaining)",
                before_count - after_count,
                after_count
            );
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Start background cleanup task
/// DOCUMENTATION: Periodically removes finished upload sessions
pub fn start_cleanup_task(tracker: Arc<UploadTracker>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            tracker.cleanup().await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadState;

    fn cat() -> DroppedFile {
        DroppedFile::new("cat.png", "image/png", Some(100))
    }

    #[tokio::test]
    async fn test_progress_visible_through_tracker() {
        let tracker = UploadTracker::new(60);
        let id = Uuid::new_v4();
        let handle = tracker.begin(id, &cat()).await;

        handle.start();
        assert_eq!(handle.record_transfer(40), Some(40));

        let progress = tracker.get(&id).await.unwrap();
        assert_eq!(progress.percent, 40);
        assert_eq!(progress.state, UploadState::Uploading);
        assert_eq!(progress.status, "Uploading: 40%");
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let tracker = UploadTracker::new(60);
        assert!(tracker.get(&Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired_and_abandoned() {
        let tracker = UploadTracker::new(0);

        let finished = tracker.begin(Uuid::new_v4(), &cat()).await;
        finished.start();
        finished.complete("http://x/objects/gallery/1_cat.png".to_string());

        let abandoned = tracker.begin(Uuid::new_v4(), &cat()).await;
        abandoned.start();
        drop(abandoned);

        let running = tracker.begin(Uuid::new_v4(), &cat()).await;
        running.start();

        tracker.cleanup().await;
        assert_eq!(tracker.len().await, 1);
        assert!(tracker.get(&running.id()).await.is_some());
    }

    #[tokio::test]
    async fn test_finished_session_kept_within_ttl() {
        let tracker = UploadTracker::new(60);
        let id = Uuid::new_v4();
        let handle = tracker.begin(id, &cat()).await;
        handle.start();
        handle.fail();
        drop(handle);

        tracker.cleanup().await;
        let progress = tracker.get(&id).await.unwrap();
        assert_eq!(progress.state, UploadState::Failed);
    }
}
