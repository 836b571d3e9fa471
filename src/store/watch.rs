use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::watch;

use super::{DocPath, Document};

/// State of a watched document at one point in time; `None` once deleted.
pub type Snapshot = Option<Document>;

/// Live feed of a single document. Dropping it stops delivery.
pub struct Subscription {
    path: DocPath,
    rx: watch::Receiver<Snapshot>,
}

impl Subscription {
    #[must_use]
    pub fn path(&self) -> &DocPath {
        &self.path
    }

    /// Snapshot as of the last delivered change (or of subscribing).
    #[must_use]
    pub fn current(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Waits for the next committed change. Returns `None` once the store
    /// has shut down and no further changes can arrive.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Per-path fan-out of committed changes.
#[derive(Default)]
pub(crate) struct Watchers {
    channels: Mutex<HashMap<DocPath, watch::Sender<Snapshot>>>,
}

impl Watchers {
    fn channels(&self) -> std::sync::MutexGuard<'_, HashMap<DocPath, watch::Sender<Snapshot>>> {
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a subscriber, calling `load` for the initial snapshot if
    /// nobody watches `path` yet.
    ///
    /// Callers hold the store's connection lock, which commits also hold
    /// while publishing, so no commit can slip between `load` and
    /// registration.
    pub(crate) fn subscribe<E>(
        &self,
        path: &DocPath,
        load: impl FnOnce() -> Result<Snapshot, E>,
    ) -> Result<Subscription, E> {
        let mut channels = self.channels();
        // a registered sender already holds the latest committed snapshot
        let rx = match channels.get(path) {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = watch::channel(load()?);
                channels.insert(path.clone(), tx);
                rx
            }
        };
        Ok(Subscription {
            path: path.clone(),
            rx,
        })
    }

    /// Reloads every watched path and publishes snapshots whose version
    /// moved. Used to pick up writes made outside this process.
    pub(crate) fn refresh<E>(
        &self,
        mut load: impl FnMut(&DocPath) -> Result<Snapshot, E>,
    ) -> Result<usize, E> {
        let mut channels = self.channels();
        channels.retain(|_, tx| tx.receiver_count() > 0);

        let mut published = 0;
        for (path, tx) in channels.iter() {
            let fresh = load(path)?;
            let seen = tx.borrow().as_ref().map(|doc| doc.version);
            if fresh.as_ref().map(|doc| doc.version) != seen {
                tracing::debug!("{} changed outside this process", path);
                tx.send_replace(fresh);
                published += 1;
            }
        }
        Ok(published)
    }

    pub(crate) fn publish(&self, changes: Vec<(DocPath, Snapshot)>) {
        let mut channels = self.channels();
        channels.retain(|_, tx| tx.receiver_count() > 0);
        for (path, snapshot) in changes {
            if let Some(tx) = channels.get(&path) {
                tracing::debug!("publishing change to {}", path);
                tx.send_replace(snapshot);
            }
        }
    }
}
