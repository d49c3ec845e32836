use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::envelope::ResultEnvelope;
use crate::error::ErrorKind;
use crate::storage::ObjectStore;

/// Default number of thumbnails that may wait for write-back.
pub const DEFAULT_PERSIST_QUEUE: usize = 256;

/// Fire-and-forget write-back of freshly produced thumbnails.
///
/// Requests hand envelopes to [`enqueue`](Self::enqueue) and return
/// immediately; a single worker task writes them to the store in order.
/// The queue is bounded. When it is full the thumbnail is dropped with a
/// warning and simply regenerated on a later request.
///
/// [`shutdown`](Self::shutdown) stops intake and waits for the writes that
/// were already queued.
pub struct PersistQueue {
    sender: mpsc::Sender<ResultEnvelope>,
    stop: Arc<Notify>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PersistQueue {
    /// Spawn the write-back worker on the current runtime.
    pub fn new(store: Arc<dyn ObjectStore>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let stop = Arc::new(Notify::new());
        let worker = tokio::spawn(run_worker(store, receiver, stop.clone()));

        Self {
            sender,
            stop,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue an envelope for write-back without waiting.
    ///
    /// Returns `false` if the envelope was dropped.
    pub fn enqueue(&self, envelope: ResultEnvelope) -> bool {
        match self.sender.try_send(envelope) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(envelope)) => {
                warn!(
                    key = %envelope.storage_path,
                    "Persist queue full, dropping thumbnail write-back"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(envelope)) => {
                warn!(
                    key = %envelope.storage_path,
                    "Persist queue closed, dropping thumbnail write-back"
                );
                false
            }
        }
    }

    /// Number of envelopes waiting to be written.
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Stop accepting envelopes and wait for queued writes to finish.
    ///
    /// Safe to call more than once; later calls return immediately.
    pub async fn shutdown(&self) {
        let worker = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        let Some(worker) = worker else {
            return;
        };

        self.stop.notify_one();
        if let Err(e) = worker.await {
            error!(error = %e, "Persist worker terminated abnormally");
        }
    }
}

async fn run_worker(
    store: Arc<dyn ObjectStore>,
    mut receiver: mpsc::Receiver<ResultEnvelope>,
    stop: Arc<Notify>,
) {
    loop {
        tokio::select! {
            next = receiver.recv() => match next {
                Some(envelope) => persist(store.as_ref(), envelope).await,
                None => break,
            },
            _ = stop.notified() => {
                receiver.close();
                let mut drained = 0usize;
                while let Some(envelope) = receiver.recv().await {
                    persist(store.as_ref(), envelope).await;
                    drained += 1;
                }
                info!(drained, "Persist queue drained");
                break;
            }
        }
    }
}

async fn persist(store: &dyn ObjectStore, envelope: ResultEnvelope) {
    let key = envelope.storage_path.as_str();

    match store
        .put(key, envelope.payload, envelope.content_type)
        .await
    {
        Ok(()) => debug!(
            key,
            bytes = envelope.content_length,
            "Thumbnail persisted"
        ),
        Err(e) => error!(
            key,
            error = %e,
            kind = %ErrorKind::StorageWrite,
            status = ErrorKind::StorageWrite.status_code(),
            "Failed to persist thumbnail"
        ),
    }
}
