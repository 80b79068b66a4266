//! Tails a database change feed with consecutive longpoll requests.

use std::sync::{Arc, Mutex, PoisonError};

use gateway::{ChangesBatch, ChangesParams, DatabaseName, FeedMode};
use request::Canceller;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::GatewayClient;
use crate::errors::FollowError;

/// Where and how to start following.
#[derive(Debug, Clone)]
pub struct FollowOptions {
    /// Sequence to start after; `None` starts from the beginning of the feed.
    pub since: Option<Value>,
    /// Request template; `feed` is always sent as `longpoll` and `since` is
    /// advanced after every batch.
    pub params: ChangesParams,
    /// Number of batches buffered before the follower waits for the reader.
    pub capacity: usize,
}

impl Default for FollowOptions {
    fn default() -> Self {
        Self {
            since: None,
            params: ChangesParams::default(),
            capacity: 16,
        }
    }
}

/// Shared stop state between a [`ChangesFollower`] and its task.
#[derive(Debug, Default)]
struct StopState {
    stopped: CancellationToken,
    in_flight: Mutex<Option<Canceller>>,
}

impl StopState {
    fn is_stopped(&self) -> bool {
        self.stopped.is_cancelled()
    }

    fn stop(&self) {
        self.stopped.cancel();
        if let Some(canceller) = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).take() {
            canceller.cancel();
        }
    }

    /// Records the canceller of the request now in flight; cancels it at
    /// once if a stop raced with its creation.
    fn track(&self, canceller: Canceller) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_stopped() {
            canceller.cancel();
        } else {
            *slot = Some(canceller);
        }
    }
}

/// A running change-feed tail.
///
/// Batches are delivered on the receiver returned by
/// [`ChangesFollower::start`]. The follower ends when [`ChangesFollower::stop`]
/// is called, when the receiver is dropped, or when a request fails.
#[derive(Debug)]
pub struct ChangesFollower {
    stop: Arc<StopState>,
    task: JoinHandle<Result<(), FollowError>>,
}

impl ChangesFollower {
    /// Starts following `db` and returns the follower with its batch receiver.
    pub fn start(
        client: GatewayClient,
        db: DatabaseName,
        options: FollowOptions,
    ) -> (Self, mpsc::Receiver<ChangesBatch>) {
        let (tx, rx) = mpsc::channel(options.capacity.max(1));
        let stop = Arc::new(StopState::default());

        let mut params = options.params;
        params.feed = Some(FeedMode::Longpoll);
        params.since = options.since;

        let task = tokio::spawn(follow(client, db, params, Arc::clone(&stop), tx));
        (Self { stop, task }, rx)
    }

    /// Cancels the in-flight request and ends the follower.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Waits for the follower to end.
    ///
    /// Returns `Ok(())` after a stop or once the receiver is dropped, and the
    /// failure that ended it otherwise.
    pub async fn join(self) -> Result<(), FollowError> {
        self.task
            .await
            .map_err(|err| FollowError::Task(err.to_string()))?
    }
}

async fn follow(
    client: GatewayClient,
    db: DatabaseName,
    mut params: ChangesParams,
    stop: Arc<StopState>,
    tx: mpsc::Sender<ChangesBatch>,
) -> Result<(), FollowError> {
    info!(%db, since = ?params.since, "Following change feed");

    loop {
        if stop.is_stopped() {
            return Ok(());
        }

        let (promise, canceller) = client.fetch_changes_feed(&db, &params).into_parts();
        stop.track(canceller);

        let response = match promise.await {
            Ok(response) => response,
            Err(err) if err.is_canceled() => {
                info!(%db, "Change feed follower stopped");
                return Ok(());
            }
            Err(err) => {
                warn!(%db, error = %err, "Change feed request failed");
                return Err(err.into());
            }
        };

        let batch = response
            .data
            .as_ref()
            .and_then(ChangesBatch::from_response)
            .ok_or(FollowError::MalformedBatch {
                status: response.status,
            })?;

        params.since = Some(batch.last_seq.clone());
        if batch.is_empty() {
            debug!(%db, last_seq = %batch.last_seq, "Longpoll returned no changes");
            continue;
        }

        debug!(%db, count = batch.results.len(), last_seq = %batch.last_seq, "Received changes");
        tokio::select! {
            biased;
            () = stop.stopped.cancelled() => {
                info!(%db, "Change feed follower stopped");
                return Ok(());
            }
            sent = tx.send(batch) => {
                if sent.is_err() {
                    debug!(%db, "Batch receiver dropped; ending follower");
                    return Ok(());
                }
            }
        }
    }
}
