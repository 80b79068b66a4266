//! Request handles: the `{promise, cancel}` pair returned for every request.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use gateway::{Outcome, Phase, RequestError, RequestId};
use tokio::sync::oneshot;
use tracing::{debug, info, info_span, Instrument};

use crate::settlement::Settlement;
use crate::transport::Transport;

/// Starts `transport` and returns the handle that observes and cancels it.
///
/// The request runs on a spawned Tokio task, so it makes progress whether or
/// not the promise is being awaited.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn wrap<T: Transport>(transport: T) -> RequestHandle {
    let id = RequestId::new_random();
    let transport: Arc<dyn Transport> = Arc::new(transport);
    let (settlement, rx) = Settlement::new();

    let span = info_span!("request", request_id = %id, target = %transport.describe());
    let task_transport = Arc::clone(&transport);
    let task_settlement = Arc::clone(&settlement);
    tokio::spawn(
        async move {
            if task_settlement.phase().is_final() {
                debug!("Request canceled before it was started");
                return;
            }

            let outcome = task_transport.start().await;
            let phase = Phase::of(&outcome);
            if task_settlement.settle(outcome) {
                debug!(?phase, "Request settled");
            } else {
                debug!(?phase, "Late outcome discarded; request already settled");
            }
        }
        .instrument(span),
    );

    RequestHandle {
        promise: Promise { id, rx },
        canceller: Canceller {
            id,
            settlement,
            transport,
        },
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// One in-flight request.
///
/// Await the handle (or its [`Promise`]) for the outcome; call
/// [`RequestHandle::cancel`] at any time. Use [`RequestHandle::into_parts`]
/// or [`RequestHandle::canceller`] to cancel while the promise is being
/// awaited elsewhere.
#[derive(Debug)]
pub struct RequestHandle {
    promise: Promise,
    canceller: Canceller,
}

impl RequestHandle {
    /// Returns the identifier recorded on this request's log span.
    pub fn id(&self) -> RequestId {
        self.promise.id
    }

    /// Returns the current settlement phase.
    pub fn phase(&self) -> Phase {
        self.canceller.phase()
    }

    /// Cancels the request if it has not settled yet.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Returns a cloneable canceller for this request.
    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    /// Splits the handle into its promise and its canceller.
    pub fn into_parts(self) -> (Promise, Canceller) {
        (self.promise, self.canceller)
    }
}

impl IntoFuture for RequestHandle {
    type Output = Outcome;
    type IntoFuture = Promise;

    fn into_future(self) -> Self::IntoFuture {
        self.promise
    }
}

// ---------------------------------------------------------------------------
// Promise
// ---------------------------------------------------------------------------

/// Future resolving to the request's single [`Outcome`].
///
/// The outcome can be observed exactly once: awaiting consumes the promise.
#[derive(Debug)]
pub struct Promise {
    id: RequestId,
    rx: oneshot::Receiver<Outcome>,
}

impl Future for Promise {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|received| {
            // Only reachable if the runtime dropped the request task and every
            // canceller before settlement.
            received.unwrap_or_else(|_| {
                Err(RequestError::Transport {
                    message: "request task ended without settling".to_owned(),
                })
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Canceller
// ---------------------------------------------------------------------------

/// Cancels one request. Cheap to clone.
#[derive(Clone)]
pub struct Canceller {
    id: RequestId,
    settlement: Arc<Settlement>,
    transport: Arc<dyn Transport>,
}

impl Canceller {
    /// Rejects the request with [`RequestError::Canceled`] if it is still
    /// pending, then aborts the transport.
    ///
    /// Idempotent; a no-op once the request has settled.
    pub fn cancel(&self) {
        if !self.settlement.settle(Err(RequestError::Canceled)) {
            debug!(request_id = %self.id, "Cancel ignored; request already settled");
            return;
        }

        info!(request_id = %self.id, target = %self.transport.describe(), "Request canceled");
        if self.transport.supports_abort() {
            self.transport.abort();
        }
    }

    /// Returns the current settlement phase.
    pub fn phase(&self) -> Phase {
        self.settlement.phase()
    }
}

impl std::fmt::Debug for Canceller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canceller")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .finish()
    }
}
