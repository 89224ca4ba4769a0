use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ads_model::AdError;
use ads_store::Store;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace};

use crate::envelope::{
    CreateAdResponse, GetAdResponse, RunnerRequest, RunnerResponse,
};
use crate::registry::ResponseRegistry;

/// Default bound on the request channel: large enough that a burst of
/// callers never blocks on submission under normal load, while still
/// exerting backpressure under sustained overload.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8192;

/// The single-writer serializer that owns the [`Store`].
///
/// `Runner::run` is the one place in the whole core that mutates a `Store`.
/// Everything else only ever talks to a [`RunnerHandle`].
pub struct Runner {
    store: Store,
    request_rx: mpsc::Receiver<RunnerRequest>,
    responses: Arc<ResponseRegistry>,
    running: Arc<AtomicBool>,
}

/// A front for submitting requests to a running [`Runner`].
///
/// Not `Clone`: the runner's drain loop exits once its request channel
/// closes, which happens when every sender is dropped. Callers that need
/// to share a handle across tasks wrap it in an `Arc` and let the last
/// `Arc` drop close the channel — see `ads-service`'s shutdown sequence.
pub struct RunnerHandle {
    request_tx: mpsc::Sender<RunnerRequest>,
    responses: Arc<ResponseRegistry>,
    running: Arc<AtomicBool>,
}

/// Builds a disconnected `(Runner, RunnerHandle)` pair over `store`. Callers
/// spawn `runner.run()` on a task and drive the rest of the service through
/// `handle`.
pub fn new_runner(store: Store) -> (Runner, RunnerHandle) {
    new_runner_with_capacity(store, DEFAULT_CHANNEL_CAPACITY)
}

pub fn new_runner_with_capacity(store: Store, capacity: usize) -> (Runner, RunnerHandle) {
    let (request_tx, request_rx) = mpsc::channel(capacity);
    let responses = Arc::new(ResponseRegistry::new());
    let running = Arc::new(AtomicBool::new(false));

    (
        Runner {
            store,
            request_rx,
            responses: responses.clone(),
            running: running.clone(),
        },
        RunnerHandle {
            request_tx,
            responses,
            running,
        },
    )
}

impl Runner {
    /// Drains `request_rx` until the channel closes. Handlers execute in
    /// delivery order because a single task owns this loop and a
    /// `tokio::sync::mpsc::Receiver` yields items FIFO.
    #[instrument(skip_all)]
    pub async fn run(mut self) {
        self.running.store(true, Ordering::SeqCst);
        info!("runner started");

        while let Some(request) = self.request_rx.recv().await {
            self.handle(request);
        }

        self.running.store(false, Ordering::SeqCst);
        info!("runner stopped: request channel closed and drained");
    }

    fn handle(&mut self, request: RunnerRequest) {
        let request_id = request.request_id().clone();
        trace!(%request_id, "handling request");
        match request {
            RunnerRequest::CreateAd(req) => {
                let response = match self.store.create_ad(req.ad) {
                    Ok(id) => CreateAdResponse::ok(id),
                    Err(err) => CreateAdResponse::err(err),
                };
                self.responses
                    .reply(&request_id, RunnerResponse::CreateAd(response));
            }
            RunnerRequest::CreateBatchAd(req) => {
                let response = match self.store.create_batch_ads(req.ads) {
                    Ok(_version) => CreateAdResponse {
                        ad_id: ads_model::AdId::new(""),
                        err: None,
                    },
                    Err(err) => CreateAdResponse::err(err),
                };
                self.responses
                    .reply(&request_id, RunnerResponse::CreateAd(response));
            }
            RunnerRequest::GetAd(req) => {
                let response = match self.store.get_ads(&req.query) {
                    Ok((ads, total)) => GetAdResponse::ok(ads, total),
                    Err(err) => GetAdResponse::err(err),
                };
                self.responses
                    .reply(&request_id, RunnerResponse::GetAd(response));
            }
        }
    }
}

impl RunnerHandle {
    /// True once the runner's drain loop has started, false again once the
    /// request channel has closed and drained.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Submits `request` and awaits its reply, bounded by `timeout`. On
    /// timeout, abandons the registered reply channel (so a late runner
    /// write finds nothing to deliver to) and returns
    /// [`AdError::Timeout`] — callers own their deadlines.
    pub async fn call(
        &self,
        request: RunnerRequest,
        timeout: Duration,
    ) -> Result<RunnerResponse, AdError> {
        let request_id = request.request_id().clone();
        let reply_rx = self.responses.register(request_id.clone());

        if self.request_tx.send(request).await.is_err() {
            self.responses.abandon(&request_id);
            return Err(AdError::ShuttingDown);
        }

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_recv_error)) => {
                // Runner dropped the sender without replying (e.g. it shut
                // down mid-flight).
                debug!(%request_id, "runner dropped reply channel without responding");
                Err(AdError::ShuttingDown)
            }
            Err(_elapsed) => {
                self.responses.abandon(&request_id);
                Err(AdError::Timeout)
            }
        }
    }

    pub(crate) fn pending_replies(&self) -> usize {
        self.responses.pending_len()
    }
}
