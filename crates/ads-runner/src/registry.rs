use std::collections::HashMap;
use std::sync::Mutex;

use ads_model::RequestId;
use tokio::sync::oneshot;
use tracing::warn;

use crate::envelope::RunnerResponse;

/// A map from request id to a one-shot reply channel, mutated by the caller
/// (insert, before submission) and drained by the runner (remove-then-send,
/// after handling).
///
/// The entry is deleted as part of delivery (`reply`), so a caller that
/// never shows up to collect its reply (it abandoned the call on a timeout)
/// simply causes `reply` to find no entry and log, rather than growing the
/// map forever.
#[derive(Default)]
pub struct ResponseRegistry {
    inner: Mutex<HashMap<RequestId, oneshot::Sender<RunnerResponse>>>,
}

impl ResponseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh reply channel for `request_id`, returning the
    /// receiving half for the caller to await. Must be called before the
    /// corresponding request is submitted to the runner.
    pub fn register(&self, request_id: RequestId) -> oneshot::Receiver<RunnerResponse> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().unwrap().insert(request_id, tx);
        rx
    }

    /// Removes and drops the still-pending reply channel for `request_id`,
    /// if the caller is giving up on the call (e.g. after the registering
    /// context reports its own error). Idempotent.
    pub fn abandon(&self, request_id: &RequestId) {
        self.inner.lock().unwrap().remove(request_id);
    }

    /// Delivers `response` to the reply channel registered for
    /// `request_id`, removing the entry. If the caller already abandoned
    /// the call (dropped its receiver, or it was never registered), the
    /// send is a silent no-op — callers are responsible for their own
    /// timeouts.
    pub fn reply(&self, request_id: &RequestId, response: RunnerResponse) {
        let sender = self.inner.lock().unwrap().remove(request_id);
        match sender {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => {
                warn!(%request_id, "no reply channel registered; caller likely abandoned the request");
            }
        }
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}
