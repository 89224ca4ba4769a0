use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use ads_model::{Ad, AdError, AdId, GetAdsQuery, Version};
use ads_runner::{new_runner, CreateAdRequest, GetAdRequest, RunnerHandle, RunnerRequest};
use ads_store::Store;
use ads_stream::{DistributedLock, EventStream};
use sqlx::PgPool;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::AdServiceConfig;
use crate::replay;
use crate::stream_envelope::AdStreamEvent;

/// The ad delivery core's composition root: owns the relational
/// write-of-record, the cross-replica lock and event stream, and the
/// in-memory [`ads_store::Store`] reached only through a [`RunnerHandle`].
///
/// `AdService` is the one thing `ads-daemon` talks to. Everything else --
/// `Store`, `Runner`, the Postgres pool, the lock, the stream -- is private
/// wiring behind it.
pub struct AdService {
    runner: Mutex<Option<Arc<RunnerHandle>>>,
    stream: Arc<dyn EventStream>,
    db: PgPool,
    lock: Arc<dyn DistributedLock>,
    config: AdServiceConfig,
    shutdown_tx: watch::Sender<bool>,
    shutdown_started: AtomicBool,
    shutdown_hooks_fired: Arc<AtomicUsize>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AdService {
    /// Boots a fresh service: restores the in-memory store from the
    /// relational write-of-record up to its current max version, starts the
    /// runner, and starts a replay subscriber from that version exclusive
    ///. Returns once the warm-start restore has completed --
    /// the runner and replay subscriber keep running on background tasks
    /// until [`AdService::shutdown`].
    #[instrument(skip_all, fields(lock_key = %config.lock_key, stream_key = %config.stream_key))]
    pub async fn start(
        db: PgPool,
        lock: Arc<dyn DistributedLock>,
        stream: Arc<dyn EventStream>,
        config: AdServiceConfig,
    ) -> Result<Self, AdError> {
        let max_version = ads_persist::max_version(&db)
            .await
            .map_err(|err| AdError::PersistFailed {
                reason: err.to_string(),
            })?;
        let ads = ads_persist::fetch_all_up_to(&db, max_version)
            .await
            .map_err(|err| AdError::PersistFailed {
                reason: err.to_string(),
            })?;

        let mut store = Store::new();
        if !ads.is_empty() {
            store.create_batch_ads(ads)?;
        }
        info!(restored = store.len(), %max_version, "restored store from relational write-of-record");

        let (runner, handle) = new_runner(store);
        let handle = Arc::new(handle);
        let runner_task = tokio::spawn(runner.run());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let replay_task = tokio::spawn(replay::run(
            db.clone(),
            handle.clone(),
            stream.clone(),
            config.clone(),
            max_version,
            shutdown_rx,
        ));

        Ok(Self {
            runner: Mutex::new(Some(handle)),
            stream,
            db,
            lock,
            config,
            shutdown_tx,
            shutdown_started: AtomicBool::new(false),
            shutdown_hooks_fired: Arc::new(AtomicUsize::new(0)),
            tasks: Mutex::new(vec![runner_task, replay_task]),
        })
    }

    /// Assigns the next version under the cross-replica lock and persists +
    /// publishes it in a fixed order:
    ///
    /// `lock -> begin -> SELECT MAX(version) -> INSERT -> XADD 0-<version>
    /// -> commit -> unlock -> apply locally`.
    ///
    /// The stream append happens *before* the transaction commits and its
    /// failure rolls the transaction back: if the stream append fails, the
    /// relational transaction is rolled back, and if the transaction
    /// commits, the stream entry is guaranteed to already exist. Only once
    /// both the row and the stream entry are durably committed does this
    /// replica install the ad into its own in-memory store -- a version race
    /// with a replay entry racing in from another replica's write is
    /// resolved the same "already applied" way replay itself resolves it.
    #[instrument(skip_all, fields(ad_id = %ad.id))]
    pub async fn create_ad(&self, mut ad: Ad) -> Result<AdId, AdError> {
        let runner = self.active_runner().await?;
        ad.validate().map_err(|err| AdError::PersistFailed {
            reason: err.to_string(),
        })?;

        let guard = self
            .lock
            .acquire(&self.config.lock_key, self.config.lock_ttl, self.config.lock_wait)
            .await?;

        let request_id = Uuid::new_v4().to_string();

        let mut txn = self
            .db
            .begin()
            .await
            .map_err(|err| AdError::PersistFailed {
                reason: err.to_string(),
            })?;
        let max_version = ads_persist::max_version_txn(&mut txn)
            .await
            .map_err(|err| AdError::PersistFailed {
                reason: err.to_string(),
            })?;
        ad.version = Version::new(max_version + 1);
        ads_persist::insert_ad(&mut txn, &ad)
            .await
            .map_err(|err| AdError::PersistFailed {
                reason: err.to_string(),
            })?;

        let event = AdStreamEvent {
            request_id: request_id.clone(),
            ad: ad.clone(),
        };
        let payload = serde_json::to_vec(&event).map_err(|err| AdError::StreamAppendFailed {
            reason: err.to_string(),
        })?;
        if let Err(err) = self.stream.append(ad.version.get(), payload).await {
            let _ = txn.rollback().await;
            return Err(err.into());
        }

        txn.commit().await.map_err(|err| AdError::PersistFailed {
            reason: err.to_string(),
        })?;
        guard.release().await?;

        // The durability boundary has passed: `ad` is committed and
        // published. Installing it into this replica's own `Store` is a
        // best-effort local-visibility optimization -- the steady-state
        // replay subscriber will pick the same entry up off the stream if
        // this install races behind another replica's writes, and its
        // `InvalidVersion`-as-duplicate rule makes that harmless either way.
        match runner
            .call(
                RunnerRequest::CreateAd(CreateAdRequest {
                    request_id,
                    ad: ad.clone(),
                }),
                self.config.runner_call_timeout,
            )
            .await
        {
            Ok(response) => match response.into_create_ad().err {
                None => {}
                Some(AdError::InvalidVersion { .. }) => {
                    debug!(ad_id = %ad.id, "local install raced a replayed entry; already applied");
                }
                Some(err) => {
                    warn!(%err, ad_id = %ad.id, "local install of a committed ad failed; replay will catch up");
                }
            },
            Err(err) => {
                warn!(%err, ad_id = %ad.id, "runner call failed installing a committed ad locally");
            }
        }

        Ok(ad.id)
    }

    /// Reads matching ads from the in-memory store.
    #[instrument(skip_all)]
    pub async fn get_ads(&self, query: GetAdsQuery) -> Result<(Vec<Ad>, i64), AdError> {
        let runner = self.active_runner().await?;

        let response = runner
            .call(
                RunnerRequest::GetAd(GetAdRequest {
                    request_id: Uuid::new_v4().to_string(),
                    query,
                }),
                self.config.runner_call_timeout,
            )
            .await?
            .into_get_ad();

        match response.err {
            Some(err) => Err(err),
            None => Ok((response.ads, response.total)),
        }
    }

    /// Clones the current runner handle, or reports `ShuttingDown` once
    /// `shutdown` has taken it. The lock here only ever guards a single
    /// `Arc` clone -- it is held for the span of one pointer copy, not for
    /// the request's own I/O -- so every concurrent reader genuinely
    /// acquires it in turn rather than spuriously failing the way a
    /// `try_lock()` would under contention.
    async fn active_runner(&self) -> Result<Arc<RunnerHandle>, AdError> {
        self.runner
            .lock()
            .await
            .clone()
            .ok_or(AdError::ShuttingDown)
    }

    /// Number of on-shutdown hooks that have completed: the runner stopping
    /// and the replay subscriber stopping. Exactly two, always,
    /// once [`AdService::shutdown`] has returned.
    pub fn shutdown_hooks_fired(&self) -> usize {
        self.shutdown_hooks_fired.load(Ordering::SeqCst)
    }

    /// Begins an orderly shutdown: signals the replay subscriber to stop,
    /// drops this service's `Runner` handle so the runner's drain loop sees
    /// its request channel close once the replay subscriber's own handle
    /// also drops, and awaits both background tasks. Idempotent -- a second
    /// call observes the same completed state rather than erroring.
    #[instrument(skip_all)]
    pub async fn shutdown(&self) {
        if self.shutdown_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let _ = self.shutdown_tx.send(true);
        self.runner.lock().await.take();

        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            if task.await.is_ok() {
                self.shutdown_hooks_fired.fetch_add(1, Ordering::SeqCst);
            }
        }
        info!(hooks = self.shutdown_hooks_fired(), "service shut down");
    }
}
