use std::sync::Arc;

use ads_runner::{CreateAdRequest, CreateBatchAdRequest, RunnerHandle, RunnerRequest};
use ads_stream::EventStream;
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::config::AdServiceConfig;
use crate::stream_envelope::AdStreamEvent;

/// Drives the in-memory `Store` forward from events published by *other*
/// replicas: polls `stream` from the last version this
/// replica has applied, exclusive, and replays each entry through the
/// runner.
///
/// Entries this replica published itself race this loop too -- the write
/// path already applied them locally before publishing, so replaying them
/// here lands on [`ads_model::AdError::InvalidVersion`], which this loop
/// treats as "already applied, skip" rather than an error.
/// A version gap (an entry whose version is not exactly `last_seen + 1`)
/// means this replica missed an intermediate publish -- e.g. stream
/// trimming evicted it -- and triggers a full reload from the relational
/// store instead of silently skipping ahead.
#[instrument(skip_all, fields(stream_key = %config.stream_key))]
pub async fn run(
    db: PgPool,
    runner: Arc<RunnerHandle>,
    stream: Arc<dyn EventStream>,
    config: AdServiceConfig,
    mut last_seen: i64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(config.replay_poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            result = shutdown.changed() => {
                if result.is_err() || *shutdown.borrow() {
                    debug!("replay subscriber stopping");
                    return;
                }
            }
            _ = ticker.tick() => {
                last_seen = poll_once(&db, &runner, stream.as_ref(), &config, last_seen).await;
            }
        }
    }
}

async fn poll_once(
    db: &PgPool,
    runner: &RunnerHandle,
    stream: &dyn EventStream,
    config: &AdServiceConfig,
    last_seen: i64,
) -> i64 {
    let entries = match stream.read_from(last_seen, config.replay_batch_size).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(%err, "failed to poll event stream for replay");
            return last_seen;
        }
    };

    let mut last_seen = last_seen;
    for entry in entries {
        let version = parse_version(&entry.id);
        if version <= last_seen {
            continue;
        }

        if version != last_seen + 1 {
            warn!(
                expected = last_seen + 1,
                got = version,
                "version gap in event stream; reloading from relational store"
            );
            last_seen = reload(db, runner, config, last_seen).await;
            continue;
        }

        let event: AdStreamEvent = match serde_json::from_slice(&entry.payload) {
            Ok(event) => event,
            Err(err) => {
                warn!(%err, entry_id = %entry.id, "dropping malformed stream entry");
                last_seen = version;
                continue;
            }
        };

        match runner
            .call(
                RunnerRequest::CreateAd(CreateAdRequest {
                    request_id: event.request_id,
                    ad: event.ad,
                }),
                config.runner_call_timeout,
            )
            .await
        {
            Ok(response) => match response.into_create_ad().err {
                None => {}
                Some(ads_model::AdError::InvalidVersion { .. }) => {
                    debug!(entry_id = %entry.id, "replayed entry already applied, skipping");
                }
                Some(err) => warn!(%err, entry_id = %entry.id, "replay of stream entry failed"),
            },
            Err(err) => warn!(%err, entry_id = %entry.id, "runner call failed during replay"),
        }

        last_seen = version;
    }

    last_seen
}

async fn reload(db: &PgPool, runner: &RunnerHandle, config: &AdServiceConfig, fallback: i64) -> i64 {
    let max = match ads_persist::max_version(db).await {
        Ok(max) => max,
        Err(err) => {
            warn!(%err, "failed to read max version while reloading after a gap");
            return fallback;
        }
    };

    let ads = match ads_persist::fetch_all_up_to(db, max).await {
        Ok(ads) => ads,
        Err(err) => {
            warn!(%err, "failed to fetch snapshot while reloading after a gap");
            return fallback;
        }
    };

    if let Err(err) = runner
        .call(
            RunnerRequest::CreateBatchAd(CreateBatchAdRequest {
                request_id: "replay-reload".to_string(),
                ads,
            }),
            config.runner_call_timeout,
        )
        .await
    {
        warn!(%err, "failed to apply reload snapshot to the in-memory store");
        return fallback;
    }

    max
}

fn parse_version(entry_id: &str) -> i64 {
    entry_id
        .rsplit('-')
        .next()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
