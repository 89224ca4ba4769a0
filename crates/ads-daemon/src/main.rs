//! Composition root for the ad delivery core: wires a
//! Postgres pool, a Redis connection, the distributed lock and event stream
//! built on it, and [`ads_service::AdService`] together, then blocks until
//! told to shut down.
//!
//! HTTP routing, CORS, request validation/DTO marshaling, and the
//! background task/notification subsystem are explicitly out of scope
//! -- this binary only proves the core's collaborators wire up;
//! a real deployment would mount an HTTP layer in front of the
//! [`ads_service::AdService`] this binary builds.

use std::sync::Arc;
use std::time::Duration;

use ads_service::{AdService, AdServiceConfig};
use ads_stream::{RedisDistributedLock, RedisEventStream};
use anyhow::Context;
use clap::Parser;
use derivative::Derivative;

/// The ad delivery core daemon: an in-memory, multi-index ad catalog fronted
/// by a single-writer serializer, with durable write-behind persistence and
/// cross-replica replication via an ordered event stream.
#[derive(Derivative, Parser)]
#[derivative(Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// URL of the Postgres database holding the `ads` write-of-record.
    #[derivative(Debug = "ignore")]
    #[clap(long = "database", env = "DATABASE_URL")]
    database_url: String,
    /// URL of the Redis instance backing the distributed lock and event
    /// stream.
    #[derivative(Debug = "ignore")]
    #[clap(long = "redis", env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis_url: String,
    /// Name of the cross-replica lock guarding version assignment.
    #[clap(long = "lock-key", env = "LOCK_KEY", default_value = "ads:write-lock")]
    lock_key: String,
    /// Event stream key ads are published to after each commit.
    #[clap(long = "ad-stream", env = "AD_STREAM", default_value = "ads:events")]
    ad_stream: String,
    /// Approximate cap on event stream length (`XADD ... MAXLEN ~ n`).
    #[clap(long = "ad-stream-maxlen", env = "AD_STREAM_MAXLEN", default_value = "100000")]
    ad_stream_maxlen: usize,
    /// How long an acquired lock is allowed to live before it auto-expires.
    #[clap(long = "lock-ttl-ms", env = "LOCK_TTL_MS", default_value = "5000")]
    lock_ttl_ms: u64,
    /// How long a writer waits to acquire the lock before giving up.
    #[clap(long = "lock-wait-ms", env = "LOCK_WAIT_MS", default_value = "2000")]
    lock_wait_ms: u64,
    /// Max entries the replay subscriber fetches per poll of the event
    /// stream.
    #[clap(long = "replay-batch-size", env = "REPLAY_BATCH_SIZE", default_value = "500")]
    replay_batch_size: usize,
}

fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(!matches!(std::env::var("NO_COLOR"), Ok(v) if v == "1"))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting tracing default failed");

    let args = Args::parse();
    tracing::info!(?args, "starting ad delivery core");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(async_main(args));
    tracing::info!(?result, "ad delivery core exiting");
    result
}

async fn async_main(args: Args) -> anyhow::Result<()> {
    let db = sqlx::postgres::PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect(&args.database_url)
        .await
        .context("connecting to database")?;
    sqlx::migrate!("../ads-persist/migrations")
        .run(&db)
        .await
        .context("running ads table migrations")?;

    let redis_client = redis::Client::open(args.redis_url).context("parsing redis URL")?;
    let redis_conn = redis_client
        .get_connection_manager()
        .await
        .context("connecting to redis")?;

    let lock = Arc::new(RedisDistributedLock::new(redis_conn.clone()));
    let stream = Arc::new(RedisEventStream::new(
        redis_conn,
        args.ad_stream.clone(),
        args.ad_stream_maxlen,
    ));

    let config = AdServiceConfig {
        lock_key: args.lock_key,
        stream_key: args.ad_stream,
        stream_maxlen: args.ad_stream_maxlen,
        lock_ttl: Duration::from_millis(args.lock_ttl_ms),
        lock_wait: Duration::from_millis(args.lock_wait_ms),
        replay_batch_size: args.replay_batch_size,
        ..AdServiceConfig::default()
    };

    let service = AdService::start(db, lock, stream, config)
        .await
        .context("starting ad service")?;
    tracing::info!("ad delivery core ready");

    tokio::signal::ctrl_c().await.context("awaiting ctrl-c")?;
    tracing::info!("shutdown signal received");
    service.shutdown().await;

    Ok(())
}
