//! Memo Cache demo
//!
//! Wraps a deliberately slow record generator with the cache, update and
//! delete wrappers and logs how long each call takes.
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from environment variables
//! 3. Connect the configured store (Redis, or in-process with cleanup task)
//! 4. Run the miss / hit / update / delete sequence

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use chrono::{FixedOffset, NaiveDate, TimeDelta};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memo_cache::{
    spawn_cleanup_task, Args, Backend, CacheController, Config, MemoryStore, Record, RecordSet,
    RedisStore, Signature, StoreClient, TypedValue, ZonedTime,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, url={}, prefix={}, timeout={}ms",
        config.backend,
        config.store_url(),
        config.prefix,
        config.timeout_ms
    );

    let (store, cleanup_handle) = connect(&config).await?;
    let controller = CacheController::from_config(store.clone(), &config);

    // Three wrappers sharing one identity, so they address the same entries
    let signature = Signature::new(["rows"]);
    let gen_data_cache = controller
        .cache("gen_data", Some(60), |args: Args| gen_data(args, 0))
        .with_signature(signature.clone());
    let gen_data_update = controller
        .update("gen_data", |args: Args| gen_data(args, 1))
        .with_signature(signature.clone());
    let gen_data_delete = controller
        .delete("gen_data", |args: Args| gen_data(args, 0))
        .with_signature(signature);

    let rows = |n: i64| Args::new().arg(n);

    controller.flush_all().await?;

    timed("No. cache - 100 row", gen_data_cache.call(rows(100))).await?;
    let cached = timed("Hit cache - 100 row", gen_data_cache.call(rows(100))).await?;
    log_records(&cached);

    timed("No. cache - 90 row", gen_data_cache.call(rows(90))).await?;
    timed("Hit cache - 90 row", gen_data_cache.call(rows(90))).await?;

    let status = timed("Update cache - 100 row", gen_data_update.call(rows(100))).await?;
    info!("Update status: {}", status);
    log_records(&gen_data_cache.call(rows(100)).await?);

    let status = timed("Update miss - 80 row", gen_data_update.call(rows(80))).await?;
    info!("Update status: {}", status);

    let existed = timed("Delete cache - 100 row", gen_data_delete.call(rows(100))).await?;
    info!("Delete status: {}", existed);
    let existed = timed("Delete miss - 80 row", gen_data_delete.call(rows(80))).await?;
    info!("Delete status: {}", existed);

    let key = gen_data_cache.key(&rows(100))?;
    info!("Check key {}: present={}", key, store.exists(key.as_str()).await?);

    info!("Stats: {}", serde_json::to_string(&controller.stats())?);

    if let Some(handle) = cleanup_handle {
        handle.abort();
    }
    Ok(())
}

async fn connect(config: &Config) -> anyhow::Result<(Arc<dyn StoreClient>, Option<JoinHandle<()>>)> {
    match config.backend {
        Backend::Memory => {
            let store = Arc::new(MemoryStore::new());
            let handle = spawn_cleanup_task(store.clone(), config.cleanup_interval);
            Ok((store, Some(handle)))
        }
        Backend::Redis => {
            let store = RedisStore::from_config(config)
                .await
                .with_context(|| format!("connecting to {}", config.store_url()))?;
            Ok((Arc::new(store), None))
        }
    }
}

async fn timed<T>(label: &str, call: impl Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
    let start = Instant::now();
    let output = call.await?;
    info!("{:<24} {:.6}s", label, start.elapsed().as_secs_f64());
    Ok(output)
}

fn log_records(records: &RecordSet) {
    info!(
        "Cached records: {} rows x {} columns",
        records.len(),
        records.columns().len()
    );
    if let Some(first) = records.records().first() {
        for (name, value) in first.iter() {
            info!("  {:<12} {:?}", name, value);
        }
    }
}

/// The expensive function: sleeps one second, then builds `rows` identical
/// records covering every value kind.
async fn gen_data(args: Args, offset: i64) -> anyhow::Result<RecordSet> {
    let rows = match args.positional().first().or_else(|| args.get("rows")) {
        Some(TypedValue::I64(n)) if *n >= 0 => *n,
        other => bail!("gen_data expects a non-negative integer row count, got {:?}", other),
    };

    tokio::time::sleep(Duration::from_secs(1)).await;

    let tz = FixedOffset::east_opt(8 * 3600).context("invalid offset")?;
    let dt = NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_micro_opt(1, 1, 1, 1))
        .context("invalid base timestamp")?
        + TimeDelta::days(offset);
    let time = (dt + TimeDelta::hours(offset)).time();
    let dt_tz = dt
        .and_local_timezone(tz)
        .single()
        .context("ambiguous zoned timestamp")?;

    let record = Record::new()
        .with("bool", true)
        .with("np_bool", false)
        .with("int", 1 + offset)
        .with("int64", 5 + offset)
        .with("uint", (5 + offset) as u32)
        .with("uint64", (5 + offset) as u64)
        .with("float", 1.1 + offset as f64)
        .with("float32", 4.4f32 + offset as f32)
        .with("decimal", Decimal::new(33, 1))
        .with("str", "STRING")
        .with("bytes", b"BYTES".to_vec())
        .with("datetime", dt)
        .with("datetime_tz", dt_tz)
        .with("time", time)
        .with("time_tz", ZonedTime::new(time, tz))
        .with("timedelta", TimeDelta::days(1 + offset))
        .with("None", TypedValue::Null);

    Ok((0..rows).map(|_| record.clone()).collect())
}
