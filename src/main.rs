//! Memo LRU - demo driver
//!
//! Replays a set of memoization scenarios against the cache and reports the
//! resulting statistics.

use std::time::Duration;

use anyhow::{ensure, Context};
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memo_lru::{wrap, CacheStats, CallArgs, Capacity, Config, SharedMemoCache};

/// Main entry point for the Memo LRU demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Replay the single-threaded memoization scenarios
/// 4. Drive a shared cache from concurrent tasks
/// 5. Print the shared cache statistics as JSON
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_lru=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Memo LRU demo");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        "Configuration loaded: capacity={}, workers={}",
        config.capacity, config.workers
    );

    run_scenarios(config.capacity)?;
    info!("Memoization scenarios passed");

    let stats = run_shared(&config).await?;
    info!(
        "Shared cache finished: hits={}, misses={}, evictions={}, hit_rate={:.2}",
        stats.hits,
        stats.misses,
        stats.evictions,
        stats.hit_rate()
    );

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Reads positional argument `index` as an integer.
fn int_arg(args: &CallArgs, index: usize) -> anyhow::Result<i64> {
    args.get(index)
        .and_then(|value| value.as_int())
        .with_context(|| format!("positional argument {} must be an int", index))
}

fn int_kwarg(args: &CallArgs, name: &str) -> anyhow::Result<i64> {
    args.keyword(name)
        .and_then(|value| value.as_int())
        .with_context(|| format!("keyword argument '{}' must be an int", name))
}

// == Scenarios ==
fn run_scenarios(capacity: Capacity) -> anyhow::Result<()> {
    let mut sum = wrap(
        |args: &CallArgs| -> anyhow::Result<i64> { Ok(int_arg(args, 0)? + int_arg(args, 1)?) },
        capacity.get(),
    );
    ensure!(sum.call(&CallArgs::positional_only([1, 2]))? == 3);
    ensure!(sum.call(&CallArgs::positional_only([3, 4]))? == 7);

    let mut multiply = wrap(
        |args: &CallArgs| -> anyhow::Result<i64> { Ok(int_arg(args, 0)? * int_arg(args, 1)?) },
        3,
    );
    ensure!(multiply.call(&CallArgs::positional_only([1, 2]))? == 2);
    ensure!(multiply.call(&CallArgs::positional_only([3, 4]))? == 12);

    let mut sum_many = wrap(
        |args: &CallArgs| -> anyhow::Result<i64> {
            let positional = int_arg(args, 0)? + int_arg(args, 1)?;
            Ok(positional + int_kwarg(args, "c")? + int_kwarg(args, "d")?)
        },
        capacity.get(),
    );
    let in_order = CallArgs::new().arg(1).arg(2).kwarg("c", 3).kwarg("d", 4);
    let swapped = CallArgs::new().arg(1).arg(2).kwarg("d", 4).kwarg("c", 3);
    ensure!(sum_many.call(&in_order)? == 10);
    ensure!(sum_many.call(&swapped)? == 10);
    if !capacity.is_disabled() {
        ensure!(sum_many.stats().hits == 1, "keyword order must not matter");
    }

    // Scripted computations return the next canned value on every call, so
    // any extra invocation shows up in the observed sequence.
    let pairs: [[i64; 2]; 7] = [[1, 2], [1, 2], [3, 4], [3, 4], [5, 6], [5, 6], [1, 2]];
    let observed = replay_script(&[1, 2, 3, 4], pairs.iter().map(|p| p.to_vec()))?;
    ensure!(observed == [1, 1, 2, 2, 3, 3, 4], "unexpected sequence {:?}", observed);

    let singles: [i64; 6] = [1, 2, 1, 3, 1, 2];
    let observed = replay_script(&[10, 20, 30, 40], singles.iter().map(|k| vec![*k]))?;
    ensure!(
        observed == [10, 20, 10, 30, 10, 40],
        "unexpected sequence {:?}",
        observed
    );

    Ok(())
}

/// Calls a capacity-2 memoized script once per argument list.
fn replay_script<I>(script: &[i64], calls: I) -> anyhow::Result<Vec<i64>>
where
    I: IntoIterator<Item = Vec<i64>>,
{
    let mut remaining = script.iter().copied();
    let mut invocations = 0usize;
    let mut scripted = wrap(
        |_: &CallArgs| -> anyhow::Result<i64> {
            invocations += 1;
            remaining.next().context("script exhausted")
        },
        2,
    );

    let observed = calls
        .into_iter()
        .map(|args| scripted.call(&CallArgs::positional_only(args)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    drop(scripted);
    ensure!(
        invocations == script.len(),
        "computation ran {} times",
        invocations
    );
    Ok(observed)
}

// == Shared Cache ==
/// Number of steps the Collatz sequence from `n` takes to reach 1.
async fn collatz_steps(mut n: u64) -> u64 {
    // Stand-in for an expensive computation
    tokio::time::sleep(Duration::from_millis(2)).await;
    let mut steps = 0;
    while n > 1 {
        n = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
        steps += 1;
    }
    steps
}

async fn run_shared(config: &Config) -> anyhow::Result<CacheStats> {
    let cache: SharedMemoCache<u64, u64> = SharedMemoCache::with_capacity(config.capacity);

    let mut handles = Vec::with_capacity(config.workers);
    for worker in 0..config.workers {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            let mut total = 0u64;
            // Workers walk overlapping ranges so later calls can hit
            for n in (worker as u64)..(worker as u64 + 64) {
                total += cache.call(n % 48 + 1, collatz_steps).await;
            }
            total
        }));
    }

    join_workers(handles).await?;
    Ok(cache.stats().await)
}

/// Waits for every worker and returns the sum of their step totals.
///
/// A panicking worker means a broken cache invariant, so the panic is
/// resumed here instead of being reported as an ordinary failure.
async fn join_workers(handles: Vec<JoinHandle<u64>>) -> anyhow::Result<u64> {
    let mut sum = 0;
    for (worker, handle) in handles.into_iter().enumerate() {
        let total = match handle.await {
            Ok(total) => total,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => return Err(err).with_context(|| format!("worker {} failed", worker)),
        };
        info!("Worker {} finished, step total {}", worker, total);
        sum += total;
    }
    Ok(sum)
}
