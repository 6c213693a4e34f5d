//! Soak command - concurrent load against both stores.

use std::time::Instant;

use anyhow::{Result, ensure};
use chrono::{DateTime, Utc};
use clap::Args;
use larder_cache::{CacheStats, CacheStore, ResultCache};
use larder_session::{SessionFields, SessionStats, SessionStore};
use larder_types::UserId;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};
use uuid::Uuid;

use super::Context;

/// Arguments for the soak command.
#[derive(Args, Debug)]
pub struct SoakArgs {
    /// Worker threads
    #[arg(long, default_value_t = 4)]
    pub threads: usize,

    /// Operations per worker
    #[arg(long, default_value_t = 10_000)]
    pub ops: usize,

    /// Distinct users the workers act for
    #[arg(long, default_value_t = 16)]
    pub users: usize,
}

#[derive(Debug, Serialize)]
struct SoakReport {
    started_at: DateTime<Utc>,
    elapsed_ms: u128,
    threads: usize,
    ops_per_thread: usize,
    cache: CacheStats,
    session: SessionStats,
}

/// Run the soak command.
pub async fn run(args: SoakArgs, ctx: &Context) -> Result<()> {
    ensure!(args.threads > 0, "--threads must be greater than 0");
    ensure!(args.users > 0, "--users must be greater than 0");

    let store: CacheStore = CacheStore::from_config(&ctx.config.cache())?;
    let results = ResultCache::new(store.clone());
    let sessions = SessionStore::from_config(&ctx.config.session())?;

    let cache_sweeper = store.spawn_cleanup_task();
    let session_sweeper = sessions.spawn_cleanup_task();

    info!(threads = args.threads, ops = args.ops, "Starting soak run");
    let started_at = Utc::now();
    let start = Instant::now();

    let workers: Vec<_> = (0..args.threads)
        .map(|worker| {
            let results = results.clone();
            let sessions = sessions.clone();
            let (ops, users) = (args.ops, args.users);
            tokio::task::spawn_blocking(move || drive(worker, ops, users, &results, &sessions))
        })
        .collect();

    for worker in workers {
        worker.await?;
    }

    let elapsed_ms = start.elapsed().as_millis();
    cache_sweeper.stop().await;
    session_sweeper.stop().await;

    let report = SoakReport {
        started_at,
        elapsed_ms,
        threads: args.threads,
        ops_per_thread: args.ops,
        cache: store.stats(),
        session: sessions.stats(),
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, ctx.verbose);
    }
    Ok(())
}

/// One worker's share of the load: a fixed mix of session and cache calls.
fn drive(worker: usize, ops: usize, users: usize, results: &ResultCache, sessions: &SessionStore) {
    let mut own_sessions: Vec<String> = Vec::new();

    for i in 0..ops {
        let user = UserId::from(((worker * 31 + i) % users) as u64);
        let restaurant_id = ((worker + i * 7) % 500) as i64;

        match i % 8 {
            0 => {
                let id = Uuid::new_v4().to_string();
                sessions.create_session(&id, SessionFields::new().with_user(user));
                own_sessions.push(id);
            }
            1 | 2 => {
                if let Some(id) = own_sessions.last() {
                    let role = if i % 8 == 1 { "user" } else { "assistant" };
                    sessions.add_message(id, role, format!("message {i}"), None);
                }
            }
            3 => {
                if let Some(id) = own_sessions.last() {
                    sessions.update_context(id, "last_restaurant", json!(restaurant_id));
                    let _ = sessions.get_history(id, 10);
                }
            }
            4 => {
                results.cache_restaurant(
                    restaurant_id,
                    &json!({"id": restaurant_id, "name": format!("Restaurant {restaurant_id}")}),
                );
            }
            5 => {
                let _ = results.restaurant::<Value>(restaurant_id);
            }
            6 => {
                let params = json!({"cuisine": "korean", "page": i % 5});
                if results.search_results::<_, Value>(&params).is_none() {
                    results.cache_search_results(&params, &json!([restaurant_id]));
                }
            }
            _ => {
                let _ = sessions.get_user_sessions(&user);
            }
        }
    }

    debug!(worker, sessions = own_sessions.len(), "Soak worker finished");
}

fn print_report(report: &SoakReport, verbose: bool) {
    let cache = &report.cache;
    let session = &report.session;

    println!(
        "Soak: {} threads x {} ops in {} ms",
        report.threads, report.ops_per_thread, report.elapsed_ms
    );
    println!();
    println!("Cache");
    println!("  size:        {}/{}", cache.size, cache.max_size);
    println!("  hit rate:    {:.1}%", cache.hit_rate * 100.0);
    println!("  requests:    {}", cache.total_requests);
    println!("  evictions:   {}", cache.eviction_count);
    println!();
    println!("Sessions");
    println!("  active:      {}/{}", session.active_sessions, session.max_sessions);
    println!("  created:     {}", session.total_created);
    println!("  evicted:     {}", session.evicted);
    println!("  users:       {}", session.indexed_users);

    if verbose {
        println!();
        println!("  cache sets:        {}", cache.set_count);
        println!("  cache expired:     {}", cache.expired_count);
        println!("  cache sweeps:      {}", cache.cleanup_runs);
        println!("  sessions expired:  {}", session.expired_cleaned);
        println!("  session memory:    ~{} bytes", session.approx_memory_bytes);
    }
}
