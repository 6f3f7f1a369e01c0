use anyhow::{bail, Context, Result};
use clap::Parser;
use grawler::config::Config;
use grawler::frontier::Frontier;
use grawler::pipeline::{self, Engine};
use grawler::seeds;
use grawler_core::store::SledStore;
use grawler_core::Task;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let config = Config::parse();

    let seed_list = seeds::load(&config.seeds)
        .with_context(|| format!("loading seed list from {}", config.seeds))?;
    if seed_list.is_empty() {
        bail!("seed list is empty");
    }

    std::fs::create_dir_all(&config.documents_dir).context("creating documents directory")?;
    let store = Arc::new(SledStore::open(&config.data_dir).context("opening store")?);

    let frontier = Arc::new(Frontier::new(config.frontier_capacity));
    for url in &seed_list {
        if !frontier.try_push(Task::seed(url.as_str())) {
            tracing::warn!(%url, "seed dropped, frontier already full");
        }
    }
    tracing::info!(
        seeds = seed_list.len(),
        workers = config.workers,
        "starting crawl"
    );

    let workers = config.workers;
    let engine = Arc::new(Engine::new(config, store.clone(), frontier.clone())?);

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        handles.push(tokio::spawn(pipeline::run_worker(engine.clone())));
    }

    let shutdown = frontier.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested, draining the frontier");
            shutdown.close();
        }
    });

    for handle in handles {
        let _ = handle.await;
    }

    store.flush().context("flushing store")?;
    tracing::info!("crawl finished");
    Ok(())
}
