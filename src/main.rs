//! Aggregator binary: wires configuration, the symbol reference book, the
//! source adapters and the poll scheduler, then waits for ctrl-c. The query
//! side is a library concern (`QueryService`); whatever serves it over a
//! network lives outside this crate.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use krx_news_aggregator::config::AppConfig;
use krx_news_aggregator::ingest::adapters::{
    AuthenticatedFeedAdapter, DisclosureAdapter, KeywordSearchAdapter, SyndicatedFeedAdapter,
};
use krx_news_aggregator::ingest::scheduler::{spawn_poll_scheduler, PollSchedulerCfg};
use krx_news_aggregator::ingest::PollOrchestrator;
use krx_news_aggregator::store::NewsStore;
use krx_news_aggregator::symbols::SymbolBook;
use krx_news_aggregator::token::{ClientCredentialExchange, TokenManager};
use krx_news_aggregator::SourceAdapter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env()?;
    let client = cfg.http_client()?;

    let symbols = Arc::new(SymbolBook::load_or_empty(&cfg.symbol_master_path));
    info!(symbols = symbols.len(), "symbol reference book loaded");

    let store = Arc::new(NewsStore::new());

    let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();
    if let Some(dart) = &cfg.disclosure {
        adapters.push(Box::new(DisclosureAdapter::new(
            client.clone(),
            &dart.api_key,
            symbols.clone(),
        )));
    } else {
        warn!("disclosure adapter disabled (no DART api key)");
    }
    if let Some(naver) = &cfg.search {
        adapters.push(Box::new(KeywordSearchAdapter::new(
            client.clone(),
            &naver.client_id,
            &naver.client_secret,
        )));
    } else {
        warn!("keyword-search adapter disabled (no client credentials)");
    }
    adapters.push(Box::new(SyndicatedFeedAdapter::new(client.clone())));
    if let Some(kis) = &cfg.broker {
        let tokens = Arc::new(TokenManager::new(Box::new(ClientCredentialExchange::new(
            client.clone(),
            &kis.base_url,
            &kis.app_key,
            &kis.app_secret,
        ))));
        adapters.push(Box::new(AuthenticatedFeedAdapter::new(
            client,
            &kis.base_url,
            &kis.app_key,
            &kis.app_secret,
            tokens,
        )));
    } else {
        warn!("authenticated feed disabled (no broker credentials)");
    }

    let orchestrator = Arc::new(PollOrchestrator::new(adapters, symbols, store));
    let scheduler = spawn_poll_scheduler(
        orchestrator,
        PollSchedulerCfg {
            interval_secs: cfg.poll_interval.as_secs(),
        },
    );
    info!(interval_secs = cfg.poll_interval.as_secs(), "poll scheduler started");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    scheduler.abort();
    Ok(())
}
