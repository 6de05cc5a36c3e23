use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use marketx_rs::config::Settings;
use marketx_rs::market::hooks;
use marketx_rs::market::{Market, MarketRegistry, NewMarket, Stage};
use marketx_rs::persist::memory::{MemoryCache, MemoryMarketStore};
use marketx_rs::persist::postgres::PostgresMarketStore;
use marketx_rs::persist::sled_cache::SledCache;
use marketx_rs::persist::{CacheStore, MarketSource, MarketWriter};
use marketx_rs::telemetry;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "marketx", about = "Market registry and pipeline routing")]
struct Cli {
    /// Settings file (TOML). Missing file means defaults + environment.
    #[arg(long, default_value = "marketx.toml")]
    config: PathBuf,

    /// Use in-process store and cache instead of Postgres and sled.
    #[arg(long)]
    memory: bool,

    /// Overrides the configured log filter.
    #[arg(long)]
    log_filter: Option<String>,
}

fn print_market(market: &Market) {
    match serde_json::to_string_pretty(market) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("Failed to render market {}: {}", market.code, e),
    }
}

fn print_routes(market: &Market) {
    println!("Routes for {} (id {}):", market.code, market.id);
    for stage in Stage::ALL {
        println!("  {:<13} exchange={:<16} queue={:<24} node={}",
                 stage.to_string(), market.exchange(stage), market.queue(stage), market.node(stage));
    }
    println!("  ack={} durable={} matching_able={}", market.ack, market.durable, market.matching_able);
}

fn print_keys(market: &Market, period: i64) {
    println!("Keys for {} (id {}):", market.code, market.id);
    println!("  ticker          {}", market.ticker_key());
    println!("  latest trades   {}", market.latest_trades_key());
    println!("  asks            {}", market.ask_key());
    println!("  bids            {}", market.bid_key());
    println!("  k-line ({:>4})   {}", period, market.kline_key(period));
    println!("  ticker notify   {}", market.ticker_notify());
    println!("  k-line notify   {}", market.kline_notify(period));
}

fn lookup(registry: &MarketRegistry, arg: &str) -> Option<Arc<Market>> {
    let found = match arg.parse::<i64>() {
        Ok(id) => registry.find_by_id(id),
        Err(_) => registry.find_by_code(arg),
    };
    match found {
        Ok(market) => Some(market),
        Err(e) => {
            println!("{}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // load .env

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;

    telemetry::init_tracing(cli.log_filter.as_deref().unwrap_or(&settings.log.filter))?;
    telemetry::init_metrics(settings.log.metrics_port)?;

    // Build collaborators
    let (source, writer, cache): (Arc<dyn MarketSource>, Arc<dyn MarketWriter>, Arc<dyn CacheStore>) = if cli.memory {
        info!("Running with in-memory store and cache");
        let store = Arc::new(MemoryMarketStore::default());
        (
            store.clone() as Arc<dyn MarketSource>,
            store as Arc<dyn MarketWriter>,
            Arc::new(MemoryCache::default()) as Arc<dyn CacheStore>,
        )
    } else {
        let pg = PostgresMarketStore::connect(&settings.database.url, settings.database.max_connections)
            .await
            .context("connecting to market database")?;
        pg.ensure_schema().await.context("preparing markets table")?;
        let sled = SledCache::open(&settings.cache.path).context("opening cache")?;
        let pg = Arc::new(pg);
        (
            pg.clone() as Arc<dyn MarketSource>,
            pg as Arc<dyn MarketWriter>,
            Arc::new(sled) as Arc<dyn CacheStore>,
        )
    };

    // Routing depends on a populated registry, so a failed first load stops startup
    let registry = MarketRegistry::bootstrap(source.as_ref())
        .await
        .context("initial market load")?;
    info!(markets = registry.find_all().len(), "Registry ready");

    // CLI loop
    loop {
        print!("\nmarketx> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let parts: Vec<&str> = input.split_whitespace().collect();

        match parts.as_slice() {
            ["help"] | ["h"] => {
                println!("Available commands:");
                println!("  list                               - List loaded markets");
                println!("  find <id|code>                     - Show a market");
                println!("  routes <id|code>                   - Show stage exchanges, queues and nodes");
                println!("  keys <id|code> [period]            - Show cache keys and channels");
                println!("  reload                             - Reload markets from the store");
                println!("  create <code> <name> <ask> <bid>   - Create a visible market");
                println!("  quit, q                            - Exit");
            }
            ["list"] => {
                let snapshot = registry.snapshot();
                println!("Generation {}: {} markets", snapshot.generation(), snapshot.len());
                for market in snapshot.markets() {
                    println!("  {:>5}  {:<10} {:<16} tradable={}", market.id, market.code, market.name, market.tradable);
                }
            }
            ["find", arg] => {
                if let Some(market) = lookup(&registry, arg) {
                    print_market(&market);
                }
            }
            ["routes", arg] => {
                if let Some(market) = lookup(&registry, arg) {
                    print_routes(&market);
                }
            }
            ["keys", arg, rest @ ..] => {
                let period = match rest.first().map(|p| p.parse::<i64>()) {
                    None => 1,
                    Some(Ok(p)) => p,
                    Some(Err(_)) => {
                        println!("Invalid period");
                        continue;
                    }
                };
                if let Some(market) = lookup(&registry, arg) {
                    print_keys(&market, period);
                }
            }
            ["reload"] => match registry.load(source.as_ref()).await {
                Ok(count) => println!("Reloaded {} markets (generation {})", count, registry.generation()),
                Err(e) => {
                    error!(error = %e, "Reload failed");
                    println!("Reload failed, previous markets kept: {}", e);
                }
            },
            ["create", code, name, ask, bid] => {
                let (Ok(ask_currency_id), Ok(bid_currency_id)) = (ask.parse::<i64>(), bid.parse::<i64>()) else {
                    println!("Invalid currency ids");
                    continue;
                };
                let new = NewMarket {
                    code: code.to_string(),
                    name: name.to_string(),
                    ask_currency_id,
                    bid_currency_id,
                    visible: true,
                    ..NewMarket::default()
                };
                match hooks::create_market(writer.as_ref(), cache.as_ref(), new).await {
                    Ok(market) => println!("Created market {} with id {} (run 'reload' to route it)", market.code, market.id),
                    Err(e) => println!("Create failed: {}", e),
                }
            }
            ["quit"] | ["q"] | ["exit"] => {
                println!("Goodbye!");
                break;
            }
            [] => continue,
            _ => {
                println!("Unknown command. Type 'help' for available commands.");
            }
        }
    }

    Ok(())
}
