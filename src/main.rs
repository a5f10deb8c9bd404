use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use diesel::r2d2;
use diesel::sqlite::SqliteConnection;
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use podcrier::api;
use podcrier::fetch::RssFetcher;
use podcrier::notify::DiscordNotifier;
use podcrier::podcast::normalize_link;
use podcrier::store::PodcastStore;
use podcrier::tasks::poller::{Poller, PollerConfig};
use podcrier::DbPool;

const DEFAULT_POLL_PERIOD_MS: u64 = 60_000;
const DEFAULT_STAGGER_MS: u64 = 1_000;
const DEFAULT_CACHE_CAPACITY: usize = 5;

/// CLI options
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Clear the posted history for every feed and exit
    #[clap(long)]
    reset_posted: bool,
}

fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = load_config();

    let db_pool = initialize_db_pool(&config.db_path);
    let store = Arc::new(PodcastStore::new(db_pool.clone(), config.cache_capacity));
    log::info!("Running database migrations");
    store.initialize().expect("Failed to run migrations");

    let args = Args::parse();
    if args.reset_posted {
        match store.reset_all() {
            Ok(()) => println!("Posted state cleared for all feeds"),
            Err(e) => println!("Failed to reset posted state: {:?}", e),
        }
        return Ok(());
    }

    store.load_cache().expect("Failed to load posted-state cache");
    log::info!(
        "Tracking {} feeds with posted history",
        store.tracked_feed_count().unwrap_or(0)
    );

    run_server(store, db_pool, config)
}

struct AppConfig {
    db_path: String,
    port: u16,
    poll_period: Duration,
    stagger: Duration,
    cache_capacity: usize,
    feeds: Vec<String>,
    channels: Vec<String>,
}

fn load_config() -> AppConfig {
    let db_path = match env::var("PC_DATABASE_URL") {
        Ok(path) => {
            log::info!("Using database path from PC_DATABASE_URL: {}", path);
            path
        }
        Err(_) => {
            let mut path = env::current_dir().expect("Failed to get current directory");
            path.push("podcrier.db");
            let res = path.to_str().unwrap().to_string();
            log::info!("Using default database path: {}", res);
            res
        }
    };
    let port = match env::var("PC_PORT") {
        Ok(port) => {
            log::info!("Using port from PC_PORT: {}", port);
            port.parse::<u16>().expect("Failed to parse PC_PORT")
        }
        Err(_) => {
            log::info!("Using default port: 8080");
            8080
        }
    };
    let poll_period_ms = match env::var("PC_POLL_PERIOD_MS") {
        Ok(ms) => ms.parse::<u64>().expect("Failed to parse PC_POLL_PERIOD_MS"),
        Err(_) => DEFAULT_POLL_PERIOD_MS,
    };
    // A zero interval cannot be scheduled.
    let poll_period_ms = if poll_period_ms == 0 {
        log::warn!(
            "PC_POLL_PERIOD_MS is 0, falling back to default {}ms",
            DEFAULT_POLL_PERIOD_MS
        );
        DEFAULT_POLL_PERIOD_MS
    } else {
        poll_period_ms
    };
    let stagger_ms = match env::var("PC_STAGGER_MS") {
        Ok(ms) => ms.parse::<u64>().expect("Failed to parse PC_STAGGER_MS"),
        Err(_) => DEFAULT_STAGGER_MS,
    };
    let cache_capacity = match env::var("PC_CACHE_CAPACITY") {
        Ok(n) => n.parse::<usize>().expect("Failed to parse PC_CACHE_CAPACITY"),
        Err(_) => DEFAULT_CACHE_CAPACITY,
    };
    // A zero capacity would evict every guid as it is added.
    let cache_capacity = if cache_capacity == 0 {
        log::warn!(
            "PC_CACHE_CAPACITY is 0, falling back to default {}",
            DEFAULT_CACHE_CAPACITY
        );
        DEFAULT_CACHE_CAPACITY
    } else {
        cache_capacity
    };
    let feeds = match env::var("PC_FEEDS") {
        Ok(raw) => parse_feed_list(&raw),
        Err(_) => {
            log::warn!("PC_FEEDS is not set, no feeds will be polled");
            Vec::new()
        }
    };
    let channels = match env::var("PC_CHANNELS") {
        Ok(raw) => parse_channel_list(&raw),
        Err(_) => {
            log::warn!("PC_CHANNELS is not set, announcements go to API-managed subscribers only");
            Vec::new()
        }
    };
    log::info!(
        "Polling {} feeds every {}ms for {} channels",
        feeds.len(),
        poll_period_ms,
        channels.len()
    );

    AppConfig {
        db_path,
        port,
        poll_period: Duration::from_millis(poll_period_ms),
        stagger: Duration::from_millis(stagger_ms),
        cache_capacity,
        feeds,
        channels,
    }
}

/// Comma-separated feed URLs, normalized; entries that do not parse are
/// skipped with a warning.
fn parse_feed_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match normalize_link(s) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Skipping invalid feed URL {}: {}", s, e);
                None
            }
        })
        .collect()
}

fn parse_channel_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[actix_web::main]
async fn run_server(
    store: Arc<PodcastStore>,
    db_pool: DbPool,
    config: AppConfig,
) -> std::io::Result<()> {
    log::info!("Starting server at http://127.0.0.1:{}", config.port);

    let fetcher = Arc::new(RssFetcher::new());
    let notifier = Arc::new(DiscordNotifier::from_env());
    let poller = Poller::start(
        Arc::clone(&store),
        fetcher,
        notifier,
        PollerConfig {
            period: config.poll_period,
            stagger: config.stagger,
            feeds: config.feeds,
            channels: config.channels,
        },
    );

    let store_data = web::Data::from(Arc::clone(&store));
    let result = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::new(
                middleware::TrailingSlash::Trim,
            ))
            .wrap(cors)
            .app_data(store_data.clone())
            .app_data(web::Data::new(db_pool.clone()))
            .service(api::health::routes())
            .service(api::routes())
    })
    .workers(1)
    .bind(("127.0.0.1", config.port))?
    .run()
    .await;

    poller.stop();
    store.close();
    log::info!("Shutdown complete");
    result
}

fn initialize_db_pool(db_path: &str) -> DbPool {
    let manager = r2d2::ConnectionManager::<SqliteConnection>::new(db_path);
    r2d2::Pool::builder()
        .build(manager)
        .expect("Database URL should be a valid path to SQLite DB file")
}
