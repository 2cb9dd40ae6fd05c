use std::{env, io, sync::Arc};

use log::{debug, info};
use reqwest::Client;
use schedule_core::{Engine, Settings, SystemClock};
use tokio::{net::TcpListener, signal, sync::RwLock, task, time};

mod cli;
mod fetch;
mod routes;
mod store;

use fetch::fetch_payload;
use store::FileStore;

pub type SharedEngine = Arc<RwLock<Engine<SystemClock, FileStore>>>;

/// Everything a handler needs: the engine and what it takes to refetch.
#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub client: Client,
    pub upstream: Arc<str>,
}

const TICK_EVERY: time::Duration = time::Duration::from_secs(60);

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "schedule_proxy=info,schedule_core=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}

/// Fetches outside the lock and swaps the result in; overlapping refreshes
/// resolve last-write-wins.
pub async fn refresh(state: &AppState) -> bool {
    let fetched = fetch_payload(&state.client, &state.upstream).await;
    state.engine.write().await.reload(fetched).is_ok()
}

async fn refresh_loop(state: AppState, every: time::Duration) {
    let mut interval = time::interval(every);
    // The first tick completes immediately; the initial load already ran.
    interval.tick().await;
    loop {
        interval.tick().await;
        refresh(&state).await;
    }
}

async fn tick_loop(engine: SharedEngine) {
    let mut interval = time::interval(TICK_EVERY);
    loop {
        interval.tick().await;
        let tick = engine.write().await.tick();
        if let Some(freshness) = tick.freshness {
            debug!("{}", freshness.label);
        }
    }
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    setup_logging();
    let args = cli::parse(env::args().skip(1).collect());

    let settings = Settings {
        stale_threshold_hours: args.stale_hours,
        ..Settings::default()
    };
    let engine = Engine::new(
        settings,
        SystemClock::with_offset_minutes(args.utc_offset),
        FileStore::open(args.preferences),
    );

    let state = AppState {
        engine: Arc::new(RwLock::new(engine)),
        client: Client::new(),
        upstream: Arc::from(args.upstream),
    };

    refresh(&state).await;
    task::spawn(refresh_loop(state.clone(), args.refresh));
    task::spawn(tick_loop(Arc::clone(&state.engine)));

    let listener = TcpListener::bind(args.address).await?;
    info!("Listening at http://{}", args.address);
    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}
