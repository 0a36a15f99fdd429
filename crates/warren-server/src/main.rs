use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn, Level};

use warren_logic::worldcheck::{self, Severity};
use warren_server::engine::TransitionEngine;
use warren_server::events::ChannelSink;
use warren_server::http::{self, AppState};
use warren_server::memory::MemoryStore;
use warren_server::seed;

fn usage_and_exit() -> ! {
    eprintln!(
        "warren-server

USAGE:
  warren-server [--bind HOST:PORT]

ENV:
  WARREN_BIND  default 127.0.0.1:8037
"
    );
    std::process::exit(2);
}

#[derive(Clone, Debug)]
struct Config {
    bind: SocketAddr,
}

fn parse_args() -> Config {
    let mut bind: SocketAddr = std::env::var("WARREN_BIND")
        .unwrap_or_else(|_| "127.0.0.1:8037".to_string())
        .parse()
        .unwrap_or_else(|_| usage_and_exit());

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--bind" => {
                let v = it.next().unwrap_or_else(|| usage_and_exit());
                bind = v.parse().unwrap_or_else(|_| usage_and_exit());
            }
            "-h" | "--help" => usage_and_exit(),
            _ => usage_and_exit(),
        }
    }

    Config { bind }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_max_level(Level::INFO)
        .init();

    let cfg = parse_args();

    let store = Arc::new(MemoryStore::new());
    seed::seed_demo_world(&store).context("seed demo world")?;

    // Refuse to serve a world that fails its own structure checks.
    let (rooms, entrances, connections) = store.graph_snapshot()?;
    let findings = worldcheck::validate_all(&rooms, &entrances, &connections);
    for finding in &findings {
        match finding.severity {
            Severity::Error => warn!(category = finding.category, "{}", finding.message),
            Severity::Warning => info!(category = finding.category, "{}", finding.message),
        }
    }
    if !worldcheck::is_sound(&findings) {
        anyhow::bail!("world validation failed; see log for findings");
    }
    info!(
        rooms = rooms.len(),
        entrances = entrances.len(),
        connections = connections.len(),
        "world seeded"
    );

    // CRM notifications happen outside the transition, fire and forget.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            crm_notify(event).await;
        }
    });

    let engine = TransitionEngine::new(
        store,
        Arc::new(seed::demo_keyring()),
        Arc::new(ChannelSink::new(event_tx)),
    );
    let app = http::router(AppState {
        engine: Arc::new(engine),
    });

    info!(bind = %cfg.bind, "warren listening");
    let listener = tokio::net::TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("bind {}", cfg.bind))?;
    axum::serve(listener, app).await.context("serve http")?;
    Ok(())
}

/// Stand-in for the analytics/CRM collaborator. Logs what a real
/// integration would POST.
async fn crm_notify(event: warren_server::events::TransitionEvent) {
    info!(
        target: "warren::crm",
        actor = event.actor,
        from_room = event.from_room,
        to_room = event.to_room,
        entrance = event.entrance,
        energy_cost = event.energy_cost,
        experience_gained = event.experience_gained,
        occurred_at = event.occurred_at,
        "transition recorded"
    );
}
