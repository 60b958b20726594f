use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use talio_client::config::ClientConfig;
use talio_client::gateway::{HttpGateway, RemoteGateway};
use talio_client::push::PushClient;
use talio_client::session::{Notice, Session};
use talio_client::storage::LocalStore;
use talio_client::ui_loop::{run_ui_loop, UiEvent, UserAction};
use talio_events::push::OriginTag;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "talio_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = ClientConfig::from_env();
    tracing::info!(
        server = %config.server_url,
        store = %config.store_path.display(),
        "Loaded client configuration",
    );

    let store = LocalStore::load(&config.store_path).expect("Failed to load local state");
    let gateway: Arc<dyn RemoteGateway> = Arc::new(HttpGateway::new(config.api_url()));
    if let Err(e) = gateway.test_connection().await {
        tracing::error!(error = %e, "Server is not reachable");
        std::process::exit(1);
    }

    // --- Session ---
    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let push = PushClient::new(config.ws_url(), OriginTag::generate(), config.reconnect())
        .spawn(ui_tx.clone(), cancel.child_token());

    let mut session = Session::new(gateway, config.server_url.clone(), store, ui_tx.clone())
        .with_push(push)
        .with_watch_backoff(config.reconnect());
    for id in session.recent_boards().to_vec() {
        if let Err(e) = session.open_board(id).await {
            tracing::warn!(board_id = id, error = %e, "Could not reopen recent board");
        }
    }
    print!("{}", session.render_summary());

    // --- Input ---
    let input_tx = ui_tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let event = match line.trim() {
                "quit" | "exit" => UiEvent::Shutdown,
                line => match UserAction::parse(line) {
                    Ok(action) => UiEvent::Action(action),
                    Err(e) => {
                        eprintln!("{e}");
                        continue;
                    }
                },
            };
            if input_tx.send(event).is_err() {
                break;
            }
        }
        let _ = input_tx.send(UiEvent::Shutdown);
    });

    let signal_tx = ui_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
            let _ = signal_tx.send(UiEvent::Shutdown);
        }
    });
    drop(ui_tx);

    // --- Run ---
    run_ui_loop(session, ui_rx, |session| {
        for notice in session.take_notices() {
            match notice {
                Notice::Error(message) => eprintln!("error: {message}"),
                Notice::TaskDeleted(id) => eprintln!("task #{id} was deleted"),
                Notice::BoardDeleted(id) => eprintln!("board #{id} was deleted"),
                Notice::LiveSyncUnavailable => {
                    eprintln!("live sync unavailable, changes by others show after reopening")
                }
                Notice::AccessChanged { board_id, write_access } => {
                    eprintln!("write access to board #{board_id} is now {write_access}")
                }
            }
        }
        print!("{}", session.render_summary());
    })
    .await;

    cancel.cancel();
    tracing::info!("Client shut down");
}
