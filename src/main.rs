use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod app;
mod chat;
mod config;
mod content;
mod handler;
mod tui;
mod ui;

use app::App;
use chat::ChatClient;
use config::Config;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    tui::install_panic_hook();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let base_url = config
        .backend_url
        .unwrap_or_else(|| chat::DEFAULT_BACKEND_URL.to_string());

    tracing::info!(
        "starting portfolio tui v{}, chat backend {}",
        env!("CARGO_PKG_VERSION"),
        base_url
    );

    let mut app = App::new(ChatClient::new(&base_url));

    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(Duration::from_millis(300));

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event).await?;
        }

        // A finished request is applied on the next event; ticks cap the wait
        app.poll_chat_response().await;
    }
    Ok(())
}

/// Log to a file under the user cache dir; the terminal belongs to the TUI.
fn init_tracing() {
    let Some(cache_dir) = dirs::cache_dir() else {
        return;
    };
    let log_dir = cache_dir.join("portfolio-tui");
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    let Ok(log_file) = std::fs::File::create(log_dir.join("portfolio.log")) else {
        return;
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();
}
