use anyhow::{Context, Result};
use guia_core::{Config, QueryService, SessionController};
use tracing::{error, info};

mod app;
mod clipboard;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use clipboard::SystemClipboard;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = logging::init()?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let config = Config::load()?;

    // Without a credential nothing can be asked; fail before taking the terminal
    let service = match QueryService::from_config(&config) {
        Ok(service) => service,
        Err(err) => {
            error!(error = %err, "configuration error");
            return Err(err).context("cannot start the assistant");
        }
    };

    let controller = SessionController::new(service, Box::new(SystemClipboard::new()));
    let mut app = App::new(controller, config.model());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    info!("exiting");
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();
    let mut state_rx = app.controller.subscribe();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            Some(event) = events.next() => handler::handle_event(app, event).await?,
            Ok(()) = state_rx.changed() => {
                let state = state_rx.borrow_and_update().clone();
                app.on_state_change(&state);
            }
            else => break,
        }
    }

    Ok(())
}
