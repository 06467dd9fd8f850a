//! BizBuddy TUI - a terminal client for the BizBuddy business-advice chat
//! service.
//!
//! The application restores a persisted session at startup, lets the user
//! sign in or create an account, and runs a field-scoped question/answer
//! conversation against the backend.

mod app;
mod ui;
mod utils;

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bizbuddy_core::{ApiClient, Config, KeyringTokenStore, SessionController};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Initialize the tracing subscriber.
///
/// The TUI owns the terminal, so logs go to a daily-rolling file under the
/// cache directory. Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "bizbuddy.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--login" {
        return console_login().await;
    }

    let config = Config::load().unwrap_or_default();
    let log_dir = config.cache_dir()?.join("logs");
    let _guard = init_tracing(&log_dir);
    info!("BizBuddy TUI starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let mut app = App::new()?;

    // Resolve the stored session in the background; the UI shows the
    // pending state until it lands, and treats it as undecided rather
    // than signed out.
    let session = Arc::clone(&app.session);
    tokio::spawn(async move { session.initialize().await });

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("BizBuddy TUI shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Collect completed background asks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

/// Console login (used from scripts and headless shells)
async fn console_login() -> Result<()> {
    let mut config = Config::load().unwrap_or_default();

    println!("\n=== BizBuddy Login ===\n");

    let email = if let Some(ref last_email) = config.last_email {
        print!("Email [{}]: ", last_email);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if input.is_empty() {
            last_email.clone()
        } else {
            input.to_string()
        }
    } else {
        print!("Email: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        input.trim().to_string()
    };

    let password = rpassword::prompt_password("Password: ")?;

    println!("\nSigning in...");

    let api = ApiClient::new(config.resolved_api_base_url())?;
    let session = SessionController::new(Arc::new(KeyringTokenStore), Arc::new(api));

    if !session.login(&email, &password).await {
        anyhow::bail!("Login failed: credentials rejected or server unreachable");
    }

    if let Some(identity) = session.state().identity {
        println!("Signed in as {} <{}>", identity.username, identity.email);
    }

    config.last_email = Some(email);
    config.save()?;

    Ok(())
}
