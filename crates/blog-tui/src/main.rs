use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use blog_shared::PostId;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod app;
mod config;
mod discussion;
mod ui;

use api::ApiClient;
use app::{App, AppEvent};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args: Vec<String> = std::env::args().collect();
    let mut open_post: Option<PostId> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--post" => {
                let Some(raw) = args.get(i + 1) else {
                    eprintln!("Error: --post requires a post id");
                    std::process::exit(1);
                };
                match raw.parse() {
                    Ok(id) => open_post = Some(id),
                    Err(_) => {
                        eprintln!("Error: invalid post id '{}'", raw);
                        std::process::exit(1);
                    }
                }
                i += 2;
            }
            "--help" | "-h" => {
                println!("Usage: blog-tui [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --post <ID>  Open a post and its comments on startup");
                println!("  --help, -h   Show this help message");
                println!();
                println!("Environment:");
                println!("  BLOG_API_URL               API base URL (default http://localhost:8000/api)");
                println!("  BLOG_REQUEST_TIMEOUT_SECS  Per-request timeout (default 30)");
                println!("  BLOG_CONFIG_DIR            Directory for session and log files");
                println!("  RUST_LOG                   Log filter (default blog_tui=info)");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                std::process::exit(1);
            }
        }
    }

    let config = Config::from_env()?;
    init_tracing(&config)?;

    tracing::info!(api_url = %config.api_url, "starting blog-tui");

    // Create API client
    let api = ApiClient::new(&config)?;
    if let Err(e) = api.load_tokens() {
        tracing::warn!(error = %e, "could not read stored session");
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let app = App::new(api);
    let res = run_app(&mut terminal, app, open_post).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "application error");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Logs go to a file; stdout belongs to the terminal UI.
fn init_tracing(config: &Config) -> Result<()> {
    if let Some(dir) = config.log_path.parent() {
        fs::create_dir_all(dir).context("Failed to create log directory")?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("Failed to open log file {}", config.log_path.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "blog_tui=info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    open_post: Option<PostId>,
) -> Result<()> {
    // Create event channel
    let (tx, mut rx) = mpsc::channel::<AppEvent>(100);

    // Spawn input handler
    let tx_input = tx.clone();
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        let _ = tx_input.send(AppEvent::Key(key)).await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = tx_input
                            .send(AppEvent::Error(format!("Input error: {}", e)))
                            .await;
                    }
                }
            }
            // Send tick events for UI refresh
            let _ = tx_input.send(AppEvent::Tick).await;
        }
    });

    // Queued after VerifyAuth so a deep-linked post replaces the list view
    tx.send(AppEvent::VerifyAuth).await?;
    if let Some(post_id) = open_post {
        tx.send(AppEvent::OpenPost(post_id)).await?;
    }

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        if let Some(event) = rx.recv().await {
            if app.handle_event(event, &tx)? {
                return Ok(());
            }
        }
    }
}
