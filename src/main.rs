use clap::Parser;
use handoff::application::controller::HandoffController;
use handoff::config::HandoffConfig;
use handoff::error::HandoffError;
use handoff::infrastructure::http::HttpBackend;
use handoff::interfaces::terminal::signals::{LineSource, spawn_line_reader, spawn_relay};
use handoff::interfaces::terminal::view::TerminalView;
use handoff::interfaces::terminal::window::TerminalWindow;
use miette::{IntoDiagnostic, Result};
use std::io::{self, BufReader};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file (optional). Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the backend serving /url and /send
    #[arg(long, env = "HANDOFF_SERVER_URL")]
    server_url: Option<String>,

    /// Origin completion signals must come from (defaults to the provider URL's origin)
    #[arg(long, env = "HANDOFF_PROVIDER_ORIGIN")]
    provider_origin: Option<String>,

    /// Number of transactions to run one after another
    #[arg(long, default_value_t = 1)]
    sessions: u32,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("handoff=info")),
        1 => EnvFilter::new("handoff=debug"),
        _ => EnvFilter::new("handoff=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Waits for the user to ask for another attempt after a failed request.
///
/// Only transport failures are retried; anything else, or the end of input,
/// ends the run with `err`.
async fn retry_on_input(lines: &LineSource, err: HandoffError) -> Result<()> {
    if !err.is_transport() {
        return Err(err).into_diagnostic();
    }
    println!("press Enter to try again");
    match lines.lock().await.recv().await {
        Some(_) => Ok(()),
        None => Err(err).into_diagnostic(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => HandoffConfig::load(path).into_diagnostic()?,
        None => HandoffConfig::default(),
    };
    if let Some(server_url) = cli.server_url {
        config.server_url = server_url;
    }
    if let Some(origin) = cli.provider_origin {
        config.provider_origin = Some(origin);
    }
    debug!(?config, "configuration loaded");

    let backend = HttpBackend::new(&config.server_url).into_diagnostic()?;
    let window = TerminalWindow::new(io::stdout());

    // Completion is relayed from stdin while the provider window is open;
    // between windows, input answers retry prompts.
    let lines = spawn_line_reader(BufReader::new(io::stdin()));
    let (signals_tx, mut signals_rx) = mpsc::channel(16);
    let relay = spawn_relay(
        lines.clone(),
        window.subscribe(),
        config.provider_origin.clone(),
        signals_tx,
    );

    let mut controller = HandoffController::new(
        Box::new(backend),
        Box::new(window),
        Box::new(TerminalView::new(io::stdout())),
        config,
    );
    controller.show().await;

    for _ in 0..cli.sessions {
        while let Err(e) = controller.start().await {
            retry_on_input(&lines, e).await?;
        }
        // An abandoned provider flow leaves nothing to retry.
        controller
            .await_completion(&mut signals_rx)
            .await
            .into_diagnostic()?;
        while let Err(e) = controller.finalize().await {
            retry_on_input(&lines, e).await?;
        }
    }

    relay.abort();
    Ok(())
}
