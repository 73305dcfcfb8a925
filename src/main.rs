use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use terminwatch::config::Config;
use terminwatch::crawler::headers::booking_user_agent;
use terminwatch::crawler::{CalendarScanner, HttpFetcher};
use terminwatch::models::Snapshot;
use terminwatch::notifications::Signal;
use terminwatch::scheduler::PollLoop;
use terminwatch::server::{self, Hub};

#[derive(Parser)]
#[command(
    name = "terminwatch",
    version,
    about = "Watch the Berlin.de appointment calendar and push availability over websockets",
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file; defaults to environment variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service description page to watch
    #[arg(long)]
    url: Option<String>,

    /// Operator contact email, sent in the user agent
    #[arg(long)]
    email: Option<String>,

    /// Identifier for this deployment, sent in the user agent
    #[arg(long)]
    script_id: Option<String>,

    /// Websocket port for subscribers
    #[arg(short, long)]
    port: Option<u16>,

    /// Suppress the audible signal
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, default_value = "text")]
    log_format: String,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.watch.service_page_url = url.clone();
        }
        if let Some(email) = &self.email {
            config.watch.email = email.clone();
        }
        if let Some(script_id) = &self.script_id {
            config.watch.script_id = script_id.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.quiet {
            config.watch.quiet = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    cli.apply(&mut config);
    config.validate()?;

    tracing::info!(
        url = %config.watch.service_page_url,
        interval_secs = config.watch.poll_interval_secs,
        port = config.server.port,
        "terminwatch starting"
    );

    let user_agent = booking_user_agent(&config.watch.email, &config.watch.script_id);
    let fetcher = Arc::new(HttpFetcher::new(user_agent)?);

    let scanner = CalendarScanner::resolve(
        fetcher,
        &config.watch.service_page_url,
        config.request_timeout(),
    )
    .await?;
    tracing::info!(calendar_url = %scanner.calendar_url(), "booking calendar resolved");

    let hub = Arc::new(Hub::new(Snapshot::initial()));
    let signal = Signal::new(config.watch.quiet);
    let poll_loop = PollLoop::new(
        scanner,
        hub.clone(),
        signal,
        config.poll_interval(),
        config.backoff_interval(),
    );

    let poller = tokio::spawn(poll_loop.run());
    // serve() returns once ctrl-c closes the listener; the poll loop has no
    // terminal state of its own and is dropped with the process.
    let result = server::serve(config.server.port, hub).await;
    poller.abort();

    tracing::info!("terminwatch stopped");
    result
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("terminwatch=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("terminwatch=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
