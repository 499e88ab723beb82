use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::{error, info};

use shopbot::config::Settings;
use shopbot::{chat, constants, web_server};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the shopping assistant chat widget.
    Serve {
        #[arg(long, default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
        #[arg(
            long,
            value_name = "SECS",
            default_value_t = constants::DEFAULT_SESSION_TTL_SECS,
            help = "Drop chat sessions idle for this long (0 keeps them forever)."
        )]
        session_ttl: u64,
        #[command(flatten)]
        settings: Settings,
    },
    /// Chat with the shopping assistant in the terminal.
    Chat {
        #[command(flatten)]
        settings: Settings,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for GROQ_API_KEY / COMET_API_KEY)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g. RUST_LOG=info,shopbot=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, session_ttl, settings } => {
            let orchestrator = Arc::new(
                settings
                    .build_orchestrator()
                    .context("Failed to initialize the shopping assistant")?,
            );
            info!(model = %settings.model, "Starting ShopBot on port {}...", port);

            let session_ttl = (session_ttl > 0).then(|| Duration::from_secs(session_ttl));
            let mut web_server_handle = tokio::spawn(async move {
                if let Err(e) = web_server::start_web_server(port, orchestrator, session_ttl).await {
                    error!("Web server failed: {:?}", e);
                }
            });

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received, initiating shutdown...");
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(_) => info!("Web server task completed unexpectedly."),
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }

            if !web_server_handle.is_finished() {
                info!("Aborting web server task...");
                web_server_handle.abort();
            }
            info!("Shutdown complete.");
        }
        Commands::Chat { settings } => {
            let orchestrator = settings
                .build_orchestrator()
                .context("Failed to initialize the shopping assistant")?;
            chat::run_chat(&orchestrator, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await
                .context("Chat session failed")?;
        }
    }

    Ok(())
}
