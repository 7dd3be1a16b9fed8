use clap::Parser;
use parley_adaptor_terminal::{TerminalChat, TerminalConfig};
use parley_core::{
    init_logging, load_env, ChatSession, ChatTransport, ClientConfig, HttpTransport,
    SessionOptions,
};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "parley", about = "Chat with a remote agent from the terminal")]
struct Cli {
    /// Base URL of the chat API
    #[arg(long, env = "PARLEY_API_URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "PARLEY_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Prior turns sent as history with each message
    #[arg(long, env = "PARLEY_HISTORY_WINDOW")]
    history_window: Option<usize>,

    #[arg(long, env = "PARLEY_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Start with agent thinking hidden
    #[arg(long)]
    no_thinking: bool,

    /// Assistant greeting shown at start
    #[arg(long, env = "PARLEY_GREETING")]
    greeting: Option<String>,

    /// Probe the service before starting
    #[arg(long)]
    check_health: bool,

    /// Transcript width in columns
    #[arg(long, default_value_t = 80)]
    width: usize,
}

fn client_config(cli: &Cli) -> parley_core::Result<ClientConfig> {
    let config = ClientConfig::from_env_with(cli.api_url.clone(), cli.timeout_secs)?;
    Ok(match cli.history_window {
        Some(window) => config.with_history_window(window),
        None => config,
    })
}

fn main() -> parley_core::Result<()> {
    load_env()?;
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move {
        let config = client_config(&cli)?;
        info!("Using chat API at {}", config.base_url);
        let history_window = config.history_window;
        let transport = Arc::new(HttpTransport::new(config)?);

        if cli.check_health {
            match transport.health().await {
                Ok(true) => println!("Chat service is healthy."),
                Ok(false) => println!("Chat service is unavailable."),
                Err(err) => {
                    warn!("Health check failed: {}", err);
                    println!("Chat service is unavailable.");
                }
            }
        }

        let session = ChatSession::with_options(
            transport,
            SessionOptions {
                history_window,
                greeting: cli.greeting.clone(),
            },
        );
        let mut chat = TerminalChat::new(
            TerminalConfig {
                width: cli.width,
                show_thinking: !cli.no_thinking,
                ..Default::default()
            },
            session,
        );

        chat.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    })
}
