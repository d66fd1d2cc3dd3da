mod config;
mod error;
mod http;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use runtime::{ChatRequest, Dispatcher, GeminiBackend};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Result;

#[derive(Parser)]
#[command(name = "chatbot")]
#[command(about = "A web chatbot with function calling", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "chatbot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send one message and print the reply
    Ask {
        message: String,
    },
    /// List the tools offered to the model
    Tools,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_env(|key| std::env::var(key).ok())?;
    for warning in config.normalize_credentials() {
        warn!("{warning}");
    }

    match cli.command {
        Some(Commands::Serve { port }) => cmd_serve(config, port).await,
        None => cmd_serve(config, None).await,
        Some(Commands::Ask { message }) => cmd_ask(&config, message).await,
        Some(Commands::Tools) => cmd_tools(&config),
    }
}

fn build(config: &Config) -> Result<Dispatcher<GeminiBackend>> {
    let backend = GeminiBackend::builder(
        config.model.api_key.clone().unwrap_or_default(),
        &config.model.model,
    )
    .max_tokens(config.model.max_tokens)
    .base_url(&config.model.base_url)
    .timeout(config.timeout())
    .build()?;
    info!(%backend, "completion backend ready");
    let backend = Arc::new(backend);

    let registry = lookups::registry(&config.lookups, backend.clone(), config.timeout())?;

    Ok(Dispatcher::new(backend, Arc::new(registry)).with_system(config.system_prompt()))
}

async fn cmd_serve(mut config: Config, port: Option<u16>) -> Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    let dispatcher = Arc::new(build(&config)?);
    info!(tools = dispatcher.registry().len(), "dispatcher ready");

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("listening on http://{}", listener.local_addr()?);

    http::serve(listener, http::router(dispatcher)).await?;
    Ok(())
}

async fn cmd_ask(config: &Config, message: String) -> Result<()> {
    let dispatcher = build(config)?;
    let response = dispatcher.run(ChatRequest::new(message)?).await?;

    println!("{}", response.response_text);
    if let Some(data) = response.payload {
        let pretty = serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string());
        println!("\n{pretty}");
    }
    Ok(())
}

fn cmd_tools(config: &Config) -> Result<()> {
    let dispatcher = build(config)?;
    for spec in dispatcher.registry().describe_all() {
        println!("{}\n    {}", spec.name, spec.description);
    }
    Ok(())
}
