//! Web 服务器主程序入口

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ai_dictionary::env::{core, EnvVar};
use ai_dictionary::lookup::ConfigManager;
use ai_dictionary::web::{StoreBackend, WebConfig, WebServer};

#[derive(Parser)]
#[command(
    name = "ai-dictionary-web",
    version,
    about = "AI Dictionary web server: lookup, history and stats over HTTP"
)]
struct Cli {
    /// Bind address [default: DICT_WEB_BIND_ADDRESS or 127.0.0.1]
    #[arg(short, long)]
    bind: Option<String>,
    /// Port number [default: DICT_WEB_PORT or 3217]
    #[arg(short, long)]
    port: Option<u16>,
    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<String>,
    /// Keep records in memory instead of MongoDB
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let manager = match cli.config.as_deref() {
        Some(path) => ConfigManager::from_path(path)?,
        None => ConfigManager::new()?,
    };

    let log_level = core::LogLevel::get()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_ansi(!core::NoColor::get_or_default(false))
        .init();

    let mut web_config = WebConfig::from_env()?;
    if let Some(bind) = cli.bind {
        web_config.bind_addr = bind;
    }
    if let Some(port) = cli.port {
        web_config.port = port;
    }
    web_config.validate()?;

    let backend = if cli.memory {
        StoreBackend::Memory
    } else {
        StoreBackend::Mongo
    };

    WebServer::new(web_config, manager.into_config())
        .with_backend(backend)
        .start()
        .await?;

    Ok(())
}
