use anyhow::Result;
use clap::arg;
use clap::command;
use clap::Parser;
use latte::server;
use latte::utils::config_loader;
use latte::utils::logging;
use latte::utils::logging::LogLevel;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "latte-proxy.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Read args, load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level).await?;

    // -------------------------------
    // 2. Serve the proxy until shutdown
    // -------------------------------

    info!("Service starting...");
    server::server::start(&service_config).await?;
    info!("Service stopped");

    Ok(())
}
