use std::path::PathBuf;

use askdb_server::{ServerConfig, build_state, router, telemetry};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "askdb")]
#[command(about = "Ask questions of SQLite, PostgreSQL and MySQL databases in plain English")]
#[command(version)]
struct Cli {
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration file.
    #[arg(long)]
    bind: Option<String>,

    /// Generative model name, overriding the configuration file.
    #[arg(long)]
    model: Option<String>,
}

impl Cli {
    fn resolve_config(&self) -> askdb_server::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if let Some(model) = &self.model {
            config.generator.model = model.clone();
        }
        Ok(config)
    }
}

async fn run(cli: Cli) -> askdb_server::Result<()> {
    let config = cli.resolve_config()?;
    let addr = config.bind_addr()?;
    let state = build_state(&config)?;
    info!(model = state.generator.model_name(), "query generator ready");

    let listener = TcpListener::bind(addr).await?;
    askdb_server::serve(listener, router(state)).await
}

#[tokio::main]
async fn main() {
    telemetry::init();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
