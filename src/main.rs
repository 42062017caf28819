use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use segmentd::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segmentd=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Serve { host, port } => cli::commands::serve(config, host, port).await,
        Commands::HashPassword { password, cost } => {
            cli::commands::hash_password(&password, cost).await
        }
        Commands::Users => cli::commands::users(config).await,
        Commands::Token { username } => cli::commands::token(config, &username).await,
    };

    if let Err(e) = &result {
        cli::error(&format!("{:#}", e));
    }
    result
}
