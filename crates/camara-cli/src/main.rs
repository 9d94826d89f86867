mod cli;
mod commands;
mod observability;
mod output;
mod registry;

use std::sync::Arc;

use anyhow::{Context, Result};
use camara_auth::{AuthConfig, MemoryRevocationStore, RevocationStore, TokenService};
use clap::Parser;

use cli::{Cli, Commands, SecretCommands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);
    let format = cli.format.unwrap_or_default();

    if let Commands::Secret(args) = &cli.command {
        return match &args.command {
            SecretCommands::Generate => commands::secret::generate(format),
            SecretCommands::Hash(hash_args) => commands::secret::hash_secret(hash_args, format),
        };
    }

    let service = build_service(&cli).await?;

    match &cli.command {
        Commands::Issue(args) => commands::token::issue(&service, args, format).await?,
        Commands::Validate(args) => commands::token::validate(&service, args, format).await?,
        Commands::Inspect(args) => commands::token::inspect(&service, args, format).await?,
        Commands::Revoke(args) => commands::token::revoke(&service, args, format).await?,
        Commands::Authorize(args) => commands::token::authorize(&service, args, format).await?,
        Commands::Secret(_) => {}
    }

    Ok(())
}

async fn build_service(cli: &Cli) -> Result<TokenService> {
    let config = AuthConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let credentials = Arc::new(registry::load_registry(&cli.clients)?);

    let revocations: Arc<dyn RevocationStore> = if config.revocation.enabled {
        Arc::new(
            camara_auth_redis::connect(&config.revocation)
                .await
                .context("Failed to connect to the revocation store")?,
        )
    } else {
        tracing::warn!(
            "Shared revocation store disabled; revocations last only for this invocation"
        );
        Arc::new(MemoryRevocationStore::new())
    };

    Ok(TokenService::from_config(&config, credentials, revocations))
}
