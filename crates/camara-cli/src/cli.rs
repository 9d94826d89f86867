use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "camara-auth")]
#[command(about = "CamaraPSAP access token tool")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "CAMARA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Client registry file (TOML with [[clients]] entries)
    #[arg(long, global = true, env = "CAMARA_CLIENTS", default_value = "clients.toml")]
    pub clients: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Issue an access token (client credentials, or 3-legged with --user-id)
    Issue(IssueArgs),
    /// Validate a token: signature, expiry and revocation
    Validate(TokenArgs),
    /// Show a token's claims and status without rejecting it
    Inspect(TokenArgs),
    /// Revoke a token on behalf of the client it was issued to
    Revoke(RevokeArgs),
    /// Check that a token grants scopes, optionally resolving the target device
    Authorize(AuthorizeArgs),
    /// Generate and hash client secrets
    Secret(SecretArgs),
}

#[derive(clap::Args)]
pub struct IssueArgs {
    /// OAuth client ID
    #[arg(long)]
    pub client_id: String,
    /// Client secret (required for client credentials)
    #[arg(long, env = "CAMARA_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,
    /// Space-separated scopes to request
    #[arg(long, default_value = "")]
    pub scope: String,
    /// User who consented; switches to a 3-legged token
    #[arg(long)]
    pub user_id: Option<String>,
    /// Authorization code already exchanged for the user and device
    #[arg(long, requires = "user_id")]
    pub code: Option<String>,
    /// Device JSON bound to a 3-legged token (e.g. '{"phoneNumber":"+123456789"}')
    #[arg(long, requires = "user_id")]
    pub device: Option<String>,
}

#[derive(clap::Args)]
pub struct TokenArgs {
    /// Encoded access token
    pub token: String,
}

#[derive(clap::Args)]
pub struct RevokeArgs {
    /// Encoded access token
    pub token: String,
    /// OAuth client ID the token was issued to
    #[arg(long)]
    pub client_id: String,
    /// Client secret
    #[arg(long, env = "CAMARA_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,
}

#[derive(clap::Args)]
pub struct AuthorizeArgs {
    /// Encoded access token
    pub token: String,
    /// Required scope (repeatable)
    #[arg(long = "scope", required = true)]
    pub scopes: Vec<String>,
    /// Device JSON named by the API request
    #[arg(long)]
    pub device: Option<String>,
    /// Resolve the device the call concerns
    #[arg(long)]
    pub resolve_device: bool,
}

#[derive(clap::Args)]
pub struct SecretArgs {
    #[command(subcommand)]
    pub command: SecretCommands,
}

#[derive(Subcommand)]
pub enum SecretCommands {
    /// Generate a new client secret and its hash
    Generate,
    /// Hash a client secret (reads stdin if omitted)
    Hash(HashArgs),
}

#[derive(clap::Args)]
pub struct HashArgs {
    /// Plaintext secret
    pub secret: Option<String>,
}
