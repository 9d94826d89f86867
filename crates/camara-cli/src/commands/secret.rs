use std::io::{self, BufRead};

use anyhow::{Context, Result, anyhow};
use camara_auth::secret::{generate_client_secret, hash_client_secret};
use colored::Colorize;
use serde_json::json;

use crate::cli::{HashArgs, OutputFormat};
use crate::output::print_value;

pub fn generate(format: OutputFormat) -> Result<()> {
    let secret = generate_client_secret();
    let hash = hash(&secret)?;

    print_value(&json!({ "client_secret": secret, "secret_hash": hash }), format)?;
    eprintln!(
        "{} {}",
        "!".yellow(),
        "Store the secret now; only its hash belongs in the client registry."
    );
    Ok(())
}

pub fn hash_secret(args: &HashArgs, format: OutputFormat) -> Result<()> {
    let secret = match &args.secret {
        Some(secret) => secret.clone(),
        None => read_secret(io::stdin().lock())?,
    };
    if secret.is_empty() {
        anyhow::bail!("Client secret must not be empty");
    }

    print_value(&json!({ "secret_hash": hash(&secret)? }), format)
}

fn hash(secret: &str) -> Result<String> {
    hash_client_secret(secret).map_err(|e| anyhow!("Failed to hash client secret: {e}"))
}

fn read_secret(reader: impl BufRead) -> Result<String> {
    let line = reader
        .lines()
        .next()
        .transpose()
        .context("Failed to read client secret from stdin")?
        .unwrap_or_default();
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
