use anyhow::{Context, Result};
use camara_auth::{AuthError, Device, IssueRequest, Scope, ScopeAuthorizer, TokenService};
use serde_json::json;

use crate::cli::{AuthorizeArgs, IssueArgs, OutputFormat, RevokeArgs, TokenArgs};
use crate::output::{print_error_body, print_success, print_value};

/// Prints the caller-facing error body and hands the error back for the exit code.
fn reject(err: AuthError, format: OutputFormat) -> anyhow::Error {
    if let Err(e) = print_error_body(&err, format) {
        tracing::debug!(error = %e, "Failed to print error body");
    }
    err.into()
}

fn parse_device(raw: &str) -> Result<Device> {
    serde_json::from_str(raw)
        .context(r#"Device must be a JSON object, e.g. '{"phoneNumber":"+123456789"}'"#)
}

pub fn build_request(args: &IssueArgs) -> Result<IssueRequest> {
    let scopes = Scope::parse_list(&args.scope)?;

    let request = match &args.user_id {
        Some(user_id) => IssueRequest::ThreeLegged {
            client_id: args.client_id.clone(),
            client_secret: args.client_secret.clone(),
            authorization_code: args.code.clone(),
            user_id: user_id.clone(),
            device: args.device.as_deref().map(parse_device).transpose()?,
            scopes,
        },
        None => IssueRequest::TwoLegged {
            client_id: args.client_id.clone(),
            client_secret: args
                .client_secret
                .clone()
                .context("--client-secret is required for client credentials")?,
            scopes,
        },
    };
    Ok(request)
}

pub async fn issue(service: &TokenService, args: &IssueArgs, format: OutputFormat) -> Result<()> {
    let request = build_request(args)?;
    let issued = service
        .issue(request)
        .await
        .map_err(|e| reject(e, format))?;

    print_value(&issued.to_response(), format)
}

pub async fn validate(service: &TokenService, args: &TokenArgs, format: OutputFormat) -> Result<()> {
    let token = service
        .validate(&args.token)
        .await
        .map_err(|e| reject(e, format))?;

    print_value(token.claims(), format)
}

pub async fn inspect(service: &TokenService, args: &TokenArgs, format: OutputFormat) -> Result<()> {
    let introspection = service
        .introspect(&args.token)
        .await
        .map_err(|e| reject(e, format))?;

    print_value(&introspection, format)
}

pub async fn revoke(service: &TokenService, args: &RevokeArgs, format: OutputFormat) -> Result<()> {
    let revoked = service
        .revoke(&args.token, &args.client_id, &args.client_secret)
        .await
        .map_err(|e| reject(e, format))?;

    if revoked {
        print_success("Token revoked");
    } else {
        print_value(&json!({ "revoked": false, "reason": "token could not be verified" }), format)?;
    }
    Ok(())
}

pub async fn authorize(
    service: &TokenService,
    args: &AuthorizeArgs,
    format: OutputFormat,
) -> Result<()> {
    let required = Scope::parse_list(&args.scopes.join(" "))?;
    let request_device = args.device.as_deref().map(parse_device).transpose()?;

    let token = service
        .validate(&args.token)
        .await
        .map_err(|e| reject(e, format))?;
    ScopeAuthorizer::authorize_all(&token, &required).map_err(|e| reject(e, format))?;

    let device = if args.resolve_device {
        Some(
            ScopeAuthorizer::resolve_device(&token, request_device.as_ref())
                .map_err(|e| reject(e, format))?,
        )
    } else {
        None
    };

    print_value(
        &json!({
            "authorized": true,
            "client_id": token.client_id(),
            "token_type": token.token_type().as_str(),
            "scopes": required,
            "device": device,
        }),
        format,
    )
}
