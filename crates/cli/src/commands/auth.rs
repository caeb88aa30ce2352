//! Login, registration and "who am I".

use metadots_core::Registration;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use super::Context;
use crate::error::Result;
use crate::output;

/// Log in and store the session.
pub async fn login(ctx: &Context, email: &str, password: &SecretString) -> Result<()> {
    let session = ctx.account.login(email, password.expose_secret()).await?;
    ctx.sessions.save(&session)?;
    tracing::info!(path = %ctx.sessions.path().display(), "Session stored");

    let principal = ctx.account.whoami(&session).await?;
    output::json(&principal)
}

/// Create an account. Log in afterwards.
pub async fn register(ctx: &Context, registration: &Registration) -> Result<()> {
    let principal = ctx.account.register(registration).await?;
    output::json(&principal)
}

/// End the session. The stored session is removed even if the backend call
/// fails.
pub async fn logout(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let result = ctx.account.logout(&session).await;
    ctx.sessions.clear()?;
    result?;
    output::json(&json!({ "logged_out": true }))
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let principal = ctx.account.whoami(&session).await?;
    output::json(&principal)
}
