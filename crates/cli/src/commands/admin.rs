//! Admin user management and insights.

use metadots_core::{NewUser, UserId, UserPatch};
use serde_json::json;

use super::Context;
use crate::error::{CliError, Result};
use crate::output;

pub async fn list_users(ctx: &Context, page: u32, limit: u32) -> Result<()> {
    let users = ctx.api.list_users(&ctx.session()?, page, limit).await?;
    output::json(&users)
}

pub async fn create_user(ctx: &Context, user: &NewUser) -> Result<()> {
    let created = ctx.api.create_user(&ctx.session()?, user).await?;
    output::json(&created)
}

pub async fn update_user(ctx: &Context, id: &UserId, patch: &UserPatch) -> Result<()> {
    if patch.is_empty() {
        return Err(CliError::InvalidArgument(
            "nothing to update; pass at least one field".to_string(),
        ));
    }
    let updated = ctx.api.update_user(&ctx.session()?, id, patch).await?;
    output::json(&updated)
}

pub async fn delete_user(ctx: &Context, id: &UserId) -> Result<()> {
    let ack = ctx.api.delete_user(&ctx.session()?, id).await?;
    output::json(&json!({ "deleted": id, "message": ack.message }))
}

/// Dashboard numbers, with the best seller called out.
pub async fn insights(ctx: &Context) -> Result<()> {
    let insights = ctx.api.insights(&ctx.session()?).await?;
    output::json(&json!({
        "insights": insights,
        "top_seller": insights.top_seller(),
    }))
}
