//! Product browsing and admin product management.

use std::path::Path;

use metadots_core::{ProductId, ProductInput, ProductPatch, ProductQuery};
use serde_json::json;

use super::Context;
use crate::error::{CliError, Result};
use crate::output;

pub async fn list(ctx: &Context, query: &ProductQuery) -> Result<()> {
    let page = ctx.api.list_products(&ctx.session()?, query).await?;
    output::json(&page)
}

pub async fn show(ctx: &Context, id: &ProductId) -> Result<()> {
    let product = ctx.api.get_product(&ctx.session()?, id).await?;
    output::json(&product)
}

/// Category names. A failed fetch lists none.
pub async fn categories(ctx: &Context) -> Result<()> {
    let categories = match ctx.api.categories(&ctx.session()?).await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::warn!(error = %e, "Category fetch failed, showing none");
            metadots_core::Categories::default()
        }
    };
    output::json(categories.names())
}

pub async fn create(ctx: &Context, input: &ProductInput) -> Result<()> {
    let product = ctx.api.create_product(&ctx.session()?, input).await?;
    output::json(&product)
}

pub async fn update(ctx: &Context, id: &ProductId, patch: &ProductPatch) -> Result<()> {
    if patch.is_empty() {
        return Err(CliError::InvalidArgument(
            "nothing to update; pass at least one field".to_string(),
        ));
    }
    let product = ctx.api.update_product(&ctx.session()?, id, patch).await?;
    output::json(&product)
}

pub async fn delete(ctx: &Context, id: &ProductId) -> Result<()> {
    let ack = ctx.api.delete_product(&ctx.session()?, id).await?;
    output::json(&json!({ "deleted": id, "message": ack.message }))
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Upload an image file and print its public URL.
pub async fn upload_image(ctx: &Context, path: &Path) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CliError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload");

    let uploaded = ctx
        .api
        .upload_image(&ctx.session()?, file_name, content_type(path), bytes)
        .await?;
    output::json(&json!({ "url": uploaded.url }))
}
