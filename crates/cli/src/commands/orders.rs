//! Order history.

use super::Context;
use crate::error::Result;
use crate::output;

/// The caller's orders, or every order with `all` (admin).
pub async fn list(ctx: &Context, all: bool) -> Result<()> {
    let session = ctx.session()?;
    let orders = if all {
        ctx.api.all_orders(&session).await?
    } else {
        ctx.api.my_orders(&session).await?
    };
    output::json(&orders)
}
