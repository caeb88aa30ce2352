//! Checkout command.

use metadots_storefront::checkout::{
    CheckoutFlow, CheckoutPhase, CheckoutReturn, SUCCESS_MESSAGE,
};
use serde_json::json;

use super::Context;
use crate::error::Result;
use crate::output;

/// Check out the stored session's cart.
///
/// An external payment page is printed for the user to open; control leaves
/// the application there. A local completion prints the order.
pub async fn run(ctx: &Context, simulate: bool) -> Result<()> {
    let session = ctx.session()?;
    let cart = ctx.api.get_cart(&session).await?;

    let flow = CheckoutFlow::new(
        ctx.api.clone(),
        ctx.events.clone(),
        ctx.classifier.clone(),
        session,
    );
    let phase = if simulate {
        flow.simulate_payment(&cart).await?
    } else {
        flow.place_order(&cart).await?
    };

    match phase {
        CheckoutPhase::ExternalRedirect { url } => output::json(&json!({
            "status": "redirect",
            "url": url.as_str(),
            "message": "Open this URL to complete payment",
        })),
        CheckoutPhase::LocalSuccess { order_id } => {
            let resolved = flow.resolve(CheckoutReturn::Success { order_id });
            let order_id = match resolved {
                CheckoutPhase::Resolved { order_id } => order_id,
                _ => None,
            };
            output::json(&json!({
                "status": "success",
                "order_id": order_id,
                "message": SUCCESS_MESSAGE,
            }))
        }
        other => output::json(&json!({ "status": format!("{other:?}") })),
    }
}
