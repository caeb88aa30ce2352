//! Cart commands.

use metadots_core::{Cart, CartLine, Price, ProductId};
use metadots_storefront::cart::CartStore;
use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::output;

#[derive(Serialize)]
struct CartView<'a> {
    items: &'a [CartLine],
    total: Price,
    item_count: u64,
}

fn print(cart: &Cart) -> Result<()> {
    output::json(&CartView {
        items: &cart.items,
        total: cart.total(),
        item_count: cart.item_count(),
    })
}

async fn mount(ctx: &Context) -> Result<CartStore> {
    Ok(CartStore::mount(ctx.api.clone(), ctx.events.clone(), ctx.session()?).await)
}

/// Show the cart. A failed fetch shows an empty cart.
pub async fn show(ctx: &Context) -> Result<()> {
    let store = mount(ctx).await?;
    print(&store.cart())
}

/// Add a product. Without `--price` the catalog price is used.
pub async fn add(
    ctx: &Context,
    product_id: &ProductId,
    quantity: u32,
    price: Option<Price>,
) -> Result<()> {
    let store = mount(ctx).await?;
    let price = match price {
        Some(price) => price,
        None => ctx.api.get_product(store.session(), product_id).await?.price,
    };
    store.add(product_id, quantity, price).await?;
    print(&store.cart())
}

/// Set a line's quantity; zero removes it.
pub async fn update(
    ctx: &Context,
    product_id: &ProductId,
    quantity: u32,
    price: Option<Price>,
) -> Result<()> {
    let store = mount(ctx).await?;
    let price = match price.or_else(|| store.cart().line(product_id).map(|line| line.price)) {
        Some(price) => price,
        None => ctx.api.get_product(store.session(), product_id).await?.price,
    };
    store.update(product_id, quantity, price).await?;
    print(&store.cart())
}

pub async fn remove(ctx: &Context, product_id: &ProductId) -> Result<()> {
    let store = mount(ctx).await?;
    store.remove(product_id).await?;
    print(&store.cart())
}
