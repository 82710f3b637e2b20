//! Cart commands.

use aba_market_client::{CartState, StoreClient};
use aba_market_client::types::Cart;
use aba_market_core::{Price, VariantId};

/// Fetch and print the current cart.
#[allow(clippy::print_stdout)]
pub async fn show(client: &StoreClient) {
    client.cart().fetch().await;

    match client.cart().state() {
        CartState::Empty => println!("Your cart is empty."),
        CartState::Loaded(cart) => print_cart(&cart),
        CartState::Error { previous } => {
            println!("Could not refresh the cart.");
            if let Some(cart) = previous {
                println!("Last known contents:");
                print_cart(&cart);
            }
        }
        CartState::Loading { .. } => {}
    }
}

/// Add a variant to the cart and print the updated contents.
#[allow(clippy::print_stdout)]
pub async fn add(
    client: &StoreClient,
    variant: VariantId,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let cart = client.cart().add_item(variant, quantity).await?;
    println!("Added {quantity} x variant {variant}.");
    print_cart(&cart);
    Ok(())
}

/// Remove a variant from the cart.
#[allow(clippy::print_stdout)]
pub async fn remove(client: &StoreClient, variant: VariantId) {
    client.cart().remove_item(variant).await;
    println!("Removed variant {variant}.");
}

/// Empty the cart.
#[allow(clippy::print_stdout)]
pub async fn clear(client: &StoreClient) {
    client.cart().clear().await;
    println!("Cart cleared.");
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart) {
    if cart.items.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for item in &cart.items {
        println!(
            "  {} x {} @ {} = {}",
            item.quantity,
            item.product_name,
            Price::naira(item.unit_price).display(),
            Price::naira(item.sub_total).display()
        );
    }
    println!(
        "  Total ({} items): {}",
        cart.item_count(),
        cart.total_price().display()
    );
}
