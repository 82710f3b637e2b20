//! Order commands: checkout and history.

use aba_market_client::StoreClient;
use aba_market_client::types::{OrderItemInput, PaymentMethod, PlaceOrderRequest};
use aba_market_core::Price;

/// Place an order for the current cart, shipping to the account's default
/// address.
#[allow(clippy::print_stdout)]
pub async fn checkout(
    client: &StoreClient,
    payment: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let payment_method: PaymentMethod = payment.parse()?;

    let Some(profile) = client.auth().profile() else {
        return Err("Sign in before checking out: aba-cli account login".into());
    };
    let Some(address) = profile.default_address else {
        return Err(
            "No default address on your account. Set one first: aba-cli account address".into(),
        );
    };

    client.cart().fetch().await;
    let Some(cart) = client.cart().state().cart().cloned() else {
        return Err("Your cart is empty.".into());
    };
    if cart.items.is_empty() {
        return Err("Your cart is empty.".into());
    }

    let items = cart
        .items
        .iter()
        .map(|item| OrderItemInput {
            variant_id: item.variant_id,
            quantity: item.quantity,
        })
        .collect();

    let request = PlaceOrderRequest {
        items,
        shipping_address: address.clone(),
        billing_address: address,
        payment_method,
    };

    let confirmation = client.orders().place(&request).await?;

    println!("Order placed: {}", confirmation.order_number);
    if let Some(total) = confirmation.total_amount {
        println!("  Total: {}", Price::naira(total).display());
    }
    if let Some(status) = &confirmation.status {
        println!("  Status: {status}");
    }

    client.cart().fetch().await;
    Ok(())
}

/// List past orders, newest first.
#[allow(clippy::print_stdout)]
pub async fn list(
    client: &StoreClient,
    page: u32,
    size: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if client.auth().profile().is_none() {
        return Err("Sign in to see your orders: aba-cli account login".into());
    }

    let orders = client.orders().history(page, size).await?;

    if orders.content.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }

    for order in &orders.content {
        let status = order.status.as_deref().unwrap_or("-");
        let placed = order
            .created_at
            .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string());
        println!(
            "{}  {}  {}  {}",
            order.order_number,
            placed,
            status,
            Price::naira(order.total_amount).display()
        );
    }
    println!(
        "Page {} of {} ({} orders)",
        orders.number + 1,
        orders.total_pages.max(1),
        orders.total_elements
    );
    Ok(())
}
