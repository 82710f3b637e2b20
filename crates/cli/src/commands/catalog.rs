//! Catalog browsing commands.

use aba_market_client::StoreClient;
use aba_market_client::types::{Category, Product};
use aba_market_core::{Price, ProductId};

/// List all products.
#[allow(clippy::print_stdout)]
pub async fn list_products(client: &StoreClient) -> Result<(), Box<dyn std::error::Error>> {
    let products = client.catalog().products().await?;

    if products.is_empty() {
        println!("No products available.");
        return Ok(());
    }

    for product in products.iter() {
        print_product_line(product);
    }
    Ok(())
}

/// Show one product with its variants.
#[allow(clippy::print_stdout)]
pub async fn show_product(
    client: &StoreClient,
    id: ProductId,
) -> Result<(), Box<dyn std::error::Error>> {
    let product = client.catalog().product(id).await?;

    println!("{} (#{})", product.name, product.id);
    println!("  Price: {}", Price::naira(product.price).display());
    if let Some(category) = &product.category {
        println!("  Category: {category}");
    }
    if let Some(description) = &product.description {
        println!("  {description}");
    }
    if !product.variants.is_empty() {
        println!("  Variants:");
        for variant in &product.variants {
            let name = variant.name.as_deref().unwrap_or("default");
            let stock = match variant.in_stock {
                Some(false) => " (out of stock)",
                _ => "",
            };
            println!(
                "    [{}] {} - {}{stock}",
                variant.id,
                name,
                Price::naira(variant.price).display()
            );
        }
    }
    Ok(())
}

/// Full-text product search.
#[allow(clippy::print_stdout)]
pub async fn search_products(
    client: &StoreClient,
    query: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let products = client.catalog().search(query).await?;

    if products.is_empty() {
        println!("No products matched '{query}'.");
        return Ok(());
    }

    for product in &products {
        print_product_line(product);
    }
    Ok(())
}

/// Show the category tree.
#[allow(clippy::print_stdout)]
pub async fn show_categories(client: &StoreClient) -> Result<(), Box<dyn std::error::Error>> {
    let categories = client.catalog().categories().await?;

    if categories.is_empty() {
        println!("No categories available.");
        return Ok(());
    }

    for category in categories.iter() {
        print_category(category, 0);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_product_line(product: &Product) {
    println!(
        "[{}] {} - {}",
        product.id,
        product.name,
        Price::naira(product.price).display()
    );
}

#[allow(clippy::print_stdout)]
fn print_category(category: &Category, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{indent}{} (#{})", category.name, category.id);
    for child in &category.children {
        print_category(child, depth + 1);
    }
}
