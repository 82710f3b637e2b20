//! Wire types for the Aba Market storefront API.
//!
//! Field names follow the backend's camelCase JSON. Monetary amounts arrive
//! as backend-computed decimals; the client never derives totals itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use aba_market_core::{CategoryId, OrderId, Price, ProductId, UserId, VariantId};

// =============================================================================
// Cart
// =============================================================================

/// The server-held cart, as last fetched.
///
/// `total_amount` is authoritative; the client displays it as-is to prevent
/// price tampering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total_amount: Decimal,
}

impl Cart {
    /// Sum of line quantities, for badge display.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// The backend total as a displayable price.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::naira(self.total_amount)
    }
}

/// A single cart line.
///
/// `sub_total == quantity * unit_price` is a backend guarantee and is not
/// re-derived here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub variant_id: VariantId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub sub_total: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Body for `POST /v1/cart/add`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub variant_id: VariantId,
    pub quantity: u32,
}

// =============================================================================
// Auth & Profile
// =============================================================================

/// Body for `POST /v1/auth/login`.
///
/// `guest_id` carries the anonymous cart identifier so the backend can merge
/// the guest cart into the user's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<String>,
}

/// Response from `POST /v1/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
}

/// Body for `POST /v1/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// The authenticated user, from `GET /v1/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub default_address: Option<Address>,
}

impl UserProfile {
    /// Full display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A shipping or billing address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street_address: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    pub country: String,
}

/// Body for `PUT /v1/users/me/address`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    pub address: Address,
}

// =============================================================================
// Orders
// =============================================================================

/// Body for `POST /v1/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItemInput>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: PaymentMethod,
}

/// One line of an order request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    BankTransfer,
    CashOnDelivery,
    Card,
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "bank-transfer" => Ok(Self::BankTransfer),
            "cash-on-delivery" => Ok(Self::CashOnDelivery),
            "card" => Ok(Self::Card),
            other => Err(format!(
                "unknown payment method '{other}' (expected bank-transfer, cash-on-delivery or card)"
            )),
        }
    }
}

/// Response from `POST /v1/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_number: String,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One entry of the order history list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    #[serde(default)]
    pub id: Option<OrderId>,
    pub order_number: String,
    #[serde(default)]
    pub status: Option<String>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A page of results, in the backend's page envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    #[serde(default)]
    pub name: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub in_stock: Option<bool>,
}

/// A node of the category tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub children: Vec<Category>,
}

// =============================================================================
// Errors
// =============================================================================

/// Error body shape used by the backend for validation/business failures.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_deserializes_camel_case() {
        let json = serde_json::json!({
            "items": [{
                "variantId": 11,
                "productName": "Ankara Tote",
                "quantity": 2,
                "unitPrice": 2500,
                "subTotal": 5000,
                "imageUrl": "https://cdn.example.com/tote.jpg"
            }],
            "totalAmount": 5000
        });

        let cart: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total_price().display(), "₦5,000");
    }

    #[test]
    fn test_cart_item_count_sums_quantities() {
        let cart = Cart {
            items: vec![
                CartItem {
                    variant_id: VariantId::new(1),
                    product_name: "A".to_string(),
                    quantity: 2,
                    unit_price: Decimal::from(100),
                    sub_total: Decimal::from(200),
                    image_url: None,
                },
                CartItem {
                    variant_id: VariantId::new(2),
                    product_name: "B".to_string(),
                    quantity: 3,
                    unit_price: Decimal::from(50),
                    sub_total: Decimal::from(150),
                    image_url: None,
                },
            ],
            total_amount: Decimal::from(350),
        };
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_login_request_omits_missing_guest_id() {
        let body = LoginRequest {
            username: "ada@example.com".to_string(),
            password: "secret".to_string(),
            guest_id: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("guestId").is_none());

        let body = LoginRequest {
            guest_id: Some("g-123".to_string()),
            ..body
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["guestId"], "g-123");
    }

    #[test]
    fn test_payment_method_wire_format() {
        let json = serde_json::to_value(PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "BANK_TRANSFER");
    }

    #[test]
    fn test_payment_method_from_str() {
        assert_eq!(
            "bank-transfer".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
        assert_eq!(
            "CASH_ON_DELIVERY".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CashOnDelivery
        );
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_page_envelope() {
        let json = serde_json::json!({
            "content": [{
                "orderNumber": "AB-1001",
                "status": "PAID",
                "totalAmount": 7500,
                "createdAt": "2026-02-14T10:00:00Z"
            }],
            "number": 0,
            "totalPages": 3,
            "totalElements": 25
        });

        let page: Page<OrderSummary> = serde_json::from_value(json).unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.total_pages, 3);
        let first = page.content.first().unwrap();
        assert_eq!(first.order_number, "AB-1001");
    }
}
