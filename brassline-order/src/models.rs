use brassline_catalog::{ItemSelection, LineItemConfig, LineItemPrice, PriceBreakdown};
use brassline_offer::AppliedDiscount;
use brassline_shared::Masked;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::OrderStatus;

/// Money summary shared by carts and orders. Every figure is VAT-inclusive;
/// `tax_pence` is the VAT contained in `total_pence`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PricingTotals {
    pub subtotal_pence: i64,
    pub discount_pence: i64,
    pub shipping_pence: i64,
    pub tax_pence: i64,
    pub total_pence: i64,
}

/// One configured product in a cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub id: Uuid,
    pub product_name: String,
    pub category_id: Option<Uuid>,
    pub selection: ItemSelection,
    pub config: LineItemConfig,
    pub price: LineItemPrice,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn new(
        product_name: String,
        category_id: Option<Uuid>,
        selection: ItemSelection,
        config: LineItemConfig,
        price: LineItemPrice,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_name,
            category_id,
            selection,
            config,
            price,
            added_at: Utc::now(),
        }
    }

    pub fn quantity(&self) -> u32 {
        self.price.quantity
    }
}

/// A customer's cart, keyed by the token subject that owns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub owner: String,
    pub items: Vec<CartItem>,
    pub applied_discounts: Vec<AppliedDiscount>,
    pub manual_code: Option<String>,
    pub manual_code_locked: bool,
    pub totals: PricingTotals,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShippingAddress {
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub country: String,
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("name", &self.name),
            ("line1", &self.line1),
            ("city", &self.city),
            ("postcode", &self.postcode),
            ("country", &self.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("shipping address {} is required", field));
            }
        }
        Ok(())
    }
}

/// An order line: the cart line frozen at purchase time plus its VAT split.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub selection: ItemSelection,
    pub config: LineItemConfig,
    pub price: LineItemPrice,
    pub breakdown: PriceBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusChange {
    pub from: Option<OrderStatus>,
    pub to: OrderStatus,
    pub actor: String,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

/// Immutable snapshot of a cart at purchase time. Only `status`,
/// `status_history` and `updated_at` change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: String,
    pub customer_email: Option<Masked<String>>,
    pub shipping_address: Masked<ShippingAddress>,
    pub items: Vec<OrderItem>,
    pub applied_discounts: Vec<AppliedDiscount>,
    pub totals: PricingTotals,
    pub status: OrderStatus,
    pub status_history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn belongs_to(&self, customer_id: &str) -> bool {
        self.customer_id == customer_id
    }

    /// VAT summed over the per-component line breakdowns.
    pub fn component_vat_pence(&self) -> i64 {
        self.items.iter().map(|i| i.breakdown.total_vat_pence).sum()
    }
}
