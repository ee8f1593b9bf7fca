use brassline_shared::Masked;
use chrono::Utc;
use uuid::Uuid;

use crate::cart::PricingRules;
use crate::models::{Cart, Order, OrderItem, ShippingAddress, StatusChange};
use crate::status::{OrderStatus, TransitionPolicy};

/// Turns carts into orders and moves orders through their lifecycle
pub struct OrderManager {
    rules: PricingRules,
    policy: TransitionPolicy,
}

impl OrderManager {
    pub fn new(rules: PricingRules, policy: TransitionPolicy) -> Self {
        Self { rules, policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Snapshot a repriced cart into a new `pending` order.
    ///
    /// Totals are recomputed from the cart lines and the discounts already on
    /// the cart, so a stale `cart.totals` cannot leak into the order.
    pub fn place_order(
        &self,
        cart: &Cart,
        customer_email: Option<String>,
        shipping_address: ShippingAddress,
    ) -> Result<Order, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        shipping_address
            .validate()
            .map_err(OrderError::InvalidAddress)?;

        let id = Uuid::new_v4();
        let items = cart
            .items
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4(),
                product_id: line.selection.product_id,
                product_name: line.product_name.clone(),
                selection: line.selection.clone(),
                config: line.config.clone(),
                price: line.price,
                breakdown: self.rules.vat.breakdown(&line.price),
            })
            .collect();

        let now = Utc::now();
        Ok(Order {
            id,
            order_number: order_number(id),
            customer_id: cart.owner.clone(),
            customer_email: customer_email.map(Masked::new),
            shipping_address: Masked::new(shipping_address),
            items,
            applied_discounts: cart.applied_discounts.clone(),
            totals: self.rules.totals(cart.subtotal_pence(), cart.discount_pence()),
            status: OrderStatus::Pending,
            status_history: vec![StatusChange {
                from: None,
                to: OrderStatus::Pending,
                actor: cart.owner.clone(),
                note: Some("Order placed".to_string()),
                at: now,
            }],
            created_at: now,
            updated_at: now,
        })
    }

    /// Admin status update, checked according to the configured policy.
    pub fn set_status(
        &self,
        order: &mut Order,
        to: OrderStatus,
        actor: &str,
        note: Option<String>,
    ) -> Result<(), OrderError> {
        if !self.policy.permits(order.status, to) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to,
            });
        }
        apply_status(order, to, actor, note);
        Ok(())
    }

    /// Customer refund request. Always follows the transition table, so it
    /// only works on delivered orders.
    pub fn request_refund(
        &self,
        order: &mut Order,
        actor: &str,
        reason: Option<String>,
    ) -> Result<(), OrderError> {
        if !order.status.can_transition_to(OrderStatus::RefundRequested) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::RefundRequested,
            });
        }
        apply_status(order, OrderStatus::RefundRequested, actor, reason);
        Ok(())
    }
}

fn apply_status(order: &mut Order, to: OrderStatus, actor: &str, note: Option<String>) {
    let now = Utc::now();
    order.status_history.push(StatusChange {
        from: Some(order.status),
        to,
        actor: actor.to_string(),
        note,
        at: now,
    });
    order.status = to;
    order.updated_at = now;
}

fn order_number(id: Uuid) -> String {
    let short: String = id.simple().to_string().chars().take(8).collect();
    format!("BL-{}", short.to_uppercase())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("Cannot place an order from an empty cart")]
    EmptyCart,

    #[error("Invalid shipping address: {0}")]
    InvalidAddress(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CartItem;
    use brassline_catalog::{
        FinishOption, ItemSelection, LineItemConfig, MaterialPrice, PricingEngine, SizeOption,
    };

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "A. Customer".to_string(),
            line1: "1 Foundry Lane".to_string(),
            line2: None,
            city: "Birmingham".to_string(),
            postcode: "B1 1AA".to_string(),
            country: "GB".to_string(),
        }
    }

    fn cart_with_item() -> Cart {
        let engine = PricingEngine::default();
        let config = LineItemConfig {
            material: Some(MaterialPrice {
                name: "Solid Brass".to_string(),
                base_price_pence: 12_000,
            }),
            size: Some(SizeOption {
                size_mm: 160,
                additional_cost_pence: 1_500,
            }),
            finish: Some(FinishOption {
                name: "Antique Bronze".to_string(),
                price_adjustment_pence: 900,
            }),
            packaging_price_pence: 350,
            quantity: 3,
        };
        let selection = ItemSelection {
            product_id: Uuid::new_v4(),
            material_id: Uuid::new_v4(),
            size_mm: Some(160),
            finish_id: Some(Uuid::new_v4()),
            packaging: None,
            quantity: 3,
        };
        let price = engine.price(&config).unwrap();

        let mut cart = Cart::new("customer-1");
        cart.add_item(
            CartItem::new("Pull Handle".to_string(), None, selection, config, price),
            &engine,
        )
        .unwrap();
        cart
    }

    fn manager(policy: TransitionPolicy) -> OrderManager {
        OrderManager::new(PricingRules::default(), policy)
    }

    #[test]
    fn test_place_order_snapshots_cart() {
        let cart = cart_with_item();
        let order = manager(TransitionPolicy::Permissive)
            .place_order(&cart, Some("buyer@example.com".to_string()), address())
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.status_history.len(), 1);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.totals.subtotal_pence, 44_250);
        assert_eq!(order.totals.total_pence, 44_250);
        assert_eq!(order.items[0].breakdown.total_vat_pence, 7_375);
        assert_eq!(order.component_vat_pence(), order.totals.tax_pence);
        assert!(order.order_number.starts_with("BL-"));
        assert_eq!(format!("{:?}", order.customer_email), "Some(********)");
    }

    #[test]
    fn test_place_order_rejects_empty_cart_and_bad_address() {
        let m = manager(TransitionPolicy::Permissive);
        assert_eq!(
            m.place_order(&Cart::new("customer-1"), None, address()).unwrap_err(),
            OrderError::EmptyCart
        );

        let mut bad = address();
        bad.postcode = " ".to_string();
        assert!(matches!(
            m.place_order(&cart_with_item(), None, bad),
            Err(OrderError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_strict_lifecycle() {
        let m = manager(TransitionPolicy::Strict);
        let mut order = m.place_order(&cart_with_item(), None, address()).unwrap();

        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            m.set_status(&mut order, next, "admin-1", None).unwrap();
        }
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.status_history.len(), 5);

        let err = m.set_status(&mut order, OrderStatus::Pending, "admin-1", None).unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending
            }
        );
    }

    // Current shop behaviour: any admin may set any status. This is a known
    // gap, not a guarantee; Strict mode closes it.
    #[test]
    fn test_permissive_accepts_any_admin_sequence() {
        let m = manager(TransitionPolicy::Permissive);
        let mut order = m.place_order(&cart_with_item(), None, address()).unwrap();

        let sequence = [
            OrderStatus::Delivered,
            OrderStatus::Pending,
            OrderStatus::RefundCompleted,
            OrderStatus::Shipped,
            OrderStatus::Cancelled,
            OrderStatus::Processing,
        ];
        for status in sequence {
            m.set_status(&mut order, status, "admin-1", Some("manual".to_string())).unwrap();
            assert_eq!(order.status, status);
        }
        assert_eq!(order.status_history.len(), 1 + sequence.len());
        assert_eq!(order.status_history[2].from, Some(OrderStatus::Delivered));
    }

    #[test]
    fn test_refund_request_requires_delivery() {
        let m = manager(TransitionPolicy::Permissive);
        let mut order = m.place_order(&cart_with_item(), None, address()).unwrap();

        assert!(m.request_refund(&mut order, "customer-1", None).is_err());

        m.set_status(&mut order, OrderStatus::Delivered, "admin-1", None).unwrap();
        m.request_refund(&mut order, "customer-1", Some("Wrong finish".to_string())).unwrap();
        assert_eq!(order.status, OrderStatus::RefundRequested);
    }
}
