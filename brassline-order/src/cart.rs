use brassline_catalog::{PricingEngine, PricingError, VatService};
use brassline_offer::{DiscountEvaluator, DiscountLine, DiscountRejection};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Cart, CartItem, PricingTotals};

/// Shop-wide money rules applied when totalling a cart.
#[derive(Debug, Clone)]
pub struct PricingRules {
    pub vat: VatService,
    pub shipping_fee_pence: i64,
    /// Discounted subtotal at or above which shipping is free
    pub free_shipping_threshold_pence: Option<i64>,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            vat: VatService::default(),
            shipping_fee_pence: 0,
            free_shipping_threshold_pence: None,
        }
    }
}

impl PricingRules {
    pub fn totals(&self, subtotal_pence: i64, discount_pence: i64) -> PricingTotals {
        let discount_pence = discount_pence.clamp(0, subtotal_pence.max(0));
        let discounted = subtotal_pence - discount_pence;

        let shipping_pence = if subtotal_pence <= 0 {
            0
        } else if self
            .free_shipping_threshold_pence
            .is_some_and(|threshold| discounted >= threshold)
        {
            0
        } else {
            self.shipping_fee_pence
        };

        let total_pence = discounted + shipping_pence;
        PricingTotals {
            subtotal_pence,
            discount_pence,
            shipping_pence,
            tax_pence: self.vat.vat_of(total_pence),
            total_pence,
        }
    }
}

impl Cart {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            items: Vec::new(),
            applied_discounts: Vec::new(),
            manual_code: None,
            manual_code_locked: false,
            totals: PricingTotals::default(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subtotal_pence(&self) -> i64 {
        self.items.iter().map(|i| i.price.total_price_pence).sum()
    }

    pub fn discount_pence(&self) -> i64 {
        self.applied_discounts.iter().map(|d| d.amount_pence).sum()
    }

    pub fn discount_lines(&self) -> Vec<DiscountLine> {
        self.items
            .iter()
            .map(|i| DiscountLine {
                product_id: i.selection.product_id,
                category_id: i.category_id,
                line_total_pence: i.price.total_price_pence,
            })
            .collect()
    }

    /// Add a line, folding it into an existing line with the same
    /// configuration. Returns the id of the line that holds the item.
    pub fn add_item(&mut self, item: CartItem, engine: &PricingEngine) -> Result<Uuid, CartError> {
        if let Some(existing) = self
            .items
            .iter()
            .position(|i| i.selection.same_configuration(&item.selection))
        {
            let quantity = self.items[existing]
                .quantity()
                .checked_add(item.quantity())
                .ok_or(CartError::Pricing(PricingError::Overflow))?;
            return self.set_line_quantity(existing, quantity, engine);
        }

        let id = item.id;
        self.items.push(item);
        self.touch();
        Ok(id)
    }

    pub fn update_quantity(
        &mut self,
        item_id: Uuid,
        quantity: u32,
        engine: &PricingEngine,
    ) -> Result<Uuid, CartError> {
        let index = self
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or(CartError::ItemNotFound(item_id))?;
        self.set_line_quantity(index, quantity, engine)
    }

    fn set_line_quantity(
        &mut self,
        index: usize,
        quantity: u32,
        engine: &PricingEngine,
    ) -> Result<Uuid, CartError> {
        let line = &mut self.items[index];
        let mut config = line.config.clone();
        config.quantity = quantity;
        let price = engine.price(&config)?;

        line.config = config;
        line.price = price;
        line.selection.quantity = quantity;
        let id = line.id;
        self.touch();
        Ok(id)
    }

    pub fn remove_item(&mut self, item_id: Uuid) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        if self.items.len() == before {
            return Err(CartError::ItemNotFound(item_id));
        }
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.applied_discounts.clear();
        self.manual_code = None;
        self.manual_code_locked = false;
        self.totals = PricingTotals::default();
        self.touch();
    }

    /// Apply a code the customer typed. It replaces any automatic discounts
    /// and locks auto-apply out until the code is removed.
    pub fn apply_code(
        &mut self,
        code: &str,
        evaluator: &DiscountEvaluator,
        rules: &PricingRules,
        now: DateTime<Utc>,
    ) -> Result<(), CartError> {
        if self.is_empty() {
            return Err(CartError::Empty);
        }
        let applied = evaluator.apply_code(code, &self.discount_lines(), now)?;

        self.manual_code = Some(applied.code.clone().unwrap_or_else(|| code.trim().to_string()));
        self.manual_code_locked = true;
        self.applied_discounts = vec![applied];
        self.totals = rules.totals(self.subtotal_pence(), self.discount_pence());
        self.touch();
        Ok(())
    }

    /// Drop the manual code and go back to automatic offers.
    pub fn remove_code(&mut self, evaluator: &DiscountEvaluator, rules: &PricingRules, now: DateTime<Utc>) {
        self.manual_code = None;
        self.manual_code_locked = false;
        self.reprice(evaluator, rules, now);
    }

    /// Recompute discounts and totals after any change to the cart.
    ///
    /// While a manual code is locked in, only that code is re-evaluated; if
    /// it no longer qualifies it stays on the cart with no discount.
    pub fn reprice(&mut self, evaluator: &DiscountEvaluator, rules: &PricingRules, now: DateTime<Utc>) {
        let lines = self.discount_lines();

        self.applied_discounts = match (&self.manual_code, self.manual_code_locked) {
            (Some(code), true) => evaluator
                .apply_code(code, &lines, now)
                .map(|d| vec![d])
                .unwrap_or_default(),
            _ => evaluator.auto_apply(&lines, now),
        };

        self.totals = rules.totals(self.subtotal_pence(), self.discount_pence());
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Cart item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Cart is empty")]
    Empty,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Discount(#[from] DiscountRejection),
}
