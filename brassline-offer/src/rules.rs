use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Discount, Offer};

/// The parts of a cart line that discount scoping looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountLine {
    pub product_id: Uuid,
    pub category_id: Option<Uuid>,
    pub line_total_pence: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountSource {
    Auto,
    Code,
}

/// A discount as applied to a particular cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppliedDiscount {
    pub offer_id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub source: DiscountSource,
    pub amount_pence: i64,
}

/// Why a code (or offer) does not apply to a cart.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DiscountRejection {
    #[error("Discount code not recognised")]
    UnknownCode,

    #[error("Offer is not active")]
    Inactive,

    #[error("Offer has not started yet")]
    NotStarted,

    #[error("Offer has expired")]
    Expired,

    #[error("Offer has reached its usage limit")]
    UsageExhausted,

    #[error("Order must be at least {min_order_pence}p to use this offer")]
    BelowMinimum { min_order_pence: i64 },

    #[error("Offer does not apply to any item in the cart")]
    NotApplicable,
}

/// Picks and sizes the discounts for a cart.
///
/// Offers are kept ordered by priority (highest first), ties going to the
/// oldest offer.
pub struct DiscountEvaluator {
    offers: Vec<Offer>,
}

impl DiscountEvaluator {
    pub fn new(offers: Vec<Offer>) -> Self {
        let mut offers = offers;
        offers.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Self { offers }
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    /// Automatic discounts for a cart.
    ///
    /// The best eligible offer always applies. If it is stackable, later
    /// stackable offers apply too, each on what is left after the previous
    /// ones, so the total never exceeds the subtotal.
    pub fn auto_apply(&self, lines: &[DiscountLine], now: DateTime<Utc>) -> Vec<AppliedDiscount> {
        let subtotal = subtotal(lines);
        let mut applied: Vec<AppliedDiscount> = Vec::new();
        let mut already_discounted = 0;

        for offer in self.offers.iter().filter(|o| o.auto_apply) {
            if check_eligibility(offer, lines, subtotal, now).is_err() {
                continue;
            }
            if !applied.is_empty() && !offer.is_stackable {
                continue;
            }

            let base = (scoped_subtotal(offer, lines) - already_discounted).max(0);
            let amount = discount_amount(&offer.discount, base);
            if amount == 0 {
                continue;
            }

            already_discounted += amount;
            applied.push(AppliedDiscount {
                offer_id: offer.id,
                name: offer.name.clone(),
                code: offer.code.clone(),
                source: DiscountSource::Auto,
                amount_pence: amount,
            });

            if !offer.is_stackable {
                break;
            }
        }

        applied
    }

    /// Size the discount for a code a customer typed in.
    pub fn apply_code(
        &self,
        code: &str,
        lines: &[DiscountLine],
        now: DateTime<Utc>,
    ) -> Result<AppliedDiscount, DiscountRejection> {
        let offer = self
            .offers
            .iter()
            .find(|o| o.matches_code(code))
            .ok_or(DiscountRejection::UnknownCode)?;

        check_eligibility(offer, lines, subtotal(lines), now)?;

        Ok(AppliedDiscount {
            offer_id: offer.id,
            name: offer.name.clone(),
            code: offer.code.clone(),
            source: DiscountSource::Code,
            amount_pence: discount_amount(&offer.discount, scoped_subtotal(offer, lines)),
        })
    }
}

pub fn subtotal(lines: &[DiscountLine]) -> i64 {
    lines.iter().map(|l| l.line_total_pence).sum()
}

/// Whether an offer covers a cart line.
pub fn in_scope(offer: &Offer, line: &DiscountLine) -> bool {
    if offer.excluded_products.contains(&line.product_id) {
        return false;
    }
    if let Some(category) = line.category_id {
        if offer.excluded_categories.contains(&category) {
            return false;
        }
    }
    if offer.applicable_products.is_empty() && offer.applicable_categories.is_empty() {
        return true;
    }
    offer.applicable_products.contains(&line.product_id)
        || line
            .category_id
            .is_some_and(|c| offer.applicable_categories.contains(&c))
}

pub fn scoped_subtotal(offer: &Offer, lines: &[DiscountLine]) -> i64 {
    lines
        .iter()
        .filter(|l| in_scope(offer, l))
        .map(|l| l.line_total_pence)
        .sum()
}

pub fn check_eligibility(
    offer: &Offer,
    lines: &[DiscountLine],
    subtotal: i64,
    now: DateTime<Utc>,
) -> Result<(), DiscountRejection> {
    if !offer.is_active {
        return Err(DiscountRejection::Inactive);
    }
    if !offer.has_started(now) {
        return Err(DiscountRejection::NotStarted);
    }
    if offer.has_ended(now) {
        return Err(DiscountRejection::Expired);
    }
    if offer.usage_exhausted() {
        return Err(DiscountRejection::UsageExhausted);
    }
    if subtotal < offer.min_order_pence {
        return Err(DiscountRejection::BelowMinimum {
            min_order_pence: offer.min_order_pence,
        });
    }
    if !lines.iter().any(|l| in_scope(offer, l)) {
        return Err(DiscountRejection::NotApplicable);
    }
    Ok(())
}

/// Amount taken off `base`, never more than `base`.
pub fn discount_amount(discount: &Discount, base: i64) -> i64 {
    if base <= 0 {
        return 0;
    }
    let amount = match discount {
        Discount::Percentage { percent } => (Decimal::from(base) * *percent / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(base),
        Discount::Fixed { amount_pence } => *amount_pence,
    };
    amount.clamp(0, base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn line(total: i64) -> DiscountLine {
        DiscountLine {
            product_id: Uuid::new_v4(),
            category_id: None,
            line_total_pence: total,
        }
    }

    fn percent_offer(percent: i64, min_order_pence: i64) -> Offer {
        let mut offer = Offer::new(
            format!("{}% off", percent),
            Discount::Percentage {
                percent: Decimal::from(percent),
            },
        );
        offer.auto_apply = true;
        offer.min_order_pence = min_order_pence;
        offer
    }

    fn fixed_offer(amount_pence: i64) -> Offer {
        let mut offer = Offer::new("Fixed", Discount::Fixed { amount_pence });
        offer.auto_apply = true;
        offer
    }

    #[test]
    fn test_ten_percent_over_threshold() {
        let evaluator = DiscountEvaluator::new(vec![percent_offer(10, 10_000)]);
        let applied = evaluator.auto_apply(&[line(15_000)], Utc::now());

        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].amount_pence, 1_500);
        assert_eq!(applied[0].source, DiscountSource::Auto);
    }

    #[test]
    fn test_below_threshold_not_applied() {
        let evaluator = DiscountEvaluator::new(vec![percent_offer(10, 10_000)]);
        assert!(evaluator.auto_apply(&[line(5_000)], Utc::now()).is_empty());
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let evaluator = DiscountEvaluator::new(vec![fixed_offer(2_000)]);
        let applied = evaluator.auto_apply(&[line(1_500)], Utc::now());
        assert_eq!(applied[0].amount_pence, 1_500);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(
            discount_amount(&Discount::Percentage { percent: Decimal::from(10) }, 1_005),
            101
        );
        assert_eq!(
            discount_amount(&Discount::Percentage { percent: Decimal::ONE_HUNDRED }, 999),
            999
        );
    }

    #[test]
    fn test_highest_priority_wins_when_not_stackable() {
        let mut low = percent_offer(5, 0);
        low.priority = 1;
        let mut high = percent_offer(20, 0);
        high.priority = 10;

        let evaluator = DiscountEvaluator::new(vec![low, high.clone()]);
        let applied = evaluator.auto_apply(&[line(10_000)], Utc::now());

        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].offer_id, high.id);
        assert_eq!(applied[0].amount_pence, 2_000);
    }

    #[test]
    fn test_priority_tie_goes_to_oldest() {
        let mut newer = percent_offer(15, 0);
        let mut older = percent_offer(10, 0);
        older.created_at = Utc::now() - Duration::days(3);
        newer.created_at = Utc::now();

        let evaluator = DiscountEvaluator::new(vec![newer, older.clone()]);
        let applied = evaluator.auto_apply(&[line(10_000)], Utc::now());
        assert_eq!(applied[0].offer_id, older.id);
    }

    #[test]
    fn test_stackable_offers_apply_in_priority_order() {
        let mut first = percent_offer(10, 0);
        first.priority = 10;
        first.is_stackable = true;
        let mut second = fixed_offer(500);
        second.priority = 5;
        second.is_stackable = true;
        let mut loner = percent_offer(50, 0);
        loner.priority = 1;

        let evaluator = DiscountEvaluator::new(vec![loner, second, first]);
        let applied = evaluator.auto_apply(&[line(10_000)], Utc::now());

        let amounts: Vec<i64> = applied.iter().map(|a| a.amount_pence).collect();
        assert_eq!(amounts, vec![1_000, 500]);
    }

    #[test]
    fn test_stacked_discounts_never_exceed_subtotal() {
        let mut a = fixed_offer(800);
        a.is_stackable = true;
        a.priority = 2;
        let mut b = fixed_offer(800);
        b.is_stackable = true;
        b.priority = 1;

        let evaluator = DiscountEvaluator::new(vec![a, b]);
        let applied = evaluator.auto_apply(&[line(1_000)], Utc::now());
        let total: i64 = applied.iter().map(|d| d.amount_pence).sum();
        assert_eq!(total, 1_000);
    }

    #[test]
    fn test_scope_limits_base_to_matching_lines() {
        let category = Uuid::new_v4();
        let mut offer = percent_offer(10, 0);
        offer.applicable_categories = vec![category];

        let mut knob = line(4_000);
        knob.category_id = Some(category);
        let hinge = line(6_000);

        let evaluator = DiscountEvaluator::new(vec![offer]);
        let applied = evaluator.auto_apply(&[knob, hinge.clone()], Utc::now());
        assert_eq!(applied[0].amount_pence, 400);

        assert!(evaluator.auto_apply(&[hinge], Utc::now()).is_empty());
    }

    #[test]
    fn test_excluded_products_are_out_of_scope() {
        let excluded = line(5_000);
        let mut offer = percent_offer(10, 0);
        offer.excluded_products = vec![excluded.product_id];

        let evaluator = DiscountEvaluator::new(vec![offer]);
        let applied = evaluator.auto_apply(&[excluded, line(2_000)], Utc::now());
        assert_eq!(applied[0].amount_pence, 200);
    }

    #[test]
    fn test_inactive_and_expired_offers_skipped() {
        let mut inactive = percent_offer(10, 0);
        inactive.is_active = false;
        let mut expired = percent_offer(20, 0);
        expired.ends_at = Some(Utc::now() - Duration::hours(1));

        let evaluator = DiscountEvaluator::new(vec![inactive, expired]);
        assert!(evaluator.auto_apply(&[line(10_000)], Utc::now()).is_empty());
    }

    #[test]
    fn test_manual_only_offers_not_auto_applied() {
        let mut offer = percent_offer(10, 0);
        offer.auto_apply = false;
        offer.code = Some("TRADE10".to_string());

        let evaluator = DiscountEvaluator::new(vec![offer]);
        assert!(evaluator.auto_apply(&[line(10_000)], Utc::now()).is_empty());

        let applied = evaluator.apply_code("trade10", &[line(10_000)], Utc::now()).unwrap();
        assert_eq!(applied.amount_pence, 1_000);
        assert_eq!(applied.source, DiscountSource::Code);
    }

    #[test]
    fn test_code_rejections() {
        let mut offer = percent_offer(10, 10_000);
        offer.code = Some("TRADE10".to_string());
        let evaluator = DiscountEvaluator::new(vec![offer]);

        assert_eq!(
            evaluator.apply_code("NOPE", &[line(20_000)], Utc::now()),
            Err(DiscountRejection::UnknownCode)
        );
        assert_eq!(
            evaluator.apply_code("TRADE10", &[line(5_000)], Utc::now()),
            Err(DiscountRejection::BelowMinimum { min_order_pence: 10_000 })
        );
    }
}
