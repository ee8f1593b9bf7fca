use std::collections::{BTreeMap, HashSet};

use brassline_order::{Order, OrderStatus};
use brassline_shared::VisitEvent;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One day of traffic and sales, produced by the scheduled aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub visits: u64,
    pub unique_visitors: u64,
    pub product_views: u64,
    pub orders: u64,
    pub revenue_pence: i64,
    pub discount_pence: i64,
    pub generated_at: DateTime<Utc>,
}

/// Live dashboard figures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyticsSummary {
    pub total_visits: u64,
    pub total_orders: u64,
    pub revenue_pence: i64,
    pub average_order_value_pence: i64,
    pub orders_by_status: BTreeMap<String, u64>,
}

/// Orders that no longer count towards revenue.
fn counts_as_revenue(order: &Order) -> bool {
    !matches!(
        order.status,
        OrderStatus::Cancelled | OrderStatus::RefundCompleted
    )
}

/// `[start, end)` of a UTC calendar day.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
    (start, next.and_time(chrono::NaiveTime::MIN).and_utc())
}

pub fn aggregate_day(date: NaiveDate, visits: &[VisitEvent], orders: &[Order]) -> DailySnapshot {
    let unique_visitors = visits
        .iter()
        .filter_map(|v| v.visitor_id.as_deref())
        .collect::<HashSet<_>>()
        .len() as u64;

    let counted: Vec<&Order> = orders.iter().filter(|o| counts_as_revenue(o)).collect();

    DailySnapshot {
        date,
        visits: visits.len() as u64,
        unique_visitors,
        product_views: visits.iter().filter(|v| v.product_id.is_some()).count() as u64,
        orders: counted.len() as u64,
        revenue_pence: counted.iter().map(|o| o.totals.total_pence).sum(),
        discount_pence: counted.iter().map(|o| o.totals.discount_pence).sum(),
        generated_at: Utc::now(),
    }
}

pub fn summarize(orders: &[Order], total_visits: u64) -> AnalyticsSummary {
    let mut orders_by_status = BTreeMap::new();
    for order in orders {
        *orders_by_status
            .entry(order.status.as_str().to_string())
            .or_insert(0) += 1;
    }

    let counted: Vec<&Order> = orders.iter().filter(|o| counts_as_revenue(o)).collect();
    let revenue_pence: i64 = counted.iter().map(|o| o.totals.total_pence).sum();
    let average_order_value_pence = if counted.is_empty() {
        0
    } else {
        revenue_pence / counted.len() as i64
    };

    AnalyticsSummary {
        total_visits,
        total_orders: orders.len() as u64,
        revenue_pence,
        average_order_value_pence,
        orders_by_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brassline_order::{PricingTotals, ShippingAddress};
    use brassline_shared::Masked;
    use uuid::Uuid;

    fn order(total_pence: i64, status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            order_number: "BL-TEST".to_string(),
            customer_id: "customer-1".to_string(),
            customer_email: None,
            shipping_address: Masked::new(ShippingAddress {
                name: "A".to_string(),
                line1: "1 Lane".to_string(),
                line2: None,
                city: "Bath".to_string(),
                postcode: "BA1 1AA".to_string(),
                country: "GB".to_string(),
            }),
            items: vec![],
            applied_discounts: vec![],
            totals: PricingTotals {
                subtotal_pence: total_pence,
                discount_pence: 100,
                shipping_pence: 0,
                tax_pence: 0,
                total_pence,
            },
            status,
            status_history: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let (start, end) = day_bounds(date);
        assert_eq!(start.to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-03-02T00:00:00+00:00");
    }

    #[test]
    fn test_aggregate_day_skips_cancelled_revenue() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let visits = vec![
            VisitEvent::new("/api/products", Some("v1".to_string())),
            VisitEvent::new("/api/products", Some("v1".to_string())).with_product(Uuid::new_v4()),
            VisitEvent::new("/api/products", Some("v2".to_string())),
            VisitEvent::new("/api/products", None),
        ];
        let orders = vec![
            order(10_000, OrderStatus::Pending),
            order(5_000, OrderStatus::Cancelled),
        ];

        let snapshot = aggregate_day(date, &visits, &orders);
        assert_eq!(snapshot.visits, 4);
        assert_eq!(snapshot.unique_visitors, 2);
        assert_eq!(snapshot.product_views, 1);
        assert_eq!(snapshot.orders, 1);
        assert_eq!(snapshot.revenue_pence, 10_000);
        assert_eq!(snapshot.discount_pence, 100);
    }

    #[test]
    fn test_summarize() {
        let orders = vec![
            order(10_000, OrderStatus::Delivered),
            order(20_000, OrderStatus::Pending),
            order(7_000, OrderStatus::RefundCompleted),
        ];
        let summary = summarize(&orders, 42);

        assert_eq!(summary.total_visits, 42);
        assert_eq!(summary.total_orders, 3);
        assert_eq!(summary.revenue_pence, 30_000);
        assert_eq!(summary.average_order_value_pence, 15_000);
        assert_eq!(summary.orders_by_status.get("pending"), Some(&1));
        assert_eq!(summary.orders_by_status.get("refund_completed"), Some(&1));
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], 0);
        assert_eq!(summary.average_order_value_pence, 0);
        assert!(summary.orders_by_status.is_empty());
    }
}
