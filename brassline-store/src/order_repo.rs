use async_trait::async_trait;
use brassline_core::{OrderRepository, RepoResult, RepositoryError};
use brassline_order::Order;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend;

/// Orders are stored as JSON documents. `customer_id`, `status`,
/// `total_pence` and the timestamps are copied into columns for
/// filtering and reporting.
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_order(&self, order: &Order) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, status, total_pence, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(order.id)
        .bind(&order.customer_id)
        .bind(order.status.as_str())
        .bind(order.totals.total_pence)
        .bind(Json(order))
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict {
                collection: "orders",
                id: order.id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> RepoResult<Option<Order>> {
        let body = sqlx::query_scalar::<_, Json<Order>>("SELECT body FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        Ok(body.map(|Json(order)| order))
    }

    async fn list_orders(&self, customer_id: Option<&str>) -> RepoResult<Vec<Order>> {
        let rows = match customer_id {
            Some(customer_id) => {
                sqlx::query_scalar::<_, Json<Order>>(
                    "SELECT body FROM orders WHERE customer_id = $1 ORDER BY created_at DESC",
                )
                .bind(customer_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_scalar::<_, Json<Order>>(
                    "SELECT body FROM orders ORDER BY created_at DESC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(backend)?;

        Ok(rows.into_iter().map(|Json(order)| order).collect())
    }

    async fn list_orders_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<Vec<Order>> {
        let rows = sqlx::query_scalar::<_, Json<Order>>(
            r#"
            SELECT body FROM orders
            WHERE created_at >= $1 AND created_at < $2
            ORDER BY created_at
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(|Json(order)| order).collect())
    }

    async fn update_order(&self, order: &Order) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, total_pence = $3, body = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(order.id)
        .bind(order.status.as_str())
        .bind(order.totals.total_pence)
        .bind(Json(order))
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                collection: "orders",
                id: order.id.to_string(),
            });
        }
        Ok(())
    }
}
