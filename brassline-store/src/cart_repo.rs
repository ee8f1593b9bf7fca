use async_trait::async_trait;
use brassline_core::{CartRepository, RepoResult};
use brassline_order::Cart;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::backend;

pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn get_cart(&self, owner: &str) -> RepoResult<Option<Cart>> {
        let body = sqlx::query_scalar::<_, Json<Cart>>("SELECT body FROM carts WHERE owner = $1")
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        Ok(body.map(|Json(cart)| cart))
    }

    async fn save_cart(&self, cart: &Cart) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (owner, body, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner) DO UPDATE SET body = EXCLUDED.body, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&cart.owner)
        .bind(Json(cart))
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn delete_cart(&self, owner: &str) -> RepoResult<()> {
        sqlx::query("DELETE FROM carts WHERE owner = $1")
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(())
    }
}
