use std::marker::PhantomData;

use async_trait::async_trait;
use brassline_core::{Document, DocumentRepository, RepoResult, RepositoryError};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend;

/// Every catalog collection shares the `documents` table, keyed by
/// `(collection, id)`.
pub struct PgDocumentRepository<T> {
    pool: PgPool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PgDocumentRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Document> DocumentRepository<T> for PgDocumentRepository<T> {
    async fn insert(&self, doc: &T) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(T::COLLECTION)
        .bind(doc.id())
        .bind(Json(doc))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict {
                collection: T::COLLECTION,
                id: doc.id().to_string(),
            });
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<T>> {
        let body = sqlx::query_scalar::<_, Json<T>>(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(T::COLLECTION)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(body.map(|Json(doc)| doc))
    }

    async fn list(&self) -> RepoResult<Vec<T>> {
        let rows = sqlx::query_scalar::<_, Json<T>>(
            "SELECT body FROM documents WHERE collection = $1 ORDER BY created_at",
        )
        .bind(T::COLLECTION)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn update(&self, doc: &T) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE documents SET body = $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(T::COLLECTION)
        .bind(doc.id())
        .bind(Json(doc))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                collection: T::COLLECTION,
                id: doc.id().to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(T::COLLECTION)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                collection: T::COLLECTION,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
