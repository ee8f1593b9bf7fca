use async_trait::async_trait;
use brassline_core::{DailySnapshot, RepoResult, SnapshotRepository, VisitRepository};
use brassline_shared::VisitEvent;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend;

pub struct PgVisitRepository {
    pool: PgPool,
}

impl PgVisitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct VisitRow {
    id: Uuid,
    path: String,
    visitor_id: Option<String>,
    product_id: Option<Uuid>,
    user_agent: Option<String>,
    referrer: Option<String>,
    occurred_at: DateTime<Utc>,
}

impl From<VisitRow> for VisitEvent {
    fn from(row: VisitRow) -> Self {
        VisitEvent {
            id: row.id,
            path: row.path,
            visitor_id: row.visitor_id,
            product_id: row.product_id,
            user_agent: row.user_agent,
            referrer: row.referrer,
            occurred_at: row.occurred_at,
        }
    }
}

#[async_trait]
impl VisitRepository for PgVisitRepository {
    async fn record_visit(&self, visit: &VisitEvent) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO visits (id, path, visitor_id, product_id, user_agent, referrer, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(visit.id)
        .bind(&visit.path)
        .bind(&visit.visitor_id)
        .bind(visit.product_id)
        .bind(&visit.user_agent)
        .bind(&visit.referrer)
        .bind(visit.occurred_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn list_visits_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<Vec<VisitEvent>> {
        let rows = sqlx::query_as::<_, VisitRow>(
            r#"
            SELECT id, path, visitor_id, product_id, user_agent, referrer, occurred_at
            FROM visits
            WHERE occurred_at >= $1 AND occurred_at < $2
            ORDER BY occurred_at
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(VisitEvent::from).collect())
    }

    async fn count_visits(&self) -> RepoResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM visits")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;

        Ok(count.max(0) as u64)
    }
}

pub struct PgSnapshotRepository {
    pool: PgPool,
}

impl PgSnapshotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotRepository for PgSnapshotRepository {
    async fn save_snapshot(&self, snapshot: &DailySnapshot) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO daily_snapshots (date, body, generated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (date) DO UPDATE SET body = EXCLUDED.body, generated_at = EXCLUDED.generated_at
            "#,
        )
        .bind(snapshot.date)
        .bind(Json(snapshot))
        .bind(snapshot.generated_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn get_snapshot(&self, date: NaiveDate) -> RepoResult<Option<DailySnapshot>> {
        let body = sqlx::query_scalar::<_, Json<DailySnapshot>>(
            "SELECT body FROM daily_snapshots WHERE date = $1",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(body.map(|Json(snapshot)| snapshot))
    }

    async fn list_snapshots(&self, limit: usize) -> RepoResult<Vec<DailySnapshot>> {
        let rows = sqlx::query_scalar::<_, Json<DailySnapshot>>(
            "SELECT body FROM daily_snapshots ORDER BY date DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(|Json(snapshot)| snapshot).collect())
    }
}
