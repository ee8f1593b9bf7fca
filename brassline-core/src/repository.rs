use async_trait::async_trait;
use brassline_order::{Cart, Order};
use brassline_shared::VisitEvent;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::analytics::DailySnapshot;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{collection} {id} not found")]
    NotFound { collection: &'static str, id: String },

    #[error("{collection} {id} already exists")]
    Conflict { collection: &'static str, id: String },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// A record stored whole, as JSON, under a collection name.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;

    fn set_id(&mut self, id: Uuid);

    /// Field checks run before any write.
    fn validate(&self) -> Result<(), String>;
}

/// Plain CRUD over one document collection
#[async_trait]
pub trait DocumentRepository<T: Document>: Send + Sync {
    async fn insert(&self, doc: &T) -> RepoResult<()>;

    async fn get(&self, id: Uuid) -> RepoResult<Option<T>>;

    async fn list(&self) -> RepoResult<Vec<T>>;

    async fn update(&self, doc: &T) -> RepoResult<()>;

    async fn delete(&self, id: Uuid) -> RepoResult<()>;
}

/// Carts keyed by owner. Saves are last-write-wins.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn get_cart(&self, owner: &str) -> RepoResult<Option<Cart>>;

    async fn save_cart(&self, cart: &Cart) -> RepoResult<()>;

    async fn delete_cart(&self, owner: &str) -> RepoResult<()>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: &Order) -> RepoResult<()>;

    async fn get_order(&self, id: Uuid) -> RepoResult<Option<Order>>;

    /// Newest first. `None` lists every customer's orders.
    async fn list_orders(&self, customer_id: Option<&str>) -> RepoResult<Vec<Order>>;

    /// Orders created in `[from, to)`.
    async fn list_orders_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<Vec<Order>>;

    async fn update_order(&self, order: &Order) -> RepoResult<()>;
}

#[async_trait]
pub trait VisitRepository: Send + Sync {
    async fn record_visit(&self, visit: &VisitEvent) -> RepoResult<()>;

    /// Visits that happened in `[from, to)`.
    async fn list_visits_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<Vec<VisitEvent>>;

    async fn count_visits(&self) -> RepoResult<u64>;
}

/// Stored results of the scheduled analytics aggregation, one per day.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Insert or replace the snapshot for `snapshot.date`.
    async fn save_snapshot(&self, snapshot: &DailySnapshot) -> RepoResult<()>;

    async fn get_snapshot(&self, date: NaiveDate) -> RepoResult<Option<DailySnapshot>>;

    /// Most recent first.
    async fn list_snapshots(&self, limit: usize) -> RepoResult<Vec<DailySnapshot>>;
}
