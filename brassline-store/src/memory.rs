//! Process-local repositories, used when no database URL is configured and
//! by the API tests.

use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;

use async_trait::async_trait;
use brassline_core::{
    CartRepository, DailySnapshot, Document, DocumentRepository, OrderRepository, RepoResult,
    RepositoryError, SnapshotRepository, VisitRepository,
};
use brassline_order::{Cart, Order};
use brassline_shared::VisitEvent;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Insertion-ordered so `list` is stable.
pub struct InMemoryDocumentRepository<T> {
    docs: RwLock<Vec<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> InMemoryDocumentRepository<T> {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for InMemoryDocumentRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Document> DocumentRepository<T> for InMemoryDocumentRepository<T> {
    async fn insert(&self, doc: &T) -> RepoResult<()> {
        let mut docs = self.docs.write().await;
        if docs.iter().any(|d| d.id() == doc.id()) {
            return Err(RepositoryError::Conflict {
                collection: T::COLLECTION,
                id: doc.id().to_string(),
            });
        }
        docs.push(doc.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<T>> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|d| d.id() == id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<T>> {
        Ok(self.docs.read().await.clone())
    }

    async fn update(&self, doc: &T) -> RepoResult<()> {
        let mut docs = self.docs.write().await;
        match docs.iter_mut().find(|d| d.id() == doc.id()) {
            Some(existing) => {
                *existing = doc.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound {
                collection: T::COLLECTION,
                id: doc.id().to_string(),
            }),
        }
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| d.id() != id);
        if docs.len() == before {
            return Err(RepositoryError::NotFound {
                collection: T::COLLECTION,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCartRepository {
    carts: RwLock<HashMap<String, Cart>>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn get_cart(&self, owner: &str) -> RepoResult<Option<Cart>> {
        Ok(self.carts.read().await.get(owner).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> RepoResult<()> {
        self.carts
            .write()
            .await
            .insert(cart.owner.clone(), cart.clone());
        Ok(())
    }

    async fn delete_cart(&self, owner: &str) -> RepoResult<()> {
        self.carts.write().await.remove(owner);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create_order(&self, order: &Order) -> RepoResult<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(RepositoryError::Conflict {
                collection: "orders",
                id: order.id.to_string(),
            });
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> RepoResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_orders(&self, customer_id: Option<&str>) -> RepoResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let matching = orders
            .values()
            .filter(|o| customer_id.map_or(true, |c| o.customer_id == c))
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn list_orders_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|o| o.created_at >= from && o.created_at < to)
            .cloned()
            .collect();
        matching.sort_by_key(|o| o.created_at);
        Ok(matching)
    }

    async fn update_order(&self, order: &Order) -> RepoResult<()> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound {
                collection: "orders",
                id: order.id.to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct InMemoryVisitRepository {
    visits: RwLock<Vec<VisitEvent>>,
}

impl InMemoryVisitRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VisitRepository for InMemoryVisitRepository {
    async fn record_visit(&self, visit: &VisitEvent) -> RepoResult<()> {
        self.visits.write().await.push(visit.clone());
        Ok(())
    }

    async fn list_visits_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<Vec<VisitEvent>> {
        let visits = self.visits.read().await;
        Ok(visits
            .iter()
            .filter(|v| v.occurred_at >= from && v.occurred_at < to)
            .cloned()
            .collect())
    }

    async fn count_visits(&self) -> RepoResult<u64> {
        Ok(self.visits.read().await.len() as u64)
    }
}

#[derive(Default)]
pub struct InMemorySnapshotRepository {
    snapshots: RwLock<BTreeMap<NaiveDate, DailySnapshot>>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshotRepository {
    async fn save_snapshot(&self, snapshot: &DailySnapshot) -> RepoResult<()> {
        self.snapshots
            .write()
            .await
            .insert(snapshot.date, snapshot.clone());
        Ok(())
    }

    async fn get_snapshot(&self, date: NaiveDate) -> RepoResult<Option<DailySnapshot>> {
        Ok(self.snapshots.read().await.get(&date).cloned())
    }

    async fn list_snapshots(&self, limit: usize) -> RepoResult<Vec<DailySnapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.values().rev().take(limit).cloned().collect())
    }
}
