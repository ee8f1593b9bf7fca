use std::sync::Arc;

use brassline_catalog::{Category, Configuration, Finish, Material, PricingEngine, Product};
use brassline_core::{
    CartRepository, DocumentRepository, ImageHost, OrderRepository, SnapshotRepository,
    VisitRepository,
};
use brassline_offer::Offer;
use brassline_order::{OrderManager, PricingRules, TransitionPolicy};
use brassline_store::memory::{
    InMemoryCartRepository, InMemoryDocumentRepository, InMemoryOrderRepository,
    InMemorySnapshotRepository, InMemoryVisitRepository,
};
use brassline_store::{
    DbClient, PgCartRepository, PgDocumentRepository, PgOrderRepository, PgSnapshotRepository,
    PgVisitRepository,
};

use crate::tracking::VisitTracker;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub admin_api_key: String,
}

/// Every persistence seam the handlers touch.
#[derive(Clone)]
pub struct Repositories {
    pub categories: Arc<dyn DocumentRepository<Category>>,
    pub products: Arc<dyn DocumentRepository<Product>>,
    pub materials: Arc<dyn DocumentRepository<Material>>,
    pub finishes: Arc<dyn DocumentRepository<Finish>>,
    pub configurations: Arc<dyn DocumentRepository<Configuration>>,
    pub offers: Arc<dyn DocumentRepository<Offer>>,
    pub carts: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub visits: Arc<dyn VisitRepository>,
    pub snapshots: Arc<dyn SnapshotRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            categories: Arc::new(InMemoryDocumentRepository::new()),
            products: Arc::new(InMemoryDocumentRepository::new()),
            materials: Arc::new(InMemoryDocumentRepository::new()),
            finishes: Arc::new(InMemoryDocumentRepository::new()),
            configurations: Arc::new(InMemoryDocumentRepository::new()),
            offers: Arc::new(InMemoryDocumentRepository::new()),
            carts: Arc::new(InMemoryCartRepository::new()),
            orders: Arc::new(InMemoryOrderRepository::new()),
            visits: Arc::new(InMemoryVisitRepository::new()),
            snapshots: Arc::new(InMemorySnapshotRepository::new()),
        }
    }

    pub fn postgres(db: &DbClient) -> Self {
        let pool = db.pool.clone();
        Self {
            categories: Arc::new(PgDocumentRepository::new(pool.clone())),
            products: Arc::new(PgDocumentRepository::new(pool.clone())),
            materials: Arc::new(PgDocumentRepository::new(pool.clone())),
            finishes: Arc::new(PgDocumentRepository::new(pool.clone())),
            configurations: Arc::new(PgDocumentRepository::new(pool.clone())),
            offers: Arc::new(PgDocumentRepository::new(pool.clone())),
            carts: Arc::new(PgCartRepository::new(pool.clone())),
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            visits: Arc::new(PgVisitRepository::new(pool.clone())),
            snapshots: Arc::new(PgSnapshotRepository::new(pool)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub auth: AuthConfig,
    pub pricing: Arc<PricingEngine>,
    pub rules: PricingRules,
    pub orders: Arc<OrderManager>,
    pub cron_secret: String,
    pub max_upload_bytes: usize,
    /// Adds internal error detail to 500 responses
    pub development: bool,
    pub tracker: VisitTracker,
    pub images: Arc<dyn ImageHost>,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        auth: AuthConfig,
        rules: PricingRules,
        policy: TransitionPolicy,
        tracker: VisitTracker,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        Self {
            repos,
            auth,
            pricing: Arc::new(PricingEngine::default()),
            orders: Arc::new(OrderManager::new(rules.clone(), policy)),
            rules,
            cron_secret: String::new(),
            max_upload_bytes: 5 * 1024 * 1024,
            development: false,
            tracker,
            images,
        }
    }

    pub fn with_cron_secret(mut self, secret: impl Into<String>) -> Self {
        self.cron_secret = secret.into();
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }
}
