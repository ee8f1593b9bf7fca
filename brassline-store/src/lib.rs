pub mod app_config;
pub mod database;
pub mod document_repo;
pub mod cart_repo;
pub mod order_repo;
pub mod visit_repo;
pub mod memory;
pub mod media;

pub use database::DbClient;
pub use document_repo::PgDocumentRepository;
pub use cart_repo::PgCartRepository;
pub use order_repo::PgOrderRepository;
pub use visit_repo::{PgSnapshotRepository, PgVisitRepository};
pub use media::{CdnImageHost, InMemoryImageHost};
pub use memory::{
    InMemoryCartRepository, InMemoryDocumentRepository, InMemoryOrderRepository,
    InMemorySnapshotRepository, InMemoryVisitRepository,
};

use brassline_core::RepositoryError;

pub(crate) fn backend(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Backend(err.to_string())
}
