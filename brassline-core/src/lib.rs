pub mod repository;
pub mod documents;
pub mod analytics;
pub mod media;

pub use repository::{
    CartRepository, Document, DocumentRepository, OrderRepository, RepoResult, RepositoryError,
    SnapshotRepository, VisitRepository,
};
pub use analytics::{AnalyticsSummary, DailySnapshot};
pub use media::{ImageHost, UploadedImage};
