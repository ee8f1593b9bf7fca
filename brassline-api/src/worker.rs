use std::sync::Arc;

use brassline_core::VisitRepository;
use brassline_shared::VisitEvent;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Drains the visit queue into storage until every sender is dropped.
/// Write failures are logged and the event is lost.
pub async fn run_visit_worker(
    mut rx: mpsc::Receiver<VisitEvent>,
    visits: Arc<dyn VisitRepository>,
) {
    info!("Visit worker started");

    while let Some(event) = rx.recv().await {
        if let Err(e) = visits.record_visit(&event).await {
            error!("Failed to record visit to {}: {}", event.path, e);
        }
    }

    info!("Visit worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use brassline_core::{RepoResult, RepositoryError};
    use brassline_store::memory::InMemoryVisitRepository;
    use chrono::{DateTime, Utc};

    struct FailingVisits;

    #[async_trait]
    impl VisitRepository for FailingVisits {
        async fn record_visit(&self, _visit: &VisitEvent) -> RepoResult<()> {
            Err(RepositoryError::Backend("connection refused".into()))
        }

        async fn list_visits_between(
            &self,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> RepoResult<Vec<VisitEvent>> {
            Ok(vec![])
        }

        async fn count_visits(&self) -> RepoResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_worker_writes_until_senders_drop() {
        let repo = Arc::new(InMemoryVisitRepository::new());
        let (tx, rx) = mpsc::channel(8);
        let worker = tokio::spawn(run_visit_worker(rx, repo.clone()));

        tx.send(VisitEvent::new("/api/products", None)).await.unwrap();
        tx.send(VisitEvent::new("/api/categories", None)).await.unwrap();
        drop(tx);

        worker.await.unwrap();
        assert_eq!(repo.count_visits().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_worker_survives_write_failures() {
        let (tx, rx) = mpsc::channel(8);
        let worker = tokio::spawn(run_visit_worker(rx, Arc::new(FailingVisits)));

        tx.send(VisitEvent::new("/api/products", None)).await.unwrap();
        tx.send(VisitEvent::new("/api/products", None)).await.unwrap();
        drop(tx);

        assert!(worker.await.is_ok());
    }
}
