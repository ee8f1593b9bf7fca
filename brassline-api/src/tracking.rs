use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use brassline_shared::VisitEvent;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;
use uuid::Uuid;

use crate::state::AppState;

/// Header the storefront uses to identify a browser across requests.
pub const VISITOR_HEADER: &str = "x-visitor-id";

/// Non-blocking handle onto the visit queue. Events that do not fit are
/// dropped with a warning.
#[derive(Clone)]
pub struct VisitTracker {
    tx: mpsc::Sender<VisitEvent>,
}

impl VisitTracker {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<VisitEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Returns false when the event was dropped.
    pub fn track(&self, event: VisitEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!("Visit queue full, dropping visit to {}", event.path);
                false
            }
            Err(TrySendError::Closed(event)) => {
                warn!("Visit worker gone, dropping visit to {}", event.path);
                false
            }
        }
    }
}

fn is_tracked(method: &Method, path: &str) -> bool {
    const TRACKED: [&str; 5] = [
        "/api/products",
        "/api/categories",
        "/api/materials",
        "/api/finishes",
        "/api/configurations",
    ];
    method == Method::GET && TRACKED.iter().any(|prefix| path.starts_with(prefix))
}

/// `/api/products/{id}` counts as a product view.
fn product_id(path: &str) -> Option<Uuid> {
    path.strip_prefix("/api/products/")
        .and_then(|rest| Uuid::parse_str(rest.trim_end_matches('/')).ok())
}

fn visit_from_request(req: &Request) -> VisitEvent {
    let path = req.uri().path().to_string();
    let headers = req.headers();
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let mut event = VisitEvent::new(path.clone(), text(VISITOR_HEADER));
    event.user_agent = text(header::USER_AGENT.as_str());
    event.referrer = text(header::REFERER.as_str());
    match product_id(&path) {
        Some(id) => event.with_product(id),
        None => event,
    }
}

/// Records storefront browsing. Never fails or delays the request.
pub async fn track_visits(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if is_tracked(req.method(), req.uri().path()) {
        state.tracker.track(visit_from_request(&req));
    }
    next.run(req).await
}
