use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A page or product view, recorded off the request path.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct VisitEvent {
    pub id: Uuid,
    pub path: String,
    pub visitor_id: Option<String>,
    pub product_id: Option<Uuid>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl VisitEvent {
    pub fn new(path: impl Into<String>, visitor_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            visitor_id,
            product_id: None,
            user_agent: None,
            referrer: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_product(mut self, product_id: Uuid) -> Self {
        self.product_id = Some(product_id);
        self
    }
}
