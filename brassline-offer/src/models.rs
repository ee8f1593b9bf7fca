use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How much an offer takes off.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "discount_type", rename_all = "snake_case")]
pub enum Discount {
    Percentage { percent: Decimal },
    Fixed { amount_pence: i64 },
}

/// A discount rule, either applied automatically or unlocked by a code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub discount: Discount,
    #[serde(default)]
    pub min_order_pence: i64,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub auto_apply: bool,
    #[serde(default)]
    pub is_stackable: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub times_used: u32,
    #[serde(default)]
    pub applicable_products: Vec<Uuid>,
    #[serde(default)]
    pub applicable_categories: Vec<Uuid>,
    #[serde(default)]
    pub excluded_products: Vec<Uuid>,
    #[serde(default)]
    pub excluded_categories: Vec<Uuid>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Offer {
    pub fn new(name: impl Into<String>, discount: Discount) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            code: None,
            description: None,
            discount,
            min_order_pence: 0,
            priority: 0,
            auto_apply: false,
            is_stackable: false,
            is_active: true,
            starts_at: None,
            ends_at: None,
            usage_limit: None,
            times_used: 0,
            applicable_products: Vec::new(),
            applicable_categories: Vec::new(),
            excluded_products: Vec::new(),
            excluded_categories: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn matches_code(&self, code: &str) -> bool {
        self.code
            .as_deref()
            .is_some_and(|c| c.trim().eq_ignore_ascii_case(code.trim()))
    }

    /// The code as it is compared, trimmed and upper-cased.
    pub fn normalized_code(&self) -> Option<String> {
        self.code.as_deref().map(|c| c.trim().to_ascii_uppercase())
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.starts_at.map_or(true, |s| s <= now)
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.ends_at.is_some_and(|e| e < now)
    }

    pub fn usage_exhausted(&self) -> bool {
        self.usage_limit.is_some_and(|limit| self.times_used >= limit)
    }

    /// Record one checkout that used this offer.
    pub fn record_use(&mut self) {
        self.times_used = self.times_used.saturating_add(1);
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), OfferValidationError> {
        if self.name.trim().is_empty() {
            return Err(OfferValidationError::MissingName);
        }
        match &self.discount {
            Discount::Percentage { percent } => {
                if *percent <= Decimal::ZERO || *percent > Decimal::ONE_HUNDRED {
                    return Err(OfferValidationError::InvalidPercentage(percent.to_string()));
                }
            }
            Discount::Fixed { amount_pence } => {
                if *amount_pence <= 0 {
                    return Err(OfferValidationError::InvalidAmount(*amount_pence));
                }
            }
        }
        if self.min_order_pence < 0 {
            return Err(OfferValidationError::NegativeMinimum);
        }
        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at) {
            if end <= start {
                return Err(OfferValidationError::InvalidWindow);
            }
        }
        if let Some(code) = &self.code {
            if code.trim().is_empty() || code.chars().any(char::is_whitespace) {
                return Err(OfferValidationError::InvalidCode(code.clone()));
            }
        }
        if !self.auto_apply && self.code.is_none() {
            return Err(OfferValidationError::Unreachable);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OfferValidationError {
    #[error("Offer name is required")]
    MissingName,

    #[error("Percentage must be above 0 and at most 100, got {0}")]
    InvalidPercentage(String),

    #[error("Fixed discount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("Minimum order amount cannot be negative")]
    NegativeMinimum,

    #[error("Offer must end after it starts")]
    InvalidWindow,

    #[error("Discount code '{0}' must be non-empty without spaces")]
    InvalidCode(String),

    #[error("Offer needs a code or auto-apply, otherwise nobody can use it")]
    Unreachable,
}
