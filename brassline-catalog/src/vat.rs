use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::pricing::LineItemPrice;

/// A VAT-inclusive amount split into its net and VAT parts.
///
/// `net + vat == gross` always holds exactly; rounding only decides where the
/// odd penny lands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VatSplit {
    pub gross_pence: i64,
    pub net_pence: i64,
    pub vat_pence: i64,
}

/// Per-component VAT for one line, VAT computed on each component separately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub rate_percent: Decimal,
    pub material: VatSplit,
    pub size: VatSplit,
    pub finishes: VatSplit,
    pub packaging: VatSplit,
    pub total_gross_pence: i64,
    pub total_net_pence: i64,
    pub total_vat_pence: i64,
}

impl PriceBreakdown {
    /// Difference between the summed component VAT and the VAT of the line
    /// total. Bounded by one penny per component.
    pub fn reconciliation_gap(&self, vat: &VatService) -> i64 {
        self.total_vat_pence - vat.vat_of(self.total_gross_pence)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VatService {
    rate_percent: Decimal,
}

impl Default for VatService {
    fn default() -> Self {
        Self {
            rate_percent: Decimal::from(VatService::DEFAULT_RATE_PERCENT),
        }
    }
}

impl VatService {
    pub const DEFAULT_RATE_PERCENT: i64 = 20;

    pub fn new(rate_percent: Decimal) -> Result<Self, VatError> {
        if rate_percent.is_sign_negative() || rate_percent > Decimal::ONE_HUNDRED {
            return Err(VatError::InvalidRate(rate_percent.to_string()));
        }
        Ok(Self { rate_percent })
    }

    pub fn from_percent_f64(rate_percent: f64) -> Result<Self, VatError> {
        let rate = Decimal::from_f64(rate_percent)
            .ok_or_else(|| VatError::InvalidRate(rate_percent.to_string()))?;
        Self::new(rate.normalize())
    }

    pub fn rate_percent(&self) -> Decimal {
        self.rate_percent
    }

    /// Extract VAT from a VAT-inclusive amount: `net = gross / (1 + R)`,
    /// rounded half-up to the penny, `vat = gross - net`.
    pub fn split(&self, gross_pence: i64) -> VatSplit {
        let divisor = Decimal::ONE + self.rate_percent / Decimal::ONE_HUNDRED;
        let net_pence = Decimal::from(gross_pence)
            .checked_div(divisor)
            .map(|net| net.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|net| net.to_i64())
            .unwrap_or(gross_pence);

        VatSplit {
            gross_pence,
            net_pence,
            vat_pence: gross_pence - net_pence,
        }
    }

    pub fn vat_of(&self, gross_pence: i64) -> i64 {
        self.split(gross_pence).vat_pence
    }

    pub fn breakdown(&self, price: &LineItemPrice) -> PriceBreakdown {
        let [material, size, finishes, packaging] = price.component_totals().map(|c| self.split(c));
        let parts = [material, size, finishes, packaging];

        PriceBreakdown {
            rate_percent: self.rate_percent,
            material,
            size,
            finishes,
            packaging,
            total_gross_pence: parts.iter().map(|p| p.gross_pence).sum(),
            total_net_pence: parts.iter().map(|p| p.net_pence).sum(),
            total_vat_pence: parts.iter().map(|p| p.vat_pence).sum(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VatError {
    #[error("VAT rate must be between 0 and 100 percent, got {0}")]
    InvalidRate(String),
}
