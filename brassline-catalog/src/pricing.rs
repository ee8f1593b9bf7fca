use serde::{Deserialize, Serialize};

/// Material chosen for a line, with the price of the bare piece.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaterialPrice {
    pub name: String,
    pub base_price_pence: i64,
}

/// A size upgrade offered by a product configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SizeOption {
    pub size_mm: u32,
    pub additional_cost_pence: i64,
}

/// Finish chosen for a line. The adjustment may be negative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinishOption {
    pub name: String,
    pub price_adjustment_pence: i64,
}

/// Everything needed to price one cart or order line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItemConfig {
    pub material: Option<MaterialPrice>,
    pub size: Option<SizeOption>,
    pub finish: Option<FinishOption>,
    #[serde(default)]
    pub packaging_price_pence: i64,
    pub quantity: u32,
}

/// Priced line. Component amounts are per unit and VAT-inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItemPrice {
    pub material_pence: i64,
    pub size_pence: i64,
    pub finish_pence: i64,
    pub packaging_pence: i64,
    pub unit_price_pence: i64,
    pub quantity: u32,
    pub total_price_pence: i64,
}

impl LineItemPrice {
    /// Line totals per component, in `[material, size, finish, packaging]` order.
    pub fn component_totals(&self) -> [i64; 4] {
        let qty = i64::from(self.quantity);
        [
            self.material_pence.saturating_mul(qty),
            self.size_pence.saturating_mul(qty),
            self.finish_pence.saturating_mul(qty),
            self.packaging_pence.saturating_mul(qty),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Largest quantity accepted on a single line
    pub max_quantity: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self { max_quantity: 999 }
    }
}

/// Additive line pricing: material + size + finish + packaging, times quantity.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn price(&self, item: &LineItemConfig) -> Result<LineItemPrice, PricingError> {
        if item.quantity < 1 {
            return Err(PricingError::InvalidQuantity(item.quantity));
        }
        if item.quantity > self.config.max_quantity {
            return Err(PricingError::QuantityTooLarge {
                requested: item.quantity,
                max: self.config.max_quantity,
            });
        }

        let material = item.material.as_ref().ok_or(PricingError::MissingMaterial)?;
        if material.base_price_pence < 0 {
            return Err(PricingError::NegativePrice(format!(
                "material '{}' base price",
                material.name
            )));
        }
        if item.packaging_price_pence < 0 {
            return Err(PricingError::NegativePrice("packaging price".to_string()));
        }

        let size_pence = item.size.as_ref().map_or(0, |s| s.additional_cost_pence);
        if size_pence < 0 {
            return Err(PricingError::NegativePrice("size additional cost".to_string()));
        }
        let finish_pence = item.finish.as_ref().map_or(0, |f| f.price_adjustment_pence);

        let unit_price_pence = material
            .base_price_pence
            .checked_add(size_pence)
            .and_then(|p| p.checked_add(finish_pence))
            .and_then(|p| p.checked_add(item.packaging_price_pence))
            .ok_or(PricingError::Overflow)?;

        if unit_price_pence < 0 {
            return Err(PricingError::NegativePrice("unit price".to_string()));
        }

        let qty = i64::from(item.quantity);
        let total_price_pence = unit_price_pence
            .checked_mul(qty)
            .ok_or(PricingError::Overflow)?;
        // A negative finish can keep the unit price small while a component
        // line total still overflows.
        let components = [
            material.base_price_pence,
            size_pence,
            finish_pence,
            item.packaging_price_pence,
        ];
        for component in components {
            component.checked_mul(qty).ok_or(PricingError::Overflow)?;
        }

        Ok(LineItemPrice {
            material_pence: material.base_price_pence,
            size_pence,
            finish_pence,
            packaging_pence: item.packaging_price_pence,
            unit_price_pence,
            quantity: item.quantity,
            total_price_pence,
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    #[error("Quantity {requested} exceeds the maximum of {max}")]
    QuantityTooLarge { requested: u32, max: u32 },

    #[error("A material with a base price is required")]
    MissingMaterial,

    #[error("Negative {0} is not allowed")]
    NegativePrice(String),

    #[error("Price calculation overflowed")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brass_handle(quantity: u32) -> LineItemConfig {
        LineItemConfig {
            material: Some(MaterialPrice {
                name: "Solid Brass".to_string(),
                base_price_pence: 12_000,
            }),
            size: Some(SizeOption {
                size_mm: 160,
                additional_cost_pence: 1_500,
            }),
            finish: Some(FinishOption {
                name: "Antique Bronze".to_string(),
                price_adjustment_pence: 900,
            }),
            packaging_price_pence: 350,
            quantity,
        }
    }

    #[test]
    fn test_unit_price_is_sum_of_components() {
        let engine = PricingEngine::default();
        let price = engine.price(&brass_handle(3)).unwrap();

        assert_eq!(price.unit_price_pence, 12_000 + 1_500 + 900 + 350);
        assert_eq!(price.total_price_pence, price.unit_price_pence * 3);
        assert_eq!(price.component_totals(), [36_000, 4_500, 2_700, 1_050]);
    }

    #[test]
    fn test_component_overflow_is_rejected() {
        let engine = PricingEngine::default();
        let mut item = brass_handle(3);
        let half = i64::MAX / 2;
        if let Some(material) = item.material.as_mut() {
            material.base_price_pence = half;
        }
        item.finish = Some(FinishOption {
            name: "Trade Allowance".to_string(),
            price_adjustment_pence: -half,
        });

        assert_eq!(engine.price(&item), Err(PricingError::Overflow));

        let price = LineItemPrice {
            material_pence: half,
            size_pence: 0,
            finish_pence: -half,
            packaging_pence: 0,
            unit_price_pence: 0,
            quantity: 3,
            total_price_pence: 0,
        };
        assert_eq!(price.component_totals()[0], i64::MAX);
        assert_eq!(price.component_totals()[2], i64::MIN);
    }

    #[test]
    fn test_optional_components_default_to_zero() {
        let engine = PricingEngine::default();
        let item = LineItemConfig {
            size: None,
            finish: None,
            packaging_price_pence: 0,
            ..brass_handle(1)
        };

        let price = engine.price(&item).unwrap();
        assert_eq!(price.unit_price_pence, 12_000);
        assert_eq!(price.total_price_pence, 12_000);
    }

    #[test]
    fn test_negative_finish_adjustment_reduces_price() {
        let engine = PricingEngine::default();
        let mut item = brass_handle(2);
        item.finish = Some(FinishOption {
            name: "Unlacquered".to_string(),
            price_adjustment_pence: -500,
        });

        let price = engine.price(&item).unwrap();
        assert_eq!(price.unit_price_pence, 12_000 + 1_500 - 500 + 350);
    }

    #[test]
    fn test_rejects_zero_quantity() {
        let engine = PricingEngine::default();
        assert_eq!(
            engine.price(&brass_handle(0)),
            Err(PricingError::InvalidQuantity(0))
        );
    }

    #[test]
    fn test_rejects_quantity_above_limit() {
        let engine = PricingEngine::new(PricingConfig { max_quantity: 10 });
        assert!(matches!(
            engine.price(&brass_handle(11)),
            Err(PricingError::QuantityTooLarge { requested: 11, max: 10 })
        ));
    }

    #[test]
    fn test_rejects_missing_material() {
        let engine = PricingEngine::default();
        let item = LineItemConfig {
            material: None,
            ..brass_handle(1)
        };
        assert_eq!(engine.price(&item), Err(PricingError::MissingMaterial));
    }

    #[test]
    fn test_rejects_negative_unit_price() {
        let engine = PricingEngine::default();
        let mut item = brass_handle(1);
        item.finish = Some(FinishOption {
            name: "Clearance".to_string(),
            price_adjustment_pence: -20_000,
        });
        assert!(matches!(engine.price(&item), Err(PricingError::NegativePrice(_))));
    }
}
