use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::{FinishOption, LineItemConfig, MaterialPrice, SizeOption};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackagingOption {
    pub name: String,
    pub price_pence: i64,
}

/// A sellable piece of hardware. Prices live on its `Configuration`s, one per
/// material it is made in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    #[serde(default)]
    pub finish_ids: Vec<Uuid>,
    #[serde(default)]
    pub packaging_options: Vec<PackagingOption>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Material {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finish {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub price_adjustment_pence: i64,
    pub image_url: Option<String>,
}

/// Price list for one product in one material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Configuration {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub product_id: Uuid,
    pub material_id: Uuid,
    pub base_price_pence: i64,
    #[serde(default)]
    pub sizes: Vec<SizeOption>,
}

/// What a customer picked on the product page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ItemSelection {
    pub product_id: Uuid,
    pub material_id: Uuid,
    pub size_mm: Option<u32>,
    pub finish_id: Option<Uuid>,
    pub packaging: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl ItemSelection {
    /// Two selections describe the same configured item, whatever the quantity.
    pub fn same_configuration(&self, other: &ItemSelection) -> bool {
        self.product_id == other.product_id
            && self.material_id == other.material_id
            && self.size_mm == other.size_mm
            && self.finish_id == other.finish_id
            && self.packaging == other.packaging
    }
}

fn require_name(kind: &str, name: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::Invalid(format!("{} name is required", kind)));
    }
    Ok(())
}

fn require_slug(slug: &str) -> Result<(), CatalogError> {
    let valid = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(CatalogError::Invalid(format!(
            "slug '{}' must be lowercase letters, digits and hyphens",
            slug
        )));
    }
    Ok(())
}

impl Category {
    pub fn validate(&self) -> Result<(), CatalogError> {
        require_name("Category", &self.name)?;
        require_slug(&self.slug)
    }
}

impl Product {
    pub fn validate(&self) -> Result<(), CatalogError> {
        require_name("Product", &self.name)?;
        require_slug(&self.slug)?;
        for option in &self.packaging_options {
            require_name("Packaging", &option.name)?;
            if option.price_pence < 0 {
                return Err(CatalogError::Invalid(format!(
                    "packaging '{}' has a negative price",
                    option.name
                )));
            }
        }
        Ok(())
    }

    pub fn packaging(&self, name: &str) -> Option<&PackagingOption> {
        self.packaging_options
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

impl Material {
    pub fn validate(&self) -> Result<(), CatalogError> {
        require_name("Material", &self.name)
    }
}

impl Finish {
    pub fn validate(&self) -> Result<(), CatalogError> {
        require_name("Finish", &self.name)
    }
}

impl Configuration {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.base_price_pence < 0 {
            return Err(CatalogError::Invalid("base price cannot be negative".to_string()));
        }
        for (i, size) in self.sizes.iter().enumerate() {
            if size.additional_cost_pence < 0 {
                return Err(CatalogError::Invalid(format!(
                    "size {}mm has a negative additional cost",
                    size.size_mm
                )));
            }
            if self.sizes[..i].iter().any(|s| s.size_mm == size.size_mm) {
                return Err(CatalogError::Invalid(format!(
                    "size {}mm is listed twice",
                    size.size_mm
                )));
            }
        }
        Ok(())
    }

    pub fn size(&self, size_mm: u32) -> Option<&SizeOption> {
        self.sizes.iter().find(|s| s.size_mm == size_mm)
    }
}

/// Turn a customer selection into a priceable line using catalog documents.
///
/// The caller looks up the documents; this checks that they belong together
/// and that every picked option is actually offered.
pub fn resolve_line_item(
    product: &Product,
    configuration: &Configuration,
    material: &Material,
    finish: Option<&Finish>,
    selection: &ItemSelection,
) -> Result<LineItemConfig, CatalogError> {
    if !product.is_active {
        return Err(CatalogError::Unavailable(product.name.clone()));
    }
    if configuration.product_id != product.id || configuration.material_id != material.id {
        return Err(CatalogError::MaterialNotOffered {
            product: product.name.clone(),
            material: material.name.clone(),
        });
    }

    let size = match selection.size_mm {
        Some(size_mm) => Some(
            configuration
                .size(size_mm)
                .cloned()
                .ok_or(CatalogError::UnknownSize(size_mm))?,
        ),
        None => None,
    };

    let finish = match (selection.finish_id, finish) {
        (None, _) => None,
        (Some(id), Some(finish)) if finish.id == id && product.finish_ids.contains(&id) => {
            Some(FinishOption {
                name: finish.name.clone(),
                price_adjustment_pence: finish.price_adjustment_pence,
            })
        }
        (Some(id), _) => return Err(CatalogError::FinishNotOffered(id)),
    };

    let packaging_price_pence = match selection.packaging.as_deref() {
        Some(name) => {
            product
                .packaging(name)
                .ok_or_else(|| CatalogError::UnknownPackaging(name.to_string()))?
                .price_pence
        }
        None => 0,
    };

    Ok(LineItemConfig {
        material: Some(MaterialPrice {
            name: material.name.clone(),
            base_price_pence: configuration.base_price_pence,
        }),
        size,
        finish,
        packaging_price_pence,
        quantity: selection.quantity,
    })
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Invalid catalog entry: {0}")]
    Invalid(String),

    #[error("Product not available: {0}")]
    Unavailable(String),

    #[error("{product} is not offered in {material}")]
    MaterialNotOffered { product: String, material: String },

    #[error("Size {0}mm is not offered")]
    UnknownSize(u32),

    #[error("Finish {0} is not offered for this product")]
    FinishNotOffered(Uuid),

    #[error("Packaging '{0}' is not offered for this product")]
    UnknownPackaging(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        product: Product,
        configuration: Configuration,
        material: Material,
        finish: Finish,
    }

    fn fixture() -> Fixture {
        let material = Material {
            id: Uuid::new_v4(),
            name: "Solid Brass".to_string(),
            description: None,
        };
        let finish = Finish {
            id: Uuid::new_v4(),
            name: "Polished Nickel".to_string(),
            price_adjustment_pence: 1_200,
            image_url: None,
        };
        let product = Product {
            id: Uuid::new_v4(),
            name: "Bolt Cabinet Knob".to_string(),
            slug: "bolt-cabinet-knob".to_string(),
            category_id: None,
            description: None,
            finish_ids: vec![finish.id],
            packaging_options: vec![PackagingOption {
                name: "Gift Box".to_string(),
                price_pence: 500,
            }],
            image_urls: vec![],
            is_active: true,
            created_at: Utc::now(),
        };
        let configuration = Configuration {
            id: Uuid::new_v4(),
            product_id: product.id,
            material_id: material.id,
            base_price_pence: 4_500,
            sizes: vec![
                SizeOption { size_mm: 30, additional_cost_pence: 0 },
                SizeOption { size_mm: 40, additional_cost_pence: 800 },
            ],
        };
        Fixture { product, configuration, material, finish }
    }

    fn selection(f: &Fixture) -> ItemSelection {
        ItemSelection {
            product_id: f.product.id,
            material_id: f.material.id,
            size_mm: Some(40),
            finish_id: Some(f.finish.id),
            packaging: Some("gift box".to_string()),
            quantity: 2,
        }
    }

    #[test]
    fn test_resolve_full_selection() {
        let f = fixture();
        let item = resolve_line_item(&f.product, &f.configuration, &f.material, Some(&f.finish), &selection(&f)).unwrap();

        assert_eq!(item.material.as_ref().unwrap().base_price_pence, 4_500);
        assert_eq!(item.size.as_ref().unwrap().additional_cost_pence, 800);
        assert_eq!(item.finish.as_ref().unwrap().price_adjustment_pence, 1_200);
        assert_eq!(item.packaging_price_pence, 500);
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn test_resolve_rejects_unknown_size() {
        let f = fixture();
        let mut sel = selection(&f);
        sel.size_mm = Some(55);

        let err = resolve_line_item(&f.product, &f.configuration, &f.material, Some(&f.finish), &sel).unwrap_err();
        assert_eq!(err, CatalogError::UnknownSize(55));
    }

    #[test]
    fn test_resolve_rejects_finish_not_on_product() {
        let mut f = fixture();
        f.product.finish_ids.clear();

        let err = resolve_line_item(&f.product, &f.configuration, &f.material, Some(&f.finish), &selection(&f)).unwrap_err();
        assert_eq!(err, CatalogError::FinishNotOffered(f.finish.id));
    }

    #[test]
    fn test_resolve_rejects_inactive_product() {
        let mut f = fixture();
        f.product.is_active = false;

        let err = resolve_line_item(&f.product, &f.configuration, &f.material, Some(&f.finish), &selection(&f)).unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }

    #[test]
    fn test_resolve_rejects_unknown_packaging() {
        let f = fixture();
        let mut sel = selection(&f);
        sel.packaging = Some("Crate".to_string());

        let err = resolve_line_item(&f.product, &f.configuration, &f.material, Some(&f.finish), &sel).unwrap_err();
        assert_eq!(err, CatalogError::UnknownPackaging("Crate".to_string()));
    }

    #[test]
    fn test_validation() {
        let f = fixture();
        assert!(f.product.validate().is_ok());
        assert!(f.configuration.validate().is_ok());

        let mut bad = f.product.clone();
        bad.slug = "Bolt Knob".to_string();
        assert!(bad.validate().is_err());

        let mut dup = f.configuration.clone();
        dup.sizes.push(SizeOption { size_mm: 30, additional_cost_pence: 100 });
        assert!(dup.validate().is_err());
    }

    #[test]
    fn test_same_configuration_ignores_quantity() {
        let f = fixture();
        let a = selection(&f);
        let mut b = a.clone();
        b.quantity = 7;
        assert!(a.same_configuration(&b));

        b.size_mm = Some(30);
        assert!(!a.same_configuration(&b));
    }
}
