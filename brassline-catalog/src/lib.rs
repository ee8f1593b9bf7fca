pub mod product;
pub mod pricing;
pub mod vat;

pub use product::{
    resolve_line_item, CatalogError, Category, Configuration, Finish, ItemSelection, Material,
    PackagingOption, Product,
};
pub use pricing::{
    FinishOption, LineItemConfig, LineItemPrice, MaterialPrice, PricingConfig, PricingEngine,
    PricingError, SizeOption,
};
pub use vat::{PriceBreakdown, VatError, VatService, VatSplit};
