use brassline_catalog::{Category, Configuration, Finish, Material, Product};
use brassline_offer::Offer;
use uuid::Uuid;

use crate::repository::Document;

macro_rules! catalog_document {
    ($ty:ty, $collection:literal) => {
        impl Document for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> Uuid {
                self.id
            }

            fn set_id(&mut self, id: Uuid) {
                self.id = id;
            }

            fn validate(&self) -> Result<(), String> {
                <$ty>::validate(self).map_err(|e| e.to_string())
            }
        }
    };
}

catalog_document!(Category, "categories");
catalog_document!(Product, "products");
catalog_document!(Material, "materials");
catalog_document!(Finish, "finishes");
catalog_document!(Configuration, "configurations");
catalog_document!(Offer, "offers");
