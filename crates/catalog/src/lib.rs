//! Catalog domain module.
//!
//! Business rules for the storefront catalog (categories, products, slugs,
//! discount pricing and merchandising selections), implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod category;
pub mod pricing;
pub mod product;
pub mod selector;
pub mod slug;

pub use category::{Category, NewCategory};
pub use pricing::effective_price;
pub use product::{NewProduct, Product};
pub use selector::{ProductFilter, ProductOrder, ProductQuery};
pub use slug::{EntityKind, Slug, assign_slug, slugify};
