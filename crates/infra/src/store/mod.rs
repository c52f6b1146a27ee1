//! Catalog storage boundary.
//!
//! The catalog core only talks to storage through [`CatalogStore`]; it never
//! assumes how the store is implemented. Two implementations ship here: an
//! in-memory store for tests/dev and a PostgreSQL store.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use shopfront_catalog::{Category, Product, ProductQuery};
use shopfront_core::{CategoryId, ProductId, UserId};

pub use in_memory::InMemoryCatalogStore;
pub use postgres::PostgresCatalogStore;

/// Column guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    Sku,
    ProductSlug,
    CategorySlug,
}

impl core::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            UniqueField::Sku => "product sku",
            UniqueField::ProductSlug => "product slug",
            UniqueField::CategorySlug => "category slug",
        };
        f.write_str(s)
    }
}

/// Product counter that can be atomically incremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterField {
    /// `views_count`; also stamps `last_viewed`.
    Views,
    /// `sales_count`.
    Sales,
}

/// Catalog store operation error.
///
/// These are storage errors (constraints, missing rows, backend failures) as
/// opposed to domain errors (validation, invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {field}")]
    UniqueViolation { field: UniqueField },

    /// The target row (or a row it references) does not exist.
    #[error("not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Persistent product/category repository.
///
/// Implementations must be safe to share across request-handling threads.
/// Uniqueness of SKUs and slugs is enforced here, not by callers.
pub trait CatalogStore: Send + Sync {
    /// Insert a new category. Fails with `UniqueViolation` on a taken slug;
    /// category slugs are never suffixed, so there is no existence check.
    fn insert_category(&self, category: Category) -> Result<Category, StoreError>;

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError>;

    /// All categories ordered by name.
    fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Replace a category's discount. Range validation is the caller's job.
    fn set_category_discount(
        &self,
        id: CategoryId,
        discount_percentage: Decimal,
    ) -> Result<Category, StoreError>;

    /// Insert a new product.
    ///
    /// Fails with `UniqueViolation` on a taken SKU or slug and with `NotFound`
    /// when the owning category does not exist.
    fn insert_product(&self, product: Product) -> Result<Product, StoreError>;

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError>;

    fn product_slug_exists(&self, slug: &str) -> Result<bool, StoreError>;

    /// Run a filtered, ordered, limited selection.
    ///
    /// Results must agree with `ProductFilter::matches` and
    /// `ProductOrder::compare` (like counts come from the likes relation).
    fn query_products(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError>;

    /// Atomically add `delta` to a counter and return the new value.
    ///
    /// `CounterField::Views` also sets `last_viewed = at`. Concurrent calls on
    /// the same product must never lose an update.
    fn increment(
        &self,
        id: ProductId,
        field: CounterField,
        delta: u64,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Record that `user_id` likes `product_id`. Returns `false` if it already did.
    fn add_like(&self, user_id: UserId, product_id: ProductId) -> Result<bool, StoreError>;

    /// Remove a like. Returns `false` if there was none.
    fn remove_like(&self, user_id: UserId, product_id: ProductId) -> Result<bool, StoreError>;

    fn like_count(&self, product_id: ProductId) -> Result<u64, StoreError>;
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    fn insert_category(&self, category: Category) -> Result<Category, StoreError> {
        (**self).insert_category(category)
    }

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        (**self).get_category(id)
    }

    fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        (**self).get_category_by_slug(slug)
    }

    fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        (**self).list_categories()
    }

    fn set_category_discount(
        &self,
        id: CategoryId,
        discount_percentage: Decimal,
    ) -> Result<Category, StoreError> {
        (**self).set_category_discount(id, discount_percentage)
    }

    fn insert_product(&self, product: Product) -> Result<Product, StoreError> {
        (**self).insert_product(product)
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get_product(id)
    }

    fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        (**self).get_product_by_slug(slug)
    }

    fn product_slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
        (**self).product_slug_exists(slug)
    }

    fn query_products(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError> {
        (**self).query_products(query)
    }

    fn increment(
        &self,
        id: ProductId,
        field: CounterField,
        delta: u64,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        (**self).increment(id, field, delta, at)
    }

    fn add_like(&self, user_id: UserId, product_id: ProductId) -> Result<bool, StoreError> {
        (**self).add_like(user_id, product_id)
    }

    fn remove_like(&self, user_id: UserId, product_id: ProductId) -> Result<bool, StoreError> {
        (**self).remove_like(user_id, product_id)
    }

    fn like_count(&self, product_id: ProductId) -> Result<u64, StoreError> {
        (**self).like_count(product_id)
    }
}
