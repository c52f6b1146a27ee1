//! Catalog service: the entry point the request-handling layer calls.
//!
//! Wires the pure catalog rules (slug assignment, pricing, selections) to a
//! [`CatalogStore`]. Each call returns its own `Result`; no state is shared
//! between requests beyond the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use shopfront_catalog::category::validate_discount;
use shopfront_catalog::{
    Category, EntityKind, NewCategory, NewProduct, Product, ProductQuery, Slug, assign_slug,
    pricing, slugify,
};
use shopfront_core::{CategoryId, DomainError, ProductId, UserId};

use crate::config::CatalogConfig;
use crate::store::{CatalogStore, CounterField, StoreError, UniqueField};

/// Catalog operation error, as seen by the request-handling layer.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("no free slug for '{base}' after {attempts} attempts")]
    SlugExhausted { base: String, attempts: u32 },

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => CatalogError::NotFound,
            StoreError::UniqueViolation { field } => {
                CatalogError::Conflict(format!("{field} already exists"))
            }
            other => CatalogError::Store(other),
        }
    }
}

/// Sale quantity recorded when the caller gives none.
pub const DEFAULT_SALE_QUANTITY: u32 = 1;

/// Source of the current instant: creation stamps, view stamps and the
/// trending and new-arrivals windows all read it.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct CatalogService<S> {
    store: S,
    config: CatalogConfig,
    clock: Clock,
}

impl<S> CatalogService<S>
where
    S: CatalogStore,
{
    pub fn new(store: S) -> Self {
        Self::with_config(store, CatalogConfig::default())
    }

    pub fn with_config(store: S, config: CatalogConfig) -> Self {
        Self {
            store,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, e.g. to replay or backdate in tests.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn limit(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.config.default_limit)
    }

    // ---- creation -------------------------------------------------------

    /// Create a category, deriving its slug from the name when none is given.
    ///
    /// Category slugs get no collision suffix: a taken slug is a `Conflict`
    /// reported by the store on insert, so no existence check is made.
    #[instrument(skip(self, input), fields(name = %input.name), err)]
    pub fn create_category(&self, input: NewCategory) -> Result<Category, CatalogError> {
        let id = CategoryId::new();
        let slug = match input.slug.trim() {
            "" => assign_slug(&input.name, EntityKind::Category, *id.as_uuid(), |_| {
                Ok::<_, StoreError>(false)
            })?,
            given => Slug::parse(given)?,
        };

        let category = Category::create(id, input, slug)?;
        let category = self.store.insert_category(category)?;
        debug!(category_id = %category.id, slug = %category.slug, "category created");
        Ok(category)
    }

    /// Create a product, assigning a unique slug when none is given.
    ///
    /// `created_at` is stamped here from the service clock; the input has
    /// no say in it. The store's unique constraint decides slugs: if another
    /// writer takes the candidate between the existence check and the insert,
    /// the next suffix is tried, up to `max_slug_attempts` times.
    #[instrument(skip(self, input), fields(name = %input.name, sku = %input.sku), err)]
    pub fn create_product(&self, input: NewProduct) -> Result<Product, CatalogError> {
        if self.store.get_category(input.category_id)?.is_none() {
            return Err(CatalogError::NotFound);
        }

        let id = ProductId::new();
        let created_at = self.now();
        let given = input.slug.trim().to_string();
        if !given.is_empty() {
            let product = Product::create(id, input, Slug::parse(given)?, created_at)?;
            return Ok(self.store.insert_product(product)?);
        }

        let attempts = self.config.max_slug_attempts.max(1);
        for attempt in 1..=attempts {
            let slug = assign_slug(&input.name, EntityKind::Product, *id.as_uuid(), |candidate| {
                self.store.product_slug_exists(candidate)
            })?;
            let product = Product::create(id, input.clone(), slug, created_at)?;

            match self.store.insert_product(product) {
                Ok(product) => {
                    debug!(
                        product_id = %product.id,
                        slug = %product.slug,
                        attempt,
                        "product created"
                    );
                    return Ok(product);
                }
                Err(StoreError::UniqueViolation {
                    field: UniqueField::ProductSlug,
                }) => {
                    warn!(attempt, "slug taken by a concurrent insert, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(CatalogError::SlugExhausted {
            base: slugify(&input.name),
            attempts,
        })
    }

    /// Change a category's discount (0-100, at most 2 decimal places).
    #[instrument(skip(self), err)]
    pub fn set_category_discount(
        &self,
        category_id: CategoryId,
        discount_percentage: Decimal,
    ) -> Result<Category, CatalogError> {
        validate_discount(discount_percentage)?;
        Ok(self.store.set_category_discount(category_id, discount_percentage)?)
    }

    // ---- lookups --------------------------------------------------------

    pub fn get_product(&self, product_id: ProductId) -> Result<Product, CatalogError> {
        self.store.get_product(product_id)?.ok_or(CatalogError::NotFound)
    }

    pub fn get_product_by_slug(&self, slug: &str) -> Result<Product, CatalogError> {
        self.store.get_product_by_slug(slug)?.ok_or(CatalogError::NotFound)
    }

    pub fn get_category(&self, category_id: CategoryId) -> Result<Category, CatalogError> {
        self.store.get_category(category_id)?.ok_or(CatalogError::NotFound)
    }

    pub fn get_category_by_slug(&self, slug: &str) -> Result<Category, CatalogError> {
        self.store.get_category_by_slug(slug)?.ok_or(CatalogError::NotFound)
    }

    /// All categories ordered by name.
    pub fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.store.list_categories()?)
    }

    // ---- pricing --------------------------------------------------------

    /// Price of a product after its category's discount.
    pub fn effective_price(&self, product_id: ProductId) -> Result<Decimal, CatalogError> {
        let product = self.get_product(product_id)?;
        let category = self.store.get_category(product.category_id)?.ok_or_else(|| {
            DomainError::invariant(format!(
                "product {} references missing category {}",
                product.id, product.category_id
            ))
        })?;
        Ok(pricing::effective_price(&product, &category))
    }

    // ---- selections -----------------------------------------------------

    fn select(&self, query: ProductQuery) -> Result<Vec<Product>, CatalogError> {
        if query.is_empty() {
            return Ok(vec![]);
        }
        Ok(self.store.query_products(&query)?)
    }

    #[instrument(skip(self), err)]
    pub fn list_hot(&self, limit: Option<usize>) -> Result<Vec<Product>, CatalogError> {
        self.select(ProductQuery::hot(self.limit(limit)))
    }

    #[instrument(skip(self), err)]
    pub fn list_trending(
        &self,
        window_days: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, CatalogError> {
        let window_days = window_days.unwrap_or(self.config.trending_window_days);
        self.select(ProductQuery::trending(self.now(), window_days, self.limit(limit)))
    }

    #[instrument(skip(self), err)]
    pub fn list_new_arrivals(
        &self,
        window_days: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, CatalogError> {
        let window_days = window_days.unwrap_or(self.config.new_arrivals_window_days);
        self.select(ProductQuery::new_arrivals(self.now(), window_days, self.limit(limit)))
    }

    #[instrument(skip(self), err)]
    pub fn list_top_selling(&self, limit: Option<usize>) -> Result<Vec<Product>, CatalogError> {
        self.select(ProductQuery::top_selling(self.limit(limit)))
    }

    #[instrument(skip(self), err)]
    pub fn list_popular(&self, limit: Option<usize>) -> Result<Vec<Product>, CatalogError> {
        self.select(ProductQuery::popular(self.limit(limit)))
    }

    /// Same-category best sellers, excluding the product itself.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub fn list_cross_sell(
        &self,
        product_id: ProductId,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, CatalogError> {
        let product = self.get_product(product_id)?;
        self.select(ProductQuery::cross_sell(&product, self.limit(limit)))
    }

    /// Pricier same-category products, cheapest first.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub fn list_up_sell(
        &self,
        product_id: ProductId,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, CatalogError> {
        let product = self.get_product(product_id)?;
        self.select(ProductQuery::up_sell(&product, self.limit(limit)))
    }

    /// A category's products, newest first.
    pub fn products_in_category(
        &self,
        category_id: CategoryId,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, CatalogError> {
        self.get_category(category_id)?;
        self.select(ProductQuery::in_category(category_id, self.limit(limit)))
    }

    /// Search name, description, SKU and tags. A blank term finds nothing.
    #[instrument(skip(self), err)]
    pub fn search_products(
        &self,
        term: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Product>, CatalogError> {
        self.select(ProductQuery::search(term, self.limit(limit)))
    }

    // ---- mutators -------------------------------------------------------

    /// Count one view and stamp `last_viewed`. Returns the new view count.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub fn increment_views(&self, product_id: ProductId) -> Result<u64, CatalogError> {
        let views = self
            .store
            .increment(product_id, CounterField::Views, 1, self.now())?;
        debug!(views, "product viewed");
        Ok(views)
    }

    /// Count `quantity` sold units (default 1). Returns the new sale count.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub fn record_sale(
        &self,
        product_id: ProductId,
        quantity: Option<u32>,
    ) -> Result<u64, CatalogError> {
        let quantity = quantity.unwrap_or(DEFAULT_SALE_QUANTITY);
        if quantity == 0 {
            return Err(DomainError::validation("sale quantity must be positive").into());
        }
        let sales = self.store.increment(
            product_id,
            CounterField::Sales,
            u64::from(quantity),
            self.now(),
        )?;
        debug!(sales, quantity, "sale recorded");
        Ok(sales)
    }

    /// Add a product to a user's wishlist. Returns `false` if already there.
    #[instrument(skip(self), err)]
    pub fn like(&self, user_id: UserId, product_id: ProductId) -> Result<bool, CatalogError> {
        Ok(self.store.add_like(user_id, product_id)?)
    }

    /// Remove a product from a user's wishlist. Returns `false` if it wasn't there.
    #[instrument(skip(self), err)]
    pub fn unlike(&self, user_id: UserId, product_id: ProductId) -> Result<bool, CatalogError> {
        Ok(self.store.remove_like(user_id, product_id)?)
    }

    pub fn total_likes(&self, product_id: ProductId) -> Result<u64, CatalogError> {
        Ok(self.store.like_count(product_id)?)
    }
}
