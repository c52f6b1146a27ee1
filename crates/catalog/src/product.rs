use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopfront_core::{CategoryId, DomainError, DomainResult, ProductId};

use crate::category::Category;
use crate::pricing;
use crate::slug::Slug;

/// Catalog product.
///
/// `views_count` and `sales_count` only ever grow, and only through the
/// store's atomic increment; nothing here writes them back wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub sku: String,
    pub slug: Slug,
    pub stock: u32,
    pub availability: bool,
    pub is_hot: bool,
    pub tags: Vec<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub views_count: u64,
    pub sales_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_viewed: Option<DateTime<Utc>>,
}

/// Input for creating a product.
///
/// `tags`, `colors` and `sizes` are the comma-separated admin fields
/// (e.g. `"tech, makeup,education"`). The creation timestamp is not part of
/// the input; it is stamped once when the product is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub sku: String,
    /// Leave empty to derive the slug from the name.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_availability")]
    pub availability: bool,
    #[serde(default)]
    pub is_hot: bool,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub colors: String,
    #[serde(default)]
    pub sizes: String,
}

fn default_availability() -> bool {
    true
}

impl NewProduct {
    pub fn new(
        category_id: CategoryId,
        name: impl Into<String>,
        sku: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            category_id,
            name: name.into(),
            description: String::new(),
            price,
            sku: sku.into(),
            slug: String::new(),
            stock: 0,
            availability: true,
            is_hot: false,
            tags: String::new(),
            colors: String::new(),
            sizes: String::new(),
        }
    }

    pub fn hot(mut self) -> Self {
        self.is_hot = true;
        self
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }
}

/// Split a comma-separated admin field into trimmed, non-empty entries.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Product {
    /// Build a product from validated input, an already-assigned slug and
    /// the creation instant. Counters start at zero and `last_viewed` is unset.
    pub fn create(
        id: ProductId,
        input: NewProduct,
        slug: Slug,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let sku = input.sku.trim();
        if sku.is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }

        if input.price <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "price must be positive, got {}",
                input.price
            )));
        }
        if input.price.round_dp(2) != input.price {
            return Err(DomainError::validation("price allows at most 2 decimal places"));
        }

        Ok(Self {
            id,
            category_id: input.category_id,
            name: name.to_string(),
            description: input.description,
            price: input.price,
            sku: sku.to_string(),
            slug,
            stock: input.stock,
            availability: input.availability,
            is_hot: input.is_hot,
            tags: parse_list(&input.tags),
            colors: parse_list(&input.colors),
            sizes: parse_list(&input.sizes),
            views_count: 0,
            sales_count: 0,
            created_at,
            last_viewed: None,
        })
    }

    /// Price after the owning category's discount.
    pub fn discounted_price(&self, category: &Category) -> Decimal {
        pricing::effective_price(self, category)
    }

    /// Available and in stock.
    pub fn can_be_sold(&self) -> bool {
        self.availability && self.stock > 0
    }

    /// Canonical storefront path for the product page.
    pub fn path(&self) -> String {
        format!("/product/{}", self.slug)
    }

    /// Apply one view: bump the counter and stamp `last_viewed`.
    ///
    /// Stores call this while holding their write lock for the product so
    /// concurrent views never lose an update.
    pub fn record_view(&mut self, delta: u64, at: DateTime<Utc>) -> u64 {
        self.views_count = self.views_count.saturating_add(delta);
        self.last_viewed = Some(at);
        self.views_count
    }

    /// Apply a sale of `quantity` units. Same locking contract as `record_view`.
    pub fn record_sale(&mut self, quantity: u64) -> u64 {
        self.sales_count = self.sales_count.saturating_add(quantity);
        self.sales_count
    }
}
