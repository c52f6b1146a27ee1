//! Merchandising selections as storage-agnostic queries.
//!
//! Each named list (hot, trending, new arrivals, ...) is a [`ProductQuery`]:
//! a conjunction of optional predicates, one ordering and a limit. Stores
//! execute queries however they like, but must agree with
//! [`ProductFilter::matches`] and [`ProductOrder::compare`], which define the
//! semantics. Every ordering ends with `created_at` ascending then id
//! ascending so results are deterministic.

use core::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopfront_core::{CategoryId, ProductId};

use crate::product::Product;

/// Result count used when the caller gives none.
pub const DEFAULT_LIMIT: usize = 4;
/// Trending window used when the caller gives none.
pub const DEFAULT_TRENDING_WINDOW_DAYS: u32 = 7;
/// New-arrivals window used when the caller gives none.
pub const DEFAULT_NEW_ARRIVALS_WINDOW_DAYS: u32 = 30;

/// Conjunction of optional product predicates. `Default` matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    pub hot: Option<bool>,
    /// `last_viewed >= viewed_since`; never-viewed products don't match.
    pub viewed_since: Option<DateTime<Utc>>,
    pub created_since: Option<DateTime<Utc>>,
    pub category_id: Option<CategoryId>,
    pub exclude: Option<ProductId>,
    /// Strictly greater than.
    pub price_above: Option<Decimal>,
    /// Case-insensitive substring of name, description, SKU or any tag.
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(hot) = self.hot {
            if product.is_hot != hot {
                return false;
            }
        }
        if let Some(since) = self.viewed_since {
            match product.last_viewed {
                Some(viewed) if viewed >= since => {}
                _ => return false,
            }
        }
        if let Some(since) = self.created_since {
            if product.created_at < since {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if product.category_id != category_id {
                return false;
            }
        }
        if let Some(exclude) = self.exclude {
            if product.id == exclude {
                return false;
            }
        }
        if let Some(price) = self.price_above {
            if product.price <= price {
                return false;
            }
        }
        if let Some(term) = &self.search {
            if !matches_search(product, term) {
                return false;
            }
        }
        true
    }
}

fn matches_search(product: &Product, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    product.name.to_lowercase().contains(&needle)
        || product.description.to_lowercase().contains(&needle)
        || product.sku.to_lowercase().contains(&needle)
        || product.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

/// Primary sort key of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductOrder {
    /// Oldest first (creation order).
    Insertion,
    ViewsDesc,
    CreatedDesc,
    SalesDesc,
    /// Most liked first; needs the like counts from storage.
    LikesDesc,
    PriceAsc,
}

impl ProductOrder {
    /// Total order over products. `likes_a`/`likes_b` are only read by
    /// `LikesDesc`.
    pub fn compare(self, a: &Product, likes_a: u64, b: &Product, likes_b: u64) -> Ordering {
        let primary = match self {
            ProductOrder::Insertion => Ordering::Equal,
            ProductOrder::ViewsDesc => b.views_count.cmp(&a.views_count),
            ProductOrder::CreatedDesc => b.created_at.cmp(&a.created_at),
            ProductOrder::SalesDesc => b.sales_count.cmp(&a.sales_count),
            ProductOrder::LikesDesc => likes_b.cmp(&likes_a),
            ProductOrder::PriceAsc => a.price.cmp(&b.price),
        };
        primary
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// A filtered, ordered, limited product selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub filter: ProductFilter,
    pub order: ProductOrder,
    pub limit: usize,
}

fn window_start(now: DateTime<Utc>, window_days: u32) -> DateTime<Utc> {
    // Windows reaching past the representable range cover everything.
    now.checked_sub_signed(Duration::days(i64::from(window_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl ProductQuery {
    pub fn new(filter: ProductFilter, order: ProductOrder, limit: usize) -> Self {
        Self { filter, order, limit }
    }

    /// Products manually flagged as hot deals.
    pub fn hot(limit: usize) -> Self {
        let filter = ProductFilter {
            hot: Some(true),
            ..ProductFilter::default()
        };
        Self::new(filter, ProductOrder::Insertion, limit)
    }

    /// Most-viewed among the products viewed within the window.
    pub fn trending(now: DateTime<Utc>, window_days: u32, limit: usize) -> Self {
        let filter = ProductFilter {
            viewed_since: Some(window_start(now, window_days)),
            ..ProductFilter::default()
        };
        Self::new(filter, ProductOrder::ViewsDesc, limit)
    }

    /// Products created within the window, newest first.
    pub fn new_arrivals(now: DateTime<Utc>, window_days: u32, limit: usize) -> Self {
        let filter = ProductFilter {
            created_since: Some(window_start(now, window_days)),
            ..ProductFilter::default()
        };
        Self::new(filter, ProductOrder::CreatedDesc, limit)
    }

    pub fn top_selling(limit: usize) -> Self {
        Self::new(ProductFilter::default(), ProductOrder::SalesDesc, limit)
    }

    pub fn popular(limit: usize) -> Self {
        Self::new(ProductFilter::default(), ProductOrder::LikesDesc, limit)
    }

    /// Best sellers from the same category, excluding `product` itself.
    pub fn cross_sell(product: &Product, limit: usize) -> Self {
        let filter = ProductFilter {
            category_id: Some(product.category_id),
            exclude: Some(product.id),
            ..ProductFilter::default()
        };
        Self::new(filter, ProductOrder::SalesDesc, limit)
    }

    /// Pricier products from the same category, cheapest first.
    pub fn up_sell(product: &Product, limit: usize) -> Self {
        let filter = ProductFilter {
            category_id: Some(product.category_id),
            price_above: Some(product.price),
            ..ProductFilter::default()
        };
        Self::new(filter, ProductOrder::PriceAsc, limit)
    }

    /// A category's products, newest first.
    pub fn in_category(category_id: CategoryId, limit: usize) -> Self {
        let filter = ProductFilter {
            category_id: Some(category_id),
            ..ProductFilter::default()
        };
        Self::new(filter, ProductOrder::CreatedDesc, limit)
    }

    /// Text search over name, description, SKU and tags, newest first.
    pub fn search(term: impl Into<String>, limit: usize) -> Self {
        let filter = ProductFilter {
            search: Some(term.into()),
            ..ProductFilter::default()
        };
        Self::new(filter, ProductOrder::CreatedDesc, limit)
    }

    /// Whether the query can only ever return nothing.
    pub fn is_empty(&self) -> bool {
        self.limit == 0
            || self
                .filter
                .search
                .as_deref()
                .is_some_and(|term| term.trim().is_empty())
    }

    /// Reference execution over an in-memory product set.
    pub fn select<'a, I, L>(&self, products: I, likes: L) -> Vec<Product>
    where
        I: IntoIterator<Item = &'a Product>,
        L: Fn(ProductId) -> u64,
    {
        if self.is_empty() {
            return Vec::new();
        }

        let mut matched: Vec<(&Product, u64)> = products
            .into_iter()
            .filter(|p| self.filter.matches(p))
            .map(|p| (p, likes(p.id)))
            .collect();

        matched.sort_by(|(a, la), (b, lb)| self.order.compare(a, *la, b, *lb));
        matched
            .into_iter()
            .take(self.limit)
            .map(|(p, _)| p.clone())
            .collect()
    }
}
