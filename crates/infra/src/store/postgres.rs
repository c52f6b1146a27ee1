//! Postgres-backed catalog store.
//!
//! Uniqueness (SKU, product slug, category slug) and the category foreign
//! key are enforced by the schema, so concurrent writers race on constraints
//! rather than on application-level checks. Counter increments are single
//! `UPDATE ... SET n = n + $delta` statements.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | StoreError |
//! |----------------------|------------|
//! | `23505` unique violation | `UniqueViolation` (field from the constraint name) |
//! | `23503` foreign key violation | `NotFound` |
//! | anything else | `Storage` |
//!
//! ## Runtime
//!
//! The async methods are the primary API. The synchronous [`CatalogStore`]
//! impl drives them on the ambient tokio runtime with `block_in_place`, so it
//! must be called from a multi-threaded runtime (or from a thread that has
//! entered one).

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Row};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{Span, instrument};
use uuid::Uuid;

use shopfront_catalog::{Category, Product, ProductOrder, ProductQuery, Slug};
use shopfront_core::{CategoryId, ProductId, UserId};

use super::{CatalogStore, CounterField, StoreError, UniqueField};

/// Catalog schema. Idempotent; applied by [`PostgresCatalogStore::ensure_schema`].
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT NOT NULL,
    discount_percentage NUMERIC(5, 2) NOT NULL DEFAULT 0
        CHECK (discount_percentage >= 0 AND discount_percentage <= 100),
    image_url TEXT,
    CONSTRAINT categories_slug_key UNIQUE (slug)
);

CREATE TABLE IF NOT EXISTS products (
    id UUID PRIMARY KEY,
    category_id UUID NOT NULL REFERENCES categories (id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    price NUMERIC(10, 2) NOT NULL CHECK (price > 0),
    sku TEXT NOT NULL,
    slug TEXT NOT NULL,
    stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
    availability BOOLEAN NOT NULL DEFAULT TRUE,
    is_hot BOOLEAN NOT NULL DEFAULT FALSE,
    tags TEXT[] NOT NULL DEFAULT '{}',
    colors TEXT[] NOT NULL DEFAULT '{}',
    sizes TEXT[] NOT NULL DEFAULT '{}',
    views_count BIGINT NOT NULL DEFAULT 0 CHECK (views_count >= 0),
    sales_count BIGINT NOT NULL DEFAULT 0 CHECK (sales_count >= 0),
    created_at TIMESTAMPTZ NOT NULL,
    last_viewed TIMESTAMPTZ,
    CONSTRAINT products_sku_key UNIQUE (sku),
    CONSTRAINT products_slug_key UNIQUE (slug)
);

CREATE INDEX IF NOT EXISTS products_category_idx ON products (category_id);
CREATE INDEX IF NOT EXISTS products_last_viewed_idx ON products (last_viewed);
CREATE INDEX IF NOT EXISTS products_created_at_idx ON products (created_at);

CREATE TABLE IF NOT EXISTS product_likes (
    user_id UUID NOT NULL,
    product_id UUID NOT NULL REFERENCES products (id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, product_id)
);
"#;

const PRODUCT_COLUMNS: &str = r#"
    p.id, p.category_id, p.name, p.description, p.price, p.sku, p.slug,
    p.stock, p.availability, p.is_hot, p.tags, p.colors, p.sizes,
    p.views_count, p.sales_count, p.created_at, p.last_viewed
"#;

/// Postgres-backed catalog store.
///
/// Uses a SQLx connection pool, which is thread-safe (Arc + Send + Sync).
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    /// Create a new PostgresCatalogStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the catalog tables if they don't exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    #[instrument(skip(self, category), fields(category_id = %category.id), err)]
    pub async fn insert_category(&self, category: Category) -> Result<Category, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, discount_percentage, image_url)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(category.slug.as_str())
        .bind(category.discount_percentage)
        .bind(&category.image_url)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_category", e))?;
        Ok(category)
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, slug, discount_percentage, image_url FROM categories WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_category", e))?;
        row.map(|r| category_from_row(&r)).transpose()
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, slug, discount_percentage, image_url FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_category_by_slug", e))?;
        row.map(|r| category_from_row(&r)).transpose()
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, slug, discount_percentage, image_url
            FROM categories
            ORDER BY name ASC, id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_categories", e))?;
        rows.iter().map(category_from_row).collect()
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    pub async fn set_category_discount(
        &self,
        id: CategoryId,
        discount_percentage: Decimal,
    ) -> Result<Category, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE categories SET discount_percentage = $2
            WHERE id = $1
            RETURNING id, name, slug, discount_percentage, image_url
            "#,
        )
        .bind(id.as_uuid())
        .bind(discount_percentage)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_category_discount", e))?;
        match row {
            Some(r) => category_from_row(&r),
            None => Err(StoreError::NotFound),
        }
    }

    #[instrument(skip(self, product), fields(product_id = %product.id, slug = %product.slug), err)]
    pub async fn insert_product(&self, product: Product) -> Result<Product, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, category_id, name, description, price, sku, slug,
                stock, availability, is_hot, tags, colors, sizes,
                views_count, sales_count, created_at, last_viewed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.category_id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.sku)
        .bind(product.slug.as_str())
        .bind(to_i32("stock", u64::from(product.stock))?)
        .bind(product.availability)
        .bind(product.is_hot)
        .bind(&product.tags)
        .bind(&product.colors)
        .bind(&product.sizes)
        .bind(to_i64("views_count", product.views_count)?)
        .bind(to_i64("sales_count", product.sales_count)?)
        .bind(product.created_at)
        .bind(product.last_viewed)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(product)
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        row.map(|r| product_from_row(&r)).transpose()
    }

    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.slug = $1");
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product_by_slug", e))?;
        row.map(|r| product_from_row(&r)).transpose()
    }

    pub async fn product_slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1) AS taken")
            .bind(slug)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("product_slug_exists", e))?;
        row.try_get("taken").map_err(|e| decode_error("taken", e))
    }

    /// Run a selection. Optional predicates use the `($n IS NULL OR ...)`
    /// form so one parameterised statement covers every filter combination;
    /// the ORDER BY fragment comes from a fixed table, never from input.
    #[instrument(
        skip(self, query),
        fields(
            order = ?query.order,
            limit = query.limit,
            operation = tracing::field::Empty,
            result_count = tracing::field::Empty
        ),
        err
    )]
    pub async fn query_products(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError> {
        if query.is_empty() {
            return Ok(vec![]);
        }

        let span = Span::current();
        span.record("operation", "query_products");

        let filter = &query.filter;
        let search_pattern = filter
            .search
            .as_deref()
            .map(|term| format!("%{}%", escape_like(term.trim())));

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN (
                SELECT product_id, COUNT(*) AS like_count
                FROM product_likes
                GROUP BY product_id
            ) l ON l.product_id = p.id
            WHERE ($1::boolean IS NULL OR p.is_hot = $1)
                AND ($2::timestamptz IS NULL OR p.last_viewed >= $2)
                AND ($3::timestamptz IS NULL OR p.created_at >= $3)
                AND ($4::uuid IS NULL OR p.category_id = $4)
                AND ($5::uuid IS NULL OR p.id <> $5)
                AND ($6::numeric IS NULL OR p.price > $6)
                AND ($7::text IS NULL
                    OR p.name ILIKE $7
                    OR p.description ILIKE $7
                    OR p.sku ILIKE $7
                    OR EXISTS (SELECT 1 FROM unnest(p.tags) AS tag WHERE tag ILIKE $7))
            ORDER BY {order}, p.created_at ASC, p.id ASC
            LIMIT $8
            "#,
            order = order_by(query.order),
        );

        let rows = sqlx::query(&sql)
            .bind(filter.hot)
            .bind(filter.viewed_since)
            .bind(filter.created_since)
            .bind(filter.category_id.map(|id| *id.as_uuid()))
            .bind(filter.exclude.map(|id| *id.as_uuid()))
            .bind(filter.price_above)
            .bind(search_pattern)
            .bind(to_i64("limit", query.limit as u64)?)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("query_products", e))?;

        let products = rows.iter().map(product_from_row).collect::<Result<Vec<_>, _>>()?;
        span.record("result_count", products.len());
        Ok(products)
    }

    /// Single-statement atomic increment.
    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn increment(
        &self,
        id: ProductId,
        field: CounterField,
        delta: u64,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let delta = to_i64("delta", delta)?;
        let row = match field {
            CounterField::Views => {
                sqlx::query(
                    r#"
                    UPDATE products
                    SET views_count = views_count + $2, last_viewed = $3
                    WHERE id = $1
                    RETURNING views_count AS value
                    "#,
                )
                .bind(id.as_uuid())
                .bind(delta)
                .bind(at)
                .fetch_optional(&*self.pool)
                .await
            }
            CounterField::Sales => {
                sqlx::query(
                    r#"
                    UPDATE products
                    SET sales_count = sales_count + $2
                    WHERE id = $1
                    RETURNING sales_count AS value
                    "#,
                )
                .bind(id.as_uuid())
                .bind(delta)
                .fetch_optional(&*self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("increment", e))?;

        let row = row.ok_or(StoreError::NotFound)?;
        let value: i64 = row.try_get("value").map_err(|e| decode_error("value", e))?;
        from_i64("value", value)
    }

    pub async fn add_like(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO product_likes (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(product_id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_like", e))?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn remove_like(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, StoreError> {
        if !self.product_exists(product_id).await? {
            return Err(StoreError::NotFound);
        }
        let result = sqlx::query("DELETE FROM product_likes WHERE user_id = $1 AND product_id = $2")
            .bind(user_id.as_uuid())
            .bind(product_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_like", e))?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn like_count(&self, product_id: ProductId) -> Result<u64, StoreError> {
        if !self.product_exists(product_id).await? {
            return Err(StoreError::NotFound);
        }
        let row = sqlx::query("SELECT COUNT(*) AS total FROM product_likes WHERE product_id = $1")
            .bind(product_id.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("like_count", e))?;
        let total: i64 = row.try_get("total").map_err(|e| decode_error("total", e))?;
        from_i64("total", total)
    }

    async fn product_exists(&self, product_id: ProductId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1) AS present")
            .bind(product_id.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("product_exists", e))?;
        row.try_get("present").map_err(|e| decode_error("present", e))
    }

    /// Drive an async store call to completion from synchronous code.
    ///
    /// `block_in_place` is only legal on a multi-threaded runtime; on a
    /// current-thread runtime the caller must use the async methods instead.
    fn run<T>(&self, fut: impl Future<Output = Result<T, StoreError>>) -> Result<T, StoreError> {
        let handle = Handle::try_current().map_err(|_| {
            StoreError::Storage(
                "PostgresCatalogStore requires a tokio runtime. \
                 Call it from within a multi-threaded runtime context."
                    .to_string(),
            )
        })?;
        if handle.runtime_flavor() == RuntimeFlavor::CurrentThread {
            return Err(StoreError::Storage(
                "PostgresCatalogStore cannot block on a current-thread runtime. \
                 Use a multi-threaded runtime or the async methods."
                    .to_string(),
            ));
        }
        tokio::task::block_in_place(|| handle.block_on(fut))
    }
}

impl CatalogStore for PostgresCatalogStore {
    fn insert_category(&self, category: Category) -> Result<Category, StoreError> {
        self.run(self.insert_category(category))
    }

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        self.run(self.get_category(id))
    }

    fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        self.run(self.get_category_by_slug(slug))
    }

    fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.run(self.list_categories())
    }

    fn set_category_discount(
        &self,
        id: CategoryId,
        discount_percentage: Decimal,
    ) -> Result<Category, StoreError> {
        self.run(self.set_category_discount(id, discount_percentage))
    }

    fn insert_product(&self, product: Product) -> Result<Product, StoreError> {
        self.run(self.insert_product(product))
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.run(self.get_product(id))
    }

    fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        self.run(self.get_product_by_slug(slug))
    }

    fn product_slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
        self.run(self.product_slug_exists(slug))
    }

    fn query_products(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError> {
        self.run(self.query_products(query))
    }

    fn increment(
        &self,
        id: ProductId,
        field: CounterField,
        delta: u64,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.run(self.increment(id, field, delta, at))
    }

    fn add_like(&self, user_id: UserId, product_id: ProductId) -> Result<bool, StoreError> {
        self.run(self.add_like(user_id, product_id))
    }

    fn remove_like(&self, user_id: UserId, product_id: ProductId) -> Result<bool, StoreError> {
        self.run(self.remove_like(user_id, product_id))
    }

    fn like_count(&self, product_id: ProductId) -> Result<u64, StoreError> {
        self.run(self.like_count(product_id))
    }
}

fn order_by(order: ProductOrder) -> &'static str {
    match order {
        ProductOrder::Insertion => "p.created_at ASC",
        ProductOrder::ViewsDesc => "p.views_count DESC",
        ProductOrder::CreatedDesc => "p.created_at DESC",
        ProductOrder::SalesDesc => "p.sales_count DESC",
        ProductOrder::LikesDesc => "COALESCE(l.like_count, 0) DESC",
        ProductOrder::PriceAsc => "p.price ASC",
    }
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned());
            match code.as_deref() {
                Some("23505") => match unique_field(db_err.constraint()) {
                    Some(field) => StoreError::UniqueViolation { field },
                    None => StoreError::Storage(format!(
                        "unexpected unique violation in {}: {}",
                        operation,
                        db_err.message()
                    )),
                },
                Some("23503") => StoreError::NotFound,
                _ => StoreError::Storage(format!(
                    "database error in {}: {}",
                    operation,
                    db_err.message()
                )),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {}", operation))
        }
        other => StoreError::Storage(format!("database error in {}: {}", operation, other)),
    }
}

fn unique_field(constraint: Option<&str>) -> Option<UniqueField> {
    match constraint? {
        "products_sku_key" => Some(UniqueField::Sku),
        "products_slug_key" => Some(UniqueField::ProductSlug),
        "categories_slug_key" => Some(UniqueField::CategorySlug),
        _ => None,
    }
}

fn decode_error(column: &str, err: sqlx::Error) -> StoreError {
    StoreError::Storage(format!("failed to decode column {column}: {err}"))
}

fn to_i64(name: &str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Storage(format!("{name} out of range: {value}")))
}

fn to_i32(name: &str, value: u64) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Storage(format!("{name} out of range: {value}")))
}

fn from_i64(name: &str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Storage(format!("{name} is negative: {value}")))
}

// SQLx row types

#[derive(Debug)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
    discount_percentage: Decimal,
    image_url: Option<String>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for CategoryRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(CategoryRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            discount_percentage: row.try_get("discount_percentage")?,
            image_url: row.try_get("image_url")?,
        })
    }
}

impl TryFrom<CategoryRow> for Category {
    type Error = StoreError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Category {
            id: CategoryId::from_uuid(row.id),
            name: row.name,
            slug: stored_slug(row.slug)?,
            discount_percentage: row.discount_percentage,
            image_url: row.image_url,
        })
    }
}

#[derive(Debug)]
struct ProductRow {
    id: Uuid,
    category_id: Uuid,
    name: String,
    description: String,
    price: Decimal,
    sku: String,
    slug: String,
    stock: i32,
    availability: bool,
    is_hot: bool,
    tags: Vec<String>,
    colors: Vec<String>,
    sizes: Vec<String>,
    views_count: i64,
    sales_count: i64,
    created_at: DateTime<Utc>,
    last_viewed: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for ProductRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            category_id: row.try_get("category_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            sku: row.try_get("sku")?,
            slug: row.try_get("slug")?,
            stock: row.try_get("stock")?,
            availability: row.try_get("availability")?,
            is_hot: row.try_get("is_hot")?,
            tags: row.try_get("tags")?,
            colors: row.try_get("colors")?,
            sizes: row.try_get("sizes")?,
            views_count: row.try_get("views_count")?,
            sales_count: row.try_get("sales_count")?,
            created_at: row.try_get("created_at")?,
            last_viewed: row.try_get("last_viewed")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: ProductId::from_uuid(row.id),
            category_id: CategoryId::from_uuid(row.category_id),
            name: row.name,
            description: row.description,
            price: row.price,
            sku: row.sku,
            slug: stored_slug(row.slug)?,
            stock: u32::try_from(row.stock)
                .map_err(|_| StoreError::Storage(format!("stock is negative: {}", row.stock)))?,
            availability: row.availability,
            is_hot: row.is_hot,
            tags: row.tags,
            colors: row.colors,
            sizes: row.sizes,
            views_count: from_i64("views_count", row.views_count)?,
            sales_count: from_i64("sales_count", row.sales_count)?,
            created_at: row.created_at,
            last_viewed: row.last_viewed,
        })
    }
}

fn stored_slug(raw: String) -> Result<Slug, StoreError> {
    Slug::parse(raw).map_err(|e| StoreError::Storage(format!("stored slug is malformed: {e}")))
}

fn category_from_row(row: &sqlx::postgres::PgRow) -> Result<Category, StoreError> {
    let row = CategoryRow::from_row(row)
        .map_err(|e| StoreError::Storage(format!("failed to deserialize category row: {e}")))?;
    Category::try_from(row)
}

fn product_from_row(row: &sqlx::postgres::PgRow) -> Result<Product, StoreError> {
    let row = ProductRow::from_row(row)
        .map_err(|e| StoreError::Storage(format!("failed to deserialize product row: {e}")))?;
    Product::try_from(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_store() -> PostgresCatalogStore {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://shopfront@127.0.0.1:1/unused")
            .unwrap();
        PostgresCatalogStore::new(pool)
    }

    #[tokio::test]
    async fn sync_calls_on_current_thread_runtime_return_storage_error() {
        let store = lazy_store();
        let err = CatalogStore::get_product(&store, ProductId::new()).unwrap_err();
        match err {
            StoreError::Storage(msg) => assert!(msg.contains("current-thread")),
            other => panic!("Expected Storage error, got {other:?}"),
        }
        assert!(CatalogStore::list_categories(&store).is_err());
    }

    #[test]
    fn like_patterns_escape_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("lamp"), "lamp");
    }

    #[test]
    fn constraint_names_map_to_fields() {
        assert_eq!(unique_field(Some("products_sku_key")), Some(UniqueField::Sku));
        assert_eq!(unique_field(Some("products_slug_key")), Some(UniqueField::ProductSlug));
        assert_eq!(unique_field(Some("categories_slug_key")), Some(UniqueField::CategorySlug));
        assert_eq!(unique_field(Some("something_else")), None);
        assert_eq!(unique_field(None), None);
    }

    #[test]
    fn every_order_has_a_sql_fragment() {
        for order in [
            ProductOrder::Insertion,
            ProductOrder::ViewsDesc,
            ProductOrder::CreatedDesc,
            ProductOrder::SalesDesc,
            ProductOrder::LikesDesc,
            ProductOrder::PriceAsc,
        ] {
            assert!(order_by(order).starts_with("p.") || order_by(order).starts_with("COALESCE"));
        }
    }

    #[test]
    fn counters_out_of_range_are_storage_errors() {
        assert!(to_i64("delta", u64::MAX).is_err());
        assert!(from_i64("value", -1).is_err());
        assert_eq!(from_i64("value", 7).unwrap(), 7);
    }
}
