use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use shopfront_catalog::{Category, Product, ProductQuery};
use shopfront_core::{CategoryId, ProductId, UserId};

use super::{CatalogStore, CounterField, StoreError, UniqueField};

#[derive(Debug, Default)]
struct Tables {
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    likes: HashSet<(UserId, ProductId)>,
}

impl Tables {
    fn like_counts(&self) -> HashMap<ProductId, u64> {
        let mut counts = HashMap::new();
        for (_, product_id) in &self.likes {
            *counts.entry(*product_id).or_insert(0) += 1;
        }
        counts
    }
}

/// In-memory catalog store.
///
/// Intended for tests/dev. A single lock guards all tables, so every
/// operation (including the uniqueness checks in inserts and the counter
/// increments) is atomic.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn insert_category(&self, category: Category) -> Result<Category, StoreError> {
        let mut tables = self.write()?;
        if tables.categories.values().any(|c| c.slug == category.slug) {
            return Err(StoreError::UniqueViolation {
                field: UniqueField::CategorySlug,
            });
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        Ok(self
            .read()?
            .categories
            .values()
            .find(|c| c.slug.as_str() == slug)
            .cloned())
    }

    fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories: Vec<Category> = self.read()?.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }

    fn set_category_discount(
        &self,
        id: CategoryId,
        discount_percentage: Decimal,
    ) -> Result<Category, StoreError> {
        let mut tables = self.write()?;
        let category = tables.categories.get_mut(&id).ok_or(StoreError::NotFound)?;
        category.discount_percentage = discount_percentage;
        Ok(category.clone())
    }

    fn insert_product(&self, product: Product) -> Result<Product, StoreError> {
        let mut tables = self.write()?;
        if !tables.categories.contains_key(&product.category_id) {
            return Err(StoreError::NotFound);
        }
        for existing in tables.products.values() {
            if existing.sku == product.sku {
                return Err(StoreError::UniqueViolation {
                    field: UniqueField::Sku,
                });
            }
            if existing.slug == product.slug {
                return Err(StoreError::UniqueViolation {
                    field: UniqueField::ProductSlug,
                });
            }
        }
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .read()?
            .products
            .values()
            .find(|p| p.slug.as_str() == slug)
            .cloned())
    }

    fn product_slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.products.values().any(|p| p.slug.as_str() == slug))
    }

    fn query_products(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError> {
        let tables = self.read()?;
        let counts = tables.like_counts();
        Ok(query.select(tables.products.values(), |id| {
            counts.get(&id).copied().unwrap_or(0)
        }))
    }

    fn increment(
        &self,
        id: ProductId,
        field: CounterField,
        delta: u64,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut tables = self.write()?;
        let product = tables.products.get_mut(&id).ok_or(StoreError::NotFound)?;
        let value = match field {
            CounterField::Views => product.record_view(delta, at),
            CounterField::Sales => product.record_sale(delta),
        };
        Ok(value)
    }

    fn add_like(&self, user_id: UserId, product_id: ProductId) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if !tables.products.contains_key(&product_id) {
            return Err(StoreError::NotFound);
        }
        Ok(tables.likes.insert((user_id, product_id)))
    }

    fn remove_like(&self, user_id: UserId, product_id: ProductId) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if !tables.products.contains_key(&product_id) {
            return Err(StoreError::NotFound);
        }
        Ok(tables.likes.remove(&(user_id, product_id)))
    }

    fn like_count(&self, product_id: ProductId) -> Result<u64, StoreError> {
        let tables = self.read()?;
        if !tables.products.contains_key(&product_id) {
            return Err(StoreError::NotFound);
        }
        Ok(tables.likes.iter().filter(|(_, p)| *p == product_id).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    use shopfront_catalog::{NewCategory, NewProduct, Slug};

    fn category(store: &InMemoryCatalogStore, name: &str) -> Category {
        let slug = Slug::parse(shopfront_catalog::slugify(name)).unwrap();
        let category = Category::create(CategoryId::new(), NewCategory::named(name), slug).unwrap();
        store.insert_category(category).unwrap()
    }

    fn product(category: &Category, name: &str, sku: &str) -> Product {
        let slug = Slug::parse(shopfront_catalog::slugify(name)).unwrap();
        Product::create(
            ProductId::new(),
            NewProduct::new(category.id, name, sku, dec!(10)),
            slug,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn insert_product_enforces_unique_sku_and_slug() {
        let store = InMemoryCatalogStore::new();
        let c = category(&store, "Lamps");
        store.insert_product(product(&c, "Desk Lamp", "L-1")).unwrap();

        let err = store.insert_product(product(&c, "Floor Lamp", "L-1")).unwrap_err();
        assert_eq!(
            err,
            StoreError::UniqueViolation {
                field: UniqueField::Sku
            }
        );

        let err = store.insert_product(product(&c, "Desk Lamp", "L-2")).unwrap_err();
        assert_eq!(
            err,
            StoreError::UniqueViolation {
                field: UniqueField::ProductSlug
            }
        );
    }

    #[test]
    fn insert_product_requires_existing_category() {
        let store = InMemoryCatalogStore::new();
        let orphan_category = Category::create(
            CategoryId::new(),
            NewCategory::named("Ghost"),
            Slug::parse("ghost").unwrap(),
        )
        .unwrap();
        let err = store.insert_product(product(&orphan_category, "Lamp", "L-1")).unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[test]
    fn duplicate_category_slug_is_rejected() {
        let store = InMemoryCatalogStore::new();
        category(&store, "Shoes");
        let slug = Slug::parse("shoes").unwrap();
        let dup = Category::create(CategoryId::new(), NewCategory::named("Shoes"), slug).unwrap();
        assert_eq!(
            store.insert_category(dup).unwrap_err(),
            StoreError::UniqueViolation {
                field: UniqueField::CategorySlug
            }
        );
    }

    #[test]
    fn categories_are_listed_by_name() {
        let store = InMemoryCatalogStore::new();
        category(&store, "Toys");
        category(&store, "Books");
        category(&store, "Garden");
        let names: Vec<String> = store
            .list_categories()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Books", "Garden", "Toys"]);
    }

    #[test]
    fn increment_views_stamps_last_viewed() {
        let store = InMemoryCatalogStore::new();
        let c = category(&store, "Lamps");
        let p = store.insert_product(product(&c, "Desk Lamp", "L-1")).unwrap();

        let at = Utc::now() - Duration::minutes(5);
        assert_eq!(store.increment(p.id, CounterField::Views, 1, at).unwrap(), 1);
        assert_eq!(store.increment(p.id, CounterField::Sales, 4, at).unwrap(), 4);

        let loaded = store.get_product(p.id).unwrap().unwrap();
        assert_eq!(loaded.views_count, 1);
        assert_eq!(loaded.sales_count, 4);
        assert_eq!(loaded.last_viewed, Some(at));
    }

    #[test]
    fn increment_unknown_product_is_not_found() {
        let store = InMemoryCatalogStore::new();
        let err = store
            .increment(ProductId::new(), CounterField::Views, 1, Utc::now())
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[test]
    fn concurrent_increments_do_not_lose_updates() {
        let store = Arc::new(InMemoryCatalogStore::new());
        let c = category(&store, "Lamps");
        let p = store.insert_product(product(&c, "Desk Lamp", "L-1")).unwrap();

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.increment(p.id, CounterField::Views, 1, Utc::now()).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.get_product(p.id).unwrap().unwrap().views_count, 100);
    }

    #[test]
    fn likes_are_idempotent_per_user() {
        let store = InMemoryCatalogStore::new();
        let c = category(&store, "Lamps");
        let p = store.insert_product(product(&c, "Desk Lamp", "L-1")).unwrap();
        let alice = UserId::new();
        let bob = UserId::new();

        assert!(store.add_like(alice, p.id).unwrap());
        assert!(!store.add_like(alice, p.id).unwrap());
        assert!(store.add_like(bob, p.id).unwrap());
        assert_eq!(store.like_count(p.id).unwrap(), 2);

        assert!(store.remove_like(alice, p.id).unwrap());
        assert!(!store.remove_like(alice, p.id).unwrap());
        assert_eq!(store.like_count(p.id).unwrap(), 1);
    }

    #[test]
    fn query_orders_by_like_count() {
        let store = InMemoryCatalogStore::new();
        let c = category(&store, "Lamps");
        let a = store.insert_product(product(&c, "A", "A-1")).unwrap();
        let b = store.insert_product(product(&c, "B", "B-1")).unwrap();
        store.add_like(UserId::new(), b.id).unwrap();
        store.add_like(UserId::new(), b.id).unwrap();
        store.add_like(UserId::new(), a.id).unwrap();

        let popular = store.query_products(&ProductQuery::popular(4)).unwrap();
        let ids: Vec<ProductId> = popular.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }
}
