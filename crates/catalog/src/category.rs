use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopfront_core::{CategoryId, DomainError, DomainResult};

use crate::slug::Slug;

/// Catalog category. Every product belongs to exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    /// Discount applied to every product in the category, 0-100.
    pub discount_percentage: Decimal,
    pub image_url: Option<String>,
}

/// Input for creating a category (what an administrator fills in).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    /// Leave empty to derive the slug from the name.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewCategory {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_discount(mut self, discount_percentage: Decimal) -> Self {
        self.discount_percentage = discount_percentage;
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }
}

/// Reject discounts outside 0-100 or with more than two decimal places.
pub fn validate_discount(discount_percentage: Decimal) -> DomainResult<()> {
    if discount_percentage < Decimal::ZERO || discount_percentage > Decimal::ONE_HUNDRED {
        return Err(DomainError::validation(format!(
            "discount percentage must be between 0 and 100, got {discount_percentage}"
        )));
    }
    if discount_percentage.round_dp(2) != discount_percentage {
        return Err(DomainError::validation(
            "discount percentage allows at most 2 decimal places",
        ));
    }
    Ok(())
}

impl Category {
    /// Build a category from validated input and an already-assigned slug.
    pub fn create(id: CategoryId, input: NewCategory, slug: Slug) -> DomainResult<Self> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        validate_discount(input.discount_percentage)?;

        Ok(Self {
            id,
            name: name.to_string(),
            slug,
            discount_percentage: input.discount_percentage,
            image_url: input.image_url.filter(|url| !url.trim().is_empty()),
        })
    }

    pub fn has_discount(&self) -> bool {
        self.discount_percentage > Decimal::ZERO
    }

    /// Canonical storefront path for the category page.
    pub fn path(&self) -> String {
        format!("/category/{}", self.slug)
    }
}
