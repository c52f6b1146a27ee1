//! Discount pricing.
//!
//! Prices are rounded to cents with banker's rounding (midpoint to even),
//! the same convention decimal `round()` uses. Anything that shows or totals
//! a price must go through here so the convention stays consistent.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::category::Category;
use crate::product::Product;

/// Decimal places kept on effective prices.
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Round an amount to cents.
pub fn round_price(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(PRICE_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
}

/// `price` reduced by `discount_percentage` percent.
///
/// A zero (or negative) discount returns `price` untouched, without
/// rounding. Range checks on the discount belong to category validation.
pub fn apply_discount(price: Decimal, discount_percentage: Decimal) -> Decimal {
    if discount_percentage <= Decimal::ZERO {
        return price;
    }
    let discount_amount = price * discount_percentage / Decimal::ONE_HUNDRED;
    round_price(price - discount_amount)
}

/// Effective price of `product` given its owning `category`.
///
/// The caller passes the already-loaded pair; the category is expected to be
/// the one `product.category_id` points at.
pub fn effective_price(product: &Product, category: &Category) -> Decimal {
    apply_discount(product.price, category.discount_percentage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use shopfront_core::{CategoryId, ProductId};

    use crate::category::NewCategory;
    use crate::product::NewProduct;
    use crate::slug::Slug;

    fn pair(price: Decimal, discount: Decimal) -> (Product, Category) {
        let category = Category::create(
            CategoryId::new(),
            NewCategory::named("Lighting").with_discount(discount),
            Slug::parse("lighting").unwrap(),
        )
        .unwrap();
        let product = Product::create(
            ProductId::new(),
            NewProduct::new(category.id, "Lamp", "L-1", price),
            Slug::parse("lamp").unwrap(),
            Utc::now(),
        )
        .unwrap();
        (product, category)
    }

    #[test]
    fn zero_discount_returns_list_price_exactly() {
        let (product, category) = pair(dec!(19.99), dec!(0));
        let price = effective_price(&product, &category);
        assert_eq!(price, dec!(19.99));
        assert_eq!(price.scale(), 2);
    }

    #[test]
    fn ten_percent_off_hundred_is_ninety() {
        let (product, category) = pair(dec!(100.00), dec!(10));
        assert_eq!(product.discounted_price(&category), dec!(90.00));
    }

    #[test]
    fn fractional_discount_rounds_to_cents() {
        // 10.00 - 3.333 = 6.667
        let (product, category) = pair(dec!(10.00), dec!(33.33));
        let price = effective_price(&product, &category);
        assert_eq!(price, dec!(6.67));
        assert_eq!(price.scale(), 2);
    }

    #[test]
    fn midpoints_round_to_even() {
        assert_eq!(apply_discount(dec!(0.25), dec!(50)), dec!(0.12));
        assert_eq!(apply_discount(dec!(0.35), dec!(50)), dec!(0.18));
    }

    #[test]
    fn full_discount_is_free() {
        assert_eq!(apply_discount(dec!(42.50), dec!(100)), dec!(0));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                ..ProptestConfig::default()
            })]

            /// Property: a discount in 0-100 never raises the price and never
            /// goes below zero.
            #[test]
            fn discount_stays_between_zero_and_list_price(
                cents in 1i64..10_000_000,
                discount_hundredths in 0i64..=10_000,
            ) {
                let price = Decimal::new(cents, 2);
                let discount = Decimal::new(discount_hundredths, 2);
                let effective = apply_discount(price, discount);
                prop_assert!(effective <= price);
                prop_assert!(effective >= Decimal::ZERO);
                prop_assert!(effective.scale() <= PRICE_DECIMAL_PLACES);
            }

            /// Property: zero discount is the identity.
            #[test]
            fn zero_discount_is_identity(cents in 1i64..10_000_000) {
                let price = Decimal::new(cents, 2);
                prop_assert_eq!(apply_discount(price, Decimal::ZERO), price);
            }
        }
    }
}
