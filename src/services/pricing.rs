//! Money arithmetic shared by carts, checkout and product pages.
//!
//! VAT is computed per line and rounded to cents there; order totals are plain
//! sums of the rounded line values so that items always add up to the order.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// VAT due on `amount` at `vat_rate` percent.
pub fn vat_on(amount: Decimal, vat_rate: Decimal) -> Decimal {
    cents(amount * vat_rate / HUNDRED)
}

/// Shelf price including VAT.
pub fn gross_price(price: Decimal, vat_rate: Decimal) -> Decimal {
    cents(price + vat_on(price, vat_rate))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct LineTotals {
    pub quantity: i32,
    pub unit_price: Decimal,
    pub vat_rate: Decimal,
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
}

impl LineTotals {
    pub fn compute(unit_price: Decimal, quantity: i32, vat_rate: Decimal) -> Self {
        let subtotal = cents(unit_price * Decimal::from(quantity));
        let vat_amount = vat_on(subtotal, vat_rate);
        Self {
            quantity,
            unit_price,
            vat_rate,
            subtotal,
            vat_amount,
            total: subtotal + vat_amount,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartTotals {
    pub item_count: i32,
    pub subtotal: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a LineTotals>,
    {
        lines.into_iter().fold(Self::default(), |acc, line| Self {
            item_count: acc.item_count + line.quantity,
            subtotal: acc.subtotal + line.subtotal,
            vat_amount: acc.vat_amount + line.vat_amount,
            total: acc.total + line.total,
        })
    }
}

/// One point per whole currency unit spent.
pub fn points_for(total: Decimal) -> i32 {
    total.trunc().to_i32().unwrap_or(i32::MAX).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn line_vat_rounds_half_away_from_zero() {
        // 3 x 10.55 = 31.65, 16% = 5.064
        let line = LineTotals::compute(dec!(10.55), 3, dec!(16.00));
        assert_eq!(line.subtotal, dec!(31.65));
        assert_eq!(line.vat_amount, dec!(5.06));
        assert_eq!(line.total, dec!(36.71));

        // 0.25 x 1 at 10% = 0.025 -> 0.03
        let line = LineTotals::compute(dec!(0.25), 1, dec!(10));
        assert_eq!(line.vat_amount, dec!(0.03));
    }

    #[test]
    fn cart_totals_equal_the_sum_of_line_totals() {
        let lines = vec![
            LineTotals::compute(dec!(120.00), 2, dec!(16.00)),
            LineTotals::compute(dec!(33.33), 3, dec!(16.00)),
            LineTotals::compute(dec!(50.00), 1, dec!(0.00)),
        ];
        let totals = CartTotals::from_lines(&lines);
        let sum_of_totals: Decimal = lines.iter().map(|l| l.total).sum();
        assert_eq!(totals.total, sum_of_totals);
        assert_eq!(totals.subtotal + totals.vat_amount, totals.total);
        assert_eq!(totals.item_count, 6);
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let totals = CartTotals::from_lines(&[]);
        assert_eq!(totals.total, Decimal::ZERO);
        assert_eq!(totals.item_count, 0);
    }

    #[test]
    fn gross_price_adds_vat() {
        assert_eq!(gross_price(dec!(100.00), dec!(16.00)), dec!(116.00));
        assert_eq!(gross_price(dec!(99.99), dec!(0)), dec!(99.99));
    }

    #[test]
    fn points_truncate_fractional_currency() {
        assert_eq!(points_for(dec!(1234.99)), 1234);
        assert_eq!(points_for(dec!(0.99)), 0);
    }
}
