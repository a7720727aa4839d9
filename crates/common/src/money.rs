//! Monetary amounts and the configured tax rate.

use serde::{Deserialize, Serialize};

/// Money amount in the smallest currency unit to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new amount from minor currency units.
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor currency units.
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies by an item quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0 * i64::from(quantity))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Sales tax rate expressed in basis points (1000 = 10%).
///
/// Stored as an integer so tax computation stays in exact arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    pub fn from_basis_points(bps: u32) -> Self {
        Self(bps)
    }

    /// Returns the rate in basis points.
    pub fn basis_points(&self) -> u32 {
        self.0
    }

    /// Computes the tax on a subtotal, rounded half-up to the nearest
    /// minor unit.
    pub fn tax_on(&self, subtotal: Money) -> Money {
        let scaled = subtotal.minor() * i64::from(self.0);
        Money::from_minor((scaled + 5_000) / 10_000)
    }
}

impl Default for TaxRate {
    /// The standard 10% sales tax.
    fn default() -> Self {
        Self(1_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_from_minor() {
        let money = Money::from_minor(15_000);
        assert_eq!(money.minor(), 15_000);
        assert!(money.is_positive());
    }

    #[test]
    fn money_arithmetic() {
        let a = Money::from_minor(1_000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1_500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!(a.multiply(3).minor(), 3_000);
    }

    #[test]
    fn money_sum_over_iterator() {
        let total: Money = [100, 200, 300]
            .into_iter()
            .map(Money::from_minor)
            .sum();
        assert_eq!(total.minor(), 600);
    }

    #[test]
    fn money_zero_is_default() {
        assert_eq!(Money::default(), Money::zero());
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_positive());
    }

    #[test]
    fn money_serializes_as_bare_number() {
        let json = serde_json::to_string(&Money::from_minor(2_200)).unwrap();
        assert_eq!(json, "2200");
    }

    #[test]
    fn tax_rate_ten_percent() {
        let rate = TaxRate::default();
        assert_eq!(rate.basis_points(), 1_000);
        assert_eq!(rate.tax_on(Money::from_minor(2_000)).minor(), 200);
    }

    #[test]
    fn tax_rate_rounds_half_up() {
        // 10% of 5 = 0.5, rounds up to 1
        let rate = TaxRate::default();
        assert_eq!(rate.tax_on(Money::from_minor(5)).minor(), 1);
        // 10% of 4 = 0.4, rounds down to 0
        assert_eq!(rate.tax_on(Money::from_minor(4)).minor(), 0);
    }

    #[test]
    fn tax_rate_zero() {
        let rate = TaxRate::from_basis_points(0);
        assert_eq!(rate.tax_on(Money::from_minor(10_000)).minor(), 0);
    }
}
