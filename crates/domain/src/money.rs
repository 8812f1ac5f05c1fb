//! Money in integer minor currency units.

use serde::{Deserialize, Serialize};

/// An amount of money in minor currency units (e.g. paise, cents).
///
/// Serialized as a bare integer. Amounts sent to the payment gateway are
/// exactly `minor()`, so no float rounding happens on the way out.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Whole major units (rupees, dollars) to minor units.
    pub fn from_major(major: i64) -> Self {
        Self(major.saturating_mul(100))
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn minor(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Price of `quantity` units, `None` on overflow.
    pub fn checked_times(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtracts `other`, clamping the result at zero.
    pub fn saturating_sub_floor(&self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }

    /// `percent` of this amount, rounded half away from zero to a whole
    /// minor unit.
    pub fn percent(&self, percent: f64) -> Money {
        Money((self.0 as f64 * percent / 100.0).round() as i64)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_major_scales_by_hundred() {
        assert_eq!(Money::from_major(1000).minor(), 100_000);
    }

    #[test]
    fn display_has_two_decimals() {
        assert_eq!(Money::from_minor(123_456).to_string(), "1234.56");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::from_minor(-250).to_string(), "-2.50");
    }

    #[test]
    fn saturating_sub_never_goes_negative() {
        let a = Money::from_minor(500);
        assert_eq!(a.saturating_sub_floor(Money::from_minor(200)).minor(), 300);
        assert_eq!(a.saturating_sub_floor(Money::from_minor(900)), Money::zero());
    }

    #[test]
    fn percent_of_round_amounts_is_exact() {
        assert_eq!(Money::from_major(1000).percent(10.0), Money::from_major(100));
        assert_eq!(Money::from_minor(999).percent(50.0).minor(), 500);
    }

    #[test]
    fn sum_and_checked_times() {
        let total: Money = [Money::from_minor(100), Money::from_minor(250).checked_times(2).unwrap()]
            .into_iter()
            .sum();
        assert_eq!(total.minor(), 600);
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        let huge = Money::from_minor(i64::MAX / 2);
        assert_eq!(huge.checked_times(3), None);
        assert_eq!(huge.checked_add(huge), Some(Money::from_minor(i64::MAX - 1)));
        assert_eq!(huge.checked_add(Money::from_minor(i64::MAX)), None);
        assert_eq!(Money::from_minor(i64::MAX) + Money::from_minor(1), Money::from_minor(i64::MAX));
        assert_eq!(Money::from_minor(i64::MIN).to_string(), "-92233720368547758.08");
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Money::from_minor(4200)).unwrap(), "4200");
    }
}
