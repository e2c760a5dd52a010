use std::fmt;
use std::iter::Sum;

/// Whole currency units (taka). Prices, discounts and totals never carry fractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Taka(i64);

impl Taka {
    pub const ZERO: Taka = Taka(0);

    pub const fn new(value: i64) -> Self {
        Taka(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    /// `pct` percent of this amount, rounded half-up to the nearest unit.
    ///
    /// Negative amounts round away from zero so `-x.percent(p) == -(x.percent(p))`.
    pub fn percent(self, pct: u8) -> Taka {
        let scaled = self.0.abs() * i64::from(pct);
        let rounded = (scaled + 50) / 100;
        Taka(rounded * self.0.signum())
    }
}

impl fmt::Display for Taka {
    /// en-IN grouping: last three digits, then pairs (`৳1,45,000`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let grouped = if digits.len() <= 3 {
            digits
        } else {
            let (head, tail) = digits.split_at(digits.len() - 3);
            let mut out = String::with_capacity(digits.len() + digits.len() / 2);
            let offset = head.len() % 2;
            for (i, ch) in head.chars().enumerate() {
                if i > 0 && (i + 2 - offset) % 2 == 0 {
                    out.push(',');
                }
                out.push(ch);
            }
            out.push(',');
            out.push_str(tail);
            out
        };

        write!(f, "{sign}৳{grouped}")
    }
}

impl std::ops::Add for Taka {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Taka(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Taka {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Taka(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Taka {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::Mul<u32> for Taka {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Taka(self.0 * i64::from(rhs))
    }
}

impl Sum for Taka {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Taka::ZERO, |acc, x| acc + x)
    }
}
