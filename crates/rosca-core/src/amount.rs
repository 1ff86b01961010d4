//! # Fixed-Point Amounts
//!
//! Monetary values are stablecoin amounts with 6 fractional digits. They are
//! stored as an integer count of micro-units and never pass through a float.
//!
//! ## Round-trip guarantee
//!
//! An [`Amount`] remembers how many fractional digits it was written with,
//! so `Amount::parse(s)?.to_string() == s` for every canonical decimal
//! string with at most 6 fractional digits (`"100.00"` stays `"100.00"`,
//! `"0.000001"` stays `"0.000001"`). Equality, ordering, and hashing are by
//! value only: `"100"` and `"100.00"` are equal amounts.
//!
//! ## Canonical input
//!
//! - digits only, optionally one `.` followed by 1–6 digits
//! - no sign, exponent, whitespace, or thousands separator
//! - no leading zeros in the integer part except a lone `0`

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AmountError;

/// Number of fractional digits carried by every amount.
pub const AMOUNT_DECIMALS: u8 = 6;

/// Micro-units per whole unit.
const UNIT: u128 = 1_000_000;

/// A non-negative fixed-point amount with 6 fractional digits.
#[derive(Debug, Clone, Copy)]
pub struct Amount {
    micros: u128,
    frac_digits: u8,
}

impl Amount {
    /// The zero amount, rendered as `"0"`.
    pub const ZERO: Amount = Amount {
        micros: 0,
        frac_digits: 0,
    };

    /// Parse a canonical decimal string.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        if input.is_empty() {
            return Err(AmountError::Empty);
        }
        let invalid = |reason: &'static str| AmountError::Invalid {
            input: input.to_string(),
            reason,
        };

        let (int_part, frac_part) = match input.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (input, None),
        };

        if int_part.is_empty() {
            return Err(invalid("missing integer part"));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("integer part must contain only digits"));
        }
        if int_part.len() > 1 && int_part.starts_with('0') {
            return Err(invalid("leading zeros are not allowed"));
        }

        let whole: u128 = int_part
            .parse()
            .map_err(|_| AmountError::Overflow(input.to_string()))?;

        let (frac_micros, frac_digits) = match frac_part {
            None => (0u128, 0u8),
            Some("") => return Err(invalid("missing fractional digits after '.'")),
            Some(f) => {
                if !f.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid("fractional part must contain only digits"));
                }
                if f.len() > AMOUNT_DECIMALS as usize {
                    return Err(AmountError::TooManyFractionalDigits {
                        input: input.to_string(),
                        digits: f.len(),
                        max: AMOUNT_DECIMALS,
                    });
                }
                let value: u128 = f
                    .parse()
                    .map_err(|_| invalid("fractional part must contain only digits"))?;
                let pad = 10u128.pow(u32::from(AMOUNT_DECIMALS) - f.len() as u32);
                // f.len() <= 6 so the cast cannot truncate.
                (value * pad, f.len() as u8)
            }
        };

        let micros = whole
            .checked_mul(UNIT)
            .and_then(|m| m.checked_add(frac_micros))
            .ok_or_else(|| AmountError::Overflow(input.to_string()))?;

        Ok(Self {
            micros,
            frac_digits,
        })
    }

    /// Build an amount from raw micro-units, rendered with the fewest
    /// fractional digits that represent it exactly.
    pub fn from_micros(micros: u128) -> Self {
        let mut frac_digits = AMOUNT_DECIMALS;
        let mut rest = micros % UNIT;
        if rest == 0 {
            frac_digits = 0;
        } else {
            while rest % 10 == 0 {
                rest /= 10;
                frac_digits -= 1;
            }
        }
        Self {
            micros,
            frac_digits,
        }
    }

    /// Raw micro-units.
    pub fn micros(&self) -> u128 {
        self.micros
    }

    /// Fractional digits this amount renders with.
    pub fn frac_digits(&self) -> u8 {
        self.frac_digits
    }

    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.micros == 0
    }

    /// Multiply by a member count, keeping the rendering width.
    pub fn checked_mul(&self, factor: u64) -> Result<Self, AmountError> {
        let micros = self
            .micros
            .checked_mul(u128::from(factor))
            .ok_or_else(|| AmountError::Overflow(format!("{self} * {factor}")))?;
        Ok(Self {
            micros,
            frac_digits: self.frac_digits,
        })
    }

    /// Add two amounts, rendering with the wider of the two widths.
    pub fn checked_add(&self, other: &Amount) -> Result<Self, AmountError> {
        let micros = self
            .micros
            .checked_add(other.micros)
            .ok_or_else(|| AmountError::Overflow(format!("{self} + {other}")))?;
        Ok(Self {
            micros,
            frac_digits: self.frac_digits.max(other.frac_digits),
        })
    }

    /// Render as a decimal string.
    pub fn format(&self) -> String {
        let whole = self.micros / UNIT;
        if self.frac_digits == 0 {
            return whole.to_string();
        }
        let frac = format!("{:06}", self.micros % UNIT);
        format!("{whole}.{}", &frac[..self.frac_digits as usize])
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.micros == other.micros
    }
}

impl Eq for Amount {}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.micros.cmp(&other.micros)
    }
}

impl std::hash::Hash for Amount {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.micros.hash(state);
    }
}

impl std::str::FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_whole_and_fractional() {
        assert_eq!(Amount::parse("100").unwrap().micros(), 100_000_000);
        assert_eq!(Amount::parse("100.00").unwrap().micros(), 100_000_000);
        assert_eq!(Amount::parse("0.000001").unwrap().micros(), 1);
        assert_eq!(Amount::parse("12.5").unwrap().micros(), 12_500_000);
    }

    #[test]
    fn format_preserves_written_width() {
        for s in ["100.00", "0.000001", "100", "0", "7.10", "123456.123456"] {
            assert_eq!(Amount::parse(s).unwrap().format(), s);
        }
    }

    #[test]
    fn equality_is_by_value() {
        assert_eq!(Amount::parse("100").unwrap(), Amount::parse("100.000").unwrap());
        assert!(Amount::parse("0.5").unwrap() < Amount::parse("0.50001").unwrap());
    }

    #[test]
    fn rejects_non_canonical() {
        assert_eq!(Amount::parse(""), Err(AmountError::Empty));
        for s in ["-1", "+1", "1e3", " 1", "1 ", "01", "00.5", ".5", "1.", "1.2.3", "1,000", "abc"] {
            assert!(Amount::parse(s).is_err(), "{s:?} should be rejected");
        }
    }

    #[test]
    fn rejects_seven_fractional_digits() {
        match Amount::parse("1.0000001") {
            Err(AmountError::TooManyFractionalDigits { digits, max, .. }) => {
                assert_eq!(digits, 7);
                assert_eq!(max, 6);
            }
            other => panic!("expected TooManyFractionalDigits, got {other:?}"),
        }
    }

    #[test]
    fn overflow_detected() {
        let huge = "9".repeat(40);
        assert!(matches!(Amount::parse(&huge), Err(AmountError::Overflow(_))));
    }

    #[test]
    fn from_micros_uses_minimal_width() {
        assert_eq!(Amount::from_micros(1_000_000).to_string(), "1");
        assert_eq!(Amount::from_micros(1_500_000).to_string(), "1.5");
        assert_eq!(Amount::from_micros(1).to_string(), "0.000001");
        assert_eq!(Amount::from_micros(0).to_string(), "0");
    }

    #[test]
    fn pool_multiplication_keeps_width() {
        let monthly = Amount::parse("100.00").unwrap();
        let pool = monthly.checked_mul(3).unwrap();
        assert_eq!(pool.to_string(), "300.00");
        assert!(Amount::from_micros(u128::MAX).checked_mul(2).is_err());
    }

    #[test]
    fn addition_takes_wider_width() {
        let a = Amount::parse("1.5").unwrap();
        let b = Amount::parse("2.25").unwrap();
        assert_eq!(a.checked_add(&b).unwrap().to_string(), "3.75");
    }

    #[test]
    fn serde_as_string() {
        let a: Amount = serde_json::from_str("\"100.00\"").unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"100.00\"");
        assert!(serde_json::from_str::<Amount>("\"1.2345678\"").is_err());
    }

    proptest! {
        #[test]
        fn parse_format_roundtrip(whole in 0u64..1_000_000_000_000, digits in 0usize..=6, frac in 0u64..1_000_000) {
            let s = if digits == 0 {
                whole.to_string()
            } else {
                let frac = frac % 10u64.pow(digits as u32);
                format!("{whole}.{frac:0width$}", width = digits)
            };
            let parsed = Amount::parse(&s).unwrap();
            prop_assert_eq!(parsed.format(), s);
        }
    }
}
