//! Delivery and dasher fee policies.
//!
//! Fees are never computed ad hoc. Each deployment selects one of the named policy constants (see
//! [`FeePolicy::from_name`]), and every order is priced with [`FeePolicy::quote`].
use std::{fmt::Display, str::FromStr};

use dash_common::{BasisPoints, Cents};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::PriceBreakdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFee {
    /// A share of the subtotal, rounded half-up to the nearest cent.
    PercentOfSubtotal(BasisPoints),
    Flat(Cents),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    pub name: &'static str,
    pub delivery: DeliveryFee,
    /// Flat base pay for the dasher. Tips are not supported.
    pub dasher_fee: Cents,
}

#[derive(Debug, Clone, Error)]
#[error("Unknown fee policy: {0}")]
pub struct UnknownFeePolicy(pub String);

/// How the total of an order is paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutSplit {
    pub restaurant: Cents,
    pub dasher: Cents,
    pub platform: Cents,
}

impl From<&PriceBreakdown> for PayoutSplit {
    fn from(price: &PriceBreakdown) -> Self {
        Self { restaurant: price.subtotal, dasher: price.dasher_fee, platform: price.delivery_fee }
    }
}

impl FeePolicy {
    /// 5% of the subtotal for delivery, plus $3.00 for the dasher.
    pub const CAMPUS_STANDARD: FeePolicy = FeePolicy {
        name: "campus_standard",
        delivery: DeliveryFee::PercentOfSubtotal(BasisPoints::from_percent(5)),
        dasher_fee: Cents::new(300),
    };
    /// $3.99 flat for delivery, plus $2.00 for the dasher.
    pub const FLAT_RATE: FeePolicy =
        FeePolicy { name: "flat_rate", delivery: DeliveryFee::Flat(Cents::new(399)), dasher_fee: Cents::new(200) };

    pub const ALL: [FeePolicy; 2] = [FeePolicy::CAMPUS_STANDARD, FeePolicy::FLAT_RATE];

    pub fn from_name(name: &str) -> Option<FeePolicy> {
        let name = name.trim();
        FeePolicy::ALL.into_iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn delivery_fee(&self, subtotal: Cents) -> Cents {
        match self.delivery {
            DeliveryFee::PercentOfSubtotal(bps) => bps.of(subtotal),
            DeliveryFee::Flat(fee) => fee,
        }
    }

    /// Prices an order with the given subtotal. Returns `None` if the total does not fit in the money type.
    ///
    /// Quoting the same subtotal always yields the same breakdown.
    pub fn quote(&self, subtotal: Cents) -> Option<PriceBreakdown> {
        let delivery_fee = self.delivery_fee(subtotal);
        let total = subtotal.checked_add(delivery_fee)?.checked_add(self.dasher_fee)?;
        Some(PriceBreakdown { subtotal, delivery_fee, dasher_fee: self.dasher_fee, total })
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        FeePolicy::CAMPUS_STANDARD
    }
}

impl Display for FeePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for FeePolicy {
    type Err = UnknownFeePolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeePolicy::from_name(s).ok_or_else(|| UnknownFeePolicy(s.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn campus_standard_quote() {
        let quote = FeePolicy::CAMPUS_STANDARD.quote(Cents::from(1300)).unwrap();
        assert_eq!(quote.subtotal, Cents::from(1300));
        assert_eq!(quote.delivery_fee, Cents::from(65));
        assert_eq!(quote.dasher_fee, Cents::from(300));
        assert_eq!(quote.total, Cents::from(1665));
    }

    #[test]
    fn percentage_fee_rounds_half_up() {
        // 5% of $0.10 is half a cent
        assert_eq!(FeePolicy::CAMPUS_STANDARD.delivery_fee(Cents::from(10)), Cents::from(1));
        assert_eq!(FeePolicy::CAMPUS_STANDARD.delivery_fee(Cents::from(9)), Cents::from(0));
    }

    #[test]
    fn flat_rate_ignores_subtotal() {
        let small = FeePolicy::FLAT_RATE.quote(Cents::from(100)).unwrap();
        let large = FeePolicy::FLAT_RATE.quote(Cents::from(100_000)).unwrap();
        assert_eq!(small.delivery_fee, Cents::from(399));
        assert_eq!(large.delivery_fee, Cents::from(399));
        assert_eq!(small.total, Cents::from(699));
    }

    #[test]
    fn quote_overflow() {
        assert!(FeePolicy::FLAT_RATE.quote(Cents::from(i64::MAX - 100)).is_none());
    }

    #[test]
    fn policy_names() {
        assert_eq!(FeePolicy::from_name("campus_standard"), Some(FeePolicy::CAMPUS_STANDARD));
        assert_eq!(" FLAT_RATE ".parse::<FeePolicy>().unwrap(), FeePolicy::FLAT_RATE);
        assert!("free_delivery".parse::<FeePolicy>().is_err());
        assert_eq!(FeePolicy::default().to_string(), "campus_standard");
    }

    #[test]
    fn payout_split_covers_total() {
        let quote = FeePolicy::CAMPUS_STANDARD.quote(Cents::from(1300)).unwrap();
        let split = PayoutSplit::from(&quote);
        assert_eq!(split.restaurant + split.dasher + split.platform, quote.total);
    }
}
