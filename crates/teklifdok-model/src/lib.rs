//! # teklifdok-model
//!
//! Business record types for the teklifdok composition engine.
//!
//! These are the in-memory structures a composition request starts from:
//! an offer ([`Offer`]) with its line items and totals, or a chimney
//! ([`Chimney`]) with its measured parameter sets. All entities are built
//! fresh per export request and discarded once the document is emitted.

pub mod chimney;
pub mod fields;
pub mod offer;

pub use chimney::{Chimney, ParameterReading};
pub use fields::{build_field_map, FieldMap};
pub use offer::{LineItem, Numeric, Offer, OfferTotals};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Round a monetary value to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(1.23678), 1.24);
        assert_eq!(round2(299.999), 300.0);
        assert_eq!(round2(0.0), 0.0);
    }
}
