pub mod clients;
pub mod invoices;
pub mod payments;
pub mod users;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Boundary check for monetary inputs. The totals calculator itself is
/// deliberately unchecked; rejection happens here, before a request reaches
/// the services.
pub fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_negative_amounts() {
        assert!(validate_non_negative(&dec!(-0.01)).is_err());
        assert!(validate_non_negative(&dec!(0)).is_ok());
        assert!(validate_non_negative(&dec!(10.50)).is_ok());
    }
}
