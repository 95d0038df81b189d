use crate::error::{ArgPosition, ChaincodeError, ChaincodeResult};

/// Reject argument lists whose length differs from `expected`.
pub fn expect_arity(args: &[String], expected: usize) -> ChaincodeResult<()> {
    if args.len() != expected {
        return Err(ChaincodeError::IncorrectArgumentCount {
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

/// `value` must be non-empty. `position` is 1-based.
pub fn require_non_empty(value: &str, position: usize) -> ChaincodeResult<&str> {
    if value.is_empty() {
        return Err(ChaincodeError::EmptyArgument {
            position: ArgPosition(position),
        });
    }
    Ok(value)
}

/// `value` must be a non-empty base-10 integer.
pub fn parse_numeric(value: &str, position: usize) -> ChaincodeResult<i64> {
    require_non_empty(value, position)?
        .parse()
        .map_err(|_| ChaincodeError::NotNumeric {
            position: ArgPosition(position),
        })
}
