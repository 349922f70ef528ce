//! Text identifiers

use super::{sealed, Identifier};
use crate::errors::{GidError, Result};
use crate::primitives::byte_fold_hash;

impl sealed::Sealed for String {}

/// Strings hash by their UTF-8 bytes and support nothing ordinal.
impl Identifier for String {
    fn type_name() -> String {
        "String".to_string()
    }

    fn byte_width() -> Option<usize> {
        None
    }

    fn is_ordinal() -> bool {
        false
    }

    fn has_unique_key() -> bool {
        false
    }

    fn hash_code(&self) -> Result<i32> {
        Ok(byte_fold_hash(self.as_bytes()))
    }

    fn key(&self) -> Result<f64> {
        Err(invalid("key"))
    }

    fn stringify(&self) -> Result<String> {
        Ok(self.clone())
    }

    fn difference(_a: &Self, _b: &Self) -> Result<Self> {
        Err(invalid("difference"))
    }

    fn ordinal_value(&self) -> Result<i128> {
        Err(invalid("ordinal_value"))
    }

    fn from_ordinal_value(_value: i128) -> Result<Self> {
        Err(invalid("from_ordinal_value"))
    }

    fn local_min_max(_values: &[Self]) -> Result<(Self, Self)> {
        Err(invalid("local_min_max"))
    }

    fn are_consecutive(_values: &[Self]) -> Result<bool> {
        Err(invalid("are_consecutive"))
    }
}

fn invalid(operation: &str) -> GidError {
    GidError::invalid_operation(String::type_name(), operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_string_hash_folds_utf8_bytes() {
        let id = "node-17".to_string();
        assert_eq!(id.hash_code().unwrap(), byte_fold_hash(b"node-17"));
        assert_eq!(id.hash_code().unwrap(), id.clone().hash_code().unwrap());
    }

    #[test]
    fn test_string_rejects_ordinal_operations() {
        let a = "a".to_string();
        let b = "b".to_string();
        assert_matches!(a.key(), Err(GidError::InvalidOperation { .. }));
        assert_matches!(String::difference(&a, &b), Err(GidError::InvalidOperation { .. }));
        assert_matches!(
            String::local_min_max(&[a.clone(), b.clone()]),
            Err(GidError::InvalidOperation { ref operation, .. }) if operation == "local_min_max"
        );
        assert_matches!(String::are_consecutive(&[a, b]), Err(GidError::InvalidOperation { .. }));
    }

    #[test]
    fn test_string_stringify_is_verbatim() {
        assert_eq!("élément 3".to_string().stringify().unwrap(), "élément 3");
    }
}
