//! Local analysis primitives
//!
//! Pure single-rank helpers used by the identifier trait table: min/max scan,
//! consecutiveness scan and the byte-fold hash.

use crate::identifier::Ordinal;

const HASH_LANES: usize = std::mem::size_of::<i32>();

/// Single-pass `(min, max)` of `values`.
///
/// Empty input yields the inverted pair `(O::MAX, O::MIN)`; callers must check
/// the length before trusting the result.
pub fn local_min_max<O: Ordinal>(values: &[O]) -> (O, O) {
    values
        .iter()
        .fold((O::MAX, O::MIN), |(min, max), &v| (min.min(v), max.max(v)))
}

/// Fold bytes into a non-negative 32-bit hash.
///
/// Byte `i` is added (wrapping, without carry) into lane `i % 4` of a
/// little-endian accumulator, which is then read as `i32` and made
/// non-negative. Distinct inputs may collide.
pub fn byte_fold_hash(bytes: &[u8]) -> i32 {
    let mut lanes = [0u8; HASH_LANES];
    for (i, b) in bytes.iter().enumerate() {
        let lane = &mut lanes[i % HASH_LANES];
        *lane = lane.wrapping_add(*b);
    }
    normalize_hash(i32::from_le_bytes(lanes))
}

/// Clear the sign of a hash. `i32::MIN` has no positive counterpart and maps to 0.
pub fn normalize_hash(hash: i32) -> i32 {
    hash.wrapping_abs() & i32::MAX
}

/// Whether `values` is `v0, v0 + 1, ..., v0 + n - 1`.
///
/// Checks the endpoint spacing and every adjacent gap, including the last one.
/// Empty input is trivially consecutive.
pub fn is_locally_consecutive<O: Ordinal>(values: &[O]) -> bool {
    let (first, last) = match (values.first(), values.last()) {
        (Some(first), Some(last)) => (first.to_i128(), last.to_i128()),
        _ => return true,
    };
    if last - first + 1 != values.len() as i128 {
        return false;
    }
    values
        .windows(2)
        .all(|w| w[1].to_i128() == w[0].to_i128() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max_scan() {
        assert_eq!(local_min_max(&[5i32, -2, 9, 0]), (-2, 9));
        assert_eq!(local_min_max(&[4u8]), (4, 4));
        // ascending input still updates both ends
        assert_eq!(local_min_max(&[1u16, 2, 3]), (1, 3));
    }

    #[test]
    fn test_min_max_empty_is_inverted() {
        assert_eq!(local_min_max::<u16>(&[]), (u16::MAX, u16::MIN));
        assert_eq!(local_min_max::<i64>(&[]), (i64::MAX, i64::MIN));
    }

    #[test]
    fn test_byte_fold_lanes() {
        assert_eq!(byte_fold_hash(&[]), 0);
        assert_eq!(byte_fold_hash(&[1, 2, 3]), 0x0003_0201);
        // byte 4 wraps back onto lane 0
        assert_eq!(byte_fold_hash(&[1, 0, 0, 0, 2]), 3);
        // no carry between lanes
        assert_eq!(byte_fold_hash(&[0xff, 0, 0, 0, 0x02]), 1);
    }

    #[test]
    fn test_byte_fold_clears_sign() {
        // lanes read as 0xff000000, a negative i32
        let h = byte_fold_hash(&[0, 0, 0, 0xff]);
        assert!(h >= 0);
        assert_eq!(h, 0x0100_0000);
    }

    #[test]
    fn test_normalize_hash() {
        assert_eq!(normalize_hash(-7), 7);
        assert_eq!(normalize_hash(i32::MIN), 0);
        assert_eq!(normalize_hash(i32::MAX), i32::MAX);
    }

    #[test]
    fn test_consecutive_scan() {
        assert!(is_locally_consecutive::<u32>(&[]));
        assert!(is_locally_consecutive(&[7u32]));
        assert!(is_locally_consecutive(&[-2i8, -1, 0, 1]));
        assert!(!is_locally_consecutive(&[0u32, 2, 1]));
        // endpoints match but the interior repeats
        assert!(!is_locally_consecutive(&[0u32, 0, 2]));
    }

    #[test]
    fn test_consecutive_scan_rejects_interior_gaps() {
        // spacing of the endpoints holds, an interior step is wrong
        assert!(!is_locally_consecutive(&[0i32, 1, 1, 3]));
        assert!(!is_locally_consecutive(&[10u64, 11, 13, 13]));
    }
}
