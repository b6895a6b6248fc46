// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 hdds.io contributors

//! Reference [`Serializer`]/[`Comparator`] implementations, concrete enough
//! to exercise and benchmark a chunk standalone: `u64` keys in big-endian
//! byte order (so lexicographic byte comparison agrees with numeric order)
//! and raw `Vec<u8>` values.

use crate::collaborators::{Comparator, Serializer};
use std::cmp::Ordering;

/// Serializes values as their raw bytes, unchanged.
pub struct BytesSerializer;

impl Serializer<Vec<u8>> for BytesSerializer {
    fn calculate_size(&self, value: &Vec<u8>) -> usize {
        value.len()
    }

    fn serialize(&self, value: &Vec<u8>, out: &mut [u8]) {
        out.copy_from_slice(value);
    }
}

/// Orders `u64` keys numerically, storing them big-endian so a byte-wise
/// comparison of the serialized form agrees with numeric order.
pub struct U64Comparator;

impl Comparator<u64> for U64Comparator {
    fn compare_keys(&self, a: &u64, b: &u64) -> Ordering {
        a.cmp(b)
    }

    fn compare(&self, key: &u64, serialized: &[u8]) -> Ordering {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&serialized[..8]);
        key.cmp(&u64::from_be_bytes(buf))
    }

    fn calculate_size(&self, _key: &u64) -> usize {
        8
    }

    fn serialize(&self, key: &u64, out: &mut [u8]) {
        out.copy_from_slice(&key.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_serializer_round_trips() {
        let ser = BytesSerializer;
        let value = vec![1, 2, 3, 4];
        let mut out = vec![0u8; ser.calculate_size(&value)];
        ser.serialize(&value, &mut out);
        assert_eq!(out, value);
    }

    #[test]
    fn u64_comparator_orders_numerically_via_bytes() {
        let cmp = U64Comparator;
        let mut out = [0u8; 8];
        cmp.serialize(&500u64, &mut out);
        assert_eq!(cmp.compare(&10u64, &out), Ordering::Less);
        assert_eq!(cmp.compare(&500u64, &out), Ordering::Equal);
        assert_eq!(cmp.compare(&900u64, &out), Ordering::Greater);
    }

    #[test]
    fn u64_comparator_compare_keys_matches_compare_bytes() {
        let cmp = U64Comparator;
        let mut out = [0u8; 8];
        for (a, b) in [(1u64, 2u64), (9, 9), (100, 3)] {
            cmp.serialize(&b, &mut out);
            assert_eq!(cmp.compare_keys(&a, &b), cmp.compare(&a, &out));
        }
    }
}
