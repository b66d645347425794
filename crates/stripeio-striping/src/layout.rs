//! Stripe layout arithmetic
//!
//! Maps file byte ranges to object extents. Both translators share this
//! walk; they differ only in how they attach the caller's buffer.

use crate::error::{StripeError, StripeResult};
use std::iter::FusedIterator;
use stripeio_common::{ObjectNumber, StripingPolicy, TargetIndex};
use tracing::warn;

/// Highest addressable file offset (exclusive end of any request)
const MAX_FILE_OFFSET: u64 = i64::MAX.unsigned_abs();

/// The part of a request that falls inside a single object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectExtent {
    /// Object touched by this extent
    pub object_number: ObjectNumber,
    /// Byte offset within the object where the extent starts
    pub intra_object_offset: u64,
    /// Byte offset within the request buffer where the extent starts
    pub buffer_offset: usize,
    /// Number of bytes in this extent (always > 0)
    pub length: usize,
}

/// Validated view of an ordered, non-empty policy collection
///
/// The first policy decides the object size for all boundary computation;
/// every policy contributes its own target index per object.
#[derive(Debug, Clone, Copy)]
pub struct StripeLayout<'p> {
    object_size: u64,
    policies: &'p [StripingPolicy],
}

impl<'p> StripeLayout<'p> {
    /// Validate a policy collection
    ///
    /// Fails if the collection is empty or any policy has a zero stripe
    /// size or width.
    pub fn new(policies: &'p [StripingPolicy]) -> StripeResult<Self> {
        let first = policies.first().ok_or(StripeError::EmptyPolicySet)?;

        for (index, policy) in policies.iter().enumerate() {
            policy
                .validate()
                .map_err(|reason| StripeError::InvalidPolicy { index, reason })?;
        }

        let object_size = first.object_size();
        if let Some((index, other)) = policies
            .iter()
            .enumerate()
            .find(|(_, p)| p.object_size() != object_size)
        {
            warn!(
                "Policy {} has object size {} bytes, first policy has {} bytes; using the first",
                index,
                other.object_size(),
                object_size
            );
        }

        Ok(Self {
            object_size,
            policies,
        })
    }

    /// Object size in bytes (taken from the first policy)
    #[must_use]
    pub const fn object_size(&self) -> u64 {
        self.object_size
    }

    /// The policies this layout was built from
    #[must_use]
    pub const fn policies(&self) -> &'p [StripingPolicy] {
        self.policies
    }

    /// Target index of an object under every policy, in policy order
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // remainder is below width, a u32
    pub fn target_indices(&self, object_number: ObjectNumber) -> Vec<TargetIndex> {
        self.policies
            .iter()
            .map(|p| (object_number % u64::from(p.width)) as TargetIndex)
            .collect()
    }

    /// Walk a request of `size` bytes starting at file `offset`
    ///
    /// Yields one extent per object touched, in ascending object order.
    /// Fails if the offset is negative or the request ends past the
    /// largest signed 64-bit file offset.
    pub fn extents(&self, offset: i64, size: usize) -> StripeResult<ExtentIter> {
        let file_offset = checked_range(offset, size)?;
        Ok(ExtentIter {
            object_size: self.object_size,
            file_offset,
            size,
            cursor: 0,
        })
    }

    /// Number of extents a request produces, without walking it
    pub fn object_count(&self, offset: i64, size: usize) -> StripeResult<usize> {
        Ok(self.extents(offset, size)?.len())
    }
}

fn checked_range(offset: i64, size: usize) -> StripeResult<u64> {
    let invalid = || StripeError::InvalidRange { offset, size };

    let start = u64::try_from(offset).map_err(|_| invalid())?;
    let end = u64::try_from(size)
        .ok()
        .and_then(|s| start.checked_add(s))
        .ok_or_else(invalid)?;
    if end > MAX_FILE_OFFSET {
        return Err(invalid());
    }
    Ok(start)
}

/// Iterator over the object extents of a request
#[derive(Debug, Clone)]
pub struct ExtentIter {
    object_size: u64,
    file_offset: u64,
    size: usize,
    cursor: usize,
}

impl Iterator for ExtentIter {
    type Item = ObjectExtent;

    fn next(&mut self) -> Option<ObjectExtent> {
        if self.cursor >= self.size {
            return None;
        }

        let position = self.file_offset + self.cursor as u64;
        let object_number = position / self.object_size;
        let intra_object_offset = position % self.object_size;
        let remaining = (self.size - self.cursor) as u64;

        // bounded by `remaining`, which came from a usize
        #[allow(clippy::cast_possible_truncation)]
        let length = remaining.min(self.object_size - intra_object_offset) as usize;

        let extent = ObjectExtent {
            object_number,
            intra_object_offset,
            buffer_offset: self.cursor,
            length,
        };
        self.cursor += length;
        Some(extent)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining_objects();
        (n, Some(n))
    }
}

impl ExtentIter {
    #[allow(clippy::cast_possible_truncation)] // never more objects than remaining bytes
    fn remaining_objects(&self) -> usize {
        if self.cursor >= self.size {
            return 0;
        }
        let first = (self.file_offset + self.cursor as u64) / self.object_size;
        let last = (self.file_offset + self.size as u64 - 1) / self.object_size;
        (last - first + 1) as usize
    }
}

impl ExactSizeIterator for ExtentIter {}

impl FusedIterator for ExtentIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use stripeio_common::PolicyError;

    #[test]
    fn test_rejects_empty_policy_set() {
        let err = StripeLayout::new(&[]).unwrap_err();
        assert!(matches!(err, StripeError::EmptyPolicySet));
    }

    #[test]
    fn test_rejects_zero_fields_with_index() {
        let policies = [StripingPolicy::raid0(64, 4), StripingPolicy::raid0(64, 0)];
        let err = StripeLayout::new(&policies).unwrap_err();
        assert!(matches!(
            err,
            StripeError::InvalidPolicy {
                index: 1,
                reason: PolicyError::ZeroWidth
            }
        ));

        let policies = [StripingPolicy::raid0(0, 4)];
        let err = StripeLayout::new(&policies).unwrap_err();
        assert!(matches!(
            err,
            StripeError::InvalidPolicy {
                index: 0,
                reason: PolicyError::ZeroStripeSize
            }
        ));
    }

    #[test]
    fn test_first_policy_governs_object_size() {
        let policies = [StripingPolicy::raid0(64, 4), StripingPolicy::raid0(128, 8)];
        let layout = StripeLayout::new(&policies).unwrap();
        assert_eq!(layout.object_size(), 64 * 1024);
    }

    #[test]
    fn test_target_indices_per_policy() {
        let policies = [StripingPolicy::raid0(64, 4), StripingPolicy::raid0(64, 8)];
        let layout = StripeLayout::new(&policies).unwrap();
        assert_eq!(layout.target_indices(5), vec![1, 5]);
        assert_eq!(layout.target_indices(0), vec![0, 0]);
        assert_eq!(layout.target_indices(12), vec![0, 4]);
    }

    #[test]
    fn test_extents_spanning_objects() {
        let policies = [StripingPolicy::raid0(64, 4)];
        let layout = StripeLayout::new(&policies).unwrap();

        let extents: Vec<_> = layout.extents(40_000, 150_000).unwrap().collect();
        assert_eq!(
            extents,
            vec![
                ObjectExtent {
                    object_number: 0,
                    intra_object_offset: 40_000,
                    buffer_offset: 0,
                    length: 25_536,
                },
                ObjectExtent {
                    object_number: 1,
                    intra_object_offset: 0,
                    buffer_offset: 25_536,
                    length: 65_536,
                },
                ObjectExtent {
                    object_number: 2,
                    intra_object_offset: 0,
                    buffer_offset: 91_072,
                    length: 58_928,
                },
            ]
        );
    }

    #[test]
    fn test_extent_iter_exact_size() {
        let policies = [StripingPolicy::raid0(4, 2)];
        let layout = StripeLayout::new(&policies).unwrap();

        let mut iter = layout.extents(1000, 10_000).unwrap();
        // bytes 1000..11000 touch objects 0, 1 and 2
        assert_eq!(iter.len(), 3);
        iter.next();
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.count(), 2);

        assert_eq!(layout.object_count(0, 4096).unwrap(), 1);
        assert_eq!(layout.object_count(4095, 2).unwrap(), 2);
        assert_eq!(layout.object_count(123, 0).unwrap(), 0);
    }

    #[test]
    fn test_empty_request() {
        let policies = [StripingPolicy::raid0(64, 4)];
        let layout = StripeLayout::new(&policies).unwrap();
        assert_eq!(layout.extents(1000, 0).unwrap().next(), None);
    }

    #[test]
    fn test_invalid_ranges() {
        let policies = [StripingPolicy::raid0(64, 4)];
        let layout = StripeLayout::new(&policies).unwrap();

        assert!(matches!(
            layout.extents(-1, 10),
            Err(StripeError::InvalidRange { offset: -1, size: 10 })
        ));
        assert!(matches!(
            layout.extents(i64::MAX, 1),
            Err(StripeError::InvalidRange { .. })
        ));
        // Ending exactly at the maximum offset is fine
        assert!(layout.extents(i64::MAX - 10, 10).is_ok());
    }

    #[test]
    fn test_large_offsets() {
        let policies = [StripingPolicy::raid0(1024, 3)];
        let layout = StripeLayout::new(&policies).unwrap();
        let object_size = layout.object_size();

        // 5 TiB into the file, straddling a boundary
        let offset = 5 * 1024 * 1024 * 1024 * 1024_i64 - 10;
        let extents: Vec<_> = layout.extents(offset, 20).unwrap().collect();
        assert_eq!(extents.len(), 2);
        assert_eq!(extents[0].intra_object_offset, object_size - 10);
        assert_eq!(extents[0].length, 10);
        assert_eq!(extents[1].object_number, extents[0].object_number + 1);
        assert_eq!(extents[1].intra_object_offset, 0);
    }
}
