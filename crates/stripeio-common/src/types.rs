//! Core type definitions for StripeIO
//!
//! This module defines the striping policy descriptor that governs how a
//! file's byte stream is partitioned into objects and spread across
//! storage targets.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of bytes in one KiB; stripe sizes are configured in KiB upstream.
pub const KIB: u64 = 1024;

/// Zero-based index of a logical object within a file
pub type ObjectNumber = u64;

/// Zero-based position of a storage target within a policy's target set
pub type TargetIndex = u32;

/// Reasons a striping policy cannot be used for address computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("stripe size must be > 0")]
    ZeroStripeSize,

    #[error("target width must be > 0")]
    ZeroWidth,
}

/// RAID0 striping policy
///
/// Partitions a file into objects of `stripe_size` KiB and assigns them
/// round-robin to `width` storage targets.
///
/// ```text
/// stripe_size = 64 KiB, width = 3
///
/// file bytes:  [ obj 0 | obj 1 | obj 2 | obj 3 | obj 4 | ... ]
///                  │       │       │       │       │
///              target 0 target 1 target 2 target 0 target 1
///               row 0    row 0    row 0    row 1    row 1
/// ```
///
/// Policies are immutable value objects. Construction never fails; a
/// policy with a zero field is rejected by [`StripingPolicy::validate`]
/// before any arithmetic uses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StripingPolicy {
    /// Object size in KiB
    #[serde(rename = "stripe_size")]
    pub stripe_size_kib: u32,
    /// Number of storage targets objects round-robin across
    pub width: u32,
}

impl StripingPolicy {
    /// Create a RAID0 policy from a stripe size in KiB and a target width
    #[must_use]
    pub const fn raid0(stripe_size_kib: u32, width: u32) -> Self {
        Self {
            stripe_size_kib,
            width,
        }
    }

    /// Object size in bytes
    #[must_use]
    pub const fn object_size(&self) -> u64 {
        self.stripe_size_kib as u64 * KIB
    }

    /// Check that the policy can be used for address computation
    pub const fn validate(&self) -> Result<(), PolicyError> {
        if self.stripe_size_kib == 0 {
            return Err(PolicyError::ZeroStripeSize);
        }
        if self.width == 0 {
            return Err(PolicyError::ZeroWidth);
        }
        Ok(())
    }

    /// Object number containing the given file offset
    #[must_use]
    pub const fn object_for_offset(&self, offset: u64) -> Option<ObjectNumber> {
        offset.checked_div(self.object_size())
    }

    /// First file byte covered by an object
    #[must_use]
    pub const fn object_start_offset(&self, object_number: ObjectNumber) -> u64 {
        object_number.saturating_mul(self.object_size())
    }

    /// Last file byte (inclusive) covered by an object
    ///
    /// Returns `None` when the policy has a zero stripe size.
    #[must_use]
    pub const fn object_end_offset(&self, object_number: ObjectNumber) -> Option<u64> {
        let size = self.object_size();
        if size == 0 {
            return None;
        }
        Some(
            self.object_start_offset(object_number)
                .saturating_add(size - 1),
        )
    }

    /// Storage target an object is assigned to
    #[must_use]
    pub fn target_for_object(&self, object_number: ObjectNumber) -> Option<TargetIndex> {
        object_number
            .checked_rem(u64::from(self.width))
            .and_then(|t| TargetIndex::try_from(t).ok())
    }

    /// Stripe row of an object (its position among the objects on its target)
    #[must_use]
    pub fn row_for_object(&self, object_number: ObjectNumber) -> Option<u64> {
        object_number.checked_div(u64::from(self.width))
    }

    /// Check whether an offset lies on an object boundary
    #[must_use]
    pub const fn is_aligned(&self, offset: u64) -> bool {
        match offset.checked_rem(self.object_size()) {
            Some(rem) => rem == 0,
            None => false,
        }
    }

    /// Default 128 KiB single-target policy
    pub const DEFAULT: Self = Self::raid0(128, 1);
}

impl Default for StripingPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}
