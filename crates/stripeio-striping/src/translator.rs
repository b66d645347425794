//! RAID0 stripe translator
//!
//! Turns a contiguous byte-range request into one operation per object
//! touched. Translation is a pure function of its inputs: no I/O, no shared
//! state, safe to call concurrently.

use crate::error::StripeResult;
use crate::layout::StripeLayout;
use crate::operation::{ReadOperation, WriteOperation};
use crate::reconcile::{FragmentRecovery, PolicyVariant, Reconciliation};
use fixedbitset::FixedBitSet;
use std::sync::Arc;
use stripeio_common::StripingPolicy;
use tracing::debug;

/// Translates file byte ranges into per-object operations
///
/// The reconciliation variant is fixed at construction; translation itself
/// does not depend on it.
#[derive(Debug, Clone, Default)]
pub struct StripeTranslator {
    reconciliation: Reconciliation,
}

impl StripeTranslator {
    /// Create a translator with the given reconciliation variant
    #[must_use]
    pub fn new(reconciliation: Reconciliation) -> Self {
        Self { reconciliation }
    }

    /// Plain RAID0 translator; read reconciliation is a pass-through
    #[must_use]
    pub const fn raid0() -> Self {
        Self {
            reconciliation: Reconciliation::Basic,
        }
    }

    /// Translator that rebuilds failed reads through `recovery`
    #[must_use]
    pub fn redundant(recovery: Arc<dyn FragmentRecovery>) -> Self {
        Self::new(Reconciliation::Redundant(recovery))
    }

    /// Capability of this translator's reconciliation step
    #[must_use]
    pub const fn variant(&self) -> PolicyVariant {
        self.reconciliation.variant()
    }

    /// Empty success bitmap sized for a read plan of `op_count` operations
    #[must_use]
    pub fn success_markers(op_count: usize) -> FixedBitSet {
        FixedBitSet::with_capacity(op_count)
    }

    /// Split a write of `buf` at file `offset` into per-object writes
    ///
    /// The first policy sets the object size; every policy contributes a
    /// target index per operation. Operations are ordered by ascending
    /// object number and never cross an object boundary. An empty buffer
    /// yields no operations.
    pub fn translate_write<'a>(
        &self,
        buf: &'a [u8],
        offset: i64,
        policies: &[StripingPolicy],
    ) -> StripeResult<Vec<WriteOperation<'a>>> {
        let layout = StripeLayout::new(policies)?;
        let extents = layout.extents(offset, buf.len())?;

        let mut operations = Vec::with_capacity(extents.len());
        for extent in extents {
            let data = &buf[extent.buffer_offset..extent.buffer_offset + extent.length];
            operations.push(WriteOperation::new(
                extent,
                layout.target_indices(extent.object_number),
                data,
            ));
        }

        debug!(
            "Translated write: offset={} size={} object_size={} ops={}",
            offset,
            buf.len(),
            layout.object_size(),
            operations.len()
        );
        Ok(operations)
    }

    /// Split a read into `buf` at file `offset` into per-object reads
    ///
    /// Same addressing as [`translate_write`](Self::translate_write). Each
    /// operation holds a disjoint mutable slice of `buf`. Also returns the
    /// operation count, for sizing the success bitmap before dispatch.
    pub fn translate_read<'a>(
        &self,
        buf: &'a mut [u8],
        offset: i64,
        policies: &[StripingPolicy],
    ) -> StripeResult<(Vec<ReadOperation<'a>>, usize)> {
        let layout = StripeLayout::new(policies)?;
        let size = buf.len();
        let extents = layout.extents(offset, size)?;

        let mut operations = Vec::with_capacity(extents.len());
        let mut rest = buf;
        for extent in extents {
            let (data, tail) = std::mem::take(&mut rest).split_at_mut(extent.length);
            rest = tail;
            operations.push(ReadOperation::new(
                extent,
                layout.target_indices(extent.object_number),
                data,
            ));
        }

        debug!(
            "Translated read: offset={} size={} object_size={} ops={}",
            offset,
            size,
            layout.object_size(),
            operations.len()
        );
        let count = operations.len();
        Ok((operations, count))
    }

    /// Fold completed reads into the final byte count
    ///
    /// `success_markers` has one bit per operation in `read_ops`; unset or
    /// missing bits mean the read failed. The basic variant returns
    /// `received` unchanged, so callers must still check the markers. The
    /// redundant variant, when `reconstruction_enabled`, rebuilds failed
    /// fragments into their slices of the destination buffer and adds the
    /// recovered bytes.
    pub fn process_reads(
        &self,
        read_ops: &mut [ReadOperation<'_>],
        offset: i64,
        success_markers: &FixedBitSet,
        policies: &[StripingPolicy],
        received: usize,
        reconstruction_enabled: bool,
    ) -> StripeResult<usize> {
        self.reconciliation.process(
            read_ops,
            offset,
            success_markers,
            policies,
            received,
            reconstruction_enabled,
        )
    }
}
