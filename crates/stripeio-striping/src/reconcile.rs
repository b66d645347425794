//! Read reconciliation
//!
//! After a read plan has been dispatched, the caller hands the completed
//! operations and a success bitmap (one bit per operation) back to the
//! translator, which folds them into the final byte count.
//!
//! # Variants
//!
//! - **Basic**: RAID0 has no redundancy, so the received byte count is
//!   returned unchanged. Callers must inspect the success markers
//!   themselves.
//! - **Redundant**: failed operations are handed to a [`FragmentRecovery`]
//!   backend that can rebuild their bytes (e.g. from parity or replicas).
//!   Only bytes actually recovered are added to the count, so a failed
//!   recovery still shows up as a short read.

use crate::error::{StripeError, StripeResult};
use crate::operation::ReadOperation;
use fixedbitset::FixedBitSet;
use std::fmt;
use std::sync::Arc;
use stripeio_common::{ObjectNumber, StripingPolicy, TargetIndex};
use tracing::{debug, warn};

/// Capability of a reconciliation variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyVariant {
    /// No redundancy; reconciliation is a pass-through
    Basic,
    /// Failed fragments can be reconstructed
    Redundant,
}

/// Everything a recovery backend needs to locate a failed fragment
#[derive(Debug, Clone, Copy)]
pub struct RecoveryRequest<'p> {
    /// Position of the failed operation in the read plan
    pub op_index: usize,
    /// Object the failed operation read from
    pub object_number: ObjectNumber,
    /// Byte offset within the object
    pub intra_object_offset: u64,
    /// File offset of the first byte to recover
    pub file_offset: u64,
    /// Target index under each policy
    pub target_indices: &'p [TargetIndex],
    /// The policies the plan was built from
    pub policies: &'p [StripingPolicy],
}

/// Backend that rebuilds the bytes of a failed read
pub trait FragmentRecovery: Send + Sync {
    /// Backend name for identification
    fn name(&self) -> &'static str;

    /// Rebuild the fragment described by `request` into `dest`
    ///
    /// Returns the number of bytes written to the front of `dest`.
    fn recover(&self, request: &RecoveryRequest<'_>, dest: &mut [u8]) -> StripeResult<usize>;
}

/// Reconciliation variant selected when the translator is built
#[derive(Clone, Default)]
pub enum Reconciliation {
    /// Pass-through
    #[default]
    Basic,
    /// Rebuild failed fragments through a recovery backend
    Redundant(Arc<dyn FragmentRecovery>),
}

impl fmt::Debug for Reconciliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "Basic"),
            Self::Redundant(recovery) => write!(f, "Redundant({})", recovery.name()),
        }
    }
}

impl Reconciliation {
    /// Capability of this variant
    #[must_use]
    pub const fn variant(&self) -> PolicyVariant {
        match self {
            Self::Basic => PolicyVariant::Basic,
            Self::Redundant(_) => PolicyVariant::Redundant,
        }
    }

    pub(crate) fn process(
        &self,
        read_ops: &mut [ReadOperation<'_>],
        offset: i64,
        success_markers: &FixedBitSet,
        policies: &[StripingPolicy],
        received: usize,
        reconstruction_enabled: bool,
    ) -> StripeResult<usize> {
        let failed = read_ops.len() - count_successful(read_ops.len(), success_markers);
        if failed == 0 {
            return Ok(received);
        }

        let recovery = match self {
            Self::Redundant(recovery) if reconstruction_enabled => recovery,
            _ => {
                debug!(
                    "{} of {} reads failed, no reconstruction; returning {} bytes",
                    failed,
                    read_ops.len(),
                    received
                );
                return Ok(received);
            }
        };

        let total: usize = read_ops.iter().map(|op| op.len()).sum();
        let base = u64::try_from(offset).map_err(|_| StripeError::InvalidRange {
            offset,
            size: total,
        })?;
        let mut recovered = 0usize;

        for (op_index, op) in read_ops.iter_mut().enumerate() {
            if success_markers.contains(op_index) {
                continue;
            }

            let request = RecoveryRequest {
                op_index,
                object_number: op.object_number,
                intra_object_offset: op.intra_object_offset,
                file_offset: base + op.buffer_offset as u64,
                target_indices: &op.target_indices,
                policies,
            };

            match recovery.recover(&request, op.data) {
                Ok(n) => recovered += n.min(op.data.len()),
                Err(e) => {
                    warn!(
                        "Recovery backend {} could not rebuild object {}: {}",
                        recovery.name(),
                        op.object_number,
                        e
                    );
                }
            }
        }

        debug!(
            "Recovered {} bytes across {} failed reads via {}",
            recovered,
            failed,
            recovery.name()
        );

        Ok(received.saturating_add(recovered).min(total))
    }
}

fn count_successful(op_count: usize, success_markers: &FixedBitSet) -> usize {
    success_markers.count_ones(..op_count.min(success_markers.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::StripeTranslator;
    use std::sync::Mutex;

    /// Fills recovered fragments with a fixed byte and remembers requests
    struct FillRecovery {
        byte: u8,
        seen: Mutex<Vec<(usize, ObjectNumber, u64)>>,
    }

    impl FillRecovery {
        fn new(byte: u8) -> Self {
            Self {
                byte,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl FragmentRecovery for FillRecovery {
        fn name(&self) -> &'static str {
            "fill"
        }

        fn recover(&self, request: &RecoveryRequest<'_>, dest: &mut [u8]) -> StripeResult<usize> {
            self.seen.lock().unwrap().push((
                request.op_index,
                request.object_number,
                request.file_offset,
            ));
            dest.fill(self.byte);
            Ok(dest.len())
        }
    }

    /// Refuses every object
    struct NoRecovery;

    impl FragmentRecovery for NoRecovery {
        fn name(&self) -> &'static str {
            "none"
        }

        fn recover(&self, request: &RecoveryRequest<'_>, _dest: &mut [u8]) -> StripeResult<usize> {
            Err(StripeError::recovery_failed(
                request.object_number,
                "no redundancy available",
            ))
        }
    }

    fn policies() -> [StripingPolicy; 1] {
        [StripingPolicy::raid0(4, 2)]
    }

    #[test]
    fn test_basic_is_pass_through() {
        let policies = policies();
        let translator = StripeTranslator::raid0();
        let mut buf = vec![0u8; 10_000];
        let (mut ops, count) = translator.translate_read(&mut buf, 0, &policies).unwrap();

        // Nothing succeeded, still passes the count through untouched
        let markers = StripeTranslator::success_markers(count);
        let result = translator
            .process_reads(&mut ops, 0, &markers, &policies, 1234, true)
            .unwrap();
        assert_eq!(result, 1234);
        assert_eq!(translator.variant(), PolicyVariant::Basic);
    }

    #[test]
    fn test_redundant_recovers_failed_reads() {
        let policies = policies();
        let recovery = Arc::new(FillRecovery::new(0xAB));
        let translator = StripeTranslator::redundant(recovery.clone());
        assert_eq!(translator.variant(), PolicyVariant::Redundant);

        // 3 operations: 4096 + 4096 + 1808 bytes
        let mut buf = vec![0u8; 10_000];
        let (mut ops, count) = translator.translate_read(&mut buf, 0, &policies).unwrap();
        assert_eq!(count, 3);

        let mut markers = StripeTranslator::success_markers(count);
        markers.insert(0);
        markers.insert(2);

        let received = 4096 + 1808;
        let result = translator
            .process_reads(&mut ops, 0, &markers, &policies, received, true)
            .unwrap();
        assert_eq!(result, 10_000);

        drop(ops);
        assert!(buf[..4096].iter().all(|&b| b == 0));
        assert!(buf[4096..8192].iter().all(|&b| b == 0xAB));
        assert!(buf[8192..].iter().all(|&b| b == 0));

        let seen = recovery.seen.lock().unwrap();
        assert_eq!(*seen, vec![(1, 1, 4096)]);
    }

    #[test]
    fn test_redundant_without_reconstruction_is_pass_through() {
        let policies = policies();
        let recovery = Arc::new(FillRecovery::new(0xFF));
        let translator = StripeTranslator::redundant(recovery.clone());

        let mut buf = vec![0u8; 8192];
        let (mut ops, count) = translator.translate_read(&mut buf, 0, &policies).unwrap();
        let markers = StripeTranslator::success_markers(count);

        let result = translator
            .process_reads(&mut ops, 0, &markers, &policies, 0, false)
            .unwrap();
        assert_eq!(result, 0);
        assert!(recovery.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_recovery_leaves_short_count() {
        let policies = policies();
        let translator = StripeTranslator::redundant(Arc::new(NoRecovery));

        let mut buf = vec![0u8; 8192];
        let (mut ops, count) = translator.translate_read(&mut buf, 0, &policies).unwrap();
        let mut markers = StripeTranslator::success_markers(count);
        markers.insert(0);

        let result = translator
            .process_reads(&mut ops, 0, &markers, &policies, 4096, true)
            .unwrap();
        assert_eq!(result, 4096);
    }

    #[test]
    fn test_short_markers_count_as_failed() {
        let policies = policies();
        let recovery = Arc::new(FillRecovery::new(1));
        let translator = StripeTranslator::redundant(recovery.clone());

        let mut buf = vec![0u8; 12_288];
        let (mut ops, _) = translator.translate_read(&mut buf, 4096, &policies).unwrap();

        // Only covers the first operation
        let mut markers = FixedBitSet::with_capacity(1);
        markers.insert(0);

        let result = translator
            .process_reads(&mut ops, 4096, &markers, &policies, 4096, true)
            .unwrap();
        assert_eq!(result, 12_288);

        let seen = recovery.seen.lock().unwrap();
        assert_eq!(*seen, vec![(1, 2, 8192), (2, 3, 12_288)]);
    }

    #[test]
    fn test_all_successful_skips_recovery() {
        let policies = policies();
        let recovery = Arc::new(FillRecovery::new(1));
        let translator = StripeTranslator::redundant(recovery.clone());

        let mut buf = vec![0u8; 5000];
        let (mut ops, count) = translator.translate_read(&mut buf, 100, &policies).unwrap();
        let mut markers = StripeTranslator::success_markers(count);
        markers.insert_range(..);

        let result = translator
            .process_reads(&mut ops, 100, &markers, &policies, 5000, true)
            .unwrap();
        assert_eq!(result, 5000);
        assert!(recovery.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reconciliation_debug() {
        assert_eq!(format!("{:?}", Reconciliation::Basic), "Basic");
        let redundant = Reconciliation::Redundant(Arc::new(NoRecovery));
        assert_eq!(format!("{redundant:?}"), "Redundant(none)");
    }
}
