//! StripeIO Striping - RAID0 stripe address translation
//!
//! This crate turns a contiguous byte-range request against a striped file
//! into per-object operations addressed to storage targets. It performs no
//! I/O; dispatch, retries and target health belong to the caller.
//!
//! # Layout
//!
//! A file is cut into fixed-size objects. Object `n` lives on target
//! `n mod width` of every supplied policy. The first policy decides the
//! object size, so no operation ever straddles one of its boundaries.
//!
//! ```text
//! request: offset 40000, size 150000, object size 64 KiB, width 4
//!
//! ┌──────── obj 0 ────────┬──────── obj 1 ────────┬──────── obj 2 ────────┐
//! │ 40000 ▓▓▓▓▓▓▓▓ 25536  │▓▓▓▓▓▓▓▓▓ 65536 ▓▓▓▓▓▓▓│▓▓▓▓▓ 58928  │         │
//! └─────── target 0 ──────┴─────── target 1 ──────┴─────── target 2 ──────┘
//! ```
//!
//! # Example
//!
//! ```
//! use stripeio_common::StripingPolicy;
//! use stripeio_striping::StripeTranslator;
//!
//! let policies = [StripingPolicy::raid0(64, 4)];
//! let data = vec![0u8; 150_000];
//!
//! let translator = StripeTranslator::raid0();
//! let ops = translator.translate_write(&data, 40_000, &policies).unwrap();
//!
//! assert_eq!(ops.len(), 3);
//! assert_eq!(ops[0].intra_object_offset, 40_000);
//! assert_eq!(ops[0].len(), 25_536);
//! ```

pub mod error;
pub mod layout;
pub mod operation;
pub mod reconcile;
pub mod translator;

pub use error::{StripeError, StripeResult};
pub use layout::{ExtentIter, ObjectExtent, StripeLayout};
pub use operation::{OperationDescriptor, ReadOperation, WriteOperation};
pub use reconcile::{FragmentRecovery, PolicyVariant, Reconciliation, RecoveryRequest};
pub use translator::StripeTranslator;

pub use fixedbitset::FixedBitSet;

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        FixedBitSet, FragmentRecovery, PolicyVariant, ReadOperation, Reconciliation,
        StripeError, StripeResult, StripeTranslator, WriteOperation,
    };
    pub use stripeio_common::StripingPolicy;
}
