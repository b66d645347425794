//! Per-object operations produced by the translators
//!
//! Operations borrow the caller's buffer; they never copy data. Write
//! operations view the source buffer, read operations hold disjoint
//! mutable sub-slices of the destination buffer.

use crate::layout::ObjectExtent;
use serde::Serialize;
use stripeio_common::{ObjectNumber, TargetIndex};

/// Owned summary of an operation, without the data view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationDescriptor {
    /// Object touched by the operation
    pub object_number: ObjectNumber,
    /// Target index under each supplied policy
    pub target_indices: Vec<TargetIndex>,
    /// Byte offset within the object
    pub intra_object_offset: u64,
    /// Byte offset within the request buffer
    pub buffer_offset: usize,
    /// Number of bytes covered
    pub length: usize,
}

/// Write of one object-bounded chunk of the source buffer
#[derive(Debug, Clone)]
pub struct WriteOperation<'a> {
    /// Object to write into
    pub object_number: ObjectNumber,
    /// Target index under each supplied policy, in policy order
    pub target_indices: Vec<TargetIndex>,
    /// Byte offset within the object where the write starts
    pub intra_object_offset: u64,
    /// Byte offset of `data` within the source buffer
    pub buffer_offset: usize,
    /// Bytes to write
    pub data: &'a [u8],
}

impl<'a> WriteOperation<'a> {
    pub(crate) fn new(
        extent: ObjectExtent,
        target_indices: Vec<TargetIndex>,
        data: &'a [u8],
    ) -> Self {
        Self {
            object_number: extent.object_number,
            target_indices,
            intra_object_offset: extent.intra_object_offset,
            buffer_offset: extent.buffer_offset,
            data,
        }
    }

    /// Number of bytes covered
    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; translators never emit empty operations
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte offset within the object just past this operation
    #[must_use]
    pub const fn end_offset(&self) -> u64 {
        self.intra_object_offset + self.data.len() as u64
    }

    /// Owned summary for logging and display
    #[must_use]
    pub fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            object_number: self.object_number,
            target_indices: self.target_indices.clone(),
            intra_object_offset: self.intra_object_offset,
            buffer_offset: self.buffer_offset,
            length: self.len(),
        }
    }
}

/// Read of one object-bounded chunk into the destination buffer
#[derive(Debug)]
pub struct ReadOperation<'a> {
    /// Object to read from
    pub object_number: ObjectNumber,
    /// Target index under each supplied policy, in policy order
    pub target_indices: Vec<TargetIndex>,
    /// Byte offset within the object where the read starts
    pub intra_object_offset: u64,
    /// Byte offset of `data` within the destination buffer
    pub buffer_offset: usize,
    /// Destination for the bytes read
    pub data: &'a mut [u8],
}

impl<'a> ReadOperation<'a> {
    pub(crate) fn new(
        extent: ObjectExtent,
        target_indices: Vec<TargetIndex>,
        data: &'a mut [u8],
    ) -> Self {
        Self {
            object_number: extent.object_number,
            target_indices,
            intra_object_offset: extent.intra_object_offset,
            buffer_offset: extent.buffer_offset,
            data,
        }
    }

    /// Number of bytes covered
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; translators never emit empty operations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte offset within the object just past this operation
    #[must_use]
    pub fn end_offset(&self) -> u64 {
        self.intra_object_offset + self.data.len() as u64
    }

    /// Owned summary for logging and display
    #[must_use]
    pub fn descriptor(&self) -> OperationDescriptor {
        OperationDescriptor {
            object_number: self.object_number,
            target_indices: self.target_indices.clone(),
            intra_object_offset: self.intra_object_offset,
            buffer_offset: self.buffer_offset,
            length: self.len(),
        }
    }
}
