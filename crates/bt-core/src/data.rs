use core::mem::{align_of, size_of};

use bytemuck::Pod;

use crate::blob::to_u32;
use crate::{BtError, BtResult};

/// Alignment of every node's data span inside a blob.
///
/// Node data heads and payloads must not require a stricter alignment than this.
pub const DATA_ALIGN: usize = 8;

pub(crate) const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Builds the data bytes of a single node: a fixed-size head followed by aligned payloads.
///
/// Payload offsets are relative to the start of the node's data and are never `0`, so `0` can
/// mark an unallocated [`BlobVariable`](crate::BlobVariable).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDataBuilder {
    bytes: Vec<u8>,
    head_size: usize,
}

impl NodeDataBuilder {
    pub fn new<T: Pod>(head: T) -> Self {
        debug_assert!(align_of::<T>() <= DATA_ALIGN);
        Self {
            bytes: bytemuck::bytes_of(&head).to_vec(),
            head_size: size_of::<T>(),
        }
    }

    /// A node with no head; payloads may still be appended.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn head_size(&self) -> usize {
        self.head_size
    }

    /// Append `payload` and return its offset from the start of the node data.
    pub fn alloc<P: Pod>(&mut self, payload: P) -> BtResult<u32> {
        let align = align_of::<P>();
        debug_assert!(align <= DATA_ALIGN);
        let offset = align_up(self.bytes.len().max(1), align);
        let encoded = to_u32(offset, "payload offset")?;
        self.bytes.resize(offset, 0);
        self.bytes.extend_from_slice(bytemuck::bytes_of(&payload));
        Ok(encoded)
    }

    /// Patch the head in place.
    pub fn update<T: Pod>(&mut self, f: impl FnOnce(&mut T)) -> BtResult<()> {
        if size_of::<T>() != self.head_size {
            return Err(BtError::HeadSizeMismatch {
                type_name: core::any::type_name::<T>(),
                expected: size_of::<T>(),
                actual: self.head_size,
            });
        }

        let bytes = &mut self.bytes[..self.head_size];
        let mut head: T = bytemuck::pod_read_unaligned(bytes);
        f(&mut head);
        bytes.copy_from_slice(bytemuck::bytes_of(&head));
        Ok(())
    }

    pub fn head<T: Pod>(&self) -> BtResult<T> {
        if size_of::<T>() != self.head_size {
            return Err(BtError::HeadSizeMismatch {
                type_name: core::any::type_name::<T>(),
                expected: size_of::<T>(),
                actual: self.head_size,
            });
        }
        Ok(bytemuck::pod_read_unaligned(&self.bytes[..self.head_size]))
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
