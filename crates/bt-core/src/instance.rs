use core::mem::{align_of, size_of};
use core::ops::Range;
use std::sync::Arc;

use bytemuck::Pod;

use crate::{BtError, BtResult, NodeBlob, NodeState, NodeTypeId};

/// Per-instance mutable state of a tree.
///
/// Many instances may share one [`NodeBlob`]; each owns a runtime copy of the node data, the
/// last state recorded for every node (`None` while a node is inactive), and a tick counter.
#[derive(Debug, Clone)]
pub struct BlobInstance {
    blob: Arc<NodeBlob>,
    data: Vec<u64>,
    states: Vec<Option<NodeState>>,
    tick: u64,
    depth: usize,
}

impl BlobInstance {
    pub fn new(blob: Arc<NodeBlob>) -> Self {
        Self {
            data: blob.data_words().to_vec(),
            states: vec![None; blob.len()],
            blob,
            tick: 0,
            depth: 0,
        }
    }

    pub fn blob(&self) -> &Arc<NodeBlob> {
        &self.blob
    }

    pub fn len(&self) -> usize {
        self.blob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.blob.len()
    }

    pub fn type_id(&self, index: usize) -> NodeTypeId {
        self.blob.type_id(index)
    }

    pub fn end_index(&self, index: usize) -> usize {
        self.blob.end_index(index)
    }

    pub fn node_bytes(&self, index: usize) -> &[u8] {
        let offset = self.blob.data_offset(index);
        &bytemuck::cast_slice(&self.data)[offset..offset + self.blob.data_size(index)]
    }

    pub fn node_bytes_mut(&mut self, index: usize) -> &mut [u8] {
        let offset = self.blob.data_offset(index);
        let size = self.blob.data_size(index);
        &mut bytemuck::cast_slice_mut(&mut self.data)[offset..offset + size]
    }

    /// Copy of the node's runtime data head.
    pub fn node_data<T: Pod>(&self, index: usize) -> BtResult<T> {
        self.read_at(index, 0)
    }

    /// Typed in-place view of the node's runtime data head.
    pub fn node_data_mut<T: Pod>(&mut self, index: usize) -> BtResult<&mut T> {
        self.view_at_mut(index, 0)
    }

    /// Copy a `P` stored `offset` bytes into the node's runtime data.
    pub fn read_at<P: Pod>(&self, index: usize, offset: usize) -> BtResult<P> {
        let span = self.span(index, offset, size_of::<P>())?;
        Ok(bytemuck::pod_read_unaligned(
            &bytemuck::cast_slice::<u64, u8>(&self.data)[span],
        ))
    }

    pub fn view_at_mut<P: Pod>(&mut self, index: usize, offset: usize) -> BtResult<&mut P> {
        let span = self.span(index, offset, size_of::<P>())?;
        if span.start % align_of::<P>() != 0 {
            return Err(BtError::Misaligned {
                index,
                offset,
                type_name: core::any::type_name::<P>(),
            });
        }
        bytemuck::try_from_bytes_mut(&mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.data)[span])
            .map_err(|_| BtError::Misaligned {
                index,
                offset,
                type_name: core::any::type_name::<P>(),
            })
    }

    fn span(&self, index: usize, offset: usize, len: usize) -> BtResult<Range<usize>> {
        if !self.contains(index) {
            return Err(BtError::NodeOutOfRange {
                index,
                len: self.len(),
            });
        }
        let size = self.blob.data_size(index);
        if size == 0 {
            return Err(BtError::UnallocatedData { index });
        }
        if offset + len > size {
            return Err(BtError::DataOutOfBounds {
                index,
                offset,
                len,
                size,
            });
        }
        let start = self.blob.data_offset(index) + offset;
        Ok(start..start + len)
    }

    pub fn state(&self, index: usize) -> Option<NodeState> {
        self.states[index]
    }

    pub fn set_state(&mut self, index: usize, state: NodeState) {
        self.states[index] = Some(state);
    }

    pub fn states(&self) -> &[Option<NodeState>] {
        &self.states
    }

    /// Mark every node in `range` inactive.
    pub fn clear_states(&mut self, range: Range<usize>) {
        self.states[range].fill(None);
    }

    /// Restore default data of the single node at `index`. Descendants are untouched.
    pub fn restore_node_data(&mut self, index: usize) {
        let offset = self.blob.data_offset(index);
        let span = offset..offset + self.blob.data_size(index);
        let defaults = &self.blob.data_region()[span.clone()];
        bytemuck::cast_slice_mut::<u64, u8>(&mut self.data)[span].copy_from_slice(defaults);
    }

    /// Restore default data for the subtree rooted at `index` and mark it inactive.
    pub fn reset_subtree_data(&mut self, index: usize) {
        let span = self.blob.subtree_data_span(index);
        let defaults = &self.blob.data_region()[span.clone()];
        bytemuck::cast_slice_mut::<u64, u8>(&mut self.data)[span].copy_from_slice(defaults);
        let end = self.blob.end_index(index);
        self.clear_states(index..end);
    }

    /// Restore the whole instance to its freshly-created state, keeping the tick counter.
    pub fn reset_all(&mut self) {
        self.data.copy_from_slice(self.blob.data_words());
        self.states.fill(None);
        self.depth = 0;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) -> u64 {
        self.tick = self.tick.wrapping_add(1);
        self.tick
    }

    /// Current tick recursion depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn enter(&mut self) -> usize {
        self.depth += 1;
        self.depth
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
