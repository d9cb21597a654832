use core::mem::size_of;

use bytemuck::Pod;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::data::{align_up, DATA_ALIGN};
use crate::{BtError, BtResult, NodeTypeId};

/// Tree description consumed by [`NodeBlob::build`].
///
/// This is the hand-off format from authoring tools: a plain owned tree of node type ids and
/// pre-encoded data bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDef {
    pub type_id: NodeTypeId,
    pub data: Vec<u8>,
    pub children: Vec<NodeDef>,
}

impl NodeDef {
    pub fn new(type_id: impl Into<NodeTypeId>) -> Self {
        Self {
            type_id: type_id.into(),
            data: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn with_head<T: Pod>(self, head: T) -> Self {
        self.with_data(bytemuck::bytes_of(&head).to_vec())
    }

    pub fn with_child(mut self, child: NodeDef) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeDef>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeDef::node_count).sum::<usize>()
    }
}

/// Immutable, flat encoding of a behavior tree.
///
/// Node `i`'s subtree occupies indices `i..end_index(i)`; its direct children are found by
/// starting at `i + 1` and jumping `child = end_index(child)` until `end_index(i)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeBlob {
    types: Vec<NodeTypeId>,
    end_indices: Vec<u32>,
    offsets: Vec<u32>,
    sizes: Vec<u32>,
    data: Vec<u64>,
}

impl NodeBlob {
    pub fn build(root: &NodeDef) -> BtResult<Self> {
        let mut blob = Self {
            types: Vec::with_capacity(root.node_count()),
            end_indices: Vec::new(),
            offsets: Vec::new(),
            sizes: Vec::new(),
            data: Vec::new(),
        };
        let mut bytes = Vec::new();
        blob.push_subtree(root, &mut bytes)?;

        let mut words = vec![0u64; bytes.len().div_ceil(DATA_ALIGN)];
        bytemuck::cast_slice_mut::<u64, u8>(&mut words)[..bytes.len()].copy_from_slice(&bytes);
        blob.data = words;

        blob.validate()?;
        tracing::debug!(nodes = blob.len(), data_bytes = bytes.len(), "built node blob");
        Ok(blob)
    }

    fn push_subtree(&mut self, def: &NodeDef, bytes: &mut Vec<u8>) -> BtResult<()> {
        let index = self.types.len();
        bytes.resize(align_up(bytes.len(), DATA_ALIGN), 0);

        self.types.push(def.type_id);
        self.end_indices.push(0);
        self.offsets.push(to_u32(bytes.len(), "data region")?);
        self.sizes.push(to_u32(def.data.len(), "node data")?);
        bytes.extend_from_slice(&def.data);

        for child in &def.children {
            self.push_subtree(child, bytes)?;
        }

        self.end_indices[index] = to_u32(self.types.len(), "node count")?;
        Ok(())
    }

    /// Assemble a blob from its raw arrays, validating every structural invariant.
    pub fn from_parts(
        types: Vec<NodeTypeId>,
        end_indices: Vec<u32>,
        offsets: Vec<u32>,
        sizes: Vec<u32>,
        data: Vec<u64>,
    ) -> BtResult<Self> {
        let blob = Self {
            types,
            end_indices,
            offsets,
            sizes,
            data,
        };
        blob.validate()?;
        Ok(blob)
    }

    /// Check the pre-order layout: every end index lies in `(i, len]`, the root spans the whole
    /// blob, and children tile their parent's range exactly. Data spans must be aligned, in
    /// bounds, and laid out in pre-order without overlap, so a subtree's data is one contiguous
    /// range.
    pub fn validate(&self) -> BtResult<()> {
        let len = self.types.len();
        if len == 0 {
            return Err(malformed("blob has no nodes"));
        }
        if self.end_indices.len() != len || self.offsets.len() != len || self.sizes.len() != len
        {
            return Err(malformed(format!(
                "per-node arrays disagree: {} types, {} end indices, {} offsets, {} sizes",
                len,
                self.end_indices.len(),
                self.offsets.len(),
                self.sizes.len()
            )));
        }
        if self.end_indices[0] as usize != len {
            return Err(malformed(format!(
                "root ends at {} but blob has {len} nodes",
                self.end_indices[0]
            )));
        }

        let region = self.data.len() * size_of::<u64>();
        for i in 0..len {
            let end = self.end_indices[i] as usize;
            if end <= i || end > len {
                return Err(malformed(format!(
                    "node {i} has end index {end} outside ({i}, {len}]"
                )));
            }

            let offset = self.offsets[i] as usize;
            let size = self.sizes[i] as usize;
            if offset % DATA_ALIGN != 0 {
                return Err(malformed(format!("node {i} data offset {offset} is unaligned")));
            }
            if offset + size > region {
                return Err(malformed(format!(
                    "node {i} data {offset}..{} exceeds the {region}-byte data region",
                    offset + size
                )));
            }
            if let Some(&next) = self.offsets.get(i + 1) {
                if offset + size > next as usize {
                    return Err(malformed(format!(
                        "node {i} data {offset}..{} runs past node {} data at {next}",
                        offset + size,
                        i + 1
                    )));
                }
            }

            let mut child = i + 1;
            while child < end {
                let child_end = self.end_indices[child] as usize;
                if child_end <= child || child_end > end {
                    return Err(malformed(format!(
                        "child {child} of node {i} ends at {child_end}, outside its parent's range ..{end}"
                    )));
                }
                child = child_end;
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// # Panics
    /// If `index` is not a node of this blob.
    pub fn type_id(&self, index: usize) -> NodeTypeId {
        self.types[index]
    }

    /// First index after the subtree rooted at `index`.
    ///
    /// # Panics
    /// If `index` is not a node of this blob.
    pub fn end_index(&self, index: usize) -> usize {
        self.end_indices[index] as usize
    }

    pub fn data_offset(&self, index: usize) -> usize {
        self.offsets[index] as usize
    }

    pub fn data_size(&self, index: usize) -> usize {
        self.sizes[index] as usize
    }

    pub fn data_words(&self) -> &[u64] {
        &self.data
    }

    pub fn data_region(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn default_data_bytes(&self, index: usize) -> &[u8] {
        let offset = self.data_offset(index);
        &self.data_region()[offset..offset + self.data_size(index)]
    }

    /// Copy of the node's default data head.
    pub fn default_node_data<T: Pod>(&self, index: usize) -> BtResult<T> {
        let size = self.data_size(index);
        if size == 0 {
            return Err(BtError::UnallocatedData { index });
        }
        if size_of::<T>() > size {
            return Err(BtError::DataOutOfBounds {
                index,
                offset: 0,
                len: size_of::<T>(),
                size,
            });
        }
        Ok(bytemuck::pod_read_unaligned(
            &self.default_data_bytes(index)[..size_of::<T>()],
        ))
    }

    /// Byte range of the runtime data covering the subtree `index..end_index(index)`.
    pub fn subtree_data_span(&self, index: usize) -> core::ops::Range<usize> {
        let last = self.end_index(index) - 1;
        self.data_offset(index)..self.data_offset(last) + self.data_size(last)
    }

    pub fn children(&self, index: usize) -> Children<'_> {
        Children {
            blob: self,
            next: index + 1,
            end: self.end_index(index),
        }
    }

    pub fn child_count(&self, index: usize) -> usize {
        self.children(index).count()
    }

    /// Number of ancestors of every node, in index order.
    pub fn depths(&self) -> Vec<usize> {
        let mut depths = Vec::with_capacity(self.len());
        let mut open: Vec<usize> = Vec::new();
        for index in 0..self.len() {
            while open.last().is_some_and(|&end| end <= index) {
                open.pop();
            }
            depths.push(open.len());
            open.push(self.end_index(index));
        }
        depths
    }
}

/// Direct children of a node, in source order.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    blob: &'a NodeBlob,
    next: usize,
    end: usize,
}

impl Iterator for Children<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.end {
            return None;
        }
        let child = self.next;
        self.next = self.blob.end_index(child);
        Some(child)
    }
}

fn malformed(reason: impl Into<String>) -> BtError {
    BtError::MalformedBlob(reason.into())
}

pub(crate) fn to_u32(value: usize, what: &str) -> BtResult<u32> {
    u32::try_from(value).map_err(|_| malformed(format!("{what} too large ({value})")))
}
