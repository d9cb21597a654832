//! Error types shared by the blob, instance and variable layers.
//!
//! `bt-vm` wraps [`BtError`] transparently in its own error enum, so blackboard failures reach
//! the caller of a tick unchanged.

use thiserror::Error;

use crate::VariableId;

/// Failures reported by a [`Blackboard`](crate::Blackboard) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackboardError {
    #[error("blackboard key {key:#x} is not set")]
    MissingKey { key: u64 },

    #[error("blackboard type mismatch for key {key:#x} (stored type differs from requested {expected})")]
    TypeMismatch { key: u64, expected: &'static str },

    #[error("blackboard has no component {name}")]
    MissingComponent { name: &'static str },

    #[error("blackboard component {name} is stored with a different type")]
    ComponentTypeMismatch { name: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BtError {
    #[error("malformed node blob: {0}")]
    MalformedBlob(String),

    #[error("node {index} is outside the blob ({len} nodes)")]
    NodeOutOfRange { index: usize, len: usize },

    #[error("node {index} has no allocated data")]
    UnallocatedData { index: usize },

    #[error("node {index}: {len} bytes at offset {offset} exceed its {size}-byte data")]
    DataOutOfBounds {
        index: usize,
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("node {index}: data at offset {offset} is not aligned for {type_name}")]
    Misaligned {
        index: usize,
        offset: usize,
        type_name: &'static str,
    },

    #[error("node data head is {actual} bytes, {type_name} needs {expected}")]
    HeadSizeMismatch {
        type_name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid node state bits {0:#04b}")]
    InvalidNodeState(u8),

    #[error("variable {variable_id} of node {index} reads an unallocated offset")]
    UnallocatedVariable { index: usize, variable_id: VariableId },

    #[error("no {type_name} variable strategy registered for id {variable_id}")]
    UnknownVariable {
        variable_id: VariableId,
        type_name: &'static str,
    },

    #[error("{type_name} variable strategy {variable_id} is already registered")]
    DuplicateVariable {
        variable_id: VariableId,
        type_name: &'static str,
    },

    #[error("no variable strategies registered for {type_name}")]
    UnregisteredVariableType { type_name: &'static str },

    #[error(transparent)]
    Blackboard(#[from] BlackboardError),
}

pub type BtResult<T> = Result<T, BtError>;
