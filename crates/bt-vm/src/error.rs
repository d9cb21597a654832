use bt_core::{BtError, NodeTypeId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("node type {id} is already registered as `{existing}`")]
    DuplicateNodeType {
        id: NodeTypeId,
        existing: &'static str,
    },
    #[error("node type {id} exceeds the largest registrable id {max}")]
    NodeTypeOutOfRange { id: NodeTypeId, max: u32 },
    #[error("node {index} has unregistered type {id}")]
    UnknownNodeType { id: NodeTypeId, index: usize },
    #[error("node index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("parallel node {index} was ticked without a running child")]
    NoRunningChild { index: usize },
    #[error("tick depth exceeded {max} at node {index}")]
    DepthExceeded { index: usize, max: usize },
    #[error("node {index} requires a child")]
    MissingChild { index: usize },
    #[error(transparent)]
    Core(#[from] BtError),
}

pub type VmResult<T> = Result<T, VmError>;
