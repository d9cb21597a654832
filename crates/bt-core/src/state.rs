use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::BtError;

/// Result of ticking a node.
///
/// The byte encoding is a bit flag per state so a set of states (e.g. "stop on Success or
/// Failure") fits in a single byte of node data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeState {
    Success,
    Failure,
    Running,
}

impl NodeState {
    pub const SUCCESS_BIT: u8 = 1 << 0;
    pub const FAILURE_BIT: u8 = 1 << 1;
    pub const RUNNING_BIT: u8 = 1 << 2;

    pub const fn bits(self) -> u8 {
        match self {
            NodeState::Success => Self::SUCCESS_BIT,
            NodeState::Failure => Self::FAILURE_BIT,
            NodeState::Running => Self::RUNNING_BIT,
        }
    }

    pub fn from_bits(bits: u8) -> Result<Self, BtError> {
        match bits {
            Self::SUCCESS_BIT => Ok(NodeState::Success),
            Self::FAILURE_BIT => Ok(NodeState::Failure),
            Self::RUNNING_BIT => Ok(NodeState::Running),
            other => Err(BtError::InvalidNodeState(other)),
        }
    }

    pub const fn is_running(self) -> bool {
        matches!(self, NodeState::Running)
    }

    pub const fn is_completed(self) -> bool {
        !self.is_running()
    }

    /// Whether this state is part of the bit set `mask`.
    pub const fn is_in(self, mask: u8) -> bool {
        self.bits() & mask != 0
    }
}

impl TryFrom<u8> for NodeState {
    type Error = BtError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_bits(value)
    }
}

impl From<NodeState> for u8 {
    fn from(value: NodeState) -> Self {
        value.bits()
    }
}

/// Identifier of a node behavior in the VM dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct NodeTypeId(pub u32);

impl NodeTypeId {
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for NodeTypeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
