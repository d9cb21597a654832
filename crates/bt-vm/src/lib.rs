//! Behavior tree virtual machine built on `bt-core`.
//!
//! The machine holds no per-tree state: a registry maps node type ids to plain reset/tick
//! functions, and every call receives the node index, the instance being ticked and the
//! blackboard. Control flow nodes recurse through [`VirtualMachine::tick`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod nodes;
pub mod tree;
pub mod vm;

pub use config::VmConfig;
pub use error::{VmError, VmResult};
pub use nodes::{DELTA_TIME, FIRST_CUSTOM_NODE};
pub use tree::BehaviorTree;
pub use vm::{
    no_reset, AccessFn, NodeBehavior, ResetFn, TickFn, VirtualMachine, VirtualMachineBuilder,
    MAX_NODE_TYPE_ID,
};
