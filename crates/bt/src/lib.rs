//! Umbrella crate that re-exports the `bt-*` building blocks.
//!
//! Trees are compiled into an immutable [`core::NodeBlob`] shared by every instance; a
//! [`vm::VirtualMachine`] ticks instances by node index against an external blackboard.
//!
//! ```
//! use std::sync::Arc;
//!
//! use bt::core::{MapBlackboard, NodeBlob, NodeState};
//! use bt::vm::nodes::{selector, state};
//! use bt::vm::{BehaviorTree, VirtualMachine};
//!
//! let vm = VirtualMachine::with_builtin_nodes()?;
//! let root = selector::def([state::def(NodeState::Failure), state::def(NodeState::Success)]);
//! let mut tree = BehaviorTree::new(Arc::new(NodeBlob::build(&root)?));
//!
//! let mut bb = MapBlackboard::new();
//! assert_eq!(tree.tick(&vm, &mut bb)?, NodeState::Success);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use bt_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use bt_tools as tools;

#[cfg(feature = "vm")]
#[cfg_attr(docsrs, doc(cfg(feature = "vm")))]
pub use bt_vm as vm;
