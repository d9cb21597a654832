//! Data-oriented behavior tree primitives.
//!
//! A tree is compiled into a [`NodeBlob`]: node records in depth-first pre-order, each with a
//! type id, a precomputed end index and a span of default data. The blob is immutable once built
//! and shared between tree instances; every instance owns a [`BlobInstance`] holding the mutable
//! runtime copy of node data plus the last recorded [`NodeState`] of each node.
//!
//! Node logic reads and writes typed values through [`BlobVariable`] handles, which resolve either
//! to data embedded in the blob or to an external [`Blackboard`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod blackboard;
pub mod blob;
pub mod component;
pub mod data;
pub mod error;
pub mod instance;
pub mod state;
pub mod variable;
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
pub mod wire;

pub use blackboard::{BbKey, Blackboard, BlackboardExt, MapBlackboard};
pub use blob::{Children, NodeBlob, NodeDef};
pub use component::{AccessMode, ComponentAccessList, ComponentType};
pub use data::{NodeDataBuilder, DATA_ALIGN};
pub use error::{BlackboardError, BtError, BtResult};
pub use instance::BlobInstance;
pub use state::{NodeState, NodeTypeId};
pub use variable::{
    BlobVariable, BlackboardVariable, ComponentVariable, ConstantVariable, NodeDataRef,
    NodeVariable, VariableId, VariableRegistries, VariableRegistry, VariableStrategy,
};
