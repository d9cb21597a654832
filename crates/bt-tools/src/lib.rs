//! Tooling primitives for the behavior tree VM.
//!
//! The VM records node resets and tick results into the blackboard as plain data, so two
//! runs can be compared event by event or rendered after the fact without a logging backend.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{emit, NodeEvent, TraceEvent, TraceLog, TraceSink, TRACE_LOG, TRACE_SINK};
