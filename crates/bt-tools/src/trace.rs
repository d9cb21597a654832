#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use bt_core::{BbKey, Blackboard, BlackboardError, BlackboardExt, NodeState};

/// What the VM did to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "state", rename_all = "snake_case"))]
pub enum NodeEvent {
    /// Fresh activation (or an explicit subtree reset rooted at the node).
    Reset,
    /// Tick finished with this state.
    Tick(NodeState),
}

/// One node-level event, stamped with the instance's tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    pub node: usize,
    pub event: NodeEvent,
}

impl TraceEvent {
    pub fn reset(tick: u64, node: usize) -> Self {
        Self {
            tick,
            node,
            event: NodeEvent::Reset,
        }
    }

    pub fn tick(tick: u64, node: usize, state: NodeState) -> Self {
        Self {
            tick,
            node,
            event: NodeEvent::Tick(state),
        }
    }

    pub fn state(&self) -> Option<NodeState> {
        match self.event {
            NodeEvent::Tick(state) => Some(state),
            NodeEvent::Reset => None,
        }
    }
}

/// Receiver for events as they happen, e.g. a debugger forwarding them elsewhere.
pub trait TraceSink {
    fn record(&mut self, event: &TraceEvent);
}

/// In-memory record of a run, comparable across runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    /// Nodes reset, in order.
    pub fn resets(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter(|e| e.event == NodeEvent::Reset)
            .map(|e| e.node)
            .collect()
    }

    /// Nodes ticked with their resulting states, in completion order.
    pub fn ticks(&self) -> Vec<(usize, NodeState)> {
        self.events
            .iter()
            .filter_map(|e| e.state().map(|state| (e.node, state)))
            .collect()
    }

    pub fn ticked_nodes(&self) -> Vec<usize> {
        self.ticks().into_iter().map(|(node, _)| node).collect()
    }

    pub fn during(&self, tick: u64) -> impl Iterator<Item = &TraceEvent> + '_ {
        self.events.iter().filter(move |e| e.tick == tick)
    }
}

impl TraceSink for TraceLog {
    fn record(&mut self, event: &TraceEvent) {
        self.push(*event);
    }
}

/// Blackboard key for collecting events in-memory.
pub const TRACE_LOG: BbKey<TraceLog> = BbKey::new(0xB7_7ACE_0000_0001);
/// Blackboard key for streaming events into a user-provided sink.
pub const TRACE_SINK: BbKey<Box<dyn TraceSink + Send>> = BbKey::new(0xB7_7ACE_0000_0002);

/// Record `event` into whichever of [`TRACE_LOG`] and [`TRACE_SINK`] the blackboard holds.
///
/// Absent keys are skipped. A key holding a value of the wrong type is an error.
pub fn emit(blackboard: &mut dyn Blackboard, event: TraceEvent) -> Result<(), BlackboardError> {
    if blackboard.contains(TRACE_LOG) {
        blackboard.get_mut(TRACE_LOG)?.push(event);
    }
    if blackboard.contains(TRACE_SINK) {
        blackboard.get_mut(TRACE_SINK)?.record(&event);
    }
    Ok(())
}
