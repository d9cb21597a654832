mod common;

use std::sync::Arc;

use bt_core::{BlackboardExt, NodeState};
use bt_vm::nodes::{delay_timer, parallel, sequence};
use bt_vm::{BehaviorTree, VirtualMachine, DELTA_TIME};
use common::*;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn machine_and_blob_are_shareable() {
    assert_send_sync::<VirtualMachine>();
    assert_send_sync::<bt_core::NodeBlob>();
    fn assert_send<T: Send>() {}
    assert_send::<BehaviorTree>();
    assert_send::<bt_core::MapBlackboard>();
}

#[test]
fn instances_on_different_threads_share_one_blob() {
    let vm = vm();
    let shared = blob(&sequence::def([
        delay_timer::def(1.0, DELTA_TIME).unwrap(),
        parallel::def([leaf(NodeState::Success), scripted(&[NodeState::Running, NodeState::Success])]),
    ]));

    let results: Vec<Vec<NodeState>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (1..=4)
            .map(|worker| {
                let vm = &vm;
                let shared = Arc::clone(&shared);
                scope.spawn(move || {
                    let mut tree = BehaviorTree::new(shared);
                    let mut bb = blackboard();
                    // Each worker advances its timer at a different rate.
                    bb.set(DELTA_TIME, 0.25 * worker as f32);
                    (0..6)
                        .map(|_| tree.tick(vm, &mut bb).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    use NodeState::{Running, Success};
    // Reactive sequence: a slow timer completes, then restarts on the next tick and preempts
    // the parallel before it can finish.
    assert_eq!(results[0], vec![Running; 6]);
    assert_eq!(results[3], vec![Running, Success, Running, Success, Running, Success]);
    // The shared defaults were never written through.
    assert_eq!(
        shared
            .default_node_data::<delay_timer::DelayTimerData>(1)
            .unwrap()
            .elapsed,
        0.0
    );
}
