mod common;

use bt_core::NodeState;
use bt_vm::nodes::{parallel, sequence};
use bt_vm::VmError;
use common::*;

use NodeState::{Failure, Running, Success};

#[test]
fn parallel_ticks_every_child_and_keeps_running() {
    let vm = vm();
    let mut blob = instance(&parallel::def([
        scripted(&[Running, Success]),
        leaf(Success),
        scripted(&[Running, Running, Failure]),
    ]));
    let mut bb = blackboard();

    assert_eq!(vm.tick(0, &mut blob, &mut bb), Ok(Running));
    assert_eq!(take_ticks(&mut bb), vec![1, 2, 3]);
    assert_eq!(
        blob.node_bytes(0),
        &[Running.bits(), Success.bits(), Running.bits()]
    );
}

#[test]
fn completed_children_are_not_ticked_again_until_reset() {
    let vm = vm();
    let mut blob = instance(&parallel::def([
        scripted(&[Running, Success]),
        leaf(Success),
        scripted(&[Running, Running, Failure]),
    ]));
    let mut bb = blackboard();

    assert_eq!(vm.tick(0, &mut blob, &mut bb), Ok(Running));
    take_ticks(&mut bb);

    assert_eq!(vm.tick(0, &mut blob, &mut bb), Ok(Running));
    assert_eq!(take_ticks(&mut bb), vec![1, 3]);

    assert_eq!(vm.tick(0, &mut blob, &mut bb), Ok(Failure));
    assert_eq!(take_ticks(&mut bb), vec![3]);

    // Re-entering a completed parallel starts over.
    assert_eq!(vm.tick(0, &mut blob, &mut bb), Ok(Running));
    assert_eq!(take_ticks(&mut bb), vec![1, 2, 3]);
}

#[test]
fn parallel_succeeds_once_all_children_succeed() {
    let vm = vm();
    let mut blob = instance(&parallel::def([
        scripted(&[Running, Success]),
        leaf(Success),
    ]));
    let mut bb = blackboard();

    assert_eq!(vm.tick(0, &mut blob, &mut bb), Ok(Running));
    assert_eq!(vm.tick(0, &mut blob, &mut bb), Ok(Success));
}

#[test]
fn failure_waits_for_running_siblings() {
    let vm = vm();
    let mut blob = instance(&parallel::def([
        leaf(Failure),
        scripted(&[Running, Success]),
    ]));
    let mut bb = blackboard();

    assert_eq!(vm.tick(0, &mut blob, &mut bb), Ok(Running));
    assert_eq!(vm.tick(0, &mut blob, &mut bb), Ok(Failure));
}

#[test]
fn parallel_without_a_running_child_is_an_error() {
    let vm = vm();
    let mut bb = blackboard();

    let mut empty = instance(&parallel::def([]));
    assert_eq!(
        vm.tick(0, &mut empty, &mut bb),
        Err(VmError::NoRunningChild { index: 0 })
    );

    // Force the "running with every child completed" state that normal re-entry prevents.
    let mut blob = instance(&sequence::def([parallel::def([leaf(Success), leaf(Success)])]));
    blob.set_state(1, Running);
    blob.node_bytes_mut(1).fill(Success.bits());
    blob.set_state(0, Running);
    assert_eq!(
        vm.tick(0, &mut blob, &mut bb),
        Err(VmError::NoRunningChild { index: 1 })
    );
}
