use std::collections::{HashMap, HashSet};

use bodypass::{
    run_passes, split_body_traps, split_traps, Body, Trap, TrapChain, TrapSplitter, UnitChain,
    UnitId, UnitKind,
};

fn stream(len: usize) -> (UnitChain, Vec<UnitId>) {
    let mut units = UnitChain::new();
    let ids = (0..len).map(|_| units.push(UnitKind::Stmt)).collect();
    (units, ids)
}

fn snapshot(traps: &TrapChain) -> Vec<Trap> {
    traps.iter().map(|(_, t)| t.clone()).collect()
}

/// First-match handler lookup over a trap table snapshot
fn dispatch(
    table: &[Trap],
    index: &HashMap<UnitId, usize>,
    unit: UnitId,
    exception: &str,
) -> Option<UnitId> {
    let pos = index[&unit];
    table
        .iter()
        .find(|t| t.exception == exception && index[&t.begin] <= pos && pos < index[&t.end])
        .map(|t| t.handler)
}

/// Dispatch must select the same handler for every unit and exception type
fn assert_dispatch_equivalent(units: &UnitChain, before: &[Trap], after: &[Trap]) {
    let index = units.position_index();
    let exceptions: HashSet<&str> =
        before.iter().chain(after).map(|t| t.exception.as_str()).collect();
    for unit in units.iter() {
        for exception in &exceptions {
            assert_eq!(
                dispatch(before, &index, unit, exception),
                dispatch(after, &index, unit, exception),
                "dispatch changed at unit {:?} for {}",
                unit,
                exception
            );
        }
    }
}

/// Every remaining pair is disjoint or is a same-end pair with different
/// exception types
fn assert_no_overlap(units: &UnitChain, after: &[Trap]) {
    let index = units.position_index();
    for (i, a) in after.iter().enumerate() {
        for b in &after[i + 1..] {
            let disjoint =
                index[&a.end] <= index[&b.begin] || index[&b.end] <= index[&a.begin];
            let compatible = a.end == b.end && a.exception != b.exception;
            assert!(
                disjoint || compatible,
                "traps still overlap: {:?} and {:?}",
                a,
                b
            );
        }
    }
}

fn assert_no_empty(after: &[Trap]) {
    assert!(after.iter().all(|t| !t.is_empty()), "empty trap left in table: {:?}", after);
}

/// Positions covered by traps of one exception type
fn coverage(units: &UnitChain, table: &[Trap], exception: &str) -> HashSet<usize> {
    let index = units.position_index();
    let mut covered = HashSet::new();
    for t in table.iter().filter(|t| t.exception == exception) {
        covered.extend(index[&t.begin]..index[&t.end]);
    }
    covered
}

fn assert_coverage_conserved(units: &UnitChain, before: &[Trap], after: &[Trap]) {
    let exceptions: HashSet<&str> =
        before.iter().chain(after).map(|t| t.exception.as_str()).collect();
    for exception in exceptions {
        assert_eq!(
            coverage(units, before, exception),
            coverage(units, after, exception),
            "coverage changed for {}",
            exception
        );
    }
}

fn assert_postconditions(units: &UnitChain, before: &[Trap], after: &[Trap]) {
    assert_no_overlap(units, after);
    assert_no_empty(after);
    assert_dispatch_equivalent(units, before, after);
    assert_coverage_conserved(units, before, after);
}

#[test]
fn partial_overlap_same_exception_and_handler_splits_head() {
    let (units, u) = stream(9);
    let mut traps = TrapChain::new();
    traps.push(Trap::new("Ex", u[1], u[5], u[7]));
    traps.push(Trap::new("Ex", u[3], u[7], u[7]));
    let before = snapshot(&traps);

    split_traps(&units, &mut traps).unwrap();

    let after = snapshot(&traps);
    assert_postconditions(&units, &before, &after);
    // The first trap keeps its head up to where the second begins.
    assert!(
        after.iter().any(|t| t.begin == u[1] && t.end == u[3] && t.exception == "Ex"),
        "expected the carved-off head 1..3, got {:?}",
        after
    );
}

#[test]
fn nested_same_exception_different_handlers_drops_inner() {
    let (units, u) = stream(12);
    let mut traps = TrapChain::new();
    traps.push(Trap::new("Ex", u[2], u[10], u[10]));
    traps.push(Trap::new("Ex", u[2], u[6], u[11]));
    let before = snapshot(&traps);

    split_traps(&units, &mut traps).unwrap();

    let after = snapshot(&traps);
    assert_postconditions(&units, &before, &after);
    // The outer handler has table priority over the whole shared range, so
    // the inner handler can never fire and must be gone.
    assert!(after.iter().all(|t| t.handler != u[11]), "dead handler survived: {:?}", after);
}

#[test]
fn nested_different_exceptions_keeps_both_dispatches() {
    let (units, u) = stream(12);
    let mut traps = TrapChain::new();
    traps.push(Trap::new("ExA", u[2], u[10], u[10]));
    traps.push(Trap::new("ExB", u[2], u[6], u[11]));
    let before = snapshot(&traps);

    split_traps(&units, &mut traps).unwrap();

    let after = snapshot(&traps);
    assert_postconditions(&units, &before, &after);
    // ExB must still reach its handler over the inner range, and ExA must
    // cover the tail on its own.
    assert!(after
        .iter()
        .any(|t| t.exception == "ExB" && t.begin == u[2] && t.end == u[6] && t.handler == u[11]));
    assert!(after
        .iter()
        .any(|t| t.exception == "ExA" && t.begin == u[6] && t.end == u[10] && t.handler == u[10]));
}

#[test]
fn trap_reduced_to_empty_is_dropped() {
    let (units, u) = stream(8);
    let mut traps = TrapChain::new();
    // Identical ranges, same exception, different handlers: the second trap
    // is consumed entirely.
    traps.push(Trap::new("Ex", u[2], u[6], u[6]));
    traps.push(Trap::new("Ex", u[2], u[6], u[7]));
    let before = snapshot(&traps);

    split_traps(&units, &mut traps).unwrap();

    let after = snapshot(&traps);
    assert_postconditions(&units, &before, &after);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0], Trap::new("Ex", u[2], u[6], u[6]));
}

#[test]
fn non_overlapping_table_is_left_unchanged() {
    let (units, u) = stream(10);
    let mut traps = TrapChain::new();
    traps.push(Trap::new("ExA", u[1], u[3], u[8]));
    traps.push(Trap::new("ExA", u[3], u[5], u[8]));
    traps.push(Trap::new("ExB", u[5], u[7], u[9]));
    let before = snapshot(&traps);

    split_traps(&units, &mut traps).unwrap();

    assert_eq!(snapshot(&traps), before);
}

#[test]
fn same_end_different_exceptions_coincide_untouched() {
    let (units, u) = stream(8);
    let mut traps = TrapChain::new();
    // Sharing units is fine when the ranges end together with different
    // exception types.
    traps.push(Trap::new("ExA", u[1], u[5], u[6]));
    traps.push(Trap::new("ExB", u[3], u[5], u[7]));
    let before = snapshot(&traps);

    split_traps(&units, &mut traps).unwrap();

    assert_eq!(snapshot(&traps), before);
}

#[test]
fn fewer_than_two_traps_is_a_no_op() {
    let (units, u) = stream(6);

    let mut traps = TrapChain::new();
    split_traps(&units, &mut traps).unwrap();
    assert_eq!(traps.len(), 0);

    traps.push(Trap::new("Ex", u[0], u[4], u[5]));
    let before = snapshot(&traps);
    split_traps(&units, &mut traps).unwrap();
    assert_eq!(snapshot(&traps), before);
}

#[test]
fn empty_input_traps_are_stripped() {
    let (units, u) = stream(8);
    let mut traps = TrapChain::new();
    traps.push(Trap::new("Ex", u[2], u[2], u[6]));
    traps.push(Trap::new("Ex", u[3], u[5], u[6]));
    let before = snapshot(&traps);

    split_traps(&units, &mut traps).unwrap();

    let after = snapshot(&traps);
    assert_no_empty(&after);
    assert_eq!(after, before[1..].to_vec());
}

#[test]
fn transform_is_idempotent() {
    let (units, u) = stream(12);
    let mut traps = TrapChain::new();
    traps.push(Trap::new("ExA", u[1], u[7], u[10]));
    traps.push(Trap::new("ExB", u[3], u[9], u[11]));

    split_traps(&units, &mut traps).unwrap();
    let first = snapshot(&traps);
    split_traps(&units, &mut traps).unwrap();

    assert_eq!(snapshot(&traps), first);
}

#[test]
fn three_way_mutual_overlap_reaches_a_clean_fixed_point() {
    let (units, u) = stream(14);
    let mut traps = TrapChain::new();
    traps.push(Trap::new("ExA", u[0], u[6], u[11]));
    traps.push(Trap::new("ExB", u[2], u[8], u[12]));
    traps.push(Trap::new("ExA", u[4], u[10], u[13]));
    let before = snapshot(&traps);

    split_traps(&units, &mut traps).unwrap();

    assert_postconditions(&units, &before, &snapshot(&traps));
}

#[test]
fn splitter_runs_as_a_body_pass() {
    let (units, u) = stream(9);
    let mut body = Body::new();
    body.units = units;
    body.traps.push(Trap::new("Ex", u[1], u[5], u[8]));
    body.traps.push(Trap::new("Ex", u[3], u[7], u[8]));
    let before = snapshot(&body.traps);

    run_passes(&mut body, &[&TrapSplitter::new()]).unwrap();

    assert_postconditions(&body.units, &before, &snapshot(&body.traps));
}

#[test]
fn convenience_wrapper_splits_in_place() {
    let (units, u) = stream(9);
    let mut body = Body::new();
    body.units = units;
    body.traps.push(Trap::new("ExA", u[1], u[6], u[7]));
    body.traps.push(Trap::new("ExB", u[2], u[4], u[8]));
    let before = snapshot(&body.traps);

    split_body_traps(&mut body).unwrap();

    assert_postconditions(&body.units, &before, &snapshot(&body.traps));
}

#[test]
fn positions_follow_stream_order_not_arena_order() {
    // Patch units into the middle of the stream so that id order and
    // stream order disagree, then split across the patched region.
    let mut units = UnitChain::new();
    let a = units.push(UnitKind::Stmt);
    let d = units.push(UnitKind::Stmt);
    let e = units.push(UnitKind::Stmt);
    let f = units.push(UnitKind::Stmt);
    let b = units.insert_after(a, UnitKind::Stmt).unwrap();
    let c = units.insert_after(b, UnitKind::Stmt).unwrap();
    // Stream order is now a b c d e f.

    let mut traps = TrapChain::new();
    traps.push(Trap::new("Ex", a, d, f));
    traps.push(Trap::new("Ex", c, e, f));
    let before = snapshot(&traps);

    split_traps(&units, &mut traps).unwrap();

    let after = snapshot(&traps);
    assert_postconditions(&units, &before, &after);
    assert!(after.iter().any(|t| t.begin == a && t.end == c));
}
