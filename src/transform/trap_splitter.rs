/*!
 * Trap splitter - rewrites a trap table so that no two ranges overlap
 *
 * Targets like Dalvik list every handler of a protected range on a single
 * table entry and cannot represent hierarchies of traps. If a trap (1-3)
 * with handler A overlaps a trap (2) with handler B, the table is rewritten
 * into (1) and (3) with A, and (2) with A+B.
 *
 * The rewrite must not change dispatch: handlers are searched in table
 * order, and for any faulting unit and thrown exception type the first
 * matching entry before and after the transform selects the same handler.
 */

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::ir::{Body, Trap, TrapChain, TrapId, UnitChain, UnitId};
use crate::transform::BodyTransform;

/// One actionable overlap between two traps
struct TrapOverlap {
    /// The earlier-starting trap
    t1: TrapId,
    /// The later-starting trap
    t2: TrapId,
    /// Begin unit of `t2`, where the ranges must be cut apart
    split_point: UnitId,
}

/// Body pass wrapper around [`split_traps`]
pub struct TrapSplitter;

impl TrapSplitter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TrapSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyTransform for TrapSplitter {
    fn name(&self) -> &'static str {
        "trap-splitter"
    }

    fn apply(&self, body: &mut Body) -> Result<()> {
        split_traps(&body.units, &mut body.traps)
    }
}

/// Rewrite `traps` in place until no two ranges overlap.
///
/// One overlapping pair is resolved per iteration and detection restarts
/// from scratch; every step either removes a trap or strictly shrinks one,
/// so the loop reaches a fixed point.
pub fn split_traps(units: &UnitChain, traps: &mut TrapChain) -> Result<()> {
    // Empty ranges cover nothing and are invalid table entries; strip them
    // up front.
    let empty: Vec<TrapId> =
        traps.iter().filter(|(_, t)| t.is_empty()).map(|(id, _)| id).collect();
    for id in empty {
        traps.remove(id);
    }

    // With fewer than two traps there is nothing to do.
    if traps.len() < 2 {
        return Ok(());
    }

    // Unit positions never move while trap boundaries do; number the stream
    // once and reuse the index across iterations.
    let positions = units.position_index();

    while let Some(overlap) = next_overlap(units, traps, &positions)? {
        apply_split(units, traps, &overlap)?;
    }
    Ok(())
}

/// Find the first actionable overlapping pair, or `None` at the fixed point.
///
/// Traps are walked in table order, registering each covered unit as we go;
/// a pair is reported at the unit where the later-starting trap begins
/// inside a range already covered by the other.
fn next_overlap(
    units: &UnitChain,
    traps: &TrapChain,
    positions: &HashMap<UnitId, usize>,
) -> Result<Option<TrapOverlap>> {
    let mut traps_per_unit: HashMap<UnitId, Vec<TrapId>> = HashMap::new();

    for (id, trap) in traps.iter() {
        let mut unit = trap.begin;
        while unit != trap.end {
            if let Some(existing) = traps_per_unit.get(&unit) {
                for &other in existing {
                    let other_trap = match traps.get(other) {
                        Some(t) => t,
                        None => continue,
                    };
                    // Two ranges ending at the same unit with different
                    // exception types may coincide: the target lists both
                    // types on one entry.
                    if other_trap.end == trap.end && other_trap.exception != trap.exception {
                        continue;
                    }
                    // On equal begins the earlier-registered trap has table
                    // priority and becomes t1.
                    let (t1, t2) = if starts_before(positions, trap, other_trap)? {
                        (id, other)
                    } else {
                        (other, id)
                    };
                    let t2_trap = if t2 == id { trap } else { other_trap };
                    if t2_trap.begin == unit && t2_trap.end != unit {
                        return Ok(Some(TrapOverlap { t1, t2, split_point: t2_trap.begin }));
                    }
                }
            }
            traps_per_unit.entry(unit).or_default().push(id);
            unit = step(units, unit, trap)?;
        }
    }

    Ok(None)
}

/// Resolve one reported overlap, preserving first-match dispatch.
fn apply_split(units: &UnitChain, traps: &mut TrapChain, overlap: &TrapOverlap) -> Result<()> {
    if overlap.t1 == overlap.t2 {
        return Err(Error::internal("trap overlap pairs a trap with itself"));
    }
    let t1 = match traps.get(overlap.t1) {
        Some(t) => t.clone(),
        None => return Err(Error::internal("trap overlap references a removed trap")),
    };
    // Degenerate entries are removed instead of split.
    if t1.is_empty() {
        traps.remove(overlap.t1);
        return Ok(());
    }
    let t2 = match traps.get(overlap.t2) {
        Some(t) => t.clone(),
        None => return Err(Error::internal("trap overlap references a removed trap")),
    };
    if t2.is_empty() {
        traps.remove(overlap.t2);
        return Ok(());
    }

    if t1.begin != overlap.split_point {
        // t1 starts first: carve off t1.begin..split_point as its own trap,
        // then let t1 start where t2 does. The head range is non-empty since
        // the begins differ.
        let head = Trap::new(t1.exception.clone(), t1.begin, overlap.split_point, t1.handler);
        add_trap_after(traps, head, overlap.t1);
        set_begin(traps, overlap.t1, overlap.split_point);
    } else {
        // Both traps start at the same unit; walk to whichever end comes
        // first.
        let begin = t1.begin;
        let first_end = first_end_of(units, &t1, &t2)?;

        if first_end == t1.end {
            if t1.exception != t2.exception {
                let prefix = Trap::new(t2.exception.clone(), begin, first_end, t2.handler);
                add_trap_after(traps, prefix, overlap.t2);
            } else if t1.handler != t2.handler {
                // Same exception, different handlers. Handlers are searched
                // in table order, so t1 keeps the shared prefix and t2 is
                // reduced to the tail it alone covers.
                let prefix = Trap::new(t1.exception.clone(), begin, first_end, t1.handler);
                add_trap_after(traps, prefix, overlap.t1);
            }
            set_begin(traps, overlap.t2, first_end);
        } else {
            if t1.exception != t2.exception {
                let prefix = Trap::new(t1.exception.clone(), begin, first_end, t1.handler);
                add_trap_after(traps, prefix, overlap.t1);
                set_begin(traps, overlap.t1, first_end);
            } else if t1.handler != t2.handler {
                // t2 ends first and t1 outranks it over its whole range; t2
                // can never fire.
                traps.remove(overlap.t2);
            } else {
                set_begin(traps, overlap.t1, first_end);
            }
        }
    }

    Ok(())
}

/// Insert a new trap immediately after `position`, dropping empty ranges
/// instead of adding them. Falls back to appending when the anchor trap is
/// gone.
fn add_trap_after(traps: &mut TrapChain, trap: Trap, position: TrapId) {
    if trap.is_empty() {
        return;
    }
    if traps.get(position).is_some() {
        traps.insert_after(position, trap);
    } else {
        traps.push(trap);
    }
}

/// Move a trap's begin, removing the trap once the range becomes empty
fn set_begin(traps: &mut TrapChain, id: TrapId, begin: UnitId) {
    let now_empty = match traps.get_mut(id) {
        Some(trap) => {
            trap.begin = begin;
            trap.is_empty()
        }
        None => false,
    };
    if now_empty {
        traps.remove(id);
    }
}

/// Walk successors from the traps' shared begin until either end is reached
fn first_end_of(units: &UnitChain, t1: &Trap, t2: &Trap) -> Result<UnitId> {
    let mut unit = t1.begin;
    while unit != t1.end && unit != t2.end {
        unit = step(units, unit, t1)?;
    }
    Ok(unit)
}

fn step(units: &UnitChain, unit: UnitId, trap: &Trap) -> Result<UnitId> {
    units.succ_of(unit).ok_or_else(|| {
        Error::malformed(format!(
            "end of trap for {} is not reachable from its begin",
            trap.exception
        ))
    })
}

fn starts_before(
    positions: &HashMap<UnitId, usize>,
    a: &Trap,
    b: &Trap,
) -> Result<bool> {
    Ok(position_of(positions, a.begin)? < position_of(positions, b.begin)?)
}

fn position_of(positions: &HashMap<UnitId, usize>, unit: UnitId) -> Result<usize> {
    positions.get(&unit).copied().ok_or_else(|| {
        Error::malformed("trap bound references a unit outside the stream")
    })
}
