/*!
 * Unit chain - the ordered instruction stream of one method body
 *
 * Units are stored in an arena and threaded through `next` links, so a unit
 * keeps its identity and its successor stays stable while other units are
 * appended or patched in after it. Stream order is defined purely by the
 * links; arena order carries no meaning.
 */

use std::collections::HashMap;

use super::unit::{UnitId, UnitKind};

struct UnitEntry {
    kind: UnitKind,
    next: Option<UnitId>,
}

/// The ordered instruction stream of one method body
pub struct UnitChain {
    entries: Vec<UnitEntry>,
    head: Option<UnitId>,
    tail: Option<UnitId>,
}

impl UnitChain {
    pub fn new() -> Self {
        Self { entries: Vec::new(), head: None, tail: None }
    }

    /// Number of units in the stream
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First unit of the stream, if any
    pub fn head(&self) -> Option<UnitId> {
        self.head
    }

    /// Append a unit at the end of the stream
    pub fn push(&mut self, kind: UnitKind) -> UnitId {
        let id = UnitId(self.entries.len() as u32);
        self.entries.push(UnitEntry { kind, next: None });
        match self.tail {
            Some(tail) => self.entries[tail.0 as usize].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Patch a unit into the stream immediately after `pos`.
    ///
    /// Returns `None` when `pos` is not a unit of this chain.
    pub fn insert_after(&mut self, pos: UnitId, kind: UnitKind) -> Option<UnitId> {
        if pos.0 as usize >= self.entries.len() {
            return None;
        }
        let id = UnitId(self.entries.len() as u32);
        let succ = self.entries[pos.0 as usize].next;
        self.entries.push(UnitEntry { kind, next: succ });
        self.entries[pos.0 as usize].next = Some(id);
        if self.tail == Some(pos) {
            self.tail = Some(id);
        }
        Some(id)
    }

    /// The unit following `id` in stream order, or `None` at the end of the
    /// stream (and for ids that are not part of this chain)
    pub fn succ_of(&self, id: UnitId) -> Option<UnitId> {
        self.entries.get(id.0 as usize).and_then(|e| e.next)
    }

    /// Statement shape of a unit
    pub fn kind(&self, id: UnitId) -> Option<&UnitKind> {
        self.entries.get(id.0 as usize).map(|e| &e.kind)
    }

    /// Iterate the stream in order, head to tail
    pub fn iter(&self) -> UnitIter<'_> {
        UnitIter { chain: self, current: self.head }
    }

    /// Number every unit by one linear pass over the stream.
    ///
    /// The resulting map supports order comparisons between positions; it is
    /// not invalidated by trap boundary edits, only by patching the stream
    /// itself.
    pub fn position_index(&self) -> HashMap<UnitId, usize> {
        let mut index = HashMap::with_capacity(self.entries.len());
        for (idx, id) in self.iter().enumerate() {
            index.insert(id, idx);
        }
        index
    }
}

impl Default for UnitChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over unit ids in stream order
pub struct UnitIter<'a> {
    chain: &'a UnitChain,
    current: Option<UnitId>,
}

impl<'a> Iterator for UnitIter<'a> {
    type Item = UnitId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.chain.succ_of(id);
        Some(id)
    }
}
