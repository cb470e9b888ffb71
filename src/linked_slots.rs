//! LinkedSlots: slot-arena storage threaded into an insertion-order chain,
//! with in-place tombstoning of removed slots so suspended traversals can
//! recover their continuation.

use core::mem;
use slotmap::{DefaultKey, SlotMap};

/// Where a tombstone sends a traversal that was resting on it when the
/// entry died: back to the predecessor the entry had at that moment, or
/// to the front of the chain if it had none.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Redirect {
    Entry(DefaultKey),
    Front,
}

/// A live record in the chain. `hash` is computed once at insertion and
/// reused for every index probe afterward.
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    pub(crate) prev: Option<DefaultKey>,
    pub(crate) next: Option<DefaultKey>,
}

#[derive(Debug)]
pub(crate) enum Slot<K, V> {
    Live(Entry<K, V>),
    Tombstone(Redirect),
}

/// A traversal position. `Front` stands in for the sentinel head: it has
/// no record of its own and always resolves against the current first
/// link, so a chain that empties and refills is observed correctly.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Pos {
    Front,
    At(DefaultKey),
    End,
}

/// Arena of chain slots plus the first/last links of the live chain.
///
/// Live slots form a doubly linked list in insertion order. A removed
/// slot is either freed outright or left behind as a tombstone; the
/// `dead` list remembers tombstoned slots so they can be reclaimed in
/// one sweep once no traversal can be resting on them.
#[derive(Debug)]
pub(crate) struct LinkedSlots<K, V> {
    slots: SlotMap<DefaultKey, Slot<K, V>>,
    first: Option<DefaultKey>,
    last: Option<DefaultKey>,
    dead: Vec<DefaultKey>,
}

impl<K, V> LinkedSlots<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            first: None,
            last: None,
            dead: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            first: None,
            last: None,
            dead: Vec::new(),
        }
    }

    pub(crate) fn first_key(&self) -> Option<DefaultKey> {
        self.first
    }

    pub(crate) fn last_key(&self) -> Option<DefaultKey> {
        self.last
    }

    pub(crate) fn entry(&self, key: DefaultKey) -> Option<&Entry<K, V>> {
        match self.slots.get(key) {
            Some(Slot::Live(e)) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn entry_mut(&mut self, key: DefaultKey) -> Option<&mut Entry<K, V>> {
        match self.slots.get_mut(key) {
            Some(Slot::Live(e)) => Some(e),
            _ => None,
        }
    }

    fn live_mut(&mut self, key: DefaultKey) -> &mut Entry<K, V> {
        match self.slots.get_mut(key) {
            Some(Slot::Live(e)) => e,
            _ => unreachable!("chain link names a slot that is not live"),
        }
    }

    /// Append a new live entry after the current last link.
    pub(crate) fn push_back(&mut self, key: K, value: V, hash: u64) -> DefaultKey {
        let prev = self.last;
        let k = self.slots.insert(Slot::Live(Entry {
            key,
            value,
            hash,
            prev,
            next: None,
        }));
        match prev {
            Some(tail) => self.live_mut(tail).next = Some(k),
            None => self.first = Some(k),
        }
        self.last = Some(k);
        k
    }

    pub(crate) fn replace_value(&mut self, key: DefaultKey, value: V) -> V {
        mem::replace(&mut self.live_mut(key).value, value)
    }

    /// Splice a live entry out of the chain and return it.
    ///
    /// With `keep_tombstone`, the slot stays allocated as a redirect to
    /// the predecessor the entry had at this moment, so a traversal
    /// resting on it can take one hop backward onto a slot whose forward
    /// link is current. Without it, the slot is freed outright.
    pub(crate) fn unlink(&mut self, key: DefaultKey, keep_tombstone: bool) -> Entry<K, V> {
        let slot = mem::replace(
            self.slots
                .get_mut(key)
                .unwrap_or_else(|| unreachable!("unlink of a missing slot")),
            Slot::Tombstone(Redirect::Front),
        );
        let entry = match slot {
            Slot::Live(e) => e,
            Slot::Tombstone(_) => unreachable!("unlink of a tombstoned slot"),
        };

        if keep_tombstone {
            if let Some(p) = entry.prev {
                self.slots[key] = Slot::Tombstone(Redirect::Entry(p));
            }
            self.dead.push(key);
        } else {
            self.slots.remove(key);
        }

        match entry.prev {
            Some(p) => self.live_mut(p).next = entry.next,
            None => self.first = entry.next,
        }
        match entry.next {
            Some(n) => self.live_mut(n).prev = entry.prev,
            None => self.last = entry.prev,
        }
        entry
    }

    /// Step from `pos` to the next live slot, or `None` past the end.
    ///
    /// A tombstone's redirect names the predecessor it had when it died;
    /// that predecessor was live at that moment and was only ever
    /// tombstoned later, so redirect chains move strictly backward in
    /// deletion time and must end at a live slot or the front. A slot
    /// that no longer resolves at all terminates the walk.
    pub(crate) fn next_live(&self, pos: Pos) -> Option<DefaultKey> {
        let mut pos = pos;
        loop {
            match pos {
                Pos::End => return None,
                Pos::Front => return self.first,
                Pos::At(k) => match self.slots.get(k) {
                    Some(Slot::Live(e)) => return e.next,
                    Some(Slot::Tombstone(Redirect::Entry(p))) => pos = Pos::At(*p),
                    Some(Slot::Tombstone(Redirect::Front)) => pos = Pos::Front,
                    None => return None,
                },
            }
        }
    }

    pub(crate) fn has_dead(&self) -> bool {
        !self.dead.is_empty()
    }

    /// Free every tombstoned slot. Callers must first establish that no
    /// traversal can still be resting on one.
    pub(crate) fn reclaim(&mut self) {
        for k in self.dead.drain(..) {
            let removed = self.slots.remove(k);
            debug_assert!(matches!(removed, Some(Slot::Tombstone(_))));
        }
    }

    /// Empty the chain, handing the old arena back so the caller decides
    /// where the stored keys and values are dropped.
    pub(crate) fn take_all(&mut self) -> SlotMap<DefaultKey, Slot<K, V>> {
        self.first = None;
        self.last = None;
        self.dead.clear();
        mem::replace(&mut self.slots, SlotMap::with_key())
    }

    /// Decompose into the raw arena and the first link, for draining.
    pub(crate) fn into_parts(self) -> (SlotMap<DefaultKey, Slot<K, V>>, Option<DefaultKey>) {
        (self.slots, self.first)
    }

    #[cfg(test)]
    pub(crate) fn dead_count(&self) -> usize {
        self.dead.len()
    }
}
