//! CursorHashMap: insertion-ordered hash map whose traversals survive
//! mutation of the map while they are suspended.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use std::collections::hash_map::RandomState;
use std::rc::Rc;

use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};

use crate::cursor::Cursor;
use crate::linked_slots::{LinkedSlots, Pos, Slot};
use crate::reentrancy::DebugReentrancy;

/// A hash map that iterates in insertion order and keeps suspended
/// iteration positions correct across arbitrary mutation.
///
/// Lookup, insertion and removal are amortized O(1). Overwriting an
/// existing key replaces its value without moving it in the order;
/// removing and re-inserting a key appends it as a brand-new entry.
///
/// Borrowing iterators ([`iter`](Self::iter), [`keys`](Self::keys),
/// [`values`](Self::values)) cover plain traversal; the borrow checker
/// already guarantees the map cannot change under them. To interleave
/// mutation with traversal, take a detached [`Cursor`]: it holds no
/// borrow between advances, and entries removed mid-traversal (even the
/// one the cursor is resting on) are skipped without revisiting or
/// missing any live entry.
///
/// The map is single-threaded by design (`!Send`/`!Sync`): reentrant use
/// from callbacks is a supported pattern, concurrent use is not.
pub struct CursorHashMap<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    chain: LinkedSlots<K, V>,
    // Cloned into every detached cursor; a strong count of one means no
    // cursor is outstanding and tombstoned slots can be freed.
    pin: Rc<()>,
    // Advanced by `clear`; cursors from an older epoch are exhausted.
    clears: u64,
    reentrancy: DebugReentrancy,
}

impl<K, V> CursorHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<K, V> Default for CursorHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> CursorHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            chain: LinkedSlots::new(),
            pin: Rc::new(()),
            clears: 0,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::with_capacity(capacity),
            chain: LinkedSlots::with_capacity(capacity),
            pin: Rc::new(()),
            clears: 0,
            reentrancy: DebugReentrancy::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Whether any detached cursor is still alive. While one is, removed
    /// slots must be left behind as redirects instead of freed.
    fn pinned(&self) -> bool {
        Rc::strong_count(&self.pin) > 1
    }

    fn reclaim_if_quiescent(&mut self) {
        if self.chain.has_dead() && !self.pinned() {
            self.chain.reclaim();
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(key);
        let &k = self.index.find(hash, |&k| {
            self.chain
                .entry(k)
                .map(|e| e.key.borrow() == key)
                .unwrap_or(false)
        })?;
        self.chain.entry(k).map(|e| &e.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(key);
        let &k = self.index.find(hash, |&k| {
            self.chain
                .entry(k)
                .map(|e| e.key.borrow() == key)
                .unwrap_or(false)
        })?;
        self.chain.entry_mut(k).map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(key);
        self.index
            .find(hash, |&k| {
                self.chain
                    .entry(k)
                    .map(|e| e.key.borrow() == key)
                    .unwrap_or(false)
            })
            .is_some()
    }

    /// Insert `key`/`value`, returning the previous value if the key was
    /// present. An overwrite keeps the entry's position in the order; a
    /// fresh key is appended at the back.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.reclaim_if_quiescent();
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(&key);
        match self.index.entry(
            hash,
            |&k| self.chain.entry(k).map(|e| e.key == key).unwrap_or(false),
            |&k| self.chain.entry(k).map(|e| e.hash).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(o) => {
                let k = *o.get();
                Some(self.chain.replace_value(k, value))
            }
            hashbrown::hash_table::Entry::Vacant(v) => {
                let k = self.chain.push_back(key, value, hash);
                let _ = v.insert(k);
                None
            }
        }
    }

    /// Remove `key`, returning its value. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(key).map(|(_k, v)| v)
    }

    /// Remove `key`, returning the owned key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.reclaim_if_quiescent();
        let _g = self.reentrancy.enter();
        let hash = self.make_hash(key);
        let k = match self.index.find_entry(hash, |&k| {
            self.chain
                .entry(k)
                .map(|e| e.key.borrow() == key)
                .unwrap_or(false)
        }) {
            Ok(occupied) => occupied.remove().0,
            Err(_) => return None,
        };
        let keep_tombstone = self.pinned();
        let entry = self.chain.unlink(k, keep_tombstone);
        // Structure is consistent again; the guard drops here and the
        // caller may run arbitrary drops on the returned pair.
        Some((entry.key, entry.value))
    }

    /// Remove every entry. Every cursor created before the clear is
    /// exhausted from its next advance on, regardless of where it was
    /// resting and regardless of later insertions.
    pub fn clear(&mut self) {
        let dropped;
        {
            let _g = self.reentrancy.enter();
            self.index.clear();
            self.clears += 1;
            dropped = self.chain.take_all();
        }
        // Stored keys and values drop only now, with the guard released
        // and the map observably empty.
        drop(dropped);
    }

    /// First entry in insertion order.
    pub fn front(&self) -> Option<(&K, &V)> {
        let k = self.chain.first_key()?;
        self.chain.entry(k).map(|e| (&e.key, &e.value))
    }

    /// Last entry in insertion order.
    pub fn back(&self) -> Option<(&K, &V)> {
        let k = self.chain.last_key()?;
        self.chain.entry(k).map(|e| (&e.key, &e.value))
    }

    /// Keep only the entries `f` approves of, in order. Rejected entries
    /// are removed exactly as by [`remove`](Self::remove); the relative
    /// order of keepers is unchanged.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cur = self.chain.next_live(Pos::Front);
        while let Some(k) = cur {
            // Resolve the continuation before `f` can decide to remove k.
            cur = self.chain.next_live(Pos::At(k));
            let keep = match self.chain.entry_mut(k) {
                Some(e) => f(&e.key, &mut e.value),
                None => true,
            };
            if !keep {
                let _removed = self.remove_slot(k);
            }
        }
        self.reclaim_if_quiescent();
    }

    /// Visit every entry in order with mutable access to the values.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V),
    {
        let mut cur = self.chain.next_live(Pos::Front);
        while let Some(k) = cur {
            cur = self.chain.next_live(Pos::At(k));
            if let Some(e) = self.chain.entry_mut(k) {
                f(&e.key, &mut e.value);
            }
        }
    }

    fn remove_slot(&mut self, k: DefaultKey) -> Option<(K, V)> {
        let _g = self.reentrancy.enter();
        let hash = self.chain.entry(k)?.hash;
        if let Ok(occupied) = self.index.find_entry(hash, |&kk| kk == k) {
            let _ = occupied.remove();
        }
        let keep_tombstone = self.pinned();
        let entry = self.chain.unlink(k, keep_tombstone);
        Some((entry.key, entry.value))
    }

    /// A detached traversal bookmark positioned before the first entry.
    /// Unlike the borrowing iterators, a cursor allows the map to be
    /// mutated between advances.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(Rc::clone(&self.pin), self.clears)
    }

    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            map: self,
            pos: Pos::Front,
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V, S> {
        Values { inner: self.iter() }
    }

    #[cfg(test)]
    pub(crate) fn tombstone_count(&self) -> usize {
        self.chain.dead_count()
    }
}

// Accessors used by detached cursors. A cursor borrows nothing and is
// generic over any `<K, V, S>` with no bounds, so these must not require
// `K: Eq + Hash` or `S: BuildHasher` either.
impl<K, V, S> CursorHashMap<K, V, S> {
    pub(crate) fn chain(&self) -> &LinkedSlots<K, V> {
        &self.chain
    }

    pub(crate) fn chain_mut(&mut self) -> &mut LinkedSlots<K, V> {
        &mut self.chain
    }

    pub(crate) fn pin(&self) -> &Rc<()> {
        &self.pin
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.clears
    }
}

impl<K, V, S> fmt::Debug for CursorHashMap<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Clone for CursorHashMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        // A fresh map: the clone starts compact, with no tombstones and
        // no cursors attached to it.
        let mut map = Self::with_capacity_and_hasher(self.len(), self.hasher.clone());
        for (k, v) in self.iter() {
            map.insert(k.clone(), v.clone());
        }
        map
    }
}

impl<K, V, S> FromIterator<(K, V)> for CursorHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for CursorHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Borrowing iterator over entries in insertion order.
pub struct Iter<'a, K, V, S = RandomState> {
    map: &'a CursorHashMap<K, V, S>,
    pos: Pos,
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self.map.chain.next_live(self.pos) {
            Some(k) => {
                self.pos = Pos::At(k);
                self.map.chain.entry(k).map(|e| (&e.key, &e.value))
            }
            None => {
                self.pos = Pos::End;
                None
            }
        }
    }
}

impl<'a, K, V, S> FusedIterator for Iter<'a, K, V, S> {}

impl<'a, K, V, S> Clone for Iter<'a, K, V, S> {
    fn clone(&self) -> Self {
        Iter {
            map: self.map,
            pos: self.pos,
        }
    }
}

/// Borrowing iterator over keys in insertion order.
pub struct Keys<'a, K, V, S = RandomState> {
    inner: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Iterator for Keys<'a, K, V, S> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

impl<'a, K, V, S> FusedIterator for Keys<'a, K, V, S> {}

/// Borrowing iterator over values in insertion order.
pub struct Values<'a, K, V, S = RandomState> {
    inner: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Iterator for Values<'a, K, V, S> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

impl<'a, K, V, S> FusedIterator for Values<'a, K, V, S> {}

impl<'a, K, V, S> IntoIterator for &'a CursorHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator draining entries in insertion order.
pub struct IntoIter<K, V> {
    slots: SlotMap<DefaultKey, Slot<K, V>>,
    next: Option<DefaultKey>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.next?;
        match self.slots.remove(k) {
            Some(Slot::Live(e)) => {
                self.next = e.next;
                Some((e.key, e.value))
            }
            _ => None,
        }
    }
}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for CursorHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let (slots, first) = self.chain.into_parts();
        IntoIter { slots, next: first }
    }
}
