//! Cursor: a detached traversal bookmark over a `CursorHashMap`.
//!
//! A cursor borrows nothing from its map. Every advance takes the map by
//! reference, and the returned borrows end with the caller's use of them,
//! so the map may be mutated freely between advances, including removing
//! the very entry the cursor is resting on. The map leaves a redirect
//! behind in that case and the cursor recovers the correct continuation
//! on its next step.

use std::rc::Rc;

use crate::cursor_hash_map::CursorHashMap;
use crate::linked_slots::Pos;

/// A suspendable iteration position, created by
/// [`CursorHashMap::cursor`]. Yields live entries in insertion order.
///
/// Entries inserted while the cursor is suspended are appended to the
/// order and will be reached; entries removed before the cursor reaches
/// them are skipped. Once the cursor reports `None` it reports `None`
/// forever, and clearing the map retires every cursor created before the
/// clear the same way.
///
/// # Examples
///
/// ```
/// use cursor_hashmap::CursorHashMap;
///
/// let mut map = CursorHashMap::new();
/// map.insert("a", 1);
/// map.insert("b", 2);
/// map.insert("c", 3);
///
/// let mut cursor = map.cursor();
/// assert_eq!(cursor.next(&map), Some((&"a", &1)));
///
/// // Mutate mid-traversal: the cursor skips the removed entry.
/// map.remove(&"b");
/// assert_eq!(cursor.next(&map), Some((&"c", &3)));
/// assert_eq!(cursor.next(&map), None);
/// ```
#[derive(Clone, Debug)]
pub struct Cursor {
    pin: Rc<()>,
    epoch: u64,
    pos: Pos,
}

impl Cursor {
    pub(crate) fn new(pin: Rc<()>, epoch: u64) -> Self {
        Self {
            pin,
            epoch,
            pos: Pos::Front,
        }
    }

    fn advance<K, V, S>(&mut self, map: &CursorHashMap<K, V, S>) -> Option<slotmap::DefaultKey> {
        assert!(
            Rc::ptr_eq(&self.pin, map.pin()),
            "cursor advanced on a map it does not belong to"
        );
        if self.epoch != map.epoch() {
            self.pos = Pos::End;
            return None;
        }
        match map.chain().next_live(self.pos) {
            Some(k) => {
                self.pos = Pos::At(k);
                Some(k)
            }
            None => {
                self.pos = Pos::End;
                None
            }
        }
    }

    /// Advance to the next live entry and borrow it from `map`.
    ///
    /// # Panics
    ///
    /// Panics if `map` is not the map this cursor was created from.
    pub fn next<'m, K, V, S>(&mut self, map: &'m CursorHashMap<K, V, S>) -> Option<(&'m K, &'m V)> {
        let k = self.advance(map)?;
        map.chain().entry(k).map(|e| (&e.key, &e.value))
    }

    /// Advance to the next live entry and borrow it mutably from `map`.
    ///
    /// The key stays shared; only the value may be changed in place.
    ///
    /// # Panics
    ///
    /// Panics if `map` is not the map this cursor was created from.
    pub fn next_mut<'m, K, V, S>(
        &mut self,
        map: &'m mut CursorHashMap<K, V, S>,
    ) -> Option<(&'m K, &'m mut V)> {
        let k = self.advance(map)?;
        map.chain_mut()
            .entry_mut(k)
            .map(|e| (&e.key, &mut e.value))
    }
}
