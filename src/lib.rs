//! cursor-hashmap: A single-threaded, insertion-ordered hash map whose
//! iteration cursors stay correct while the map is mutated under them.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: give deterministic insertion-order iteration with amortized
//!   O(1) lookup/insert/remove, where a traversal suspended mid-walk
//!   never revisits a removed key and never skips a live one, no matter
//!   what the map does in between.
//! - Layers:
//!   - LinkedSlots<K, V>: arena layer. A `slotmap` of chain slots
//!     threaded into a doubly linked insertion-order list. Removing a
//!     slot while a cursor might rest on it leaves a tombstone holding a
//!     backward redirect to the predecessor the entry had at that
//!     moment; the raw traversal step unwinds redirect chains until it
//!     lands on a live slot or falls off an end.
//!   - CursorHashMap<K, V, S>: facade layer. Pairs the chain with a
//!     `hashbrown::HashTable` index of precomputed hashes, decides
//!     between freeing and tombstoning on removal, reclaims dead slots
//!     once no cursor remains, and carries the public API and iterators.
//!   - Cursor: a detached bookmark. It borrows nothing; every advance
//!     takes the map by reference, so callers may interleave arbitrary
//!     mutation with traversal.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` by design (reentrant use from
//!   callbacks is the supported pattern, concurrency is not).
//! - No operation fails: absence is `Option`/`bool`, exhausted cursors
//!   yield `None` forever, removal of a missing key is a no-op.
//! - Stable generational slot keys; `K: Hash` runs once per key at
//!   insertion, never again afterward.
//! - Overwriting a present key replaces its value in place and keeps its
//!   position; remove-then-reinsert appends a brand-new entry.
//!
//! Why this split?
//! - Localize invariants: the chain layer owns link/tombstone
//!   correctness, the facade owns index/chain agreement and tombstone
//!   lifetime, the cursor is a pure state machine over the chain.
//! - No unsafe: stale positions are generational keys that fail closed,
//!   not aliased pointers.
//! - Clear failure boundaries: user code (`K: Eq`/`Hash`, callbacks,
//!   drops) never runs while the structure is inconsistent, enforced in
//!   debug builds by an embedded reentrancy guard.
//!
//! Tombstone lifetime
//! - Every cursor clones the map's `Rc` pin. While any cursor is alive,
//!   removals tombstone their slot instead of freeing it; the next
//!   structural mutation after the last cursor drops reclaims all of
//!   them in one sweep. `clear` advances an epoch that retires every
//!   pre-clear cursor outright, so it can free everything immediately.
//!
//! Notes and non-goals
//! - Insertion order is the only order; there is no move-to-front or
//!   manual reordering.
//! - No `no_std`, no serde, no weak cursors.
//! - Public surface is `CursorHashMap`, `Cursor` and the iterator types;
//!   the chain layer is an implementation detail.

mod cursor;
mod cursor_hash_map;
mod cursor_map_proptest;
mod linked_slots;
mod reentrancy;

// Public surface
pub use cursor::Cursor;
pub use cursor_hash_map::{CursorHashMap, IntoIter, Iter, Keys, Values};
