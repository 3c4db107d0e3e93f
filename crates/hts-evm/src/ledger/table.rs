//! A keyed table with stacked commit-or-discard staging.
//!
//! Each table holds a committed map plus a stack of overlay frames. Reads go through the overlay
//! stack top-down; writes always land in the top frame. Committing a frame promotes its entries
//! into the frame below, or into the committed map if it is the only frame. This gives nested
//! system-contract calls their isolation for free: a nested call pushes a frame, and its commit
//! is only visible to the enclosing call's frame, never to the committed store, until the
//! outermost frame commits.
//!
//! `BTreeMap` keeps iteration order deterministic, which matters because side effects and record
//! contents derived from table scans are consensus-visible.

use std::collections::BTreeMap;

/// A transactional keyed table.
///
/// A key is in one of three states during a call: *unstaged* (only the committed value exists),
/// *staged* (an overlay frame holds a pending write or removal), or *absent*.
#[derive(Debug, Clone, Default)]
pub struct TransactionalLedger<K, V> {
    committed: BTreeMap<K, V>,
    /// Overlay frames, innermost last. `None` marks a staged removal.
    frames: Vec<BTreeMap<K, Option<V>>>,
}

impl<K: Ord + Clone, V: Clone> TransactionalLedger<K, V> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self { committed: BTreeMap::new(), frames: Vec::new() }
    }

    /// Creates a table seeded with committed entries.
    pub fn from_committed(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self { committed: entries.into_iter().collect(), frames: Vec::new() }
    }

    /// Pushes a new staging frame. All subsequent writes land in it until it commits or rolls
    /// back.
    pub fn begin(&mut self) {
        self.frames.push(BTreeMap::new());
    }

    /// Depth of the staging stack.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Reads the effective value for `key`: staged if present in any frame, committed otherwise.
    pub fn get(&self, key: &K) -> Option<&V> {
        for frame in self.frames.iter().rev() {
            if let Some(slot) = frame.get(key) {
                return slot.as_ref();
            }
        }
        self.committed.get(key)
    }

    /// Whether the key currently maps to a value.
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Stages a write for `key` in the current frame.
    ///
    /// # Panics
    ///
    /// Panics if no frame is active; the execution engine always runs table mutations inside a
    /// staged call.
    pub fn put(&mut self, key: K, value: V) {
        self.top_frame().insert(key, Some(value));
    }

    /// Stages a removal for `key` in the current frame.
    pub fn remove(&mut self, key: K) {
        self.top_frame().insert(key, None);
    }

    /// Reads the effective value, applies `f` to a copy, and stages the result.
    ///
    /// Returns `false` without staging anything if the key is absent.
    pub fn update(&mut self, key: &K, f: impl FnOnce(&mut V)) -> bool {
        let Some(current) = self.get(key) else { return false };
        let mut next = current.clone();
        f(&mut next);
        self.put(key.clone(), next);
        true
    }

    /// Commits the top frame: its entries are promoted into the frame below, or into the
    /// committed map if it was the outermost frame.
    pub fn commit(&mut self) {
        let Some(frame) = self.frames.pop() else { return };
        if let Some(parent) = self.frames.last_mut() {
            parent.extend(frame);
        } else {
            for (key, slot) in frame {
                match slot {
                    Some(value) => {
                        self.committed.insert(key, value);
                    }
                    None => {
                        self.committed.remove(&key);
                    }
                }
            }
        }
    }

    /// Discards the top frame and every write staged in it.
    pub fn rollback(&mut self) {
        self.frames.pop();
    }

    /// Iterates the effective entries in key order.
    ///
    /// This materializes the overlay view; it is meant for record construction and tests, not
    /// hot paths.
    pub fn iter_effective(&self) -> impl Iterator<Item = (K, V)> {
        let mut view: BTreeMap<K, Option<V>> =
            self.committed.iter().map(|(k, v)| (k.clone(), Some(v.clone()))).collect();
        for frame in &self.frames {
            for (k, slot) in frame {
                view.insert(k.clone(), slot.clone());
            }
        }
        view.into_iter().filter_map(|(k, slot)| slot.map(|v| (k, v)))
    }

    /// Direct read of the committed value, bypassing any staged frames. Test and audit hook.
    pub fn committed_get(&self, key: &K) -> Option<&V> {
        self.committed.get(key)
    }

    fn top_frame(&mut self) -> &mut BTreeMap<K, Option<V>> {
        self.frames.last_mut().expect("write outside a staged call")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TransactionalLedger<u64, &'static str> {
        TransactionalLedger::from_committed([(1, "one"), (2, "two")])
    }

    #[test]
    fn reads_fall_through_to_committed() {
        let mut t = table();
        t.begin();
        assert_eq!(t.get(&1), Some(&"one"));
        t.put(1, "staged");
        assert_eq!(t.get(&1), Some(&"staged"));
        assert_eq!(t.committed_get(&1), Some(&"one"));
    }

    #[test]
    fn rollback_discards_staged_writes() {
        let mut t = table();
        t.begin();
        t.put(3, "three");
        t.remove(1);
        t.rollback();
        assert_eq!(t.get(&3), None);
        assert_eq!(t.get(&1), Some(&"one"));
    }

    #[test]
    fn commit_applies_writes_and_removals() {
        let mut t = table();
        t.begin();
        t.put(3, "three");
        t.remove(2);
        t.commit();
        assert_eq!(t.committed_get(&3), Some(&"three"));
        assert_eq!(t.committed_get(&2), None);
    }

    #[test]
    fn nested_commit_only_reaches_parent_frame() {
        let mut t = table();
        t.begin();
        t.begin();
        t.put(3, "three");
        t.commit();
        // The write is now staged in the outer frame, not committed.
        assert_eq!(t.get(&3), Some(&"three"));
        assert_eq!(t.committed_get(&3), None);
        t.rollback();
        assert_eq!(t.get(&3), None);
    }

    #[test]
    fn nested_rollback_preserves_parent_stage() {
        let mut t = table();
        t.begin();
        t.put(3, "outer");
        t.begin();
        t.put(3, "inner");
        t.put(4, "four");
        t.rollback();
        assert_eq!(t.get(&3), Some(&"outer"));
        assert_eq!(t.get(&4), None);
    }

    #[test]
    fn staged_removal_shadows_committed_value() {
        let mut t = table();
        t.begin();
        t.remove(1);
        assert_eq!(t.get(&1), None);
        assert!(!t.contains(&1));
    }

    #[test]
    fn effective_iteration_sees_overlay() {
        let mut t = table();
        t.begin();
        t.put(3, "three");
        t.remove(1);
        let entries: Vec<_> = t.iter_effective().collect();
        assert_eq!(entries, vec![(2, "two"), (3, "three")]);
    }
}
