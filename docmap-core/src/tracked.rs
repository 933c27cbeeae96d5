//! Containers that remember whether they have been structurally mutated.
//!
//! [`Tracked`] wraps a sequence or a mapping and intercepts every mutating
//! operation to raise its dirty flag before delegating to the wrapped value.
//! Reads pass straight through via [`Deref`]; there is deliberately no
//! `DerefMut`, so every write goes through a tracked method.
//!
//! # Example
//!
//! ```ignore
//! use docmap::tracked::TrackedList;
//! use bson::Bson;
//!
//! let mut tags = TrackedList::clean(vec![Bson::from("a")]);
//! assert!(!tags.is_dirty());
//!
//! tags.push(Bson::from("b"));
//! assert!(tags.is_dirty());
//! assert_eq!(tags.len(), 2);
//! ```

use bson::{Bson, Document};
use std::ops::Deref;

/// A sequence or mapping that carries a dirty flag.
///
/// Values built from data freshly loaded from the store start clean; values
/// built from something a caller assigned start dirty.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<C> {
    inner: C,
    dirty: bool,
}

/// A tracked ordered sequence.
pub type TrackedList<T = Bson> = Tracked<Vec<T>>;

/// A tracked key-unique mapping.
pub type TrackedMap = Tracked<Document>;

impl<C> Tracked<C> {
    /// Wraps a caller-supplied value. The container starts dirty.
    pub fn new(inner: C) -> Self {
        Self::with_changed(inner, true)
    }

    /// Wraps a value as loaded from the store. The container starts clean.
    pub fn clean(inner: C) -> Self {
        Self::with_changed(inner, false)
    }

    /// Wraps a value with an explicit initial dirty flag.
    pub fn with_changed(inner: C, changed: bool) -> Self {
        Self { inner, dirty: changed }
    }

    /// Returns `true` if the container was mutated since it was last marked clean.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the dirty flag.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Raises the dirty flag without touching the contents.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns a reference to the wrapped value.
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    /// Unwraps the container, discarding the dirty flag.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Runs an arbitrary edit against the wrapped value.
    ///
    /// The container is marked dirty whether or not the closure actually
    /// changes anything. This is the way to edit nested values in place.
    pub fn modify<R>(&mut self, edit: impl FnOnce(&mut C) -> R) -> R {
        edit(self.touch())
    }

    fn touch(&mut self) -> &mut C {
        self.dirty = true;
        &mut self.inner
    }
}

impl<C> Deref for Tracked<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner
    }
}

impl<C> From<C> for Tracked<C> {
    fn from(inner: C) -> Self {
        Self::new(inner)
    }
}

impl<C: Default> Default for Tracked<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<T> Tracked<Vec<T>> {
    /// Appends an element to the back of the sequence.
    pub fn push(&mut self, value: T) {
        self.touch().push(value);
    }

    /// Inserts an element at `index`, shifting later elements right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`, exactly like [`Vec::insert`].
    pub fn insert(&mut self, index: usize, value: T) {
        self.touch().insert(index, value);
    }

    /// Removes and returns the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds, exactly like [`Vec::remove`].
    pub fn remove(&mut self, index: usize) -> T {
        self.touch().remove(index)
    }

    /// Removes the last element and returns it, or `None` if the sequence is empty.
    pub fn pop(&mut self) -> Option<T> {
        self.touch().pop()
    }

    /// Replaces the element at `index`, returning the previous one.
    ///
    /// Returns `None` and leaves the sequence unchanged when `index` is out of bounds.
    pub fn set(&mut self, index: usize, value: T) -> Option<T> {
        self.touch()
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, value))
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.touch().clear();
    }

    /// Keeps only the elements for which `keep` returns `true`.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.touch().retain(keep);
    }

    /// Shortens the sequence to `len` elements.
    pub fn truncate(&mut self, len: usize) {
        self.touch().truncate(len);
    }
}

impl<T> Extend<T> for Tracked<Vec<T>> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.touch().extend(iter);
    }
}

impl<'a, T> IntoIterator for &'a Tracked<Vec<T>> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl Tracked<Document> {
    /// Inserts a key, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Bson>) -> Option<Bson> {
        self.touch().insert(key.into(), value.into())
    }

    /// Removes a key, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Bson> {
        self.touch().remove(key)
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.touch().clear();
    }
}

impl<K: Into<String>> Extend<(K, Bson)> for Tracked<Document> {
    fn extend<I: IntoIterator<Item = (K, Bson)>>(&mut self, iter: I) {
        let inner = self.touch();
        for (key, value) in iter {
            inner.insert(key.into(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn caller_values_start_dirty_and_loaded_values_start_clean() {
        assert!(TrackedList::new(vec![Bson::from(1)]).is_dirty());
        assert!(Tracked::from(doc! { "a": 1 }).is_dirty());
        assert!(!TrackedList::<Bson>::clean(vec![]).is_dirty());
        assert!(!TrackedMap::with_changed(doc! {}, false).is_dirty());
    }

    #[test]
    fn reads_do_not_mark_dirty() {
        let list = TrackedList::clean(vec![Bson::from("a"), Bson::from("b")]);

        assert_eq!(list.len(), 2);
        assert_eq!(list.first(), Some(&Bson::from("a")));
        assert_eq!(list.iter().count(), 2);
        assert_eq!((&list).into_iter().count(), 2);
        assert!(!list.is_dirty());

        let map = TrackedMap::clean(doc! { "k": "v" });
        assert_eq!(map.get_str("k").ok(), Some("v"));
        assert!(map.contains_key("k"));
        assert!(!map.is_dirty());
    }

    #[test]
    fn every_sequence_mutation_marks_dirty() {
        let mutations: Vec<fn(&mut TrackedList<i32>)> = vec![
            |l| l.push(4),
            |l| l.insert(0, 0),
            |l| {
                l.remove(1);
            },
            |l| {
                l.pop();
            },
            |l| {
                l.set(0, 9);
            },
            |l| l.clear(),
            |l| l.retain(|v| *v > 1),
            |l| l.truncate(1),
            |l| l.extend([5, 6]),
            |l| l.modify(|v| v.reverse()),
        ];

        for mutate in mutations {
            let mut list = TrackedList::clean(vec![1, 2, 3]);
            mutate(&mut list);
            assert!(list.is_dirty());
        }
    }

    #[test]
    fn every_mapping_mutation_marks_dirty() {
        let mutations: Vec<fn(&mut TrackedMap)> = vec![
            |m| {
                m.insert("b", 2);
            },
            |m| {
                m.remove("a");
            },
            |m| m.clear(),
            |m| m.extend([("c", Bson::from(3))]),
            |m| {
                m.modify(|d| d.insert("nested", doc! { "x": 1 }));
            },
        ];

        for mutate in mutations {
            let mut map = TrackedMap::clean(doc! { "a": 1 });
            mutate(&mut map);
            assert!(map.is_dirty());
        }
    }

    #[test]
    fn mutations_delegate_to_the_wrapped_value() {
        let mut list = TrackedList::clean(vec![1, 2, 3]);
        assert_eq!(list.set(1, 20), Some(2));
        assert_eq!(list.set(10, 0), None);
        assert_eq!(list.pop(), Some(3));
        list.push(4);
        assert_eq!(list.get_ref(), &vec![1, 20, 4]);

        let mut map = TrackedMap::clean(doc! { "a": 1 });
        assert_eq!(map.insert("a", 2), Some(Bson::Int32(1)));
        assert_eq!(map.remove("missing"), None);
        assert_eq!(map.into_inner(), doc! { "a": 2 });
    }

    #[test]
    fn failed_pop_still_marks_dirty() {
        let mut list = TrackedList::<i32>::clean(vec![]);
        assert_eq!(list.pop(), None);
        assert!(list.is_dirty());
    }

    #[test]
    #[should_panic]
    fn out_of_range_remove_panics_like_vec() {
        let mut list = TrackedList::clean(vec![1]);
        list.remove(5);
    }

    #[test]
    fn mark_clean_resets_the_flag() {
        let mut list = TrackedList::new(vec![1]);
        list.mark_clean();
        assert!(!list.is_dirty());
        list.mark_dirty();
        assert!(list.is_dirty());
    }
}
