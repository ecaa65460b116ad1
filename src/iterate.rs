//! Lazy ordered traversal over the leaf chain.
//!
//! [`Items`] holds two cursors into the chain: a front cursor advanced by
//! `next` pointers and a back cursor retreated by `prev` pointers. The
//! shared borrow of the index keeps the chain immutable for the iterator's
//! lifetime, and the remaining-entry counter stops the cursors from
//! crossing, so yielding references straight out of the leaves is sound.

use core::iter::Rev;
use core::ptr::NonNull;

use crate::layout::carve_leaf;
use crate::OrderedIndex;

pub struct Items<'a, K, V> {
    tree: &'a OrderedIndex<K, V>,
    /// Leaf and entry index the next forward step reads from.
    front: *const u8,
    front_idx: usize,
    /// Leaf and entry index the next backward step reads from.
    back: *const u8,
    back_idx: usize,
    /// Entries not yet yielded from either end.
    remaining: usize,
}

impl<'a, K, V> Iterator for Items<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        unsafe {
            let leaf = NonNull::new_unchecked(self.front as *mut u8);
            let parts = carve_leaf::<K, V>(leaf, &self.tree.leaf_layout);
            let k = &*(parts.keys_ptr.add(self.front_idx) as *const K);
            let v = &*(parts.vals_ptr.add(self.front_idx) as *const V);
            self.remaining -= 1;
            if self.remaining > 0 {
                self.front_idx += 1;
                if self.front_idx == (*parts.hdr).len as usize {
                    self.front = *parts.next_ptr;
                    self.front_idx = 0;
                }
            }
            Some((k, v))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for Items<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        unsafe {
            let leaf = NonNull::new_unchecked(self.back as *mut u8);
            let parts = carve_leaf::<K, V>(leaf, &self.tree.leaf_layout);
            let k = &*(parts.keys_ptr.add(self.back_idx) as *const K);
            let v = &*(parts.vals_ptr.add(self.back_idx) as *const V);
            self.remaining -= 1;
            if self.remaining > 0 {
                if self.back_idx == 0 {
                    let prev = *parts.prev_ptr;
                    let prev_parts =
                        carve_leaf::<K, V>(NonNull::new_unchecked(prev), &self.tree.leaf_layout);
                    self.back = prev;
                    self.back_idx = (*prev_parts.hdr).len as usize - 1;
                } else {
                    self.back_idx -= 1;
                }
            }
            Some((k, v))
        }
    }
}

impl<'a, K, V> ExactSizeIterator for Items<'a, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

pub struct Keys<'a, K, V> {
    inner: Items<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Keys<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<'a, K, V> ExactSizeIterator for Keys<'a, K, V> {}

pub struct Values<'a, K, V> {
    inner: Items<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Values<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<'a, K, V> ExactSizeIterator for Values<'a, K, V> {}

impl<K, V> OrderedIndex<K, V> {
    /// Forward traversal: every entry in ascending key order, walking the
    /// leaf chain from the leftmost leaf. Lazy and restartable; call again
    /// for a fresh pass.
    pub fn items(&self) -> Items<'_, K, V> {
        let remaining = self.len();
        if remaining == 0 {
            return Items {
                tree: self,
                front: core::ptr::null(),
                front_idx: 0,
                back: core::ptr::null(),
                back_idx: 0,
                remaining: 0,
            };
        }
        // len > 0 guarantees both chain ends exist and are non-empty.
        let front = self.leftmost_leaf().map_or(core::ptr::null(), |p| p.as_ptr() as *const u8);
        let back = self.rightmost_leaf().map_or(core::ptr::null(), |p| p.as_ptr() as *const u8);
        let back_idx = unsafe {
            let parts = carve_leaf::<K, V>(NonNull::new_unchecked(back as *mut u8), &self.leaf_layout);
            (*parts.hdr).len as usize - 1
        };
        Items {
            tree: self,
            front,
            front_idx: 0,
            back,
            back_idx,
            remaining,
        }
    }

    /// Backward traversal: every entry in descending key order, walking the
    /// leaf chain from the rightmost leaf by `prev` pointers.
    pub fn items_rev(&self) -> Rev<Items<'_, K, V>> {
        self.items().rev()
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.items() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.items() }
    }

    /// Entry with the smallest key.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.items().next()
    }

    /// Entry with the largest key.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.items().next_back()
    }
}
