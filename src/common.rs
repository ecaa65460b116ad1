use core::ptr::NonNull;

use crate::layout::{carve_branch, carve_leaf, NodeHdr, NodeTag};
use crate::node_alloc::dealloc_raw;
use crate::OrderedIndex;

impl<K, V> OrderedIndex<K, V> {
    #[inline(always)]
    pub(crate) unsafe fn shift_right(&self, keys_ptr: *mut K, vals_ptr: *mut V, idx: usize, len: usize) {
        if idx < len {
            core::ptr::copy(keys_ptr.add(idx), keys_ptr.add(idx + 1), len - idx);
            core::ptr::copy(vals_ptr.add(idx), vals_ptr.add(idx + 1), len - idx);
        }
    }

    #[inline(always)]
    pub(crate) unsafe fn write_kv_at(&self, keys_ptr: *mut K, vals_ptr: *mut V, idx: usize, key: K, val: V) {
        core::ptr::write(keys_ptr.add(idx), key);
        core::ptr::write(vals_ptr.add(idx), val);
    }

    #[inline(always)]
    pub(crate) unsafe fn write_key_at(&self, keys_ptr: *mut K, idx: usize, key: K) {
        core::ptr::write(keys_ptr.add(idx), key);
    }

    #[inline(always)]
    pub(crate) unsafe fn read_kv_at(&self, keys_ptr: *const K, vals_ptr: *const V, idx: usize) -> (K, V) {
        let k = core::ptr::read(keys_ptr.add(idx));
        let v = core::ptr::read(vals_ptr.add(idx));
        (k, v)
    }

    #[inline]
    pub(crate) unsafe fn key_clone_at(&self, keys_ptr: *const K, idx: usize) -> K
    where
        K: Clone,
    {
        (*keys_ptr.add(idx)).clone()
    }

    /// First leaf of the chain, found by following `children[0]` from the root.
    #[inline]
    pub(crate) fn leftmost_leaf(&self) -> Option<NonNull<u8>> {
        let mut cur = self.root?;
        unsafe {
            loop {
                let hdr = &*(cur.as_ptr() as *const NodeHdr);
                match hdr.tag {
                    NodeTag::Leaf => return Some(cur),
                    NodeTag::Branch => {
                        let b = carve_branch::<K>(cur, &self.branch_layout);
                        let child = *(b.children_ptr as *const *mut u8);
                        cur = NonNull::new(child)?;
                    }
                }
            }
        }
    }

    /// Last leaf of the chain, found by following `children[len]` from the root.
    #[inline]
    pub(crate) fn rightmost_leaf(&self) -> Option<NonNull<u8>> {
        let mut cur = self.root?;
        unsafe {
            loop {
                let hdr = &*(cur.as_ptr() as *const NodeHdr);
                match hdr.tag {
                    NodeTag::Leaf => return Some(cur),
                    NodeTag::Branch => {
                        let b = carve_branch::<K>(cur, &self.branch_layout);
                        let len = (*b.hdr).len as usize;
                        let child = *(b.children_ptr.add(len) as *const *mut u8);
                        cur = NonNull::new(child)?;
                    }
                }
            }
        }
    }

    /// Parent of `target`, discovered by a top-down depth-first search that
    /// compares child identity, never key equality. First structural match
    /// wins. O(tree size) worst case; insertion carries split results back
    /// up its own descent instead of calling this.
    pub(crate) unsafe fn find_parent(
        &self,
        node: NonNull<u8>,
        target: NonNull<u8>,
    ) -> Option<NonNull<u8>> {
        let hdr = &*(node.as_ptr() as *const NodeHdr);
        if hdr.tag != NodeTag::Branch {
            return None;
        }
        let parts = carve_branch::<K>(node, &self.branch_layout);
        let len = (*parts.hdr).len as usize;
        for i in 0..=len {
            let child = *(parts.children_ptr.add(i) as *const *mut u8);
            if child == target.as_ptr() {
                return Some(node);
            }
        }
        for i in 0..=len {
            let child = *(parts.children_ptr.add(i) as *const *mut u8);
            if let Some(child) = NonNull::new(child) {
                if let Some(found) = self.find_parent(child, target) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Recursively release a subtree: drop every initialized key and value,
    /// then free the node blocks. Callers must detach the subtree from the
    /// root and the leaf chain first (or be tearing down the whole index).
    pub(crate) unsafe fn free_subtree(&mut self, node: NonNull<u8>) {
        let hdr = *(node.as_ptr() as *const NodeHdr);
        match hdr.tag {
            NodeTag::Leaf => {
                let parts = carve_leaf::<K, V>(node, &self.leaf_layout);
                for i in 0..hdr.len as usize {
                    core::ptr::drop_in_place(parts.keys_ptr.add(i) as *mut K);
                    core::ptr::drop_in_place(parts.vals_ptr.add(i) as *mut V);
                }
                dealloc_raw(node, self.leaf_layout.bytes, self.leaf_layout.max_align);
            }
            NodeTag::Branch => {
                let parts = carve_branch::<K>(node, &self.branch_layout);
                let len = hdr.len as usize;
                for i in 0..=len {
                    let child = *(parts.children_ptr.add(i) as *const *mut u8);
                    if let Some(child) = NonNull::new(child) {
                        self.free_subtree(child);
                    }
                }
                for i in 0..len {
                    core::ptr::drop_in_place(parts.keys_ptr.add(i) as *mut K);
                }
                dealloc_raw(node, self.branch_layout.bytes, self.branch_layout.max_align);
            }
        }
    }
}

impl<K: Ord, V> OrderedIndex<K, V> {
    /// Route `key` to a child of `branch`: the child below the first
    /// separator strictly greater than the key. An equal separator routes
    /// right, so a leaf's first key may equal its separator in the parent.
    #[inline]
    pub(crate) unsafe fn child_for_key(
        &self,
        branch: NonNull<u8>,
        key: &K,
    ) -> Option<(NonNull<u8>, usize)> {
        let parts = carve_branch::<K>(branch, &self.branch_layout);
        let len = (*parts.hdr).len as usize;
        let keys = core::slice::from_raw_parts(parts.keys_ptr as *const K, len);
        let child_idx = match keys.binary_search(key) {
            Ok(i) => i + 1,
            Err(i) => i,
        };
        let child = *(parts.children_ptr.add(child_idx) as *const *mut u8);
        NonNull::new(child).map(|child| (child, child_idx))
    }

    /// Descend from the root to the leaf whose range covers `key`.
    #[inline]
    pub(crate) fn leaf_for_key(&self, key: &K) -> Option<NonNull<u8>> {
        let mut cur = self.root?;
        unsafe {
            loop {
                let hdr = &*(cur.as_ptr() as *const NodeHdr);
                match hdr.tag {
                    NodeTag::Leaf => return Some(cur),
                    NodeTag::Branch => {
                        let (child, _) = self.child_for_key(cur, key)?;
                        cur = child;
                    }
                }
            }
        }
    }
}
