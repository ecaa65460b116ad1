use alloc::vec::Vec;
use core::ptr::NonNull;

use crate::layout::{self, NodeHdr, NodeTag};
use crate::node_alloc::{alloc_branch_block, alloc_leaf_block};
use crate::trace::debug_log;
use crate::{IndexError, IndexResult, OrderedIndex};

/// Outcome of a recursive insertion step, bubbled back up the descent so
/// split propagation never has to re-discover parents from the root.
pub(crate) enum InsertOutcome<K, V> {
    Done(Option<V>),
    Split {
        sep: K,
        right: NonNull<u8>,
        old: Option<V>,
    },
}

impl<K: Ord + Clone, V> OrderedIndex<K, V> {
    /// Insert `key`/`value`, splitting overflowing nodes on the way back up.
    /// An existing key is overwritten and its previous value returned.
    ///
    /// The only error is [`IndexError::AllocationFailure`]; it is fatal and
    /// the index should not be used afterwards.
    pub fn insert(&mut self, key: K, value: V) -> IndexResult<Option<V>> {
        let root = match self.root {
            Some(p) => p,
            None => {
                let leaf = unsafe { alloc_leaf_block(&self.leaf_layout) }
                    .ok_or_else(|| IndexError::AllocationFailure("initial leaf".into()))?;
                self.root = Some(leaf);
                leaf
            }
        };
        match unsafe { self.insert_rec(root, key, value) }? {
            InsertOutcome::Done(old) => Ok(old),
            InsertOutcome::Split { sep, right, old } => {
                // The old root split: promote a new root holding the single
                // separator and the two halves.
                let branch = unsafe { alloc_branch_block(&self.branch_layout) }
                    .ok_or_else(|| IndexError::AllocationFailure("new root branch".into()))?;
                unsafe {
                    let b = layout::carve_branch::<K>(branch, &self.branch_layout);
                    (*b.hdr).len = 1;
                    self.write_key_at(b.keys_ptr as *mut K, 0, sep);
                    let cbase = b.children_ptr as *mut *mut u8;
                    *cbase = root.as_ptr();
                    *cbase.add(1) = right.as_ptr();
                }
                self.root = Some(branch);
                debug_log!("root split: height is now {}", self.height());
                Ok(old)
            }
        }
    }

    unsafe fn insert_rec(
        &mut self,
        node: NonNull<u8>,
        key: K,
        value: V,
    ) -> IndexResult<InsertOutcome<K, V>> {
        let hdr = &*(node.as_ptr() as *const NodeHdr);
        match hdr.tag {
            NodeTag::Leaf => self.leaf_insert_or_split(node, key, value),
            NodeTag::Branch => {
                let (child, child_idx) =
                    self.child_for_key(node, &key).expect("branch child must exist");
                match self.insert_rec(child, key, value)? {
                    InsertOutcome::Done(old) => Ok(InsertOutcome::Done(old)),
                    InsertOutcome::Split { sep, right, old } => {
                        let b = layout::carve_branch::<K>(node, &self.branch_layout);
                        let cur_len = (*b.hdr).len as usize;
                        let cap = self.branch_layout.cap as usize;
                        if cur_len < cap {
                            // Room here: shift separators and children right
                            // of the split child, then slot in the new pair.
                            core::ptr::copy(
                                b.keys_ptr.add(child_idx) as *mut K,
                                b.keys_ptr.add(child_idx + 1) as *mut K,
                                cur_len - child_idx,
                            );
                            self.write_key_at(b.keys_ptr as *mut K, child_idx, sep);
                            let cbase = b.children_ptr as *mut *mut u8;
                            core::ptr::copy(
                                cbase.add(child_idx + 1),
                                cbase.add(child_idx + 2),
                                cur_len - child_idx,
                            );
                            *cbase.add(child_idx + 1) = right.as_ptr();
                            (*b.hdr).len = (cur_len + 1) as u16;
                            Ok(InsertOutcome::Done(old))
                        } else {
                            self.branch_insert_and_split(node, child_idx, sep, right, old)
                        }
                    }
                }
            }
        }
    }

    /// Split a full branch while inserting one more separator/child pair.
    /// The `fanout + 1` buffered keys redistribute as: left keeps the keys
    /// below the middle one, the middle is promoted, the rest go right.
    unsafe fn branch_insert_and_split(
        &mut self,
        node: NonNull<u8>,
        insert_idx: usize,
        ins_key: K,
        ins_right: NonNull<u8>,
        old: Option<V>,
    ) -> IndexResult<InsertOutcome<K, V>> {
        // Allocate before moving anything out of the node so an allocator
        // failure leaves this branch untouched.
        let right_node = alloc_branch_block(&self.branch_layout)
            .ok_or_else(|| IndexError::AllocationFailure("right branch".into()))?;

        let b = layout::carve_branch::<K>(node, &self.branch_layout);
        let len = (*b.hdr).len as usize;
        debug_assert_eq!(len, self.branch_layout.cap as usize);
        let total_keys = len + 1;

        let mut keys_buf: Vec<K> = Vec::with_capacity(total_keys);
        for i in 0..len {
            keys_buf.push(core::ptr::read((b.keys_ptr as *const K).add(i)));
        }
        keys_buf.insert(insert_idx, ins_key);

        let mut children: Vec<*mut u8> = Vec::with_capacity(total_keys + 1);
        let cbase = b.children_ptr as *const *mut u8;
        for i in 0..=len {
            children.push(*cbase.add(i));
        }
        children.insert(insert_idx + 1, ins_right.as_ptr());

        let mid = total_keys / 2;
        debug_log!("branch split: {} keys left, {} right", mid, total_keys - mid - 1);

        // Drain the key buffer in order: left half, promoted key, right half.
        let mut keys = keys_buf.into_iter();
        for i in 0..mid {
            let k = keys.next().expect("split buffer underrun");
            self.write_key_at(b.keys_ptr as *mut K, i, k);
        }
        (*b.hdr).len = mid as u16;
        let promote = keys.next().expect("split buffer underrun");

        let cbase_mut = b.children_ptr as *mut *mut u8;
        for i in 0..=mid {
            *cbase_mut.add(i) = children[i];
        }

        let rb = layout::carve_branch::<K>(right_node, &self.branch_layout);
        let right_keys_len = total_keys - (mid + 1);
        for (i, k) in keys.enumerate() {
            self.write_key_at(rb.keys_ptr as *mut K, i, k);
        }
        (*rb.hdr).len = right_keys_len as u16;
        let rcbase = rb.children_ptr as *mut *mut u8;
        for i in 0..=right_keys_len {
            *rcbase.add(i) = children[mid + 1 + i];
        }

        Ok(InsertOutcome::Split {
            sep: promote,
            right: right_node,
            old,
        })
    }

    /// Insert into a leaf, splitting when it is already at the fanout.
    /// The split buffers `fanout + 1` ordered entries, keeps
    /// `ceil((fanout+1)/2)` in the original leaf, moves the rest to a new
    /// right leaf spliced into the chain, and promotes the right leaf's
    /// first key.
    unsafe fn leaf_insert_or_split(
        &mut self,
        leaf: NonNull<u8>,
        key: K,
        value: V,
    ) -> IndexResult<InsertOutcome<K, V>> {
        let parts = layout::carve_leaf::<K, V>(leaf, &self.leaf_layout);
        let hdr = &mut *parts.hdr;
        let len = hdr.len as usize;
        let keys = core::slice::from_raw_parts(parts.keys_ptr as *const K, len);
        let idx = match keys.binary_search(&key) {
            Ok(idx) => {
                // Duplicate key: overwrite in place, report the old value.
                let vptr = parts.vals_ptr.add(idx) as *mut V;
                let old = core::ptr::read(vptr);
                core::ptr::write(vptr, value);
                return Ok(InsertOutcome::Done(Some(old)));
            }
            Err(idx) => idx,
        };

        if len < self.leaf_layout.cap as usize {
            self.shift_right(parts.keys_ptr as *mut K, parts.vals_ptr as *mut V, idx, len);
            self.write_kv_at(
                parts.keys_ptr as *mut K,
                parts.vals_ptr as *mut V,
                idx,
                key,
                value,
            );
            hdr.len = (len + 1) as u16;
            self.len_count += 1;
            return Ok(InsertOutcome::Done(None));
        }

        debug_assert_eq!(len, self.leaf_layout.cap as usize);
        let right = alloc_leaf_block(&self.leaf_layout)
            .ok_or_else(|| IndexError::AllocationFailure("right leaf".into()))?;

        // Ordered buffer of the existing entries with the new one slotted in.
        let mut buf: Vec<(K, V)> = Vec::with_capacity(len + 1);
        for i in 0..idx {
            buf.push(self.read_kv_at(parts.keys_ptr as *const K, parts.vals_ptr as *const V, i));
        }
        buf.push((key, value));
        for i in idx..len {
            buf.push(self.read_kv_at(parts.keys_ptr as *const K, parts.vals_ptr as *const V, i));
        }

        let total = buf.len();
        let left_count = self.leaf_split_point();
        let right_count = total - left_count;
        debug_log!("leaf split: {} entries left, {} right", left_count, right_count);

        let mut entries = buf.into_iter();
        for i in 0..left_count {
            let (k, v) = entries.next().expect("split buffer underrun");
            self.write_kv_at(parts.keys_ptr as *mut K, parts.vals_ptr as *mut V, i, k, v);
        }
        hdr.len = left_count as u16;

        let r = layout::carve_leaf::<K, V>(right, &self.leaf_layout);
        for (i, (k, v)) in entries.enumerate() {
            self.write_kv_at(r.keys_ptr as *mut K, r.vals_ptr as *mut V, i, k, v);
        }
        (*r.hdr).len = right_count as u16;

        // Splice the new leaf into the chain immediately after the original.
        let old_next = *parts.next_ptr;
        *parts.next_ptr = right.as_ptr();
        *r.prev_ptr = leaf.as_ptr();
        *r.next_ptr = old_next;
        if !old_next.is_null() {
            *(old_next.add(self.leaf_layout.prev_off) as *mut *mut u8) = right.as_ptr();
        }

        self.len_count += 1;
        let sep = self.key_clone_at(r.keys_ptr as *const K, 0);
        Ok(InsertOutcome::Split {
            sep,
            right,
            old: None,
        })
    }
}
