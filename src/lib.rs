//! Generic B+ tree ordered index with a fixed fanout and a doubly linked
//! leaf chain.
//!
//! One [`OrderedIndex`] instance owns one tree. Nodes are single raw
//! allocations carved according to per-instance layouts; leaves carry
//! non-owning `next`/`prev` pointers forming a chain in ascending key
//! order, which is the sole means of ordered enumeration.
//!
//! Supported operations are insertion with split-on-overflow (duplicate
//! keys overwrite and return the previous value), exact-match lookup, and
//! lazy forward/backward traversal over the leaf chain. There is no
//! per-entry deletion; entries live until the index is cleared or dropped.
//!
//! ```rust
//! use ordered_index::OrderedIndex;
//!
//! let mut idx: OrderedIndex<&str, u32> = OrderedIndex::new(4).unwrap();
//! idx.insert("B2", 2).unwrap();
//! idx.insert("A1", 1).unwrap();
//! assert_eq!(idx.get(&"A1"), Some(&1));
//! let keys: Vec<_> = idx.items().map(|(k, _)| *k).collect();
//! assert_eq!(keys, ["A1", "B2"]);
//! ```

#![no_std]

extern crate alloc;

use core::marker::PhantomData;
use core::ptr::NonNull;

use alloc::format;
use alloc::string::String;

mod common;
mod get;
mod insert;
mod iterate;
mod layout;
mod node_alloc;
mod trace;

pub use iterate::{Items, Keys, Values};

use layout::{BranchLayout, LeafLayout, NodeHdr, NodeTag};

/// Smallest fanout for which the minimum-fill arithmetic is meaningful.
pub const MIN_FANOUT: usize = 3;

#[derive(Debug)]
pub enum IndexError {
    /// Requested fanout is below [`MIN_FANOUT`].
    InvalidFanout(String),
    /// Normal absence result for the `Result`-returning accessors.
    KeyNotFound,
    /// A node allocation returned null. Fatal: a failure during split
    /// propagation can leave the index partially split.
    AllocationFailure(String),
    /// Reported by [`OrderedIndex::check_invariants_detailed`] only.
    CorruptedTree(String),
}

impl core::fmt::Display for IndexError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IndexError::InvalidFanout(s) => write!(f, "InvalidFanout: {}", s),
            IndexError::KeyNotFound => write!(f, "KeyNotFound"),
            IndexError::AllocationFailure(s) => write!(f, "AllocationFailure: {}", s),
            IndexError::CorruptedTree(s) => write!(f, "CorruptedTree: {}", s),
        }
    }
}

impl core::error::Error for IndexError {}

impl core::cmp::PartialEq for IndexError {
    fn eq(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}
impl Eq for IndexError {}

pub type IndexResult<T> = Result<T, IndexError>;

/// Ordered map from `K` to `V` backed by a B+ tree with runtime-configured
/// fanout. All state lives in the instance; there is no global root.
pub struct OrderedIndex<K, V> {
    /// Root node (points to a node header at offset 0), or None when empty.
    root: Option<NonNull<u8>>,

    /// Fixed per-kind layouts computed from the fanout and K/V sizes.
    leaf_layout: LeafLayout,
    branch_layout: BranchLayout,

    /// Total number of key-value pairs across all leaves.
    len_count: usize,

    _marker: PhantomData<(K, V)>,
}

impl<K, V> OrderedIndex<K, V> {
    /// Create an empty index whose nodes hold up to `max_keys` keys.
    /// The first insertion allocates the initial leaf.
    pub fn new(max_keys: usize) -> IndexResult<Self> {
        if max_keys < MIN_FANOUT {
            return Err(IndexError::InvalidFanout(format!(
                "fanout {} is below the minimum of {}",
                max_keys, MIN_FANOUT
            )));
        }
        let cap = core::cmp::min(max_keys, u16::MAX as usize) as u16;
        Ok(Self {
            root: None,
            leaf_layout: LeafLayout::for_fanout::<K, V>(cap),
            branch_layout: BranchLayout::for_fanout::<K>(cap),
            len_count: 0,
            _marker: PhantomData,
        })
    }

    /// Maximum keys per node before a split is required.
    pub fn fanout(&self) -> usize {
        self.leaf_layout.cap as usize
    }

    pub fn len(&self) -> usize {
        self.len_count
    }

    pub fn is_empty(&self) -> bool {
        self.len_count == 0
    }

    /// Drop every entry and free every node, returning to the empty state.
    pub fn clear(&mut self) {
        if let Some(root) = self.root.take() {
            unsafe { self.free_subtree(root) };
        }
        self.len_count = 0;
    }

    /// True when the tree is a single leaf (or empty).
    pub fn is_leaf_root(&self) -> bool {
        match self.root {
            None => true,
            Some(p) => unsafe { (*(p.as_ptr() as *const NodeHdr)).tag == NodeTag::Leaf },
        }
    }

    /// Number of levels, counting the leaf level; 0 for the empty tree.
    pub fn height(&self) -> usize {
        let mut cur = match self.root {
            Some(p) => p,
            None => return 0,
        };
        let mut levels = 1;
        unsafe {
            loop {
                let hdr = &*(cur.as_ptr() as *const NodeHdr);
                match hdr.tag {
                    NodeTag::Leaf => return levels,
                    NodeTag::Branch => {
                        let b = layout::carve_branch::<K>(cur, &self.branch_layout);
                        let child = *(b.children_ptr as *const *mut u8);
                        match NonNull::new(child) {
                            Some(child) => {
                                levels += 1;
                                cur = child;
                            }
                            None => return levels,
                        }
                    }
                }
            }
        }
    }

    /// Number of leaves, counted by walking the chain.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0usize;
        let mut cur = match self.leftmost_leaf() {
            Some(p) => p.as_ptr(),
            None => core::ptr::null_mut(),
        };
        unsafe {
            while !cur.is_null() {
                count += 1;
                cur = *((cur.add(self.leaf_layout.next_off)) as *const *mut u8);
            }
        }
        count
    }

    /// Entry counts of each leaf, in chain order.
    pub fn leaf_sizes(&self) -> alloc::vec::Vec<usize> {
        let mut sizes = alloc::vec::Vec::new();
        let mut cur = match self.leftmost_leaf() {
            Some(p) => p.as_ptr(),
            None => core::ptr::null_mut(),
        };
        unsafe {
            while !cur.is_null() {
                sizes.push((*(cur as *const NodeHdr)).len as usize);
                cur = *((cur.add(self.leaf_layout.next_off)) as *const *mut u8);
            }
        }
        sizes
    }

    /// Fewest entries a non-root leaf may hold. A split assigns
    /// `ceil((fanout+1)/2)` entries to the left leaf and the remaining
    /// `floor((fanout+1)/2)` to the right, so this is the floor half.
    #[inline]
    pub(crate) fn min_leaf_len(&self) -> usize {
        (self.leaf_layout.cap as usize + 1) / 2
    }

    /// Entries kept in the left leaf on a split: `ceil((fanout+1)/2)`.
    #[inline]
    pub(crate) fn leaf_split_point(&self) -> usize {
        (self.leaf_layout.cap as usize + 2) / 2
    }

    /// Fewest keys a non-root branch may hold. A branch split promotes the
    /// middle of `fanout+1` keys, leaving `floor(fanout/2)` on the smaller
    /// side.
    #[inline]
    pub(crate) fn min_branch_len(&self) -> usize {
        core::cmp::max(1, self.branch_layout.cap as usize / 2)
    }
}

impl<K, V> Drop for OrderedIndex<K, V> {
    fn drop(&mut self) {
        if let Some(root) = self.root.take() {
            unsafe { self.free_subtree(root) };
        }
    }
}

// =============================
// Structural validation
// =============================

struct ValidationState<K> {
    total_items: usize,
    prev_leaf: Option<NonNull<u8>>,
    prev_key: Option<K>,
}

impl<K: Ord + Clone, V> OrderedIndex<K, V> {
    pub fn check_invariants(&self) -> bool {
        self.check_invariants_detailed().is_ok()
    }

    /// [`check_invariants_detailed`] with the failure wrapped as
    /// [`IndexError::CorruptedTree`].
    ///
    /// [`check_invariants_detailed`]: OrderedIndex::check_invariants_detailed
    pub fn validate(&self) -> IndexResult<()> {
        self.check_invariants_detailed()
            .map_err(IndexError::CorruptedTree)
    }

    /// Validate every structural invariant: per-node key ordering and fill
    /// bounds, separator/subtree range consistency, leaf-chain linkage and
    /// global ordering, reachability (via the identity-based parent
    /// search), and the recorded entry count.
    pub fn check_invariants_detailed(&self) -> Result<(), String> {
        let mut state = ValidationState {
            total_items: 0,
            prev_leaf: None,
            prev_key: None,
        };

        unsafe {
            let root = match self.root {
                None => {
                    return if self.len_count == 0 {
                        Ok(())
                    } else {
                        Err("tree has no root but a non-zero entry count".into())
                    };
                }
                Some(root) => root,
            };

            self.validate_node(root, None, None, true, &mut state)?;

            if self.len_count != state.total_items {
                return Err(format!(
                    "entry count mismatch: recorded {}, found {}",
                    self.len_count, state.total_items
                ));
            }

            if let Some(last_leaf) = state.prev_leaf {
                let next = *(last_leaf.as_ptr().add(self.leaf_layout.next_off) as *const *mut u8);
                if !next.is_null() {
                    return Err("tail leaf next pointer should be null".into());
                }
            }

            // The root is the unique parentless node; every leaf must be
            // discoverable from it by structural identity.
            if self.find_parent(root, root).is_some() {
                return Err("root node found as a child of another node".into());
            }
            if !self.is_leaf_root() {
                let mut cur = match self.leftmost_leaf() {
                    Some(p) => p.as_ptr(),
                    None => return Err("branch root with no leftmost leaf".into()),
                };
                while !cur.is_null() {
                    let leaf = NonNull::new_unchecked(cur);
                    if self.find_parent(root, leaf).is_none() {
                        return Err("chained leaf is not reachable from the root".into());
                    }
                    cur = *((cur.add(self.leaf_layout.next_off)) as *const *mut u8);
                }
            }
        }

        Ok(())
    }

    unsafe fn validate_node(
        &self,
        node: NonNull<u8>,
        lower: Option<&K>,
        upper: Option<&K>,
        is_root: bool,
        state: &mut ValidationState<K>,
    ) -> Result<(), String> {
        let hdr = &*(node.as_ptr() as *const NodeHdr);
        match hdr.tag {
            NodeTag::Leaf => self.validate_leaf(node, lower, upper, is_root, state),
            NodeTag::Branch => self.validate_branch(node, lower, upper, is_root, state),
        }
    }

    unsafe fn validate_leaf(
        &self,
        leaf: NonNull<u8>,
        lower: Option<&K>,
        upper: Option<&K>,
        is_root: bool,
        state: &mut ValidationState<K>,
    ) -> Result<(), String> {
        let parts = layout::carve_leaf::<K, V>(leaf, &self.leaf_layout);
        let len = (*parts.hdr).len as usize;
        let cap = self.leaf_layout.cap as usize;

        if len > cap {
            return Err(format!("leaf holds {} keys but the fanout is {}", len, cap));
        }
        if len == 0 {
            return if is_root {
                Ok(())
            } else {
                Err("non-root leaf is empty".into())
            };
        }
        if !is_root && len < self.min_leaf_len() {
            return Err(format!(
                "leaf underfull: {} keys, minimum is {}",
                len,
                self.min_leaf_len()
            ));
        }

        let keys = core::slice::from_raw_parts(parts.keys_ptr as *const K, len);
        for window in keys.windows(2) {
            if window[0] >= window[1] {
                return Err("leaf keys not strictly ascending".into());
            }
        }
        if let Some(low) = lower {
            if keys[0] < *low {
                return Err("leaf keys fall below the separator bound".into());
            }
        }
        if let Some(high) = upper {
            if keys[len - 1] >= *high {
                return Err("leaf keys reach the separator bound above".into());
            }
        }

        // Chain linkage: prev must point at the previously visited leaf,
        // whose next must point here.
        match state.prev_leaf {
            Some(prev) => {
                let prev_next =
                    *(prev.as_ptr().add(self.leaf_layout.next_off) as *const *mut u8);
                if prev_next != leaf.as_ptr() {
                    return Err("leaf chain next pointer mismatch".into());
                }
                if *parts.prev_ptr != prev.as_ptr() {
                    return Err("leaf chain prev pointer mismatch".into());
                }
            }
            None => {
                if !(*parts.prev_ptr).is_null() {
                    return Err("head leaf prev pointer should be null".into());
                }
            }
        }
        state.prev_leaf = Some(leaf);

        if let Some(prev_key) = &state.prev_key {
            if keys[0] <= *prev_key {
                return Err("leaf chain keys not globally ascending".into());
            }
        }
        state.prev_key = Some(keys[len - 1].clone());
        state.total_items += len;

        Ok(())
    }

    unsafe fn validate_branch(
        &self,
        branch: NonNull<u8>,
        lower: Option<&K>,
        upper: Option<&K>,
        is_root: bool,
        state: &mut ValidationState<K>,
    ) -> Result<(), String> {
        let parts = layout::carve_branch::<K>(branch, &self.branch_layout);
        let len = (*parts.hdr).len as usize;
        let cap = self.branch_layout.cap as usize;

        if len > cap {
            return Err(format!(
                "branch holds {} keys but the fanout is {}",
                len, cap
            ));
        }
        if len == 0 {
            return Err("branch with no separator keys".into());
        }
        if !is_root && len < self.min_branch_len() {
            return Err(format!(
                "branch underfull: {} keys, minimum is {}",
                len,
                self.min_branch_len()
            ));
        }

        let keys = core::slice::from_raw_parts(parts.keys_ptr as *const K, len);
        for window in keys.windows(2) {
            if window[0] >= window[1] {
                return Err("branch keys not strictly ascending".into());
            }
        }
        if let Some(low) = lower {
            if keys[0] < *low {
                return Err("branch keys fall below the separator bound".into());
            }
        }
        if let Some(high) = upper {
            if keys[len - 1] >= *high {
                return Err("branch keys reach the separator bound above".into());
            }
        }

        for i in 0..=len {
            let child = *(parts.children_ptr.add(i) as *const *mut u8);
            let child = match NonNull::new(child) {
                Some(child) => child,
                None => return Err(format!("branch child {} is null", i)),
            };
            let lower_bound = if i == 0 { lower } else { Some(&keys[i - 1]) };
            let upper_bound = if i == len { upper } else { Some(&keys[i]) };
            self.validate_node(child, lower_bound, upper_bound, false, state)?;
        }

        Ok(())
    }
}
