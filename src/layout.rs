use core::mem::MaybeUninit;
use core::mem::{align_of, size_of};
use core::ptr::NonNull;

#[inline]
pub(crate) const fn align_up(x: usize, a: usize) -> usize {
    debug_assert!(a.is_power_of_two());
    (x + (a - 1)) & !(a - 1)
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum NodeTag {
    Branch = 0,
    Leaf = 1,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub(crate) struct NodeHdr {
    pub tag: NodeTag, // 1 byte
    pub len: u16,     // number of initialized keys in this node
    pub flags: u8,    // reserved
}

/// Byte layout of a leaf block for a given fanout and K/V types.
///
/// A leaf is one raw allocation: header, then the two sibling pointers of
/// the doubly linked leaf chain, then the key and value arrays. Offsets are
/// fixed per index instance, so carving a block is pure pointer arithmetic.
#[derive(Copy, Clone, Debug)]
pub(crate) struct LeafLayout {
    pub bytes: usize,
    pub cap: u16,
    pub max_align: usize,
    pub next_off: usize,
    pub prev_off: usize,
    pub keys_off: usize,
    pub vals_off: usize,
}

/// Byte layout of a branch block: header, `cap + 1` child pointers, `cap` keys.
#[derive(Copy, Clone, Debug)]
pub(crate) struct BranchLayout {
    pub bytes: usize,
    pub cap: u16,
    pub max_align: usize,
    pub children_off: usize,
    pub keys_off: usize,
}

impl LeafLayout {
    /// Compute the leaf layout holding exactly `cap` key/value pairs.
    pub fn for_fanout<K, V>(cap: u16) -> Self {
        let a_ptr = align_of::<*const ()>();
        let a_k = align_of::<K>();
        let a_v = align_of::<V>();
        let s_ptr = size_of::<*const ()>();
        let s_k = size_of::<K>();
        let s_v = size_of::<V>();

        let max_align = a_ptr.max(a_k).max(a_v).max(align_of::<NodeHdr>());
        let hdr_size = align_up(size_of::<NodeHdr>(), max_align);

        // next and prev sit together right after the header
        let next_off = align_up(hdr_size, a_ptr);
        let prev_off = next_off + s_ptr;
        let after_sib = prev_off + s_ptr;

        let cap_usize = cap as usize;
        // Place the higher-aligned array first to avoid padding between them.
        let first_is_keys = a_k >= a_v;
        let (a1, s1, a2, s2) = if first_is_keys {
            (a_k, s_k, a_v, s_v)
        } else {
            (a_v, s_v, a_k, s_k)
        };

        let first_off = align_up(after_sib, a1);
        let second_off = align_up(first_off + cap_usize * s1, a2);
        let end = align_up(second_off + cap_usize * s2, max_align);

        let (keys_off, vals_off) = if first_is_keys {
            (first_off, second_off)
        } else {
            (second_off, first_off)
        };

        Self {
            bytes: end,
            cap,
            max_align,
            next_off,
            prev_off,
            keys_off,
            vals_off,
        }
    }
}

impl BranchLayout {
    /// Compute the branch layout holding exactly `cap` keys and `cap + 1` children.
    pub fn for_fanout<K>(cap: u16) -> Self {
        let a_ptr = align_of::<*const ()>();
        let a_k = align_of::<K>();
        let s_ptr = size_of::<*const ()>();
        let s_k = size_of::<K>();

        let max_align = a_ptr.max(a_k).max(align_of::<NodeHdr>());
        let hdr_size = align_up(size_of::<NodeHdr>(), max_align);

        let cap_usize = cap as usize;
        let children_first = a_ptr >= a_k;

        let first_a = if children_first { a_ptr } else { a_k };
        let first_s = if children_first { s_ptr } else { s_k };
        let first_len = if children_first {
            cap_usize + 1
        } else {
            cap_usize
        };

        let second_a = if children_first { a_k } else { a_ptr };
        let second_s = if children_first { s_k } else { s_ptr };
        let second_len = if children_first {
            cap_usize
        } else {
            cap_usize + 1
        };

        let first_off = align_up(hdr_size, first_a);
        let second_off = align_up(first_off + first_len * first_s, second_a);
        let end = align_up(second_off + second_len * second_s, max_align);

        let (children_off, keys_off) = if children_first {
            (first_off, second_off)
        } else {
            (second_off, first_off)
        };

        Self {
            bytes: end,
            cap,
            max_align,
            children_off,
            keys_off,
        }
    }
}

// ============================
// Raw carving helpers
// ============================

#[derive(Copy, Clone)]
pub(crate) struct LeafParts<K, V> {
    pub hdr: *mut NodeHdr,
    pub next_ptr: *mut *mut u8,
    pub prev_ptr: *mut *mut u8,
    pub keys_ptr: *mut MaybeUninit<K>,
    pub vals_ptr: *mut MaybeUninit<V>,
}

#[derive(Copy, Clone)]
pub(crate) struct BranchParts<K> {
    pub hdr: *mut NodeHdr,
    pub children_ptr: *mut MaybeUninit<*mut u8>,
    pub keys_ptr: *mut MaybeUninit<K>,
}

/// Carve a leaf node's header, chain pointers, and arrays from a raw base pointer.
///
/// # Safety
/// `base` must point to a live allocation of `layout.bytes` bytes that was
/// initialized as a leaf block under the same layout.
#[inline(always)]
pub(crate) unsafe fn carve_leaf<K, V>(base: NonNull<u8>, layout: &LeafLayout) -> LeafParts<K, V> {
    let p = base.as_ptr();
    LeafParts {
        hdr: p as *mut NodeHdr,
        next_ptr: p.add(layout.next_off) as *mut *mut u8,
        prev_ptr: p.add(layout.prev_off) as *mut *mut u8,
        keys_ptr: p.add(layout.keys_off) as *mut MaybeUninit<K>,
        vals_ptr: p.add(layout.vals_off) as *mut MaybeUninit<V>,
    }
}

/// Carve a branch node's header, children, and keys from a raw base pointer.
///
/// # Safety
/// `base` must point to a live allocation of `layout.bytes` bytes that was
/// initialized as a branch block under the same layout.
#[inline(always)]
pub(crate) unsafe fn carve_branch<K>(base: NonNull<u8>, layout: &BranchLayout) -> BranchParts<K> {
    let p = base.as_ptr();
    BranchParts {
        hdr: p as *mut NodeHdr,
        children_ptr: p.add(layout.children_off) as *mut MaybeUninit<*mut u8>,
        keys_ptr: p.add(layout.keys_off) as *mut MaybeUninit<K>,
    }
}
