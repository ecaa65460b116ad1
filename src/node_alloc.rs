extern crate alloc;

use alloc::alloc::{alloc, dealloc, Layout};
use core::ptr::{self, NonNull};

use crate::layout::{carve_leaf, BranchLayout, LeafLayout, NodeHdr, NodeTag};

#[inline]
fn layout_for(bytes: usize, align: usize) -> Layout {
    // align comes from type alignments, so it is a non-zero power of two
    Layout::from_size_align(bytes, align).expect("invalid node layout")
}

#[inline]
pub(crate) unsafe fn alloc_raw(bytes: usize, align: usize) -> Option<NonNull<u8>> {
    let layout = layout_for(bytes, align);
    NonNull::new(alloc(layout))
}

#[inline]
pub(crate) unsafe fn dealloc_raw(ptr: NonNull<u8>, bytes: usize, align: usize) {
    let layout = layout_for(bytes, align);
    dealloc(ptr.as_ptr(), layout);
}

/// Allocate a leaf block and initialize its header and chain pointers.
/// Returns None when the allocator reports failure; never dereferences null.
#[inline]
pub(crate) unsafe fn alloc_leaf_block(layout: &LeafLayout) -> Option<NonNull<u8>> {
    let p = alloc_raw(layout.bytes, layout.max_align)?;
    let hdr = p.as_ptr() as *mut NodeHdr;
    ptr::write(
        hdr,
        NodeHdr {
            tag: NodeTag::Leaf,
            len: 0,
            flags: 0,
        },
    );
    // A fresh leaf starts detached from the chain.
    let parts = carve_leaf::<(), ()>(p, layout);
    ptr::write(parts.next_ptr, ptr::null_mut());
    ptr::write(parts.prev_ptr, ptr::null_mut());
    Some(p)
}

/// Allocate a branch block and initialize its header.
#[inline]
pub(crate) unsafe fn alloc_branch_block(layout: &BranchLayout) -> Option<NonNull<u8>> {
    let p = alloc_raw(layout.bytes, layout.max_align)?;
    let hdr = p.as_ptr() as *mut NodeHdr;
    ptr::write(
        hdr,
        NodeHdr {
            tag: NodeTag::Branch,
            len: 0,
            flags: 0,
        },
    );
    Some(p)
}
