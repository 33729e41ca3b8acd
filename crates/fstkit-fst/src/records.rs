// Fixed-size records of the binary format, read and written with bytemuck.

use bytemuck::{Pod, Zeroable};
use fstkit_core::FstError;

/// Start-state value of an empty automaton.
pub const NO_START: u32 = u32::MAX;

/// Sizes of the record block that follows the header (16 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct CountsRecord {
    pub num_states: u32,
    pub num_arcs: u32,
    /// Start state, or `NO_START`.
    pub start: u32,
    pub _reserved: u32,
}

/// One state (8 bytes). Arcs of state `s` follow those of states `0..s`
/// in the arc table.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct StateRecord {
    pub final_weight: f32,
    pub num_arcs: u32,
}

/// One arc (16 bytes). The arc table starts on a 16-byte boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ArcRecord {
    pub ilabel: u32,
    pub olabel: u32,
    pub weight: f32,
    pub nextstate: u32,
}

const _: () = assert!(size_of::<CountsRecord>() == 16);
const _: () = assert!(size_of::<StateRecord>() == 8);
const _: () = assert!(size_of::<ArcRecord>() == 16);

/// Round `offset` up to a multiple of `align`.
pub(crate) fn align_to(offset: usize, align: usize) -> usize {
    let partial = offset % align;
    if partial > 0 {
        offset + (align - partial)
    } else {
        offset
    }
}

/// Copy `count` records starting at `offset` into an aligned Vec. The
/// source slice may not be aligned for a zero-copy cast.
pub(crate) fn read_records<T: Pod>(
    data: &[u8],
    offset: usize,
    count: usize,
) -> Result<Vec<T>, FstError> {
    let end = offset + count * size_of::<T>();
    let src = data.get(offset..end).ok_or(FstError::TooShort {
        expected: end,
        actual: data.len(),
    })?;
    let mut records = vec![T::zeroed(); count];
    bytemuck::cast_slice_mut::<T, u8>(&mut records).copy_from_slice(src);
    Ok(records)
}
