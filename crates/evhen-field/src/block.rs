//! Block representation helpers.

/// Number of parallel byte lanes in a cipher state.
pub const LANES: usize = 16;

/// Cipher state of 16 bytes, one per lane.
pub type Block = [u8; LANES];

/// XORs two blocks, writing the result into `dst`.
#[inline]
pub fn xor_in_place(dst: &mut Block, rhs: &Block) {
    for (d, r) in dst.iter_mut().zip(rhs.iter()) {
        *d ^= *r;
    }
}

/// XORs a sequence of blocks together, starting from zero.
pub fn xor_all<'a, I>(blocks: I) -> Block
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut acc = [0u8; LANES];
    for block in blocks {
        xor_in_place(&mut acc, block);
    }
    acc
}
