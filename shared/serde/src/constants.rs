/// Largest payload a single choreography packet should occupy, in bytes.
pub const MTU_SIZE_BYTES: usize = 430;
pub const MTU_SIZE_BITS: u32 = (MTU_SIZE_BYTES * 8) as u32;
