//! Pointer-length ABI packing: every value that crosses the sandbox boundary
//! is a `(ptr, len)` pair packed into one 64-bit return value, since WASM
//! functions in this ABI return a single integer.

/// Packs a 32-bit pointer and a 32-bit length into one 64-bit descriptor:
/// `(ptr << 32) | len`.
pub fn pack(ptr: u32, len: u32) -> u64 {
    ((ptr as u64) << 32) | (len as u64)
}

/// Inverse of [`pack`]. `unpack(pack(p, l)) == (p, l)` for all 32-bit `p`, `l`.
pub fn unpack(packed: u64) -> (u32, u32) {
    let ptr = (packed >> 32) as u32;
    let len = (packed & 0xFFFF_FFFF) as u32;
    (ptr, len)
}
