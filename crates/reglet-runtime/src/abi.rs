//! The allocator dance: every payload crossing the sandbox boundary is
//! written into guest memory via the guest's own `allocate` export, then
//! handed across as a packed `(ptr, len)` descriptor.

use reglet_wire::{pack, unpack};
use wasmtime::{Caller, Memory, TypedFunc};

use crate::host_state::HostState;

/// Reads `len` bytes starting at `ptr` out of guest linear memory.
pub fn read_guest_bytes(caller: &mut Caller<'_, HostState>, memory: Memory, packed: u64) -> anyhow::Result<Vec<u8>> {
    let (ptr, len) = unpack(packed);
    let data = memory.data(caller);
    let start = ptr as usize;
    let end = start
        .checked_add(len as usize)
        .ok_or_else(|| anyhow::anyhow!("guest pointer/length overflow"))?;
    data.get(start..end)
        .map(|s| s.to_vec())
        .ok_or_else(|| anyhow::anyhow!("guest pointer/length out of bounds"))
}

/// Calls the guest's `allocate` export to reserve `bytes.len()` bytes, writes
/// `bytes` into that region, and returns the packed `(ptr, len)` descriptor.
pub async fn write_guest_bytes(
    caller: &mut Caller<'_, HostState>,
    memory: Memory,
    allocate: TypedFunc<u32, u32>,
    bytes: &[u8],
) -> anyhow::Result<u64> {
    let ptr = allocate.call_async(&mut *caller, bytes.len() as u32).await?;
    memory.write(&mut *caller, ptr as usize, bytes)?;
    Ok(pack(ptr, bytes.len() as u32))
}

#[cfg(test)]
mod tests {
    use reglet_wire::{pack, unpack};

    #[test]
    fn pack_unpack_are_inverse_for_guest_descriptors() {
        for (p, l) in [(0u32, 0u32), (4096, 128), (u32::MAX, u32::MAX)] {
            assert_eq!(unpack(pack(p, l)), (p, l));
        }
    }
}
