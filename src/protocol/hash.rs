/// Compute the djb2 hash of a byte sequence.
///
/// `hash = hash * 33 + byte`, seeded with 5381, wrapping at 64 bits. This is
/// the integrity tag carried in the transfer envelope; it guards against
/// corruption on the receiving side, not tampering.
pub fn djb2(bytes: &[u8]) -> u64 {
    bytes.iter().fold(5381u64, |hash, &byte| {
        hash.wrapping_mul(33).wrapping_add(u64::from(byte))
    })
}
