/// Maps a session key to a stable hash for queue selection.
///
/// Stability is the only requirement: the same key must map to the same
/// value for the pool's lifetime. Cryptographic strength is not needed.
/// The trait exists so pool resizing strategies can be tested with a
/// different mapping.
pub trait SessionHasher: Send + Sync {
    /// Hash a session key.
    fn hash_key(&self, key: &str) -> u64;
}

/// 32-bit FNV-1a, the default session hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct Fnv1a;

impl SessionHasher for Fnv1a {
    fn hash_key(&self, key: &str) -> u64 {
        let mut hash: u32 = 2_166_136_261;
        for byte in key.as_bytes() {
            hash ^= u32::from(*byte);
            hash = hash.wrapping_mul(16_777_619);
        }
        u64::from(hash)
    }
}
