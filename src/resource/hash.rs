pub type ResourceId = u32;

const FNV_OFFSET: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// FNV-1a hash of a resource name.
///
/// The terminating NUL byte is hashed too, so ids match the ones written by
/// the resource build step.
pub fn fnv_hash(name: &str) -> ResourceId {
    name.bytes()
        .chain(std::iter::once(0))
        .fold(FNV_OFFSET, |hash, b| (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME))
}

/// Same as [`fnv_hash`], usable in constants
#[expect(clippy::cast_lossless, reason = "u32::from is not const")]
pub const fn fnv_hash_const(name: &str) -> ResourceId {
    let bytes = name.as_bytes();
    let mut hash = FNV_OFFSET;
    let mut i = 0;
    while i < bytes.len() {
        hash = (hash ^ bytes[i] as u32).wrapping_mul(FNV_PRIME);
        i += 1;
    }
    // Trailing NUL: xor with zero is a no-op
    hash.wrapping_mul(FNV_PRIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: ResourceId = fnv_hash_const("player.webp");

    #[test]
    fn test_empty_name_hashes_nul() {
        // A single zero byte
        assert_eq!(fnv_hash(""), 0x050c_5d1f);
    }

    #[test]
    fn test_const_matches_runtime() {
        assert_eq!(PLAYER, fnv_hash("player.webp"));
        for name in ["a", "tiles/grass.png", "ü"] {
            assert_eq!(fnv_hash_const(name), fnv_hash(name));
        }
        assert_ne!(fnv_hash("a"), fnv_hash("b"));
    }
}
