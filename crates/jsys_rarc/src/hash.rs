//! Name hashing used by directory and entry records.

/// Hash a name the way RARC records store it.
///
/// Every byte is folded in as `hash * 3 + byte`, truncated to 16 bits. Bytes are treated as
/// unsigned, so names outside of ASCII hash consistently on every platform.
pub fn name_hash(name: impl AsRef<[u8]>) -> u16 {
    name.as_ref()
        .iter()
        .fold(0u16, |hash, byte| hash.wrapping_mul(3).wrapping_add(*byte as u16))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::name_hash;

    #[test]
    fn hashes_known_names() {
        assert_eq!(name_hash(""), 0);
        assert_eq!(name_hash("."), 0x2E);
        assert_eq!(name_hash(".."), 0xB8);
        assert_eq!(name_hash("a.txt"), 0x297B);
    }

    #[test]
    fn wraps_at_sixteen_bits() {
        let name = "a_rather_long_file_name_that_overflows.bti";
        let expected = name
            .bytes()
            .fold(0u32, |hash, byte| (hash * 3 + byte as u32) & 0xFFFF);
        assert_eq!(name_hash(name) as u32, expected);
    }

    #[test]
    fn high_bytes_are_unsigned() {
        // "é" is 0xC3 0xA9 in UTF-8
        assert_eq!(name_hash("é"), 0xC3 * 3 + 0xA9);
    }
}
