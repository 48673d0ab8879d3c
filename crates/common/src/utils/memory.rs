use alloy::primitives::{Address, B256, U256};
use eyre::{bail, eyre, Result};

/// Upper bound on the zero padding [`memory_copy_padded`] is willing to allocate past the end
/// of memory.
pub const MEMORY_PAD_LIMIT: usize = 1024 * 1024;

/// Copies `size` bytes of `memory` starting at `offset`.
///
/// Bytes past the end of memory read as zero. Fails when `offset` or `size` do not fit a
/// `usize`, or when more than [`MEMORY_PAD_LIMIT`] bytes of padding would be needed.
pub fn memory_copy_padded(memory: &[u8], offset: U256, size: U256) -> Result<Vec<u8>> {
    let (Some(offset), Some(size)) = (word_to_usize(offset), word_to_usize(size)) else {
        bail!("memory range out of bounds: offset {}, size {}", offset, size);
    };
    if size == 0 {
        return Ok(Vec::new());
    }

    let end = offset
        .checked_add(size)
        .ok_or_else(|| eyre!("memory range overflows: offset {}, size {}", offset, size))?;
    if end <= memory.len() {
        return Ok(memory[offset..end].to_vec());
    }

    let padding = end - memory.len();
    if padding > MEMORY_PAD_LIMIT {
        bail!("reached limit for padding memory slice: {}", padding);
    }

    let mut copy = vec![0u8; size];
    if offset < memory.len() {
        let available = &memory[offset..];
        copy[..available.len()].copy_from_slice(available);
    }
    Ok(copy)
}

/// Converts a stack word to a `u64`, or `None` when it does not fit.
pub fn word_to_u64(word: U256) -> Option<u64> {
    (word <= U256::from(u64::MAX)).then(|| word.as_limbs()[0])
}

/// Converts a stack word to a `usize`, or `None` when it does not fit.
pub fn word_to_usize(word: U256) -> Option<usize> {
    word_to_u64(word).and_then(|value| usize::try_from(value).ok())
}

/// Interprets the low 20 bytes of a stack word as an address.
pub fn word_to_address(word: U256) -> Address {
    Address::from_slice(&word.to_be_bytes::<32>()[12..])
}

/// Reinterprets a stack word as a 32-byte hash.
pub fn word_to_b256(word: U256) -> B256 {
    B256::from(word.to_be_bytes::<32>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_within_bounds() {
        let memory = [1u8, 2, 3, 4, 5];
        let copy = memory_copy_padded(&memory, U256::from(1), U256::from(3)).unwrap();
        assert_eq!(copy, vec![2, 3, 4]);
    }

    #[test]
    fn test_copy_pads_past_end() {
        let memory = [1u8, 2, 3];
        let copy = memory_copy_padded(&memory, U256::from(2), U256::from(4)).unwrap();
        assert_eq!(copy, vec![3, 0, 0, 0]);

        let copy = memory_copy_padded(&memory, U256::from(10), U256::from(2)).unwrap();
        assert_eq!(copy, vec![0, 0]);
    }

    #[test]
    fn test_copy_zero_size_ignores_offset() {
        let copy = memory_copy_padded(&[], U256::MAX, U256::ZERO).unwrap();
        assert!(copy.is_empty());
    }

    #[test]
    fn test_copy_rejects_oversized_ranges() {
        assert!(memory_copy_padded(&[], U256::ZERO, U256::MAX).is_err());
        assert!(memory_copy_padded(&[], U256::ZERO, U256::from(MEMORY_PAD_LIMIT + 1)).is_err());
        assert!(memory_copy_padded(&[0u8; 32], U256::from(u64::MAX), U256::from(1)).is_err());
    }

    #[test]
    fn test_word_conversions() {
        let address = Address::repeat_byte(0xab);
        let mut bytes = [0xffu8; 32];
        bytes[12..].copy_from_slice(address.as_slice());
        let word = U256::from_be_bytes(bytes);

        assert_eq!(word_to_address(word), address);
        assert_eq!(word_to_b256(word), B256::from(bytes));
        assert_eq!(word_to_u64(U256::from(7)), Some(7));
        assert_eq!(word_to_u64(U256::from(u64::MAX) + U256::from(1)), None);
    }
}
