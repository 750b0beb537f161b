//! Odds and ends.

/// The binary-search assist fields shared by the table directory and cmap
/// format 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRange {
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

impl SearchRange {
    /// Compute the search assists for `n_items` records of `item_size` bytes.
    pub fn compute(n_items: usize, item_size: u16) -> Self {
        if n_items == 0 {
            return SearchRange {
                search_range: 0,
                entry_selector: 0,
                range_shift: 0,
            };
        }
        let entry_selector = n_items.ilog2() as u16;
        let search_range = item_size * (1 << entry_selector);
        let range_shift = (n_items as u16 * item_size).saturating_sub(search_range);
        SearchRange {
            search_range,
            entry_selector,
            range_shift,
        }
    }
}

/// Sum of big-endian u32 words, the final partial word zero-padded.
pub fn checksum(data: &[u8]) -> u32 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        sum = sum.wrapping_add(word);
    }
    let rem = chunks.remainder();
    if !rem.is_empty() {
        let mut last = [0u8; 4];
        last[..rem.len()].copy_from_slice(rem);
        sum = sum.wrapping_add(u32::from_be_bytes(last));
    }
    sum
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 0, 0, 0)]
    #[case(1, 16, 0, 0)]
    #[case(2, 32, 1, 0)]
    #[case(3, 32, 1, 16)]
    #[case(4, 64, 2, 0)]
    #[case(5, 64, 2, 16)]
    #[case(16, 256, 4, 0)]
    #[case(17, 256, 4, 16)]
    fn directory_search_assists(
        #[case] n: usize,
        #[case] search_range: u16,
        #[case] entry_selector: u16,
        #[case] range_shift: u16,
    ) {
        assert_eq!(
            SearchRange::compute(n, 16),
            SearchRange {
                search_range,
                entry_selector,
                range_shift
            }
        );
    }

    #[test]
    fn checksum_whole_words() {
        assert_eq!(checksum(&[0, 0, 0, 1]), 1);
        assert_eq!(checksum(&[0, 0, 0, 1, 0, 0, 0, 2]), 3);
    }

    #[test]
    fn checksum_partial_word_is_zero_padded() {
        assert_eq!(checksum(b"A"), 0x41000000);
    }

    #[test]
    fn checksum_unchanged_by_zero_padding() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x01];
        let padded = [0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0, 0, 0];
        assert_eq!(checksum(&data), checksum(&padded));
    }

    #[test]
    fn checksum_wraps() {
        assert_eq!(checksum(&[0xFF; 8]), 0xFFFF_FFFEu32);
    }
}
