//! Variable-width bit-packed index array.
//!
//! Entry `i` occupies bits `i * bits .. i * bits + bits` of a little-endian
//! bitstream laid over `u64` words. Entries may straddle two words: the low
//! part sits in the high bits of the first word, the rest in the low bits of
//! the next. This matches the long-array layout Litematica writes.

use log::trace;

use crate::error::{Result, SchematicError};

pub const MIN_BITS: u32 = 1;
pub const MAX_BITS: u32 = 32;

/// Number of `u64` words needed for `len` entries of `bits` width, or `None`
/// if the total bit count overflows `usize`.
#[inline]
pub const fn required_words(len: usize, bits: u32) -> Option<usize> {
    match len.checked_mul(bits as usize) {
        Some(total_bits) => Some(total_bits.div_ceil(64)),
        None => None,
    }
}

/// Bit length of `value` (0 for 0).
#[inline]
pub const fn bit_length(value: u32) -> u32 {
    u32::BITS - value.leading_zeros()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedArray {
    words: Vec<u64>,
    bits: u32,
    len: usize,
}

impl PackedArray {
    /// Zeroed array of `len` entries at the minimum width.
    pub fn new(len: usize) -> Self {
        Self::with_bits(MIN_BITS, len)
    }

    /// Zeroed array at `bits` width. `len` is trusted; decoders bound it with
    /// [`Vec3D::checked_volume`](crate::region::Vec3D::checked_volume) first.
    pub fn with_bits(bits: u32, len: usize) -> Self {
        let bits = bits.clamp(MIN_BITS, MAX_BITS);
        PackedArray {
            words: vec![0; len.saturating_mul(bits as usize).div_ceil(64)],
            bits,
            len,
        }
    }

    /// Wraps already-packed words. The word count must match `len` and `bits` exactly.
    pub fn from_words(bits: u32, len: usize, words: Vec<u64>) -> Result<Self> {
        if !(MIN_BITS..=MAX_BITS).contains(&bits) {
            return Err(SchematicError::decode(format!(
                "unsupported bits per entry: {}",
                bits
            )));
        }
        let expected = required_words(len, bits).ok_or_else(|| {
            SchematicError::decode(format!("{} entries at {} bits overflow", len, bits))
        })?;
        if words.len() != expected {
            return Err(SchematicError::decode(format!(
                "packed data holds {} words, expected {} for {} entries at {} bits",
                words.len(),
                expected,
                len,
                bits
            )));
        }
        Ok(PackedArray { words, bits, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bits_per_entry(&self) -> u32 {
        self.bits
    }

    /// Largest value an entry can hold at the current width. Also the entry mask.
    #[inline]
    pub fn max_entry_value(&self) -> u64 {
        (1u64 << self.bits) - 1
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn into_words(self) -> Vec<u64> {
        self.words
    }

    pub fn get(&self, index: usize) -> Result<u32> {
        self.check_index(index)?;
        Ok(self.get_at(index))
    }

    /// Stores `value` at `index`, widening the array one bit at a time until it fits.
    pub fn set(&mut self, index: usize, value: u32) -> Result<()> {
        self.check_index(index)?;
        while bit_length(value) > self.bits {
            self.grow(self.bits + 1);
        }
        self.set_at(index, value);
        Ok(())
    }

    /// Repacks every entry at `bits` width. Never narrows.
    pub fn grow(&mut self, bits: u32) {
        if bits <= self.bits {
            return;
        }
        trace!(
            "growing packed array of {} entries from {} to {} bits",
            self.len,
            self.bits,
            bits
        );
        *self = self.resized(bits);
    }

    /// Copy of this array repacked at `bits` width. Values that do not fit are truncated.
    pub fn resized(&self, bits: u32) -> PackedArray {
        let mut out = PackedArray::with_bits(bits, self.len);
        for index in 0..self.len {
            out.set_at(index, self.get_at(index));
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len).map(move |index| self.get_at(index))
    }

    #[inline]
    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(SchematicError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    #[inline]
    fn word(&self, index: usize) -> u64 {
        // Missing storage reads as zero.
        self.words.get(index).copied().unwrap_or(0)
    }

    fn get_at(&self, index: usize) -> u32 {
        let bits = self.bits as usize;
        let bit_index = index * bits;
        let start_long = bit_index >> 6;
        let end_long = (bit_index + bits - 1) >> 6;
        let start_offset = bit_index & 0x3F;
        let mask = self.max_entry_value();

        let low = self.word(start_long) >> start_offset;
        let value = if start_long == end_long {
            low & mask
        } else {
            (low | self.word(end_long) << (64 - start_offset)) & mask
        };
        value as u32
    }

    fn set_at(&mut self, index: usize, value: u32) {
        let bits = self.bits as usize;
        let bit_index = index * bits;
        let start_long = bit_index >> 6;
        let end_long = (bit_index + bits - 1) >> 6;
        let start_offset = bit_index & 0x3F;
        let mask = self.max_entry_value();
        let value = value as u64 & mask;

        let first = &mut self.words[start_long];
        *first = (*first & !(mask << start_offset)) | (value << start_offset);

        if start_long != end_long {
            let high_bits = start_offset + bits - 64;
            let high_mask = (1u64 << high_bits) - 1;
            let second = &mut self.words[end_long];
            *second = (*second & !high_mask) | (value >> (64 - start_offset));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_words() {
        assert_eq!(required_words(0, 1), Some(0));
        assert_eq!(required_words(8, 1), Some(1));
        assert_eq!(required_words(64, 1), Some(1));
        assert_eq!(required_words(65, 1), Some(2));
        assert_eq!(required_words(13, 5), Some(2));
        assert_eq!(required_words(4096, 5), Some(320));
        assert_eq!(required_words(usize::MAX, 2), None);
    }

    #[test]
    fn test_bit_length() {
        assert_eq!(bit_length(0), 0);
        assert_eq!(bit_length(1), 1);
        assert_eq!(bit_length(2), 2);
        assert_eq!(bit_length(3), 2);
        assert_eq!(bit_length(4), 3);
        assert_eq!(bit_length(255), 8);
        assert_eq!(bit_length(256), 9);
    }

    #[test]
    fn test_new_is_zeroed() {
        let array = PackedArray::new(100);
        assert_eq!(array.bits_per_entry(), 1);
        assert_eq!(array.words().len(), 2);
        assert!(array.iter().all(|v| v == 0));
    }

    #[test]
    fn test_roundtrip_all_widths() {
        for bits in 1..=MAX_BITS {
            let len = 150;
            let mut array = PackedArray::with_bits(bits, len);
            let mask = array.max_entry_value();
            let values: Vec<u32> = (0..len as u64)
                .map(|i| (i.wrapping_mul(2_654_435_761) & mask) as u32)
                .collect();
            for (i, &v) in values.iter().enumerate() {
                array.set(i, v).unwrap();
            }
            assert_eq!(array.bits_per_entry(), bits, "no growth expected");
            for (i, &v) in values.iter().enumerate() {
                assert_eq!(array.get(i).unwrap(), v, "bits {} index {}", bits, i);
            }
        }
    }

    #[test]
    fn test_entry_straddling_words() {
        // At 5 bits, entry 12 covers bits 60..65.
        let mut array = PackedArray::with_bits(5, 26);
        array.set(11, 0b10101).unwrap();
        array.set(12, 0b11011).unwrap();
        array.set(13, 0b00111).unwrap();

        assert_eq!(array.words()[0] >> 60, 0b1011);
        assert_eq!(array.words()[1] & 0b1, 0b1);
        assert_eq!(array.get(11).unwrap(), 0b10101);
        assert_eq!(array.get(12).unwrap(), 0b11011);
        assert_eq!(array.get(13).unwrap(), 0b00111);

        // Overwriting the straddling entry keeps its neighbours intact.
        array.set(12, 0).unwrap();
        assert_eq!(array.get(11).unwrap(), 0b10101);
        assert_eq!(array.get(12).unwrap(), 0);
        assert_eq!(array.get(13).unwrap(), 0b00111);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut array = PackedArray::new(8);
        array.set(0, 1).unwrap();
        array.set(7, 1).unwrap();
        assert_eq!(array.words(), &[0b1000_0001]);
    }

    #[test]
    fn test_growth_by_one_bit_preserves_values() {
        let mut array = PackedArray::new(70);
        for i in (0..70).step_by(3) {
            array.set(i, 1).unwrap();
        }
        array.set(5, 2).unwrap();
        assert_eq!(array.bits_per_entry(), 2);
        assert_eq!(Some(array.words().len()), required_words(70, 2));
        for i in 0..70 {
            let expected = if i == 5 {
                2
            } else if i % 3 == 0 {
                1
            } else {
                0
            };
            assert_eq!(array.get(i).unwrap(), expected, "index {}", i);
        }
    }

    #[test]
    fn test_growth_steps_until_value_fits() {
        let mut array = PackedArray::new(10);
        array.set(3, 1).unwrap();
        array.set(4, 9).unwrap();
        assert_eq!(array.bits_per_entry(), 4);
        assert_eq!(array.get(3).unwrap(), 1);
        assert_eq!(array.get(4).unwrap(), 9);
    }

    #[test]
    fn test_width_never_shrinks() {
        let mut array = PackedArray::with_bits(6, 10);
        array.set(0, 1).unwrap();
        array.grow(3);
        assert_eq!(array.bits_per_entry(), 6);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut array = PackedArray::new(4);
        assert!(matches!(
            array.get(4),
            Err(SchematicError::IndexOutOfBounds { index: 4, len: 4 })
        ));
        assert!(array.set(9, 1).is_err());
    }

    #[test]
    fn test_from_words_checks_length() {
        assert!(PackedArray::from_words(2, 8, vec![0]).is_ok());
        assert!(matches!(
            PackedArray::from_words(2, 8, vec![0, 0]),
            Err(SchematicError::Decode(_))
        ));
        assert!(PackedArray::from_words(0, 8, vec![]).is_err());
        assert!(matches!(
            PackedArray::from_words(32, usize::MAX, vec![]),
            Err(SchematicError::Decode(_))
        ));
    }

    #[test]
    fn test_resized_copy() {
        let mut array = PackedArray::new(64);
        array.set(63, 1).unwrap();
        let wide = array.resized(3);
        assert_eq!(wide.bits_per_entry(), 3);
        assert_eq!(wide.get(63).unwrap(), 1);
        assert_eq!(array.bits_per_entry(), 1);
    }
}
