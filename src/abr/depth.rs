//! 16-bit to 8-bit sample reduction
//!
//! 16-bit brush samples use the range [0, 32768] rather than the full
//! `u16` range, so a plain shift would lose the top value. A lookup table
//! maps each valid sample to its 8-bit equivalent.

use std::sync::OnceLock;

/// Highest sample value a 16-bit brush stores
pub const MAX_SIXTEEN_BIT_SAMPLE: u16 = 32768;

const TABLE_LEN: usize = MAX_SIXTEEN_BIT_SAMPLE as usize + 1;

/// Immutable 16-bit to 8-bit lookup table, built once and shared
pub struct EightBitTable {
    table: Box<[u8]>,
}

impl EightBitTable {
    fn build() -> Self {
        let table = (0..TABLE_LEN)
            .map(|i| ((i * 10) / 1285) as u8)
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { table }
    }

    /// Process-wide table instance
    pub fn shared() -> &'static EightBitTable {
        static TABLE: OnceLock<EightBitTable> = OnceLock::new();
        TABLE.get_or_init(Self::build)
    }

    /// Map a 16-bit sample to 8 bits, clamping values above 32768
    #[inline]
    pub fn get(&self, value: u16) -> u8 {
        let index = value.min(MAX_SIXTEEN_BIT_SAMPLE) as usize;
        self.table[index]
    }

    /// Convert a buffer of big-endian 16-bit samples into 8-bit values.
    /// A trailing odd byte is ignored.
    pub fn reduce_be(&self, samples: &[u8]) -> Vec<u8> {
        samples
            .chunks_exact(2)
            .map(|pair| self.get(u16::from_be_bytes([pair[0], pair[1]])))
            .collect()
    }
}
