//! Brush tip assembly
//!
//! Shared pieces of the legacy and sample decoders: per-record outcomes,
//! scratch buffer sizing, conversion of decoded samples into an
//! [`AlphaImage`], and the size of derived brush variants.

use std::fmt;
use std::io::{self, Read, Seek};

use super::config::DecodeLimits;
use super::cursor::ByteCursor;
use super::depth::EightBitTable;
use super::error::AbrError;
use super::rle;
use super::types::{AlphaImage, Brush};

/// Result of decoding one record
#[derive(Debug)]
pub enum RecordOutcome {
    /// One brush, or a brush followed by its derived variants
    Decoded(Vec<Brush>),
    Skipped(SkipReason),
}

/// Why a record produced no brush
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Parametric brushes are not rendered
    Computed,
    UnknownType(i16),
    InvalidBounds { width: i64, height: i64 },
    UnsupportedDepth(i16),
    OverLimit(String),
    /// Sample data whose tag no descriptor references
    UnmatchedTag(String),
    Corrupt(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Computed => write!(f, "computed brush"),
            Self::UnknownType(t) => write!(f, "unknown brush type {}", t),
            Self::InvalidBounds { width, height } => {
                write!(f, "invalid dimensions {}x{}", width, height)
            }
            Self::UnsupportedDepth(d) => write!(f, "unsupported depth {}", d),
            Self::OverLimit(msg) => write!(f, "{}", msg),
            Self::UnmatchedTag(tag) => write!(f, "no descriptor for sample '{}'", tag),
            Self::Corrupt(msg) => write!(f, "corrupt data: {}", msg),
        }
    }
}

/// Bits per stored sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDepth {
    Eight,
    Sixteen,
}

impl SampleDepth {
    pub fn from_bits(bits: i16) -> Option<Self> {
        match bits {
            8 => Some(SampleDepth::Eight),
            16 => Some(SampleDepth::Sixteen),
            _ => None,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleDepth::Eight => 1,
            SampleDepth::Sixteen => 2,
        }
    }
}

/// Pixel payload compression flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Raw,
    Rle,
}

impl Compression {
    /// Any non-zero flag is treated as RLE
    pub fn from_flag(flag: u8) -> Self {
        if flag == 0 {
            Compression::Raw
        } else {
            Compression::Rle
        }
    }
}

/// Decoded but not yet converted sample data
#[derive(Debug)]
pub struct DecodedBrushImage {
    pub width: u32,
    pub height: u32,
    pub depth: SampleDepth,
    /// Row-major samples, stride = width * bytes per sample
    pub data: Vec<u8>,
}

impl DecodedBrushImage {
    /// Zeroed scratch buffer for a `width x height` record.
    ///
    /// Fails when the record is over `limits` or its byte size overflows.
    pub fn allocate(
        width: u32,
        height: u32,
        depth: SampleDepth,
        limits: &DecodeLimits,
    ) -> Result<Self, SkipReason> {
        limits.check(width, height).map_err(SkipReason::OverLimit)?;

        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(depth.bytes_per_sample()))
            .ok_or_else(|| {
                SkipReason::OverLimit(format!("{}x{} brush is too large", width, height))
            })?;

        Ok(Self {
            width,
            height,
            depth,
            data: vec![0u8; len],
        })
    }

    pub fn bytes_per_row(&self) -> usize {
        self.width as usize * self.depth.bytes_per_sample()
    }

    /// Mutable view of row `y`, or `None` past the last row
    pub fn row_mut(&mut self, y: usize) -> Option<&mut [u8]> {
        let stride = self.bytes_per_row();
        let start = y.checked_mul(stride)?;
        self.data.get_mut(start..start + stride)
    }

    /// Read `row_count` rows starting at `first_row`.
    ///
    /// RLE data is preceded by a table of 2-byte compressed row lengths;
    /// the table is skipped since each row decodes until it is full.
    pub fn read_rows<R: Read + Seek>(
        &mut self,
        cursor: &mut ByteCursor<R>,
        first_row: usize,
        row_count: usize,
        compression: Compression,
    ) -> Result<(), AbrError> {
        let height = self.height;
        match compression {
            Compression::Rle => {
                cursor.skip(row_count as u64 * 2)?;
                for y in first_row..first_row + row_count {
                    let row = self.row_mut(y).ok_or_else(|| {
                        AbrError::Corrupt(format!("row {} outside {} row brush", y, height))
                    })?;
                    rle::decode_row(cursor, row)?;
                }
            }
            Compression::Raw => {
                let stride = self.bytes_per_row();
                let start = first_row * stride;
                let end = start + row_count * stride;
                let dest = self.data.get_mut(start..end).ok_or_else(|| {
                    AbrError::Corrupt(format!(
                        "rows {}..{} outside {} row brush",
                        first_row,
                        first_row + row_count,
                        height
                    ))
                })?;
                cursor.read_exact(dest)?;
            }
        }
        Ok(())
    }

    /// Convert to an 8-bit alpha raster
    pub fn into_alpha(self) -> AlphaImage {
        let data = match self.depth {
            SampleDepth::Eight => self.data,
            SampleDepth::Sixteen => EightBitTable::shared().reduce_be(&self.data),
        };

        AlphaImage::from_decoded(self.width, self.height, data)
    }
}

/// Smallest number of bytes the pixel payload of a record can occupy.
///
/// RLE data needs its 2-byte row length table plus one 2-byte replicate
/// run per 128 bytes of row. With no known compression the smaller of the
/// two bounds applies.
pub fn min_payload_len(
    width: u32,
    height: u32,
    depth: SampleDepth,
    compression: Option<Compression>,
) -> u64 {
    let row = u64::from(width).saturating_mul(depth.bytes_per_sample() as u64);
    let rows = u64::from(height);

    let raw = row.saturating_mul(rows);
    let rle = rows
        .saturating_mul(2)
        .saturating_add(rows.saturating_mul(2).saturating_mul(row.div_ceil(128)));

    match compression {
        Some(Compression::Raw) => raw,
        Some(Compression::Rle) => rle,
        None => raw.min(rle),
    }
}

/// Check that `needed` payload bytes fit before the buffer is allocated.
///
/// More than the file holds is a read past the end of data; more than the
/// record holds skips the record.
pub(crate) fn check_payload<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    record_end: u64,
    needed: u64,
) -> Result<Option<SkipReason>, AbrError> {
    let position = cursor.position()?;

    let in_file = cursor.len().saturating_sub(position);
    if needed > in_file {
        return Err(AbrError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("pixel data needs {} bytes, {} remain", needed, in_file),
        )));
    }

    let in_record = record_end.saturating_sub(position);
    if needed > in_record {
        return Ok(Some(SkipReason::OverLimit(format!(
            "pixel data needs {} bytes, record holds {}",
            needed, in_record
        ))));
    }

    Ok(None)
}

/// Size of a derived variant of a `native` sized tip scaled to `diameter`.
///
/// The long edge becomes `min(long, diameter)`, the short edge keeps the
/// aspect ratio (rounded, at least 1). A zero-sized tip maps to 1x1.
pub fn variant_size(native: (u32, u32), diameter: i32) -> (u32, u32) {
    let (width, height) = native;
    if width == 0 || height == 0 {
        return (1, 1);
    }

    let diameter = u64::try_from(diameter).unwrap_or(0).max(1);
    let long = u64::from(width.max(height));
    let short = u64::from(width.min(height));
    let long_target = long.min(diameter);
    let short_target = ((short * long_target * 2 + long) / (2 * long)).max(1);

    let (long_target, short_target) = (long_target as u32, short_target as u32);
    if width >= height {
        (long_target, short_target)
    } else {
        (short_target, long_target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_size_landscape() {
        assert_eq!(variant_size((200, 100), 50), (50, 25));
        assert_eq!(variant_size((200, 100), 25), (25, 13));
    }

    #[test]
    fn test_variant_size_portrait() {
        assert_eq!(variant_size((30, 90), 45), (15, 45));
    }

    #[test]
    fn test_variant_size_square_and_clamps() {
        assert_eq!(variant_size((64, 64), 32), (32, 32));
        // Diameter larger than the tip keeps the native size
        assert_eq!(variant_size((64, 64), 100), (64, 64));
        assert_eq!(variant_size((1000, 2), 10), (10, 1));
        assert_eq!(variant_size((0, 50), 10), (1, 1));
        assert_eq!(variant_size((50, 20), 0), (1, 1));
    }

    #[test]
    fn test_allocate_respects_limits() {
        let limits = DecodeLimits {
            max_pixels: Some(100),
            ..Default::default()
        };
        assert!(DecodedBrushImage::allocate(10, 10, SampleDepth::Sixteen, &limits).is_ok());
        assert!(matches!(
            DecodedBrushImage::allocate(11, 10, SampleDepth::Eight, &limits),
            Err(SkipReason::OverLimit(_))
        ));
    }

    #[test]
    fn test_rows_are_strided_by_depth() {
        let mut img =
            DecodedBrushImage::allocate(3, 2, SampleDepth::Sixteen, &DecodeLimits::default())
                .unwrap();
        assert_eq!(img.bytes_per_row(), 6);
        img.row_mut(1).unwrap().copy_from_slice(&[0x80, 0, 0, 0, 0x40, 0]);
        assert!(img.row_mut(2).is_none());

        let alpha = img.into_alpha();
        assert_eq!(alpha.data(), &[0, 0, 0, 255, 0, 127]);
    }

    #[test]
    fn test_eight_bit_passthrough() {
        let mut img =
            DecodedBrushImage::allocate(2, 2, SampleDepth::Eight, &DecodeLimits::default())
                .unwrap();
        img.data.copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(img.into_alpha().data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_read_rows_raw_and_rle() {
        use std::io::Cursor;

        // Raw rows 1..3 of a 2-wide image
        let raw = [5, 6, 7, 8];
        let mut cursor = ByteCursor::new(Cursor::new(&raw[..])).unwrap();
        let mut img =
            DecodedBrushImage::allocate(2, 3, SampleDepth::Eight, &DecodeLimits::default())
                .unwrap();
        img.read_rows(&mut cursor, 1, 2, Compression::Raw).unwrap();
        assert_eq!(img.data, vec![0, 0, 5, 6, 7, 8]);

        // Two row length entries, then one replicate run per row
        let packed = [0, 2, 0, 2, 0xFF, 9, 0xFF, 3];
        let mut cursor = ByteCursor::new(Cursor::new(&packed[..])).unwrap();
        let mut img =
            DecodedBrushImage::allocate(2, 2, SampleDepth::Eight, &DecodeLimits::default())
                .unwrap();
        img.read_rows(&mut cursor, 0, 2, Compression::Rle).unwrap();
        assert_eq!(img.data, vec![9, 9, 3, 3]);
        assert_eq!(cursor.position().unwrap(), packed.len() as u64);
    }

    #[test]
    fn test_read_rows_past_end_is_corrupt() {
        use std::io::Cursor;

        let raw = [0u8; 16];
        let mut cursor = ByteCursor::new(Cursor::new(&raw[..])).unwrap();
        let mut img =
            DecodedBrushImage::allocate(2, 2, SampleDepth::Eight, &DecodeLimits::default())
                .unwrap();
        let result = img.read_rows(&mut cursor, 1, 2, Compression::Raw);
        assert!(matches!(result, Err(AbrError::Corrupt(_))));
    }

    #[test]
    fn test_min_payload_len() {
        let eight = SampleDepth::Eight;
        assert_eq!(min_payload_len(4, 4, eight, Some(Compression::Raw)), 16);
        assert_eq!(min_payload_len(4, 4, eight, Some(Compression::Rle)), 16);
        // 256 byte rows pack into two runs each
        assert_eq!(
            min_payload_len(128, 3, SampleDepth::Sixteen, Some(Compression::Rle)),
            6 + 12
        );
        assert_eq!(min_payload_len(1, 10, eight, None), 10);
        assert_eq!(min_payload_len(1024, 10, eight, None), 20 + 160);

        let huge = min_payload_len(1 << 30, 1 << 30, SampleDepth::Sixteen, None);
        assert!(huge > 1 << 50);
    }

    #[test]
    fn test_check_payload() {
        use std::io::Cursor;

        let data = [0u8; 20];
        let mut cursor = ByteCursor::new(Cursor::new(&data[..])).unwrap();
        cursor.seek_to(4).unwrap();

        assert!(check_payload(&mut cursor, 12, 8).unwrap().is_none());
        assert!(matches!(
            check_payload(&mut cursor, 12, 9),
            Ok(Some(SkipReason::OverLimit(_)))
        ));
        assert!(matches!(
            check_payload(&mut cursor, 40, 17),
            Err(AbrError::Io(_))
        ));
    }

    #[test]
    fn test_compression_flag() {
        assert_eq!(Compression::from_flag(0), Compression::Raw);
        assert_eq!(Compression::from_flag(1), Compression::Rle);
    }

    #[test]
    fn test_depth_bits() {
        assert_eq!(SampleDepth::from_bits(8), Some(SampleDepth::Eight));
        assert_eq!(SampleDepth::from_bits(16), Some(SampleDepth::Sixteen));
        assert_eq!(SampleDepth::from_bits(32), None);
    }
}
