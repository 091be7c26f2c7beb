//! PackBits RLE row decoding
//!
//! Brush samples are compressed row by row with the same PackBits scheme
//! PSD uses. The per-row byte counts stored ahead of the data are not
//! needed: a row ends exactly when its destination is full.
//!
//! Control byte rules (unsigned `b`):
//! - `b < 128`: next `b + 1` bytes are literal
//! - `b > 128`: repeat next byte `(b ^ 0xFF) + 2` times
//! - `b == 128`: no operation

use std::io::{Read, Seek};

use super::cursor::ByteCursor;
use super::error::AbrError;

/// Decode one compressed row from `cursor` into `row`.
///
/// Consumes exactly as many source bytes as the row needs. A run that would
/// write past the end of `row` is reported as [`AbrError::Corrupt`].
pub fn decode_row<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    row: &mut [u8],
) -> Result<(), AbrError> {
    let row_len = row.len();
    let mut count = 0;

    while count < row_len {
        let control = cursor.read_u8()?;

        if control < 128 {
            let len = control as usize + 1;
            let dest = row
                .get_mut(count..count + len)
                .ok_or_else(|| overrun(count, len, row_len))?;
            cursor.read_exact(dest)?;
            count += len;
        } else if control > 128 {
            let len = (control ^ 0xFF) as usize + 2;
            let value = cursor.read_u8()?;
            let dest = row
                .get_mut(count..count + len)
                .ok_or_else(|| overrun(count, len, row_len))?;
            dest.fill(value);
            count += len;
        }
    }

    Ok(())
}

fn overrun(offset: usize, len: usize, row_len: usize) -> AbrError {
    AbrError::Corrupt(format!(
        "RLE run of {} bytes at offset {} overruns {} byte row",
        len, offset, row_len
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode(src: &[u8], row_len: usize) -> (Result<Vec<u8>, AbrError>, u64) {
        let mut cursor = ByteCursor::new(Cursor::new(src)).unwrap();
        let mut row = vec![0u8; row_len];
        let result = decode_row(&mut cursor, &mut row).map(|_| row);
        (result, cursor.position().unwrap())
    }

    #[test]
    fn test_decode_literal() {
        let (row, consumed) = decode(&[3, 1, 2, 3, 4], 4);
        assert_eq!(row.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_single_byte_literal() {
        let (row, _) = decode(&[0, 42], 1);
        assert_eq!(row.unwrap(), vec![42]);
    }

    #[test]
    fn test_decode_run() {
        // 0xFC is -4: repeat 5 times
        let (row, consumed) = decode(&[0xFC, 0xAA], 5);
        assert_eq!(row.unwrap(), vec![0xAA; 5]);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_longest_run() {
        let (row, _) = decode(&[129, 7], 128);
        assert_eq!(row.unwrap(), vec![7; 128]);
    }

    #[test]
    fn test_noop_control_is_skipped() {
        let (row, consumed) = decode(&[128, 1, 9, 8, 128], 2);
        assert_eq!(row.unwrap(), vec![9, 8]);
        // Stops as soon as the row is full, trailing no-op left unread
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_mixed_runs() {
        let src = [2, 1, 2, 3, 0xFC, 0xAA, 0, 5];
        let (row, consumed) = decode(&src, 9);
        assert_eq!(row.unwrap(), vec![1, 2, 3, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 5]);
        assert_eq!(consumed, src.len() as u64);
    }

    #[test]
    fn test_rows_consume_independently() {
        let src = [0xFE, 1, 1, 4, 5];
        let mut cursor = ByteCursor::new(Cursor::new(&src[..])).unwrap();
        let mut first = [0u8; 3];
        let mut second = [0u8; 2];
        decode_row(&mut cursor, &mut first).unwrap();
        decode_row(&mut cursor, &mut second).unwrap();
        assert_eq!(first, [1, 1, 1]);
        assert_eq!(second, [4, 5]);
    }

    #[test]
    fn test_literal_overrun_is_corrupt() {
        let (row, _) = decode(&[3, 1, 2, 3, 4], 2);
        assert!(matches!(row, Err(AbrError::Corrupt(_))));
    }

    #[test]
    fn test_run_overrun_is_corrupt() {
        let (row, _) = decode(&[0xFC, 0xAA], 3);
        assert!(matches!(row, Err(AbrError::Corrupt(_))));
    }

    #[test]
    fn test_truncated_source_is_io_error() {
        let (row, _) = decode(&[3, 1, 2], 4);
        assert!(matches!(row, Err(AbrError::Io(_))));
    }
}
