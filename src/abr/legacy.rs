//! Version 1 and 2 brush decoding
//!
//! Old ABR files are a flat list of records, each starting with a type and
//! a byte length. Only sampled records carry a bitmap. Every record ends at
//! its declared length, whatever the decoder consumed.

use std::io::{Read, Seek};

use super::config::AbrLoadConfig;
use super::cursor::ByteCursor;
use super::error::AbrError;
use super::tip::{
    check_payload, min_payload_len, Compression, DecodedBrushImage, RecordOutcome, SampleDepth,
    SkipReason,
};
use super::types::{AbrVersion, Brush};

const COMPUTED_BRUSH: i16 = 1;
const SAMPLED_BRUSH: i16 = 2;

/// Rows stored per chunk; taller bitmaps repeat the compression header
const MAX_CHUNK_ROWS: i64 = 16384;

/// Decode every record of a version 1/2 file. The cursor is just past the
/// major version.
pub(crate) fn decode_brushes<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    version: AbrVersion,
    config: &AbrLoadConfig,
) -> Result<Vec<Brush>, AbrError> {
    let count = cursor.read_i16()?;
    tracing::debug!("ABR v{} record count: {}", version.major(), count);

    let mut brushes = Vec::with_capacity(count.max(0) as usize);

    for i in 0..count.max(0) as usize {
        match decode_record(cursor, version, i, config)? {
            RecordOutcome::Decoded(decoded) => brushes.extend(decoded),
            RecordOutcome::Skipped(SkipReason::Computed) => {
                tracing::debug!("Computed brush #{} found, skipping", i);
            }
            RecordOutcome::Skipped(reason) => {
                tracing::warn!("Skipped brush #{}: {}", i, reason);
            }
        }
    }

    Ok(brushes)
}

fn decode_record<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    version: AbrVersion,
    index: usize,
    config: &AbrLoadConfig,
) -> Result<RecordOutcome, AbrError> {
    let brush_type = cursor.read_i16()?;
    let size = cursor.read_i32()?;
    let end_offset = end_of(cursor.position()?, size);

    tracing::debug!(
        "Brush #{}: type={}, size={} bytes",
        index,
        brush_type,
        size
    );

    let outcome = match brush_type {
        SAMPLED_BRUSH => decode_sampled(cursor, version, index, end_offset, config)?,
        COMPUTED_BRUSH => RecordOutcome::Skipped(SkipReason::Computed),
        other => RecordOutcome::Skipped(SkipReason::UnknownType(other)),
    };

    cursor.seek_to(end_offset)?;
    Ok(outcome)
}

fn end_of(position: u64, size: i32) -> u64 {
    let end = position as i64 + i64::from(size);
    end.max(0) as u64
}

fn decode_sampled<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    version: AbrVersion,
    index: usize,
    end_offset: u64,
    config: &AbrLoadConfig,
) -> Result<RecordOutcome, AbrError> {
    // Obsolete 'miscellaneous' field
    cursor.skip(4)?;
    let _spacing = cursor.read_i16()?;

    let mut name = if version == AbrVersion::V2 {
        cursor.read_unicode_string()?
    } else {
        String::new()
    };
    if name.is_empty() {
        name = config.default_brush_name(index);
    }

    let _anti_alias = cursor.read_u8()? != 0;

    // Int16 bounds, superseded by the Int32 rectangle
    cursor.skip(8)?;

    let bounds = cursor.read_bounds()?;
    let Some((width, height)) = bounds.size() else {
        return Ok(RecordOutcome::Skipped(SkipReason::InvalidBounds {
            width: bounds.width(),
            height: bounds.height(),
        }));
    };

    let depth = cursor.read_i16()?;
    if depth != 8 {
        return Ok(RecordOutcome::Skipped(SkipReason::UnsupportedDepth(depth)));
    }

    // Compression is only known per chunk
    let needed = min_payload_len(width, height, SampleDepth::Eight, None);
    if let Some(reason) = check_payload(cursor, end_offset, needed)? {
        return Ok(RecordOutcome::Skipped(reason));
    }

    let mut image = match DecodedBrushImage::allocate(
        width,
        height,
        SampleDepth::Eight,
        &config.limits,
    ) {
        Ok(image) => image,
        Err(reason) => return Ok(RecordOutcome::Skipped(reason)),
    };

    match read_chunks(cursor, &mut image) {
        Ok(()) => {}
        Err(AbrError::Corrupt(msg)) => {
            return Ok(RecordOutcome::Skipped(SkipReason::Corrupt(msg)));
        }
        Err(e) => return Err(e),
    }

    tracing::debug!("Decoded '{}' ({}x{})", name, width, height);

    Ok(RecordOutcome::Decoded(vec![Brush::new(
        name,
        image.into_alpha(),
        &config.cache_dir,
    )]))
}

/// Read the bitmap in chunks of up to 16384 rows.
///
/// The row counters always advance by a full chunk, so only the last chunk
/// may be short.
fn read_chunks<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    image: &mut DecodedBrushImage,
) -> Result<(), AbrError> {
    let mut rows_remaining = i64::from(image.height);
    let mut rows_read: i64 = 0;

    loop {
        let chunk_height = rows_remaining.min(MAX_CHUNK_ROWS);
        // Documented as 2 bytes, written as 1 in real files
        let compression = Compression::from_flag(cursor.read_u8()?);

        image.read_rows(
            cursor,
            rows_read as usize,
            chunk_height as usize,
            compression,
        )?;

        rows_remaining -= MAX_CHUNK_ROWS;
        rows_read += MAX_CHUNK_ROWS;

        if rows_remaining <= 0 {
            break;
        }
    }

    Ok(())
}
