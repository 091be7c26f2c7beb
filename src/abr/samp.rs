//! 8BIMsamp section decoding
//!
//! Each entry of the sample section is one stored bitmap keyed by a tag.
//! A bitmap is emitted under the name of the largest descriptor sharing
//! its tag; smaller descriptors with the same tag are derived from it by
//! resampling, since Photoshop only stores the largest size.

use std::io::{Read, Seek};

use super::config::AbrLoadConfig;
use super::cursor::ByteCursor;
use super::error::AbrError;
use super::sections::{SampledBrushDescriptor, SectionScan};
use super::tip::{
    check_payload, min_payload_len, variant_size, Compression, DecodedBrushImage, RecordOutcome,
    SampleDepth, SkipReason,
};
use super::types::Brush;

/// Decode every bitmap in the sample section located by `scan`.
///
/// `unused_len` is the version-dependent gap between a sample's tag key
/// and its bounds.
pub(crate) fn decode_samples<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    scan: &SectionScan,
    unused_len: u64,
    config: &AbrLoadConfig,
) -> Result<Vec<Brush>, AbrError> {
    let Some(section_offset) = scan.sample_section_offset else {
        tracing::debug!("No samp section, no brushes to decode");
        return Ok(Vec::new());
    };
    if scan.brushes.is_empty() {
        tracing::debug!("No sampled brush descriptors, skipping samp section");
        return Ok(Vec::new());
    }

    cursor.seek_to(section_offset)?;
    let section_length = u64::from(cursor.read_u32()?);
    let section_end = cursor.position()? + section_length;

    let mut brushes = Vec::with_capacity(scan.brushes.len());
    let mut sample_id = 0usize;

    while cursor.position()? < section_end {
        match decode_entry(cursor, scan, unused_len, config)? {
            RecordOutcome::Decoded(decoded) => brushes.extend(decoded),
            RecordOutcome::Skipped(SkipReason::UnmatchedTag(tag)) => {
                tracing::debug!("Sample #{} ('{}') has no descriptor, skipping", sample_id, tag);
            }
            RecordOutcome::Skipped(reason) => {
                tracing::warn!("Skipped sample #{}: {}", sample_id, reason);
            }
        }
        sample_id += 1;
    }

    Ok(brushes)
}

fn decode_entry<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    scan: &SectionScan,
    unused_len: u64,
    config: &AbrLoadConfig,
) -> Result<RecordOutcome, AbrError> {
    let brush_length = u64::from(cursor.read_u32()?);
    // Entries are padded to 4 byte alignment
    let end_offset = cursor.position()? + ((brush_length + 3) & !3);

    let outcome = decode_bitmap(cursor, scan, unused_len, end_offset, config)?;

    match outcome {
        RecordOutcome::Skipped(_) => cursor.seek_to(end_offset)?,
        RecordOutcome::Decoded(_) => {
            if cursor.position()? < end_offset {
                cursor.seek_to(end_offset)?;
            }
        }
    }

    Ok(outcome)
}

fn decode_bitmap<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    scan: &SectionScan,
    unused_len: u64,
    end_offset: u64,
    config: &AbrLoadConfig,
) -> Result<RecordOutcome, AbrError> {
    let tag = cursor.read_pascal_string()?;
    cursor.skip(unused_len)?;

    let bounds = cursor.read_bounds()?;
    let Some((width, height)) = bounds.size() else {
        return Ok(RecordOutcome::Skipped(SkipReason::InvalidBounds {
            width: bounds.width(),
            height: bounds.height(),
        }));
    };

    let depth_bits = cursor.read_i16()?;
    let Some(depth) = SampleDepth::from_bits(depth_bits) else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnsupportedDepth(depth_bits)));
    };

    let Some(largest) = scan.brushes.find_largest(&tag) else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnmatchedTag(tag)));
    };

    let compression = Compression::from_flag(cursor.read_u8()?);

    let needed = min_payload_len(width, height, depth, Some(compression));
    if let Some(reason) = check_payload(cursor, end_offset, needed)? {
        return Ok(RecordOutcome::Skipped(reason));
    }

    let mut image = match DecodedBrushImage::allocate(width, height, depth, &config.limits) {
        Ok(image) => image,
        Err(reason) => return Ok(RecordOutcome::Skipped(reason)),
    };

    match image.read_rows(cursor, 0, height as usize, compression) {
        Ok(()) => {}
        Err(AbrError::Corrupt(msg)) => {
            return Ok(RecordOutcome::Skipped(SkipReason::Corrupt(msg)));
        }
        Err(e) => return Err(e),
    }

    let brush = Brush::new(
        brush_name(largest, config),
        image.into_alpha(),
        &config.cache_dir,
    );
    tracing::debug!(
        "Decoded '{}' ({}x{}, {}-bit)",
        brush.name(),
        width,
        height,
        depth_bits
    );

    let native = brush.native_size();
    let mut decoded = vec![];
    let variants: Vec<Brush> = scan
        .brushes
        .smaller_than(&tag, largest.diameter)
        .into_iter()
        .map(|item| {
            let (w, h) = variant_size(native, item.diameter);
            tracing::debug!("Deriving '{}' at {}x{}", item.name, w, h);
            Brush::new(
                brush_name(item, config),
                brush.image().resample(w, h),
                &config.cache_dir,
            )
        })
        .collect();

    decoded.push(brush);
    decoded.extend(variants);

    Ok(RecordOutcome::Decoded(decoded))
}

fn brush_name(descriptor: &SampledBrushDescriptor, config: &AbrLoadConfig) -> String {
    if descriptor.name.is_empty() {
        config.default_brush_name(descriptor.index)
    } else {
        descriptor.name.clone()
    }
}
