//! Section walk for version 6+ files
//!
//! After the 4-byte header a modern ABR file is a list of `8BIM` blocks:
//! signature, 4-byte type tag, 4-byte length, payload padded to 4 bytes.
//! Two of them matter here:
//!
//! - `desc`: an action descriptor whose `Brsh` list names every brush and,
//!   for sampled brushes, the tag key of its bitmap and its diameter
//! - `samp`: the bitmaps themselves, decoded later by the sample decoder

use std::io::{Cursor, Read, Seek};

use super::cursor::ByteCursor;
use super::descriptor::{parse_descriptor, Descriptor, DescriptorValue};
use super::error::AbrError;

const SIGNATURE: &[u8; 4] = b"8BIM";
const SAMPLE_SECTION: &[u8; 4] = b"samp";
const DESCRIPTOR_SECTION: &[u8; 4] = b"desc";

/// Bytes between a sample's tag key and its bounds rectangle
pub fn unused_data_length(major: i16, minor: i16) -> Result<u64, AbrError> {
    match minor {
        // Int16 bounds rectangle and an unknown Int16
        1 => Ok(10),
        2 => Ok(264),
        _ => Err(AbrError::unsupported_minor(major, minor)),
    }
}

/// A sampled brush as named by the descriptor section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledBrushDescriptor {
    pub name: String,
    /// Key of the bitmap in the sample section
    pub tag: String,
    pub diameter: i32,
    /// Position in the descriptor list
    pub index: usize,
}

/// All sampled-brush descriptors of a file, in file order
#[derive(Debug, Clone, Default)]
pub struct SampledBrushes {
    items: Vec<SampledBrushDescriptor>,
}

impl SampledBrushes {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampledBrushDescriptor> {
        self.items.iter()
    }

    pub fn push(&mut self, descriptor: SampledBrushDescriptor) {
        self.items.push(descriptor);
    }

    /// Descriptor with the greatest diameter for `tag`; the earliest wins ties
    pub fn find_largest(&self, tag: &str) -> Option<&SampledBrushDescriptor> {
        let tag = normalize_tag(tag);
        self.items
            .iter()
            .filter(|d| d.tag == tag)
            .fold(None, |best: Option<&SampledBrushDescriptor>, d| match best {
                Some(b) if b.diameter >= d.diameter => Some(b),
                _ => Some(d),
            })
    }

    /// Descriptors for `tag` smaller than `diameter`, largest first
    pub fn smaller_than(&self, tag: &str, diameter: i32) -> Vec<&SampledBrushDescriptor> {
        let tag = normalize_tag(tag);
        let mut smaller: Vec<_> = self
            .items
            .iter()
            .filter(|d| d.tag == tag && d.diameter < diameter)
            .collect();
        smaller.sort_by(|a, b| b.diameter.cmp(&a.diameter));
        smaller
    }
}

/// Result of walking the section list
#[derive(Debug, Clone, Default)]
pub struct SectionScan {
    pub brushes: SampledBrushes,
    /// Offset of the sample section's length field
    pub sample_section_offset: Option<u64>,
}

/// Tag keys appear with and without a leading `$` and NUL padding
pub fn normalize_tag(tag: &str) -> &str {
    let tag = tag.trim_end_matches('\0');
    tag.strip_prefix('$').unwrap_or(tag)
}

/// Walk the `8BIM` sections from the current position to the end of data
pub fn scan_sections<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<SectionScan, AbrError> {
    let mut scan = SectionScan::default();
    let data_len = cursor.len();

    loop {
        let pos = cursor.position()?;
        if pos + 12 > data_len {
            break;
        }

        let signature = cursor.read_tag()?;
        if &signature != SIGNATURE {
            tracing::warn!("Section walk stopped at offset {}: no 8BIM signature", pos);
            break;
        }

        let tag = cursor.read_tag()?;
        let length_offset = cursor.position()?;
        let length = u64::from(cursor.read_u32()?);
        let section_end = length_offset + 4 + ((length + 3) & !3);

        tracing::debug!(
            "Section '{}' at {}: {} bytes",
            String::from_utf8_lossy(&tag),
            pos,
            length
        );

        match &tag {
            SAMPLE_SECTION => {
                if scan.sample_section_offset.is_none() {
                    scan.sample_section_offset = Some(length_offset);
                }
            }
            DESCRIPTOR_SECTION => read_descriptor_section(cursor, length, &mut scan.brushes)?,
            _ => {}
        }

        cursor.seek_to(section_end)?;
    }

    Ok(scan)
}

fn read_descriptor_section<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    length: u64,
    brushes: &mut SampledBrushes,
) -> Result<(), AbrError> {
    let remaining = cursor.len().saturating_sub(cursor.position()?);
    if length > remaining {
        tracing::warn!(
            "Descriptor section claims {} bytes, only {} remain",
            length,
            remaining
        );
        return Ok(());
    }

    let mut payload = vec![0u8; length as usize];
    cursor.read_exact(&mut payload)?;

    let mut section = ByteCursor::new(Cursor::new(payload.as_slice()))?;
    match parse_descriptor(&mut section) {
        Ok(root) => collect_sampled_brushes(&root, brushes),
        Err(e) => tracing::warn!("Failed to parse desc section: {}", e),
    }

    Ok(())
}

fn collect_sampled_brushes(root: &Descriptor, brushes: &mut SampledBrushes) {
    let Some(list) = root.get_list("Brsh") else {
        tracing::warn!("Descriptor section has no brush list");
        return;
    };

    for (index, item) in list.iter().enumerate() {
        let DescriptorValue::Descriptor(entry) = item else {
            continue;
        };

        let Some(tip) = entry.get_descriptor("Brsh") else {
            continue;
        };

        // Computed brushes have no sampledData
        let Some(tag) = tip
            .get_string("sampledData")
            .or_else(|| find_sampled_data(entry))
        else {
            tracing::debug!("Brush #{} is not sampled, skipping", index);
            continue;
        };

        let name = entry
            .get_string("Nm  ")
            .unwrap_or_default()
            .trim_end_matches('\0')
            .to_string();
        let diameter = tip.get_number("Dmtr").unwrap_or(0.0).round() as i32;

        brushes.push(SampledBrushDescriptor {
            name,
            tag: normalize_tag(tag).to_string(),
            diameter,
            index,
        });
    }

    tracing::debug!("Found {} sampled brush descriptors", brushes.len());
}

/// Search nested objects for a `sampledData` key
fn find_sampled_data(desc: &Descriptor) -> Option<&str> {
    if let Some(tag) = desc.get_string("sampledData") {
        return Some(tag);
    }
    desc.items.values().find_map(find_in_value)
}

fn find_in_value(value: &DescriptorValue) -> Option<&str> {
    match value {
        DescriptorValue::Descriptor(d) => find_sampled_data(d),
        DescriptorValue::List(l) => l.iter().find_map(find_in_value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::descriptor::testing::*;
    use super::*;

    fn descriptor(name: &str, tag: &str, diameter: i32, index: usize) -> SampledBrushDescriptor {
        SampledBrushDescriptor {
            name: name.into(),
            tag: tag.into(),
            diameter,
            index,
        }
    }

    fn section(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = b"8BIM".to_vec();
        out.extend_from_slice(tag);
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out
    }

    fn scan(data: &[u8]) -> SectionScan {
        let mut cursor = ByteCursor::new(std::io::Cursor::new(data)).unwrap();
        scan_sections(&mut cursor).unwrap()
    }

    #[test]
    fn test_unused_lengths() {
        assert_eq!(unused_data_length(6, 1).unwrap(), 10);
        assert_eq!(unused_data_length(10, 2).unwrap(), 264);
        assert!(matches!(
            unused_data_length(7, 9),
            Err(AbrError::UnsupportedVersion {
                major: 7,
                minor: Some(9)
            })
        ));
    }

    #[test]
    fn test_largest_and_variants() {
        let mut brushes = SampledBrushes::default();
        brushes.push(descriptor("small", "a", 25, 0));
        brushes.push(descriptor("big", "a", 100, 1));
        brushes.push(descriptor("other", "b", 300, 2));
        brushes.push(descriptor("mid", "a", 50, 3));

        assert_eq!(brushes.find_largest("a").unwrap().name, "big");
        assert_eq!(brushes.find_largest("$a").unwrap().name, "big");
        assert!(brushes.find_largest("c").is_none());

        let names: Vec<_> = brushes
            .smaller_than("a", 100)
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["mid", "small"]);
    }

    #[test]
    fn test_largest_tie_keeps_first() {
        let mut brushes = SampledBrushes::default();
        brushes.push(descriptor("first", "a", 40, 0));
        brushes.push(descriptor("second", "a", 40, 1));
        assert_eq!(brushes.find_largest("a").unwrap().name, "first");
        assert!(brushes.smaller_than("a", 40).is_empty());
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("$uuid\0"), "uuid");
        assert_eq!(normalize_tag("uuid"), "uuid");
    }

    #[test]
    fn test_scan_records_sample_offset_and_descriptors() {
        let mut desc = 16u32.to_be_bytes().to_vec();
        object(&mut desc, "null", 1);
        key(&mut desc, "Brsh");
        desc.extend_from_slice(b"VlLs");
        desc.extend_from_slice(&2u32.to_be_bytes());
        // Computed entry
        desc.extend_from_slice(b"Objc");
        object(&mut desc, "brushPreset", 2);
        text_item(&mut desc, "Nm  ", "Round");
        key(&mut desc, "Brsh");
        desc.extend_from_slice(b"Objc");
        object(&mut desc, "computedBrush", 1);
        pixels_item(&mut desc, "Dmtr", 9.0);
        // Sampled entry
        desc.extend_from_slice(b"Objc");
        object(&mut desc, "brushPreset", 2);
        text_item(&mut desc, "Nm  ", "Leaf");
        key(&mut desc, "Brsh");
        desc.extend_from_slice(b"Objc");
        object(&mut desc, "sampledBrush", 2);
        pixels_item(&mut desc, "Dmtr", 44.6);
        text_item(&mut desc, "sampledData", "$leaf");

        let mut data = section(b"samp", &[0, 0, 0, 0, 1]);
        let samp_len_offset = 8u64;
        data.extend(section(b"patt", &[9; 6]));
        data.extend(section(b"desc", &desc));

        let result = scan(&data);
        assert_eq!(result.sample_section_offset, Some(samp_len_offset));
        let found: Vec<_> = result.brushes.iter().cloned().collect();
        assert_eq!(found, vec![descriptor("Leaf", "leaf", 45, 1)]);
    }

    #[test]
    fn test_scan_stops_without_signature() {
        let mut data = section(b"patt", &[]);
        data.extend_from_slice(b"XXXXsamp\0\0\0\0");
        let result = scan(&data);
        assert!(result.sample_section_offset.is_none());
        assert!(result.brushes.is_empty());
    }

    #[test]
    fn test_malformed_descriptor_is_ignored() {
        let mut data = section(b"desc", &[0, 0, 0, 3, 1, 2]);
        data.extend(section(b"samp", &[0; 4]));
        let result = scan(&data);
        assert!(result.brushes.is_empty());
        assert!(result.sample_section_offset.is_some());
    }
}
