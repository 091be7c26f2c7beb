//! ABR file parser
//!
//! Dispatches on the major version to the legacy record decoder (1, 2) or
//! the section walk plus sample decoder (6, 7, 10).
//!
//! Reference: Krita's kis_abr_brush_collection.cpp

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use super::config::AbrLoadConfig;
use super::cursor::ByteCursor;
use super::error::AbrError;
use super::legacy;
use super::samp;
use super::sections::{scan_sections, unused_data_length};
use super::types::{AbrVersion, Brush};

/// Main ABR parser
pub struct AbrParser;

impl AbrParser {
    /// Decode every brush in `source`, in file order.
    ///
    /// Malformed records are skipped; only an unsupported version or a
    /// read past the end of data fails the whole file.
    pub fn parse<R: Read + Seek>(
        source: R,
        config: &AbrLoadConfig,
    ) -> Result<Vec<Brush>, AbrError> {
        let mut cursor = ByteCursor::new(source)?;

        let major = cursor.read_i16()?;
        let version =
            AbrVersion::from_major(major).ok_or_else(|| AbrError::unsupported_major(major))?;

        let brushes = if version.is_new_format() {
            let minor = cursor.read_i16()?;
            tracing::debug!("ABR header: version={}.{}", major, minor);
            let unused_len = unused_data_length(major, minor)?;

            let scan = scan_sections(&mut cursor)?;
            samp::decode_samples(&mut cursor, &scan, unused_len, config)?
        } else {
            tracing::debug!("ABR header: version={}", major);
            legacy::decode_brushes(&mut cursor, version, config)?
        };

        tracing::info!(
            "Loaded {} brushes from ABR v{} ({})",
            brushes.len(),
            major,
            config.fallback_name
        );

        Ok(brushes)
    }

    /// Parse an ABR file from raw bytes
    pub fn parse_bytes(data: &[u8], config: &AbrLoadConfig) -> Result<Vec<Brush>, AbrError> {
        Self::parse(Cursor::new(data), config)
    }

    /// Open and parse the file at `path`. Unnamed brushes are named after
    /// the file stem.
    pub fn load_file(
        path: impl AsRef<Path>,
        cache_dir: impl Into<PathBuf>,
    ) -> Result<Vec<Brush>, AbrError> {
        let path = path.as_ref();
        let config = AbrLoadConfig::for_file(path, cache_dir);
        let file = File::open(path)?;
        Self::parse(BufReader::new(file), &config)
    }
}
