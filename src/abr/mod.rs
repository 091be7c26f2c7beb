//! ABR (Adobe Brush) file parser
//!
//! This module decodes Photoshop ABR brush files into 8-bit alpha brush
//! tips. Computed (parametric) brushes and brush dynamics are not decoded.
//!
//! # Supported Versions
//!
//! - V1/V2: Old format (Photoshop 4-6), a flat list of brush records
//! - V6/V7/V10: Modern format (Photoshop 7+), `8BIM` sections where a
//!   `desc` descriptor names the brushes and `samp` holds their bitmaps
//!
//! # Example
//!
//! ```ignore
//! use sutu_abr::abr::AbrParser;
//!
//! let brushes = AbrParser::load_file("Dry Media.abr", "/tmp/brush-cache")?;
//!
//! for brush in &brushes {
//!     println!("Brush: {} {}", brush.name(), brush.native_size_label());
//! }
//! ```

mod config;
pub mod cursor;
pub mod depth;
pub mod descriptor;
pub mod error;
mod legacy;
mod parser;
pub mod rle;
mod samp;
mod sections;
mod tip;
mod types;

pub use config::{AbrLoadConfig, DecodeLimits};
pub use cursor::{Bounds, ByteCursor};
pub use depth::EightBitTable;
pub use error::AbrError;
pub use parser::AbrParser;
pub use sections::{normalize_tag, SampledBrushDescriptor, SampledBrushes};
pub use tip::{variant_size, Compression, RecordOutcome, SampleDepth, SkipReason};
pub use types::{AbrVersion, AlphaImage, Brush, BrushSummary, THUMBNAIL_SIZE};
