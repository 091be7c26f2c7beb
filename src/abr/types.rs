//! ABR data types
//!
//! Type definitions for decoded ABR brush data.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Long edge of the thumbnail every brush carries
pub const THUMBNAIL_SIZE: u32 = 32;

/// ABR file format version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbrVersion {
    /// Very old format (Photoshop 4)
    V1,
    /// Old format (Photoshop 5-6)
    V2,
    /// New format (Photoshop 7+)
    V6,
    /// New format variant, used for brushes holding 16-bit data
    V7,
    /// Latest format (Creative Cloud)
    V10,
}

impl AbrVersion {
    pub fn from_major(major: i16) -> Option<Self> {
        match major {
            1 => Some(AbrVersion::V1),
            2 => Some(AbrVersion::V2),
            6 => Some(AbrVersion::V6),
            7 => Some(AbrVersion::V7),
            10 => Some(AbrVersion::V10),
            _ => None,
        }
    }

    pub fn major(&self) -> i16 {
        match self {
            AbrVersion::V1 => 1,
            AbrVersion::V2 => 2,
            AbrVersion::V6 => 6,
            AbrVersion::V7 => 7,
            AbrVersion::V10 => 10,
        }
    }

    /// Check if this is a "new" format (V6+)
    pub fn is_new_format(&self) -> bool {
        matches!(self, AbrVersion::V6 | AbrVersion::V7 | AbrVersion::V10)
    }
}

/// 8-bit alpha raster (0 = transparent, 255 = opaque)
///
/// Row-major with a stride equal to the width. The data length always
/// matches `width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl AlphaImage {
    /// Wrap raw alpha bytes, returning `None` if the length doesn't match
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = (width as usize).checked_mul(height as usize)?;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// Buffers built by the decoders are sized exactly; a mismatch pads or
    /// truncates rather than failing.
    pub(crate) fn from_decoded(width: u32, height: u32, mut data: Vec<u8>) -> Self {
        data.resize(width as usize * height as usize, 0);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Get pixel value at coordinates
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            self.data.get(idx).copied()
        } else {
            None
        }
    }

    /// Borrow one row
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.width as usize;
        let start = y as usize * stride;
        self.data.get(start..start + stride)
    }

    /// Resample to an exact size.
    ///
    /// Enlarging uses Catmull-Rom (bicubic). Shrinking uses Lanczos3, whose
    /// support `image` widens by the scale ratio so every source pixel is
    /// accounted for.
    pub fn resample(&self, width: u32, height: u32) -> AlphaImage {
        let width = width.max(1);
        let height = height.max(1);

        if width == self.width && height == self.height {
            return self.clone();
        }

        if self.width == 0 || self.height == 0 {
            return AlphaImage {
                width,
                height,
                data: vec![0; width as usize * height as usize],
            };
        }

        let filter = if width > self.width || height > self.height {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        };

        let resized = imageops::resize(&self.as_gray(), width, height, filter);
        AlphaImage {
            width,
            height,
            data: resized.into_raw(),
        }
    }

    /// View as an `image` grayscale buffer where luma holds the alpha
    pub fn as_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([self.data[y as usize * self.width as usize + x as usize]])
        })
    }

    /// Expand to RGBA with black color channels and this alpha
    pub fn to_rgba(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            Rgba([0, 0, 0, self.data[y as usize * self.width as usize + x as usize]])
        })
    }
}

/// A decoded brush tip
///
/// Equality compares names only, so a collection can detect duplicates
/// regardless of pixel content.
#[derive(Debug, Clone)]
pub struct Brush {
    name: String,
    image: AlphaImage,
    thumbnail: AlphaImage,
    cache_dir: PathBuf,
}

impl Brush {
    pub fn new(name: impl Into<String>, image: AlphaImage, cache_dir: &Path) -> Self {
        let thumbnail = fit_long_edge(&image, THUMBNAIL_SIZE);
        Self {
            name: name.into(),
            image,
            thumbnail,
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the stored tip in pixels
    pub fn native_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Display label such as `(64x48)`
    pub fn native_size_label(&self) -> String {
        format!("({}x{})", self.image.width, self.image.height)
    }

    pub fn image(&self) -> &AlphaImage {
        &self.image
    }

    pub fn into_image(self) -> AlphaImage {
        self.image
    }

    /// 32px long-edge preview
    pub fn thumbnail(&self) -> &AlphaImage {
        &self.thumbnail
    }

    /// Directory the host may use to back this brush's pixels on disk
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Tip resampled so its long edge equals `max_side`, keeping aspect
    pub fn surface(&self, max_side: u32) -> AlphaImage {
        fit_long_edge(&self.image, max_side)
    }

    /// Tip resampled to an exact size
    pub fn surface_sized(&self, width: u32, height: u32) -> AlphaImage {
        self.image.resample(width, height)
    }

    pub fn summary(&self) -> BrushSummary {
        BrushSummary {
            name: self.name.clone(),
            width: self.image.width,
            height: self.image.height,
        }
    }
}

impl PartialEq for Brush {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Brush {}

fn fit_long_edge(image: &AlphaImage, max_side: u32) -> AlphaImage {
    let max_side = u64::from(max_side.max(1));
    let (w, h) = (u64::from(image.width), u64::from(image.height));

    let (tw, th) = if w > h {
        (max_side, ((max_side * h) / w).max(1))
    } else {
        (((max_side * w) / h.max(1)).max(1), max_side)
    };

    image.resample(tw as u32, th as u32)
}

/// Brush listing entry for hosts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrushSummary {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> AlphaImage {
        let data = (0..width * height).map(|i| (i % 256) as u8).collect();
        AlphaImage::from_raw(width, height, data).unwrap()
    }

    #[test]
    fn test_version_round_trip() {
        for major in [1, 2, 6, 7, 10] {
            let v = AbrVersion::from_major(major).unwrap();
            assert_eq!(v.major(), major);
            assert_eq!(v.is_new_format(), major >= 6);
        }
        assert!(AbrVersion::from_major(3).is_none());
        assert!(AbrVersion::from_major(-1).is_none());
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(AlphaImage::from_raw(2, 2, vec![0; 4]).is_some());
        assert!(AlphaImage::from_raw(2, 2, vec![0; 3]).is_none());
    }

    #[test]
    fn test_row_access() {
        let img = gradient(3, 2);
        assert_eq!(img.row(0).unwrap(), &[0, 1, 2]);
        assert_eq!(img.row(1).unwrap(), &[3, 4, 5]);
        assert!(img.row(2).is_none());
        assert_eq!(img.get_pixel(2, 1), Some(5));
        assert_eq!(img.get_pixel(3, 0), None);
    }

    #[test]
    fn test_resample_sizes() {
        let img = gradient(40, 20);
        assert_eq!(img.resample(10, 5).dimensions(), (10, 5));
        assert_eq!(img.resample(80, 40).dimensions(), (80, 40));
        assert_eq!(img.resample(0, 0).dimensions(), (1, 1));
        assert_eq!(img.resample(40, 20), img);
    }

    #[test]
    fn test_resample_keeps_solid_alpha() {
        let img = AlphaImage::from_raw(8, 8, vec![200; 64]).unwrap();
        let small = img.resample(4, 4);
        assert!(small.data().iter().all(|&a| (i16::from(a) - 200).abs() <= 1));
    }

    #[test]
    fn test_rgba_has_black_color() {
        let img = gradient(2, 2);
        let rgba = img.to_rgba();
        assert_eq!(rgba.get_pixel(1, 1).0, [0, 0, 0, 3]);
    }

    #[test]
    fn test_brush_thumbnail_and_surface() {
        let brush = Brush::new("wide", gradient(64, 16), Path::new("/tmp/cache"));
        assert_eq!(brush.native_size(), (64, 16));
        assert_eq!(brush.native_size_label(), "(64x16)");
        assert_eq!(brush.thumbnail().dimensions(), (32, 8));
        assert_eq!(brush.surface(16).dimensions(), (16, 4));
        assert_eq!(brush.surface(128).dimensions(), (128, 32));
        assert_eq!(brush.surface_sized(5, 7).dimensions(), (5, 7));
        assert_eq!(brush.cache_dir(), Path::new("/tmp/cache"));
    }

    #[test]
    fn test_brush_equality_by_name() {
        let a = Brush::new("tip", gradient(4, 4), Path::new("a"));
        let b = Brush::new("tip", gradient(8, 2), Path::new("b"));
        let c = Brush::new("other", gradient(4, 4), Path::new("a"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let brush = Brush::new("tip", gradient(3, 2), Path::new("."));
        let json = serde_json::to_string(&brush.summary()).unwrap();
        assert_eq!(json, r#"{"name":"tip","width":3,"height":2}"#);
    }
}
