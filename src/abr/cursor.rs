//! Big-endian byte cursor
//!
//! Thin wrapper over any `Read + Seek` source with the primitive reads the
//! ABR format needs. Every read either fills its target completely or fails
//! with an I/O error; a short read is never silently accepted.

use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};

use super::error::AbrError;

pub struct ByteCursor<R> {
    inner: R,
    len: u64,
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wrap a source, measuring its total length. The cursor is left at
    /// the source's current position.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let start = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(start))?;
        Ok(Self { inner, len })
    }

    /// Total length of the source in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current absolute offset
    pub fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    /// Seek to an absolute offset
    pub fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Move forward by `count` bytes without reading them
    pub fn skip(&mut self, count: u64) -> io::Result<()> {
        let count = i64::try_from(count)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "skip length too large"))?;
        self.inner.seek(SeekFrom::Current(count))?;
        Ok(())
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        self.inner.read_u8()
    }

    pub fn read_i16(&mut self) -> io::Result<i16> {
        self.inner.read_i16::<BigEndian>()
    }

    pub fn read_u16(&mut self) -> io::Result<u16> {
        self.inner.read_u16::<BigEndian>()
    }

    pub fn read_i32(&mut self) -> io::Result<i32> {
        self.inner.read_i32::<BigEndian>()
    }

    pub fn read_u32(&mut self) -> io::Result<u32> {
        self.inner.read_u32::<BigEndian>()
    }

    pub fn read_f64(&mut self) -> io::Result<f64> {
        self.inner.read_f64::<BigEndian>()
    }

    /// Fill `buf` completely from the source
    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.inner.read_exact(buf)
    }

    /// Read a fixed 4-byte tag such as `8BIM` or `samp`
    pub fn read_tag(&mut self) -> io::Result<[u8; 4]> {
        let mut tag = [0u8; 4];
        self.inner.read_exact(&mut tag)?;
        Ok(tag)
    }

    /// Read a Pascal string: 1-byte length followed by that many bytes.
    ///
    /// The bytes are not assumed to be valid text; invalid UTF-8 is replaced
    /// rather than rejected since the value is only ever used as a lookup key.
    pub fn read_pascal_string(&mut self) -> io::Result<String> {
        let len = self.inner.read_u8()? as usize;
        let mut bytes = vec![0u8; len];
        self.inner.read_exact(&mut bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read a UCS-2 (UTF-16 BE) string prefixed with a 4-byte code unit count.
    /// A trailing NUL code unit is dropped.
    pub fn read_unicode_string(&mut self) -> Result<String, AbrError> {
        let length = self.inner.read_u32::<BigEndian>()? as usize;

        if length == 0 {
            return Ok(String::new());
        }

        let mut utf16_data = Vec::with_capacity(length.min(4096));
        for _ in 0..length {
            utf16_data.push(self.inner.read_u16::<BigEndian>()?);
        }

        if let Some(&0) = utf16_data.last() {
            utf16_data.pop();
        }

        Ok(String::from_utf16_lossy(&utf16_data))
    }

    /// Read a signed rectangle stored as top, left, bottom, right
    pub fn read_bounds(&mut self) -> io::Result<Bounds> {
        Ok(Bounds {
            top: self.read_i32()?,
            left: self.read_i32()?,
            bottom: self.read_i32()?,
            right: self.read_i32()?,
        })
    }
}

/// Integer rectangle as stored in brush records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl Bounds {
    pub fn width(&self) -> i64 {
        i64::from(self.right) - i64::from(self.left)
    }

    pub fn height(&self) -> i64 {
        i64::from(self.bottom) - i64::from(self.top)
    }

    /// Width and height when both are positive and fit in `u32`
    pub fn size(&self) -> Option<(u32, u32)> {
        let width = u32::try_from(self.width()).ok()?;
        let height = u32::try_from(self.height()).ok()?;
        if width == 0 || height == 0 {
            return None;
        }
        Some((width, height))
    }
}
