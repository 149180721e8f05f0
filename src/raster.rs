use crate::FormatError;

/// Bytes per packed row of `width` pixels.
pub(crate) fn stride_for(width: usize) -> usize {
    (width + 7) / 8
}

/// Packed 1-bit monochrome raster.
///
/// Rows are packed MSB→LSB with `stride` = ceil(width / 8) bytes per row, so
/// the buffer always holds `stride * height` bytes. A set bit is ink unless a
/// caller says otherwise (see [`crate::autocrop`]). Padding bits past `width`
/// carry no pixel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RawRaster {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RawRaster {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, FormatError> {
        let expected = stride_for(width) * height;
        if data.len() != expected {
            return Err(FormatError::InvalidRaster {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub(crate) fn from_parts(width: usize, height: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), stride_for(width) * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// An all-background raster of the given size.
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; stride_for(width) * height],
        }
    }

    /// Builds a raster by asking `pixel(x, y)` for every position.
    pub fn from_fn(width: usize, height: usize, mut pixel: impl FnMut(usize, usize) -> bool) -> Self {
        let stride = stride_for(width);
        let mut data = vec![0u8; stride * height];
        for y in 0..height {
            for x in 0..width {
                if pixel(x, y) {
                    data[y * stride + x / 8] |= 0x80 >> (x % 8);
                }
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Builds a raster from rows of pixels, e.g. parsed ASCII art.
    /// The width is the longest row; short rows are padded with background.
    pub fn from_rows(rows: &[Vec<bool>]) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self::from_fn(width, rows.len(), |x, y| {
            rows[y].get(x).copied().unwrap_or(false)
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        stride_for(self.width)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.stride();
        &self.data[y * stride..(y + 1) * stride]
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        let byte = self.data[y * self.stride() + x / 8];
        byte & (0x80 >> (x % 8)) != 0
    }

    /// The pixels as one continuous MSB-first bitstream, rows not padded to
    /// byte boundaries. This is the per-glyph layout of a GFX bitmap blob.
    pub fn to_bitstream(&self) -> Vec<u8> {
        let bits = self.width * self.height;
        let mut bytes = vec![0u8; (bits + 7) / 8];
        let mut i = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.pixel(x, y) {
                    bytes[i / 8] |= 0x80 >> (i % 8);
                }
                i += 1;
            }
        }
        bytes
    }
}

impl std::fmt::Display for RawRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return writeln!(f, "(empty raster)");
        }

        for y in 0..self.height {
            for x in 0..self.width {
                write!(f, "{}", if self.pixel(x, y) { "*" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
