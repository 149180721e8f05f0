/// Data stored for one converted font as a whole.
///
/// Mirrors the layout that gets exported as a GFX font: one [`Glyph`] per
/// character code in `first..=last`, and one bitmap slice per glyph that
/// together form the shared bitmap blob.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontModel {
    pub name: String,
    pub first: u8,
    pub last: u8,
    pub line_advance: u8,
    pub glyphs: Vec<Glyph>,
    pub bitmaps: Vec<Vec<u8>>,
}

impl FontModel {
    /// Total length of the concatenated bitmap blob in bytes.
    pub fn bitmap_len(&self) -> usize {
        self.bitmaps.iter().map(Vec::len).sum()
    }

    /// The concatenated bitmap blob.
    pub fn bitmap_blob(&self) -> Vec<u8> {
        self.bitmaps.concat()
    }

    pub fn glyph(&self, code: u8) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.code == code)
    }
}

/// Metrics of a single character, as written to the glyph table.
///
/// `x_offset`/`y_offset` are the distance from the cursor to the upper left
/// corner of the bitmap; y grows upward, so ink above the cursor has a
/// negative `y_offset`. A blank glyph has `width == height == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Glyph {
    pub code: u8,
    pub bitmap_offset: u16,
    pub width: u8,
    pub height: u8,
    pub x_advance: u8,
    pub x_offset: i8,
    pub y_offset: i8,
}

impl Glyph {
    pub fn is_blank(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// Inclusive range of 8-bit character codes to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRange {
    first: u8,
    last: u8,
}

impl CharRange {
    /// ASCII, blank to DEL.
    pub const SEVEN_BIT: CharRange = CharRange {
        first: 0x20,
        last: 0x7F,
    };
    /// ANSI, blank to 0xFF.
    pub const EIGHT_BIT: CharRange = CharRange {
        first: 0x20,
        last: 0xFF,
    };

    pub fn new(first: u32, last: u32) -> Result<Self, RangeError> {
        if first > last || last > 0xFF {
            return Err(RangeError::InvalidCharRange { first, last });
        }
        Ok(Self {
            first: first as u8,
            last: last as u8,
        })
    }

    pub fn first(&self) -> u8 {
        self.first
    }

    pub fn last(&self) -> u8 {
        self.last
    }

    pub fn len(&self) -> usize {
        (self.last - self.first) as usize + 1
    }

    /// Always `false`: `new` rejects `first > last`, so a range holds at least one code.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn codes(&self) -> std::ops::RangeInclusive<u8> {
        self.first..=self.last
    }

    /// Intersects with the codes `font_first..=font_last` a font actually holds.
    pub fn clamp_to(&self, font_first: u8, font_last: u8) -> Result<Self, RangeError> {
        let first = self.first.max(font_first);
        let last = self.last.min(font_last);
        if first > last {
            return Err(RangeError::OutsideFont {
                first: self.first,
                last: self.last,
                font_first,
                font_last,
            });
        }
        Ok(Self { first, last })
    }
}

impl Default for CharRange {
    fn default() -> Self {
        Self::EIGHT_BIT
    }
}

/// Options controlling how a font source is turned into a [`FontModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub range: CharRange,
    /// Keep every glyph at its full cell size instead of cropping it to its ink.
    pub preserve_cell_box: bool,
    /// Multiplied with the height of 'W' to get the line advance of outline fonts.
    pub line_advance_factor: f32,
    /// Which font of a multi-font container to convert.
    pub font_index: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            range: CharRange::default(),
            preserve_cell_box: false,
            line_advance_factor: 1.0,
            font_index: 0,
        }
    }
}

#[derive(Debug)]
pub enum FontError {
    Resource(std::io::Error),
    Format(FormatError),
    Range(RangeError),
    Rasterizer(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    BadStubMagic(u16),
    BadSegmentMagic(u16),
    NoFontResource,
    NotABitmapFont,
    BadAlignmentShift(u16),
    FontIndexOutOfRange { index: usize, count: usize },
    InvalidRaster { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    InvalidCharRange {
        first: u32,
        last: u32,
    },
    OutsideFont {
        first: u8,
        last: u8,
        font_first: u8,
        font_last: u8,
    },
    MetricOverflow {
        code: u8,
        field: &'static str,
        value: i64,
    },
}

impl std::fmt::Display for FontError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontError::Resource(err) => write!(f, "IO error: {err}"),
            FontError::Format(err) => write!(f, "Invalid font file: {err}"),
            FontError::Range(err) => write!(f, "Range error: {err}"),
            FontError::Rasterizer(message) => write!(f, "Rasterizer error: {message}"),
        }
    }
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::BadStubMagic(magic) => {
                write!(f, "MZ magic mismatch (found 0x{magic:04X})")
            }
            FormatError::BadSegmentMagic(magic) => {
                write!(f, "NE magic mismatch (found 0x{magic:04X})")
            }
            FormatError::NoFontResource => write!(f, "no FNT resources found"),
            FormatError::NotABitmapFont => write!(f, "not a bitmap font"),
            FormatError::BadAlignmentShift(shift) => {
                write!(f, "resource alignment shift {shift} out of range")
            }
            FormatError::FontIndexOutOfRange { index, count } => {
                write!(f, "font index {index} out of range, file holds {count} font(s)")
            }
            FormatError::InvalidRaster { expected, actual } => {
                write!(f, "raster needs {expected} bytes, got {actual}")
            }
        }
    }
}

impl std::fmt::Display for RangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeError::InvalidCharRange { first, last } => {
                write!(
                    f,
                    "invalid character range 0x{first:02X}-0x{last:02X} (must be ascending and within 0x00-0xFF)"
                )
            }
            RangeError::OutsideFont {
                first,
                last,
                font_first,
                font_last,
            } => write!(
                f,
                "character range 0x{first:02X}-0x{last:02X} does not overlap the font's range 0x{font_first:02X}-0x{font_last:02X}"
            ),
            RangeError::MetricOverflow { code, field, value } => {
                write!(f, "{field} of character 0x{code:02X} out of range: {value}")
            }
        }
    }
}

impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontError::Resource(err) => Some(err),
            FontError::Format(err) => Some(err),
            FontError::Range(err) => Some(err),
            FontError::Rasterizer(_) => None,
        }
    }
}

impl std::error::Error for FormatError {}

impl std::error::Error for RangeError {}

impl From<std::io::Error> for FontError {
    fn from(err: std::io::Error) -> Self {
        FontError::Resource(err)
    }
}

impl From<FormatError> for FontError {
    fn from(err: FormatError) -> Self {
        FontError::Format(err)
    }
}

impl From<RangeError> for FontError {
    fn from(err: RangeError) -> Self {
        FontError::Range(err)
    }
}
