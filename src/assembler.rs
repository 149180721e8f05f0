use crate::crop::{autocrop, CropMargins};
use crate::raster::RawRaster;
use crate::{CharRange, FontModel, Glyph, RangeError};

/// `y_offset` written for glyphs without ink. Not a pixel offset.
pub const BLANK_Y_OFFSET: i8 = 1;

/// Builds a [`FontModel`] one character at a time.
///
/// Owns the running bitmap offset: every appended glyph gets the offset at
/// which its bytes start in the shared blob, then the offset advances by the
/// number of bytes the glyph contributed.
#[derive(Debug)]
pub struct GlyphAssembler {
    font: FontModel,
    next_offset: usize,
    preserve_cell_box: bool,
    left_aligned: bool,
}

impl GlyphAssembler {
    pub fn new(name: String, range: CharRange, line_advance: u8, preserve_cell_box: bool) -> Self {
        Self {
            font: FontModel {
                name,
                first: range.first(),
                last: range.last(),
                line_advance,
                glyphs: Vec::with_capacity(range.len()),
                bitmaps: Vec::with_capacity(range.len()),
            },
            next_offset: 0,
            preserve_cell_box,
            left_aligned: false,
        }
    }

    /// Cropped glyphs start at the cursor: `x_offset` is 0 and only the
    /// vertical crop shows in the offsets. FON fonts are assembled this way.
    pub fn left_aligned(mut self) -> Self {
        self.left_aligned = true;
        self
    }

    /// Byte offset the next glyph's bitmap will start at.
    pub fn next_offset(&self) -> usize {
        self.next_offset
    }

    /// Adds the glyph for `code` from its uncropped character cell.
    /// `advance` is the cell's nominal advance width.
    pub fn append(&mut self, code: u8, cell: &RawRaster, advance: u32) -> Result<&Glyph, RangeError> {
        let (mut glyph, bytes) = if self.preserve_cell_box && !cell.is_empty() {
            place_cell(code, cell, advance, self.next_offset)?
        } else {
            let (margins, cropped) = autocrop(cell, false);
            place_cropped(code, &margins, &cropped, advance, self.next_offset)?
        };
        if self.left_aligned {
            glyph.x_offset = 0;
        }
        log::debug!(
            "0x{code:02X}: {}x{} at {}, advance {}, offset ({}, {})",
            glyph.width,
            glyph.height,
            glyph.bitmap_offset,
            glyph.x_advance,
            glyph.x_offset,
            glyph.y_offset
        );

        self.next_offset += bytes.len();
        self.font.bitmaps.push(bytes);
        self.font.glyphs.push(glyph);
        Ok(&self.font.glyphs[self.font.glyphs.len() - 1])
    }

    pub fn finish(self) -> FontModel {
        self.font
    }
}

/// Glyph and bitmap bytes for a cropped raster.
///
/// Blank crops produce an empty glyph that still advances the cursor.
/// Otherwise the offsets place the cropped raster where it sat in its cell,
/// measured from the bottom left corner of the cell.
pub fn place_cropped(
    code: u8,
    margins: &CropMargins,
    cropped: &RawRaster,
    advance: u32,
    bitmap_offset: usize,
) -> Result<(Glyph, Vec<u8>), RangeError> {
    let bitmap_offset = fit(code, "bitmap offset", bitmap_offset as i64)?;
    let x_advance = fit(code, "x advance", advance as i64)?;

    if margins.is_blank() || cropped.is_empty() {
        let glyph = Glyph {
            code,
            bitmap_offset,
            width: 0,
            height: 0,
            x_advance,
            x_offset: 0,
            y_offset: BLANK_Y_OFFSET,
        };
        return Ok((glyph, Vec::new()));
    }

    let height = cropped.height() as i64;
    let glyph = Glyph {
        code,
        bitmap_offset,
        width: fit(code, "width", cropped.width() as i64)?,
        height: fit(code, "height", height)?,
        x_advance,
        x_offset: fit(code, "x offset", margins.left as i64)?,
        y_offset: fit(code, "y offset", -(margins.bottom as i64 + height))?,
    };
    Ok((glyph, cropped.to_bitstream()))
}

/// Glyph and bitmap bytes for an uncropped cell: the whole cell is the
/// bitmap and sits right above the cursor.
pub fn place_cell(
    code: u8,
    cell: &RawRaster,
    advance: u32,
    bitmap_offset: usize,
) -> Result<(Glyph, Vec<u8>), RangeError> {
    let height = cell.height() as i64;
    let glyph = Glyph {
        code,
        bitmap_offset: fit(code, "bitmap offset", bitmap_offset as i64)?,
        width: fit(code, "width", cell.width() as i64)?,
        height: fit(code, "height", height)?,
        x_advance: fit(code, "x advance", advance as i64)?,
        x_offset: 0,
        y_offset: fit(code, "y offset", -height)?,
    };
    Ok((glyph, cell.to_bitstream()))
}

fn fit<T: TryFrom<i64>>(code: u8, field: &'static str, value: i64) -> Result<T, RangeError> {
    T::try_from(value).map_err(|_| RangeError::MetricOverflow { code, field, value })
}
