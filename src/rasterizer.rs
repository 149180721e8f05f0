use crate::assembler::GlyphAssembler;
use crate::raster::RawRaster;
use crate::utils::sanitize_name;
use crate::{CharRange, ConvertOptions, FontError, FontModel, RangeError};

/// Size of a rendered character cell in pixels, padding included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Renders single characters of an outline font into monochrome cells.
///
/// `render` returns the whole character cell (as large as `measure` says)
/// with set bits for ink; cropping happens afterwards. An empty raster
/// means the character should be treated as a blank.
pub trait Rasterizer {
    /// Family name used to derive the descriptor name.
    fn family_name(&self) -> String;

    fn point_size(&self) -> f32;

    fn measure(&mut self, c: char) -> Result<Size, FontError>;

    fn render(&mut self, c: char) -> Result<RawRaster, FontError>;
}

/// Style requested for an outline font. Combine names with `+`,
/// e.g. `Bold+Italic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
}

impl FontStyle {
    pub fn is_regular(&self) -> bool {
        *self == FontStyle::default()
    }
}

impl std::str::FromStr for FontStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut style = FontStyle::default();
        for name in s.split('+').map(str::trim).filter(|n| !n.is_empty()) {
            match name.to_ascii_lowercase().as_str() {
                "regular" => {}
                "bold" => style.bold = true,
                "italic" => style.italic = true,
                "underline" => style.underline = true,
                "strikeout" => style.strikeout = true,
                _ => return Err(format!("Unknown font style '{name}'")),
            }
        }
        Ok(style)
    }
}

/// Descriptor name of an outline font, e.g. `DejaVu_Sans9pt7b`.
pub fn outline_font_name(family: &str, point_size: f32, range: CharRange) -> String {
    let bits = if range.last() - range.first() > 127 {
        "8b"
    } else {
        "7b"
    };
    sanitize_name(&format!("{family}{}pt{bits}", point_size as i32))
}

/// Renders `c`, falling back to a blank when the rasterizer has nothing for it.
pub fn render_cell<Z: Rasterizer + ?Sized>(rasterizer: &mut Z, c: char) -> Result<RawRaster, FontError> {
    if !rasterizer.measure(c)?.is_empty() {
        let cell = rasterizer.render(c)?;
        if !cell.is_empty() {
            return Ok(cell);
        }
    }
    log::debug!("U+{:04X} has no cell, rendering a blank instead", c as u32);
    rasterizer.render(' ')
}

/// Line advance: the height of 'W' times `factor`, at most one pixel more
/// than that height. Fractions are cut off.
pub fn line_advance<Z: Rasterizer + ?Sized>(rasterizer: &mut Z, factor: f32) -> Result<u8, FontError> {
    let height = rasterizer.measure('W')?.height as f32;
    let advance = (height * factor).min(height + 1.0) as i64;
    u8::try_from(advance).map_err(|_| {
        FontError::Range(RangeError::MetricOverflow {
            code: b'W',
            field: "line advance",
            value: advance,
        })
    })
}

/// Converts every character of `options.range` rendered by `rasterizer`.
pub(crate) fn convert<Z: Rasterizer + ?Sized>(
    rasterizer: &mut Z,
    options: &ConvertOptions,
) -> Result<FontModel, FontError> {
    let range = options.range;
    let name = outline_font_name(&rasterizer.family_name(), rasterizer.point_size(), range);
    let line_advance = line_advance(rasterizer, options.line_advance_factor)?;

    let mut assembler = GlyphAssembler::new(name, range, line_advance, options.preserve_cell_box);
    for code in range.codes() {
        let cell = render_cell(rasterizer, char::from(code))?;
        assembler.append(code, &cell, cell.width() as u32)?;
    }

    let model = assembler.finish();
    log::info!(
        "converted '{}' ({} glyphs, {} bitmap bytes)",
        model.name,
        model.glyphs.len(),
        model.bitmap_len()
    );
    Ok(model)
}
