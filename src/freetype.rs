//! [`Rasterizer`] backed by FreeType, for TrueType/OpenType and the other
//! outline formats FreeType reads.

use ::freetype::face::{LoadFlag, StyleFlag};
use ::freetype::{Face, Library};
use std::path::{Path, PathBuf};

use crate::raster::RawRaster;
use crate::rasterizer::{FontStyle, Rasterizer, Size};
use crate::FontError;

/// Resolution used when none is given.
pub const DEFAULT_DPI: u32 = 96;

const FONT_EXTENSIONS: [&str; 4] = ["ttf", "otf", "ttc", "otc"];

/// Converts a 26.6 fixed-point value to whole pixels.
fn convert_metric(value: i64) -> i32 {
    (value >> 6) as i32
}

fn ft_error(context: &str, err: ::freetype::Error) -> FontError {
    FontError::Rasterizer(format!("{context}: {err}"))
}

/// Rendered glyph as FreeType placed it relative to the pen position.
struct Rendered {
    advance: usize,
    left: i32,
    top: i32,
    width: usize,
    rows: usize,
    pitch: usize,
    buffer: Vec<u8>,
}

impl Rendered {
    fn pixel(&self, x: usize, y: usize) -> bool {
        let byte_index = y * self.pitch + (x / 8);
        let bit_index = 7 - (x % 8); // MSB first
        self.buffer
            .get(byte_index)
            .map_or(false, |byte| (byte >> bit_index) & 1 == 1)
    }
}

pub struct FreetypeRasterizer {
    _library: Library,
    face: Face,
    family: String,
    point_size: f32,
    style: FontStyle,
    ascent: i32,
    descent: i32,
}

impl FreetypeRasterizer {
    /// Loads the first face of the font file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P, point_size: f32, dpi: u32, style: FontStyle) -> Result<Self, FontError> {
        let path = path.as_ref();
        let library = Library::init().map_err(|err| ft_error("FreeType init failed", err))?;
        let face = library
            .new_face(path, 0)
            .map_err(|err| ft_error(&format!("cannot load '{}'", path.display()), err))?;

        let flags = face.style_flags();
        if style.bold && !flags.contains(StyleFlag::BOLD) {
            log::warn!("'{}' is not a bold face; rendering it as is", path.display());
        }
        if style.italic && !flags.contains(StyleFlag::ITALIC) {
            log::warn!("'{}' is not an italic face; rendering it as is", path.display());
        }

        let family = face.family_name().unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Font".to_string())
        });
        Self::with_face(library, face, family, point_size, dpi, style)
    }

    /// Looks up an installed font by family name in the platform font
    /// directories, preferring the face whose bold/italic flags match `style`.
    pub fn from_family(family: &str, point_size: f32, dpi: u32, style: FontStyle) -> Result<Self, FontError> {
        let library = Library::init().map_err(|err| ft_error("FreeType init failed", err))?;

        let mut candidates = Vec::new();
        for dir in font_directories() {
            collect_font_files(&dir, &mut candidates);
        }
        candidates.sort();

        let mut fallback = None;
        for path in candidates {
            let Ok(face) = library.new_face(&path, 0) else {
                continue;
            };
            match face.family_name() {
                Some(name) if name.eq_ignore_ascii_case(family) => {}
                _ => continue,
            }
            let flags = face.style_flags();
            if flags.contains(StyleFlag::BOLD) == style.bold && flags.contains(StyleFlag::ITALIC) == style.italic {
                log::debug!("using '{}' for family '{family}'", path.display());
                return Self::with_face(library, face, family.to_string(), point_size, dpi, style);
            }
            if fallback.is_none() {
                fallback = Some(path);
            }
        }

        match fallback {
            Some(path) => {
                log::warn!(
                    "no face of '{family}' matches the requested style; using '{}'",
                    path.display()
                );
                let face = library
                    .new_face(&path, 0)
                    .map_err(|err| ft_error(&format!("cannot load '{}'", path.display()), err))?;
                Self::with_face(library, face, family.to_string(), point_size, dpi, style)
            }
            None => Err(FontError::Rasterizer(format!("font family '{family}' is not installed"))),
        }
    }

    fn with_face(
        library: Library,
        face: Face,
        family: String,
        point_size: f32,
        dpi: u32,
        style: FontStyle,
    ) -> Result<Self, FontError> {
        face.set_char_size(0, (point_size * 64.0) as isize, dpi, dpi)
            .map_err(|err| ft_error("cannot set character size", err))?;
        let (ascent, descent) = match face.size_metrics() {
            Some(metrics) => (
                convert_metric(metrics.ascender as i64),
                -convert_metric(metrics.descender as i64),
            ),
            None => return Err(FontError::Rasterizer(format!("'{family}' has no size metrics"))),
        };
        log::debug!("{family} {point_size}pt at {dpi} dpi: ascent {ascent}, descent {descent}");

        Ok(Self {
            _library: library,
            face,
            family,
            point_size,
            style,
            ascent,
            descent,
        })
    }

    fn cell_height(&self) -> usize {
        (self.ascent + self.descent).max(0) as usize
    }

    /// Loads and renders `c`; `None` when the font has no glyph for it.
    fn load(&mut self, c: char) -> Result<Option<Rendered>, FontError> {
        if self.face.get_char_index(c as usize).is_none() {
            return Ok(None);
        }
        self.face
            .load_char(c as usize, LoadFlag::RENDER | LoadFlag::TARGET_MONO)
            .map_err(|err| ft_error(&format!("cannot render U+{:04X}", c as u32), err))?;

        let glyph = self.face.glyph();
        let bitmap = glyph.bitmap();
        Ok(Some(Rendered {
            advance: convert_metric(glyph.advance().x as i64).max(0) as usize,
            left: glyph.bitmap_left(),
            top: glyph.bitmap_top(),
            width: bitmap.width().max(0) as usize,
            rows: bitmap.rows().max(0) as usize,
            pitch: bitmap.pitch().unsigned_abs() as usize,
            buffer: bitmap.buffer().to_vec(),
        }))
    }

    /// Converts a vertical distance in font units to pixels.
    fn font_units_to_pixels(&self, value: i64) -> i32 {
        let units_per_em = self.face.raw().units_per_EM as i64;
        let ppem = self.face.size_metrics().map_or(0, |metrics| metrics.y_ppem as i64);
        if units_per_em == 0 {
            return 0;
        }
        (value * ppem / units_per_em) as i32
    }

    /// Rows of the cell covered by underline and strikeout, if requested.
    fn decoration_rows(&self) -> Vec<usize> {
        let mut rows = Vec::new();
        let height = self.cell_height() as i32;
        let thickness = self.font_units_to_pixels(self.face.raw().underline_thickness as i64).max(1);
        if self.style.underline {
            let position = self.font_units_to_pixels(self.face.raw().underline_position as i64);
            let top = self.ascent - position;
            rows.extend((top..top + thickness).filter(|&y| y >= 0 && y < height).map(|y| y as usize));
        }
        if self.style.strikeout {
            let top = self.ascent - self.ascent / 3;
            rows.extend((top..top + thickness).filter(|&y| y >= 0 && y < height).map(|y| y as usize));
        }
        rows
    }
}

impl Rasterizer for FreetypeRasterizer {
    fn family_name(&self) -> String {
        self.family.clone()
    }

    fn point_size(&self) -> f32 {
        self.point_size
    }

    fn measure(&mut self, c: char) -> Result<Size, FontError> {
        Ok(match self.load(c)? {
            Some(rendered) => Size {
                width: rendered.advance,
                height: self.cell_height(),
            },
            None => Size::default(),
        })
    }

    /// The cell is one advance wide and ascent + descent high, with the
    /// baseline `ascent` rows from the top. Ink outside the cell is clipped.
    fn render(&mut self, c: char) -> Result<RawRaster, FontError> {
        let Some(rendered) = self.load(c)? else {
            return Ok(RawRaster::default());
        };
        let decorations = self.decoration_rows();
        let origin_y = self.ascent - rendered.top;

        Ok(RawRaster::from_fn(rendered.advance, self.cell_height(), |x, y| {
            if decorations.contains(&y) {
                return true;
            }
            let gx = x as i32 - rendered.left;
            let gy = y as i32 - origin_y;
            gx >= 0
                && gy >= 0
                && (gx as usize) < rendered.width
                && (gy as usize) < rendered.rows
                && rendered.pixel(gx as usize, gy as usize)
        }))
    }
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if cfg!(target_os = "windows") {
        let windir = std::env::var_os("WINDIR").unwrap_or_else(|| "C:\\Windows".into());
        dirs.push(PathBuf::from(windir).join("Fonts"));
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join("Microsoft").join("Windows").join("Fonts"));
        }
    } else if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Some(home) = std::env::var_os("HOME") {
            dirs.push(PathBuf::from(home).join("Library").join("Fonts"));
        }
    } else {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);
            dirs.push(home.join(".local").join("share").join("fonts"));
            dirs.push(home.join(".fonts"));
        }
    }
    dirs
}

fn collect_font_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_font_files(&path, out);
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_metric() {
        assert_eq!(convert_metric(64 * 12), 12);
        assert_eq!(convert_metric(64 * 12 + 63), 12);
        assert_eq!(convert_metric(-64 * 3), -3);
    }

    #[test]
    fn test_rendered_pixel() {
        let rendered = Rendered {
            advance: 10,
            left: 0,
            top: 2,
            width: 10,
            rows: 2,
            pitch: 2,
            buffer: vec![0b1000_0001, 0b0100_0000, 0x00, 0x00],
        };
        assert!(rendered.pixel(0, 0));
        assert!(rendered.pixel(7, 0));
        assert!(rendered.pixel(9, 0));
        assert!(!rendered.pixel(8, 0));
        assert!(!rendered.pixel(0, 1));
        assert!(!rendered.pixel(0, 5));
    }

    #[test]
    fn test_unknown_family() {
        let err = FreetypeRasterizer::from_family("No Such Family 0xDEAD", 9.0, DEFAULT_DPI, FontStyle::default());
        assert!(matches!(err, Err(FontError::Rasterizer(_))));
    }
}
