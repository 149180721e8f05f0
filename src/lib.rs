//! # LibGFXFont: bitmap fonts for small displays
//!
//! A Rust library that turns fonts into the packed 1 bit per pixel glyph
//! atlases used by Adafruit GFX style display drivers, emitted as C headers.
//!
//! ## Features
//!
//! - **Windows FON decoding** (`fon`, default): walks the MZ stub, the NE header and its
//!   resource table to the FNT bitmap fonts, fixed and proportional
//! - **Outline fonts** (`freetype`): any [`Rasterizer`] can feed the converter; the
//!   `freetype` feature adds one backed by FreeType
//! - **Autocrop**: every glyph is cropped to its ink and repacked densely
//! - **Deterministic output**: the same font always produces the same header text
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # #[cfg(feature = "fon")]
//! # {
//! use libgfxfont::{to_gfx_string, CharRange, ConvertOptions, FontModel};
//!
//! let options = ConvertOptions {
//!     range: CharRange::SEVEN_BIT,
//!     ..Default::default()
//! };
//! let font = FontModel::from_fon_path("vgasys.fon", &options)?;
//! println!("{}: {} glyphs", font.name, font.glyphs.len());
//!
//! std::fs::write(format!("{}.h", font.name), to_gfx_string(&font))?;
//! # }
//! # Ok(())
//! # }
//! ```
//!
//! ## Glyph Layout
//!
//! A converted font consists of:
//! - **Bitmaps**: one blob of glyph bitmaps, each a continuous MSB-first bit stream
//! - **Glyphs**: per character the offset into the blob, size, advance and the
//!   offset of the bitmap's upper left corner from the cursor
//! - **Font**: first and last character code and the line advance
//!
//! ## Error Handling
//!
//! Conversions return `Result<FontModel, FontError>`. Any failure aborts the whole
//! conversion; a partially converted font is never returned.

mod assembler;
mod crop;
mod encoder;
#[cfg(feature = "fon")]
pub mod fon;
#[cfg(feature = "freetype")]
pub mod freetype;
mod models;
mod raster;
pub mod rasterizer;
mod utils;

pub use crate::assembler::{place_cell, place_cropped, GlyphAssembler, BLANK_Y_OFFSET};
pub use crate::crop::{autocrop, CropMargins};
pub use crate::encoder::{to_gfx_string, to_gfx_string_with, EmitOptions};
pub use crate::models::*;
pub use crate::raster::RawRaster;
pub use crate::rasterizer::{FontStyle, Rasterizer, Size};
pub use crate::utils::{display_char, sanitize_name};

#[cfg(feature = "fon")]
use std::fs::File;
#[cfg(feature = "fon")]
use std::io::{BufReader, Cursor, Read, Seek};
#[cfg(feature = "fon")]
use std::path::Path;

#[cfg(feature = "fon")]
impl FontModel {
    pub fn from_fon_reader<R: Read + Seek>(mut reader: R, options: &ConvertOptions) -> Result<Self, FontError> {
        fon::convert(&mut reader, options)
    }

    pub fn from_fon_bytes(bytes: &[u8], options: &ConvertOptions) -> Result<Self, FontError> {
        Self::from_fon_reader(Cursor::new(bytes), options)
    }

    /// Opens `path` read-only; the file is closed again when conversion ends.
    pub fn from_fon_path<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<Self, FontError> {
        let file = File::open(path).map_err(FontError::Resource)?;
        Self::from_fon_reader(BufReader::new(file), options)
    }
}

impl FontModel {
    /// Renders every character of `options.range` through `rasterizer`.
    pub fn from_rasterizer<Z: Rasterizer + ?Sized>(rasterizer: &mut Z, options: &ConvertOptions) -> Result<Self, FontError> {
        crate::rasterizer::convert(rasterizer, options)
    }
}
