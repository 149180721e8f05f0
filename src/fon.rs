//! Decoder for Windows FON files: an MZ stub pointing at an NE header whose
//! resource table holds one or more FNT bitmap font resources.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read, Seek, SeekFrom};

use crate::assembler::GlyphAssembler;
use crate::raster::{stride_for, RawRaster};
use crate::utils::{latin1_to_string, sanitize_name};
use crate::{ConvertOptions, FontError, FontModel, FormatError, RangeError};

/// "MZ" read as a little-endian u16.
pub const MZ_MAGIC: u16 = 0x5A4D;
/// "NE" read as a little-endian u16.
pub const NE_MAGIC: u16 = 0x454E;

pub const RT_FONTDIR: u16 = 0x8007;
pub const RT_FONT: u16 = 0x8008;

const DF_VERSION_3: u16 = 0x0300;
/// Size of the version 2 FNT header; the v3 header adds 30 bytes.
const FNT_HEADER_V2_LEN: u64 = 118;
const FNT_HEADER_V3_EXTRA: i64 = 30;
const COPYRIGHT_LEN: usize = 60;
const MAX_FACE_NAME_LEN: usize = 256;

/// Called IMAGE_DOS_HEADER in winnt.h; only the pointer to the NE header matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MzHeader {
    pub ne_offset: u32,
}

impl MzHeader {
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self, FontError> {
        let magic = reader.read_u16::<LittleEndian>()?;
        if magic != MZ_MAGIC {
            return Err(FormatError::BadStubMagic(magic).into());
        }
        // 29 reserved words up to e_lfanew
        reader.seek(SeekFrom::Current(29 * 2))?;
        let ne_offset = reader.read_u32::<LittleEndian>()?;
        Ok(Self { ne_offset })
    }
}

/// Called IMAGE_OS2_HEADER in winnt.h.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeHeader {
    /// Offset of the resource table, relative to the NE header.
    pub resource_table: u16,
    /// Offset of the resident-name table, relative to the NE header.
    pub resident_names: u16,
}

impl NeHeader {
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self, FontError> {
        let magic = reader.read_u16::<LittleEndian>()?;
        if magic != NE_MAGIC {
            return Err(FormatError::BadSegmentMagic(magic).into());
        }
        reader.seek(SeekFrom::Current(34))?;
        let resource_table = reader.read_u16::<LittleEndian>()?;
        let resident_names = reader.read_u16::<LittleEndian>()?;
        Ok(Self {
            resource_table,
            resident_names,
        })
    }
}

/// Character set declared by an FNT resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharSet {
    Ansi,
    Default,
    Symbol,
    /// OEM, i.e. codepage 437 on an IBM PC.
    Oem,
    Other(u8),
}

impl From<u8> for CharSet {
    fn from(value: u8) -> Self {
        match value {
            0 => CharSet::Ansi,
            1 => CharSet::Default,
            2 => CharSet::Symbol,
            255 => CharSet::Oem,
            other => CharSet::Other(other),
        }
    }
}

/// The FNT header (FONTDIRENTRY / FONTINFO) at the start of a font resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FontDirEntry {
    pub version: u16,
    pub size: u32,
    pub copyright: String,
    pub font_type: u16,
    pub points: u16,
    pub vertical_res: u16,
    pub horizontal_res: u16,
    pub ascent: u16,
    pub internal_leading: u16,
    pub external_leading: u16,
    pub italic: u8,
    pub underline: u8,
    pub strike_out: u8,
    pub weight: u16,
    pub char_set: u8,
    pub pixel_width: u16,
    pub pixel_height: u16,
    pub pitch_and_family: u8,
    pub avg_width: u16,
    pub max_width: u16,
    pub first_char: u8,
    pub last_char: u8,
    pub default_char: u8,
    pub break_char: u8,
    pub width_bytes: u16,
    pub device_offset: u32,
    pub face_offset: u32,
    pub bits_pointer: u32,
    pub bits_offset: u32,
    pub reserved: u8,
}

impl FontDirEntry {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, FontError> {
        let version = reader.read_u16::<LittleEndian>()?;
        let size = reader.read_u32::<LittleEndian>()?;
        let mut copyright = [0u8; COPYRIGHT_LEN];
        reader.read_exact(&mut copyright)?;
        let copyright_len = copyright.iter().position(|&b| b == 0).unwrap_or(COPYRIGHT_LEN);

        Ok(Self {
            version,
            size,
            copyright: latin1_to_string(&copyright[..copyright_len]),
            font_type: reader.read_u16::<LittleEndian>()?,
            points: reader.read_u16::<LittleEndian>()?,
            vertical_res: reader.read_u16::<LittleEndian>()?,
            horizontal_res: reader.read_u16::<LittleEndian>()?,
            ascent: reader.read_u16::<LittleEndian>()?,
            internal_leading: reader.read_u16::<LittleEndian>()?,
            external_leading: reader.read_u16::<LittleEndian>()?,
            italic: reader.read_u8()?,
            underline: reader.read_u8()?,
            strike_out: reader.read_u8()?,
            weight: reader.read_u16::<LittleEndian>()?,
            char_set: reader.read_u8()?,
            pixel_width: reader.read_u16::<LittleEndian>()?,
            pixel_height: reader.read_u16::<LittleEndian>()?,
            pitch_and_family: reader.read_u8()?,
            avg_width: reader.read_u16::<LittleEndian>()?,
            max_width: reader.read_u16::<LittleEndian>()?,
            first_char: reader.read_u8()?,
            last_char: reader.read_u8()?,
            default_char: reader.read_u8()?,
            break_char: reader.read_u8()?,
            width_bytes: reader.read_u16::<LittleEndian>()?,
            device_offset: reader.read_u32::<LittleEndian>()?,
            face_offset: reader.read_u32::<LittleEndian>()?,
            bits_pointer: reader.read_u32::<LittleEndian>()?,
            bits_offset: reader.read_u32::<LittleEndian>()?,
            reserved: reader.read_u8()?,
        })
    }

    /// Bit 0 of the type field marks a vector font.
    pub fn is_bitmap(&self) -> bool {
        self.font_type & 1 == 0
    }

    /// A pixel width of 0 marks a proportional font with a per-character width table.
    pub fn is_proportional(&self) -> bool {
        self.pixel_width == 0
    }

    pub fn char_set(&self) -> CharSet {
        CharSet::from(self.char_set)
    }

    /// Number of glyph slots; the format stores one more glyph than
    /// `last_char - first_char + 1`.
    pub fn glyph_count(&self) -> Result<usize, RangeError> {
        if self.first_char > self.last_char {
            return Err(RangeError::InvalidCharRange {
                first: self.first_char as u32,
                last: self.last_char as u32,
            });
        }
        Ok(self.last_char as usize - self.first_char as usize + 2)
    }
}

/// One glyph slot of an FNT resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FonGlyph {
    /// Row-major raster of the full character cell.
    pub raster: RawRaster,
    /// Cursor advance, the cell width.
    pub advance: u16,
}

/// A decoded FNT bitmap font resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FonFont {
    pub info: FontDirEntry,
    pub face_name: String,
    pub glyphs: Vec<FonGlyph>,
}

impl FonFont {
    pub fn cell_width(&self) -> usize {
        if self.info.is_proportional() {
            self.info.max_width as usize
        } else {
            self.info.pixel_width as usize
        }
    }

    pub fn cell_height(&self) -> usize {
        self.info.pixel_height as usize
    }

    pub fn first_char(&self) -> u8 {
        self.info.first_char
    }

    pub fn last_char(&self) -> u8 {
        self.info.last_char
    }

    pub fn glyph(&self, code: u8) -> Option<&FonGlyph> {
        let index = (code as usize).checked_sub(self.info.first_char as usize)?;
        self.glyphs.get(index)
    }

    /// Descriptor name: face name plus cell size, e.g. `System_8x16`.
    pub fn gfx_name(&self) -> String {
        sanitize_name(&format!(
            "{}_{}x{}",
            self.face_name,
            self.cell_width(),
            self.cell_height()
        ))
    }
}

/// Reads every FNT resource from a FON file.
pub fn decode<R: Read + Seek>(reader: &mut R) -> Result<Vec<FonFont>, FontError> {
    let mz = MzHeader::read(reader)?;
    let ne_offset = mz.ne_offset as u64;
    reader.seek(SeekFrom::Start(ne_offset))?;
    let ne = NeHeader::read(reader)?;
    log::debug!(
        "NE header at 0x{ne_offset:X}, resource table at +0x{:X}",
        ne.resource_table
    );

    reader.seek(SeekFrom::Start(ne_offset + ne.resource_table as u64))?;
    let shift = reader.read_u16::<LittleEndian>()?;
    if shift >= 32 {
        return Err(FormatError::BadAlignmentShift(shift).into());
    }

    let mut fonts = Vec::new();
    loop {
        let type_id = reader.read_u16::<LittleEndian>()?;
        if type_id == 0 {
            break;
        }
        let count = reader.read_u16::<LittleEndian>()?;
        let _reserved = reader.read_u32::<LittleEndian>()?;
        log::debug!("resource type 0x{type_id:04X} with {count} item(s)");

        for _ in 0..count {
            let offset = reader.read_u16::<LittleEndian>()?;
            // length, flags, id, handle, usage
            reader.seek(SeekFrom::Current(10))?;
            if type_id != RT_FONT {
                continue;
            }
            let resume = reader.stream_position()?;
            let base = (offset as u64) << shift;
            reader.seek(SeekFrom::Start(base))?;
            fonts.push(read_font_resource(reader, base)?);
            reader.seek(SeekFrom::Start(resume))?;
        }
    }

    if fonts.is_empty() {
        return Err(FormatError::NoFontResource.into());
    }
    Ok(fonts)
}

fn read_font_resource<R: Read + Seek>(reader: &mut R, base: u64) -> Result<FonFont, FontError> {
    let info = FontDirEntry::read(reader)?;
    if !info.is_bitmap() {
        return Err(FormatError::NotABitmapFont.into());
    }

    let face_name = read_string_at(reader, base + info.face_offset as u64)?;
    let glyph_count = info.glyph_count()?;
    log::debug!(
        "FNT '{face_name}' v{:X}: {}x{} px, chars 0x{:02X}-0x{:02X}, {glyph_count} slots",
        info.version,
        info.pixel_width,
        info.pixel_height,
        info.first_char,
        info.last_char
    );

    let glyphs = if info.is_proportional() {
        read_proportional_glyphs(reader, base, &info, glyph_count)?
    } else {
        read_fixed_glyphs(reader, base, &info, glyph_count)?
    };

    Ok(FonFont {
        info,
        face_name,
        glyphs,
    })
}

/// Reads a null-terminated string at `offset` and restores the read position.
fn read_string_at<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<String, FontError> {
    let saved = reader.stream_position()?;
    reader.seek(SeekFrom::Start(offset))?;

    let mut bytes = Vec::new();
    while bytes.len() < MAX_FACE_NAME_LEN {
        let b = reader.read_u8()?;
        if b == 0 {
            break;
        }
        bytes.push(b);
    }

    reader.seek(SeekFrom::Start(saved))?;
    Ok(latin1_to_string(&bytes))
}

fn read_fixed_glyphs<R: Read + Seek>(
    reader: &mut R,
    base: u64,
    info: &FontDirEntry,
    glyph_count: usize,
) -> Result<Vec<FonGlyph>, FontError> {
    let width = info.pixel_width as usize;
    let height = info.pixel_height as usize;
    let stride = stride_for(width);
    let glyph_len = stride * height;

    reader.seek(SeekFrom::Start(base + info.bits_offset as u64))?;
    let bits = read_bitmap(reader, glyph_len as u64 * glyph_count as u64)?;

    (0..glyph_count)
        .map(|i| {
            let strips = &bits[i * glyph_len..(i + 1) * glyph_len];
            let raster = RawRaster::new(width, height, transpose_strips(strips, stride, height))?;
            Ok(FonGlyph {
                raster,
                advance: info.pixel_width,
            })
        })
        .collect()
}

fn read_proportional_glyphs<R: Read + Seek>(
    reader: &mut R,
    base: u64,
    info: &FontDirEntry,
    glyph_count: usize,
) -> Result<Vec<FonGlyph>, FontError> {
    let height = info.pixel_height as usize;
    let v3 = info.version >= DF_VERSION_3;

    reader.seek(SeekFrom::Start(base + FNT_HEADER_V2_LEN))?;
    if v3 {
        reader.seek(SeekFrom::Current(FNT_HEADER_V3_EXTRA))?;
    }

    let mut table = Vec::with_capacity(glyph_count);
    for _ in 0..glyph_count {
        let width = reader.read_u16::<LittleEndian>()?;
        let offset = if v3 {
            reader.read_u32::<LittleEndian>()?
        } else {
            reader.read_u16::<LittleEndian>()? as u32
        };
        table.push((width, offset));
    }

    let mut glyphs = Vec::with_capacity(glyph_count);
    for (width, offset) in table {
        let stride = stride_for(width as usize);
        reader.seek(SeekFrom::Start(base + offset as u64))?;
        let strips = read_bitmap(reader, stride as u64 * height as u64)?;
        let raster = RawRaster::new(width as usize, height, transpose_strips(&strips, stride, height))?;
        glyphs.push(FonGlyph {
            raster,
            advance: width,
        });
    }
    Ok(glyphs)
}

/// Reads `len` bitmap bytes. The buffer grows with what the stream actually
/// holds, so header sizes far beyond the file end in `UnexpectedEof`.
fn read_bitmap<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>, FontError> {
    let mut bytes = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) < len {
        let msg = format!("bitmap needs {len} bytes, stream holds {}", bytes.len());
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, msg).into());
    }
    Ok(bytes)
}

/// FNT glyph bitmaps are stored as `stride` column strips of `height` bytes
/// each; this turns them into row-major rows of `stride` bytes.
pub fn transpose_strips(strips: &[u8], stride: usize, height: usize) -> Vec<u8> {
    let mut rows = vec![0u8; stride * height];
    for col in 0..stride {
        for row in 0..height {
            rows[row * stride + col] = strips[col * height + row];
        }
    }
    rows
}

/// Converts the selected FNT resource of a FON file into a [`FontModel`].
///
/// The requested character range is narrowed to what the font declares.
/// Each glyph is cropped to its ink unless `preserve_cell_box` is set.
pub(crate) fn convert<R: Read + Seek>(
    reader: &mut R,
    options: &ConvertOptions,
) -> Result<FontModel, FontError> {
    let mut fonts = decode(reader)?;
    let count = fonts.len();
    if options.font_index >= count {
        return Err(FormatError::FontIndexOutOfRange {
            index: options.font_index,
            count,
        }
        .into());
    }
    let font = fonts.swap_remove(options.font_index);

    let range = options.range.clamp_to(font.first_char(), font.last_char())?;
    if range != options.range {
        log::warn!(
            "'{}' holds characters 0x{:02X}-0x{:02X}; converting 0x{:02X}-0x{:02X}",
            font.face_name,
            font.first_char(),
            font.last_char(),
            range.first(),
            range.last()
        );
    }

    let line_advance = u8::try_from(font.cell_height()).map_err(|_| RangeError::MetricOverflow {
        code: range.first(),
        field: "line advance",
        value: font.cell_height() as i64,
    })?;

    let mut assembler = GlyphAssembler::new(
        font.gfx_name(),
        range,
        line_advance,
        options.preserve_cell_box,
    )
    .left_aligned();
    for code in range.codes() {
        match font.glyph(code) {
            Some(glyph) => assembler.append(code, &glyph.raster, glyph.advance as u32)?,
            None => assembler.append(code, &RawRaster::default(), font.cell_width() as u32)?,
        };
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
