#![allow(dead_code)]

//! Builds synthetic FON files byte by byte.

pub const NE_OFFSET: usize = 0x40;
pub const RESOURCE_TABLE: usize = 0x80;
pub const FNT_HEADER_LEN: usize = 118;

/// One FNT resource to embed.
#[derive(Clone)]
pub struct Fnt {
    pub face: String,
    pub version: u16,
    pub font_type: u16,
    pub height: u16,
    pub first: u8,
    pub last: u8,
    /// Fixed pitch width; `None` makes a proportional font.
    pub width: Option<u16>,
    /// Per slot: width and column-strip bitmap.
    pub glyphs: Vec<(u16, Vec<u8>)>,
}

impl Fnt {
    /// Fixed pitch font with `glyphs` as column strips, one entry per slot.
    pub fn fixed(face: &str, width: u16, height: u16, first: u8, last: u8, glyphs: Vec<Vec<u8>>) -> Self {
        Self {
            face: face.to_string(),
            version: 0x0200,
            font_type: 0,
            height,
            first,
            last,
            width: Some(width),
            glyphs: glyphs.into_iter().map(|strips| (width, strips)).collect(),
        }
    }

    pub fn proportional(face: &str, height: u16, first: u8, last: u8, glyphs: Vec<(u16, Vec<u8>)>) -> Self {
        Self {
            face: face.to_string(),
            version: 0x0200,
            font_type: 0,
            height,
            first,
            last,
            width: None,
            glyphs,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let table_len = if self.width.is_some() { 0 } else { self.glyphs.len() * 4 };
        let face_offset = FNT_HEADER_LEN + table_len;
        let bits_offset = face_offset + self.face.len() + 1;

        let mut bits = Vec::new();
        let mut table = Vec::new();
        for (width, strips) in &self.glyphs {
            table.extend_from_slice(&width.to_le_bytes());
            table.extend_from_slice(&((bits_offset + bits.len()) as u16).to_le_bytes());
            bits.extend_from_slice(strips);
        }
        let max_width = self.glyphs.iter().map(|(w, _)| *w).max().unwrap_or(0);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&((bits_offset + bits.len()) as u32).to_le_bytes()); // size
        let mut copyright = b"(c) nobody".to_vec();
        copyright.resize(60, 0);
        bytes.extend_from_slice(&copyright);
        bytes.extend_from_slice(&self.font_type.to_le_bytes());
        bytes.extend_from_slice(&9u16.to_le_bytes()); // points
        bytes.extend_from_slice(&96u16.to_le_bytes()); // vertical res
        bytes.extend_from_slice(&96u16.to_le_bytes()); // horizontal res
        bytes.extend_from_slice(&self.height.saturating_sub(1).to_le_bytes()); // ascent
        bytes.extend_from_slice(&0u16.to_le_bytes()); // internal leading
        bytes.extend_from_slice(&0u16.to_le_bytes()); // external leading
        bytes.extend_from_slice(&[0, 0, 0]); // italic, underline, strikeout
        bytes.extend_from_slice(&400u16.to_le_bytes()); // weight
        bytes.push(0); // ANSI
        bytes.extend_from_slice(&self.width.unwrap_or(0).to_le_bytes());
        bytes.extend_from_slice(&self.height.to_le_bytes());
        bytes.push(0); // pitch and family
        bytes.extend_from_slice(&max_width.to_le_bytes()); // average width
        bytes.extend_from_slice(&max_width.to_le_bytes());
        bytes.extend_from_slice(&[self.first, self.last, 0, 0]); // first, last, default, break
        bytes.extend_from_slice(&0u16.to_le_bytes()); // width bytes
        bytes.extend_from_slice(&0u32.to_le_bytes()); // device
        bytes.extend_from_slice(&(face_offset as u32).to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes()); // bits pointer
        bytes.extend_from_slice(&(bits_offset as u32).to_le_bytes());
        bytes.push(0);
        assert_eq!(bytes.len(), FNT_HEADER_LEN);

        if self.width.is_none() {
            bytes.extend_from_slice(&table);
        }
        bytes.extend_from_slice(self.face.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&bits);
        bytes
    }
}

/// Wraps FNT resources into an MZ/NE container. Resource offsets are
/// stored shifted right by `shift`, so resources are aligned to `1 << shift`.
/// A font directory resource precedes the fonts when `with_fontdir` is set.
pub fn fon(fonts: &[Fnt], shift: u16, with_fontdir: bool) -> Vec<u8> {
    let mut bytes = vec![0u8; RESOURCE_TABLE];
    bytes[0..2].copy_from_slice(b"MZ");
    bytes[0x3C..0x40].copy_from_slice(&(NE_OFFSET as u32).to_le_bytes());
    bytes[NE_OFFSET..NE_OFFSET + 2].copy_from_slice(b"NE");
    let rsrc = (RESOURCE_TABLE - NE_OFFSET) as u16;
    bytes[NE_OFFSET + 0x24..NE_OFFSET + 0x26].copy_from_slice(&rsrc.to_le_bytes());
    bytes[NE_OFFSET + 0x26..NE_OFFSET + 0x28].copy_from_slice(&rsrc.to_le_bytes());

    let entries = fonts.len() + usize::from(with_fontdir);
    let groups = 1 + usize::from(with_fontdir);
    let table_len = 2 + groups * 8 + entries * 12 + 2;
    let align = 1usize << shift;
    let mut next = (RESOURCE_TABLE + table_len).next_multiple_of(align);

    let mut resources = Vec::new();
    let mut offsets = Vec::new();
    let dir = vec![0u8; 4];
    let blobs: Vec<Vec<u8>> = fonts.iter().map(Fnt::to_bytes).collect();
    for blob in std::iter::once(&dir).filter(|_| with_fontdir).chain(blobs.iter()) {
        offsets.push((next >> shift) as u16);
        resources.push((next, blob.clone()));
        next = (next + blob.len()).next_multiple_of(align);
    }

    bytes.extend_from_slice(&shift.to_le_bytes());
    let mut offsets = offsets.into_iter();
    if with_fontdir {
        bytes.extend_from_slice(&0x8007u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        push_item(&mut bytes, offsets.next().unwrap_or(0));
    }
    bytes.extend_from_slice(&0x8008u16.to_le_bytes());
    bytes.extend_from_slice(&(fonts.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    for offset in offsets {
        push_item(&mut bytes, offset);
    }
    bytes.extend_from_slice(&0u16.to_le_bytes());

    for (start, blob) in resources {
        bytes.resize(start, 0);
        bytes.extend_from_slice(&blob);
    }
    bytes
}

fn push_item(bytes: &mut Vec<u8>, offset: u16) {
    bytes.extend_from_slice(&offset.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 10]);
}
