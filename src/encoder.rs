use crate::utils::display_char;
use crate::{FontModel, Glyph};

/// Bitmap bytes written per output line.
const BYTES_PER_LINE: usize = 10;

/// C type and storage names used in the generated header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    pub byte_type: String,
    pub glyph_type: String,
    pub font_type: String,
    /// Storage qualifier placed after each declarator; left out when empty.
    pub storage: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            byte_type: "uint8_t".into(),
            glyph_type: "GFXglyph".into(),
            font_type: "GFXfont".into(),
            storage: "PROGMEM".into(),
        }
    }
}

impl EmitOptions {
    fn storage_suffix(&self) -> String {
        if self.storage.is_empty() {
            String::new()
        } else {
            format!(" {}", self.storage)
        }
    }
}

/// Serializes a font as an Adafruit GFX compatible C header.
pub fn to_gfx_string(font: &FontModel) -> String {
    to_gfx_string_with(font, &EmitOptions::default())
}

pub fn to_gfx_string_with(font: &FontModel, options: &EmitOptions) -> String {
    let mut out = String::new();
    write_bitmaps(&mut out, font, options);
    write_glyphs(&mut out, font, options);
    write_instance(&mut out, font, options);
    out
}

enum BitmapLine {
    Comment(String),
    Bytes(String),
}

fn write_bitmaps(out: &mut String, font: &FontModel, options: &EmitOptions) {
    out.push_str(&format!(
        "const {} {}Bitmaps[]{} = {{\n",
        options.byte_type,
        font.name,
        options.storage_suffix()
    ));

    let mut lines = Vec::new();
    for (glyph, bytes) in font.glyphs.iter().zip(&font.bitmaps) {
        let shown = if bytes.is_empty() { ' ' } else { display_char(glyph.code) };
        lines.push(BitmapLine::Comment(format!("  // '{shown}' Code {:02x}", glyph.code)));
        for chunk in bytes.chunks(BYTES_PER_LINE) {
            let literals: Vec<String> = chunk.iter().map(|b| format!("0x{b:02x}")).collect();
            lines.push(BitmapLine::Bytes(format!("  {}", literals.join(", "))));
        }
    }

    // No comma after the final byte of the blob; every other byte line gets one.
    let last_bytes = lines.iter().rposition(|l| matches!(l, BitmapLine::Bytes(_)));
    let last_line = lines.len().saturating_sub(1);
    for (i, line) in lines.iter().enumerate() {
        match line {
            BitmapLine::Comment(text) => {
                out.push_str(text);
                out.push('\n');
            }
            BitmapLine::Bytes(text) => {
                out.push_str(text);
                if Some(i) != last_bytes {
                    out.push(',');
                }
                if i != last_line {
                    out.push('\n');
                }
            }
        }
    }
    out.push_str(" };\n");
}

fn write_glyphs(out: &mut String, font: &FontModel, options: &EmitOptions) {
    out.push('\n');
    out.push_str(&format!(
        "const {} {}Glyphs[]{} = {{\n",
        options.glyph_type,
        font.name,
        options.storage_suffix()
    ));

    let count = font.glyphs.len();
    for (i, glyph) in font.glyphs.iter().enumerate() {
        out.push_str(&glyph_row(glyph));
        out.push_str(if i + 1 == count { " }; " } else { ",   " });
        out.push_str(&format!("   // 0x{:02x} '{}'\n", glyph.code, display_char(glyph.code)));
    }
}

fn glyph_row(glyph: &Glyph) -> String {
    format!(
        "  {{ {:6},{:4},{:4},{:4},{:5},{:5} }}",
        glyph.bitmap_offset, glyph.width, glyph.height, glyph.x_advance, glyph.x_offset, glyph.y_offset
    )
}

fn write_instance(out: &mut String, font: &FontModel, options: &EmitOptions) {
    // Casts are padded so both pointer stars line up.
    let pad = options.byte_type.len().max(options.glyph_type.len()) + 1;

    out.push('\n');
    out.push_str(&format!(
        "const {} {}{} = {{\n",
        options.font_type,
        font.name,
        options.storage_suffix()
    ));
    out.push_str(&format!("  ({:<pad$}*){}Bitmaps,\n", options.byte_type, font.name));
    out.push_str(&format!("  ({:<pad$}*){}Glyphs,\n", options.glyph_type, font.name));
    out.push_str(&format!(
        "  0x{:02x}, 0x{:02x}, {} }};\n",
        font.first, font.last, font.line_advance
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(code: u8, bitmap_offset: u16, width: u8, height: u8) -> Glyph {
        Glyph {
            code,
            bitmap_offset,
            width,
            height,
            x_advance: 8,
            x_offset: 0,
            y_offset: -8,
        }
    }

    fn font(bitmaps: Vec<Vec<u8>>) -> FontModel {
        let first = 0x41u8;
        let mut offset = 0u16;
        let glyphs = bitmaps
            .iter()
            .enumerate()
            .map(|(i, bytes)| {
                let size = if bytes.is_empty() { 0 } else { 8 };
                let g = glyph(first + i as u8, offset, size, size);
                offset += bytes.len() as u16;
                g
            })
            .collect::<Vec<_>>();
        FontModel {
            name: "Test".into(),
            first,
            last: first + glyphs.len() as u8 - 1,
            line_advance: 9,
            glyphs,
            bitmaps,
        }
    }

    fn bitmap_section(text: &str) -> &str {
        &text[..text.find(" };\n").unwrap() + 4]
    }

    #[test]
    fn test_eleven_bytes_split_ten_and_one() {
        let text = to_gfx_string(&font(vec![(1..=11).collect()]));
        assert_eq!(
            bitmap_section(&text),
            "const uint8_t TestBitmaps[] PROGMEM = {\n\
             \x20 // 'A' Code 41\n\
             \x20 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a,\n\
             \x20 0x0b };\n"
        );
    }

    #[test]
    fn test_commas_between_glyphs_only() {
        let text = to_gfx_string(&font(vec![vec![0xff], vec![], vec![0x80, 0x40]]));
        assert_eq!(
            bitmap_section(&text),
            "const uint8_t TestBitmaps[] PROGMEM = {\n\
             \x20 // 'A' Code 41\n\
             \x20 0xff,\n\
             \x20 // ' ' Code 42\n\
             \x20 // 'C' Code 43\n\
             \x20 0x80, 0x40 };\n"
        );
    }

    #[test]
    fn test_trailing_blank_glyph_closes_on_own_line() {
        let text = to_gfx_string(&font(vec![vec![0x10], vec![]]));
        assert!(bitmap_section(&text).ends_with("  0x10\n  // ' ' Code 42\n };\n"));
    }

    #[test]
    fn test_glyph_rows() {
        let mut model = font(vec![vec![0xff; 8], vec![]]);
        model.glyphs[1].x_offset = -1;
        model.glyphs[1].y_offset = 1;
        let text = to_gfx_string(&model);
        assert!(text.contains(
            "\nconst GFXglyph TestGlyphs[] PROGMEM = {\n\
             \x20 {      0,   8,   8,   8,    0,   -8 },      // 0x41 'A'\n\
             \x20 {      8,   0,   0,   8,   -1,    1 } };    // 0x42 'B'\n"
        ));
    }

    #[test]
    fn test_instance_block() {
        let text = to_gfx_string(&font(vec![vec![0x01]]));
        assert!(text.ends_with(
            "\nconst GFXfont Test PROGMEM = {\n\
             \x20 (uint8_t  *)TestBitmaps,\n\
             \x20 (GFXglyph *)TestGlyphs,\n\
             \x20 0x41, 0x41, 9 };\n"
        ));
    }

    #[test]
    fn test_custom_types_without_storage() {
        let options = EmitOptions {
            byte_type: "byte".into(),
            glyph_type: "Glyph".into(),
            font_type: "Font".into(),
            storage: String::new(),
        };
        let text = to_gfx_string_with(&font(vec![vec![0x01]]), &options);
        assert!(text.starts_with("const byte TestBitmaps[] = {\n"));
        assert!(text.contains("const Glyph TestGlyphs[] = {\n"));
        assert!(text.contains("const Font Test = {\n  (byte  *)TestBitmaps,\n  (Glyph *)TestGlyphs,\n"));
    }

    #[test]
    fn test_control_codes_shown_as_blank() {
        let mut model = font(vec![vec![0x01]]);
        model.glyphs[0].code = 0x0A;
        model.first = 0x0A;
        model.last = 0x0A;
        let text = to_gfx_string(&model);
        assert!(text.contains("  // ' ' Code 0a\n"));
        assert!(text.contains("   // 0x0a ' '\n"));
    }

    #[test]
    fn test_output_is_stable() {
        let model = font(vec![vec![1, 2, 3], vec![], vec![4]]);
        assert_eq!(to_gfx_string(&model), to_gfx_string(&model.clone()));
    }
}
